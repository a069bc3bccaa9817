//! Status command handler

use anyhow::{Context, Result};

use ideadeck_core::storage::SCHEMA_VERSION;
use ideadeck_core::CardStore;

use crate::output::{Output, OutputFormat};

/// Show database location, schema version and card count
pub async fn show(store: &CardStore, output: &Output) -> Result<()> {
    let count = store.count().await.context("Failed to open card database")?;
    let version = store.schema_version().await?;
    let config = store.config();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": config.path,
                    "schema_version": version,
                    "supported_schema_version": SCHEMA_VERSION,
                    "seed_policy": config.seed_policy,
                    "cards": count
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", count);
        }
        OutputFormat::Human => {
            println!("IdeaDeck Status");
            println!("===============");
            println!();
            println!("Storage:");
            println!("  Database: {}", config.path.display());
            println!(
                "  Schema:   {}",
                version
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "(not initialized)".to_string())
            );
            println!("  Seeding:  {}", config.seed_policy);
            println!();
            println!("Contents:");
            println!("  Cards: {}", count);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideadeck_core::StoreConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_initializes_database() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cards.sqlite");
        let store = CardStore::new(StoreConfig::new(&path));

        show(&store, &Output::new(OutputFormat::Quiet)).await.unwrap();

        assert!(path.exists());
        assert_eq!(store.schema_version().await.unwrap(), Some(SCHEMA_VERSION));
    }
}
