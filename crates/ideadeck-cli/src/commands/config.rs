//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use ideadeck_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str =
    "data_dir, database_name, seed_policy, log_file, ai_api_key, ai_model, ai_endpoint";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let masked_key = config.masked_api_key();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database_name": config.database_name,
                    "database_path": config.database_path(),
                    "seed_policy": config.seed_policy,
                    "log_file": config.log_file,
                    "ai_api_key": masked_key,
                    "ai_model": config.ai_model,
                    "ai_endpoint": config.ai_endpoint
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.database_path().display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!("  database_name: {}", config.database_name);
            println!("  seed_policy:   {}", config.seed_policy);
            println!(
                "  log_file:      {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!(
                "  ai_api_key:    {}",
                masked_key.as_deref().unwrap_or("(not set)")
            );
            println!("  ai_model:      {}", config.ai_model);
            println!("  ai_endpoint:   {}", config.ai_endpoint);
            println!();
            println!("Database:    {}", config.database_path().display());
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    // Environment overrides stay out of the saved file
    let mut config =
        Config::load_file_only(&save_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "ai_api_key" {
        config.masked_api_key().unwrap_or_default()
    } else {
        value
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

/// Validate `value` and store it under `key`
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            if value.is_empty() {
                bail!("data_dir cannot be empty");
            }
            config.data_dir = value.into();
        }
        "database_name" => {
            if value.is_empty() || value.contains(['/', '\\']) {
                bail!("database_name must be a plain, non-empty file name");
            }
            config.database_name = value.to_string();
        }
        "seed_policy" => {
            config.seed_policy = value.parse()?;
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        "ai_api_key" => {
            config.ai_api_key = optional(value).map(str::to_string);
        }
        "ai_model" => {
            if value.is_empty() {
                bail!("ai_model cannot be empty");
            }
            config.ai_model = value.to_string();
        }
        "ai_endpoint" => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                bail!("ai_endpoint must be an http:// or https:// URL");
            }
            config.ai_endpoint = value.to_string();
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

/// `""` and `"none"` unset an optional value
fn optional(value: &str) -> Option<&str> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideadeck_core::SeedPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "seed_policy", "never").unwrap();
        assert_eq!(config.seed_policy, SeedPolicy::Never);

        apply(&mut config, "database_name", "ideas").unwrap();
        assert_eq!(config.database_name, "ideas");

        apply(&mut config, "ai_api_key", "secret-key").unwrap();
        assert_eq!(config.ai_api_key.as_deref(), Some("secret-key"));

        apply(&mut config, "ai_api_key", "none").unwrap();
        assert!(config.ai_api_key.is_none());

        apply(&mut config, "log_file", "/tmp/ideadeck.log").unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/ideadeck.log")));
    }

    #[test]
    fn test_apply_rejects_invalid_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, "seed_policy", "sometimes").is_err());
        assert!(apply(&mut config, "database_name", "a/b").is_err());
        assert!(apply(&mut config, "ai_endpoint", "ftp://x").is_err());
        assert!(apply(&mut config, "favorite_color", "blue").is_err());
    }

    #[test]
    fn test_set_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        set(
            "ai_model".to_string(),
            "test-model".to_string(),
            Some(&path),
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("test-model"));
    }

    #[test]
    fn test_set_does_not_save_env_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let saved = std::env::var("API_KEY").ok();
        std::env::set_var("API_KEY", "sk-from-unrelated-env");
        let result = set(
            "ai_model".to_string(),
            "m".to_string(),
            Some(&path),
            &Output::new(OutputFormat::Quiet),
        );
        match saved {
            Some(v) => std::env::set_var("API_KEY", v),
            None => std::env::remove_var("API_KEY"),
        }
        result.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("ai_model = \"m\""));
        assert!(!content.contains("sk-from-unrelated-env"));
        assert!(!content.contains("ai_api_key"));
    }
}
