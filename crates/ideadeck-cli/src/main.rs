//! IdeaDeck CLI
//!
//! Command-line interface for IdeaDeck - a personal collection of idea cards.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use ideadeck_core::{CardStore, CategoryFilter, Config};

mod commands;
mod extract;
mod image;
mod logging;
mod output;
mod prompt;

use commands::card::CardFields;
use extract::GeminiExtractor;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "ideadeck")]
#[command(about = "IdeaDeck - Collect and browse short idea cards")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cards, newest first
    #[command(alias = "ls")]
    List {
        /// Only cards whose title or essence contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Category tag, or "all"
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,
    },
    /// Show card details
    Show {
        /// Card ID (full ID or prefix)
        id: String,
    },
    /// Create a new card
    #[command(alias = "add")]
    Create {
        #[command(flatten)]
        fields: CardFields,
        /// Suggest title, essence and category from this URL
        #[arg(long, value_name = "URL")]
        from_url: Option<String>,
    },
    /// Edit a card
    Edit {
        /// Card ID (full ID or prefix)
        id: String,
        #[command(flatten)]
        fields: CardFields,
    },
    /// Delete a card
    #[command(alias = "rm")]
    Delete {
        /// Card ID (full ID or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List categories with card counts
    Categories,
    /// Show status (database, schema version, card count)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, database_name, seed_policy, log_file,
        /// ai_api_key, ai_model, ai_endpoint)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands must work even when the stored config is broken
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    logging::init(&config, cli.verbose);
    debug!("Using database {:?}", config.database_path());

    let store = CardStore::new(config.store_config());

    match cli.command {
        Commands::List { search, category } => {
            commands::card::list(&store, search, category, &output).await
        }
        Commands::Show { id } => commands::card::show(&store, id, &output).await,
        Commands::Create { fields, from_url } => {
            let extractor = GeminiExtractor::new(&config);
            commands::card::create(&store, fields, from_url, &extractor, &output).await
        }
        Commands::Edit { id, fields } => commands::card::edit(&store, id, fields, &output).await,
        Commands::Delete { id, yes } => commands::card::delete(&store, id, yes, &output).await,
        Commands::Categories => commands::category::list(&store, &output).await,
        Commands::Status => commands::status::show(&store, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ideadeck_core::CardCategory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from(["ideadeck", "ls", "-s", "ui", "-c", "pattern"]).unwrap();
        match cli.command {
            Commands::List { search, category } => {
                assert_eq!(search.as_deref(), Some("ui"));
                assert_eq!(category, CategoryFilter::Only(CardCategory::Pattern));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_list_defaults_to_all_categories() {
        let cli = Cli::try_parse_from(["ideadeck", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                category: CategoryFilter::All,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "ideadeck",
            "--json",
            "add",
            "--title",
            "Idea",
            "--category",
            "tech",
            "--from-url",
            "https://example.com",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Create { fields, from_url } => {
                assert_eq!(fields.title.as_deref(), Some("Idea"));
                assert_eq!(fields.category, Some(CardCategory::Tech));
                assert_eq!(from_url.as_deref(), Some("https://example.com"));
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(Cli::try_parse_from(["ideadeck", "add", "-c", "gadget"]).is_err());
        assert!(Cli::try_parse_from(["ideadeck", "list", "-c", "gadget"]).is_err());
    }

    #[test]
    fn test_image_flags_conflict() {
        assert!(Cli::try_parse_from([
            "ideadeck",
            "add",
            "--image",
            "https://x.test/a.png",
            "--image-file",
            "a.png",
        ])
        .is_err());
    }
}
