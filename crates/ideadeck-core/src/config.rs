//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/ideadeck/config.toml)
//! 3. Environment variables (IDEADECK_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::{SeedPolicy, StoreConfig};

/// Environment variable prefix
const ENV_PREFIX: &str = "IDEADECK";

/// Generic API key variable honoured when no IDEADECK_AI_API_KEY is set
const GENERIC_API_KEY_VAR: &str = "API_KEY";

/// Default database name
pub const DEFAULT_DATABASE_NAME: &str = "ideadeck_db";

/// Default model used for URL extraction
pub const DEFAULT_AI_MODEL: &str = "gemini-3-flash-preview";

/// Default Generative Language API base URL
pub const DEFAULT_AI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite database)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Logical database name; the file is `<data_dir>/<database_name>.sqlite`
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// When example cards are inserted into an empty library
    #[serde(default)]
    pub seed_policy: SeedPolicy,

    /// Log file path (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// API key for the AI extraction service
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Model used for AI extraction
    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    /// Base URL of the AI extraction service
    #[serde(default = "default_ai_endpoint")]
    pub ai_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_name: default_database_name(),
            seed_policy: SeedPolicy::default(),
            log_file: None,
            ai_api_key: None,
            ai_model: default_ai_model(),
            ai_endpoint: default_ai_endpoint(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (IDEADECK_DATA_DIR, IDEADECK_AI_API_KEY, ...)
    /// 2. Config file (~/.config/ideadeck/config.toml or IDEADECK_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::load_file_only(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load only what is written in the config file, ignoring the environment
    ///
    /// Use this before saving, so values that only exist as environment
    /// variables are never written to disk.
    pub fn load_file_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_DATABASE_NAME", ENV_PREFIX)) {
            if !val.is_empty() {
                self.database_name = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SEED_POLICY", ENV_PREFIX)) {
            self.seed_policy = val
                .parse()
                .with_context(|| format!("Invalid {}_SEED_POLICY", ENV_PREFIX))?;
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        // A dedicated key wins over the generic API_KEY variable
        if let Ok(val) = std::env::var(format!("{}_AI_API_KEY", ENV_PREFIX)) {
            self.ai_api_key = if val.is_empty() { None } else { Some(val) };
        } else if self.ai_api_key.is_none() {
            if let Ok(val) = std::env::var(GENERIC_API_KEY_VAR) {
                if !val.is_empty() {
                    self.ai_api_key = Some(val);
                }
            }
        }

        if let Ok(val) = std::env::var(format!("{}_AI_MODEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.ai_model = val;
            }
        }

        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with IDEADECK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ideadeck")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.sqlite", self.database_name))
    }

    /// Store settings derived from this configuration
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.database_path(),
            seed_policy: self.seed_policy,
        }
    }

    /// The API key with all but the last four characters masked
    pub fn masked_api_key(&self) -> Option<String> {
        self.ai_api_key.as_ref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            let visible = chars.len().saturating_sub(4);
            let tail: String = chars[visible..].iter().collect();
            format!("{}{}", "*".repeat(visible.min(8)), tail)
        })
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ideadeck")
}

fn default_database_name() -> String {
    DEFAULT_DATABASE_NAME.to_string()
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

fn default_ai_endpoint() -> String {
    DEFAULT_AI_ENDPOINT.to_string()
}
