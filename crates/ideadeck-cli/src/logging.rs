//! Diagnostic logging setup
//!
//! Logs go to stderr so they never mix with command output, or to
//! `config.log_file` when one is set. `RUST_LOG` replaces the default
//! filter entirely.

use std::fs::{File, OpenOptions};
use std::path::Path;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use ideadeck_core::Config;

/// Build the default filter directive for our crates
fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("ideadeck_core={},ideadeck_cli={}", level, level)
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init(config: &Config, verbose: bool) {
    let filter = env_filter(verbose);

    if let Some(ref log_path) = config.log_file {
        match open_log_file(log_path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(file)
                    .try_init();
                debug!("Logging to {:?}", log_path);
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_directive() {
        assert_eq!(
            default_directive(false),
            "ideadeck_core=warn,ideadeck_cli=warn"
        );
        assert_eq!(
            default_directive(true),
            "ideadeck_core=debug,ideadeck_cli=debug"
        );
    }

    #[test]
    fn test_open_log_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs").join("ideadeck.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());

        // Reopening appends rather than failing
        open_log_file(&path).unwrap();
    }
}
