//! Connection bootstrap for the card database
//!
//! Every store operation opens its own connection through [`open`],
//! which creates the file and schema on first use.

use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use tracing::{debug, info};

use super::error::{StorageError, StorageResult, UnavailableReason};
use super::schema::{get_schema_version, init_schema, needs_init, SCHEMA_VERSION};

/// Open (and initialize if needed) the card database at `path`
pub fn open(path: &Path) -> StorageResult<Connection> {
    let started_at = Instant::now();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::unavailable(path, e))?;
        }
    }

    let conn = Connection::open(path).map_err(|e| StorageError::unavailable(path, e))?;
    bootstrap(&conn).map_err(|reason| StorageError::unavailable(path, reason))?;

    debug!(
        "Opened card database {:?} in {}ms",
        path,
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap(conn: &Connection) -> Result<(), UnavailableReason> {
    conn.busy_timeout(Duration::from_secs(5))?;

    if let Some(found) = get_schema_version(conn)? {
        if found > SCHEMA_VERSION {
            return Err(UnavailableReason::UnsupportedSchema {
                found,
                supported: SCHEMA_VERSION,
            });
        }
    }

    if needs_init(conn)? {
        info!("Initializing card database schema v{}", SCHEMA_VERSION);
        init_schema(conn)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_file_and_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cards.sqlite");

        let conn = open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_open_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cards.sqlite");

        drop(open(&path).unwrap());
        let conn = open(&path).unwrap();
        assert!(!needs_init(&conn).unwrap());
    }

    #[test]
    fn test_open_rejects_newer_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cards.sqlite");

        {
            let conn = open(&path).unwrap();
            conn.execute(
                "UPDATE schema_info SET value = ? WHERE key = 'version'",
                [(SCHEMA_VERSION + 1).to_string()],
            )
            .unwrap();
        }

        let err = open(&path).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Unavailable {
                source: UnavailableReason::UnsupportedSchema { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = open(&blocker.join("cards.sqlite")).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
