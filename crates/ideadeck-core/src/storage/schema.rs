//! SQLite schema for the card store
//!
//! A single `cards` table keyed by card id, plus a small key/value
//! `schema_info` table holding the schema version and store flags.

use rusqlite::{Connection, OptionalExtension, Result};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// `schema_info` key marking that seed cards have been inserted
pub const SEEDED_KEY: &str = "seeded";

/// Initialize the database schema
///
/// Creates any missing table. Safe to run on an existing database.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking and store flags
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Cards table
        CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY NOT NULL CHECK (id <> ''),
            title TEXT NOT NULL,
            essence TEXT,
            card_type TEXT NOT NULL CHECK (card_type IN (
                'ui', 'feature', 'insight', 'model',
                'pattern', 'growth', 'tech', 'other'
            )),
            image_url TEXT,
            source_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            CHECK (created_at <= updated_at)
        );

        -- Newest-first listing
        CREATE INDEX IF NOT EXISTS idx_cards_created_at ON cards(created_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    if !table_exists(conn, "schema_info")? {
        return Ok(None);
    }

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.and_then(|v| v.parse().ok()))
}

/// Check if schema needs initialization or upgrade
pub fn needs_init(conn: &Connection) -> Result<bool> {
    if !table_exists(conn, "cards")? {
        return Ok(true);
    }

    Ok(match get_schema_version(conn)? {
        Some(v) => v < SCHEMA_VERSION,
        None => true,
    })
}

/// Whether the seed cards have ever been inserted
pub fn is_seeded(conn: &Connection) -> Result<bool> {
    conn.prepare("SELECT 1 FROM schema_info WHERE key = ?")?
        .exists([SEEDED_KEY])
}

/// Record that the seed cards have been inserted
pub fn mark_seeded(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES (?, '1')",
        [SEEDED_KEY],
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?")?
        .exists([name])
}
