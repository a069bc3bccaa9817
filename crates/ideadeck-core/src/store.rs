//! Card store
//!
//! The `CardStore` is the single source of truth for cards. It holds no
//! cached view and no long-lived connection: every operation opens the
//! database on a blocking worker, acts, and drops the connection.
//!
//! ## Usage
//!
//! ```ignore
//! let store = CardStore::new(config.store_config());
//!
//! let card = store.create(NewCard::new("Idea", CardCategory::Insight)).await?;
//! let cards = store.get_all().await?;  // newest first, seeded on first use
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::id::IdGenerator;
use crate::models::{now_millis, Card, CardCategory, CardPatch, NewCard};
use crate::storage::connection;
use crate::storage::schema::{self, is_seeded, mark_seeded};
use crate::storage::seed::seed_cards;
use crate::storage::{StorageError, StorageResult};

/// When `get_all` inserts the example cards into an empty library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedPolicy {
    /// Only the very first time the library is found empty
    #[default]
    FirstRun,
    /// Every time the library is found empty
    WhenEmpty,
    /// Never
    Never,
}

impl SeedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedPolicy::FirstRun => "first-run",
            SeedPolicy::WhenEmpty => "when-empty",
            SeedPolicy::Never => "never",
        }
    }
}

impl fmt::Display for SeedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-run" | "first_run" => Ok(SeedPolicy::FirstRun),
            "when-empty" | "when_empty" => Ok(SeedPolicy::WhenEmpty),
            "never" => Ok(SeedPolicy::Never),
            other => anyhow::bail!(
                "Unknown seed policy '{}'. Use first-run, when-empty or never.",
                other
            ),
        }
    }
}

/// Settings needed to open the card database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path of the SQLite file
    pub path: PathBuf,
    /// Seeding behaviour for an empty library
    pub seed_policy: SeedPolicy,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_policy: SeedPolicy::default(),
        }
    }

    pub fn with_seed_policy(mut self, seed_policy: SeedPolicy) -> Self {
        self.seed_policy = seed_policy;
        self
    }
}

/// Durable card collection backed by SQLite
#[derive(Debug, Clone)]
pub struct CardStore {
    config: StoreConfig,
    ids: IdGenerator,
}

impl CardStore {
    /// Create a store for the given configuration
    ///
    /// Nothing is opened until the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            ids: IdGenerator::new(),
        }
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// The store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ==================== Card Operations ====================

    /// Get every card, newest first
    ///
    /// An empty library is seeded with example cards according to the
    /// configured [`SeedPolicy`], and the seed set is returned.
    pub async fn get_all(&self) -> StorageResult<Vec<Card>> {
        let policy = self.config.seed_policy;
        self.run(move |conn, path| {
            let cards = select_all(conn)
                .map_err(|e| StorageError::unavailable(path, e))?
                .into_iter()
                .map(CardRow::into_card)
                .collect::<StorageResult<Vec<_>>>()?;
            if !cards.is_empty() || policy == SeedPolicy::Never {
                return Ok(cards);
            }

            seed_if_empty(conn, path, policy)
        })
        .await
    }

    /// Get a card by id
    pub async fn get(&self, id: &str) -> StorageResult<Option<Card>> {
        let id = id.to_string();
        self.run(move |conn, path| {
            select_one(conn, &id)
                .map_err(|e| StorageError::unavailable(path, e))?
                .map(CardRow::into_card)
                .transpose()
        })
        .await
    }

    /// Create a card, assigning its id and timestamps
    ///
    /// The id is not checked before the insert; a collision is rejected by
    /// the primary key and reported as a write error.
    pub async fn create(&self, data: NewCard) -> StorageResult<Card> {
        let card = Card::from_new(self.ids.generate(), data, now_millis());
        self.run(move |conn, _| {
            let tx = conn
                .transaction()
                .map_err(|e| StorageError::write("create", e))?;
            insert(&tx, &card).map_err(|e| StorageError::write("create", e))?;
            // A library that has held a card never gets the examples
            mark_seeded(&tx).map_err(|e| StorageError::write("create", e))?;
            tx.commit().map_err(|e| StorageError::write("create", e))?;
            debug!("Created card {}", card.id);
            Ok(card)
        })
        .await
    }

    /// Merge `patch` onto the card with `id` and refresh `updated_at`
    pub async fn update(&self, id: &str, patch: CardPatch) -> StorageResult<Card> {
        let id = id.to_string();
        self.run(move |conn, _| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| StorageError::write("update", e))?;

            let mut card = select_one(&tx, &id)
                .map_err(|e| StorageError::write("update", e))?
                .map(CardRow::into_card)
                .transpose()?
                .ok_or_else(|| StorageError::NotFound { id: id.clone() })?;

            card.apply(patch, now_millis());
            write_back(&tx, &card).map_err(|e| StorageError::write("update", e))?;
            tx.commit().map_err(|e| StorageError::write("update", e))?;

            debug!("Updated card {}", card.id);
            Ok(card)
        })
        .await
    }

    /// Delete the card with `id`
    ///
    /// Deleting an absent id is not an error. Returns whether a card was
    /// removed.
    pub async fn delete(&self, id: &str) -> StorageResult<bool> {
        let id = id.to_string();
        self.run(move |conn, _| {
            let removed = conn
                .execute("DELETE FROM cards WHERE id = ?", params![id])
                .map_err(|e| StorageError::write("delete", e))?;
            debug!("Deleted card {} (rows removed: {})", id, removed);
            Ok(removed > 0)
        })
        .await
    }

    // ==================== Stats ====================

    /// Number of stored cards
    pub async fn count(&self) -> StorageResult<i64> {
        self.run(|conn, path| {
            conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
                .map_err(|e| StorageError::unavailable(path, e))
        })
        .await
    }

    /// Schema version recorded in the database
    pub async fn schema_version(&self) -> StorageResult<Option<i32>> {
        self.run(|conn, path| {
            schema::get_schema_version(conn).map_err(|e| StorageError::unavailable(path, e))
        })
        .await
    }

    // ==================== Private helpers ====================

    /// Open the database on a blocking worker and run `op` against it
    async fn run<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &Path) -> StorageResult<T> + Send + 'static,
    {
        let path = self.config.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = connection::open(&path)?;
            op(&mut conn, &path)
        })
        .await?
    }
}

// ==================== Row helpers ====================

const CARD_COLUMNS: &str =
    "id, title, essence, card_type, image_url, source_url, created_at, updated_at";

fn select_all(conn: &Connection) -> rusqlite::Result<Vec<CardRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards ORDER BY created_at DESC, rowid ASC",
        CARD_COLUMNS
    ))?;
    let rows = stmt.query_map([], CardRow::from_row)?;
    rows.collect()
}

fn select_one(conn: &Connection, id: &str) -> rusqlite::Result<Option<CardRow>> {
    conn.query_row(
        &format!("SELECT {} FROM cards WHERE id = ?", CARD_COLUMNS),
        params![id],
        CardRow::from_row,
    )
    .optional()
}

fn insert(conn: &Connection, card: &Card) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO cards ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            CARD_COLUMNS
        ),
        params![
            card.id,
            card.title,
            card.essence,
            card.card_type.as_str(),
            card.image_url,
            card.source_url,
            card.created_at,
            card.updated_at,
        ],
    )?;
    Ok(())
}

fn write_back(conn: &Connection, card: &Card) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        UPDATE cards
        SET title = ?2, essence = ?3, card_type = ?4, image_url = ?5,
            source_url = ?6, updated_at = ?7
        WHERE id = ?1
        "#,
        params![
            card.id,
            card.title,
            card.essence,
            card.card_type.as_str(),
            card.image_url,
            card.source_url,
            card.updated_at,
        ],
    )?;
    Ok(())
}

/// Insert the seed cards if the library is still empty
///
/// Emptiness and the seeded flag are checked again under a write lock, so
/// concurrent callers seed at most once and all see the same cards.
fn seed_if_empty(
    conn: &mut Connection,
    path: &Path,
    policy: SeedPolicy,
) -> StorageResult<Vec<Card>> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| StorageError::unavailable(path, e))?;

    let existing = select_all(&tx)
        .map_err(|e| StorageError::unavailable(path, e))?
        .into_iter()
        .map(CardRow::into_card)
        .collect::<StorageResult<Vec<_>>>()?;
    if !existing.is_empty() {
        return Ok(existing);
    }
    let seeded = is_seeded(&tx).map_err(|e| StorageError::unavailable(path, e))?;
    if policy == SeedPolicy::FirstRun && seeded {
        return Ok(existing);
    }

    let cards = seed_cards();
    for card in &cards {
        insert(&tx, card).map_err(|e| StorageError::write("seed", e))?;
    }
    mark_seeded(&tx).map_err(|e| StorageError::write("seed", e))?;
    tx.commit().map_err(|e| StorageError::write("seed", e))?;

    info!("Seeded empty library with {} example cards", cards.len());
    Ok(cards)
}

struct CardRow {
    id: String,
    title: String,
    essence: Option<String>,
    card_type: String,
    image_url: Option<String>,
    source_url: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl CardRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            essence: row.get(2)?,
            card_type: row.get(3)?,
            image_url: row.get(4)?,
            source_url: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_card(self) -> StorageResult<Card> {
        let card_type: CardCategory = match self.card_type.parse() {
            Ok(card_type) => card_type,
            Err(e) => {
                return Err(StorageError::InvalidRecord {
                    id: self.id,
                    details: format!("{}", e),
                })
            }
        };

        Ok(Card {
            id: self.id,
            title: self.title,
            essence: self.essence,
            card_type,
            image_url: self.image_url,
            source_url: self.source_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
