//! IdeaDeck Core Library
//!
//! This crate provides the core functionality for IdeaDeck, a personal
//! collection of short "idea cards" stored locally.
//!
//! # Architecture
//!
//! - **SQLite**: durable card storage, one connection per operation
//! - **Query layer**: pure in-memory filtering and ordering for display
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = CardStore::new(config.store_config());
//!
//! // Add a card
//! let card = store
//!     .create(NewCard::new("Optimistic UI Updates", CardCategory::Ui))
//!     .await?;
//!
//! // Browse
//! let cards = store.get_all().await?;
//! let visible = filter_cards(&cards, &CardQuery::new().search("ui"));
//! ```
//!
//! # Modules
//!
//! - `store`: Card store (main entry point)
//! - `models`: Card, category and update inputs
//! - `query`: Search and category filtering
//! - `id`: Card identifier generation
//! - `storage`: SQLite schema, connections and errors
//! - `config`: Application configuration

pub mod config;
pub mod id;
pub mod models;
pub mod query;
pub mod storage;
pub mod store;

pub use config::Config;
pub use id::{generate_id, IdGenerator};
pub use models::{Card, CardCategory, CardPatch, CardSuggestion, CategoryParseError, NewCard};
pub use query::{category_counts, filter_cards, CardQuery, CategoryFilter};
pub use storage::{StorageError, StorageResult};
pub use store::{CardStore, SeedPolicy, StoreConfig};
