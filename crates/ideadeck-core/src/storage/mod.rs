//! Storage layer
//!
//! SQLite persistence for cards.
//!
//! ## Layout
//!
//! - `connection` - open + bootstrap, one connection per store operation
//! - `schema` - table definitions and schema versioning
//! - `seed` - example cards for a fresh library
//! - `error` - typed storage errors

pub mod connection;
pub mod error;
pub mod schema;
pub mod seed;

pub use error::{StorageError, StorageResult, UnavailableReason};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use seed::seed_cards;
