//! Category command handlers

use anyhow::{Context, Result};

use ideadeck_core::{category_counts, CardStore};

use crate::output::Output;

/// List every category with its display metadata and card count
pub async fn list(store: &CardStore, output: &Output) -> Result<()> {
    let cards = store.get_all().await.context("Failed to load cards")?;
    output.print_categories(&category_counts(&cards))
}
