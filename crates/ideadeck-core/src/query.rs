//! In-memory card queries
//!
//! Filtering and ordering of a card collection for display. Everything
//! here is pure: the input collection is never modified and the result is
//! recomputed from scratch on every call.

use std::fmt;
use std::str::FromStr;

use crate::models::{Card, CardCategory, CategoryParseError};

/// Category filter applied to a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No category filtering
    #[default]
    All,
    /// Only cards of one category
    Only(CardCategory),
}

impl CategoryFilter {
    /// Whether `category` passes this filter
    pub fn matches(&self, category: CardCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CategoryParseError;

    /// Parses `"all"` (any case) or a category tag
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

impl From<CardCategory> for CategoryFilter {
    fn from(category: CardCategory) -> Self {
        CategoryFilter::Only(category)
    }
}

/// Search text plus category filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardQuery {
    /// Case-insensitive substring matched against title and essence
    pub search: String,
    pub category: CategoryFilter,
}

impl CardQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn category(mut self, filter: impl Into<CategoryFilter>) -> Self {
        self.category = filter.into();
        self
    }

    /// Whether a single card passes the query
    pub fn matches(&self, card: &Card) -> bool {
        let needle = self.search.to_lowercase();
        matches_text(card, &needle) && self.category.matches(card.card_type)
    }
}

fn matches_text(card: &Card, needle: &str) -> bool {
    card.title.to_lowercase().contains(needle)
        || card.essence_or_empty().to_lowercase().contains(needle)
}

/// Cards passing `query`, newest first
///
/// The sort is stable, so cards with equal `created_at` keep their
/// relative input order.
pub fn filter_cards(cards: &[Card], query: &CardQuery) -> Vec<Card> {
    let needle = query.search.to_lowercase();

    let mut result: Vec<Card> = cards
        .iter()
        .filter(|card| matches_text(card, &needle) && query.category.matches(card.card_type))
        .cloned()
        .collect();

    result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    result
}

/// Number of cards per category, in display order
pub fn category_counts(cards: &[Card]) -> Vec<(CardCategory, usize)> {
    CardCategory::ALL
        .into_iter()
        .map(|category| {
            let count = cards.iter().filter(|c| c.card_type == category).count();
            (category, count)
        })
        .collect()
}
