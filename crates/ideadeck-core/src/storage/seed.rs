//! Example cards inserted on first use
//!
//! A first-time user never starts from an empty library. The seed set has
//! fixed ids and fixed timestamps so it is identical on every machine.

use crate::models::{Card, CardCategory};

/// Creation time of the older seed card (2025-01-01T00:00:00Z)
const SEED_BASE_MILLIS: i64 = 1_735_689_600_000;

/// The fixed example cards, newest first
pub fn seed_cards() -> Vec<Card> {
    vec![
        Card {
            id: "2".to_string(),
            title: "Optimistic UI Updates".to_string(),
            essence: Some(
                "Update the UI immediately before the server responds to make the app feel faster."
                    .to_string(),
            ),
            card_type: CardCategory::Ui,
            image_url: Some("https://picsum.photos/400/300?random=2".to_string()),
            source_url: None,
            created_at: SEED_BASE_MILLIS + 100_000,
            updated_at: SEED_BASE_MILLIS + 100_000,
        },
        Card {
            id: "1".to_string(),
            title: "Bi-directional Linking".to_string(),
            essence: Some(
                "The ability to link notes forward and backward creates a knowledge graph."
                    .to_string(),
            ),
            card_type: CardCategory::Pattern,
            image_url: Some("https://picsum.photos/400/300?random=1".to_string()),
            source_url: Some("https://example.com".to_string()),
            created_at: SEED_BASE_MILLIS,
            updated_at: SEED_BASE_MILLIS + 100_000,
        },
    ]
}
