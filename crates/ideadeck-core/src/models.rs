//! Data models for IdeaDeck
//!
//! Defines the core data structures: Card, its category, and the inputs
//! accepted by the store for creating and updating cards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Category tag of a card
///
/// The set is closed; display metadata for every variant lives in
/// [`CardCategory::info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardCategory {
    Ui,
    Feature,
    Insight,
    Model,
    Pattern,
    Growth,
    Tech,
    Other,
}

/// Display metadata for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Human-readable label
    pub label: &'static str,
    /// Single glyph shown next to the label
    pub icon: &'static str,
    /// Frame colour as a hex triplet
    pub frame_color: &'static str,
}

impl CardCategory {
    /// Every category, in display order
    pub const ALL: [CardCategory; 8] = [
        CardCategory::Ui,
        CardCategory::Feature,
        CardCategory::Insight,
        CardCategory::Model,
        CardCategory::Pattern,
        CardCategory::Growth,
        CardCategory::Tech,
        CardCategory::Other,
    ];

    /// The lowercase tag stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            CardCategory::Ui => "ui",
            CardCategory::Feature => "feature",
            CardCategory::Insight => "insight",
            CardCategory::Model => "model",
            CardCategory::Pattern => "pattern",
            CardCategory::Growth => "growth",
            CardCategory::Tech => "tech",
            CardCategory::Other => "other",
        }
    }

    /// Display metadata for this category
    pub fn info(&self) -> CategoryInfo {
        match self {
            CardCategory::Ui => CategoryInfo {
                label: "UI",
                icon: "▣",
                frame_color: "#C06828",
            },
            CardCategory::Feature => CategoryInfo {
                label: "Feature",
                icon: "★",
                frame_color: "#C8A440",
            },
            CardCategory::Insight => CategoryInfo {
                label: "Insight",
                icon: "✦",
                frame_color: "#1D9E74",
            },
            CardCategory::Model => CategoryInfo {
                label: "Model",
                icon: "◆",
                frame_color: "#A086B7",
            },
            CardCategory::Pattern => CategoryInfo {
                label: "Pattern",
                icon: "▦",
                frame_color: "#9DB5CC",
            },
            CardCategory::Growth => CategoryInfo {
                label: "Growth",
                icon: "↗",
                frame_color: "#BC5A84",
            },
            CardCategory::Tech => CategoryInfo {
                label: "Tech",
                icon: "⚙",
                frame_color: "#DEDFE1",
            },
            CardCategory::Other => CategoryInfo {
                label: "Other",
                icon: "#",
                frame_color: "#555555",
            },
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        self.info().label
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category tag is not part of the closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category '{0}'. Valid categories: ui, feature, insight, model, pattern, growth, tech, other")]
pub struct CategoryParseError(pub String);

impl FromStr for CardCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        CardCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| CategoryParseError(s.to_string()))
    }
}

/// An idea card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    /// Unique identifier, assigned at creation
    pub id: String,
    /// Short display name
    pub title: String,
    /// Short free-text summary
    pub essence: Option<String>,
    /// Category tag
    pub card_type: CardCategory,
    /// External image URL or a `data:` URL payload
    pub image_url: Option<String>,
    /// External reference link
    pub source_url: Option<String>,
    /// Creation time (ms since epoch), never changes
    pub created_at: i64,
    /// Last modification time (ms since epoch)
    pub updated_at: i64,
}

impl Card {
    /// Build a card from create input with an assigned id and timestamp
    pub fn from_new(id: String, data: NewCard, now: i64) -> Self {
        Self {
            id,
            title: data.title,
            essence: data.essence,
            card_type: data.card_type,
            image_url: data.image_url,
            source_url: data.source_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch onto this card
    ///
    /// `id` and `created_at` are never touched. `updated_at` is moved to
    /// `now`, but never backwards.
    pub fn apply(&mut self, patch: CardPatch, now: i64) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(essence) = patch.essence {
            self.essence = essence;
        }
        if let Some(card_type) = patch.card_type {
            self.card_type = card_type;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(source_url) = patch.source_url {
            self.source_url = source_url;
        }
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }

    /// The essence, or an empty string when there is none
    pub fn essence_or_empty(&self) -> &str {
        self.essence.as_deref().unwrap_or("")
    }
}

/// Input for creating a card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCard {
    pub title: String,
    pub essence: Option<String>,
    pub card_type: CardCategory,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
}

impl NewCard {
    /// Create input with a title and category, no optional fields
    pub fn new(title: impl Into<String>, card_type: CardCategory) -> Self {
        Self {
            title: title.into(),
            essence: None,
            card_type,
            image_url: None,
            source_url: None,
        }
    }

    pub fn with_essence(mut self, essence: impl Into<String>) -> Self {
        self.essence = Some(essence.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = Some(source_url.into());
        self
    }
}

/// Partial update for a card
///
/// `None` leaves a field unchanged. For optional fields, `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub essence: Option<Option<String>>,
    pub card_type: Option<CardCategory>,
    pub image_url: Option<Option<String>>,
    pub source_url: Option<Option<String>>,
}

impl CardPatch {
    /// True when the patch changes no field
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.essence.is_none()
            && self.card_type.is_none()
            && self.image_url.is_none()
            && self.source_url.is_none()
    }
}

/// Suggested card fields produced by the AI extraction collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardSuggestion {
    pub title: Option<String>,
    pub essence: Option<String>,
    pub card_type: Option<CardCategory>,
    /// Always the URL the suggestion was requested for
    pub source_url: String,
    /// Always empty; images are filled in manually
    pub image_url: String,
}

/// Placeholder title used when extraction fails
pub const FALLBACK_TITLE: &str = "New Link";

impl CardSuggestion {
    /// The deterministic suggestion used when extraction fails
    pub fn fallback(url: impl Into<String>) -> Self {
        Self {
            title: Some(FALLBACK_TITLE.to_string()),
            essence: None,
            card_type: Some(CardCategory::Other),
            source_url: url.into(),
            image_url: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card() -> Card {
        let data = NewCard::new("Bi-directional Linking", CardCategory::Pattern)
            .with_essence("Links both ways")
            .with_image_url("https://picsum.photos/400/300")
            .with_source_url("https://example.com");
        Card::from_new("abc".to_string(), data, 1_000)
    }

    #[test]
    fn test_category_round_trips_through_tag() {
        for category in CardCategory::ALL {
            assert_eq!(category.as_str().parse::<CardCategory>(), Ok(category));
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("UI".parse::<CardCategory>(), Ok(CardCategory::Ui));
        assert_eq!(" Pattern ".parse::<CardCategory>(), Ok(CardCategory::Pattern));
    }

    #[test]
    fn test_category_parse_rejects_unknown() {
        let err = "gadget".parse::<CardCategory>().unwrap_err();
        assert_eq!(err, CategoryParseError("gadget".to_string()));
        assert!(err.to_string().contains("gadget"));
    }

    #[test]
    fn test_category_info_labels() {
        assert_eq!(CardCategory::Ui.label(), "UI");
        assert_eq!(CardCategory::Growth.label(), "Growth");
        assert_eq!(CardCategory::Other.info().frame_color, "#555555");
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&CardCategory::Insight).unwrap();
        assert_eq!(json, "\"insight\"");
    }

    #[test]
    fn test_from_new_stamps_both_timestamps() {
        let card = sample_card();
        assert_eq!(card.id, "abc");
        assert_eq!(card.created_at, 1_000);
        assert_eq!(card.updated_at, 1_000);
    }

    #[test]
    fn test_apply_only_changes_patched_fields() {
        let mut card = sample_card();
        let before = card.clone();

        card.apply(
            CardPatch {
                essence: Some(Some("new text".to_string())),
                ..Default::default()
            },
            2_000,
        );

        assert_eq!(card.essence.as_deref(), Some("new text"));
        assert_eq!(card.updated_at, 2_000);
        assert_eq!(card.title, before.title);
        assert_eq!(card.card_type, before.card_type);
        assert_eq!(card.image_url, before.image_url);
        assert_eq!(card.source_url, before.source_url);
        assert_eq!(card.created_at, before.created_at);
        assert_eq!(card.id, before.id);
    }

    #[test]
    fn test_apply_can_clear_optional_fields() {
        let mut card = sample_card();
        card.apply(
            CardPatch {
                image_url: Some(None),
                ..Default::default()
            },
            2_000,
        );
        assert!(card.image_url.is_none());
        assert!(card.source_url.is_some());
    }

    #[test]
    fn test_apply_never_moves_updated_at_backwards() {
        let mut card = sample_card();
        card.apply(CardPatch::default(), 500);
        assert_eq!(card.updated_at, 1_000);
        assert!(card.created_at <= card.updated_at);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(CardPatch::default().is_empty());
        let patch = CardPatch {
            card_type: Some(CardCategory::Tech),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_fallback_suggestion() {
        let suggestion = CardSuggestion::fallback("https://example.com/post");
        assert_eq!(suggestion.title.as_deref(), Some(FALLBACK_TITLE));
        assert_eq!(suggestion.card_type, Some(CardCategory::Other));
        assert_eq!(suggestion.source_url, "https://example.com/post");
        assert!(suggestion.image_url.is_empty());
        assert!(suggestion.essence.is_none());
    }

    #[test]
    fn test_card_serialization() {
        let card = sample_card();
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"card_type\":\"pattern\""));
        let deserialized: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(card, deserialized);
    }
}
