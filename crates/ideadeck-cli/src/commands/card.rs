//! Card command handlers

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;

use ideadeck_core::{
    filter_cards, Card, CardCategory, CardPatch, CardQuery, CardStore, CardSuggestion,
    CategoryFilter, NewCard,
};

use crate::extract::{suggest, SuggestionSource};
use crate::image::encode_image_file;
use crate::output::{short_id, Output};
use crate::prompt::{confirm, is_interactive, prompt_with_default};

/// Longest essence accepted from the command line
pub const MAX_ESSENCE_CHARS: usize = 280;

const EXTRACTION_FAILED: &str =
    "Could not extract data automatically. Please fill details manually.";

/// Card fields given as command-line flags
#[derive(Args, Debug, Clone, Default)]
pub struct CardFields {
    /// Card title
    #[arg(short = 'T', long)]
    pub title: Option<String>,
    /// Short summary (max 280 characters)
    #[arg(short, long)]
    pub essence: Option<String>,
    /// Category tag (ui, feature, insight, model, pattern, growth, tech, other)
    #[arg(short, long)]
    pub category: Option<CardCategory>,
    /// Image URL
    #[arg(long, conflicts_with = "image_file")]
    pub image: Option<String>,
    /// Local image to embed in the card
    #[arg(long)]
    pub image_file: Option<PathBuf>,
    /// Source link
    #[arg(short, long)]
    pub source: Option<String>,
}

impl CardFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.essence.is_none()
            && self.category.is_none()
            && self.image.is_none()
            && self.image_file.is_none()
            && self.source.is_none()
    }

    /// Fill fields the user left out from an extraction suggestion
    fn fill_from(&mut self, suggestion: CardSuggestion) {
        if self.title.is_none() {
            self.title = suggestion.title;
        }
        if self.essence.is_none() {
            self.essence = suggestion.essence;
        }
        if self.category.is_none() {
            self.category = suggestion.card_type;
        }
        if self.source.is_none() && !suggestion.source_url.is_empty() {
            self.source = Some(suggestion.source_url);
        }
    }

    /// The image URL, embedding `image_file` when given
    fn image_url(&self) -> Result<Option<String>> {
        match self.image_file {
            Some(ref path) => encode_image_file(path).map(Some),
            None => Ok(self.image.clone()),
        }
    }

    /// Validate and convert into store input
    fn into_new_card(self) -> Result<NewCard> {
        let image_url = self.image_url()?;
        let title = validate_title(self.title.as_deref().unwrap_or(""))?;
        let essence = self.essence.as_deref().map(validate_essence).transpose()?;

        Ok(NewCard {
            title,
            essence: essence.flatten(),
            card_type: self.category.unwrap_or(CardCategory::Other),
            image_url: image_url.and_then(non_empty),
            source_url: self.source.and_then(non_empty),
        })
    }

    /// Validate and convert into a patch; empty strings clear optional fields
    fn into_patch(self) -> Result<CardPatch> {
        let image_url = match (&self.image_file, &self.image) {
            (None, None) => None,
            _ => Some(self.image_url()?.and_then(non_empty)),
        };

        Ok(CardPatch {
            title: self.title.as_deref().map(validate_title).transpose()?,
            essence: self.essence.as_deref().map(validate_essence).transpose()?,
            card_type: self.category,
            image_url,
            source_url: self.source.map(non_empty),
        })
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        bail!("A title is required.");
    }
    Ok(title.to_string())
}

/// Returns `None` for a blank essence
fn validate_essence(essence: &str) -> Result<Option<String>> {
    let essence = essence.trim();
    let len = essence.chars().count();
    if len > MAX_ESSENCE_CHARS {
        bail!(
            "Essence is {} characters; the limit is {}.",
            len,
            MAX_ESSENCE_CHARS
        );
    }
    Ok(non_empty(essence.to_string()))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Create a new card
pub async fn create<S: SuggestionSource>(
    store: &CardStore,
    mut fields: CardFields,
    from_url: Option<String>,
    source: &S,
    output: &Output,
) -> Result<()> {
    if let Some(ref url) = from_url {
        let extraction = suggest(source, url).await;
        if extraction.fell_back {
            output.warn(EXTRACTION_FAILED);
        }
        fields.fill_from(extraction.suggestion);
    }

    if output.should_prompt() && is_interactive() && (from_url.is_some() || fields.title.is_none())
    {
        review(&mut fields)?;
    }

    let data = fields.into_new_card()?;
    let card = store.create(data).await.context("Failed to create card")?;

    output.success(&format!("Created card: {}", card.id));
    output.print_card(&card)?;

    Ok(())
}

/// Walk through each field, keeping the current value on empty input
fn review(fields: &mut CardFields) -> Result<()> {
    println!("Press Enter to keep the current value.\n");

    if let Some(title) = prompt_with_default("Title", fields.title.as_deref().unwrap_or(""))? {
        fields.title = Some(title);
    }
    if let Some(essence) =
        prompt_with_default("Essence", fields.essence.as_deref().unwrap_or(""))?
    {
        fields.essence = Some(essence);
    }

    let current = fields.category.unwrap_or(CardCategory::Other);
    if let Some(tag) = prompt_with_default("Category", current.as_str())? {
        fields.category = Some(tag.parse()?);
    }

    if fields.image_file.is_none() {
        let current = fields.image.as_deref().unwrap_or("");
        if let Some(image) = prompt_with_default("Image URL", current)? {
            fields.image = Some(image);
        }
    }
    if let Some(src) = prompt_with_default("Source URL", fields.source.as_deref().unwrap_or(""))? {
        fields.source = Some(src);
    }
    println!();

    Ok(())
}

/// List cards, optionally filtered by search text and category
pub async fn list(
    store: &CardStore,
    search: Option<String>,
    category: CategoryFilter,
    output: &Output,
) -> Result<()> {
    let cards = store.get_all().await.context("Failed to load cards")?;

    let query = CardQuery::new()
        .search(search.unwrap_or_default())
        .category(category);
    let visible = filter_cards(&cards, &query);

    output.print_cards(&visible, cards.len())
}

/// Show a single card
pub async fn show(store: &CardStore, id: String, output: &Output) -> Result<()> {
    let card = find_card(store, &id)
        .await?
        .ok_or_else(|| anyhow!("No card found matching: {}", id))?;

    output.print_card(&card)
}

/// Edit a card from flags, or interactively when no flags are given
pub async fn edit(
    store: &CardStore,
    id: String,
    fields: CardFields,
    output: &Output,
) -> Result<()> {
    let card = find_card(store, &id)
        .await?
        .ok_or_else(|| anyhow!("No card found matching: {}", id))?;

    let fields = if !fields.is_empty() {
        fields
    } else if output.should_prompt() && is_interactive() {
        println!("Editing card: {}", card.id);
        let mut current = fields_of(&card);
        review(&mut current)?;
        changed_fields(&card, current)
    } else {
        bail!("Nothing to update. Pass at least one field flag.");
    };

    let patch = fields.into_patch()?;
    if patch.is_empty() {
        output.message("No changes.");
        return Ok(());
    }

    let updated = store
        .update(&card.id, patch)
        .await
        .context("Failed to update card")?;

    output.success("Card updated");
    output.print_card(&updated)?;

    Ok(())
}

/// Current values of a card as editable fields
fn fields_of(card: &Card) -> CardFields {
    CardFields {
        title: Some(card.title.clone()),
        essence: card.essence.clone(),
        category: Some(card.card_type),
        image: card.image_url.clone(),
        image_file: None,
        source: card.source_url.clone(),
    }
}

/// Keep only the fields that differ from `card`
fn changed_fields(card: &Card, fields: CardFields) -> CardFields {
    fn differs(new: &Option<String>, old: &Option<String>) -> bool {
        new.as_deref().unwrap_or("") != old.as_deref().unwrap_or("")
    }

    CardFields {
        title: fields.title.filter(|t| *t != card.title),
        essence: fields.essence.clone().filter(|_| differs(&fields.essence, &card.essence)),
        category: fields.category.filter(|c| *c != card.card_type),
        image: fields.image.clone().filter(|_| differs(&fields.image, &card.image_url)),
        image_file: None,
        source: fields.source.clone().filter(|_| differs(&fields.source, &card.source_url)),
    }
}

/// Delete a card
///
/// An id that matches nothing is reported, not treated as an error.
pub async fn delete(store: &CardStore, id: String, yes: bool, output: &Output) -> Result<()> {
    let Some(card) = find_card(store, &id).await? else {
        output.message(&format!("No card found matching: {}", id));
        return Ok(());
    };

    if output.should_prompt() && !yes {
        println!("Delete card: {} - {}", short_id(&card.id), card.title);
        if !confirm("Are you sure you want to delete this card? This cannot be undone.")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store
        .delete(&card.id)
        .await
        .context("Failed to delete card")?;

    if removed {
        output.success(&format!("Deleted card: {}", card.id));
    } else {
        output.message(&format!("Card already gone: {}", card.id));
    }

    Ok(())
}

/// Find a card by full id or unique id prefix
async fn find_card(store: &CardStore, id: &str) -> Result<Option<Card>> {
    if let Some(card) = store.get(id).await.context("Failed to load card")? {
        return Ok(Some(card));
    }

    let cards = store.get_all().await.context("Failed to load cards")?;
    let mut matches: Vec<Card> = cards
        .into_iter()
        .filter(|c| c.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => {
            eprintln!("Multiple cards match '{}':", id);
            for card in &matches {
                eprintln!("  {} - {}", card.id, card.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use ideadeck_core::{SeedPolicy, StoreConfig};
    use tempfile::TempDir;

    const URL: &str = "https://example.com/post";

    struct FixedSource(Option<CardSuggestion>);

    impl SuggestionSource for FixedSource {
        async fn fetch(&self, _url: &str) -> Result<CardSuggestion> {
            self.0.clone().ok_or_else(|| anyhow!("offline"))
        }
    }

    fn create_test_store() -> (CardStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::new(temp_dir.path().join("cards.sqlite"))
            .with_seed_policy(SeedPolicy::Never);
        (CardStore::new(config), temp_dir)
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn titled(title: &str) -> CardFields {
        CardFields {
            title: Some(title.to_string()),
            ..CardFields::default()
        }
    }

    #[test]
    fn test_title_is_required() {
        assert!(CardFields::default().into_new_card().is_err());
        assert!(titled("   ").into_new_card().is_err());
        assert_eq!(titled("  Idea ").into_new_card().unwrap().title, "Idea");
    }

    #[test]
    fn test_essence_limit() {
        let mut fields = titled("Idea");
        fields.essence = Some("x".repeat(MAX_ESSENCE_CHARS));
        assert!(fields.clone().into_new_card().is_ok());

        fields.essence = Some("x".repeat(MAX_ESSENCE_CHARS + 1));
        assert!(fields.into_new_card().is_err());
    }

    #[test]
    fn test_new_card_defaults() {
        let mut fields = titled("Idea");
        fields.essence = Some("  ".to_string());
        fields.source = Some(String::new());

        let data = fields.into_new_card().unwrap();
        assert_eq!(data.card_type, CardCategory::Other);
        assert!(data.essence.is_none());
        assert!(data.source_url.is_none());
        assert!(data.image_url.is_none());
    }

    #[test]
    fn test_patch_clears_with_empty_strings() {
        let fields = CardFields {
            essence: Some(String::new()),
            source: Some(String::new()),
            category: Some(CardCategory::Tech),
            ..CardFields::default()
        };

        let patch = fields.into_patch().unwrap();
        assert_eq!(patch.title, None);
        assert_eq!(patch.essence, Some(None));
        assert_eq!(patch.source_url, Some(None));
        assert_eq!(patch.image_url, None);
        assert_eq!(patch.card_type, Some(CardCategory::Tech));
    }

    #[test]
    fn test_patch_rejects_blank_title() {
        assert!(titled("").into_patch().is_err());
    }

    #[test]
    fn test_explicit_flags_win_over_suggestion() {
        let mut fields = titled("Mine");
        fields.fill_from(CardSuggestion {
            title: Some("Theirs".to_string()),
            essence: Some("Suggested".to_string()),
            card_type: Some(CardCategory::Growth),
            source_url: URL.to_string(),
            image_url: String::new(),
        });

        assert_eq!(fields.title.as_deref(), Some("Mine"));
        assert_eq!(fields.essence.as_deref(), Some("Suggested"));
        assert_eq!(fields.category, Some(CardCategory::Growth));
        assert_eq!(fields.source.as_deref(), Some(URL));
    }

    #[test]
    fn test_changed_fields() {
        let card = Card::from_new(
            "abc".to_string(),
            NewCard::new("Title", CardCategory::Ui).with_essence("Essence"),
            1,
        );

        let mut fields = fields_of(&card);
        assert!(changed_fields(&card, fields.clone()).is_empty());

        fields.essence = Some("Changed".to_string());
        let changed = changed_fields(&card, fields);
        assert_eq!(changed.essence.as_deref(), Some("Changed"));
        assert!(changed.title.is_none());
    }

    #[tokio::test]
    async fn test_create_from_url_uses_suggestion() {
        let (store, _temp) = create_test_store();
        let source = FixedSource(Some(CardSuggestion {
            title: Some("Local-first".to_string()),
            essence: Some("Data lives on the device.".to_string()),
            card_type: Some(CardCategory::Insight),
            source_url: URL.to_string(),
            image_url: String::new(),
        }));

        create(&store, CardFields::default(), Some(URL.to_string()), &source, &quiet())
            .await
            .unwrap();

        let cards = store.get_all().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Local-first");
        assert_eq!(cards[0].card_type, CardCategory::Insight);
        assert_eq!(cards[0].source_url.as_deref(), Some(URL));
    }

    #[tokio::test]
    async fn test_create_from_url_falls_back() {
        let (store, _temp) = create_test_store();

        create(&store, CardFields::default(), Some(URL.to_string()), &FixedSource(None), &quiet())
            .await
            .unwrap();

        let cards = store.get_all().await.unwrap();
        assert_eq!(cards[0].title, "New Link");
        assert_eq!(cards[0].card_type, CardCategory::Other);
        assert_eq!(cards[0].source_url.as_deref(), Some(URL));
    }

    #[tokio::test]
    async fn test_find_card_by_prefix() {
        let (store, _temp) = create_test_store();
        let card = store
            .create(NewCard::new("Prefix", CardCategory::Tech))
            .await
            .unwrap();

        let found = find_card(&store, &card.id[..8]).await.unwrap().unwrap();
        assert_eq!(found.id, card.id);

        let exact = find_card(&store, &card.id).await.unwrap().unwrap();
        assert_eq!(exact.id, card.id);

        assert!(find_card(&store, "zzzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_card_ambiguous_prefix() {
        let (store, _temp) = create_test_store();
        store
            .create(NewCard::new("A", CardCategory::Tech))
            .await
            .unwrap();
        store
            .create(NewCard::new("B", CardCategory::Tech))
            .await
            .unwrap();

        // The empty prefix matches every card
        assert!(find_card(&store, "").await.is_err());
    }

    #[tokio::test]
    async fn test_edit_with_flags() {
        let (store, _temp) = create_test_store();
        let card = store
            .create(NewCard::new("Before", CardCategory::Ui).with_essence("Old"))
            .await
            .unwrap();

        let fields = CardFields {
            title: Some("After".to_string()),
            essence: Some(String::new()),
            ..CardFields::default()
        };
        edit(&store, card.id.clone(), fields, &quiet()).await.unwrap();

        let updated = store.get(&card.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "After");
        assert!(updated.essence.is_none());
        assert_eq!(updated.card_type, CardCategory::Ui);
        assert_eq!(updated.created_at, card.created_at);
    }

    #[tokio::test]
    async fn test_edit_without_flags_non_interactive() {
        let (store, _temp) = create_test_store();
        let card = store
            .create(NewCard::new("Card", CardCategory::Ui))
            .await
            .unwrap();

        assert!(edit(&store, card.id, CardFields::default(), &quiet())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_an_error() {
        let (store, _temp) = create_test_store();
        delete(&store, "missing".to_string(), false, &quiet())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_removes_card() {
        let (store, _temp) = create_test_store();
        let card = store
            .create(NewCard::new("Doomed", CardCategory::Other))
            .await
            .unwrap();

        delete(&store, card.id.clone(), false, &quiet()).await.unwrap();
        assert!(store.get(&card.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_does_not_fail_on_empty_library() {
        let (store, _temp) = create_test_store();
        list(&store, Some("ui".to_string()), CategoryFilter::All, &quiet())
            .await
            .unwrap();
    }
}
