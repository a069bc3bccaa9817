//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::Result;
use chrono::{Local, TimeZone};
use serde::Serialize;

use ideadeck_core::{Card, CardCategory};

use crate::image::is_data_url;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single card
    pub fn print_card(&self, card: &Card) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                let info = card.card_type.info();
                println!("ID:       {}", card.id);
                println!("Title:    {}", card.title);
                println!("Category: {} {}", info.icon, info.label);
                if let Some(ref essence) = card.essence {
                    println!("Essence:  {}", essence);
                }
                if let Some(ref source) = card.source_url {
                    println!("Source:   {}", source);
                }
                if let Some(ref image) = card.image_url {
                    println!("Image:    {}", describe_image(image));
                }
                println!("Created:  {}", format_millis(card.created_at));
                println!("Updated:  {}", format_millis(card.updated_at));
            }
            OutputFormat::Json => print_json(card)?,
            OutputFormat::Quiet => println!("{}", card.id),
        }
        Ok(())
    }

    /// Print a list of cards with the library size for context
    pub fn print_cards(&self, cards: &[Card], total: usize) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("{}", collected_summary(total));
                println!();
                if cards.is_empty() {
                    println!("No cards found.");
                    return Ok(());
                }
                for card in cards {
                    let info = card.card_type.info();
                    println!(
                        "{} | {} {:<8} | {} | {}",
                        short_id(&card.id),
                        info.icon,
                        info.label,
                        truncate(&card.title, 35),
                        truncate_line(card.essence_or_empty(), 45)
                    );
                }
                println!("\n{} card(s) shown", cards.len());
            }
            OutputFormat::Json => print_json(&cards)?,
            OutputFormat::Quiet => {
                for card in cards {
                    println!("{}", card.id);
                }
            }
        }
        Ok(())
    }

    /// Print categories with their display metadata and usage counts
    pub fn print_categories(&self, counts: &[(CardCategory, usize)]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                for (category, count) in counts {
                    let info = category.info();
                    println!(
                        "{} {:<8} {:<8} {:>3}",
                        info.icon,
                        info.label,
                        category.as_str(),
                        count
                    );
                }
            }
            OutputFormat::Json => {
                let json: Vec<_> = counts
                    .iter()
                    .map(|(category, count)| {
                        let info = category.info();
                        serde_json::json!({
                            "tag": category,
                            "label": info.label,
                            "icon": info.icon,
                            "frame_color": info.frame_color,
                            "count": count,
                        })
                    })
                    .collect();
                print_json(&json)?;
            }
            OutputFormat::Quiet => {
                for (category, _) in counts {
                    println!("{}", category);
                }
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warn(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// "N ideas collected" header for the library listing
fn collected_summary(total: usize) -> String {
    format!(
        "{} {} collected",
        total,
        if total == 1 { "idea" } else { "ideas" }
    )
}

/// First 8 characters of an id, for listings
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn describe_image(url: &str) -> String {
    if is_data_url(url) {
        format!("(embedded, {} bytes)", url.len())
    } else {
        url.to_string()
    }
}

fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
