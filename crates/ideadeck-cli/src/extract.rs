//! AI-assisted card extraction
//!
//! Sends a URL to a hosted generative model and asks for a title, an
//! essence and a category. Any failure degrades to
//! [`CardSuggestion::fallback`] so the create flow can always continue with
//! manual entry.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use ideadeck_core::{CardCategory, CardSuggestion, Config};

/// Request timeout in seconds
const EXTRACT_TIMEOUT: u64 = 20;

/// Something that can turn a URL into suggested card fields
pub trait SuggestionSource {
    async fn fetch(&self, url: &str) -> Result<CardSuggestion>;
}

/// Outcome of [`suggest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub suggestion: CardSuggestion,
    /// True when the source failed and `suggestion` is the fallback
    pub fell_back: bool,
}

/// Ask `source` for a suggestion, falling back on any error
///
/// Never fails: the fallback keeps the URL as the source link.
pub async fn suggest<S: SuggestionSource>(source: &S, url: &str) -> Extraction {
    match source.fetch(url).await {
        Ok(suggestion) => Extraction {
            suggestion,
            fell_back: false,
        },
        Err(e) => {
            warn!("AI extraction failed for {}: {:#}", url, e);
            Extraction {
                suggestion: CardSuggestion::fallback(url),
                fell_back: true,
            }
        }
    }
}

/// Generative Language API client
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
            endpoint: config.ai_endpoint.clone(),
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl SuggestionSource for GeminiExtractor {
    async fn fetch(&self, url: &str) -> Result<CardSuggestion> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("API key is missing. Set IDEADECK_AI_API_KEY or API_KEY."))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(EXTRACT_TIMEOUT))
            .user_agent(concat!("IdeaDeck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!("Requesting extraction for {} with model {}", url, self.model);

        let response = client
            .post(self.request_url())
            .header("x-goog-api-key", api_key)
            .json(&request_body(url))
            .send()
            .await
            .context("Request to AI service failed")?
            .error_for_status()
            .context("AI service returned an error")?;

        let body: GenerateResponse = response
            .json()
            .await
            .context("AI service returned an unreadable body")?;

        parse_response(body, url)
    }
}

fn prompt(url: &str) -> String {
    format!(
        "Analyze the following URL: {url}\n\n\
         Extract or generate the following information for an \"Idea Card\":\n\
         1. A concise Title (max 50 chars).\n\
         2. An Essence (summary, max 2 sentences).\n\
         3. The most appropriate Card Type from this list: [{}].\n\n\
         Return the response in JSON format.",
        category_tags().join(", ")
    )
}

fn category_tags() -> Vec<&'static str> {
    CardCategory::ALL.iter().map(|c| c.as_str()).collect()
}

fn request_body(url: &str) -> serde_json::Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt(url) }]
        }],
        // Lets the model read the page instead of guessing from the URL
        "tools": [{ "googleSearch": {} }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "essence": { "type": "STRING" },
                    "card_type": { "type": "STRING", "enum": category_tags() }
                },
                "required": ["title", "essence", "card_type"]
            }
        }
    })
}

// ==================== Response parsing ====================

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedFields {
    title: Option<String>,
    essence: Option<String>,
    card_type: Option<String>,
}

fn parse_response(body: GenerateResponse, url: &str) -> Result<CardSuggestion> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        bail!("No response from AI");
    }

    let fields: ExtractedFields =
        serde_json::from_str(strip_code_fence(&text)).context("AI response is not valid JSON")?;

    let card_type = fields
        .card_type
        .map(|tag| tag.parse::<CardCategory>())
        .transpose()?;

    Ok(CardSuggestion {
        title: non_empty(fields.title),
        essence: non_empty(fields.essence),
        card_type,
        source_url: url.to_string(),
        image_url: String::new(),
    })
}

/// Remove a surrounding ```json fence if the model added one
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
