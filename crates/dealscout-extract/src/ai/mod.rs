//! Oracle-backed extraction for pages without complete structured data.

pub mod fragments;
pub mod prompt;
pub mod response;

use reqwest::Url;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::backends::Oracle;
use crate::error::ExtractError;
use crate::html::{image_hint, truncate_chars};
use crate::types::PricePair;

pub use fragments::select_fragments;
pub use prompt::Platform;
pub use response::{parse_oracle_response, strip_code_fences};

/// Upper bound on the characters of page material sent to the oracle.
pub const MAX_INPUT_CHARS: usize = 50_000;
/// Confidence assumed when the oracle does not report one.
pub const DEFAULT_ORACLE_CONFIDENCE: u8 = 50;

/// What the oracle is asked to read.
#[derive(Debug, Clone)]
pub enum AiInput {
    /// A partial JSON-LD product to complete.
    Structured(Value),
    /// Selected HTML fragments.
    Fragments(String),
}

/// Everything one oracle call needs.
#[derive(Debug, Clone)]
pub struct AiRequest<'a> {
    pub page_url: &'a Url,
    pub input: AiInput,
    pub image_hint: Option<String>,
    /// Deterministic prices the oracle must not override.
    pub ground_truth: Option<PricePair>,
    pub platform: Option<Platform>,
    pub domain_hints: Option<&'a str>,
}

impl<'a> AiRequest<'a> {
    /// Builds a request from page HTML, preferring a partial structured object
    /// as input when one is given.
    #[must_use]
    pub fn for_page(page_url: &'a Url, html: &str, partial: Option<&Value>) -> Self {
        let input = match partial {
            Some(raw) => {
                let text = raw.to_string();
                if text.chars().count() <= MAX_INPUT_CHARS {
                    AiInput::Structured(raw.clone())
                } else {
                    AiInput::Fragments(truncate_chars(&text, MAX_INPUT_CHARS).to_string())
                }
            }
            None => AiInput::Fragments(select_fragments(html, MAX_INPUT_CHARS)),
        };
        Self {
            page_url,
            input,
            image_hint: image_hint(html, page_url),
            ground_truth: None,
            platform: Platform::detect(html),
            domain_hints: None,
        }
    }

    #[must_use]
    pub fn with_ground_truth(mut self, prices: Option<PricePair>) -> Self {
        self.ground_truth = prices;
        self
    }

    #[must_use]
    pub fn with_domain_hints(mut self, hints: Option<&'a str>) -> Self {
        self.domain_hints = hints;
        self
    }
}

/// An oracle answer that passed schema validation. Prices are not yet sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct AiProduct {
    pub name: String,
    pub brand: Option<String>,
    pub image_url: String,
    pub original_price: Option<Decimal>,
    pub sale_price: Decimal,
    pub confidence: u8,
}

/// Runs one oracle call and validates the answer.
///
/// # Errors
///
/// Oracle transport errors pass through; response errors are those of
/// [`parse_oracle_response`].
pub async fn extract_with_oracle(
    oracle: &dyn Oracle,
    request: &AiRequest<'_>,
) -> Result<AiProduct, ExtractError> {
    let system = prompt::system_prompt(request);
    let user = prompt::user_prompt(request);
    tracing::debug!(
        url = %request.page_url,
        input_chars = user.len(),
        platform = ?request.platform,
        has_ground_truth = request.ground_truth.is_some(),
        "calling extraction oracle"
    );
    let raw = oracle.complete(&system, &user).await?;
    parse_oracle_response(&raw, request.page_url)
}
