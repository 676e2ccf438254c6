//! Price sanity, placeholder rejection, hallucination check and the confidence veto.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::ai::AiProduct;
use crate::error::ExtractError;
use crate::types::{PricePair, ProductCandidate};

/// Penalty for an original price that does not exceed the sale price.
pub const INVERTED_PRICE_PENALTY: u8 = 20;
/// [`INVERTED_PRICE_PENALTY`] never pushes confidence below this.
pub const INVERTED_PRICE_FLOOR: u8 = 30;
/// Penalty when no literal form of the sale price appears in the page.
pub const HALLUCINATION_PENALTY: u8 = 20;
/// Minimum confidence when a deterministic price pair overrides the oracle.
pub const GROUND_TRUTH_CONFIDENCE: u8 = 88;

/// Hosts that only ever serve stand-in images.
pub const PLACEHOLDER_HOSTS: &[&str] = &[
    "via.placeholder.com",
    "placeholder.com",
    "placehold.it",
    "placehold.co",
    "placekitten.com",
    "dummyimage.com",
    "picsum.photos",
    "placeimg.com",
    "fakeimg.pl",
    "lorempixel.com",
];

/// Acceptance and veto thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceThresholds {
    /// A tier result at or above this is accepted without escalation.
    pub accept: u8,
    /// Anything below this fails outright.
    pub minimum: u8,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            accept: 60,
            minimum: 50,
        }
    }
}

/// A scored candidate plus the reasons its confidence moved.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub candidate: ProductCandidate,
    pub notes: Vec<String>,
}

/// `true` when `url` is served by a known placeholder-image host.
#[must_use]
pub fn is_placeholder_image(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    PLACEHOLDER_HOSTS
        .iter()
        .any(|p| host == *p || host.ends_with(&format!(".{p}")))
}

/// Normalizes an original/sale pair, penalizing an inverted or equal original.
///
/// Returns the cleaned pair and the adjusted confidence. The penalty stops at
/// [`INVERTED_PRICE_FLOOR`] but never raises a score already below it.
#[must_use]
pub fn sanitize_price_pair(
    original: Option<Decimal>,
    sale: Decimal,
    confidence: u8,
) -> (PricePair, u8, Option<String>) {
    match original {
        Some(o) if o <= sale => {
            let penalized = if confidence <= INVERTED_PRICE_FLOOR {
                confidence
            } else {
                confidence
                    .saturating_sub(INVERTED_PRICE_PENALTY)
                    .max(INVERTED_PRICE_FLOOR)
            };
            tracing::warn!(
                original = %o,
                sale = %sale,
                confidence,
                penalized,
                "original price does not exceed sale price; dropping it"
            );
            (
                PricePair::sale_only(sale),
                penalized,
                Some(format!("original price {o} <= sale price {sale}; dropped")),
            )
        }
        other => (PricePair::new(other, sale), confidence, None),
    }
}

/// Literal renderings of `price` a page might contain.
///
/// Plain (`49.99`), two-decimal (`49.99`, `131.00`), comma-grouped
/// two-decimal (`1,299.00`), cents (`4999`), and whole dollars (`50`).
#[must_use]
pub fn price_literal_forms(price: Decimal) -> Vec<String> {
    let mut forms = Vec::with_capacity(5);
    let mut push = |s: String| {
        if !forms.contains(&s) {
            forms.push(s);
        }
    };

    push(price.normalize().to_string());

    let mut two = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    two.rescale(2);
    let two_decimal = two.to_string();
    push(group_thousands(&two_decimal));
    push(two_decimal);

    if let Some(cents) = two
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|c| c.to_i64())
    {
        push(cents.to_string());
    }

    push(
        price
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string(),
    );

    forms
}

fn group_thousands(two_decimal: &str) -> String {
    let (int_part, frac) = two_decimal.split_once('.').unwrap_or((two_decimal, "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    format!("{grouped}.{frac}")
}

/// `true` when at least one literal form of `sale` occurs in `html`.
#[must_use]
pub fn price_appears_in(sale: Decimal, html: &str) -> bool {
    price_literal_forms(sale)
        .iter()
        .any(|form| html.contains(form.as_str()))
}

/// Scores and validates an oracle answer.
///
/// With `ground_truth` the deterministic prices replace the oracle's and the
/// confidence is raised to at least [`GROUND_TRUTH_CONFIDENCE`]. Without it
/// the sale price must literally appear in `html` or the confidence drops by
/// exactly [`HALLUCINATION_PENALTY`].
///
/// # Errors
///
/// - [`ExtractError::PlaceholderImage`] for a stand-in image URL.
/// - [`ExtractError::LowConfidence`] when the final score is below `thresholds.minimum`.
pub fn assess(
    ai: &AiProduct,
    ground_truth: Option<PricePair>,
    html: &str,
    source_url: &str,
    thresholds: ConfidenceThresholds,
) -> Result<Assessment, ExtractError> {
    if is_placeholder_image(&ai.image_url) {
        return Err(ExtractError::PlaceholderImage {
            url: ai.image_url.clone(),
        });
    }

    let mut notes = Vec::new();

    let (prices, confidence) = if let Some(truth) = ground_truth {
        let confidence = ai.confidence.max(GROUND_TRUTH_CONFIDENCE);
        notes.push(format!(
            "deterministic prices used as ground truth (sale {})",
            truth.sale()
        ));
        (truth, confidence)
    } else {
        let (prices, mut confidence, note) =
            sanitize_price_pair(ai.original_price, ai.sale_price, ai.confidence);
        notes.extend(note);
        if !price_appears_in(prices.sale(), html) {
            let before = confidence;
            confidence = confidence.saturating_sub(HALLUCINATION_PENALTY);
            tracing::warn!(
                sale = %prices.sale(),
                before,
                after = confidence,
                "sale price not found in page; possible hallucination"
            );
            notes.push(format!(
                "sale price {} not found in page; confidence {before} -> {confidence}",
                prices.sale()
            ));
        }
        (prices, confidence)
    };

    if confidence < thresholds.minimum {
        return Err(ExtractError::LowConfidence {
            confidence,
            minimum: thresholds.minimum,
        });
    }

    let candidate = ProductCandidate::new(
        ai.name.clone(),
        ai.image_url.clone(),
        prices,
        source_url,
        confidence,
    )
    .with_brand(ai.brand.clone());

    Ok(Assessment { candidate, notes })
}

/// The hallucination check on its own, for candidates not built by [`assess`].
///
/// Returns the possibly reduced confidence and a note when the penalty applied.
#[must_use]
pub fn hallucination_check(sale: Decimal, html: &str, confidence: u8) -> (u8, Option<String>) {
    if price_appears_in(sale, html) {
        (confidence, None)
    } else {
        let after = confidence.saturating_sub(HALLUCINATION_PENALTY);
        (
            after,
            Some(format!(
                "price {sale} not found in source; confidence {confidence} -> {after}"
            )),
        )
    }
}

#[cfg(test)]
#[path = "confidence_test.rs"]
mod tests;
