//! Result types shared by every extraction tier.
//!
//! ## Price invariants
//!
//! A [`PricePair`] can only be built through [`PricePair::new`], which drops an
//! original ("was") price that does not strictly exceed the sale price. The
//! discount is always derived from the pair, never stored independently, so
//! `percent_off` cannot drift from the prices it describes:
//!
//! - original present: `round((original - sale) / original * 100)`, half away from zero
//! - original absent: `0`

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::classify::ErrorClass;

/// A validated original/sale price pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePair {
    original: Option<Decimal>,
    sale: Decimal,
}

impl PricePair {
    /// Builds a pair, discarding `original` unless it is strictly greater than `sale`.
    #[must_use]
    pub fn new(original: Option<Decimal>, sale: Decimal) -> Self {
        Self {
            original: original.filter(|o| *o > sale),
            sale,
        }
    }

    #[must_use]
    pub fn sale_only(sale: Decimal) -> Self {
        Self::new(None, sale)
    }

    #[must_use]
    pub fn original(&self) -> Option<Decimal> {
        self.original
    }

    #[must_use]
    pub fn sale(&self) -> Decimal {
        self.sale
    }

    #[must_use]
    pub fn percent_off(&self) -> u8 {
        self.original.map_or(0, |o| percent_off(o, self.sale))
    }
}

/// Discount percentage from `original` down to `sale`, rounded half away from zero.
///
/// Returns `0` when `original` is not a positive amount above `sale`.
#[must_use]
pub fn percent_off(original: Decimal, sale: Decimal) -> u8 {
    if original <= Decimal::ZERO || original <= sale {
        return 0;
    }
    let pct = ((original - sale) / original * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    pct.to_u8().unwrap_or(0).min(100)
}

/// A product extracted from a single URL, ready for curator review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    pub name: String,
    pub brand: Option<String>,
    pub image_url: String,
    original_price: Option<Decimal>,
    sale_price: Decimal,
    percent_off: u8,
    pub source_url: String,
    /// 0–100 estimate of extraction correctness.
    pub confidence: u8,
}

impl ProductCandidate {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        image_url: impl Into<String>,
        prices: PricePair,
        source_url: impl Into<String>,
        confidence: u8,
    ) -> Self {
        Self {
            name: name.into(),
            brand: None,
            image_url: image_url.into(),
            original_price: prices.original(),
            sale_price: prices.sale(),
            percent_off: prices.percent_off(),
            source_url: source_url.into(),
            confidence: confidence.min(100),
        }
    }

    #[must_use]
    pub fn with_brand(mut self, brand: Option<String>) -> Self {
        self.brand = brand.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn set_prices(&mut self, prices: PricePair) {
        self.original_price = prices.original();
        self.sale_price = prices.sale();
        self.percent_off = prices.percent_off();
    }

    #[must_use]
    pub fn prices(&self) -> PricePair {
        PricePair::new(self.original_price, self.sale_price)
    }

    #[must_use]
    pub fn original_price(&self) -> Option<Decimal> {
        self.original_price
    }

    #[must_use]
    pub fn sale_price(&self) -> Decimal {
        self.sale_price
    }

    #[must_use]
    pub fn percent_off(&self) -> u8 {
        self.percent_off
    }

    /// `true` when name, image, and a positive sale price are all present.
    #[must_use]
    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.image_url.trim().is_empty()
            && self.sale_price > Decimal::ZERO
    }
}

/// Step of the cascade where a result was produced or a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Validation,
    Fetch,
    StructuredData,
    Platform,
    Ai,
    Confidence,
    Search,
    Render,
    Headless,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Validation => "validation",
            Phase::Fetch => "fetch",
            Phase::StructuredData => "structured_data",
            Phase::Platform => "platform",
            Phase::Ai => "ai",
            Phase::Confidence => "confidence",
            Phase::Search => "search",
            Phase::Render => "render",
            Phase::Headless => "headless",
        };
        f.write_str(s)
    }
}

/// How the winning candidate of a tier was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Complete JSON-LD Product markup, no oracle call.
    JsonLd,
    /// Partial JSON-LD object completed by the oracle.
    JsonLdAi,
    /// Platform price pair as ground truth, oracle for name and image.
    PlatformAi,
    /// Oracle over selected HTML fragments.
    HtmlAi,
    /// Shopping-index listing used as a fallback.
    SearchListing,
    /// Opaque headless-browser backend.
    Headless,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExtractionMethod::JsonLd => "json_ld",
            ExtractionMethod::JsonLdAi => "json_ld_ai",
            ExtractionMethod::PlatformAi => "platform_ai",
            ExtractionMethod::HtmlAi => "html_ai",
            ExtractionMethod::SearchListing => "search_listing",
            ExtractionMethod::Headless => "headless",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// Produced a candidate that failed the acceptance predicate.
    LowConfidence,
    Failed,
    /// The tier's backend is not configured.
    Skipped,
}

/// One entry of the per-call attempt log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionAttempt {
    pub strategy_name: String,
    pub outcome: AttemptOutcome,
    pub confidence: u8,
    pub duration_ms: u64,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ExtractionMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ErrorClass>,
}

/// Extra detail included when `enable_test_metadata` is set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub accept_confidence: u8,
    pub min_confidence: u8,
    pub max_attempts: u32,
    pub notes: Vec<DiagnosticNote>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticNote {
    pub strategy: String,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMeta {
    /// `"<tier>:<method>"` of the returned candidate, if any.
    pub extraction_method: Option<String>,
    pub confidence: u8,
    pub total_duration_ms: u64,
    pub request_id: uuid::Uuid,
    pub attempts: Vec<ExtractionAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

/// The structured answer returned for every URL, success or not.
///
/// On failure `product` may still carry the best low-confidence candidate so
/// a curator can review it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub success: bool,
    pub product: Option<ProductCandidate>,
    pub error: Option<String>,
    pub error_classification: Option<ErrorClass>,
    pub meta: ExtractionMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn percent_off_rounds_half_away_from_zero() {
        // (435 - 131) / 435 = 69.885…%
        assert_eq!(percent_off(dec("435"), dec("131")), 70);
        // (200 - 199) / 200 = 0.5%
        assert_eq!(percent_off(dec("200"), dec("199")), 1);
        assert_eq!(percent_off(dec("100"), dec("75")), 25);
    }

    #[test]
    fn percent_off_is_zero_without_a_real_discount() {
        assert_eq!(percent_off(dec("50"), dec("80")), 0);
        assert_eq!(percent_off(dec("50"), dec("50")), 0);
        assert_eq!(percent_off(Decimal::ZERO, dec("10")), 0);
    }

    #[test]
    fn price_pair_drops_original_not_above_sale() {
        let inverted = PricePair::new(Some(dec("50")), dec("80"));
        assert_eq!(inverted.original(), None);
        assert_eq!(inverted.percent_off(), 0);

        let equal = PricePair::new(Some(dec("80")), dec("80"));
        assert_eq!(equal.original(), None);
    }

    #[test]
    fn price_pair_keeps_valid_original() {
        let pair = PricePair::new(Some(dec("120.00")), dec("90.00"));
        assert_eq!(pair.original(), Some(dec("120.00")));
        assert_eq!(pair.sale(), dec("90.00"));
        assert_eq!(pair.percent_off(), 25);
    }

    #[test]
    fn candidate_invariants_hold_for_a_range_of_prices() {
        let pairs = [
            ("435", "131"),
            ("19.99", "9.99"),
            ("10", "10"),
            ("5", "7.50"),
            ("1000", "999.99"),
            ("89.5", "44.75"),
        ];
        for (original, sale) in pairs {
            let candidate = ProductCandidate::new(
                "Thing",
                "https://cdn.example.com/a.jpg",
                PricePair::new(Some(dec(original)), dec(sale)),
                "https://example.com/p",
                80,
            );
            match candidate.original_price() {
                Some(o) => {
                    assert!(o > candidate.sale_price());
                    assert_eq!(candidate.percent_off(), percent_off(o, candidate.sale_price()));
                }
                None => assert_eq!(candidate.percent_off(), 0),
            }
        }
    }

    #[test]
    fn set_prices_recomputes_discount() {
        let mut candidate = ProductCandidate::new(
            "Thing",
            "https://cdn.example.com/a.jpg",
            PricePair::sale_only(dec("10")),
            "https://example.com/p",
            80,
        );
        assert_eq!(candidate.percent_off(), 0);
        candidate.set_prices(PricePair::new(Some(dec("20")), dec("10")));
        assert_eq!(candidate.percent_off(), 50);
    }

    #[test]
    fn confidence_is_capped_at_100() {
        let candidate = ProductCandidate::new(
            "Thing",
            "https://cdn.example.com/a.jpg",
            PricePair::sale_only(dec("10")),
            "https://example.com/p",
            250,
        );
        assert_eq!(candidate.confidence, 100);
    }

    #[test]
    fn blank_brand_is_dropped() {
        let candidate = ProductCandidate::new(
            "Thing",
            "https://cdn.example.com/a.jpg",
            PricePair::sale_only(dec("10")),
            "https://example.com/p",
            80,
        )
        .with_brand(Some("  ".to_string()));
        assert_eq!(candidate.brand, None);
    }

    #[test]
    fn candidate_serializes_camel_case() {
        let candidate = ProductCandidate::new(
            "Wool Coat",
            "https://cdn.site.com/a.jpg",
            PricePair::new(Some(dec("435")), dec("131")),
            "https://site.com/p/wool-coat",
            95,
        );
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["imageUrl"], "https://cdn.site.com/a.jpg");
        assert_eq!(json["percentOff"], 70);
        assert_eq!(json["originalPrice"], "435");
        assert_eq!(json["salePrice"], "131");
    }
}
