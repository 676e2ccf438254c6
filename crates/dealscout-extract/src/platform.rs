//! High-trust price extraction from storefront product JSON and price microdata.
//!
//! Only two conventions are trusted:
//!
//! - Shopify-style product JSON in a tagged script block
//!   (`<script type="application/json" data-product-json>` or
//!   `id="ProductJson-…"`), with variant prices in cents.
//! - `itemprop="price"` microdata carrying a `content` attribute.
//!
//! Strikethrough and class-name heuristics are deliberately absent; pages
//! without either convention fall through to the oracle.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::html::{extract_attr, has_attr};
use crate::price::{from_cents, parse_price_str};
use crate::types::PricePair;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").expect("valid regex")
});
static ITEMPROP_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[a-z]+\b[^>]*\bitemprop\s*=\s*["'](?:price|lowPrice)["'][^>]*>"#)
        .expect("valid regex")
});

/// Confidence assigned to a deterministic price match.
pub const PLATFORM_CONFIDENCE: u8 = 88;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    ProductJson,
    Microdata,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::ProductJson => f.write_str("product_json"),
            PriceSource::Microdata => f.write_str("microdata"),
        }
    }
}

/// A price pair read from a trusted platform convention.
///
/// Always incomplete: name and image come from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformPrice {
    pub prices: PricePair,
    pub source: PriceSource,
    pub confidence: u8,
}

#[derive(Debug, Deserialize)]
struct EmbeddedProduct {
    #[serde(default)]
    variants: Vec<EmbeddedVariant>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedVariant {
    price: Option<i64>,
    compare_at_price: Option<i64>,
    #[serde(default = "default_available")]
    available: bool,
}

fn default_available() -> bool {
    true
}

/// Extracts a trusted price pair, product JSON first, then microdata.
#[must_use]
pub fn extract_platform_price(html: &str) -> Option<PlatformPrice> {
    product_json_price(html)
        .map(|prices| (prices, PriceSource::ProductJson))
        .or_else(|| microdata_price(html).map(|prices| (prices, PriceSource::Microdata)))
        .map(|(prices, source)| {
            tracing::debug!(%source, sale = %prices.sale(), "platform price matched");
            PlatformPrice {
                prices,
                source,
                confidence: PLATFORM_CONFIDENCE,
            }
        })
}

fn product_json_price(html: &str) -> Option<PricePair> {
    SCRIPT_RE.captures_iter(html).find_map(|cap| {
        let attrs = cap.get(1)?.as_str();
        let tagged = has_attr(attrs, "data-product-json")
            || extract_attr(attrs, "id").is_some_and(|id| id.starts_with("ProductJson-"));
        if !tagged {
            return None;
        }
        let product: EmbeddedProduct = match serde_json::from_str(cap.get(2)?.as_str().trim()) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(error = %e, "tagged product JSON did not parse");
                return None;
            }
        };
        let variant = product
            .variants
            .iter()
            .find(|v| v.available)
            .or_else(|| product.variants.first())?;
        let sale = from_cents(variant.price?)?;
        let original = variant.compare_at_price.and_then(from_cents);
        Some(PricePair::new(original, sale))
    })
}

fn microdata_price(html: &str) -> Option<PricePair> {
    ITEMPROP_PRICE_RE.find_iter(html).find_map(|m| {
        extract_attr(m.as_str(), "content")
            .as_deref()
            .and_then(parse_price_str)
            .map(PricePair::sale_only)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn reads_first_available_variant_in_cents() {
        let html = r#"
            <script type="application/json" data-product-json>
              {"id": 1, "title": "Tee", "variants": [
                {"price": 4500, "compare_at_price": 6000, "available": false},
                {"price": 3900, "compare_at_price": 6000, "available": true}
              ]}
            </script>"#;
        let found = extract_platform_price(html).unwrap();
        assert_eq!(found.source, PriceSource::ProductJson);
        assert_eq!(found.confidence, 88);
        assert_eq!(found.prices.sale(), dec("39.00"));
        assert_eq!(found.prices.original(), Some(dec("60.00")));
        assert_eq!(found.prices.percent_off(), 35);
    }

    #[test]
    fn falls_back_to_first_variant_when_none_available() {
        let html = r#"<script id="ProductJson-main" type="application/json">
            {"variants": [{"price": 1000, "available": false}, {"price": 900, "available": false}]}
        </script>"#;
        let found = extract_platform_price(html).unwrap();
        assert_eq!(found.prices.sale(), dec("10.00"));
        assert_eq!(found.prices.original(), None);
    }

    #[test]
    fn null_compare_at_price_is_sale_only() {
        let html = r#"<script type="application/json" data-product-json>
            {"variants": [{"price": 2500, "compare_at_price": null}]}</script>"#;
        let found = extract_platform_price(html).unwrap();
        assert_eq!(found.prices.original(), None);
    }

    #[test]
    fn untagged_json_script_is_ignored() {
        let html = r#"<script type="application/json">{"variants": [{"price": 2500}]}</script>"#;
        assert!(extract_platform_price(html).is_none());
    }

    #[test]
    fn reads_price_microdata() {
        let html = r#"<span itemprop="price" content="1,299.00">$1,299</span>"#;
        let found = extract_platform_price(html).unwrap();
        assert_eq!(found.source, PriceSource::Microdata);
        assert_eq!(found.prices.sale(), dec("1299.00"));
    }

    #[test]
    fn ignores_strikethrough_markup() {
        let html = r#"<s class="price--compare">$60</s><span class="price--sale">$39</span>"#;
        assert!(extract_platform_price(html).is_none());
    }
}
