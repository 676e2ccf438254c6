//! schema.org `Product` extraction from JSON-LD script blocks.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::price::parse_price_value;
use crate::types::{PricePair, ProductCandidate};

static JSONLD_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// Confidence assigned to a complete JSON-LD product.
pub const STRUCTURED_CONFIDENCE: u8 = 95;

/// A `Product` item found in JSON-LD, complete or not.
#[derive(Debug, Clone)]
pub struct StructuredProduct {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub prices: Option<PricePair>,
    /// `true` when name, image and a sale price all resolved.
    pub complete: bool,
    /// 95 when complete, otherwise 0.
    pub confidence: u8,
    /// Irregularities worth surfacing in diagnostics, e.g. swapped offer prices.
    pub anomalies: Vec<String>,
    /// The matched JSON-LD object, reused as oracle input when incomplete.
    pub raw: Value,
}

impl StructuredProduct {
    /// Converts a complete product into a candidate. `None` when incomplete.
    #[must_use]
    pub fn to_candidate(&self, source_url: &str) -> Option<ProductCandidate> {
        if !self.complete {
            return None;
        }
        let candidate = ProductCandidate::new(
            self.name.clone()?,
            self.image_url.clone()?,
            self.prices?,
            source_url,
            self.confidence,
        )
        .with_brand(self.brand.clone());
        Some(candidate)
    }
}

/// Scans `html` for JSON-LD `Product` items and extracts the best one.
///
/// `@graph` containers and top-level arrays are flattened. When several
/// products are present the first complete one wins, else the first found.
/// Returns `None` when no `Product` item exists or every block is malformed.
#[must_use]
pub fn extract_structured(html: &str) -> Option<StructuredProduct> {
    let mut first: Option<StructuredProduct> = None;

    for cap in JSONLD_SCRIPT_RE.captures_iter(html) {
        let Some(body) = cap.get(1) else { continue };
        let value: Value = match serde_json::from_str(body.as_str().trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed JSON-LD block");
                continue;
            }
        };

        for item in flatten_items(&value) {
            if !is_product(item) {
                continue;
            }
            let product = product_from_item(item);
            if product.complete {
                return Some(product);
            }
            if first.is_none() {
                first = Some(product);
            }
        }
    }

    first
}

fn flatten_items(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    collect_items(value, &mut out);
    out
}

fn collect_items<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_items(item, out);
            }
        }
        Value::Object(map) => {
            out.push(value);
            if let Some(graph) = map.get("@graph") {
                collect_items(graph, out);
            }
        }
        _ => {}
    }
}

/// `@type` may be a string or an array of strings.
fn is_product(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => type_is_product(s),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(type_is_product),
        _ => false,
    }
}

fn type_is_product(t: &str) -> bool {
    let t = t.rsplit('/').next().unwrap_or(t);
    t.eq_ignore_ascii_case("Product") || t.eq_ignore_ascii_case("ProductGroup")
}

fn product_from_item(item: &Value) -> StructuredProduct {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .map(|s| crate::html::collapse_whitespace(&crate::html::decode_entities(s)))
        .filter(|s| !s.is_empty());
    let brand = brand_of(item);
    let image_url = item.get("image").and_then(image_of);

    let mut anomalies = Vec::new();
    let prices = item
        .get("offers")
        .and_then(first_offer)
        .and_then(|offer| prices_of(offer, &mut anomalies));

    let complete = name.is_some() && image_url.is_some() && prices.is_some();

    StructuredProduct {
        name,
        brand,
        image_url,
        prices,
        complete,
        confidence: if complete { STRUCTURED_CONFIDENCE } else { 0 },
        anomalies,
        raw: item.clone(),
    }
}

fn brand_of(item: &Value) -> Option<String> {
    match item.get("brand")? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        Value::Array(items) => items.first().and_then(|b| match b {
            Value::String(s) => Some(s.trim().to_string()),
            other => other.get("name").and_then(Value::as_str).map(str::to_string),
        }),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

fn image_of(image: &Value) -> Option<String> {
    match image {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        Value::Array(items) => items.iter().find_map(|i| {
            let url = match i {
                Value::String(s) => Some(s.as_str()),
                other => other.get("url").and_then(Value::as_str),
            }?;
            url.starts_with("http").then(|| url.to_string())
        }),
        _ => None,
    }
}

fn first_offer(offers: &Value) -> Option<&Value> {
    match offers {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(offers),
        _ => None,
    }
}

fn prices_of(offer: &Value, anomalies: &mut Vec<String>) -> Option<PricePair> {
    let current = offer
        .get("price")
        .and_then(parse_price_value)
        .or_else(|| offer.get("lowPrice").and_then(parse_price_value))?;

    let compare = offer
        .get("highPrice")
        .and_then(parse_price_value)
        .or_else(|| {
            let spec = offer.get("priceSpecification")?;
            let spec = match spec {
                Value::Array(items) => items.first()?,
                other => other,
            };
            spec.get("price").and_then(parse_price_value)
        });

    match compare {
        Some(compare) if compare < current => {
            tracing::warn!(
                %compare,
                %current,
                "JSON-LD compare price is below the current price; swapping"
            );
            anomalies.push(format!(
                "swapped JSON-LD offer prices: compare {compare} < current {current}"
            ));
            Some(PricePair::new(Some(current), compare))
        }
        other => Some(PricePair::new(other, current)),
    }
}

#[cfg(test)]
#[path = "structured_test.rs"]
mod tests;
