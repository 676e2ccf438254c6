//! Parsing and validation of oracle output.

use reqwest::Url;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use super::{AiProduct, DEFAULT_ORACLE_CONFIDENCE};
use crate::confidence::is_placeholder_image;
use crate::error::ExtractError;
use crate::html::absolutize_url;
use crate::price::parse_price_value;

/// Removes a surrounding Markdown code fence, if any.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses an oracle completion into an [`AiProduct`].
///
/// A relative `imageUrl` is resolved against `page_url`.
///
/// # Errors
///
/// - [`ExtractError::OracleResponse`] when the text is not a JSON object.
/// - [`ExtractError::OracleRefused`] when the object carries an `error` field.
/// - [`ExtractError::MissingFields`] when name, image or sale price is absent.
/// - [`ExtractError::PlaceholderImage`] when the image is a known stand-in.
pub fn parse_oracle_response(raw: &str, page_url: &Url) -> Result<AiProduct, ExtractError> {
    let text = strip_code_fences(raw);
    let value: Value = serde_json::from_str(text).map_err(|e| ExtractError::OracleResponse {
        reason: e.to_string(),
    })?;
    let Value::Object(obj) = value else {
        return Err(ExtractError::OracleResponse {
            reason: "expected a JSON object".to_string(),
        });
    };

    if let Some(err) = obj.get("error").filter(|v| !v.is_null()) {
        let reason = err
            .as_str()
            .map_or_else(|| err.to_string(), str::to_string);
        return Err(ExtractError::OracleRefused { reason });
    }

    let text_field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let name = text_field("name");
    let image_url = text_field("imageUrl").and_then(|raw| absolutize_url(page_url, &raw));
    let sale_price = obj.get("salePrice").and_then(parse_price_value);

    // A stand-in image fails the answer even when other fields are missing.
    if let Some(url) = image_url.as_ref().filter(|url| is_placeholder_image(url)) {
        return Err(ExtractError::PlaceholderImage { url: url.clone() });
    }

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push("name");
    }
    if image_url.is_none() {
        missing.push("imageUrl");
    }
    if sale_price.is_none() {
        missing.push("salePrice");
    }
    let (Some(name), Some(image_url), Some(sale_price)) = (name, image_url, sale_price) else {
        return Err(ExtractError::MissingFields { fields: missing });
    };

    Ok(AiProduct {
        name,
        brand: text_field("brand"),
        image_url,
        original_price: obj.get("originalPrice").and_then(parse_price_value),
        sale_price,
        confidence: obj
            .get("confidence")
            .map_or(DEFAULT_ORACLE_CONFIDENCE, parse_confidence),
    })
}

/// Reads a self-reported confidence, scaling fractional `0.0..=1.0` values to
/// percentages and clamping to `0..=100`.
fn parse_confidence(value: &Value) -> u8 {
    let Some(n) = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
    else {
        return DEFAULT_ORACLE_CONFIDENCE;
    };
    let scaled = if value.is_f64() && (0.0..=1.0).contains(&n) {
        n * 100.0
    } else {
        n
    };
    rust_decimal::Decimal::from_f64_retain(scaled.clamp(0.0, 100.0).round())
        .and_then(|d| d.to_u8())
        .unwrap_or(DEFAULT_ORACLE_CONFIDENCE)
}
