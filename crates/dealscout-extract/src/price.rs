//! Lenient price parsing for values scraped out of markup and oracle output.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

/// Amounts above this are treated as parse garbage rather than prices.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid amount regex"));

/// Parses a positive amount from text such as `"$1,299.00"`, `"USD 45"`, or `"131"`.
///
/// Currency symbols and codes are ignored, thousands separators are dropped,
/// and the first numeric run wins. Returns `None` for zero, negative,
/// non-numeric, or implausibly large input.
#[must_use]
pub fn parse_price_str(raw: &str) -> Option<Decimal> {
    let m = AMOUNT_RE.find(raw.trim())?;
    let cleaned = m.as_str().replace(',', "");
    Decimal::from_str(&cleaned).ok().filter(is_plausible)
}

/// Parses a positive amount from a JSON number or string.
#[must_use]
pub fn parse_price_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64()
                    .and_then(|f| Decimal::from_str(&f.to_string()).ok())
            }
            .filter(is_plausible)
        }
        Value::String(s) => parse_price_str(s),
        _ => None,
    }
}

/// Converts an integer amount in minor units (cents) to a decimal.
#[must_use]
pub fn from_cents(cents: i64) -> Option<Decimal> {
    (cents > 0)
        .then(|| Decimal::new(cents, 2))
        .filter(is_plausible)
}

fn is_plausible(amount: &Decimal) -> bool {
    *amount > Decimal::ZERO && *amount <= MAX_PRICE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_plain_and_decorated_strings() {
        assert_eq!(parse_price_str("131"), Some(dec("131")));
        assert_eq!(parse_price_str("$1,299.00"), Some(dec("1299.00")));
        assert_eq!(parse_price_str("USD 45.5"), Some(dec("45.5")));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(parse_price_str("0.00"), None);
        assert_eq!(parse_price_str("free"), None);
        assert_eq!(parse_price_str(""), None);
    }

    #[test]
    fn parses_json_numbers_and_strings() {
        assert_eq!(parse_price_value(&serde_json::json!(435)), Some(dec("435")));
        assert_eq!(parse_price_value(&serde_json::json!(19.99)), Some(dec("19.99")));
        assert_eq!(parse_price_value(&serde_json::json!("19.99")), Some(dec("19.99")));
        assert_eq!(parse_price_value(&serde_json::json!(null)), None);
        assert_eq!(parse_price_value(&serde_json::json!(-5)), None);
    }

    #[test]
    fn rejects_implausibly_large_amounts() {
        assert_eq!(parse_price_value(&serde_json::json!(1e28)), None);
        assert_eq!(parse_price_str("99999999999999999999"), None);
        assert_eq!(parse_price_str("1,000,000,000"), Some(MAX_PRICE));
    }

    #[test]
    fn converts_cents() {
        assert_eq!(from_cents(13100), Some(dec("131.00")));
        assert_eq!(from_cents(0), None);
    }
}
