//! Ranked shopping-index queries derived from a product URL.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:html?|php|aspx?|jsp|cfm)$").expect("valid regex"));
static TOKEN_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_+\s]+").expect("valid regex"));

/// Path segments that never carry a product name.
const SKIP_SEGMENTS: &[&str] = &[
    "p", "dp", "gp", "product", "products", "item", "items", "shop", "buy", "pd", "ip", "en",
    "us", "en-us", "s", "catalog", "collections",
];
const NAME_PARAMS: &[&str] = &["q", "name", "product", "title"];
const ID_PARAMS: &[&str] = &["pid", "productId", "sku", "id", "itemId"];
const MIN_ID_DIGITS: usize = 5;

/// Where a query's text came from, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    OgTitle,
    UrlName,
    ProductId,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStrategy {
    pub query_text: String,
    pub source: QuerySource,
    pub exact_match: bool,
}

/// Host without `www.`, lowercased.
#[must_use]
pub fn bare_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    host.strip_prefix("www.").map_or(host.clone(), str::to_string)
}

/// Product name and numeric id guessed from the URL path.
///
/// `/shop/product-name-1234567.html` yields `("product name", "1234567")`.
#[must_use]
pub fn parse_slug(url: &Url) -> (Option<String>, Option<String>) {
    let segments: Vec<String> = url
        .path_segments()
        .map(|s| {
            s.filter(|seg| !seg.is_empty())
                .map(|seg| percent_decode_str(seg).decode_utf8_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let mut name = None;
    let mut id = None;

    for segment in segments.iter().rev() {
        let segment = EXTENSION_RE.replace(segment, "");
        if SKIP_SEGMENTS
            .iter()
            .any(|s| segment.eq_ignore_ascii_case(s))
        {
            continue;
        }
        if is_numeric_id(&segment) {
            id.get_or_insert_with(|| segment.to_string());
            continue;
        }

        let mut tokens: Vec<&str> = TOKEN_SPLIT_RE
            .split(&segment)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.last().is_some_and(|t| is_numeric_id(t)) {
            if let Some(last) = tokens.pop() {
                id.get_or_insert_with(|| last.to_string());
            }
        }
        let is_name = tokens
            .iter()
            .any(|t| t.len() >= 3 && t.chars().all(char::is_alphabetic));
        if name.is_none() && is_name {
            name = Some(tokens.join(" "));
        }
        if name.is_some() && id.is_some() {
            break;
        }
    }

    (name, id)
}

fn is_numeric_id(s: &str) -> bool {
    s.len() >= MIN_ID_DIGITS && s.chars().all(|c| c.is_ascii_digit())
}

/// The name carried by `og:title`, without a trailing ` | Site` suffix.
#[must_use]
pub fn title_name(og_title: &str) -> Option<String> {
    let name = og_title.split(" | ").next().unwrap_or(og_title).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Builds the ordered, deduplicated query list for `url`.
#[must_use]
pub fn build_query_strategies(url: &Url, og_title: Option<&str>) -> Vec<QueryStrategy> {
    let domain = bare_domain(url);
    let mut strategies: Vec<QueryStrategy> = Vec::with_capacity(4);
    let mut push = |query_text: String, source: QuerySource, exact_match: bool| {
        let query_text = query_text.trim().to_string();
        if !query_text.is_empty() && !strategies.iter().any(|s| s.query_text == query_text) {
            strategies.push(QueryStrategy {
                query_text,
                source,
                exact_match,
            });
        }
    };

    if let Some(name) = og_title.and_then(title_name) {
        push(format!("\"{name}\" {domain}"), QuerySource::OgTitle, true);
    }

    let (slug_name, slug_id) = parse_slug(url);
    let param = |keys: &[&str]| {
        url.query_pairs()
            .find(|(k, v)| keys.iter().any(|key| *key == *k) && !v.trim().is_empty())
            .map(|(_, v)| v.into_owned())
    };

    if let Some(name) = param(NAME_PARAMS).or(slug_name) {
        push(format!("{name} {domain}"), QuerySource::UrlName, false);
    }

    let param_id = param(ID_PARAMS).filter(|v| is_numeric_id(v.trim()));
    if let Some(id) = slug_id.or(param_id) {
        push(format!("{} {domain}", id.trim()), QuerySource::ProductId, true);
    }

    push(format!("product {domain}"), QuerySource::Generic, false);

    strategies
}
