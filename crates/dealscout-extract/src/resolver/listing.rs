//! Pattern-based parsing of shopping-search result pages.
//!
//! The selectors track the class names the shopping index emits today; they
//! drift whenever the index ships new markup, and a drifted page simply
//! yields no listings.

use std::collections::HashSet;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;
use rust_decimal::Decimal;

use crate::html::{decode_entities, extract_attr, strip_tags};
use crate::price::parse_price_str;

static BLOCK_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<div\b[^>]*class\s*=\s*["'][^"']*\b(?:sh-dgr__content|sh-dlr__list-result|sh-dgr__grid-result|i0X6df|KZmu8e|u30d4)\b[^"']*["'][^>]*>"#,
    )
    .expect("valid regex")
});
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<h[34]\b[^>]*>(.*?)</h[34]>|class\s*=\s*["'][^"']*\b(?:tAxDx|Xjkr3b|EI11Pd)\b[^"']*["'][^>]*>(.*?)</"#,
    )
    .expect("valid regex")
});
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[$£€]|USD|CAD|EUR|GBP)\s?\d[\d,]*(?:\.\d{2})?").expect("valid regex")
});
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<a\b[^>]*>"#).expect("valid regex"));
static IMG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));
static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)class\s*=\s*["'][^"']*\b(?:aULzUe|IuHnof|E5ocAb|merchant)\b[^"']*["'][^>]*>(.*?)</"#,
    )
    .expect("valid regex")
});

const INDEX_BASE: &str = "https://www.google.com/";
const MAX_BLOCK_BYTES: usize = 8_000;

/// One result from a shopping-index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub price: Option<Decimal>,
    /// Merchant URL, unwrapped from redirect links.
    pub link: String,
    pub image_url: Option<String>,
    /// Merchant name as displayed by the index.
    pub source: Option<String>,
}

/// Extracts listings from results HTML, deduplicated by link.
#[must_use]
pub fn parse_listings(html: &str) -> Vec<Listing> {
    let starts: Vec<usize> = BLOCK_START_RE.find_iter(html).map(|m| m.start()).collect();
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for (i, &start) in starts.iter().enumerate() {
        let mut end = starts
            .get(i + 1)
            .copied()
            .unwrap_or(html.len())
            .min(start + MAX_BLOCK_BYTES)
            .min(html.len());
        while !html.is_char_boundary(end) {
            end -= 1;
        }
        let Some(listing) = parse_block(&html[start..end]) else {
            continue;
        };
        if seen.insert(listing.link.clone()) {
            listings.push(listing);
        }
    }

    tracing::debug!(blocks = starts.len(), listings = listings.len(), "parsed shopping listings");
    listings
}

fn parse_block(block: &str) -> Option<Listing> {
    let title = TITLE_RE
        .captures(block)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| strip_tags(m.as_str()))
        .filter(|t| !t.is_empty())?;

    let link = HREF_RE
        .find_iter(block)
        .filter_map(|m| extract_attr(m.as_str(), "href"))
        .find_map(|href| unwrap_link(&href))?;

    let text = strip_tags(block);
    let price = PRICE_RE
        .find(&text)
        .and_then(|m| parse_price_str(m.as_str()));

    let image_url = IMG_RE.find_iter(block).find_map(|m| {
        let tag = m.as_str();
        extract_attr(tag, "src")
            .or_else(|| extract_attr(tag, "data-src"))
            .filter(|src| src.starts_with("http"))
    });

    let source = SOURCE_RE
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| strip_tags(m.as_str()))
        .filter(|s| !s.is_empty());

    Some(Listing {
        title,
        price,
        link,
        image_url,
        source,
    })
}

/// Resolves `/url?q=<target>` redirects and relative links to absolute merchant URLs.
fn unwrap_link(href: &str) -> Option<String> {
    let href = decode_entities(href);
    let base = Url::parse(INDEX_BASE).ok()?;
    let url = base.join(&href).ok()?;

    let is_index = url
        .host_str()
        .is_some_and(|h| h == "google.com" || h.ends_with(".google.com"));
    if is_index {
        if url.path() == "/url" {
            let target = url
                .query_pairs()
                .find(|(k, _)| k == "q" || k == "url")
                .map(|(_, v)| percent_decode_str(&v).decode_utf8_lossy().into_owned())?;
            return target.starts_with("http").then_some(target);
        }
        return None;
    }
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
