//! Regex-level HTML helpers shared by the extractors.
//!
//! Nothing here builds a DOM. Tags are matched with patterns and attributes
//! are read from the matched tag text, which is enough for the meta tags,
//! images, and script blocks the extractors care about.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attr regex")
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|\d+);").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Returns the value of `attr` in a single tag's text, entity-decoded and trimmed.
///
/// Matching is case-insensitive on the attribute name. Boolean attributes
/// without a value are not reported.
#[must_use]
pub fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    ATTR_RE.captures_iter(tag).find_map(|c| {
        let name = c.get(1)?.as_str();
        if !name.eq_ignore_ascii_case(attr) {
            return None;
        }
        let value = c.get(2).or_else(|| c.get(3))?.as_str();
        Some(decode_entities(value).trim().to_string())
    })
}

/// `true` when the tag carries `attr`, with or without a value.
#[must_use]
pub fn has_attr(tag: &str, attr: &str) -> bool {
    let lower = tag.to_ascii_lowercase();
    let needle = attr.to_ascii_lowercase();
    lower
        .match_indices(&needle)
        .any(|(i, _)| {
            let before = lower[..i].chars().next_back();
            let after = lower[i + needle.len()..].chars().next();
            matches!(before, Some(c) if c.is_whitespace())
                && matches!(after, None | Some('=' | '>' | '/' | ' ' | '\t' | '\n' | '\r'))
        })
}

/// Content of the first `<meta>` whose `key_attr` equals `key_value`.
#[must_use]
pub fn find_meta_content(html: &str, key_attr: &str, key_value: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let key = extract_attr(tag, key_attr)?;
        if key.eq_ignore_ascii_case(key_value) {
            extract_attr(tag, "content").filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

/// Content of a meta tag keyed by either `property` or `name`.
#[must_use]
pub fn meta_content(html: &str, key: &str) -> Option<String> {
    find_meta_content(html, "property", key).or_else(|| find_meta_content(html, "name", key))
}

/// The page's `og:title`, falling back to `<title>`.
#[must_use]
pub fn page_title(html: &str) -> Option<String> {
    meta_content(html, "og:title").or_else(|| {
        TITLE_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| collapse_whitespace(&decode_entities(m.as_str())))
            .filter(|t| !t.is_empty())
    })
}

/// `og:image`, then `twitter:image`, resolved against `base`.
#[must_use]
pub fn image_hint(html: &str, base: &Url) -> Option<String> {
    meta_content(html, "og:image")
        .or_else(|| meta_content(html, "og:image:secure_url"))
        .or_else(|| meta_content(html, "twitter:image"))
        .and_then(|raw| absolutize_url(base, &raw))
}

/// Resolves a possibly relative (or protocol-relative) URL against `base`.
///
/// Only http(s) results are returned.
#[must_use]
pub fn absolutize_url(base: &Url, candidate: &str) -> Option<String> {
    let candidate = candidate.trim().replace("&amp;", "&");
    if candidate.is_empty() || candidate.starts_with("data:") {
        return None;
    }
    let joined = base.join(&candidate).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Decodes the handful of named entities seen in product markup plus numeric ones.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let named = input
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—");
    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |c: &regex::Captures<'_>| {
        let raw = &c[1];
        let code = if let Some(hex) = raw.strip_prefix('x') {
            u32::from_str_radix(hex, 16).ok()
        } else {
            raw.parse::<u32>().ok()
        };
        code.and_then(char::from_u32)
            .map_or_else(|| c[0].to_string(), |ch| ch.to_string())
    });
    // `&amp;` last so `&amp;lt;` stays `&lt;`.
    numeric.replace("&amp;", "&")
}

/// Removes tags and collapses whitespace.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    collapse_whitespace(&decode_entities(&TAG_RE.replace_all(html, " ")))
}

#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s, " ").trim().to_string()
}

/// Cuts `s` to at most `max_chars` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
