//! Selection of the HTML fragments most likely to carry name, price and image.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::html::{extract_attr, strip_tags, truncate_chars};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title>").expect("valid regex"));
static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>.*?</h1>").expect("valid regex"));
static JSON_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*type\s*=\s*["']application/(?:ld\+)?json["'][^>]*>.*?</script>"#)
        .expect("valid regex")
});
static ITEMPROP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<[a-z][a-z0-9]*\b[^>]*\bitemprop\s*=[^>]*>[^<]{0,200}").expect("valid regex")
});
static PRICE_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<[a-z][a-z0-9]*\b[^>]*\b(?:class|id|data-testid)\s*=\s*["'][^"']*(?:price|sale|compare|was-|original|regular|discount|product-title|product-name|product__title)[^"']*["'][^>]*>.{0,400}?</[a-z0-9]+>"#,
    )
    .expect("valid regex")
});
static IMG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));

const META_PREFIXES: &[&str] = &["og:", "twitter:", "product:"];
const IMG_MARKERS: &[&str] = &["product", "main", "primary", "hero", "zoom", "featured", "gallery"];
const MAX_JSON_FRAGMENT_CHARS: usize = 8_000;
const MAX_IMAGES: usize = 8;

/// Collects deduplicated fragments from `html`, joined by newlines and cut to
/// `max_chars`.
///
/// When no fragment matches, the page's visible text is used instead.
#[must_use]
pub fn select_fragments(html: &str, max_chars: usize) -> String {
    let mut seen = HashSet::new();
    let mut out = String::new();
    let mut out_chars = 0usize;

    let mut push = |fragment: &str| -> bool {
        let fragment = fragment.trim();
        if fragment.is_empty() || !seen.insert(fragment.to_string()) {
            return true;
        }
        if !out.is_empty() {
            out.push('\n');
            out_chars += 1;
        }
        out.push_str(fragment);
        out_chars += fragment.chars().count();
        out_chars < max_chars
    };

    let groups: [Vec<String>; 7] = [
        TITLE_RE.find_iter(html).map(|m| m.as_str().to_string()).collect(),
        META_RE
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|tag| is_product_meta(tag))
            .map(str::to_string)
            .collect(),
        H1_RE.find_iter(html).map(|m| m.as_str().to_string()).collect(),
        JSON_SCRIPT_RE
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|s| s.contains("price") || s.contains("Price"))
            .map(|s| truncate_chars(s, MAX_JSON_FRAGMENT_CHARS).to_string())
            .collect(),
        ITEMPROP_RE.find_iter(html).map(|m| m.as_str().to_string()).collect(),
        PRICE_CLASS_RE
            .find_iter(html)
            .map(|m| m.as_str().to_string())
            .collect(),
        IMG_RE
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|tag| is_product_image(tag))
            .take(MAX_IMAGES)
            .map(str::to_string)
            .collect(),
    ];

    'outer: for group in &groups {
        for fragment in group {
            if !push(fragment) {
                break 'outer;
            }
        }
    }

    if out.trim().is_empty() {
        out = strip_tags(html);
    }

    truncate_chars(&out, max_chars).to_string()
}

fn is_product_meta(tag: &str) -> bool {
    let key = extract_attr(tag, "property").or_else(|| extract_attr(tag, "name"));
    key.is_some_and(|k| {
        let k = k.to_ascii_lowercase();
        META_PREFIXES.iter().any(|p| k.starts_with(p))
    })
}

fn is_product_image(tag: &str) -> bool {
    let marker = ["class", "id", "alt", "src", "data-src"]
        .iter()
        .filter_map(|a| extract_attr(tag, a))
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    IMG_MARKERS.iter().any(|m| marker.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
          <title>Wool Coat | Site</title>
          <meta property="og:title" content="Wool Coat">
          <meta property="og:image" content="https://cdn.site.com/a.jpg">
          <meta name="viewport" content="width=device-width">
          <script type="application/json" id="analytics">{"events": []}</script>
        </head><body>
          <nav class="menu">Shop all</nav>
          <h1 class="product__title">Wool Coat</h1>
          <div class="price-box"><s class="price--compare">$435.00</s> <span class="price--sale">$131.00</span></div>
          <img class="product-image" src="https://cdn.site.com/a.jpg">
          <img class="footer-badge" src="/badge.png">
        </body></html>"#;

    #[test]
    fn keeps_signal_and_drops_noise() {
        let out = select_fragments(PAGE, 50_000);
        assert!(out.contains("<title>Wool Coat | Site</title>"));
        assert!(out.contains("og:image"));
        assert!(out.contains("$131.00"));
        assert!(out.contains("$435.00"));
        assert!(out.contains("product-image"));
        assert!(!out.contains("viewport"));
        assert!(!out.contains("analytics"));
        assert!(!out.contains("footer-badge"));
        assert!(!out.contains("Shop all"));
    }

    #[test]
    fn duplicate_fragments_appear_once() {
        let html = "<h1>Same</h1><h1>Same</h1>";
        let out = select_fragments(html, 50_000);
        assert_eq!(out.matches("<h1>Same</h1>").count(), 1);
    }

    #[test]
    fn output_is_bounded() {
        let body: String = (0..5_000)
            .map(|i| format!(r#"<span class="price">${i}.00</span>"#))
            .collect();
        let out = select_fragments(&body, 1_000);
        assert!(out.chars().count() <= 1_000);
    }

    #[test]
    fn falls_back_to_visible_text() {
        let out = select_fragments("<p>Just text, $20</p>", 50_000);
        assert_eq!(out, "Just text, $20");
    }
}
