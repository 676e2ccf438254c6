/// Title separators, checked in order of first appearance.
const SEPARATORS: &[&str] = &["|", "–", "—", " - "];
const MAX_BRAND_CHARS: usize = 40;
const MAX_BRAND_WORDS: usize = 4;

/// Guesses a brand from a listing title such as `"Acme – Wool Coat"`.
///
/// The brand is the text before the earliest separator, kept only if it
/// looks like a proper noun: one to four words, each starting with an
/// uppercase letter or a digit, at most forty characters.
#[must_use]
pub fn brand_from_title(title: &str) -> Option<String> {
    let cut = SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()?;
    let candidate = title[..cut].trim();

    if candidate.is_empty() || candidate.chars().count() > MAX_BRAND_CHARS {
        return None;
    }
    let words: Vec<&str> = candidate.split_whitespace().collect();
    if words.len() > MAX_BRAND_WORDS {
        return None;
    }
    let proper = words.iter().all(|w| {
        w.chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
    });
    proper.then(|| candidate.to_string())
}
