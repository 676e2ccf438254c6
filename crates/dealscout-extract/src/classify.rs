//! Failure taxonomy used to decide between retrying, escalating, and giving up.
//!
//! | Class | Meaning | Controller | Orchestrator |
//! |---|---|---|---|
//! | `Retryable` | transient network / 5xx / unknown | retry within budget | escalate |
//! | `Blocking` | domain refuses automated access | stop | escalate |
//! | `Fatal` | this URL or response is unusable | stop | escalate |
//! | `Unknown` | not classified | treated as `Retryable` | treated as `Retryable` |

use serde::Serialize;

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    Retryable,
    Blocking,
    Fatal,
    Unknown,
}

impl ErrorClass {
    /// `Unknown` is retried optimistically.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Retryable | ErrorClass::Unknown)
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorClass::Retryable => "RETRYABLE",
            ErrorClass::Blocking => "BLOCKING",
            ErrorClass::Fatal => "FATAL",
            ErrorClass::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Maps an HTTP status code to a class.
///
/// 5xx → `Retryable`; 401/403/429 → `Blocking`; any other 4xx → `Fatal`.
/// Non-error statuses have no opinion and return `Unknown`.
#[must_use]
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        401 | 403 | 429 => ErrorClass::Blocking,
        400..=499 => ErrorClass::Fatal,
        500..=599 => ErrorClass::Retryable,
        _ => ErrorClass::Unknown,
    }
}

const BLOCKING_MARKERS: &[&str] = &[
    "captcha",
    "cloudflare",
    "rate limit",
    "rate-limit",
    "rate limited",
    "too many requests",
    "access denied",
    "forbidden",
    "are you a robot",
    "bot detection",
];

const FATAL_MARKERS: &[&str] = &[
    "invalid url",
    "missing required field",
    "placeholder image",
    "not found",
];

const RETRYABLE_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "connection reset",
    "econnreset",
    "econnrefused",
    "network",
    "socket hang up",
];

/// Classifies free-form failure text, e.g. from an opaque backend.
#[must_use]
pub fn classify_message(message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    if BLOCKING_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorClass::Blocking
    } else if FATAL_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorClass::Fatal
    } else if RETRYABLE_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorClass::Retryable
    } else {
        ErrorClass::Unknown
    }
}

/// Classifies a typed extraction error.
#[must_use]
pub fn classify(err: &ExtractError) -> ErrorClass {
    match err {
        ExtractError::InvalidUrl { .. }
        | ExtractError::Deserialize { .. }
        | ExtractError::EmptyPage { .. }
        | ExtractError::OracleResponse { .. }
        | ExtractError::OracleRefused { .. }
        | ExtractError::MissingFields { .. }
        | ExtractError::PlaceholderImage { .. }
        | ExtractError::LowConfidence { .. }
        | ExtractError::NotConfigured { .. } => ErrorClass::Fatal,
        ExtractError::RateLimited { .. } | ExtractError::Blocked { .. } => ErrorClass::Blocking,
        ExtractError::Timeout { .. } => ErrorClass::Retryable,
        ExtractError::UnexpectedStatus { status, .. } => classify_status(*status),
        // The oracle's own rate limit says nothing about the retailer's domain.
        ExtractError::OracleStatus { status } => {
            if *status == 429 || (500..=599).contains(status) {
                ErrorClass::Retryable
            } else {
                ErrorClass::Fatal
            }
        }
        ExtractError::Http(e) => {
            // A refused redirect points somewhere we will never fetch.
            if e.is_redirect() {
                ErrorClass::Fatal
            } else if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
                ErrorClass::Retryable
            } else if let Some(status) = e.status() {
                classify_status(status.as_u16())
            } else {
                match classify_message(&e.to_string()) {
                    ErrorClass::Unknown => ErrorClass::Retryable,
                    other => other,
                }
            }
        }
        ExtractError::Headless(message) => classify_message(message),
    }
}

/// Merges the classes of every failed tier into one verdict.
///
/// - any `Retryable`/`Unknown` → `Retryable`
/// - all `Blocking` → `Blocking`
/// - all `Fatal` → `Fatal`
/// - a mix of `Fatal` and `Blocking` → `Retryable`: the evidence is ambiguous,
///   so the domain is not declared wholly blocked.
///
/// An empty slice yields `Unknown`.
#[must_use]
pub fn merge_classifications(classes: &[ErrorClass]) -> ErrorClass {
    if classes.is_empty() {
        return ErrorClass::Unknown;
    }
    if classes.iter().any(|c| c.is_retryable()) {
        return ErrorClass::Retryable;
    }
    if classes.iter().all(|c| *c == ErrorClass::Blocking) {
        return ErrorClass::Blocking;
    }
    if classes.iter().all(|c| *c == ErrorClass::Fatal) {
        return ErrorClass::Fatal;
    }
    ErrorClass::Retryable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        for status in [500, 502, 503, 504] {
            assert_eq!(classify_status(status), ErrorClass::Retryable, "{status}");
        }
    }

    #[test]
    fn auth_and_rate_limit_statuses_are_blocking() {
        for status in [401, 403, 429] {
            assert_eq!(classify_status(status), ErrorClass::Blocking, "{status}");
        }
    }

    #[test]
    fn other_client_errors_are_fatal() {
        for status in [400, 404, 405, 410, 451] {
            assert_eq!(classify_status(status), ErrorClass::Fatal, "{status}");
        }
    }

    #[test]
    fn non_error_status_is_unknown() {
        assert_eq!(classify_status(200), ErrorClass::Unknown);
        assert_eq!(classify_status(302), ErrorClass::Unknown);
    }

    #[test]
    fn unexpected_status_uses_status_table() {
        let err = ExtractError::UnexpectedStatus {
            status: 404,
            url: "https://shop.example.com/p/1".to_owned(),
        };
        assert_eq!(classify(&err), ErrorClass::Fatal);

        let err = ExtractError::UnexpectedStatus {
            status: 503,
            url: "https://shop.example.com/p/1".to_owned(),
        };
        assert_eq!(classify(&err), ErrorClass::Retryable);
    }

    #[test]
    fn messages_are_classified_by_marker() {
        assert_eq!(
            classify_message("Cloudflare challenge page returned"),
            ErrorClass::Blocking
        );
        assert_eq!(
            classify_message("Please complete the CAPTCHA"),
            ErrorClass::Blocking
        );
        assert_eq!(classify_message("Access Denied"), ErrorClass::Blocking);
        assert_eq!(
            classify_message("Invalid URL: missing host"),
            ErrorClass::Fatal
        );
        assert_eq!(
            classify_message("missing required fields: name"),
            ErrorClass::Fatal
        );
        assert_eq!(
            classify_message("placeholder image rejected"),
            ErrorClass::Fatal
        );
        assert_eq!(
            classify_message("navigation timeout of 30000 ms exceeded"),
            ErrorClass::Retryable
        );
        assert_eq!(classify_message("read ECONNRESET"), ErrorClass::Retryable);
        assert_eq!(classify_message("something odd"), ErrorClass::Unknown);
    }

    #[test]
    fn typed_errors_are_classified() {
        assert_eq!(
            classify(&ExtractError::Timeout { after_ms: 10_000 }),
            ErrorClass::Retryable
        );
        assert_eq!(
            classify(&ExtractError::Blocked {
                url: "https://a.com".to_owned(),
                reason: "captcha".to_owned()
            }),
            ErrorClass::Blocking
        );
        assert_eq!(
            classify(&ExtractError::PlaceholderImage {
                url: "https://via.placeholder.com/300".to_owned()
            }),
            ErrorClass::Fatal
        );
        assert_eq!(
            classify(&ExtractError::LowConfidence {
                confidence: 40,
                minimum: 50
            }),
            ErrorClass::Fatal
        );
        assert_eq!(
            classify(&ExtractError::RateLimited {
                domain: "a.com".to_owned(),
                retry_after_secs: 30
            }),
            ErrorClass::Blocking
        );
    }

    #[test]
    fn oracle_status_never_blocks_the_domain() {
        assert_eq!(
            classify(&ExtractError::OracleStatus { status: 429 }),
            ErrorClass::Retryable
        );
        assert_eq!(
            classify(&ExtractError::OracleStatus { status: 502 }),
            ErrorClass::Retryable
        );
        assert_eq!(
            classify(&ExtractError::OracleStatus { status: 401 }),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn headless_errors_use_message_markers() {
        assert_eq!(
            classify(&ExtractError::Headless("blocked by cloudflare".to_owned())),
            ErrorClass::Blocking
        );
        assert_eq!(
            classify(&ExtractError::Headless("browser crashed".to_owned())),
            ErrorClass::Unknown
        );
    }

    #[test]
    fn merge_follows_ambiguity_rules() {
        use ErrorClass::{Blocking, Fatal, Retryable, Unknown};
        assert_eq!(merge_classifications(&[Fatal, Blocking]), Retryable);
        assert_eq!(merge_classifications(&[Blocking, Blocking]), Blocking);
        assert_eq!(merge_classifications(&[Fatal, Fatal]), Fatal);
        assert_eq!(merge_classifications(&[Retryable, Fatal]), Retryable);
        assert_eq!(merge_classifications(&[Blocking, Unknown]), Retryable);
        assert_eq!(merge_classifications(&[Blocking]), Blocking);
        assert_eq!(merge_classifications(&[]), Unknown);
    }

    #[test]
    fn serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorClass::Retryable).unwrap();
        assert_eq!(json, "\"RETRYABLE\"");
    }
}
