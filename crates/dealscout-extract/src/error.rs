use thiserror::Error;

use crate::classify::{classify, ErrorClass};
use crate::types::Phase;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("access blocked at {url}: {reason}")]
    Blocked { url: String, reason: String },

    #[error("empty response body from {url}")]
    EmptyPage { url: String },

    #[error("oracle returned HTTP status {status}")]
    OracleStatus { status: u16 },

    #[error("oracle response is not usable JSON: {reason}")]
    OracleResponse { reason: String },

    #[error("oracle declined to extract: {reason}")]
    OracleRefused { reason: String },

    #[error("missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("placeholder image rejected: {url}")]
    PlaceholderImage { url: String },

    #[error("confidence {confidence} is below the minimum of {minimum}")]
    LowConfidence { confidence: u8, minimum: u8 },

    #[error("{backend} is not configured")]
    NotConfigured { backend: &'static str },

    #[error("headless backend failed: {0}")]
    Headless(String),
}

/// An [`ExtractError`] with its classification attached at the point of detection.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ClassifiedError {
    pub classification: ErrorClass,
    pub phase: Phase,
    #[source]
    pub error: ExtractError,
}

impl ClassifiedError {
    /// Wraps `error`, classifying it with [`classify`].
    #[must_use]
    pub fn new(phase: Phase, error: ExtractError) -> Self {
        Self {
            classification: classify(&error),
            phase,
            error,
        }
    }

    /// Overrides the derived classification.
    #[must_use]
    pub fn with_classification(mut self, classification: ErrorClass) -> Self {
        self.classification = classification;
        self
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.classification.is_retryable()
    }
}
