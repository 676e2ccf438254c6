//! reqwest implementations of the backend traits.

mod oracle;
mod proxy;
mod shopping;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};

use crate::backends::{FetchedPage, PageFetcher};
use crate::error::ExtractError;
use crate::validate::validate_url;

pub use oracle::ChatCompletionsOracle;
pub use proxy::HttpRenderingProxy;
pub use shopping::ProxiedShoppingIndex;

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Phrases that only appear on bot-challenge interstitials.
const CHALLENGE_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "challenge-platform",
    "checking your browser before accessing",
    "attention required! | cloudflare",
    "px-captcha",
    "g-recaptcha",
    "are you a robot",
    "access denied",
];

/// Direct page fetcher with browser-like request headers.
///
/// 429 becomes [`ExtractError::RateLimited`], other non-2xx statuses become
/// [`ExtractError::UnexpectedStatus`], and a 200 response that is a bot
/// challenge becomes [`ExtractError::Blocked`]. Retrying is left to the caller.
///
/// Redirects are followed only to URLs that pass [`validate_url`].
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the given timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(public_redirects_only())
            .build()?;
        Ok(Self { client })
    }
}

fn public_redirects_only() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let verdict = validate_url(attempt.url().as_str());
        match verdict {
            Ok(_) => attempt.follow(),
            Err(e) => {
                tracing::warn!(target_url = %attempt.url(), error = %e, "refusing redirect");
                attempt.error(e)
            }
        }
    })
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ExtractError> {
        let referer = url.origin().ascii_serialization();
        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::REFERER, &referer)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ExtractError::RateLimited {
                domain: url.host_str().unwrap_or_default().to_string(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(ExtractError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ExtractError::EmptyPage {
                url: url.to_string(),
            });
        }
        if let Some(marker) = challenge_marker(&body) {
            return Err(ExtractError::Blocked {
                url: url.to_string(),
                reason: format!("bot challenge page ({marker})"),
            });
        }

        tracing::debug!(url = %final_url, bytes = body.len(), "fetched page");
        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Returns the first challenge marker found in a short page.
///
/// Long pages are real storefronts that happen to embed a captcha widget
/// somewhere, so only bodies under 20 KB are checked.
#[must_use]
pub fn challenge_marker(body: &str) -> Option<&'static str> {
    if body.len() > 20_000 {
        return None;
    }
    let lower = body.to_ascii_lowercase();
    CHALLENGE_MARKERS.iter().copied().find(|m| lower.contains(m))
}
