//! Seams to the outside world. Every network collaborator sits behind one of
//! these traits so tiers can be exercised with in-process fakes.

use async_trait::async_trait;
use reqwest::Url;

use crate::error::ExtractError;
use crate::strategy::StrategyResult;

/// A fetched page. Only successful (2xx) responses are returned as pages.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// # Errors
    ///
    /// Non-2xx statuses, transport failures, and challenge pages are errors.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ExtractError>;
}

/// Opaque text-in, JSON-out language model.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Returns the raw completion text for a system/user prompt pair.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx statuses.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ExtractError>;
}

/// A product search engine returning raw results HTML.
#[async_trait]
pub trait ShoppingIndex: Send + Sync {
    /// # Errors
    ///
    /// Transport failures and non-2xx statuses.
    async fn search(&self, query: &str) -> Result<String, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyTier {
    Standard,
    /// Residential IPs, for domains known to block datacenter traffic.
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// How long the proxy waits for client-side rendering before snapshotting.
    pub wait_ms: u64,
    pub tier: ProxyTier,
}

/// Paid fetch-and-render service for bot-protected or client-rendered pages.
#[async_trait]
pub trait RenderingProxy: Send + Sync {
    /// Returns the rendered HTML of `url`.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx statuses.
    async fn fetch_rendered(&self, url: &Url, options: RenderOptions)
        -> Result<String, ExtractError>;
}

/// Externally implemented headless-browser scraper, run as the last tier.
#[async_trait]
pub trait HeadlessBackend: Send + Sync {
    async fn scrape(&self, url: &Url) -> StrategyResult;
}
