//! Shopping index backed by a rendered Google Shopping results page.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

use crate::backends::{ProxyTier, RenderOptions, RenderingProxy, ShoppingIndex};
use crate::error::ExtractError;

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";
const SEARCH_WAIT_MS: u64 = 3_000;

/// Runs shopping searches by rendering the results page through a proxy.
pub struct ProxiedShoppingIndex {
    proxy: Arc<dyn RenderingProxy>,
}

impl ProxiedShoppingIndex {
    #[must_use]
    pub fn new(proxy: Arc<dyn RenderingProxy>) -> Self {
        Self { proxy }
    }

    /// The results-page URL for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidUrl`] only if the built-in endpoint is malformed.
    pub fn search_url(query: &str) -> Result<Url, ExtractError> {
        let mut url = Url::parse(SEARCH_ENDPOINT).map_err(|e| ExtractError::InvalidUrl {
            url: SEARCH_ENDPOINT.to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("tbm", "shop")
            .append_pair("hl", "en")
            .append_pair("q", query);
        Ok(url)
    }
}

#[async_trait]
impl ShoppingIndex for ProxiedShoppingIndex {
    async fn search(&self, query: &str) -> Result<String, ExtractError> {
        let url = Self::search_url(query)?;
        self.proxy
            .fetch_rendered(
                &url,
                RenderOptions {
                    wait_ms: SEARCH_WAIT_MS,
                    tier: ProxyTier::Standard,
                },
            )
            .await
    }
}
