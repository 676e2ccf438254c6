//! ScraperAPI-style rendering proxy client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::challenge_marker;
use crate::backends::{ProxyTier, RenderOptions, RenderingProxy};
use crate::error::ExtractError;

/// Fetches pages through a rendering proxy addressed as
/// `GET {endpoint}?api_key=…&url=…&render=true&wait=…[&premium=true]`.
pub struct HttpRenderingProxy {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpRenderingProxy {
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request_url(&self, target: &Url, options: RenderOptions) -> Result<Url, ExtractError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| ExtractError::InvalidUrl {
            url: self.endpoint.clone(),
            reason: format!("proxy endpoint is not a valid URL: {e}"),
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("api_key", &self.api_key)
                .append_pair("url", target.as_str())
                .append_pair("render", "true")
                .append_pair("wait", &options.wait_ms.to_string());
            if options.tier == ProxyTier::Premium {
                query.append_pair("premium", "true");
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl RenderingProxy for HttpRenderingProxy {
    async fn fetch_rendered(
        &self,
        url: &Url,
        options: RenderOptions,
    ) -> Result<String, ExtractError> {
        let request_url = self.request_url(url, options)?;
        let proxy_host = request_url.host_str().unwrap_or_default().to_string();
        tracing::debug!(target_url = %url, tier = ?options.tier, wait_ms = options.wait_ms, "rendering through proxy");

        let response = self.client.get(request_url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ExtractError::RateLimited {
                domain: proxy_host,
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            // The proxy reports the target's status as its own.
            return Err(ExtractError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ExtractError::EmptyPage {
                url: url.to_string(),
            });
        }
        if let Some(marker) = challenge_marker(&body) {
            return Err(ExtractError::Blocked {
                url: url.to_string(),
                reason: format!("bot challenge page through proxy ({marker})"),
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_query_with_premium_flag() {
        let proxy = HttpRenderingProxy::new("https://api.scraperapi.com/", "k3y", 90).unwrap();
        let target = Url::parse("https://www.ssense.com/p/1?color=black").unwrap();
        let url = proxy
            .request_url(
                &target,
                RenderOptions {
                    wait_ms: 5000,
                    tier: ProxyTier::Premium,
                },
            )
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("api_key".into(), "k3y".into())));
        assert!(pairs.contains(&("url".into(), "https://www.ssense.com/p/1?color=black".into())));
        assert!(pairs.contains(&("wait".into(), "5000".into())));
        assert!(pairs.contains(&("premium".into(), "true".into())));
    }

    #[test]
    fn standard_tier_has_no_premium_flag() {
        let proxy = HttpRenderingProxy::new("https://api.scraperapi.com/", "k3y", 90).unwrap();
        let target = Url::parse("https://shop.com/p/1").unwrap();
        let url = proxy
            .request_url(
                &target,
                RenderOptions {
                    wait_ms: 2000,
                    tier: ProxyTier::Standard,
                },
            )
            .unwrap();
        assert!(!url.as_str().contains("premium"));
    }
}
