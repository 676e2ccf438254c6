use std::sync::Arc;

use async_trait::async_trait;
use dealscout_core::DomainRules;
use reqwest::Url;

use super::{Extraction, Pipeline, Strategy};
use crate::backends::{ProxyTier, RenderOptions, RenderingProxy};
use crate::error::{ClassifiedError, ExtractError};
use crate::structured::extract_structured;
use crate::types::Phase;

/// Render wait for product pages, which are JS-heavy on protected domains.
pub const RENDER_WAIT_MS: u64 = 5_000;

const PRODUCT_RENDER: RenderOptions = RenderOptions {
    wait_ms: RENDER_WAIT_MS,
    tier: ProxyTier::Premium,
};

/// Renders the page through the proxy and runs the same pipeline as the fast
/// tier over the rendered HTML.
///
/// Only applies to domains flagged `requires_proxy` in the domain rules.
pub struct ProxyStrategy {
    proxy: Option<Arc<dyn RenderingProxy>>,
    pipeline: Pipeline,
    rules: Arc<DomainRules>,
}

impl ProxyStrategy {
    #[must_use]
    pub fn new(
        proxy: Option<Arc<dyn RenderingProxy>>,
        pipeline: Pipeline,
        rules: Arc<DomainRules>,
    ) -> Self {
        Self {
            proxy,
            pipeline,
            rules,
        }
    }

    fn applies_to(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.rules.requires_proxy(host))
    }
}

#[async_trait]
impl Strategy for ProxyStrategy {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn entry_phase(&self) -> Phase {
        Phase::Render
    }

    fn is_available(&self, url: &Url) -> bool {
        self.proxy.is_some() && self.applies_to(url)
    }

    async fn attempt(&self, url: &Url) -> Result<Extraction, ClassifiedError> {
        let Some(proxy) = &self.proxy else {
            return Err(ClassifiedError::new(
                Phase::Render,
                ExtractError::NotConfigured {
                    backend: "rendering proxy",
                },
            ));
        };
        if !self.applies_to(url) {
            return Err(ClassifiedError::new(
                Phase::Render,
                ExtractError::NotConfigured {
                    backend: "rendering proxy for this domain",
                },
            ));
        }

        let host = url.host_str().unwrap_or_default();
        tracing::info!(%url, wait_ms = RENDER_WAIT_MS, "rendering page through proxy");

        let html = proxy
            .fetch_rendered(url, PRODUCT_RENDER)
            .await
            .map_err(|e| ClassifiedError::new(Phase::Render, e))?;

        let structured = extract_structured(&html);
        self.pipeline
            .run(url, &html, structured, None, self.rules.hints_for(host))
            .await
    }
}
