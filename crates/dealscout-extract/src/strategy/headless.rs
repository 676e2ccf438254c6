use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

use super::{Extraction, Strategy};
use crate::backends::HeadlessBackend;
use crate::error::{ClassifiedError, ExtractError};
use crate::types::{ExtractionMethod, Phase};

/// Last tier: hands the URL to a caller-supplied headless browser scraper.
pub struct HeadlessStrategy {
    backend: Option<Arc<dyn HeadlessBackend>>,
}

impl HeadlessStrategy {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn HeadlessBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Strategy for HeadlessStrategy {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn entry_phase(&self) -> Phase {
        Phase::Headless
    }

    fn is_available(&self, _url: &Url) -> bool {
        self.backend.is_some()
    }

    async fn attempt(&self, url: &Url) -> Result<Extraction, ClassifiedError> {
        let Some(backend) = &self.backend else {
            return Err(ClassifiedError::new(
                Phase::Headless,
                ExtractError::NotConfigured {
                    backend: "headless backend",
                },
            ));
        };

        let result = backend.scrape(url).await;
        let product = result.outcome?;
        Ok(Extraction {
            product,
            method: result.meta.method.unwrap_or(ExtractionMethod::Headless),
            phase: result.meta.phase,
            notes: result.meta.notes,
        })
    }
}
