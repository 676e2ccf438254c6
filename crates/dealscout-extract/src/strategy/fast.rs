use std::sync::Arc;

use async_trait::async_trait;
use dealscout_core::DomainRules;
use reqwest::Url;

use super::{Extraction, Pipeline, Strategy};
use crate::backends::PageFetcher;
use crate::error::ClassifiedError;
use crate::html::page_title;
use crate::resolver::{ProductResolver, ResolvedListing};
use crate::structured::extract_structured;
use crate::types::{ExtractionMethod, Phase};

/// Direct fetch, then the extraction pipeline, with the shopping index as a
/// fallback when the page alone does not produce an acceptable product.
pub struct FastStrategy {
    fetcher: Arc<dyn PageFetcher>,
    pipeline: Pipeline,
    resolver: Option<ProductResolver>,
    rules: Arc<DomainRules>,
}

impl FastStrategy {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        pipeline: Pipeline,
        resolver: Option<ProductResolver>,
        rules: Arc<DomainRules>,
    ) -> Self {
        Self {
            fetcher,
            pipeline,
            resolver,
            rules,
        }
    }

    /// Returns the listing candidate when it should replace `result`.
    ///
    /// The listing wins only when the pipeline failed or scored below the
    /// acceptance threshold, the listing itself clears the minimum, and it
    /// scores higher than what the pipeline produced.
    fn listing_fallback(
        &self,
        result: &Result<Extraction, ClassifiedError>,
        listing: &ResolvedListing,
        page_url: &Url,
        html: &str,
    ) -> Option<Extraction> {
        let thresholds = self.pipeline.thresholds();
        let current = match result {
            Ok(extraction) if extraction.product.confidence >= thresholds.accept => return None,
            Ok(extraction) => Some(extraction.product.confidence),
            Err(_) => None,
        };

        let candidate = listing.to_candidate(page_url.as_str(), Some(html))?;
        if candidate.confidence < thresholds.minimum
            || current.is_some_and(|c| candidate.confidence <= c)
        {
            return None;
        }

        let reason = match result {
            Ok(extraction) => format!(
                "page extraction scored {}, below acceptance",
                extraction.product.confidence
            ),
            Err(e) => format!("page extraction failed: {e}"),
        };
        tracing::info!(
            url = %page_url,
            confidence = candidate.confidence,
            query = %listing.query.query_text,
            %reason,
            "using shopping listing as fallback"
        );
        Some(Extraction {
            product: candidate,
            method: ExtractionMethod::SearchListing,
            phase: Phase::Search,
            notes: vec![format!("shopping listing fallback; {reason}")],
        })
    }
}

#[async_trait]
impl Strategy for FastStrategy {
    fn name(&self) -> &'static str {
        "fast"
    }

    fn entry_phase(&self) -> Phase {
        Phase::Fetch
    }

    async fn attempt(&self, url: &Url) -> Result<Extraction, ClassifiedError> {
        let page = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| ClassifiedError::new(Phase::Fetch, e))?;

        let structured = extract_structured(&page.body);
        let complete = structured.as_ref().is_some_and(|s| s.complete);

        let listing = match &self.resolver {
            Some(resolver) if !complete => {
                let title = page_title(&page.body);
                resolver.resolve(url, title.as_deref()).await
            }
            _ => None,
        };

        let hints = url.host_str().and_then(|host| self.rules.hints_for(host));
        let result = self
            .pipeline
            .run(&page.url, &page.body, structured, listing.as_ref(), hints)
            .await;

        if let Some(listing) = &listing {
            if let Some(fallback) = self.listing_fallback(&result, listing, &page.url, &page.body) {
                return Ok(fallback);
            }
        }
        result
    }
}
