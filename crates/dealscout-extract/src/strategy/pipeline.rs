use std::sync::Arc;

use reqwest::Url;

use super::Extraction;
use crate::ai::{extract_with_oracle, AiRequest};
use crate::backends::Oracle;
use crate::confidence::{assess, ConfidenceThresholds};
use crate::error::ClassifiedError;
use crate::platform::extract_platform_price;
use crate::resolver::ResolvedListing;
use crate::structured::StructuredProduct;
use crate::types::{ExtractionMethod, Phase};

/// Structured data → platform prices → oracle → confidence, over one page of HTML.
///
/// Each step runs only when the previous one left the product incomplete. A
/// complete JSON-LD product never reaches the oracle.
#[derive(Clone)]
pub struct Pipeline {
    oracle: Arc<dyn Oracle>,
    thresholds: ConfidenceThresholds,
}

impl Pipeline {
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, thresholds: ConfidenceThresholds) -> Self {
        Self { oracle, thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> ConfidenceThresholds {
        self.thresholds
    }

    /// Extracts a product from `html`.
    ///
    /// `structured` is the page's JSON-LD result, parsed once by the caller.
    /// `listing` is an optional shopping-index match used to fill a missing
    /// brand or image hint.
    ///
    /// # Errors
    ///
    /// Oracle failures are reported in [`Phase::Ai`], scoring failures in
    /// [`Phase::Confidence`].
    pub async fn run(
        &self,
        page_url: &Url,
        html: &str,
        structured: Option<StructuredProduct>,
        listing: Option<&ResolvedListing>,
        domain_hints: Option<&str>,
    ) -> Result<Extraction, ClassifiedError> {
        let listing_brand = listing.and_then(|l| l.brand.clone());

        if let Some(product) = &structured {
            if let Some(candidate) = product.to_candidate(page_url.as_str()) {
                tracing::info!(url = %page_url, confidence = candidate.confidence, "complete JSON-LD product");
                let brand = candidate.brand.clone().or(listing_brand);
                return Ok(Extraction {
                    product: candidate.with_brand(brand),
                    method: ExtractionMethod::JsonLd,
                    phase: Phase::StructuredData,
                    notes: product.anomalies.clone(),
                });
            }
        }

        let platform = extract_platform_price(html);
        let partial = structured.as_ref().map(|s| &s.raw);
        let method = if partial.is_some() {
            ExtractionMethod::JsonLdAi
        } else if platform.is_some() {
            ExtractionMethod::PlatformAi
        } else {
            ExtractionMethod::HtmlAi
        };

        let mut request = AiRequest::for_page(page_url, html, partial)
            .with_ground_truth(platform.map(|p| p.prices))
            .with_domain_hints(domain_hints);
        if request.image_hint.is_none() {
            request.image_hint = listing.and_then(|l| l.listing.image_url.clone());
        }

        let ai = extract_with_oracle(self.oracle.as_ref(), &request)
            .await
            .map_err(|e| ClassifiedError::new(Phase::Ai, e))?;

        let assessment = assess(
            &ai,
            request.ground_truth,
            html,
            page_url.as_str(),
            self.thresholds,
        )
        .map_err(|e| ClassifiedError::new(Phase::Confidence, e))?;

        let structured_brand = structured.as_ref().and_then(|s| s.brand.clone());
        let mut notes = structured.map(|s| s.anomalies).unwrap_or_default();
        notes.extend(assessment.notes);

        let mut product = assessment.candidate;
        if product.brand.is_none() {
            product = product.with_brand(structured_brand.or(listing_brand));
        }

        tracing::info!(
            url = %page_url,
            %method,
            confidence = product.confidence,
            "oracle extraction scored"
        );
        Ok(Extraction {
            product,
            method,
            phase: Phase::Confidence,
            notes,
        })
    }
}
