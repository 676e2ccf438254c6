//! Shopping-index lookup of the product behind a URL.
//!
//! Used two ways by the fast tier: to enrich a page whose own markup lacks a
//! brand or image, and as a last-resort candidate when oracle extraction fails
//! or scores below the acceptance threshold.

pub mod brand;
pub mod listing;
pub mod queries;

use std::sync::Arc;

use reqwest::Url;

use crate::backends::ShoppingIndex;
use crate::confidence::hallucination_check;
use crate::types::{PricePair, ProductCandidate};

pub use brand::brand_from_title;
pub use listing::{parse_listings, Listing};
pub use queries::{bare_domain, build_query_strategies, QuerySource, QueryStrategy};

/// Confidence of a listing whose merchant matches the requested domain.
pub const DOMAIN_MATCH_CONFIDENCE: u8 = 65;
/// Confidence of a listing accepted without a domain match.
pub const FALLBACK_CONFIDENCE: u8 = 45;

/// A listing chosen for a URL, with the query that found it.
#[derive(Debug, Clone)]
pub struct ResolvedListing {
    pub listing: Listing,
    pub query: QueryStrategy,
    pub domain_match: bool,
    pub brand: Option<String>,
}

impl ResolvedListing {
    /// Converts the listing into a candidate when it has an image and a price.
    ///
    /// When the originating page's HTML is known, the listing price is checked
    /// against it like any other extracted price.
    #[must_use]
    pub fn to_candidate(&self, source_url: &str, page_html: Option<&str>) -> Option<ProductCandidate> {
        let image = self.listing.image_url.clone()?;
        let price = self.listing.price?;
        let mut confidence = if self.domain_match {
            DOMAIN_MATCH_CONFIDENCE
        } else {
            FALLBACK_CONFIDENCE
        };
        if let Some(html) = page_html {
            let (checked, note) = hallucination_check(price, html, confidence);
            if let Some(note) = note {
                tracing::debug!(%note, "listing price not on page");
            }
            confidence = checked;
        }
        Some(
            ProductCandidate::new(
                self.listing.title.clone(),
                image,
                PricePair::sale_only(price),
                source_url,
                confidence,
            )
            .with_brand(self.brand.clone()),
        )
    }
}

pub struct ProductResolver {
    index: Arc<dyn ShoppingIndex>,
}

impl ProductResolver {
    #[must_use]
    pub fn new(index: Arc<dyn ShoppingIndex>) -> Self {
        Self { index }
    }

    /// Runs each query strategy in order and returns the first acceptable listing.
    ///
    /// A listing is acceptable when its link or merchant name matches the
    /// URL's domain. Only for the first (most specific) strategy is the top
    /// listing accepted without a match. Search failures are logged and the
    /// next strategy is tried.
    pub async fn resolve(&self, url: &Url, og_title: Option<&str>) -> Option<ResolvedListing> {
        let domain = bare_domain(url);
        let strategies = build_query_strategies(url, og_title);

        for (rank, strategy) in strategies.into_iter().enumerate() {
            let html = match self.index.search(&strategy.query_text).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(
                        query = %strategy.query_text,
                        error = %e,
                        "shopping search failed, trying next query"
                    );
                    continue;
                }
            };

            let listings = parse_listings(&html);
            let matched = listings
                .iter()
                .find(|l| listing_matches_domain(l, &domain))
                .cloned();

            let (listing, domain_match) = match matched {
                Some(listing) => (listing, true),
                None if rank == 0 => match listings.into_iter().next() {
                    Some(listing) => (listing, false),
                    None => continue,
                },
                None => continue,
            };

            tracing::info!(
                query = %strategy.query_text,
                source = ?strategy.source,
                domain_match,
                title = %listing.title,
                "resolved product listing"
            );
            let brand = brand_from_title(&listing.title);
            return Some(ResolvedListing {
                listing,
                query: strategy,
                domain_match,
                brand,
            });
        }

        tracing::debug!(%domain, "no shopping listing resolved");
        None
    }
}

/// `true` when the listing's link host or merchant name points at `domain`.
#[must_use]
pub fn listing_matches_domain(listing: &Listing, domain: &str) -> bool {
    let link_match = Url::parse(&listing.link).ok().is_some_and(|u| {
        let host = bare_domain(&u);
        host == domain || host.ends_with(&format!(".{domain}"))
    });
    if link_match {
        return true;
    }
    let label = domain.split('.').next().unwrap_or(domain);
    listing.source.as_deref().is_some_and(|source| {
        let source: String = source
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        source.contains(domain) || (label.len() >= 3 && source.contains(label))
    })
}
