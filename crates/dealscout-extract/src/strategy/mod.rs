//! The extraction tiers, each behind the same [`Strategy`] interface.

mod fast;
mod headless;
mod pipeline;
mod proxy;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::ClassifiedError;
use crate::types::{ExtractionMethod, Phase, ProductCandidate};

pub use fast::FastStrategy;
pub use headless::HeadlessStrategy;
pub use pipeline::Pipeline;
pub use proxy::{ProxyStrategy, RENDER_WAIT_MS};

/// A successful tier attempt.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub product: ProductCandidate,
    pub method: ExtractionMethod,
    /// Step that produced the product.
    pub phase: Phase,
    /// Anomalies and confidence adjustments worth surfacing in diagnostics.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StrategyMeta {
    pub method: Option<ExtractionMethod>,
    pub phase: Phase,
    pub confidence: u8,
    pub duration_ms: u64,
    pub retry_count: u32,
    pub notes: Vec<String>,
}

/// Outcome of one tier, including retries.
#[derive(Debug)]
pub struct StrategyResult {
    pub outcome: Result<ProductCandidate, ClassifiedError>,
    pub meta: StrategyMeta,
}

/// One tier of the cascade.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name recorded in the attempt log, e.g. `"fast"`.
    fn name(&self) -> &'static str;

    /// Phase reported for failures not attributable to a later step,
    /// such as an elapsed attempt deadline.
    fn entry_phase(&self) -> Phase;

    /// `false` when the tier does not apply to `url` or its backend is not
    /// configured; the tier is then skipped.
    fn is_available(&self, _url: &Url) -> bool {
        true
    }

    /// Makes a single attempt. Retrying is the caller's concern.
    async fn attempt(&self, url: &Url) -> Result<Extraction, ClassifiedError>;
}
