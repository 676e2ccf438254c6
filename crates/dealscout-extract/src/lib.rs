pub mod ai;
pub mod backends;
pub mod classify;
pub mod client;
pub mod confidence;
pub mod error;
pub mod html;
pub mod orchestrator;
pub mod platform;
pub mod price;
pub mod resolver;
pub mod retry;
pub mod strategy;
pub mod structured;
pub mod types;
pub mod validate;

pub use backends::{
    FetchedPage, HeadlessBackend, Oracle, PageFetcher, ProxyTier, RenderOptions, RenderingProxy,
    ShoppingIndex,
};
pub use classify::{classify, merge_classifications, ErrorClass};
pub use client::{ChatCompletionsOracle, HttpFetcher, HttpRenderingProxy, ProxiedShoppingIndex};
pub use confidence::ConfidenceThresholds;
pub use error::{ClassifiedError, ExtractError};
pub use orchestrator::{extract_product, ExtractOptions};
pub use resolver::{build_query_strategies, ProductResolver, QueryStrategy};
pub use retry::RetryPolicy;
pub use strategy::{StrategyMeta, StrategyResult};
pub use types::{
    AttemptOutcome, ExtractionAttempt, ExtractionMeta, ExtractionMethod, ExtractionResult, Phase,
    PricePair, ProductCandidate,
};
pub use validate::validate_url;
