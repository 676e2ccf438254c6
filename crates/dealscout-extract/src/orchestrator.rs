//! Tier cascade: fast, then proxy, then headless, stopping at the first
//! acceptable product.
//!
//! Every call returns an [`ExtractionResult`]; failures are data, never `Err`.
//! Each tier runs under the retry policy. Tiers whose backend is missing are
//! recorded as skipped and left out of the final classification.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dealscout_core::DomainRules;
use tracing::Instrument;
use uuid::Uuid;

use crate::backends::{HeadlessBackend, Oracle, PageFetcher, RenderingProxy, ShoppingIndex};
use crate::classify::{merge_classifications, ErrorClass};
use crate::confidence::ConfidenceThresholds;
use crate::resolver::ProductResolver;
use crate::retry::{run_strategy, RetryPolicy};
use crate::strategy::{FastStrategy, HeadlessStrategy, Pipeline, ProxyStrategy, Strategy};
use crate::types::{
    AttemptOutcome, DiagnosticNote, Diagnostics, ExtractionAttempt, ExtractionMeta,
    ExtractionMethod, ExtractionResult, Phase, ProductCandidate,
};
use crate::validate::validate_url;

/// Collaborators and knobs for [`extract_product`].
///
/// Only the oracle and page fetcher are required. Without a rendering proxy
/// the proxy tier is skipped; without a headless backend the headless tier is
/// skipped; without a shopping index the fast tier runs no listing lookup.
#[derive(Clone)]
pub struct ExtractOptions {
    oracle: Arc<dyn Oracle>,
    fetcher: Arc<dyn PageFetcher>,
    shopping_index: Option<Arc<dyn ShoppingIndex>>,
    proxy: Option<Arc<dyn RenderingProxy>>,
    headless: Option<Arc<dyn HeadlessBackend>>,
    domain_rules: Arc<DomainRules>,
    retry: RetryPolicy,
    thresholds: ConfidenceThresholds,
    test_metadata: bool,
}

impl ExtractOptions {
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            oracle,
            fetcher,
            shopping_index: None,
            proxy: None,
            headless: None,
            domain_rules: Arc::new(DomainRules::default()),
            retry: RetryPolicy::default(),
            thresholds: ConfidenceThresholds::default(),
            test_metadata: false,
        }
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Arc<dyn RenderingProxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    #[must_use]
    pub fn with_shopping_index(mut self, index: Arc<dyn ShoppingIndex>) -> Self {
        self.shopping_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_headless(mut self, backend: Arc<dyn HeadlessBackend>) -> Self {
        self.headless = Some(backend);
        self
    }

    #[must_use]
    pub fn with_domain_rules(mut self, rules: Arc<DomainRules>) -> Self {
        self.domain_rules = rules;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Include [`Diagnostics`] in every result.
    #[must_use]
    pub fn with_test_metadata(mut self, enabled: bool) -> Self {
        self.test_metadata = enabled;
        self
    }

    fn strategies(&self) -> Vec<Box<dyn Strategy>> {
        let pipeline = Pipeline::new(Arc::clone(&self.oracle), self.thresholds);
        let resolver = self
            .shopping_index
            .as_ref()
            .map(|index| ProductResolver::new(Arc::clone(index)));
        vec![
            Box::new(FastStrategy::new(
                Arc::clone(&self.fetcher),
                pipeline.clone(),
                resolver,
                Arc::clone(&self.domain_rules),
            )),
            Box::new(ProxyStrategy::new(
                self.proxy.clone(),
                pipeline,
                Arc::clone(&self.domain_rules),
            )),
            Box::new(HeadlessStrategy::new(self.headless.clone())),
        ]
    }
}

/// Extracts a product from `url`, escalating through the tiers as needed.
///
/// Runs inside an `extract_product` span carrying the request id and URL.
pub async fn extract_product(url: &str, options: &ExtractOptions) -> ExtractionResult {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("extract_product", %request_id, url);
    run_cascade(url, options, request_id).instrument(span).await
}

/// Low-confidence candidate kept in case no later tier does better.
struct BestCandidate {
    product: ProductCandidate,
    label: String,
}

async fn run_cascade(raw_url: &str, options: &ExtractOptions, request_id: Uuid) -> ExtractionResult {
    let started = Instant::now();
    let mut report = Report::new(options, request_id);

    let url = match validate_url(raw_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "rejected URL before any network access");
            report.attempts.push(ExtractionAttempt {
                strategy_name: "validation".to_string(),
                outcome: AttemptOutcome::Failed,
                confidence: 0,
                duration_ms: 0,
                phase: Phase::Validation,
                started_at: Utc::now(),
                retry_count: 0,
                method: None,
                error_message: Some(e.to_string()),
                classification: Some(ErrorClass::Fatal),
            });
            return report.failure(started, e.to_string(), ErrorClass::Fatal, None);
        }
    };

    let accept = options.thresholds.accept;
    let mut classes = Vec::new();
    let mut last_error = None;
    let mut best: Option<BestCandidate> = None;

    for strategy in options.strategies() {
        let name = strategy.name();
        if !strategy.is_available(&url) {
            tracing::debug!(strategy = name, "tier not applicable or not configured, skipping");
            report.attempts.push(ExtractionAttempt {
                strategy_name: name.to_string(),
                outcome: AttemptOutcome::Skipped,
                confidence: 0,
                duration_ms: 0,
                phase: strategy.entry_phase(),
                started_at: Utc::now(),
                retry_count: 0,
                method: None,
                error_message: None,
                classification: None,
            });
            continue;
        }

        let started_at = Utc::now();
        let result = run_strategy(strategy.as_ref(), &url, &options.retry).await;
        let meta = result.meta;
        report.add_notes(name, meta.notes);

        match result.outcome {
            Ok(product) if product.confidence >= accept && product.has_required_fields() => {
                tracing::info!(
                    strategy = name,
                    confidence = product.confidence,
                    retries = meta.retry_count,
                    "tier produced an acceptable product"
                );
                report.attempts.push(ExtractionAttempt {
                    strategy_name: name.to_string(),
                    outcome: AttemptOutcome::Success,
                    confidence: product.confidence,
                    duration_ms: meta.duration_ms,
                    phase: meta.phase,
                    started_at,
                    retry_count: meta.retry_count,
                    method: meta.method,
                    error_message: None,
                    classification: None,
                });
                let label = method_label(name, meta.method);
                return report.success(started, product, label);
            }
            Ok(product) => {
                tracing::info!(
                    strategy = name,
                    confidence = product.confidence,
                    accept,
                    "tier result below acceptance, escalating"
                );
                let message = format!(
                    "low confidence: {} is below the acceptance threshold of {accept}",
                    product.confidence
                );
                report.attempts.push(ExtractionAttempt {
                    strategy_name: name.to_string(),
                    outcome: AttemptOutcome::LowConfidence,
                    confidence: product.confidence,
                    duration_ms: meta.duration_ms,
                    phase: meta.phase,
                    started_at,
                    retry_count: meta.retry_count,
                    method: meta.method,
                    error_message: Some(message),
                    classification: Some(ErrorClass::Fatal),
                });
                classes.push(ErrorClass::Fatal);
                if best
                    .as_ref()
                    .is_none_or(|b| product.confidence > b.product.confidence)
                {
                    best = Some(BestCandidate {
                        product,
                        label: method_label(name, meta.method),
                    });
                }
            }
            Err(err) => {
                tracing::warn!(
                    strategy = name,
                    phase = %err.phase,
                    classification = %err.classification,
                    retries = meta.retry_count,
                    error = %err,
                    "tier failed, escalating"
                );
                report.attempts.push(ExtractionAttempt {
                    strategy_name: name.to_string(),
                    outcome: AttemptOutcome::Failed,
                    confidence: 0,
                    duration_ms: meta.duration_ms,
                    phase: err.phase,
                    started_at,
                    retry_count: meta.retry_count,
                    method: None,
                    error_message: Some(err.to_string()),
                    classification: Some(err.classification),
                });
                classes.push(err.classification);
                last_error = Some(err.to_string());
            }
        }
    }

    let classification = merge_classifications(&classes);
    if let Some(best) = best {
        tracing::warn!(
            confidence = best.product.confidence,
            accept,
            %classification,
            "no tier reached acceptance; returning best candidate for review"
        );
        let message = format!(
            "low confidence: best candidate scored {} (acceptance threshold {accept})",
            best.product.confidence
        );
        return report.failure(started, message, classification, Some(best));
    }

    let message = last_error.unwrap_or_else(|| "no extraction tier is available".to_string());
    tracing::warn!(%classification, error = %message, "all tiers failed");
    report.failure(started, message, classification, None)
}

fn method_label(tier: &str, method: Option<ExtractionMethod>) -> String {
    match method {
        Some(method) => format!("{tier}:{method}"),
        None => tier.to_string(),
    }
}

/// Accumulates the attempt log and diagnostics for one call.
struct Report {
    request_id: Uuid,
    attempts: Vec<ExtractionAttempt>,
    diagnostics: Option<Diagnostics>,
}

impl Report {
    fn new(options: &ExtractOptions, request_id: Uuid) -> Self {
        let diagnostics = options.test_metadata.then(|| Diagnostics {
            accept_confidence: options.thresholds.accept,
            min_confidence: options.thresholds.minimum,
            max_attempts: options.retry.max_attempts,
            notes: Vec::new(),
        });
        Self {
            request_id,
            attempts: Vec::new(),
            diagnostics,
        }
    }

    fn add_notes(&mut self, strategy: &str, notes: Vec<String>) {
        if let Some(diagnostics) = &mut self.diagnostics {
            diagnostics
                .notes
                .extend(notes.into_iter().map(|note| DiagnosticNote {
                    strategy: strategy.to_string(),
                    note,
                }));
        }
    }

    fn meta(self, started: Instant, method: Option<String>, confidence: u8) -> ExtractionMeta {
        ExtractionMeta {
            extraction_method: method,
            confidence,
            total_duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            request_id: self.request_id,
            attempts: self.attempts,
            diagnostics: self.diagnostics,
        }
    }

    fn success(self, started: Instant, product: ProductCandidate, label: String) -> ExtractionResult {
        let confidence = product.confidence;
        ExtractionResult {
            success: true,
            product: Some(product),
            error: None,
            error_classification: None,
            meta: self.meta(started, Some(label), confidence),
        }
    }

    fn failure(
        self,
        started: Instant,
        error: String,
        classification: ErrorClass,
        best: Option<BestCandidate>,
    ) -> ExtractionResult {
        let (product, label, confidence) = match best {
            Some(b) => {
                let confidence = b.product.confidence;
                (Some(b.product), Some(b.label), confidence)
            }
            None => (None, None, 0),
        };
        ExtractionResult {
            success: false,
            product,
            error: Some(error),
            error_classification: Some(classification),
            meta: self.meta(started, label, confidence),
        }
    }
}
