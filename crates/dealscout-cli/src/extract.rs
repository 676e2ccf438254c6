//! Handlers for the `extract`, `validate`, and `queries` subcommands.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dealscout_core::{load_domain_rules, AppConfig, DomainRules};
use dealscout_extract::{
    build_query_strategies, extract_product, validate_url, ChatCompletionsOracle,
    ConfidenceThresholds, ExtractOptions, HttpFetcher, HttpRenderingProxy, ProxiedShoppingIndex,
    RetryPolicy,
};
use futures::stream::{self, StreamExt};

/// Exit status when any URL failed or was rejected.
const FAILURE_EXIT: u8 = 2;

#[derive(Debug)]
pub(crate) struct ExtractArgs {
    pub urls: Vec<String>,
    pub concurrency: usize,
    pub test_metadata: bool,
    pub max_retries: Option<u32>,
    pub pretty: bool,
}

pub(crate) async fn run_extract(args: ExtractArgs) -> anyhow::Result<ExitCode> {
    let config = dealscout_core::load_app_config().context("failed to load configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let rules = load_rules_or_default(&config)?;
    let options = build_options(&config, rules, &args)?;

    let options = &options;
    let results = stream::iter(args.urls)
        .map(|url| async move { extract_product(&url, options).await })
        .buffer_unordered(args.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut failed = 0usize;
    for result in &results {
        if !result.success {
            failed += 1;
        }
        let json = if args.pretty {
            serde_json::to_string_pretty(result)
        } else {
            serde_json::to_string(result)
        }
        .context("failed to serialize extraction result")?;
        println!("{json}");
    }

    tracing::info!(total = results.len(), failed, "extraction finished");
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(FAILURE_EXIT)
    })
}

/// A missing rules file is not an error: extraction works without hints.
fn load_rules_or_default(config: &AppConfig) -> anyhow::Result<DomainRules> {
    let path = &config.domains_path;
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "domain rules file not found, continuing without domain rules"
        );
        return Ok(DomainRules::default());
    }
    let rules = load_domain_rules(path)
        .with_context(|| format!("failed to load domain rules from {}", path.display()))?;
    tracing::debug!(count = rules.domains.len(), "domain rules loaded");
    Ok(rules)
}

fn build_options(
    config: &AppConfig,
    rules: DomainRules,
    args: &ExtractArgs,
) -> anyhow::Result<ExtractOptions> {
    let oracle = ChatCompletionsOracle::new(
        &config.oracle_url,
        &config.oracle_api_key,
        &config.oracle_model,
        config.oracle_timeout_secs,
    )
    .context("failed to build oracle client")?;
    let fetcher = HttpFetcher::new(config.request_timeout_secs, &config.user_agent)
        .context("failed to build page fetcher")?;

    let retry = RetryPolicy::new(
        args.max_retries.unwrap_or(config.max_retries),
        Duration::from_secs(config.retry_backoff_base_secs),
    );

    let mut options = ExtractOptions::new(Arc::new(oracle), Arc::new(fetcher))
        .with_domain_rules(Arc::new(rules))
        .with_retry(retry)
        .with_thresholds(ConfidenceThresholds {
            accept: config.accept_confidence,
            minimum: config.min_confidence,
        })
        .with_test_metadata(args.test_metadata || config.test_metadata);

    if let Some(key) = &config.proxy_api_key {
        let proxy = Arc::new(
            HttpRenderingProxy::new(&config.proxy_url, key, config.proxy_timeout_secs)
                .context("failed to build rendering proxy client")?,
        );
        options = options
            .with_shopping_index(Arc::new(ProxiedShoppingIndex::new(proxy.clone())))
            .with_proxy(proxy);
    } else {
        tracing::info!("DEALSCOUT_PROXY_API_KEY not set; proxy tier and shopping search disabled");
    }

    Ok(options)
}

pub(crate) fn run_validate(url: &str) -> ExitCode {
    match validate_url(url) {
        Ok(parsed) => {
            println!("valid: {parsed}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("invalid: {e}");
            ExitCode::from(FAILURE_EXIT)
        }
    }
}

pub(crate) fn run_queries(url: &str, og_title: Option<&str>) -> anyhow::Result<ExitCode> {
    let parsed = validate_url(url)?;
    let strategies = build_query_strategies(&parsed, og_title);
    println!(
        "{}",
        serde_json::to_string_pretty(&strategies).context("failed to serialize queries")?
    );
    Ok(ExitCode::SUCCESS)
}
