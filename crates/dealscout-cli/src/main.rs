mod extract;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dealscout")]
#[command(about = "Extract sale products from retailer product URLs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract products and print one JSON result per URL
    Extract {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Maximum URLs processed at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        /// Include thresholds and per-tier notes in each result
        #[arg(long)]
        test_metadata: bool,
        /// Attempts per tier; overrides DEALSCOUT_MAX_RETRIES
        #[arg(long)]
        max_retries: Option<u32>,
        /// Pretty-print instead of JSON lines
        #[arg(long)]
        pretty: bool,
    },
    /// Check whether a URL would be accepted for extraction
    Validate { url: String },
    /// Print the shopping-search queries that would be tried for a URL
    Queries {
        url: String,
        /// Page title to derive the exact-name query from
        #[arg(long)]
        og_title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable JSON.
    let level = std::env::var("DEALSCOUT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            urls,
            concurrency,
            test_metadata,
            max_retries,
            pretty,
        } => {
            let args = extract::ExtractArgs {
                urls,
                concurrency,
                test_metadata,
                max_retries,
                pretty,
            };
            extract::run_extract(args).await
        }
        Commands::Validate { url } => Ok(extract::run_validate(&url)),
        Commands::Queries { url, og_title } => extract::run_queries(&url, og_title.as_deref()),
    }
}
