//! Shared configuration for the DealScout workspace.

pub mod app_config;
pub mod config;
pub mod domains;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domains::{load_domain_rules, parse_domain_rules, DomainRule, DomainRules};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read domain rules file {path}: {source}")]
    DomainsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse domain rules file: {0}")]
    DomainsFileParse(#[from] serde_yaml::Error),

    #[error("domain rules validation failed: {0}")]
    Validation(String),
}
