use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub domains_path: PathBuf,
    pub oracle_api_key: String,
    pub oracle_url: String,
    pub oracle_model: String,
    pub oracle_timeout_secs: u64,
    /// Enables the rendering-proxy tier and the shopping-index resolver.
    pub proxy_api_key: Option<String>,
    pub proxy_url: String,
    pub proxy_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Minimum confidence for a tier result to be accepted without escalation.
    pub accept_confidence: u8,
    /// Confidence below which an AI extraction is refused outright.
    pub min_confidence: u8,
    pub test_metadata: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("domains_path", &self.domains_path)
            .field("oracle_api_key", &"[redacted]")
            .field("oracle_url", &self.oracle_url)
            .field("oracle_model", &self.oracle_model)
            .field("oracle_timeout_secs", &self.oracle_timeout_secs)
            .field(
                "proxy_api_key",
                &self.proxy_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("proxy_url", &self.proxy_url)
            .field("proxy_timeout_secs", &self.proxy_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("accept_confidence", &self.accept_confidence)
            .field("min_confidence", &self.min_confidence)
            .field("test_metadata", &self.test_metadata)
            .finish()
    }
}
