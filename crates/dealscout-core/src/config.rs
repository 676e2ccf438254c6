use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_percent = |var: &str, default: &str| -> Result<u8, ConfigError> {
        let value = or_default(var, default)
            .parse::<u8>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value > 100 {
            return Err(invalid(var, format!("{value} is outside 0..=100")));
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(invalid(var, format!("\"{other}\" is not a boolean"))),
        }
    };

    let oracle_api_key = require("DEALSCOUT_ORACLE_API_KEY")?;

    let env = parse_environment(&or_default("DEALSCOUT_ENV", "development"))?;
    let log_level = or_default("DEALSCOUT_LOG_LEVEL", "info");
    let domains_path = PathBuf::from(or_default(
        "DEALSCOUT_DOMAINS_PATH",
        "./config/domains.yaml",
    ));

    let oracle_url = or_default(
        "DEALSCOUT_ORACLE_URL",
        "https://api.openai.com/v1/chat/completions",
    );
    let oracle_model = or_default("DEALSCOUT_ORACLE_MODEL", "gpt-4o-mini");
    let oracle_timeout_secs = parse_u64("DEALSCOUT_ORACLE_TIMEOUT_SECS", "60")?;

    let proxy_api_key = lookup("DEALSCOUT_PROXY_API_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let proxy_url = or_default("DEALSCOUT_PROXY_URL", "https://api.scraperapi.com/");
    let proxy_timeout_secs = parse_u64("DEALSCOUT_PROXY_TIMEOUT_SECS", "90")?;

    let request_timeout_secs = parse_u64("DEALSCOUT_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("DEALSCOUT_USER_AGENT", DEFAULT_USER_AGENT);

    let max_retries = parse_u32("DEALSCOUT_MAX_RETRIES", "3")?;
    if max_retries == 0 {
        return Err(invalid(
            "DEALSCOUT_MAX_RETRIES",
            "must allow at least one attempt".to_string(),
        ));
    }
    let retry_backoff_base_secs = parse_u64("DEALSCOUT_RETRY_BACKOFF_BASE_SECS", "1")?;

    let accept_confidence = parse_percent("DEALSCOUT_ACCEPT_CONFIDENCE", "60")?;
    let min_confidence = parse_percent("DEALSCOUT_MIN_CONFIDENCE", "50")?;
    if min_confidence > accept_confidence {
        return Err(invalid(
            "DEALSCOUT_MIN_CONFIDENCE",
            format!("{min_confidence} exceeds DEALSCOUT_ACCEPT_CONFIDENCE ({accept_confidence})"),
        ));
    }

    let test_metadata = parse_bool("DEALSCOUT_TEST_METADATA", "false")?;

    Ok(AppConfig {
        env,
        log_level,
        domains_path,
        oracle_api_key,
        oracle_url,
        oracle_model,
        oracle_timeout_secs,
        proxy_api_key,
        proxy_url,
        proxy_timeout_secs,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        accept_confidence,
        min_confidence,
        test_metadata,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DEALSCOUT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
