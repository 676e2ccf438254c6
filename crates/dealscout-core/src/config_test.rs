use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("DEALSCOUT_ORACLE_API_KEY", "sk-test");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "DEALSCOUT_ENV"));
}

#[test]
fn build_app_config_fails_without_oracle_key() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DEALSCOUT_ORACLE_API_KEY"),
        "expected MissingEnvVar(DEALSCOUT_ORACLE_API_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_oracle_key_as_missing() {
    let mut map = HashMap::new();
    map.insert("DEALSCOUT_ORACLE_API_KEY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.oracle_api_key, "sk-test");
    assert_eq!(cfg.oracle_model, "gpt-4o-mini");
    assert_eq!(cfg.oracle_timeout_secs, 60);
    assert!(cfg.proxy_api_key.is_none());
    assert_eq!(cfg.proxy_timeout_secs, 90);
    assert_eq!(cfg.request_timeout_secs, 10);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_secs, 1);
    assert_eq!(cfg.accept_confidence, 60);
    assert_eq!(cfg.min_confidence, 50);
    assert!(!cfg.test_metadata);
    assert_eq!(
        cfg.domains_path,
        std::path::PathBuf::from("./config/domains.yaml")
    );
}

#[test]
fn proxy_key_is_picked_up_when_set() {
    let mut map = full_env();
    map.insert("DEALSCOUT_PROXY_API_KEY", "proxy-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.proxy_api_key.as_deref(), Some("proxy-key"));
}

#[test]
fn blank_proxy_key_is_ignored() {
    let mut map = full_env();
    map.insert("DEALSCOUT_PROXY_API_KEY", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.proxy_api_key.is_none());
}

#[test]
fn max_retries_invalid() {
    let mut map = full_env();
    map.insert("DEALSCOUT_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DEALSCOUT_MAX_RETRIES"),
        "expected InvalidEnvVar(DEALSCOUT_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn max_retries_zero_is_rejected() {
    let mut map = full_env();
    map.insert("DEALSCOUT_MAX_RETRIES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DEALSCOUT_MAX_RETRIES")
    );
}

#[test]
fn accept_confidence_override() {
    let mut map = full_env();
    map.insert("DEALSCOUT_ACCEPT_CONFIDENCE", "75");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.accept_confidence, 75);
}

#[test]
fn accept_confidence_above_100_is_rejected() {
    let mut map = full_env();
    map.insert("DEALSCOUT_ACCEPT_CONFIDENCE", "101");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DEALSCOUT_ACCEPT_CONFIDENCE")
    );
}

#[test]
fn min_confidence_above_accept_is_rejected() {
    let mut map = full_env();
    map.insert("DEALSCOUT_ACCEPT_CONFIDENCE", "55");
    map.insert("DEALSCOUT_MIN_CONFIDENCE", "70");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DEALSCOUT_MIN_CONFIDENCE"),
        "expected InvalidEnvVar(DEALSCOUT_MIN_CONFIDENCE), got: {result:?}"
    );
}

#[test]
fn test_metadata_accepts_truthy_values() {
    for raw in ["1", "true", "TRUE", "yes", "on"] {
        let mut map = full_env();
        map.insert("DEALSCOUT_TEST_METADATA", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.test_metadata, "expected {raw} to enable test metadata");
    }
}

#[test]
fn test_metadata_rejects_garbage() {
    let mut map = full_env();
    map.insert("DEALSCOUT_TEST_METADATA", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DEALSCOUT_TEST_METADATA")
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = full_env();
    map.insert("DEALSCOUT_PROXY_API_KEY", "proxy-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("sk-test"));
    assert!(!rendered.contains("proxy-secret"));
    assert!(rendered.contains("[redacted]"));
}
