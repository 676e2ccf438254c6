//! Per-retailer rules loaded from `config/domains.yaml`.
//!
//! A rule flags domains that are known to refuse direct fetches (they get the
//! premium rendering-proxy tier) and carries free-text extraction hints that
//! are forwarded to the language-model prompt.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRule {
    /// Bare host, e.g. `"nordstrom.com"`. Matches the host and all subdomains.
    pub host: String,
    #[serde(default)]
    pub requires_proxy: bool,
    #[serde(default)]
    pub hints: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainRules {
    #[serde(default)]
    pub domains: Vec<DomainRule>,
}

impl DomainRules {
    /// Finds the rule for `host`, trying the host itself and then each parent
    /// domain (`shop.example.com` → `example.com`). A leading `www.` is ignored.
    #[must_use]
    pub fn lookup(&self, host: &str) -> Option<&DomainRule> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let mut candidate = host.strip_prefix("www.").unwrap_or(&host);
        loop {
            if let Some(rule) = self
                .domains
                .iter()
                .find(|r| r.host.eq_ignore_ascii_case(candidate))
            {
                return Some(rule);
            }
            match candidate.split_once('.') {
                Some((_, parent)) if parent.contains('.') => candidate = parent,
                _ => return None,
            }
        }
    }

    #[must_use]
    pub fn requires_proxy(&self, host: &str) -> bool {
        self.lookup(host).is_some_and(|r| r.requires_proxy)
    }

    #[must_use]
    pub fn hints_for(&self, host: &str) -> Option<&str> {
        self.lookup(host).and_then(|r| r.hints.as_deref())
    }
}

/// Load and validate domain rules from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_domain_rules(path: &Path) -> Result<DomainRules, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::DomainsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_domain_rules(&content)
}

/// Parse and validate domain rules from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_domain_rules(content: &str) -> Result<DomainRules, ConfigError> {
    let rules: DomainRules = serde_yaml::from_str(content)?;
    validate_domain_rules(&rules)?;
    Ok(rules)
}

fn validate_domain_rules(rules: &DomainRules) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for rule in &rules.domains {
        let host = rule.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Validation(
                "domain host must be non-empty".to_string(),
            ));
        }

        if host.contains("://") || host.contains('/') {
            return Err(ConfigError::Validation(format!(
                "domain '{}' must be a bare host without scheme or path",
                rule.host
            )));
        }

        if !seen.insert(host.to_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate domain: '{}'",
                rule.host
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "domains_test.rs"]
mod tests;
