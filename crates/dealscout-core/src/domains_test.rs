use std::io::Write;

use super::*;

fn rule(host: &str, requires_proxy: bool, hints: Option<&str>) -> DomainRule {
    DomainRule {
        host: host.to_string(),
        requires_proxy,
        hints: hints.map(str::to_string),
    }
}

fn sample_rules() -> DomainRules {
    DomainRules {
        domains: vec![
            rule("nordstrom.com", true, Some("Sale price is shown in red.")),
            rule("shop.example.co.uk", false, None),
        ],
    }
}

#[test]
fn lookup_matches_exact_host() {
    let rules = sample_rules();
    assert_eq!(
        rules.lookup("nordstrom.com").map(|r| r.host.as_str()),
        Some("nordstrom.com")
    );
}

#[test]
fn lookup_ignores_www_and_case() {
    let rules = sample_rules();
    assert!(rules.lookup("WWW.Nordstrom.com").is_some());
}

#[test]
fn lookup_walks_parent_domains() {
    let rules = sample_rules();
    assert!(rules.lookup("m.shop.nordstrom.com").is_some());
    assert!(rules.requires_proxy("m.shop.nordstrom.com"));
}

#[test]
fn lookup_does_not_match_bare_tld() {
    let rules = DomainRules {
        domains: vec![rule("com", true, None)],
    };
    assert!(rules.lookup("nordstrom.com").is_none());
}

#[test]
fn lookup_does_not_match_suffix_without_dot() {
    let rules = sample_rules();
    assert!(rules.lookup("notnordstrom.com").is_none());
}

#[test]
fn hints_for_returns_configured_hint() {
    let rules = sample_rules();
    assert_eq!(
        rules.hints_for("nordstrom.com"),
        Some("Sale price is shown in red.")
    );
    assert_eq!(rules.hints_for("shop.example.co.uk"), None);
    assert!(!rules.requires_proxy("shop.example.co.uk"));
}

#[test]
fn parse_accepts_minimal_yaml() {
    let yaml = r"
domains:
  - host: ssense.com
    requires_proxy: true
  - host: everlane.com
    hints: Compare-at price lives in a strikethrough span.
";
    let rules = parse_domain_rules(yaml).unwrap();
    assert_eq!(rules.domains.len(), 2);
    assert!(rules.requires_proxy("www.ssense.com"));
    assert!(!rules.requires_proxy("everlane.com"));
}

#[test]
fn parse_accepts_empty_document_list() {
    let rules = parse_domain_rules("domains: []").unwrap();
    assert!(rules.domains.is_empty());
}

#[test]
fn validate_rejects_empty_host() {
    let rules = DomainRules {
        domains: vec![rule("  ", false, None)],
    };
    let err = validate_domain_rules(&rules).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn validate_rejects_scheme() {
    let rules = DomainRules {
        domains: vec![rule("https://nordstrom.com", false, None)],
    };
    let err = validate_domain_rules(&rules).unwrap_err();
    assert!(err.to_string().contains("bare host"));
}

#[test]
fn validate_rejects_duplicates_case_insensitively() {
    let rules = DomainRules {
        domains: vec![
            rule("nordstrom.com", true, None),
            rule("Nordstrom.com", false, None),
        ],
    };
    let err = validate_domain_rules(&rules).unwrap_err();
    assert!(err.to_string().contains("duplicate domain"));
}

#[test]
fn load_reports_missing_file() {
    let err = load_domain_rules(Path::new("/nonexistent/domains.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::DomainsFileIo { .. }));
}

#[test]
fn load_reads_file_from_disk() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("dealscout-domains-{}.yaml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "domains:\n  - host: farfetch.com\n    requires_proxy: true").unwrap();
    }
    let rules = load_domain_rules(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(rules.requires_proxy("farfetch.com"));
}

#[test]
fn parse_rejects_malformed_yaml() {
    let err = parse_domain_rules("domains: [ { host: ").unwrap_err();
    assert!(matches!(err, ConfigError::DomainsFileParse(_)));
}
