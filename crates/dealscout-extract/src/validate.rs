//! Public-URL validation run before any network access.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use reqwest::Url;

use crate::error::ExtractError;

/// Parses `raw` and rejects anything that is not a public http(s) URL.
///
/// Rejected: non-http(s) schemes, missing host, `localhost` and `*.localhost`,
/// and literal IPs in loopback, private, link-local, unspecified, or
/// unique-local ranges (including IPv4-mapped IPv6 forms of those).
///
/// # Errors
///
/// Returns [`ExtractError::InvalidUrl`] describing the first violated rule.
pub fn validate_url(raw: &str) -> Result<Url, ExtractError> {
    let invalid = |reason: &str| ExtractError::InvalidUrl {
        url: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(&format!(
            "unsupported scheme \"{}\"; only http and https are allowed",
            url.scheme()
        )));
    }

    let Some(host) = url.host_str() else {
        return Err(invalid("missing host"));
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(ip) {
            return Err(invalid("private or reserved IP address"));
        }
    } else {
        let domain = host.trim_end_matches('.').to_ascii_lowercase();
        if domain == "localhost" || domain.ends_with(".localhost") {
            return Err(invalid("localhost is not a public host"));
        }
    }

    Ok(url)
}

/// `true` for addresses that must never be fetched on a caller's behalf.
#[must_use]
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    let [a, ..] = ip.octets();
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified() || a == 0
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_private_v4(mapped);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(raw: &str) -> bool {
        matches!(validate_url(raw), Err(ExtractError::InvalidUrl { .. }))
    }

    #[test]
    fn accepts_public_https_url() {
        let url = validate_url("https://www.nordstrom.com/s/wool-coat/123456").unwrap();
        assert_eq!(url.host_str(), Some("www.nordstrom.com"));
    }

    #[test]
    fn accepts_public_ip() {
        assert!(validate_url("http://93.184.216.34/product").is_ok());
    }

    #[test]
    fn rejects_unparseable_input() {
        assert!(rejected("not a url"));
        assert!(rejected(""));
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(rejected("ftp://shop.example.com/p/1"));
        assert!(rejected("file:///etc/passwd"));
        assert!(rejected("javascript:alert(1)"));
    }

    #[test]
    fn rejects_localhost_names() {
        assert!(rejected("http://localhost/product"));
        assert!(rejected("http://LOCALHOST:8080/product"));
        assert!(rejected("http://shop.localhost/product"));
    }

    #[test]
    fn rejects_private_ipv4_ranges() {
        for raw in [
            "http://10.0.0.5/product",
            "http://127.0.0.1/product",
            "http://172.16.4.1/product",
            "http://172.31.255.255/product",
            "http://192.168.1.10/product",
            "http://169.254.169.254/latest/meta-data",
            "http://0.0.0.0/product",
        ] {
            assert!(rejected(raw), "{raw} should be rejected");
        }
    }

    #[test]
    fn accepts_ipv4_just_outside_private_ranges() {
        assert!(validate_url("http://172.32.0.1/product").is_ok());
        assert!(validate_url("http://11.0.0.1/product").is_ok());
    }

    #[test]
    fn rejects_private_ipv6() {
        assert!(rejected("http://[::1]/product"));
        assert!(rejected("http://[fd00::1]/product"));
        assert!(rejected("http://[fe80::1]/product"));
        assert!(rejected("http://[::ffff:10.0.0.5]/product"));
    }

    #[test]
    fn error_names_the_url() {
        let err = validate_url("http://10.0.0.5/product").unwrap_err();
        assert!(err.to_string().contains("10.0.0.5"));
    }
}
