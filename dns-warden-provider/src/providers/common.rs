//! Shared provider utilities.

use std::time::Duration;

use reqwest::Client;

use crate::error::{ProviderError, Result};
use crate::types::DnsRecordType;

// ============ HTTP Client ============

/// Default connect timeout (seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Default request timeout (seconds).
///
/// Every external call is bounded; a timeout surfaces as a transient
/// `ProviderError::Timeout` and is retried by the next pass, never in-pass.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Build an HTTP client with bounded timeouts.
pub fn create_http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

// ============ Record type conversion ============

/// Parse a wire record-type string into [`DnsRecordType`].
pub fn parse_record_type(record_type: &str, provider: &str) -> Result<DnsRecordType> {
    match record_type.to_uppercase().as_str() {
        "A" => Ok(DnsRecordType::A),
        "AAAA" => Ok(DnsRecordType::Aaaa),
        "CNAME" => Ok(DnsRecordType::Cname),
        "MX" => Ok(DnsRecordType::Mx),
        "TXT" => Ok(DnsRecordType::Txt),
        "SRV" => Ok(DnsRecordType::Srv),
        "CAA" => Ok(DnsRecordType::Caa),
        "NS" => Ok(DnsRecordType::Ns),
        _ => Err(ProviderError::UnsupportedRecordType {
            provider: provider.to_string(),
            record_type: record_type.to_string(),
        }),
    }
}

// ============ Hostname handling ============

/// Strip a trailing dot from a domain name.
pub fn normalize_domain_name(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// Convert a fully-qualified name to a zone-relative one.
/// `"www.example.com"` + `"example.com"` -> `"www"`;
/// `"example.com"` + `"example.com"` -> `"@"`.
pub fn full_name_to_relative(full_name: &str, zone_name: &str) -> String {
    let full = normalize_domain_name(full_name);
    let zone = normalize_domain_name(zone_name);

    if full.eq_ignore_ascii_case(&zone) {
        "@".to_string()
    } else if let Some(subdomain) = full
        .to_ascii_lowercase()
        .strip_suffix(&format!(".{}", zone.to_ascii_lowercase()))
    {
        subdomain.to_string()
    } else {
        full
    }
}

/// Convert a zone-relative name to a fully-qualified one.
/// `"www"` + `"example.com"` -> `"www.example.com"`;
/// `"@"` + `"example.com"` -> `"example.com"`.
pub fn relative_to_full_name(relative_name: &str, zone_name: &str) -> String {
    let zone = normalize_domain_name(zone_name);

    if relative_name == "@" || relative_name.is_empty() {
        zone
    } else if relative_name.eq_ignore_ascii_case(&zone)
        || relative_name
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", zone.to_ascii_lowercase()))
    {
        normalize_domain_name(relative_name)
    } else {
        format!("{relative_name}.{zone}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_types() {
        assert_eq!(parse_record_type("a", "test").unwrap(), DnsRecordType::A);
        assert_eq!(
            parse_record_type("SRV", "test").unwrap(),
            DnsRecordType::Srv
        );
    }

    #[test]
    fn parse_unknown_type_fails() {
        let res = parse_record_type("LOC", "test");
        assert!(
            matches!(&res, Err(ProviderError::UnsupportedRecordType { .. })),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn full_to_relative_subdomain() {
        assert_eq!(full_name_to_relative("www.example.com", "example.com"), "www");
    }

    #[test]
    fn full_to_relative_apex() {
        assert_eq!(full_name_to_relative("example.com", "example.com"), "@");
    }

    #[test]
    fn full_to_relative_trailing_dot() {
        assert_eq!(
            full_name_to_relative("www.example.com.", "example.com."),
            "www"
        );
    }

    #[test]
    fn relative_to_full_subdomain() {
        assert_eq!(
            relative_to_full_name("www", "example.com"),
            "www.example.com"
        );
    }

    #[test]
    fn relative_to_full_apex() {
        assert_eq!(relative_to_full_name("@", "example.com"), "example.com");
    }

    #[test]
    fn relative_to_full_already_qualified() {
        assert_eq!(
            relative_to_full_name("app.example.com", "example.com"),
            "app.example.com"
        );
    }
}
