//! Per-record-type structural validation.
//!
//! Runs before any network call; errors always name the offending field.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{ProviderError, Result};
use crate::types::{DnsRecord, DnsRecordType, ProviderCapabilities};

fn invalid(provider: &str, field: &str, detail: impl Into<String>) -> ProviderError {
    ProviderError::InvalidRecord {
        provider: provider.to_string(),
        field: field.to_string(),
        detail: detail.into(),
    }
}

/// Validate a record against a provider's declared capabilities.
///
/// Checks, in order: non-empty name and content, supported record type,
/// TTL within the provider's bounds (a TTL of exactly `1` is accepted on
/// providers whose range starts at 1, meaning "automatic"), IP literal
/// syntax for A/AAAA, and the type-specific required fields
/// (MX: priority; SRV: priority, weight, port; CAA: flags, tag).
pub fn validate_record(
    provider: &str,
    capabilities: &ProviderCapabilities,
    record: &DnsRecord,
) -> Result<()> {
    if record.name.trim().is_empty() {
        return Err(invalid(provider, "name", "record name must not be empty"));
    }
    if record.content.trim().is_empty() {
        return Err(invalid(
            provider,
            "content",
            "record content must not be empty",
        ));
    }
    if !capabilities.supports_type(record.record_type) {
        return Err(ProviderError::UnsupportedRecordType {
            provider: provider.to_string(),
            record_type: record.record_type.to_string(),
        });
    }
    if !capabilities.ttl_range.contains(record.ttl) {
        return Err(invalid(
            provider,
            "ttl",
            format!(
                "ttl {} outside provider bounds {}..={}",
                record.ttl, capabilities.ttl_range.min, capabilities.ttl_range.max
            ),
        ));
    }

    match record.record_type {
        DnsRecordType::A => {
            if record.content.parse::<Ipv4Addr>().is_err() {
                return Err(invalid(
                    provider,
                    "content",
                    format!("'{}' is not a valid IPv4 address", record.content),
                ));
            }
        }
        DnsRecordType::Aaaa => {
            if record.content.parse::<Ipv6Addr>().is_err() {
                return Err(invalid(
                    provider,
                    "content",
                    format!("'{}' is not a valid IPv6 address", record.content),
                ));
            }
        }
        DnsRecordType::Mx => {
            if record.priority.is_none() {
                return Err(invalid(provider, "priority", "MX records require a priority"));
            }
        }
        DnsRecordType::Srv => {
            if record.priority.is_none() {
                return Err(invalid(provider, "priority", "SRV records require a priority"));
            }
            if record.weight.is_none() {
                return Err(invalid(provider, "weight", "SRV records require a weight"));
            }
            if record.port.is_none() {
                return Err(invalid(provider, "port", "SRV records require a port"));
            }
        }
        DnsRecordType::Caa => {
            if record.flags.is_none() {
                return Err(invalid(provider, "flags", "CAA records require flags"));
            }
            match record.tag.as_deref() {
                None => return Err(invalid(provider, "tag", "CAA records require a tag")),
                Some("issue" | "issuewild" | "iodef") => {}
                Some(other) => {
                    return Err(invalid(
                        provider,
                        "tag",
                        format!("'{other}' is not a valid CAA tag (issue, issuewild, iodef)"),
                    ));
                }
            }
        }
        DnsRecordType::Cname | DnsRecordType::Txt | DnsRecordType::Ns => {}
    }

    if record.proxied == Some(true) && !capabilities.supports_proxy {
        return Err(invalid(
            provider,
            "proxied",
            "this provider does not support proxying",
        ));
    }

    Ok(())
}
