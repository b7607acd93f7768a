//! Core type definitions for the reconciliation engine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dns_warden_provider::{DnsRecord, DnsRecordType, ProviderType, RecordKey};

/// Where a desired-state entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordSource {
    /// Derived from a running container's labels / routing rules.
    Container,
    /// Created administratively (managed hostname).
    Managed,
}

/// One desired-state entry, as supplied by the watcher or an administrator.
///
/// `content` may be empty when `needs_ip_lookup` is set; the reconciler
/// substitutes the current public IP before classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSpec {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub needs_ip_lookup: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub source: RecordSource,
}

impl RecordSpec {
    /// Shorthand for a container-derived entry with literal content.
    #[must_use]
    pub fn new(record_type: DnsRecordType, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            record_type,
            name: name.into(),
            content: content.into(),
            needs_ip_lookup: false,
            ttl: None,
            proxied: None,
            priority: None,
            weight: None,
            port: None,
            flags: None,
            tag: None,
            source: RecordSource::Container,
        }
    }

    /// Diff identity, shared with provider records.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.record_type, &self.name)
    }
}

/// Which stage of the pass a record failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureStage {
    IpResolution,
    Validation,
    Create,
    Update,
    Delete,
    Tracker,
}

/// One record-level failure inside a pass or cleanup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub stage: FailureStage,
    pub message: String,
}

/// Outcome of one reconciliation pass.
///
/// Counters are threaded explicitly through the reconciler and returned to
/// the caller; there is no ambient shared state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub errors: u32,
    pub failures: Vec<RecordFailure>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CycleSummary {
    pub(crate) fn record_failure(
        &mut self,
        record_type: DnsRecordType,
        name: &str,
        stage: FailureStage,
        message: impl Into<String>,
    ) {
        self.errors += 1;
        self.failures.push(RecordFailure {
            record_type,
            name: name.to_string(),
            stage,
            message: message.into(),
        });
    }
}

/// A tracked record currently in the Orphaned state, as exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedRecord {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    /// Provider-side record, when it still exists in the cache snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DnsRecord>,
    pub orphaned_since: DateTime<Utc>,
}

/// Why a cleanup candidate was not deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Hostname matches a preserved pattern.
    Preserved,
    /// Grace period has not elapsed yet.
    WithinGracePeriod,
    /// Record does not carry the ownership marker and was not created by us.
    NotOwned,
    /// Record no longer exists at the provider.
    AlreadyGone,
}

/// One skipped cleanup candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSkip {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub reason: SkipReason,
}

/// Result of a cleanup run: always the full ledger of what happened, never
/// a bare success flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    /// Hostnames actually deleted at the provider.
    pub deleted: Vec<String>,
    pub skipped: Vec<CleanupSkip>,
    pub errors: Vec<RecordFailure>,
}

/// One configured provider.
///
/// Credential values are opaque key/value pairs interpreted by the provider
/// factory; they are masked by [`masked()`](Self::masked) before being echoed
/// anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    pub credentials: HashMap<String, String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ProviderConfigEntry {
    /// Copy with every credential value replaced except the zone.
    #[must_use]
    pub fn masked(&self) -> Self {
        let credentials = self
            .credentials
            .iter()
            .map(|(k, v)| {
                if k == "zone" {
                    (k.clone(), v.clone())
                } else {
                    (k.clone(), "••••••••".to_string())
                }
            })
            .collect();
        Self {
            credentials,
            ..self.clone()
        }
    }
}

/// Enforces the "exactly one default" invariant over a provider list.
///
/// # Errors
///
/// Returns a description of the violation (zero or multiple defaults among
/// enabled entries).
pub fn validate_single_default(entries: &[ProviderConfigEntry]) -> Result<(), String> {
    let defaults = entries
        .iter()
        .filter(|e| e.enabled && e.is_default)
        .count();
    match defaults {
        1 => Ok(()),
        0 => Err("no enabled provider is marked as default".to_string()),
        n => Err(format!("{n} enabled providers are marked as default, expected exactly 1")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, is_default: bool, enabled: bool) -> ProviderConfigEntry {
        ProviderConfigEntry {
            id: id.to_string(),
            provider_type: ProviderType::Cloudflare,
            credentials: [
                ("apiToken".to_string(), "secret-token".to_string()),
                ("zone".to_string(), "example.com".to_string()),
            ]
            .into(),
            is_default,
            enabled,
        }
    }

    #[test]
    fn exactly_one_default_ok() {
        let entries = vec![entry("a", true, true), entry("b", false, true)];
        assert!(validate_single_default(&entries).is_ok());
    }

    #[test]
    fn zero_defaults_rejected() {
        let entries = vec![entry("a", false, true)];
        assert!(validate_single_default(&entries).is_err());
    }

    #[test]
    fn multiple_defaults_rejected() {
        let entries = vec![entry("a", true, true), entry("b", true, true)];
        assert!(validate_single_default(&entries).is_err());
    }

    #[test]
    fn disabled_default_does_not_count() {
        let entries = vec![entry("a", true, false), entry("b", true, true)];
        assert!(validate_single_default(&entries).is_ok());
    }

    #[test]
    fn masked_hides_secrets_but_keeps_zone() {
        let masked = entry("a", true, true).masked();
        assert_eq!(
            masked.credentials.get("zone").map(String::as_str),
            Some("example.com")
        );
        assert!(!masked
            .credentials
            .values()
            .any(|v| v.contains("secret-token")));
    }

    #[test]
    fn record_spec_key_is_case_insensitive() {
        let a = RecordSpec::new(DnsRecordType::A, "App.Example.COM", "1.2.3.4");
        let b = RecordSpec::new(DnsRecordType::A, "app.example.com", "5.6.7.8");
        assert_eq!(a.key(), b.key());
    }
}
