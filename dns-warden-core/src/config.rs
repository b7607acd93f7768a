//! Environment-style engine configuration.
//!
//! All values come from key/value pairs (`from_env` reads the process
//! environment; `from_map` takes any map, which is what tests use).
//! Credential env names derive from provider metadata: field key `apiToken`
//! for provider `porkbun` becomes `PORKBUN_API_TOKEN`.

use std::collections::HashMap;
use std::time::Duration;

use dns_warden_provider::{
    get_all_provider_metadata, DnsRecordType, ProviderCredentials, ProviderType,
};

use crate::defaults::{DefaultsTable, RecordDefaults};
use crate::error::{CoreError, CoreResult};
use crate::types::{ProviderConfigEntry, RecordSource, RecordSpec};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
const DEFAULT_GRACE_PERIOD_SECS: u64 = 86_400;
const DEFAULT_IP_REFRESH_SECS: u64 = 300;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 30;

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub provider: ProviderConfigEntry,
    pub poll_interval: Duration,
    pub cleanup_enabled: bool,
    pub cleanup_grace_period: Duration,
    pub ip_refresh_interval: Duration,
    pub cache_max_age: Duration,
    pub preserved_hostnames: Vec<String>,
    pub managed_hostnames: Vec<RecordSpec>,
    pub defaults: DefaultsTable,
}

impl EngineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_map(&std::env::vars().collect())
    }

    /// Build configuration from an explicit key/value map.
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] on a missing provider, unknown provider type,
    /// unparsable number/boolean, or malformed managed-hostname entry.
    pub fn from_map(vars: &HashMap<String, String>) -> CoreResult<Self> {
        let provider_name = get(vars, "DNS_PROVIDER")
            .ok_or_else(|| CoreError::Config("DNS_PROVIDER is not set".to_string()))?;
        let provider_type: ProviderType = provider_name
            .parse()
            .map_err(CoreError::Config)?;

        let credentials = credential_map(vars, provider_type);
        let provider = ProviderConfigEntry {
            id: provider_type.to_string(),
            provider_type,
            credentials,
            is_default: true,
            enabled: true,
        };

        Ok(Self {
            provider,
            poll_interval: duration_secs(vars, "POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS)?,
            cleanup_enabled: boolean(vars, "CLEANUP_ENABLED", false)?,
            cleanup_grace_period: duration_secs(
                vars,
                "CLEANUP_GRACE_PERIOD",
                DEFAULT_GRACE_PERIOD_SECS,
            )?,
            ip_refresh_interval: duration_secs(vars, "IP_REFRESH_INTERVAL", DEFAULT_IP_REFRESH_SECS)?,
            cache_max_age: duration_secs(vars, "CACHE_MAX_AGE", DEFAULT_CACHE_MAX_AGE_SECS)?,
            preserved_hostnames: list(vars, "PRESERVED_HOSTNAMES"),
            managed_hostnames: managed_hostnames(vars)?,
            defaults: defaults_table(vars)?,
        })
    }

    /// Typed credentials for the configured provider.
    pub fn provider_credentials(&self) -> CoreResult<ProviderCredentials> {
        ProviderCredentials::from_map(self.provider.provider_type, &self.provider.credentials)
            .map_err(CoreError::from)
    }
}

fn get(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn duration_secs(vars: &HashMap<String, String>, key: &str, default: u64) -> CoreResult<Duration> {
    match get(vars, key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| CoreError::Config(format!("{key} must be a number of seconds, got '{raw}'"))),
    }
}

fn boolean(vars: &HashMap<String, String>, key: &str, default: bool) -> CoreResult<bool> {
    match get(vars, key) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(CoreError::Config(format!("{key} must be a boolean, got '{raw}'"))),
        },
    }
}

fn list(vars: &HashMap<String, String>, key: &str) -> Vec<String> {
    get(vars, key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `apiToken` → `API_TOKEN`.
fn field_env_suffix(field_key: &str) -> String {
    let mut out = String::with_capacity(field_key.len() + 4);
    for c in field_key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Collect `<PROVIDER>_<FIELD>` env values into the credential map the
/// factory expects, driven by provider metadata rather than a hardcoded list.
fn credential_map(vars: &HashMap<String, String>, provider: ProviderType) -> HashMap<String, String> {
    let prefix = provider.to_string().to_ascii_uppercase();
    let mut credentials = HashMap::new();

    for metadata in get_all_provider_metadata() {
        if metadata.id != provider {
            continue;
        }
        for field in &metadata.required_fields {
            let env_key = format!("{prefix}_{}", field_env_suffix(&field.key));
            if let Some(value) = get(vars, &env_key) {
                credentials.insert(field.key.clone(), value);
            }
        }
    }
    credentials
}

/// `MANAGED_HOSTNAMES` entries look like `name:TYPE:content`, e.g.
/// `vpn.example.com:A:203.0.113.9`.
fn managed_hostnames(vars: &HashMap<String, String>) -> CoreResult<Vec<RecordSpec>> {
    let mut specs = Vec::new();
    for entry in list(vars, "MANAGED_HOSTNAMES") {
        let parts: Vec<&str> = entry.split(':').collect();
        let [name, type_str, content] = parts.as_slice() else {
            return Err(CoreError::Config(format!(
                "MANAGED_HOSTNAMES entry '{entry}' must be name:TYPE:content"
            )));
        };
        let record_type = parse_record_type(type_str)?;
        let mut spec = RecordSpec::new(record_type, *name, *content);
        spec.source = RecordSource::Managed;
        specs.push(spec);
    }
    Ok(specs)
}

fn parse_record_type(raw: &str) -> CoreResult<DnsRecordType> {
    DnsRecordType::ALL
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(raw))
        .ok_or_else(|| CoreError::Config(format!("unknown record type '{raw}'")))
}

/// Global tier from `DEFAULT_TTL`/`DEFAULT_PROXIED`/`DEFAULT_CONTENT`,
/// per-type tier from `DEFAULT_<TYPE>_TTL` and `DEFAULT_<TYPE>_PROXIED`.
fn defaults_table(vars: &HashMap<String, String>) -> CoreResult<DefaultsTable> {
    let global = RecordDefaults {
        ttl: optional_u32(vars, "DEFAULT_TTL")?,
        proxied: optional_bool(vars, "DEFAULT_PROXIED")?,
        content: get(vars, "DEFAULT_CONTENT"),
    };
    let mut table = DefaultsTable::new(global);

    for record_type in DnsRecordType::ALL {
        let name = record_type.as_str();
        let per_type = RecordDefaults {
            ttl: optional_u32(vars, &format!("DEFAULT_{name}_TTL"))?,
            proxied: optional_bool(vars, &format!("DEFAULT_{name}_PROXIED"))?,
            content: get(vars, &format!("DEFAULT_{name}_CONTENT")),
        };
        table.set_type_defaults(record_type, per_type);
    }
    Ok(table)
}

fn optional_u32(vars: &HashMap<String, String>, key: &str) -> CoreResult<Option<u32>> {
    match get(vars, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| CoreError::Config(format!("{key} must be a number, got '{raw}'"))),
    }
}

fn optional_bool(vars: &HashMap<String, String>, key: &str) -> CoreResult<Option<bool>> {
    match get(vars, key) {
        None => Ok(None),
        Some(_) => boolean(vars, key, false).map(Some),
    }
}
