use serde::{Deserialize, Serialize};

/// Fixed comment string stamped onto every record this system creates or updates.
///
/// Providers that support record comments carry this marker server-side so that
/// later passes (and external tooling) can tell system-managed records from
/// foreign ones even if the local ownership tracker is lost.
pub const OWNERSHIP_MARKER: &str = "managed-by:dns-warden";

// ============ Record Types ============

/// DNS record type identifier.
///
/// Serialized as uppercase strings (`"A"`, `"AAAA"`, `"CNAME"`, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
    /// Mail exchange record.
    Mx,
    /// Text record.
    Txt,
    /// Service locator record.
    Srv,
    /// Certificate Authority Authorization record.
    Caa,
    /// Name server record.
    Ns,
}

impl DnsRecordType {
    /// All record types, in a fixed order usable for indexing defaults tables.
    pub const ALL: [Self; 8] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Mx,
        Self::Txt,
        Self::Srv,
        Self::Caa,
        Self::Ns,
    ];

    /// The uppercase wire representation (`"A"`, `"AAAA"`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
            Self::Ns => "NS",
        }
    }
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record, either desired or as returned by a provider.
///
/// The flat shape (optional type-specific fields rather than a tagged enum)
/// is what the diff algorithm compares field-by-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    /// Provider-assigned opaque identifier. `None` until the record exists remotely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    /// Hostname, zone-relative (`"www"`, `"@"`) or fully qualified.
    pub name: String,
    /// Record content. Never empty for a valid record.
    pub content: String,
    /// Time to live in seconds. `1` may mean "automatic" on proxy-capable providers.
    pub ttl: u32,
    /// Whether the provider's CDN proxy is enabled (proxy-capable providers only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    /// MX/SRV priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// SRV weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    /// SRV port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// CAA flags (0 or 128).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u8>,
    /// CAA property tag (`"issue"`, `"issuewild"`, `"iodef"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Provider-side comment. Carries [`OWNERSHIP_MARKER`] on managed records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DnsRecord {
    /// Create a minimal record of the given type.
    #[must_use]
    pub fn new(record_type: DnsRecordType, name: impl Into<String>, content: impl Into<String>, ttl: u32) -> Self {
        Self {
            id: None,
            record_type,
            name: name.into(),
            content: content.into(),
            ttl,
            proxied: None,
            priority: None,
            weight: None,
            port: None,
            flags: None,
            tag: None,
            comment: None,
        }
    }

    /// Identity for diff purposes: the `(type, name)` pair.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.record_type, &self.name)
    }

    /// Whether the record carries the ownership marker in its comment.
    #[must_use]
    pub fn has_ownership_marker(&self) -> bool {
        self.comment
            .as_deref()
            .is_some_and(|c| c.contains(OWNERSHIP_MARKER))
    }
}

/// Case-insensitive `(type, name)` record identity.
///
/// Hostnames are lowercased on construction so that lookups and tracker keys
/// never depend on the casing a provider happens to return.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    /// Lowercased hostname.
    pub name: String,
}

impl RecordKey {
    /// Build a key, normalizing the hostname to lowercase and stripping a trailing dot.
    #[must_use]
    pub fn new(record_type: DnsRecordType, name: &str) -> Self {
        Self {
            record_type,
            name: name.trim_end_matches('.').to_ascii_lowercase(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.record_type, self.name)
    }
}

// ============ Provider Types ============

/// Identifies which DNS provider implementation to use.
///
/// Each variant is gated behind its corresponding feature flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Cloudflare DNS. Requires feature `cloudflare`.
    #[cfg(feature = "cloudflare")]
    Cloudflare,
    /// DigitalOcean DNS. Requires feature `digitalocean`.
    #[cfg(feature = "digitalocean")]
    Digitalocean,
    /// Porkbun DNS. Requires feature `porkbun`.
    #[cfg(feature = "porkbun")]
    Porkbun,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare => write!(f, "cloudflare"),
            #[cfg(feature = "digitalocean")]
            Self::Digitalocean => write!(f, "digitalocean"),
            #[cfg(feature = "porkbun")]
            Self::Porkbun => write!(f, "porkbun"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            #[cfg(feature = "cloudflare")]
            "cloudflare" => Ok(Self::Cloudflare),
            #[cfg(feature = "digitalocean")]
            "digitalocean" => Ok(Self::Digitalocean),
            #[cfg(feature = "porkbun")]
            "porkbun" => Ok(Self::Porkbun),
            other => Err(format!("unknown provider type: {other}")),
        }
    }
}

/// Inclusive TTL bounds declared by a provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtlRange {
    /// Minimum accepted TTL in seconds. `1` means the provider accepts "automatic".
    pub min: u32,
    /// Maximum accepted TTL in seconds.
    pub max: u32,
}

impl TtlRange {
    /// Whether `ttl` falls inside the bounds.
    #[must_use]
    pub fn contains(&self, ttl: u32) -> bool {
        ttl >= self.min && ttl <= self.max
    }
}

/// Declared feature set of a provider, used by the reconciler to skip
/// provider-incompatible fields instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    /// Whether the provider supports CDN proxying (orange-cloud style).
    pub supports_proxy: bool,
    /// Whether the provider supports per-record comments (ownership marker carrier).
    pub supports_comment: bool,
    /// Record types the provider accepts.
    pub supported_types: Vec<DnsRecordType>,
    /// Accepted TTL bounds.
    pub ttl_range: TtlRange,
}

impl ProviderCapabilities {
    /// Whether `record_type` is accepted by this provider.
    #[must_use]
    pub fn supports_type(&self, record_type: DnsRecordType) -> bool {
        self.supported_types.contains(&record_type)
    }
}

// ============ Provider Metadata Types ============

/// The input type of a credential field (affects UI rendering).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Plain text input.
    Text,
    /// Masked/password input.
    Password,
}

/// Definition of a single credential field required by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentialField {
    /// Machine-readable field key (e.g., `"apiToken"`).
    pub key: String,
    /// Human-readable label (e.g., `"API Token"`).
    pub label: String,
    /// Input type for UI rendering.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Optional help/description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

/// Static metadata describing a DNS provider.
///
/// Obtain via [`DnsProvider::metadata()`](crate::DnsProvider::metadata) or
/// [`get_all_provider_metadata()`](crate::get_all_provider_metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Provider type identifier.
    pub id: ProviderType,
    /// Human-readable provider name.
    pub name: String,
    /// Short description of the provider.
    pub description: String,
    /// Credential fields required to authenticate with this provider.
    pub required_fields: Vec<ProviderCredentialField>,
    /// Declared capabilities.
    pub capabilities: ProviderCapabilities,
}

// ============ Credential Types ============

/// Validation error for provider credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialValidationError {
    /// A required credential field is missing entirely.
    MissingField {
        /// Which provider the error relates to.
        provider: ProviderType,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A credential field is present but empty/whitespace-only.
    EmptyField {
        /// Which provider the error relates to.
        provider: ProviderType,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// The provider type itself is unknown or disabled.
    UnsupportedProvider {
        /// The offending provider type string.
        provider: String,
    },
}

impl std::fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { label, .. } => write!(f, "Missing required field: {label}"),
            Self::EmptyField { label, .. } => write!(f, "Field must not be empty: {label}"),
            Self::UnsupportedProvider { provider } => {
                write!(f, "Provider '{provider}' is not supported or not enabled")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Type-safe credential container for all supported DNS providers.
///
/// Each variant holds the authentication fields plus the zone the provider
/// instance manages. Pass this to [`create_provider()`](crate::create_provider).
///
/// Credential values are opaque to the rest of the system and are never
/// logged; use [`masked()`](Self::masked) when echoing configuration back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", content = "credentials")]
pub enum ProviderCredentials {
    /// Cloudflare credentials. Requires feature `cloudflare`.
    #[cfg(feature = "cloudflare")]
    #[serde(rename = "cloudflare")]
    Cloudflare {
        /// Cloudflare API token.
        api_token: String,
        /// Zone name to manage (e.g., `"example.com"`).
        zone: String,
    },

    /// DigitalOcean credentials. Requires feature `digitalocean`.
    #[cfg(feature = "digitalocean")]
    #[serde(rename = "digitalocean")]
    Digitalocean {
        /// DigitalOcean API token.
        api_token: String,
        /// Domain to manage.
        zone: String,
    },

    /// Porkbun credentials. Requires feature `porkbun`.
    #[cfg(feature = "porkbun")]
    #[serde(rename = "porkbun")]
    Porkbun {
        /// Porkbun API key.
        api_key: String,
        /// Porkbun secret API key.
        secret_api_key: String,
        /// Domain to manage.
        zone: String,
    },
}

impl ProviderCredentials {
    /// Construct credentials from a flat `HashMap`, validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialValidationError`] if a required field is missing or empty.
    pub fn from_map(
        provider: ProviderType,
        map: &std::collections::HashMap<String, String>,
    ) -> std::result::Result<Self, CredentialValidationError> {
        match provider {
            #[cfg(feature = "cloudflare")]
            ProviderType::Cloudflare => Ok(Self::Cloudflare {
                api_token: Self::get_required_field(provider, map, "apiToken", "API Token")?,
                zone: Self::get_required_field(provider, map, "zone", "Zone")?,
            }),
            #[cfg(feature = "digitalocean")]
            ProviderType::Digitalocean => Ok(Self::Digitalocean {
                api_token: Self::get_required_field(provider, map, "apiToken", "API Token")?,
                zone: Self::get_required_field(provider, map, "zone", "Zone")?,
            }),
            #[cfg(feature = "porkbun")]
            ProviderType::Porkbun => Ok(Self::Porkbun {
                api_key: Self::get_required_field(provider, map, "apiKey", "API Key")?,
                secret_api_key: Self::get_required_field(
                    provider,
                    map,
                    "secretApiKey",
                    "Secret API Key",
                )?,
                zone: Self::get_required_field(provider, map, "zone", "Zone")?,
            }),
        }
    }

    fn get_required_field(
        provider: ProviderType,
        map: &std::collections::HashMap<String, String>,
        key: &str,
        label: &str,
    ) -> std::result::Result<String, CredentialValidationError> {
        match map.get(key) {
            None => Err(CredentialValidationError::MissingField {
                provider,
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) if v.trim().is_empty() => Err(CredentialValidationError::EmptyField {
                provider,
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) => Ok(v.clone()),
        }
    }

    /// Returns the [`ProviderType`] corresponding to this credential variant.
    #[must_use]
    pub fn provider_type(&self) -> ProviderType {
        match self {
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare { .. } => ProviderType::Cloudflare,
            #[cfg(feature = "digitalocean")]
            Self::Digitalocean { .. } => ProviderType::Digitalocean,
            #[cfg(feature = "porkbun")]
            Self::Porkbun { .. } => ProviderType::Porkbun,
        }
    }

    /// The zone this credential set manages.
    #[must_use]
    pub fn zone(&self) -> &str {
        match self {
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare { zone, .. } => zone,
            #[cfg(feature = "digitalocean")]
            Self::Digitalocean { zone, .. } => zone,
            #[cfg(feature = "porkbun")]
            Self::Porkbun { zone, .. } => zone,
        }
    }

    /// A map representation with all secret values masked, safe for display.
    #[must_use]
    pub fn masked(&self) -> std::collections::HashMap<String, String> {
        const MASK: &str = "••••••••";
        match self {
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare { zone, .. } => [
                ("apiToken".to_string(), MASK.to_string()),
                ("zone".to_string(), zone.clone()),
            ]
            .into(),
            #[cfg(feature = "digitalocean")]
            Self::Digitalocean { zone, .. } => [
                ("apiToken".to_string(), MASK.to_string()),
                ("zone".to_string(), zone.clone()),
            ]
            .into(),
            #[cfg(feature = "porkbun")]
            Self::Porkbun { zone, .. } => [
                ("apiKey".to_string(), MASK.to_string()),
                ("secretApiKey".to_string(), MASK.to_string()),
                ("zone".to_string(), zone.clone()),
            ]
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn record_key_normalizes_case_and_trailing_dot() {
        let a = RecordKey::new(DnsRecordType::A, "App.Example.COM.");
        let b = RecordKey::new(DnsRecordType::A, "app.example.com");
        assert_eq!(a, b);
    }

    #[test]
    fn record_key_distinguishes_types() {
        let a = RecordKey::new(DnsRecordType::A, "app.example.com");
        let cname = RecordKey::new(DnsRecordType::Cname, "app.example.com");
        assert_ne!(a, cname);
    }

    #[test]
    fn record_type_serde_roundtrip() {
        for t in DnsRecordType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            let back: DnsRecordType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn ownership_marker_detection() {
        let mut record = DnsRecord::new(DnsRecordType::A, "app", "203.0.113.5", 300);
        assert!(!record.has_ownership_marker());
        record.comment = Some(format!("{OWNERSHIP_MARKER} since 2024"));
        assert!(record.has_ownership_marker());
        record.comment = Some("someone else's note".to_string());
        assert!(!record.has_ownership_marker());
    }

    #[test]
    fn ttl_range_bounds_are_inclusive() {
        let range = TtlRange { min: 60, max: 86400 };
        assert!(range.contains(60));
        assert!(range.contains(86400));
        assert!(!range.contains(59));
        assert!(!range.contains(86401));
    }

    #[test]
    fn credentials_cloudflare_from_map() {
        let map: HashMap<String, String> = [
            ("apiToken".to_string(), "my-token".to_string()),
            ("zone".to_string(), "example.com".to_string()),
        ]
        .into();
        let cred = ProviderCredentials::from_map(ProviderType::Cloudflare, &map).unwrap();
        assert_eq!(cred.provider_type(), ProviderType::Cloudflare);
        assert_eq!(cred.zone(), "example.com");
    }

    #[test]
    fn credentials_missing_field() {
        let map: HashMap<String, String> =
            [("zone".to_string(), "example.com".to_string())].into();
        let res = ProviderCredentials::from_map(ProviderType::Cloudflare, &map);
        assert!(
            matches!(&res, Err(CredentialValidationError::MissingField { field, .. }) if field == "apiToken"),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn credentials_empty_field() {
        let map: HashMap<String, String> = [
            ("apiKey".to_string(), "k".to_string()),
            ("secretApiKey".to_string(), "  ".to_string()),
            ("zone".to_string(), "example.com".to_string()),
        ]
        .into();
        let res = ProviderCredentials::from_map(ProviderType::Porkbun, &map);
        assert!(
            matches!(&res, Err(CredentialValidationError::EmptyField { field, .. }) if field == "secretApiKey"),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn masked_credentials_hide_secrets() {
        let cred = ProviderCredentials::Porkbun {
            api_key: "pk_live_abc".to_string(),
            secret_api_key: "sk_live_def".to_string(),
            zone: "example.com".to_string(),
        };
        let masked = cred.masked();
        assert!(!masked.values().any(|v| v.contains("pk_live")));
        assert!(!masked.values().any(|v| v.contains("sk_live")));
        assert_eq!(masked.get("zone").map(String::as_str), Some("example.com"));
    }

    #[test]
    fn provider_type_parse() {
        assert_eq!(
            "Cloudflare".parse::<ProviderType>().unwrap(),
            ProviderType::Cloudflare
        );
        assert!("bind9".parse::<ProviderType>().is_err());
    }
}
