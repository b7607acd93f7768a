//! DigitalOcean API type definitions.

use serde::{Deserialize, Serialize};

/// Error body returned on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct DigitalOceanApiError {
    /// Short error identifier, e.g. `"unauthorized"` or `"not_found"`.
    pub id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DomainResponse {
    pub domain: DigitalOceanDomain,
}

#[derive(Debug, Deserialize)]
pub struct DigitalOceanDomain {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DomainRecordsResponse {
    pub domain_records: Vec<DigitalOceanRecord>,
    pub meta: Option<DigitalOceanMeta>,
}

#[derive(Debug, Deserialize)]
pub struct DomainRecordResponse {
    pub domain_record: DigitalOceanRecord,
}

#[derive(Debug, Deserialize)]
pub struct DigitalOceanMeta {
    pub total: u32,
}

/// DigitalOcean domain record (response shape).
///
/// `name` is already zone-relative, with `"@"` for the apex. `data` holds
/// the record value; SRV and MX targets carry a trailing dot.
#[derive(Debug, Deserialize)]
pub struct DigitalOceanRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub data: String,
    pub ttl: u32,
    pub priority: Option<u16>,
    pub weight: Option<u16>,
    pub port: Option<u16>,
    pub flags: Option<u8>,
    pub tag: Option<String>,
}

/// Request body for record create/update.
#[derive(Debug, Serialize)]
pub struct DigitalOceanRecordBody {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub data: String,
    pub ttl: u32,
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
}
