//! Porkbun API type definitions.
//!
//! The API is loosely typed: record ids, TTLs and priorities arrive as either
//! JSON strings or numbers depending on the endpoint, so the deserializers
//! here accept both.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn de_ttl<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = StringOrNumber::deserialize(deserializer)?.into_string();
    raw.parse().map_err(serde::de::Error::custom)
}

fn de_opt_u16<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    let raw = Option::<StringOrNumber>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(v) => v
            .into_string()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Status envelope present on every response.
#[derive(Debug, Deserialize)]
pub struct PorkbunStatus {
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PorkbunRetrieveResponse {
    pub records: Vec<PorkbunRecord>,
}

#[derive(Debug, Deserialize)]
pub struct PorkbunCreateResponse {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
}

/// Porkbun DNS record (response shape). `name` is the full hostname.
#[derive(Debug, Deserialize)]
pub struct PorkbunRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(deserialize_with = "de_ttl")]
    pub ttl: u32,
    #[serde(default, deserialize_with = "de_opt_u16")]
    pub prio: Option<u16>,
    pub notes: Option<String>,
}

/// Request body for record create/edit. `name` is the subdomain part only,
/// empty for the apex.
#[derive(Debug, Serialize)]
pub struct PorkbunRecordBody {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Empty request body for endpoints that only need the key pair.
#[derive(Debug, Serialize)]
pub struct EmptyBody {}
