//! Porkbun DNS provider.

mod error;
mod http;
mod provider;
mod types;

use std::time::Duration;

use reqwest::Client;

use crate::cache::RecordCache;
use crate::providers::common::create_http_client;

pub(crate) use types::{PorkbunCreateResponse, PorkbunRecord, PorkbunRetrieveResponse};

pub(crate) const PORKBUN_API_BASE: &str = "https://api.porkbun.com/api/json/v3";

/// Porkbun DNS provider.
///
/// Every endpoint is a POST carrying the API key pair in the JSON body.
/// The `notes` field stands in for a record comment.
pub struct PorkbunProvider {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) secret_api_key: String,
    pub(crate) zone_name: String,
    pub(crate) cache: RecordCache,
}

impl PorkbunProvider {
    pub fn new(
        api_key: String,
        secret_api_key: String,
        zone: String,
        cache_max_age: Duration,
    ) -> Self {
        Self {
            client: create_http_client(),
            api_key,
            secret_api_key,
            zone_name: zone,
            cache: RecordCache::new(cache_max_age),
        }
    }
}
