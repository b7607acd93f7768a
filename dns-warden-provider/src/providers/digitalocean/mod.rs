//! DigitalOcean DNS provider.

mod error;
mod http;
mod provider;
mod types;

use std::time::Duration;

use reqwest::Client;

use crate::cache::RecordCache;
use crate::providers::common::create_http_client;

pub(crate) use types::{DigitalOceanRecord, DomainRecordResponse, DomainRecordsResponse};

pub(crate) const DO_API_BASE: &str = "https://api.digitalocean.com/v2";
/// DigitalOcean Domain Records API maximum page size.
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 200;

/// DigitalOcean DNS provider.
///
/// Record routes are keyed by domain name, so no zone id resolution is
/// needed; `init()` only verifies the token and that the domain exists.
pub struct DigitalOceanProvider {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    pub(crate) zone_name: String,
    pub(crate) cache: RecordCache,
}

impl DigitalOceanProvider {
    pub fn new(api_token: String, zone: String, cache_max_age: Duration) -> Self {
        Self {
            client: create_http_client(),
            api_token,
            zone_name: zone,
            cache: RecordCache::new(cache_max_age),
        }
    }
}
