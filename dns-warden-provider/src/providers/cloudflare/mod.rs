//! Cloudflare DNS provider (proxy-capable).

mod error;
mod http;
mod provider;
mod types;

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;

use crate::cache::RecordCache;
use crate::providers::common::create_http_client;

pub(crate) use types::{CloudflareDnsRecord, CloudflareResponse, CloudflareZone};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Cloudflare DNS Records API maximum page size.
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;

/// Cloudflare DNS provider.
///
/// One instance manages one zone; the zone id is resolved from the configured
/// zone name during `init()`.
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    pub(crate) zone_name: String,
    pub(crate) zone_id: OnceLock<String>,
    pub(crate) cache: RecordCache,
}

impl CloudflareProvider {
    pub fn new(api_token: String, zone: String, cache_max_age: Duration) -> Self {
        Self {
            client: create_http_client(),
            api_token,
            zone_name: zone,
            zone_id: OnceLock::new(),
            cache: RecordCache::new(cache_max_age),
        }
    }
}
