//! Public IP resolution for `needs_ip_lookup` records.
//!
//! Backed by plain-text IP echo services, cached on its own interval
//! independent of DNS polling. A failed lookup fails only the records that
//! need it, never the pass.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};

const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://icanhazip.com",
];

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct CachedIp {
    address: String,
    fetched_at: DateTime<Utc>,
}

/// Cached public IP lookup against IP-echo endpoints.
pub struct PublicIpResolver {
    client: reqwest::Client,
    endpoints: Vec<String>,
    refresh_interval: chrono::Duration,
    cached: RwLock<Option<CachedIp>>,
}

impl PublicIpResolver {
    #[must_use]
    pub fn new(refresh_interval: Duration) -> Self {
        Self::with_endpoints(
            DEFAULT_ENDPOINTS.iter().map(ToString::to_string).collect(),
            refresh_interval,
        )
    }

    #[must_use]
    pub fn with_endpoints(endpoints: Vec<String>, refresh_interval: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(LOOKUP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoints,
            refresh_interval: chrono::Duration::from_std(refresh_interval)
                .unwrap_or_else(|_| chrono::Duration::seconds(300)),
            cached: RwLock::new(None),
        }
    }

    /// Current public IP, served from cache while fresh.
    ///
    /// # Errors
    ///
    /// [`CoreError::IpLookup`] when every endpoint fails and no cached value
    /// exists. A stale cached value is returned as a degraded fallback when
    /// all endpoints fail.
    pub async fn get_public_ip(&self) -> CoreResult<String> {
        let now = Utc::now();
        if let Some(cached) = self.cached.read().await.as_ref() {
            if now - cached.fetched_at < self.refresh_interval {
                return Ok(cached.address.clone());
            }
        }

        match self.fetch().await {
            Ok(address) => {
                *self.cached.write().await = Some(CachedIp {
                    address: address.clone(),
                    fetched_at: now,
                });
                Ok(address)
            }
            Err(e) => {
                if let Some(cached) = self.cached.read().await.as_ref() {
                    log::warn!("[ip] lookup failed ({e}), serving stale value");
                    return Ok(cached.address.clone());
                }
                Err(e)
            }
        }
    }

    /// Drop the cached value; the next call hits the network.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn fetch(&self) -> CoreResult<String> {
        let mut last_error = String::from("no endpoints configured");

        for endpoint in &self.endpoints {
            match self.try_endpoint(endpoint).await {
                Ok(address) => {
                    log::debug!("[ip] resolved public IP via {endpoint}");
                    return Ok(address);
                }
                Err(e) => {
                    log::debug!("[ip] {endpoint} failed: {e}");
                    last_error = e;
                }
            }
        }

        Err(CoreError::IpLookup(last_error))
    }

    async fn try_endpoint(&self, endpoint: &str) -> Result<String, String> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body = response.text().await.map_err(|e| e.to_string())?;
        let trimmed = body.trim();

        trimmed
            .parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|_| format!("response is not an IP address: {trimmed:.64}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_endpoints_fails_with_ip_lookup_error() {
        let resolver = PublicIpResolver::with_endpoints(vec![], Duration::from_secs(60));
        let result = resolver.get_public_ip().await;
        assert!(matches!(result, Err(CoreError::IpLookup(_))));
    }

    #[tokio::test]
    async fn invalidate_clears_cache() {
        let resolver = PublicIpResolver::with_endpoints(vec![], Duration::from_secs(60));
        *resolver.cached.write().await = Some(CachedIp {
            address: "203.0.113.5".to_string(),
            fetched_at: Utc::now(),
        });
        assert_eq!(resolver.get_public_ip().await.unwrap(), "203.0.113.5");

        resolver.invalidate().await;
        assert!(resolver.get_public_ip().await.is_err());
    }

    #[tokio::test]
    async fn stale_cache_served_when_endpoints_fail() {
        let resolver = PublicIpResolver::with_endpoints(vec![], Duration::from_secs(0));
        *resolver.cached.write().await = Some(CachedIp {
            address: "203.0.113.5".to_string(),
            fetched_at: Utc::now() - chrono::Duration::hours(1),
        });
        // Refresh is due and fails, but the old value is still usable.
        assert_eq!(resolver.get_public_ip().await.unwrap(), "203.0.113.5");
    }
}
