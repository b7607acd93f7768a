//! Test support: mock provider with an in-memory "remote" record store,
//! injectable failures and call counters.
//!
//! Public so integration tests (and embedders writing their own tests) can
//! drive the engine without network access.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dns_warden_provider::{
    DnsProvider, DnsRecord, DnsRecordType, ProviderCapabilities, ProviderError, ProviderMetadata,
    ProviderType, RecordCache, Result as ProviderResult, TtlRange,
};

/// Fake provider backed by an in-memory record list standing in for the
/// remote API.
pub struct MockProvider {
    zone: String,
    cache: RecordCache,
    remote: RwLock<Vec<DnsRecord>>,
    next_id: AtomicU32,
    ttl_floor: AtomicU32,
    pub fetch_calls: AtomicU32,
    pub create_calls: AtomicU32,
    pub update_calls: AtomicU32,
    pub delete_calls: AtomicU32,
    fail_fetch: RwLock<Option<String>>,
    fail_create: RwLock<Option<String>>,
    fail_delete: RwLock<Option<String>>,
    fail_init: RwLock<Option<String>>,
}

impl MockProvider {
    #[must_use]
    pub fn new(zone: &str) -> Self {
        Self {
            zone: zone.to_string(),
            // Effectively never stale on its own; tests force refreshes.
            cache: RecordCache::new(Duration::from_secs(3600)),
            remote: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(1),
            ttl_floor: AtomicU32::new(1),
            fetch_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
            update_calls: AtomicU32::new(0),
            delete_calls: AtomicU32::new(0),
            fail_fetch: RwLock::new(None),
            fail_create: RwLock::new(None),
            fail_delete: RwLock::new(None),
            fail_init: RwLock::new(None),
        }
    }

    /// A mock whose `init()` always fails with a network error.
    #[must_use]
    pub fn failing_init(zone: &str, message: &str) -> Self {
        Self {
            fail_init: RwLock::new(Some(message.to_string())),
            ..Self::new(zone)
        }
    }

    /// Raise the declared TTL minimum, e.g. to mimic a registrar floor.
    pub fn set_ttl_floor(&self, min: u32) {
        self.ttl_floor.store(min, Ordering::SeqCst);
    }

    /// Seed a record directly into the fake remote state (bypasses counters).
    pub async fn seed_remote(&self, mut record: DnsRecord) {
        if record.id.is_none() {
            record.id = Some(format!("seed-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        }
        self.remote.write().await.push(record);
    }

    pub async fn remote_records(&self) -> Vec<DnsRecord> {
        self.remote.read().await.clone()
    }

    pub async fn set_fail_fetch(&self, message: Option<&str>) {
        *self.fail_fetch.write().await = message.map(ToString::to_string);
    }

    pub async fn set_fail_create(&self, message: Option<&str>) {
        *self.fail_create.write().await = message.map(ToString::to_string);
    }

    pub async fn set_fail_delete(&self, message: Option<&str>) {
        *self.fail_delete.write().await = message.map(ToString::to_string);
    }

    pub async fn set_fail_init(&self, message: Option<&str>) {
        *self.fail_init.write().await = message.map(ToString::to_string);
    }

    fn network_error(&self, detail: &str) -> ProviderError {
        ProviderError::Network {
            provider: "mock".to_string(),
            detail: detail.to_string(),
        }
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Cloudflare
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: ProviderType::Cloudflare,
            name: "Mock".to_string(),
            description: "In-memory mock provider".to_string(),
            required_fields: vec![],
            capabilities: mock_capabilities(),
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        let mut caps = mock_capabilities();
        caps.ttl_range.min = self.ttl_floor.load(Ordering::SeqCst);
        caps
    }

    fn zone(&self) -> &str {
        &self.zone
    }

    fn cache(&self) -> &RecordCache {
        &self.cache
    }

    async fn init(&self) -> ProviderResult<()> {
        if let Some(ref message) = *self.fail_init.read().await {
            return Err(self.network_error(message));
        }
        Ok(())
    }

    async fn fetch_records(&self) -> ProviderResult<Vec<DnsRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = *self.fail_fetch.read().await {
            return Err(self.network_error(message));
        }
        Ok(self.remote.read().await.clone())
    }

    async fn api_create(&self, record: &DnsRecord) -> ProviderResult<DnsRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = *self.fail_create.read().await {
            return Err(self.network_error(message));
        }
        let mut created = record.clone();
        created.id = Some(format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.remote.write().await.push(created.clone());
        Ok(created)
    }

    async fn api_update(&self, record_id: &str, record: &DnsRecord) -> ProviderResult<DnsRecord> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut remote = self.remote.write().await;
        let Some(existing) = remote
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(record_id))
        else {
            return Err(ProviderError::RecordNotFound {
                provider: "mock".to_string(),
                record_id: record_id.to_string(),
                raw_message: None,
            });
        };
        let mut updated = record.clone();
        updated.id = Some(record_id.to_string());
        *existing = updated.clone();
        Ok(updated)
    }

    async fn api_delete(&self, record_id: &str) -> ProviderResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = *self.fail_delete.read().await {
            return Err(self.network_error(message));
        }
        let mut remote = self.remote.write().await;
        let before = remote.len();
        remote.retain(|r| r.id.as_deref() != Some(record_id));
        if remote.len() == before {
            return Err(ProviderError::RecordNotFound {
                provider: "mock".to_string(),
                record_id: record_id.to_string(),
                raw_message: None,
            });
        }
        Ok(())
    }
}

fn mock_capabilities() -> ProviderCapabilities {
    ProviderCapabilities {
        supports_proxy: true,
        supports_comment: true,
        supported_types: DnsRecordType::ALL.to_vec(),
        ttl_range: TtlRange { min: 1, max: 86400 },
    }
}
