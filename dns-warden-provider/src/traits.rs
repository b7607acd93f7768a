use async_trait::async_trait;

use crate::cache::RecordCache;
use crate::error::{ProviderError, Result};
use crate::types::{
    DnsRecord, DnsRecordType, ProviderCapabilities, ProviderMetadata, ProviderType, RecordKey,
    OWNERSHIP_MARKER,
};
use crate::validate;

/// Raw API error (internal).
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// Error code (format differs per provider).
    pub code: Option<String>,
    /// Raw error message.
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Extra context available when mapping an API error (internal).
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// Record name (for `RecordExists` style errors).
    pub record_name: Option<String>,
    /// Record id (for `RecordNotFound` style errors).
    pub record_id: Option<String>,
}

/// Provider error mapping trait (internal).
///
/// Each provider maps its raw API error codes onto the unified
/// [`ProviderError`] variants.
pub(crate) trait ProviderErrorMapper {
    fn provider_name(&self) -> &'static str;

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// Common contract implemented by every DNS provider client.
///
/// Implementations supply the raw API surface (`init`, `fetch_records`,
/// `api_create`, `api_update`, `api_delete`); the cache/diff layer on top is
/// provided here so every provider gets identical snapshot, single-flight and
/// ownership-marker behavior.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Provider identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Provider type discriminant.
    fn provider_type(&self) -> ProviderType;

    /// Static provider metadata (type level, no instance needed).
    fn metadata() -> ProviderMetadata
    where
        Self: Sized;

    /// Declared capabilities, used by the reconciler to skip incompatible
    /// fields instead of failing.
    fn capabilities(&self) -> ProviderCapabilities;

    /// The zone this instance manages.
    fn zone(&self) -> &str;

    /// This instance's record cache.
    fn cache(&self) -> &RecordCache;

    /// Validate credentials and resolve zone identifiers.
    ///
    /// Must be called (successfully) before any record operation.
    async fn init(&self) -> Result<()>;

    /// Full record list from the live API. Implementations do not touch the
    /// cache; [`records`](Self::records) owns snapshot replacement.
    async fn fetch_records(&self) -> Result<Vec<DnsRecord>>;

    /// Raw create call. The returned record carries the provider-assigned id.
    async fn api_create(&self, record: &DnsRecord) -> Result<DnsRecord>;

    /// Raw update call.
    async fn api_update(&self, record_id: &str, record: &DnsRecord) -> Result<DnsRecord>;

    /// Raw delete call.
    async fn api_delete(&self, record_id: &str) -> Result<()>;

    // ---- provided: validation and diff ----

    /// Structural validation against this provider's capabilities.
    fn validate_record(&self, record: &DnsRecord) -> Result<()> {
        validate::validate_record(self.name(), &self.capabilities(), record)
    }

    /// Type-aware comparison deciding whether `existing` must be updated to
    /// match `desired`.
    ///
    /// Content and proxy-status differences always trigger an update. TTL
    /// differences are ignored while the record is proxied (proxied records
    /// get a provider-enforced automatic TTL). Type-specific fields are
    /// compared only for the types that carry them.
    fn record_needs_update(&self, existing: &DnsRecord, desired: &DnsRecord) -> bool {
        if existing.content != desired.content {
            return true;
        }

        let caps = self.capabilities();
        if caps.supports_proxy {
            let existing_proxied = existing.proxied.unwrap_or(false);
            let desired_proxied = desired.proxied.unwrap_or(false);
            if existing_proxied != desired_proxied {
                return true;
            }
            if !existing_proxied && existing.ttl != desired.ttl {
                return true;
            }
        } else if existing.ttl != desired.ttl {
            return true;
        }

        match desired.record_type {
            DnsRecordType::Mx => existing.priority != desired.priority,
            DnsRecordType::Srv => {
                existing.priority != desired.priority
                    || existing.weight != desired.weight
                    || existing.port != desired.port
            }
            DnsRecordType::Caa => existing.flags != desired.flags || existing.tag != desired.tag,
            _ => false,
        }
    }

    /// Prepare a record for the wire: stamp the ownership marker where the
    /// provider can carry it and drop fields it cannot.
    fn prepare_outbound(&self, record: &DnsRecord) -> DnsRecord {
        let caps = self.capabilities();
        let mut out = record.clone();
        if caps.supports_comment {
            match out.comment.take() {
                Some(comment) if comment.contains(OWNERSHIP_MARKER) => {
                    out.comment = Some(comment);
                }
                Some(comment) => out.comment = Some(format!("{OWNERSHIP_MARKER} {comment}")),
                None => out.comment = Some(OWNERSHIP_MARKER.to_string()),
            }
        } else {
            out.comment = None;
        }
        if !caps.supports_proxy {
            out.proxied = None;
        }
        out
    }

    // ---- provided: cache-aware operations ----

    /// Cached records, refilling from the live API first when `force_refresh`
    /// is set or the snapshot is stale.
    ///
    /// Concurrent refreshes collapse into one in-flight list call: late
    /// arrivals wait on the refresh guard and adopt the snapshot the winner
    /// installed.
    async fn records(&self, force_refresh: bool) -> Result<Vec<DnsRecord>> {
        let cache = self.cache();
        if !force_refresh && cache.is_fresh().await {
            return Ok(cache.records().await);
        }

        let seen = cache.last_refreshed().await;
        let _guard = cache.refresh_guard().await;
        if cache.last_refreshed().await != seen {
            // Someone else refreshed while we waited for the guard.
            return Ok(cache.records().await);
        }

        log::debug!("[{}] refreshing record cache", self.name());
        let records = self.fetch_records().await?;
        cache.replace(records.clone()).await;
        Ok(records)
    }

    /// Cache-only lookup by `(type, name)`. Never triggers a refresh.
    async fn find_record(&self, record_type: DnsRecordType, name: &str) -> Option<DnsRecord> {
        self.cache().find(&RecordKey::new(record_type, name)).await
    }

    /// Validate, stamp ownership, create remotely, then update the cache.
    async fn create_record(&self, record: &DnsRecord) -> Result<DnsRecord> {
        self.validate_record(record)?;
        let outbound = self.prepare_outbound(record);
        let created = self.api_create(&outbound).await?;
        self.cache().upsert(created.clone()).await;
        log::info!("[{}] created {}", self.name(), created.key());
        Ok(created)
    }

    /// Validate, stamp ownership, update remotely, then update the cache.
    async fn update_record(&self, record_id: &str, record: &DnsRecord) -> Result<DnsRecord> {
        self.validate_record(record)?;
        let outbound = self.prepare_outbound(record);
        let updated = self.api_update(record_id, &outbound).await?;
        self.cache().upsert(updated.clone()).await;
        log::info!("[{}] updated {}", self.name(), updated.key());
        Ok(updated)
    }

    /// Delete remotely, then drop from the cache.
    async fn delete_record(&self, record_id: &str) -> Result<()> {
        self.api_delete(record_id).await?;
        self.cache().remove_by_id(record_id).await;
        log::info!("[{}] deleted record {}", self.name(), record_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TtlRange;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeProvider {
        cache: RecordCache,
        fetch_calls: AtomicUsize,
        proxy: bool,
        comment: bool,
    }

    impl FakeProvider {
        fn new(max_age: Duration) -> Self {
            Self {
                cache: RecordCache::new(max_age),
                fetch_calls: AtomicUsize::new(0),
                proxy: true,
                comment: true,
            }
        }
    }

    #[async_trait]
    impl DnsProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn provider_type(&self) -> ProviderType {
            ProviderType::Cloudflare
        }

        fn metadata() -> ProviderMetadata {
            unimplemented!("not needed in tests")
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                supports_proxy: self.proxy,
                supports_comment: self.comment,
                supported_types: DnsRecordType::ALL.to_vec(),
                ttl_range: TtlRange { min: 1, max: 86400 },
            }
        }

        fn zone(&self) -> &str {
            "example.com"
        }

        fn cache(&self) -> &RecordCache {
            &self.cache
        }

        async fn init(&self) -> Result<()> {
            Ok(())
        }

        async fn fetch_records(&self) -> Result<Vec<DnsRecord>> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![DnsRecord::new(
                DnsRecordType::A,
                "app",
                "203.0.113.5",
                300,
            )])
        }

        async fn api_create(&self, record: &DnsRecord) -> Result<DnsRecord> {
            let mut created = record.clone();
            created.id = Some("created-1".to_string());
            Ok(created)
        }

        async fn api_update(&self, record_id: &str, record: &DnsRecord) -> Result<DnsRecord> {
            let mut updated = record.clone();
            updated.id = Some(record_id.to_string());
            Ok(updated)
        }

        async fn api_delete(&self, _record_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn a_record(content: &str, ttl: u32, proxied: Option<bool>) -> DnsRecord {
        let mut r = DnsRecord::new(DnsRecordType::A, "app", content, ttl);
        r.proxied = proxied;
        r
    }

    #[test]
    fn diff_content_change_always_updates() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let existing = a_record("203.0.113.5", 300, Some(true));
        let desired = a_record("203.0.113.9", 300, Some(true));
        assert!(p.record_needs_update(&existing, &desired));
    }

    #[test]
    fn diff_ttl_ignored_when_both_proxied() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let existing = a_record("203.0.113.5", 1, Some(true));
        let desired = a_record("203.0.113.5", 600, Some(true));
        assert!(!p.record_needs_update(&existing, &desired));
    }

    #[test]
    fn diff_ttl_compared_when_unproxied() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let existing = a_record("203.0.113.5", 300, Some(false));
        let desired = a_record("203.0.113.5", 600, Some(false));
        assert!(p.record_needs_update(&existing, &desired));
    }

    #[test]
    fn diff_proxied_change_always_updates() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let existing = a_record("203.0.113.5", 300, Some(false));
        let desired = a_record("203.0.113.5", 300, Some(true));
        assert!(p.record_needs_update(&existing, &desired));
    }

    #[test]
    fn diff_mx_priority_compared() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let mut existing = DnsRecord::new(DnsRecordType::Mx, "@", "mail.example.com", 300);
        existing.priority = Some(10);
        let mut desired = existing.clone();
        assert!(!p.record_needs_update(&existing, &desired));
        desired.priority = Some(20);
        assert!(p.record_needs_update(&existing, &desired));
    }

    #[test]
    fn diff_srv_fields_compared() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let mut existing = DnsRecord::new(DnsRecordType::Srv, "_sip._tcp", "sip.example.com", 300);
        existing.priority = Some(10);
        existing.weight = Some(5);
        existing.port = Some(5060);
        let mut desired = existing.clone();
        assert!(!p.record_needs_update(&existing, &desired));
        desired.port = Some(5061);
        assert!(p.record_needs_update(&existing, &desired));
    }

    #[test]
    fn outbound_records_get_ownership_marker() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let record = DnsRecord::new(DnsRecordType::A, "app", "203.0.113.5", 300);
        let out = p.prepare_outbound(&record);
        assert!(out.has_ownership_marker());
    }

    #[test]
    fn outbound_preserves_existing_marker() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let mut record = DnsRecord::new(DnsRecordType::A, "app", "203.0.113.5", 300);
        record.comment = Some(OWNERSHIP_MARKER.to_string());
        let out = p.prepare_outbound(&record);
        assert_eq!(out.comment.as_deref(), Some(OWNERSHIP_MARKER));
    }

    #[test]
    fn outbound_strips_unsupported_fields() {
        let mut p = FakeProvider::new(Duration::from_secs(60));
        p.proxy = false;
        p.comment = false;
        let mut record = DnsRecord::new(DnsRecordType::A, "app", "203.0.113.5", 300);
        record.proxied = Some(true);
        record.comment = Some("note".to_string());
        let out = p.prepare_outbound(&record);
        assert!(out.proxied.is_none());
        assert!(out.comment.is_none());
    }

    #[tokio::test]
    async fn records_uses_cache_when_fresh() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let first = p.records(false).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(p.fetch_calls.load(Ordering::SeqCst), 1);

        let second = p.records(false).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(p.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn records_force_refresh_bypasses_cache() {
        let p = FakeProvider::new(Duration::from_secs(60));
        p.records(false).await.unwrap();
        p.records(true).await.unwrap();
        assert_eq!(p.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn records_refreshes_when_stale() {
        let p = FakeProvider::new(Duration::ZERO);
        p.records(false).await.unwrap();
        p.records(false).await.unwrap();
        assert_eq!(p.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn create_updates_cache() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let record = DnsRecord::new(DnsRecordType::A, "api", "203.0.113.7", 300);
        let created = p.create_record(&record).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("created-1"));
        assert!(p.find_record(DnsRecordType::A, "api").await.is_some());
    }

    #[tokio::test]
    async fn create_rejects_invalid_record() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let record = DnsRecord::new(DnsRecordType::A, "api", "not-an-ip", 300);
        let res = p.create_record(&record).await;
        assert!(
            matches!(&res, Err(ProviderError::InvalidRecord { .. })),
            "unexpected result: {res:?}"
        );
        assert!(p.find_record(DnsRecordType::A, "api").await.is_none());
    }

    #[tokio::test]
    async fn delete_removes_from_cache() {
        let p = FakeProvider::new(Duration::from_secs(60));
        let record = DnsRecord::new(DnsRecordType::A, "api", "203.0.113.7", 300);
        let created = p.create_record(&record).await.unwrap();
        let id = created.id.unwrap();
        p.delete_record(&id).await.unwrap();
        assert!(p.find_record(DnsRecordType::A, "api").await.is_none());
    }
}
