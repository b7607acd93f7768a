//! In-memory snapshot of a provider's records.
//!
//! One snapshot per provider instance. `replace` swaps the whole snapshot
//! atomically so a reconciliation pass never observes a half-refreshed state.
//! Concurrent refreshers collapse into one in-flight list call: they contend
//! on the refresh mutex and re-check freshness after acquiring it (see
//! `DnsProvider::records`).

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::types::{DnsRecord, RecordKey};

#[derive(Debug, Default)]
struct Snapshot {
    records: Vec<DnsRecord>,
    last_refreshed: Option<DateTime<Utc>>,
}

/// Cached provider state with a staleness threshold.
pub struct RecordCache {
    max_age: Duration,
    snapshot: RwLock<Snapshot>,
    refresh_lock: Mutex<()>,
}

impl RecordCache {
    /// Create an empty cache. The cache starts stale and fills on first refresh.
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            snapshot: RwLock::new(Snapshot::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Whether the snapshot is younger than the staleness threshold.
    pub async fn is_fresh(&self) -> bool {
        let snap = self.snapshot.read().await;
        match snap.last_refreshed {
            None => false,
            Some(at) => {
                let age = Utc::now().signed_duration_since(at);
                age.to_std().is_ok_and(|age| age <= self.max_age)
            }
        }
    }

    /// When the snapshot was last replaced, if ever.
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.last_refreshed
    }

    /// Copy of the current snapshot.
    pub async fn records(&self) -> Vec<DnsRecord> {
        self.snapshot.read().await.records.clone()
    }

    /// Look up a record by `(type, name)` identity.
    pub async fn find(&self, key: &RecordKey) -> Option<DnsRecord> {
        self.snapshot
            .read()
            .await
            .records
            .iter()
            .find(|r| r.key() == *key)
            .cloned()
    }

    /// Atomically replace the snapshot with a fresh record list.
    pub async fn replace(&self, records: Vec<DnsRecord>) {
        let mut snap = self.snapshot.write().await;
        snap.records = records;
        snap.last_refreshed = Some(Utc::now());
    }

    /// Insert or replace a single record after a successful create/update.
    ///
    /// Matches by provider id when the record has one, falling back to
    /// `(type, name)` identity.
    pub async fn upsert(&self, record: DnsRecord) {
        let mut snap = self.snapshot.write().await;
        let key = record.key();
        let slot = snap.records.iter_mut().find(|r| match (&r.id, &record.id) {
            (Some(a), Some(b)) => a == b,
            _ => r.key() == key,
        });
        match slot {
            Some(existing) => *existing = record,
            None => snap.records.push(record),
        }
    }

    /// Drop a record by provider id after a successful delete.
    pub async fn remove_by_id(&self, id: &str) {
        let mut snap = self.snapshot.write().await;
        snap.records.retain(|r| r.id.as_deref() != Some(id));
    }

    /// Serialize refreshes: callers hold this guard across the list call so
    /// concurrent refresh requests wait instead of issuing duplicates.
    pub async fn refresh_guard(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }
}
