//! Ownership / orphan tracker.
//!
//! Remembers which records this system manages and when each one stopped
//! being referenced by desired state. The in-memory map is authoritative
//! during a pass; every mutation is mirrored to the [`TrackerRepository`]
//! and persistence failures are isolated per record (reconciliation of
//! other records continues).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use dns_warden_provider::{ProviderType, RecordKey};

use crate::error::{CoreError, CoreResult};
use crate::traits::TrackerRepository;

/// Durable ownership metadata for one `(type, name)` identity.
///
/// State machine: Active (`orphaned_since = None`) ⇄ Orphaned
/// (`orphaned_since = Some`), terminal Deleted (entry removed). Transitions
/// are driven once per reconciliation pass by [`OwnershipTracker::sweep`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedRecord {
    pub key: RecordKey,
    /// Provider this record was created/adopted at.
    pub managed_by: ProviderType,
    pub first_seen_at: DateTime<Utc>,
    /// Updated every pass in which the hostname is still desired.
    pub last_confirmed_at: DateTime<Utc>,
    /// Set on the first pass the hostname went missing, cleared on
    /// reappearance.
    pub orphaned_since: Option<DateTime<Utc>>,
}

impl TrackedRecord {
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.orphaned_since.is_some()
    }
}

/// Tracker over a persistence seam, owned by the reconciler for mutation.
pub struct OwnershipTracker {
    repository: std::sync::Arc<dyn TrackerRepository>,
    records: RwLock<HashMap<RecordKey, TrackedRecord>>,
}

impl OwnershipTracker {
    /// Load tracker state from the repository.
    ///
    /// # Errors
    ///
    /// An unreachable repository at startup is fatal ([`CoreError::Tracker`]);
    /// the engine must not run with unknown ownership state.
    pub async fn load(repository: std::sync::Arc<dyn TrackerRepository>) -> CoreResult<Self> {
        let all = repository.load_all().await?;
        let records = all.into_iter().map(|r| (r.key.clone(), r)).collect();
        Ok(Self {
            repository,
            records: RwLock::new(records),
        })
    }

    /// Mark a record Active: create/adopt it if unknown, bump
    /// `last_confirmed_at`, clear `orphaned_since` if it reappeared.
    ///
    /// # Errors
    ///
    /// Persistence failures surface as [`CoreError::Tracker`]; the in-memory
    /// state is updated regardless so this pass's decisions stay coherent.
    pub async fn confirm_active(
        &self,
        key: &RecordKey,
        managed_by: ProviderType,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let updated = {
            let mut records = self.records.write().await;
            let entry = records
                .entry(key.clone())
                .or_insert_with(|| TrackedRecord {
                    key: key.clone(),
                    managed_by,
                    first_seen_at: now,
                    last_confirmed_at: now,
                    orphaned_since: None,
                });
            entry.last_confirmed_at = now;
            if entry.orphaned_since.take().is_some() {
                log::info!("[tracker] '{}' reappeared, orphan state cleared", key.name);
            }
            entry.clone()
        };

        self.repository
            .save(&updated)
            .await
            .map_err(|e| CoreError::Tracker(format!("failed to persist '{}': {e}", key.name)))
    }

    /// Drive the once-per-pass Active → Orphaned transition: every tracked
    /// record whose key is absent from `active_keys` gets `orphaned_since`
    /// stamped with this pass's timestamp.
    ///
    /// Returns per-record persistence failures; each is isolated.
    pub async fn sweep(
        &self,
        active_keys: &HashSet<RecordKey>,
        now: DateTime<Utc>,
    ) -> Vec<(RecordKey, CoreError)> {
        let newly_orphaned: Vec<TrackedRecord> = {
            let mut records = self.records.write().await;
            records
                .values_mut()
                .filter(|r| !active_keys.contains(&r.key) && r.orphaned_since.is_none())
                .map(|r| {
                    r.orphaned_since = Some(now);
                    log::info!("[tracker] '{}' is no longer desired, marked orphaned", r.key.name);
                    r.clone()
                })
                .collect()
        };

        let mut failures = Vec::new();
        for record in newly_orphaned {
            if let Err(e) = self.repository.save(&record).await {
                failures.push((
                    record.key.clone(),
                    CoreError::Tracker(format!(
                        "failed to persist orphan state for '{}': {e}",
                        record.key.name
                    )),
                ));
            }
        }
        failures
    }

    /// Records orphaned for at least `grace` as of `now`.
    pub async fn orphaned_beyond(&self, grace: Duration, now: DateTime<Utc>) -> Vec<TrackedRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| {
                r.orphaned_since
                    .is_some_and(|since| now - since >= grace)
            })
            .cloned()
            .collect()
    }

    /// All currently orphaned records, regardless of age.
    pub async fn orphaned(&self) -> Vec<TrackedRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.is_orphaned())
            .cloned()
            .collect()
    }

    /// Terminal transition: the record was deleted at the provider, drop the
    /// tracker entry.
    pub async fn mark_deleted(&self, key: &RecordKey) -> CoreResult<()> {
        self.records.write().await.remove(key);
        self.repository
            .remove(key)
            .await
            .map_err(|e| CoreError::Tracker(format!("failed to remove '{}': {e}", key.name)))
    }

    /// Whether this identity is tracked at all (Active or Orphaned).
    pub async fn contains(&self, key: &RecordKey) -> bool {
        self.records.read().await.contains_key(key)
    }

    pub async fn get(&self, key: &RecordKey) -> Option<TrackedRecord> {
        self.records.read().await.get(key).cloned()
    }

    /// Snapshot copy for external readers; never exposes the live map.
    pub async fn snapshot(&self) -> Vec<TrackedRecord> {
        self.records.read().await.values().cloned().collect()
    }
}
