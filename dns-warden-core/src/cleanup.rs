//! Orphan cleanup: deletes records that stayed orphaned past the grace
//! period, with hard guards against deleting anything foreign or preserved.
//!
//! The report always lists what was deleted, what was skipped and why —
//! never a bare success flag.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use dns_warden_provider::RecordKey;

use crate::error::CoreResult;
use crate::events::{EngineEvent, EventBus};
use crate::manager::ProviderManager;
use crate::preserve::PreservedHostnames;
use crate::tracker::OwnershipTracker;
use crate::types::{CleanupReport, CleanupSkip, FailureStage, RecordFailure, SkipReason};

pub struct OrphanCleaner {
    manager: Arc<ProviderManager>,
    tracker: Arc<OwnershipTracker>,
    events: EventBus,
    enabled: bool,
    grace_period: Duration,
}

impl OrphanCleaner {
    #[must_use]
    pub fn new(
        manager: Arc<ProviderManager>,
        tracker: Arc<OwnershipTracker>,
        events: EventBus,
        enabled: bool,
        grace_period: Duration,
    ) -> Self {
        Self {
            manager,
            tracker,
            events,
            enabled,
            grace_period,
        }
    }

    /// Run one cleanup sweep as of `now`.
    ///
    /// Deletion requires all of: orphaned beyond the grace period, cleanup
    /// enabled, no preserved-pattern match, and provider-side ownership
    /// still attributable to us.
    pub async fn run(
        &self,
        preserved: &PreservedHostnames,
        now: DateTime<Utc>,
    ) -> CoreResult<CleanupReport> {
        let mut report = CleanupReport::default();

        if !self.enabled {
            log::debug!("[cleanup] disabled, nothing to do");
            return Ok(report);
        }

        let candidates = self.tracker.orphaned_beyond(self.grace_period, now).await;
        if candidates.is_empty() {
            return Ok(report);
        }

        let provider = self.manager.current().await?;
        let snapshot = provider.records(false).await?;
        let supports_comment = provider.capabilities().supports_comment;

        for candidate in candidates {
            let key = &candidate.key;

            if preserved.matches(&key.name) {
                report.skipped.push(skip(key, SkipReason::Preserved));
                continue;
            }

            let Some(record) = snapshot.iter().find(|r| r.key() == *key) else {
                // Deleted externally; drop the tracker entry.
                log::info!("[cleanup] '{}' already gone at the provider", key.name);
                self.drop_tracking(key, &mut report).await;
                report.skipped.push(skip(key, SkipReason::AlreadyGone));
                continue;
            };

            // Where the provider can carry our marker, a record without it
            // was re-created by someone else: it is no longer ours.
            if supports_comment && !record.has_ownership_marker() {
                log::warn!(
                    "[cleanup] '{}' lost its ownership marker, leaving it alone",
                    key.name
                );
                self.drop_tracking(key, &mut report).await;
                report.skipped.push(skip(key, SkipReason::NotOwned));
                continue;
            }

            let Some(record_id) = record.id.clone() else {
                report.errors.push(RecordFailure {
                    record_type: key.record_type,
                    name: key.name.clone(),
                    stage: FailureStage::Delete,
                    message: "record has no provider id".to_string(),
                });
                continue;
            };

            match provider.delete_record(&record_id).await {
                Ok(()) => {
                    log::info!("[cleanup] deleted orphaned record '{}'", key.name);
                    report.deleted.push(key.name.clone());
                    self.drop_tracking(key, &mut report).await;
                    self.events.publish(EngineEvent::RecordDeleted {
                        record_type: key.record_type,
                        name: key.name.clone(),
                        record_id: Some(record_id),
                    });
                }
                Err(e) => {
                    report.errors.push(RecordFailure {
                        record_type: key.record_type,
                        name: key.name.clone(),
                        stage: FailureStage::Delete,
                        message: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "[cleanup] done: {} deleted, {} skipped, {} errors",
            report.deleted.len(),
            report.skipped.len(),
            report.errors.len()
        );
        self.events.publish(EngineEvent::CleanupCompleted {
            report: report.clone(),
        });
        Ok(report)
    }

    async fn drop_tracking(&self, key: &RecordKey, report: &mut CleanupReport) {
        if let Err(e) = self.tracker.mark_deleted(key).await {
            report.errors.push(RecordFailure {
                record_type: key.record_type,
                name: key.name.clone(),
                stage: FailureStage::Tracker,
                message: e.to_string(),
            });
        }
    }
}

fn skip(key: &RecordKey, reason: SkipReason) -> CleanupSkip {
    CleanupSkip {
        record_type: key.record_type,
        name: key.name.clone(),
        reason,
    }
}
