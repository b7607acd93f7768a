//! Batch reconciler: diffs desired state against the provider snapshot and
//! applies the difference.
//!
//! One pass runs to completion before the next begins (pass mutex);
//! triggers arriving mid-pass are coalesced into a single follow-up pass.
//! Within a pass, creates precede updates and every record failure is
//! isolated — nothing aborts the batch.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};

use dns_warden_provider::{DnsRecord, ProviderError, RecordKey};

use crate::defaults::DefaultsTable;
use crate::error::{CoreError, CoreResult};
use crate::events::{EngineEvent, EventBus};
use crate::ip::PublicIpResolver;
use crate::manager::ProviderManager;
use crate::tracker::OwnershipTracker;
use crate::traits::DesiredStateSource;
use crate::types::{CycleSummary, FailureStage, RecordSpec};

pub struct Reconciler {
    manager: Arc<ProviderManager>,
    tracker: Arc<OwnershipTracker>,
    ip_resolver: Arc<PublicIpResolver>,
    defaults: DefaultsTable,
    events: EventBus,
    pass_lock: Mutex<()>,
    rerun_requested: AtomicBool,
    shutdown: watch::Receiver<bool>,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        manager: Arc<ProviderManager>,
        tracker: Arc<OwnershipTracker>,
        ip_resolver: Arc<PublicIpResolver>,
        defaults: DefaultsTable,
        events: EventBus,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            manager,
            tracker,
            ip_resolver,
            defaults,
            events,
            pass_lock: Mutex::new(()),
            rerun_requested: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Record that a pass is wanted. If one is already running, a single
    /// follow-up pass starts after it finishes (multiple triggers collapse).
    pub fn request_pass(&self) {
        self.rerun_requested.store(true, Ordering::SeqCst);
    }

    /// Run passes until no coalesced trigger remains, regenerating the
    /// desired set from `source` for each pass. Returns the last summary.
    pub async fn run_with_coalescing(
        &self,
        source: &dyn DesiredStateSource,
    ) -> CoreResult<CycleSummary> {
        loop {
            self.rerun_requested.store(false, Ordering::SeqCst);
            let specs = source.desired_records().await?;
            let summary = self.run_pass(&specs).await?;
            if !self.rerun_requested.swap(false, Ordering::SeqCst) {
                return Ok(summary);
            }
            log::debug!("[reconciler] coalesced trigger pending, starting follow-up pass");
        }
    }

    /// One complete reconciliation pass over `specs`.
    ///
    /// # Errors
    ///
    /// Only pass-fatal conditions error out (no provider configured, cache
    /// refresh impossible); per-record failures land in the summary.
    pub async fn run_pass(&self, specs: &[RecordSpec]) -> CoreResult<CycleSummary> {
        let _pass = self.pass_lock.lock().await;
        let provider = self.manager.current().await?;
        let pass_started = Utc::now();
        let mut summary = CycleSummary::default();

        // Duplicate desired entries for the same (type, name) collapse to the
        // last one by input order, before any classification.
        let deduped = dedupe_last_wins(specs);
        let desired_keys: HashSet<RecordKey> = deduped.iter().map(RecordSpec::key).collect();

        // Resolve public-IP placeholders; a failed lookup fails only the
        // records that need it.
        let public_ip = if deduped.iter().any(|s| s.needs_ip_lookup) {
            match self.ip_resolver.get_public_ip().await {
                Ok(ip) => Some(ip),
                Err(e) => {
                    log::warn!("[reconciler] public IP unresolvable this pass: {e}");
                    None
                }
            }
        } else {
            None
        };

        // Classification reads one snapshot; nothing mutates it mid-pass.
        let snapshot = provider.records(false).await?;
        let existing: HashMap<RecordKey, &DnsRecord> =
            snapshot.iter().map(|r| (r.key(), r)).collect();

        let mut creates: Vec<DnsRecord> = Vec::new();
        let mut updates: Vec<(String, DnsRecord)> = Vec::new();
        let mut active_keys: HashSet<RecordKey> = HashSet::new();
        let ttl_range = provider.capabilities().ttl_range;

        for spec in &deduped {
            let mut desired = match self.materialize(spec, public_ip.as_deref()) {
                Ok(desired) => desired,
                Err((stage, message)) => {
                    summary.record_failure(spec.record_type, &spec.name, stage, message);
                    continue;
                }
            };
            // Provider TTL bounds bind harder than configured defaults; a
            // registrar floor of 600 must not reject the built-in fallback.
            desired.ttl = desired.ttl.clamp(ttl_range.min, ttl_range.max);
            if let Err(e) = provider.validate_record(&desired) {
                summary.record_failure(
                    spec.record_type,
                    &spec.name,
                    FailureStage::Validation,
                    e.to_string(),
                );
                continue;
            }

            match existing.get(&desired.key()) {
                None => creates.push(desired),
                Some(current) => {
                    if provider.record_needs_update(current, &desired) {
                        match &current.id {
                            Some(id) => updates.push((id.clone(), desired)),
                            None => {
                                // A snapshot record without an id cannot be
                                // addressed for update.
                                summary.record_failure(
                                    desired.record_type,
                                    &desired.name,
                                    FailureStage::Update,
                                    "existing record has no provider id",
                                );
                            }
                        }
                    } else {
                        summary.unchanged += 1;
                        active_keys.insert(desired.key());
                    }
                }
            }
        }

        // Apply phase: creates strictly before updates so same-cycle
        // dependents (e.g. CNAME targets) find their target.
        let mut provider_down = false;
        for record in creates {
            if self.shutting_down() {
                log::info!("[reconciler] shutdown requested, stopping after current operation");
                break;
            }
            let key = record.key();
            if provider_down {
                summary.record_failure(
                    record.record_type,
                    &record.name,
                    FailureStage::Create,
                    "provider unavailable for the remainder of this pass",
                );
                continue;
            }
            match provider.create_record(&record).await {
                Ok(created) => {
                    summary.created += 1;
                    active_keys.insert(key);
                    self.events.publish(EngineEvent::RecordCreated { record: created });
                }
                Err(e) => {
                    provider_down = is_connection_failure(&e);
                    summary.record_failure(
                        record.record_type,
                        &record.name,
                        FailureStage::Create,
                        e.to_string(),
                    );
                }
            }
        }

        for (id, record) in updates {
            if self.shutting_down() {
                log::info!("[reconciler] shutdown requested, stopping after current operation");
                break;
            }
            let key = record.key();
            if provider_down {
                summary.record_failure(
                    record.record_type,
                    &record.name,
                    FailureStage::Update,
                    "provider unavailable for the remainder of this pass",
                );
                continue;
            }
            match provider.update_record(&id, &record).await {
                Ok(updated) => {
                    summary.updated += 1;
                    active_keys.insert(key);
                    self.events.publish(EngineEvent::RecordUpdated { record: updated });
                }
                Err(e) => {
                    provider_down = is_connection_failure(&e);
                    summary.record_failure(
                        record.record_type,
                        &record.name,
                        FailureStage::Update,
                        e.to_string(),
                    );
                }
            }
        }

        // Mark every created/updated/confirmed-unchanged hostname Active
        // (adopting unchanged records we did not create). The sweep is keyed
        // on the full desired set, not on successes: a hostname whose
        // operation failed this pass is still desired and must not enter
        // the orphan state.
        let provider_type = provider.provider_type();
        for key in &active_keys {
            self.confirm_tracked(key, provider_type, &mut summary).await;
        }
        for (key, error) in self.tracker.sweep(&desired_keys, pass_started).await {
            summary.record_failure(
                key.record_type,
                &key.name,
                FailureStage::Tracker,
                error.to_string(),
            );
        }

        summary.finished_at = Some(Utc::now());
        log::info!(
            "[reconciler] pass done: {} created, {} updated, {} unchanged, {} errors",
            summary.created,
            summary.updated,
            summary.unchanged,
            summary.errors
        );
        self.events.publish(EngineEvent::CycleCompleted {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn confirm_tracked(
        &self,
        key: &RecordKey,
        provider_type: dns_warden_provider::ProviderType,
        summary: &mut CycleSummary,
    ) {
        if let Err(e) = self
            .tracker
            .confirm_active(key, provider_type, Utc::now())
            .await
        {
            // Persistence trouble never blocks DNS operations.
            log::warn!("[reconciler] tracker write failed for '{}': {e}", key.name);
            summary.record_failure(key.record_type, &key.name, FailureStage::Tracker, e.to_string());
        }
    }

    /// Build the concrete outbound record for a desired entry, applying the
    /// defaults chain and the resolved public IP.
    fn materialize(
        &self,
        spec: &RecordSpec,
        public_ip: Option<&str>,
    ) -> Result<DnsRecord, (FailureStage, String)> {
        let resolved = self.defaults.resolve(spec);

        let content = if spec.needs_ip_lookup {
            public_ip
                .map(ToString::to_string)
                .ok_or((FailureStage::IpResolution, "public IP unavailable".to_string()))?
        } else {
            resolved
                .content
                .ok_or((FailureStage::Validation, "record has no content".to_string()))?
        };

        Ok(DnsRecord {
            id: None,
            record_type: spec.record_type,
            name: spec.name.clone(),
            content,
            ttl: resolved.ttl,
            proxied: resolved.proxied,
            priority: spec.priority,
            weight: spec.weight,
            port: spec.port,
            flags: spec.flags,
            tag: spec.tag.clone(),
            comment: None,
        })
    }
}

/// A connection-level failure marks the provider unavailable for the rest of
/// the pass; remaining operations are skipped and counted, never retried
/// mid-pass.
fn is_connection_failure(error: &ProviderError) -> bool {
    matches!(
        error,
        ProviderError::Network { .. }
            | ProviderError::Timeout { .. }
            | ProviderError::InvalidCredentials { .. }
    )
}

fn dedupe_last_wins(specs: &[RecordSpec]) -> Vec<RecordSpec> {
    let mut order: Vec<RecordKey> = Vec::new();
    let mut by_key: HashMap<RecordKey, RecordSpec> = HashMap::new();
    for spec in specs {
        let key = spec.key();
        if by_key.insert(key.clone(), spec.clone()).is_none() {
            order.push(key);
        }
    }
    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

#[cfg(test)]
mod tests {
    use dns_warden_provider::DnsRecordType;

    use super::*;

    #[test]
    fn dedupe_keeps_last_duplicate() {
        let specs = vec![
            RecordSpec::new(DnsRecordType::A, "app.example.com", "1.1.1.1"),
            RecordSpec::new(DnsRecordType::A, "other.example.com", "2.2.2.2"),
            RecordSpec::new(DnsRecordType::A, "App.Example.Com", "3.3.3.3"),
        ];
        let deduped = dedupe_last_wins(&specs);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].content, "3.3.3.3");
        assert_eq!(deduped[1].content, "2.2.2.2");
    }

    #[test]
    fn connection_failures_classified() {
        assert!(is_connection_failure(&ProviderError::Network {
            provider: "t".into(),
            detail: "down".into(),
        }));
        assert!(!is_connection_failure(&ProviderError::RecordNotFound {
            provider: "t".into(),
            record_id: "1".into(),
            raw_message: None,
        }));
    }
}
