//! The engine's collaborator-facing surface: record CRUD, refresh triggers,
//! orphan inspection, cleanup, provider switching, and the scheduler loop.
//!
//! Manual record operations route through the same provider/tracker path as
//! automatic reconciliation; nothing bypasses validation or cache updates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, watch};

use dns_warden_provider::{DnsRecord, ProviderCredentials, ProviderMetadata, ProviderType};

use crate::cleanup::OrphanCleaner;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::{EngineEvent, EventBus};
use crate::ip::PublicIpResolver;
use crate::manager::ProviderManager;
use crate::preserve::PreservedHostnames;
use crate::reconciler::Reconciler;
use crate::tracker::OwnershipTracker;
use crate::traits::{DesiredStateSource, TrackerRepository};
use crate::types::{CleanupReport, CycleSummary, OrphanedRecord, RecordSpec};

pub struct EngineService {
    config: EngineConfig,
    manager: Arc<ProviderManager>,
    tracker: Arc<OwnershipTracker>,
    reconciler: Reconciler,
    cleaner: OrphanCleaner,
    events: EventBus,
    preserved: PreservedHostnames,
    shutdown_tx: watch::Sender<bool>,
}

/// Prepends administratively managed hostnames to the watcher's entries, so
/// both flow through one dedupe/classify path.
struct MergedSource<'a> {
    managed: &'a [RecordSpec],
    inner: &'a dyn DesiredStateSource,
}

#[async_trait]
impl DesiredStateSource for MergedSource<'_> {
    async fn desired_records(&self) -> CoreResult<Vec<RecordSpec>> {
        let mut specs = self.managed.to_vec();
        specs.extend(self.inner.desired_records().await?);
        Ok(specs)
    }
}

impl EngineService {
    /// Assemble and start the engine: resolves credentials, initializes the
    /// provider, and loads tracker state.
    ///
    /// # Errors
    ///
    /// Startup is all-or-nothing: missing provider configuration, a failed
    /// provider `init()`, or unreachable tracker storage abort here.
    pub async fn start(
        config: EngineConfig,
        repository: Arc<dyn TrackerRepository>,
    ) -> CoreResult<Self> {
        let events = EventBus::new();
        let manager = Arc::new(ProviderManager::new(
            events.clone(),
            Some(config.cache_max_age),
        ));

        let credentials = config.provider_credentials()?;
        manager.switch_provider(credentials).await?;

        let tracker = Arc::new(OwnershipTracker::load(repository).await?);
        let ip_resolver = Arc::new(PublicIpResolver::new(config.ip_refresh_interval));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reconciler = Reconciler::new(
            manager.clone(),
            tracker.clone(),
            ip_resolver,
            config.defaults.clone(),
            events.clone(),
            shutdown_rx,
        );
        let cleaner = OrphanCleaner::new(
            manager.clone(),
            tracker.clone(),
            events.clone(),
            config.cleanup_enabled,
            chrono::Duration::from_std(config.cleanup_grace_period)
                .map_err(|e| CoreError::Config(format!("grace period out of range: {e}")))?,
        );
        let preserved = PreservedHostnames::new(&config.preserved_hostnames);

        Ok(Self {
            config,
            manager,
            tracker,
            reconciler,
            cleaner,
            events,
            preserved,
            shutdown_tx,
        })
    }

    /// Subscribe to engine events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Current records, optionally forcing a cache refresh.
    pub async fn fetch_records(&self, force_refresh: bool) -> CoreResult<Vec<DnsRecord>> {
        let provider = self.manager.current().await?;
        Ok(provider.records(force_refresh).await?)
    }

    /// Manual create, through the same validation/cache/tracker path as
    /// reconciliation.
    pub async fn create_record(&self, record: DnsRecord) -> CoreResult<DnsRecord> {
        let provider = self.manager.current().await?;
        let created = provider.create_record(&record).await?;
        self.tracker
            .confirm_active(&created.key(), provider.provider_type(), Utc::now())
            .await?;
        self.events.publish(EngineEvent::RecordCreated {
            record: created.clone(),
        });
        Ok(created)
    }

    /// Manual update.
    pub async fn update_record(&self, record_id: &str, record: DnsRecord) -> CoreResult<DnsRecord> {
        let provider = self.manager.current().await?;
        let updated = provider.update_record(record_id, &record).await?;
        self.tracker
            .confirm_active(&updated.key(), provider.provider_type(), Utc::now())
            .await?;
        self.events.publish(EngineEvent::RecordUpdated {
            record: updated.clone(),
        });
        Ok(updated)
    }

    /// Manual delete; also drops tracker state for the record.
    pub async fn delete_record(&self, record_id: &str) -> CoreResult<()> {
        let provider = self.manager.current().await?;

        // Resolve the key before the record disappears from the cache.
        let key = provider
            .records(false)
            .await?
            .iter()
            .find(|r| r.id.as_deref() == Some(record_id))
            .map(DnsRecord::key);

        provider.delete_record(record_id).await?;

        if let Some(key) = key {
            self.tracker.mark_deleted(&key).await?;
            self.events.publish(EngineEvent::RecordDeleted {
                record_type: key.record_type,
                name: key.name,
                record_id: Some(record_id.to_string()),
            });
        }
        Ok(())
    }

    /// Run one reconciliation pass now (plus any coalesced follow-up) and
    /// return its summary.
    pub async fn trigger_refresh(
        &self,
        source: &dyn DesiredStateSource,
    ) -> CoreResult<CycleSummary> {
        let merged = MergedSource {
            managed: &self.config.managed_hostnames,
            inner: source,
        };
        self.reconciler.run_with_coalescing(&merged).await
    }

    /// Note that a pass is wanted; coalesced with any in-flight pass.
    pub fn request_pass(&self) {
        self.reconciler.request_pass();
    }

    /// All orphaned records with their provider-side view where available.
    pub async fn get_orphaned_records(&self) -> CoreResult<Vec<OrphanedRecord>> {
        let provider = self.manager.current().await?;

        let lookups: Vec<_> = self
            .tracker
            .orphaned()
            .await
            .into_iter()
            .filter_map(|tracked| {
                let orphaned_since = tracked.orphaned_since?;
                Some((tracked.key, orphaned_since))
            })
            .map(|(key, orphaned_since)| {
                let provider = provider.clone();
                async move {
                    let record = provider.find_record(key.record_type, &key.name).await;
                    OrphanedRecord {
                        record_type: key.record_type,
                        name: key.name,
                        record,
                        orphaned_since,
                    }
                }
            })
            .collect();

        Ok(futures::future::join_all(lookups).await)
    }

    /// Run orphan cleanup now.
    pub async fn run_cleanup(&self) -> CoreResult<CleanupReport> {
        self.cleaner.run(&self.preserved, Utc::now()).await
    }

    /// Hot-swap the active provider. On failure the previous provider stays
    /// active and the error is returned.
    pub async fn switch_provider(
        &self,
        provider_type: ProviderType,
        credentials: &HashMap<String, String>,
    ) -> CoreResult<()> {
        let credentials = ProviderCredentials::from_map(provider_type, credentials)?;
        self.manager.switch_provider(credentials).await?;
        Ok(())
    }

    /// Metadata for every compiled-in provider type.
    #[must_use]
    pub fn available_providers() -> Vec<ProviderMetadata> {
        ProviderManager::available_providers()
    }

    /// Scheduler loop: a pass every poll interval (or sooner when requested),
    /// cleanup after each pass when enabled. Returns once shutdown is
    /// signalled; an in-flight record operation finishes first.
    pub async fn run(&self, source: &dyn DesiredStateSource) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => {
                    log::info!("[engine] shutdown requested, stopping scheduler");
                    return;
                }
            }

            match self.trigger_refresh(source).await {
                Ok(summary) => {
                    if summary.errors > 0 {
                        log::warn!("[engine] pass finished with {} errors", summary.errors);
                    }
                }
                Err(e) if e.is_expected() => log::warn!("[engine] pass skipped: {e}"),
                Err(e) => log::error!("[engine] pass failed: {e}"),
            }

            if self.config.cleanup_enabled {
                if let Err(e) = self.run_cleanup().await {
                    log::error!("[engine] cleanup failed: {e}");
                }
            }
        }
    }

    /// Signal shutdown to the scheduler and reconciler.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Tracker state snapshot for status endpoints (copy, never the live map).
    pub async fn tracked_records(&self) -> Vec<crate::tracker::TrackedRecord> {
        self.tracker.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Vec<RecordSpec>);

    #[async_trait]
    impl DesiredStateSource for StaticSource {
        async fn desired_records(&self) -> CoreResult<Vec<RecordSpec>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn merged_source_puts_managed_first() {
        use dns_warden_provider::DnsRecordType;

        let managed = vec![RecordSpec::new(
            DnsRecordType::A,
            "vpn.example.com",
            "203.0.113.9",
        )];
        let inner = StaticSource(vec![RecordSpec::new(
            DnsRecordType::A,
            "app.example.com",
            "203.0.113.5",
        )]);
        let merged = MergedSource {
            managed: &managed,
            inner: &inner,
        };

        let specs = merged.desired_records().await.unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "vpn.example.com");
        assert_eq!(specs[1].name, "app.example.com");
    }
}
