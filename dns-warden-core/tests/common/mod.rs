//! Shared harness: a fully wired engine over the mock provider, with
//! injectable timestamps for grace-period assertions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use dns_warden_core::cleanup::OrphanCleaner;
use dns_warden_core::defaults::DefaultsTable;
use dns_warden_core::events::EventBus;
use dns_warden_core::ip::PublicIpResolver;
use dns_warden_core::manager::ProviderManager;
use dns_warden_core::reconciler::Reconciler;
use dns_warden_core::test_utils::MockProvider;
use dns_warden_core::tracker::OwnershipTracker;
use dns_warden_core::traits::MemoryTrackerRepository;

pub struct Harness {
    pub provider: Arc<MockProvider>,
    pub manager: Arc<ProviderManager>,
    pub tracker: Arc<OwnershipTracker>,
    pub reconciler: Reconciler,
    pub events: EventBus,
    #[allow(dead_code)]
    pub shutdown_tx: watch::Sender<bool>,
}

pub async fn harness() -> Harness {
    let events = EventBus::new();
    let provider = Arc::new(MockProvider::new("example.com"));
    let manager = Arc::new(ProviderManager::new(events.clone(), None));
    manager.install(provider.clone()).await;

    let tracker = Arc::new(
        OwnershipTracker::load(Arc::new(MemoryTrackerRepository::new()))
            .await
            .unwrap(),
    );
    // No endpoints: IP lookups fail fast, which the tests never rely on.
    let ip_resolver = Arc::new(PublicIpResolver::with_endpoints(
        vec![],
        Duration::from_secs(300),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconciler = Reconciler::new(
        manager.clone(),
        tracker.clone(),
        ip_resolver,
        DefaultsTable::default(),
        events.clone(),
        shutdown_rx,
    );

    Harness {
        provider,
        manager,
        tracker,
        reconciler,
        events,
        shutdown_tx,
    }
}

impl Harness {
    pub fn cleaner(&self, enabled: bool, grace_secs: i64) -> OrphanCleaner {
        OrphanCleaner::new(
            self.manager.clone(),
            self.tracker.clone(),
            self.events.clone(),
            enabled,
            chrono::Duration::seconds(grace_secs),
        )
    }
}
