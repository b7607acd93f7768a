//! Provider lifecycle: construction, hot-swap, current-instance access.
//!
//! At most one live provider instance at a time, held in a single-writer
//! slot. A switch builds and initializes the replacement first; only a
//! successful `init()` swaps the slot, so a failed switch leaves the old
//! provider fully in service. In-flight operations hold their own `Arc`
//! clone and drain naturally against the old instance.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use dns_warden_provider::{
    create_provider, DnsProvider, ProviderCredentials, ProviderMetadata, ProviderType,
};

use crate::error::{CoreError, CoreResult};
use crate::events::{EngineEvent, EventBus};

/// Constructor seam for the switch path; real code builds via the factory.
type ProviderBuilder = fn(ProviderCredentials, Option<Duration>) -> Arc<dyn DnsProvider>;

pub struct ProviderManager {
    active: RwLock<Option<Arc<dyn DnsProvider>>>,
    events: EventBus,
    cache_max_age: Option<Duration>,
    builder: ProviderBuilder,
}

impl ProviderManager {
    #[must_use]
    pub fn new(events: EventBus, cache_max_age: Option<Duration>) -> Self {
        Self::with_builder(events, cache_max_age, create_provider)
    }

    fn with_builder(
        events: EventBus,
        cache_max_age: Option<Duration>,
        builder: ProviderBuilder,
    ) -> Self {
        Self {
            active: RwLock::new(None),
            events,
            cache_max_age,
            builder,
        }
    }

    /// The currently active provider.
    ///
    /// # Errors
    ///
    /// [`CoreError::NoProviderConfigured`] when no switch has succeeded yet.
    pub async fn current(&self) -> CoreResult<Arc<dyn DnsProvider>> {
        self.active
            .read()
            .await
            .clone()
            .ok_or(CoreError::NoProviderConfigured)
    }

    /// The active provider's type, if any.
    pub async fn current_type(&self) -> Option<ProviderType> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|p| p.provider_type())
    }

    /// Construct, `init()`, and activate a provider from credentials.
    ///
    /// If a provider of the same type for the same zone is already active,
    /// it is returned unchanged. On init failure the previously active
    /// provider stays in place and the error is surfaced; nothing is
    /// partially applied.
    pub async fn switch_provider(
        &self,
        credentials: ProviderCredentials,
    ) -> CoreResult<Arc<dyn DnsProvider>> {
        let target_type = credentials.provider_type();
        let target_zone = credentials.zone().to_string();

        if let Some(active) = self.active.read().await.clone() {
            if active.provider_type() == target_type && active.zone() == target_zone {
                log::debug!("[manager] {target_type} already active for '{target_zone}'");
                return Ok(active);
            }
        }

        log::info!("[manager] switching provider to {target_type} for '{target_zone}'");
        let replacement = (self.builder)(credentials, self.cache_max_age);
        replacement.init().await?;

        // Only a fully initialized replacement reaches the slot.
        let previous = {
            let mut slot = self.active.write().await;
            slot.replace(replacement.clone())
        };
        if let Some(previous) = previous {
            log::info!(
                "[manager] provider {} replaced; in-flight operations drain on their own handle",
                previous.name()
            );
        }

        self.events.publish(EngineEvent::ProviderChanged {
            provider_type: target_type,
        });
        Ok(replacement)
    }

    /// Install an already-built provider (used by tests and embedders).
    pub async fn install(&self, provider: Arc<dyn DnsProvider>) {
        let provider_type = provider.provider_type();
        *self.active.write().await = Some(provider);
        self.events
            .publish(EngineEvent::ProviderChanged { provider_type });
    }

    /// Metadata for every compiled-in provider type (config-driven registry,
    /// no filesystem discovery).
    #[must_use]
    pub fn available_providers() -> Vec<ProviderMetadata> {
        dns_warden_provider::get_all_provider_metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockProvider;

    #[tokio::test]
    async fn no_provider_until_installed() {
        let manager = ProviderManager::new(EventBus::new(), None);
        assert!(matches!(
            manager.current().await,
            Err(CoreError::NoProviderConfigured)
        ));
    }

    #[tokio::test]
    async fn install_publishes_provider_changed() {
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let manager = ProviderManager::new(events, None);

        manager.install(Arc::new(MockProvider::new("example.com"))).await;
        assert!(manager.current().await.is_ok());
        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineEvent::ProviderChanged { .. }
        ));
    }

    #[tokio::test]
    async fn failed_init_keeps_previous_provider() {
        // The replacement is built offline and refuses to init; the old
        // provider must stay in the slot.
        let manager = ProviderManager::with_builder(EventBus::new(), None, |_, _| {
            Arc::new(MockProvider::failing_init("other.example.com", "init refused"))
        });
        let original = Arc::new(MockProvider::new("example.com"));
        manager.install(original.clone()).await;

        let result = manager
            .switch_provider(ProviderCredentials::Cloudflare {
                api_token: "irrelevant".to_string(),
                zone: "other.example.com".to_string(),
            })
            .await;
        assert!(result.is_err());

        let current = manager.current().await.unwrap();
        assert_eq!(current.zone(), "example.com");
        assert_eq!(current.name(), original.name());
    }

    #[tokio::test]
    async fn same_type_and_zone_short_circuits() {
        let manager = ProviderManager::new(EventBus::new(), None);
        let original = Arc::new(MockProvider::new("example.com"));
        manager.install(original.clone()).await;

        // The mock reports the Cloudflare type, so a switch to the same
        // type/zone pair returns the active instance without building a
        // replacement (no init, no network).
        let result = manager
            .switch_provider(ProviderCredentials::Cloudflare {
                api_token: "irrelevant".to_string(),
                zone: "example.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.name(), original.name());
    }
}
