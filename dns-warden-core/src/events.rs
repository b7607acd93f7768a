//! Typed engine events over a broadcast channel.
//!
//! Subscribers register explicitly via [`EventBus::subscribe`]. Publication
//! never blocks: a slow subscriber lags on its own receiver and a closed
//! channel (no subscribers) is not an error.

use serde::Serialize;
use tokio::sync::broadcast;

use dns_warden_provider::{DnsRecord, DnsRecordType, ProviderType};

use crate::types::{CleanupReport, CycleSummary};

/// Notification published by the reconciliation engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    #[serde(rename_all = "camelCase")]
    RecordCreated { record: DnsRecord },
    #[serde(rename_all = "camelCase")]
    RecordUpdated { record: DnsRecord },
    #[serde(rename_all = "camelCase")]
    RecordDeleted {
        #[serde(rename = "type")]
        record_type: DnsRecordType,
        name: String,
        record_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ProviderChanged { provider_type: ProviderType },
    #[serde(rename_all = "camelCase")]
    CycleCompleted { summary: CycleSummary },
    #[serde(rename_all = "camelCase")]
    CleanupCompleted { report: CleanupReport },
}

/// Broadcast bus for [`EngineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Channel capacity per subscriber; older events are dropped for a
    /// subscriber that falls this far behind.
    const CAPACITY: usize = 256;

    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    /// Register a new subscriber. Each subscriber gets every event published
    /// after this call; a failing or slow subscriber never affects others.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Succeeds regardless of subscriber count.
    pub fn publish(&self, event: EngineEvent) {
        // send() only fails when there are no receivers.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(EngineEvent::ProviderChanged {
            provider_type: ProviderType::Cloudflare,
        });

        assert!(matches!(
            a.recv().await.unwrap(),
            EngineEvent::ProviderChanged { .. }
        ));
        assert!(matches!(
            b.recv().await.unwrap(),
            EngineEvent::ProviderChanged { .. }
        ));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(EngineEvent::CycleCompleted {
            summary: CycleSummary::default(),
        });
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_block_delivery() {
        let bus = EventBus::new();
        let dropped = bus.subscribe();
        drop(dropped);
        let mut live = bus.subscribe();

        bus.publish(EngineEvent::ProviderChanged {
            provider_type: ProviderType::Cloudflare,
        });
        assert!(live.recv().await.is_ok());
    }
}
