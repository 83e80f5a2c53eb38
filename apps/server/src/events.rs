//! In-process event fan-out. Domain events from the core services are
//! republished here and streamed to clients over SSE.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use carehome_core::events::{DomainEvent, DomainEventSink};

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct ServerEvent {
    pub name: String,
    pub payload: Option<serde_json::Value>,
}

impl ServerEvent {
    pub fn with_payload(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            debug!("No event subscribers");
        }
    }
}

impl DomainEventSink for EventBus {
    fn emit(&self, event: DomainEvent) {
        match &event {
            DomainEvent::SafetyWarning {
                resident_id,
                medication_id,
                message,
            } => warn!(
                "Safety warning for resident {} ({}): {}",
                resident_id, medication_id, message
            ),
            DomainEvent::StockAlertRaised { alert } => {
                warn!("Stock alert {:?}: {}", alert.kind, alert.message)
            }
            DomainEvent::SyncItemFailed {
                item_id,
                error,
                exhausted,
                ..
            } => warn!(
                "Sync item {} failed (exhausted: {}): {}",
                item_id, exhausted, error
            ),
            DomainEvent::SyncPassCompleted { result } if result.attempted > 0 => info!(
                "Sync pass: {} attempted, {} synced, {} failed",
                result.attempted, result.synced, result.failed
            ),
            _ => debug!("Domain event {}", event.name()),
        }
        let payload = serde_json::to_value(&event).unwrap_or_default();
        self.publish(ServerEvent::with_payload(event.name(), payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carehome_core::sync::SyncItemType;

    #[tokio::test]
    async fn domain_events_reach_subscribers() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(DomainEvent::SyncItemSynced {
            item_id: "item-1".to_string(),
            item_type: SyncItemType::Consent,
        });
        let event = rx.recv().await.expect("event");
        assert_eq!(event.name, "sync_item_synced");
        let payload = event.payload.expect("payload");
        assert_eq!(payload["item_id"], "item-1");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        EventBus::default().publish(ServerEvent::with_payload("noop", serde_json::Value::Null));
    }
}
