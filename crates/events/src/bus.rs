//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Shared as `Arc<EventBus>` between the ingestion pipeline (publisher) and
//! the notifier (subscriber).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use vitrine_core::types::DbId;

/// Published once for every alert the store newly opens.
pub const EVENT_ALERT_CREATED: &str = "alert.created";

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event.
///
/// Built with [`PlatformEvent::new`] and the [`with_source`](Self::with_source)
/// / [`with_payload`](Self::with_payload) builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"alert.created"`.
    pub event_type: String,

    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use vitrine_events::bus::{EventBus, PlatformEvent, EVENT_ALERT_CREATED};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new(EVENT_ALERT_CREATED).with_source("alert", 1));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer wraps.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Dropped silently when nobody is subscribed.
    pub fn publish(&self, event: PlatformEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_alert_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::new(EVENT_ALERT_CREATED)
                .with_source("alert", 42)
                .with_payload(serde_json::json!({"quantity": "humidity"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, EVENT_ALERT_CREATED);
        assert_eq!(received.source_entity_type.as_deref(), Some("alert"));
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.payload["quantity"], "humidity");
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::new("collection.started"));

        assert_eq!(rx1.recv().await.unwrap().event_type, "collection.started");
        assert_eq!(rx2.recv().await.unwrap().event_type, "collection.started");
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(4);
        bus.publish(PlatformEvent::new("orphan.event"));
    }

    #[test]
    fn bare_event_has_empty_object_payload() {
        let event = PlatformEvent::new("bare.event");
        assert!(event.source_entity_id.is_none());
        assert!(event.payload.as_object().is_some_and(|o| o.is_empty()));
    }
}
