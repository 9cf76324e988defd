//! Session signal bus over a tokio broadcast channel.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use tollgate_core::config::RealtimeConfig;
use tollgate_core::events::{SessionEvent, SessionSignal};
use tollgate_core::types::SurfaceId;

use crate::subscription::BusSubscription;

/// In-process pub/sub for session signals.
#[derive(Debug)]
pub struct SessionBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionBus {
    /// Create a bus whose subscribers may fall `capacity` events behind.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Create a bus from configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(config.bus_capacity)
    }

    /// Publish a signal. Returns the number of subscribers it reached.
    ///
    /// Delivery into every live subscription happens before this returns.
    pub fn publish(
        &self,
        origin: Option<SurfaceId>,
        timestamp: DateTime<Utc>,
        signal: SessionSignal,
    ) -> usize {
        let event = SessionEvent::new(origin, timestamp, signal);
        debug!(event_id = %event.id, signal = ?event.signal, "Publishing session signal");
        // No receivers is not an error: nobody else needs to hear it.
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to signals published from now on.
    pub fn subscribe(&self) -> BusSubscription {
        BusSubscription::new(self.sender.subscribe())
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::types::SubjectId;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = SessionBus::new(4);
        let reached = bus.publish(
            None,
            Utc::now(),
            SessionSignal::PolicyReloaded { version: 1 },
        );
        assert_eq!(reached, 0);
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = SessionBus::new(4);
        let first = bus.subscribe();
        let second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let origin = SurfaceId::new();
        let reached = bus.publish(
            Some(origin),
            Utc::now(),
            SessionSignal::LoggedOut {
                subject_id: SubjectId::from("alice"),
            },
        );
        assert_eq!(reached, 2);

        for subscription in [&first, &second] {
            let drained = subscription.drain();
            assert!(!drained.lagged);
            assert_eq!(drained.events.len(), 1);
            assert!(drained.events[0].is_from(origin));
        }
    }
}
