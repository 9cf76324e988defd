//! Non-blocking subscription handle.

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use tollgate_core::events::SessionEvent;

/// Result of draining a subscription.
#[derive(Debug, Default)]
pub struct Drained {
    /// Events received, oldest first.
    pub events: Vec<SessionEvent>,
    /// Whether some events were lost because the subscriber fell behind.
    /// A lagged subscriber must assume anything may have changed.
    pub lagged: bool,
}

impl Drained {
    /// Whether nothing happened since the last drain.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.lagged
    }
}

/// A surface's handle on the session bus.
#[derive(Debug)]
pub struct BusSubscription {
    receiver: Mutex<broadcast::Receiver<SessionEvent>>,
}

impl BusSubscription {
    pub(crate) fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self {
            receiver: Mutex::new(receiver),
        }
    }

    /// Take every pending event without waiting.
    pub fn drain(&self) -> Drained {
        let mut receiver = self.receiver.lock();
        let mut drained = Drained::default();
        loop {
            match receiver.try_recv() {
                Ok(event) => drained.events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Session subscription lagged");
                    drained.lagged = true;
                }
            }
        }
        drained
    }
}
