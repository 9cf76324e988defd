//! Session events broadcast between surfaces.
//!
//! Every change that can alter a decision for a subject (login, logout,
//! token refresh, role reassignment, catalog reload) is published as a
//! [`SessionEvent`] so that other surfaces can invalidate and recompute
//! without polling.

pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventId, SurfaceId};

pub use session::SessionSignal;

/// Envelope for a session signal with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Unique event ID.
    pub id: EventId,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// The surface that published the event, `None` for administrative
    /// changes made outside any surface.
    pub origin: Option<SurfaceId>,
    /// The signal payload.
    pub signal: SessionSignal,
}

impl SessionEvent {
    /// Create a new session event.
    pub fn new(origin: Option<SurfaceId>, timestamp: DateTime<Utc>, signal: SessionSignal) -> Self {
        Self {
            id: EventId::new(),
            timestamp,
            origin,
            signal,
        }
    }

    /// Whether this event was published by `surface`.
    pub fn is_from(&self, surface: SurfaceId) -> bool {
        self.origin == Some(surface)
    }
}
