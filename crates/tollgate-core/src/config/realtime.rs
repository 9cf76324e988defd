//! Session bus configuration.

use serde::{Deserialize, Serialize};

/// In-process session bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Number of undelivered signals a subscriber may fall behind before
    /// it is marked as lagged.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
        }
    }
}

fn default_bus_capacity() -> usize {
    64
}
