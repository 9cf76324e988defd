//! Decision cache configuration.

use serde::{Deserialize, Serialize};

/// Decision cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on the lifetime of a cached decision, in seconds.
    /// Entries never outlive the session that produced them.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum cached decisions per subject.
    #[serde(default = "default_max_entries")]
    pub max_entries_per_subject: usize,
    /// Interval of the background sweep, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_entries_per_subject: default_max_entries(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_entries() -> usize {
    1024
}

fn default_sweep_interval() -> u64 {
    60
}
