//! Periodic removal of expired cache entries.
//!
//! Correctness never depends on the sweeper: expired entries are not
//! served even if they are still stored. It only bounds memory.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use tollgate_core::traits::Clock;

use crate::store::DecisionCache;

/// Background task that sweeps a [`DecisionCache`] on an interval.
#[derive(Debug)]
pub struct CacheSweeper<K, V> {
    cache: Arc<DecisionCache<K, V>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl<K, V> CacheSweeper<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a sweeper.
    pub fn new(cache: Arc<DecisionCache<K, V>>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            cache,
            clock,
            interval: interval.max(Duration::from_millis(10)),
        }
    }

    /// Run one sweep and return the number of entries removed.
    pub fn run_once(&self) -> usize {
        let removed = self.cache.sweep(self.clock.now());
        if removed > 0 {
            debug!(removed, "Swept expired decisions");
        }
        removed
    }

    /// Spawn the sweep loop. It stops when `shutdown` flips to `true` or
    /// its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_ms = self.interval.as_millis() as u64, "Cache sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Cache sweeper stopped");
        })
    }
}
