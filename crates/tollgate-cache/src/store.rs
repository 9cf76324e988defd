//! Per-subject decision cache.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use tollgate_core::config::CacheConfig;
use tollgate_core::result::AppResult;
use tollgate_core::types::SubjectId;

use crate::entry::{CacheStats, CachedEntry, Counters};

/// Entries for one subject.
#[derive(Debug)]
struct SubjectSlot<K, V> {
    entries: HashMap<K, CachedEntry<V>>,
}

impl<K, V> Default for SubjectSlot<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> SubjectSlot<K, V> {
    /// Drops expired entries, returning how many were removed.
    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Drops the entry closest to expiry.
    fn evict_soonest(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());
        match victim {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }
}

/// Read-through cache of decisions keyed by `(subject, query)`.
///
/// A value stored at `now` for a session ending at `deadline` expires at
/// `min(deadline, now + ttl)`. Expired entries are never served; they are
/// dropped on the read that finds them.
///
/// The slot lock of a subject is held while `compute` runs, which gives a
/// single writer per subject: an invalidation waits for an in-flight
/// compute and then drops its result. `compute` must not call back into
/// the same cache.
///
/// Slots exist only while they hold entries; `sweep` drops emptied ones.
#[derive(Debug)]
pub struct DecisionCache<K, V> {
    slots: DashMap<SubjectId, SubjectSlot<K, V>>,
    ttl: Duration,
    max_entries_per_subject: usize,
    counters: Counters,
}

impl<K, V> DecisionCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with an explicit TTL and per-subject capacity.
    pub fn new(ttl: Duration, max_entries_per_subject: usize) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            max_entries_per_subject: max_entries_per_subject.max(1),
            counters: Counters::default(),
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        let ttl = i64::try_from(config.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self::new(ttl, config.max_entries_per_subject)
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// Errors from `compute` are returned as-is and nothing is stored.
    pub fn get_or_compute<F>(
        &self,
        subject: &SubjectId,
        key: K,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
        compute: F,
    ) -> AppResult<V>
    where
        F: FnOnce() -> AppResult<V>,
    {
        let mut slot = self.slots.entry(subject.clone()).or_default();

        if let Some(entry) = slot.entries.get(&key) {
            if entry.is_live(now) {
                self.counters.hit();
                return Ok(entry.value.clone());
            }
            slot.entries.remove(&key);
            self.counters.evicted(1);
        }

        self.counters.miss();
        let value = compute()?;

        let expires_at = now
            .checked_add_signed(self.ttl)
            .map_or(deadline, |ttl_end| deadline.min(ttl_end));
        if expires_at <= now {
            return Ok(value);
        }

        if slot.entries.len() >= self.max_entries_per_subject {
            let mut evicted = slot.purge_expired(now);
            if slot.entries.len() >= self.max_entries_per_subject && slot.evict_soonest() {
                evicted += 1;
            }
            self.counters.evicted(evicted as u64);
        }

        slot.entries.insert(
            key,
            CachedEntry {
                value: value.clone(),
                stored_at: now,
                expires_at,
            },
        );
        Ok(value)
    }

    /// Return the cached value for `key` if it is still live.
    pub fn peek(&self, subject: &SubjectId, key: &K, now: DateTime<Utc>) -> Option<V> {
        let slot = self.slots.get(subject)?;
        slot.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Drop every entry of `subject`. Returns the number of entries
    /// removed.
    pub fn invalidate(&self, subject: &SubjectId) -> usize {
        let removed = self
            .slots
            .remove(subject)
            .map_or(0, |(_, slot)| slot.entries.len());
        self.counters.invalidated();
        debug!(subject_id = %subject, removed, "Invalidated decision cache");
        removed
    }

    /// Drop every entry of every subject.
    pub fn invalidate_all(&self) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, slot| {
            removed += slot.entries.len();
            self.counters.invalidated();
            false
        });
        debug!(removed, "Invalidated all cached decisions");
        removed
    }

    /// Drop expired entries everywhere, and the slots they leave empty.
    /// Returns the number of entries removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, slot| {
            removed += slot.purge_expired(now);
            !slot.entries.is_empty()
        });
        self.counters.evicted(removed as u64);
        removed
    }

    /// Number of subjects with a slot.
    pub fn subject_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored entries for `subject`, live or not.
    pub fn len(&self, subject: &SubjectId) -> usize {
        self.slots.get(subject).map(|slot| slot.entries.len()).unwrap_or(0)
    }

    /// Whether `subject` has no stored entries.
    pub fn is_empty(&self, subject: &SubjectId) -> bool {
        self.len(subject) == 0
    }

    /// Current hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}
