//! Copy-on-write holder of the current permission snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::info;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::types::{Operation, RoleCode};

use super::snapshot::{FieldResolution, PermissionSnapshot};

/// The permission store. Readers take an `Arc` to the current snapshot
/// and keep reading it even if a new one is installed meanwhile.
#[derive(Debug, Default)]
pub struct PermissionStore {
    current: RwLock<Option<Arc<PermissionSnapshot>>>,
    next_version: AtomicU64,
}

impl PermissionStore {
    /// Creates a store with no permission data loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot and returns its version.
    pub fn install(&self, mut snapshot: PermissionSnapshot) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        snapshot.set_version(version);
        *self.current.write() = Some(Arc::new(snapshot));
        info!(version, "Permission snapshot installed");
        version
    }

    /// Drops the loaded data; decisions fail with `STORE_UNAVAILABLE`
    /// until the next install.
    pub fn unload(&self) {
        *self.current.write() = None;
        info!("Permission snapshot unloaded");
    }

    /// Whether permission data is loaded.
    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> AppResult<Arc<PermissionSnapshot>> {
        self.current
            .read()
            .clone()
            .ok_or_else(|| AppError::store_unavailable("Permission data is not loaded"))
    }

    /// Version of the current snapshot, if any.
    pub fn version(&self) -> Option<u64> {
        self.current.read().as_ref().map(|s| s.version())
    }

    pub fn screen_allowed(&self, roles: &[RoleCode], screen_id: &str) -> AppResult<bool> {
        Ok(self.snapshot()?.screen_allowed(roles, screen_id))
    }

    pub fn resource_allowed(
        &self,
        roles: &[RoleCode],
        resource: &str,
        operation: Operation,
    ) -> AppResult<bool> {
        Ok(self.snapshot()?.resource_allowed(roles, resource, operation))
    }

    pub fn field_tier(
        &self,
        roles: &[RoleCode],
        resource: &str,
        field: &str,
    ) -> AppResult<FieldResolution> {
        Ok(self.snapshot()?.field_tier(roles, resource, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unloaded_store_is_unavailable() {
        let store = PermissionStore::new();
        assert!(!store.is_loaded());
        let err = store.screen_allowed(&[], "dashboard").unwrap_err();
        assert!(err.is_store_unavailable());
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = PermissionStore::new();
        assert_eq!(store.install(PermissionSnapshot::default()), 1);
        let held = store.snapshot().unwrap();

        assert_eq!(store.install(PermissionSnapshot::default()), 2);
        assert_eq!(held.version(), 1);
        assert_eq!(store.version(), Some(2));

        store.unload();
        assert_eq!(held.version(), 1);
        assert!(store.snapshot().is_err());
    }
}
