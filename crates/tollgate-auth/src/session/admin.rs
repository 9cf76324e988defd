//! Administrator changes to roles, assignments and permission data.
//!
//! Every change that can alter a decision invalidates the affected cached
//! decisions before it is announced on the session bus.

use std::sync::Arc;

use tracing::info;

use tollgate_core::events::SessionSignal;
use tollgate_core::result::AppResult;
use tollgate_core::types::{RoleCode, SubjectId};

use crate::rbac::PolicyCatalog;
use crate::registry::{NewRole, Role, RoleUpdate};

use super::runtime::AuthRuntime;

/// Administrative façade over an [`AuthRuntime`].
#[derive(Debug, Clone)]
pub struct PolicyAdmin {
    runtime: Arc<AuthRuntime>,
}

impl PolicyAdmin {
    pub(crate) fn new(runtime: Arc<AuthRuntime>) -> Self {
        Self { runtime }
    }

    pub fn create_role(&self, role: NewRole) -> AppResult<Role> {
        let role = self.runtime.registry().create(role)?;
        self.policy_changed();
        Ok(role)
    }

    pub fn update_role(&self, code: &RoleCode, update: RoleUpdate) -> AppResult<Role> {
        self.runtime.registry().update(code, update)
    }

    pub fn deactivate_role(&self, code: &RoleCode) -> AppResult<Role> {
        let role = self.runtime.registry().deactivate(code)?;
        self.policy_changed();
        Ok(role)
    }

    pub fn activate_role(&self, code: &RoleCode) -> AppResult<Role> {
        let role = self.runtime.registry().activate(code)?;
        self.policy_changed();
        Ok(role)
    }

    /// Deletes a role; fails with `CONFLICT` while any subject holds it.
    pub fn delete_role(&self, code: &RoleCode) -> AppResult<Role> {
        let role = self.runtime.registry().delete(code)?;
        self.policy_changed();
        Ok(role)
    }

    /// Replaces a subject's roles and pushes the new set to every surface
    /// where that subject is logged in.
    pub fn reassign_roles(&self, subject: &SubjectId, codes: &[RoleCode]) -> AppResult<Vec<RoleCode>> {
        let assigned = self.runtime.registry().set_assignments(subject, codes)?;
        let invalidated = self.runtime.cache().invalidate(subject);
        info!(subject_id = %subject, roles = ?assigned, invalidated, "Roles reassigned");

        self.runtime.bus().publish(
            None,
            self.runtime.clock().now(),
            SessionSignal::RolesChanged {
                subject_id: subject.clone(),
                role_codes: assigned.clone(),
            },
        );
        Ok(assigned)
    }

    /// Installs a new catalog. Returns the new snapshot version.
    pub fn install_catalog(&self, catalog: PolicyCatalog) -> AppResult<u64> {
        let version = self.runtime.apply_catalog(catalog)?;
        self.publish_reload(version);
        Ok(version)
    }

    /// Reloads the catalog from `policy.catalog_path`.
    pub fn reload_catalog(&self) -> AppResult<u64> {
        let path = self
            .runtime
            .config()
            .policy
            .catalog_path
            .clone()
            .ok_or_else(|| {
                tollgate_core::error::AppError::configuration("No policy catalog path configured")
            })?;
        self.install_catalog(PolicyCatalog::load(&path)?)
    }

    fn policy_changed(&self) {
        self.publish_reload(self.runtime.permissions().version().unwrap_or(0));
    }

    fn publish_reload(&self, version: u64) {
        let invalidated = self.runtime.cache().invalidate_all();
        info!(version, invalidated, "Permission data changed");
        self.runtime.bus().publish(
            None,
            self.runtime.clock().now(),
            SessionSignal::PolicyReloaded { version },
        );
    }
}
