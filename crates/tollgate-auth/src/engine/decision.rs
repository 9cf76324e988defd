//! The decision function.

use std::sync::Arc;

use tracing::{debug, warn};

use tollgate_core::result::AppResult;
use tollgate_core::traits::Clock;
use tollgate_core::types::RoleCode;

use crate::rbac::PermissionStore;
use crate::registry::{Role, RoleRegistry};
use crate::session::Subject;

use super::query::DecisionQuery;
use super::verdict::{Basis, Verdict};

/// Composes the role registry and the permission store into verdicts.
///
/// Stateless apart from its collaborators: the same subject, query,
/// registry state, snapshot and clock always give the same verdict.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    registry: Arc<RoleRegistry>,
    store: Arc<PermissionStore>,
    clock: Arc<dyn Clock>,
}

impl DecisionEngine {
    /// Creates an engine over shared collaborators.
    pub fn new(
        registry: Arc<RoleRegistry>,
        store: Arc<PermissionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            store,
            clock,
        }
    }

    /// Active roles of `subject`, ordered by `(level, code)`.
    pub fn effective_roles(&self, subject: &Subject) -> Vec<Role> {
        self.registry.resolve(&subject.role_codes)
    }

    /// Answers `query` for `subject`.
    ///
    /// Denials are `Ok`. The only error is `STORE_UNAVAILABLE`, returned
    /// while no permission snapshot is installed.
    pub fn decide(&self, subject: &Subject, query: &DecisionQuery) -> AppResult<Verdict> {
        if !subject.is_valid_at(self.clock.now()) {
            debug!(subject_id = %subject.id, %query, "Session expired, denying");
            return Ok(Verdict::deny(query, Basis::SessionExpired));
        }

        let snapshot = self.store.snapshot()?;

        let roles: Vec<RoleCode> = self.registry.resolve_codes(&subject.role_codes);
        if roles.is_empty() {
            warn!(
                subject_id = %subject.id,
                assigned = ?subject.role_codes,
                "No assigned role is known and active"
            );
            return Ok(Verdict::deny(query, Basis::RoleUnresolved));
        }

        let verdict = match query {
            DecisionQuery::Screen { screen_id } => {
                access(snapshot.screen_allowed(&roles, screen_id))
            }
            DecisionQuery::Resource {
                resource,
                operation,
            } => access(snapshot.resource_allowed(&roles, resource, *operation)),
            DecisionQuery::Field { resource, field } => {
                let resolved = snapshot.field_tier(&roles, resource, field);
                Verdict::Field {
                    tier: resolved.tier,
                    basis: resolved.source.into(),
                }
            }
        };

        debug!(
            subject_id = %subject.id,
            %query,
            ?verdict,
            snapshot_version = snapshot.version(),
            "Decision computed"
        );
        Ok(verdict)
    }
}

fn access(granted: bool) -> Verdict {
    Verdict::Access {
        granted,
        basis: if granted { Basis::Grant } else { Basis::NoGrant },
    }
}
