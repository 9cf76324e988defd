//! In-memory role registry.
//!
//! Holds role definitions and the set of subjects assigned to each role.
//! `user_count` is derived from those assignments, so deletion can be
//! blocked while a role is still referenced.
//!
//! A subject with an assignment record has an authoritative role set: it
//! overrides whatever role claims the subject's tokens carry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::Clock;
use tollgate_core::types::{RoleCode, SubjectId};

use super::role::{NewRole, Role, RoleUpdate};

#[derive(Debug, Default)]
struct Inner {
    roles: HashMap<RoleCode, Role>,
    assignments: HashMap<RoleCode, HashSet<SubjectId>>,
    /// Assignment records, sorted; present once a subject was assigned.
    records: HashMap<SubjectId, Vec<RoleCode>>,
}

impl Inner {
    fn unassign(&mut self, subject: &SubjectId) {
        for members in self.assignments.values_mut() {
            members.remove(subject);
        }
        self.assignments.retain(|_, members| !members.is_empty());
    }

    fn role_mut(&mut self, code: &RoleCode) -> AppResult<&mut Role> {
        self.roles
            .get_mut(code)
            .ok_or_else(|| AppError::not_found(format!("Role '{code}' not found")))
    }
}

/// Catalog of roles with active flags and subject assignments.
#[derive(Debug)]
pub struct RoleRegistry {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl RoleRegistry {
    /// Creates an empty registry that timestamps changes with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    /// Resolves role codes to active roles, ordered by `(level, code)`.
    ///
    /// Unknown and inactive codes are dropped without error.
    pub fn resolve<'a, I>(&self, codes: I) -> Vec<Role>
    where
        I: IntoIterator<Item = &'a RoleCode>,
    {
        let inner = self.inner.read();
        let mut seen = HashSet::new();
        let mut resolved: Vec<Role> = codes
            .into_iter()
            .filter(|code| seen.insert(*code))
            .filter_map(|code| match inner.roles.get(code) {
                Some(role) if role.active => Some(role.clone()),
                Some(_) => {
                    debug!(role = %code, "Ignoring inactive role");
                    None
                }
                None => {
                    debug!(role = %code, "Ignoring unknown role");
                    None
                }
            })
            .collect();
        resolved.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.code.cmp(&b.code)));
        resolved
    }

    /// Active role codes among `codes`, without cloning full records.
    pub fn resolve_codes<'a, I>(&self, codes: I) -> Vec<RoleCode>
    where
        I: IntoIterator<Item = &'a RoleCode>,
    {
        self.resolve(codes).into_iter().map(|role| role.code).collect()
    }

    /// Registers a new role.
    pub fn create(&self, new_role: NewRole) -> AppResult<Role> {
        let mut inner = self.inner.write();
        if inner.roles.contains_key(&new_role.code) {
            return Err(AppError::conflict(format!(
                "Role '{}' already exists",
                new_role.code
            )));
        }

        let now = self.clock.now();
        let role = Role {
            code: new_role.code,
            name: new_role.name,
            description: new_role.description,
            level: new_role.level,
            active: new_role.active,
            created_at: now,
            updated_at: now,
        };
        inner.roles.insert(role.code.clone(), role.clone());
        info!(role = %role.code, level = role.level, "Role created");
        Ok(role)
    }

    /// Updates the mutable attributes of a role.
    pub fn update(&self, code: &RoleCode, update: RoleUpdate) -> AppResult<Role> {
        let mut inner = self.inner.write();
        let role = inner.role_mut(code)?;
        if let Some(name) = update.name {
            role.name = name;
        }
        if let Some(description) = update.description {
            role.description = description;
        }
        if let Some(level) = update.level {
            role.level = level;
        }
        role.updated_at = self.clock.now();
        info!(role = %code, "Role updated");
        Ok(role.clone())
    }

    /// Deactivates a role. Allowed regardless of assignments.
    pub fn deactivate(&self, code: &RoleCode) -> AppResult<Role> {
        self.set_active(code, false)
    }

    /// Reactivates a role.
    pub fn activate(&self, code: &RoleCode) -> AppResult<Role> {
        self.set_active(code, true)
    }

    fn set_active(&self, code: &RoleCode, active: bool) -> AppResult<Role> {
        let mut inner = self.inner.write();
        let role = inner.role_mut(code)?;
        role.active = active;
        role.updated_at = self.clock.now();
        info!(role = %code, active, "Role activation changed");
        Ok(role.clone())
    }

    /// Removes a role that no subject is assigned to.
    pub fn delete(&self, code: &RoleCode) -> AppResult<Role> {
        let mut inner = self.inner.write();
        let user_count = inner.assignments.get(code).map_or(0, HashSet::len);
        if user_count > 0 {
            return Err(AppError::conflict(format!(
                "Role '{code}' is assigned to {user_count} subject(s) and cannot be deleted"
            )));
        }
        let role = inner
            .roles
            .remove(code)
            .ok_or_else(|| AppError::not_found(format!("Role '{code}' not found")))?;
        inner.assignments.remove(code);
        info!(role = %code, "Role deleted");
        Ok(role)
    }

    /// Looks up a role, active or not.
    pub fn get(&self, code: &RoleCode) -> Option<Role> {
        self.inner.read().roles.get(code).cloned()
    }

    /// Whether a role with this code exists.
    pub fn contains(&self, code: &RoleCode) -> bool {
        self.inner.read().roles.contains_key(code)
    }

    /// All roles ordered by `(level, code)`.
    pub fn list(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.inner.read().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.code.cmp(&b.code)));
        roles
    }

    /// Number of subjects assigned to a role through the registry.
    ///
    /// Sessions whose token claims name the role without a registry
    /// assignment are not counted; after a delete those claims resolve to
    /// nothing.
    pub fn user_count(&self, code: &RoleCode) -> usize {
        self.inner
            .read()
            .assignments
            .get(code)
            .map_or(0, HashSet::len)
    }

    /// Adds a role to a subject's assignments.
    pub fn assign(&self, subject: &SubjectId, code: &RoleCode) -> AppResult<()> {
        let mut inner = self.inner.write();
        if !inner.roles.contains_key(code) {
            return Err(AppError::not_found(format!("Role '{code}' not found")));
        }
        inner
            .assignments
            .entry(code.clone())
            .or_default()
            .insert(subject.clone());
        let record = inner.records.entry(subject.clone()).or_default();
        if let Err(at) = record.binary_search(code) {
            record.insert(at, code.clone());
        }
        Ok(())
    }

    /// Replaces a subject's assignments with `codes`. An empty list still
    /// leaves a record: the subject then holds no roles.
    ///
    /// Every code must exist; nothing changes otherwise. Returns the new
    /// assignment, sorted and deduplicated.
    pub fn set_assignments(
        &self,
        subject: &SubjectId,
        codes: &[RoleCode],
    ) -> AppResult<Vec<RoleCode>> {
        let mut inner = self.inner.write();
        if let Some(unknown) = codes.iter().find(|code| !inner.roles.contains_key(*code)) {
            return Err(AppError::not_found(format!("Role '{unknown}' not found")));
        }

        inner.unassign(subject);
        for code in codes {
            inner
                .assignments
                .entry(code.clone())
                .or_default()
                .insert(subject.clone());
        }

        let mut assigned = codes.to_vec();
        assigned.sort();
        assigned.dedup();
        inner.records.insert(subject.clone(), assigned.clone());
        info!(subject_id = %subject, roles = ?assigned, "Role assignments replaced");
        Ok(assigned)
    }

    /// Forgets a subject's assignments and its record. Its tokens' role
    /// claims apply again afterwards.
    pub fn clear_assignments(&self, subject: &SubjectId) {
        let mut inner = self.inner.write();
        inner.unassign(subject);
        if inner.records.remove(subject).is_some() {
            info!(subject_id = %subject, "Role assignments cleared");
        }
    }

    /// The subject's authoritative role set, if it has an assignment
    /// record.
    pub fn assignment(&self, subject: &SubjectId) -> Option<Vec<RoleCode>> {
        self.inner.read().records.get(subject).cloned()
    }

    /// Role codes currently assigned to a subject, sorted.
    pub fn assigned_roles(&self, subject: &SubjectId) -> Vec<RoleCode> {
        self.assignment(subject).unwrap_or_default()
    }
}
