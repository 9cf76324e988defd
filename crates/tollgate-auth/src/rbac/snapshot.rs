//! Immutable, indexed permission data.
//!
//! Every lookup walks the subject's (few) active roles and does a hash
//! lookup per role; nothing scans a permission table.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use tollgate_core::config::PolicyConfig;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::types::{FieldTier, Operation, RoleCode};

use crate::registry::RoleRegistry;

use super::catalog::PolicyCatalog;

/// Tiers used when no role has an explicit field entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDefaults {
    /// Field of a resource with no field entries at all.
    pub unconfigured: FieldTier,
    /// Unlisted field of a resource that has field entries.
    pub unlisted: FieldTier,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for FieldDefaults {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            unconfigured: config.unconfigured_field_tier,
            unlisted: config.unlisted_field_tier,
        }
    }
}

/// Where a field tier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSource {
    /// At least one of the roles has an explicit entry.
    Granted,
    /// The resource has no field entries.
    UnconfiguredDefault,
    /// The resource has field entries, none for this field and these roles.
    UnlistedDefault,
}

/// Aggregated tier for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldResolution {
    pub tier: FieldTier,
    pub source: TierSource,
}

/// One installed version of the permission data.
#[derive(Debug, Clone, Default)]
pub struct PermissionSnapshot {
    version: u64,
    screens: HashMap<RoleCode, HashSet<String>>,
    resources: HashMap<RoleCode, HashMap<String, HashSet<Operation>>>,
    fields: HashMap<RoleCode, HashMap<String, HashMap<String, FieldTier>>>,
    /// Resources that opted into field-level control.
    field_controlled: HashSet<String>,
    defaults: FieldDefaults,
}

impl PermissionSnapshot {
    /// Indexes a catalog. Every role code a grant names must be declared
    /// by the catalog or exist in the registry; inactive roles are kept and
    /// filtered at decision time.
    pub fn build(
        catalog: &PolicyCatalog,
        registry: &RoleRegistry,
        defaults: FieldDefaults,
    ) -> AppResult<Self> {
        let declared: HashSet<RoleCode> = catalog
            .roles
            .iter()
            .filter_map(|role| RoleCode::parse(&role.code).ok())
            .collect();
        let known = |raw: &str| -> AppResult<RoleCode> {
            let code = RoleCode::parse(raw)?;
            if !declared.contains(&code) && !registry.contains(&code) {
                return Err(AppError::validation(format!(
                    "Grant references unknown role '{code}'"
                )));
            }
            Ok(code)
        };

        let mut snapshot = Self {
            defaults,
            ..Self::default()
        };

        for grant in &catalog.screens {
            let code = known(&grant.role)?;
            snapshot
                .screens
                .entry(code)
                .or_default()
                .extend(grant.screens.iter().cloned());
        }

        for grant in &catalog.resources {
            let code = known(&grant.role)?;
            snapshot
                .resources
                .entry(code)
                .or_default()
                .entry(grant.resource.clone())
                .or_default()
                .extend(grant.operations.iter().copied());
        }

        for grant in &catalog.fields {
            let code = known(&grant.role)?;
            let tiers = snapshot
                .fields
                .entry(code.clone())
                .or_default()
                .entry(grant.resource.clone())
                .or_default();
            let tier = tiers.entry(grant.field.clone()).or_insert(grant.tier);
            if *tier != grant.tier {
                warn!(
                    role = %code,
                    resource = %grant.resource,
                    field = %grant.field,
                    "Duplicate field entry, keeping the higher tier"
                );
                *tier = (*tier).max(grant.tier);
            }
            snapshot.field_controlled.insert(grant.resource.clone());
        }

        debug!(
            roles_with_screens = snapshot.screens.len(),
            field_controlled = snapshot.field_controlled.len(),
            "Permission snapshot built"
        );
        Ok(snapshot)
    }

    /// Version assigned when the snapshot was installed.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Field defaults this snapshot applies.
    pub fn defaults(&self) -> FieldDefaults {
        self.defaults
    }

    /// Whether any of `roles` may enter `screen_id`.
    pub fn screen_allowed(&self, roles: &[RoleCode], screen_id: &str) -> bool {
        roles.iter().any(|role| {
            self.screens
                .get(role)
                .is_some_and(|screens| screens.contains(screen_id))
        })
    }

    /// Whether any of `roles` may perform `operation` on `resource`.
    pub fn resource_allowed(&self, roles: &[RoleCode], resource: &str, operation: Operation) -> bool {
        roles.iter().any(|role| {
            self.resources
                .get(role)
                .and_then(|resources| resources.get(resource))
                .is_some_and(|operations| operations.contains(&operation))
        })
    }

    /// Highest tier any of `roles` has on `resource.field`, or the default.
    pub fn field_tier(&self, roles: &[RoleCode], resource: &str, field: &str) -> FieldResolution {
        let granted = roles
            .iter()
            .filter_map(|role| {
                self.fields
                    .get(role)
                    .and_then(|resources| resources.get(resource))
                    .and_then(|fields| fields.get(field))
                    .copied()
            })
            .max();

        match granted {
            Some(tier) => FieldResolution {
                tier,
                source: TierSource::Granted,
            },
            None if self.field_controlled.contains(resource) => FieldResolution {
                tier: self.defaults.unlisted,
                source: TierSource::UnlistedDefault,
            },
            None => FieldResolution {
                tier: self.defaults.unconfigured,
                source: TierSource::UnconfiguredDefault,
            },
        }
    }

    /// Whether `resource` opted into field-level control.
    pub fn is_field_controlled(&self, resource: &str) -> bool {
        self.field_controlled.contains(resource)
    }
}
