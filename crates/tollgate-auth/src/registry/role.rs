//! Role (profile) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::types::RoleCode;

/// A role known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable identifier, immutable after creation.
    pub code: RoleCode,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Rank; lower is more privileged. Only used for ordering.
    pub level: i32,
    /// Inactive roles are ignored by every decision.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for [`RoleRegistry::create`](super::RoleRegistry::create).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    pub code: RoleCode,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl NewRole {
    /// An active role with no description.
    pub fn new(code: RoleCode, name: impl Into<String>, level: i32) -> Self {
        Self {
            code,
            name: name.into(),
            description: None,
            level,
            active: true,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Mutable attributes of a role. `None` leaves a field unchanged; the code
/// cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub level: Option<i32>,
}
