//! Session signal payloads.

use serde::{Deserialize, Serialize};

use crate::types::{RoleCode, SubjectId};

/// Changes that invalidate cached decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionSignal {
    /// A subject logged in and the persisted session was replaced.
    LoggedIn {
        /// The subject.
        subject_id: SubjectId,
    },
    /// A subject logged out and the persisted session was cleared.
    LoggedOut {
        /// The subject.
        subject_id: SubjectId,
    },
    /// The persisted token was replaced by a newer one.
    TokenRefreshed {
        /// The subject.
        subject_id: SubjectId,
    },
    /// An administrator changed a subject's role assignment.
    RolesChanged {
        /// The subject.
        subject_id: SubjectId,
        /// The complete new role set.
        role_codes: Vec<RoleCode>,
    },
    /// The role registry or permission catalog changed for everyone.
    PolicyReloaded {
        /// Version of the permission snapshot now installed.
        version: u64,
    },
}

impl SessionSignal {
    /// The subject this signal concerns, `None` for global signals.
    pub fn subject_id(&self) -> Option<&SubjectId> {
        match self {
            Self::LoggedIn { subject_id }
            | Self::LoggedOut { subject_id }
            | Self::TokenRefreshed { subject_id }
            | Self::RolesChanged { subject_id, .. } => Some(subject_id),
            Self::PolicyReloaded { .. } => None,
        }
    }
}
