//! Decision results.

use serde::{Deserialize, Serialize};

use tollgate_core::types::FieldTier;

use crate::rbac::TierSource;

use super::query::DecisionQuery;

/// Why a verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Basis {
    /// An active role grants it.
    Grant,
    /// No active role grants it.
    NoGrant,
    /// Field default for resources without field entries.
    UnconfiguredDefault,
    /// Field default for unlisted fields of field-controlled resources.
    UnlistedDefault,
    /// None of the subject's roles is known and active.
    RoleUnresolved,
    /// The session expired.
    SessionExpired,
}

impl From<TierSource> for Basis {
    fn from(source: TierSource) -> Self {
        match source {
            TierSource::Granted => Self::Grant,
            TierSource::UnconfiguredDefault => Self::UnconfiguredDefault,
            TierSource::UnlistedDefault => Self::UnlistedDefault,
        }
    }
}

/// Answer to a [`DecisionQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Screen or resource query.
    Access { granted: bool, basis: Basis },
    /// Field query.
    Field { tier: FieldTier, basis: Basis },
}

impl Verdict {
    /// The most restrictive answer to `query`.
    pub fn deny(query: &DecisionQuery, basis: Basis) -> Self {
        if query.is_field() {
            Self::Field {
                tier: FieldTier::Hidden,
                basis,
            }
        } else {
            Self::Access {
                granted: false,
                basis,
            }
        }
    }

    /// Whether access is granted; for fields, whether the field is visible.
    pub fn is_allowed(&self) -> bool {
        match self {
            Self::Access { granted, .. } => *granted,
            Self::Field { tier, .. } => tier.is_visible(),
        }
    }

    /// The field tier, `HIDDEN` for access verdicts.
    pub fn tier(&self) -> FieldTier {
        match self {
            Self::Field { tier, .. } => *tier,
            Self::Access { .. } => FieldTier::Hidden,
        }
    }

    pub fn basis(&self) -> Basis {
        match self {
            Self::Access { basis, .. } | Self::Field { basis, .. } => *basis,
        }
    }
}
