//! Persisted session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::SubjectId;
use super::role::RoleCode;

/// Serializable summary of the logged-in subject, stored next to the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    /// Subject identifier (must match the token's `sub`).
    pub subject_id: SubjectId,
    /// Login name.
    pub username: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Role codes at the time the summary was written.
    pub role_codes: Vec<RoleCode>,
    /// Session expiry as issued.
    pub expires_at: DateTime<Utc>,
}

/// What a session store holds: a token and a subject summary.
///
/// Both halves are optional so that partial state can be represented and
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// The bearer token.
    pub token: Option<String>,
    /// The subject summary.
    pub subject: Option<SubjectSummary>,
}

impl PersistedSession {
    /// Build a complete persisted session.
    pub fn complete(token: impl Into<String>, subject: SubjectSummary) -> Self {
        Self {
            token: Some(token.into()),
            subject: Some(subject),
        }
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.subject.is_none()
    }

    /// Whether exactly one of the two halves is stored.
    pub fn is_partial(&self) -> bool {
        self.token.is_some() != self.subject.is_some()
    }

    /// Return both halves if and only if both are present.
    pub fn as_complete(&self) -> Option<(&str, &SubjectSummary)> {
        match (&self.token, &self.subject) {
            (Some(token), Some(subject)) => Some((token.as_str(), subject)),
            _ => None,
        }
    }
}
