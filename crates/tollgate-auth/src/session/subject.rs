//! The authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tollgate_core::types::{RoleCode, SubjectId, SubjectSummary};

use crate::jwt::ValidatedSession;

/// An authenticated subject as seen by one surface.
///
/// Everything except `role_codes` is fixed for the lifetime of the
/// session; role codes change when an administrator reassigns roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject identifier.
    pub id: SubjectId,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Assigned role codes, sorted and deduplicated. May include codes the
    /// registry does not know or has deactivated.
    pub role_codes: Vec<RoleCode>,
    /// Session expiry as issued.
    pub expires_at: DateTime<Utc>,
    /// Instant from which every decision is a denial.
    pub valid_until: DateTime<Utc>,
    /// Token ID of the session, when present.
    pub token_id: Option<Uuid>,
}

impl Subject {
    /// Whether the session is still usable at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until
    }

    /// Whether `code` is among the assigned role codes.
    pub fn has_role(&self, code: &RoleCode) -> bool {
        self.role_codes.binary_search(code).is_ok()
    }

    /// Replace the assigned role codes.
    pub fn set_role_codes(&mut self, mut codes: Vec<RoleCode>) {
        codes.sort();
        codes.dedup();
        self.role_codes = codes;
    }

    /// The summary persisted next to the token.
    pub fn summary(&self) -> SubjectSummary {
        SubjectSummary {
            subject_id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role_codes: self.role_codes.clone(),
            expires_at: self.expires_at,
        }
    }
}

impl From<ValidatedSession> for Subject {
    fn from(session: ValidatedSession) -> Self {
        let mut subject = Self {
            id: session.subject_id,
            username: session.username,
            display_name: session.display_name,
            role_codes: Vec::new(),
            expires_at: session.expires_at,
            valid_until: session.valid_until,
            token_id: session.token_id,
        };
        subject.set_role_codes(session.role_codes);
        subject
    }
}
