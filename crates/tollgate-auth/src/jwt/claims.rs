//! Claims carried by a session token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tollgate_core::types::{RoleCode, SubjectId};

/// JWT claims payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issuer.
    pub iss: String,
    /// Subject: the opaque subject identifier.
    pub sub: String,
    /// Audience, when the issuer sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Role codes as issued, not yet normalized.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
}

impl SessionClaims {
    /// Returns the subject identifier.
    pub fn subject_id(&self) -> SubjectId {
        SubjectId::new(self.sub.clone())
    }

    /// Returns the expiration as a `DateTime<Utc>`, `None` if out of range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued-at time, `None` if out of range.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Role codes that parse; malformed codes are dropped.
    pub fn role_codes(&self) -> Vec<RoleCode> {
        let mut codes: Vec<RoleCode> = self
            .roles
            .iter()
            .filter_map(|raw| RoleCode::parse(raw).ok())
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }
}
