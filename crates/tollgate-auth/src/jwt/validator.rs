//! Session token verification.
//!
//! Verification is a pure function of the token, the trusted key and the
//! clock: it never touches persisted session state. Integrity is always
//! checked; a token that fails it is rejected exactly like a missing one.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use tollgate_core::config::AuthConfig;
use tollgate_core::traits::Clock;
use tollgate_core::types::{RoleCode, SubjectId};

use super::claims::SessionClaims;

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidReason {
    /// Not a structurally valid token, or required claims are missing.
    #[serde(rename = "TOKEN_MALFORMED")]
    Malformed,
    /// Signature, issuer, audience or algorithm check failed.
    #[serde(rename = "TOKEN_UNTRUSTED")]
    Untrusted,
    /// Integrity is fine but the session is over.
    #[serde(rename = "TOKEN_EXPIRED")]
    Expired,
}

impl InvalidReason {
    /// Return the reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "TOKEN_MALFORMED",
            Self::Untrusted => "TOKEN_UNTRUSTED",
            Self::Expired => "TOKEN_EXPIRED",
        }
    }

    /// Whether re-authenticating could fix it (as opposed to rejecting).
    pub fn should_reauthenticate(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a verified token establishes about its subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedSession {
    /// Subject identifier.
    pub subject_id: SubjectId,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Normalized role codes, non-empty.
    pub role_codes: Vec<RoleCode>,
    /// When the token was issued.
    pub issued_at: Option<DateTime<Utc>>,
    /// Expiry as issued.
    pub expires_at: DateTime<Utc>,
    /// Expiry plus the clock-skew grace window; decisions stop at this
    /// instant.
    pub valid_until: DateTime<Utc>,
    /// Token ID, when present.
    pub token_id: Option<Uuid>,
}

/// Outcome of [`SessionValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The token is trusted and current.
    Valid(ValidatedSession),
    /// The token must not be used.
    Invalid(InvalidReason),
}

impl ValidationOutcome {
    /// Whether the token is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(reason) => Some(*reason),
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<ValidatedSession, InvalidReason> {
        match self {
            Self::Valid(session) => Ok(session),
            Self::Invalid(reason) => Err(reason),
        }
    }
}

/// Verifies HS256 session tokens against a trusted key.
#[derive(Clone)]
pub struct SessionValidator {
    /// HMAC key for verification.
    decoding_key: DecodingKey,
    /// Signature, algorithm, issuer and audience checks.
    validation: Validation,
    /// Grace window applied to expiry.
    clock_skew: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionValidator")
            .field("validation", &self.validation)
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}

impl SessionValidator {
    /// Creates a validator from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[config.issuer.as_str()]);
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        let skew_seconds = i64::try_from(config.clock_skew_seconds).unwrap_or(i64::MAX);
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            clock_skew: Duration::try_seconds(skew_seconds).unwrap_or(Duration::zero()),
            clock,
        }
    }

    /// The configured clock-skew grace window.
    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Verifies a token and extracts the session it establishes.
    pub fn validate(&self, token: &str) -> ValidationOutcome {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(reason) => return ValidationOutcome::Invalid(reason),
        };

        let Some(expires_at) = claims.expires_at() else {
            warn!("Token expiry is out of range");
            return ValidationOutcome::Invalid(InvalidReason::Malformed);
        };
        let valid_until = expires_at
            .checked_add_signed(self.clock_skew)
            .unwrap_or(expires_at);
        if self.clock.now() >= valid_until {
            debug!(subject_id = %claims.sub, %expires_at, "Token has expired");
            return ValidationOutcome::Invalid(InvalidReason::Expired);
        }

        if claims.sub.trim().is_empty() {
            warn!("Token has an empty subject");
            return ValidationOutcome::Invalid(InvalidReason::Malformed);
        }

        let role_codes = claims.role_codes();
        if role_codes.is_empty() {
            warn!(subject_id = %claims.sub, "Token carries no usable role codes");
            return ValidationOutcome::Invalid(InvalidReason::Malformed);
        }

        let username = if claims.username.is_empty() {
            claims.sub.clone()
        } else {
            claims.username.clone()
        };
        let display_name = claims.name.clone().unwrap_or_else(|| username.clone());

        ValidationOutcome::Valid(ValidatedSession {
            subject_id: claims.subject_id(),
            username,
            display_name,
            role_codes,
            issued_at: claims.issued_at(),
            expires_at,
            valid_until,
            token_id: claims.jti,
        })
    }

    /// Signature and claim-shape checks, without expiry.
    fn decode_claims(&self, token: &str) -> Result<SessionClaims, InvalidReason> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    JwtErrorKind::InvalidSignature
                    | JwtErrorKind::InvalidIssuer
                    | JwtErrorKind::InvalidAudience
                    | JwtErrorKind::InvalidAlgorithm
                    | JwtErrorKind::ImmatureSignature => InvalidReason::Untrusted,
                    _ => InvalidReason::Malformed,
                };
                warn!(reason = %reason, error = %e, "Rejected session token");
                reason
            })
    }
}
