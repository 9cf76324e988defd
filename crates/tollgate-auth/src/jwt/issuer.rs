//! HS256 token minting for the development identity provider and tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use tollgate_core::config::AuthConfig;
use tollgate_core::error::AppError;
use tollgate_core::traits::Clock;
use tollgate_core::types::SubjectId;

use super::claims::SessionClaims;

/// A freshly minted token.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedToken {
    /// The encoded token.
    pub token: String,
    /// Token expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Creates signed session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    issuer: String,
    audience: Option<String>,
    /// Token lifetime.
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates an issuer from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl_minutes = i64::try_from(config.token_ttl_minutes).unwrap_or(i64::MAX);
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::try_minutes(ttl_minutes).unwrap_or(Duration::days(1)),
            clock,
        }
    }

    /// Override the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Mints a token for `subject` carrying `roles`.
    pub fn issue(
        &self,
        subject: &SubjectId,
        username: &str,
        display_name: Option<&str>,
        roles: &[&str],
    ) -> Result<IssuedToken, AppError> {
        let now = self.clock.now();
        let expires_at = now + self.ttl;

        let claims = SessionClaims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            aud: self.audience.clone(),
            username: username.to_string(),
            name: display_name.map(str::to_string),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Some(Uuid::new_v4()),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
