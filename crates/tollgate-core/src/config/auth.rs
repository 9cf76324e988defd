//! Token verification configuration.

use serde::{Deserialize, Serialize};

/// Token verification and development-issuer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC-SHA256 key used to verify (and, for the development
    /// issuer, sign) tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Expected `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Expected `aud` claim. Audience is not checked when unset.
    #[serde(default)]
    pub audience: Option<String>,
    /// Grace window applied to expiry comparisons, in seconds.
    #[serde(default = "default_clock_skew")]
    pub clock_skew_seconds: u64,
    /// Lifetime of tokens minted by the development issuer, in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            issuer: default_issuer(),
            audience: None,
            clock_skew_seconds: default_clock_skew(),
            token_ttl_minutes: default_token_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "tollgate".to_string()
}

fn default_clock_skew() -> u64 {
    30
}

fn default_token_ttl() -> u64 {
    60
}
