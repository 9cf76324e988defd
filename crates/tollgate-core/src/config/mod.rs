//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file overlaid with `TOLLGATE__*` environment
//! variables. Every section has defaults, so an empty source is valid.

pub mod auth;
pub mod cache;
pub mod logging;
pub mod policy;
pub mod realtime;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::cache::CacheConfig;
pub use self::logging::LoggingConfig;
pub use self::policy::PolicyConfig;
pub use self::realtime::RealtimeConfig;
pub use self::session::{SessionConfig, SessionStoreKind};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Decision cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Permission catalog and default policy settings.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Session bus settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Session persistence settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Reads `path` when given (a missing file is an error), then applies
    /// environment variables prefixed with `TOLLGATE__`, e.g.
    /// `TOLLGATE__AUTH__CLOCK_SKEW_SECONDS=10`.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("TOLLGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
