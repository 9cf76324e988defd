//! Permission catalog and default policy configuration.

use serde::{Deserialize, Serialize};

use crate::types::FieldTier;

/// Permission catalog location and field default policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Path to the policy catalog (TOML, JSON or YAML).
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Tier for fields of a resource that has no field entries at all.
    #[serde(default = "default_unconfigured_tier")]
    pub unconfigured_field_tier: FieldTier,
    /// Tier for unlisted fields of a resource that has field entries.
    #[serde(default = "default_unlisted_tier")]
    pub unlisted_field_tier: FieldTier,
    /// Screen a route guard redirects to when a screen is denied.
    #[serde(default = "default_fallback_screen")]
    pub fallback_screen: Option<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            unconfigured_field_tier: default_unconfigured_tier(),
            unlisted_field_tier: default_unlisted_tier(),
            fallback_screen: default_fallback_screen(),
        }
    }
}

fn default_unconfigured_tier() -> FieldTier {
    FieldTier::Edit
}

fn default_unlisted_tier() -> FieldTier {
    FieldTier::Hidden
}

fn default_fallback_screen() -> Option<String> {
    Some("dashboard".to_string())
}
