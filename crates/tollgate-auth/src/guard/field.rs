//! Field rendering guard.

use serde::{Deserialize, Serialize};

use tollgate_core::types::FieldTier;

use crate::session::AuthService;

/// How a form field renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRendering {
    /// Not rendered; no label either.
    Omit,
    /// Rendered, disabled.
    ReadOnly,
    /// Rendered, interactive.
    Editable,
}

impl FieldRendering {
    pub fn shows_label(&self) -> bool {
        !matches!(self, Self::Omit)
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Editable)
    }
}

impl From<FieldTier> for FieldRendering {
    fn from(tier: FieldTier) -> Self {
        match tier {
            FieldTier::Hidden => Self::Omit,
            FieldTier::Read => Self::ReadOnly,
            FieldTier::Edit => Self::Editable,
        }
    }
}

/// Guards field rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldGuard;

impl FieldGuard {
    pub fn rendering(service: &AuthService, resource: &str, field: &str) -> FieldRendering {
        service.get_field_permission(resource, field).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_map_to_rendering() {
        assert_eq!(FieldRendering::from(FieldTier::Hidden), FieldRendering::Omit);
        assert!(!FieldRendering::Omit.shows_label());

        let read = FieldRendering::from(FieldTier::Read);
        assert!(read.shows_label());
        assert!(!read.is_interactive());

        assert!(FieldRendering::from(FieldTier::Edit).is_interactive());
    }
}
