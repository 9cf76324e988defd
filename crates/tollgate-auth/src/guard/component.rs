//! Component visibility guard.

use serde::{Deserialize, Serialize};

use tollgate_core::types::Operation;

use crate::session::AuthService;

/// What a component needs in order to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// Any authenticated subject.
    Authenticated,
    /// This role.
    Profile { code: String },
    /// At least one of these roles.
    AnyProfile { codes: Vec<String> },
    /// All of these roles.
    AllProfiles { codes: Vec<String> },
    /// Access to this screen.
    Screen { screen_id: String },
    /// This operation on this resource.
    Resource {
        resource: String,
        operation: Operation,
    },
    /// At least one of these operations on this resource.
    AnyResource {
        resource: String,
        operations: Vec<Operation>,
    },
}

/// Shows or hides components.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentGuard;

impl ComponentGuard {
    /// Whether a component with `requirement` is visible.
    pub fn is_visible(service: &AuthService, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::Authenticated => service.is_authenticated(),
            Requirement::Profile { code } => service.has_profile(code),
            Requirement::AnyProfile { codes } => service.has_any_profile(&as_strs(codes)),
            Requirement::AllProfiles { codes } => service.has_all_profiles(&as_strs(codes)),
            Requirement::Screen { screen_id } => service.has_screen_access(screen_id),
            Requirement::Resource {
                resource,
                operation,
            } => service.has_resource_permission(resource, *operation),
            Requirement::AnyResource {
                resource,
                operations,
            } => service.has_any_resource_permission(resource, operations),
        }
    }
}

fn as_strs(codes: &[String]) -> Vec<&str> {
    codes.iter().map(String::as_str).collect()
}
