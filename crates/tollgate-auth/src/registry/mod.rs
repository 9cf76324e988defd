//! Role (profile) catalog and subject assignments.

pub mod role;
pub mod role_registry;

pub use role::{NewRole, Role, RoleUpdate};
pub use role_registry::RoleRegistry;
