//! Permission data: the policy catalog document, its indexed snapshot and
//! the copy-on-write store decisions read from.

pub mod catalog;
pub mod snapshot;
pub mod store;

pub use catalog::{
    FieldGrant, LocalUser, PolicyCatalog, ResourceGrant, RoleDefinition, ScreenGrant,
};
pub use snapshot::{FieldDefaults, FieldResolution, PermissionSnapshot, TierSource};
pub use store::PermissionStore;
