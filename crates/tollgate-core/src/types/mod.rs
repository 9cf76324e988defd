//! Shared domain types: identifiers, role codes, permission values and
//! persisted session state.

pub mod id;
pub mod permission;
pub mod role;
pub mod session;

pub use id::{EventId, SubjectId, SurfaceId};
pub use permission::{FieldTier, Operation};
pub use role::RoleCode;
pub use session::{PersistedSession, SubjectSummary};
