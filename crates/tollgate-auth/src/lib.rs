//! # tollgate-auth
//!
//! Session validation and authorization decisions.
//!
//! ## Modules
//!
//! - `jwt` — session token verification, plus token minting for the
//!   development identity provider
//! - `password` — Argon2id password hashing
//! - `registry` — role (profile) catalog and subject assignments
//! - `rbac` — policy catalog, permission snapshots and the copy-on-write
//!   permission store
//! - `engine` — decision queries, verdicts and the decision engine
//! - `session` — runtime, per-surface service, persistence, identity
//!   providers and administration
//! - `guard` — route, component and field guard contract

pub mod engine;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod registry;
pub mod session;

pub use engine::{Basis, DecisionEngine, DecisionQuery, Verdict, VerdictCache};
pub use guard::{ComponentGuard, FieldGuard, FieldRendering, Requirement, RouteGuard, RouteOutcome};
pub use jwt::{InvalidReason, SessionValidator, TokenIssuer, ValidationOutcome};
pub use password::PasswordHasher;
pub use rbac::{PermissionSnapshot, PermissionStore, PolicyCatalog};
pub use registry::{NewRole, Role, RoleRegistry, RoleUpdate};
pub use session::{
    AuthRuntime, AuthService, Credentials, IdentityProvider, PolicyAdmin, Subject,
};
