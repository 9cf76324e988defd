//! Session lifecycle: subjects, persistence, identity providers, the
//! shared runtime, per-surface services and administration.

pub mod admin;
pub mod identity;
pub mod runtime;
pub mod service;
pub mod store;
pub mod subject;

pub use admin::PolicyAdmin;
pub use identity::{Credentials, IdentityProvider, LocalIdentityProvider};
pub use runtime::{AuthRuntime, AuthRuntimeBuilder};
pub use service::AuthService;
pub use store::{FileSessionStore, MemorySessionStore, session_store_from_config};
pub use subject::Subject;
