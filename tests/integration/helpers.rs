//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use tollgate_auth::rbac::LocalUser;
use tollgate_auth::session::MemorySessionStore;
use tollgate_auth::{AuthRuntime, AuthService, PasswordHasher, PolicyCatalog};
use tollgate_core::config::AppConfig;
use tollgate_core::traits::{ManualClock, SessionStore};
use tollgate_core::types::{FieldTier, Operation, SubjectId};

pub const PASSWORD: &str = "password123";

/// One Argon2 hash shared by every test user; hashing is slow.
pub fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| {
        PasswordHasher::new()
            .hash_password(PASSWORD)
            .expect("Failed to hash test password")
    })
    .clone()
}

pub fn user(username: &str, subject_id: &str, roles: &[&str]) -> LocalUser {
    LocalUser {
        username: username.to_string(),
        subject_id: subject_id.to_string(),
        display_name: Some(username.to_string()),
        password_hash: password_hash(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Roles ADMIN, MANAGER, USER; `MANAGER` alone may enter `billing`;
/// `tasks` has field-level control, `deliveries` does not.
pub fn catalog() -> PolicyCatalog {
    PolicyCatalog::new()
        .with_role("ADMIN", "Administrator", 0)
        .with_role("MANAGER", "Manager", 10)
        .with_role("USER", "User", 20)
        .with_screens("USER", &["dashboard", "tasks"])
        .with_screens("MANAGER", &["dashboard", "tasks", "billing"])
        .with_screens("ADMIN", &["dashboard", "tasks", "billing", "admin"])
        .with_resource("USER", "tasks", &[Operation::Read, Operation::Create])
        .with_resource("MANAGER", "tasks", &[Operation::Read, Operation::Update, Operation::Delete])
        .with_resource("USER", "deliveries", &[Operation::Read])
        .with_field("USER", "tasks", "title", FieldTier::Edit)
        .with_field("USER", "tasks", "budget", FieldTier::Read)
        .with_field("MANAGER", "tasks", "budget", FieldTier::Edit)
        .with_user(user("alice", "user-alice", &["USER"]))
        .with_user(user("bob", "user-bob", &["USER", "MANAGER"]))
        .with_user(user("ghost", "user-ghost", &["RETIRED"]))
}

/// An isolated runtime with a manual clock and in-memory session storage.
pub struct TestRuntime {
    pub clock: Arc<ManualClock>,
    pub sessions: Arc<MemorySessionStore>,
    pub runtime: Arc<AuthRuntime>,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self::build(AppConfig::default(), Some(catalog()))
    }

    pub fn without_catalog() -> Self {
        Self::build(AppConfig::default(), None)
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, Some(catalog()))
    }

    fn build(config: AppConfig, catalog: Option<PolicyCatalog>) -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let sessions = Arc::new(MemorySessionStore::new());
        let mut builder = AuthRuntime::builder(config)
            .with_clock(clock.clone())
            .with_session_store(sessions.clone());
        if let Some(catalog) = catalog {
            builder = builder.with_catalog(catalog);
        }
        let runtime = builder.build().expect("Failed to build runtime");
        Self {
            clock,
            sessions,
            runtime,
        }
    }

    pub fn surface(&self) -> AuthService {
        self.runtime.open_surface()
    }

    /// A token signed with the runtime's key.
    pub fn token(&self, subject: &str, roles: &[&str]) -> String {
        self.runtime
            .issuer()
            .issue(&SubjectId::from(subject), subject, None, roles)
            .expect("Failed to issue token")
            .token
    }

    pub fn has_persisted_session(&self) -> bool {
        self.sessions
            .load()
            .expect("Failed to load session")
            .as_complete()
            .is_some()
    }
}
