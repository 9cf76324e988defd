//! Identity providers: where login credentials turn into a token.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::types::SubjectId;

use crate::jwt::TokenIssuer;
use crate::password::PasswordHasher;
use crate::rbac::LocalUser;
use crate::registry::RoleRegistry;

/// Login credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Exchanges credentials for a signed session token.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Returns a bearer token, or an `Authentication` error.
    async fn authenticate(&self, credentials: &Credentials) -> AppResult<String>;
}

/// Development identity provider backed by the users of the policy
/// catalog.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    users: RwLock<HashMap<String, LocalUser>>,
    hasher: PasswordHasher,
    issuer: Arc<TokenIssuer>,
    registry: Arc<RoleRegistry>,
}

impl LocalIdentityProvider {
    /// Creates a provider that issues tokens with `issuer`. Role claims
    /// come from `registry` assignments when the user has a record there,
    /// and from the catalog entry otherwise.
    pub fn new(issuer: Arc<TokenIssuer>, registry: Arc<RoleRegistry>, users: Vec<LocalUser>) -> Self {
        let provider = Self {
            users: RwLock::new(HashMap::new()),
            hasher: PasswordHasher::new(),
            issuer,
            registry,
        };
        provider.replace_users(users);
        provider
    }

    /// Replaces the known users.
    pub fn replace_users(&self, users: Vec<LocalUser>) {
        let users: HashMap<String, LocalUser> = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();
        info!(count = users.len(), "Local users loaded");
        *self.users.write() = users;
    }

    fn invalid() -> AppError {
        AppError::authentication("Invalid username or password")
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn authenticate(&self, credentials: &Credentials) -> AppResult<String> {
        let user = self
            .users
            .read()
            .get(&credentials.username)
            .cloned()
            .ok_or_else(|| {
                warn!(username = %credentials.username, "Login for unknown user");
                Self::invalid()
            })?;

        if !self
            .hasher
            .verify_password(&credentials.password, &user.password_hash)?
        {
            warn!(username = %user.username, "Login with wrong password");
            return Err(Self::invalid());
        }

        let subject_id = SubjectId::new(user.subject_id.clone());
        let roles: Vec<String> = match self.registry.assignment(&subject_id) {
            Some(codes) if codes.is_empty() => {
                warn!(username = %user.username, "Login for a subject without roles");
                return Err(AppError::authentication("No roles assigned"));
            }
            Some(codes) => codes.iter().map(ToString::to_string).collect(),
            None => user.roles.clone(),
        };
        let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
        let issued = self.issuer.issue(
            &subject_id,
            &user.username,
            user.display_name.as_deref(),
            &roles,
        )?;
        Ok(issued.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::config::AuthConfig;
    use tollgate_core::error::ErrorKind;
    use tollgate_core::traits::ManualClock;
    use tollgate_core::types::RoleCode;

    use crate::jwt::SessionValidator;
    use crate::registry::NewRole;

    fn code(raw: &str) -> RoleCode {
        RoleCode::parse(raw).unwrap()
    }

    fn provider() -> LocalIdentityProvider {
        provider_with(Arc::new(RoleRegistry::new(Arc::new(ManualClock::starting_now()))))
    }

    fn provider_with(registry: Arc<RoleRegistry>) -> LocalIdentityProvider {
        let hash = PasswordHasher::new().hash_password("s3cret").unwrap();
        let issuer = TokenIssuer::new(&AuthConfig::default(), Arc::new(ManualClock::starting_now()));
        LocalIdentityProvider::new(
            Arc::new(issuer),
            registry,
            vec![LocalUser {
                username: "alice".into(),
                subject_id: "user-1".into(),
                display_name: Some("Alice".into()),
                password_hash: hash,
                roles: vec!["USER".into()],
            }],
        )
    }

    #[tokio::test]
    async fn test_authenticate() {
        let token = provider()
            .authenticate(&Credentials::new("alice", "s3cret"))
            .await
            .unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_alike() {
        let provider = provider();
        let unknown = provider
            .authenticate(&Credentials::new("mallory", "s3cret"))
            .await
            .unwrap_err();
        let wrong = provider
            .authenticate(&Credentials::new("alice", "guess"))
            .await
            .unwrap_err();
        assert_eq!(unknown.kind, ErrorKind::Authentication);
        assert_eq!(unknown.message, wrong.message);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("alice", "s3cret"));
        assert!(!debug.contains("s3cret"));
    }

    #[tokio::test]
    async fn test_registry_assignment_overrides_catalog_roles() {
        let clock = Arc::new(ManualClock::starting_now());
        let registry = Arc::new(RoleRegistry::new(clock.clone()));
        for raw in ["USER", "MANAGER"] {
            registry.create(NewRole::new(code(raw), raw, 10)).unwrap();
        }
        let alice = SubjectId::from("user-1");
        registry.set_assignments(&alice, &[code("MANAGER")]).unwrap();
        let provider = provider_with(registry.clone());

        let token = provider
            .authenticate(&Credentials::new("alice", "s3cret"))
            .await
            .unwrap();
        let session = SessionValidator::new(&AuthConfig::default(), clock)
            .validate(&token)
            .into_result()
            .unwrap();
        assert_eq!(session.role_codes, vec![code("MANAGER")]);

        registry.set_assignments(&alice, &[]).unwrap();
        let err = provider
            .authenticate(&Credentials::new("alice", "s3cret"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
