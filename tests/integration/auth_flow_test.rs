//! Integration tests for login, logout and decision semantics.

mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Notify;

use tollgate_auth::session::{Credentials, IdentityProvider, MemorySessionStore};
use tollgate_auth::{AuthRuntime, Basis, DecisionQuery};
use tollgate_core::config::AppConfig;
use tollgate_core::error::ErrorKind;
use tollgate_core::result::AppResult;
use tollgate_core::traits::ManualClock;
use tollgate_core::types::{FieldTier, Operation};

use helpers::{PASSWORD, TestRuntime};

#[tokio::test]
async fn test_login_round_trip() {
    let app = TestRuntime::new();
    let surface = app.surface();

    let subject = surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    assert_eq!(subject.id.as_str(), "user-alice");

    assert!(!surface.is_loading());
    assert!(surface.is_authenticated());
    assert!(surface.has_screen_access("dashboard"));
    assert!(surface.has_screen_access("tasks"));
    assert!(app.has_persisted_session());
}

#[tokio::test]
async fn test_login_primes_screen_decisions() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();

    let misses = app.runtime.cache().stats().misses;
    assert!(surface.has_screen_access("dashboard"));
    assert!(!surface.has_screen_access("billing"));
    assert_eq!(app.runtime.cache().stats().misses, misses);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestRuntime::new();
    let surface = app.surface();

    let err = surface
        .login(&Credentials::new("alice", "nope"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert!(!surface.is_authenticated());
    assert!(!surface.is_loading());
    assert!(!app.has_persisted_session());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let app = TestRuntime::new();
    let surface = app.surface();
    let subject = surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    assert!(!app.runtime.cache().is_empty(&subject.id));

    surface.logout().unwrap();
    assert!(!surface.is_authenticated());
    assert!(surface.current_subject().is_none());
    assert!(!surface.has_screen_access("dashboard"));
    assert!(app.runtime.cache().is_empty(&subject.id));
    assert!(!app.has_persisted_session());
}

#[tokio::test]
async fn test_unresolvable_roles_fail_closed() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("ghost", PASSWORD))
        .await
        .unwrap();

    assert!(surface.is_authenticated());
    assert!(!surface.has_screen_access("dashboard"));
    assert!(!surface.has_resource_permission("tasks", Operation::Read));
    assert_eq!(surface.get_field_permission("deliveries", "address"), FieldTier::Hidden);
    assert_eq!(surface.get_field_permission("tasks", "title"), FieldTier::Hidden);
    assert_eq!(
        surface.decide(&DecisionQuery::screen("dashboard")).unwrap().basis(),
        Basis::RoleUnresolved
    );
}

#[tokio::test]
async fn test_most_permissive_aggregation() {
    let app = TestRuntime::new();
    let alice = app.surface();
    alice
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    let bob = app.surface();
    bob.login(&Credentials::new("bob", PASSWORD)).await.unwrap();

    assert!(!alice.has_resource_permission("tasks", Operation::Delete));
    assert!(bob.has_resource_permission("tasks", Operation::Delete));
    assert!(bob.has_resource_permission("tasks", Operation::Create));
    assert!(bob.has_any_resource_permission("tasks", &[Operation::Bulk, Operation::Update]));
    assert!(!alice.has_any_resource_permission("tasks", &[Operation::Bulk, Operation::Update]));

    assert_eq!(alice.get_field_permission("tasks", "budget"), FieldTier::Read);
    assert_eq!(bob.get_field_permission("tasks", "budget"), FieldTier::Edit);
    assert!(!alice.can_edit_field("tasks", "budget"));
    assert!(bob.can_edit_field("tasks", "budget"));
}

#[tokio::test]
async fn test_default_policy_split() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();

    // No field entries for deliveries at all.
    assert_eq!(surface.get_field_permission("deliveries", "address"), FieldTier::Edit);
    assert_eq!(surface.get_field_permission("deliveries", "anything"), FieldTier::Edit);
    // tasks has field entries, so unlisted fields are hidden.
    assert_eq!(surface.get_field_permission("tasks", "internal_notes"), FieldTier::Hidden);
    assert_eq!(surface.get_field_permission("tasks", "title"), FieldTier::Edit);
}

#[tokio::test]
async fn test_cached_allow_expires_with_session() {
    let app = TestRuntime::new();
    let surface = app.surface();
    let subject = surface
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    assert!(surface.has_screen_access("billing"));
    assert!(surface.can_edit_field("tasks", "budget"));

    app.clock.set(subject.expires_at);
    assert!(surface.has_screen_access("billing"), "skew grace still applies");

    app.clock.set(subject.valid_until + Duration::seconds(1));
    assert!(!surface.is_authenticated());
    assert!(!surface.has_screen_access("billing"));
    assert!(!surface.can_edit_field("tasks", "budget"));
    assert!(!surface.has_profile("MANAGER"));
}

#[tokio::test]
async fn test_unknown_operation_is_a_programmer_error() {
    let err = DecisionQuery::parse_resource("tasks", "ARCHIVE").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_missing_permission_data_reports_loading() {
    let app = TestRuntime::without_catalog();
    let surface = app.surface();
    surface.refresh(&app.token("carol", &["USER"])).unwrap();

    assert!(surface.is_authenticated());
    assert!(surface.is_loading());
    let err = surface.decide(&DecisionQuery::screen("dashboard")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreUnavailable);
    assert!(!surface.has_screen_access("dashboard"));

    app.runtime.admin().install_catalog(helpers::catalog()).unwrap();
    assert!(!surface.is_loading());
    assert!(surface.has_screen_access("dashboard"));
}

/// Identity provider that blocks until released.
#[derive(Debug)]
struct GatedProvider {
    token: String,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl IdentityProvider for GatedProvider {
    async fn authenticate(&self, _credentials: &Credentials) -> AppResult<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.token.clone())
    }
}

#[tokio::test]
async fn test_is_loading_while_login_in_flight() {
    let clock = Arc::new(ManualClock::starting_now());
    let issuer = tollgate_auth::TokenIssuer::new(&AppConfig::default().auth, clock.clone());
    let token = issuer
        .issue(&"dave".into(), "dave", None, &["USER"])
        .unwrap()
        .token;
    let provider = Arc::new(GatedProvider {
        token,
        entered: Notify::new(),
        release: Notify::new(),
    });
    let runtime = AuthRuntime::builder(AppConfig::default())
        .with_clock(clock)
        .with_session_store(Arc::new(MemorySessionStore::new()))
        .with_identity_provider(provider.clone())
        .with_catalog(helpers::catalog())
        .build()
        .unwrap();
    let surface = Arc::new(runtime.open_surface());

    let login = tokio::spawn({
        let surface = surface.clone();
        async move { surface.login(&Credentials::new("dave", "x")).await }
    });

    provider.entered.notified().await;
    assert!(surface.is_loading());
    assert!(!surface.is_authenticated());

    provider.release.notify_one();
    login.await.unwrap().unwrap();
    assert!(!surface.is_loading());
    assert!(surface.has_screen_access("dashboard"));
}
