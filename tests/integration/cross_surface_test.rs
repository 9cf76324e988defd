//! Integration tests for coherency between surfaces sharing a runtime.

mod helpers;

use tollgate_auth::DecisionQuery;
use tollgate_auth::session::Credentials;
use tollgate_core::config::AppConfig;
use tollgate_core::types::{Operation, RoleCode, SubjectId};

use helpers::{PASSWORD, TestRuntime};

fn code(raw: &str) -> RoleCode {
    RoleCode::parse(raw).unwrap()
}

#[tokio::test]
async fn test_logout_reaches_other_surface() {
    let app = TestRuntime::new();
    let first = app.surface();
    let second = app.surface();

    first
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    assert!(second.has_screen_access("billing"));

    first.logout().unwrap();

    let verdict = second.decide(&DecisionQuery::screen("billing"));
    assert!(verdict.is_err() || !verdict.unwrap().is_allowed());
    assert!(!second.has_screen_access("billing"));
    assert!(!second.is_authenticated());
}

#[tokio::test]
async fn test_login_reaches_other_surface() {
    let app = TestRuntime::new();
    let first = app.surface();
    let second = app.surface();
    assert!(!second.is_authenticated());

    let subject = first
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();

    assert!(second.is_authenticated());
    assert_eq!(second.current_subject().map(|s| s.id), Some(subject.id));
}

#[tokio::test]
async fn test_surface_ignores_its_own_signals() {
    let app = TestRuntime::new();
    let first = app.surface();
    let second = app.surface();
    first
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();

    assert_eq!(first.sync(), 0);
    assert_eq!(second.sync(), 1);
    assert_eq!(second.sync(), 0);
}

#[tokio::test]
async fn test_role_assignment_scenario() {
    let app = TestRuntime::new();
    let first = app.surface();
    let second = app.surface();
    first
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    second.restore().unwrap();

    assert!(!first.has_screen_access("billing"));
    assert!(!second.has_screen_access("billing"));

    app.runtime
        .admin()
        .reassign_roles(&SubjectId::from("user-alice"), &[code("USER"), code("MANAGER")])
        .unwrap();

    assert!(first.has_screen_access("billing"));
    assert!(second.has_screen_access("billing"));
    assert!(second.has_all_profiles(&["USER", "MANAGER"]));

    app.runtime
        .admin()
        .reassign_roles(&SubjectId::from("user-alice"), &[code("USER")])
        .unwrap();
    assert!(!first.has_screen_access("billing"));
    assert!(!second.has_screen_access("billing"));
}

#[tokio::test]
async fn test_reassignment_does_not_touch_other_subjects() {
    let app = TestRuntime::new();
    let alice = app.surface();
    alice
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    let bob = app.surface();
    bob.refresh(&app.token("user-bob", &["USER", "MANAGER"])).unwrap();
    assert_eq!(
        bob.current_subject().map(|s| s.id),
        Some(SubjectId::from("user-bob"))
    );
    assert!(bob.has_screen_access("billing"));

    app.runtime
        .admin()
        .reassign_roles(&SubjectId::from("user-alice"), &[code("ADMIN")])
        .unwrap();
    assert!(bob.has_screen_access("billing"));
    assert!(!bob.has_screen_access("admin"));
}

#[tokio::test]
async fn test_surfaces_share_cached_decisions() {
    let app = TestRuntime::new();
    let first = app.surface();
    let second = app.surface();
    first
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    second.sync();

    assert!(first.has_resource_permission("tasks", Operation::Read));
    let hits = app.runtime.cache().stats().hits;
    assert!(second.has_resource_permission("tasks", Operation::Read));
    assert_eq!(app.runtime.cache().stats().hits, hits + 1);
}

#[tokio::test]
async fn test_lagged_surface_rehydrates() {
    let mut config = AppConfig::default();
    config.realtime.bus_capacity = 1;
    let app = TestRuntime::with_config(config);
    let first = app.surface();
    let second = app.surface();

    first
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    assert_eq!(second.sync(), 1);
    assert!(second.is_authenticated());

    first.logout().unwrap();
    for _ in 0..3 {
        app.runtime.admin().deactivate_role(&code("ADMIN")).unwrap();
    }

    assert!(!second.is_authenticated());
    assert!(!second.has_screen_access("dashboard"));
}

#[tokio::test]
async fn test_policy_change_reaches_every_surface() {
    let app = TestRuntime::new();
    let first = app.surface();
    let second = app.surface();
    first
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    second.restore().unwrap();
    assert!(second.has_screen_access("billing"));

    app.runtime.admin().deactivate_role(&code("MANAGER")).unwrap();
    assert!(!first.has_screen_access("billing"));
    assert!(!second.has_screen_access("billing"));
    assert!(second.has_screen_access("dashboard"));
}

#[tokio::test]
async fn test_revoked_role_stays_revoked_after_reload() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    assert!(surface.has_screen_access("billing"));

    app.runtime
        .admin()
        .reassign_roles(&SubjectId::from("user-bob"), &[code("USER")])
        .unwrap();
    assert!(!surface.has_screen_access("billing"));

    let restored = surface.restore().unwrap().unwrap();
    assert_eq!(restored.role_codes, vec![code("USER")]);
    assert!(!surface.has_screen_access("billing"));

    let reloaded = app.surface();
    reloaded.restore().unwrap();
    assert!(reloaded.is_authenticated());
    assert!(!reloaded.has_screen_access("billing"));
}

#[tokio::test]
async fn test_revoked_role_stays_revoked_after_refresh_elsewhere() {
    let app = TestRuntime::new();
    let first = app.surface();
    let second = app.surface();
    first
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    second.sync();
    assert!(second.has_screen_access("billing"));

    app.runtime
        .admin()
        .reassign_roles(&SubjectId::from("user-bob"), &[code("USER")])
        .unwrap();

    // The identity provider may still hand out the old claims.
    second
        .refresh(&app.token("user-bob", &["USER", "MANAGER"]))
        .unwrap();
    assert!(!second.has_screen_access("billing"));
    assert!(!first.has_screen_access("billing"));
    assert!(first.is_authenticated());

    let fresh = app.surface();
    let subject = fresh
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    assert_eq!(subject.role_codes, vec![code("USER")]);
    assert!(!fresh.has_screen_access("billing"));
}

#[tokio::test]
async fn test_login_refused_after_every_role_is_revoked() {
    let app = TestRuntime::new();
    app.runtime
        .admin()
        .reassign_roles(&SubjectId::from("user-alice"), &[])
        .unwrap();

    let err = app
        .surface()
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(err.kind, tollgate_core::error::ErrorKind::Authentication);
}
