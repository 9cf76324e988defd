//! Integration tests for the route, component and field guard contract.

mod helpers;

use chrono::Duration;

use tollgate_auth::guard::{ComponentGuard, FieldGuard, FieldRendering, Requirement, RouteGuard, RouteOutcome};
use tollgate_auth::session::Credentials;
use tollgate_core::config::PolicyConfig;
use tollgate_core::types::Operation;

use helpers::{PASSWORD, TestRuntime};

fn guard() -> RouteGuard {
    RouteGuard::from_config(&PolicyConfig::default())
}

#[tokio::test]
async fn test_anonymous_is_sent_to_login() {
    let app = TestRuntime::new();
    let surface = app.surface();
    assert_eq!(
        guard().check(&surface, "billing", "/billing?month=3"),
        RouteOutcome::RedirectToLogin {
            return_to: "/billing?month=3".into()
        }
    );
}

#[tokio::test]
async fn test_allowed_screen_renders() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();
    assert_eq!(guard().check(&surface, "billing", "/billing"), RouteOutcome::Render);
}

#[tokio::test]
async fn test_denied_screen_redirects_to_fallback() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    assert_eq!(
        guard().check(&surface, "billing", "/billing"),
        RouteOutcome::RedirectTo {
            screen_id: "dashboard".into()
        }
    );
}

#[tokio::test]
async fn test_denied_without_usable_fallback() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("ghost", PASSWORD))
        .await
        .unwrap();
    assert_eq!(
        guard().check(&surface, "billing", "/billing"),
        RouteOutcome::AccessDenied {
            screen_id: "billing".into()
        }
    );

    let no_fallback = RouteGuard::new(None);
    surface.refresh(&app.token("user-alice", &["USER"])).unwrap();
    assert_eq!(
        no_fallback.check(&surface, "billing", "/billing"),
        RouteOutcome::AccessDenied {
            screen_id: "billing".into()
        }
    );
}

#[tokio::test]
async fn test_expired_session_keeps_destination() {
    let app = TestRuntime::new();
    let surface = app.surface();
    let subject = surface
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();

    app.clock.set(subject.valid_until + Duration::seconds(5));
    assert_eq!(
        guard().check(&surface, "billing", "/billing/2024"),
        RouteOutcome::RedirectToLogin {
            return_to: "/billing/2024".into()
        }
    );
}

#[tokio::test]
async fn test_missing_permission_data_renders_loading() {
    let app = TestRuntime::without_catalog();
    let surface = app.surface();
    surface.refresh(&app.token("carol", &["USER"])).unwrap();
    assert_eq!(guard().check(&surface, "dashboard", "/"), RouteOutcome::Loading);
}

#[tokio::test]
async fn test_field_rendering() {
    let app = TestRuntime::new();
    let surface = app.surface();
    surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();

    assert_eq!(FieldGuard::rendering(&surface, "tasks", "budget"), FieldRendering::ReadOnly);
    assert_eq!(FieldGuard::rendering(&surface, "tasks", "title"), FieldRendering::Editable);
    let hidden = FieldGuard::rendering(&surface, "tasks", "internal_notes");
    assert_eq!(hidden, FieldRendering::Omit);
    assert!(!hidden.shows_label());
    assert_eq!(
        FieldGuard::rendering(&surface, "deliveries", "address"),
        FieldRendering::Editable
    );
}

#[tokio::test]
async fn test_component_visibility() {
    let app = TestRuntime::new();
    let surface = app.surface();
    assert!(!ComponentGuard::is_visible(&surface, &Requirement::Authenticated));

    surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();

    let visible = |requirement: Requirement| ComponentGuard::is_visible(&surface, &requirement);
    assert!(visible(Requirement::Authenticated));
    assert!(visible(Requirement::Profile { code: "user".into() }));
    assert!(!visible(Requirement::Profile {
        code: "MANAGER".into()
    }));
    assert!(visible(Requirement::AnyProfile {
        codes: vec!["MANAGER".into(), "USER".into()]
    }));
    assert!(!visible(Requirement::AllProfiles {
        codes: vec!["MANAGER".into(), "USER".into()]
    }));
    assert!(visible(Requirement::Screen {
        screen_id: "tasks".into()
    }));
    assert!(!visible(Requirement::Resource {
        resource: "tasks".into(),
        operation: Operation::Delete
    }));
    assert!(visible(Requirement::AnyResource {
        resource: "tasks".into(),
        operations: vec![Operation::Delete, Operation::Create]
    }));
}
