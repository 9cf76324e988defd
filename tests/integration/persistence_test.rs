//! Integration tests for session persistence across reloads.

mod helpers;

use std::sync::Arc;

use chrono::Duration;

use tollgate_auth::session::{Credentials, FileSessionStore};
use tollgate_auth::AuthRuntime;
use tollgate_core::config::AppConfig;
use tollgate_core::traits::{Clock, ManualClock, SessionStore};
use tollgate_core::types::{PersistedSession, SubjectId, SubjectSummary};

use helpers::{PASSWORD, catalog};

struct Process {
    runtime: Arc<AuthRuntime>,
    sessions: Arc<FileSessionStore>,
}

/// A fresh runtime over the same session file, like a reloaded page.
fn start(path: &std::path::Path, clock: Arc<ManualClock>) -> Process {
    let sessions = Arc::new(FileSessionStore::new(path));
    let runtime = AuthRuntime::builder(AppConfig::default())
        .with_clock(clock)
        .with_session_store(sessions.clone())
        .with_catalog(catalog())
        .build()
        .unwrap();
    Process { runtime, sessions }
}

#[tokio::test]
async fn test_session_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let clock = Arc::new(ManualClock::starting_now());

    let before = start(&path, clock.clone());
    let subject = before
        .runtime
        .open_surface()
        .login(&Credentials::new("bob", PASSWORD))
        .await
        .unwrap();

    let after = start(&path, clock);
    let surface = after.runtime.open_surface();
    let restored = surface.restore().unwrap().unwrap();
    assert_eq!(restored.id, subject.id);
    assert_eq!(restored.role_codes, subject.role_codes);
    assert!(surface.has_screen_access("billing"));
}

#[tokio::test]
async fn test_logout_clears_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let clock = Arc::new(ManualClock::starting_now());

    let process = start(&path, clock.clone());
    let surface = process.runtime.open_surface();
    surface
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();
    assert!(path.exists());

    surface.logout().unwrap();
    assert!(!path.exists());
    assert!(start(&path, clock).runtime.open_surface().restore().unwrap().is_none());
}

#[tokio::test]
async fn test_partial_state_forces_reauthentication() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let clock = Arc::new(ManualClock::starting_now());
    let process = start(&path, clock.clone());

    let token = process
        .runtime
        .issuer()
        .issue(&SubjectId::from("user-alice"), "alice", None, &["USER"])
        .unwrap()
        .token;
    let token_only = PersistedSession {
        token: Some(token),
        subject: None,
    };
    std::fs::write(&path, serde_json::to_vec(&token_only).unwrap()).unwrap();

    let surface = process.runtime.open_surface();
    assert!(surface.restore().unwrap().is_none());
    assert!(!surface.is_authenticated());
    assert!(process.sessions.load().unwrap().is_empty());

    let summary_only = PersistedSession {
        token: None,
        subject: Some(SubjectSummary {
            subject_id: SubjectId::from("user-alice"),
            username: "alice".into(),
            display_name: "alice".into(),
            role_codes: Vec::new(),
            expires_at: clock.now() + Duration::hours(1),
        }),
    };
    std::fs::write(&path, serde_json::to_vec(&summary_only).unwrap()).unwrap();
    assert!(surface.restore().unwrap().is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_expired_persisted_session_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let clock = Arc::new(ManualClock::starting_now());

    let subject = start(&path, clock.clone())
        .runtime
        .open_surface()
        .login(&Credentials::new("alice", PASSWORD))
        .await
        .unwrap();

    clock.set(subject.valid_until);
    let surface = start(&path, clock).runtime.open_surface();
    assert!(surface.restore().unwrap().is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_forged_token_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let clock = Arc::new(ManualClock::starting_now());

    let mut config = AppConfig::default();
    config.auth.jwt_secret = "attacker".into();
    let forger = tollgate_auth::TokenIssuer::new(&config.auth, clock.clone());
    let token = forger
        .issue(&SubjectId::from("user-alice"), "alice", None, &["ADMIN"])
        .unwrap()
        .token;

    let process = start(&path, clock.clone());
    let summary = SubjectSummary {
        subject_id: SubjectId::from("user-alice"),
        username: "alice".into(),
        display_name: "alice".into(),
        role_codes: Vec::new(),
        expires_at: clock.now() + Duration::hours(1),
    };
    process.sessions.save(&token, &summary).unwrap();

    let surface = process.runtime.open_surface();
    assert!(surface.restore().unwrap().is_none());
    assert!(!surface.has_screen_access("admin"));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_catalog_loaded_from_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.toml");
    std::fs::write(
        &catalog_path,
        r#"
[[roles]]
code = "USER"
name = "User"
level = 20

[[screens]]
role = "USER"
screens = ["dashboard"]
"#,
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.policy.catalog_path = Some(catalog_path.to_string_lossy().into_owned());
    let clock = Arc::new(ManualClock::starting_now());
    let runtime = AuthRuntime::builder(config)
        .with_clock(clock)
        .with_session_store(Arc::new(FileSessionStore::new(dir.path().join("s.json"))))
        .build()
        .unwrap();

    let token = runtime
        .issuer()
        .issue(&SubjectId::from("erin"), "erin", None, &["USER"])
        .unwrap()
        .token;
    let surface = runtime.open_surface();
    surface.refresh(&token).unwrap();
    assert!(surface.has_screen_access("dashboard"));
    assert_eq!(runtime.admin().reload_catalog().unwrap(), 2);
}
