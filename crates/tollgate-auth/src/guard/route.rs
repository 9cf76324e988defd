//! Route guard.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tollgate_core::config::PolicyConfig;

use crate::engine::{Basis, DecisionQuery};
use crate::session::AuthService;

/// What to do with a navigation to a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Render the screen.
    Render,
    /// Show a loading state; the answer is not known yet.
    Loading,
    /// Send the user to log in and come back to `return_to` afterwards.
    RedirectToLogin { return_to: String },
    /// Send the user to a screen they may enter instead.
    RedirectTo { screen_id: String },
    /// Show an access-denied panel.
    AccessDenied { screen_id: String },
}

/// Guards navigation to screens.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    fallback_screen: Option<String>,
}

impl RouteGuard {
    /// Creates a guard that redirects denied navigation to
    /// `fallback_screen` when the subject may enter it.
    pub fn new(fallback_screen: Option<String>) -> Self {
        Self { fallback_screen }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.fallback_screen.clone())
    }

    /// Decides what happens when `service`'s user navigates to `screen_id`
    /// via `requested_path`.
    pub fn check(&self, service: &AuthService, screen_id: &str, requested_path: &str) -> RouteOutcome {
        if service.is_loading() {
            return RouteOutcome::Loading;
        }

        let to_login = || RouteOutcome::RedirectToLogin {
            return_to: requested_path.to_string(),
        };

        let verdict = match service.decide(&DecisionQuery::screen(screen_id)) {
            Ok(verdict) => verdict,
            Err(e) if e.is_store_unavailable() => return RouteOutcome::Loading,
            Err(e) => {
                debug!(screen = screen_id, error = %e, "No session, redirecting to login");
                return to_login();
            }
        };

        if verdict.is_allowed() {
            return RouteOutcome::Render;
        }
        if verdict.basis() == Basis::SessionExpired {
            return to_login();
        }

        match &self.fallback_screen {
            Some(fallback) if fallback != screen_id && service.has_screen_access(fallback) => {
                RouteOutcome::RedirectTo {
                    screen_id: fallback.clone(),
                }
            }
            _ => RouteOutcome::AccessDenied {
                screen_id: screen_id.to_string(),
            },
        }
    }
}
