//! One surface's view of the session.
//!
//! An [`AuthService`] is what a tab or UI context talks to. It holds the
//! surface's current subject, subscribes to the session bus and applies
//! pending signals from other surfaces at the start of every call, without
//! waiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use tollgate_core::error::AppError;
use tollgate_core::events::{SessionEvent, SessionSignal};
use tollgate_core::result::AppResult;
use tollgate_core::types::{FieldTier, Operation, RoleCode, SurfaceId};
use tollgate_realtime::BusSubscription;

use crate::engine::{Basis, DecisionKey, DecisionQuery, Verdict};
use crate::jwt::{ValidatedSession, ValidationOutcome};
use crate::registry::Role;

use super::identity::Credentials;
use super::runtime::AuthRuntime;
use super::subject::Subject;

/// Per-surface authorization service.
#[derive(Debug)]
pub struct AuthService {
    surface_id: SurfaceId,
    runtime: Arc<AuthRuntime>,
    subscription: BusSubscription,
    subject: RwLock<Option<Subject>>,
    login_in_flight: AtomicBool,
}

/// Clears the in-flight flag however login ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

enum Adoption {
    Login,
    Refresh,
}

impl AuthService {
    pub(crate) fn new(runtime: Arc<AuthRuntime>) -> Self {
        let subscription = runtime.bus().subscribe();
        Self {
            surface_id: SurfaceId::new(),
            runtime,
            subscription,
            subject: RwLock::new(None),
            login_in_flight: AtomicBool::new(false),
        }
    }

    /// This surface's identifier, stamped on the signals it publishes.
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Logs in through the identity provider.
    ///
    /// Validates the returned token, persists it with the subject summary,
    /// primes the decision cache and only then makes the subject current,
    /// so no caller observes a half-established session.
    pub async fn login(&self, credentials: &Credentials) -> AppResult<Subject> {
        let _in_flight = InFlight::start(&self.login_in_flight);
        self.sync();

        let token = self.runtime.identity().authenticate(credentials).await?;
        let subject = self.adopt(&token, Adoption::Login)?;
        info!(
            subject_id = %subject.id,
            surface = %self.surface_id,
            roles = ?subject.role_codes,
            "Logged in"
        );
        Ok(subject)
    }

    /// Adopts a token re-issued by the identity provider for this session.
    pub fn refresh(&self, token: &str) -> AppResult<Subject> {
        self.sync();
        let subject = self.adopt(token, Adoption::Refresh)?;
        info!(subject_id = %subject.id, surface = %self.surface_id, "Token refreshed");
        Ok(subject)
    }

    /// Ends the session: clears persisted state and cached decisions and
    /// tells the other surfaces.
    ///
    /// The surface is anonymous afterwards even if clearing the session
    /// store fails; that failure is still returned.
    pub fn logout(&self) -> AppResult<()> {
        self.sync();
        let previous = self.subject.write().take();
        let cleared = self.runtime.sessions().clear();

        if let Some(subject) = previous {
            self.runtime.cache().invalidate(&subject.id);
            self.publish(SessionSignal::LoggedOut {
                subject_id: subject.id.clone(),
            });
            info!(subject_id = %subject.id, surface = %self.surface_id, "Logged out");
        }
        cleared
    }

    /// Rehydrates from persisted state, e.g. after a reload.
    ///
    /// Partial state, an invalid token, or a summary that names a different
    /// subject than the token clears the persisted state and leaves the
    /// surface anonymous. The role set comes from the verified token.
    pub fn restore(&self) -> AppResult<Option<Subject>> {
        let persisted = self.runtime.sessions().load()?;

        let Some((token, summary)) = persisted.as_complete() else {
            if persisted.is_partial() {
                warn!(surface = %self.surface_id, "Discarding partial persisted session");
                self.runtime.sessions().clear()?;
            }
            *self.subject.write() = None;
            return Ok(None);
        };

        let session = match self.runtime.validator().validate(token) {
            ValidationOutcome::Valid(session) => session,
            ValidationOutcome::Invalid(reason) => {
                warn!(surface = %self.surface_id, %reason, "Discarding persisted session");
                self.runtime.sessions().clear()?;
                *self.subject.write() = None;
                return Ok(None);
            }
        };

        if session.subject_id != summary.subject_id {
            warn!(
                surface = %self.surface_id,
                token_subject = %session.subject_id,
                summary_subject = %summary.subject_id,
                "Persisted summary does not match token"
            );
            self.runtime.sessions().clear()?;
            *self.subject.write() = None;
            return Ok(None);
        }

        let subject = self.authoritative(session);
        debug!(subject_id = %subject.id, surface = %self.surface_id, "Session restored");
        *self.subject.write() = Some(subject.clone());
        Ok(Some(subject))
    }

    fn adopt(&self, token: &str, adoption: Adoption) -> AppResult<Subject> {
        let session = match self.runtime.validator().validate(token) {
            ValidationOutcome::Valid(session) => session,
            ValidationOutcome::Invalid(reason) => {
                return Err(AppError::authentication(format!("Token rejected: {reason}")));
            }
        };
        let subject = self.authoritative(session);

        self.runtime.sessions().save(token, &subject.summary())?;
        self.runtime.cache().invalidate(&subject.id);
        self.prime(&subject);

        *self.subject.write() = Some(subject.clone());
        let subject_id = subject.id.clone();
        self.publish(match adoption {
            Adoption::Login => SessionSignal::LoggedIn { subject_id },
            Adoption::Refresh => SessionSignal::TokenRefreshed { subject_id },
        });
        Ok(subject)
    }

    /// Builds the subject for a verified session. A registry assignment
    /// record replaces the token's role claims.
    fn authoritative(&self, session: ValidatedSession) -> Subject {
        let mut subject = Subject::from(session);
        if let Some(codes) = self.runtime.registry().assignment(&subject.id) {
            if codes != subject.role_codes {
                debug!(
                    subject_id = %subject.id,
                    claimed = ?subject.role_codes,
                    assigned = ?codes,
                    "Using assigned roles over token claims"
                );
            }
            subject.set_role_codes(codes);
        }
        subject
    }

    /// Computes screen verdicts for every catalog screen.
    fn prime(&self, subject: &Subject) {
        if !self.runtime.permissions().is_loaded() {
            debug!(subject_id = %subject.id, "Permission data not loaded, skipping priming");
            return;
        }
        let screens = self.runtime.known_screens();
        for screen_id in &screens {
            if let Err(e) = self.cached_decision(subject, &DecisionQuery::screen(screen_id.as_str()))
            {
                warn!(subject_id = %subject.id, screen = %screen_id, error = %e, "Priming failed");
            }
        }
        debug!(subject_id = %subject.id, screens = screens.len(), "Decision cache primed");
    }

    // ── Cross-surface signals ──────────────────────────────────────────

    /// Applies pending signals from other surfaces. Returns how many were
    /// applied.
    pub fn sync(&self) -> usize {
        let drained = self.subscription.drain();
        if drained.lagged {
            warn!(surface = %self.surface_id, "Missed session signals, rehydrating");
            self.rehydrate();
        }

        let mut applied = 0;
        for event in drained.events {
            if event.is_from(self.surface_id) {
                continue;
            }
            self.apply(&event);
            applied += 1;
        }
        applied
    }

    fn apply(&self, event: &SessionEvent) {
        debug!(surface = %self.surface_id, signal = ?event.signal, "Applying session signal");
        match &event.signal {
            SessionSignal::LoggedOut { subject_id } => {
                let mut current = self.subject.write();
                if current.as_ref().is_some_and(|s| &s.id == subject_id) {
                    *current = None;
                    drop(current);
                    self.runtime.cache().invalidate(subject_id);
                    info!(subject_id = %subject_id, surface = %self.surface_id, "Logged out elsewhere");
                }
            }
            SessionSignal::LoggedIn { .. } | SessionSignal::TokenRefreshed { .. } => {
                self.rehydrate();
            }
            SessionSignal::RolesChanged {
                subject_id,
                role_codes,
            } => {
                let mut current = self.subject.write();
                if let Some(subject) = current.as_mut().filter(|s| &s.id == subject_id) {
                    subject.set_role_codes(role_codes.clone());
                }
            }
            SessionSignal::PolicyReloaded { version } => {
                debug!(surface = %self.surface_id, version, "Permission data reloaded");
            }
        }
    }

    fn rehydrate(&self) {
        if let Some(subject) = self.subject.read().as_ref() {
            self.runtime.cache().invalidate(&subject.id);
        }
        if let Err(e) = self.restore() {
            warn!(surface = %self.surface_id, error = %e, "Rehydration failed");
            *self.subject.write() = None;
        }
    }

    fn publish(&self, signal: SessionSignal) {
        self.runtime
            .bus()
            .publish(Some(self.surface_id), self.runtime.clock().now(), signal);
    }

    // ── Session state ──────────────────────────────────────────────────

    /// Whether a session exists and has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.sync();
        let now = self.runtime.clock().now();
        self.subject
            .read()
            .as_ref()
            .is_some_and(|s| s.is_valid_at(now))
    }

    /// Whether a login is in flight, or a session exists but permission
    /// data has not loaded yet.
    pub fn is_loading(&self) -> bool {
        if self.login_in_flight.load(Ordering::SeqCst) {
            return true;
        }
        self.sync();
        self.subject.read().is_some() && !self.runtime.permissions().is_loaded()
    }

    /// The current subject, expired or not.
    pub fn current_subject(&self) -> Option<Subject> {
        self.sync();
        self.subject.read().clone()
    }

    /// The subject's known, active roles. Empty without a valid session.
    pub fn effective_roles(&self) -> Vec<Role> {
        self.valid_subject()
            .map(|s| self.runtime.engine().effective_roles(&s))
            .unwrap_or_default()
    }

    fn valid_subject(&self) -> Option<Subject> {
        self.sync();
        let now = self.runtime.clock().now();
        self.subject
            .read()
            .as_ref()
            .filter(|s| s.is_valid_at(now))
            .cloned()
    }

    // ── Role membership ────────────────────────────────────────────────

    fn effective_codes(&self) -> Vec<RoleCode> {
        self.effective_roles().into_iter().map(|r| r.code).collect()
    }

    /// Whether the subject holds the active role `code`.
    pub fn has_profile(&self, code: &str) -> bool {
        let Ok(code) = RoleCode::parse(code) else {
            return false;
        };
        self.effective_codes().contains(&code)
    }

    /// Whether the subject holds any of the active roles in `codes`.
    pub fn has_any_profile(&self, codes: &[&str]) -> bool {
        let held = self.effective_codes();
        codes
            .iter()
            .filter_map(|raw| RoleCode::parse(raw).ok())
            .any(|code| held.contains(&code))
    }

    /// Whether the subject holds every active role in `codes`. False
    /// without a valid session, even for an empty list.
    pub fn has_all_profiles(&self, codes: &[&str]) -> bool {
        if self.valid_subject().is_none() {
            return false;
        }
        let held = self.effective_codes();
        codes
            .iter()
            .all(|raw| RoleCode::parse(raw).is_ok_and(|code| held.contains(&code)))
    }

    // ── Decisions ──────────────────────────────────────────────────────

    /// Answers `query` for the current subject through the decision cache.
    ///
    /// Fails with `SESSION` when no subject exists and with
    /// `STORE_UNAVAILABLE` while permission data is not loaded. An expired
    /// session gives a deny verdict, never a cached answer.
    pub fn decide(&self, query: &DecisionQuery) -> AppResult<Verdict> {
        self.sync();
        let subject = self
            .subject
            .read()
            .clone()
            .ok_or_else(|| AppError::session("No active session"))?;
        self.cached_decision(&subject, query)
    }

    fn cached_decision(&self, subject: &Subject, query: &DecisionQuery) -> AppResult<Verdict> {
        let now = self.runtime.clock().now();
        if !subject.is_valid_at(now) {
            return Ok(Verdict::deny(query, Basis::SessionExpired));
        }
        let key = DecisionKey {
            roles: subject.role_codes.clone(),
            query: query.clone(),
        };
        self.runtime
            .cache()
            .get_or_compute(&subject.id, key, subject.valid_until, now, || {
                self.runtime.engine().decide(subject, query)
            })
    }

    fn allowed(&self, query: &DecisionQuery) -> bool {
        match self.decide(query) {
            Ok(verdict) => verdict.is_allowed(),
            Err(e) => {
                debug!(surface = %self.surface_id, %query, error = %e, "Treating as denied");
                false
            }
        }
    }

    pub fn has_screen_access(&self, screen_id: &str) -> bool {
        self.allowed(&DecisionQuery::screen(screen_id))
    }

    pub fn has_any_screen_access(&self, screen_ids: &[&str]) -> bool {
        screen_ids.iter().any(|id| self.has_screen_access(id))
    }

    pub fn has_resource_permission(&self, resource: &str, operation: Operation) -> bool {
        self.allowed(&DecisionQuery::resource(resource, operation))
    }

    pub fn has_any_resource_permission(&self, resource: &str, operations: &[Operation]) -> bool {
        operations
            .iter()
            .any(|op| self.has_resource_permission(resource, *op))
    }

    /// The subject's tier on `resource.field`; `HIDDEN` when no decision
    /// can be made.
    pub fn get_field_permission(&self, resource: &str, field: &str) -> FieldTier {
        match self.decide(&DecisionQuery::field(resource, field)) {
            Ok(verdict) => verdict.tier(),
            Err(e) => {
                debug!(surface = %self.surface_id, resource, field, error = %e, "Hiding field");
                FieldTier::Hidden
            }
        }
    }

    pub fn can_edit_field(&self, resource: &str, field: &str) -> bool {
        self.get_field_permission(resource, field).is_editable()
    }
}
