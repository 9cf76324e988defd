//! Process-wide authorization runtime.
//!
//! [`AuthRuntime`] owns everything the surfaces share: validator, role
//! registry, permission store, decision engine, decision cache, session
//! bus, session store and identity provider. It is built explicitly and
//! passed around as an `Arc`, so tests can run isolated instances side by
//! side.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use tollgate_cache::CacheSweeper;
use tollgate_core::config::AppConfig;
use tollgate_core::result::AppResult;
use tollgate_core::traits::{Clock, SessionStore, SystemClock};
use tollgate_core::types::{RoleCode, SubjectId};
use tollgate_realtime::SessionBus;

use crate::engine::{DecisionEngine, VerdictCache};
use crate::jwt::{SessionValidator, TokenIssuer};
use crate::rbac::{FieldDefaults, PermissionSnapshot, PermissionStore, PolicyCatalog};
use crate::registry::{RoleRegistry, RoleUpdate};

use super::admin::PolicyAdmin;
use super::identity::{IdentityProvider, LocalIdentityProvider};
use super::service::AuthService;
use super::store::session_store_from_config;

/// Shared state behind every surface.
#[derive(Debug)]
pub struct AuthRuntime {
    config: AppConfig,
    clock: Arc<dyn Clock>,
    validator: Arc<SessionValidator>,
    issuer: Arc<TokenIssuer>,
    registry: Arc<RoleRegistry>,
    permissions: Arc<PermissionStore>,
    engine: Arc<DecisionEngine>,
    cache: Arc<VerdictCache>,
    bus: Arc<SessionBus>,
    sessions: Arc<dyn SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    /// Set when the built-in provider is used, so catalog reloads can
    /// refresh its users.
    local_identity: Option<Arc<LocalIdentityProvider>>,
    catalog: RwLock<Option<Arc<PolicyCatalog>>>,
}

impl AuthRuntime {
    /// Starts building a runtime.
    pub fn builder(config: AppConfig) -> AuthRuntimeBuilder {
        AuthRuntimeBuilder::new(config)
    }

    /// Opens a new surface (one tab or UI context). It starts anonymous;
    /// call [`AuthService::restore`] to pick up a persisted session.
    pub fn open_surface(self: &Arc<Self>) -> AuthService {
        AuthService::new(self.clone())
    }

    /// Administrative entry point.
    pub fn admin(self: &Arc<Self>) -> PolicyAdmin {
        PolicyAdmin::new(self.clone())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn validator(&self) -> &SessionValidator {
        &self.validator
    }

    /// Token issuer of the development identity provider.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }

    pub fn permissions(&self) -> &Arc<PermissionStore> {
        &self.permissions
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<VerdictCache> {
        &self.cache
    }

    pub fn bus(&self) -> &SessionBus {
        &self.bus
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// The installed catalog, if any.
    pub fn catalog(&self) -> Option<Arc<PolicyCatalog>> {
        self.catalog.read().clone()
    }

    /// Screens worth priming at login.
    pub(crate) fn known_screens(&self) -> Vec<String> {
        self.catalog
            .read()
            .as_ref()
            .map(|catalog| catalog.screen_ids())
            .unwrap_or_default()
    }

    /// Applies a catalog: upserts its roles into the registry, installs a
    /// new permission snapshot and refreshes local users. Roles missing
    /// from the catalog are left in place.
    ///
    /// Nothing changes if a role definition or grant is invalid. Returns
    /// the snapshot version.
    pub(crate) fn apply_catalog(&self, catalog: PolicyCatalog) -> AppResult<u64> {
        let definitions = catalog
            .roles
            .iter()
            .map(|definition| definition.to_new_role())
            .collect::<AppResult<Vec<_>>>()?;

        let defaults = FieldDefaults::from(&self.config.policy);
        let snapshot = PermissionSnapshot::build(&catalog, &self.registry, defaults)?;

        for role in definitions {
            match self.registry.get(&role.code) {
                Some(existing) => {
                    self.registry.update(
                        &role.code,
                        RoleUpdate {
                            name: Some(role.name),
                            description: Some(role.description),
                            level: Some(role.level),
                        },
                    )?;
                    if existing.active != role.active {
                        if role.active {
                            self.registry.activate(&role.code)?;
                        } else {
                            self.registry.deactivate(&role.code)?;
                        }
                    }
                }
                None => {
                    self.registry.create(role)?;
                }
            }
        }

        for user in &catalog.users {
            let subject = SubjectId::new(user.subject_id.clone());
            let codes: Vec<RoleCode> = user
                .roles
                .iter()
                .filter_map(|raw| RoleCode::parse(raw).ok())
                .filter(|code| self.registry.contains(code))
                .collect();
            if codes.len() != user.roles.len() {
                warn!(username = %user.username, "Local user lists unknown role codes");
            }
            if codes.is_empty() {
                // No record: the token's role claims apply.
                self.registry.clear_assignments(&subject);
            } else {
                self.registry.set_assignments(&subject, &codes)?;
            }
        }
        if let Some(local) = &self.local_identity {
            local.replace_users(catalog.users.clone());
        }

        let version = self.permissions.install(snapshot);
        *self.catalog.write() = Some(Arc::new(catalog));
        Ok(version)
    }

    /// Spawns the background cache sweeper. It stops when `shutdown` flips
    /// to `true`.
    pub fn spawn_cache_sweeper(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let interval = StdDuration::from_secs(self.config.cache.sweep_interval_seconds);
        CacheSweeper::new(self.cache.clone(), self.clock.clone(), interval).spawn(shutdown)
    }
}

/// Builder for [`AuthRuntime`].
#[derive(Debug)]
pub struct AuthRuntimeBuilder {
    config: AppConfig,
    clock: Option<Arc<dyn Clock>>,
    sessions: Option<Arc<dyn SessionStore>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    catalog: Option<PolicyCatalog>,
}

impl AuthRuntimeBuilder {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            clock: None,
            sessions: None,
            identity: None,
            catalog: None,
        }
    }

    /// Time source; the system clock by default.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Session store; built from `session` config by default.
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Identity provider; the local provider over catalog users by default.
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Catalog to install; read from `policy.catalog_path` by default.
    pub fn with_catalog(mut self, catalog: PolicyCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builds the runtime. Without a catalog, decisions report
    /// `STORE_UNAVAILABLE` until one is installed through
    /// [`PolicyAdmin::install_catalog`].
    pub fn build(self) -> AppResult<Arc<AuthRuntime>> {
        let config = self.config;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let validator = Arc::new(SessionValidator::new(&config.auth, clock.clone()));
        let issuer = Arc::new(TokenIssuer::new(&config.auth, clock.clone()));
        let registry = Arc::new(RoleRegistry::new(clock.clone()));
        let permissions = Arc::new(PermissionStore::new());
        let engine = Arc::new(DecisionEngine::new(
            registry.clone(),
            permissions.clone(),
            clock.clone(),
        ));
        let cache = Arc::new(VerdictCache::from_config(&config.cache));
        let bus = Arc::new(SessionBus::from_config(&config.realtime));
        let sessions = self
            .sessions
            .unwrap_or_else(|| session_store_from_config(&config.session));

        let (identity, local_identity) = match self.identity {
            Some(identity) => (identity, None),
            None => {
                let local = Arc::new(LocalIdentityProvider::new(
                    issuer.clone(),
                    registry.clone(),
                    Vec::new(),
                ));
                (local.clone() as Arc<dyn IdentityProvider>, Some(local))
            }
        };

        let catalog = match (self.catalog, &config.policy.catalog_path) {
            (Some(catalog), _) => Some(catalog),
            (None, Some(path)) => Some(PolicyCatalog::load(path)?),
            (None, None) => None,
        };

        let runtime = AuthRuntime {
            config,
            clock,
            validator,
            issuer,
            registry,
            permissions,
            engine,
            cache,
            bus,
            sessions,
            identity,
            local_identity,
            catalog: RwLock::new(None),
        };

        match catalog {
            Some(catalog) => {
                let version = runtime.apply_catalog(catalog)?;
                info!(version, "Authorization runtime ready");
            }
            None => info!("Authorization runtime ready without permission data"),
        }

        Ok(Arc::new(runtime))
    }
}
