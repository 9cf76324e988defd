//! Session persistence backends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use tollgate_core::config::{SessionConfig, SessionStoreKind};
use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_core::traits::SessionStore;
use tollgate_core::types::{PersistedSession, SubjectSummary};

/// Builds the configured session store.
pub fn session_store_from_config(config: &SessionConfig) -> Arc<dyn SessionStore> {
    match config.store {
        SessionStoreKind::Memory => Arc::new(MemorySessionStore::new()),
        SessionStoreKind::File => Arc::new(FileSessionStore::new(&config.file_path)),
    }
}

/// Process-local session storage shared by every surface of a runtime.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: Mutex<PersistedSession>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `state` as-is, partial or not.
    pub fn with_state(state: PersistedSession) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> AppResult<PersistedSession> {
        Ok(self.state.lock().clone())
    }

    fn save(&self, token: &str, subject: &SubjectSummary) -> AppResult<()> {
        *self.state.lock() = PersistedSession::complete(token, subject.clone());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.state.lock() = PersistedSession::default();
        Ok(())
    }
}

/// Session storage in a JSON file, so the CLI keeps its session across
/// invocations.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Creates a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, state: &PersistedSession) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Internal,
                    format!("Failed to create '{}'", parent.display()),
                    e,
                )
            })?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> AppResult<PersistedSession> {
        let _guard = self.lock.lock();
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted session");
                Ok(PersistedSession::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str, subject: &SubjectSummary) -> AppResult<()> {
        let _guard = self.lock.lock();
        self.write(&PersistedSession::complete(token, subject.clone()))
    }

    fn clear(&self) -> AppResult<()> {
        let _guard = self.lock.lock();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
