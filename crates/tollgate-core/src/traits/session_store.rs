//! Session persistence trait.

use crate::result::AppResult;
use crate::types::{PersistedSession, SubjectSummary};

/// Storage for the state that must survive a reload: the token and the
/// subject summary.
///
/// Implementations write and clear both halves together. `load` returns
/// whatever is present, including partial state, so callers can detect
/// and reject it.
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Read the persisted session.
    fn load(&self) -> AppResult<PersistedSession>;

    /// Replace the persisted session with `token` and `subject`.
    fn save(&self, token: &str, subject: &SubjectSummary) -> AppResult<()>;

    /// Remove both the token and the subject summary.
    fn clear(&self) -> AppResult<()>;
}
