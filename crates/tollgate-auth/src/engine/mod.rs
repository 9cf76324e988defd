//! Decision engine: resolve active roles, then answer one query against
//! the current permission snapshot.

pub mod decision;
pub mod query;
pub mod verdict;

pub use decision::DecisionEngine;
pub use query::{DecisionKey, DecisionQuery};
pub use verdict::{Basis, Verdict};

/// Decision cache as used by every surface of a runtime.
pub type VerdictCache = tollgate_cache::DecisionCache<DecisionKey, Verdict>;
