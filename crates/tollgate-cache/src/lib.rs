//! # tollgate-cache
//!
//! Read-through memo table for authorization decisions.
//!
//! - **store**: [`DecisionCache`], keyed by subject and query, whose
//!   entries expire at `min(session deadline, now + ttl)` and are evicted
//!   lazily on read
//! - **sweeper**: optional background task that drops expired entries
//!
//! All operations for one subject run under that subject's slot lock, so
//! readers never observe a mix of pre- and post-invalidation answers.

pub mod entry;
pub mod store;
pub mod sweeper;

pub use entry::{CacheStats, CachedEntry};
pub use store::DecisionCache;
pub use sweeper::CacheSweeper;
