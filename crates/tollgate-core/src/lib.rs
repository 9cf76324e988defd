//! # tollgate-core
//!
//! Core crate for Tollgate. Contains configuration schemas, typed
//! identifiers, permission value types, session events, the clock and
//! session-store traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Tollgate crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
