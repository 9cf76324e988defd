//! Core traits implemented by runtime components and test doubles.

pub mod clock;
pub mod session_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session_store::SessionStore;
