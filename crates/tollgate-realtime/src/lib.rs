//! # tollgate-realtime
//!
//! Publish/subscribe channel that carries [`SessionEvent`]s between the
//! surfaces sharing one runtime. Publishing never blocks; subscribers
//! drain pending events at the start of each decision call.
//!
//! [`SessionEvent`]: tollgate_core::events::SessionEvent

pub mod bus;
pub mod subscription;

pub use bus::SessionBus;
pub use subscription::{BusSubscription, Drained};
