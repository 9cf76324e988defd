//! Guard contract: how route, component and field guards turn decisions
//! into rendering outcomes. Guards hold no decision logic of their own.

pub mod component;
pub mod field;
pub mod route;

pub use component::{ComponentGuard, Requirement};
pub use field::{FieldGuard, FieldRendering};
pub use route::{RouteGuard, RouteOutcome};
