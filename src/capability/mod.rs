//! The capability graph: toggleable units of behavior with declared
//! AND/OR/conflict relationships, a registry to look them up, and the
//! resolver that keeps the whole set mutually consistent.

pub mod capability;
pub mod registry;
pub mod resolver;

pub use capability::{Capability, CapabilityBehavior, CapabilityId, NoopBehavior, Relations, TickControl};
pub use registry::{CapabilityRegistry, TransitionEvent};
