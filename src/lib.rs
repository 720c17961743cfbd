//! # Autopilot
//!
//! Tick-driven capability graph and interruptible task scheduling for
//! autonomous game clients.
//!
//! The crate has two load-bearing halves:
//!
//! - A **capability graph**: independently toggleable units of behavior
//!   ([`Capability`]) declaring AND/OR/conflict relationships that a
//!   resolver keeps mutually consistent without feedback loops, backed by
//!   an observable value cell whose setter is a no-op on equal values.
//! - A **cooperative task scheduler** ([`TaskScheduler`]): a double-ended
//!   queue of tick-driven tasks supporting clean suspension of a running
//!   task behind a higher-priority interrupting one.
//!
//! Everything is single-threaded and driven by an external fixed-rate
//! clock (~20 Hz nominal). Hosts with a separate input thread funnel
//! capability toggles through [`Autopilot::handle`] rather than locking.

pub mod behavior;
pub mod capability;
pub mod client;
pub mod error;
pub mod geometry;
pub mod observable;
pub mod presets;
pub mod sim;
pub mod task;
pub mod world;

pub use behavior::wood_cutter::{WoodCutter, WoodCutterConfig};
pub use behavior::BehaviorState;
pub use capability::capability::{Capability, CapabilityBehavior, CapabilityId, Relations, TickControl};
pub use capability::registry::{CapabilityRegistry, TransitionEvent};
pub use client::{Autopilot, AutopilotHandle, Clock, ToggleRequest};
pub use error::ConfigurationError;
pub use observable::{ListenerId, ObservableFlag};
pub use task::scheduler::{TaskResult, TaskScheduler};
pub use task::{Task, TickOutcome};
pub use world::{Actuator, BlockId, BlockKind, EntityKind, EntityRef, MovementIntent, WorldQuery};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
