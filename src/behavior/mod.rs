//! Behavior controllers: domain state machines that accomplish multi-step
//! goals by issuing tasks to a [`TaskScheduler`](crate::task::TaskScheduler)
//! and reacting to their outcomes.
//!
//! Every controller follows the same shape (search for a target, approach
//! it, act on it, collect the results) and obeys two rules: a failed or
//! vanished target always falls back to `Searching` (never a hard stop),
//! and capability disable unconditionally resets to `Idle` with the
//! scheduler cleared.

pub mod ai_mode;
pub mod wood_cutter;

pub use ai_mode::{AiMode, AiModeConfig};
pub use wood_cutter::{WoodCutter, WoodCutterConfig};

/// The generic controller state cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    /// Nothing in flight; advances to `Searching` on the next tick.
    Idle,
    /// Querying the world for the best target.
    Searching,
    /// Walking to the chosen target.
    Approaching,
    /// Working on the target (with sub-task interrupts as needed).
    Acting,
    /// Gathering dropped results.
    Collecting,
}

impl std::fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BehaviorState::Idle => "idle",
            BehaviorState::Searching => "searching",
            BehaviorState::Approaching => "approaching",
            BehaviorState::Acting => "acting",
            BehaviorState::Collecting => "collecting",
        };
        f.write_str(name)
    }
}
