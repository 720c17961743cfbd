//! Tick-driven tasks and the scheduler that runs them.
//!
//! A [`Task`] is one unit of work ticked at most once per external clock
//! tick, returning a [`TickOutcome`] that the scheduler interprets. Tasks
//! are logically single-use: once one reports a non-[`Continue`]
//! resolution it leaves the queue (interruption keeps it queued behind the
//! injected task).
//!
//! [`Continue`]: TickOutcome::Continue

pub mod break_task;
pub mod move_task;
pub mod scheduler;

use uuid::Uuid;

use crate::world::{Actuator, WorldQuery};

pub use break_task::BreakBlockTask;
pub use move_task::MoveTask;
pub use scheduler::{TaskResult, TaskScheduler};

/// Result of ticking a task once.
pub enum TickOutcome {
    /// Not done yet; tick again next time.
    Continue,
    /// Goal reached; remove from the queue.
    Succeeded,
    /// Cannot make progress; remove from the queue. Never retried by the
    /// scheduler; the owning controller decides what happens next.
    Failed,
    /// A sub-goal must be handled first. The new task is injected ahead of
    /// this one, which resumes (not restarts) once the interrupt chain
    /// resolves.
    InterruptWith(Box<dyn Task>),
}

impl std::fmt::Debug for TickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickOutcome::Continue => f.write_str("Continue"),
            TickOutcome::Succeeded => f.write_str("Succeeded"),
            TickOutcome::Failed => f.write_str("Failed"),
            TickOutcome::InterruptWith(task) => write!(f, "InterruptWith({})", task.name()),
        }
    }
}

/// A polymorphic unit of work over the world/actuator collaborators.
pub trait Task {
    /// Run one tick of work. Must return within the tick budget; no
    /// blocking, no suspension.
    fn on_tick(&mut self, world: &dyn WorldQuery, actuator: &dyn Actuator) -> TickOutcome;

    /// Short human-readable name for log lines.
    fn name(&self) -> &str;

    /// Unique id for log correlation.
    fn id(&self) -> Uuid;
}
