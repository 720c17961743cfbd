//! The interruptible task scheduler.
//!
//! A double-ended queue of tasks: `enqueue` appends, `interrupt` prepends
//! ahead of the running head. Each external tick runs the head task exactly
//! once and mutates the queue according to its outcome. Controls are
//! released on every task transition so no stale input state survives.

use std::collections::VecDeque;
use std::rc::Rc;

use log::debug;

use super::{Task, TickOutcome};
use crate::world::{Actuator, WorldQuery};

/// Observable resolution of the most recent non-`Continue` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded,
    Failed,
    /// The head task handed control to an injected sub-task.
    Interrupted,
}

/// Cooperative, single-task-per-tick scheduler.
///
/// Owns the actuator so it can guarantee control release on transitions.
/// Never retries or backs off: a `Failed` head is surfaced through
/// [`last_outcome`](Self::last_outcome) for the owning controller.
pub struct TaskScheduler {
    queue: VecDeque<Box<dyn Task>>,
    actuator: Rc<dyn Actuator>,
    last_outcome: Option<TaskResult>,
}

impl TaskScheduler {
    pub fn new(actuator: Rc<dyn Actuator>) -> Self {
        Self {
            queue: VecDeque::new(),
            actuator,
            last_outcome: None,
        }
    }

    /// Append a task to the tail of the queue.
    pub fn enqueue(&mut self, task: Box<dyn Task>) {
        debug!("enqueue {} ({})", task.name(), task.id());
        self.queue.push_back(task);
    }

    /// Prepend a task ahead of the currently running one. The previous head
    /// is not ticked again until the interrupting task (and anything it in
    /// turn interrupts with) resolves.
    pub fn interrupt(&mut self, task: Box<dyn Task>) {
        debug!("interrupt with {} ({})", task.name(), task.id());
        self.queue.push_front(task);
    }

    /// Run the head task once and interpret its outcome.
    pub fn tick(&mut self, world: &dyn WorldQuery) {
        let Some(head) = self.queue.front_mut() else {
            self.actuator.release_all_controls();
            return;
        };

        match head.on_tick(world, self.actuator.as_ref()) {
            TickOutcome::Continue => {}
            TickOutcome::Succeeded => {
                debug!("task {} ({}) succeeded", head.name(), head.id());
                self.queue.pop_front();
                self.actuator.release_all_controls();
                self.last_outcome = Some(TaskResult::Succeeded);
            }
            TickOutcome::Failed => {
                debug!("task {} ({}) failed", head.name(), head.id());
                self.queue.pop_front();
                self.actuator.release_all_controls();
                self.last_outcome = Some(TaskResult::Failed);
            }
            TickOutcome::InterruptWith(new_task) => {
                debug!("task {} ({}) interrupted by {}", head.name(), head.id(), new_task.name());
                self.actuator.release_all_controls();
                self.queue.push_front(new_task);
                self.last_outcome = Some(TaskResult::Interrupted);
            }
        }
    }

    /// Most recent non-`Continue` outcome, for the owning controller.
    pub fn last_outcome(&self) -> Option<TaskResult> {
        self.last_outcome
    }

    /// Whether the queue is empty.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued tasks, the running head included.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every queued task and release all controls. Used on capability
    /// disable; this is the only cancellation mechanism.
    pub fn clear(&mut self) {
        if !self.queue.is_empty() {
            debug!("clearing {} queued task(s)", self.queue.len());
        }
        self.queue.clear();
        self.last_outcome = None;
        self.actuator.release_all_controls();
    }
}
