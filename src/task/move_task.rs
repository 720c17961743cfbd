//! Straight-line approach toward a world position.

use std::rc::Rc;

use uuid::Uuid;

use super::break_task::BreakBlockTask;
use super::{Task, TickOutcome};
use crate::geometry::{BlockPos, Vec3};
use crate::world::{Actuator, BlockId, MovementIntent, WorldQuery};

/// Predicate deciding whether an obstructing block may be broken to clear
/// the path. Captured at task creation.
pub type BlockPredicate = Rc<dyn Fn(&BlockId) -> bool>;

/// Default distance at which the target counts as reached.
pub const DEFAULT_REQUIRED_DISTANCE: f64 = 0.5;

/// How far ahead of the actor the path is checked for obstructions.
const DEFAULT_BLOCK_CHECK_DISTANCE: f64 = 1.0;

/// Walks the actor in a straight line toward `target`.
///
/// No pathfinding: the task steers and holds forward until the squared
/// distance drops below the threshold². Breakable blocks in the way are
/// handled by interrupting with a [`BreakBlockTask`]; unbreakable ones are
/// walked into, for the owning controller to notice the lack of progress.
pub struct MoveTask {
    id: Uuid,
    target: Vec3,
    required_distance: f64,
    breakable: BlockPredicate,
    block_check_distance: f64,
}

impl MoveTask {
    pub fn new(target: Vec3) -> Self {
        Self::with_required_distance(target, DEFAULT_REQUIRED_DISTANCE)
    }

    pub fn with_required_distance(target: Vec3, required_distance: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            required_distance,
            breakable: Rc::new(|_| false),
            block_check_distance: DEFAULT_BLOCK_CHECK_DISTANCE,
        }
    }

    /// Allow obstructions matching `predicate` to be cleared en route.
    pub fn breaking_through(mut self, predicate: BlockPredicate) -> Self {
        self.breakable = predicate;
        self
    }

    /// The path cells checked this tick: feet and head height, one step
    /// along the travel direction.
    fn path_cells(&self, actor: Vec3) -> [BlockPos; 2] {
        let direction = self.target.sub(actor).normalized();
        let check = actor.add(direction.scale(self.block_check_distance));
        let feet = BlockPos::of_floored(Vec3::new(check.x, actor.y, check.z));
        [feet, feet.up()]
    }
}

impl Task for MoveTask {
    fn on_tick(&mut self, world: &dyn WorldQuery, actuator: &dyn Actuator) -> TickOutcome {
        let Some(actor) = world.actor_position() else {
            actuator.release_all_controls();
            return TickOutcome::Failed;
        };

        if actor.squared_distance(self.target) < self.required_distance * self.required_distance {
            actuator.release_all_controls();
            return TickOutcome::Succeeded;
        }

        // Breakable obstruction ahead: stop and clear it first.
        for cell in self.path_cells(actor) {
            let kind = world.block_at(cell);
            if kind.is_passable() {
                continue;
            }
            if kind.id().map_or(false, |id| (self.breakable)(id)) {
                actuator.release_all_controls();
                return TickOutcome::InterruptWith(Box::new(BreakBlockTask::new(cell)));
            }
        }

        let direction = self.target.sub(actor).normalized();
        actuator.set_look_target(self.target);
        actuator.set_movement_intent(MovementIntent {
            direction,
            forward: true,
            // Simple step handling: hop when the target sits above us.
            jump: self.target.y > actor.y + 0.6,
        });
        TickOutcome::Continue
    }

    fn name(&self) -> &str {
        "move"
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWorld;
    use crate::world::BlockKind;

    #[test]
    fn succeeds_exactly_once_when_within_threshold() {
        let world = SimWorld::new();
        world.set_actor_position(Vec3::new(0.5, 0.0, 0.5));
        let mut task = MoveTask::new(Vec3::new(10.5, 0.0, 10.5));

        // Far away: continues and holds forward.
        assert!(matches!(task.on_tick(&world, &world), TickOutcome::Continue));
        assert!(world.movement_intent().forward);

        // Step the actor until the task reports success.
        let mut outcome = TickOutcome::Continue;
        for _ in 0..200 {
            world.step();
            outcome = task.on_tick(&world, &world);
            if !matches!(outcome, TickOutcome::Continue) {
                break;
            }
        }
        assert!(matches!(outcome, TickOutcome::Succeeded));
        let actor = world.actor_position().unwrap();
        assert!(actor.squared_distance(Vec3::new(10.5, 0.0, 10.5)) < 0.25);
    }

    #[test]
    fn fails_when_actor_unavailable() {
        let world = SimWorld::new();
        world.remove_actor();
        let mut task = MoveTask::new(Vec3::new(5.0, 0.0, 5.0));
        assert!(matches!(task.on_tick(&world, &world), TickOutcome::Failed));
        assert_eq!(world.release_count(), 1);
    }

    #[test]
    fn interrupts_with_break_task_for_breakable_obstruction() {
        let world = SimWorld::new();
        world.set_actor_position(Vec3::new(0.5, 0.0, 0.5));
        // A leaf block directly in the path at feet height.
        world.set_block(BlockPos::new(1, 0, 0), BlockKind::Foliage(BlockId::from("minecraft:oak_leaves")));

        let mut task = MoveTask::new(Vec3::new(10.5, 0.0, 0.5))
            .breaking_through(Rc::new(|id: &BlockId| id.as_str().ends_with("_leaves")));

        match task.on_tick(&world, &world) {
            TickOutcome::InterruptWith(sub) => assert_eq!(sub.name(), "break"),
            other => panic!("expected interrupt, got {other:?}"),
        }
    }

    #[test]
    fn walks_into_unbreakable_obstruction() {
        let world = SimWorld::new();
        world.set_actor_position(Vec3::new(0.5, 0.0, 0.5));
        world.set_block(BlockPos::new(1, 0, 0), BlockKind::Solid(BlockId::from("minecraft:stone")));

        let mut task = MoveTask::new(Vec3::new(10.5, 0.0, 0.5));
        assert!(matches!(task.on_tick(&world, &world), TickOutcome::Continue));
    }
}
