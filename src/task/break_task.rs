//! Breaking a single block by holding the interact control.

use uuid::Uuid;

use super::{Task, TickOutcome};
use crate::geometry::BlockPos;
use crate::world::{Actuator, WorldQuery};

/// Default interact reach, in blocks.
pub const DEFAULT_MAX_REACH: f64 = 5.0;

/// Holds the interact control on a block until it reads as air.
///
/// The block already being gone counts as success: the task's goal is the
/// absence of the block, not the act of breaking it. Out of reach or a
/// missing actor is a failure for the owner to react to.
pub struct BreakBlockTask {
    id: Uuid,
    target: BlockPos,
    max_reach: f64,
}

impl BreakBlockTask {
    pub fn new(target: BlockPos) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            max_reach: DEFAULT_MAX_REACH,
        }
    }

    pub fn with_reach(target: BlockPos, max_reach: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            max_reach,
        }
    }

    pub fn target(&self) -> BlockPos {
        self.target
    }
}

impl Task for BreakBlockTask {
    fn on_tick(&mut self, world: &dyn WorldQuery, actuator: &dyn Actuator) -> TickOutcome {
        if world.block_at(self.target).is_air() {
            actuator.release_all_controls();
            return TickOutcome::Succeeded;
        }

        let Some(eye) = world.actor_eye_position() else {
            actuator.release_all_controls();
            return TickOutcome::Failed;
        };

        let center = self.target.center();
        if eye.distance(center) > self.max_reach {
            actuator.release_all_controls();
            return TickOutcome::Failed;
        }

        actuator.set_look_target(center);
        actuator.set_interact_intent(true);
        TickOutcome::Continue
    }

    fn name(&self) -> &str {
        "break"
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;
    use crate::sim::SimWorld;
    use crate::world::{BlockId, BlockKind};

    #[test]
    fn breaks_block_within_reach() {
        let world = SimWorld::new();
        world.set_actor_position(Vec3::new(0.5, 0.0, 0.5));
        let pos = BlockPos::new(2, 1, 0);
        world.set_block(pos, BlockKind::Solid(BlockId::from("minecraft:oak_log")));

        let mut task = BreakBlockTask::new(pos);
        let mut succeeded = false;
        for _ in 0..20 {
            match task.on_tick(&world, &world) {
                TickOutcome::Continue => world.step(),
                TickOutcome::Succeeded => {
                    succeeded = true;
                    break;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert!(succeeded);
        assert!(world.block_at(pos).is_air());
    }

    #[test]
    fn already_gone_block_is_immediate_success() {
        let world = SimWorld::new();
        world.set_actor_position(Vec3::new(0.5, 0.0, 0.5));
        let mut task = BreakBlockTask::new(BlockPos::new(3, 0, 3));
        assert!(matches!(task.on_tick(&world, &world), TickOutcome::Succeeded));
    }

    #[test]
    fn out_of_reach_fails() {
        let world = SimWorld::new();
        world.set_actor_position(Vec3::new(0.5, 0.0, 0.5));
        let pos = BlockPos::new(30, 0, 0);
        world.set_block(pos, BlockKind::Solid(BlockId::from("minecraft:stone")));

        let mut task = BreakBlockTask::new(pos);
        assert!(matches!(task.on_tick(&world, &world), TickOutcome::Failed));
    }

    #[test]
    fn missing_actor_fails() {
        let world = SimWorld::new();
        world.remove_actor();
        let pos = BlockPos::new(1, 0, 0);
        world.set_block(pos, BlockKind::Solid(BlockId::from("minecraft:stone")));

        let mut task = BreakBlockTask::new(pos);
        assert!(matches!(task.on_tick(&world, &world), TickOutcome::Failed));
    }
}
