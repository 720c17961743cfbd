//! Autonomous tree felling.
//!
//! The controller cycles through the generic behavior states: find the
//! nearest tree root within range, walk to it, break the log column from
//! the root upward (clearing foliage or other junk wedged into the
//! column), then pick up the matching drops. Targets are revalidated
//! before every sub-task is issued: another actor mining the tracked
//! block between ticks demotes the cycle back to searching rather than
//! wedging it.

use std::rc::Rc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::BehaviorState;
use crate::capability::capability::{CapabilityBehavior, TickControl};
use crate::geometry::{BlockPos, Vec3};
use crate::task::move_task::BlockPredicate;
use crate::task::scheduler::{TaskResult, TaskScheduler};
use crate::task::{BreakBlockTask, MoveTask};
use crate::world::{Actuator, BlockId, BlockKind, EntityKind, WorldQuery};

/// How far above the current log the column scan looks for the next log
/// before declaring the tree exhausted.
const COLUMN_SCAN_LIMIT: i32 = 5;

/// Stop the approach this far from the trunk base; the break reach covers
/// the rest.
const APPROACH_DISTANCE: f64 = 2.0;

/// Immutable wood-cutting parameters, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WoodCutterConfig {
    /// Horizontal/vertical search radius for tree roots, in blocks.
    pub search_range: i32,
    /// Block ids treated as logs.
    pub log_blocks: Vec<BlockId>,
    /// Block ids treated as clearable foliage on the way up or en route.
    pub leaves_blocks: Vec<BlockId>,
    /// Whether to gather drops after felling a tree.
    pub collect_drops: bool,
    /// Radius to gather drops within.
    pub collect_radius: f64,
}

impl Default for WoodCutterConfig {
    fn default() -> Self {
        Self {
            search_range: 32,
            log_blocks: ["minecraft:oak_log", "minecraft:spruce_log", "minecraft:birch_log"]
                .into_iter()
                .map(BlockId::from)
                .collect(),
            leaves_blocks: ["minecraft:oak_leaves", "minecraft:spruce_leaves", "minecraft:birch_leaves"]
                .into_iter()
                .map(BlockId::from)
                .collect(),
            collect_drops: true,
            collect_radius: 10.0,
        }
    }
}

/// What the scan above the current log found.
enum ColumnScan {
    NextLog(BlockPos),
    Obstruction(BlockPos),
    Exhausted,
}

/// The wood-cutting behavior controller.
pub struct WoodCutter {
    config: WoodCutterConfig,
    world: Rc<dyn WorldQuery>,
    scheduler: TaskScheduler,
    state: BehaviorState,
    tree_root: Option<BlockPos>,
    current_log: Option<BlockPos>,
}

impl WoodCutter {
    pub fn new(config: WoodCutterConfig, world: Rc<dyn WorldQuery>, actuator: Rc<dyn Actuator>) -> Self {
        Self {
            config,
            world,
            scheduler: TaskScheduler::new(actuator),
            state: BehaviorState::Idle,
            tree_root: None,
            current_log: None,
        }
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    fn is_log(&self, kind: &BlockKind) -> bool {
        kind.id().map_or(false, |id| self.config.log_blocks.contains(id))
    }

    /// Obstructions that move/break tasks may clear: logs and foliage.
    fn breakable_predicate(&self) -> BlockPredicate {
        let mut allowed = self.config.log_blocks.clone();
        allowed.extend(self.config.leaves_blocks.iter().cloned());
        Rc::new(move |id: &BlockId| allowed.contains(id))
    }

    /// Nearest tree root within range: the lowest log of the closest
    /// column that contains one.
    fn find_best_tree(&self, actor: Vec3) -> Option<BlockPos> {
        let center = BlockPos::of_floored(actor);
        let range = self.config.search_range;
        let mut best: Option<(BlockPos, f64)> = None;

        for x in -range..=range {
            for y in -range..=range {
                for z in -range..=range {
                    let pos = center.offset(x, y, z);
                    if !self.is_log(&self.world.block_at(pos)) {
                        continue;
                    }
                    let root = self.walk_down_to_root(pos);
                    let distance = root.center().squared_distance(actor);
                    if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                        best = Some((root, distance));
                    }
                }
            }
        }
        best.map(|(root, _)| root)
    }

    /// Follow a log column downward to its lowest log. Stops at air so a
    /// floating log is its own root.
    fn walk_down_to_root(&self, mut pos: BlockPos) -> BlockPos {
        loop {
            let below = pos.down();
            let kind = self.world.block_at(below);
            if self.is_log(&kind) {
                pos = below;
            } else {
                return pos;
            }
        }
    }

    /// Look above the current log for the next one, reporting anything
    /// solid wedged in between as an obstruction to clear first.
    fn scan_column(&self, current: BlockPos) -> ColumnScan {
        let mut check = current.up();
        for _ in 0..COLUMN_SCAN_LIMIT {
            let kind = self.world.block_at(check);
            if self.is_log(&kind) {
                return ColumnScan::NextLog(check);
            }
            if !kind.is_passable() {
                return ColumnScan::Obstruction(check);
            }
            check = check.up();
        }
        ColumnScan::Exhausted
    }

    /// Nearest uncollected log drop within the collection radius.
    fn find_nearest_drop(&self, actor: Vec3) -> Option<Vec3> {
        self.world
            .nearby_entities(actor, self.config.collect_radius)
            .into_iter()
            .filter(|entity| match &entity.kind {
                EntityKind::ItemDrop(block) => self.config.log_blocks.contains(block),
                EntityKind::Other => false,
            })
            .map(|entity| entity.pos)
            .min_by(|a, b| {
                a.squared_distance(actor)
                    .total_cmp(&b.squared_distance(actor))
            })
    }

    fn reset_targets(&mut self) {
        self.tree_root = None;
        self.current_log = None;
    }

    fn fall_back_to_searching(&mut self, reason: &str) {
        debug!("wood_cutter: {reason}, falling back to search");
        self.reset_targets();
        self.state = BehaviorState::Searching;
    }

    fn advance(&mut self) {
        match self.state {
            BehaviorState::Idle => {
                self.state = BehaviorState::Searching;
            }

            BehaviorState::Searching => {
                let Some(actor) = self.world.actor_position() else {
                    return;
                };
                match self.find_best_tree(actor) {
                    Some(root) => {
                        info!("wood_cutter: tree found at {root}, approaching");
                        self.tree_root = Some(root);
                        self.scheduler.enqueue(Box::new(
                            MoveTask::with_required_distance(root.bottom_center(), APPROACH_DISTANCE)
                                .breaking_through(self.breakable_predicate()),
                        ));
                        self.state = BehaviorState::Approaching;
                    }
                    None => {
                        debug!("wood_cutter: no tree in range");
                        self.state = BehaviorState::Idle;
                    }
                }
            }

            BehaviorState::Approaching => {
                if !self.scheduler.is_idle() {
                    return;
                }
                let root = self.tree_root;
                match (self.scheduler.last_outcome(), root) {
                    (Some(TaskResult::Succeeded), Some(root)) => {
                        // The root may have vanished while we walked.
                        if self.is_log(&self.world.block_at(root)) || self.world.block_at(root).is_air() {
                            info!("wood_cutter: reached tree, felling");
                            self.current_log = Some(root);
                            self.scheduler.enqueue(Box::new(BreakBlockTask::new(root)));
                            self.state = BehaviorState::Acting;
                        } else {
                            self.fall_back_to_searching("root replaced by foreign block");
                        }
                    }
                    _ => self.fall_back_to_searching("approach did not complete"),
                }
            }

            BehaviorState::Acting => {
                if !self.scheduler.is_idle() {
                    return;
                }
                if self.scheduler.last_outcome() == Some(TaskResult::Failed) {
                    self.fall_back_to_searching("break task failed");
                    return;
                }
                let Some(current) = self.current_log else {
                    self.fall_back_to_searching("lost track of the current log");
                    return;
                };

                // Revalidate before issuing the next sub-task.
                if !self.world.block_at(current).is_air() {
                    self.scheduler.enqueue(Box::new(BreakBlockTask::new(current)));
                    return;
                }

                match self.scan_column(current) {
                    ColumnScan::Obstruction(pos) => {
                        debug!("wood_cutter: clearing obstruction at {pos}");
                        self.scheduler.enqueue(Box::new(BreakBlockTask::new(pos)));
                    }
                    ColumnScan::NextLog(pos) => {
                        self.current_log = Some(pos);
                        self.scheduler.enqueue(Box::new(BreakBlockTask::new(pos)));
                    }
                    ColumnScan::Exhausted => {
                        self.current_log = None;
                        if self.config.collect_drops {
                            info!("wood_cutter: tree felled, collecting drops");
                            self.state = BehaviorState::Collecting;
                        } else {
                            info!("wood_cutter: tree felled");
                            self.reset_targets();
                            self.state = BehaviorState::Searching;
                        }
                    }
                }
            }

            BehaviorState::Collecting => {
                if !self.scheduler.is_idle() {
                    return;
                }
                if self.scheduler.last_outcome() == Some(TaskResult::Failed) {
                    self.fall_back_to_searching("collection move failed");
                    return;
                }
                let Some(actor) = self.world.actor_position() else {
                    self.fall_back_to_searching("actor unavailable");
                    return;
                };
                match self.find_nearest_drop(actor) {
                    Some(pos) => {
                        debug!("wood_cutter: moving to drop at {pos}");
                        self.scheduler.enqueue(Box::new(MoveTask::new(pos)));
                    }
                    None => {
                        info!("wood_cutter: collection complete, seeking next tree");
                        self.reset_targets();
                        self.state = BehaviorState::Searching;
                    }
                }
            }
        }
    }
}

impl CapabilityBehavior for WoodCutter {
    fn on_enabled(&mut self) {
        info!("wood_cutter enabled, starting cycle");
        self.state = BehaviorState::Idle;
    }

    fn on_disabled(&mut self) {
        info!("wood_cutter disabled, task stopped");
        self.scheduler.clear();
        self.reset_targets();
        self.state = BehaviorState::Idle;
    }

    fn tick(&mut self) -> TickControl {
        self.advance();
        self.scheduler.tick(self.world.as_ref());
        TickControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWorld;

    fn test_config() -> WoodCutterConfig {
        WoodCutterConfig {
            search_range: 8,
            ..WoodCutterConfig::default()
        }
    }

    fn run_ticks(cutter: &mut WoodCutter, world: &Rc<SimWorld>, ticks: usize) {
        for _ in 0..ticks {
            cutter.tick();
            world.step();
        }
    }

    #[test]
    fn config_deserializes_from_json() {
        let config: WoodCutterConfig = serde_json::from_str(
            r#"{
                "search_range": 24,
                "log_blocks": ["minecraft:oak_log"],
                "leaves_blocks": ["minecraft:oak_leaves"],
                "collect_drops": false,
                "collect_radius": 6.0
            }"#,
        )
        .unwrap();
        assert_eq!(config.search_range, 24);
        assert!(!config.collect_drops);
        assert_eq!(config.log_blocks, vec![BlockId::from("minecraft:oak_log")]);
    }

    #[test]
    fn idles_when_no_tree_in_range() {
        let world = Rc::new(SimWorld::new());
        let mut cutter = WoodCutter::new(test_config(), world.clone(), world.clone());
        cutter.on_enabled();

        run_ticks(&mut cutter, &world, 10);
        assert!(matches!(cutter.state(), BehaviorState::Idle | BehaviorState::Searching));
    }

    #[test]
    fn fells_a_tree_and_collects_the_logs() {
        let world = Rc::new(SimWorld::new());
        let log = BlockId::from("minecraft:oak_log");
        let leaves = BlockId::from("minecraft:oak_leaves");
        // Logs at levels 0, 1 and 3 with foliage wedged in at level 2.
        world.plant_tree(BlockPos::new(4, 0, 4), 4, &log, Some((2, &leaves)));

        let mut cutter = WoodCutter::new(test_config(), world.clone(), world.clone());
        cutter.on_enabled();

        run_ticks(&mut cutter, &world, 400);

        assert_eq!(
            world.count_blocks(|kind| kind.id().map_or(false, |id| id == &log)),
            0,
            "all logs broken"
        );
        assert_eq!(world.collected(&log), 3, "every log drop collected");
    }

    #[test]
    fn skips_collection_when_disabled_in_config() {
        let world = Rc::new(SimWorld::new());
        let log = BlockId::from("minecraft:oak_log");
        world.plant_tree(BlockPos::new(3, 0, 0), 2, &log, None);

        let config = WoodCutterConfig {
            collect_drops: false,
            ..test_config()
        };
        let mut cutter = WoodCutter::new(config, world.clone(), world.clone());
        cutter.on_enabled();

        run_ticks(&mut cutter, &world, 200);

        assert_eq!(world.count_blocks(|kind| !kind.is_air()), 0);
        assert_eq!(world.collected(&log), 0, "drops left on the ground");
        assert!(world.remaining_drops() > 0);
    }

    #[test]
    fn vanished_target_falls_back_to_searching() {
        let world = Rc::new(SimWorld::new());
        let log = BlockId::from("minecraft:oak_log");
        let root = BlockPos::new(6, 0, 0);
        world.plant_tree(root, 3, &log, None);

        let mut cutter = WoodCutter::new(test_config(), world.clone(), world.clone());
        cutter.on_enabled();
        run_ticks(&mut cutter, &world, 3);
        assert_eq!(cutter.state(), BehaviorState::Approaching);

        // Another actor takes the whole tree while we walk.
        for level in 0..3 {
            world.set_block(root.offset(0, level, 0), BlockKind::Air);
        }
        run_ticks(&mut cutter, &world, 60);

        // The cycle never wedges: it ends up idling or searching again.
        assert!(matches!(
            cutter.state(),
            BehaviorState::Idle | BehaviorState::Searching
        ));
    }

    #[test]
    fn disable_resets_state_and_clears_scheduler() {
        let world = Rc::new(SimWorld::new());
        let log = BlockId::from("minecraft:oak_log");
        world.plant_tree(BlockPos::new(4, 0, 0), 3, &log, None);

        let mut cutter = WoodCutter::new(test_config(), world.clone(), world.clone());
        cutter.on_enabled();
        run_ticks(&mut cutter, &world, 5);
        assert_ne!(cutter.state(), BehaviorState::Idle);

        cutter.on_disabled();
        assert_eq!(cutter.state(), BehaviorState::Idle);
        assert!(!world.movement_intent().forward, "controls released");
        assert!(!world.interact_held());
    }
}
