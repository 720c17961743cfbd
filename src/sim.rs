//! In-memory world harness.
//!
//! `SimWorld` implements both collaborator interfaces ([`WorldQuery`] and
//! [`Actuator`]) over a block grid with deliberately simple mechanics:
//! the actor glides toward the held movement direction, held interact
//! breaks the looked-at block after a few ticks and spawns a drop, and
//! drops within pickup range are collected. Just enough physics to drive
//! the task layer and the behavior controllers end to end in tests and in
//! the `simulate` binary; not a game engine.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::geometry::{BlockPos, Vec3};
use crate::world::{Actuator, BlockId, BlockKind, EntityKind, EntityRef, MovementIntent, WorldQuery};

/// Blocks moved per tick while the forward control is held.
const MOVE_SPEED: f64 = 0.25;
/// Ticks of held interact needed to break a block.
const BREAK_TICKS: u32 = 3;
/// Distance at which drops are picked up.
const PICKUP_RADIUS: f64 = 0.7;

#[derive(Debug, Clone)]
struct ActorState {
    pos: Vec3,
    health: f32,
}

#[derive(Default)]
struct SimState {
    blocks: HashMap<BlockPos, BlockKind>,
    entities: Vec<EntityRef>,
    next_entity_id: u64,
    actor: Option<ActorState>,
    intent: MovementIntent,
    interact: bool,
    look: Option<Vec3>,
    breaking: Option<(BlockPos, u32)>,
    releases: u64,
    collected: HashMap<BlockId, u32>,
}

/// Simulated world and actor. Single-threaded, interior-mutable, shared by
/// `Rc` between the core (through the collaborator traits) and the test
/// driving it.
pub struct SimWorld {
    state: RefCell<SimState>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// Empty world with the actor standing at the origin, full health.
    pub fn new() -> Self {
        let world = Self {
            state: RefCell::new(SimState::default()),
        };
        world.state.borrow_mut().actor = Some(ActorState {
            pos: Vec3::default(),
            health: 20.0,
        });
        world
    }

    // -----------------------------------------------------------------
    // World setup
    // -----------------------------------------------------------------

    pub fn set_block(&self, pos: BlockPos, kind: BlockKind) {
        let mut state = self.state.borrow_mut();
        if kind.is_air() {
            state.blocks.remove(&pos);
        } else {
            state.blocks.insert(pos, kind);
        }
    }

    /// Place a vertical log column, optionally with a foliage block wedged
    /// into it, the shape the wood-cutting cycle is exercised against.
    pub fn plant_tree(&self, base: BlockPos, trunk_height: i32, log: &BlockId, leaves: Option<(i32, &BlockId)>) {
        for level in 0..trunk_height {
            self.set_block(base.offset(0, level, 0), BlockKind::Solid(log.clone()));
        }
        if let Some((level, leaves_id)) = leaves {
            self.set_block(base.offset(0, level, 0), BlockKind::Foliage(leaves_id.clone()));
        }
    }

    pub fn spawn_drop(&self, pos: Vec3, block: BlockId) {
        let mut state = self.state.borrow_mut();
        let id = state.next_entity_id;
        state.next_entity_id += 1;
        state.entities.push(EntityRef {
            id,
            kind: EntityKind::ItemDrop(block),
            pos,
        });
    }

    pub fn set_actor_position(&self, pos: Vec3) {
        let mut state = self.state.borrow_mut();
        match &mut state.actor {
            Some(actor) => actor.pos = pos,
            None => {
                state.actor = Some(ActorState { pos, health: 20.0 });
            }
        }
    }

    /// Remove the actor entirely (dead / world unloaded).
    pub fn remove_actor(&self) {
        self.state.borrow_mut().actor = None;
    }

    /// Apply damage to the actor.
    pub fn hurt_actor(&self, amount: f32) {
        if let Some(actor) = &mut self.state.borrow_mut().actor {
            actor.health = (actor.health - amount).max(0.0);
        }
    }

    // -----------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------

    /// How many times `release_all_controls` has been called.
    pub fn release_count(&self) -> u64 {
        self.state.borrow().releases
    }

    pub fn movement_intent(&self) -> MovementIntent {
        self.state.borrow().intent
    }

    pub fn interact_held(&self) -> bool {
        self.state.borrow().interact
    }

    /// Number of drops of the given block collected so far.
    pub fn collected(&self, block: &BlockId) -> u32 {
        self.state.borrow().collected.get(block).copied().unwrap_or(0)
    }

    pub fn remaining_drops(&self) -> usize {
        self.state
            .borrow()
            .entities
            .iter()
            .filter(|entity| matches!(entity.kind, EntityKind::ItemDrop(_)))
            .count()
    }

    /// Count of non-air blocks matching the predicate.
    pub fn count_blocks(&self, predicate: impl Fn(&BlockKind) -> bool) -> usize {
        self.state.borrow().blocks.values().filter(|kind| predicate(kind)).count()
    }

    // -----------------------------------------------------------------
    // Mechanics
    // -----------------------------------------------------------------

    /// Advance the world by one tick: movement, block breaking, pickup.
    pub fn step(&self) {
        let mut state = self.state.borrow_mut();
        // Reborrow past the guard so field borrows are disjoint.
        let state = &mut *state;

        // Movement.
        if let Some(actor) = &mut state.actor {
            if state.intent.forward {
                let step = state.intent.direction.normalized().scale(MOVE_SPEED);
                actor.pos = actor.pos.add(step);
            }
        }

        // Breaking: held interact chips away at the looked-at block.
        if state.interact {
            if let Some(look) = state.look {
                let target = BlockPos::of_floored(look);
                let breakable = matches!(
                    state.blocks.get(&target),
                    Some(BlockKind::Solid(_) | BlockKind::Foliage(_))
                );
                if breakable {
                    let progress = match state.breaking {
                        Some((pos, ticks)) if pos == target => ticks + 1,
                        _ => 1,
                    };
                    if progress >= BREAK_TICKS {
                        if let Some(kind) = state.blocks.remove(&target) {
                            if let Some(id) = kind.id().cloned() {
                                let entity_id = state.next_entity_id;
                                state.next_entity_id += 1;
                                state.entities.push(EntityRef {
                                    id: entity_id,
                                    kind: EntityKind::ItemDrop(id),
                                    pos: target.center(),
                                });
                            }
                        }
                        state.breaking = None;
                    } else {
                        state.breaking = Some((target, progress));
                    }
                } else {
                    state.breaking = None;
                }
            }
        } else {
            state.breaking = None;
        }

        // Pickup.
        if let Some(actor_pos) = state.actor.as_ref().map(|actor| actor.pos) {
            let mut kept = Vec::with_capacity(state.entities.len());
            let mut picked = Vec::new();
            for entity in state.entities.drain(..) {
                let within = entity.pos.squared_distance(actor_pos) <= PICKUP_RADIUS * PICKUP_RADIUS;
                match (&entity.kind, within) {
                    (EntityKind::ItemDrop(block), true) => picked.push(block.clone()),
                    _ => kept.push(entity),
                }
            }
            state.entities = kept;
            for block in picked {
                *state.collected.entry(block).or_insert(0) += 1;
            }
        }
    }

    /// Advance `n` ticks.
    pub fn step_n(&self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }
}

impl WorldQuery for SimWorld {
    fn block_at(&self, pos: BlockPos) -> BlockKind {
        self.state.borrow().blocks.get(&pos).cloned().unwrap_or(BlockKind::Air)
    }

    fn nearby_entities(&self, center: Vec3, radius: f64) -> Vec<EntityRef> {
        self.state
            .borrow()
            .entities
            .iter()
            .filter(|entity| entity.pos.squared_distance(center) <= radius * radius)
            .cloned()
            .collect()
    }

    fn actor_position(&self) -> Option<Vec3> {
        self.state.borrow().actor.as_ref().map(|actor| actor.pos)
    }

    fn actor_health(&self) -> Option<f32> {
        self.state.borrow().actor.as_ref().map(|actor| actor.health)
    }
}

impl Actuator for SimWorld {
    fn set_movement_intent(&self, intent: MovementIntent) {
        self.state.borrow_mut().intent = intent;
    }

    fn set_interact_intent(&self, pressed: bool) {
        self.state.borrow_mut().interact = pressed;
    }

    fn set_look_target(&self, target: Vec3) {
        self.state.borrow_mut().look = Some(target);
    }

    fn release_all_controls(&self) {
        let mut state = self.state.borrow_mut();
        state.intent = MovementIntent::default();
        state.interact = false;
        state.look = None;
        state.releases += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_follows_held_direction() {
        let world = SimWorld::new();
        world.set_movement_intent(MovementIntent {
            direction: Vec3::new(1.0, 0.0, 0.0),
            forward: true,
            jump: false,
        });
        world.step_n(4);
        assert_eq!(world.actor_position().unwrap(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn movement_and_breaking_advance_in_the_same_tick() {
        let world = SimWorld::new();
        let log = BlockId::from("minecraft:oak_log");
        let pos = BlockPos::new(3, 0, 0);
        world.set_block(pos, BlockKind::Solid(log));

        world.set_movement_intent(MovementIntent {
            direction: Vec3::new(1.0, 0.0, 0.0),
            forward: true,
            jump: false,
        });
        world.set_look_target(pos.center());
        world.set_interact_intent(true);
        world.step_n(3);

        assert_eq!(world.actor_position().unwrap(), Vec3::new(0.75, 0.0, 0.0));
        assert!(world.block_at(pos).is_air());
    }

    #[test]
    fn breaking_takes_a_few_ticks_and_spawns_a_drop() {
        let world = SimWorld::new();
        let log = BlockId::from("minecraft:oak_log");
        let pos = BlockPos::new(2, 0, 0);
        world.set_block(pos, BlockKind::Solid(log.clone()));

        world.set_look_target(pos.center());
        world.set_interact_intent(true);
        world.step();
        assert!(!world.block_at(pos).is_air(), "one tick is not enough");
        world.step_n(2);
        assert!(world.block_at(pos).is_air());
        assert_eq!(world.remaining_drops(), 1);
    }

    #[test]
    fn drops_within_range_are_collected() {
        let world = SimWorld::new();
        let log = BlockId::from("minecraft:oak_log");
        world.spawn_drop(Vec3::new(0.3, 0.0, 0.0), log.clone());
        world.spawn_drop(Vec3::new(9.0, 0.0, 0.0), log.clone());

        world.step();
        assert_eq!(world.collected(&log), 1);
        assert_eq!(world.remaining_drops(), 1);
    }

    #[test]
    fn release_resets_controls() {
        let world = SimWorld::new();
        world.set_movement_intent(MovementIntent {
            direction: Vec3::new(1.0, 0.0, 0.0),
            forward: true,
            jump: true,
        });
        world.set_interact_intent(true);
        world.release_all_controls();

        assert!(!world.movement_intent().forward);
        assert!(!world.interact_held());
        assert_eq!(world.release_count(), 1);
    }
}
