//! Collaborator interfaces to the surrounding client.
//!
//! The core never touches the game world directly: it reads through
//! [`WorldQuery`] and writes through [`Actuator`]. Both are implemented by
//! surrounding host code (or by [`crate::sim::SimWorld`] in tests) and are
//! synchronous. Actor accessors return `Option`: a missing player/world is
//! an ordinary condition that tasks translate into a failed outcome, never
//! a panic.

use serde::{Deserialize, Serialize};

use crate::geometry::{BlockPos, Vec3};

/// Namespaced block identifier, e.g. `minecraft:oak_log`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        BlockId(s.to_string())
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What occupies a block position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Nothing there.
    Air,
    /// A solid, collidable block.
    Solid(BlockId),
    /// Foliage (leaves and the like): collidable but cheap to clear.
    Foliage(BlockId),
    /// A liquid: passable, not breakable.
    Liquid(BlockId),
}

impl BlockKind {
    pub fn is_air(&self) -> bool {
        matches!(self, BlockKind::Air)
    }

    /// Whether an actor can walk through this block.
    pub fn is_passable(&self) -> bool {
        matches!(self, BlockKind::Air | BlockKind::Liquid(_))
    }

    /// The block id, if any.
    pub fn id(&self) -> Option<&BlockId> {
        match self {
            BlockKind::Air => None,
            BlockKind::Solid(id) | BlockKind::Foliage(id) | BlockKind::Liquid(id) => Some(id),
        }
    }
}

/// The kind of entity seen by a world scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A dropped item stack for the given block.
    ItemDrop(BlockId),
    /// Anything else (mobs, players, ...).
    Other,
}

/// A snapshot reference to a nearby entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u64,
    pub kind: EntityKind,
    pub pos: Vec3,
}

/// Read-only, synchronous view of the world.
pub trait WorldQuery {
    /// The block at `pos`. Unknown positions read as air.
    fn block_at(&self, pos: BlockPos) -> BlockKind;

    /// Whether an actor can occupy `pos`.
    fn is_passable(&self, pos: BlockPos) -> bool {
        self.block_at(pos).is_passable()
    }

    /// Entities within `radius` of `center`.
    fn nearby_entities(&self, center: Vec3, radius: f64) -> Vec<EntityRef>;

    /// Controlled actor's position, if the actor exists and is alive.
    fn actor_position(&self) -> Option<Vec3>;

    /// Controlled actor's eye position. Defaults to 1.6 above the feet.
    fn actor_eye_position(&self) -> Option<Vec3> {
        self.actor_position().map(|p| Vec3::new(p.x, p.y + 1.6, p.z))
    }

    /// Controlled actor's health, if available.
    fn actor_health(&self) -> Option<f32>;
}

/// Desired movement for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementIntent {
    /// Direction of travel (not required to be normalized).
    pub direction: Vec3,
    /// Hold the forward control.
    pub forward: bool,
    /// Hold the jump control.
    pub jump: bool,
}

/// Write-only, synchronous, idempotent control surface.
///
/// Implementations simulate input state; repeated identical calls within a
/// tick must be harmless.
pub trait Actuator {
    /// Set the movement controls for this tick.
    fn set_movement_intent(&self, intent: MovementIntent);

    /// Press or release the interact (attack/break) control.
    fn set_interact_intent(&self, pressed: bool);

    /// Point the actor's view at a world position.
    fn set_look_target(&self, target: Vec3);

    /// Release every held control. Called between tasks so no stale input
    /// state survives a task transition.
    fn release_all_controls(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_kind_passability() {
        assert!(BlockKind::Air.is_passable());
        assert!(BlockKind::Liquid(BlockId::from("minecraft:water")).is_passable());
        assert!(!BlockKind::Solid(BlockId::from("minecraft:stone")).is_passable());
        assert!(!BlockKind::Foliage(BlockId::from("minecraft:oak_leaves")).is_passable());
    }

    #[test]
    fn block_kind_id() {
        assert_eq!(BlockKind::Air.id(), None);
        let leaves = BlockKind::Foliage(BlockId::from("minecraft:oak_leaves"));
        assert_eq!(leaves.id().map(BlockId::as_str), Some("minecraft:oak_leaves"));
    }
}
