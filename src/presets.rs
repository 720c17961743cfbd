//! Standard capability wiring.
//!
//! One coordination capability (`ai_mode`) sits above the mutually
//! exclusive workers (`wood_cutter`, `vein_miner`). Each worker requires
//! the coordinator; the coordinator requires at least one worker. The
//! result: enabling a worker pulls the coordinator up, switching workers
//! evicts the other, and the last worker going down takes the coordinator
//! with it.

use std::rc::Rc;

use crate::behavior::{AiMode, AiModeConfig, WoodCutter, WoodCutterConfig};
use crate::capability::{Capability, CapabilityId, NoopBehavior, Relations};
use crate::world::{Actuator, WorldQuery};

pub const AI_MODE: CapabilityId = CapabilityId("automatic:ai_mode");
pub const WOOD_CUTTER: CapabilityId = CapabilityId("automatic:wood_cutter");
pub const VEIN_MINER: CapabilityId = CapabilityId("automatic:vein_miner");

/// Per-capability configuration for the standard set.
#[derive(Debug, Clone, Default)]
pub struct StandardConfig {
    pub ai_mode: AiModeConfig,
    pub wood_cutter: WoodCutterConfig,
}

/// The standard capability set, ready for
/// [`CapabilityRegistry::build`](crate::capability::CapabilityRegistry::build).
pub fn standard_capabilities(
    config: StandardConfig,
    world: Rc<dyn WorldQuery>,
    actuator: Rc<dyn Actuator>,
) -> Vec<Capability> {
    vec![
        Capability::new(
            AI_MODE,
            Relations::new().requires_any_of([WOOD_CUTTER, VEIN_MINER]),
            Box::new(AiMode::new(config.ai_mode, world.clone(), actuator.clone())),
        ),
        Capability::new(
            WOOD_CUTTER,
            Relations::new().requires_all([AI_MODE]).conflicts_with([VEIN_MINER]),
            Box::new(WoodCutter::new(config.wood_cutter, world, actuator)),
        ),
        // Graph node only; mining logic is not wired in yet.
        Capability::new(
            VEIN_MINER,
            Relations::new().requires_all([AI_MODE]).conflicts_with([WOOD_CUTTER]),
            Box::new(NoopBehavior),
        ),
    ]
}
