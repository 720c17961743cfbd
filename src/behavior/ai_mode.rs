//! Automation supervisor.
//!
//! `AiMode` carries no goal of its own: it exists as the capability other
//! automation hangs off (they require it, it requires any one of them), and
//! it watches the actor for damage. Taking damage while automation runs is
//! the panic button: the supervisor disables itself, and the dependency
//! graph tears down everything that required it.

use std::rc::Rc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::capability::capability::{CapabilityBehavior, TickControl};
use crate::world::{Actuator, WorldQuery};

/// Supervisor parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiModeConfig {
    /// Disable all automation when the actor takes damage.
    pub cancel_on_damage: bool,
}

impl Default for AiModeConfig {
    fn default() -> Self {
        Self { cancel_on_damage: true }
    }
}

/// Watches actor health and pulls the plug on damage.
pub struct AiMode {
    config: AiModeConfig,
    world: Rc<dyn WorldQuery>,
    actuator: Rc<dyn Actuator>,
    last_health: Option<f32>,
}

impl AiMode {
    pub fn new(config: AiModeConfig, world: Rc<dyn WorldQuery>, actuator: Rc<dyn Actuator>) -> Self {
        Self {
            config,
            world,
            actuator,
            last_health: None,
        }
    }
}

impl CapabilityBehavior for AiMode {
    fn on_enabled(&mut self) {
        self.last_health = self.world.actor_health();
        info!("ai_mode enabled (cancel_on_damage: {})", self.config.cancel_on_damage);
    }

    fn on_disabled(&mut self) {
        self.last_health = None;
        self.actuator.release_all_controls();
        info!("ai_mode disabled");
    }

    fn tick(&mut self) -> TickControl {
        let health = self.world.actor_health();
        if self.config.cancel_on_damage {
            if let (Some(previous), Some(current)) = (self.last_health, health) {
                if current < previous {
                    warn!("damage taken ({previous} -> {current}), cancelling automation");
                    return TickControl::DisableSelf;
                }
            }
        }
        self.last_health = health;
        TickControl::Continue
    }
}
