//! Demo driver: run the standard capability set against the in-memory
//! world for a fixed number of ticks and report what got chopped.
//!
//! ```sh
//! RUST_LOG=debug cargo run --bin simulate -- 600
//! ```

use std::rc::Rc;

use anyhow::{Context, Result};
use log::info;

use autopilot::capability::CapabilityRegistry;
use autopilot::geometry::BlockPos;
use autopilot::presets::{self, StandardConfig};
use autopilot::sim::SimWorld;
use autopilot::world::BlockId;
use autopilot::{Autopilot, Clock, ToggleRequest};

const DEFAULT_TICKS: usize = 600;

fn main() -> Result<()> {
    env_logger::init();

    let ticks = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<usize>().context("tick count must be a number")?,
        None => DEFAULT_TICKS,
    };

    let world = Rc::new(SimWorld::new());
    let oak = BlockId::from("minecraft:oak_log");
    let leaves = BlockId::from("minecraft:oak_leaves");
    world.plant_tree(BlockPos::new(6, 0, 2), 4, &oak, Some((2, &leaves)));
    world.plant_tree(BlockPos::new(-5, 0, 7), 3, &oak, None);

    let config = StandardConfig {
        wood_cutter: autopilot::WoodCutterConfig {
            search_range: 16,
            ..Default::default()
        },
        ..StandardConfig::default()
    };
    let registry = CapabilityRegistry::build(presets::standard_capabilities(
        config,
        world.clone(),
        world.clone(),
    ))?;

    let mut autopilot = Autopilot::new(registry);
    autopilot.handle().send(ToggleRequest::Enable(presets::WOOD_CUTTER));

    info!("autopilot {} simulating {ticks} ticks", autopilot::VERSION);
    for _ in 0..ticks {
        autopilot.on_tick();
        world.step();
    }

    let remaining_logs = world.count_blocks(|kind| kind.id().map_or(false, |id| id == &oak));
    println!("ticks:          {ticks}");
    println!("logs remaining: {remaining_logs}");
    println!("logs collected: {}", world.collected(&oak));
    println!("drops on floor: {}", world.remaining_drops());
    println!("transitions:");
    for event in autopilot.registry().recent_transitions() {
        println!(
            "  #{:<3} {} -> {}",
            event.sequence,
            event.capability,
            if event.enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}
