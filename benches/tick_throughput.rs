//! Ticks per second on the fixture scenario.
//!
//! Run with: cargo bench

use std::hint::black_box;
use std::path::PathBuf;
use std::time::Instant;

use outpost::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
};

const TICKS: u64 = 20_000;

fn main() -> anyhow::Result<()> {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader.load("scenarios/frontier.yaml")?;
    let mut world = scenario.build_world()?;
    let mut engine = EngineBuilder::new(EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: 0,
        snapshot_dir: PathBuf::from("snapshots"),
    })
    .with_standard_systems()
    .build();

    let start = Instant::now();
    engine.run(&mut world, TICKS)?;
    let elapsed = start.elapsed();
    black_box(&world);

    let ticks = world.tick().max(1);
    println!(
        "{ticks} ticks in {:.2?} ({:.1} us/tick, day {})",
        elapsed,
        elapsed.as_secs_f64() * 1e6 / ticks as f64,
        world.day()
    );
    Ok(())
}
