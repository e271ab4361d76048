use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use outpost::{
    catalog::ResourceKind,
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    world::Speed,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless colony simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/frontier.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Speed multiplier: 1, 2 or 4
    #[arg(long)]
    speed: Option<u32>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    let mut world = scenario.build_world()?;
    if let Some(multiplier) = cli.speed {
        let speed = Speed::from_multiplier(multiplier)
            .ok_or_else(|| anyhow::anyhow!("speed must be 1, 2 or 4, got {multiplier}"))?;
        world.set_speed(speed);
    }
    let ticks = scenario.ticks(cli.ticks);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = EngineBuilder::new(settings)
        .with_standard_systems()
        .build();

    tracing::info!(scenario = %scenario.name, ticks, "simulation starting");
    engine.run(&mut world, ticks)?;

    let stock: Vec<String> = ResourceKind::ALL
        .iter()
        .map(|kind| format!("{kind} {}", world.resource(*kind)))
        .collect();
    println!(
        "Scenario '{}' stopped at tick {} (day {}). Colonists: {}. Stock: {}",
        scenario.name,
        world.tick(),
        world.day(),
        world.colonists().count(),
        stock.join(", ")
    );
    if let Some(ending) = world.story().ending {
        println!("{}", ending.message());
    }
    for line in world.events().iter() {
        println!("  {line}");
    }
    Ok(())
}
