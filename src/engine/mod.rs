use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    commands::{self, CommandError, PlayerCommand},
    rng::{RandomSource, RngManager},
    snapshot::SnapshotWriter,
    systems::{
        AnimalSystem, ColonistSystem, ProductionSystem, RegrowthSystem, StorySystem,
        WorldEventSystem,
    },
    world::{World, WorldSnapshot},
};

/// Stream used for randomness consumed by player commands (expeditions).
const COMMAND_STREAM: &str = "commands";

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    /// The full per-tick pipeline in its required order.
    pub fn with_standard_systems(self) -> Self {
        self.with_system(StorySystem::new())
            .with_system(RegrowthSystem::new())
            .with_system(ProductionSystem::new())
            .with_system(AnimalSystem::new())
            .with_system(ColonistSystem::new())
            .with_system(WorldEventSystem::new())
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub day: u32,
    pub dt: f64,
    pub days_rolled: u32,
    /// False when the tick was skipped (paused, finished, or zero dt).
    pub advanced: bool,
    pub paused: bool,
}

impl TickReport {
    fn skipped(world: &World) -> Self {
        Self {
            tick: world.tick(),
            day: world.day(),
            dt: 0.0,
            days_rolled: 0,
            advanced: false,
            paused: world.is_paused(),
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    /// One tick at the world's current speed.
    pub fn step(&mut self, world: &mut World) -> Result<TickReport> {
        let dt = world.dt();
        self.advance(world, dt)
    }

    /// One tick covering `dt` time-units. A non-positive `dt` or a paused
    /// world leaves everything untouched.
    pub fn advance(&mut self, world: &mut World, dt: f64) -> Result<TickReport> {
        if dt <= 0.0 || world.is_paused() || world.is_game_over() {
            return Ok(TickReport::skipped(world));
        }

        let days_rolled = world.advance_clock(dt);
        let ctx = SystemContext {
            tick: world.tick(),
            dt,
            day: world.day(),
            days_rolled,
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&ctx, world, &mut rng_stream)?;
            if world.is_game_over() {
                debug!(system = system.name(), "game over, skipping remaining systems");
                break;
            }
        }
        self.snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;

        Ok(TickReport {
            tick: world.tick(),
            day: world.day(),
            dt,
            days_rolled,
            advanced: true,
            paused: world.is_paused(),
        })
    }

    /// Runs up to `ticks` ticks, stopping early once the story has ended.
    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    /// Like `run`, handing the render snapshot to `hook` after every tick
    /// that advanced.
    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&WorldSnapshot),
    {
        for _ in 0..ticks {
            if world.is_game_over() {
                break;
            }
            let report = self.step(world)?;
            if report.advanced {
                hook(&world.snapshot(&self.settings.scenario_name));
            }
        }
        Ok(())
    }

    /// Applies a player command. Rejections are logged to the event feed and
    /// leave the world unchanged; the error is returned for callers that
    /// want it.
    pub fn apply(&mut self, world: &mut World, command: PlayerCommand) -> Result<(), CommandError> {
        let mut rng = self.rng.stream(COMMAND_STREAM);
        let result = commands::execute(world, command, &mut rng);
        if let Err(err) = &result {
            warn!(%err, "command rejected");
            world.log_event(err.to_string());
        }
        result
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    /// Time-units covered by this tick.
    pub dt: f64,
    pub day: u32,
    /// Day boundaries crossed by this tick.
    pub days_rolled: u32,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StructureKind, ROSTER};
    use crate::grid::{Position, Terrain, WorldGrid};

    fn engine() -> Engine {
        EngineBuilder::new(EngineSettings {
            scenario_name: "test".into(),
            seed: 7,
            snapshot_interval_ticks: 0,
            snapshot_dir: PathBuf::from("unused"),
        })
        .with_standard_systems()
        .build()
    }

    fn world() -> World {
        let mut world = World::new(WorldGrid::filled(8, Terrain::Grass), 1.0 / 60.0, 24.0);
        world.spawn_colonist(&ROSTER[0], Position::new(4, 4));
        world
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut engine = engine();
        let mut world = world();
        let before = world.clone();
        let report = engine.advance(&mut world, 0.0).unwrap();
        assert!(!report.advanced);
        assert_eq!(world, before);
    }

    #[test]
    fn paused_world_does_not_tick() {
        let mut engine = engine();
        let mut world = world();
        world.set_paused(true);
        let report = engine.step(&mut world).unwrap();
        assert!(report.paused);
        assert_eq!(world.tick(), 0);
    }

    #[test]
    fn speed_scales_dt() {
        let mut engine = engine();
        let mut world = world();
        world.set_speed(crate::world::Speed::Fastest);
        let report = engine.step(&mut world).unwrap();
        assert!((report.dt - 4.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn rejected_commands_are_logged() {
        let mut engine = engine();
        let mut world = world();
        let result = engine.apply(
            &mut world,
            PlayerCommand::RequestBuild {
                position: Position::new(1, 1),
                kind: StructureKind::Beacon,
            },
        );
        assert!(result.is_err());
        assert!(world.events().contains("Not enough wood"));
        assert_eq!(world.orders().count(), 0);
    }
}
