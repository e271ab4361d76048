use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    catalog::{roster_entry, NodeKind, ResourceKind, StructureKind},
    components::ResourcePool,
    grid::{Position, WorldGrid},
    rng::RngManager,
    world::{Speed, World},
};

pub const MAX_ROSTER: usize = 3;
const WORLDGEN_STREAM: &str = "worldgen";

fn default_map_size() -> i32 {
    24
}

fn default_base_dt() -> f64 {
    1.0 / 60.0
}

fn default_day_length() -> f64 {
    24.0
}

fn default_speed() -> u32 {
    1
}

fn default_roster() -> Vec<String> {
    vec![
        "Mara Vell".to_string(),
        "Tobias Crane".to_string(),
        "Ilse Brandt".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_map_size")]
    pub map_size: i32,
    #[serde(default = "default_base_dt")]
    pub base_dt: f64,
    #[serde(default = "default_day_length")]
    pub day_length: f64,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub snapshot_interval_ticks: u64,
    #[serde(default = "default_roster")]
    pub roster: Vec<String>,
    #[serde(default)]
    pub starting_resources: StartingResources,
    #[serde(default)]
    pub nodes: NodeCounts,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StartingResources {
    pub food: u32,
    pub wood: u32,
    pub stone: u32,
    pub tools: u32,
    pub water: u32,
}

impl Default for StartingResources {
    fn default() -> Self {
        Self {
            food: 16,
            wood: 20,
            stone: 10,
            tools: 0,
            water: 10,
        }
    }
}

impl StartingResources {
    pub fn to_pool(&self) -> ResourcePool {
        ResourcePool::from_amounts([
            (ResourceKind::Food, self.food),
            (ResourceKind::Wood, self.wood),
            (ResourceKind::Stone, self.stone),
            (ResourceKind::Tools, self.tools),
            (ResourceKind::Water, self.water),
        ])
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeCounts {
    pub trees: u32,
    pub berries: u32,
    pub rocks: u32,
}

impl Default for NodeCounts {
    fn default() -> Self {
        Self {
            trees: 14,
            berries: 8,
            rocks: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        if self.map_size < 5 {
            bail!("map_size must be at least 5, got {}", self.map_size);
        }
        if self.base_dt <= 0.0 || self.day_length <= 0.0 {
            bail!("base_dt and day_length must be positive");
        }
        if Speed::from_multiplier(self.speed).is_none() {
            bail!("speed must be 1, 2 or 4, got {}", self.speed);
        }
        if self.roster.len() > MAX_ROSTER {
            bail!(
                "at most {MAX_ROSTER} colonists can start, got {}",
                self.roster.len()
            );
        }
        for name in &self.roster {
            if roster_entry(name).is_none() {
                bail!("unknown colonist '{name}'");
            }
        }
        Ok(())
    }

    /// Generates terrain, places the camp at the map centre, scatters nodes
    /// and settles the roster on free tiles around the camp.
    pub fn build_world(&self) -> Result<World> {
        self.validate()?;
        let mut rng = RngManager::new(self.seed);
        let mut worldgen = rng.stream(WORLDGEN_STREAM);

        let grid = WorldGrid::generate(self.map_size, &mut worldgen);
        let mut world = World::new(grid, self.base_dt, self.day_length);
        if let Some(speed) = Speed::from_multiplier(self.speed) {
            world.set_speed(speed);
        }
        *world.resources_mut() = self.starting_resources.to_pool();

        let center = world.grid().center();
        let camp = nearest_walkable(&world, center)
            .context("Generated map has no walkable tile for the camp")?;
        world.spawn_structure(StructureKind::Camp, camp);
        world.set_colony_dropoff(camp);

        world.spawn_nodes(
            &[
                (NodeKind::Tree, self.nodes.trees),
                (NodeKind::Berries, self.nodes.berries),
                (NodeKind::Rock, self.nodes.rocks),
            ],
            &mut worldgen,
        );

        let mut spots = settle_spots(&world, camp).into_iter();
        for name in &self.roster {
            let entry = roster_entry(name).with_context(|| format!("unknown colonist '{name}'"))?;
            match spots.next() {
                Some(spot) => {
                    world.spawn_colonist(entry, spot);
                }
                None => warn!(colonist = %name, "no free tile near camp, colonist left behind"),
            }
        }
        debug!(
            nodes = world.nodes().count(),
            colonists = world.colonists().count(),
            "world built"
        );
        Ok(world)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(7200)
    }
}

fn nearest_walkable(world: &World, from: Position) -> Option<Position> {
    world
        .grid()
        .positions()
        .filter(|pos| world.grid().is_walkable(*pos))
        .min_by_key(|pos| (pos.manhattan(from), pos.y, pos.x))
}

/// Walkable tiles around the camp without a node or structure, nearest
/// first.
fn settle_spots(world: &World, camp: Position) -> Vec<Position> {
    let mut spots: Vec<Position> = world
        .grid()
        .positions()
        .filter(|pos| {
            *pos != camp
                && world.grid().is_walkable(*pos)
                && world.node_at(*pos).is_none()
                && world.structure_at(*pos).is_none()
        })
        .collect();
    spots.sort_by_key(|pos| (pos.manhattan(camp), pos.y, pos.x));
    spots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Scenario {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let scenario = parse("name: bare\nseed: 3\n");
        assert_eq!(scenario.map_size, 24);
        assert_eq!(scenario.starting_resources.food, 16);
        assert_eq!(scenario.nodes.trees, 14);
        assert_eq!(scenario.roster.len(), 3);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.ticks(None), 7200);
        assert_eq!(scenario.ticks(Some(10)), 10);
    }

    #[test]
    fn oversized_roster_is_rejected() {
        let scenario = parse(
            "name: crowd\nseed: 1\nroster: [Mara Vell, Tobias Crane, Ilse Brandt, Oren Pike]\n",
        );
        assert!(scenario.validate().is_err());
        let scenario = parse("name: ghost\nseed: 1\nroster: [Nobody]\n");
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn build_world_is_deterministic() {
        let scenario = parse("name: seeded\nseed: 99\nmap_size: 16\n");
        let a = scenario.build_world().unwrap();
        let b = scenario.build_world().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.colonists().count(), 3);
        assert_eq!(a.count_active_structures(StructureKind::Camp), 1);
        assert!(a
            .colonists()
            .all(|c| c.hunger == 100.0 && c.rest == 100.0 && c.mood == 80.0));
        assert_eq!(a.resource(ResourceKind::Wood), 20);
    }
}
