use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{AnimalKind, NodeKind, ResourceKind, RosterEntry, StructureKind};
use crate::components::{
    Animal, BuildOrder, Colonist, EntityId, ExplorationState, Modifiers, OrderMode,
    ResourceNode, ResourcePool, Structure, StoryFlags, StoryState, Task,
};
use crate::grid::{Position, Terrain, WorldGrid};
use crate::journal::EventLog;
use crate::orders::DismantlePreview;
use crate::rng::RandomSource;

pub const STARTING_HUNGER: f64 = 100.0;
pub const STARTING_REST: f64 = 100.0;
pub const STARTING_MOOD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    #[default]
    Normal,
    Fast,
    Fastest,
}

impl Speed {
    pub fn multiplier(self) -> u32 {
        match self {
            Speed::Normal => 1,
            Speed::Fast => 2,
            Speed::Fastest => 4,
        }
    }

    pub fn from_multiplier(multiplier: u32) -> Option<Self> {
        match multiplier {
            1 => Some(Speed::Normal),
            2 => Some(Speed::Fast),
            4 => Some(Speed::Fastest),
            _ => None,
        }
    }
}

/// The whole simulation state. Every subsystem reads and writes through a
/// `&mut World` handed to it by the engine; nothing is global.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    next_entity: u64,
    tick: u64,
    day: u32,
    time_of_day: f64,
    elapsed: f64,
    base_dt: f64,
    day_length: f64,
    speed: Speed,
    paused: bool,
    game_over: bool,
    dropoff: Position,
    pub(crate) grid: WorldGrid,
    pub(crate) resources: ResourcePool,
    pub(crate) nodes: BTreeMap<EntityId, ResourceNode>,
    pub(crate) animals: BTreeMap<EntityId, Animal>,
    pub(crate) structures: BTreeMap<EntityId, Structure>,
    /// Keyed by tile: at most one order per position.
    pub(crate) orders: BTreeMap<Position, BuildOrder>,
    pub(crate) colonists: BTreeMap<EntityId, Colonist>,
    pub(crate) story: StoryState,
    pub(crate) flags: StoryFlags,
    pub(crate) exploration: ExplorationState,
    pub(crate) events: EventLog,
    pub(crate) selected: Option<EntityId>,
    pub(crate) pending_dismantle: Option<DismantlePreview>,
    pub(crate) animal_spawn_timer: f64,
    pub(crate) last_rescue_day: Option<u32>,
    pub(crate) dismantles_completed: u32,
}

impl World {
    pub fn new(grid: WorldGrid, base_dt: f64, day_length: f64) -> Self {
        let dropoff = grid.center();
        Self {
            next_entity: 0,
            tick: 0,
            day: 1,
            time_of_day: 0.0,
            elapsed: 0.0,
            base_dt,
            day_length: day_length.max(f64::EPSILON),
            speed: Speed::Normal,
            paused: false,
            game_over: false,
            dropoff,
            grid,
            resources: ResourcePool::new(),
            nodes: BTreeMap::new(),
            animals: BTreeMap::new(),
            structures: BTreeMap::new(),
            orders: BTreeMap::new(),
            colonists: BTreeMap::new(),
            story: StoryState::default(),
            flags: StoryFlags::default(),
            exploration: ExplorationState::default(),
            events: EventLog::default(),
            selected: None,
            pending_dismantle: None,
            animal_spawn_timer: 0.0,
            last_rescue_day: None,
            dismantles_completed: 0,
        }
    }

    // -- clock ------------------------------------------------------------

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn time_of_day(&self) -> f64 {
        self.time_of_day
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn day_length(&self) -> f64 {
        self.day_length
    }

    /// Time-units covered by one tick at the current speed.
    pub fn dt(&self) -> f64 {
        self.base_dt * self.speed.multiplier() as f64
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// Advances time by `dt` and returns how many day boundaries were crossed.
    pub(crate) fn advance_clock(&mut self, dt: f64) -> u32 {
        self.tick += 1;
        self.elapsed += dt;
        self.time_of_day += dt;
        let mut rolled = 0;
        while self.time_of_day >= self.day_length {
            self.time_of_day -= self.day_length;
            self.day += 1;
            rolled += 1;
        }
        rolled
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub(crate) fn end_game(&mut self) {
        self.game_over = true;
        self.paused = true;
    }

    // -- logs -------------------------------------------------------------

    pub fn log_event(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(day = self.day, tick = self.tick, "{message}");
        self.events.push(message);
    }

    pub fn log_expedition(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(day = self.day, tick = self.tick, expedition = true, "{message}");
        self.exploration.log.push(message);
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn expedition_log(&self) -> &EventLog {
        &self.exploration.log
    }

    // -- read access ------------------------------------------------------

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourcePool {
        &mut self.resources
    }

    pub fn resource(&self, kind: ResourceKind) -> u32 {
        self.resources.get(kind)
    }

    pub fn story(&self) -> &StoryState {
        &self.story
    }

    pub fn flags(&self) -> &StoryFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut StoryFlags {
        &mut self.flags
    }

    pub fn exploration(&self) -> &ExplorationState {
        &self.exploration
    }

    pub fn selected_colonist(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn pending_dismantle(&self) -> Option<&DismantlePreview> {
        self.pending_dismantle.as_ref()
    }

    pub fn colonist(&self, id: EntityId) -> Option<&Colonist> {
        self.colonists.get(&id)
    }

    pub fn colonist_mut(&mut self, id: EntityId) -> Option<&mut Colonist> {
        self.colonists.get_mut(&id)
    }

    pub fn colonists(&self) -> impl Iterator<Item = &Colonist> {
        self.colonists.values()
    }

    pub fn colonist_ids(&self) -> Vec<EntityId> {
        self.colonists.keys().copied().collect()
    }

    pub fn node(&self, id: EntityId) -> Option<&ResourceNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: EntityId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    pub fn animal(&self, id: EntityId) -> Option<&Animal> {
        self.animals.get(&id)
    }

    pub fn animals(&self) -> impl Iterator<Item = &Animal> {
        self.animals.values()
    }

    pub fn structure(&self, id: EntityId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub fn order_at(&self, position: Position) -> Option<&BuildOrder> {
        self.orders.get(&position)
    }

    pub fn orders(&self) -> impl Iterator<Item = &BuildOrder> {
        self.orders.values()
    }

    pub fn colony_dropoff(&self) -> Position {
        self.dropoff
    }

    pub fn set_colony_dropoff(&mut self, position: Position) {
        self.dropoff = position;
    }

    // -- spatial queries --------------------------------------------------

    /// Walkable, and free of structures, harvestable nodes and orders.
    pub fn can_build_at(&self, position: Position) -> bool {
        self.grid.is_walkable(position)
            && self.structure_at(position).is_none()
            && !self
                .nodes
                .values()
                .any(|node| node.position == position && node.is_available())
            && !self.orders.contains_key(&position)
    }

    pub fn structure_at(&self, position: Position) -> Option<&Structure> {
        self.structures.values().find(|s| s.position == position)
    }

    pub fn node_at(&self, position: Position) -> Option<&ResourceNode> {
        self.nodes.values().find(|n| n.position == position)
    }

    pub fn animal_at(&self, position: Position) -> Option<&Animal> {
        self.animals.values().find(|a| a.position == position)
    }

    pub fn colonist_at(&self, position: Position) -> Option<&Colonist> {
        self.colonists.values().find(|c| c.position == position)
    }

    pub fn has_structure(&self, kind: StructureKind) -> bool {
        self.structures
            .values()
            .any(|s| s.kind == kind && !s.disabled)
    }

    /// Structures of `kind` not already queued for dismantle.
    pub fn count_active_structures(&self, kind: StructureKind) -> usize {
        self.structures
            .values()
            .filter(|s| s.kind == kind && !s.disabled)
            .count()
    }

    /// Nearest active structure of `kind`; ties go to the lowest id.
    pub fn nearest_structure(&self, from: Position, kind: StructureKind) -> Option<Position> {
        nearest(
            self.structures
                .values()
                .filter(|s| s.kind == kind && !s.disabled)
                .map(|s| s.position),
            from,
        )
    }

    /// Where carried goods go: stockpile, else camp, else the colony dropoff.
    pub fn dropoff_for(&self, from: Position) -> Position {
        self.nearest_structure(from, StructureKind::Stockpile)
            .or_else(|| self.nearest_structure(from, StructureKind::Camp))
            .unwrap_or(self.dropoff)
    }

    pub fn rest_spot_for(&self, from: Position) -> Position {
        self.nearest_structure(from, StructureKind::Camp)
            .unwrap_or(self.dropoff)
    }

    pub fn nearest_available_node(
        &self,
        from: Position,
        kind: NodeKind,
    ) -> Option<(EntityId, Position)> {
        let mut best: Option<(EntityId, Position, i32)> = None;
        for node in self.nodes.values() {
            if node.kind != kind || !node.is_available() {
                continue;
            }
            let distance = from.manhattan(node.position);
            if best.map_or(true, |(_, _, d)| distance < d) {
                best = Some((node.id, node.position, distance));
            }
        }
        best.map(|(id, position, _)| (id, position))
    }

    pub fn nearest_order(&self, from: Position, mode: OrderMode) -> Option<Position> {
        nearest(
            self.orders
                .values()
                .filter(|o| o.mode == mode)
                .map(|o| o.position),
            from,
        )
    }

    pub fn has_order(&self, mode: OrderMode) -> bool {
        self.orders.values().any(|o| o.mode == mode)
    }

    pub fn average_mood(&self) -> Option<f64> {
        if self.colonists.is_empty() {
            return None;
        }
        let total: f64 = self.colonists.values().map(|c| c.mood).sum();
        Some(total / self.colonists.len() as f64)
    }

    // -- entity lifecycle -------------------------------------------------

    pub fn spawn_node(&mut self, kind: NodeKind, position: Position) -> EntityId {
        let id = self.allocate();
        self.nodes.insert(
            id,
            ResourceNode {
                id,
                kind,
                position,
                amount: 1,
                regrow_timer: 0.0,
            },
        );
        id
    }

    /// Rejection-samples free grass tiles until `count` nodes of each kind
    /// are placed. Gives up on a kind once the attempt budget runs out.
    pub fn spawn_nodes(&mut self, counts: &[(NodeKind, u32)], rng: &mut dyn RandomSource) {
        let size = self.grid.size() as usize;
        for &(kind, count) in counts {
            let mut placed = 0;
            let mut attempts = 0;
            let budget = count as usize * 200;
            while placed < count && attempts < budget {
                attempts += 1;
                let position = Position::new(rng.index(size) as i32, rng.index(size) as i32);
                if self.grid.terrain(position) != Some(Terrain::Grass)
                    || self.node_at(position).is_some()
                    || self.structure_at(position).is_some()
                {
                    continue;
                }
                self.spawn_node(kind, position);
                placed += 1;
            }
        }
    }

    pub fn spawn_animal(&mut self, kind: AnimalKind, position: Position) -> EntityId {
        let id = self.allocate();
        self.animals.insert(
            id,
            Animal {
                id,
                kind,
                position,
                time_to_live: kind.def().lifespan,
            },
        );
        id
    }

    pub fn remove_animal(&mut self, id: EntityId) -> Option<Animal> {
        self.animals.remove(&id)
    }

    pub fn spawn_structure(&mut self, kind: StructureKind, position: Position) -> EntityId {
        let id = self.allocate();
        self.structures.insert(
            id,
            Structure {
                id,
                kind,
                position,
                production_timer: 0.0,
                disabled: false,
            },
        );
        id
    }

    pub fn remove_structure(&mut self, id: EntityId) -> Option<Structure> {
        self.structures.remove(&id)
    }

    pub fn spawn_colonist(&mut self, entry: &RosterEntry, position: Position) -> EntityId {
        let id = self.allocate();
        self.colonists.insert(
            id,
            Colonist {
                id,
                name: entry.name.to_string(),
                role: entry.role.to_string(),
                traits: entry.traits.iter().map(|t| t.to_string()).collect(),
                modifiers: Modifiers {
                    work_rate: entry.work_rate,
                    hunger_rate: entry.hunger_rate,
                    rest_rate: entry.rest_rate,
                },
                position,
                task: Task::Idle,
                carrying: None,
                hunger: STARTING_HUNGER,
                rest: STARTING_REST,
                mood: STARTING_MOOD,
            },
        );
        id
    }

    pub fn remove_colonist(&mut self, id: EntityId) -> Option<Colonist> {
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.colonists.remove(&id)
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId::from_raw(self.next_entity);
        self.next_entity += 1;
        id
    }

    // -- render feed ------------------------------------------------------

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            day: self.day,
            time_of_day: self.time_of_day,
            paused: self.paused,
            game_over: self.game_over,
            speed: self.speed,
            tiles: self.grid.rows(),
            nodes: self.nodes.values().cloned().collect(),
            animals: self.animals.values().cloned().collect(),
            structures: self.structures.values().cloned().collect(),
            orders: self.orders.values().cloned().collect(),
            colonists: self.colonists.values().cloned().collect(),
            resources: self.resources.clone(),
            events: self.events.to_vec(),
            expedition_log: self.exploration.log.to_vec(),
            story: self.story.clone(),
            flags: self.flags.clone(),
            selected: self.selected,
            pending_dismantle: self.pending_dismantle.clone(),
        }
    }
}

fn nearest(candidates: impl Iterator<Item = Position>, from: Position) -> Option<Position> {
    let mut best: Option<(Position, i32)> = None;
    for position in candidates {
        let distance = from.manhattan(position);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((position, distance));
        }
    }
    best.map(|(position, _)| position)
}

/// Read-only view of everything a renderer or HUD needs for one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub day: u32,
    pub time_of_day: f64,
    pub paused: bool,
    pub game_over: bool,
    pub speed: Speed,
    pub tiles: Vec<Vec<Terrain>>,
    pub nodes: Vec<ResourceNode>,
    pub animals: Vec<Animal>,
    pub structures: Vec<Structure>,
    pub orders: Vec<BuildOrder>,
    pub colonists: Vec<Colonist>,
    pub resources: ResourcePool,
    pub events: Vec<String>,
    pub expedition_log: Vec<String>,
    pub story: StoryState,
    pub flags: StoryFlags,
    pub selected: Option<EntityId>,
    pub pending_dismantle: Option<DismantlePreview>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ROSTER;
    use crate::rng::ScriptedRolls;

    fn open_world() -> World {
        World::new(WorldGrid::filled(9, Terrain::Grass), 1.0 / 60.0, 24.0)
    }

    #[test]
    fn clock_rolls_days() {
        let mut world = World::new(WorldGrid::filled(3, Terrain::Grass), 1.0, 2.0);
        assert_eq!(world.advance_clock(1.0), 0);
        assert_eq!(world.advance_clock(1.0), 1);
        assert_eq!(world.day(), 2);
        assert_eq!(world.tick(), 2);
    }

    #[test]
    fn build_tile_must_be_free() {
        let mut world = World::new(WorldGrid::from_rows(&["~..", "...", "..."]), 1.0, 24.0);
        assert!(!world.can_build_at(Position::new(0, 0)));
        world.spawn_structure(StructureKind::Camp, Position::new(1, 1));
        assert!(!world.can_build_at(Position::new(1, 1)));
        let node = world.spawn_node(NodeKind::Tree, Position::new(2, 2));
        assert!(!world.can_build_at(Position::new(2, 2)));
        if let Some(node) = world.node_mut(node) {
            node.amount = 0;
        }
        assert!(world.can_build_at(Position::new(2, 2)));
    }

    #[test]
    fn nearest_node_prefers_first_on_ties() {
        let mut world = open_world();
        let first = world.spawn_node(NodeKind::Berries, Position::new(2, 4));
        world.spawn_node(NodeKind::Berries, Position::new(6, 4));
        world.spawn_node(NodeKind::Tree, Position::new(4, 3));
        let found = world.nearest_available_node(Position::new(4, 4), NodeKind::Berries);
        assert_eq!(found, Some((first, Position::new(2, 4))));
    }

    #[test]
    fn dropoff_prefers_stockpile_then_camp() {
        let mut world = open_world();
        let from = Position::new(0, 0);
        assert_eq!(world.dropoff_for(from), world.colony_dropoff());
        world.spawn_structure(StructureKind::Camp, Position::new(5, 5));
        assert_eq!(world.dropoff_for(from), Position::new(5, 5));
        world.spawn_structure(StructureKind::Stockpile, Position::new(7, 7));
        assert_eq!(world.dropoff_for(from), Position::new(7, 7));
    }

    #[test]
    fn spawned_nodes_land_on_distinct_grass() {
        let mut world = World::new(WorldGrid::from_rows(&["~~~", "~.~", "~.~"]), 1.0, 24.0);
        let mut rng = ScriptedRolls::new([0.0, 0.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.9], 0.5);
        world.spawn_nodes(&[(NodeKind::Tree, 2)], &mut rng);
        let positions: Vec<Position> = world.nodes().map(|n| n.position).collect();
        assert_eq!(positions, vec![Position::new(1, 1), Position::new(1, 2)]);
    }

    #[test]
    fn removing_selected_colonist_clears_selection() {
        let mut world = open_world();
        let id = world.spawn_colonist(&ROSTER[0], Position::new(1, 1));
        world.selected = Some(id);
        assert!(world.remove_colonist(id).is_some());
        assert_eq!(world.selected_colonist(), None);
    }
}
