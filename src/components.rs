use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{
    Amount, AnimalKind, BiomeId, ChoiceId, NodeKind, ResourceKind, StoryPath, StructureKind,
};
use crate::grid::Position;
use crate::journal::EventLog;

pub const NEED_MAX: f64 = 100.0;
pub const MOOD_FLOOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub kind: ResourceKind,
    pub needed: u32,
    pub available: u32,
}

/// Colony-wide stock. Unsigned amounts; every debit goes through a checked
/// path so no entry can go negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    amounts: BTreeMap<ResourceKind, u32>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_amounts(amounts: impl IntoIterator<Item = Amount>) -> Self {
        let mut pool = Self::new();
        for (kind, amount) in amounts {
            pool.credit(kind, amount);
        }
        pool
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.amounts.get(&kind).copied().unwrap_or(0)
    }

    pub fn set(&mut self, kind: ResourceKind, amount: u32) {
        self.amounts.insert(kind, amount);
    }

    pub fn credit(&mut self, kind: ResourceKind, amount: u32) {
        let entry = self.amounts.entry(kind).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn check(&self, costs: &[Amount]) -> Result<(), Shortfall> {
        for &(kind, needed) in costs {
            let available = self.get(kind);
            if available < needed {
                return Err(Shortfall {
                    kind,
                    needed,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Debits every line item or none of them.
    pub fn try_debit(&mut self, costs: &[Amount]) -> Result<(), Shortfall> {
        self.check(costs)?;
        for &(kind, amount) in costs {
            let entry = self.amounts.entry(kind).or_insert(0);
            *entry -= amount;
        }
        Ok(())
    }

    /// Takes up to `amount`, returning what was actually removed.
    pub fn debit_up_to(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let available = self.get(kind);
        let taken = amount.min(available);
        self.amounts.insert(kind, available - taken);
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = Amount> + '_ {
        self.amounts.iter().map(|(kind, amount)| (*kind, *amount))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: EntityId,
    pub kind: NodeKind,
    pub position: Position,
    /// 1 when harvestable, 0 while regrowing.
    pub amount: u8,
    pub regrow_timer: f64,
}

impl ResourceNode {
    pub fn is_available(&self) -> bool {
        self.amount > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: EntityId,
    pub kind: AnimalKind,
    pub position: Position,
    pub time_to_live: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: EntityId,
    pub kind: StructureKind,
    pub position: Position,
    pub production_timer: f64,
    /// Set while a dismantle order is pending; excluded from production and
    /// from colonist destination lookups.
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    Build,
    Dismantle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOrder {
    pub position: Position,
    pub kind: StructureKind,
    pub cost: u32,
    pub progress: u32,
    pub mode: OrderMode,
    pub label: String,
    /// The structure being taken down, for dismantle orders.
    pub target: Option<EntityId>,
}

impl BuildOrder {
    pub fn is_complete(&self) -> bool {
        self.progress >= self.cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub work_rate: f64,
    pub hunger_rate: f64,
    pub rest_rate: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            work_rate: 1.0,
            hunger_rate: 1.0,
            rest_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Cargo {
    Resource { kind: ResourceKind, amount: u32 },
    /// Construction parcel picked up when a delivery is assigned.
    Materials { amount: u32 },
}

impl Cargo {
    pub fn amount(self) -> u32 {
        match self {
            Cargo::Resource { amount, .. } | Cargo::Materials { amount } => amount,
        }
    }
}

/// What a colonist is doing, with the destination each task needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "task")]
pub enum Task {
    Idle,
    Eat { dropoff: Position },
    Rest { spot: Position },
    Haul { dropoff: Position },
    Craft { workshop: Position },
    Gather { node: EntityId, at: Position },
    Deliver { order: Position },
    Dismantle { order: Position },
    Hunt { animal: EntityId, at: Position },
    Move { target: Position },
}

impl Task {
    pub fn goal(&self) -> Option<Position> {
        match *self {
            Task::Idle => None,
            Task::Eat { dropoff } | Task::Haul { dropoff } => Some(dropoff),
            Task::Rest { spot } => Some(spot),
            Task::Craft { workshop } => Some(workshop),
            Task::Gather { at, .. } | Task::Hunt { at, .. } => Some(at),
            Task::Deliver { order } | Task::Dismantle { order } => Some(order),
            Task::Move { target } => Some(target),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Task::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Task::Idle => "idle",
            Task::Eat { .. } => "eat",
            Task::Rest { .. } => "rest",
            Task::Haul { .. } => "haul",
            Task::Craft { .. } => "craft",
            Task::Gather { .. } => "gather",
            Task::Deliver { .. } => "deliver",
            Task::Dismantle { .. } => "dismantle",
            Task::Hunt { .. } => "hunt",
            Task::Move { .. } => "move",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colonist {
    pub id: EntityId,
    pub name: String,
    pub role: String,
    pub traits: Vec<String>,
    pub modifiers: Modifiers,
    pub position: Position,
    pub task: Task,
    pub carrying: Option<Cargo>,
    pub hunger: f64,
    pub rest: f64,
    pub mood: f64,
}

impl Colonist {
    pub fn adjust_mood(&mut self, delta: f64) {
        self.mood = (self.mood + delta).clamp(MOOD_FLOOR, NEED_MAX);
    }

    pub fn adjust_rest(&mut self, delta: f64) {
        self.rest = (self.rest + delta).clamp(0.0, NEED_MAX);
    }

    pub fn adjust_hunger(&mut self, delta: f64) {
        self.hunger = (self.hunger + delta).clamp(0.0, NEED_MAX);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    Haven,
    Garrison,
    Voyage,
}

impl Ending {
    pub fn for_path(path: Option<StoryPath>) -> Self {
        match path {
            Some(StoryPath::Humanity) => Ending::Haven,
            Some(StoryPath::Military) => Ending::Garrison,
            _ => Ending::Voyage,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Ending::Haven => {
                "The beacon calls the scattered survivors home. The colony becomes a haven for humanity."
            }
            Ending::Garrison => {
                "Armored transports answer the beacon. The colony becomes the frontier's garrison."
            }
            Ending::Voyage => {
                "A silent research vessel follows the signal down. The colony trades its stories for passage beyond the horizon."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryState {
    pub chapter: u32,
    pub beacon_built: bool,
    pub days_after_beacon: u32,
    pub ending: Option<Ending>,
    pub pending_choice: Option<ChoiceId>,
}

impl Default for StoryState {
    fn default() -> Self {
        Self {
            chapter: 1,
            beacon_built: false,
            days_after_beacon: 0,
            ending: None,
            pending_choice: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryFlags {
    pub path: Option<StoryPath>,
    pub choices: BTreeMap<ChoiceId, StoryPath>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyPacks {
    pub food: u32,
    pub water: u32,
    pub tools: u32,
}

impl SupplyPacks {
    pub fn costs(&self) -> [Amount; 3] {
        [
            (ResourceKind::Food, self.food),
            (ResourceKind::Water, self.water),
            (ResourceKind::Tools, self.tools),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationState {
    pub team_size: u32,
    pub packs: SupplyPacks,
    pub selected_biome: Option<BiomeId>,
    pub unlocked: BTreeSet<BiomeId>,
    pub visited: BTreeSet<BiomeId>,
    pub expeditions: u32,
    pub log: EventLog,
}

impl Default for ExplorationState {
    fn default() -> Self {
        Self {
            team_size: 1,
            packs: SupplyPacks::default(),
            selected_biome: None,
            unlocked: BiomeId::ALL
                .into_iter()
                .filter(|id| id.def().open_at_start)
                .collect(),
            visited: BTreeSet::new(),
            expeditions: 0,
            log: EventLog::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_is_all_or_nothing() {
        let mut pool = ResourcePool::from_amounts([(ResourceKind::Wood, 10), (ResourceKind::Stone, 1)]);
        let err = pool
            .try_debit(&[(ResourceKind::Wood, 5), (ResourceKind::Stone, 3)])
            .unwrap_err();
        assert_eq!(err.kind, ResourceKind::Stone);
        assert_eq!(pool.get(ResourceKind::Wood), 10);
        pool.try_debit(&[(ResourceKind::Wood, 5)]).unwrap();
        assert_eq!(pool.get(ResourceKind::Wood), 5);
    }

    #[test]
    fn debit_up_to_never_underflows() {
        let mut pool = ResourcePool::from_amounts([(ResourceKind::Wood, 4)]);
        assert_eq!(pool.debit_up_to(ResourceKind::Wood, 6), 4);
        assert_eq!(pool.get(ResourceKind::Wood), 0);
        assert_eq!(pool.debit_up_to(ResourceKind::Tools, 1), 0);
    }

    #[test]
    fn colonist_adjustments_respect_bounds() {
        let mut colonist = Colonist {
            id: EntityId::from_raw(1),
            name: "Test".into(),
            role: "Forager".into(),
            traits: Vec::new(),
            modifiers: Modifiers::default(),
            position: Position::new(0, 0),
            task: Task::Idle,
            carrying: None,
            hunger: 50.0,
            rest: 5.0,
            mood: 12.0,
        };
        colonist.adjust_mood(-8.0);
        colonist.adjust_rest(-20.0);
        colonist.adjust_hunger(80.0);
        assert_eq!(colonist.mood, MOOD_FLOOR);
        assert_eq!(colonist.rest, 0.0);
        assert_eq!(colonist.hunger, NEED_MAX);
    }

    #[test]
    fn tasks_carry_their_own_goal() {
        let at = Position::new(3, 4);
        assert_eq!(Task::Idle.goal(), None);
        assert_eq!(Task::Deliver { order: at }.goal(), Some(at));
        assert_eq!(
            Task::Gather {
                node: EntityId::from_raw(7),
                at
            }
            .goal(),
            Some(at)
        );
    }
}
