//! Static content tables: buildings, animals, biomes, narrative choices and
//! the colonist roster. Pure data; nothing here mutates.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Wood,
    Stone,
    Tools,
    Water,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Food,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Tools,
        ResourceKind::Water,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Food => "food",
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Tools => "tools",
            ResourceKind::Water => "water",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type Amount = (ResourceKind, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Tree,
    Berries,
    Rock,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Tree => "tree",
            NodeKind::Berries => "berries",
            NodeKind::Rock => "rock",
        }
    }

    /// Resource kind and base quantity granted by one harvest.
    pub fn base_yield(self) -> Amount {
        match self {
            NodeKind::Tree => (ResourceKind::Wood, 4),
            NodeKind::Berries => (ResourceKind::Food, 3),
            NodeKind::Rock => (ResourceKind::Stone, 4),
        }
    }

    /// Time-units a depleted node needs before it is harvestable again.
    pub fn regrow_time(self) -> f64 {
        match self {
            NodeKind::Berries => 20.0,
            NodeKind::Tree | NodeKind::Rock => 35.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Camp,
    Stockpile,
    Hut,
    Farm,
    Well,
    Lumberyard,
    Quarry,
    Workshop,
    Beacon,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Production {
    pub interval: f64,
    pub output: Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDef {
    pub kind: StructureKind,
    pub label: &'static str,
    pub cost: &'static [Amount],
    pub work: u32,
    /// Base amounts returned by dismantling, before the return rate.
    pub salvage: &'static [Amount],
    pub production: Option<Production>,
    /// The colony may never dismantle its last instance of this kind.
    pub protected: bool,
}

use ResourceKind::{Food, Stone, Tools, Water, Wood};

static BUILDINGS: [BuildingDef; 9] = [
    BuildingDef {
        kind: StructureKind::Camp,
        label: "Camp",
        cost: &[(Wood, 10)],
        work: 6,
        salvage: &[(Wood, 6)],
        production: None,
        protected: true,
    },
    BuildingDef {
        kind: StructureKind::Stockpile,
        label: "Stockpile",
        cost: &[(Wood, 12)],
        work: 6,
        salvage: &[(Wood, 7)],
        production: None,
        protected: false,
    },
    BuildingDef {
        kind: StructureKind::Hut,
        label: "Hut",
        cost: &[(Wood, 10), (Stone, 2)],
        work: 8,
        salvage: &[(Wood, 6), (Stone, 1)],
        production: None,
        protected: false,
    },
    BuildingDef {
        kind: StructureKind::Farm,
        label: "Farm",
        cost: &[(Wood, 8), (Stone, 2)],
        work: 8,
        salvage: &[(Wood, 5), (Stone, 1)],
        production: Some(Production {
            interval: 20.0,
            output: (Food, 2),
        }),
        protected: false,
    },
    BuildingDef {
        kind: StructureKind::Well,
        label: "Well",
        cost: &[(Wood, 2), (Stone, 6)],
        work: 8,
        salvage: &[(Wood, 1), (Stone, 4)],
        production: Some(Production {
            interval: 18.0,
            output: (Water, 2),
        }),
        protected: false,
    },
    BuildingDef {
        kind: StructureKind::Lumberyard,
        label: "Lumberyard",
        cost: &[(Wood, 10), (Stone, 4)],
        work: 10,
        salvage: &[(Wood, 6), (Stone, 2)],
        production: Some(Production {
            interval: 22.0,
            output: (Wood, 3),
        }),
        protected: false,
    },
    BuildingDef {
        kind: StructureKind::Quarry,
        label: "Quarry",
        cost: &[(Wood, 10), (Stone, 2), (Tools, 1)],
        work: 10,
        salvage: &[(Wood, 6), (Stone, 1)],
        production: Some(Production {
            interval: 26.0,
            output: (Stone, 3),
        }),
        protected: false,
    },
    BuildingDef {
        kind: StructureKind::Workshop,
        label: "Workshop",
        cost: &[(Wood, 15), (Stone, 8)],
        work: 12,
        salvage: &[(Wood, 9), (Stone, 5)],
        production: None,
        protected: false,
    },
    BuildingDef {
        kind: StructureKind::Beacon,
        label: "Beacon",
        cost: &[(Wood, 30), (Stone, 20), (Tools, 3)],
        work: 20,
        salvage: &[(Wood, 18), (Stone, 12), (Tools, 1)],
        production: None,
        protected: false,
    },
];

impl StructureKind {
    pub const ALL: [StructureKind; 9] = [
        StructureKind::Camp,
        StructureKind::Stockpile,
        StructureKind::Hut,
        StructureKind::Farm,
        StructureKind::Well,
        StructureKind::Lumberyard,
        StructureKind::Quarry,
        StructureKind::Workshop,
        StructureKind::Beacon,
    ];

    pub fn def(self) -> &'static BuildingDef {
        &BUILDINGS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.def().label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalKind {
    Hare,
    Deer,
    Boar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Skittish,
    Grazing,
    Territorial,
}

impl Behavior {
    /// How an animal of this temperament gets away from a hunter.
    pub fn escape(self) -> &'static str {
        match self {
            Behavior::Skittish => "bolted from",
            Behavior::Grazing => "slipped away from",
            Behavior::Territorial => "broke away from",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimalDef {
    pub kind: AnimalKind,
    pub label: &'static str,
    pub food: u32,
    pub danger: f64,
    pub flee_chance: f64,
    pub aggressive: bool,
    pub behavior: Behavior,
    pub lifespan: f64,
}

static ANIMALS: [AnimalDef; 3] = [
    AnimalDef {
        kind: AnimalKind::Hare,
        label: "hare",
        food: 4,
        danger: 0.1,
        flee_chance: 0.5,
        aggressive: false,
        behavior: Behavior::Skittish,
        lifespan: 90.0,
    },
    AnimalDef {
        kind: AnimalKind::Deer,
        label: "deer",
        food: 8,
        danger: 0.2,
        flee_chance: 0.35,
        aggressive: false,
        behavior: Behavior::Grazing,
        lifespan: 120.0,
    },
    AnimalDef {
        kind: AnimalKind::Boar,
        label: "boar",
        food: 10,
        danger: 0.6,
        flee_chance: 0.1,
        aggressive: true,
        behavior: Behavior::Territorial,
        lifespan: 150.0,
    },
];

impl AnimalKind {
    pub const ALL: [AnimalKind; 3] = [AnimalKind::Hare, AnimalKind::Deer, AnimalKind::Boar];

    pub fn def(self) -> &'static AnimalDef {
        &ANIMALS[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryPath {
    Humanity,
    Military,
    Tech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceId {
    Archive,
    Caravan,
    Toxin,
    Survivors,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub label: &'static str,
    pub path: StoryPath,
    /// Signed resource deltas; debits saturate at zero.
    pub resources: &'static [(ResourceKind, i32)],
    pub mood: f64,
    pub outcome: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceDef {
    pub id: ChoiceId,
    pub prompt: &'static str,
    pub options: [ChoiceOption; 2],
}

static CHOICES: [ChoiceDef; 4] = [
    ChoiceDef {
        id: ChoiceId::Archive,
        prompt: "Beneath the ruins an archive still hums with power.",
        options: [
            ChoiceOption {
                label: "Restore the archive",
                path: StoryPath::Humanity,
                resources: &[],
                mood: 5.0,
                outcome: "The archive's records remember the people of the old world.",
            },
            ChoiceOption {
                label: "Strip it for parts",
                path: StoryPath::Tech,
                resources: &[(Tools, 2)],
                mood: 0.0,
                outcome: "Salvaged circuitry becomes two fine tools.",
            },
        ],
    },
    ChoiceDef {
        id: ChoiceId::Caravan,
        prompt: "A lone caravan crosses the wasteland, heavily laden.",
        options: [
            ChoiceOption {
                label: "Trade fairly",
                path: StoryPath::Humanity,
                resources: &[(Food, -3), (Water, 4)],
                mood: 3.0,
                outcome: "The traders leave water and a promise to return.",
            },
            ChoiceOption {
                label: "Seize the cargo",
                path: StoryPath::Military,
                resources: &[(Food, 6), (Wood, 4)],
                mood: -6.0,
                outcome: "The cargo is yours. Nobody speaks of it at supper.",
            },
        ],
    },
    ChoiceDef {
        id: ChoiceId::Toxin,
        prompt: "Swamp gas has poisoned a nearby camp; your scouts found the cure.",
        options: [
            ChoiceOption {
                label: "Share the antidote",
                path: StoryPath::Humanity,
                resources: &[(Water, -2)],
                mood: 4.0,
                outcome: "The strangers recover and bless your colony's name.",
            },
            ChoiceOption {
                label: "Study the compound",
                path: StoryPath::Tech,
                resources: &[(Tools, 1)],
                mood: -2.0,
                outcome: "The compound yields its secrets to careful hands.",
            },
        ],
    },
    ChoiceDef {
        id: ChoiceId::Survivors,
        prompt: "Survivors shelter in a mountain pass, armed and desperate.",
        options: [
            ChoiceOption {
                label: "Take them in",
                path: StoryPath::Humanity,
                resources: &[(Food, -4)],
                mood: 6.0,
                outcome: "New voices fill the camp, and new mouths.",
            },
            ChoiceOption {
                label: "Conscript the able-bodied",
                path: StoryPath::Military,
                resources: &[(Stone, 4)],
                mood: -5.0,
                outcome: "The conscripts haul stone under watchful eyes.",
            },
        ],
    },
];

impl ChoiceId {
    pub fn def(self) -> &'static ChoiceDef {
        &CHOICES[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomeId {
    Forest,
    Ruins,
    Swamp,
    Wasteland,
    Mountains,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LootRange {
    pub kind: ResourceKind,
    pub min: u32,
    pub max: u32,
}

const fn loot(kind: ResourceKind, min: u32, max: u32) -> LootRange {
    LootRange { kind, min, max }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiomeDef {
    pub id: BiomeId,
    pub label: &'static str,
    pub risk: f64,
    pub loot: &'static [LootRange],
    pub open_at_start: bool,
    pub unlocks: Option<BiomeId>,
    pub choice: Option<ChoiceId>,
}

static BIOMES: [BiomeDef; 5] = [
    BiomeDef {
        id: BiomeId::Forest,
        label: "Forest",
        risk: 0.15,
        loot: &[loot(Wood, 4, 8), loot(Food, 2, 5), loot(Stone, 1, 3)],
        open_at_start: true,
        unlocks: Some(BiomeId::Swamp),
        choice: None,
    },
    BiomeDef {
        id: BiomeId::Ruins,
        label: "Ruins",
        risk: 0.25,
        loot: &[loot(Stone, 3, 6), loot(Tools, 0, 2), loot(Wood, 1, 3)],
        open_at_start: true,
        unlocks: Some(BiomeId::Wasteland),
        choice: Some(ChoiceId::Archive),
    },
    BiomeDef {
        id: BiomeId::Swamp,
        label: "Swamp",
        risk: 0.3,
        loot: &[loot(Food, 3, 6), loot(Water, 2, 5)],
        open_at_start: false,
        unlocks: None,
        choice: Some(ChoiceId::Toxin),
    },
    BiomeDef {
        id: BiomeId::Wasteland,
        label: "Wasteland",
        risk: 0.4,
        loot: &[loot(Stone, 2, 5), loot(Tools, 1, 2), loot(Water, 0, 2)],
        open_at_start: false,
        unlocks: Some(BiomeId::Mountains),
        choice: Some(ChoiceId::Caravan),
    },
    BiomeDef {
        id: BiomeId::Mountains,
        label: "Mountains",
        risk: 0.45,
        loot: &[loot(Stone, 5, 9), loot(Tools, 1, 2), loot(Wood, 0, 3)],
        open_at_start: false,
        unlocks: None,
        choice: Some(ChoiceId::Survivors),
    },
];

impl BiomeId {
    pub const ALL: [BiomeId; 5] = [
        BiomeId::Forest,
        BiomeId::Ruins,
        BiomeId::Swamp,
        BiomeId::Wasteland,
        BiomeId::Mountains,
    ];

    pub fn def(self) -> &'static BiomeDef {
        &BIOMES[self as usize]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: &'static str,
    pub role: &'static str,
    pub traits: &'static [&'static str],
    pub work_rate: f64,
    pub hunger_rate: f64,
    pub rest_rate: f64,
}

pub static ROSTER: [RosterEntry; 6] = [
    RosterEntry {
        name: "Mara Vell",
        role: "Forager",
        traits: &["steady"],
        work_rate: 1.0,
        hunger_rate: 1.0,
        rest_rate: 1.0,
    },
    RosterEntry {
        name: "Tobias Crane",
        role: "Builder",
        traits: &["strong", "big appetite"],
        work_rate: 1.2,
        hunger_rate: 1.2,
        rest_rate: 1.0,
    },
    RosterEntry {
        name: "Ilse Brandt",
        role: "Hunter",
        traits: &["keen-eyed"],
        work_rate: 1.1,
        hunger_rate: 1.0,
        rest_rate: 0.9,
    },
    RosterEntry {
        name: "Oren Pike",
        role: "Scout",
        traits: &["restless"],
        work_rate: 0.9,
        hunger_rate: 0.9,
        rest_rate: 1.2,
    },
    RosterEntry {
        name: "Sabine Moreau",
        role: "Medic",
        traits: &["calm"],
        work_rate: 0.95,
        hunger_rate: 0.9,
        rest_rate: 1.1,
    },
    RosterEntry {
        name: "Jonah Reyes",
        role: "Tinkerer",
        traits: &["inventive", "night owl"],
        work_rate: 1.05,
        hunger_rate: 1.0,
        rest_rate: 0.85,
    },
];

pub fn roster_entry(name: &str) -> Option<&'static RosterEntry> {
    ROSTER
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
}
