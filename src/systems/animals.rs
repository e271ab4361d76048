use anyhow::Result;
use tracing::debug;

use crate::{
    catalog::{AnimalKind, ResourceKind},
    components::EntityId,
    engine::{System, SystemContext},
    grid::Position,
    rng::RandomSource,
    world::World,
};

pub const SPAWN_INTERVAL: f64 = 30.0;
pub const POPULATION_CAP: usize = 8;
pub const SPAWN_ATTEMPTS: usize = 12;
const HUNT_SUPPORT_RANGE: i32 = 2;
const FATALITY_CHANCE: f64 = 0.15;
const MAUL_REST_COST: f64 = 20.0;
const MAUL_MOOD_COST: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HuntOutcome {
    Escaped,
    Caught { food: u32 },
    Failed,
    /// Counter-attacked by an aggressive animal; the hunter survived.
    Mauled,
    Killed,
    /// Hunter or quarry no longer exists.
    Missing,
}

pub struct AnimalSystem;

impl AnimalSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnimalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AnimalSystem {
    fn name(&self) -> &str {
        "animals"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        let mut expired = Vec::new();
        for animal in world.animals.values_mut() {
            animal.time_to_live -= ctx.dt;
            if animal.time_to_live <= 0.0 {
                expired.push(animal.id);
            }
        }
        for id in expired {
            world.remove_animal(id);
            debug!(animal = id.raw(), "animal wandered off");
        }

        world.animal_spawn_timer += ctx.dt;
        if world.animal_spawn_timer >= SPAWN_INTERVAL {
            world.animal_spawn_timer = 0.0;
            let probability = spawn_probability(world);
            if world.animals.len() < POPULATION_CAP && rng.chance(probability) {
                spawn_one(world, rng);
            }
        }
        Ok(())
    }
}

pub fn spawn_probability(world: &World) -> f64 {
    let food_pressure = if world.resource(ResourceKind::Food) < 12 {
        0.08
    } else {
        0.0
    };
    let mood_penalty = match world.average_mood() {
        Some(mood) if mood < 45.0 => -0.08,
        _ => 0.0,
    };
    let day_bonus = (world.day().saturating_sub(1) as f64 * 0.02).min(0.12);
    (0.45 + food_pressure + mood_penalty + day_bonus).clamp(0.15, 0.75)
}

/// Places one animal of a random species on a free buildable tile. Gives up
/// quietly when no attempt lands.
pub fn spawn_one(world: &mut World, rng: &mut dyn RandomSource) -> Option<EntityId> {
    let kind = AnimalKind::ALL[rng.index(AnimalKind::ALL.len())];
    let size = world.grid.size() as usize;
    for _ in 0..SPAWN_ATTEMPTS {
        let position = Position::new(rng.index(size) as i32, rng.index(size) as i32);
        if world.can_build_at(position) && world.animal_at(position).is_none() {
            let id = world.spawn_animal(kind, position);
            debug!(animal = id.raw(), kind = kind.def().label, %position, "animal spawned");
            return Some(id);
        }
    }
    None
}

/// One roll against the animal's flee chance and the hunter's success
/// chance. Aggressive animals may counter-attack a failed hunt.
pub fn resolve_hunt(
    world: &mut World,
    hunter: EntityId,
    quarry: EntityId,
    rng: &mut dyn RandomSource,
) -> HuntOutcome {
    let (Some(colonist), Some(animal)) = (world.colonists.get(&hunter), world.animals.get(&quarry))
    else {
        return HuntOutcome::Missing;
    };
    let name = colonist.name.clone();
    let skill = colonist.modifiers.work_rate;
    let def = animal.kind.def();
    let target = animal.position;

    let support = world
        .colonists
        .values()
        .filter(|c| c.position.manhattan(target) <= HUNT_SUPPORT_RANGE)
        .count()
        .max(1);
    let tools = world.resource(ResourceKind::Tools);
    let tool_bonus = (tools as f64 * 0.03).min(0.15);
    let support_bonus = ((support - 1) as f64 * 0.08).min(0.15);
    let prep_penalty = if def.aggressive && support < 2 && tools < 1 {
        0.12
    } else {
        0.0
    };
    let success_chance = (0.6 + (skill - 1.0) * 0.3 - def.danger * 0.2 + tool_bonus + support_bonus
        - prep_penalty)
        .clamp(0.2, 0.9);

    let roll = rng.roll();
    if roll < def.flee_chance {
        world.remove_animal(quarry);
        world.log_event(format!("The {} {} {name}", def.label, def.behavior.escape()));
        return HuntOutcome::Escaped;
    }
    if roll < success_chance {
        world.remove_animal(quarry);
        world.resources.credit(ResourceKind::Food, def.food);
        world.log_event(format!("{name} brought down a {} (+{} food)", def.label, def.food));
        return HuntOutcome::Caught { food: def.food };
    }
    if !def.aggressive {
        world.log_event(format!("{name} failed to catch the {}", def.label));
        return HuntOutcome::Failed;
    }

    let counter_chance = (0.55 - support_bonus - tool_bonus).max(0.2);
    if !rng.chance(counter_chance) {
        world.log_event(format!("{name} failed to catch the {}", def.label));
        return HuntOutcome::Failed;
    }
    if let Some(colonist) = world.colonists.get_mut(&hunter) {
        colonist.adjust_rest(-MAUL_REST_COST);
        colonist.adjust_mood(-MAUL_MOOD_COST);
    }
    if rng.chance(FATALITY_CHANCE) {
        world.remove_colonist(hunter);
        world.log_event(format!("{name} was killed by the {}", def.label));
        return HuntOutcome::Killed;
    }
    world.log_event(format!("{name} was wounded by the {}", def.label));
    HuntOutcome::Mauled
}
