use anyhow::Result;

use crate::{
    catalog::ResourceKind,
    engine::{System, SystemContext},
    rng::RandomSource,
    world::World,
};

/// Per-tick chance that some world event happens at all.
pub const WORLD_EVENT_CHANCE: f64 = 0.002;

pub struct WorldEvent {
    pub name: &'static str,
    /// Relative weight once an event has been triggered.
    pub weight: f64,
    pub effect: fn(&mut World) -> String,
}

pub static WORLD_EVENTS: [WorldEvent; 3] = [
    WorldEvent {
        name: "trader",
        weight: 1.0,
        effect: trader,
    },
    WorldEvent {
        name: "storm",
        weight: 1.0,
        effect: storm,
    },
    WorldEvent {
        name: "raid",
        weight: 1.0,
        effect: raid,
    },
];

fn trader(world: &mut World) -> String {
    world.resources.credit(ResourceKind::Food, 6);
    "A wandering trader leaves 6 food in exchange for stories".to_string()
}

fn storm(world: &mut World) -> String {
    for colonist in world.colonists.values_mut() {
        colonist.adjust_mood(-8.0);
    }
    "A storm batters the camp. Spirits sink".to_string()
}

fn raid(world: &mut World) -> String {
    let taken = world.resources.debit_up_to(ResourceKind::Wood, 6);
    format!("Raiders slipped past the fires and made off with {taken} wood")
}

/// Picks an entry by weight using a single roll.
pub fn pick_event<'a>(
    table: &'a [WorldEvent],
    rng: &mut dyn RandomSource,
) -> Option<&'a WorldEvent> {
    let total: f64 = table.iter().map(|event| event.weight).sum();
    if total <= 0.0 {
        return None;
    }
    let mut remaining = rng.roll() * total;
    for event in table {
        if remaining < event.weight {
            return Some(event);
        }
        remaining -= event.weight;
    }
    table.last()
}

pub struct WorldEventSystem {
    chance: f64,
}

impl WorldEventSystem {
    pub fn new() -> Self {
        Self {
            chance: WORLD_EVENT_CHANCE,
        }
    }
}

impl Default for WorldEventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WorldEventSystem {
    fn name(&self) -> &str {
        "world_events"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        if !rng.chance(self.chance) {
            return Ok(());
        }
        if let Some(event) = pick_event(&WORLD_EVENTS, rng) {
            let message = (event.effect)(world);
            tracing::debug!(event = event.name, "world event");
            world.log_event(message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ROSTER;
    use crate::grid::{Position, Terrain, WorldGrid};
    use crate::rng::ScriptedRolls;

    fn ctx() -> SystemContext<'static> {
        SystemContext {
            tick: 1,
            dt: 1.0,
            day: 1,
            days_rolled: 0,
            scenario_name: "test",
        }
    }

    #[test]
    fn each_third_of_the_roll_maps_to_one_event() {
        let names: Vec<&str> = [0.1, 0.5, 0.9]
            .into_iter()
            .filter_map(|roll| {
                let mut rng = ScriptedRolls::constant(roll);
                pick_event(&WORLD_EVENTS, &mut rng).map(|e| e.name)
            })
            .collect();
        assert_eq!(names, vec!["trader", "storm", "raid"]);
    }

    #[test]
    fn raid_takes_at_most_what_is_there() {
        let mut world = World::new(WorldGrid::filled(4, Terrain::Grass), 1.0, 24.0);
        world.resources.credit(ResourceKind::Wood, 4);
        let mut system = WorldEventSystem::new();
        let mut rng = ScriptedRolls::new([0.0, 0.9], 0.9);
        system.run(&ctx(), &mut world, &mut rng).unwrap();
        assert_eq!(world.resource(ResourceKind::Wood), 0);
        assert!(world.events().contains("4 wood"));
    }

    #[test]
    fn storm_lowers_every_mood() {
        let mut world = World::new(WorldGrid::filled(4, Terrain::Grass), 1.0, 24.0);
        let a = world.spawn_colonist(&ROSTER[0], Position::new(0, 0));
        let b = world.spawn_colonist(&ROSTER[1], Position::new(1, 0));
        let mut system = WorldEventSystem::new();
        let mut rng = ScriptedRolls::new([0.0, 0.5], 0.9);
        system.run(&ctx(), &mut world, &mut rng).unwrap();
        assert_eq!(world.colonist(a).unwrap().mood, 72.0);
        assert_eq!(world.colonist(b).unwrap().mood, 72.0);
    }

    #[test]
    fn quiet_ticks_change_nothing() {
        let mut world = World::new(WorldGrid::filled(4, Terrain::Grass), 1.0, 24.0);
        let before = world.clone();
        let mut system = WorldEventSystem::new();
        let mut rng = ScriptedRolls::constant(0.5);
        system.run(&ctx(), &mut world, &mut rng).unwrap();
        assert_eq!(world, before);
    }
}
