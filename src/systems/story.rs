use anyhow::Result;
use tracing::{debug, info};

use crate::{
    catalog::{ResourceKind, StructureKind},
    components::Ending,
    engine::{System, SystemContext},
    rng::RandomSource,
    world::World,
};

pub const DAYS_TO_ENDING: u32 = 3;
pub const RESCUE_COOLDOWN_DAYS: u32 = 3;
pub const RESCUE_PACKAGE: [(ResourceKind, u32); 3] = [
    (ResourceKind::Food, 6),
    (ResourceKind::Wood, 4),
    (ResourceKind::Water, 3),
];

/// Beacon detection, the countdown to an ending, and the relief drop that
/// keeps a starving colony playable. Runs first in every tick.
pub struct StorySystem;

impl StorySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StorySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for StorySystem {
    fn name(&self) -> &str {
        "story"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut dyn RandomSource,
    ) -> Result<()> {
        if ctx.days_rolled > 0 {
            debug!(day = ctx.day, "new day");
        }

        if !world.story.beacon_built && world.has_structure(StructureKind::Beacon) {
            world.story.beacon_built = true;
            world.story.chapter += 1;
            world.log_event("The beacon is lit. A faint signal answers from beyond the ridge.");
        } else if world.story.beacon_built && world.story.ending.is_none() {
            world.story.days_after_beacon += ctx.days_rolled;
            if world.story.days_after_beacon >= DAYS_TO_ENDING {
                let ending = Ending::for_path(world.flags.path);
                world.story.ending = Some(ending);
                info!(?ending, path = ?world.flags.path, "story resolved");
                world.log_event(ending.message());
                world.end_game();
                return Ok(());
            }
        }

        check_rescue(world);
        Ok(())
    }
}

pub fn needs_rescue(world: &World) -> bool {
    world.resource(ResourceKind::Food) <= 4
        || world.resource(ResourceKind::Wood) <= 4
        || world.resource(ResourceKind::Water) <= 2
}

fn check_rescue(world: &mut World) {
    if !needs_rescue(world) {
        return;
    }
    let ready = world
        .last_rescue_day
        .map_or(true, |day| world.day().saturating_sub(day) >= RESCUE_COOLDOWN_DAYS);
    if !ready {
        return;
    }
    for (kind, amount) in RESCUE_PACKAGE {
        world.resources.credit(kind, amount);
    }
    world.last_rescue_day = Some(world.day());
    world.log_event("A relief drop lands near camp: 6 food, 4 wood, 3 water");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StoryPath;
    use crate::grid::{Position, Terrain, WorldGrid};
    use crate::rng::ScriptedRolls;

    fn stocked_world() -> World {
        let mut world = World::new(WorldGrid::filled(6, Terrain::Grass), 1.0, 24.0);
        for kind in [ResourceKind::Food, ResourceKind::Wood, ResourceKind::Water] {
            world.resources.credit(kind, 20);
        }
        world
    }

    fn ctx(day: u32, days_rolled: u32) -> SystemContext<'static> {
        SystemContext {
            tick: 1,
            dt: 1.0,
            day,
            days_rolled,
            scenario_name: "test",
        }
    }

    #[test]
    fn beacon_advances_the_chapter_once() {
        let mut world = stocked_world();
        world.spawn_structure(StructureKind::Beacon, Position::new(2, 2));
        let mut system = StorySystem::new();
        let mut rng = ScriptedRolls::constant(0.5);
        system.run(&ctx(1, 0), &mut world, &mut rng).unwrap();
        system.run(&ctx(1, 0), &mut world, &mut rng).unwrap();
        assert!(world.story().beacon_built);
        assert_eq!(world.story().chapter, 2);
    }

    #[test]
    fn ending_follows_the_story_path() {
        let mut world = stocked_world();
        world.spawn_structure(StructureKind::Beacon, Position::new(2, 2));
        world.flags.path = Some(StoryPath::Military);
        let mut system = StorySystem::new();
        let mut rng = ScriptedRolls::constant(0.5);
        system.run(&ctx(1, 0), &mut world, &mut rng).unwrap();
        for day in 2..=4 {
            system.run(&ctx(day, 1), &mut world, &mut rng).unwrap();
        }
        assert_eq!(world.story().ending, Some(Ending::Garrison));
        assert!(world.is_paused());
        assert!(world.is_game_over());
        assert_eq!(world.events().latest(), Some(Ending::Garrison.message()));
    }

    #[test]
    fn rescue_waits_for_its_cooldown() {
        let mut world = World::new(WorldGrid::filled(6, Terrain::Grass), 1.0, 1.0);
        let mut system = StorySystem::new();
        let mut rng = ScriptedRolls::constant(0.5);
        system.run(&ctx(1, 0), &mut world, &mut rng).unwrap();
        assert_eq!(world.resource(ResourceKind::Food), 6);
        assert_eq!(world.resource(ResourceKind::Water), 3);

        world.advance_clock(1.0);
        world.advance_clock(1.0);
        system.run(&ctx(3, 1), &mut world, &mut rng).unwrap();
        assert_eq!(world.resource(ResourceKind::Food), 6);

        world.advance_clock(1.0);
        system.run(&ctx(4, 1), &mut world, &mut rng).unwrap();
        assert_eq!(world.resource(ResourceKind::Food), 12);
    }
}
