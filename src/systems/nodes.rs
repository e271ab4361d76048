use anyhow::Result;
use tracing::debug;

use crate::{
    catalog::Amount,
    components::ResourceNode,
    engine::{System, SystemContext},
    rng::RandomSource,
    world::World,
};

/// Depletes a harvestable node and returns the yield scaled by `work_rate`,
/// never less than one unit. `None` when the node is still regrowing.
pub fn harvest(node: &mut ResourceNode, work_rate: f64) -> Option<Amount> {
    if !node.is_available() {
        return None;
    }
    node.amount = 0;
    node.regrow_timer = 0.0;
    let (kind, base) = node.kind.base_yield();
    let amount = ((base as f64 * work_rate).round() as u32).max(1);
    Some((kind, amount))
}

pub struct RegrowthSystem;

impl RegrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RegrowthSystem {
    fn name(&self) -> &str {
        "nodes"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut dyn RandomSource,
    ) -> Result<()> {
        for node in world.nodes.values_mut() {
            if node.is_available() {
                continue;
            }
            node.regrow_timer += ctx.dt;
            if node.regrow_timer >= node.kind.regrow_time() {
                node.amount = 1;
                node.regrow_timer = 0.0;
                debug!(node = node.id.raw(), kind = node.kind.label(), "node regrown");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NodeKind, ResourceKind};
    use crate::grid::{Position, Terrain, WorldGrid};
    use crate::rng::ScriptedRolls;

    #[test]
    fn harvest_scales_and_floors_at_one() {
        let mut world = World::new(WorldGrid::filled(4, Terrain::Grass), 1.0, 24.0);
        let id = world.spawn_node(NodeKind::Berries, Position::new(1, 1));
        let node = world.node_mut(id).unwrap();
        assert_eq!(harvest(node, 1.2), Some((ResourceKind::Food, 4)));
        assert_eq!(node.amount, 0);
        assert_eq!(harvest(node, 1.0), None);

        node.amount = 1;
        assert_eq!(harvest(node, 0.1), Some((ResourceKind::Food, 1)));
    }

    #[test]
    fn berries_regrow_before_trees() {
        let mut world = World::new(WorldGrid::filled(4, Terrain::Grass), 1.0, 24.0);
        let berries = world.spawn_node(NodeKind::Berries, Position::new(0, 0));
        let tree = world.spawn_node(NodeKind::Tree, Position::new(1, 0));
        for id in [berries, tree] {
            world.node_mut(id).unwrap().amount = 0;
        }
        let mut system = RegrowthSystem::new();
        let mut rng = ScriptedRolls::constant(0.5);
        let ctx = SystemContext {
            tick: 1,
            dt: 10.0,
            day: 1,
            days_rolled: 0,
            scenario_name: "test",
        };
        system.run(&ctx, &mut world, &mut rng).unwrap();
        system.run(&ctx, &mut world, &mut rng).unwrap();
        assert!(world.node(berries).unwrap().is_available());
        assert_eq!(world.node(berries).unwrap().regrow_timer, 0.0);
        assert!(!world.node(tree).unwrap().is_available());

        for _ in 0..2 {
            system.run(&ctx, &mut world, &mut rng).unwrap();
        }
        assert!(world.node(tree).unwrap().is_available());
    }
}
