use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::RandomSource,
    world::World,
};

/// Passive output from farms, wells, lumberyards and quarries.
pub struct ProductionSystem;

impl ProductionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProductionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ProductionSystem {
    fn name(&self) -> &str {
        "structures"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut dyn RandomSource,
    ) -> Result<()> {
        let mut produced = Vec::new();
        for structure in world.structures.values_mut() {
            if structure.disabled {
                continue;
            }
            let def = structure.kind.def();
            let Some(production) = def.production else {
                continue;
            };
            structure.production_timer += ctx.dt;
            if structure.production_timer >= production.interval {
                structure.production_timer = 0.0;
                produced.push((def.label, production.output));
            }
        }
        for (label, (kind, amount)) in produced {
            world.resources.credit(kind, amount);
            world.log_event(format!("{label} produced {amount} {kind}"));
        }
        Ok(())
    }
}
