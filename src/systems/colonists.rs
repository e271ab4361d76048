//! Colonist needs, automatic task assignment and task execution.
//!
//! Each colonist is processed in full (needs, then assignment, then one
//! movement step and arrival handling) before the next one starts.

use anyhow::Result;
use tracing::debug;

use crate::{
    catalog::{NodeKind, ResourceKind, StructureKind},
    components::{Cargo, Colonist, EntityId, OrderMode, Task},
    engine::{System, SystemContext},
    grid::move_towards,
    orders::{self, MATERIAL_PARCEL},
    rng::RandomSource,
    systems::{animals, nodes},
    world::World,
};

pub const HUNGER_DECAY: f64 = 0.7;
pub const REST_DECAY: f64 = 0.5;
pub const MOOD_DECAY: f64 = 0.4;
pub const MOOD_RECOVERY: f64 = 0.1;
/// Below this, either need drags mood down.
pub const NEED_DISTRESS: f64 = 20.0;

pub const HUNGRY_BELOW: f64 = 35.0;
pub const TIRED_BELOW: f64 = 30.0;
pub const RESTED_ABOVE: f64 = 90.0;
pub const MEAL_HUNGER: f64 = 45.0;
pub const MEAL_MOOD: f64 = 5.0;
pub const REST_RECOVERY: f64 = 30.0;
/// Gatherers switch from trees to berries when food falls below this.
pub const FOOD_LOW: u32 = 20;

pub const TOOL_RECIPE: [(ResourceKind, u32); 2] = [(ResourceKind::Wood, 5), (ResourceKind::Stone, 3)];
pub const TOOL_TARGET: u32 = 5;

/// One row of the assignment table. Rules are tried in priority order and
/// the first whose `applies` holds decides: its `plan` may still come back
/// empty, in which case the colonist stays idle.
pub struct AssignmentRule {
    pub priority: u8,
    pub name: &'static str,
    pub applies: fn(&World, &Colonist) -> bool,
    pub plan: fn(&World, &Colonist) -> Option<Task>,
}

pub static ASSIGNMENT_RULES: [AssignmentRule; 7] = [
    AssignmentRule {
        priority: 1,
        name: "eat",
        applies: |world, c| c.hunger < HUNGRY_BELOW && world.resource(ResourceKind::Food) > 0,
        plan: |world, _| {
            Some(Task::Eat {
                dropoff: world.colony_dropoff(),
            })
        },
    },
    AssignmentRule {
        priority: 2,
        name: "rest",
        applies: |_, c| c.rest < TIRED_BELOW,
        plan: |world, c| {
            Some(Task::Rest {
                spot: world.rest_spot_for(c.position),
            })
        },
    },
    AssignmentRule {
        priority: 3,
        name: "haul",
        applies: |_, c| c.carrying.is_some(),
        plan: |world, c| {
            Some(Task::Haul {
                dropoff: world.dropoff_for(c.position),
            })
        },
    },
    AssignmentRule {
        priority: 4,
        name: "dismantle",
        applies: |world, _| world.has_order(OrderMode::Dismantle),
        plan: |world, c| {
            world
                .nearest_order(c.position, OrderMode::Dismantle)
                .map(|order| Task::Dismantle { order })
        },
    },
    AssignmentRule {
        priority: 5,
        name: "craft",
        applies: |world, _| {
            world.has_structure(StructureKind::Workshop)
                && world.resources.check(&TOOL_RECIPE).is_ok()
                && world.resource(ResourceKind::Tools) < TOOL_TARGET
        },
        plan: |world, c| {
            world
                .nearest_structure(c.position, StructureKind::Workshop)
                .map(|workshop| Task::Craft { workshop })
        },
    },
    AssignmentRule {
        priority: 6,
        name: "deliver",
        applies: |world, _| world.has_order(OrderMode::Build),
        plan: |world, c| {
            world
                .nearest_order(c.position, OrderMode::Build)
                .map(|order| Task::Deliver { order })
        },
    },
    AssignmentRule {
        priority: 7,
        name: "gather",
        applies: |_, _| true,
        plan: |world, c| {
            let kind = if world.resource(ResourceKind::Food) < FOOD_LOW {
                NodeKind::Berries
            } else {
                NodeKind::Tree
            };
            world
                .nearest_available_node(c.position, kind)
                .map(|(node, at)| Task::Gather { node, at })
        },
    },
];

/// Runs the assignment table for one colonist. `None` means stay idle.
pub fn choose_task(world: &World, colonist: &Colonist) -> Option<Task> {
    let rule = ASSIGNMENT_RULES
        .iter()
        .find(|rule| (rule.applies)(world, colonist))?;
    (rule.plan)(world, colonist)
}

pub fn decay_needs(colonist: &mut Colonist, dt: f64) {
    let modifiers = colonist.modifiers;
    colonist.adjust_hunger(-HUNGER_DECAY * dt * modifiers.hunger_rate);
    colonist.adjust_rest(-REST_DECAY * dt / modifiers.rest_rate.max(f64::EPSILON));
    if colonist.hunger < NEED_DISTRESS || colonist.rest < NEED_DISTRESS {
        colonist.adjust_mood(-MOOD_DECAY * dt);
    } else {
        colonist.adjust_mood(MOOD_RECOVERY * dt);
    }
}

/// Progress a colonist adds for `amount` units of work.
pub fn work_units(work_rate: f64, amount: u32) -> u32 {
    ((work_rate * amount as f64).round() as u32).max(1)
}

pub struct ColonistSystem;

impl ColonistSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ColonistSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ColonistSystem {
    fn name(&self) -> &str {
        "colonists"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        for id in world.colonist_ids() {
            // an earlier colonist's hunt may have ended this one
            let Some(colonist) = world.colonists.get_mut(&id) else {
                continue;
            };
            decay_needs(colonist, ctx.dt);
            if colonist.task.is_idle() {
                assign(world, id);
            }
            execute(world, id, ctx.dt, rng);
        }
        Ok(())
    }
}

fn assign(world: &mut World, id: EntityId) {
    let Some(colonist) = world.colonists.get(&id) else {
        return;
    };
    let Some(task) = choose_task(world, colonist) else {
        return;
    };
    if let Some(colonist) = world.colonists.get_mut(&id) {
        debug!(colonist = %colonist.name, task = task.label(), "task assigned");
        colonist.task = task;
        if matches!(task, Task::Deliver { .. }) && colonist.carrying.is_none() {
            colonist.carrying = Some(Cargo::Materials {
                amount: MATERIAL_PARCEL,
            });
        }
    }
}

fn execute(world: &mut World, id: EntityId, dt: f64, rng: &mut dyn RandomSource) {
    let Some(colonist) = world.colonists.get(&id) else {
        return;
    };
    let task = colonist.task;
    let Some(goal) = task.goal() else {
        return;
    };
    let next = move_towards(&world.grid, colonist.position, goal);
    let Some(colonist) = world.colonists.get_mut(&id) else {
        return;
    };
    colonist.position = next;
    if next != goal {
        return;
    }

    match task {
        Task::Idle => {}
        Task::Eat { .. } => {
            if world.resources.try_debit(&[(ResourceKind::Food, 1)]).is_ok() {
                colonist.adjust_hunger(MEAL_HUNGER);
                colonist.adjust_mood(MEAL_MOOD);
            }
            colonist.task = Task::Idle;
        }
        Task::Rest { .. } => {
            colonist.adjust_rest(REST_RECOVERY * dt);
            if colonist.rest > RESTED_ABOVE {
                colonist.task = Task::Idle;
            }
        }
        Task::Haul { .. } => {
            if let Some(Cargo::Resource { kind, amount }) = colonist.carrying.take() {
                world.resources.credit(kind, amount);
            }
            colonist.task = Task::Idle;
        }
        Task::Craft { .. } => {
            colonist.task = Task::Idle;
            if world.resources.try_debit(&TOOL_RECIPE).is_ok() {
                world.resources.credit(ResourceKind::Tools, 1);
                let name = colonist.name.clone();
                world.log_event(format!("{name} crafted a tool"));
            }
        }
        Task::Gather { node, .. } => gather(world, id, node),
        Task::Deliver { order } => {
            let work_rate = colonist.modifiers.work_rate;
            // whatever is in hand goes into the site
            let parcel = match colonist.carrying {
                Some(cargo) if world.orders.contains_key(&order) => {
                    colonist.carrying = None;
                    Some(cargo.amount())
                }
                _ => None,
            };
            colonist.task = Task::Idle;
            if let Some(amount) = parcel {
                orders::contribute(
                    world,
                    order,
                    OrderMode::Build,
                    work_units(work_rate, amount),
                    Some(id),
                    rng,
                );
            }
        }
        Task::Dismantle { order } => {
            let work = work_units(colonist.modifiers.work_rate, 1);
            colonist.task = Task::Idle;
            orders::contribute(world, order, OrderMode::Dismantle, work, Some(id), rng);
        }
        Task::Hunt { animal, .. } => {
            colonist.task = Task::Idle;
            animals::resolve_hunt(world, id, animal, rng);
        }
        Task::Move { .. } => colonist.task = Task::Idle,
    }
}

fn gather(world: &mut World, id: EntityId, node: EntityId) {
    let Some(work_rate) = world.colonists.get(&id).map(|c| c.modifiers.work_rate) else {
        return;
    };
    let harvested = world
        .nodes
        .get_mut(&node)
        .and_then(|node| nodes::harvest(node, work_rate));
    let dropoff = world
        .colonists
        .get(&id)
        .map(|c| world.dropoff_for(c.position));
    let Some(colonist) = world.colonists.get_mut(&id) else {
        return;
    };
    match (harvested, dropoff) {
        (Some((kind, amount)), Some(dropoff)) => {
            debug!(colonist = %colonist.name, amount, kind = kind.label(), "harvested");
            colonist.carrying = Some(Cargo::Resource { kind, amount });
            colonist.task = Task::Haul { dropoff };
        }
        _ => colonist.task = Task::Idle,
    }
}
