//! Player intents. Each runs synchronously between ticks and either applies
//! fully or returns a `CommandError` with state untouched.

use thiserror::Error;

use crate::catalog::{BiomeId, ResourceKind, StructureKind};
use crate::components::{Cargo, EntityId, OrderMode, Shortfall, SupplyPacks, Task};
use crate::expedition;
use crate::grid::Position;
use crate::orders::{self, MATERIAL_PARCEL};
use crate::rng::RandomSource;
use crate::world::{Speed, World};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Not enough {kind}: need {needed}, have {available}")]
    InsufficientResources {
        kind: ResourceKind,
        needed: u32,
        available: u32,
    },
    #[error("Cannot build at {0}")]
    TileBlocked(Position),
    #[error("Nothing to dismantle at {0}")]
    NoStructure(Position),
    #[error("The colony's last {0} cannot be dismantled")]
    ProtectedStructure(&'static str),
    #[error("Work is already queued at {0}")]
    OrderExists(Position),
    #[error("No dismantle is waiting for confirmation")]
    NoPendingDismantle,
    #[error("No such colonist")]
    UnknownColonist,
    #[error("No colonist at {0}")]
    NoColonistAt(Position),
    #[error("Nothing to {action} at {position}")]
    InvalidTarget {
        action: &'static str,
        position: Position,
    },
    #[error("Speed must be 1x, 2x or 4x, not {0}x")]
    InvalidSpeed(u32),
    #[error("{0} has not been discovered yet")]
    BiomeLocked(&'static str),
    #[error("An expedition team needs 1 to 3 colonists, not {0}")]
    InvalidTeamSize(u32),
    #[error("Only {available} colonists can join a team of {requested}")]
    NotEnoughColonists { requested: u32, available: u32 },
    #[error("No story decision is waiting")]
    NoPendingChoice,
    #[error("Option {0} is not available")]
    InvalidOption(usize),
    #[error("A story decision must be made first")]
    ChoicePending,
    #[error("The colony's story is over")]
    GameOver,
}

impl From<Shortfall> for CommandError {
    fn from(value: Shortfall) -> Self {
        CommandError::InsufficientResources {
            kind: value.kind,
            needed: value.needed,
            available: value.available,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColonistOrder {
    Idle,
    Move(Position),
    Gather(Position),
    Build(Position),
    Hunt(Position),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    RequestBuild {
        position: Position,
        kind: StructureKind,
    },
    RequestDismantle {
        position: Position,
    },
    ConfirmDismantle,
    CancelDismantle,
    IssueColonistCommand {
        colonist: EntityId,
        order: ColonistOrder,
    },
    /// Same as `IssueColonistCommand` for the selected colonist.
    IssueSelectedCommand {
        order: ColonistOrder,
    },
    SelectColonist {
        position: Position,
    },
    SetSpeed {
        multiplier: u32,
    },
    TogglePause,
    LaunchExpedition {
        biome: BiomeId,
        team_size: u32,
        packs: SupplyPacks,
    },
    ResolveStoryChoice {
        option: usize,
    },
}

pub fn execute(
    world: &mut World,
    command: PlayerCommand,
    rng: &mut dyn RandomSource,
) -> Result<(), CommandError> {
    match command {
        PlayerCommand::RequestBuild { position, kind } => {
            orders::place_build_order(world, position, kind)
        }
        PlayerCommand::RequestDismantle { position } => {
            orders::preview_dismantle(world, position).map(|_| ())
        }
        PlayerCommand::ConfirmDismantle => orders::confirm_dismantle(world),
        PlayerCommand::CancelDismantle => orders::cancel_dismantle(world),
        PlayerCommand::IssueColonistCommand { colonist, order } => {
            issue_colonist_command(world, colonist, order)
        }
        PlayerCommand::IssueSelectedCommand { order } => {
            let colonist = world.selected.ok_or(CommandError::UnknownColonist)?;
            issue_colonist_command(world, colonist, order)
        }
        PlayerCommand::SelectColonist { position } => select_colonist(world, position).map(|_| ()),
        PlayerCommand::SetSpeed { multiplier } => set_speed(world, multiplier),
        PlayerCommand::TogglePause => toggle_pause(world).map(|_| ()),
        PlayerCommand::LaunchExpedition {
            biome,
            team_size,
            packs,
        } => expedition::launch_expedition(world, biome, team_size, packs, rng).map(|_| ()),
        PlayerCommand::ResolveStoryChoice { option } => {
            expedition::resolve_story_choice(world, option).map(|_| ())
        }
    }
}

/// Overrides whatever the colonist was doing. Automatic assignment resumes
/// once the issued task finishes.
pub fn issue_colonist_command(
    world: &mut World,
    id: EntityId,
    order: ColonistOrder,
) -> Result<(), CommandError> {
    let colonist = world.colonists.get(&id).ok_or(CommandError::UnknownColonist)?;
    let name = colonist.name.clone();
    let (task, pick_up_parcel) = match order {
        ColonistOrder::Idle => (Task::Idle, false),
        ColonistOrder::Move(target) => {
            if !world.grid.is_walkable(target) {
                return Err(CommandError::InvalidTarget {
                    action: "walk to",
                    position: target,
                });
            }
            (Task::Move { target }, false)
        }
        ColonistOrder::Gather(target) => {
            let node = world
                .node_at(target)
                .filter(|n| n.is_available())
                .ok_or(CommandError::InvalidTarget {
                    action: "gather",
                    position: target,
                })?;
            (
                Task::Gather {
                    node: node.id,
                    at: target,
                },
                false,
            )
        }
        ColonistOrder::Build(target) => {
            let order = world.order_at(target).ok_or(CommandError::InvalidTarget {
                action: "work on",
                position: target,
            })?;
            match order.mode {
                OrderMode::Build => (Task::Deliver { order: target }, true),
                OrderMode::Dismantle => (Task::Dismantle { order: target }, false),
            }
        }
        ColonistOrder::Hunt(target) => {
            let animal = world.animal_at(target).ok_or(CommandError::InvalidTarget {
                action: "hunt",
                position: target,
            })?;
            (
                Task::Hunt {
                    animal: animal.id,
                    at: target,
                },
                false,
            )
        }
    };

    if let Some(colonist) = world.colonists.get_mut(&id) {
        colonist.task = task;
        if pick_up_parcel && colonist.carrying.is_none() {
            colonist.carrying = Some(Cargo::Materials {
                amount: MATERIAL_PARCEL,
            });
        }
    }
    world.log_event(format!("{name} ordered to {}", task.label()));
    Ok(())
}

pub fn select_colonist(world: &mut World, position: Position) -> Result<EntityId, CommandError> {
    let id = world
        .colonist_at(position)
        .map(|c| c.id)
        .ok_or(CommandError::NoColonistAt(position))?;
    world.selected = Some(id);
    Ok(id)
}

pub fn set_speed(world: &mut World, multiplier: u32) -> Result<(), CommandError> {
    let speed = Speed::from_multiplier(multiplier).ok_or(CommandError::InvalidSpeed(multiplier))?;
    world.set_speed(speed);
    Ok(())
}

/// Returns the new paused state.
pub fn toggle_pause(world: &mut World) -> Result<bool, CommandError> {
    if world.is_paused() {
        if world.is_game_over() {
            return Err(CommandError::GameOver);
        }
        if world.story.pending_choice.is_some() {
            return Err(CommandError::ChoicePending);
        }
    }
    let paused = !world.is_paused();
    world.set_paused(paused);
    Ok(paused)
}
