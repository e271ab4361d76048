//! Build and dismantle work orders, and the salvage returned when a
//! structure comes down.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Amount, ResourceKind, StructureKind};
use crate::commands::CommandError;
use crate::components::{BuildOrder, EntityId, OrderMode};
use crate::grid::Position;
use crate::rng::RandomSource;
use crate::world::World;

/// Materials picked up by a colonist assigned to a delivery.
pub const MATERIAL_PARCEL: u32 = 2;
pub const MIN_DISMANTLE_WORK: u32 = 4;
pub const MIN_RETURN_RATE: f64 = 0.3;
pub const MAX_RETURN_RATE: f64 = 0.7;
pub const DISMANTLE_MOOD_COST: f64 = 2.0;
pub const INJURY_CHANCE: f64 = 0.15;
pub const INJURY_REST_COST: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DismantlePreview {
    pub position: Position,
    pub structure: EntityId,
    pub kind: StructureKind,
    pub return_rate: f64,
    pub returns: Vec<Amount>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    InProgress { progress: u32, cost: u32 },
    Built { structure: EntityId },
    Dismantled { returns: Vec<Amount> },
}

/// Checks the tile and the full cost, debits it, and queues the order.
pub fn place_build_order(
    world: &mut World,
    position: Position,
    kind: StructureKind,
) -> Result<(), CommandError> {
    if !world.can_build_at(position) {
        return Err(CommandError::TileBlocked(position));
    }
    let def = kind.def();
    world.resources.try_debit(def.cost)?;
    world.orders.insert(
        position,
        BuildOrder {
            position,
            kind,
            cost: def.work,
            progress: 0,
            mode: OrderMode::Build,
            label: format!("Build {}", def.label),
            target: None,
        },
    );
    world.log_event(format!("{} planned at {position}", def.label));
    Ok(())
}

/// Validates a dismantle request and stores the salvage estimate for the
/// player to confirm.
pub fn preview_dismantle(
    world: &mut World,
    position: Position,
) -> Result<DismantlePreview, CommandError> {
    let structure = world
        .structure_at(position)
        .filter(|s| !s.disabled)
        .ok_or(CommandError::NoStructure(position))?;
    let (id, kind) = (structure.id, structure.kind);
    let def = kind.def();
    if def.protected && world.count_active_structures(kind) <= 1 {
        return Err(CommandError::ProtectedStructure(def.label));
    }
    if world.orders.contains_key(&position) {
        return Err(CommandError::OrderExists(position));
    }

    let return_rate = salvage_rate(world, None);
    let preview = DismantlePreview {
        position,
        structure: id,
        kind,
        return_rate,
        returns: salvage_returns(kind, return_rate),
    };
    world.log_event(format!(
        "Dismantle {}? Expected return {}",
        def.label,
        describe(&preview.returns)
    ));
    world.pending_dismantle = Some(preview.clone());
    Ok(preview)
}

pub fn confirm_dismantle(world: &mut World) -> Result<(), CommandError> {
    let preview = world
        .pending_dismantle
        .take()
        .ok_or(CommandError::NoPendingDismantle)?;
    let def = preview.kind.def();
    // state may have moved on since the preview
    let still_there = world
        .structures
        .get(&preview.structure)
        .is_some_and(|s| !s.disabled && s.position == preview.position);
    if !still_there {
        return Err(CommandError::NoStructure(preview.position));
    }
    if def.protected && world.count_active_structures(preview.kind) <= 1 {
        return Err(CommandError::ProtectedStructure(def.label));
    }
    if world.orders.contains_key(&preview.position) {
        return Err(CommandError::OrderExists(preview.position));
    }

    if let Some(structure) = world.structures.get_mut(&preview.structure) {
        structure.disabled = true;
    }
    world.orders.insert(
        preview.position,
        BuildOrder {
            position: preview.position,
            kind: preview.kind,
            cost: def.work.max(MIN_DISMANTLE_WORK),
            progress: 0,
            mode: OrderMode::Dismantle,
            label: format!("Dismantle {}", def.label),
            target: Some(preview.structure),
        },
    );
    world.log_event(format!("Dismantling {} at {}", def.label, preview.position));
    Ok(())
}

pub fn cancel_dismantle(world: &mut World) -> Result<(), CommandError> {
    world
        .pending_dismantle
        .take()
        .map(|_| ())
        .ok_or(CommandError::NoPendingDismantle)
}

/// Adds work to the order at `position`. Completes it when progress reaches
/// cost. Returns `None` when no order of `mode` is there any more.
pub fn contribute(
    world: &mut World,
    position: Position,
    mode: OrderMode,
    work: u32,
    worker: Option<EntityId>,
    rng: &mut dyn RandomSource,
) -> Option<OrderOutcome> {
    let order = world.orders.get_mut(&position).filter(|o| o.mode == mode)?;
    order.progress = order.progress.saturating_add(work);
    if !order.is_complete() {
        return Some(OrderOutcome::InProgress {
            progress: order.progress,
            cost: order.cost,
        });
    }
    let order = world.orders.remove(&position)?;
    match order.mode {
        OrderMode::Build => Some(complete_build(world, &order)),
        OrderMode::Dismantle => complete_dismantle(world, &order, worker, rng),
    }
}

fn complete_build(world: &mut World, order: &BuildOrder) -> OrderOutcome {
    let structure = world.spawn_structure(order.kind, order.position);
    world.log_event(format!("{} completed", order.kind.label()));
    OrderOutcome::Built { structure }
}

fn complete_dismantle(
    world: &mut World,
    order: &BuildOrder,
    worker: Option<EntityId>,
    rng: &mut dyn RandomSource,
) -> Option<OrderOutcome> {
    let target = order.target?;
    if world.remove_structure(target).is_none() {
        debug!(position = %order.position, "dismantle target already gone");
        return None;
    }

    let work_rate = worker
        .and_then(|id| world.colonists.get(&id))
        .map(|c| c.modifiers.work_rate);
    let rate = salvage_rate(world, work_rate);
    let returns = salvage_returns(order.kind, rate);
    for &(kind, amount) in &returns {
        world.resources.credit(kind, amount);
    }
    world.dismantles_completed += 1;
    world.log_event(format!(
        "{} dismantled, recovered {}",
        order.kind.label(),
        describe(&returns)
    ));

    for colonist in world.colonists.values_mut() {
        colonist.adjust_mood(-DISMANTLE_MOOD_COST);
    }
    if let Some(id) = worker {
        if rng.chance(INJURY_CHANCE) {
            if let Some(colonist) = world.colonists.get_mut(&id) {
                colonist.adjust_rest(-INJURY_REST_COST);
                let name = colonist.name.clone();
                world.log_event(format!("{name} was hurt while dismantling"));
            }
        }
    }
    Some(OrderOutcome::Dismantled { returns })
}

/// Return rate for the next dismantle. `work_rate` is the executing
/// colonist's, or `None` for an estimate.
pub fn salvage_rate(world: &World, work_rate: Option<f64>) -> f64 {
    let average_mood = world.average_mood().unwrap_or(0.0);
    let tools = world.resources.get(ResourceKind::Tools);
    let ordinal = world.dismantles_completed + 1;
    return_rate(average_mood, work_rate, tools, ordinal)
}

pub fn return_rate(average_mood: f64, work_rate: Option<f64>, tools: u32, ordinal: u32) -> f64 {
    let mood_factor = 0.3 + (average_mood / 100.0) * 0.4;
    let skill_factor = work_rate.map_or(1.0, |rate| rate.min(1.2));
    let tool_factor = 1.0 + (tools as f64 * 0.02).min(0.15);
    let penalty = if ordinal >= 3 { 0.85 } else { 1.0 };
    (mood_factor * skill_factor * tool_factor * penalty).clamp(MIN_RETURN_RATE, MAX_RETURN_RATE)
}

pub fn salvage_returns(kind: StructureKind, rate: f64) -> Vec<Amount> {
    kind.def()
        .salvage
        .iter()
        .map(|&(resource, base)| (resource, (base as f64 * rate).floor() as u32))
        .collect()
}

fn describe(amounts: &[Amount]) -> String {
    let parts: Vec<String> = amounts
        .iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(kind, amount)| format!("{amount} {kind}"))
        .collect();
    if parts.is_empty() {
        "nothing".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ROSTER;
    use crate::grid::{Terrain, WorldGrid};
    use crate::rng::ScriptedRolls;

    fn world_with_wood(wood: u32) -> World {
        let mut world = World::new(WorldGrid::filled(8, Terrain::Grass), 1.0 / 60.0, 24.0);
        world.resources.credit(ResourceKind::Wood, wood);
        world
    }

    #[test]
    fn build_debits_cost_and_queues_work() {
        let mut world = world_with_wood(20);
        let at = Position::new(2, 2);
        place_build_order(&mut world, at, StructureKind::Stockpile).unwrap();
        assert_eq!(world.resource(ResourceKind::Wood), 8);
        let order = world.order_at(at).unwrap();
        assert_eq!(order.cost, StructureKind::Stockpile.def().work);
        assert_eq!(order.progress, 0);
        assert_eq!(
            place_build_order(&mut world, at, StructureKind::Hut),
            Err(CommandError::TileBlocked(at))
        );
    }

    #[test]
    fn unaffordable_build_changes_nothing() {
        let mut world = world_with_wood(5);
        let err = place_build_order(&mut world, Position::new(1, 1), StructureKind::Stockpile)
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::InsufficientResources {
                kind: ResourceKind::Wood,
                ..
            }
        ));
        assert_eq!(world.resource(ResourceKind::Wood), 5);
        assert_eq!(world.orders().count(), 0);
    }

    #[test]
    fn last_camp_is_protected() {
        let mut world = world_with_wood(0);
        let at = Position::new(4, 4);
        world.spawn_structure(StructureKind::Camp, at);
        assert_eq!(
            preview_dismantle(&mut world, at),
            Err(CommandError::ProtectedStructure("Camp"))
        );
        world.spawn_structure(StructureKind::Camp, Position::new(1, 1));
        assert!(preview_dismantle(&mut world, at).is_ok());
    }

    #[test]
    fn second_camp_cannot_follow_the_first_into_dismantle() {
        let mut world = world_with_wood(0);
        let first = Position::new(1, 1);
        let second = Position::new(5, 5);
        world.spawn_structure(StructureKind::Camp, first);
        world.spawn_structure(StructureKind::Camp, second);

        preview_dismantle(&mut world, first).unwrap();
        confirm_dismantle(&mut world).unwrap();
        assert_eq!(world.count_active_structures(StructureKind::Camp), 1);
        assert_eq!(
            preview_dismantle(&mut world, second),
            Err(CommandError::ProtectedStructure("Camp"))
        );
        assert!(world.order_at(second).is_none());
        assert!(world.has_structure(StructureKind::Camp));
    }

    #[test]
    fn confirm_rechecks_protection_against_a_stale_preview() {
        let mut world = world_with_wood(0);
        let first = Position::new(1, 1);
        let second = Position::new(5, 5);
        world.spawn_structure(StructureKind::Camp, first);
        let id = world.spawn_structure(StructureKind::Camp, second);

        preview_dismantle(&mut world, second).unwrap();
        // the other camp goes down before the player confirms
        if let Some(camp) = world.structure_at(first).map(|s| s.id) {
            world.structures.get_mut(&camp).unwrap().disabled = true;
        }
        assert_eq!(
            confirm_dismantle(&mut world),
            Err(CommandError::ProtectedStructure("Camp"))
        );
        assert!(!world.structure(id).unwrap().disabled);
    }

    #[test]
    fn confirm_disables_structure_and_queues_minimum_work() {
        let mut world = world_with_wood(0);
        let at = Position::new(3, 3);
        let id = world.spawn_structure(StructureKind::Stockpile, at);
        preview_dismantle(&mut world, at).unwrap();
        confirm_dismantle(&mut world).unwrap();
        assert!(world.structure(id).unwrap().disabled);
        let order = world.order_at(at).unwrap();
        assert_eq!(order.mode, OrderMode::Dismantle);
        assert_eq!(order.cost, MIN_DISMANTLE_WORK.max(StructureKind::Stockpile.def().work));
        assert_eq!(confirm_dismantle(&mut world), Err(CommandError::NoPendingDismantle));
    }

    #[test]
    fn return_rate_is_clamped() {
        assert_eq!(return_rate(0.0, Some(1.0), 0, 1), MIN_RETURN_RATE);
        assert_eq!(return_rate(100.0, Some(2.0), 50, 1), MAX_RETURN_RATE);
        let tired = return_rate(80.0, Some(1.0), 0, 3);
        let fresh = return_rate(80.0, Some(1.0), 0, 2);
        assert!(tired < fresh);
    }

    #[test]
    fn stockpile_salvage_at_minimum_rate_is_two_wood() {
        assert_eq!(
            salvage_returns(StructureKind::Stockpile, MIN_RETURN_RATE),
            vec![(ResourceKind::Wood, 2)]
        );
    }

    #[test]
    fn completing_a_dismantle_pays_salvage_and_costs_mood() {
        let mut world = world_with_wood(0);
        let at = Position::new(3, 3);
        world.spawn_structure(StructureKind::Stockpile, at);
        let worker = world.spawn_colonist(&ROSTER[0], at);
        preview_dismantle(&mut world, at).unwrap();
        confirm_dismantle(&mut world).unwrap();

        let mut rolls = ScriptedRolls::constant(0.99);
        let outcome = contribute(&mut world, at, OrderMode::Dismantle, 10, Some(worker), &mut rolls);
        // mood 80: 0.3 + 0.32 = 0.62 -> floor(7 * 0.62) = 4
        assert_eq!(
            outcome,
            Some(OrderOutcome::Dismantled {
                returns: vec![(ResourceKind::Wood, 4)]
            })
        );
        assert_eq!(world.resource(ResourceKind::Wood), 4);
        assert!(world.structure_at(at).is_none());
        assert!(world.order_at(at).is_none());
        assert_eq!(world.colonist(worker).unwrap().mood, 78.0);
        assert_eq!(world.colonist(worker).unwrap().rest, 100.0);
    }

    #[test]
    fn contribution_to_a_vanished_order_is_skipped() {
        let mut world = world_with_wood(0);
        let mut rolls = ScriptedRolls::constant(0.5);
        let outcome = contribute(
            &mut world,
            Position::new(1, 1),
            OrderMode::Build,
            2,
            None,
            &mut rolls,
        );
        assert_eq!(outcome, None);
    }
}
