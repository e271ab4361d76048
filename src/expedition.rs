//! Expeditions into the surrounding biomes and the story choices they
//! uncover. Both run as player commands between ticks.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    catalog::{Amount, BiomeId, ChoiceId, ResourceKind, StoryPath},
    commands::CommandError,
    components::SupplyPacks,
    rng::RandomSource,
    world::World,
};

pub const MAX_TEAM: u32 = 3;
pub const PARTIAL_BAND: f64 = 0.2;
pub const RARE_FIND_CHANCE: f64 = 0.25;
pub const RARE_FIND_TOOLS: u32 = 1;
pub const HIDDEN_EVENT_CHANCE: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpeditionOutcome {
    Success,
    Partial,
    Failure,
}

impl ExpeditionOutcome {
    pub fn label(self) -> &'static str {
        match self {
            ExpeditionOutcome::Success => "success",
            ExpeditionOutcome::Partial => "partial success",
            ExpeditionOutcome::Failure => "failure",
        }
    }

    /// Mood and rest lost by each team member.
    fn penalty(self) -> Option<(f64, f64)> {
        match self {
            ExpeditionOutcome::Success => None,
            ExpeditionOutcome::Partial => Some((4.0, 8.0)),
            ExpeditionOutcome::Failure => Some((8.0, 15.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionReport {
    pub biome: BiomeId,
    pub outcome: ExpeditionOutcome,
    pub success_chance: f64,
    pub loot: Vec<Amount>,
    pub rare_find: bool,
    pub hidden_event: bool,
    pub unlocked: Option<BiomeId>,
    pub choice: Option<ChoiceId>,
}

pub fn preparation_score(packs: SupplyPacks, team_size: u32) -> f64 {
    (packs.food + packs.water + packs.tools * 2 + team_size) as f64 / 10.0
}

pub fn success_chance(biome: BiomeId, packs: SupplyPacks, team_size: u32) -> f64 {
    (0.6 - biome.def().risk + preparation_score(packs, team_size) * 0.2).clamp(0.2, 0.85)
}

fn hidden_event_line(biome: BiomeId) -> &'static str {
    match biome {
        BiomeId::Forest => "Carvings on an old oak point somewhere none of them recognise.",
        BiomeId::Ruins => "A radio in the rubble crackles with a voice, then falls silent.",
        BiomeId::Swamp => "Lights drift over the water at dusk, always just out of reach.",
        BiomeId::Wasteland => "Fresh tracks cross the dunes, heading toward the colony.",
        BiomeId::Mountains => "Someone has kept a signal fire burning on the far peak.",
    }
}

/// Validates and pays for an expedition, then rolls its outcome. Rolls are
/// drawn in a fixed order: outcome, one per loot line, rare find (success
/// only), hidden event.
pub fn launch_expedition(
    world: &mut World,
    biome: BiomeId,
    team_size: u32,
    packs: SupplyPacks,
    rng: &mut dyn RandomSource,
) -> Result<ExpeditionReport, CommandError> {
    let def = biome.def();
    if world.is_game_over() {
        return Err(CommandError::GameOver);
    }
    if world.story.pending_choice.is_some() {
        return Err(CommandError::ChoicePending);
    }
    if !world.exploration.unlocked.contains(&biome) {
        return Err(CommandError::BiomeLocked(def.label));
    }
    if !(1..=MAX_TEAM).contains(&team_size) {
        return Err(CommandError::InvalidTeamSize(team_size));
    }
    let available = world.colonists.len() as u32;
    if available < team_size {
        return Err(CommandError::NotEnoughColonists {
            requested: team_size,
            available,
        });
    }
    world.resources.try_debit(&packs.costs())?;

    world.exploration.team_size = team_size;
    world.exploration.packs = packs;
    world.exploration.selected_biome = Some(biome);
    world.exploration.expeditions += 1;

    let chance = success_chance(biome, packs, team_size);
    let roll = rng.roll();
    let outcome = if roll < chance {
        ExpeditionOutcome::Success
    } else if roll < chance + PARTIAL_BAND {
        ExpeditionOutcome::Partial
    } else {
        ExpeditionOutcome::Failure
    };
    info!(biome = def.label, chance, roll, outcome = outcome.label(), "expedition resolved");

    let mut report = ExpeditionReport {
        biome,
        outcome,
        success_chance: chance,
        loot: Vec::new(),
        rare_find: false,
        hidden_event: false,
        unlocked: None,
        choice: None,
    };

    if outcome != ExpeditionOutcome::Failure {
        for range in def.loot {
            let amount = rng.range_inclusive(range.min as i64, range.max as i64) as u32;
            world.resources.credit(range.kind, amount);
            report.loot.push((range.kind, amount));
        }
    }
    world.log_expedition(format!(
        "{}: {}. {}",
        def.label,
        outcome.label(),
        describe_loot(&report.loot)
    ));

    if outcome == ExpeditionOutcome::Success && rng.chance(RARE_FIND_CHANCE) {
        world.resources.credit(ResourceKind::Tools, RARE_FIND_TOOLS);
        report.rare_find = true;
        world.log_expedition("Rare find: a sealed crate of well-kept tools.");
    }
    if rng.chance(HIDDEN_EVENT_CHANCE) {
        report.hidden_event = true;
        world.log_expedition(hidden_event_line(biome));
    }

    if let Some((mood, rest)) = outcome.penalty() {
        for colonist in world
            .colonists
            .values_mut()
            .take(team_size as usize)
        {
            colonist.adjust_mood(-mood);
            colonist.adjust_rest(-rest);
        }
    }

    if outcome != ExpeditionOutcome::Failure {
        let first_visit = world.exploration.visited.insert(biome);
        if let Some(next) = def.unlocks {
            if world.exploration.unlocked.insert(next) {
                report.unlocked = Some(next);
                world.log_expedition(format!("The way to the {} is open.", next.def().label));
            }
        }
        if let Some(choice) = def.choice {
            if first_visit && !world.flags.choices.contains_key(&choice) {
                report.choice = Some(choice);
                world.story.pending_choice = Some(choice);
                world.set_paused(true);
                world.log_expedition(choice.def().prompt);
            }
        }
    }

    Ok(report)
}

/// Applies the chosen branch of the pending story choice and resumes the
/// simulation.
pub fn resolve_story_choice(world: &mut World, option: usize) -> Result<StoryPath, CommandError> {
    let choice = world
        .story
        .pending_choice
        .ok_or(CommandError::NoPendingChoice)?;
    let picked = choice
        .def()
        .options
        .get(option)
        .ok_or(CommandError::InvalidOption(option))?;

    for &(kind, delta) in picked.resources {
        if delta >= 0 {
            world.resources.credit(kind, delta as u32);
        } else {
            world.resources.debit_up_to(kind, delta.unsigned_abs());
        }
    }
    for colonist in world.colonists.values_mut() {
        colonist.adjust_mood(picked.mood);
    }
    world.flags.choices.insert(choice, picked.path);
    if world.flags.path.is_none() {
        world.flags.path = Some(picked.path);
    }
    world.story.pending_choice = None;
    if !world.is_game_over() {
        world.set_paused(false);
    }
    world.log_expedition(format!("{}: {}", picked.label, picked.outcome));
    world.log_event(picked.outcome);
    Ok(picked.path)
}

fn describe_loot(loot: &[Amount]) -> String {
    let parts: Vec<String> = loot
        .iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(kind, amount)| format!("+{amount} {kind}"))
        .collect();
    if parts.is_empty() {
        "Nothing recovered".to_string()
    } else {
        format!("Recovered {}", parts.join(", "))
    }
}
