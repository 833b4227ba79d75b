//! Energy balance: consumption from miner activity, generation from built
//! sources, integration over the tick delta, and the hysteretic blackout flag.

use crate::{
    Constants, EnergySource, EnergySourceId, EnergySourceKind, EnergyState, GameContent,
    GameState, Miner, MinerState,
};

/// Blackout flag change produced by an energy update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackoutTransition {
    Started,
    Ended,
}

pub fn initial_energy_state(constants: &Constants) -> EnergyState {
    EnergyState {
        current_energy: constants.max_energy,
        max_energy: constants.max_energy,
        energy_regen_rate: constants.base_energy_regen,
        energy_consumption: 0.0,
        energy_sources: Vec::new(),
        is_blackout: false,
    }
}

pub fn calculate_energy_consumption(miners: &[Miner], constants: &Constants) -> f64 {
    miners
        .iter()
        .map(|miner| match miner.state {
            MinerState::Mining => constants.mining_energy_per_second,
            MinerState::Moving | MinerState::Returning => constants.movement_energy_per_second,
            MinerState::Seeking | MinerState::Resting => 0.0,
        })
        .sum()
}

/// Output of a source at `level`: `base_output × multiplier^(level − 1)`.
pub fn source_output(kind: EnergySourceKind, level: u32, content: &GameContent) -> f64 {
    let def = content.energy_source(kind);
    def.base_output * level_factor(def.efficiency_multiplier, level)
}

fn level_factor(multiplier: f64, level: u32) -> f64 {
    let exponent = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
    multiplier.powi(exponent)
}

pub fn calculate_energy_generation(sources: &[EnergySource], content: &GameContent) -> f64 {
    content.constants.base_energy_regen
        + sources
            .iter()
            .map(|source| source_output(source.kind, source.level, content))
            .sum::<f64>()
}

/// Integrate one tick of energy and re-derive the blackout flag.
///
/// Consumption is zero while already blacked out. Blackout starts when energy
/// reaches the blackout threshold and only ends once energy rises strictly
/// above the recovery threshold.
pub fn update_energy_state(
    energy: &mut EnergyState,
    miners: &[Miner],
    content: &GameContent,
    delta_seconds: f64,
) -> Option<BlackoutTransition> {
    let constants = &content.constants;
    let generation = calculate_energy_generation(&energy.energy_sources, content);
    let consumption = if energy.is_blackout {
        0.0
    } else {
        calculate_energy_consumption(miners, constants)
    };

    let net = (generation - consumption) * delta_seconds;
    energy.current_energy = (energy.current_energy + net).clamp(0.0, energy.max_energy);
    energy.energy_regen_rate = generation;
    energy.energy_consumption = consumption;

    let was_blackout = energy.is_blackout;
    energy.is_blackout = if was_blackout {
        energy.current_energy <= energy.max_energy * constants.blackout_recovery_threshold
    } else {
        energy.current_energy <= energy.max_energy * constants.blackout_threshold
    };

    match (was_blackout, energy.is_blackout) {
        (false, true) => Some(BlackoutTransition::Started),
        (true, false) => Some(BlackoutTransition::Ended),
        _ => None,
    }
}

/// Build a level-1 source. `None` when the base cost is not affordable.
pub(crate) fn try_build_energy_source(
    state: &mut GameState,
    kind: EnergySourceKind,
    content: &GameContent,
) -> Option<(EnergySourceId, f64)> {
    let def = content.energy_sources.get(&kind)?;
    if state.money < def.base_cost {
        return None;
    }
    let id = crate::id::next_energy_source_id(&mut state.counters);
    state.money -= def.base_cost;
    state.energy.energy_sources.push(EnergySource {
        id: id.clone(),
        kind,
        level: 1,
        efficiency: 1.0,
        cost: def.base_cost,
        energy_output: def.base_output,
        maintenance_cost: def.base_maintenance,
    });
    Some((id, def.base_cost))
}

/// Raise a source one level, paying `floor(cost × growth)`. Derived fields are
/// recomputed from the kind's baseline for the new level.
pub(crate) fn try_upgrade_energy_source(
    state: &mut GameState,
    source_id: &EnergySourceId,
    content: &GameContent,
) -> Option<(u32, f64)> {
    let growth = content.constants.energy_upgrade_cost_growth;
    let source = state
        .energy
        .energy_sources
        .iter_mut()
        .find(|s| &s.id == source_id)?;
    let def = content.energy_sources.get(&source.kind)?;
    if source.level >= def.max_level {
        return None;
    }
    let price = (source.cost * growth).floor();
    if state.money < price {
        return None;
    }

    source.level += 1;
    source.efficiency = level_factor(def.efficiency_multiplier, source.level);
    source.energy_output = def.base_output * source.efficiency;
    source.maintenance_cost = def.base_maintenance * source.efficiency;
    source.cost = price;
    let level = source.level;

    state.money -= price;
    Some((level, price))
}
