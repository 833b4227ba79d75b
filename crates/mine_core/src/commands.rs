//! Command dispatch and the by-value command operations.
//!
//! Every command is validated against the current state. An invalid command
//! (unaffordable, unknown id, maxed, already done) changes nothing and emits
//! nothing.

use rand::Rng;

use crate::economy::{try_buy_upgrade, try_switch_mine, try_unlock_mine};
use crate::energy::{try_build_energy_source, try_upgrade_energy_source};
use crate::miner::try_hire_miner;
use crate::{
    Command, CommandEnvelope, EnergySourceId, EnergySourceKind, Event, EventEnvelope, GameContent,
    GameState, MineId, MinerKind, MinerState, OreId, UpgradeId,
};

/// Apply every command scheduled for the current tick, in order.
pub(crate) fn apply_commands(
    state: &mut GameState,
    commands: &[CommandEnvelope],
    content: &GameContent,
    rng: &mut impl Rng,
    events: &mut Vec<EventEnvelope>,
) {
    let current_tick = state.meta.tick;
    for envelope in commands {
        if envelope.execute_at_tick != current_tick {
            continue;
        }
        if let Some(event) = apply_command(state, &envelope.command, content, rng) {
            events.push(crate::emit(&mut state.counters, current_tick, event));
        }
    }
}

/// Apply a single command. Returns the event describing what happened, or
/// `None` when the command was rejected.
pub fn apply_command(
    state: &mut GameState,
    command: &Command,
    content: &GameContent,
    rng: &mut impl Rng,
) -> Option<Event> {
    match command {
        Command::HireMiner { kind } => {
            let (miner_id, cost) = try_hire_miner(state, *kind, content, rng)?;
            let specialization = state
                .miners
                .iter()
                .find(|m| m.id == miner_id)
                .and_then(|m| m.specialization);
            Some(Event::MinerHired {
                miner_id,
                kind: *kind,
                cost,
                specialization,
            })
        }
        Command::BuyUpgrade { upgrade_id } => {
            let (level, cost) = try_buy_upgrade(state, upgrade_id, content)?;
            Some(Event::UpgradePurchased {
                upgrade_id: upgrade_id.clone(),
                level,
                cost,
            })
        }
        Command::UnlockMine { mine_id } => {
            let cost = try_unlock_mine(state, mine_id, content)?;
            Some(Event::MineUnlocked {
                mine_id: mine_id.clone(),
                cost,
            })
        }
        Command::SwitchMine { mine_id } => {
            let (from, ore_count) = try_switch_mine(state, mine_id, content, rng)?;
            Some(Event::MineSwitched {
                from,
                to: mine_id.clone(),
                ore_count,
            })
        }
        Command::BuildEnergySource { kind } => {
            let (source_id, cost) = try_build_energy_source(state, *kind, content)?;
            Some(Event::EnergySourceBuilt {
                source_id,
                kind: *kind,
                cost,
            })
        }
        Command::UpgradeEnergySource { source_id } => {
            let (level, cost) = try_upgrade_energy_source(state, source_id, content)?;
            Some(Event::EnergySourceUpgraded {
                source_id: source_id.clone(),
                level,
                cost,
            })
        }
        Command::ClickOre { ore_id } => inspect_ore(state, ore_id, content),
        Command::ClickBase => inspect_base(state),
    }
}

fn inspect_ore(state: &GameState, ore_id: &OreId, content: &GameContent) -> Option<Event> {
    if state.energy.is_blackout {
        return None;
    }
    let ore = state.ores.iter().find(|o| &o.id == ore_id)?;
    Some(Event::OreInspected {
        ore_id: ore.id.clone(),
        kind: ore.kind,
        value: content.ore(ore.kind).value,
    })
}

fn inspect_base(state: &GameState) -> Option<Event> {
    if state.energy.is_blackout {
        return None;
    }
    Some(Event::BaseInspected {
        miners_resting: state
            .miners
            .iter()
            .filter(|m| m.state == MinerState::Resting)
            .count(),
        carried_value: state.miners.iter().map(|m| m.inventory_value).sum(),
    })
}

// ---------------------------------------------------------------------------
// By-value operations: the input state is consumed and the successor returned.
// A rejected command returns the input unchanged.
// ---------------------------------------------------------------------------

pub fn hire_miner(
    mut state: GameState,
    kind: MinerKind,
    content: &GameContent,
    rng: &mut impl Rng,
) -> GameState {
    try_hire_miner(&mut state, kind, content, rng);
    state
}

pub fn buy_upgrade(
    mut state: GameState,
    upgrade_id: &UpgradeId,
    content: &GameContent,
) -> GameState {
    try_buy_upgrade(&mut state, upgrade_id, content);
    state
}

pub fn unlock_mine(mut state: GameState, mine_id: &MineId, content: &GameContent) -> GameState {
    try_unlock_mine(&mut state, mine_id, content);
    state
}

pub fn switch_mine(
    mut state: GameState,
    mine_id: &MineId,
    content: &GameContent,
    rng: &mut impl Rng,
) -> GameState {
    try_switch_mine(&mut state, mine_id, content, rng);
    state
}

pub fn build_energy_source(
    mut state: GameState,
    kind: EnergySourceKind,
    content: &GameContent,
) -> GameState {
    try_build_energy_source(&mut state, kind, content);
    state
}

pub fn upgrade_energy_source(
    mut state: GameState,
    source_id: &EnergySourceId,
    content: &GameContent,
) -> GameState {
    try_upgrade_energy_source(&mut state, source_id, content);
    state
}
