use std::collections::BTreeMap;

use rand::Rng;

use crate::behavior::{update_miner_state, Collection, MinerContext, OreClaims};
use crate::commands::apply_commands;
use crate::economy::pickaxe_level;
use crate::energy::{initial_energy_state, update_energy_state, BlackoutTransition};
use crate::layout::MineLayout;
use crate::ore::update_ore_regeneration;
use crate::{
    CommandEnvelope, Counters, Event, EventEnvelope, GameContent, GameState, MetaState, MineId,
    MineState, Position,
};

/// Bumped whenever `GameState`'s serialized shape changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Starting state: every catalog mine with its unlock flag, the first unlocked
/// mine active, no miners, no ores, starting money and a full energy pool.
pub fn initialize_game_state(content: &GameContent, seed: u64) -> GameState {
    let mines = content
        .mines
        .iter()
        .map(|def| {
            let layout = MineLayout::new(def, &content.constants);
            let state = MineState {
                id: def.id.clone(),
                unlocked: def.unlocked,
                base_position: layout.base_position(),
            };
            (def.id.clone(), state)
        })
        .collect();
    let active_mine = content
        .mines
        .iter()
        .find(|m| m.unlocked)
        .or_else(|| content.mines.first())
        .map_or_else(|| MineId(String::new()), |m| m.id.clone());

    GameState {
        meta: MetaState {
            tick: 0,
            seed,
            schema_version: SCHEMA_VERSION,
            content_version: content.content_version.clone(),
            last_update_time: 0.0,
        },
        miners: Vec::new(),
        ores: Vec::new(),
        rails: Vec::new(),
        resources: BTreeMap::new(),
        resource_rate: BTreeMap::new(),
        money: content.constants.starting_money,
        money_rate: 0.0,
        upgrades: BTreeMap::new(),
        active_mine,
        mines,
        energy: initial_energy_state(&content.constants),
        counters: Counters::default(),
    }
}

/// Advance the simulation by one frame of `delta_seconds`.
///
/// Order of operations:
/// 1. Apply commands scheduled for this tick.
/// 2. Integrate energy and update the blackout flag.
/// 3. Count down ore regeneration.
/// 4. Run every miner's state machine against the same pre-tick snapshot.
/// 5. Fold depleted ores and collections back into the state.
/// 6. Increment the tick, stamp the time, derive the money rate.
///
/// Returns all events produced this tick.
pub fn tick(
    state: &mut GameState,
    commands: &[CommandEnvelope],
    content: &GameContent,
    delta_seconds: f64,
    rng: &mut impl Rng,
) -> Vec<EventEnvelope> {
    let delta = if delta_seconds.is_finite() {
        delta_seconds.max(0.0)
    } else {
        0.0
    };
    let mut events = Vec::new();

    apply_commands(state, commands, content, rng, &mut events);
    advance_energy(state, content, delta, &mut events);
    advance_ores(state, delta, &mut events);
    let money_gained = advance_miners(state, content, delta, rng, &mut events);

    state.meta.tick += 1;
    state.meta.last_update_time += delta;
    state.money_rate = if delta > 0.0 { money_gained / delta } else { 0.0 };
    events
}

/// By-value tick with no commands: consumes the state and returns its successor.
pub fn update_game_state(
    mut state: GameState,
    content: &GameContent,
    delta_seconds: f64,
    rng: &mut impl Rng,
) -> GameState {
    tick(&mut state, &[], content, delta_seconds, rng);
    state
}

fn advance_energy(
    state: &mut GameState,
    content: &GameContent,
    delta: f64,
    events: &mut Vec<EventEnvelope>,
) {
    let current_tick = state.meta.tick;
    let transition = update_energy_state(&mut state.energy, &state.miners, content, delta);
    let current_energy = state.energy.current_energy;
    let event = match transition {
        Some(BlackoutTransition::Started) => Event::BlackoutStarted { current_energy },
        Some(BlackoutTransition::Ended) => Event::BlackoutEnded { current_energy },
        None => return,
    };
    events.push(crate::emit(&mut state.counters, current_tick, event));
}

fn advance_ores(state: &mut GameState, delta: f64, events: &mut Vec<EventEnvelope>) {
    let current_tick = state.meta.tick;
    for ore_id in update_ore_regeneration(&mut state.ores, delta) {
        events.push(crate::emit(
            &mut state.counters,
            current_tick,
            Event::OreRegenerated { ore_id },
        ));
    }
}

/// Run the state machine for every miner, in hire order, and fold the results.
/// Returns the money deposited this tick.
fn advance_miners(
    state: &mut GameState,
    content: &GameContent,
    delta: f64,
    rng: &mut impl Rng,
    events: &mut Vec<EventEnvelope>,
) -> f64 {
    let current_tick = state.meta.tick;
    let mine_multiplier = content
        .mine(&state.active_mine)
        .map_or(1.0, |m| m.resource_multiplier);
    let base_position = state
        .mines
        .get(&state.active_mine)
        .map_or(Position::default(), |m| m.base_position);
    let ctx = MinerContext {
        content,
        ores: &state.ores,
        pickaxe_level: pickaxe_level(&state.upgrades, content),
        mine_multiplier,
        base_position,
        is_blackout: state.energy.is_blackout,
        delta_seconds: delta,
    };

    // Same-tick acquisitions join the pre-tick claims so two seekers never
    // pick the same ore.
    let mut claims = OreClaims::from_miners(&state.miners);
    let mut updated_miners = Vec::with_capacity(state.miners.len());
    let mut depleted_ores = Vec::new();
    let mut collections = Vec::new();

    for miner in &state.miners {
        let update = update_miner_state(miner, &ctx, &claims, rng);
        if let Some(ore_id) = update.acquired {
            claims.claim(ore_id.clone());
            events.push(crate::emit(
                &mut state.counters,
                current_tick,
                Event::TargetAcquired {
                    miner_id: miner.id.clone(),
                    ore_id,
                },
            ));
        }
        if let Some(ore) = update.ore {
            depleted_ores.push(ore);
        }
        if let Some(collection) = update.collected {
            collections.push((miner.id.clone(), collection));
        }
        updated_miners.push(update.miner);
    }
    state.miners = updated_miners;

    for ore in depleted_ores {
        let ore_id = ore.id.clone();
        if let Some(slot) = state.ores.iter_mut().find(|o| o.id == ore_id) {
            *slot = ore;
            events.push(crate::emit(
                &mut state.counters,
                current_tick,
                Event::OreDepleted { ore_id },
            ));
        }
    }

    state.resource_rate.clear();
    let mut money_gained = 0.0;
    for (miner_id, collection) in collections {
        let event = match collection {
            Collection::OreCollected { ore_id, kind, amount } => {
                *state.resources.entry(kind).or_default() += u64::from(amount);
                if delta > 0.0 {
                    *state.resource_rate.entry(kind).or_default() += f64::from(amount) / delta;
                }
                Event::OreCollected {
                    miner_id,
                    ore_id,
                    kind,
                    amount,
                }
            }
            Collection::MoneyDeposited { amount } => {
                state.money += amount;
                money_gained += amount;
                Event::MoneyDeposited { miner_id, amount }
            }
        };
        events.push(crate::emit(&mut state.counters, current_tick, event));
    }
    money_gained
}
