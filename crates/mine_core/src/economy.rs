//! Upgrades, mine unlocks and mine switching.
//!
//! Miner stat upgrades never compound: a stat is always recomputed as
//! `baseline × (1 + level × per_level)`, where the baseline is the kind's
//! static value (with the expert specialization bonus folded into efficiency).

use std::collections::BTreeMap;

use rand::Rng;

use crate::layout::MineLayout;
use crate::ore::generate_ore_field;
use crate::{
    GameContent, GameState, MineId, Miner, MinerKind, MinerState, Rail, UpgradeDef, UpgradeEffect,
    UpgradeId,
};

pub fn calculate_upgrade_cost(upgrade: &UpgradeDef, current_level: u32) -> f64 {
    let exponent = i32::try_from(current_level).unwrap_or(i32::MAX);
    (upgrade.base_cost * upgrade.cost_multiplier.powi(exponent)).floor()
}

pub fn upgrade_level(upgrades: &BTreeMap<UpgradeId, u32>, id: &UpgradeId) -> u32 {
    upgrades.get(id).copied().unwrap_or(0)
}

/// Summed level of every upgrade with a mining-efficiency effect. Feeds the
/// pickaxe term of the mining speed and yield formulas.
pub fn pickaxe_level(upgrades: &BTreeMap<UpgradeId, u32>, content: &GameContent) -> u32 {
    content
        .upgrades
        .iter()
        .filter(|u| matches!(u.effect, UpgradeEffect::MinerEfficiency { .. }))
        .map(|u| upgrade_level(upgrades, &u.id))
        .sum()
}

/// Multiplier on a mine's rare-ore chance from scanner-style upgrades.
pub fn rare_ore_chance_factor(upgrades: &BTreeMap<UpgradeId, u32>, content: &GameContent) -> f64 {
    content
        .upgrades
        .iter()
        .filter_map(|u| match u.effect {
            UpgradeEffect::RareOreChance { per_level } => {
                Some(1.0 + f64::from(upgrade_level(upgrades, &u.id)) * per_level)
            }
            _ => None,
        })
        .product()
}

fn baseline_efficiency(miner: &Miner, content: &GameContent) -> f64 {
    let base = content.miner(miner.kind).base_efficiency;
    if miner.kind == MinerKind::Expert && miner.specialization.is_some() {
        base * content.constants.expert_specialization_efficiency
    } else {
        base
    }
}

/// Rewrite one miner's stat for `effect` at `level`, from baseline.
pub fn apply_upgrade_effect(
    miner: &mut Miner,
    effect: UpgradeEffect,
    level: u32,
    content: &GameContent,
) {
    let scale = |per_level: f64| 1.0 + f64::from(level) * per_level;
    let def = content.miner(miner.kind);
    match effect {
        UpgradeEffect::MinerEfficiency { per_level } => {
            miner.efficiency = baseline_efficiency(miner, content) * scale(per_level);
        }
        UpgradeEffect::MinerSpeed { per_level } => {
            miner.speed = def.base_speed * scale(per_level);
        }
        UpgradeEffect::MinerCapacity { per_level } => {
            miner.capacity = def.base_capacity * scale(per_level);
        }
        UpgradeEffect::RareOreChance { .. } => {}
    }
}

/// Bring a freshly built miner up to the currently purchased upgrade levels.
pub fn apply_upgrade_levels(
    miner: &mut Miner,
    upgrades: &BTreeMap<UpgradeId, u32>,
    content: &GameContent,
) {
    for def in &content.upgrades {
        let level = upgrade_level(upgrades, &def.id);
        if level > 0 {
            apply_upgrade_effect(miner, def.effect, level, content);
        }
    }
}

/// Buy the next level of an upgrade. `None` when unknown, maxed or unaffordable.
pub(crate) fn try_buy_upgrade(
    state: &mut GameState,
    upgrade_id: &UpgradeId,
    content: &GameContent,
) -> Option<(u32, f64)> {
    let def = content.upgrade(upgrade_id)?;
    let current = upgrade_level(&state.upgrades, upgrade_id);
    if def.max_level.is_some_and(|max| current >= max) {
        return None;
    }
    let cost = calculate_upgrade_cost(def, current);
    if state.money < cost {
        return None;
    }

    let new_level = current + 1;
    for miner in &mut state.miners {
        apply_upgrade_effect(miner, def.effect, new_level, content);
    }
    state.money -= cost;
    state.upgrades.insert(upgrade_id.clone(), new_level);
    Some((new_level, cost))
}

pub(crate) fn try_unlock_mine(
    state: &mut GameState,
    mine_id: &MineId,
    content: &GameContent,
) -> Option<f64> {
    let def = content.mine(mine_id)?;
    let mine = state.mines.get_mut(mine_id)?;
    if mine.unlocked || state.money < def.cost {
        return None;
    }
    mine.unlocked = true;
    state.money -= def.cost;
    Some(def.cost)
}

/// Make an unlocked mine active: every miner drops its task and target but
/// keeps what it carries, and the new mine gets a fresh rail track and ore field.
/// Returns the previous mine and the new ore count.
pub(crate) fn try_switch_mine(
    state: &mut GameState,
    mine_id: &MineId,
    content: &GameContent,
    rng: &mut impl Rng,
) -> Option<(MineId, usize)> {
    content.mine(mine_id)?;
    let mine = state.mines.get(mine_id)?;
    if !mine.unlocked || &state.active_mine == mine_id {
        return None;
    }

    let previous = std::mem::replace(&mut state.active_mine, mine_id.clone());
    for miner in &mut state.miners {
        miner.state = MinerState::Seeking;
        miner.target_ore_id = None;
        miner.target_position = None;
        miner.mining_progress = 0.0;
        miner.rest_progress = None;
        miner.rest_duration = None;
    }
    let ore_count = populate_active_mine(state, content, rng)?;
    Some((previous, ore_count))
}

/// Lay rails and generate the ore field for the active mine, replacing any
/// previous field. Returns the number of ores placed.
pub fn populate_active_mine(
    state: &mut GameState,
    content: &GameContent,
    rng: &mut impl Rng,
) -> Option<usize> {
    let def = content.mine(&state.active_mine)?;
    let layout = MineLayout::new(def, &content.constants);

    let track = layout.generate_rails(rng);
    let tiles = layout.ore_tiles(&track);
    state.rails = track
        .into_iter()
        .map(|(tile, kind)| Rail {
            id: crate::id::next_rail_id(&mut state.counters),
            tile,
            position: layout.to_position(tile),
            kind,
        })
        .collect();

    let rare_chance = def.rare_ore_chance * rare_ore_chance_factor(&state.upgrades, content);
    let count = usize::try_from(def.ore_count).unwrap_or(usize::MAX);
    state.ores = generate_ore_field(
        &mut state.counters,
        content,
        &layout,
        &tiles,
        count,
        rare_chance,
        rng,
    );

    if let Some(mine) = state.mines.get_mut(&state.active_mine) {
        mine.base_position = layout.base_position();
    }
    Some(state.ores.len())
}
