//! Per-miner state machine.
//!
//! ```text
//! seeking   -> moving     target acquired
//! seeking   -> returning  inventory full, or nothing to mine while carrying
//! moving    -> mining     arrived at the ore
//! moving    -> seeking    ore gone or depleted
//! mining    -> seeking    action complete, or ore gone
//! mining    -> returning  inventory full
//! returning -> resting    arrived at the base
//! resting   -> seeking    rest over, carried value deposited
//! ```
//!
//! A blackout overrides everything: every miner drops to `seeking` with no
//! target. `update_miner_state` is pure over its inputs; the tick folds the
//! returned ore and collection back into the game state.

use ahash::AHashSet;
use rand::Rng;
use smallvec::SmallVec;

use crate::{GameContent, Miner, MinerKind, MinerState, Ore, OreId, OreKind, Position};

/// What a miner handed back to the tick this update.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    /// Units added to the miner's inventory from one completed mining action.
    OreCollected { ore_id: OreId, kind: OreKind, amount: u32 },
    /// Carried value converted into money at the end of a rest.
    MoneyDeposited { amount: f64 },
}

#[derive(Debug, Clone)]
pub struct MinerUpdate {
    pub miner: Miner,
    /// The ore this miner changed (depleted), if any.
    pub ore: Option<Ore>,
    pub collected: Option<Collection>,
    /// Ore newly targeted this update.
    pub acquired: Option<OreId>,
}

/// Read-only view of the world a miner decides against.
pub struct MinerContext<'a> {
    pub content: &'a GameContent,
    pub ores: &'a [Ore],
    pub pickaxe_level: u32,
    pub mine_multiplier: f64,
    pub base_position: Position,
    pub is_blackout: bool,
    pub delta_seconds: f64,
}

/// Ores held by miners that are moving to or mining them.
#[derive(Debug, Clone, Default)]
pub struct OreClaims {
    claimed: AHashSet<OreId>,
}

impl OreClaims {
    pub fn from_miners(miners: &[Miner]) -> Self {
        let claimed = miners
            .iter()
            .filter(|m| m.state.holds_claim())
            .filter_map(|m| m.target_ore_id.clone())
            .collect();
        Self { claimed }
    }

    pub fn claim(&mut self, ore_id: OreId) {
        self.claimed.insert(ore_id);
    }

    pub fn is_claimed(&self, ore_id: &OreId) -> bool {
        self.claimed.contains(ore_id)
    }
}

/// `efficiency × (1 + pickaxe × bonus) / (hardness × (1 + value / 10))`, in
/// progress per second.
pub fn calculate_mining_speed(
    miner: &Miner,
    kind: OreKind,
    pickaxe_level: u32,
    content: &GameContent,
) -> f64 {
    let ore = content.ore(kind);
    let pickaxe = 1.0 + f64::from(pickaxe_level) * content.constants.pickaxe_bonus_per_level;
    let difficulty = ore.hardness * (1.0 + ore.value / 10.0);
    if difficulty <= 0.0 {
        return 0.0;
    }
    miner.efficiency * pickaxe / difficulty
}

/// Units produced by one completed mining action. Never less than one.
pub fn calculate_resource_yield(
    miner: &Miner,
    kind: OreKind,
    pickaxe_level: u32,
    mine_multiplier: f64,
    content: &GameContent,
    rng: &mut impl Rng,
) -> u32 {
    let constants = &content.constants;
    let ore = content.ore(kind);
    let pickaxe = 1.0 + f64::from(pickaxe_level) * constants.pickaxe_bonus_per_level;
    let specialization = if miner.kind == MinerKind::Expert && miner.specialization == Some(kind) {
        constants.expert_specialization_yield
    } else {
        1.0
    };
    let engineer = if miner.kind == MinerKind::Engineer {
        constants.engineer_yield_bonus * (1.0 + ore.hardness / 10.0)
    } else {
        1.0
    };
    let jitter = if constants.yield_jitter_max > constants.yield_jitter_min {
        rng.gen_range(constants.yield_jitter_min..=constants.yield_jitter_max)
    } else {
        constants.yield_jitter_min
    };

    let raw = ore.base_yield
        * miner.efficiency
        * pickaxe
        * specialization
        * engineer
        * mine_multiplier
        * jitter;
    let rounded = raw.round();
    if rounded.is_nan() || rounded < 1.0 {
        1
    } else if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let units = rounded as u32;
        units
    }
}

/// Advance `position` toward `target` by at most `max_step`, never overshooting.
pub fn step_toward(position: Position, target: Position, max_step: f64) -> Position {
    let distance = position.distance_to(&target);
    if distance <= max_step || distance <= f64::EPSILON {
        return target;
    }
    let ratio = max_step.max(0.0) / distance;
    Position {
        x: position.x + (target.x - position.x) * ratio,
        y: position.y + (target.y - position.y) * ratio,
    }
}

/// Pick the ore a miner should head for: specialization first, then the
/// prospector's most valuable share, then the engineer's hardest share, and
/// the nearest remaining candidate within that preference.
pub fn select_target<'o>(
    miner: &Miner,
    ores: &'o [Ore],
    claims: &OreClaims,
    content: &GameContent,
) -> Option<&'o Ore> {
    let available: SmallVec<[&Ore; 32]> = ores
        .iter()
        .filter(|o| !o.depleted && !claims.is_claimed(&o.id))
        .collect();
    if available.is_empty() {
        return None;
    }

    let constants = &content.constants;
    let specialized: SmallVec<[&Ore; 32]> = match miner.specialization {
        Some(kind) => available.iter().copied().filter(|o| o.kind == kind).collect(),
        None => SmallVec::new(),
    };

    let preferred = if specialized.is_empty() {
        match miner.kind {
            MinerKind::Prospector => top_share(&available, constants.prospector_top_fraction, |o| {
                content.ore(o.kind).value
            }),
            MinerKind::Engineer => top_share(&available, constants.engineer_top_fraction, |o| {
                content.ore(o.kind).hardness
            }),
            MinerKind::Basic | MinerKind::Expert | MinerKind::Hauler => available,
        }
    } else {
        specialized
    };

    preferred.into_iter().min_by(|a, b| {
        miner
            .position
            .distance_to(&a.position)
            .total_cmp(&miner.position.distance_to(&b.position))
    })
}

/// The top `fraction` of `ores` by `score`, rounded down but at least one.
fn top_share<'o>(
    ores: &[&'o Ore],
    fraction: f64,
    score: impl Fn(&Ore) -> f64,
) -> SmallVec<[&'o Ore; 32]> {
    let mut ranked: SmallVec<[&Ore; 32]> = ores.iter().copied().collect();
    ranked.sort_by(|a, b| score(*b).total_cmp(&score(*a)));
    let wanted = (ores.len() as f64 * fraction).floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let keep = (wanted.max(1.0) as usize).min(ranked.len());
    ranked.truncate(keep);
    ranked
}

fn head_home(miner: &mut Miner, base: Position) {
    miner.state = MinerState::Returning;
    miner.target_ore_id = None;
    miner.target_position = Some(base);
}

fn drop_target(miner: &mut Miner) {
    miner.state = MinerState::Seeking;
    miner.target_ore_id = None;
    miner.target_position = None;
}

/// Complete or continue a mining action on `ore`. Returns the depleted ore and
/// the collection when the action finishes.
fn mine_step(
    miner: &mut Miner,
    ore: &Ore,
    ctx: &MinerContext<'_>,
    rng: &mut impl Rng,
) -> Option<(Ore, Collection)> {
    let speed = calculate_mining_speed(miner, ore.kind, ctx.pickaxe_level, ctx.content);
    miner.mining_progress += speed * ctx.delta_seconds;
    if miner.mining_progress < 1.0 {
        return None;
    }

    let produced = calculate_resource_yield(
        miner,
        ore.kind,
        ctx.pickaxe_level,
        ctx.mine_multiplier,
        ctx.content,
        rng,
    );
    let stored = produced.min(miner.free_slots());
    *miner.inventory.entry(ore.kind).or_default() += stored;
    miner.inventory_value = crate::miner::calculate_inventory_value(&miner.inventory, ctx.content);
    miner.mining_progress = 0.0;
    drop_target(miner);

    let mut depleted = ore.clone();
    crate::ore::deplete_ore_vein(&mut depleted);
    let collection = Collection::OreCollected {
        ore_id: ore.id.clone(),
        kind: ore.kind,
        amount: stored,
    };
    Some((depleted, collection))
}

/// Count down a rest; at the end the carried value becomes a deposit.
fn rest_step(miner: &mut Miner, ctx: &MinerContext<'_>) -> Option<Collection> {
    let duration = miner
        .rest_duration
        .unwrap_or(ctx.content.constants.rest_duration_seconds);
    let progress = miner.rest_progress.unwrap_or(0.0) + ctx.delta_seconds;
    if progress < duration {
        miner.rest_progress = Some(progress);
        miner.rest_duration = Some(duration);
        return None;
    }

    let value = miner.inventory_value;
    miner.last_dropped_value = Some(value);
    miner.inventory.clear();
    miner.inventory_value = 0.0;
    miner.rest_progress = None;
    miner.rest_duration = None;
    drop_target(miner);
    (value > 0.0).then_some(Collection::MoneyDeposited { amount: value })
}

/// Run one step of a miner's state machine against the pre-tick world.
pub fn update_miner_state(
    miner: &Miner,
    ctx: &MinerContext<'_>,
    claims: &OreClaims,
    rng: &mut impl Rng,
) -> MinerUpdate {
    let mut next = miner.clone();
    let mut ore = None;
    let mut collected = None;
    let mut acquired = None;

    let move_step = next.speed * ctx.content.constants.move_speed_factor * ctx.delta_seconds;
    let epsilon = ctx.content.constants.arrival_epsilon;
    let target_ore = next
        .target_ore_id
        .as_ref()
        .and_then(|id| ctx.ores.iter().find(|o| &o.id == id))
        .filter(|o| !o.depleted);

    match next.state {
        _ if ctx.is_blackout => drop_target(&mut next),
        MinerState::Seeking => {
            if next.is_inventory_full() {
                head_home(&mut next, ctx.base_position);
            } else if let Some(found) = select_target(&next, ctx.ores, claims, ctx.content) {
                next.state = MinerState::Moving;
                next.target_ore_id = Some(found.id.clone());
                next.target_position = Some(found.position);
                acquired = Some(found.id.clone());
            } else if next.carried() > 0 {
                // Nothing left to mine: bank what is already carried.
                head_home(&mut next, ctx.base_position);
            }
        }
        MinerState::Moving => match (target_ore, next.target_position) {
            (Some(_), Some(target)) => {
                next.position = step_toward(next.position, target, move_step);
                if next.position.distance_to(&target) < epsilon {
                    next.state = MinerState::Mining;
                    next.mining_progress = 0.0;
                }
            }
            _ => drop_target(&mut next),
        },
        MinerState::Mining => match target_ore {
            None => drop_target(&mut next),
            Some(_) if next.is_inventory_full() => head_home(&mut next, ctx.base_position),
            Some(target) => {
                if let Some((depleted, collection)) = mine_step(&mut next, target, ctx, rng) {
                    ore = Some(depleted);
                    collected = Some(collection);
                }
            }
        },
        MinerState::Returning => {
            next.target_position = Some(ctx.base_position);
            next.position = step_toward(next.position, ctx.base_position, move_step);
            if next.position.distance_to(&ctx.base_position) < epsilon {
                next.state = MinerState::Resting;
                next.rest_progress = Some(0.0);
                next.rest_duration = Some(ctx.content.constants.rest_duration_seconds);
            }
        }
        MinerState::Resting => collected = rest_step(&mut next, ctx),
    }

    MinerUpdate {
        miner: next,
        ore,
        collected,
        acquired,
    }
}
