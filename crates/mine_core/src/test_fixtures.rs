//! Shared test fixtures for `mine_core` and downstream crates.
//!
//! `base_content()` mirrors the shipped catalogs so formulas can be checked
//! against known numbers. `base_state()` is a fresh game with the starter
//! mine's ore field laid out and no miners hired.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    AreaDef, Constants, EnergySourceDef, EnergySourceKind, GameContent, GameState, MineDef, MineId,
    Miner, MinerDef, MinerId, MinerKind, OreDef, OreKind, Position, UpgradeDef, UpgradeEffect,
    UpgradeId,
};

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

pub fn base_constants() -> Constants {
    Constants {
        starting_money: 50.0,
        max_energy: 1000.0,
        base_energy_regen: 1.0,
        mining_energy_per_second: 20.0,
        movement_energy_per_second: 4.0,
        blackout_threshold: 0.0,
        blackout_recovery_threshold: 0.1,
        move_speed_factor: 5.0,
        arrival_epsilon: 0.1,
        rest_duration_seconds: 5.0,
        hire_cost_growth: 1.2,
        hire_min_spacing: 15.0,
        hire_placement_attempts: 50,
        energy_upgrade_cost_growth: 1.5,
        pickaxe_bonus_per_level: 0.3,
        expert_specialization_efficiency: 2.0,
        expert_specialization_yield: 2.5,
        expert_specializations: vec![
            OreKind::Gold,
            OreKind::Crystal,
            OreKind::Gem,
            OreKind::Legendary,
            OreKind::Platinum,
            OreKind::Uranium,
        ],
        engineer_yield_bonus: 1.5,
        prospector_top_fraction: 0.3,
        engineer_top_fraction: 0.5,
        rare_value_threshold: 5.0,
        yield_jitter_min: 0.85,
        yield_jitter_max: 1.15,
        map_width_tiles: 100,
        map_height_tiles: 50,
    }
}

fn ore(hardness: f64, value: f64, rarity: f64, regeneration_time: f64) -> OreDef {
    OreDef {
        base_yield: 1.0,
        hardness,
        value,
        rarity,
        regeneration_time,
    }
}

fn miner(name: &str, efficiency: f64, speed: f64, capacity: f64, cost: f64) -> MinerDef {
    MinerDef {
        name: name.to_string(),
        description: String::new(),
        base_efficiency: efficiency,
        base_speed: speed,
        base_capacity: capacity,
        base_cost: cost,
    }
}

fn source(
    name: &str,
    cost: f64,
    output: f64,
    maintenance: f64,
    mult: f64,
    max: u32,
) -> EnergySourceDef {
    EnergySourceDef {
        name: name.to_string(),
        base_cost: cost,
        base_output: output,
        base_maintenance: maintenance,
        efficiency_multiplier: mult,
        max_level: max,
    }
}

fn upgrade(
    id: &str,
    base_cost: f64,
    cost_multiplier: f64,
    max_level: Option<u32>,
    effect: UpgradeEffect,
) -> UpgradeDef {
    UpgradeDef {
        id: UpgradeId(id.to_string()),
        name: id.to_string(),
        description: String::new(),
        base_cost,
        cost_multiplier,
        max_level,
        effect,
    }
}

#[allow(clippy::too_many_arguments)]
fn mine(
    id: &str,
    cost: f64,
    unlocked: bool,
    multiplier: f64,
    rare: f64,
    ore_count: u32,
    width: u32,
    height: u32,
) -> MineDef {
    MineDef {
        id: MineId(id.to_string()),
        name: id.to_string(),
        description: String::new(),
        cost,
        unlocked,
        resource_multiplier: multiplier,
        rare_ore_chance: rare,
        ore_count,
        available_area: AreaDef { width, height },
    }
}

pub fn base_content() -> GameContent {
    GameContent {
        content_version: "test".to_string(),
        ores: BTreeMap::from([
            (OreKind::Coal, ore(5.0, 1.0, 0.25, 2.0)),
            (OreKind::Iron, ore(4.0, 2.0, 0.18, 3.0)),
            (OreKind::Copper, ore(6.0, 2.0, 0.18, 4.0)),
            (OreKind::Gold, ore(3.0, 5.0, 0.08, 10.0)),
            (OreKind::Crystal, ore(3.5, 10.0, 0.05, 15.0)),
            (OreKind::Gem, ore(4.0, 25.0, 0.015, 30.0)),
            (OreKind::Legendary, ore(4.5, 100.0, 0.005, 60.0)),
            (OreKind::Tin, ore(2.0, 1.0, 0.22, 2.0)),
            (OreKind::Silver, ore(3.0, 4.0, 0.1, 8.0)),
            (OreKind::Mithril, ore(4.0, 15.0, 0.03, 20.0)),
            (OreKind::Thorium, ore(4.5, 20.0, 0.02, 25.0)),
            (OreKind::Platinum, ore(6.0, 30.0, 0.01, 35.0)),
            (OreKind::Orichalcum, ore(7.5, 50.0, 0.008, 45.0)),
            (OreKind::Uranium, ore(8.0, 75.0, 0.006, 55.0)),
        ]),
        miners: BTreeMap::from([
            (MinerKind::Basic, miner("Basic Miner", 1.0, 1.0, 10.0, 10.0)),
            (MinerKind::Expert, miner("Expert Miner", 2.5, 0.8, 12.0, 50.0)),
            (MinerKind::Hauler, miner("Hauler", 0.8, 1.8, 35.0, 75.0)),
            (MinerKind::Prospector, miner("Prospector", 1.2, 1.4, 8.0, 100.0)),
            (MinerKind::Engineer, miner("Engineer", 3.5, 1.1, 25.0, 150.0)),
        ]),
        energy_sources: BTreeMap::from([
            (EnergySourceKind::Solar, source("Solar Panel", 100.0, 1.0, 1.0, 1.2, 5)),
            (EnergySourceKind::Wind, source("Wind Turbine", 250.0, 2.0, 2.0, 1.3, 5)),
            (EnergySourceKind::Geothermal, source("Geothermal Plant", 1000.0, 5.0, 5.0, 1.5, 3)),
            (EnergySourceKind::Nuclear, source("Nuclear Reactor", 5000.0, 20.0, 15.0, 2.0, 2)),
        ]),
        upgrades: vec![
            upgrade("pickaxe", 20.0, 1.5, None, UpgradeEffect::MinerEfficiency { per_level: 0.3 }),
            upgrade("boots", 30.0, 1.5, None, UpgradeEffect::MinerSpeed { per_level: 0.25 }),
            upgrade("backpack", 50.0, 1.6, None, UpgradeEffect::MinerCapacity { per_level: 0.4 }),
            upgrade(
                "scanner",
                100.0,
                2.0,
                Some(5),
                UpgradeEffect::RareOreChance { per_level: 0.2 },
            ),
        ],
        mines: vec![
            mine("starter", 0.0, true, 1.0, 1.0, 20, 40, 25),
            mine("advanced", 1000.0, false, 2.0, 1.5, 25, 50, 30),
            mine("premium", 10_000.0, false, 4.0, 2.0, 30, 60, 35),
            mine("legendary", 50_000.0, false, 8.0, 3.0, 35, 80, 40),
        ],
        constants: base_constants(),
    }
}

/// Fresh game: starter mine active with its rails and ore field, no miners.
pub fn base_state(content: &GameContent) -> GameState {
    let mut state = crate::initialize_game_state(content, 42);
    let mut rng = make_rng();
    crate::populate_active_mine(&mut state, content, &mut rng);
    state
}

/// A miner of `kind` with baseline stats and id `miner_{index:04}`, seeking at
/// the center of the map.
pub fn make_miner(content: &GameContent, index: usize, kind: MinerKind) -> Miner {
    let mut rng = make_rng();
    crate::create_miner(
        MinerId(format!("miner_{index:04}")),
        kind,
        Position::new(50.0, 50.0),
        None,
        content,
        &mut rng,
    )
}
