//! Content loading and world setup shared between mine_cli and mine_bench.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use mine_core::{
    Constants, EnergySourceDef, EnergySourceKind, GameContent, GameState, MineDef, MinerDef,
    MinerKind, OreDef, OreKind, UpgradeDef,
};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Deserialize)]
struct OresFile {
    content_version: String,
    ores: BTreeMap<OreKind, OreDef>,
}

#[derive(Deserialize)]
struct MinersFile {
    miners: BTreeMap<MinerKind, MinerDef>,
}

#[derive(Deserialize)]
struct EnergySourcesFile {
    energy_sources: BTreeMap<EnergySourceKind, EnergySourceDef>,
}

#[derive(Deserialize)]
struct UpgradesFile {
    upgrades: Vec<UpgradeDef>,
}

#[derive(Deserialize)]
struct MinesFile {
    mines: Vec<MineDef>,
}

fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path = dir.join(name);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {name}"))
}

/// Validates cross-references and ranges in loaded content, panicking on any
/// authoring error.
///
/// Catches mistakes like: an ore kind missing from the catalog, an expert
/// specialization naming an unknown ore, or a mine whose area does not fit
/// on the map.
pub fn validate_content(content: &GameContent) {
    let c = &content.constants;

    // Specializations must name catalog ores.
    for kind in &c.expert_specializations {
        assert!(
            content.ores.contains_key(kind),
            "expert specialization '{kind}' is not a known ore"
        );
    }

    for kind in OreKind::ALL {
        let Some(ore) = content.ores.get(&kind) else {
            panic!("ore kind '{kind}' is missing from ores.json");
        };
        assert!(ore.hardness > 0.0, "ore '{kind}' hardness must be positive");
        assert!(ore.rarity >= 0.0, "ore '{kind}' rarity must not be negative");
        assert!(
            ore.regeneration_time > 0.0,
            "ore '{kind}' regeneration_time must be positive"
        );
    }
    assert!(
        content.ores.values().any(|o| o.rarity > 0.0),
        "at least one ore must have a positive rarity"
    );

    for kind in MinerKind::ALL {
        assert!(
            content.miners.contains_key(&kind),
            "miner kind '{kind:?}' is missing from miners.json"
        );
    }
    for kind in EnergySourceKind::ALL {
        let source = content.energy_sources.get(&kind);
        assert!(
            source.is_some_and(|s| s.max_level >= 1),
            "energy source '{kind:?}' is missing or has max_level 0"
        );
    }

    let mut upgrade_ids = HashSet::new();
    for upgrade in &content.upgrades {
        assert!(
            upgrade_ids.insert(&upgrade.id),
            "upgrade id '{}' is defined twice",
            upgrade.id
        );
        assert!(
            upgrade.cost_multiplier >= 1.0,
            "upgrade '{}' cost_multiplier must be at least 1",
            upgrade.id
        );
    }

    let mut mine_ids = HashSet::new();
    for mine in &content.mines {
        assert!(mine_ids.insert(&mine.id), "mine id '{}' is defined twice", mine.id);
        let area = mine.available_area;
        assert!(
            area.width >= 3 && area.height >= 3,
            "mine '{}' area is too small",
            mine.id
        );
        assert!(
            area.width <= c.map_width_tiles && area.height <= c.map_height_tiles,
            "mine '{}' area {}x{} does not fit the {}x{} map",
            mine.id,
            area.width,
            area.height,
            c.map_width_tiles,
            c.map_height_tiles,
        );
        assert!(
            u64::from(mine.ore_count) < u64::from(area.width) * u64::from(area.height),
            "mine '{}' ore_count exceeds its floor area",
            mine.id
        );
    }
    assert!(
        content.mines.iter().any(|m| m.unlocked),
        "at least one mine must start unlocked"
    );

    assert!(
        c.blackout_recovery_threshold > c.blackout_threshold,
        "blackout_recovery_threshold must be above blackout_threshold"
    );
    assert!(
        c.yield_jitter_min <= c.yield_jitter_max,
        "yield_jitter_min must not exceed yield_jitter_max"
    );
}

/// Loads every catalog under `content_dir` and validates the result.
pub fn load_content(content_dir: &str) -> Result<GameContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = read_json(dir, "constants.json")?;
    let ores: OresFile = read_json(dir, "ores.json")?;
    let miners: MinersFile = read_json(dir, "miners.json")?;
    let energy: EnergySourcesFile = read_json(dir, "energy_sources.json")?;
    let upgrades: UpgradesFile = read_json(dir, "upgrades.json")?;
    let mines: MinesFile = read_json(dir, "mines.json")?;
    let content = GameContent {
        content_version: ores.content_version,
        ores: ores.ores,
        miners: miners.miners,
        energy_sources: energy.energy_sources,
        upgrades: upgrades.upgrades,
        mines: mines.mines,
        constants,
    };
    validate_content(&content);
    Ok(content)
}

/// Loads a saved `GameState` from a JSON file.
pub fn load_state(path: &str) -> Result<GameState> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading state file: {path}"))?;
    serde_json::from_str(&json).context("parsing state JSON")
}

/// New game: the first unlocked mine laid out with rails and ores, and one
/// basic miner placed for free.
pub fn build_initial_state(content: &GameContent, seed: u64, rng: &mut impl Rng) -> GameState {
    let mut state = mine_core::initialize_game_state(content, seed);
    mine_core::populate_active_mine(&mut state, content, rng);
    mine_core::place_miner(&mut state, MinerKind::Basic, 0.0, content, rng);
    state
}
