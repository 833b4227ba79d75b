//! Ore registry: creation, weighted type draws, depletion and regeneration.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::layout::MineLayout;
use crate::{GameContent, Ore, OreId, OreKind, Position, Tile};

pub fn create_ore(id: OreId, kind: OreKind, position: Position, content: &GameContent) -> Ore {
    Ore {
        id,
        kind,
        position,
        depleted: false,
        regeneration_time: 0.0,
        max_regeneration_time: content.ore(kind).regeneration_time,
    }
}

/// Draw an ore kind weighted by rarity.
///
/// With `rare_ore_chance > 1`, kinds worth more than the rare-value threshold
/// have their weight multiplied by the chance. Weights are normalized before
/// the cumulative draw; coal covers any rounding shortfall.
pub fn generate_random_ore_type(
    content: &GameContent,
    rare_ore_chance: f64,
    rng: &mut impl Rng,
) -> OreKind {
    let threshold = content.constants.rare_value_threshold;
    let weights: Vec<(OreKind, f64)> = OreKind::ALL
        .iter()
        .filter_map(|kind| {
            let def = content.ores.get(kind)?;
            let boost = if rare_ore_chance > 1.0 && def.value > threshold {
                rare_ore_chance
            } else {
                1.0
            };
            Some((*kind, def.rarity.max(0.0) * boost))
        })
        .collect();

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return OreKind::Coal;
    }

    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (kind, weight) in weights {
        cumulative += weight / total;
        if roll <= cumulative {
            return kind;
        }
    }
    OreKind::Coal
}

pub fn deplete_ore_vein(ore: &mut Ore) {
    ore.depleted = true;
    ore.regeneration_time = ore.max_regeneration_time;
}

pub fn regenerate_ore_vein(ore: &mut Ore) {
    ore.depleted = false;
    ore.regeneration_time = 0.0;
}

/// Count down every depleted ore's respawn timer. Returns the ores that came
/// back this call.
pub fn update_ore_regeneration(ores: &mut [Ore], delta_seconds: f64) -> Vec<OreId> {
    let mut regenerated = Vec::new();
    for ore in ores.iter_mut().filter(|o| o.depleted) {
        ore.regeneration_time = (ore.regeneration_time - delta_seconds).max(0.0);
        if ore.regeneration_time <= 0.0 {
            regenerate_ore_vein(ore);
            regenerated.push(ore.id.clone());
        }
    }
    regenerated
}

/// Pick `count` distinct tiles from `tiles` and place a random ore on each.
/// Fewer ores are produced when the mine has fewer free tiles than requested.
pub(crate) fn generate_ore_field(
    counters: &mut crate::Counters,
    content: &GameContent,
    layout: &MineLayout,
    tiles: &[Tile],
    count: usize,
    rare_ore_chance: f64,
    rng: &mut impl Rng,
) -> Vec<Ore> {
    let chosen: Vec<Tile> = tiles.choose_multiple(rng, count).copied().collect();
    chosen
        .into_iter()
        .map(|tile| {
            let kind = generate_random_ore_type(content, rare_ore_chance, rng);
            let id = crate::id::next_ore_id(counters);
            create_ore(id, kind, layout.to_position(tile), content)
        })
        .collect()
}
