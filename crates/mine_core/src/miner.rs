//! Miner registry: construction, naming, hire pricing and placement.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::layout::MineLayout;
use crate::{
    GameContent, GameState, Inventory, Miner, MinerId, MinerKind, MinerState, OreKind, Position,
};

const FIRST_NAMES: [&str; 20] = [
    "Digger", "Rocky", "Cole", "Flint", "Rusty", "Dusty", "Granite", "Slate", "Amber", "Crystal",
    "Jade", "Ruby", "Onyx", "Cobalt", "Copper", "Silver", "Iron", "Steel", "Gold", "Titanium",
];

const LAST_NAMES: [&str; 20] = [
    "Pickaxe", "Hammer", "Drill", "Stone", "Boulder", "Rock", "Ore", "Nugget", "Miner", "Digger",
    "Delver", "Tunneler", "Excavator", "Prospector", "Smith", "Forge", "Quarry", "Mine", "Vein",
    "Lode",
];

pub fn generate_miner_name(rng: &mut impl Rng) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Digger");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Pickaxe");
    format!("{first} {last}")
}

/// Build a miner from its kind's baseline stats. An expert given a
/// specialization gets the flat specialization efficiency bonus.
pub fn create_miner(
    id: MinerId,
    kind: MinerKind,
    position: Position,
    specialization: Option<OreKind>,
    content: &GameContent,
    rng: &mut impl Rng,
) -> Miner {
    let def = content.miner(kind);
    let specialization = specialization.filter(|_| kind == MinerKind::Expert);
    let efficiency = if specialization.is_some() {
        def.base_efficiency * content.constants.expert_specialization_efficiency
    } else {
        def.base_efficiency
    };

    Miner {
        id,
        name: generate_miner_name(rng),
        kind,
        efficiency,
        speed: def.base_speed,
        capacity: def.base_capacity,
        specialization,
        position,
        target_position: None,
        state: MinerState::Seeking,
        inventory: Inventory::new(),
        inventory_value: 0.0,
        last_dropped_value: None,
        target_ore_id: None,
        mining_progress: 0.0,
        rest_progress: None,
        rest_duration: None,
        cost: def.base_cost,
    }
}

pub fn calculate_inventory_value(inventory: &Inventory, content: &GameContent) -> f64 {
    inventory
        .iter()
        .map(|(kind, count)| f64::from(*count) * content.ore(*kind).value)
        .sum()
}

/// `floor(base_cost × growth^owned)` where `owned` counts miners of the same kind.
pub fn calculate_miner_cost(kind: MinerKind, miners: &[Miner], content: &GameContent) -> f64 {
    let owned = miners.iter().filter(|m| m.kind == kind).count();
    let exponent = i32::try_from(owned).unwrap_or(i32::MAX);
    (content.miner(kind).base_cost * content.constants.hire_cost_growth.powi(exponent)).floor()
}

/// Random floor position at least `hire_min_spacing` from every miner, retried
/// a bounded number of times. The last candidate wins when none qualifies.
pub fn find_hire_position(
    miners: &[Miner],
    layout: &MineLayout,
    content: &GameContent,
    rng: &mut impl Rng,
) -> Position {
    let spacing = content.constants.hire_min_spacing;
    let mut candidate = layout.random_floor_position(rng);
    for _ in 1..content.constants.hire_placement_attempts {
        if miners
            .iter()
            .all(|m| m.position.distance_to(&candidate) > spacing)
        {
            return candidate;
        }
        candidate = layout.random_floor_position(rng);
    }
    candidate
}

/// Hire a miner of `kind` into the active mine. Returns `None` (state unchanged)
/// when the price is not affordable or the active mine is unknown.
pub(crate) fn try_hire_miner(
    state: &mut GameState,
    kind: MinerKind,
    content: &GameContent,
    rng: &mut impl Rng,
) -> Option<(MinerId, f64)> {
    let cost = calculate_miner_cost(kind, &state.miners, content);
    if state.money < cost {
        return None;
    }
    let id = place_miner(state, kind, cost, content, rng)?;
    state.money -= cost;
    Some((id, cost))
}

/// Adds a miner of `kind` to the active mine without charging for it.
///
/// Experts draw a specialization from the configured pool; the new miner
/// starts with the current upgrade levels applied. `cost` is recorded on the
/// miner only. Returns `None` when the active mine is not in the catalog.
pub fn place_miner(
    state: &mut GameState,
    kind: MinerKind,
    cost: f64,
    content: &GameContent,
    rng: &mut impl Rng,
) -> Option<MinerId> {
    let mine = content.mine(&state.active_mine)?;
    let layout = MineLayout::new(mine, &content.constants);

    let specialization = if kind == MinerKind::Expert {
        content.constants.expert_specializations.choose(rng).copied()
    } else {
        None
    };
    let position = find_hire_position(&state.miners, &layout, content, rng);
    let id = crate::id::next_miner_id(&mut state.counters);
    let mut miner = create_miner(id.clone(), kind, position, specialization, content, rng);
    miner.cost = cost;
    crate::economy::apply_upgrade_levels(&mut miner, &state.upgrades, content);
    state.miners.push(miner);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_content, base_state, make_rng};

    #[test]
    fn expert_with_specialization_doubles_efficiency() {
        let content = base_content();
        let mut rng = make_rng();
        let plain = create_miner(
            MinerId("m1".to_string()),
            MinerKind::Expert,
            Position::default(),
            None,
            &content,
            &mut rng,
        );
        let specialist = create_miner(
            MinerId("m2".to_string()),
            MinerKind::Expert,
            Position::default(),
            Some(OreKind::Gold),
            &content,
            &mut rng,
        );
        assert!((plain.efficiency - 2.5).abs() < f64::EPSILON);
        assert!((specialist.efficiency - 5.0).abs() < f64::EPSILON);
        assert_eq!(specialist.specialization, Some(OreKind::Gold));
    }

    #[test]
    fn specialization_ignored_for_non_experts() {
        let content = base_content();
        let mut rng = make_rng();
        let miner = create_miner(
            MinerId("m1".to_string()),
            MinerKind::Basic,
            Position::default(),
            Some(OreKind::Gold),
            &content,
            &mut rng,
        );
        assert_eq!(miner.specialization, None);
        assert!((miner.efficiency - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn names_come_from_both_lists() {
        let mut rng = make_rng();
        let name = generate_miner_name(&mut rng);
        let (first, last) = name.split_once(' ').unwrap();
        assert!(FIRST_NAMES.contains(&first));
        assert!(LAST_NAMES.contains(&last));
    }

    #[test]
    fn inventory_value_sums_count_times_value() {
        let content = base_content();
        let inventory = Inventory::from([(OreKind::Coal, 3), (OreKind::Gold, 2)]);
        let value = calculate_inventory_value(&inventory, &content);
        assert!((value - 13.0).abs() < f64::EPSILON, "value was {value}");
    }

    #[test]
    fn hire_cost_scales_with_owned_count() {
        let content = base_content();
        let mut rng = make_rng();
        let mut miners = Vec::new();
        let cost = calculate_miner_cost(MinerKind::Basic, &miners, &content);
        assert!((cost - 10.0).abs() < f64::EPSILON);
        for i in 0..3 {
            miners.push(create_miner(
                MinerId(format!("m{i}")),
                MinerKind::Basic,
                Position::default(),
                None,
                &content,
                &mut rng,
            ));
        }
        let cost = calculate_miner_cost(MinerKind::Basic, &miners, &content);
        assert!((cost - 17.0).abs() < f64::EPSILON);
        // Other kinds are priced independently.
        let cost = calculate_miner_cost(MinerKind::Hauler, &miners, &content);
        assert!((cost - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hire_deducts_cost_and_places_on_floor() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut rng = make_rng();
        state.money = 100.0;

        let (id, cost) = try_hire_miner(&mut state, MinerKind::Basic, &content, &mut rng).unwrap();

        assert!((cost - 10.0).abs() < f64::EPSILON);
        assert!((state.money - 90.0).abs() < f64::EPSILON);
        let miner = state.miners.iter().find(|m| m.id == id).unwrap();
        assert_eq!(miner.state, MinerState::Seeking);
        assert!((miner.cost - 10.0).abs() < f64::EPSILON);
        assert!(miner.position.x > 30.0 && miner.position.x < 70.0);
        assert!(miner.position.y > 24.0 && miner.position.y < 75.0);
    }

    #[test]
    fn hire_rejected_when_unaffordable() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut rng = make_rng();
        state.money = 9.0;
        let before = state.miners.len();
        assert!(try_hire_miner(&mut state, MinerKind::Basic, &content, &mut rng).is_none());
        assert_eq!(state.miners.len(), before);
        assert!((state.money - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hired_expert_gets_pool_specialization() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut rng = make_rng();
        state.money = 1_000.0;
        let (id, _) = try_hire_miner(&mut state, MinerKind::Expert, &content, &mut rng).unwrap();
        let miner = state.miners.iter().find(|m| m.id == id).unwrap();
        let specialty = miner.specialization.unwrap();
        assert!(content.constants.expert_specializations.contains(&specialty));
    }

    #[test]
    fn hire_position_respects_spacing_when_possible() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut rng = make_rng();
        state.money = 1_000.0;
        let (first, _) = try_hire_miner(&mut state, MinerKind::Basic, &content, &mut rng).unwrap();
        let (second, _) = try_hire_miner(&mut state, MinerKind::Basic, &content, &mut rng).unwrap();
        let a = state.miners.iter().find(|m| m.id == first).unwrap().position;
        let b = state.miners.iter().find(|m| m.id == second).unwrap().position;
        assert!(a.distance_to(&b) > content.constants.hire_min_spacing);
    }
}
