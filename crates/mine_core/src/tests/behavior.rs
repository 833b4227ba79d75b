use super::*;
use crate::behavior::{select_target, step_toward};

#[test]
fn basic_miner_on_coal_completes_in_about_five_and_a_half_seconds() {
    let content = base_content();
    let coal = ore_at(&content, "ore_0001", OreKind::Coal, 20.0, 20.0);
    let ores = vec![coal.clone()];
    let ctx = context(&content, &ores, 0.1);
    let claims = OreClaims::default();
    let mut rng = make_rng();

    let basic = make_miner(&content, 1, MinerKind::Basic);
    let speed = calculate_mining_speed(&basic, OreKind::Coal, 0, &content);
    assert!((speed - 1.0 / 5.5).abs() < 1e-9, "mining speed was {speed}");

    let mut miner = mining_miner(&content, MinerKind::Basic, &coal);
    let mut steps = 0;
    let update = loop {
        steps += 1;
        let update = update_miner_state(&miner, &ctx, &claims, &mut rng);
        if update.collected.is_some() {
            break update;
        }
        miner = update.miner;
        assert!(steps < 100, "mining never completed");
    };

    assert!((55..=56).contains(&steps), "took {steps} steps of 0.1s");
    assert_eq!(
        update.collected,
        Some(Collection::OreCollected {
            ore_id: coal.id.clone(),
            kind: OreKind::Coal,
            amount: 1,
        })
    );
    let depleted = update.ore.unwrap();
    assert!(depleted.depleted);
    assert!((depleted.regeneration_time - 2.0).abs() < f64::EPSILON);
    assert_eq!(update.miner.state, MinerState::Seeking);
    assert_eq!(update.miner.target_ore_id, None);
    assert_eq!(update.miner.inventory.get(&OreKind::Coal), Some(&1));
    assert!((update.miner.inventory_value - 1.0).abs() < f64::EPSILON);
    assert!(update.miner.mining_progress.abs() < f64::EPSILON);
}

#[test]
fn yield_never_drops_below_one() {
    let content = base_content();
    let mut rng = make_rng();
    for kind in MinerKind::ALL {
        let mut miner = make_miner(&content, 1, kind);
        miner.efficiency = 0.001;
        for ore in OreKind::ALL {
            for _ in 0..5 {
                let units = calculate_resource_yield(&miner, ore, 0, 1.0, &content, &mut rng);
                assert!(units >= 1, "{kind} on {ore} yielded {units}");
            }
        }
    }
}

#[test]
fn yield_stacks_engineer_pickaxe_and_mine_multipliers() {
    let content = base_content();
    let mut rng = make_rng();
    let engineer = make_miner(&content, 1, MinerKind::Engineer);
    // 1 × 3.5 × 1.6 × 1.5 × (1 + 0.8) × 8 = 120.96, jittered ±15%.
    for _ in 0..20 {
        let units =
            calculate_resource_yield(&engineer, OreKind::Uranium, 2, 8.0, &content, &mut rng);
        assert!((102..=140).contains(&units), "yield was {units}");
    }
}

#[test]
fn expert_specialization_bonus_applies_only_to_its_ore() {
    let content = base_content();
    let mut rng = make_rng();
    let mut expert = make_miner(&content, 1, MinerKind::Expert);
    expert.specialization = Some(OreKind::Gold);
    expert.efficiency = 4.0;
    // 4 × 2.5 = 10 on gold, 4 elsewhere, both ±15%.
    for _ in 0..20 {
        let gold = calculate_resource_yield(&expert, OreKind::Gold, 0, 1.0, &content, &mut rng);
        let coal = calculate_resource_yield(&expert, OreKind::Coal, 0, 1.0, &content, &mut rng);
        assert!((9..=12).contains(&gold), "gold yield was {gold}");
        assert!((3..=5).contains(&coal), "coal yield was {coal}");
    }
}

#[test]
fn blackout_abandons_mining_in_place() {
    let content = base_content();
    let coal = ore_at(&content, "ore_0001", OreKind::Coal, 20.0, 20.0);
    let ores = vec![coal.clone()];
    let mut ctx = context(&content, &ores, 0.1);
    ctx.is_blackout = true;
    let mut miner = mining_miner(&content, MinerKind::Basic, &coal);
    miner.mining_progress = 0.5;

    let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut make_rng());

    assert_eq!(update.miner.state, MinerState::Seeking);
    assert_eq!(update.miner.target_ore_id, None);
    assert_eq!(update.miner.target_position, None);
    assert!((update.miner.mining_progress - 0.5).abs() < f64::EPSILON);
    assert!(update.ore.is_none());
    assert!(update.collected.is_none());
}

#[test]
fn blackout_freezes_every_state() {
    let content = base_content();
    let ores = vec![ore_at(&content, "ore_0001", OreKind::Coal, 20.0, 20.0)];
    let mut ctx = context(&content, &ores, 0.1);
    ctx.is_blackout = true;
    for state in [MinerState::Moving, MinerState::Returning, MinerState::Resting] {
        let mut miner = make_miner(&content, 1, MinerKind::Basic);
        miner.state = state;
        miner.target_position = Some(BASE);
        let before = miner.position;
        let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut make_rng());
        assert_eq!(update.miner.state, MinerState::Seeking, "from {state:?}");
        assert!((update.miner.position.x - before.x).abs() < f64::EPSILON);
        assert!(update.acquired.is_none());
    }
}

#[test]
fn seeking_picks_nearest_unclaimed_ore() {
    let content = base_content();
    let ores = vec![
        ore_at(&content, "ore_0001", OreKind::Coal, 52.0, 50.0),
        ore_at(&content, "ore_0002", OreKind::Coal, 60.0, 50.0),
        ore_at(&content, "ore_0003", OreKind::Coal, 80.0, 50.0),
    ];
    let miner = make_miner(&content, 1, MinerKind::Basic);
    let mut claims = OreClaims::default();

    let first = select_target(&miner, &ores, &claims, &content).unwrap();
    assert_eq!(first.id.0, "ore_0001");

    claims.claim(OreId("ore_0001".to_string()));
    let second = select_target(&miner, &ores, &claims, &content).unwrap();
    assert_eq!(second.id.0, "ore_0002");

    let ctx = context(&content, &ores, 0.1);
    let update = update_miner_state(&miner, &ctx, &claims, &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Moving);
    assert_eq!(update.acquired, Some(OreId("ore_0002".to_string())));
    let target = update.miner.target_position.unwrap();
    assert!((target.x - 60.0).abs() < f64::EPSILON);
}

#[test]
fn depleted_ores_are_never_targeted() {
    let content = base_content();
    let mut ores = vec![ore_at(&content, "ore_0001", OreKind::Coal, 51.0, 50.0)];
    deplete_ore_vein(&mut ores[0]);
    let miner = make_miner(&content, 1, MinerKind::Basic);
    assert!(select_target(&miner, &ores, &OreClaims::default(), &content).is_none());

    let ctx = context(&content, &ores, 0.1);
    let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Seeking);
}

#[test]
fn expert_prefers_specialization_over_distance() {
    let content = base_content();
    let ores = vec![
        ore_at(&content, "ore_0001", OreKind::Coal, 51.0, 50.0),
        ore_at(&content, "ore_0002", OreKind::Gold, 90.0, 50.0),
    ];
    let mut expert = make_miner(&content, 1, MinerKind::Expert);
    expert.specialization = Some(OreKind::Gold);
    let target = select_target(&expert, &ores, &OreClaims::default(), &content).unwrap();
    assert_eq!(target.kind, OreKind::Gold);

    // Without any ore of its specialty the expert takes the nearest.
    let coal_only = &ores[..1];
    let target = select_target(&expert, coal_only, &OreClaims::default(), &content).unwrap();
    assert_eq!(target.kind, OreKind::Coal);
}

#[test]
fn prospector_heads_for_most_valuable_share() {
    let content = base_content();
    let ores = vec![
        ore_at(&content, "ore_0001", OreKind::Coal, 51.0, 50.0),
        ore_at(&content, "ore_0002", OreKind::Legendary, 95.0, 50.0),
    ];
    let prospector = make_miner(&content, 1, MinerKind::Prospector);
    let target = select_target(&prospector, &ores, &OreClaims::default(), &content).unwrap();
    assert_eq!(target.kind, OreKind::Legendary);
}

#[test]
fn engineer_picks_nearest_of_hardest_half() {
    let content = base_content();
    let ores = vec![
        ore_at(&content, "ore_0001", OreKind::Tin, 51.0, 50.0),
        ore_at(&content, "ore_0002", OreKind::Uranium, 90.0, 50.0),
        ore_at(&content, "ore_0003", OreKind::Coal, 70.0, 50.0),
    ];
    let engineer = make_miner(&content, 1, MinerKind::Engineer);
    // Hardest half of three rounds down to one: uranium, past the nearer coal.
    let target = select_target(&engineer, &ores, &OreClaims::default(), &content).unwrap();
    assert_eq!(target.kind, OreKind::Uranium);

    // Half of four keeps uranium and coal; coal is nearer.
    let mut four = ores.clone();
    four.push(ore_at(&content, "ore_0004", OreKind::Tin, 52.0, 50.0));
    let target = select_target(&engineer, &four, &OreClaims::default(), &content).unwrap();
    assert_eq!(target.kind, OreKind::Coal);
}

#[test]
fn prospector_share_rounds_down() {
    let content = base_content();
    let ores = vec![
        ore_at(&content, "ore_0001", OreKind::Legendary, 95.0, 50.0),
        ore_at(&content, "ore_0002", OreKind::Uranium, 60.0, 50.0),
        ore_at(&content, "ore_0003", OreKind::Coal, 51.0, 50.0),
        ore_at(&content, "ore_0004", OreKind::Coal, 52.0, 50.0),
        ore_at(&content, "ore_0005", OreKind::Coal, 53.0, 50.0),
    ];
    let prospector = make_miner(&content, 1, MinerKind::Prospector);
    // 30% of five keeps only the single most valuable ore.
    let target = select_target(&prospector, &ores, &OreClaims::default(), &content).unwrap();
    assert_eq!(target.kind, OreKind::Legendary);
}

#[test]
fn moving_arrives_without_overshoot_then_mines() {
    let content = base_content();
    let ores = vec![ore_at(&content, "ore_0001", OreKind::Coal, 52.0, 50.0)];
    let ctx = context(&content, &ores, 0.1);
    let mut miner = make_miner(&content, 1, MinerKind::Basic);
    miner.state = MinerState::Moving;
    miner.target_ore_id = Some(ores[0].id.clone());
    miner.target_position = Some(ores[0].position);

    // speed 1 × factor 5 × 0.1s = 0.5 per step over a distance of 2.
    let mut rng = make_rng();
    for step in 1..=3 {
        miner = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut rng).miner;
        assert_eq!(miner.state, MinerState::Moving, "step {step}");
        assert!(miner.position.x <= 52.0);
    }
    miner = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut rng).miner;
    assert_eq!(miner.state, MinerState::Mining);
    assert!(miner.mining_progress.abs() < f64::EPSILON);
    assert!((miner.position.x - 52.0).abs() < 1e-9);
}

#[test]
fn moving_toward_vanished_ore_falls_back_to_seeking() {
    let content = base_content();
    let mut ores = vec![ore_at(&content, "ore_0001", OreKind::Coal, 60.0, 50.0)];
    deplete_ore_vein(&mut ores[0]);
    let ctx = context(&content, &ores, 0.1);
    let mut miner = make_miner(&content, 1, MinerKind::Basic);
    miner.state = MinerState::Moving;
    miner.target_ore_id = Some(OreId("ore_0001".to_string()));
    miner.target_position = Some(ores[0].position);

    let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Seeking);
    assert_eq!(update.miner.target_ore_id, None);

    miner.target_ore_id = Some(OreId("ore_9999".to_string()));
    let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Seeking);
}

#[test]
fn completion_stores_only_what_fits() {
    let content = base_content();
    let gold = ore_at(&content, "ore_0001", OreKind::Gold, 20.0, 20.0);
    let ores = vec![gold.clone()];
    let ctx = context(&content, &ores, 0.1);
    let mut miner = mining_miner(&content, MinerKind::Basic, &gold);
    miner.efficiency = 50.0;
    miner.mining_progress = 0.99;
    miner.inventory.insert(OreKind::Coal, 9);

    let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut make_rng());

    assert_eq!(
        update.collected,
        Some(Collection::OreCollected {
            ore_id: gold.id.clone(),
            kind: OreKind::Gold,
            amount: 1,
        })
    );
    assert_eq!(update.miner.carried(), 10);
    assert!(f64::from(update.miner.carried()) <= update.miner.capacity);
    assert!((update.miner.inventory_value - 14.0).abs() < f64::EPSILON);
}

#[test]
fn fractional_capacity_rounds_free_slots_down() {
    let content = base_content();
    let mut miner = make_miner(&content, 1, MinerKind::Basic);
    miner.capacity = 14.0;
    miner.inventory.insert(OreKind::Coal, 13);
    assert_eq!(miner.free_slots(), 1);
    miner.capacity = 13.6;
    assert_eq!(miner.free_slots(), 0);
    assert!(miner.is_inventory_full());
}

#[test]
fn full_inventory_sends_miner_home() {
    let content = base_content();
    let coal = ore_at(&content, "ore_0001", OreKind::Coal, 20.0, 20.0);
    let ores = vec![coal.clone()];
    let ctx = context(&content, &ores, 0.1);

    let mut mining = mining_miner(&content, MinerKind::Basic, &coal);
    mining.inventory.insert(OreKind::Coal, 10);
    let update = update_miner_state(&mining, &ctx, &OreClaims::default(), &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Returning);
    assert_eq!(update.miner.target_position, Some(BASE));
    assert!(update.collected.is_none());

    let mut seeking = make_miner(&content, 2, MinerKind::Basic);
    seeking.inventory.insert(OreKind::Iron, 10);
    let update = update_miner_state(&seeking, &ctx, &OreClaims::default(), &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Returning);
    assert!(update.acquired.is_none());
}

#[test]
fn empty_field_sends_loaded_miner_home_and_idles_empty_one() {
    let content = base_content();
    let ctx = context(&content, &[], 0.1);

    let idle = make_miner(&content, 1, MinerKind::Basic);
    let update = update_miner_state(&idle, &ctx, &OreClaims::default(), &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Seeking);

    let mut loaded = make_miner(&content, 2, MinerKind::Basic);
    loaded.inventory.insert(OreKind::Coal, 3);
    let update = update_miner_state(&loaded, &ctx, &OreClaims::default(), &mut make_rng());
    assert_eq!(update.miner.state, MinerState::Returning);
}

#[test]
fn return_rest_and_deposit() {
    let content = base_content();
    let ctx = context(&content, &[], 0.5);
    let mut rng = make_rng();
    let mut miner = make_miner(&content, 1, MinerKind::Basic);
    miner.position = Position::new(BASE.x, BASE.y + 2.0);
    miner.state = MinerState::Returning;
    miner.inventory.insert(OreKind::Gold, 4);
    miner.inventory_value = 20.0;

    // 2.5 units per step covers the distance of 2 in one update.
    miner = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut rng).miner;
    assert_eq!(miner.state, MinerState::Resting);
    assert_eq!(miner.rest_progress, Some(0.0));
    assert_eq!(miner.rest_duration, Some(5.0));

    for _ in 0..9 {
        let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut rng);
        assert!(update.collected.is_none());
        miner = update.miner;
    }
    let update = update_miner_state(&miner, &ctx, &OreClaims::default(), &mut rng);
    assert_eq!(update.collected, Some(Collection::MoneyDeposited { amount: 20.0 }));
    assert_eq!(update.miner.state, MinerState::Seeking);
    assert!(update.miner.inventory.is_empty());
    assert!(update.miner.inventory_value.abs() < f64::EPSILON);
    assert_eq!(update.miner.last_dropped_value, Some(20.0));
    assert_eq!(update.miner.rest_progress, None);
}

#[test]
fn step_toward_clamps_to_target() {
    let from = Position::new(0.0, 0.0);
    let to = Position::new(3.0, 4.0);
    let half = step_toward(from, to, 2.5);
    assert!((half.x - 1.5).abs() < 1e-9);
    assert!((half.y - 2.0).abs() < 1e-9);
    let arrived = step_toward(from, to, 100.0);
    assert!((arrived.x - 3.0).abs() < f64::EPSILON);
    assert!((arrived.y - 4.0).abs() < f64::EPSILON);
}
