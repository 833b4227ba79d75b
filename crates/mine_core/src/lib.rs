//! `mine_core`: deterministic idle-miner simulation.
//!
//! No IO apart from the metrics CSV writer, no network. All randomness via the
//! passed-in Rng.

pub mod behavior;
mod commands;
mod economy;
pub mod energy;
mod engine;
mod id;
pub mod layout;
pub mod metrics;
mod miner;
mod ore;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use behavior::{
    calculate_mining_speed, calculate_resource_yield, update_miner_state, Collection,
    MinerContext, MinerUpdate, OreClaims,
};
pub use commands::{
    apply_command, build_energy_source, buy_upgrade, hire_miner, switch_mine, unlock_mine,
    upgrade_energy_source,
};
pub use economy::{
    apply_upgrade_effect, apply_upgrade_levels, calculate_upgrade_cost, pickaxe_level,
    populate_active_mine, rare_ore_chance_factor, upgrade_level,
};
pub use energy::{
    calculate_energy_consumption, calculate_energy_generation, update_energy_state,
    BlackoutTransition,
};
pub use engine::{initialize_game_state, tick, update_game_state, SCHEMA_VERSION};
pub use id::generate_uuid;
pub use metrics::{compute_metrics, write_metrics_csv, MetricsFileWriter, MetricsSnapshot};
pub use miner::{
    calculate_inventory_value, calculate_miner_cost, create_miner, find_hire_position,
    generate_miner_name, place_miner,
};
pub use ore::{
    create_ore, deplete_ore_vein, generate_random_ore_type, regenerate_ore_vein,
    update_ore_regeneration,
};
pub use types::*;

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

#[cfg(test)]
mod tests;
