use rand::Rng;
use uuid::Uuid;

use crate::Counters;

/// Generate a deterministic v4-format UUID from a seeded RNG.
pub fn generate_uuid(rng: &mut impl Rng) -> Uuid {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn next_counter(counter: &mut u64, prefix: &str) -> String {
    *counter += 1;
    format!("{prefix}_{:04}", *counter)
}

pub(crate) fn next_miner_id(counters: &mut Counters) -> crate::MinerId {
    crate::MinerId(next_counter(&mut counters.next_miner_id, "miner"))
}

pub(crate) fn next_ore_id(counters: &mut Counters) -> crate::OreId {
    crate::OreId(next_counter(&mut counters.next_ore_id, "ore"))
}

pub(crate) fn next_energy_source_id(counters: &mut Counters) -> crate::EnergySourceId {
    crate::EnergySourceId(next_counter(&mut counters.next_energy_source_id, "energy"))
}

pub(crate) fn next_rail_id(counters: &mut Counters) -> crate::RailId {
    crate::RailId(next_counter(&mut counters.next_rail_id, "rail"))
}
