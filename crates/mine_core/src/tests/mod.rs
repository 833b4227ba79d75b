use super::*;
use crate::test_fixtures::{base_content, base_state, make_miner, make_rng};

mod behavior;

// --- Test helpers -------------------------------------------------------

const BASE: Position = Position { x: 50.0, y: 10.0 };

fn ore_at(content: &GameContent, id: &str, kind: OreKind, x: f64, y: f64) -> Ore {
    create_ore(OreId(id.to_string()), kind, Position::new(x, y), content)
}

fn context<'a>(content: &'a GameContent, ores: &'a [Ore], delta: f64) -> MinerContext<'a> {
    MinerContext {
        content,
        ores,
        pickaxe_level: 0,
        mine_multiplier: 1.0,
        base_position: BASE,
        is_blackout: false,
        delta_seconds: delta,
    }
}

/// A miner already standing on `ore` and mining it.
fn mining_miner(content: &GameContent, kind: MinerKind, ore: &Ore) -> Miner {
    let mut miner = make_miner(content, 1, kind);
    miner.position = ore.position;
    miner.state = MinerState::Mining;
    miner.target_ore_id = Some(ore.id.clone());
    miner.target_position = Some(ore.position);
    miner
}

fn command(state: &GameState, command: Command) -> CommandEnvelope {
    CommandEnvelope {
        id: CommandId(format!("cmd_{:06}", state.meta.tick)),
        issued_tick: state.meta.tick,
        execute_at_tick: state.meta.tick,
        command,
    }
}
