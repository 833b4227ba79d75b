use std::collections::VecDeque;

use mine_core::energy::source_output;
use mine_core::{
    calculate_energy_generation, calculate_miner_cost, calculate_upgrade_cost, upgrade_level,
    Command, CommandEnvelope, CommandId, EnergySourceKind, GameContent, GameState, MinerKind,
};
use serde::{Deserialize, Serialize};

pub trait CommandSource {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope>;
}

/// Spends money automatically, at most one purchase per call:
/// 1. Power: during a blackout, or when energy is under half and generation
///    trails consumption, buy the cheapest energy build or upgrade (or save).
/// 2. Progression: switch to an unlocked later mine, or unlock the next one
///    once money covers its cost with a reserve.
/// 3. Growth: the cheapest affordable of hiring a basic miner, the next level
///    of any upgrade, or an energy source upgrade.
pub struct AutopilotController;

/// Money must cover a mine's cost by this factor before unlocking it.
const MINE_UNLOCK_RESERVE: f64 = 1.25;
const LOW_ENERGY_FRACTION: f64 = 0.5;

/// Allocates a command ID and builds a `CommandEnvelope` for this tick.
pub fn make_cmd(tick: u64, next_id: &mut u64, command: Command) -> CommandEnvelope {
    let cmd_id = CommandId(format!("cmd_{:06}", *next_id));
    *next_id += 1;
    CommandEnvelope {
        id: cmd_id,
        issued_tick: tick,
        execute_at_tick: tick,
        command,
    }
}

/// Every energy purchase currently on the table with its price.
fn energy_options(state: &GameState, content: &GameContent) -> Vec<(f64, Command)> {
    let mut options: Vec<(f64, Command)> = EnergySourceKind::ALL
        .iter()
        .map(|&kind| {
            (
                content.energy_source(kind).base_cost,
                Command::BuildEnergySource { kind },
            )
        })
        .collect();
    options.extend(energy_upgrade_options(state, content));
    options
}

/// Energy upgrades that actually raise output, priced.
fn energy_upgrade_options(state: &GameState, content: &GameContent) -> Vec<(f64, Command)> {
    let growth = content.constants.energy_upgrade_cost_growth;
    state
        .energy
        .energy_sources
        .iter()
        .filter(|s| s.level < content.energy_source(s.kind).max_level)
        .filter(|s| {
            source_output(s.kind, s.level + 1, content) > source_output(s.kind, s.level, content)
        })
        .map(|s| {
            (
                (s.cost * growth).floor(),
                Command::UpgradeEnergySource {
                    source_id: s.id.clone(),
                },
            )
        })
        .collect()
}

fn needs_power(state: &GameState, content: &GameContent) -> bool {
    let energy = &state.energy;
    if energy.is_blackout {
        return true;
    }
    let generation = calculate_energy_generation(&energy.energy_sources, content);
    energy.current_energy < energy.max_energy * LOW_ENERGY_FRACTION
        && generation < energy.energy_consumption
}

/// Cheapest affordable option; ties keep the earlier entry.
fn cheapest_affordable(money: f64, options: Vec<(f64, Command)>) -> Option<Command> {
    options
        .into_iter()
        .filter(|(price, _)| *price <= money)
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, command)| command)
}

/// Switch to the next mine once unlocked, else unlock it when money covers
/// its cost with a reserve. Only the mine right after the active one counts.
fn mine_progression(state: &GameState, content: &GameContent) -> Option<Command> {
    let active_index = content
        .mines
        .iter()
        .position(|m| m.id == state.active_mine)?;
    let next = content.mines.get(active_index + 1)?;
    let unlocked = state.mines.get(&next.id).is_some_and(|m| m.unlocked);
    if unlocked {
        Some(Command::SwitchMine {
            mine_id: next.id.clone(),
        })
    } else if state.money >= next.cost * MINE_UNLOCK_RESERVE {
        Some(Command::UnlockMine {
            mine_id: next.id.clone(),
        })
    } else {
        None
    }
}

fn growth_purchase(state: &GameState, content: &GameContent) -> Option<Command> {
    let mut options = vec![(
        calculate_miner_cost(MinerKind::Basic, &state.miners, content),
        Command::HireMiner {
            kind: MinerKind::Basic,
        },
    )];
    for upgrade in &content.upgrades {
        let level = upgrade_level(&state.upgrades, &upgrade.id);
        if upgrade.max_level.is_some_and(|max| level >= max) {
            continue;
        }
        options.push((
            calculate_upgrade_cost(upgrade, level),
            Command::BuyUpgrade {
                upgrade_id: upgrade.id.clone(),
            },
        ));
    }
    options.extend(energy_upgrade_options(state, content));
    cheapest_affordable(state.money, options)
}

impl CommandSource for AutopilotController {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope> {
        let command = if needs_power(state, content) {
            // Save for power rather than spend elsewhere.
            cheapest_affordable(state.money, energy_options(state, content))
        } else {
            mine_progression(state, content).or_else(|| growth_purchase(state, content))
        };
        command
            .map(|command| make_cmd(state.meta.tick, next_command_id, command))
            .into_iter()
            .collect()
    }
}

/// Trailing-window money rate, in currency per simulated second.
///
/// Smooths the per-tick `money_rate` (which spikes on each deposit) by
/// comparing the newest and oldest samples inside the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyRateWindow {
    window_seconds: f64,
    samples: VecDeque<(f64, f64)>,
}

impl Default for MoneyRateWindow {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl MoneyRateWindow {
    pub fn new(window_seconds: f64) -> Self {
        Self {
            window_seconds,
            samples: VecDeque::new(),
        }
    }

    /// Records money at simulated time `time` and drops samples that fell
    /// out of the window.
    pub fn record(&mut self, time: f64, money: f64) {
        self.samples.push_back((time, money));
        let cutoff = time - self.window_seconds;
        while self.samples.front().is_some_and(|(t, _)| *t < cutoff) {
            self.samples.pop_front();
        }
    }

    /// `(newest − oldest) / Δt`, or 0 with fewer than two samples.
    pub fn rate(&self) -> f64 {
        let (Some(&(t0, m0)), Some(&(t1, m1))) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = t1 - t0;
        if elapsed <= 0.0 {
            return 0.0;
        }
        (m1 - m0) / elapsed
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
