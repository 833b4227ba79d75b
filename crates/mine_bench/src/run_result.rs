use mine_core::{Event, MetricsSnapshot};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub run_schema_version: u32,
    pub run_status: String,
    pub run_id: String,
    pub seed: u64,
    pub scenario_name: String,
    pub scenario_params: serde_json::Value,
    pub tick_start: u64,
    pub tick_end: u64,
    pub total_ticks: u64,
    pub simulated_seconds: f64,
    pub wall_time_ms: u64,
    pub sim_ticks_per_second: f64,
    pub summary_metrics: Option<SummaryMetrics>,
    pub event_counts_by_type: BTreeMap<String, u64>,
    pub event_first_tick_by_type: BTreeMap<String, u64>,
    pub stalled: bool,
    pub stall_reason: Option<String>,
    pub metrics_path: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryMetrics {
    pub money: f64,
    pub money_rate: f64,
    pub total_resources: u64,
    pub upgrade_levels: u32,
    pub mines_unlocked: u32,
    pub energy_pct: f64,
    pub energy_source_count: u32,
    pub fleet_total: u32,
    pub carried_value: f64,
    pub ores_depleted: u32,
}

impl SummaryMetrics {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        Self {
            money: snapshot.money,
            money_rate: snapshot.money_rate,
            total_resources: snapshot.total_resources,
            upgrade_levels: snapshot.upgrade_levels,
            mines_unlocked: snapshot.mines_unlocked,
            energy_pct: snapshot.energy_pct,
            energy_source_count: snapshot.energy_source_count,
            fleet_total: snapshot.fleet_total,
            carried_value: snapshot.carried_value,
            ores_depleted: snapshot.ores_depleted,
        }
    }
}

impl RunResult {
    /// Write JSON atomically: write to `.tmp` then rename.
    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Per-type event tallies for one run.
#[derive(Debug, Default)]
pub struct EventTally {
    pub counts: BTreeMap<String, u64>,
    pub first_tick: BTreeMap<String, u64>,
}

impl EventTally {
    pub fn record(&mut self, tick: u64, event: &Event) {
        let name = event_name(event);
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
        self.first_tick.entry(name.to_string()).or_insert(tick);
    }

    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }
}

pub fn event_name(event: &Event) -> &'static str {
    match event {
        Event::MinerHired { .. } => "miner_hired",
        Event::UpgradePurchased { .. } => "upgrade_purchased",
        Event::MineUnlocked { .. } => "mine_unlocked",
        Event::MineSwitched { .. } => "mine_switched",
        Event::EnergySourceBuilt { .. } => "energy_source_built",
        Event::EnergySourceUpgraded { .. } => "energy_source_upgraded",
        Event::TargetAcquired { .. } => "target_acquired",
        Event::OreCollected { .. } => "ore_collected",
        Event::OreDepleted { .. } => "ore_depleted",
        Event::OreRegenerated { .. } => "ore_regenerated",
        Event::MoneyDeposited { .. } => "money_deposited",
        Event::BlackoutStarted { .. } => "blackout_started",
        Event::BlackoutEnded { .. } => "blackout_ended",
        Event::OreInspected { .. } => "ore_inspected",
        Event::BaseInspected { .. } => "base_inspected",
    }
}

/// A run is stalled when nothing was ever mined, or when it ends blacked out
/// with miners on the payroll.
pub fn detect_stall(snapshot: &MetricsSnapshot) -> (bool, Option<String>) {
    if snapshot.total_resources == 0 {
        return (true, Some("no_resources_mined".to_string()));
    }
    if snapshot.is_blackout && snapshot.fleet_total > 0 {
        return (true, Some("ended_in_blackout".to_string()));
    }
    (false, None)
}
