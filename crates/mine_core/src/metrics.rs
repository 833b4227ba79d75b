//! Snapshot metrics computed from `GameState`.
//!
//! `compute_metrics(&GameState, &GameContent) -> MetricsSnapshot` samples the
//! current state for time-series analysis. The CSV helpers below are the only
//! IO in this crate.

use std::io::Write;

use serde::Serialize;

use crate::energy::calculate_energy_generation;
use crate::{GameContent, GameState, MinerState};

/// Current schema version. Bump when columns are added, removed or reordered.
const METRICS_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tick: u64,
    pub metrics_version: u32,
    pub elapsed_seconds: f64,

    // Economy
    pub money: f64,
    pub money_rate: f64,
    pub total_resources: u64,
    pub upgrade_levels: u32,
    pub mines_unlocked: u32,

    // Energy
    pub energy_pct: f64,
    pub is_blackout: bool,
    pub energy_generation: f64,
    pub energy_consumption: f64,
    pub energy_source_count: u32,

    // Fleet
    pub fleet_total: u32,
    pub fleet_seeking: u32,
    pub fleet_moving: u32,
    pub fleet_mining: u32,
    pub fleet_returning: u32,
    pub fleet_resting: u32,
    pub carried_value: f64,

    // Ore field
    pub ores_active: u32,
    pub ores_depleted: u32,
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

pub fn compute_metrics(state: &GameState, content: &GameContent) -> MetricsSnapshot {
    let fleet =
        |wanted: MinerState| count(state.miners.iter().filter(|m| m.state == wanted).count());
    let ores_depleted = count(state.ores.iter().filter(|o| o.depleted).count());
    let energy = &state.energy;
    let energy_pct = if energy.max_energy > 0.0 {
        energy.current_energy / energy.max_energy * 100.0
    } else {
        0.0
    };

    MetricsSnapshot {
        tick: state.meta.tick,
        metrics_version: METRICS_VERSION,
        elapsed_seconds: state.meta.last_update_time,
        money: state.money,
        money_rate: state.money_rate,
        total_resources: state.resources.values().sum(),
        upgrade_levels: state.upgrades.values().sum(),
        mines_unlocked: count(state.mines.values().filter(|m| m.unlocked).count()),
        energy_pct,
        is_blackout: energy.is_blackout,
        energy_generation: calculate_energy_generation(&energy.energy_sources, content),
        energy_consumption: energy.energy_consumption,
        energy_source_count: count(energy.energy_sources.len()),
        fleet_total: count(state.miners.len()),
        fleet_seeking: fleet(MinerState::Seeking),
        fleet_moving: fleet(MinerState::Moving),
        fleet_mining: fleet(MinerState::Mining),
        fleet_returning: fleet(MinerState::Returning),
        fleet_resting: fleet(MinerState::Resting),
        carried_value: state.miners.iter().map(|m| m.inventory_value).sum(),
        ores_active: count(state.ores.len()) - ores_depleted,
        ores_depleted,
    }
}

/// Write the CSV header row for metrics.
pub fn write_metrics_header(writer: &mut impl std::io::Write) -> std::io::Result<()> {
    writeln!(
        writer,
        "tick,metrics_version,elapsed_seconds,\
         money,money_rate,total_resources,upgrade_levels,mines_unlocked,\
         energy_pct,is_blackout,energy_generation,energy_consumption,energy_source_count,\
         fleet_total,fleet_seeking,fleet_moving,fleet_mining,fleet_returning,fleet_resting,\
         carried_value,ores_active,ores_depleted"
    )
}

/// Append a single metrics snapshot as a CSV row.
pub fn append_metrics_row(
    writer: &mut impl std::io::Write,
    snapshot: &MetricsSnapshot,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{},{},{:.3},{:.2},{:.3},{},{},{},{:.2},{},{:.3},{:.3},{},{},{},{},{},{},{},{:.2},{},{}",
        snapshot.tick,
        snapshot.metrics_version,
        snapshot.elapsed_seconds,
        snapshot.money,
        snapshot.money_rate,
        snapshot.total_resources,
        snapshot.upgrade_levels,
        snapshot.mines_unlocked,
        snapshot.energy_pct,
        snapshot.is_blackout,
        snapshot.energy_generation,
        snapshot.energy_consumption,
        snapshot.energy_source_count,
        snapshot.fleet_total,
        snapshot.fleet_seeking,
        snapshot.fleet_moving,
        snapshot.fleet_mining,
        snapshot.fleet_returning,
        snapshot.fleet_resting,
        snapshot.carried_value,
        snapshot.ores_active,
        snapshot.ores_depleted,
    )
}

/// Write a collection of snapshots to a CSV file.
pub fn write_metrics_csv(
    path: &std::path::Path,
    snapshots: &[MetricsSnapshot],
) -> std::io::Result<()> {
    let mut writer = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_metrics_header(&mut writer)?;
    for snapshot in snapshots {
        append_metrics_row(&mut writer, snapshot)?;
    }
    writer.flush()
}

/// Maximum data rows per CSV file before rotating to a new file.
const MAX_ROWS_PER_FILE: usize = 50_000;

/// Rotating metrics CSV writer: `metrics_000.csv`, `metrics_001.csv`, ... with
/// at most [`MAX_ROWS_PER_FILE`] rows each.
pub struct MetricsFileWriter {
    run_dir: std::path::PathBuf,
    file_index: u32,
    rows_in_current_file: usize,
    writer: std::io::BufWriter<std::fs::File>,
}

impl MetricsFileWriter {
    pub fn new(run_dir: std::path::PathBuf) -> std::io::Result<Self> {
        let writer = open_csv_file(&run_dir, 0)?;
        Ok(Self {
            run_dir,
            file_index: 0,
            rows_in_current_file: 0,
            writer,
        })
    }

    pub fn write_row(&mut self, snapshot: &MetricsSnapshot) -> std::io::Result<()> {
        if self.rows_in_current_file >= MAX_ROWS_PER_FILE {
            self.writer.flush()?;
            self.file_index += 1;
            self.writer = open_csv_file(&self.run_dir, self.file_index)?;
            self.rows_in_current_file = 0;
        }
        append_metrics_row(&mut self.writer, snapshot)?;
        self.rows_in_current_file += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

fn open_csv_file(
    run_dir: &std::path::Path,
    index: u32,
) -> std::io::Result<std::io::BufWriter<std::fs::File>> {
    let path = run_dir.join(format!("metrics_{index:03}.csv"));
    let mut writer = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_metrics_header(&mut writer)?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_content, base_state, make_miner};
    use crate::{MinerKind, OreKind};

    #[test]
    fn fresh_state_reports_full_energy_and_untouched_field() {
        let content = base_content();
        let state = base_state(&content);
        let snapshot = compute_metrics(&state, &content);
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.fleet_total, 0);
        assert!((snapshot.energy_pct - 100.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.ores_active, 20);
        assert_eq!(snapshot.ores_depleted, 0);
        assert_eq!(snapshot.mines_unlocked, 1);
        assert!(!snapshot.is_blackout);
    }

    #[test]
    fn fleet_and_carried_value_are_counted() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut mining = make_miner(&content, 1, MinerKind::Basic);
        mining.state = MinerState::Mining;
        mining.inventory.insert(OreKind::Gold, 2);
        mining.inventory_value = 10.0;
        let mut resting = make_miner(&content, 2, MinerKind::Hauler);
        resting.state = MinerState::Resting;
        state.miners = vec![mining, resting];
        state.ores[0].depleted = true;
        state.resources.insert(OreKind::Coal, 7);

        let snapshot = compute_metrics(&state, &content);
        assert_eq!(snapshot.fleet_total, 2);
        assert_eq!(snapshot.fleet_mining, 1);
        assert_eq!(snapshot.fleet_resting, 1);
        assert_eq!(snapshot.fleet_seeking, 0);
        assert!((snapshot.carried_value - 10.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.ores_depleted, 1);
        assert_eq!(snapshot.ores_active, 19);
        assert_eq!(snapshot.total_resources, 7);
    }

    #[test]
    fn csv_rows_match_header_width() {
        let content = base_content();
        let state = base_state(&content);
        let snapshot = compute_metrics(&state, &content);
        let mut buffer = Vec::new();
        write_metrics_header(&mut buffer).unwrap();
        append_metrics_row(&mut buffer, &snapshot).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].split(',').count(),
            lines[1].split(',').count(),
            "header and row column counts differ"
        );
    }

    #[test]
    fn file_writer_starts_with_numbered_file_and_header() {
        let content = base_content();
        let state = base_state(&content);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = MetricsFileWriter::new(dir.path().to_path_buf()).unwrap();
        writer.write_row(&compute_metrics(&state, &content)).unwrap();
        writer.flush().unwrap();

        let text = std::fs::read_to_string(dir.path().join("metrics_000.csv")).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("tick,metrics_version"));
    }

    #[test]
    fn batch_csv_holds_one_row_per_snapshot() {
        let content = base_content();
        let mut state = base_state(&content);
        let first = compute_metrics(&state, &content);
        state.meta.tick = 10;
        state.money = 75.0;
        let second = compute_metrics(&state, &content);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        write_metrics_csv(&path, &[first, second]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("10,1,"));
    }
}
