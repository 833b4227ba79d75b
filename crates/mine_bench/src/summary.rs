use anyhow::{Context, Result};
use mine_core::MetricsSnapshot;
use serde::Serialize;
use std::path::Path;

type Extractor = (&'static str, fn(&MetricsSnapshot) -> f64);

/// Final-snapshot metrics aggregated across seeds.
fn extractors() -> Vec<Extractor> {
    vec![
        ("money", |s| s.money),
        ("money_rate", |s| s.money_rate),
        ("total_resources", |s| s.total_resources as f64),
        ("upgrade_levels", |s| f64::from(s.upgrade_levels)),
        ("mines_unlocked", |s| f64::from(s.mines_unlocked)),
        ("energy_pct", |s| s.energy_pct),
        ("energy_source_count", |s| f64::from(s.energy_source_count)),
        ("fleet_total", |s| f64::from(s.fleet_total)),
        ("fleet_mining_pct", |s| {
            if s.fleet_total == 0 {
                0.0
            } else {
                f64::from(s.fleet_mining) / f64::from(s.fleet_total)
            }
        }),
        ("carried_value", |s| s.carried_value),
        ("ores_depleted", |s| f64::from(s.ores_depleted)),
    ]
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub seed_count: usize,
    pub stalled_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

/// One row of `seeds.csv`.
#[derive(Debug, Serialize)]
pub struct SeedRow {
    pub seed: u64,
    pub run_id: String,
    pub final_tick: u64,
    pub money: f64,
    pub total_resources: u64,
    pub fleet_total: u32,
    pub upgrade_levels: u32,
    pub mines_unlocked: u32,
    pub energy_source_count: u32,
    pub blackouts: u64,
    pub stalled: bool,
    pub wall_time_ms: u64,
}

pub fn compute_summary(snapshots: &[&MetricsSnapshot], stalled_count: usize) -> SummaryStats {
    let metrics = extractors()
        .iter()
        .map(|(name, extract)| {
            let values: Vec<f64> = snapshots.iter().map(|s| extract(s)).collect();
            compute_metric_summary(name, &values)
        })
        .collect();

    SummaryStats {
        seed_count: snapshots.len(),
        stalled_count,
        metrics,
    }
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    if values.is_empty() {
        return MetricSummary {
            name: name.to_string(),
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            stddev: 0.0,
        };
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

    MetricSummary {
        name: name.to_string(),
        mean,
        min,
        max,
        stddev: variance.sqrt(),
    }
}

/// Writes one CSV row per seed.
pub fn write_seed_table(path: &Path, rows: &[SeedRow]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing seed {} to {}", row.seed, path.display()))?;
    }
    writer.flush().context("flushing seed table")?;
    Ok(())
}

pub fn print_summary(scenario_name: &str, ticks: u64, stats: &SummaryStats) {
    let tick_display = if ticks >= 1000 {
        format!("{}k", ticks / 1000)
    } else {
        ticks.to_string()
    };
    println!(
        "\n=== {} ({} seeds, {} ticks each) ===\n",
        scenario_name, stats.seed_count, tick_display
    );
    println!(
        "{:<24} {:>10} {:>10} {:>10} {:>10}",
        "Metric", "Mean", "Min", "Max", "StdDev"
    );
    println!("{}", "-".repeat(68));
    for metric in &stats.metrics {
        println!(
            "{:<24} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            metric.name, metric.mean, metric.min, metric.max, metric.stddev
        );
    }
    println!(
        "{:<24} {}/{}",
        "stall_rate", stats.stalled_count, stats.seed_count
    );
}
