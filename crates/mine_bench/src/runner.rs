use crate::run_result::{self, EventTally, RunResult, SummaryMetrics};
use crate::scenario::Scenario;
use anyhow::{Context, Result};
use mine_control::{AutopilotController, CommandSource};
use mine_core::{GameContent, MetricsFileWriter, MetricsSnapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

pub struct SeedResult {
    pub seed: u64,
    pub final_snapshot: MetricsSnapshot,
    pub wall_time_ms: u64,
    pub run_id: String,
    pub stalled: bool,
    pub blackouts: u64,
}

fn write_run_info(
    seed_dir: &Path,
    seed: u64,
    scenario: &Scenario,
    content_version: &str,
) -> Result<()> {
    let info = serde_json::json!({
        "run_id": format!("seed_{seed}"),
        "seed": seed,
        "content_version": content_version,
        "metrics_every": scenario.metrics_every,
        "runner": "mine_bench",
        "scenario": scenario.name,
        "args": {
            "ticks": scenario.ticks,
            "delta": scenario.delta,
            "autopilot": scenario.autopilot,
        }
    });
    let path = seed_dir.join("run_info.json");
    let file =
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &info)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Runs one seed of `scenario` from a fresh world, writing run info, metrics
/// CSV and `run_result.json` into `seed_dir`.
pub fn run_seed(
    content: &GameContent,
    scenario: &Scenario,
    seed: u64,
    seed_dir: &Path,
) -> Result<SeedResult> {
    let run_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = mine_world::build_initial_state(content, seed, &mut rng);
    let mut autopilot = scenario.autopilot.then_some(AutopilotController);
    let mut next_command_id = 0u64;
    let mut tally = EventTally::default();

    std::fs::create_dir_all(seed_dir)
        .with_context(|| format!("creating seed directory: {}", seed_dir.display()))?;
    write_run_info(seed_dir, seed, scenario, &content.content_version)?;

    let mut metrics_writer = MetricsFileWriter::new(seed_dir.to_path_buf())
        .with_context(|| format!("opening metrics CSV in {}", seed_dir.display()))?;

    for _ in 0..scenario.ticks {
        let commands = match autopilot.as_mut() {
            Some(controller) => {
                controller.generate_commands(&state, content, &mut next_command_id)
            }
            None => Vec::new(),
        };
        let events = mine_core::tick(&mut state, &commands, content, scenario.delta, &mut rng);
        for envelope in &events {
            tally.record(envelope.tick, &envelope.event);
        }

        if state.meta.tick % scenario.metrics_every == 0 {
            let snapshot = mine_core::compute_metrics(&state, content);
            metrics_writer
                .write_row(&snapshot)
                .context("writing metrics row")?;
        }
    }

    // Always capture final snapshot
    let final_snapshot = mine_core::compute_metrics(&state, content);
    if state.meta.tick % scenario.metrics_every != 0 {
        metrics_writer
            .write_row(&final_snapshot)
            .context("writing final metrics row")?;
    }
    metrics_writer.flush().context("flushing metrics")?;

    let wall_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let sim_ticks_per_second = if wall_time_ms > 0 {
        (scenario.ticks as f64) / (wall_time_ms as f64 / 1000.0)
    } else {
        0.0
    };

    let (stalled, stall_reason) = run_result::detect_stall(&final_snapshot);
    let blackouts = tally.count("blackout_started");

    let run_result = RunResult {
        run_schema_version: 1,
        run_status: "completed".to_string(),
        run_id: run_id.clone(),
        seed,
        scenario_name: scenario.name.clone(),
        scenario_params: scenario.params(),
        tick_start: 0,
        tick_end: final_snapshot.tick,
        total_ticks: scenario.ticks,
        simulated_seconds: state.meta.last_update_time,
        wall_time_ms,
        sim_ticks_per_second,
        summary_metrics: Some(SummaryMetrics::from_snapshot(&final_snapshot)),
        event_counts_by_type: tally.counts,
        event_first_tick_by_type: tally.first_tick,
        stalled,
        stall_reason,
        metrics_path: "metrics_000.csv".to_string(),
    };

    run_result
        .write_atomic(&seed_dir.join("run_result.json"))
        .context("writing run_result.json")?;

    Ok(SeedResult {
        seed,
        final_snapshot,
        wall_time_ms,
        run_id,
        stalled,
        blackouts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::SeedSpec;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn scenario(ticks: u64) -> Scenario {
        Scenario {
            name: "test_scenario".to_string(),
            ticks,
            delta: 0.1,
            metrics_every: 60,
            seeds: SeedSpec::List(vec![42]),
            content_dir: "../../content".to_string(),
            autopilot: true,
            overrides: BTreeMap::new(),
        }
    }

    #[test]
    fn test_run_seed_produces_output() {
        let content = mine_world::load_content("../../content").unwrap();
        let temp_dir = TempDir::new().unwrap();
        let seed_dir = temp_dir.path().join("seed_42");

        let result = run_seed(&content, &scenario(120), 42, &seed_dir).unwrap();

        assert_eq!(result.seed, 42);
        assert_eq!(result.final_snapshot.tick, 120);
        assert!(!result.run_id.is_empty());
        assert!(seed_dir.join("run_info.json").exists());
        assert!(seed_dir.join("metrics_000.csv").exists());
        assert!(seed_dir.join("run_result.json").exists());

        let content_str = std::fs::read_to_string(seed_dir.join("run_result.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content_str).unwrap();
        assert_eq!(parsed["run_schema_version"], 1);
        assert_eq!(parsed["run_status"], "completed");
        assert_eq!(parsed["seed"], 42);
        assert!(parsed["summary_metrics"].is_object());
        assert!(parsed["event_counts_by_type"]["miner_hired"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_final_row_written_off_interval() {
        let content = mine_world::load_content("../../content").unwrap();
        let temp_dir = TempDir::new().unwrap();
        let seed_dir = temp_dir.path().join("seed_1");

        run_seed(&content, &scenario(130), 1, &seed_dir).unwrap();

        let csv = std::fs::read_to_string(seed_dir.join("metrics_000.csv")).unwrap();
        // Header, ticks 60 and 120, then the final tick 130.
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.lines().last().unwrap().starts_with("130,"));
    }

    #[test]
    fn test_run_seed_determinism() {
        let content = mine_world::load_content("../../content").unwrap();
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();

        let result1 = run_seed(&content, &scenario(300), 42, &dir1.path().join("seed_42")).unwrap();
        let result2 = run_seed(&content, &scenario(300), 42, &dir2.path().join("seed_42")).unwrap();

        assert_eq!(result1.final_snapshot.tick, result2.final_snapshot.tick);
        assert_eq!(
            result1.final_snapshot.total_resources,
            result2.final_snapshot.total_resources
        );
        assert_eq!(
            result1.final_snapshot.fleet_total,
            result2.final_snapshot.fleet_total
        );
        assert!((result1.final_snapshot.money - result2.final_snapshot.money).abs() < f64::EPSILON);
    }
}
