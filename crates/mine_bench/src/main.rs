use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod overrides;
mod run_result;
mod runner;
mod scenario;
mod summary;

#[derive(Parser)]
#[command(
    name = "mine_bench",
    about = "Automated scenario runner for idle miner balancing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file across multiple seeds.
    Run {
        /// Path to the scenario JSON file.
        #[arg(long)]
        scenario: String,
        /// Output directory (default: runs/).
        #[arg(long, default_value = "runs")]
        output_dir: String,
    },
}

fn write_json_atomic(path: &Path, value: &serde_json::Value) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value).context("serializing batch summary")?;
    let mut file =
        std::fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("writing {}", tmp.display()))?;
    file.sync_all()?;
    std::fs::rename(&tmp, path).with_context(|| format!("renaming {}", tmp.display()))?;
    Ok(())
}

fn seed_row(result: &runner::SeedResult) -> summary::SeedRow {
    let snapshot = &result.final_snapshot;
    summary::SeedRow {
        seed: result.seed,
        run_id: result.run_id.clone(),
        final_tick: snapshot.tick,
        money: snapshot.money,
        total_resources: snapshot.total_resources,
        fleet_total: snapshot.fleet_total,
        upgrade_levels: snapshot.upgrade_levels,
        mines_unlocked: snapshot.mines_unlocked,
        energy_source_count: snapshot.energy_source_count,
        blackouts: result.blackouts,
        stalled: result.stalled,
        wall_time_ms: result.wall_time_ms,
    }
}

fn run(scenario_path: &str, output_dir: &str) -> Result<()> {
    let scenario = scenario::load_scenario(Path::new(scenario_path))?;
    let seeds = scenario.seeds.expand();

    info!(
        scenario = %scenario.name,
        seeds = seeds.len(),
        ticks = scenario.ticks,
        "loading scenario"
    );

    let mut content = mine_world::load_content(&scenario.content_dir)?;
    overrides::apply_overrides(&mut content.constants, &scenario.overrides)?;
    mine_world::validate_content(&content);

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_dir = PathBuf::from(output_dir).join(format!("{}_{}", scenario.name, timestamp));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating output directory: {}", run_dir.display()))?;
    std::fs::copy(scenario_path, run_dir.join("scenario.json")).context("copying scenario file")?;

    info!(output = %run_dir.display(), "running seeds in parallel");

    let results: Vec<Result<runner::SeedResult>> = seeds
        .par_iter()
        .map(|&seed| {
            let seed_dir = run_dir.join(format!("seed_{seed}"));
            let result = runner::run_seed(&content, &scenario, seed, &seed_dir);
            if let Ok(done) = &result {
                info!(
                    seed,
                    money = done.final_snapshot.money,
                    resources = done.final_snapshot.total_resources,
                    miners = done.final_snapshot.fleet_total,
                    wall_time_ms = done.wall_time_ms,
                    "seed complete"
                );
            }
            result
        })
        .collect();

    let mut seed_results = Vec::new();
    for result in results {
        match result {
            Ok(seed_result) => seed_results.push(seed_result),
            Err(err) => error!("seed failed: {err:#}"),
        }
    }
    if seed_results.is_empty() {
        anyhow::bail!("all seeds failed");
    }

    let snapshots: Vec<&mine_core::MetricsSnapshot> =
        seed_results.iter().map(|r| &r.final_snapshot).collect();
    let stalled_count = seed_results.iter().filter(|r| r.stalled).count();
    let stats = summary::compute_summary(&snapshots, stalled_count);
    summary::print_summary(&scenario.name, scenario.ticks, &stats);

    let rows: Vec<summary::SeedRow> = seed_results.iter().map(seed_row).collect();
    let seeds_path = run_dir.join("seeds.csv");
    summary::write_seed_table(&seeds_path, &rows)?;

    let batch_summary = serde_json::json!({
        "batch_schema_version": 1,
        "batch_id": Uuid::new_v4().to_string(),
        "scenario_name": scenario.name,
        "scenario_params": scenario.params(),
        "seed_count": seed_results.len(),
        "run_ids": seed_results.iter().map(|r| r.run_id.as_str()).collect::<Vec<_>>(),
        "summary": stats,
    });
    let batch_path = run_dir.join("batch_summary.json");
    write_json_atomic(&batch_path, &batch_summary)?;

    info!(
        seeds_csv = %seeds_path.display(),
        batch_summary = %batch_path.display(),
        "summary written"
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            output_dir,
        } => run(&scenario, &output_dir)?,
    }
    Ok(())
}
