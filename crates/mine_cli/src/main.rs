use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mine_control::{AutopilotController, CommandSource, MoneyRateWindow};
use mine_core::{Event, EventEnvelope, GameState, MetricsFileWriter, MinerState};
use mine_world::{build_initial_state, load_content, load_state};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "mine_cli", about = "Idle miner simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation for a fixed number of ticks.
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    ticks: u64,
    /// Start a new game with this seed. Mutually exclusive with --state.
    #[arg(long, conflicts_with = "state_file")]
    seed: Option<u64>,
    /// Load the initial GameState from a JSON file. Mutually exclusive with --seed.
    #[arg(long = "state", conflicts_with = "seed")]
    state_file: Option<String>,
    #[arg(long, default_value = "./content")]
    content_dir: String,
    /// Simulated seconds per tick.
    #[arg(long, default_value_t = 0.1)]
    delta: f64,
    #[arg(long, default_value_t = 100)]
    print_every: u64,
    /// Sample metrics every N ticks.
    #[arg(long, default_value_t = 50)]
    metrics_every: u64,
    /// Disable automatic metrics collection to the runs/ directory.
    #[arg(long)]
    no_metrics: bool,
    /// Run without the autopilot: miners work, nothing is bought.
    #[arg(long)]
    no_autopilot: bool,
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn generate_run_id(seed: u64) -> String {
    let uuid = mine_core::generate_uuid(&mut rand::thread_rng());
    format!("seed{seed}_{}", uuid.simple())
}

fn create_run_dir(run_id: &str) -> Result<std::path::PathBuf> {
    let dir = std::path::PathBuf::from("runs").join(run_id);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating run directory: {}", dir.display()))?;
    Ok(dir)
}

fn write_run_info(
    dir: &std::path::Path,
    run_id: &str,
    seed: u64,
    content_version: &str,
    args: &RunArgs,
) -> Result<()> {
    let info = serde_json::json!({
        "run_id": run_id,
        "seed": seed,
        "content_version": content_version,
        "metrics_every": args.metrics_every,
        "runner": "mine_cli",
        "args": {
            "ticks": args.ticks,
            "delta": args.delta,
            "print_every": args.print_every,
            "autopilot": !args.no_autopilot,
        }
    });
    let path = dir.join("run_info.json");
    let file =
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &info)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn log_notable(envelope: &EventEnvelope) {
    let tick = envelope.tick;
    match &envelope.event {
        Event::BlackoutStarted { current_energy } => {
            info!(tick, current_energy, "blackout started");
        }
        Event::BlackoutEnded { current_energy } => {
            info!(tick, current_energy, "blackout ended");
        }
        Event::MineUnlocked { mine_id, cost } => {
            info!(tick, %mine_id, cost, "mine unlocked");
        }
        Event::MineSwitched { from, to, ore_count } => {
            info!(tick, %from, %to, ore_count, "mine switched");
        }
        Event::MinerHired {
            miner_id,
            kind,
            cost,
            specialization,
        } => {
            info!(tick, %miner_id, ?kind, cost, ?specialization, "miner hired");
        }
        Event::UpgradePurchased {
            upgrade_id,
            level,
            cost,
        } => {
            info!(tick, %upgrade_id, level, cost, "upgrade purchased");
        }
        Event::EnergySourceBuilt {
            source_id,
            kind,
            cost,
        } => {
            info!(tick, %source_id, ?kind, cost, "energy source built");
        }
        Event::EnergySourceUpgraded {
            source_id,
            level,
            cost,
        } => {
            info!(tick, %source_id, level, cost, "energy source upgraded");
        }
        other => debug!(tick, event = ?other),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let content = load_content(&args.content_dir)?;

    let (mut state, mut rng) = if let Some(path) = &args.state_file {
        let loaded = load_state(path)?;
        let rng_seed = loaded.meta.seed;
        (loaded, ChaCha8Rng::seed_from_u64(rng_seed))
    } else {
        let resolved_seed = args.seed.unwrap_or_else(rand::random);
        let mut new_rng = ChaCha8Rng::seed_from_u64(resolved_seed);
        let new_state = build_initial_state(&content, resolved_seed, &mut new_rng);
        (new_state, new_rng)
    };

    let mut metrics_writer: Option<MetricsFileWriter> = None;
    if !args.no_metrics {
        let run_id = generate_run_id(state.meta.seed);
        let run_dir = create_run_dir(&run_id)?;
        write_run_info(
            &run_dir,
            &run_id,
            state.meta.seed,
            &content.content_version,
            args,
        )?;
        let writer = MetricsFileWriter::new(run_dir.clone())
            .with_context(|| format!("opening metrics CSV in {}", run_dir.display()))?;
        metrics_writer = Some(writer);
        info!(run_dir = %run_dir.display(), "metrics enabled");
    }

    let mut autopilot = (!args.no_autopilot).then_some(AutopilotController);
    let mut next_command_id = 0u64;
    let mut money_window = MoneyRateWindow::default();
    let print_every = args.print_every.max(1);
    let metrics_every = args.metrics_every.max(1);

    info!(
        ticks = args.ticks,
        seed = state.meta.seed,
        delta = args.delta,
        mine = %state.active_mine,
        ores = state.ores.len(),
        content_version = %content.content_version,
        "starting simulation"
    );

    for _ in 0..args.ticks {
        let commands = match autopilot.as_mut() {
            Some(controller) => {
                controller.generate_commands(&state, &content, &mut next_command_id)
            }
            None => Vec::new(),
        };

        let events = mine_core::tick(&mut state, &commands, &content, args.delta, &mut rng);
        for event in &events {
            log_notable(event);
        }
        money_window.record(state.meta.last_update_time, state.money);

        if state.meta.tick % print_every == 0 {
            print_status(&state, &money_window);
        }

        if let Some(ref mut writer) = metrics_writer {
            if state.meta.tick % metrics_every == 0 {
                let snapshot = mine_core::compute_metrics(&state, &content);
                writer.write_row(&snapshot).context("writing metrics row")?;
            }
        }
    }

    info!(tick = state.meta.tick, "done");
    print_status(&state, &money_window);

    if let Some(ref mut writer) = metrics_writer {
        writer.flush().context("final metrics flush")?;
    }

    Ok(())
}

fn print_status(state: &GameState, money_window: &MoneyRateWindow) {
    let count = |wanted: MinerState| state.miners.iter().filter(|m| m.state == wanted).count();
    let active_ores = state.ores.iter().filter(|o| !o.depleted).count();
    let energy_pct = if state.energy.max_energy > 0.0 {
        state.energy.current_energy / state.energy.max_energy * 100.0
    } else {
        0.0
    };

    info!(
        tick = state.meta.tick,
        time = %format!("{:.1}s", state.meta.last_update_time),
        money = %format!("{:.0}", state.money),
        rate = %format!("{:.2}/s", money_window.rate()),
        miners = state.miners.len(),
        seeking = count(MinerState::Seeking),
        mining = count(MinerState::Mining),
        resting = count(MinerState::Resting),
        ores = %format!("{active_ores}/{}", state.ores.len()),
        energy = %format!("{energy_pct:.0}%"),
        blackout = state.energy.is_blackout,
        "status"
    );
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(&args)?,
    }
    Ok(())
}
