//! Headless Temple Conquest runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one AI-only game
//! cargo run -p conquest_headless -- run --scenario duel --seed 42 --output report.json
//!
//! # Run a seeded batch in parallel
//! cargo run -p conquest_headless -- batch --scenario skirmish --count 200 --output results/
//!
//! # Verify a replay
//! cargo run -p conquest_headless -- verify --replay game.replay
//!
//! # Check a scenario file
//! cargo run -p conquest_headless -- validate --scenario scenarios/duel.ron
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default level.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use conquest_headless::{
    batch::{run_batch, BatchConfig, BatchResults},
    runner::{run_game, verify_replay, RunConfig},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "conquest_headless")]
#[command(about = "Headless Temple Conquest runner for AI games and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single AI-only game
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Dice seed
        #[arg(long, default_value = "0")]
        seed: String,

        /// Maximum end-turns before the run is cut off
        #[arg(long)]
        turn_limit: Option<u32>,

        /// Write a JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a replay here
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Run a batch of games for balance testing
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Prefix of every game's seed
        #[arg(long, default_value = "batch")]
        seed_prefix: String,

        /// Maximum end-turns per game
        #[arg(long)]
        turn_limit: Option<u32>,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Verify that a replay reproduces its final hash
    Verify {
        /// Replay file path
        #[arg(short, long)]
        replay: PathBuf,
    },

    /// Parse a scenario and check that it is playable
    Validate {
        /// Built-in scenario name or RON file
        #[arg(short, long)]
        scenario: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            turn_limit,
            output,
            replay,
        } => cmd_run(&scenario, seed, turn_limit, output, replay),
        Commands::Batch {
            scenario,
            count,
            parallel,
            seed_prefix,
            turn_limit,
            output,
        } => cmd_batch(scenario, count, parallel, seed_prefix, turn_limit, output),
        Commands::Verify { replay } => cmd_verify(replay),
        Commands::Validate { scenario } => cmd_validate(&scenario),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            eprintln!("FAIL: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Play one game and print a summary
fn cmd_run(
    scenario: &str,
    seed: String,
    turn_limit: Option<u32>,
    output: Option<PathBuf>,
    replay: Option<PathBuf>,
) -> Result<(), String> {
    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    let mut config = RunConfig::new(seed);
    config.turn_limit = turn_limit;

    tracing::info!(scenario = %scenario.name, seed = %config.seed, "Starting game");
    let outcome = run_game(&scenario, &config).map_err(|e| e.to_string())?;

    if let Some(path) = &output {
        outcome.write_report(path).map_err(|e| e.to_string())?;
        tracing::info!(path = %path.display(), "Report written");
    }
    if let Some(path) = &replay {
        outcome.write_replay(path).map_err(|e| e.to_string())?;
        tracing::info!(path = %path.display(), "Replay written");
    }

    let metrics = &outcome.metrics;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("GAME COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Scenario: {}", metrics.scenario);
    eprintln!("Seed: {}", metrics.seed);
    eprintln!("Stopped: {:?}", outcome.stop);
    eprintln!("Rounds: {}", metrics.turns);
    eprintln!("Commands: {}", metrics.commands);
    match metrics.winner {
        Some(slot) => {
            let name = outcome
                .final_state
                .player(slot)
                .map_or("?", |p| p.name.as_str());
            eprintln!("Winner: {name} (slot {slot}, {})", metrics.win_condition);
        }
        None => eprintln!("Result: {}", metrics.win_condition),
    }
    eprintln!("\nStandings:");
    for line in &metrics.standings {
        eprintln!(
            "  slot {}: {:>6} pts ({} regions, {} soldiers, {} faith)",
            line.slot, line.score, line.regions, line.soldiers, line.faith
        );
    }
    eprintln!("\nState hash: {:016x}", metrics.final_state_hash);
    Ok(())
}

/// Run a batch and save the results
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    seed_prefix: String,
    turn_limit: Option<u32>,
    output: PathBuf,
) -> Result<(), String> {
    let num_cpus = std::thread::available_parallelism().map_or(1, |p| p.get());
    tracing::info!(
        scenario = %scenario,
        count,
        parallel,
        seed_prefix = %seed_prefix,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    std::fs::create_dir_all(&output)
        .map_err(|e| format!("Cannot create output directory '{}': {e}", output.display()))?;

    let config = BatchConfig {
        scenario,
        game_count: count,
        parallel_games: parallel,
        seed_prefix,
        turn_limit,
    };
    let results = run_batch(config);

    let results_path = BatchResults::default_path(&output);
    results
        .save(&results_path)
        .map_err(|e| format!("Failed to save results: {e}"))?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Rounds: avg {:.1}, min {}, max {}",
        summary.avg_turns, summary.min_turns, summary.max_turns
    );
    eprintln!("Draws: {}", summary.draws);
    for (slot, rate) in &summary.win_rates {
        eprintln!("  slot {slot}: {:>5.1}% wins", rate * 100.0);
    }
    eprintln!("Results: {}", results_path.display());

    if results.games.is_empty() && !results.errors.is_empty() {
        return Err(results.errors[0].message.clone());
    }
    Ok(())
}

/// Verify a replay file
fn cmd_verify(replay: PathBuf) -> Result<(), String> {
    tracing::info!("Verifying replay: {}", replay.display());
    let verified = verify_replay(&replay).map_err(|e| e.to_string())?;
    eprintln!("PASS: Replay verification successful");
    eprintln!("  Commands: {}", verified.commands);
    eprintln!("  Final round: {}", verified.turn);
    eprintln!("  Hash: {:016x}", verified.hash);
    Ok(())
}

/// Validate a scenario
fn cmd_validate(scenario: &str) -> Result<(), String> {
    let loaded = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    loaded.validate().map_err(|e| e.to_string())?;
    eprintln!(
        "OK: '{}' ({} regions, {} players)",
        loaded.name,
        loaded.regions.len(),
        loaded.players.len()
    );
    Ok(())
}
