//! Single-game runner.
//!
//! Plays one AI-only game from a scenario, then re-applies the recorded
//! commands to collect metrics and to check the run against its own replay.

use std::path::Path;

use conquest_core::prelude::{
    CommandProcessor, GameError, GameState, Replay, ReplayPlayer, StopReason, TurnProcessor,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::metrics::{GameMetrics, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// Error type for game runs.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Scenario could not be loaded or built.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The simulation reported an error.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Writing an output file failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding the report failed.
    #[error("Report encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options for a single game.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Seed for the game's dice.
    pub seed: String,
    /// Override of the rules' AI end-turn limit.
    pub turn_limit: Option<u32>,
}

impl RunConfig {
    /// Config for a seed.
    #[must_use]
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            turn_limit: None,
        }
    }

    /// Set the end-turn limit.
    #[must_use]
    pub fn with_turn_limit(mut self, limit: u32) -> Self {
        self.turn_limit = Some(limit);
        self
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Replay of the whole game.
    pub replay: Replay,
    /// Why the AI loop stopped.
    pub stop: StopReason,
    /// State after the last command.
    pub final_state: GameState,
}

/// JSON report of one game.
#[derive(Debug, Serialize)]
pub struct GameReport<'a> {
    /// Metrics of the game.
    #[serde(flatten)]
    pub metrics: &'a GameMetrics,
    /// Why the AI loop stopped.
    pub stop: StopReason,
    /// Final snapshot.
    pub final_state: &'a GameState,
}

impl GameOutcome {
    /// JSON report of the game.
    #[must_use]
    pub fn report(&self) -> GameReport<'_> {
        GameReport {
            metrics: &self.metrics,
            stop: self.stop,
            final_state: &self.final_state,
        }
    }

    /// Write the JSON report.
    pub fn write_report(&self, path: &Path) -> Result<(), RunnerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.report())?)?;
        Ok(())
    }

    /// Write the bincode replay.
    pub fn write_replay(&self, path: &Path) -> Result<(), RunnerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.replay.save(path)?;
        Ok(())
    }
}

/// Play one AI-only game.
pub fn run_game(scenario: &Scenario, config: &RunConfig) -> Result<GameOutcome, RunnerError> {
    let start = scenario.build_state(&config.seed)?;
    let game_id = format!("{}-{}", scenario.name, config.seed);

    let mut turns = TurnProcessor::new();
    if let Some(limit) = config.turn_limit {
        turns = turns.with_turn_limit(limit);
    }
    let run = turns.run(start.clone())?;

    let mut replay = Replay::new(game_id.clone(), &start);
    replay.extend(run.records.iter().cloned());
    replay.finalize(&run.state);

    let mut collector = MetricsCollector::new(&game_id, &scenario.name, &config.seed);
    let processor = CommandProcessor::new();
    let mut state = start;
    for record in &run.records {
        let executed = processor.process(&state, record.command.clone())?;
        collector.observe(&executed);
        state = executed.into_state();
    }
    if state.state_hash() != run.state.state_hash() {
        return Err(GameError::ReplayMismatch {
            expected: run.state.state_hash(),
            actual: state.state_hash(),
        }
        .into());
    }
    debug!(game = %game_id, commands = run.records.len(), "Recorded commands re-applied");

    let metrics = collector.finalize(&run.state);
    info!(
        game = %game_id,
        turns = metrics.turns,
        winner = ?metrics.winner,
        condition = %metrics.win_condition,
        hash = format_args!("{:#018x}", metrics.final_state_hash),
        "Game finished"
    );

    Ok(GameOutcome {
        metrics,
        replay,
        stop: run.stop,
        final_state: run.state,
    })
}

/// Summary of a verified replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedReplay {
    /// Commands re-applied.
    pub commands: usize,
    /// Final round.
    pub turn: u32,
    /// Final hash, equal to the recorded one.
    pub hash: u64,
}

/// Load a replay file and check that it reproduces its recorded hash.
pub fn verify_replay(path: &Path) -> Result<VerifiedReplay, RunnerError> {
    let replay = Replay::load(path)?;
    let commands = replay.command_count();
    let mut player = ReplayPlayer::new(replay);
    player.verify()?;
    Ok(VerifiedReplay {
        commands,
        turn: player.state().turn(),
        hash: player.state().state_hash(),
    })
}
