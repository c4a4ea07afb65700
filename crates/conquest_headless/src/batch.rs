//! Batch game runner for balance testing.
//!
//! Runs many seeded games in parallel using rayon and aggregates their
//! metrics. Seeds are `"{seed_prefix}-{index}"`, so a batch is reproducible
//! game by game regardless of thread scheduling.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, GameMetrics};
use crate::runner::{run_game, RunConfig};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name or path
    pub scenario: String,
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Prefix of every game's seed
    pub seed_prefix: String,
    /// Override of the AI end-turn limit
    pub turn_limit: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "skirmish".to_string(),
            game_count: 100,
            parallel_games: 0,
            seed_prefix: "batch".to_string(),
            turn_limit: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set seed prefix
    pub fn with_seed_prefix(mut self, prefix: &str) -> Self {
        self.seed_prefix = prefix.to_string();
        self
    }

    /// Seed of the game at `index`.
    #[must_use]
    pub fn seed_for(&self, index: u32) -> String {
        format!("{}-{index}", self.seed_prefix)
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Default results file inside an output directory.
    #[must_use]
    pub fn default_path(output_dir: &Path) -> PathBuf {
        output_dir.join("batch_results.json")
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Seed used
    pub seed: String,
    /// Error message
    pub message: String,
}

/// Run a batch of games.
///
/// A scenario that fails to load is reported as one error per game rather
/// than aborting, matching how individual game failures are reported.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        scenario = %config.scenario,
        games = config.game_count,
        seed_prefix = %config.seed_prefix,
        "Starting batch run"
    );

    let scenario = Scenario::resolve(&config.scenario).map_err(|e| e.to_string());

    let run_all = || -> Vec<Result<GameMetrics, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_for(i);
                let result = match &scenario {
                    Ok(scenario) => {
                        let mut run = RunConfig::new(seed.clone());
                        run.turn_limit = config.turn_limit;
                        run_game(scenario, &run)
                            .map(|outcome| outcome.metrics)
                            .map_err(|e| e.to_string())
                    }
                    Err(message) => Err(message.clone()),
                };

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10 == 0 {
                    debug!("Progress: {}/{}", done, config.game_count);
                }

                result.map_err(|message| {
                    warn!(game = i, seed = %seed, error = %message, "Game failed");
                    BatchError {
                        game_index: i,
                        seed,
                        message,
                    }
                })
            })
            .collect()
    };

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global pool");
                run_all()
            }
        }
    } else {
        run_all()
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed `runs` times and check every run ends identically.
pub fn verify_determinism(scenario: &Scenario, seed: &str, runs: u32) -> bool {
    let hashes: Vec<Option<u64>> = (0..runs)
        .map(|_| {
            run_game(scenario, &RunConfig::new(seed))
                .ok()
                .map(|outcome| outcome.metrics.final_state_hash)
        })
        .collect();

    hashes.first().is_some_and(Option::is_some) && hashes.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.game_count, 100);
        assert_eq!(config.scenario, "skirmish");
        assert_eq!(config.seed_for(7), "batch-7");
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("duel", 500).with_seed_prefix("nightly");
        assert_eq!(config.scenario, "duel");
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_for(0), "nightly-0");
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(BatchConfig::new("duel", 10));

        assert_eq!(results.games.len(), 10);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 10);
        let decided: u32 = results.summary.wins_by_player.values().sum();
        assert_eq!(decided + results.summary.draws, 10);
    }

    #[test]
    fn test_games_keep_seed_order() {
        let results = run_batch(BatchConfig::new("duel", 6).with_seed_prefix("order"));
        let seeds: Vec<&str> = results.games.iter().map(|g| g.seed.as_str()).collect();
        assert_eq!(seeds, ["order-0", "order-1", "order-2", "order-3", "order-4", "order-5"]);
    }

    #[test]
    fn test_batch_is_reproducible_with_any_pool_size() {
        let mut single = BatchConfig::new("skirmish", 4).with_seed_prefix("pool");
        single.parallel_games = 1;
        let mut wide = single.clone();
        wide.parallel_games = 4;

        let a = run_batch(single);
        let b = run_batch(wide);
        let hashes = |r: &BatchResults| r.games.iter().map(|g| g.final_state_hash).collect::<Vec<_>>();
        assert_eq!(hashes(&a), hashes(&b));
    }

    #[test]
    fn test_unknown_scenario_reports_errors() {
        let results = run_batch(BatchConfig::new("no-such-scenario.ron", 3));
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 3);
        assert_eq!(results.summary.total_games, 0);
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&Scenario::duel(), "det", 3));
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new("duel", 5));

        let dir = tempfile::tempdir().unwrap();
        let path = BatchResults::default_path(dir.path());

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games.len(), 5);
        assert_eq!(loaded.config.scenario, "duel");
    }
}
