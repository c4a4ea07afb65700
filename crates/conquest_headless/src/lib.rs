//! Headless game runner for AI batches and CI verification.
//!
//! This crate plays Temple Conquest without any presentation layer:
//!
//! - **AI games**: every seat is driven by the core's turn processor
//! - **Balance batches**: many seeds in parallel with aggregated metrics
//! - **Replay verification**: check that a replay reproduces its final hash
//!
//! # Example
//!
//! ```bash
//! # Play one game and keep its replay
//! cargo run -p conquest_headless -- run --scenario skirmish --seed demo --replay demo.replay
//!
//! # Verify it
//! cargo run -p conquest_headless -- verify --replay demo.replay
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector, PlayerMetrics};
pub use runner::{run_game, verify_replay, GameOutcome, RunConfig, RunnerError};
pub use scenario::{Scenario, ScenarioError};
