//! # Conquest Core
//!
//! Deterministic simulation core for Temple Conquest, a turn-based game of
//! regions, temples and dice.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering or transport
//! - No wall clock
//! - No system randomness (every state owns its seeded generator)
//! - File IO only through explicit helpers on [`Rules`](rules::Rules),
//!   [`Replay`](replay::Replay) and [`JsonFileStore`](persistence::JsonFileStore)
//!
//! This separation enables:
//! - Authoritative servers and clients computing identical results
//! - Replays and undo
//! - Headless AI batches
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`state`] - The [`GameState`](state::GameState) aggregate
//! - [`command`] - Commands and the [`CommandProcessor`](command::CommandProcessor)
//! - [`combat`] - Dice rounds and full battles
//! - [`score`] - Scoring and win detection
//! - [`ai`] - Computer player policies and the turn loop
//! - [`setup`] - Building the opening position
//! - [`replay`] - Recording and verifying games

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod combat;
pub mod command;
pub mod error;
pub mod map;
pub mod persistence;
pub mod player;
pub mod replay;
pub mod rng;
pub mod rules;
pub mod score;
pub mod setup;
pub mod state;
pub mod temple;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiPolicy, AiRun, HeuristicPolicy, StopReason, Temperament, TurnProcessor};
    pub use crate::combat::{Battle, BattleReport, BattleRound, RoundOutcome, RoundRecord};
    pub use crate::command::{
        build_cost, BuildAction, Command, CommandProcessor, CommandRecord, Executed,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::map::{MapData, Region, RegionId};
    pub use crate::persistence::{GameStore, JsonFileStore, MemoryStore};
    pub use crate::player::{Player, PlayerSlot};
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::rng::{DeterministicRng, RngState};
    pub use crate::rules::Rules;
    pub use crate::score::{ScoreCalculator, ScoreLine, WinDetector};
    pub use crate::setup::{GameSetup, StartingRegion};
    pub use crate::state::{EndResult, GameState};
    pub use crate::temple::{Temple, UpgradeKind};
}
