//! Replay system for recording and playing back games.
//!
//! A replay stores the opening state and every command processed after it.
//! Because the generator travels inside the state, re-applying the commands
//! reproduces every dice roll exactly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{CommandProcessor, CommandRecord};
use crate::error::{GameError, Result};
use crate::state::GameState;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Game or scenario identifier.
    pub game_id: String,
    /// State before the first command.
    pub initial_state: GameState,
    /// Commands in processing order.
    pub commands: Vec<CommandRecord>,
    /// Round counter of the final state.
    pub final_turn: u32,
    /// Hash of the final state.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay from an opening state.
    #[must_use]
    pub fn new(game_id: impl Into<String>, initial_state: &GameState) -> Self {
        Self {
            version: REPLAY_VERSION,
            game_id: game_id.into(),
            initial_state: initial_state.clone(),
            commands: Vec::new(),
            final_turn: initial_state.turn(),
            final_hash: initial_state.state_hash(),
        }
    }

    /// Record a processed command.
    pub fn record(&mut self, record: CommandRecord) {
        self.commands.push(record);
    }

    /// Record several processed commands.
    pub fn extend(&mut self, records: impl IntoIterator<Item = CommandRecord>) {
        self.commands.extend(records);
    }

    /// Finalize the replay with the end state.
    pub fn finalize(&mut self, final_state: &GameState) {
        self.final_turn = final_state.turn();
        self.final_hash = final_state.state_hash();
    }

    /// Encode with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and version-check.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] on malformed bytes or a
    /// version this build does not read.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)?;
        if replay.version != REPLAY_VERSION {
            return Err(GameError::Serialization(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }
        Ok(replay)
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file reading, decoding or the version check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Commands issued during a given round.
    #[must_use]
    pub fn commands_in_turn(&self, turn: u32) -> Vec<&CommandRecord> {
        self.commands.iter().filter(|c| c.turn == turn).collect()
    }

    /// Get the total number of commands in the replay.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    state: GameState,
    cursor: usize,
    processor: CommandProcessor,
}

impl ReplayPlayer {
    /// Create a player positioned before the first command.
    #[must_use]
    pub fn new(replay: Replay) -> Self {
        let state = replay.initial_state.clone();
        Self {
            replay,
            state,
            cursor: 0,
            processor: CommandProcessor::new(),
        }
    }

    /// Apply the next command.
    ///
    /// Returns `true` while commands remain.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ReplayMismatch`] if the recorded command is
    /// rejected by the current state.
    pub fn advance(&mut self) -> Result<bool> {
        let Some(record) = self.replay.commands.get(self.cursor) else {
            return Ok(false);
        };
        match self.processor.process(&self.state, record.command.clone()) {
            Ok(executed) => {
                self.state = executed.into_state();
                self.cursor += 1;
            }
            Err(err) if err.is_rejection() => {
                warn!(index = self.cursor, error = %err, "Replay command rejected");
                return Err(GameError::ReplayMismatch {
                    expected: self.replay.final_hash,
                    actual: self.state.state_hash(),
                });
            }
            Err(err) => return Err(err),
        }
        Ok(!self.is_finished())
    }

    /// Jump to the state after `index` commands.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ReplayMismatch`] if playback diverges on the way.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        if index < self.cursor {
            self.state = self.replay.initial_state.clone();
            self.cursor = 0;
        }
        let target = index.min(self.replay.commands.len());
        while self.cursor < target {
            self.advance()?;
        }
        debug!(cursor = self.cursor, "Replay seek");
        Ok(())
    }

    /// Index of the next command to apply.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// State after the commands applied so far.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Get the replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether every command has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.commands.len()
    }

    /// Play to the end and compare the final hash.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ReplayMismatch`] if any command is rejected or
    /// the final hash differs.
    pub fn verify(&mut self) -> Result<()> {
        self.seek(self.replay.commands.len())?;
        let actual = self.state.state_hash();
        if actual != self.replay.final_hash {
            return Err(GameError::ReplayMismatch {
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(())
    }

    /// Get progress as a percentage (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.commands.is_empty() {
            100.0
        } else {
            (self.cursor as f64 / self.replay.commands.len() as f64) * 100.0
        }
    }
}
