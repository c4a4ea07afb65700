//! Error types for the conquest simulation.

use thiserror::Error;

use crate::map::RegionId;
use crate::player::PlayerSlot;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
///
/// `CommandRejected` is the only expected, user-facing failure. Everything
/// else is either a broken contract (`InvariantViolation`) or an IO/data
/// problem at the edges of the core.
#[derive(Debug, Error)]
pub enum GameError {
    /// A command failed validation. No state was changed.
    #[error("Command rejected: {}", .reasons.join("; "))]
    CommandRejected {
        /// Human-readable reasons, in the order they were detected.
        reasons: Vec<String>,
    },

    /// An internal invariant does not hold. Not recoverable.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Region index outside the map.
    #[error("Unknown region: {0}")]
    UnknownRegion(RegionId),

    /// Player slot not present in the game.
    #[error("Unknown player slot: {0}")]
    UnknownPlayer(PlayerSlot),

    /// Map data failed validation.
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// Game setup is inconsistent (duplicate slots, bad placements).
    #[error("Invalid setup: {0}")]
    InvalidSetup(String),

    /// Rules file parsing error.
    #[error("Failed to parse rules '{path}': {message}")]
    RulesParse {
        /// Path (or `<string>`) that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Snapshot or replay (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File system failure.
    #[error("IO error: {0}")]
    Io(String),

    /// A stored game was not found.
    #[error("Game not found: {0}")]
    NotFound(String),

    /// Replay playback diverged from the recorded outcome.
    #[error("Replay mismatch: expected hash {expected:#018x}, got {actual:#018x}")]
    ReplayMismatch {
        /// Hash recorded when the replay was finalized.
        expected: u64,
        /// Hash produced by playback.
        actual: u64,
    },
}

impl GameError {
    /// Build a rejection from a list of reasons.
    #[must_use]
    pub fn rejected(reasons: Vec<String>) -> Self {
        Self::CommandRejected { reasons }
    }

    /// Whether this is an expected validation failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::CommandRejected { .. })
    }
}

impl From<std::io::Error> for GameError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for GameError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_joins_reasons() {
        let err = GameError::rejected(vec![
            "Region 3 is not owned by player 0".to_string(),
            "No moves remaining".to_string(),
        ]);
        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            "Command rejected: Region 3 is not owned by player 0; No moves remaining"
        );
    }

    #[test]
    fn test_replay_mismatch_display() {
        let err = GameError::ReplayMismatch {
            expected: 1,
            actual: 2,
        };
        assert!(!err.is_rejection());
        assert!(err.to_string().contains("0x0000000000000001"));
    }
}
