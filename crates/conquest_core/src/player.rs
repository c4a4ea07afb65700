//! Player identities.

use serde::{Deserialize, Serialize};

/// Permanent player identity: ownership, turn order and elimination all use
/// the slot, never a position in a list.
pub type PlayerSlot = u8;

/// A seat in the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Stable slot index.
    pub slot: PlayerSlot,
    /// Display name.
    pub name: String,
    /// Display color as RGB.
    pub color: [u8; 3],
    /// Whether the AI loop plays this seat.
    pub is_ai: bool,
    /// Optional AI personality tag (see [`crate::ai::HeuristicPolicy::for_personality`]).
    pub ai_personality: Option<String>,
}

impl Player {
    /// Create a human player.
    #[must_use]
    pub fn human(slot: PlayerSlot, name: impl Into<String>) -> Self {
        Self {
            slot,
            name: name.into(),
            color: default_color(slot),
            is_ai: false,
            ai_personality: None,
        }
    }

    /// Create an AI player.
    #[must_use]
    pub fn ai(slot: PlayerSlot, name: impl Into<String>, personality: Option<&str>) -> Self {
        Self {
            slot,
            name: name.into(),
            color: default_color(slot),
            is_ai: true,
            ai_personality: personality.map(str::to_string),
        }
    }
}

/// Palette used when a caller does not pick colors.
pub const PLAYER_COLORS: [[u8; 3]; 8] = [
    [220, 60, 60],
    [60, 120, 220],
    [70, 180, 90],
    [230, 190, 40],
    [160, 80, 200],
    [40, 190, 190],
    [230, 130, 50],
    [140, 140, 140],
];

fn default_color(slot: PlayerSlot) -> [u8; 3] {
    PLAYER_COLORS[slot as usize % PLAYER_COLORS.len()]
}
