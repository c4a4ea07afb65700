//! Tunable game rules.
//!
//! Loaded from RON; every field has a default so a rules file only lists
//! what it overrides.
//!
//! ```ron
//! Rules(
//!     max_moves_per_turn: 4,
//!     max_turns: None,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Game rules shared by every state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Moves granted at the start of each turn, before Air bonuses.
    pub max_moves_per_turn: u32,
    /// Faith income per owned temple.
    pub faith_per_temple: u32,
    /// Base of the linear soldier-cost fallback.
    pub soldier_base_cost: u32,
    /// Cost of the n-th soldier bought in a turn (n from 0).
    pub soldier_costs: Vec<u32>,
    /// Faith each player starts with.
    pub starting_faith: u32,
    /// Rounds before the game ends on score; `None` for unlimited.
    pub max_turns: Option<u32>,
    /// Runaway guard for a single battle.
    pub combat_round_cap: u32,
    /// End-turns the AI loop may issue in one run.
    pub ai_turn_limit: u32,
    /// Commands one AI player may issue before a forced end-turn.
    pub ai_actions_per_turn: u32,
    /// Number of player slots.
    pub max_players: u8,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_moves_per_turn: 3,
            faith_per_temple: 10,
            soldier_base_cost: 10,
            soldier_costs: vec![8, 9, 10, 12, 14, 15],
            starting_faith: 0,
            max_turns: Some(50),
            combat_round_cap: 1000,
            ai_turn_limit: 1000,
            ai_actions_per_turn: 64,
            max_players: 8,
        }
    }
}

impl Rules {
    /// Parse rules from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::RulesParse`] on malformed input.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| GameError::RulesParse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load rules from a RON file.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Io`] if the file cannot be read, or
    /// [`GameError::RulesParse`] if it does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        ron::from_str(&contents).map_err(|e| GameError::RulesParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Cost of the next soldier when `bought` have already been bought this turn.
    ///
    /// Table lookup, then `soldier_base_cost + bought`. The fallback is
    /// lifted above the table's last entry so the sequence never decreases.
    #[must_use]
    pub fn soldier_cost(&self, bought: u32) -> u32 {
        if let Some(&cost) = self.soldier_costs.get(bought as usize) {
            return cost;
        }
        let linear = self.soldier_base_cost + bought;
        match self.soldier_costs.last() {
            Some(&last) if linear <= last => {
                let past_end = bought + 1 - self.soldier_costs.len() as u32;
                last + past_end
            }
            _ => linear,
        }
    }
}
