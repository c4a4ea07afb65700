//! Scoring and end-of-game detection.

use serde::{Deserialize, Serialize};

use crate::player::PlayerSlot;
use crate::state::{EndResult, GameState};

/// Points per owned region.
pub const REGION_POINTS: u64 = 1000;

/// Points per soldier.
pub const SOLDIER_POINTS: u64 = 10;

/// One player's line in the standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreLine {
    /// Player slot.
    pub slot: PlayerSlot,
    /// Regions owned.
    pub regions: u32,
    /// Soldiers across owned regions.
    pub soldiers: u32,
    /// Faith balance.
    pub faith: u32,
    /// Combined score.
    pub score: u64,
}

impl ScoreLine {
    /// Ranking key, highest first. Score, then regions, soldiers and faith.
    const fn rank_key(&self) -> (u64, u32, u32, u32) {
        (self.score, self.regions, self.soldiers, self.faith)
    }
}

/// Score formula.
pub struct ScoreCalculator;

impl ScoreCalculator {
    /// `1000 * regions + 10 * soldiers + faith`.
    #[must_use]
    pub const fn score(regions: u32, soldiers: u32, faith: u32) -> u64 {
        REGION_POINTS * regions as u64 + SOLDIER_POINTS * soldiers as u64 + faith as u64
    }

    /// Score line for a player in a state.
    #[must_use]
    pub fn line(state: &GameState, slot: PlayerSlot) -> ScoreLine {
        let regions = state.regions_owned_by(slot).len() as u32;
        let soldiers = state.total_soldiers(slot);
        let faith = state.faith(slot);
        ScoreLine {
            slot,
            regions,
            soldiers,
            faith,
            score: Self::score(regions, soldiers, faith),
        }
    }

    /// Standings of every active player, best first; equal keys fall back
    /// to ascending slot.
    #[must_use]
    pub fn standings(state: &GameState) -> Vec<ScoreLine> {
        let mut lines: Vec<ScoreLine> = state
            .active_players()
            .into_iter()
            .map(|slot| Self::line(state, slot))
            .collect();
        lines.sort_by(|a, b| b.rank_key().cmp(&a.rank_key()).then(a.slot.cmp(&b.slot)));
        lines
    }
}

/// Decides when and how a game ends.
pub struct WinDetector;

impl WinDetector {
    /// Outcome when at most one player is left standing, `None` otherwise.
    #[must_use]
    pub fn by_elimination(state: &GameState) -> Option<EndResult> {
        match state.active_players().as_slice() {
            [] => Some(EndResult::Draw),
            [survivor] => Some(EndResult::Winner(*survivor)),
            _ => None,
        }
    }

    /// Outcome on reaching the turn limit: the best standing wins, a full
    /// tie at the top is a draw.
    #[must_use]
    pub fn by_score(state: &GameState) -> EndResult {
        let standings = ScoreCalculator::standings(state);
        match standings.as_slice() {
            [] => EndResult::Draw,
            [only] => EndResult::Winner(only.slot),
            [first, second, ..] if first.rank_key() == second.rank_key() => EndResult::Draw,
            [first, ..] => EndResult::Winner(first.slot),
        }
    }

    /// Whether the round limit has been reached.
    #[must_use]
    pub fn turn_limit_reached(state: &GameState) -> bool {
        state.max_turns().is_some_and(|limit| state.turn() >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_table() {
        let cases = [
            (0, 0, 0, 0),
            (1, 0, 0, 1000),
            (2, 5, 10, 2060),
            (0, 3, 7, 37),
            (12, 40, 155, 12_555),
        ];
        for (regions, soldiers, faith, expected) in cases {
            assert_eq!(
                ScoreCalculator::score(regions, soldiers, faith),
                expected,
                "regions={regions} soldiers={soldiers} faith={faith}"
            );
        }
    }

    #[test]
    fn test_score_does_not_overflow() {
        let score = ScoreCalculator::score(u32::MAX, u32::MAX, u32::MAX);
        assert!(score > u64::from(u32::MAX));
    }
}
