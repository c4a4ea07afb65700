//! Game metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] observes every processed command of a game and
//! condenses it into a [`GameMetrics`]; [`BatchSummary`] aggregates many.

use std::collections::BTreeMap;

use conquest_core::prelude::{
    BuildAction, Command, EndResult, Executed, GameState, PlayerSlot, ScoreCalculator, ScoreLine,
};
use serde::{Deserialize, Serialize};

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: String,
    /// Rounds completed.
    pub turns: u32,
    /// Commands processed.
    pub commands: u32,
    /// Winning slot (None = draw or unfinished).
    pub winner: Option<PlayerSlot>,
    /// How the game ended.
    pub win_condition: String,
    /// Per-player metrics keyed by slot.
    pub players: BTreeMap<PlayerSlot, PlayerMetrics>,
    /// Final standings, best first.
    pub standings: Vec<ScoreLine>,
    /// Final state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: scenario.into(),
            seed: seed.into(),
            ..Default::default()
        }
    }

    /// Get or create player metrics.
    pub fn player_mut(&mut self, slot: PlayerSlot) -> &mut PlayerMetrics {
        self.players.entry(slot).or_default()
    }
}

/// Metrics for one player in a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    /// Moves issued.
    pub moves: u32,
    /// Battles started as attacker.
    pub attacks: u32,
    /// Attacks that took the region.
    pub attacks_won: u32,
    /// Battles fought as defender.
    pub defences: u32,
    /// Defences that held.
    pub defences_held: u32,
    /// Regions taken, peaceful or not.
    pub regions_conquered: u32,
    /// Soldiers lost in battle, either side.
    pub soldiers_lost: u32,
    /// Enemy soldiers killed in battle, either side.
    pub soldiers_killed: u32,
    /// Soldiers bought with faith.
    pub soldiers_recruited: u32,
    /// Temple upgrades bought.
    pub upgrades: u32,
    /// Round of the first attack.
    pub first_attack_turn: Option<u32>,
    /// Round in which the player was eliminated.
    pub eliminated_turn: Option<u32>,
}

impl PlayerMetrics {
    /// Kills per loss; infinite with no losses.
    #[must_use]
    pub fn kd_ratio(&self) -> f64 {
        if self.soldiers_lost == 0 {
            return f64::INFINITY;
        }
        f64::from(self.soldiers_killed) / f64::from(self.soldiers_lost)
    }
}

/// Metrics collector that observes commands as they are processed.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: GameMetrics,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(game_id: &str, scenario: &str, seed: &str) -> Self {
        Self {
            metrics: GameMetrics::new(game_id, scenario, seed),
        }
    }

    /// Record one processed command.
    pub fn observe(&mut self, executed: &Executed) {
        let before = executed.previous();
        let after = executed.state();
        let turn = before.turn();
        self.metrics.commands += 1;

        match *executed.command() {
            Command::MoveArmy { player, to, .. } => {
                let defender = before.region_owner(to);
                let stats = self.metrics.player_mut(player);
                stats.moves += 1;
                if after.region_owner(to) == Some(player) && defender != Some(player) {
                    stats.regions_conquered += 1;
                }
                if let Some(report) = executed.battle() {
                    let won = report.attacker_won();
                    stats.attacks += 1;
                    stats.attacks_won += u32::from(won);
                    stats.soldiers_lost += report.attacker_losses();
                    stats.soldiers_killed += report.defender_losses();
                    stats.first_attack_turn.get_or_insert(turn);
                    if let Some(defender) = defender {
                        let stats = self.metrics.player_mut(defender);
                        stats.defences += 1;
                        stats.defences_held += u32::from(!won);
                        stats.soldiers_lost += report.defender_losses();
                        stats.soldiers_killed += report.attacker_losses();
                    }
                }
            }
            Command::Build { player, action, .. } => {
                let stats = self.metrics.player_mut(player);
                match action {
                    BuildAction::RecruitSoldier => stats.soldiers_recruited += 1,
                    BuildAction::Upgrade(_) => stats.upgrades += 1,
                    BuildAction::Rebuild => {}
                }
            }
            Command::EndTurn { .. } | Command::Resign { .. } => {}
        }

        for &slot in after.eliminated_players() {
            if !before.is_eliminated(slot) {
                self.metrics.player_mut(slot).eliminated_turn = Some(turn);
            }
        }
    }

    /// Finish with the final state.
    #[must_use]
    pub fn finalize(mut self, state: &GameState) -> GameMetrics {
        for player in state.players() {
            self.metrics.player_mut(player.slot);
        }
        self.metrics.turns = state.turn();
        self.metrics.winner = state.end_result().winner();
        self.metrics.win_condition = win_condition(state).to_string();
        self.metrics.standings = ScoreCalculator::standings(state);
        self.metrics.final_state_hash = state.state_hash();
        self.metrics
    }

    /// Metrics gathered so far.
    #[must_use]
    pub const fn current(&self) -> &GameMetrics {
        &self.metrics
    }
}

fn win_condition(state: &GameState) -> &'static str {
    match state.end_result() {
        EndResult::Undecided => "unfinished",
        EndResult::Draw if state.active_players().is_empty() => "mutual_elimination",
        EndResult::Draw => "score_tie",
        EndResult::Winner(_) if state.active_players().len() == 1 => "elimination",
        EndResult::Winner(_) => "score",
    }
}

/// Summary statistics across multiple games.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won by each slot.
    pub wins_by_player: BTreeMap<PlayerSlot, u32>,
    /// Win rates by slot.
    pub win_rates: BTreeMap<PlayerSlot, f64>,
    /// Games that ended without a winner.
    pub draws: u32,
    /// Games by how they ended.
    pub win_conditions: BTreeMap<String, u32>,
    /// Average rounds per game.
    pub avg_turns: f64,
    /// Shortest game in rounds.
    pub min_turns: u32,
    /// Longest game in rounds.
    pub max_turns: u32,
    /// Average battles per game.
    pub avg_battles: f64,
    /// Average kill/loss ratio by slot, finite ratios only.
    pub avg_kd_ratio: BTreeMap<PlayerSlot, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = u32::try_from(games.len()).unwrap_or(u32::MAX);
        let mut summary = Self {
            total_games: total,
            min_turns: u32::MAX,
            ..Default::default()
        };

        let mut turn_sum = 0u64;
        let mut battle_sum = 0u64;
        let mut kd: BTreeMap<PlayerSlot, Vec<f64>> = BTreeMap::new();

        for game in games {
            turn_sum += u64::from(game.turns);
            summary.min_turns = summary.min_turns.min(game.turns);
            summary.max_turns = summary.max_turns.max(game.turns);

            match game.winner {
                Some(slot) => *summary.wins_by_player.entry(slot).or_default() += 1,
                None => summary.draws += 1,
            }
            *summary
                .win_conditions
                .entry(game.win_condition.clone())
                .or_default() += 1;

            for (slot, player) in &game.players {
                battle_sum += u64::from(player.attacks);
                let ratio = player.kd_ratio();
                if ratio.is_finite() {
                    kd.entry(*slot).or_default().push(ratio);
                }
            }
        }

        let n = f64::from(total);
        summary.avg_turns = turn_sum as f64 / n;
        summary.avg_battles = battle_sum as f64 / n;
        for (slot, wins) in &summary.wins_by_player {
            summary.win_rates.insert(*slot, f64::from(*wins) / n);
        }
        for (slot, ratios) in kd {
            let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
            summary.avg_kd_ratio.insert(slot, avg);
        }

        summary
    }

    /// Whether no slot wins more than `1 / players + threshold` of games.
    #[must_use]
    pub fn is_balanced(&self, players: usize, threshold: f64) -> bool {
        let fair = 1.0 / players.max(1) as f64;
        self.win_rates.values().all(|rate| (rate - fair).abs() <= threshold)
    }

    /// The slot winning clearly more than its fair share, if any.
    #[must_use]
    pub fn dominant_player(&self, players: usize, threshold: f64) -> Option<PlayerSlot> {
        let fair = 1.0 / players.max(1) as f64;
        self.win_rates
            .iter()
            .find(|(_, rate)| **rate > fair + threshold)
            .map(|(slot, _)| *slot)
    }
}
