//! Balance testing utilities.
//!
//! Runs thousands of seeded battles to measure how force sizes and temple
//! upgrades shift the odds.

use conquest_core::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Statistics for a set of battles between the same forces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BattleStats {
    /// Total battles run.
    pub total_battles: u32,
    /// Battles the attacker won (defenders wiped out, attackers left).
    pub attacker_wins: u32,
    /// Battles the defender held.
    pub defender_wins: u32,
    /// Battles where both sides were wiped out.
    pub mutual_destruction: u32,
    /// Average dice rounds per battle.
    pub avg_rounds: f64,
    /// Average attackers lost per battle, opening strikes included.
    pub avg_attacker_losses: f64,
    /// Average defenders lost per battle, opening strikes included.
    pub avg_defender_losses: f64,
}

impl BattleStats {
    /// Attacker win rate (0.0 to 1.0).
    #[must_use]
    pub fn attacker_win_rate(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.attacker_wins) / f64::from(self.total_battles)
    }

    /// Defender hold rate (0.0 to 1.0).
    #[must_use]
    pub fn defender_win_rate(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.defender_wins) / f64::from(self.total_battles)
    }

    /// Check if the matchup is balanced (attacker rate within range).
    #[must_use]
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.attacker_win_rate();
        rate >= min_rate && rate <= max_rate
    }
}

/// Forces and temple bonuses for a simulated battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Matchup {
    /// Attacking soldiers.
    pub attackers: u32,
    /// Defending soldiers.
    pub defenders: u32,
    /// Fire bonus of the attacking region's temple.
    pub fire_bonus: u32,
    /// Earth bonus of the defending region's temple.
    pub earth_bonus: u32,
}

impl Matchup {
    /// Plain dice battle with no temple bonuses.
    #[must_use]
    pub const fn new(attackers: u32, defenders: u32) -> Self {
        Self {
            attackers,
            defenders,
            fire_bonus: 0,
            earth_bonus: 0,
        }
    }

    /// Add temple bonuses.
    #[must_use]
    pub const fn with_temples(mut self, fire_bonus: u32, earth_bonus: u32) -> Self {
        self.fire_bonus = fire_bonus;
        self.earth_bonus = earth_bonus;
        self
    }
}

/// Fight `matchup` once per seed `"{seed_prefix}-{i}"` and aggregate.
#[must_use]
pub fn simulate_battles(matchup: Matchup, trials: u32, seed_prefix: &str) -> BattleStats {
    let battle = Battle::default().with_temples(matchup.fire_bonus, matchup.earth_bonus);
    let mut stats = BattleStats {
        total_battles: trials,
        ..BattleStats::default()
    };
    let mut rounds = 0u64;
    let mut attacker_losses = 0u64;
    let mut defender_losses = 0u64;

    for i in 0..trials {
        let mut rng = DeterministicRng::new(&format!("{seed_prefix}-{i}"));
        let report = battle.fight(&mut rng, matchup.attackers, matchup.defenders);
        if report.attacker_won() {
            stats.attacker_wins += 1;
        } else if report.mutual_destruction() {
            stats.mutual_destruction += 1;
        } else {
            stats.defender_wins += 1;
        }
        rounds += report.rounds.len() as u64;
        attacker_losses += u64::from(report.attacker_losses());
        defender_losses += u64::from(report.defender_losses());
    }

    if trials > 0 {
        let n = f64::from(trials);
        stats.avg_rounds = rounds as f64 / n;
        stats.avg_attacker_losses = attacker_losses as f64 / n;
        stats.avg_defender_losses = defender_losses as f64 / n;
    }

    debug!(
        attackers = matchup.attackers,
        defenders = matchup.defenders,
        win_rate = stats.attacker_win_rate(),
        "Battle odds simulated"
    );
    stats
}

/// Attacker win rates for every force pair up to the given sizes.
///
/// Rows are attackers `1..=max_attackers`, columns defenders
/// `1..=max_defenders`.
#[must_use]
pub fn odds_table(max_attackers: u32, max_defenders: u32, trials: u32) -> Vec<Vec<f64>> {
    (1..=max_attackers)
        .map(|a| {
            (1..=max_defenders)
                .map(|d| simulate_battles(Matchup::new(a, d), trials, &format!("odds-{a}v{d}")).attacker_win_rate())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_account_for_every_battle() {
        let stats = simulate_battles(Matchup::new(5, 5), 200, "sum");
        assert_eq!(
            stats.attacker_wins + stats.defender_wins + stats.mutual_destruction,
            200
        );
        assert!(stats.avg_rounds >= 1.0);
    }

    #[test]
    fn test_simulation_is_reproducible() {
        let a = simulate_battles(Matchup::new(6, 4), 100, "repeat");
        let b = simulate_battles(Matchup::new(6, 4), 100, "repeat");
        assert_eq!(a.attacker_wins, b.attacker_wins);
        assert_eq!(a.defender_wins, b.defender_wins);
    }

    #[test]
    fn test_lone_attacker_against_garrison_rarely_wins() {
        let stats = simulate_battles(Matchup::new(1, 5), 300, "lone");
        assert!(stats.attacker_win_rate() < 0.05, "{stats:?}");
    }

    #[test]
    fn test_overwhelming_force_wins() {
        let stats = simulate_battles(Matchup::new(20, 2), 300, "swarm");
        assert!(stats.attacker_win_rate() > 0.95, "{stats:?}");
    }

    #[test]
    fn test_fire_temple_wipes_small_garrison() {
        // Fire strikes before dice: a bonus at least the garrison size wins outright.
        let stats = simulate_battles(Matchup::new(2, 2).with_temples(2, 0), 50, "fire");
        assert_eq!(stats.attacker_wins, 50);
        assert!(stats.avg_rounds.abs() < f64::EPSILON);
    }

    #[test]
    fn test_earth_temple_favors_defender() {
        let plain = simulate_battles(Matchup::new(6, 3), 300, "earth");
        let walled = simulate_battles(Matchup::new(6, 3).with_temples(0, 3), 300, "earth");
        assert!(walled.attacker_win_rate() < plain.attacker_win_rate());
    }

    #[test]
    fn test_odds_grow_with_attackers() {
        let table = odds_table(8, 2, 200);
        assert_eq!(table.len(), 8);
        assert!(table[7][0] > table[0][0]);
        assert!(table[7][1] > table[0][1]);
    }

    #[test]
    fn test_empty_stats_are_neutral() {
        let stats = BattleStats::default();
        assert!((stats.attacker_win_rate() - 0.5).abs() < f64::EPSILON);
        assert!(stats.is_balanced(0.4, 0.6));
    }
}
