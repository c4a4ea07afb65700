//! Dice combat.
//!
//! [`BattleRound::resolve`] is one stateless exchange: the attacker rolls up
//! to three dice, the defender up to two, both sorted descending and compared
//! pairwise. A strictly higher attacker die kills a defender; anything else,
//! ties included, kills an attacker.
//!
//! [`Battle`] repeats rounds until one side is exhausted, after applying the
//! Fire/Earth opening strikes, and records every round for presentation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::rng::DeterministicRng;

/// Dice rolled by a full attacking force.
pub const ATTACKER_MAX_DICE: u32 = 3;

/// Dice rolled by a full defending force.
pub const DEFENDER_MAX_DICE: u32 = 2;

/// Default runaway guard for a single battle.
pub const DEFAULT_ROUND_CAP: u32 = 1000;

/// Result of a single exchange of dice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Attackers killed this round.
    pub attacker_losses: u32,
    /// Defenders killed this round.
    pub defender_losses: u32,
    /// Attacker dice, descending.
    pub attacker_rolls: Vec<u8>,
    /// Defender dice, descending.
    pub defender_rolls: Vec<u8>,
}

/// Single-round dice resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct BattleRound;

impl BattleRound {
    /// Resolve one round between `attackers` and `defenders`.
    ///
    /// Attacker dice are drawn before defender dice. A side with no units
    /// rolls nothing, so a round against an empty side has no casualties.
    pub fn resolve(rng: &mut DeterministicRng, attackers: u32, defenders: u32) -> RoundOutcome {
        let attacker_rolls = roll_sorted(rng, attackers.min(ATTACKER_MAX_DICE));
        let defender_rolls = roll_sorted(rng, defenders.min(DEFENDER_MAX_DICE));

        let mut attacker_losses = 0;
        let mut defender_losses = 0;
        for (a, d) in attacker_rolls.iter().zip(defender_rolls.iter()) {
            if a > d {
                defender_losses += 1;
            } else {
                attacker_losses += 1;
            }
        }

        RoundOutcome {
            attacker_losses,
            defender_losses,
            attacker_rolls,
            defender_rolls,
        }
    }
}

fn roll_sorted(rng: &mut DeterministicRng, count: u32) -> Vec<u8> {
    let mut rolls: Vec<u8> = (0..count).map(|_| rng.roll_die()).collect();
    rolls.sort_unstable_by(|a, b| b.cmp(a));
    rolls
}

/// One round as recorded for the replay stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: u32,
    /// Attacker dice, descending.
    pub attacker_rolls: Vec<u8>,
    /// Defender dice, descending.
    pub defender_rolls: Vec<u8>,
    /// Attackers killed this round.
    pub attacker_losses: u32,
    /// Defenders killed this round.
    pub defender_losses: u32,
    /// Attackers alive after the round.
    pub attackers_left: u32,
    /// Defenders alive after the round.
    pub defenders_left: u32,
}

/// Casualties inflicted by temple upgrades before any dice are rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OpeningStrikes {
    /// Defenders killed by a Fire temple in the attacking region.
    pub fire_casualties: u32,
    /// Attackers killed by an Earth temple in the defending region.
    pub earth_casualties: u32,
}

/// Full account of a battle, consumed by animation.
///
/// Not part of persisted game state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleReport {
    /// Attackers committed.
    pub attackers_start: u32,
    /// Defenders present.
    pub defenders_start: u32,
    /// Temple strikes before the first round.
    pub opening: OpeningStrikes,
    /// Every dice round in order.
    pub rounds: Vec<RoundRecord>,
    /// Surviving attackers.
    pub attackers_left: u32,
    /// Surviving defenders.
    pub defenders_left: u32,
    /// Whether the round cap stopped the battle early.
    pub hit_round_cap: bool,
}

impl BattleReport {
    /// Total attackers killed.
    #[must_use]
    pub const fn attacker_losses(&self) -> u32 {
        self.attackers_start - self.attackers_left
    }

    /// Total defenders killed.
    #[must_use]
    pub const fn defender_losses(&self) -> u32 {
        self.defenders_start - self.defenders_left
    }

    /// Whether the defenders were wiped out with attackers left standing.
    #[must_use]
    pub const fn attacker_won(&self) -> bool {
        self.defenders_left == 0 && self.attackers_left > 0
    }

    /// Whether both forces were wiped out.
    #[must_use]
    pub const fn mutual_destruction(&self) -> bool {
        self.defenders_left == 0 && self.attackers_left == 0
    }
}

/// Battle-to-completion driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battle {
    /// Maximum dice rounds before giving up.
    pub round_cap: u32,
    /// Fire bonus of the attacking region's temple.
    pub fire_bonus: u32,
    /// Earth bonus of the defending region's temple.
    pub earth_bonus: u32,
}

impl Default for Battle {
    fn default() -> Self {
        Self {
            round_cap: DEFAULT_ROUND_CAP,
            fire_bonus: 0,
            earth_bonus: 0,
        }
    }
}

impl Battle {
    /// A battle with no temple modifiers.
    #[must_use]
    pub const fn new(round_cap: u32) -> Self {
        Self {
            round_cap,
            fire_bonus: 0,
            earth_bonus: 0,
        }
    }

    /// Set the temple modifiers.
    #[must_use]
    pub const fn with_temples(mut self, fire_bonus: u32, earth_bonus: u32) -> Self {
        self.fire_bonus = fire_bonus;
        self.earth_bonus = earth_bonus;
        self
    }

    /// Fight until one side is exhausted or the round cap trips.
    pub fn fight(&self, rng: &mut DeterministicRng, attackers: u32, defenders: u32) -> BattleReport {
        // Opening strikes are simultaneous: both use the starting forces.
        let opening = OpeningStrikes {
            fire_casualties: self.fire_bonus.min(defenders),
            earth_casualties: self.earth_bonus.min(attackers),
        };
        let mut attackers_left = attackers - opening.earth_casualties;
        let mut defenders_left = defenders - opening.fire_casualties;

        let mut rounds = Vec::new();
        let mut round = 0;
        while attackers_left > 0 && defenders_left > 0 && round < self.round_cap {
            round += 1;
            let outcome = BattleRound::resolve(rng, attackers_left, defenders_left);
            attackers_left -= outcome.attacker_losses;
            defenders_left -= outcome.defender_losses;
            rounds.push(RoundRecord {
                round,
                attacker_rolls: outcome.attacker_rolls,
                defender_rolls: outcome.defender_rolls,
                attacker_losses: outcome.attacker_losses,
                defender_losses: outcome.defender_losses,
                attackers_left,
                defenders_left,
            });
        }

        let hit_round_cap = attackers_left > 0 && defenders_left > 0;
        if hit_round_cap {
            warn!(
                round_cap = self.round_cap,
                attackers_left, defenders_left, "Battle stopped at round cap"
            );
        }

        debug!(
            attackers,
            defenders,
            attackers_left,
            defenders_left,
            rounds = rounds.len(),
            "Battle resolved"
        );

        BattleReport {
            attackers_start: attackers,
            defenders_start: defenders,
            opening,
            rounds,
            attackers_left,
            defenders_left,
            hit_round_cap,
        }
    }
}
