//! Computer players.
//!
//! An [`AiPolicy`] picks at most one command for the player whose turn it
//! is. [`TurnProcessor`] drives policies through the [`CommandProcessor`]
//! until a human is to move, the game ends or the safety limit trips.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::combat::BattleReport;
use crate::command::{Command, CommandProcessor, CommandRecord, Executed};
use crate::error::{GameError, Result};
use crate::map::RegionId;
use crate::player::{Player, PlayerSlot};
use crate::state::GameState;

/// Chooses the next command for a computer player.
pub trait AiPolicy {
    /// A command for `player` in `state`, or `None` to end the turn.
    fn choose(&self, state: &GameState, player: &Player) -> Option<Command>;
}

/// How much a [`HeuristicPolicy`] must outnumber a garrison before moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Temperament {
    /// Attack whenever the army is strictly larger.
    #[default]
    Aggressive,
    /// Attack only with at least twice the defenders.
    Cautious,
}

impl Temperament {
    const fn is_favorable(self, attackers: u32, defenders: u32) -> bool {
        match self {
            Self::Aggressive => attackers > defenders,
            Self::Cautious => attackers >= defenders.saturating_mul(2),
        }
    }
}

/// Greedy single-move policy: the best attack on an adjacent enemy, else
/// the best expansion into an adjacent neutral region, else nothing.
///
/// Armies leave one soldier behind when they can. Candidates are ranked by
/// how far the army outnumbers the garrison; ties go to the lowest source,
/// then the lowest destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeuristicPolicy {
    temperament: Temperament,
}

impl HeuristicPolicy {
    /// Policy with an explicit temperament.
    #[must_use]
    pub const fn new(temperament: Temperament) -> Self {
        Self { temperament }
    }

    /// Policy for a personality tag. `"cautious"` is careful; anything
    /// else, including no tag, is aggressive.
    #[must_use]
    pub fn for_personality(tag: Option<&str>) -> Self {
        match tag.map(str::to_ascii_lowercase).as_deref() {
            Some("cautious") => Self::new(Temperament::Cautious),
            _ => Self::new(Temperament::Aggressive),
        }
    }

    /// The temperament in use.
    #[must_use]
    pub const fn temperament(&self) -> Temperament {
        self.temperament
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    from: RegionId,
    to: RegionId,
    count: u32,
    margin: u32,
}

impl AiPolicy for HeuristicPolicy {
    fn choose(&self, state: &GameState, player: &Player) -> Option<Command> {
        let slot = player.slot;
        if state.is_game_over() || state.current_player() != slot || state.moves_remaining() == 0 {
            return None;
        }

        let mut best_attack: Option<Candidate> = None;
        let mut best_expansion: Option<Candidate> = None;

        for from in state.regions_owned_by(slot) {
            if state.conquered_regions().contains(&from) {
                continue;
            }
            let available = state.soldier_count(from);
            if available == 0 {
                continue;
            }
            let count = if available > 1 { available - 1 } else { available };

            for &to in state.map().neighbors(from) {
                let owner = state.region_owner(to);
                if owner == Some(slot) {
                    continue;
                }
                let defenders = state.soldier_count(to);
                if defenders > 0 && !self.temperament.is_favorable(count, defenders) {
                    continue;
                }
                let candidate = Candidate {
                    from,
                    to,
                    count,
                    margin: count - defenders,
                };
                let best = if owner.is_some() {
                    &mut best_attack
                } else {
                    &mut best_expansion
                };
                // Regions and neighbours are visited in ascending order, so
                // a strict comparison keeps the lowest ids on ties.
                if best.map_or(true, |b| candidate.margin > b.margin) {
                    *best = Some(candidate);
                }
            }
        }

        let pick = best_attack.or(best_expansion)?;
        debug!(
            player = slot,
            from = pick.from,
            to = pick.to,
            count = pick.count,
            margin = pick.margin,
            "AI move chosen"
        );
        Some(Command::MoveArmy {
            player: slot,
            from: pick.from,
            to: pick.to,
            count: pick.count,
        })
    }
}

/// Why [`TurnProcessor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    /// A human player is to move.
    HumanTurn,
    /// The game has ended.
    GameOver,
    /// The end-turn safety limit was reached.
    TurnLimit,
}

/// Everything an AI run produced.
#[derive(Debug, Clone)]
pub struct AiRun {
    /// State after the last processed command.
    pub state: GameState,
    /// Every processed command, in order.
    pub records: Vec<CommandRecord>,
    /// Battles fought, in order.
    pub battles: Vec<BattleReport>,
    /// Why the run stopped.
    pub stop: StopReason,
}

/// Drives computer players through the command processor.
pub struct TurnProcessor {
    processor: CommandProcessor,
    policy: Option<Box<dyn AiPolicy + Send + Sync>>,
    turn_limit: Option<u32>,
    actions_per_turn: Option<u32>,
}

impl Default for TurnProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TurnProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnProcessor")
            .field("processor", &self.processor)
            .field("custom_policy", &self.policy.is_some())
            .field("turn_limit", &self.turn_limit)
            .field("actions_per_turn", &self.actions_per_turn)
            .finish()
    }
}

impl TurnProcessor {
    /// Processor that picks each player's policy from their personality and
    /// takes its limits from the game rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            processor: CommandProcessor::new(),
            policy: None,
            turn_limit: None,
            actions_per_turn: None,
        }
    }

    /// Use one policy for every computer player.
    #[must_use]
    pub fn with_policy(mut self, policy: impl AiPolicy + Send + Sync + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Override the rules' end-turn limit.
    #[must_use]
    pub fn with_turn_limit(mut self, limit: u32) -> Self {
        self.turn_limit = Some(limit);
        self
    }

    /// Override the rules' per-turn action cap.
    #[must_use]
    pub fn with_actions_per_turn(mut self, cap: u32) -> Self {
        self.actions_per_turn = Some(cap);
        self
    }

    /// Use a specific command processor.
    #[must_use]
    pub fn with_processor(mut self, processor: CommandProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Play computer turns starting from `state`.
    ///
    /// Each iteration consumes the current state and produces the next. A
    /// move the policy proposes but validation rejects is replaced by an
    /// end-turn.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownPlayer`] if the current slot has no seat,
    /// or any non-rejection error from the processor.
    pub fn run(&self, state: GameState) -> Result<AiRun> {
        let turn_limit = self.turn_limit.unwrap_or(state.rules().ai_turn_limit);
        let actions_cap = self.actions_per_turn.unwrap_or(state.rules().ai_actions_per_turn);

        let mut state = state;
        let mut records = Vec::new();
        let mut battles = Vec::new();
        let mut end_turns = 0u32;
        let mut actions = 0u32;

        let stop = loop {
            if state.is_game_over() {
                break StopReason::GameOver;
            }
            let slot = state.current_player();
            let player = state.player(slot).ok_or(GameError::UnknownPlayer(slot))?.clone();
            if !player.is_ai {
                break StopReason::HumanTurn;
            }
            if end_turns >= turn_limit {
                warn!(turn_limit, turn = state.turn(), "AI turn limit reached");
                break StopReason::TurnLimit;
            }

            let proposal = if actions < actions_cap {
                self.choose(&state, &player)
            } else {
                warn!(player = slot, actions, "AI action cap reached, ending turn");
                None
            };

            let executed = match proposal {
                Some(command) => match self.processor.process(&state, command) {
                    Ok(executed) => {
                        actions += 1;
                        executed
                    }
                    Err(err) if err.is_rejection() => {
                        warn!(player = slot, error = %err, "AI move rejected, ending turn");
                        self.end_turn(&state, slot)?
                    }
                    Err(err) => return Err(err),
                },
                None => self.end_turn(&state, slot)?,
            };

            if matches!(executed.command(), Command::EndTurn { .. }) {
                end_turns += 1;
                actions = 0;
            }
            records.push(executed.record());
            let (next, battle) = executed.into_parts();
            battles.extend(battle);
            state = next;
        };

        info!(
            stop = ?stop,
            commands = records.len(),
            battles = battles.len(),
            turn = state.turn(),
            result = ?state.end_result(),
            "AI run finished"
        );

        Ok(AiRun {
            state,
            records,
            battles,
            stop,
        })
    }

    fn choose(&self, state: &GameState, player: &Player) -> Option<Command> {
        match &self.policy {
            Some(policy) => policy.choose(state, player),
            None => HeuristicPolicy::for_personality(player.ai_personality.as_deref())
                .choose(state, player),
        }
    }

    fn end_turn(&self, state: &GameState, player: PlayerSlot) -> Result<Executed> {
        self.processor.process(state, Command::EndTurn { player })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::map::MapData;
    use crate::rules::Rules;

    /// 0 - 1 - 2 - 3, player 0 on the left, player 1 on the right.
    fn lane(a: u32, b: u32, ai_both: bool) -> GameState {
        let map = MapData::from_edges(
            &[
                ("Left", (0, 0), true),
                ("MidL", (1, 0), false),
                ("MidR", (2, 0), false),
                ("Right", (3, 0), true),
            ],
            &[(0, 1), (1, 2), (2, 3)],
        )
        .unwrap();
        let second = if ai_both {
            Player::ai(1, "B", None)
        } else {
            Player::human(1, "B")
        };
        let mut state = GameState::blank(
            Arc::new(map),
            Arc::new(Rules::default()),
            vec![Player::ai(0, "A", None), second],
            "ai",
        );
        state.set_region_owner(0, Some(0));
        state.add_soldiers(0, a);
        state.set_region_owner(3, Some(1));
        state.add_soldiers(3, b);
        state.set_moves_remaining(3);
        state
    }

    #[test]
    fn test_personality_tags() {
        assert_eq!(
            HeuristicPolicy::for_personality(Some("Cautious")).temperament(),
            Temperament::Cautious
        );
        assert_eq!(
            HeuristicPolicy::for_personality(Some("berserk")).temperament(),
            Temperament::Aggressive
        );
        assert_eq!(HeuristicPolicy::for_personality(None), HeuristicPolicy::default());
    }

    #[test]
    fn test_expands_leaving_one_behind() {
        let state = lane(4, 1, false);
        let player = state.player(0).unwrap().clone();
        let command = HeuristicPolicy::default().choose(&state, &player);
        assert_eq!(
            command,
            Some(Command::MoveArmy {
                player: 0,
                from: 0,
                to: 1,
                count: 3
            })
        );
    }

    #[test]
    fn test_prefers_attack_over_expansion() {
        // Player 0 holds only region 1: a weak neutral garrison on one side,
        // a stronger enemy on the other.
        let mut state = lane(1, 1, false);
        state.set_region_owner(0, None);
        state.set_region_owner(1, Some(0));
        state.add_soldiers(1, 5);
        state.set_region_owner(2, Some(1));
        state.add_soldiers(2, 2);
        let player = state.player(0).unwrap().clone();
        let command = HeuristicPolicy::default().choose(&state, &player).unwrap();
        assert_eq!(
            command,
            Command::MoveArmy {
                player: 0,
                from: 1,
                to: 2,
                count: 4
            }
        );
    }

    #[test]
    fn test_cautious_needs_double() {
        let mut state = lane(4, 1, false);
        state.set_region_owner(1, Some(1));
        state.add_soldiers(1, 2);
        let player = state.player(0).unwrap().clone();
        // Three dispatched against two: aggressive goes, cautious holds.
        assert!(HeuristicPolicy::new(Temperament::Aggressive)
            .choose(&state, &player)
            .is_some());
        assert!(HeuristicPolicy::new(Temperament::Cautious)
            .choose(&state, &player)
            .is_none());
    }

    #[test]
    fn test_no_move_when_out_of_moves() {
        let mut state = lane(4, 1, false);
        state.set_moves_remaining(0);
        let player = state.player(0).unwrap().clone();
        assert!(HeuristicPolicy::default().choose(&state, &player).is_none());
    }

    #[test]
    fn test_run_stops_at_human_turn() {
        let state = lane(3, 1, false);
        let run = TurnProcessor::new().run(state).unwrap();
        assert_eq!(run.stop, StopReason::HumanTurn);
        assert_eq!(run.state.current_player(), 1);
        assert!(matches!(
            run.records.last().map(|r| &r.command),
            Some(Command::EndTurn { player: 0 })
        ));
    }

    #[test]
    fn test_run_respects_turn_limit() {
        let state = lane(1, 1, true);
        let run = TurnProcessor::new().with_turn_limit(4).run(state).unwrap();
        assert_eq!(run.stop, StopReason::TurnLimit);
        let end_turns = run
            .records
            .iter()
            .filter(|r| matches!(r.command, Command::EndTurn { .. }))
            .count();
        assert_eq!(end_turns, 4);
    }

    #[test]
    fn test_all_ai_game_terminates() {
        let state = lane(3, 3, true);
        let run = TurnProcessor::new().run(state).unwrap();
        assert_ne!(run.stop, StopReason::HumanTurn);
        if run.stop == StopReason::GameOver {
            assert!(run.state.is_game_over());
        }
    }

    struct Stubborn;

    impl AiPolicy for Stubborn {
        fn choose(&self, _state: &GameState, player: &Player) -> Option<Command> {
            // Always illegal: region 3 is never adjacent to region 0.
            Some(Command::MoveArmy {
                player: player.slot,
                from: 0,
                to: 3,
                count: 1,
            })
        }
    }

    #[test]
    fn test_rejected_move_becomes_end_turn() {
        let state = lane(3, 1, false);
        let run = TurnProcessor::new().with_policy(Stubborn).run(state).unwrap();
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.records[0].command, Command::EndTurn { player: 0 });
    }
}
