//! Commands and the processor every mutation flows through.
//!
//! A [`Command`] is plain data. [`CommandProcessor::process`] validates it
//! against a state, applies it to a private clone and returns an
//! [`Executed`] holding both the new state and the one it replaced. The
//! input state is never touched, so a rejected or failed command leaves the
//! caller's state exactly as it was.

mod build;
mod end_turn;
mod move_army;
mod resign;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::combat::BattleReport;
use crate::error::{GameError, Result};
use crate::map::RegionId;
use crate::player::PlayerSlot;
use crate::score::WinDetector;
use crate::state::{EndResult, GameState};
use crate::temple::UpgradeKind;

pub use build::build_cost;

/// What to buy at a temple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildAction {
    /// One soldier, priced by how many were bought this turn.
    RecruitSoldier,
    /// Reset an upgraded temple to basic. Free.
    Rebuild,
    /// Buy the next level of an element, or level 0 of a new one.
    Upgrade(UpgradeKind),
}

/// A player action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Move soldiers to an adjacent region, fighting if it is defended.
    MoveArmy {
        /// Acting player.
        player: PlayerSlot,
        /// Source region.
        from: RegionId,
        /// Destination region.
        to: RegionId,
        /// Soldiers dispatched.
        count: u32,
    },
    /// Spend faith at a temple.
    Build {
        /// Acting player.
        player: PlayerSlot,
        /// Temple region.
        region: RegionId,
        /// What to buy.
        action: BuildAction,
    },
    /// Collect income, produce soldiers and pass the turn.
    EndTurn {
        /// Acting player.
        player: PlayerSlot,
    },
    /// Leave the game. Allowed at any time.
    Resign {
        /// Resigning player.
        player: PlayerSlot,
    },
}

impl Command {
    /// Acting player.
    #[must_use]
    pub const fn player(&self) -> PlayerSlot {
        match self {
            Self::MoveArmy { player, .. }
            | Self::Build { player, .. }
            | Self::EndTurn { player }
            | Self::Resign { player } => *player,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MoveArmy { .. } => "move_army",
            Self::Build { .. } => "build",
            Self::EndTurn { .. } => "end_turn",
            Self::Resign { .. } => "resign",
        }
    }

    /// Reasons this command cannot run against `state`; empty when valid.
    #[must_use]
    pub fn validate(&self, state: &GameState) -> Vec<String> {
        match *self {
            Self::MoveArmy {
                player,
                from,
                to,
                count,
            } => move_army::validate(state, player, from, to, count),
            Self::Build {
                player,
                region,
                action,
            } => build::validate(state, player, region, action),
            Self::EndTurn { player } => end_turn::validate(state, player),
            Self::Resign { player } => resign::validate(state, player),
        }
    }

    /// Whether the command would pass validation.
    #[must_use]
    pub fn is_valid(&self, state: &GameState) -> bool {
        self.validate(state).is_empty()
    }

    /// Serializable record of this command issued during `turn`.
    #[must_use]
    pub fn record(&self, turn: u32) -> CommandRecord {
        CommandRecord {
            turn,
            command: self.clone(),
        }
    }

    /// Apply to a state that has already passed validation.
    fn apply(&self, state: &mut GameState) -> Result<Option<BattleReport>> {
        match *self {
            Self::MoveArmy {
                player,
                from,
                to,
                count,
            } => Ok(move_army::execute(state, player, from, to, count)),
            Self::Build {
                player,
                region,
                action,
            } => build::execute(state, player, region, action).map(|()| None),
            Self::EndTurn { player } => end_turn::execute(state, player).map(|()| None),
            Self::Resign { player } => resign::execute(state, player).map(|()| None),
        }
    }
}

/// A command as stored in replays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Round in which the command was issued.
    pub turn: u32,
    /// The command.
    pub command: Command,
}

/// A successfully processed command.
///
/// Holds the state it produced and the state it replaced, so undo is only
/// reachable once a command has run.
#[derive(Debug, Clone)]
pub struct Executed {
    command: Command,
    state: GameState,
    battle: Option<BattleReport>,
    previous: GameState,
}

impl Executed {
    /// The command that ran.
    #[must_use]
    pub const fn command(&self) -> &Command {
        &self.command
    }

    /// State after the command.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// State before the command.
    #[must_use]
    pub const fn previous(&self) -> &GameState {
        &self.previous
    }

    /// Battle fought by the command, if any.
    #[must_use]
    pub const fn battle(&self) -> Option<&BattleReport> {
        self.battle.as_ref()
    }

    /// Replay record for the command.
    #[must_use]
    pub fn record(&self) -> CommandRecord {
        self.command.record(self.previous.turn())
    }

    /// Take the new state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Take the new state and the battle report.
    #[must_use]
    pub fn into_parts(self) -> (GameState, Option<BattleReport>) {
        (self.state, self.battle)
    }

    /// Discard the result and get back the state the command started from.
    #[must_use]
    pub fn undo(self) -> GameState {
        debug!(command = self.command.name(), "Command undone");
        self.previous
    }
}

/// The single entry point for changing a [`GameState`].
#[derive(Debug, Clone, Copy)]
pub struct CommandProcessor {
    check_invariants: bool,
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self {
            check_invariants: cfg!(any(debug_assertions, feature = "debug-validation")),
        }
    }
}

impl CommandProcessor {
    /// Processor with invariant checks on in debug builds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Force invariant checks after every command on or off.
    #[must_use]
    pub const fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Validate and execute `command` against `state`.
    ///
    /// # Errors
    ///
    /// - [`GameError::CommandRejected`] if validation fails; nothing changed.
    /// - [`GameError::InvariantViolation`] if execution broke the state.
    pub fn process(&self, state: &GameState, command: Command) -> Result<Executed> {
        let reasons = command.validate(state);
        if !reasons.is_empty() {
            debug!(command = ?command, reasons = ?reasons, "Command rejected");
            return Err(GameError::rejected(reasons));
        }

        let mut next = state.clone();
        let battle = command.apply(&mut next)?;

        if self.check_invariants {
            if let Err(err) = next.check_invariants() {
                error!(command = ?command, error = %err, "Command broke state invariants");
                return Err(err);
            }
        }

        debug!(
            command = command.name(),
            player = command.player(),
            turn = next.turn(),
            hash = format_args!("{:#018x}", next.state_hash()),
            "Command processed"
        );

        Ok(Executed {
            command,
            state: next,
            battle,
            previous: state.clone(),
        })
    }
}

/// Checks shared by every turn-bound command.
fn check_turn(state: &GameState, player: PlayerSlot, reasons: &mut Vec<String>) {
    if state.is_game_over() {
        reasons.push("Game is already over".to_string());
    }
    if state.player(player).is_none() {
        reasons.push(format!("Unknown player slot {player}"));
    } else if state.is_eliminated(player) {
        reasons.push(format!("Player {player} has been eliminated"));
    } else if state.current_player() != player {
        reasons.push(format!("It is not player {player}'s turn"));
    }
}

/// Eliminate players with no regions and end the game if at most one is
/// left. Returns whether the game is over.
fn settle_eliminations(state: &mut GameState) -> bool {
    for slot in state.refresh_eliminations() {
        info!(player = slot, turn = state.turn(), "Player eliminated");
    }
    if let Some(result) = WinDetector::by_elimination(state) {
        conclude(state, result);
    }
    state.is_game_over()
}

/// Record the outcome and close the current turn.
fn conclude(state: &mut GameState, result: EndResult) {
    if state.set_end_result(result) {
        info!(result = ?result, turn = state.turn(), "Game over");
    }
    state.clear_turn_scoped();
    state.set_moves_remaining(0);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::map::MapData;
    use crate::player::Player;
    use crate::rules::Rules;

    /// Player 0: region 0 (2 soldiers), region 1 (3). Player 1: region 2 (1).
    fn duel() -> GameState {
        let map = MapData::from_edges(
            &[("Home", (0, 0), true), ("Ford", (1, 0), false), ("Keep", (2, 0), true)],
            &[(0, 1), (1, 2)],
        )
        .unwrap();
        let mut state = GameState::blank(
            Arc::new(map),
            Arc::new(Rules::default()),
            vec![Player::human(0, "A"), Player::human(1, "B")],
            "duel",
        );
        state.set_region_owner(0, Some(0));
        state.set_region_owner(1, Some(0));
        state.set_region_owner(2, Some(1));
        state.add_soldiers(0, 2);
        state.add_soldiers(1, 3);
        state.add_soldiers(2, 1);
        state.set_moves_remaining(3);
        state
    }

    #[test]
    fn test_rejection_leaves_input_untouched() {
        let state = duel();
        let before = state.clone();
        let err = CommandProcessor::new()
            .process(&state, Command::EndTurn { player: 1 })
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(state, before);
    }

    #[test]
    fn test_rejection_collects_every_reason() {
        let state = duel();
        let reasons = Command::MoveArmy {
            player: 1,
            from: 0,
            to: 2,
            count: 9,
        }
        .validate(&state);
        assert!(reasons.len() >= 3, "{reasons:?}");
    }

    #[test]
    fn test_undo_returns_previous_state() {
        let state = duel();
        let executed = CommandProcessor::new()
            .process(
                &state,
                Command::MoveArmy {
                    player: 0,
                    from: 0,
                    to: 1,
                    count: 2,
                },
            )
            .unwrap();
        assert_eq!(executed.state().soldier_count(1), 5);
        assert_eq!(executed.previous(), &state);
        assert_eq!(executed.undo(), state);
    }

    #[test]
    fn test_record_uses_turn_of_issue() {
        let state = duel();
        let executed = CommandProcessor::new()
            .process(&state, Command::EndTurn { player: 0 })
            .unwrap();
        let record = executed.record();
        assert_eq!(record.turn, 0);
        assert_eq!(record.command, Command::EndTurn { player: 0 });
    }

    #[test]
    fn test_commands_rejected_after_game_over() {
        let mut state = duel();
        state.set_end_result(EndResult::Winner(0));
        let reasons = Command::EndTurn { player: 0 }.validate(&state);
        assert!(reasons.iter().any(|r| r.contains("over")));
    }

    #[test]
    fn test_player_accessor() {
        let cmd = Command::Build {
            player: 3,
            region: 0,
            action: BuildAction::RecruitSoldier,
        };
        assert_eq!(cmd.player(), 3);
        assert_eq!(cmd.name(), "build");
    }
}
