use tracing::{debug, error, info};

use super::{check_turn, conclude, settle_eliminations};
use crate::error::{GameError, Result};
use crate::player::PlayerSlot;
use crate::score::WinDetector;
use crate::state::GameState;

pub(super) fn validate(state: &GameState, player: PlayerSlot) -> Vec<String> {
    let mut reasons = Vec::new();
    check_turn(state, player, &mut reasons);
    reasons
}

pub(super) fn execute(state: &mut GameState, player: PlayerSlot) -> Result<()> {
    let income = state.income(player);
    state.add_faith(player, income);

    let temples: Vec<_> = state.temples_owned_by(player).iter().map(|t| t.region).collect();
    for &region in &temples {
        state.add_soldiers(region, 1);
    }
    debug!(player, income, produced = temples.len(), "Turn income collected");

    if settle_eliminations(state) {
        return Ok(());
    }
    rotate(state)
}

/// Hand the turn to the next active slot, completing a round when the
/// order wraps. Ends the game on score once the round limit is reached.
pub(super) fn rotate(state: &mut GameState) -> Result<()> {
    let current = state.current_player();
    let Some((next, wrapped)) = state.next_active_player(current) else {
        error!(current, "No active player to hand the turn to");
        return Err(GameError::InvariantViolation(format!(
            "No active player after slot {current}"
        )));
    };

    if wrapped {
        state.advance_turn_counter();
        info!(turn = state.turn(), "Round complete");
        if WinDetector::turn_limit_reached(state) {
            let result = WinDetector::by_score(state);
            conclude(state, result);
            return Ok(());
        }
    }

    state.set_current_player(next);
    state.set_moves_remaining(state.moves_for_turn(next));
    state.clear_turn_scoped();
    debug!(from = current, to = next, moves = state.moves_remaining(), "Turn passed");
    Ok(())
}
