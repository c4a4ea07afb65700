use tracing::info;

use super::end_turn::rotate;
use super::settle_eliminations;
use crate::error::Result;
use crate::player::PlayerSlot;
use crate::state::GameState;

pub(super) fn validate(state: &GameState, player: PlayerSlot) -> Vec<String> {
    let mut reasons = Vec::new();
    if state.is_game_over() {
        reasons.push("Game is already over".to_string());
    }
    if state.player(player).is_none() {
        reasons.push(format!("Unknown player slot {player}"));
    } else if state.is_eliminated(player) {
        reasons.push(format!("Player {player} has been eliminated"));
    }
    reasons
}

pub(super) fn execute(state: &mut GameState, player: PlayerSlot) -> Result<()> {
    let regions = state.regions_owned_by(player);
    for &region in &regions {
        state.set_region_owner(region, None);
        state.reset_temple(region);
    }
    state.mark_eliminated(player);
    info!(player, abandoned = regions.len(), "Player resigned");

    if settle_eliminations(state) {
        return Ok(());
    }
    if state.current_player() == player {
        rotate(state)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::command::{Command, CommandProcessor};
    use crate::map::MapData;
    use crate::player::Player;
    use crate::rules::Rules;
    use crate::state::EndResult;
    use crate::temple::UpgradeKind;

    fn three_players() -> GameState {
        three_players_with(Rules::default())
    }

    fn three_players_with(rules: Rules) -> GameState {
        let map = MapData::from_edges(
            &[("A", (0, 0), true), ("B", (1, 0), true), ("C", (2, 0), true)],
            &[(0, 1), (1, 2), (2, 0)],
        )
        .unwrap();
        let roster = (0..3).map(|s| Player::human(s, format!("P{s}"))).collect();
        let mut state = GameState::blank(Arc::new(map), Arc::new(rules), roster, "resign");
        for slot in 0..3u8 {
            state.set_region_owner(usize::from(slot), Some(slot));
            state.add_soldiers(usize::from(slot), 2);
        }
        state.set_moves_remaining(3);
        state
    }

    fn resign(state: &GameState, player: PlayerSlot) -> GameState {
        CommandProcessor::new()
            .process(state, Command::Resign { player })
            .unwrap()
            .into_state()
    }

    #[test]
    fn test_resign_leaves_neutral_garrison() {
        let mut state = three_players();
        state.temple_mut(1).unwrap().apply_upgrade(UpgradeKind::Fire);
        let next = resign(&state, 1);
        assert!(next.is_eliminated(1));
        assert_eq!(next.region_owner(1), None);
        assert_eq!(next.soldier_count(1), 2);
        assert!(next.temple(1).unwrap().is_basic());
        assert_eq!(next.current_player(), 0);
        assert_eq!(next.moves_remaining(), 3);
    }

    #[test]
    fn test_current_player_resign_rotates() {
        let state = three_players();
        let next = resign(&state, 0);
        assert_eq!(next.current_player(), 1);
        assert!(!next.is_game_over());
    }

    #[test]
    fn test_lowest_slot_resign_does_not_close_round() {
        let rules = Rules {
            max_turns: Some(1),
            ..Rules::default()
        };
        let next = resign(&three_players_with(rules), 0);
        assert_eq!(next.current_player(), 1);
        assert_eq!(next.turn(), 0);
        assert!(!next.is_game_over());
        assert_eq!(next.moves_remaining(), next.moves_for_turn(1));

        let processor = CommandProcessor::new();
        let next = processor
            .process(&next, Command::EndTurn { player: 1 })
            .unwrap()
            .into_state();
        assert_eq!(next.current_player(), 2);
        assert_eq!(next.turn(), 0);
        assert!(!next.is_game_over());

        let last = processor
            .process(&next, Command::EndTurn { player: 2 })
            .unwrap()
            .into_state();
        assert_eq!(last.turn(), 1);
        assert!(last.is_game_over());
    }

    #[test]
    fn test_resign_to_last_survivor_ends_game() {
        let state = three_players();
        let next = resign(&resign(&state, 2), 1);
        assert_eq!(next.end_result(), EndResult::Winner(0));
        assert_eq!(next.moves_remaining(), 0);
    }

    #[test]
    fn test_eliminated_player_cannot_resign_twice() {
        let state = resign(&three_players(), 2);
        let reasons = Command::Resign { player: 2 }.validate(&state);
        assert_eq!(reasons, vec!["Player 2 has been eliminated".to_string()]);
    }
}
