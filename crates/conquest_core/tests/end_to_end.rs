//! Whole-game scenarios driven through the command processor.

use conquest_core::prelude::*;
use conquest_test_utils::fixtures::{duel_state, play};

fn strike(state: &GameState) -> Result<Executed> {
    CommandProcessor::new().with_invariant_checks(true).process(
        state,
        Command::MoveArmy {
            player: 0,
            from: 1,
            to: 2,
            count: 3,
        },
    )
}

#[test]
fn test_duel_strike_ends_game_when_defender_falls() {
    let mut wins = 0;
    for i in 0..40 {
        let start = duel_state(&format!("duel-{i}"));
        let executed = strike(&start).unwrap();
        let battle = executed.battle().expect("defended region triggers combat").clone();
        let state = executed.state();

        assert!(!battle.rounds.is_empty() && battle.rounds.len() <= 3);

        if battle.attacker_won() {
            wins += 1;
            assert_eq!(state.region_owner(2), Some(0));
            assert_eq!(state.soldier_count(2), battle.attackers_left);
            assert_eq!(state.soldier_count(1), 0);
            assert!(state.is_eliminated(1));
            assert_eq!(state.end_result(), EndResult::Winner(0));
            assert!(state.is_game_over());
            // The game ended on this move, which closes the turn.
            assert_eq!(state.moves_remaining(), 0);
            assert!(state.conquered_regions().is_empty());
        } else {
            assert_eq!(state.moves_remaining(), start.moves_remaining() - 1);
            assert_eq!(state.region_owner(2), Some(1));
            assert_eq!(state.soldier_count(2), 1);
            assert_eq!(state.soldier_count(1), 0);
            assert!(!state.is_game_over());
        }
    }
    // Three attackers against one defender lose only on three straight defender wins.
    assert!(wins >= 28, "attacker won only {wins} of 40 duels");
}

#[test]
fn test_finished_game_rejects_everything() {
    let finished = (0..40)
        .map(|i| duel_state(&format!("over-{i}")))
        .find_map(|start| {
            let state = strike(&start).unwrap().into_state();
            state.is_game_over().then_some(state)
        })
        .expect("some seed lets the attacker through");

    for command in [
        Command::EndTurn { player: 0 },
        Command::MoveArmy {
            player: 0,
            from: 0,
            to: 1,
            count: 1,
        },
        Command::Build {
            player: 0,
            region: 0,
            action: BuildAction::RecruitSoldier,
        },
    ] {
        let err = CommandProcessor::new().process(&finished, command).unwrap_err();
        assert!(err.is_rejection());
        assert!(err.to_string().contains("Game is already over"), "{err}");
    }
    assert_eq!(finished.moves_remaining(), 0);
}

#[test]
fn test_undo_restores_pre_battle_state() {
    let start = duel_state("undo");
    let executed = strike(&start).unwrap();
    assert_ne!(executed.state(), &start);
    assert_eq!(executed.undo(), start);
}

#[test]
fn test_rejected_command_reports_all_reasons() {
    let start = duel_state("reasons");
    let err = CommandProcessor::new()
        .process(
            &start,
            Command::MoveArmy {
                player: 0,
                from: 0,
                to: 2,
                count: 9,
            },
        )
        .unwrap_err();
    let GameError::CommandRejected { reasons } = err else {
        panic!("expected a rejection, got {err:?}");
    };
    assert_eq!(reasons.len(), 2, "{reasons:?}");
    assert!(reasons.iter().any(|r| r.contains("only 2 there")));
    assert!(reasons.iter().any(|r| r.contains("not adjacent")));
}

#[test]
fn test_consolidate_then_pass() {
    let start = duel_state("consolidate");
    let states = play(
        &start,
        &[
            Command::MoveArmy {
                player: 0,
                from: 0,
                to: 1,
                count: 2,
            },
            Command::EndTurn { player: 0 },
        ],
    );
    let after_move = &states[0];
    assert_eq!(after_move.soldier_count(0), 0);
    assert_eq!(after_move.soldier_count(1), 5);
    assert_eq!(after_move.region_owner(0), Some(0));
    assert!(after_move.conquered_regions().is_empty());

    let after_end = &states[1];
    assert_eq!(after_end.current_player(), 1);
    // Region 0 holds a temple: one faith payment and one new soldier.
    assert_eq!(after_end.faith(0), start.rules().faith_per_temple);
    assert_eq!(after_end.soldier_count(0), 1);
}

#[test]
fn test_final_score_matches_formula() {
    let start = duel_state("score");
    let line = ScoreCalculator::line(&start, 0);
    assert_eq!(line.regions, 2);
    assert_eq!(line.soldiers, 5);
    assert_eq!(line.score, 2050);
    assert_eq!(ScoreCalculator::standings(&start)[0].slot, 0);
}
