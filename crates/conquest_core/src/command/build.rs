use tracing::{debug, error};

use super::{check_turn, BuildAction};
use crate::error::{GameError, Result};
use crate::map::RegionId;
use crate::player::PlayerSlot;
use crate::state::GameState;
use crate::temple::UpgradeKind;

/// Faith cost of `action` at `region`, `None` if the action is impossible
/// there (no temple, nothing to rebuild, upgrade already maxed).
#[must_use]
pub fn build_cost(state: &GameState, region: RegionId, action: BuildAction) -> Option<u32> {
    let temple = state.temple(region)?;
    match action {
        BuildAction::RecruitSoldier => Some(state.soldier_purchase_cost()),
        BuildAction::Rebuild => (!temple.is_basic()).then_some(0),
        BuildAction::Upgrade(kind) => temple.upgrade_cost(kind),
    }
}

pub(super) fn validate(
    state: &GameState,
    player: PlayerSlot,
    region: RegionId,
    action: BuildAction,
) -> Vec<String> {
    let mut reasons = Vec::new();
    check_turn(state, player, &mut reasons);

    if region >= state.region_count() {
        reasons.push(format!("Unknown region {region}"));
        return reasons;
    }
    if !state.is_owned_by(region, player) {
        reasons.push(format!("Region {region} is not owned by player {player}"));
    }
    let Some(temple) = state.temple(region) else {
        reasons.push(format!("Region {region} has no temple"));
        return reasons;
    };

    match build_cost(state, region, action) {
        Some(cost) => {
            let faith = state.faith(player);
            if faith < cost {
                reasons.push(format!("Not enough faith: need {cost}, have {faith}"));
            }
        }
        None => match action {
            BuildAction::Rebuild => {
                reasons.push(format!("Temple in region {region} has no upgrade to rebuild"));
            }
            BuildAction::Upgrade(kind) => reasons.push(format!(
                "{kind} temple in region {region} is already at level {}",
                temple.level
            )),
            BuildAction::RecruitSoldier => {}
        },
    }

    reasons
}

pub(super) fn execute(
    state: &mut GameState,
    player: PlayerSlot,
    region: RegionId,
    action: BuildAction,
) -> Result<()> {
    let cost = build_cost(state, region, action)
        .ok_or_else(|| invariant(format!("Build {action:?} at region {region} has no price")))?;
    if !state.subtract_faith(player, cost) {
        return Err(invariant(format!(
            "Player {player} cannot pay {cost} faith after validation"
        )));
    }

    match action {
        BuildAction::RecruitSoldier => {
            state.record_soldier_bought();
            state.add_soldiers(region, 1);
        }
        BuildAction::Rebuild => state.reset_temple(region),
        BuildAction::Upgrade(kind) => {
            let level = state
                .temple_mut(region)
                .and_then(|t| t.apply_upgrade(kind))
                .ok_or_else(|| invariant(format!("Upgrade {kind} at region {region} failed")))?;
            // The new level's whole bonus applies this turn, not the step.
            if kind == UpgradeKind::Air {
                let moves = state.moves_remaining() + kind.bonus(level);
                state.set_moves_remaining(moves);
            }
        }
    }

    debug!(player, region, action = ?action, cost, faith = state.faith(player), "Temple build");
    Ok(())
}

fn invariant(message: String) -> GameError {
    error!(%message, "Build invariant violated");
    GameError::InvariantViolation(message)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::command::{Command, CommandProcessor};
    use crate::map::MapData;
    use crate::player::Player;
    use crate::rules::Rules;

    fn state_with_faith(faith: u32) -> GameState {
        let map = MapData::from_edges(
            &[("Shrine", (0, 0), true), ("Plain", (1, 0), false), ("Altar", (2, 0), true)],
            &[(0, 1), (1, 2)],
        )
        .unwrap();
        let mut state = GameState::blank(
            Arc::new(map),
            Arc::new(Rules::default()),
            vec![Player::human(0, "A"), Player::human(1, "B")],
            "build",
        );
        state.set_region_owner(0, Some(0));
        state.set_region_owner(1, Some(0));
        state.set_region_owner(2, Some(1));
        state.add_soldiers(0, 1);
        state.add_faith(0, faith);
        state.set_moves_remaining(3);
        state
    }

    fn build(region: RegionId, action: BuildAction) -> Command {
        Command::Build {
            player: 0,
            region,
            action,
        }
    }

    #[test]
    fn test_recruit_cost_increases_within_turn() {
        let processor = CommandProcessor::new();
        let mut state = state_with_faith(100);
        let mut paid = Vec::new();
        for _ in 0..4 {
            let before = state.faith(0);
            state = processor
                .process(&state, build(0, BuildAction::RecruitSoldier))
                .unwrap()
                .into_state();
            paid.push(before - state.faith(0));
        }
        assert_eq!(paid, vec![8, 9, 10, 12]);
        assert_eq!(state.soldier_count(0), 5);
        assert_eq!(state.soldiers_bought_this_turn(), 4);
    }

    #[test]
    fn test_insufficient_faith_rejected() {
        let state = state_with_faith(7);
        let reasons = build(0, BuildAction::RecruitSoldier).validate(&state);
        assert_eq!(reasons, vec!["Not enough faith: need 8, have 7".to_string()]);
    }

    #[test]
    fn test_region_without_temple_rejected() {
        let state = state_with_faith(100);
        let reasons = build(1, BuildAction::RecruitSoldier).validate(&state);
        assert_eq!(reasons, vec!["Region 1 has no temple".to_string()]);
    }

    #[test]
    fn test_enemy_temple_rejected() {
        let state = state_with_faith(100);
        let reasons = build(2, BuildAction::Upgrade(UpgradeKind::Water)).validate(&state);
        assert!(reasons.iter().any(|r| r.contains("not owned")));
    }

    #[test]
    fn test_upgrade_path_and_max_level() {
        let processor = CommandProcessor::new();
        let mut state = state_with_faith(200);
        for expected in [15, 25, 40] {
            let before = state.faith(0);
            state = processor
                .process(&state, build(0, BuildAction::Upgrade(UpgradeKind::Earth)))
                .unwrap()
                .into_state();
            assert_eq!(before - state.faith(0), expected);
        }
        assert_eq!(state.temple(0).unwrap().level, 2);

        let err = processor
            .process(&state, build(0, BuildAction::Upgrade(UpgradeKind::Earth)))
            .unwrap_err();
        assert!(err.to_string().contains("already at level 2"));
    }

    #[test]
    fn test_switching_kind_costs_level_zero() {
        let processor = CommandProcessor::new();
        let mut state = state_with_faith(200);
        for _ in 0..2 {
            state = processor
                .process(&state, build(0, BuildAction::Upgrade(UpgradeKind::Water)))
                .unwrap()
                .into_state();
        }
        let before = state.faith(0);
        state = processor
            .process(&state, build(0, BuildAction::Upgrade(UpgradeKind::Fire)))
            .unwrap()
            .into_state();
        assert_eq!(before - state.faith(0), 20);
        let temple = state.temple(0).unwrap();
        assert_eq!(temple.upgrade, Some(UpgradeKind::Fire));
        assert_eq!(temple.level, 0);
    }

    #[test]
    fn test_rebuild_is_free_and_requires_upgrade() {
        let processor = CommandProcessor::new();
        let state = state_with_faith(15);
        let reasons = build(0, BuildAction::Rebuild).validate(&state);
        assert_eq!(
            reasons,
            vec!["Temple in region 0 has no upgrade to rebuild".to_string()]
        );

        let upgraded = processor
            .process(&state, build(0, BuildAction::Upgrade(UpgradeKind::Water)))
            .unwrap()
            .into_state();
        assert_eq!(upgraded.faith(0), 0);
        let rebuilt = processor
            .process(&upgraded, build(0, BuildAction::Rebuild))
            .unwrap()
            .into_state();
        assert!(rebuilt.temple(0).unwrap().is_basic());
        assert_eq!(rebuilt.faith(0), 0);
    }

    #[test]
    fn test_air_upgrade_grants_moves_now() {
        let processor = CommandProcessor::new();
        let state = state_with_faith(55);
        let once = processor
            .process(&state, build(0, BuildAction::Upgrade(UpgradeKind::Air)))
            .unwrap()
            .into_state();
        // Level 0 grants 1 move now.
        assert_eq!(once.moves_remaining(), 4);
        let twice = processor
            .process(&once, build(0, BuildAction::Upgrade(UpgradeKind::Air)))
            .unwrap()
            .into_state();
        // Level 1 grants its whole bonus of 2 on top.
        assert_eq!(twice.moves_remaining(), 6);
        assert_eq!(twice.faith(0), 0);
    }

    #[test]
    fn test_build_cost_helper() {
        let state = state_with_faith(0);
        assert_eq!(build_cost(&state, 0, BuildAction::RecruitSoldier), Some(8));
        assert_eq!(build_cost(&state, 0, BuildAction::Rebuild), None);
        assert_eq!(build_cost(&state, 1, BuildAction::RecruitSoldier), None);
        assert_eq!(
            build_cost(&state, 0, BuildAction::Upgrade(UpgradeKind::Air)),
            Some(20)
        );
    }
}
