use tracing::{debug, info};

use super::{check_turn, settle_eliminations};
use crate::combat::{Battle, BattleReport};
use crate::map::RegionId;
use crate::player::PlayerSlot;
use crate::state::GameState;
use crate::temple::UpgradeKind;

pub(super) fn validate(
    state: &GameState,
    player: PlayerSlot,
    from: RegionId,
    to: RegionId,
    count: u32,
) -> Vec<String> {
    let mut reasons = Vec::new();
    check_turn(state, player, &mut reasons);

    let regions = state.region_count();
    if from >= regions {
        reasons.push(format!("Unknown region {from}"));
    }
    if to >= regions {
        reasons.push(format!("Unknown region {to}"));
    }
    if from >= regions || to >= regions {
        return reasons;
    }

    if !state.is_owned_by(from, player) {
        reasons.push(format!("Region {from} is not owned by player {player}"));
    }
    if count == 0 {
        reasons.push("Must move at least one soldier".to_string());
    }
    let available = state.soldier_count(from);
    if count > available {
        reasons.push(format!(
            "Cannot move {count} soldiers from region {from}, only {available} there"
        ));
    }
    if !state.map().are_adjacent(from, to) {
        reasons.push(format!("Region {to} is not adjacent to region {from}"));
    }
    if state.conquered_regions().contains(&from) {
        reasons.push(format!(
            "Army in region {from} conquered this turn and cannot move again"
        ));
    }
    if state.moves_remaining() == 0 {
        reasons.push("No moves remaining".to_string());
    }

    reasons
}

pub(super) fn execute(
    state: &mut GameState,
    player: PlayerSlot,
    from: RegionId,
    to: RegionId,
    count: u32,
) -> Option<BattleReport> {
    let previous_owner = state.region_owner(to);
    let defenders = state.soldier_count(to);

    if previous_owner == Some(player) {
        state.transfer_soldiers(from, to, count);
        debug!(player, from, to, count, "Army consolidated");
        state.consume_move();
        return None;
    }

    let mut report = None;
    let mut survivors = count;
    if defenders > 0 {
        let fire = state.temple(from).map_or(0, |t| t.bonus_for(UpgradeKind::Fire));
        let earth = state.temple(to).map_or(0, |t| t.bonus_for(UpgradeKind::Earth));
        let battle = Battle::new(state.rules().combat_round_cap).with_temples(fire, earth);
        let outcome = battle.fight(state.rng_mut(), count, defenders);

        // Casualties come off the end of each list; the attackers at the
        // end of the source list are the ones dispatched.
        state.remove_soldiers(from, outcome.attacker_losses());
        state.remove_soldiers(to, outcome.defender_losses());
        survivors = outcome.attackers_left;
        report = Some(outcome);
    }

    let defenders_left = state.soldier_count(to);
    let mut owner_changed = false;
    if defenders_left == 0 && survivors > 0 {
        state.set_region_owner(to, Some(player));
        state.transfer_soldiers(from, to, survivors.min(count));
        state.reset_temple(to);
        state.record_conquest(to);
        owner_changed = true;
        info!(
            player,
            region = to,
            from = ?previous_owner,
            survivors,
            "Region conquered"
        );
    } else if defenders_left == 0 && previous_owner.is_some() {
        state.set_region_owner(to, None);
        owner_changed = true;
        info!(player, region = to, from = ?previous_owner, "Region left empty and neutral");
    }

    state.consume_move();

    if owner_changed && previous_owner.is_some() {
        settle_eliminations(state);
    }
    report
}
