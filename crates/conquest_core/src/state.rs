//! The canonical game aggregate.
//!
//! A [`GameState`] is a value. Commands clone it, mutate the clone through
//! the crate-private mutators below, and hand the clone back; a state that
//! has been given to a caller is never changed again. The generator lives
//! inside the state, so cloning or serializing a state preserves the dice
//! sequence exactly.
//!
//! # Determinism
//!
//! - Per-region data is stored in vectors indexed by [`RegionId`].
//! - Per-player data is keyed by [`PlayerSlot`] in ordered maps.
//! - [`state_hash`](GameState::state_hash) visits fields in a fixed order.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::map::{MapData, RegionId};
use crate::player::{Player, PlayerSlot};
use crate::rng::{DeterministicRng, RngState};
use crate::rules::Rules;
use crate::temple::{Temple, UpgradeKind};

/// Opaque soldier identity. Soldiers are fungible; the id only keeps
/// presentation order stable.
pub type SoldierId = u32;

/// How the game ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EndResult {
    /// Still being played.
    #[default]
    Undecided,
    /// A single winner.
    Winner(PlayerSlot),
    /// Nobody won.
    Draw,
}

impl EndResult {
    /// Whether the game is over.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Undecided)
    }

    /// The winning slot, if any.
    #[must_use]
    pub const fn winner(self) -> Option<PlayerSlot> {
        match self {
            Self::Winner(slot) => Some(slot),
            _ => None,
        }
    }
}

/// Complete snapshot of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    map: Arc<MapData>,
    rules: Arc<Rules>,
    players: Vec<Player>,
    turn: u32,
    current_player: PlayerSlot,
    moves_remaining: u32,
    owners: Vec<Option<PlayerSlot>>,
    soldiers: Vec<Vec<SoldierId>>,
    temples: Vec<Option<Temple>>,
    faith: BTreeMap<PlayerSlot, u32>,
    soldiers_bought_this_turn: u32,
    conquered_regions: Vec<RegionId>,
    eliminated_players: Vec<PlayerSlot>,
    next_soldier_id: SoldierId,
    rng: DeterministicRng,
    max_turns: Option<u32>,
    end_result: EndResult,
}

impl GameState {
    /// Create a blank state: every region neutral and empty, temples built
    /// where the map allows them, every player at the rules' starting faith.
    ///
    /// Use [`GameSetup`](crate::setup::GameSetup) to place starting armies.
    #[must_use]
    pub(crate) fn blank(map: Arc<MapData>, rules: Arc<Rules>, players: Vec<Player>, seed: &str) -> Self {
        let region_count = map.len();
        let temples = map
            .regions
            .iter()
            .map(|r| r.has_temple.then(|| Temple::basic(r.id)))
            .collect();
        let faith = players
            .iter()
            .map(|p| (p.slot, rules.starting_faith))
            .collect();
        let current_player = players.iter().map(|p| p.slot).min().unwrap_or(0);
        let max_turns = rules.max_turns;

        Self {
            map,
            rules,
            players,
            turn: 0,
            current_player,
            moves_remaining: 0,
            owners: vec![None; region_count],
            soldiers: vec![Vec::new(); region_count],
            temples,
            faith,
            soldiers_bought_this_turn: 0,
            conquered_regions: Vec::new(),
            eliminated_players: Vec::new(),
            next_soldier_id: 1,
            rng: DeterministicRng::new(seed),
            max_turns,
            end_result: EndResult::Undecided,
        }
    }

    // ---------------------------------------------------------------------
    // Read accessors
    // ---------------------------------------------------------------------

    /// Board topology.
    #[must_use]
    pub fn map(&self) -> &MapData {
        &self.map
    }

    /// Rules in force.
    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// All seats, eliminated or not.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Look up a seat by slot.
    #[must_use]
    pub fn player(&self, slot: PlayerSlot) -> Option<&Player> {
        self.players.iter().find(|p| p.slot == slot)
    }

    /// Completed rounds.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Slot whose turn it is.
    #[must_use]
    pub const fn current_player(&self) -> PlayerSlot {
        self.current_player
    }

    /// Moves left in the current turn.
    #[must_use]
    pub const fn moves_remaining(&self) -> u32 {
        self.moves_remaining
    }

    /// Number of regions on the board.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.owners.len()
    }

    /// Owner of a region, `None` when neutral or unknown.
    #[must_use]
    pub fn region_owner(&self, region: RegionId) -> Option<PlayerSlot> {
        self.owners.get(region).copied().flatten()
    }

    /// Soldier ids garrisoned in a region.
    #[must_use]
    pub fn soldiers(&self, region: RegionId) -> &[SoldierId] {
        self.soldiers.get(region).map_or(&[][..], Vec::as_slice)
    }

    /// Number of soldiers in a region.
    #[must_use]
    pub fn soldier_count(&self, region: RegionId) -> u32 {
        self.soldiers(region).len() as u32
    }

    /// Temple in a region, if one was built at setup.
    #[must_use]
    pub fn temple(&self, region: RegionId) -> Option<&Temple> {
        self.temples.get(region).and_then(Option::as_ref)
    }

    /// Faith balance of a player (0 for unknown slots).
    #[must_use]
    pub fn faith(&self, slot: PlayerSlot) -> u32 {
        self.faith.get(&slot).copied().unwrap_or(0)
    }

    /// Soldiers bought by the current player this turn.
    #[must_use]
    pub const fn soldiers_bought_this_turn(&self) -> u32 {
        self.soldiers_bought_this_turn
    }

    /// Regions conquered this turn. Armies there cannot move again.
    #[must_use]
    pub fn conquered_regions(&self) -> &[RegionId] {
        &self.conquered_regions
    }

    /// Eliminated slots, in elimination order.
    #[must_use]
    pub fn eliminated_players(&self) -> &[PlayerSlot] {
        &self.eliminated_players
    }

    /// Whether a slot has been eliminated.
    #[must_use]
    pub fn is_eliminated(&self, slot: PlayerSlot) -> bool {
        self.eliminated_players.contains(&slot)
    }

    /// Non-eliminated slots in ascending order.
    #[must_use]
    pub fn active_players(&self) -> Vec<PlayerSlot> {
        let mut slots: Vec<PlayerSlot> = self
            .players
            .iter()
            .map(|p| p.slot)
            .filter(|s| !self.is_eliminated(*s))
            .collect();
        slots.sort_unstable();
        slots
    }

    /// Round limit, `None` for unlimited.
    #[must_use]
    pub const fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }

    /// Outcome so far.
    #[must_use]
    pub const fn end_result(&self) -> EndResult {
        self.end_result
    }

    /// Whether the outcome is decided.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.end_result.is_decided()
    }

    /// Seed and generator state, for serialization.
    #[must_use]
    pub fn rng_state(&self) -> RngState {
        self.rng.get_state()
    }

    // ---------------------------------------------------------------------
    // Derived queries
    // ---------------------------------------------------------------------

    /// Whether `player` owns `region`.
    #[must_use]
    pub fn is_owned_by(&self, region: RegionId, player: PlayerSlot) -> bool {
        self.region_owner(region) == Some(player)
    }

    /// Regions owned by a player, ascending.
    #[must_use]
    pub fn regions_owned_by(&self, player: PlayerSlot) -> Vec<RegionId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == Some(player))
            .map(|(id, _)| id)
            .collect()
    }

    /// Soldiers across all of a player's regions.
    #[must_use]
    pub fn total_soldiers(&self, player: PlayerSlot) -> u32 {
        self.regions_owned_by(player)
            .into_iter()
            .map(|r| self.soldier_count(r))
            .sum()
    }

    /// Temples in regions the player owns, by ascending region.
    #[must_use]
    pub fn temples_owned_by(&self, player: PlayerSlot) -> Vec<&Temple> {
        self.regions_owned_by(player)
            .into_iter()
            .filter_map(|r| self.temple(r))
            .collect()
    }

    /// Sum of a player's temple bonuses for one upgrade kind.
    #[must_use]
    pub fn upgrade_bonus(&self, player: PlayerSlot, kind: UpgradeKind) -> u32 {
        self.temples_owned_by(player)
            .into_iter()
            .map(|t| t.bonus_for(kind))
            .sum()
    }

    /// Highest level of `kind` among the player's temples.
    #[must_use]
    pub fn upgrade_level(&self, player: PlayerSlot, kind: UpgradeKind) -> Option<u8> {
        self.temples_owned_by(player)
            .into_iter()
            .filter(|t| t.upgrade == Some(kind))
            .map(|t| t.level)
            .max()
    }

    /// Faith earned at the end of the player's turn: temples times the base
    /// rate, plus the Water percentage, floored.
    #[must_use]
    pub fn income(&self, player: PlayerSlot) -> u32 {
        let temples = self.temples_owned_by(player).len() as u32;
        let base = temples * self.rules.faith_per_temple;
        let percent = self.upgrade_bonus(player, UpgradeKind::Water);
        base + base * percent / 100
    }

    /// Cost of the next soldier for the current player this turn.
    #[must_use]
    pub fn soldier_purchase_cost(&self) -> u32 {
        self.rules.soldier_cost(self.soldiers_bought_this_turn)
    }

    /// Moves a player receives at the start of their turn.
    #[must_use]
    pub fn moves_for_turn(&self, player: PlayerSlot) -> u32 {
        self.rules.max_moves_per_turn + self.upgrade_bonus(player, UpgradeKind::Air)
    }

    /// Next active slot after `after` in ascending cyclic order.
    ///
    /// Returns the slot and whether the order wrapped past the highest slot
    /// (a round completed). `after` itself need not be active, so a player
    /// who resigns mid-round hands over without closing the round. `None`
    /// when nobody is active.
    #[must_use]
    pub fn next_active_player(&self, after: PlayerSlot) -> Option<(PlayerSlot, bool)> {
        let active = self.active_players();
        let first = *active.first()?;
        match active.iter().find(|&&s| s > after) {
            Some(&next) => Some((next, false)),
            None => Some((first, true)),
        }
    }

    // ---------------------------------------------------------------------
    // Mutators (commands and setup only)
    // ---------------------------------------------------------------------

    pub(crate) fn set_region_owner(&mut self, region: RegionId, owner: Option<PlayerSlot>) {
        if let Some(slot) = self.owners.get_mut(region) {
            *slot = owner;
        }
    }

    /// Mint `count` new soldiers into a region.
    pub(crate) fn add_soldiers(&mut self, region: RegionId, count: u32) {
        let Some(list) = self.soldiers.get_mut(region) else {
            return;
        };
        for _ in 0..count {
            list.push(self.next_soldier_id);
            self.next_soldier_id += 1;
        }
    }

    /// Remove up to `count` soldiers from the end of a region's list.
    /// Returns how many were removed.
    pub(crate) fn remove_soldiers(&mut self, region: RegionId, count: u32) -> u32 {
        let Some(list) = self.soldiers.get_mut(region) else {
            return 0;
        };
        let removed = (count as usize).min(list.len());
        list.truncate(list.len() - removed);
        removed as u32
    }

    /// Move up to `count` soldiers from the end of `from` onto `to`.
    pub(crate) fn transfer_soldiers(&mut self, from: RegionId, to: RegionId, count: u32) -> u32 {
        if from == to || to >= self.soldiers.len() {
            return 0;
        }
        let Some(source) = self.soldiers.get_mut(from) else {
            return 0;
        };
        let moved = (count as usize).min(source.len());
        let split = source.len() - moved;
        let marching: Vec<SoldierId> = source.split_off(split);
        self.soldiers[to].extend(marching);
        moved as u32
    }

    pub(crate) fn temple_mut(&mut self, region: RegionId) -> Option<&mut Temple> {
        self.temples.get_mut(region).and_then(Option::as_mut)
    }

    /// Reset the temple in a region to basic, if there is one.
    pub(crate) fn reset_temple(&mut self, region: RegionId) {
        if let Some(temple) = self.temple_mut(region) {
            temple.reset();
        }
    }

    pub(crate) fn add_faith(&mut self, player: PlayerSlot, amount: u32) {
        let balance = self.faith.entry(player).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Deduct faith. Fails, changing nothing, if the balance is too low.
    pub(crate) fn subtract_faith(&mut self, player: PlayerSlot, amount: u32) -> bool {
        let balance = self.faith.entry(player).or_insert(0);
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        true
    }

    pub(crate) fn set_moves_remaining(&mut self, moves: u32) {
        self.moves_remaining = moves;
    }

    pub(crate) fn consume_move(&mut self) {
        self.moves_remaining = self.moves_remaining.saturating_sub(1);
    }

    pub(crate) fn record_soldier_bought(&mut self) {
        self.soldiers_bought_this_turn += 1;
    }

    pub(crate) fn record_conquest(&mut self, region: RegionId) {
        if !self.conquered_regions.contains(&region) {
            self.conquered_regions.push(region);
        }
    }

    /// Clear everything scoped to a single turn.
    pub(crate) fn clear_turn_scoped(&mut self) {
        self.conquered_regions.clear();
        self.soldiers_bought_this_turn = 0;
    }

    pub(crate) fn set_current_player(&mut self, slot: PlayerSlot) {
        self.current_player = slot;
    }

    pub(crate) fn advance_turn_counter(&mut self) {
        self.turn += 1;
    }

    pub(crate) fn mark_eliminated(&mut self, slot: PlayerSlot) -> bool {
        if self.is_eliminated(slot) {
            return false;
        }
        self.eliminated_players.push(slot);
        true
    }

    /// Eliminate every active player that owns no region, ascending by slot.
    /// Returns the newly eliminated slots.
    pub(crate) fn refresh_eliminations(&mut self) -> Vec<PlayerSlot> {
        let newly: Vec<PlayerSlot> = self
            .active_players()
            .into_iter()
            .filter(|&s| !self.owners.contains(&Some(s)))
            .collect();
        for &slot in &newly {
            self.mark_eliminated(slot);
        }
        newly
    }

    /// Record the outcome. A decided outcome is terminal and never replaced;
    /// returns whether this call set it.
    pub(crate) fn set_end_result(&mut self, result: EndResult) -> bool {
        if self.end_result.is_decided() || !result.is_decided() {
            return false;
        }
        self.end_result = result;
        true
    }

    pub(crate) fn rng_mut(&mut self) -> &mut DeterministicRng {
        &mut self.rng
    }

    // ---------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------

    /// Serialize to the flat JSON snapshot used for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore from a JSON snapshot and check its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] on malformed JSON or
    /// [`GameError::InvariantViolation`] on an inconsistent snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let state: Self = serde_json::from_str(json)?;
        state.check_invariants()?;
        Ok(state)
    }

    /// Verify the structural invariants of the aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] naming the first broken rule.
    pub fn check_invariants(&self) -> Result<()> {
        self.map
            .validate()
            .map_err(|e| GameError::InvariantViolation(format!("Snapshot map is invalid: {e}")))?;

        let regions = self.map.len();
        if self.owners.len() != regions || self.soldiers.len() != regions || self.temples.len() != regions {
            return Err(GameError::InvariantViolation(format!(
                "Per-region tables do not match the map ({regions} regions)"
            )));
        }

        for (index, temple) in self.temples.iter().enumerate() {
            let expected = self.map.regions[index].has_temple;
            match temple {
                Some(t) if !expected || t.region != index => {
                    return Err(GameError::InvariantViolation(format!(
                        "Temple at region {index} does not match the map"
                    )));
                }
                None if expected => {
                    return Err(GameError::InvariantViolation(format!(
                        "Region {index} lost its temple"
                    )));
                }
                _ => {}
            }
        }

        for (index, owner) in self.owners.iter().enumerate() {
            if let Some(slot) = owner {
                if self.player(*slot).is_none() {
                    return Err(GameError::InvariantViolation(format!(
                        "Region {index} owned by unknown slot {slot}"
                    )));
                }
                if self.is_eliminated(*slot) {
                    return Err(GameError::InvariantViolation(format!(
                        "Region {index} owned by eliminated slot {slot}"
                    )));
                }
            }
        }

        if let Some(&bad) = self.conquered_regions.iter().find(|&&r| r >= regions) {
            return Err(GameError::InvariantViolation(format!(
                "Conquered region {bad} is off the map"
            )));
        }

        if !self.is_game_over() && self.is_eliminated(self.current_player) {
            return Err(GameError::InvariantViolation(format!(
                "Current player {} is eliminated",
                self.current_player
            )));
        }

        Ok(())
    }

    /// Hash of every simulation field, in a fixed order.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.turn.hash(&mut hasher);
        self.current_player.hash(&mut hasher);
        self.moves_remaining.hash(&mut hasher);

        self.owners.len().hash(&mut hasher);
        for (region, owner) in self.owners.iter().enumerate() {
            region.hash(&mut hasher);
            owner.hash(&mut hasher);
            self.soldiers[region].hash(&mut hasher);
            if let Some(temple) = self.temples.get(region).copied().flatten() {
                temple.hash(&mut hasher);
            }
        }

        for (slot, faith) in &self.faith {
            slot.hash(&mut hasher);
            faith.hash(&mut hasher);
        }

        self.soldiers_bought_this_turn.hash(&mut hasher);
        self.conquered_regions.hash(&mut hasher);
        self.eliminated_players.hash(&mut hasher);
        self.next_soldier_id.hash(&mut hasher);
        self.rng.hash(&mut hasher);
        self.max_turns.hash(&mut hasher);
        self.end_result.hash(&mut hasher);

        hasher.finish()
    }
}
