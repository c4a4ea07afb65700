//! Building the opening position.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GameError, Result};
use crate::map::{MapData, RegionId};
use crate::player::{Player, PlayerSlot};
use crate::rules::Rules;
use crate::state::GameState;

/// Initial garrison of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingRegion {
    /// Region to garrison.
    pub region: RegionId,
    /// Owning slot, `None` for a neutral garrison.
    pub owner: Option<PlayerSlot>,
    /// Soldiers placed at start.
    pub soldiers: u32,
}

/// Builder for a new game.
///
/// ```
/// use conquest_core::prelude::*;
///
/// let map = MapData::from_edges(
///     &[("West", (0, 0), true), ("East", (1, 0), true)],
///     &[(0, 1)],
/// )
/// .unwrap();
/// let state = GameSetup::new(map, "seed")
///     .player(Player::human(0, "Ada"))
///     .player(Player::ai(1, "Bot", None))
///     .place(0, 0, 3)
///     .place(1, 1, 3)
///     .build()
///     .unwrap();
/// assert_eq!(state.current_player(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct GameSetup {
    map: MapData,
    rules: Rules,
    players: Vec<Player>,
    seed: String,
    placements: Vec<StartingRegion>,
}

impl GameSetup {
    /// Start a setup on a map with a seed.
    #[must_use]
    pub fn new(map: MapData, seed: impl Into<String>) -> Self {
        Self {
            map,
            rules: Rules::default(),
            players: Vec::new(),
            seed: seed.into(),
            placements: Vec::new(),
        }
    }

    /// Replace the default rules.
    #[must_use]
    pub fn rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    /// Add a seat.
    #[must_use]
    pub fn player(mut self, player: Player) -> Self {
        self.players.push(player);
        self
    }

    /// Add several seats.
    #[must_use]
    pub fn players(mut self, players: impl IntoIterator<Item = Player>) -> Self {
        self.players.extend(players);
        self
    }

    /// Give `region` to `owner` with `soldiers` in it.
    #[must_use]
    pub fn place(mut self, region: RegionId, owner: PlayerSlot, soldiers: u32) -> Self {
        self.placements.push(StartingRegion {
            region,
            owner: Some(owner),
            soldiers,
        });
        self
    }

    /// Put a neutral garrison in `region`.
    #[must_use]
    pub fn garrison(mut self, region: RegionId, soldiers: u32) -> Self {
        self.placements.push(StartingRegion {
            region,
            owner: None,
            soldiers,
        });
        self
    }

    /// Add prepared placements.
    #[must_use]
    pub fn placements(mut self, placements: impl IntoIterator<Item = StartingRegion>) -> Self {
        self.placements.extend(placements);
        self
    }

    /// Validate and build the opening state.
    ///
    /// Players holding no region are eliminated immediately. The lowest
    /// remaining slot moves first.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidMap`] if the map is malformed.
    /// - [`GameError::InvalidSetup`] for duplicate or out-of-range slots,
    ///   a region placed twice, or fewer than two players holding regions.
    /// - [`GameError::UnknownRegion`] / [`GameError::UnknownPlayer`] for
    ///   placements that name something that does not exist.
    pub fn build(self) -> Result<GameState> {
        self.map.validate()?;
        self.check_players()?;
        self.check_placements()?;

        let slots: Vec<PlayerSlot> = self.players.iter().map(|p| p.slot).collect();
        let mut state = GameState::blank(
            Arc::new(self.map),
            Arc::new(self.rules),
            self.players,
            &self.seed,
        );

        for placement in &self.placements {
            state.set_region_owner(placement.region, placement.owner);
            state.add_soldiers(placement.region, placement.soldiers);
        }

        let eliminated = state.refresh_eliminations();
        let active = state.active_players();
        if active.len() < 2 {
            return Err(GameError::InvalidSetup(format!(
                "At least two players must start with a region, found {}",
                active.len()
            )));
        }

        let first = active[0];
        state.set_current_player(first);
        state.set_moves_remaining(state.moves_for_turn(first));

        info!(
            seed = %self.seed,
            regions = state.region_count(),
            players = ?slots,
            eliminated = ?eliminated,
            first_player = first,
            "Game created"
        );

        Ok(state)
    }

    fn check_players(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for player in &self.players {
            if player.slot >= self.rules.max_players {
                return Err(GameError::InvalidSetup(format!(
                    "Player slot {} exceeds the limit of {} players",
                    player.slot, self.rules.max_players
                )));
            }
            if !seen.insert(player.slot) {
                return Err(GameError::InvalidSetup(format!(
                    "Player slot {} used twice",
                    player.slot
                )));
            }
        }
        Ok(())
    }

    fn check_placements(&self) -> Result<()> {
        let mut placed = BTreeSet::new();
        for placement in &self.placements {
            if placement.region >= self.map.len() {
                return Err(GameError::UnknownRegion(placement.region));
            }
            if let Some(owner) = placement.owner {
                if !self.players.iter().any(|p| p.slot == owner) {
                    return Err(GameError::UnknownPlayer(owner));
                }
            }
            if !placed.insert(placement.region) {
                return Err(GameError::InvalidSetup(format!(
                    "Region {} placed twice",
                    placement.region
                )));
            }
        }
        Ok(())
    }
}
