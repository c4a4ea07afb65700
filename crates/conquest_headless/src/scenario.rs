//! Scenario loading and configuration.
//!
//! Scenarios define the opening position for headless games: the region
//! graph, the seats, the starting garrisons and optional rule overrides.
//!
//! ```ron
//! Scenario(
//!     name: "tiny",
//!     regions: [
//!         (name: "West", position: (0, 0), temple: true),
//!         (name: "East", position: (1, 0), temple: true),
//!     ],
//!     edges: [(0, 1)],
//!     players: [(slot: 0, name: "Red"), (slot: 1, name: "Blue", personality: Some("cautious"))],
//!     placements: [
//!         (region: 0, owner: Some(0), soldiers: 3),
//!         (region: 1, owner: Some(1), soldiers: 3),
//!     ],
//! )
//! ```

use std::path::Path;

use conquest_core::prelude::{
    GameError, GameSetup, GameState, MapData, Player, PlayerSlot, RegionId, Rules, StartingRegion,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Neither a built-in name nor an existing file.
    #[error("Scenario not found: {0}")]
    NotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario does not describe a playable game.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// One region of a scenario map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    /// Display name.
    pub name: String,
    /// Map coordinate.
    #[serde(default)]
    pub position: (i32, i32),
    /// Whether a temple stands here.
    #[serde(default)]
    pub temple: bool,
}

impl RegionSpec {
    /// Create a region spec.
    #[must_use]
    pub fn new(name: &str, position: (i32, i32), temple: bool) -> Self {
        Self {
            name: name.to_string(),
            position,
            temple,
        }
    }
}

/// One seat of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSpec {
    /// Player slot.
    pub slot: PlayerSlot,
    /// Display name.
    pub name: String,
    /// AI personality tag.
    #[serde(default)]
    pub personality: Option<String>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Rule overrides.
    #[serde(default)]
    pub rules: Rules,
    /// Regions in index order.
    pub regions: Vec<RegionSpec>,
    /// Undirected adjacency.
    pub edges: Vec<(RegionId, RegionId)>,
    /// Seats. Every seat is played by the AI in headless games.
    pub players: Vec<SeatSpec>,
    /// Starting garrisons.
    pub placements: Vec<StartingRegion>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A built-in scenario by name, else a RON file at that path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Look up a built-in scenario.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "duel" => Some(Self::duel()),
            "skirmish" => Some(Self::skirmish()),
            _ => None,
        }
    }

    /// Names accepted by [`Scenario::builtin`].
    #[must_use]
    pub const fn builtin_names() -> &'static [&'static str] {
        &["duel", "skirmish"]
    }

    /// Three regions in a line; the attacker holds two of them.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            description: "Two players, three regions, one decisive push".to_string(),
            rules: Rules::default(),
            regions: vec![
                RegionSpec::new("Home", (0, 0), true),
                RegionSpec::new("Ford", (1, 0), false),
                RegionSpec::new("Keep", (2, 0), true),
            ],
            edges: vec![(0, 1), (1, 2)],
            players: vec![
                SeatSpec {
                    slot: 0,
                    name: "Attacker".to_string(),
                    personality: Some("aggressive".to_string()),
                },
                SeatSpec {
                    slot: 1,
                    name: "Defender".to_string(),
                    personality: Some("cautious".to_string()),
                },
            ],
            placements: vec![
                StartingRegion {
                    region: 0,
                    owner: Some(0),
                    soldiers: 2,
                },
                StartingRegion {
                    region: 1,
                    owner: Some(0),
                    soldiers: 3,
                },
                StartingRegion {
                    region: 2,
                    owner: Some(1),
                    soldiers: 1,
                },
            ],
        }
    }

    /// Four players on a ring of twelve regions, a temple every third
    /// region, neutral garrisons between the homes.
    #[must_use]
    pub fn skirmish() -> Self {
        const RING: usize = 12;
        let regions = (0..RING)
            .map(|i| {
                let angle = i as f64 / RING as f64 * std::f64::consts::TAU;
                let position = ((angle.cos() * 10.0).round() as i32, (angle.sin() * 10.0).round() as i32);
                RegionSpec::new(&format!("Shrine {i}"), position, i % 3 == 0)
            })
            .collect();
        let edges = (0..RING).map(|i| (i, (i + 1) % RING)).collect();
        let personalities = ["aggressive", "cautious", "aggressive", "cautious"];
        let players = personalities
            .iter()
            .zip(0u8..)
            .map(|(personality, slot)| SeatSpec {
                slot,
                name: format!("Warlord {}", slot + 1),
                personality: Some((*personality).to_string()),
            })
            .collect();
        let placements = (0..RING)
            .map(|region| {
                if region % 3 == 0 {
                    StartingRegion {
                        region,
                        owner: u8::try_from(region / 3).ok(),
                        soldiers: 6,
                    }
                } else {
                    StartingRegion {
                        region,
                        owner: None,
                        soldiers: 1,
                    }
                }
            })
            .collect();

        Self {
            name: "skirmish".to_string(),
            description: "Four warlords on a ring of shrines".to_string(),
            rules: Rules::default(),
            regions,
            edges,
            players,
            placements,
        }
    }

    /// Build the region graph.
    pub fn map(&self) -> Result<MapData, ScenarioError> {
        let regions: Vec<(&str, (i32, i32), bool)> = self
            .regions
            .iter()
            .map(|r| (r.name.as_str(), r.position, r.temple))
            .collect();
        Ok(MapData::from_edges(&regions, &self.edges)?)
    }

    /// Check that the scenario yields a playable opening.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.build_state("validate").map(|_| ())
    }

    /// Opening state for `seed`, with every seat played by the AI.
    pub fn build_state(&self, seed: &str) -> Result<GameState, ScenarioError> {
        let players = self
            .players
            .iter()
            .map(|seat| Player::ai(seat.slot, seat.name.clone(), seat.personality.as_deref()));
        let state = GameSetup::new(self.map()?, seed)
            .rules(self.rules.clone())
            .players(players)
            .placements(self.placements.iter().copied())
            .build()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for name in Scenario::builtin_names() {
            let scenario = Scenario::builtin(name).unwrap();
            scenario.validate().unwrap();
        }
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn test_duel_opening() {
        let state = Scenario::duel().build_state("s").unwrap();
        assert_eq!(state.soldier_count(1), 3);
        assert_eq!(state.region_owner(2), Some(1));
        assert!(state.players().iter().all(|p| p.is_ai));
    }

    #[test]
    fn test_skirmish_layout() {
        let scenario = Scenario::skirmish();
        let state = scenario.build_state("s").unwrap();
        assert_eq!(state.region_count(), 12);
        assert_eq!(state.active_players(), vec![0, 1, 2, 3]);
        assert_eq!(state.region_owner(1), None);
        assert_eq!(state.soldier_count(1), 1);
        assert_eq!(state.region_owner(9), Some(3));
    }

    #[test]
    fn test_ron_roundtrip() {
        let scenario = Scenario::duel();
        let text = ron::ser::to_string_pretty(&scenario, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(Scenario::from_ron_str(&text).unwrap(), scenario);
    }

    #[test]
    fn test_ron_defaults() {
        let text = r#"Scenario(
            name: "tiny",
            regions: [(name: "West", temple: true), (name: "East")],
            edges: [(0, 1)],
            players: [(slot: 0, name: "Red"), (slot: 1, name: "Blue")],
            placements: [
                (region: 0, owner: Some(0), soldiers: 3),
                (region: 1, owner: Some(1), soldiers: 3),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(text).unwrap();
        assert_eq!(scenario.rules, Rules::default());
        assert!(!scenario.regions[1].temple);
        scenario.validate().unwrap();
    }

    #[test]
    fn test_invalid_scenarios_rejected() {
        let mut scenario = Scenario::duel();
        scenario.edges.push((0, 9));
        assert!(matches!(scenario.validate(), Err(ScenarioError::Invalid(_))));

        let mut lonely = Scenario::duel();
        lonely.placements.retain(|p| p.owner != Some(1));
        assert!(matches!(lonely.validate(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_resolve_missing_file() {
        let err = Scenario::resolve("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.ron");
        let text = ron::ser::to_string(&Scenario::duel()).unwrap();
        std::fs::write(&path, text).unwrap();
        let loaded = Scenario::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.name, "duel");
    }
}
