//! Storage seam for game snapshots.
//!
//! The core only needs to load and save whole states by id. Callers are
//! responsible for keeping at most one command in flight per game.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GameError, Result};
use crate::state::GameState;

/// Load/save of [`GameState`] snapshots keyed by game id.
pub trait GameStore {
    /// Load a game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown id, or the snapshot's
    /// decoding error.
    fn load(&self, id: &str) -> Result<GameState>;

    /// Save a game, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn save(&mut self, id: &str, state: &GameState) -> Result<()>;
}

/// In-memory store holding JSON snapshots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    games: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored games.
    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl GameStore for MemoryStore {
    fn load(&self, id: &str) -> Result<GameState> {
        let json = self
            .games
            .get(id)
            .ok_or_else(|| GameError::NotFound(id.to_string()))?;
        GameState::from_json(json)
    }

    fn save(&mut self, id: &str, state: &GameState) -> Result<()> {
        self.games.insert(id.to_string(), state.to_json()?);
        Ok(())
    }
}

/// One `<id>.json` file per game in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `root`, created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the snapshots.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(GameError::NotFound(format!("invalid game id '{id}'")));
        }
        Ok(self.root.join(format!("{id}.json")))
    }
}

impl GameStore for JsonFileStore {
    fn load(&self, id: &str) -> Result<GameState> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(GameError::NotFound(id.to_string()));
        }
        let json = std::fs::read_to_string(&path)?;
        GameState::from_json(&json)
    }

    fn save(&mut self, id: &str, state: &GameState) -> Result<()> {
        let path = self.path_for(id)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(&path, state.to_json()?)?;
        debug!(id, path = %path.display(), "Game saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapData;
    use crate::player::Player;
    use crate::setup::GameSetup;

    fn game() -> GameState {
        let map = MapData::from_edges(&[("A", (0, 0), true), ("B", (1, 0), true)], &[(0, 1)]).unwrap();
        GameSetup::new(map, "store")
            .player(Player::human(0, "A"))
            .player(Player::ai(1, "B", Some("cautious")))
            .place(0, 0, 2)
            .place(1, 1, 2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        let state = game();
        store.save("g1", &state).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("g1").unwrap(), state);
        assert!(matches!(store.load("g2"), Err(GameError::NotFound(_))));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("games"));
        let state = game();
        store.save("match-7", &state).unwrap();
        assert!(store.root().join("match-7.json").exists());
        let loaded = store.load("match-7").unwrap();
        assert_eq!(loaded.state_hash(), state.state_hash());
    }

    #[test]
    fn test_file_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        assert!(store.save("../escape", &game()).is_err());
        assert!(matches!(store.load(""), Err(GameError::NotFound(_))));
        assert!(matches!(store.load("missing"), Err(GameError::NotFound(_))));
    }
}
