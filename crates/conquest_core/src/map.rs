//! Region graph supplied by the map generator.
//!
//! The core never generates maps. It receives a finite set of regions with
//! symmetric adjacency and temple eligibility and treats them as immutable.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Stable, zero-based region index.
pub type RegionId = usize;

/// A territory node in the adjacency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Index of this region; equals its position in [`MapData::regions`].
    pub id: RegionId,
    /// Display name.
    pub name: String,
    /// Map coordinate, used only by presentation.
    pub position: (i32, i32),
    /// Adjacent region indices.
    pub neighbors: Vec<RegionId>,
    /// Whether a temple is built here at setup.
    pub has_temple: bool,
}

impl Region {
    /// Create a region with no neighbours.
    #[must_use]
    pub fn new(id: RegionId, name: impl Into<String>, position: (i32, i32), has_temple: bool) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            neighbors: Vec::new(),
            has_temple,
        }
    }
}

/// Immutable board topology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapData {
    /// All regions, indexed by [`RegionId`].
    pub regions: Vec<Region>,
}

impl MapData {
    /// Build and validate a map.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMap`] if the regions fail [`validate`](Self::validate).
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let map = Self { regions };
        map.validate()?;
        Ok(map)
    }

    /// Build a map from a list of undirected edges.
    ///
    /// Each `(name, position, has_temple)` entry becomes the region with the
    /// index of its position in the list.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMap`] for out-of-range or self edges.
    pub fn from_edges(
        regions: &[(&str, (i32, i32), bool)],
        edges: &[(RegionId, RegionId)],
    ) -> Result<Self> {
        let mut out: Vec<Region> = regions
            .iter()
            .enumerate()
            .map(|(id, (name, pos, temple))| Region::new(id, *name, *pos, *temple))
            .collect();

        for &(a, b) in edges {
            if a >= out.len() || b >= out.len() {
                return Err(GameError::InvalidMap(format!(
                    "Edge ({a}, {b}) references a region outside 0..{}",
                    out.len()
                )));
            }
            if !out[a].neighbors.contains(&b) {
                out[a].neighbors.push(b);
            }
            if !out[b].neighbors.contains(&a) {
                out[b].neighbors.push(a);
            }
        }
        for region in &mut out {
            region.neighbors.sort_unstable();
        }

        Self::new(out)
    }

    /// Check index density, neighbour ranges, self-adjacency and symmetry.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMap`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(GameError::InvalidMap("Map has no regions".to_string()));
        }

        for (index, region) in self.regions.iter().enumerate() {
            if region.id != index {
                return Err(GameError::InvalidMap(format!(
                    "Region '{}' has id {} but sits at index {index}",
                    region.name, region.id
                )));
            }
            for &n in &region.neighbors {
                if n == index {
                    return Err(GameError::InvalidMap(format!(
                        "Region {index} lists itself as a neighbour"
                    )));
                }
                let Some(other) = self.regions.get(n) else {
                    return Err(GameError::InvalidMap(format!(
                        "Region {index} has unknown neighbour {n}"
                    )));
                };
                if !other.neighbors.contains(&index) {
                    return Err(GameError::InvalidMap(format!(
                        "Adjacency {index} -> {n} is not symmetric"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the map has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Look up a region.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Neighbours of a region (empty for unknown ids).
    #[must_use]
    pub fn neighbors(&self, id: RegionId) -> &[RegionId] {
        self.regions
            .get(id)
            .map_or(&[][..], |r| r.neighbors.as_slice())
    }

    /// Whether two regions share a border.
    #[must_use]
    pub fn are_adjacent(&self, a: RegionId, b: RegionId) -> bool {
        self.neighbors(a).contains(&b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MapData {
        MapData::from_edges(
            &[("A", (0, 0), true), ("B", (1, 0), false), ("C", (0, 1), true)],
            &[(0, 1), (1, 2)],
        )
        .unwrap()
    }

    #[test]
    fn test_from_edges_is_symmetric() {
        let map = triangle();
        assert!(map.are_adjacent(0, 1));
        assert!(map.are_adjacent(1, 0));
        assert!(map.are_adjacent(2, 1));
        assert!(!map.are_adjacent(0, 2));
        assert_eq!(map.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_unknown_region_has_no_neighbors() {
        let map = triangle();
        assert!(map.neighbors(99).is_empty());
        assert!(map.region(99).is_none());
    }

    #[test]
    fn test_asymmetric_adjacency_rejected() {
        let mut a = Region::new(0, "A", (0, 0), false);
        let b = Region::new(1, "B", (1, 0), false);
        a.neighbors.push(1);
        let err = MapData::new(vec![a, b]).unwrap_err();
        assert!(err.to_string().contains("not symmetric"));
    }

    #[test]
    fn test_self_edge_rejected() {
        let err = MapData::from_edges(&[("A", (0, 0), false)], &[(0, 0)]).unwrap_err();
        assert!(matches!(err, GameError::InvalidMap(_)));
    }

    #[test]
    fn test_out_of_range_edge_rejected() {
        let err = MapData::from_edges(&[("A", (0, 0), false)], &[(0, 4)]).unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_misnumbered_region_rejected() {
        let region = Region::new(3, "Lost", (0, 0), false);
        assert!(MapData::new(vec![region]).is_err());
    }

    #[test]
    fn test_empty_map_rejected() {
        assert!(MapData::new(Vec::new()).is_err());
    }
}
