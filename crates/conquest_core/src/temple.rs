//! Temples and elemental upgrades.
//!
//! Each upgrade kind maps to a fixed [`UpgradeSpec`]: cost and bonus by
//! level. A temple holds at most one kind at a time; switching kinds starts
//! over at level 0.

use serde::{Deserialize, Serialize};

use crate::map::RegionId;

/// Highest upgrade level (levels run `0..=MAX_UPGRADE_LEVEL`).
pub const MAX_UPGRADE_LEVEL: u8 = 2;

/// Number of upgrade levels.
pub const UPGRADE_LEVELS: usize = MAX_UPGRADE_LEVEL as usize + 1;

/// Cost and bonus tables for one upgrade kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeSpec {
    /// Faith cost to reach each level.
    pub costs: [u32; UPGRADE_LEVELS],
    /// Effect magnitude at each level.
    pub bonuses: [u32; UPGRADE_LEVELS],
}

const WATER: UpgradeSpec = UpgradeSpec {
    costs: [15, 25, 40],
    bonuses: [20, 40, 60],
};

const FIRE: UpgradeSpec = UpgradeSpec {
    costs: [20, 35, 55],
    bonuses: [1, 2, 3],
};

const EARTH: UpgradeSpec = UpgradeSpec {
    costs: [15, 25, 40],
    bonuses: [1, 2, 3],
};

const AIR: UpgradeSpec = UpgradeSpec {
    costs: [20, 35, 55],
    bonuses: [1, 2, 3],
};

/// The four elemental upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Percentage bonus to faith income.
    Water,
    /// Defenders killed before dice when attacking from this temple.
    Fire,
    /// Attackers killed before dice when this temple is attacked.
    Earth,
    /// Extra moves per turn.
    Air,
}

impl UpgradeKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 4] = [Self::Water, Self::Fire, Self::Earth, Self::Air];

    /// Fixed tables for this kind.
    #[must_use]
    pub const fn spec(self) -> &'static UpgradeSpec {
        match self {
            Self::Water => &WATER,
            Self::Fire => &FIRE,
            Self::Earth => &EARTH,
            Self::Air => &AIR,
        }
    }

    /// Cost to reach `level`, or `None` above the max level.
    #[must_use]
    pub fn cost(self, level: u8) -> Option<u32> {
        self.spec().costs.get(level as usize).copied()
    }

    /// Bonus at `level` (0 above the max level).
    #[must_use]
    pub fn bonus(self, level: u8) -> u32 {
        self.spec().bonuses.get(level as usize).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Water => write!(f, "Water"),
            Self::Fire => write!(f, "Fire"),
            Self::Earth => write!(f, "Earth"),
            Self::Air => write!(f, "Air"),
        }
    }
}

/// A temple in a region. Created at setup, never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Temple {
    /// Region hosting this temple.
    pub region: RegionId,
    /// Current upgrade, `None` for a basic temple.
    pub upgrade: Option<UpgradeKind>,
    /// Level within the current upgrade (0 when basic).
    pub level: u8,
}

impl Temple {
    /// A basic, un-upgraded temple.
    #[must_use]
    pub const fn basic(region: RegionId) -> Self {
        Self {
            region,
            upgrade: None,
            level: 0,
        }
    }

    /// Whether the temple has no upgrade.
    #[must_use]
    pub const fn is_basic(&self) -> bool {
        self.upgrade.is_none()
    }

    /// Bonus this temple provides for `kind` (0 if it holds another kind).
    #[must_use]
    pub fn bonus_for(&self, kind: UpgradeKind) -> u32 {
        match self.upgrade {
            Some(k) if k == kind => kind.bonus(self.level),
            _ => 0,
        }
    }

    /// Level the temple would reach by buying `kind`.
    ///
    /// Same kind: next level, `None` if already at max. Different kind (or
    /// basic): level 0 of the new kind, forfeiting previous levels.
    #[must_use]
    pub fn next_level(&self, kind: UpgradeKind) -> Option<u8> {
        match self.upgrade {
            Some(k) if k == kind => {
                (self.level < MAX_UPGRADE_LEVEL).then_some(self.level + 1)
            }
            _ => Some(0),
        }
    }

    /// Faith cost of buying `kind` next, `None` if already maxed.
    #[must_use]
    pub fn upgrade_cost(&self, kind: UpgradeKind) -> Option<u32> {
        self.next_level(kind).and_then(|level| kind.cost(level))
    }

    /// Apply an upgrade purchase. Returns the new level, or `None` if maxed.
    pub fn apply_upgrade(&mut self, kind: UpgradeKind) -> Option<u8> {
        let level = self.next_level(kind)?;
        self.upgrade = Some(kind);
        self.level = level;
        Some(level)
    }

    /// Reset to a basic temple.
    pub fn reset(&mut self) {
        self.upgrade = None;
        self.level = 0;
    }
}
