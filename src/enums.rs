use serde::{Deserialize, Serialize};

/// One of the eight movement directions. Serialized in the short form the
/// frontend uses ("n", "ne", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "n")]
    North,
    #[serde(rename = "s")]
    South,
    #[serde(rename = "e")]
    East,
    #[serde(rename = "w")]
    West,
    #[serde(rename = "ne")]
    NorthEast,
    #[serde(rename = "nw")]
    NorthWest,
    #[serde(rename = "se")]
    SouthEast,
    #[serde(rename = "sw")]
    SouthWest,
}

impl Direction {
    /// Grid delta for this direction. North is y-1 (screen coordinates).
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Direction::North),
            (0, 1) => Some(Direction::South),
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            (1, -1) => Some(Direction::NorthEast),
            (-1, -1) => Some(Direction::NorthWest),
            (1, 1) => Some(Direction::SouthEast),
            (-1, 1) => Some(Direction::SouthWest),
            _ => None,
        }
    }

    pub fn is_cardinal(&self) -> bool {
        matches!(
            self,
            Direction::North | Direction::South | Direction::East | Direction::West
        )
    }

    /// Clockwise next cardinal (N -> E -> S -> W). Diagonals collapse to the
    /// nearest cardinal first.
    pub fn right(&self) -> Direction {
        match self.to_cardinal() {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            _ => Direction::North,
        }
    }

    pub fn left(&self) -> Direction {
        match self.to_cardinal() {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            _ => Direction::North,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    /// Nearest cardinal, biasing vertical for diagonals.
    pub fn to_cardinal(&self) -> Direction {
        match self {
            Direction::NorthEast | Direction::NorthWest => Direction::North,
            Direction::SouthEast | Direction::SouthWest => Direction::South,
            d => *d,
        }
    }

    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Map generator family. Labyrinth levels get corridor-following exploration
/// and a lowered completion threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum GeneratorType {
    #[default]
    Classic,
    Cavern,
    Labyrinth,
}

/// Survivability class of a character class, driving the under-levelled
/// check for descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassTier {
    Tank,
    Medium,
    Squishy,
}

/// Four-step danger classification, used both for the global (whole level)
/// tier and the immediate (adjacent-only) tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DangerTier {
    Safe,
    Caution,
    Danger,
    Critical,
}

impl std::fmt::Display for DangerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DangerTier::Safe => write!(f, "safe"),
            DangerTier::Caution => write!(f, "caution"),
            DangerTier::Danger => write!(f, "danger"),
            DangerTier::Critical => write!(f, "critical"),
        }
    }
}

/// Status effects the engine cares about. Anything else the world tracks is
/// ignored by the decision model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusKind {
    Paralyzed,
    Confused,
    Blind,
    Slowed,
    Terrified,
    Drained,
    Poisoned,
    ProtectionFromEvil,
    Hasted,
}

/// Behaviour flags on a monster template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonsterFlag {
    Unique,
    Evil,
    Undead,
    Animal,
}

/// Broad item categories as the world reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Weapon,
    Bow,
    Armor,
    Shield,
    Helmet,
    Gloves,
    Boots,
    Cloak,
    Ring,
    Amulet,
    Light,
    Potion,
    Scroll,
    Wand,
    Ammo,
    Food,
    Gold,
    Misc,
}

/// Consumable identities the engine looks for by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PotionKind {
    Healing,
    CurePoison,
    Restore,
    Speed,
    Heroism,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollKind {
    PhaseDoor,
    Teleport,
    TeleportLevel,
    WordOfRecall,
    ProtectionFromEvil,
    MagicMapping,
}

/// What a shopping stop is for; the world picks the concrete item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuyNeed {
    TownPortal,
    Healing,
    Escape,
}

/// Equipment slots, matching the frontend's slot keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipSlot {
    Weapon,
    Bow,
    Armor,
    Shield,
    Helmet,
    Gloves,
    Boots,
    Cloak,
    RingLeft,
    RingRight,
    Amulet,
    Light,
}
