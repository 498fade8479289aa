//! World snapshot model.
//!
//! These types mirror the JSON the frontend sends each turn. The snapshot is
//! read-only to the engine; the only state the engine mutates lives in
//! [`crate::state::BotState`].

use crate::enums::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type EntityId = u32;
pub type ItemId = u32;

/// Adjacent offsets in the fixed scan order NW, N, NE, W, E, SW, S, SE.
/// Every neighbour iteration in the engine uses this order so tie-breaking
/// stays deterministic.
pub const ADJACENT_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Point {
        Point { x, y }
    }

    pub fn chebyshev(&self, other: Point) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn step(&self, dir: Direction) -> Point {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    /// Direction of `other` as seen from `self`, if the two differ.
    pub fn direction_to(&self, other: Point) -> Option<Direction> {
        Direction::from_delta(other.x - self.x, other.y - self.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tile {
    Wall,
    Floor,
    DoorOpen,
    DoorClosed,
    StairsUp,
    StairsDown,
    Portal,
    DungeonEntrance,
    FountainEmpty,
    FountainActive,
    Altar,
    Healer,
    /// Shop entrance; the payload is the shop's index on this level.
    Merchant(u8),
    TownDecoration,
}

impl Tile {
    pub fn is_walkable(&self) -> bool {
        !matches!(self, Tile::Wall | Tile::TownDecoration)
    }
}

/// Read-only level grid. Bitmaps and counters are maintained by the world
/// engine; the counters always equal the popcount of their bitmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonLevel {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Tile>,
    pub passable: Vec<u8>,
    pub explored: Vec<u8>,
    pub visible: Vec<u8>,
    pub passable_count: u32,
    pub explored_count: u32,
    pub explored_passable_count: u32,
    pub stairs_up: Option<Point>,
    pub stairs_down: Option<Point>,
    #[serde(default)]
    pub generator_type: GeneratorType,
}

impl DungeonLevel {
    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    pub fn idx(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }

    pub fn area(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn tile(&self, p: Point) -> Option<Tile> {
        if self.in_bounds(p) {
            Some(self.tiles[self.idx(p)])
        } else {
            None
        }
    }

    pub fn is_passable(&self, p: Point) -> bool {
        self.in_bounds(p) && self.passable[self.idx(p)] != 0
    }

    pub fn is_explored(&self, p: Point) -> bool {
        self.in_bounds(p) && self.explored[self.idx(p)] != 0
    }

    pub fn is_visible(&self, p: Point) -> bool {
        self.in_bounds(p) && self.visible[self.idx(p)] != 0
    }

    /// Fraction of passable tiles already explored, in percent.
    pub fn exploration_pct(&self) -> u32 {
        if self.passable_count == 0 {
            return 100;
        }
        self.explored_passable_count * 100 / self.passable_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub remaining_turns: i32,
    /// Kind-specific strength; per-turn damage for poison.
    #[serde(default)]
    pub magnitude: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterAttack {
    pub avg_damage: f64,
    /// Status the attack can inflict on hit, if any.
    #[serde(default)]
    pub inflicts: Option<StatusKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterTemplate {
    pub name: String,
    pub attacks: Vec<MonsterAttack>,
    /// Relative speed; 100 is normal.
    pub speed: i32,
    #[serde(default)]
    pub flags: Vec<MonsterFlag>,
    /// Shallowest depth this monster natively appears on.
    pub min_depth: i32,
    #[serde(default)]
    pub spells: Vec<String>,
    #[serde(default)]
    pub breaths: Vec<String>,
    #[serde(default)]
    pub armor: i32,
}

impl MonsterTemplate {
    pub fn has_flag(&self, flag: MonsterFlag) -> bool {
        self.flags.contains(&flag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: EntityId,
    pub position: Point,
    pub hp: i32,
    pub template: MonsterTemplate,
    pub is_awake: bool,
    /// In the character's current field of view.
    pub visible: bool,
}

impl Monster {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub potion: Option<PotionKind>,
    #[serde(default)]
    pub scroll: Option<ScrollKind>,
    #[serde(default)]
    pub tier: i32,
    #[serde(default)]
    pub enchantment: i32,
    #[serde(default)]
    pub artifact: bool,
    #[serde(default)]
    pub gold_value: i64,
    /// Average damage for weapons, protection value for armor pieces.
    #[serde(default)]
    pub power: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundItem {
    pub id: ItemId,
    pub position: Point,
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(rename = "str")]
    pub str_: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub position: Point,
    /// 0 is the town, 1..=50 the dungeon.
    pub depth: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub stats: Stats,
    #[serde(default)]
    pub inventory: Vec<Item>,
    #[serde(default)]
    pub equipment: HashMap<EquipSlot, Item>,
    pub level: i32,
    pub class_id: String,
    pub race_id: String,
    pub gold: i64,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
    #[serde(default)]
    pub spells: Vec<String>,
    #[serde(default)]
    pub spell_cooldowns: HashMap<String, u32>,
}


impl Character {
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64
    }

    pub fn status(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.status_effects.iter().find(|s| s.kind == kind)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status(kind).is_some()
    }

    /// Rough single-hit melee damage estimate, used by the threat model to
    /// scale monster tankiness.
    pub fn melee_damage_estimate(&self) -> f64 {
        let weapon = self
            .equipment
            .get(&EquipSlot::Weapon)
            .map(|w| w.power as f64)
            .unwrap_or(2.0);
        let str_bonus = ((self.stats.str_ - 10) / 2).max(0) as f64;
        (weapon + str_bonus).max(1.0)
    }

    /// Total armor value across equipped pieces.
    pub fn armor_total(&self) -> i32 {
        self.equipment
            .values()
            .filter(|i| {
                matches!(
                    i.kind,
                    ItemKind::Armor
                        | ItemKind::Shield
                        | ItemKind::Helmet
                        | ItemKind::Gloves
                        | ItemKind::Boots
                        | ItemKind::Cloak
                )
            })
            .map(|i| i.power + i.enchantment)
            .sum()
    }
}

/// Everything the engine sees for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub turn: u64,
    pub level: DungeonLevel,
    pub character: Character,
    pub monsters: Vec<Monster>,
    #[serde(default)]
    pub ground_items: Vec<GroundItem>,
}

impl WorldSnapshot {
    pub fn monster_by_id(&self, id: EntityId) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.id == id && m.is_alive())
    }

    pub fn monster_at(&self, p: Point) -> Option<&Monster> {
        self.monsters
            .iter()
            .find(|m| m.is_alive() && m.position == p)
    }

    pub fn ground_item_by_id(&self, id: ItemId) -> Option<&GroundItem> {
        self.ground_items.iter().find(|g| g.id == id)
    }

    pub fn ground_item_at(&self, p: Point) -> Option<&GroundItem> {
        self.ground_items.iter().find(|g| g.position == p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chebyshev_is_symmetric() {
        let a = Point::new(3, 4);
        let b = Point::new(7, 2);
        assert_eq!(a.chebyshev(b), 4);
        assert_eq!(b.chebyshev(a), 4);
    }

    #[test]
    fn adjacent_offsets_scan_order() {
        // NW, N, NE, W, E, SW, S, SE
        assert_eq!(ADJACENT_OFFSETS[0], (-1, -1));
        assert_eq!(ADJACENT_OFFSETS[1], (0, -1));
        assert_eq!(ADJACENT_OFFSETS[4], (1, 0));
        assert_eq!(ADJACENT_OFFSETS[7], (1, 1));
    }

    #[test]
    fn melee_estimate_never_below_one() {
        let character = Character {
            position: Point::new(0, 0),
            depth: 1,
            hp: 10,
            max_hp: 10,
            mp: 0,
            max_mp: 0,
            stats: Stats::default(),
            inventory: Vec::new(),
            equipment: HashMap::new(),
            level: 1,
            class_id: "warrior".into(),
            race_id: "human".into(),
            gold: 0,
            status_effects: Vec::new(),
            spells: Vec::new(),
            spell_cooldowns: HashMap::new(),
        };
        assert!(character.melee_damage_estimate() >= 1.0);
    }
}
