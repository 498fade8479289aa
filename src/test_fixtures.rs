//! Shared builders for unit tests. ASCII maps keep grid scenarios readable:
//! `#` wall, `.` floor, `+` closed door, `'` open door, `<`/`>` stairs,
//! `P` portal, `E` dungeon entrance, `A` altar, `H` healer, `M` merchant,
//! `@` the character start. Any other non-space character is a floor tile
//! recorded as a named marker.

use crate::enums::*;
use crate::model::*;
use std::collections::HashMap;

pub struct LevelFixture {
    pub level: DungeonLevel,
    pub start: Option<Point>,
    pub markers: HashMap<char, Vec<Point>>,
}

pub fn level_from_ascii(rows: &[&str]) -> LevelFixture {
    let height = rows.len() as i32;
    let width = rows[0].len() as i32;
    let mut tiles = Vec::with_capacity((width * height) as usize);
    let mut start = None;
    let mut markers: HashMap<char, Vec<Point>> = HashMap::new();
    let mut stairs_up = None;
    let mut stairs_down = None;
    let mut shop_counter: u8 = 0;

    for (y, row) in rows.iter().enumerate() {
        assert_eq!(row.len() as i32, width, "ragged ascii map");
        for (x, ch) in row.chars().enumerate() {
            let p = Point::new(x as i32, y as i32);
            let tile = match ch {
                '#' => Tile::Wall,
                '.' => Tile::Floor,
                '+' => Tile::DoorClosed,
                '\'' => Tile::DoorOpen,
                '<' => {
                    stairs_up = Some(p);
                    Tile::StairsUp
                }
                '>' => {
                    stairs_down = Some(p);
                    Tile::StairsDown
                }
                'P' => Tile::Portal,
                'E' => Tile::DungeonEntrance,
                'A' => Tile::Altar,
                'H' => Tile::Healer,
                'M' => {
                    let tile = Tile::Merchant(shop_counter);
                    shop_counter += 1;
                    tile
                }
                '@' => {
                    start = Some(p);
                    Tile::Floor
                }
                other => {
                    markers.entry(other).or_default().push(p);
                    Tile::Floor
                }
            };
            tiles.push(tile);
        }
    }

    let passable: Vec<u8> = tiles.iter().map(|t| t.is_walkable() as u8).collect();
    let passable_count = passable.iter().map(|&b| b as u32).sum();
    let explored = vec![1u8; tiles.len()];
    let visible = vec![1u8; tiles.len()];

    let level = DungeonLevel {
        width,
        height,
        explored_count: tiles.len() as u32,
        explored_passable_count: passable_count,
        tiles,
        passable,
        explored,
        visible,
        passable_count,
        stairs_up,
        stairs_down,
        generator_type: GeneratorType::Classic,
    };

    LevelFixture {
        level,
        start,
        markers,
    }
}

/// Mark the whole level unexplored and invisible, then recompute counters.
pub fn clear_exploration(level: &mut DungeonLevel) {
    level.explored.fill(0);
    level.visible.fill(0);
    recount(level);
}

/// Mark specific points explored (and visible) and recompute counters.
pub fn explore_points(level: &mut DungeonLevel, points: &[Point]) {
    for &p in points {
        let idx = level.idx(p);
        level.explored[idx] = 1;
        level.visible[idx] = 1;
    }
    recount(level);
}

pub fn recount(level: &mut DungeonLevel) {
    level.explored_count = level.explored.iter().map(|&b| b as u32).sum();
    level.explored_passable_count = level
        .explored
        .iter()
        .zip(level.passable.iter())
        .filter(|(&e, &p)| e != 0 && p != 0)
        .count() as u32;
}

pub fn make_character(position: Point, depth: i32) -> Character {
    Character {
        position,
        depth,
        hp: 50,
        max_hp: 50,
        mp: 10,
        max_mp: 10,
        stats: Stats {
            str_: 14,
            dex: 12,
            con: 12,
            int: 10,
            wis: 10,
        },
        inventory: Vec::new(),
        equipment: HashMap::new(),
        level: 10,
        class_id: "warrior".into(),
        race_id: "human".into(),
        gold: 100,
        status_effects: Vec::new(),
        spells: Vec::new(),
        spell_cooldowns: HashMap::new(),
    }
}

pub fn make_monster(id: EntityId, position: Point) -> Monster {
    Monster {
        id,
        position,
        hp: 20,
        template: MonsterTemplate {
            name: format!("orc {}", id),
            attacks: vec![MonsterAttack {
                avg_damage: 5.0,
                inflicts: None,
            }],
            speed: 100,
            flags: Vec::new(),
            min_depth: 1,
            spells: Vec::new(),
            breaths: Vec::new(),
            armor: 0,
        },
        is_awake: true,
        visible: true,
    }
}

pub fn make_unique(id: EntityId, position: Point, min_depth: i32) -> Monster {
    let mut m = make_monster(id, position);
    m.template.name = format!("unique {}", id);
    m.template.flags.push(MonsterFlag::Unique);
    m.template.min_depth = min_depth;
    m.hp = 100;
    m
}

pub fn potion(id: ItemId, kind: PotionKind) -> Item {
    Item {
        id,
        name: format!("potion {}", id),
        kind: ItemKind::Potion,
        potion: Some(kind),
        scroll: None,
        tier: 1,
        enchantment: 0,
        artifact: false,
        gold_value: 20,
        power: 0,
    }
}

pub fn scroll(id: ItemId, kind: ScrollKind) -> Item {
    Item {
        id,
        name: format!("scroll {}", id),
        kind: ItemKind::Scroll,
        potion: None,
        scroll: Some(kind),
        tier: 1,
        enchantment: 0,
        artifact: false,
        gold_value: 25,
        power: 0,
    }
}

pub fn make_world(
    level: DungeonLevel,
    character: Character,
    monsters: Vec<Monster>,
    turn: u64,
) -> WorldSnapshot {
    WorldSnapshot {
        turn,
        level,
        character,
        monsters,
        ground_items: Vec::new(),
    }
}
