//! Per-tick context.
//!
//! A [`BotContext`] digests the world snapshot once at the top of the tick
//! so downstream phases share the same view: visible entities, effective
//! personality, class profile. It borrows the snapshot and never outlives
//! the tick.

use crate::config::BotConfig;
use crate::model::{GroundItem, Monster, Point, WorldSnapshot};
use crate::profile::{effective_personality, ClassProfile, EffectivePersonality};

pub struct BotContext<'a> {
    pub world: &'a WorldSnapshot,
    pub config: &'a BotConfig,
    pub personality: EffectivePersonality,
    pub profile: ClassProfile,
    pub visible_monsters: Vec<&'a Monster>,
    pub visible_items: Vec<&'a GroundItem>,
    pub adjacent_monsters: usize,
    pub turn: u64,
}

impl<'a> BotContext<'a> {
    pub fn build(world: &'a WorldSnapshot, config: &'a BotConfig) -> BotContext<'a> {
        let profile = ClassProfile::for_class(&world.character.class_id);
        let personality = effective_personality(config.sliders(), &profile);

        let mut visible_monsters: Vec<&Monster> = world
            .monsters
            .iter()
            .filter(|m| m.is_alive() && m.visible)
            .collect();
        // Nearest first; id breaks ties so the order is stable.
        let origin = world.character.position;
        visible_monsters.sort_by_key(|m| (m.position.chebyshev(origin), m.id));

        let visible_items: Vec<&GroundItem> = world
            .ground_items
            .iter()
            .filter(|g| world.level.is_visible(g.position))
            .collect();

        let adjacent_monsters = visible_monsters
            .iter()
            .filter(|m| m.position.chebyshev(origin) <= 1)
            .count();

        BotContext {
            world,
            config,
            personality,
            profile,
            visible_monsters,
            visible_items,
            adjacent_monsters,
            turn: world.turn,
        }
    }

    pub fn in_town(&self) -> bool {
        self.world.character.depth == 0
    }

    pub fn depth(&self) -> i32 {
        self.world.character.depth
    }

    pub fn position(&self) -> Point {
        self.world.character.position
    }

    pub fn nearest_visible_monster(&self) -> Option<&'a Monster> {
        self.visible_monsters.first().copied()
    }

    pub fn adjacent_monster(&self) -> Option<&'a Monster> {
        self.visible_monsters
            .iter()
            .find(|m| m.position.chebyshev(self.position()) <= 1)
            .copied()
    }
}
