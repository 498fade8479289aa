//! Recorded scenarios.
//!
//! A scenario bundles a world snapshot with a bot configuration and a tick
//! allowance: `{"world": ..., "config": ..., "ticks": n}`. The `bot_cli`
//! binary replays them headlessly and the integration and snapshot suites
//! load the same JSON fixtures from `tests/scenarios/`.
//!
//! The applier is deliberately minimal — moves, melee, pickups, healing
//! draughts — just enough for multi-tick traces to progress without
//! dragging in the real game engine. Stair transitions end a trace.

use crate::actions::BotAction;
use crate::config::BotConfig;
use crate::enums::{ItemKind, PotionKind};
use crate::model::WorldSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub world: WorldSnapshot,
    #[serde(default)]
    pub config: BotConfig,
    #[serde(default = "default_ticks")]
    pub ticks: u32,
}

fn default_ticks() -> u32 {
    50
}

/// Apply one action to the scenario world. Returns false when the trace
/// should stop (stair or portal use leaves the recorded level).
pub fn apply_action(world: &mut WorldSnapshot, action: &BotAction) -> bool {
    match action {
        BotAction::Move { direction } => {
            let next = world.character.position.step(*direction);
            if world.level.is_passable(next) && world.monster_at(next).is_none() {
                world.character.position = next;
            }
            true
        }
        BotAction::Attack { target_id } | BotAction::RangedAttack { target_id } => {
            let damage = world.character.melee_damage_estimate() as i32;
            if let Some(m) = world.monsters.iter_mut().find(|m| m.id == *target_id) {
                m.hp -= damage.max(1);
            }
            true
        }
        BotAction::Pickup { item_id } => {
            if let Some(idx) = world.ground_items.iter().position(|g| g.id == *item_id) {
                let ground = world.ground_items.remove(idx);
                world.character.inventory.push(ground.item);
            }
            true
        }
        BotAction::Use { item_id } => {
            if let Some(idx) = world
                .character
                .inventory
                .iter()
                .position(|i| i.id == *item_id)
            {
                let item = world.character.inventory.remove(idx);
                if item.kind == ItemKind::Potion && item.potion == Some(PotionKind::Healing) {
                    let heal = world.character.max_hp * 3 / 10;
                    world.character.hp = (world.character.hp + heal).min(world.character.max_hp);
                }
            }
            true
        }
        BotAction::Descend | BotAction::Ascend | BotAction::UseReturnPortal => false,
        _ => true,
    }
}

/// Structural consistency checks on a parsed scenario: grid sizes match the
/// dimensions, the counters match their bitmaps, the character is on the
/// level.
pub fn validate(scenario: &Scenario) -> Result<(), String> {
    let level = &scenario.world.level;
    let area = (level.width * level.height) as usize;
    if level.tiles.len() != area {
        return Err(format!(
            "tile array has {} entries for a {}x{} level",
            level.tiles.len(),
            level.width,
            level.height
        ));
    }
    for (name, grid) in [
        ("passable", &level.passable),
        ("explored", &level.explored),
        ("visible", &level.visible),
    ] {
        if grid.len() != area {
            return Err(format!(
                "{} bitmap has {} entries, expected {}",
                name,
                grid.len(),
                area
            ));
        }
    }
    let passable_popcount = level.passable.iter().filter(|&&b| b != 0).count() as u32;
    if passable_popcount != level.passable_count {
        return Err(format!(
            "passableCount {} but bitmap popcount {}",
            level.passable_count, passable_popcount
        ));
    }
    let explored_popcount = level.explored.iter().filter(|&&b| b != 0).count() as u32;
    if explored_popcount != level.explored_count {
        return Err(format!(
            "exploredCount {} but bitmap popcount {}",
            level.explored_count, explored_popcount
        ));
    }
    if !level.in_bounds(scenario.world.character.position) {
        return Err("character out of bounds".into());
    }
    Ok(())
}
