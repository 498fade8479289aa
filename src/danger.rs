//! Danger model.
//!
//! Projects visible monsters into a per-tile threat field, adds the
//! character's status-effect burden on their own tile, and classifies the
//! situation twice: globally (whole-level avoidance) and immediately
//! (adjacent tiles only, gating consumable use).

use crate::enums::{DangerTier, MonsterFlag, PotionKind, StatusKind};
use crate::grids::DangerGrid;
use crate::items;
use crate::model::{Character, Monster, Point, WorldSnapshot};
use crate::profile::EffectivePersonality;
use crate::state::BotState;
use serde::{Deserialize, Serialize};

/// Monsters project threat up to this Chebyshev radius.
pub const DANGER_RADIUS: i32 = 4;

/// Threat falloff by Chebyshev distance 0..=4.
pub const DANGER_FALLOFF: [f64; 5] = [2.0, 1.0, 0.6, 0.35, 0.2];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DangerResult {
    pub grid: DangerGrid,
    pub max_danger: i32,
    pub computed_at: u64,
    pub monster_hash: u64,
}

/// FNV-1a over the live visible monsters' (id, x, y, hp) plus the character
/// position. A matching hash means the cached field is still exact.
pub fn monster_hash(monsters: &[Monster], char_pos: Point) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    let mut feed = |value: i64| {
        for byte in value.to_le_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(PRIME);
        }
    };
    for m in monsters {
        if !m.is_alive() || !m.visible {
            continue;
        }
        feed(m.id as i64);
        feed(m.position.x as i64);
        feed(m.position.y as i64);
        feed(m.hp as i64);
    }
    feed(char_pos.x as i64);
    feed(char_pos.y as i64);
    hash
}

/// Scalar threat of one monster against this character.
pub fn monster_threat(m: &Monster, character: &Character) -> f64 {
    let template = &m.template;
    let avg_damage = if template.attacks.is_empty() {
        0.0
    } else {
        template.attacks.iter().map(|a| a.avg_damage).sum::<f64>() / template.attacks.len() as f64
    };

    let mut threat = 2.0 * avg_damage;
    for attack in &template.attacks {
        if attack.inflicts.is_some() {
            threat += 5.0;
        }
    }
    if template
        .attacks
        .iter()
        .any(|a| a.inflicts == Some(StatusKind::Paralyzed))
    {
        threat += 10.0;
    }
    threat += 3.0 * template.spells.len() as f64;
    if !template.breaths.is_empty() {
        threat += 15.0;
    }

    threat *= template.speed as f64 / 100.0;
    threat *= if m.is_awake { 1.5 } else { 0.3 };

    // Tanky monsters take more turns to kill and are proportionally worse.
    let player_dmg = character.melee_damage_estimate();
    let turns_to_kill = (m.hp as f64 / player_dmg).ceil();
    threat *= (turns_to_kill / 2.0).min(3.0);

    let armor_reduc_pct = (character.armor_total() / 2).min(50) as f64;
    threat *= (100.0 - armor_reduc_pct) / 100.0;

    if character.has_status(StatusKind::ProtectionFromEvil)
        && template.has_flag(MonsterFlag::Evil)
        && character.level >= template.min_depth
    {
        threat *= 0.5;
    }

    threat
}

/// Status-effect contribution on the character's own tile.
fn status_contribution(character: &Character, adjacent_monsters: i32) -> i32 {
    let mut total = 0;
    for effect in &character.status_effects {
        total += match effect.kind {
            StatusKind::Paralyzed => 150 + 50 * adjacent_monsters,
            StatusKind::Confused => 60,
            StatusKind::Blind => 50,
            StatusKind::Slowed => 40,
            StatusKind::Terrified => 30,
            StatusKind::Drained => 20,
            StatusKind::Poisoned => {
                let mut poison = 2.0 * effect.remaining_turns as f64 * effect.magnitude as f64;
                if items::find_potion(character, PotionKind::CurePoison).is_some() {
                    poison *= 0.3;
                }
                if character.hp_ratio() < 0.3 {
                    poison *= 1.5;
                }
                poison as i32
            }
            _ => 0,
        };
    }
    total
}

fn count_adjacent_monsters(world: &WorldSnapshot) -> i32 {
    world
        .monsters
        .iter()
        .filter(|m| {
            m.is_alive() && m.visible && m.position.chebyshev(world.character.position) <= 1
        })
        .count() as i32
}

/// Rebuild (or revalidate) the danger field on `state.danger`. On a hash
/// match only `computed_at` moves.
pub fn compute_danger(world: &WorldSnapshot, state: &mut BotState) {
    let character = &world.character;
    let hash = monster_hash(&world.monsters, character.position);

    if let Some(result) = &mut state.danger {
        if result.monster_hash == hash
            && result.grid.width == world.level.width
            && result.grid.height == world.level.height
        {
            result.computed_at = world.turn;
            return;
        }
    }

    let mut grid = match state.danger.take() {
        Some(old) => {
            let mut g = old.grid;
            g.reset_for(world.level.width, world.level.height);
            g
        }
        None => DangerGrid::new(world.level.width, world.level.height),
    };

    for m in &world.monsters {
        if !m.is_alive() || !m.visible {
            continue;
        }
        let threat = monster_threat(m, character);
        for dy in -DANGER_RADIUS..=DANGER_RADIUS {
            for dx in -DANGER_RADIUS..=DANGER_RADIUS {
                let tile = m.position.offset(dx, dy);
                let dist = dx.abs().max(dy.abs()) as usize;
                let amount = (threat * DANGER_FALLOFF[dist]).floor() as i32;
                if amount > 0 {
                    grid.add(tile, amount);
                }
            }
        }
    }

    let adjacent = count_adjacent_monsters(world);
    let status = status_contribution(character, adjacent);
    if status > 0 {
        grid.add(character.position, status);
    }

    let max_danger = grid.max_value();
    state.danger = Some(DangerResult {
        grid,
        max_danger,
        computed_at: world.turn,
        monster_hash: hash,
    });
}

/// Personality-derived base threshold, before HP scaling.
pub fn base_threshold(personality: &EffectivePersonality) -> f64 {
    let shift = (2.0 * personality.aggression as f64 - 1.5 * personality.caution as f64) / 100.0;
    (100.0 * (1.0 + shift)).clamp(50.0, 200.0)
}

/// Threshold used for fight-or-flee style decisions; drops sharply as HP
/// falls.
pub fn personality_threshold(personality: &EffectivePersonality, hp_ratio: f64) -> f64 {
    let scale = if hp_ratio < 0.25 {
        0.3
    } else if hp_ratio < 0.5 {
        0.6
    } else if hp_ratio < 0.75 {
        0.8
    } else {
        1.0
    };
    base_threshold(personality) * scale
}

/// Threshold used for pathing avoidance. Holding emergency consumables makes
/// the bot tolerate hotter tiles.
pub fn avoidance_threshold(personality: &EffectivePersonality, character: &Character) -> f64 {
    let mut resource_bonus = 1.0;
    if items::find_potion(character, PotionKind::Healing).is_some() {
        resource_bonus += 0.15;
    }
    if items::find_escape_scroll(character).is_some() {
        resource_bonus += 0.10;
    }
    base_threshold(personality) * character.hp_ratio().max(0.3) * resource_bonus
}

/// Global tier on the character's tile.
pub fn global_tier(danger_at_char: i32, avoidance: f64) -> DangerTier {
    let d = danger_at_char as f64;
    if d < 0.5 * avoidance {
        DangerTier::Safe
    } else if d < avoidance {
        DangerTier::Caution
    } else if d < 1.5 * avoidance {
        DangerTier::Danger
    } else {
        DangerTier::Critical
    }
}

/// Adjacent-only threat sum: full threat within Chebyshev 1, half threat at
/// distance 2 for fast monsters.
pub fn immediate_threat(world: &WorldSnapshot) -> (f64, bool) {
    let mut sum = 0.0;
    let mut any_adjacent = false;
    for m in &world.monsters {
        if !m.is_alive() || !m.visible {
            continue;
        }
        let dist = m.position.chebyshev(world.character.position);
        if dist <= 1 {
            sum += monster_threat(m, &world.character);
            any_adjacent = true;
        } else if dist == 2 && m.template.speed > 100 {
            sum += 0.5 * monster_threat(m, &world.character);
        }
    }
    (sum, any_adjacent)
}

/// Immediate tier, classified against current HP.
pub fn immediate_tier(world: &WorldSnapshot) -> DangerTier {
    let (sum, any_adjacent) = immediate_threat(world);
    let hp = world.character.hp as f64;
    if sum < 0.5 * hp {
        if any_adjacent && sum > 0.0 {
            DangerTier::Caution
        } else {
            DangerTier::Safe
        }
    } else if sum < hp {
        DangerTier::Danger
    } else {
        DangerTier::Critical
    }
}

#[cfg(test)]
#[path = "./danger_test.rs"]
mod danger_test;
