//! Item evaluation and inventory finders.

use crate::enums::{EquipSlot, ItemKind, PotionKind, ScrollKind};
use crate::model::{Character, GroundItem, Item, WorldSnapshot};
use crate::profile::EffectivePersonality;

/// Ground items scoring below this are never worth a detour.
pub const PICKUP_MIN_SCORE: i32 = 10;

pub fn find_potion(character: &Character, kind: PotionKind) -> Option<&Item> {
    character
        .inventory
        .iter()
        .find(|i| i.kind == ItemKind::Potion && i.potion == Some(kind))
}

pub fn find_scroll(character: &Character, kind: ScrollKind) -> Option<&Item> {
    character
        .inventory
        .iter()
        .find(|i| i.kind == ItemKind::Scroll && i.scroll == Some(kind))
}

/// Any scroll that gets the character out of trouble: phase door first
/// (cheaper), then full teleport.
pub fn find_escape_scroll(character: &Character) -> Option<&Item> {
    find_scroll(character, ScrollKind::PhaseDoor)
        .or_else(|| find_scroll(character, ScrollKind::Teleport))
}

pub fn count_potions(character: &Character, kind: PotionKind) -> usize {
    character
        .inventory
        .iter()
        .filter(|i| i.kind == ItemKind::Potion && i.potion == Some(kind))
        .count()
}

pub fn count_scrolls(character: &Character, kind: ScrollKind) -> usize {
    character
        .inventory
        .iter()
        .filter(|i| i.kind == ItemKind::Scroll && i.scroll == Some(kind))
        .count()
}

fn equipped_power(character: &Character, slot: EquipSlot) -> i32 {
    character
        .equipment
        .get(&slot)
        .map(|i| i.power + i.enchantment)
        .unwrap_or(0)
}

fn equip_slot_for(kind: ItemKind) -> Option<EquipSlot> {
    match kind {
        ItemKind::Weapon => Some(EquipSlot::Weapon),
        ItemKind::Bow => Some(EquipSlot::Bow),
        ItemKind::Armor => Some(EquipSlot::Armor),
        ItemKind::Shield => Some(EquipSlot::Shield),
        ItemKind::Helmet => Some(EquipSlot::Helmet),
        ItemKind::Gloves => Some(EquipSlot::Gloves),
        ItemKind::Boots => Some(EquipSlot::Boots),
        ItemKind::Cloak => Some(EquipSlot::Cloak),
        ItemKind::Amulet => Some(EquipSlot::Amulet),
        ItemKind::Light => Some(EquipSlot::Light),
        _ => None,
    }
}

/// Score a ground item for pickup. Upgrades and emergency consumables rate
/// high; sidegrades rate near zero.
pub fn evaluate_ground_item(item: &Item, character: &Character) -> i32 {
    let mut score = 0;

    if item.kind == ItemKind::Gold {
        return (item.gold_value / 10).min(80) as i32;
    }
    if item.artifact {
        score += 100;
    }
    score += item.tier * 15 + item.enchantment * 5;

    match item.kind {
        ItemKind::Potion => {
            score += match item.potion {
                Some(PotionKind::Healing) => 30,
                Some(PotionKind::CurePoison) => 15,
                Some(_) => 10,
                None => 0,
            }
        }
        ItemKind::Scroll => {
            score += match item.scroll {
                Some(ScrollKind::WordOfRecall) => 25,
                Some(ScrollKind::PhaseDoor) | Some(ScrollKind::Teleport) => 20,
                Some(_) => 10,
                None => 0,
            }
        }
        _ => {
            if let Some(slot) = equip_slot_for(item.kind) {
                if item.power + item.enchantment > equipped_power(character, slot) {
                    score += 40;
                }
            }
        }
    }

    score + (item.gold_value / 20).min(20) as i32
}

/// Pick the most valuable reachable ground item within the greed-scaled
/// detour window. Ties break toward the nearer item.
pub fn best_pickup<'a>(
    world: &'a WorldSnapshot,
    personality: &EffectivePersonality,
) -> Option<(&'a GroundItem, i32)> {
    let detour_limit = 2 + personality.greed / 5;
    let mut best: Option<(&GroundItem, i32, i32)> = None;
    for ground in &world.ground_items {
        if !world.level.is_explored(ground.position) {
            continue;
        }
        let dist = ground.position.chebyshev(world.character.position);
        if dist > detour_limit {
            continue;
        }
        let score = evaluate_ground_item(&ground.item, &world.character);
        if score < PICKUP_MIN_SCORE {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, s, d)) => score > s || (score == s && dist < d),
        };
        if better {
            best = Some((ground, score, dist));
        }
    }
    best.map(|(g, s, _)| (g, s))
}

/// Inventory items worth unloading at a shop: unequipped gear and junk with
/// resale value, never the emergency consumables.
pub fn sellable_items(character: &Character) -> Vec<&Item> {
    character
        .inventory
        .iter()
        .filter(|i| {
            if i.gold_value <= 0 || i.kind == ItemKind::Gold {
                return false;
            }
            match i.kind {
                ItemKind::Potion => !matches!(
                    i.potion,
                    Some(PotionKind::Healing) | Some(PotionKind::CurePoison)
                ),
                ItemKind::Scroll => !matches!(
                    i.scroll,
                    Some(ScrollKind::PhaseDoor)
                        | Some(ScrollKind::Teleport)
                        | Some(ScrollKind::TeleportLevel)
                        | Some(ScrollKind::WordOfRecall)
                ),
                _ => true,
            }
        })
        .collect()
}
