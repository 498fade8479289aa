//! Survival layer.
//!
//! Tier-gated emergency responses that run before any goal-driven movement:
//! consumable triage at CRITICAL/DANGER, slow-burn cures at CAUTION, and
//! DOT detection while nominally safe. Also the flee-step fallback used
//! when a FLEE goal has no stairs to run for.

use crate::actions::BotAction;
use crate::context::BotContext;
use crate::danger::immediate_tier;
use crate::enums::{DangerTier, Direction, MonsterFlag, PotionKind, ScrollKind, StatusKind};
use crate::events::{push_trace, DecisionEvent};
use crate::items;
use crate::model::ADJACENT_OFFSETS;
use crate::state::BotState;
use log::debug;

/// Phase door lands within roughly this radius.
const PHASE_DOOR_RADIUS: i32 = 8;

/// DOT alarm threshold, HP per turn with nothing adjacent.
const DOT_RATE_ALARM: f64 = 2.0;

/// Expected landing zone of a phase door must be meaningfully cooler than
/// the current tile to be worth the scroll.
pub fn phase_door_safe(ctx: &BotContext, state: &BotState) -> bool {
    let danger = match &state.danger {
        Some(d) => &d.grid,
        None => return false,
    };
    let here = danger.get(ctx.position());
    if here == 0 {
        return false;
    }
    let level = &ctx.world.level;
    let mut tiles = 0i64;
    let mut total = 0i64;
    for dy in -PHASE_DOOR_RADIUS..=PHASE_DOOR_RADIUS {
        for dx in -PHASE_DOOR_RADIUS..=PHASE_DOOR_RADIUS {
            let p = ctx.position().offset(dx, dy);
            if !level.is_passable(p) {
                continue;
            }
            tiles += 1;
            total += danger.get(p) as i64;
        }
    }
    if tiles == 0 {
        return false;
    }
    let avg = total / tiles;
    avg < (here as i64) * 7 / 10
}

fn use_item(state: &mut BotState, tier: DangerTier, what: &str, id: u32) -> Option<BotAction> {
    debug!("survival: {} ({})", what, tier);
    push_trace(
        &mut state.trace,
        DecisionEvent::SurvivalAction {
            tier,
            action: what.into(),
        },
    );
    Some(BotAction::Use { item_id: id })
}

/// Tier-gated survival response; `None` lets the tick fall through to stuck
/// recovery and goal movement.
pub fn survival_action(ctx: &BotContext, state: &mut BotState) -> Option<BotAction> {
    let character = &ctx.world.character;
    let tier = immediate_tier(ctx.world);
    let hp_ratio = character.hp_ratio();

    match tier {
        DangerTier::Critical => {
            if hp_ratio < 0.6 {
                if let Some(p) = items::find_potion(character, PotionKind::Healing) {
                    return use_item(state, tier, "healing potion", p.id);
                }
            }
            if let Some(s) = items::find_scroll(character, ScrollKind::PhaseDoor) {
                if phase_door_safe(ctx, state) {
                    return use_item(state, tier, "phase door", s.id);
                }
            }
            if let Some(s) = items::find_scroll(character, ScrollKind::Teleport) {
                return use_item(state, tier, "teleport scroll", s.id);
            }
            None
        }
        DangerTier::Danger => {
            if hp_ratio < 0.4 {
                if let Some(p) = items::find_potion(character, PotionKind::Healing) {
                    return use_item(state, tier, "healing potion", p.id);
                }
            }
            if character.has_status(StatusKind::Poisoned) && state.hp_drop_rate() >= 3.0 {
                if let Some(p) = items::find_potion(character, PotionKind::CurePoison) {
                    return use_item(state, tier, "cure poison", p.id);
                }
            }
            let evil_adjacent = ctx
                .visible_monsters
                .iter()
                .any(|m| {
                    m.template.has_flag(MonsterFlag::Evil)
                        && m.position.chebyshev(ctx.position()) <= 1
                });
            if evil_adjacent && !character.has_status(StatusKind::ProtectionFromEvil) {
                if let Some(s) = items::find_scroll(character, ScrollKind::ProtectionFromEvil) {
                    return use_item(state, tier, "protection from evil", s.id);
                }
            }
            None
        }
        DangerTier::Caution => {
            if character.has_status(StatusKind::Poisoned) && hp_ratio < 0.5 {
                if let Some(p) = items::find_potion(character, PotionKind::CurePoison) {
                    return use_item(state, tier, "cure poison", p.id);
                }
            }
            if ctx.adjacent_monsters >= 2
                && ctx.config.capabilities.tactics >= 2
                && !character.has_status(StatusKind::Hasted)
            {
                if let Some(p) = items::find_potion(character, PotionKind::Speed) {
                    return use_item(state, tier, "speed potion", p.id);
                }
            }
            None
        }
        DangerTier::Safe => {
            // A DOT is eating us with nothing in sight.
            if ctx.adjacent_monsters == 0
                && state.hp_drop_rate() >= DOT_RATE_ALARM
                && character.has_status(StatusKind::Poisoned)
            {
                if let Some(p) = items::find_potion(character, PotionKind::CurePoison) {
                    return use_item(state, tier, "cure poison", p.id);
                }
            }
            None
        }
    }
}

/// One step away from danger when fleeing without a stairs target: the
/// passable, unoccupied neighbour with the lowest danger, ties broken by
/// distance from the nearest monster and then scan order.
pub fn flee_step(ctx: &BotContext, state: &BotState) -> Option<BotAction> {
    let danger = state.danger.as_ref()?;
    let level = &ctx.world.level;
    let pos = ctx.position();
    let nearest = ctx.nearest_visible_monster().map(|m| m.position);

    let mut best: Option<(i32, i32, Direction)> = None;
    for (dx, dy) in ADJACENT_OFFSETS {
        let n = pos.offset(dx, dy);
        if !level.is_passable(n) {
            continue;
        }
        if ctx.visible_monsters.iter().any(|m| m.position == n) {
            continue;
        }
        let dir = match Direction::from_delta(dx, dy) {
            Some(d) => d,
            None => continue,
        };
        let d = danger.grid.get(n);
        // Larger distance from the nearest monster is better; negate so a
        // single lexicographic "less is better" comparison works.
        let pull = nearest.map_or(0, |mp| -n.chebyshev(mp));
        if best.map_or(true, |(bd, bp, _)| (d, pull) < (bd, bp)) {
            best = Some((d, pull, dir));
        }
    }
    let (_, _, dir) = best?;
    Some(BotAction::Move { direction: dir })
}

#[cfg(test)]
#[path = "./survival_test.rs"]
mod survival_test;
