//! Town behaviour.
//!
//! On the surface the bot runs a fixed errand loop: unload loot at shops,
//! top up HP at the healer, buy whatever the next dive needs, then leave
//! through the return portal (or the dungeon entrance when no trip is
//! pending). Shop-visit sets keep each errand from repeating.

use crate::context::BotContext;
use crate::enums::{BuyNeed, PotionKind, ScrollKind};
use crate::events::{push_trace, DecisionEvent};
use crate::goals::{BotGoal, GoalKind};
use crate::items;
use crate::model::{Point, Tile};
use crate::progression::healing_required;
use crate::state::{BotState, TownNeeds};

/// Nearest visible tile of a given kind.
pub fn find_visible_tile(ctx: &BotContext, wanted: Tile) -> Option<Point> {
    let level = &ctx.world.level;
    let pos = ctx.position();
    let mut best: Option<(i32, Point)> = None;
    for y in 0..level.height {
        for x in 0..level.width {
            let p = Point::new(x, y);
            if level.tiles[level.idx(p)] != wanted || !level.is_explored(p) {
                continue;
            }
            let d = p.chebyshev(pos);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, p));
            }
        }
    }
    best.map(|(_, p)| p)
}

/// All explored shop tiles on the level, with their shop ids.
pub fn shop_positions(ctx: &BotContext) -> Vec<(u8, Point)> {
    let level = &ctx.world.level;
    let mut shops = Vec::new();
    for y in 0..level.height {
        for x in 0..level.width {
            let p = Point::new(x, y);
            if let Tile::Merchant(id) = level.tiles[level.idx(p)] {
                if level.is_explored(p) {
                    shops.push((id, p));
                }
            }
        }
    }
    shops
}

fn nearest_unvisited(
    shops: &[(u8, Point)],
    visited: &std::collections::HashSet<u8>,
    from: Point,
) -> Option<(u8, Point)> {
    shops
        .iter()
        .copied()
        .filter(|(id, _)| !visited.contains(id))
        .min_by_key(|&(_, p)| (p.chebyshev(from), p.x, p.y))
}

/// Supplies to restock for the next dive, sized for the depth the bot will
/// return to.
pub fn shopping_needs(ctx: &BotContext, state: &BotState) -> TownNeeds {
    let character = &ctx.world.character;
    let target_depth = state.town_return_depth.unwrap_or(1).max(1);
    TownNeeds {
        tp: ctx.config.capabilities.town
            && items::count_scrolls(character, ScrollKind::WordOfRecall) < 2,
        healing: items::count_potions(character, PotionKind::Healing)
            < healing_required(target_depth),
        escape: target_depth >= 10 && items::find_escape_scroll(character).is_none(),
    }
}

/// First unmet need, in restock order.
pub fn next_buy_need(needs: &TownNeeds) -> Option<BuyNeed> {
    if needs.healing {
        Some(BuyNeed::Healing)
    } else if needs.tp {
        Some(BuyNeed::TownPortal)
    } else if needs.escape {
        Some(BuyNeed::Escape)
    } else {
        None
    }
}

/// Sell -> heal -> buy, as a goal proposal. Leaving town is a separate,
/// lower-priority proposal so pickups still outrank the door.
pub fn town_errands_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    if !ctx.in_town() {
        return None;
    }
    let character = &ctx.world.character;
    let shops = shop_positions(ctx);

    if !items::sellable_items(character).is_empty() {
        if let Some((shop, p)) =
            nearest_unvisited(&shops, &state.shops_visited_for_selling, ctx.position())
        {
            return Some(
                BotGoal::new(GoalKind::SellToMerchant, "unloading loot", ctx.turn)
                    .at(p)
                    .on(shop as u32),
            );
        }
    }

    if character.hp < character.max_hp && !state.healer_visited {
        if let Some(healer) = find_visible_tile(ctx, Tile::Healer) {
            return Some(BotGoal::new(GoalKind::VisitHealer, "patching up", ctx.turn).at(healer));
        }
    }

    let needs = shopping_needs(ctx, state);
    if needs != state.town_needs {
        state.town_needs = needs;
        push_trace(
            &mut state.trace,
            DecisionEvent::TownNeeds {
                tp: needs.tp,
                healing: needs.healing,
                escape: needs.escape,
            },
        );
    }
    if needs.any() && character.gold > 0 {
        if let Some((shop, p)) =
            nearest_unvisited(&shops, &state.shops_visited_for_buying, ctx.position())
        {
            return Some(
                BotGoal::new(GoalKind::BuyFromMerchant, "restocking supplies", ctx.turn)
                    .at(p)
                    .on(shop as u32),
            );
        }
    }

    None
}

/// Leave town once the errand loop has nothing left to do.
pub fn town_exit_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    if !ctx.in_town() {
        return None;
    }
    if state.town_return_depth.is_some() {
        if let Some(portal) = find_visible_tile(ctx, Tile::Portal) {
            return Some(
                BotGoal::new(GoalKind::ReturnPortal, "errands done, diving back", ctx.turn)
                    .at(portal),
            );
        }
    }
    if let Some(entrance) = find_visible_tile(ctx, Tile::DungeonEntrance) {
        return Some(BotGoal::new(GoalKind::ExitTown, "back to the dungeon", ctx.turn).at(entrance));
    }
    None
}

#[cfg(test)]
#[path = "./town_test.rs"]
mod town_test;
