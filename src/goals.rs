//! Goal selection.
//!
//! A priority-ordered arbitration over tagged goals with persistence: the
//! current goal is retained until its re-evaluation window closes, its
//! validity check fails, or a strictly higher-priority candidate appears.

use crate::context::BotContext;
use crate::danger::{global_tier, personality_threshold};
use crate::enums::{DangerTier, EquipSlot, ScrollKind};
use crate::events::{push_trace, DecisionEvent};
use crate::explore::find_exploration_target;
use crate::items;
use crate::model::{EntityId, Point};
use crate::progression;
use crate::state::BotState;
use crate::town;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalKind {
    Flee,
    Recover,
    Kill,
    Kite,
    Take,
    Explore,
    Descend,
    Wait,
    SellToMerchant,
    VisitHealer,
    BuyFromMerchant,
    ReturnPortal,
    ExitTown,
    HuntUnique,
    Farm,
    AscendToFarm,
    TownTrip,
    UseAltar,
    VisitMerchant,
}

impl GoalKind {
    pub fn priority(self) -> i32 {
        match self {
            GoalKind::Flee => 100,
            GoalKind::Kite => 90,
            GoalKind::SellToMerchant => 88,
            GoalKind::VisitHealer => 85,
            GoalKind::BuyFromMerchant => 82,
            GoalKind::Recover => 80,
            GoalKind::HuntUnique => 75,
            GoalKind::Farm => 72,
            GoalKind::Kill => 70,
            GoalKind::TownTrip => 68,
            GoalKind::AscendToFarm => 66,
            GoalKind::UseAltar => 55,
            GoalKind::VisitMerchant => 52,
            GoalKind::Take => 50,
            GoalKind::ReturnPortal => 46,
            GoalKind::ExitTown => 45,
            GoalKind::Descend => 40,
            GoalKind::Explore => 30,
            GoalKind::Wait => 0,
        }
    }

    /// Turns a goal may persist before a forced re-evaluation.
    pub fn reeval_interval(self) -> u64 {
        match self {
            GoalKind::Explore => 15,
            _ => 10,
        }
    }
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GoalKind::Flee => "flee",
            GoalKind::Recover => "recover",
            GoalKind::Kill => "kill",
            GoalKind::Kite => "kite",
            GoalKind::Take => "take",
            GoalKind::Explore => "explore",
            GoalKind::Descend => "descend",
            GoalKind::Wait => "wait",
            GoalKind::SellToMerchant => "sell",
            GoalKind::VisitHealer => "heal",
            GoalKind::BuyFromMerchant => "buy",
            GoalKind::ReturnPortal => "return portal",
            GoalKind::ExitTown => "exit town",
            GoalKind::HuntUnique => "hunt unique",
            GoalKind::Farm => "farm",
            GoalKind::AscendToFarm => "ascend to farm",
            GoalKind::TownTrip => "town trip",
            GoalKind::UseAltar => "use altar",
            GoalKind::VisitMerchant => "visit merchant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotGoal {
    pub kind: GoalKind,
    pub target: Option<Point>,
    pub target_id: Option<EntityId>,
    pub reason: String,
    pub start_turn: u64,
}

impl BotGoal {
    pub fn new(kind: GoalKind, reason: impl Into<String>, start_turn: u64) -> BotGoal {
        BotGoal {
            kind,
            target: None,
            target_id: None,
            reason: reason.into(),
            start_turn,
        }
    }

    pub fn at(mut self, target: Point) -> BotGoal {
        self.target = Some(target);
        self
    }

    pub fn on(mut self, target_id: EntityId) -> BotGoal {
        self.target_id = Some(target_id);
        self
    }
}

/// How far out the bot engages visible monsters, by aggression.
fn engage_range(ctx: &BotContext) -> i32 {
    if ctx.profile.prefers_ranged {
        ctx.profile.engage_distance.max(3)
    } else {
        3 + ctx.personality.aggression / 20
    }
}

pub(crate) fn has_ranged_means(ctx: &BotContext) -> bool {
    let character = &ctx.world.character;
    character.equipment.contains_key(&EquipSlot::Bow)
        || (!character.spells.is_empty() && character.mp > 0)
}

fn kite_goal(ctx: &BotContext) -> Option<BotGoal> {
    if ctx.config.capabilities.kiting == 0 || !ctx.profile.prefers_ranged {
        return None;
    }
    if !has_ranged_means(ctx) {
        return None;
    }
    let target = ctx.nearest_visible_monster()?;
    if target.position.chebyshev(ctx.position()) > engage_range(ctx) + 2 {
        return None;
    }
    Some(
        BotGoal::new(GoalKind::Kite, "ranged class keeps its distance", ctx.turn)
            .at(target.position)
            .on(target.id),
    )
}

fn kill_goal(ctx: &BotContext, _state: &BotState) -> Option<BotGoal> {
    if let Some(m) = ctx.adjacent_monster() {
        return Some(
            BotGoal::new(GoalKind::Kill, "adjacent monster", ctx.turn)
                .at(m.position)
                .on(m.id),
        );
    }
    // Engaging beyond melee reach needs the targeting capability.
    if ctx.config.capabilities.targeting == 0 {
        return None;
    }
    let m = ctx.nearest_visible_monster()?;
    let dist = m.position.chebyshev(ctx.position());
    if dist > engage_range(ctx) {
        return None;
    }
    if !m.is_awake && ctx.personality.aggression <= 60 {
        return None; // let sleeping monsters lie unless pushy
    }
    Some(
        BotGoal::new(GoalKind::Kill, "hunting target in sight", ctx.turn)
            .at(m.position)
            .on(m.id),
    )
}

fn feature_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    let danger_tier = current_global_tier(ctx, state);
    if danger_tier != DangerTier::Safe {
        return None;
    }
    // Altars and dungeon merchants only get attention with a gold buffer
    // left over.
    if ctx.world.character.gold < 200 {
        return None;
    }
    let altar = town::find_visible_tile(ctx, crate::model::Tile::Altar)
        .filter(|&p| !state.is_blacklisted(p, ctx.turn));
    if let Some(p) = altar {
        return Some(BotGoal::new(GoalKind::UseAltar, "altar in sight", ctx.turn).at(p));
    }
    if ctx.in_town() {
        return None;
    }
    // Wandering dungeon merchants are Merchant tiles outside the town.
    let merchant = town::shop_positions(ctx)
        .into_iter()
        .filter(|&(_, p)| !state.is_blacklisted(p, ctx.turn))
        .min_by_key(|&(_, p)| (p.chebyshev(ctx.position()), p.x, p.y));
    merchant.map(|(id, p)| {
        BotGoal::new(GoalKind::VisitMerchant, "wandering merchant", ctx.turn)
            .at(p)
            .on(id as u32)
    })
}

fn take_goal(ctx: &BotContext, _state: &BotState) -> Option<BotGoal> {
    let (ground, score) = items::best_pickup(ctx.world, &ctx.personality)?;
    Some(
        BotGoal::new(
            GoalKind::Take,
            format!("pickup worth {}", score),
            ctx.turn,
        )
        .at(ground.position)
        .on(ground.id),
    )
}

fn explore_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    let sweep = state.sweep_mode;
    let found = find_exploration_target(ctx, state, sweep)?;
    let reason = if sweep { "sweep frontier" } else { "frontier" };
    Some(BotGoal::new(GoalKind::Explore, reason, ctx.turn).at(found.target))
}

pub fn current_global_tier(ctx: &BotContext, state: &BotState) -> DangerTier {
    let avoidance = crate::danger::avoidance_threshold(&ctx.personality, &ctx.world.character);
    let at_char = state
        .danger
        .as_ref()
        .map(|d| d.grid.get(ctx.position()))
        .unwrap_or(0);
    global_tier(at_char, avoidance)
}

fn flee_goal(ctx: &BotContext, state: &BotState) -> Option<BotGoal> {
    if ctx.config.capabilities.retreat == 0 || ctx.profile.never_retreats {
        return None;
    }
    // Status effects alone never trigger a retreat.
    if ctx.visible_monsters.is_empty() {
        return None;
    }
    if ctx.turn < state.flee_cooldown_until {
        return None;
    }
    let tier = current_global_tier(ctx, state);
    if tier < DangerTier::Danger {
        return None;
    }
    let character = &ctx.world.character;
    let caution_floor = 0.3 + ctx.personality.caution as f64 / 250.0;
    if character.hp_ratio() >= caution_floor {
        return None;
    }
    let mut goal = BotGoal::new(GoalKind::Flee, "danger above caution floor", ctx.turn);
    if let Some(stairs) = state.known_stairs_up {
        goal = goal.at(stairs);
    }
    Some(goal)
}

fn recover_goal(ctx: &BotContext, state: &BotState) -> Option<BotGoal> {
    let character = &ctx.world.character;
    if character.hp_ratio() >= 0.5 {
        return None;
    }
    let local = state
        .danger
        .as_ref()
        .map(|d| d.grid.get(ctx.position()))
        .unwrap_or(0) as f64;
    if local >= personality_threshold(&ctx.personality, character.hp_ratio()) {
        return None;
    }
    items::find_potion(character, crate::enums::PotionKind::Healing)?;
    Some(BotGoal::new(GoalKind::Recover, "low HP, quiet spot", ctx.turn))
}

/// Top-down trigger scan in strict priority order. Always yields something;
/// `Wait` is the floor.
fn propose_goal(ctx: &BotContext, state: &mut BotState) -> BotGoal {
    if !ctx.in_town() {
        if let Some(goal) = flee_goal(ctx, state) {
            return goal;
        }
        if let Some(goal) = kite_goal(ctx) {
            return goal;
        }
    } else if let Some(goal) = town::town_errands_goal(ctx, state) {
        return goal;
    }
    if let Some(goal) = recover_goal(ctx, state) {
        return goal;
    }
    if !ctx.in_town() {
        if let Some(goal) = progression::hunt_unique_goal(ctx, state) {
            return goal;
        }
        if let Some(goal) = progression::farm_goal(ctx, state) {
            return goal;
        }
        if let Some(goal) = kill_goal(ctx, state) {
            return goal;
        }
        if let Some(goal) = progression::town_trip_goal(ctx, state) {
            return goal;
        }
        if let Some(goal) = progression::ascend_to_farm_goal(ctx, state) {
            return goal;
        }
    }
    if let Some(goal) = feature_goal(ctx, state) {
        return goal;
    }
    if let Some(goal) = take_goal(ctx, state) {
        return goal;
    }
    if ctx.in_town() {
        if let Some(goal) = town::town_exit_goal(ctx, state) {
            return goal;
        }
    } else {
        if let Some(goal) = progression::descend_goal(ctx, state) {
            return goal;
        }
        if let Some(goal) = explore_goal(ctx, state) {
            return goal;
        }
    }
    BotGoal::new(GoalKind::Wait, "nothing applies", ctx.turn)
}

/// Per-variant validity of the retained goal.
pub fn is_goal_still_valid(goal: &BotGoal, ctx: &BotContext, state: &mut BotState) -> bool {
    let world = ctx.world;
    match goal.kind {
        GoalKind::Wait => false,
        GoalKind::Flee => {
            current_global_tier(ctx, state) >= DangerTier::Caution
                && world.character.hp_ratio() < 0.8
        }
        GoalKind::Recover => {
            world.character.hp_ratio() < 0.9
                && items::find_potion(&world.character, crate::enums::PotionKind::Healing).is_some()
        }
        GoalKind::Kill => match goal.target_id.and_then(|id| world.monster_by_id(id)) {
            Some(m) => m.visible || m.position.chebyshev(ctx.position()) <= 1,
            None => false,
        },
        GoalKind::Kite => goal
            .target_id
            .map_or(false, |id| world.monster_by_id(id).is_some()),
        GoalKind::HuntUnique => goal
            .target_id
            .map_or(true, |id| world.monster_by_id(id).is_some()),
        GoalKind::Farm => goal.target_id.map_or(false, |id| {
            world.monster_by_id(id).is_some() || world.ground_item_by_id(id).is_some()
        }),
        GoalKind::Take => goal
            .target_id
            .and_then(|id| world.ground_item_by_id(id))
            .is_some(),
        GoalKind::Explore => match goal.target {
            Some(t) => {
                !state.is_blacklisted(t, ctx.turn)
                    && world.level.is_passable(t)
                    && if state.sweep_mode {
                        // Arriving marks it seen, which retires the goal.
                        !state.seen_this_visit.contains(t)
                    } else {
                        crate::model::ADJACENT_OFFSETS
                            .iter()
                            .any(|&(dx, dy)| !world.level.is_explored(t.offset(dx, dy)))
                    }
            }
            None => false,
        },
        GoalKind::Descend => {
            state.known_stairs_down.is_some() && goal.target == state.known_stairs_down
        }
        // Stays valid while standing on the stairs; the arrival handler
        // emits the ascend on this same tick. A targetless variant leans on
        // a teleport-level scroll instead.
        GoalKind::AscendToFarm => match goal.target {
            Some(t) => state.known_stairs_up == Some(t),
            None => true,
        },
        GoalKind::TownTrip => {
            items::find_scroll(&world.character, ScrollKind::WordOfRecall).is_some()
        }
        GoalKind::UseAltar | GoalKind::VisitMerchant => goal
            .target
            .map_or(false, |t| !state.is_blacklisted(t, ctx.turn)),
        GoalKind::SellToMerchant => {
            ctx.in_town()
                && goal.target_id.map_or(false, |id| {
                    !state.shops_visited_for_selling.contains(&(id as u8))
                })
        }
        GoalKind::BuyFromMerchant => {
            ctx.in_town()
                && goal.target_id.map_or(false, |id| {
                    !state.shops_visited_for_buying.contains(&(id as u8))
                })
        }
        GoalKind::VisitHealer => ctx.in_town() && !state.healer_visited,
        GoalKind::ReturnPortal | GoalKind::ExitTown => ctx.in_town(),
    }
}

/// Track a moving target: the goal's target point follows the monster and
/// the single-goal flow cache is dropped when it drifts.
fn refresh_target_drift(goal: &mut BotGoal, ctx: &BotContext) -> bool {
    if let Some(id) = goal.target_id {
        if let Some(m) = ctx.world.monster_by_id(id) {
            if goal.target != Some(m.position) {
                goal.target = Some(m.position);
                return true;
            }
        }
    }
    false
}

/// Arbitrate the goal for this tick, mutating `state.current_goal`.
pub fn select_goal(ctx: &BotContext, state: &mut BotState) {
    let mut current = state.current_goal.take();

    let keep = match &mut current {
        Some(goal) => {
            let fresh = ctx.turn.saturating_sub(goal.start_turn) < goal.kind.reeval_interval();
            fresh && is_goal_still_valid(goal, ctx, state)
        }
        None => false,
    };

    if keep {
        let mut goal = current.unwrap();
        // A strictly higher-priority trigger still overrides persistence.
        let candidate = propose_goal(ctx, state);
        if candidate.kind.priority() > goal.kind.priority() {
            debug!(
                "goal override: {} (p{}) -> {} (p{})",
                goal.kind,
                goal.kind.priority(),
                candidate.kind,
                candidate.kind.priority()
            );
            push_trace(
                &mut state.trace,
                DecisionEvent::GoalSelected {
                    goal: candidate.kind.to_string(),
                    reason: candidate.reason.clone(),
                },
            );
            state.invalidate_single_goal_flow();
            state.current_goal = Some(candidate);
            return;
        }
        if refresh_target_drift(&mut goal, ctx) {
            state.invalidate_single_goal_flow();
        }
        push_trace(
            &mut state.trace,
            DecisionEvent::GoalRetained {
                goal: goal.kind.to_string(),
            },
        );
        state.current_goal = Some(goal);
        return;
    }

    if let Some(old) = &current {
        push_trace(
            &mut state.trace,
            DecisionEvent::GoalDropped {
                goal: old.kind.to_string(),
                reason: "stale or invalid".into(),
            },
        );
    }

    let goal = propose_goal(ctx, state);
    let target_changed = current.as_ref().map(|c| c.target) != Some(goal.target);
    if target_changed || current.as_ref().map(|c| c.kind) != Some(goal.kind) {
        state.invalidate_single_goal_flow();
    }
    debug!("goal selected: {} ({})", goal.kind, goal.reason);
    push_trace(
        &mut state.trace,
        DecisionEvent::GoalSelected {
            goal: goal.kind.to_string(),
            reason: goal.reason.clone(),
        },
    );
    state.current_goal = Some(goal);
}

#[cfg(test)]
#[path = "./goals_test.rs"]
mod goals_test;
