//! Progression state machine.
//!
//! Owns the descent contract: readiness checks at the next-depth boundary,
//! the farming loop (tether geometry, sweep-yoyo, town trips), the
//! unique-blocker hunt, and the Morgoth hunt at the bottom. The sweep-flip
//! and unique-hunt flip machines carry independent state and never read
//! each other's fields.

use crate::context::BotContext;
use crate::enums::{ClassTier, MonsterFlag, PotionKind, ScrollKind};
use crate::events::{push_trace, DecisionEvent};
use crate::explore::exploration_complete;
use crate::goals::{BotGoal, GoalKind};
use crate::items;
use crate::model::{DungeonLevel, Monster, Point};
use crate::state::BotState;
use log::debug;

/// Maximum dungeon depth; Morgoth lives here.
pub const MAX_DEPTH: i32 = 50;

/// Sweep gives up after this many turns without completing.
pub const SWEEP_TIMEOUT_TURNS: u64 = 500;

/// Tether boxes count as swept at this coverage of their non-wall tiles.
pub const TETHER_COMPLETE_PCT: u32 = 80;

/// Morgoth flip triggers once this share of the floor has been seen.
pub const MORGOTH_SWEEP_PCT: u32 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessIssue {
    UnderLevelled { depth: i32, required: i32 },
    NeedsHealing { required: usize },
    NeedsTownPortal,
    NeedsEscape,
}

impl std::fmt::Display for ReadinessIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadinessIssue::UnderLevelled { depth, required } => {
                write!(f, "Under-levelled for D{} (need level {})", depth, required)
            }
            ReadinessIssue::NeedsHealing { required } => {
                write!(f, "need {} healing potions", required)
            }
            ReadinessIssue::NeedsTownPortal => write!(f, "no town portal scroll"),
            ReadinessIssue::NeedsEscape => write!(f, "no escape scroll"),
        }
    }
}

/// Healing potions expected in the pack before entering `depth`.
pub fn healing_required(depth: i32) -> usize {
    (depth as usize / 10).max(1)
}

/// First failed readiness rule for descending into `depth`, graded by the
/// preparedness capability level.
pub fn readiness_issue(ctx: &BotContext, depth: i32) -> Option<ReadinessIssue> {
    let caps = &ctx.config.capabilities;
    if caps.preparedness == 0 {
        return None;
    }
    let character = &ctx.world.character;

    let required = ctx
        .profile
        .min_level_for_depth(depth, caps.depth_gate_offset);
    if character.level < required {
        return Some(ReadinessIssue::UnderLevelled { depth, required });
    }
    if caps.preparedness >= 2 {
        let required = healing_required(depth);
        if items::count_potions(character, PotionKind::Healing) < required {
            return Some(ReadinessIssue::NeedsHealing { required });
        }
    }
    if caps.preparedness >= 3 {
        if caps.town && depth >= 5 && items::count_scrolls(character, ScrollKind::WordOfRecall) == 0
        {
            return Some(ReadinessIssue::NeedsTownPortal);
        }
        if depth >= 10 && items::find_escape_scroll(character).is_none() {
            return Some(ReadinessIssue::NeedsEscape);
        }
    }
    None
}

/// Living uniques on this level that gate the next depth.
pub fn unique_blockers<'a>(ctx: &BotContext<'a>) -> Vec<&'a Monster> {
    let depth = ctx.depth();
    ctx.world
        .monsters
        .iter()
        .filter(|m| {
            m.is_alive()
                && m.template.has_flag(MonsterFlag::Unique)
                && m.template.min_depth <= depth + 1
        })
        .collect()
}

fn find_morgoth<'a>(ctx: &BotContext<'a>) -> Option<&'a Monster> {
    ctx.world
        .monsters
        .iter()
        .find(|m| m.is_alive() && m.template.has_flag(MonsterFlag::Unique) && m.template.min_depth >= MAX_DEPTH)
}

/// Share of passable tiles seen this visit, in percent.
pub fn seen_coverage_pct(level: &DungeonLevel, state: &BotState) -> u32 {
    if level.passable_count == 0 {
        return 100;
    }
    state.seen_this_visit.count() * 100 / level.passable_count
}

fn sweep_eligible(ctx: &BotContext) -> bool {
    let caps = &ctx.config.capabilities;
    if caps.sweep == 0 || !caps.sweep_enabled {
        return false;
    }
    let depth = ctx.depth();
    if depth == 0 {
        return false;
    }
    // Explicit range wins; squishy classes sweep everywhere by default.
    if caps.sweep_range.start != 0 || caps.sweep_range.end != 0 {
        caps.sweep_range.contains(depth)
    } else {
        ctx.profile.tier == ClassTier::Squishy
    }
}

/// Axis-aligned tether box bounds clipped to the level.
fn tether_bounds(level: &DungeonLevel, origin: Point, radius: i32) -> (Point, Point) {
    let min = Point::new((origin.x - radius).max(0), (origin.y - radius).max(0));
    let max = Point::new(
        (origin.x + radius).min(level.width - 1),
        (origin.y + radius).min(level.height - 1),
    );
    (min, max)
}

/// A tether box is complete once enough of its non-wall tiles were seen.
pub fn tether_complete(level: &DungeonLevel, state: &BotState, origin: Point, radius: i32) -> bool {
    let (min, max) = tether_bounds(level, origin, radius);
    let mut walkable = 0u32;
    let mut seen = 0u32;
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            let p = Point::new(x, y);
            if !level.is_passable(p) {
                continue;
            }
            walkable += 1;
            if state.seen_this_visit.contains(p) {
                seen += 1;
            }
        }
    }
    walkable == 0 || seen * 100 / walkable >= TETHER_COMPLETE_PCT
}

/// Mode upkeep that must run before goal arbitration: farming entry/exit,
/// sweep arming, timeout, completion, and both flip machines.
pub fn update_modes(ctx: &BotContext, state: &mut BotState) {
    let depth = ctx.depth();
    let level = &ctx.world.level;
    let caps = &ctx.config.capabilities;

    // --- farming entry/exit at the next-depth boundary -------------------
    if depth > 0 && depth < MAX_DEPTH && caps.preparedness > 0 && caps.farming {
        let descent_wanted = exploration_complete(level)
            || state.turns_on_level as i32 >= ctx.personality.patience;
        if !state.farming_mode && descent_wanted {
            if let Some(issue) = readiness_issue(ctx, depth + 1) {
                state.farming_mode = true;
                state.farm_blocked_depth = depth + 1;
                state.farm_gold_target = 200 + 50 * (depth + 1) as i64;
                state.farm_start_turn = ctx.turn;
                if state.tethered_origin.is_none()
                    && caps.surf > 0
                    && caps.surf_range.contains(depth)
                {
                    state.tethered_origin = Some(ctx.position());
                    state.tethered_radius = caps.surf_radii().first().copied().unwrap_or(0);
                }
                debug!("farming: blocked at D{} ({})", depth + 1, issue);
                push_trace(
                    &mut state.trace,
                    DecisionEvent::FarmingEntered {
                        blocked_depth: depth + 1,
                    },
                );
            }
        }
    }
    if state.farming_mode && readiness_issue(ctx, state.farm_blocked_depth).is_none() {
        push_trace(
            &mut state.trace,
            DecisionEvent::FarmingExited {
                blocked_depth: state.farm_blocked_depth,
            },
        );
        state.farming_mode = false;
        state.farm_blocked_depth = 0;
        state.tethered_origin = None;
        state.tethered_radius = 0;
    }

    // --- tether radius advancement ---------------------------------------
    if let Some(origin) = state.tethered_origin {
        if state.tethered_radius > 0 && tether_complete(level, state, origin, state.tethered_radius)
        {
            state.tethered_flip_count += 1;
            let next = caps
                .surf_radii()
                .iter()
                .copied()
                .find(|&r| r > state.tethered_radius);
            match next {
                Some(r) => {
                    debug!("tether: radius {} done, widening to {}", state.tethered_radius, r);
                    state.tethered_radius = r;
                }
                None => {
                    debug!("tether: all radii done");
                    state.tethered_origin = None;
                    state.tethered_radius = 0;
                }
            }
        }
    }

    // --- sweep arming / timeout / completion ------------------------------
    if state.sweep_mode {
        if ctx.turn.saturating_sub(state.sweep_start_turn) > SWEEP_TIMEOUT_TURNS {
            state.sweep_mode = false;
            state.sweep_exhausted = true;
            push_trace(&mut state.trace, DecisionEvent::SweepExhausted { depth });
        } else if seen_coverage_pct(level, state) >= caps.sweep_threshold_pct() {
            state.sweep_mode = false;
            // Completing the sweep one level above the blocker arms the
            // flip: descend to regenerate spawns, come straight back.
            if state.farming_mode
                && depth == state.farm_blocked_depth - 1
                && !state.sweep_flip_active
            {
                state.sweep_flip_active = true;
                state.sweep_flip_target_depth = depth;
                state.sweep_flip_visited_blocked = false;
                push_trace(
                    &mut state.trace,
                    DecisionEvent::SweepFlip {
                        phase: "armed".into(),
                    },
                );
            }
        }
    } else if depth > 0
        && depth < MAX_DEPTH
        && !state.sweep_exhausted
        && sweep_eligible(ctx)
        && exploration_complete(level)
        && seen_coverage_pct(level, state) < caps.sweep_threshold_pct()
    {
        state.sweep_mode = true;
        state.sweep_start_turn = ctx.turn;
        push_trace(&mut state.trace, DecisionEvent::SweepStarted { depth });
    }

    // --- sweep flip progression ------------------------------------------
    if state.sweep_flip_active {
        if depth == state.sweep_flip_target_depth + 1 {
            state.sweep_flip_visited_blocked = true;
        } else if depth == state.sweep_flip_target_depth && state.sweep_flip_visited_blocked {
            state.sweep_flip_active = false;
            state.sweep_flip_visited_blocked = false;
            state
                .seen_this_visit
                .reset_for(level.width, level.height);
            state.sweep_exhausted = false;
            state.sweep_start_turn = ctx.turn;
            push_trace(
                &mut state.trace,
                DecisionEvent::SweepFlip {
                    phase: "complete".into(),
                },
            );
        }
    }

    // --- Morgoth hunt ----------------------------------------------------
    if depth == MAX_DEPTH {
        let boss_visible = find_morgoth(ctx).map_or(false, |m| m.visible);
        if boss_visible {
            if state.morgoth_flip_active {
                state.morgoth_flip_active = false;
                push_trace(
                    &mut state.trace,
                    DecisionEvent::MorgothFlip {
                        phase: "boss sighted".into(),
                    },
                );
            }
            state.sweep_mode = false;
        } else if state.morgoth_flip_active && state.turns_on_level == 0 {
            // Just flipped back down; the fresh level restarts the sweep.
            state.morgoth_flip_active = false;
            push_trace(
                &mut state.trace,
                DecisionEvent::MorgothFlip {
                    phase: "complete".into(),
                },
            );
        } else if seen_coverage_pct(level, state) < MORGOTH_SWEEP_PCT {
            if !state.sweep_mode {
                state.sweep_mode = true;
                state.sweep_start_turn = ctx.turn;
                push_trace(&mut state.trace, DecisionEvent::SweepStarted { depth });
            }
        } else if !state.morgoth_flip_active {
            state.morgoth_flip_active = true;
            push_trace(
                &mut state.trace,
                DecisionEvent::MorgothFlip {
                    phase: "armed".into(),
                },
            );
        }
    }

    // --- unique blocker bookkeeping --------------------------------------
    if depth > 0 && depth < MAX_DEPTH {
        let blockers = unique_blockers(ctx);
        if blockers.len() >= 2 {
            if state.hunting_unique_blocker.is_none() {
                let target = blockers[0];
                state.hunting_unique_blocker = Some(target.id);
                state.unique_hunt_flip_depth = Some(depth);
                push_trace(
                    &mut state.trace,
                    DecisionEvent::UniqueHunt {
                        target: target.template.name.clone(),
                    },
                );
            }
        } else if state.unique_hunt_flip_depth == Some(depth) {
            // The blockers thinned out on their own level; stand down.
            state.hunting_unique_blocker = None;
            state.unique_hunt_flip_depth = None;
        }
    }
}

pub fn hunt_unique_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    if ctx.depth() >= MAX_DEPTH {
        return None;
    }
    let home = state.unique_hunt_flip_depth?;
    if home != ctx.depth() {
        // Hunting resumes on the blockers' level; navigate back first.
        let (stairs, reason) = if home > ctx.depth() {
            (state.known_stairs_down, "returning down to blocked level")
        } else {
            (state.known_stairs_up, "returning up to blocked level")
        };
        return Some(BotGoal::new(GoalKind::HuntUnique, reason, ctx.turn).at(stairs?));
    }

    let blockers = unique_blockers(ctx);
    if blockers.len() < 2 {
        return None;
    }
    let id = state.hunting_unique_blocker?;
    let target = ctx.world.monster_by_id(id).or(blockers.first().copied())?;
    let mut goal = BotGoal::new(
        GoalKind::HuntUnique,
        format!("{} blocks the stairs", target.template.name),
        ctx.turn,
    )
    .on(target.id);
    if target.visible {
        goal = goal.at(target.position);
    }
    Some(goal)
}

pub fn farm_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    if !state.farming_mode || !ctx.config.capabilities.farming {
        return None;
    }
    let origin = state.tethered_origin?;
    let radius = state.tethered_radius;
    if radius == 0 {
        return None;
    }
    let level = &ctx.world.level;
    let (min, max) = tether_bounds(level, origin, radius);
    let inside = |p: Point| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y;

    // Kill first, loot second.
    if let Some(m) = ctx
        .visible_monsters
        .iter()
        .find(|m| inside(m.position))
    {
        return Some(
            BotGoal::new(GoalKind::Farm, "tethered prey", ctx.turn)
                .at(m.position)
                .on(m.id),
        );
    }
    if let Some(g) = ctx.visible_items.iter().find(|g| {
        inside(g.position)
            && items::evaluate_ground_item(&g.item, &ctx.world.character) >= items::PICKUP_MIN_SCORE
    }) {
        return Some(
            BotGoal::new(GoalKind::Farm, "tethered loot", ctx.turn)
                .at(g.position)
                .on(g.id),
        );
    }

    // Tether sweep: walk the nearest unseen tile inside the box.
    let mut best: Option<(i32, Point)> = None;
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            let p = Point::new(x, y);
            if !level.is_passable(p) || state.seen_this_visit.contains(p) {
                continue;
            }
            let d = p.chebyshev(ctx.position());
            if d == 0 {
                continue;
            }
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, p));
            }
        }
    }
    best.map(|(_, p)| BotGoal::new(GoalKind::Farm, "walking the tether", ctx.turn).at(p))
}

/// Needs that justify a shopping run, mirrored into `state.town_needs` when
/// the trip starts.
pub fn dungeon_needs(ctx: &BotContext) -> crate::state::TownNeeds {
    let character = &ctx.world.character;
    let depth = ctx.depth();
    crate::state::TownNeeds {
        tp: items::count_scrolls(character, ScrollKind::WordOfRecall) < 2,
        healing: items::count_potions(character, PotionKind::Healing) < healing_required(depth.max(1)),
        escape: depth >= 10 && items::find_escape_scroll(character).is_none(),
    }
}

pub fn gold_target(state: &BotState, depth: i32) -> i64 {
    if state.farming_mode {
        state.farm_gold_target
    } else {
        200 + 50 * depth as i64
    }
}

pub fn town_trip_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    if !ctx.config.capabilities.town || ctx.depth() <= 1 {
        return None;
    }
    items::find_scroll(&ctx.world.character, ScrollKind::WordOfRecall)?;
    if ctx.world.character.gold < gold_target(state, ctx.depth()) {
        return None;
    }
    let needs = dungeon_needs(ctx);
    if !needs.any() {
        return None;
    }
    Some(BotGoal::new(
        GoalKind::TownTrip,
        "stocked gold, missing supplies",
        ctx.turn,
    ))
}

pub fn ascend_to_farm_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    let depth = ctx.depth();
    if depth == 0 {
        return None;
    }
    let stairs_up = state.known_stairs_up;

    // Morgoth flip: leave the summit to regenerate it.
    if depth == MAX_DEPTH && state.morgoth_flip_active {
        return Some(
            BotGoal::new(GoalKind::AscendToFarm, "regenerating the summit", ctx.turn)
                .at(stairs_up?),
        );
    }

    // Sweep flip, return leg: the blocked level has been touched.
    if state.sweep_flip_active
        && depth == state.sweep_flip_target_depth + 1
        && state.sweep_flip_visited_blocked
    {
        return Some(
            BotGoal::new(GoalKind::AscendToFarm, "sweep flip return", ctx.turn).at(stairs_up?),
        );
    }

    // Danger-blocked descent retreats upward to regroup.
    if state.danger_blocked_descent {
        return Some(
            BotGoal::new(GoalKind::AscendToFarm, "descent blocked by danger", ctx.turn)
                .at(stairs_up?),
        );
    }

    // Under-levelled farming: climb to easier ground. Farm (priority 72)
    // outranks this, so the ascent only happens once the local tether runs
    // dry. Without known stairs the goal stays targetless and the arrival
    // layer falls back to a teleport-level scroll (which goes up).
    if state.farming_mode && depth > 1 {
        if let Some(issue @ ReadinessIssue::UnderLevelled { .. }) =
            readiness_issue(ctx, state.farm_blocked_depth)
        {
            let mut goal = BotGoal::new(GoalKind::AscendToFarm, issue.to_string(), ctx.turn);
            if let Some(s) = stairs_up {
                goal = goal.at(s);
            }
            return Some(goal);
        }
    }
    None
}

pub fn descend_goal(ctx: &BotContext, state: &mut BotState) -> Option<BotGoal> {
    let depth = ctx.depth();
    if depth >= MAX_DEPTH {
        return None;
    }
    let stairs = state.known_stairs_down?;

    // Sweep flip, outbound leg: poke the blocked level to respawn it. This
    // runs regardless of readiness; the bot turns right around.
    if state.sweep_flip_active
        && depth == state.sweep_flip_target_depth
        && !state.sweep_flip_visited_blocked
    {
        return Some(BotGoal::new(GoalKind::Descend, "sweep flip", ctx.turn).at(stairs));
    }

    // Morgoth flip, return leg.
    if state.morgoth_flip_active && depth == MAX_DEPTH - 1 {
        return Some(
            BotGoal::new(GoalKind::Descend, "returning to the summit", ctx.turn).at(stairs),
        );
    }

    if unique_blockers(ctx).len() >= 2 {
        return None;
    }

    // An armed sweep finishes (or times out) before the stairs.
    if state.sweep_mode {
        return None;
    }

    let wanted = exploration_complete(&ctx.world.level)
        || state.turns_on_level as i32 >= ctx.personality.patience;
    if !wanted {
        return None;
    }

    if state.farming_mode {
        // While farming, only sink back toward the frontier, never into the
        // blocked depth itself.
        if depth + 1 < state.farm_blocked_depth {
            return Some(
                BotGoal::new(GoalKind::Descend, "returning to the frontier", ctx.turn).at(stairs),
            );
        }
        return None;
    }

    if readiness_issue(ctx, depth + 1).is_some() {
        // update_modes either enters farming or preparedness is off.
        if ctx.config.capabilities.preparedness > 0 && ctx.config.capabilities.farming {
            return None;
        }
    }

    Some(BotGoal::new(GoalKind::Descend, "level done, going deeper", ctx.turn).at(stairs))
}

#[cfg(test)]
#[path = "./progression_test.rs"]
mod progression_test;
