//! Tick orchestrator.
//!
//! `run_bot_tick` is the engine's single entry point: synchronous, never
//! panics outward, always returns exactly one action. Phase order is fixed:
//! level-entry reset, upkeep, context build, seen recording, danger,
//! tier-gated survival, stuck recovery, then goal-driven movement. Any
//! phase may short-circuit with an action.

use crate::actions::BotAction;
use crate::config::BotConfig;
use crate::context::BotContext;
use crate::danger::{self, compute_danger};
use crate::enums::{GeneratorType, PotionKind, ScrollKind};
use crate::errors::EngineError;
use crate::events::{push_trace, DecisionEvent};
use crate::explore::{self, corridor_step, sweep_frontiers};
use crate::flow::{
    compute_flow_into, Avoidance, ExplorationFlowCache, SingleGoalFlowCache, SweepFlowCache,
};
use crate::goals::{self, BotGoal, GoalKind};
use crate::grids::{FlowGrid, FLOW_UNREACHABLE};
use crate::items;
use crate::model::{GroundItem, Monster, Point, Tile, WorldSnapshot};
use crate::progression;
use crate::state::BotState;
use crate::step::{select_step, StepChoice};
use crate::stuck;
use crate::survival;
use crate::town;
use log::{debug, warn};

/// Distance at which a danger-blocked descent turns into a bull rush.
const BULL_RUSH_DISTANCE: u8 = 6;

pub fn run_bot_tick(world: &WorldSnapshot, state: &mut BotState, config: &BotConfig) -> BotAction {
    state.trace.clear();

    if let Err(e) = validate_snapshot(world) {
        warn!("{}", e);
        return BotAction::Wait;
    }

    if state.current_depth != Some(world.character.depth) {
        state.on_level_change(world, &config.capabilities);
        push_trace(
            &mut state.trace,
            DecisionEvent::LevelEntered {
                depth: world.character.depth,
            },
        );
    }

    state.turns_on_level += 1;
    state.gc_blacklist(world.turn);

    let ctx = BotContext::build(world, config);

    state.record_position(ctx.position());
    state.record_hp(world.character.hp);
    record_visible(world, state);

    compute_danger(world, state);

    if let Some(action) = survival::survival_action(&ctx, state) {
        state.note_progress(ctx.turn);
        return finalize(state, action);
    }

    if !ctx.in_town() {
        if let Some(action) = stuck::stuck_response(&ctx, state) {
            return finalize_move_tracking(state, action);
        }
    }

    progression::update_modes(&ctx, state);
    goals::select_goal(&ctx, state);

    let action = execute_goal(&ctx, state);
    finalize_move_tracking(state, action)
}

fn validate_snapshot(world: &WorldSnapshot) -> Result<(), EngineError> {
    let level = &world.level;
    if level.width <= 0 || level.height <= 0 {
        return Err(EngineError::MalformedSnapshot("empty level".into()));
    }
    if level.tiles.len() != level.area()
        || level.passable.len() != level.area()
        || level.explored.len() != level.area()
        || level.visible.len() != level.area()
    {
        return Err(EngineError::MalformedSnapshot(
            "grid sizes disagree with dimensions".into(),
        ));
    }
    if !level.in_bounds(world.character.position) {
        return Err(EngineError::OutOfBounds(format!(
            "character at {}",
            world.character.position
        )));
    }
    Ok(())
}

fn record_visible(world: &WorldSnapshot, state: &mut BotState) {
    let level = &world.level;
    for y in 0..level.height {
        for x in 0..level.width {
            let p = Point::new(x, y);
            if level.visible[level.idx(p)] != 0 {
                state.seen_this_visit.insert(p);
            }
        }
    }
}

fn finalize(state: &mut BotState, action: BotAction) -> BotAction {
    push_trace(
        &mut state.trace,
        DecisionEvent::ActionChosen {
            action: action.to_string(),
        },
    );
    action
}

/// Like [`finalize`], also tracking facing for the wall-follower. Progress
/// bookkeeping happens at the call sites, where goal distance is known.
fn finalize_move_tracking(state: &mut BotState, action: BotAction) -> BotAction {
    if let BotAction::Move { direction } = &action {
        state.last_move_direction = Some(*direction);
    }
    finalize(state, action)
}

fn execute_goal(ctx: &BotContext, state: &mut BotState) -> BotAction {
    let goal = match state.current_goal.clone() {
        Some(g) => g,
        None => return BotAction::Wait,
    };

    match goal.kind {
        GoalKind::Wait => BotAction::Wait,

        GoalKind::Recover => {
            // Drink out of the red, then sit and let regeneration work.
            if ctx.world.character.hp_ratio() < 0.5 {
                if let Some(p) = items::find_potion(&ctx.world.character, PotionKind::Healing) {
                    state.note_progress(ctx.turn);
                    return BotAction::Use { item_id: p.id };
                }
            }
            BotAction::Wait
        }

        GoalKind::TownTrip => {
            match items::find_scroll(&ctx.world.character, ScrollKind::WordOfRecall) {
                Some(s) => {
                    state.town_return_depth = Some(ctx.depth());
                    state.note_progress(ctx.turn);
                    BotAction::Use { item_id: s.id }
                }
                None => BotAction::Wait,
            }
        }

        GoalKind::Kill | GoalKind::HuntUnique | GoalKind::Farm => {
            combat_or_move(ctx, state, &goal)
        }

        GoalKind::Kite => kite_action(ctx, state, &goal),

        GoalKind::Take => match goal.target {
            Some(t) if t == ctx.position() => match goal.target_id {
                Some(id) => {
                    state.note_progress(ctx.turn);
                    BotAction::Pickup { item_id: id }
                }
                None => BotAction::Wait,
            },
            Some(t) => move_toward(ctx, state, t, true, false),
            None => BotAction::Wait,
        },

        GoalKind::Flee => flee_action(ctx, state, &goal),

        GoalKind::Descend => match goal.target {
            Some(t) if t == ctx.position() => {
                state.note_progress(ctx.turn);
                BotAction::Descend
            }
            Some(t) => move_toward(ctx, state, t, true, true),
            None => BotAction::Wait,
        },

        GoalKind::AscendToFarm => ascend_action(ctx, state, &goal),

        GoalKind::Explore => explore_move(ctx, state),

        GoalKind::UseAltar => match goal.target {
            Some(t) if t == ctx.position() => {
                state.blacklist(t, ctx.turn);
                state.note_progress(ctx.turn);
                BotAction::UseAltar
            }
            Some(t) => move_toward(ctx, state, t, true, false),
            None => BotAction::Wait,
        },

        GoalKind::VisitMerchant => match goal.target {
            Some(t) if t == ctx.position() => {
                let needs = progression::dungeon_needs(ctx);
                match town::next_buy_need(&needs) {
                    Some(need) if ctx.world.character.gold > 0 => {
                        state.note_progress(ctx.turn);
                        BotAction::BuyFromMerchant { need }
                    }
                    _ => {
                        state.blacklist(t, ctx.turn);
                        BotAction::Wait
                    }
                }
            }
            Some(t) => move_toward(ctx, state, t, true, false),
            None => BotAction::Wait,
        },

        GoalKind::SellToMerchant => match goal.target {
            Some(t) if t == ctx.position() => {
                match items::sellable_items(&ctx.world.character).first() {
                    Some(item) => {
                        state.note_progress(ctx.turn);
                        BotAction::SellToMerchant { item_id: item.id }
                    }
                    None => {
                        if let Some(shop) = shop_id_at(ctx, &goal, t) {
                            state.shops_visited_for_selling.insert(shop);
                        }
                        BotAction::Wait
                    }
                }
            }
            Some(t) => move_toward(ctx, state, t, false, false),
            None => BotAction::Wait,
        },

        GoalKind::VisitHealer => match goal.target {
            Some(t) if t == ctx.position() => {
                state.healer_visited = true;
                state.note_progress(ctx.turn);
                BotAction::UseHealer
            }
            Some(t) => move_toward(ctx, state, t, false, false),
            None => BotAction::Wait,
        },

        GoalKind::BuyFromMerchant => match goal.target {
            Some(t) if t == ctx.position() => {
                let needs = town::shopping_needs(ctx, state);
                match town::next_buy_need(&needs) {
                    Some(need) if ctx.world.character.gold > 0 => {
                        state.note_progress(ctx.turn);
                        BotAction::BuyFromMerchant { need }
                    }
                    _ => {
                        if let Some(shop) = shop_id_at(ctx, &goal, t) {
                            state.shops_visited_for_buying.insert(shop);
                        }
                        BotAction::Wait
                    }
                }
            }
            Some(t) => move_toward(ctx, state, t, false, false),
            None => BotAction::Wait,
        },

        GoalKind::ReturnPortal => match goal.target {
            Some(t) if t == ctx.position() => {
                state.town_return_depth = None;
                state.note_progress(ctx.turn);
                BotAction::UseReturnPortal
            }
            Some(t) => move_toward(ctx, state, t, false, false),
            None => BotAction::Wait,
        },

        GoalKind::ExitTown => match goal.target {
            Some(t) if t == ctx.position() => {
                state.note_progress(ctx.turn);
                BotAction::Descend
            }
            Some(t) => move_toward(ctx, state, t, false, false),
            None => BotAction::Wait,
        },
    }
}

/// Shop index for a merchant goal: the goal carries it, the tile is the
/// fallback.
fn shop_id_at(ctx: &BotContext, goal: &BotGoal, tile: Point) -> Option<u8> {
    goal.target_id
        .map(|id| id as u8)
        .or_else(|| match ctx.world.level.tile(tile) {
            Some(Tile::Merchant(id)) => Some(id),
            _ => None,
        })
}

fn monster_target<'a>(ctx: &BotContext<'a>, goal: &BotGoal) -> Option<&'a Monster> {
    goal.target_id.and_then(|id| ctx.world.monster_by_id(id))
}

fn item_target<'a>(ctx: &BotContext<'a>, goal: &BotGoal) -> Option<&'a GroundItem> {
    goal.target_id.and_then(|id| ctx.world.ground_item_by_id(id))
}

fn combat_or_move(ctx: &BotContext, state: &mut BotState, goal: &BotGoal) -> BotAction {
    if let Some(m) = monster_target(ctx, goal) {
        let dist = m.position.chebyshev(ctx.position());
        if dist <= 1 {
            state.note_progress(ctx.turn);
            return BotAction::Attack { target_id: m.id };
        }
        if ctx.profile.prefers_ranged
            && goals::has_ranged_means(ctx)
            && m.visible
            && dist <= ctx.profile.engage_distance + 2
        {
            state.note_progress(ctx.turn);
            return BotAction::RangedAttack { target_id: m.id };
        }
        return move_toward(ctx, state, m.position, false, false);
    }
    // Farm goals may point at loot instead of prey.
    if let Some(g) = item_target(ctx, goal) {
        if g.position == ctx.position() {
            state.note_progress(ctx.turn);
            return BotAction::Pickup { item_id: g.id };
        }
        return move_toward(ctx, state, g.position, false, false);
    }
    match goal.target {
        Some(t) if t != ctx.position() => move_toward(ctx, state, t, false, false),
        Some(_) => BotAction::Wait,
        // Hunting something unseen: walk the level like a sweep.
        None => explore_move(ctx, state),
    }
}

fn kite_action(ctx: &BotContext, state: &mut BotState, goal: &BotGoal) -> BotAction {
    let m = match monster_target(ctx, goal) {
        Some(m) => m,
        None => return BotAction::Wait,
    };
    let dist = m.position.chebyshev(ctx.position());
    if dist < ctx.profile.engage_distance {
        if let Some(action) = survival::flee_step(ctx, state) {
            return action;
        }
    }
    if goals::has_ranged_means(ctx) && dist <= ctx.profile.engage_distance + 2 {
        state.note_progress(ctx.turn);
        return BotAction::RangedAttack { target_id: m.id };
    }
    move_toward(ctx, state, m.position, false, false)
}

fn flee_action(ctx: &BotContext, state: &mut BotState, goal: &BotGoal) -> BotAction {
    match goal.target {
        Some(t) if t == ctx.position() => {
            state.note_progress(ctx.turn);
            BotAction::Ascend
        }
        Some(t) => move_toward(ctx, state, t, true, false),
        None => survival::flee_step(ctx, state).unwrap_or(BotAction::Wait),
    }
}

fn ascend_action(ctx: &BotContext, state: &mut BotState, goal: &BotGoal) -> BotAction {
    match goal.target {
        Some(t) if t == ctx.position() => {
            state.danger_blocked_descent = false;
            state.note_progress(ctx.turn);
            BotAction::Ascend
        }
        Some(t) => move_toward(ctx, state, t, true, false),
        None => {
            // No stairs known: the teleport-level scroll goes up, which is
            // exactly where we want to be.
            match items::find_scroll(&ctx.world.character, ScrollKind::TeleportLevel) {
                Some(s) => {
                    state.note_progress(ctx.turn);
                    BotAction::Use { item_id: s.id }
                }
                None => BotAction::Wait,
            }
        }
    }
}

/// Drop the goal and its caches after an unreachable target.
fn unreachable_goal(state: &mut BotState, goal_kind: GoalKind) -> BotAction {
    debug!("goal unreachable: {}", goal_kind);
    push_trace(
        &mut state.trace,
        DecisionEvent::GoalUnreachable {
            goal: goal_kind.to_string(),
        },
    );
    state.current_goal = None;
    state.single_goal_flow = None;
    state.exploration_flow = None;
    state.sweep_flow = None;
    BotAction::Wait
}

/// Walk one step toward `target` along the cached single-goal flow.
/// `avoid` applies the danger threshold; `descend_gate` adds the cautious
/// descent contract (bull rush within 6, otherwise retreat upward next
/// tick).
fn move_toward(
    ctx: &BotContext,
    state: &mut BotState,
    target: Point,
    avoid: bool,
    descend_gate: bool,
) -> BotAction {
    let depth = ctx.depth();
    let turn = ctx.turn;
    let level = &ctx.world.level;
    let pos = ctx.position();

    let cached = state
        .single_goal_flow
        .as_ref()
        .map_or(false, |c| c.is_valid(target, depth, turn));
    if !cached {
        let threshold =
            danger::avoidance_threshold(&ctx.personality, &ctx.world.character) as i32;
        // Reuse the stale cache's buffer rather than allocating a grid per
        // recompute.
        let mut flow = match state.single_goal_flow.take() {
            Some(c) => c.flow,
            None => FlowGrid::new(level.width, level.height),
        };
        let mut blocked_by_danger = false;
        {
            let danger = &state.danger;
            let queue = &mut state.flow_queue;
            let avoidance = if avoid {
                danger.as_ref().map(|d| Avoidance {
                    danger: &d.grid,
                    threshold,
                })
            } else {
                None
            };
            compute_flow_into(level, &[target], avoidance.as_ref(), queue, &mut flow);

            if avoid && flow.get(pos) == FLOW_UNREACHABLE {
                // Danger walls us off; measure the honest distance.
                blocked_by_danger = true;
                compute_flow_into(level, &[target], None, queue, &mut flow);
            }
        }
        let here = flow.get(pos);
        if here == FLOW_UNREACHABLE {
            let kind = current_kind(state);
            return unreachable_goal(state, kind);
        }
        if blocked_by_danger && descend_gate && here > BULL_RUSH_DISTANCE {
            push_trace(&mut state.trace, DecisionEvent::DangerBlockedDescent);
            state.danger_blocked_descent = true;
            return BotAction::Wait;
        }
        state.single_goal_flow = Some(SingleGoalFlowCache {
            goal: target,
            depth,
            computed_at: turn,
            flow,
        });
    }

    if state.single_goal_flow.as_ref().unwrap().flow.get(pos) == FLOW_UNREACHABLE {
        let kind = current_kind(state);
        return unreachable_goal(state, kind);
    }
    step_along(ctx, state, FlowSource::SingleGoal)
}

fn current_kind(state: &BotState) -> GoalKind {
    state
        .current_goal
        .as_ref()
        .map(|g| g.kind)
        .unwrap_or(GoalKind::Wait)
}

/// Which cached flow field a step should descend.
#[derive(Clone, Copy)]
enum FlowSource {
    SingleGoal,
    Exploration,
    Sweep,
}

fn flow_of(state: &BotState, source: FlowSource) -> &FlowGrid {
    match source {
        FlowSource::SingleGoal => &state.single_goal_flow.as_ref().unwrap().flow,
        FlowSource::Exploration => &state.exploration_flow.as_ref().unwrap().flow,
        FlowSource::Sweep => &state.sweep_flow.as_ref().unwrap().flow,
    }
}

/// Shared step execution over whichever flow grid the caller picked.
fn step_along(ctx: &BotContext, state: &mut BotState, source: FlowSource) -> BotAction {
    let pos = ctx.position();
    let (choice, descending) = {
        let flow = flow_of(state, source);
        let here = flow.get(pos);
        let choice = select_step(
            &ctx.world.level,
            flow,
            pos,
            &ctx.world.monsters,
            &state.recent_positions,
        );
        let descending = match choice {
            Some(StepChoice::Move(dir)) => flow.get(pos.step(dir)) < here,
            _ => false,
        };
        (choice, descending)
    };
    match choice {
        Some(StepChoice::Move(direction)) => {
            if descending {
                state.note_progress(ctx.turn);
            }
            BotAction::Move { direction }
        }
        // On a source tile or fully blocked: hold position, keep the goal.
        Some(StepChoice::Wait) | None => BotAction::Wait,
    }
}

/// Exploration movement over the multi-source frontier (or sweep) flow.
fn explore_move(ctx: &BotContext, state: &mut BotState) -> BotAction {
    let level = &ctx.world.level;
    let pos = ctx.position();
    let depth = ctx.depth();
    let turn = ctx.turn;

    // Labyrinths prefer corridor-following until a frontier is close.
    if level.generator_type == GeneratorType::Labyrinth && !state.sweep_mode {
        if let Some(dir) = corridor_step(ctx, state) {
            let ahead = pos.step(dir);
            if !level.is_explored(ahead) || !state.seen_this_visit.contains(ahead) {
                state.note_progress(turn);
            }
            return BotAction::Move { direction: dir };
        }
    }

    if state.sweep_mode {
        let valid = state
            .sweep_flow
            .as_ref()
            .map_or(false, |c| c.is_valid(state.seen_this_visit.count(), pos, depth, turn));
        if !valid {
            let goals: Vec<Point> = sweep_frontiers(level, state);
            if goals.is_empty() {
                return unreachable_goal(state, GoalKind::Explore);
            }
            let mut flow = match state.sweep_flow.take() {
                Some(c) => c.flow,
                None => FlowGrid::new(level.width, level.height),
            };
            compute_flow_into(level, &goals, None, &mut state.flow_queue, &mut flow);
            state.sweep_flow = Some(SweepFlowCache {
                seen_count: state.seen_this_visit.count(),
                origin: pos,
                depth,
                computed_at: turn,
                flow,
            });
        }
        if state.sweep_flow.as_ref().unwrap().flow.get(pos) == FLOW_UNREACHABLE {
            return unreachable_goal(state, GoalKind::Explore);
        }
        return step_along(ctx, state, FlowSource::Sweep);
    }

    let valid = state
        .exploration_flow
        .as_ref()
        .map_or(false, |c| c.is_valid(level.explored_count, depth, turn));
    if !valid {
        let mut cache = state.frontier_cache.take();
        let goals: Vec<Point> = explore::frontier_tiles(level, depth, &mut cache).to_vec();
        state.frontier_cache = cache;
        if goals.is_empty() {
            return unreachable_goal(state, GoalKind::Explore);
        }
        let mut flow = match state.exploration_flow.take() {
            Some(c) => c.flow,
            None => FlowGrid::new(level.width, level.height),
        };
        compute_flow_into(level, &goals, None, &mut state.flow_queue, &mut flow);
        state.exploration_flow = Some(ExplorationFlowCache {
            explored_count: level.explored_count,
            depth,
            computed_at: turn,
            flow,
        });
    }
    if state.exploration_flow.as_ref().unwrap().flow.get(pos) == FLOW_UNREACHABLE {
        return unreachable_goal(state, GoalKind::Explore);
    }
    step_along(ctx, state, FlowSource::Exploration)
}

#[cfg(test)]
#[path = "./tick_test.rs"]
mod tick_test;
