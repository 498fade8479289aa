//! Stuck detection and recovery.
//!
//! `turns_since_progress` drives a six-level escalation ladder; an A-B-A-B
//! or A-B-C-A-B-C oscillation in the step history bumps the ladder
//! immediately. Responses either return a recovery action outright or
//! mutate state and let the normal goal flow continue.

use crate::actions::BotAction;
use crate::context::BotContext;
use crate::enums::Direction;
use crate::events::{push_trace, DecisionEvent};
use crate::goals::{BotGoal, GoalKind};
use crate::state::{BotState, StepHistory};
use log::debug;

pub const STUCK_THRESHOLDS: [u64; 6] = [5, 12, 25, 50, 100, 200];

/// Cooldown applied when recovery cancels a flee goal.
const FLEE_COOLDOWN: u64 = 15;

/// A-B-A-B over the last four steps or A-B-C-A-B-C over the last six.
pub fn oscillating(history: &StepHistory) -> bool {
    let p = |n| history.nth_recent(n);
    if let (Some(a), Some(b), Some(c), Some(d)) = (p(0), p(1), p(2), p(3)) {
        if a == c && b == d && a != b {
            return true;
        }
        if let (Some(e), Some(f)) = (p(4), p(5)) {
            if a == d && b == e && c == f && !(a == b && b == c) {
                return true;
            }
        }
    }
    false
}

/// 0 = not stuck, 1..=6 per the threshold ladder.
pub fn stuck_level(state: &BotState, turn: u64) -> u8 {
    let since = turn.saturating_sub(state.last_progress_turn);
    let mut level = STUCK_THRESHOLDS.iter().filter(|&&t| since >= t).count() as u8;
    if level < 1 && oscillating(&state.recent_positions) {
        level = 1;
    }
    level
}

fn wall_follow(ctx: &BotContext, state: &BotState) -> Option<BotAction> {
    let facing = state
        .last_move_direction
        .map(|d| d.to_cardinal())
        .unwrap_or(Direction::North);
    // Right-hand rule: right, straight, left, back.
    let order = [facing.right(), facing, facing.left(), facing.opposite()];
    for dir in order {
        let n = ctx.position().step(dir);
        if !ctx.world.level.is_passable(n) {
            continue;
        }
        if ctx.visible_monsters.iter().any(|m| m.position == n) {
            continue;
        }
        return Some(BotAction::Move { direction: dir });
    }
    None
}

fn force_combat(ctx: &BotContext) -> Option<BotAction> {
    ctx.adjacent_monster()
        .map(|m| BotAction::Attack { target_id: m.id })
}

fn note(state: &mut BotState, level: u8, response: &str) {
    debug!("stuck recovery: level {} -> {}", level, response);
    state.twitch_counter += 1;
    push_trace(
        &mut state.trace,
        DecisionEvent::StuckEscalated {
            level,
            response: response.into(),
        },
    );
}

/// Run the recovery ladder. `Some(action)` short-circuits the tick.
pub fn stuck_response(ctx: &BotContext, state: &mut BotState) -> Option<BotAction> {
    let level = stuck_level(state, ctx.turn);
    if level == 0 {
        return None;
    }

    match level {
        1 => {
            let fleeing = matches!(
                &state.current_goal,
                Some(BotGoal {
                    kind: GoalKind::Flee,
                    ..
                })
            );
            if fleeing {
                note(state, 1, "stop fleeing");
                state.current_goal = None;
                state.flee_cooldown_until = ctx.turn + FLEE_COOLDOWN;
                None
            } else {
                let step = wall_follow(ctx, state);
                if step.is_some() {
                    note(state, 1, "wall follow");
                }
                step
            }
        }
        2 => {
            if let Some(action) = force_combat(ctx) {
                note(state, 2, "force combat");
                Some(action)
            } else {
                note(state, 2, "clear history");
                state.recent_positions.clear();
                None
            }
        }
        3 => {
            if let Some(stairs) = state.known_stairs_down {
                note(state, 3, "force descent");
                state.invalidate_single_goal_flow();
                state.current_goal = Some(
                    BotGoal::new(GoalKind::Descend, "stuck, forcing the stairs", ctx.turn)
                        .at(stairs),
                );
                None
            } else if let Some(action) = force_combat(ctx) {
                note(state, 3, "force combat");
                Some(action)
            } else {
                note(state, 3, "clear history");
                state.recent_positions.clear();
                None
            }
        }
        4 => {
            note(state, 4, "wait");
            Some(BotAction::Wait)
        }
        5 => {
            note(state, 5, "clear goals");
            state.current_goal = None;
            state.invalidate_single_goal_flow();
            // Partial progress reset drops the ladder back to level 3.
            state.last_progress_turn = ctx.turn.saturating_sub(STUCK_THRESHOLDS[2]);
            None
        }
        _ => {
            note(state, 6, "clear blacklist");
            state.purge_navigation();
            state.last_progress_turn = ctx.turn;
            None
        }
    }
}

#[cfg(test)]
#[path = "./stuck_test.rs"]
mod stuck_test;
