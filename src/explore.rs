//! Exploration engine.
//!
//! Frontier detection with an explored-count-keyed cache, target scoring
//! with hysteresis so the bot does not thrash between two frontiers, the
//! sweep variant (re-visit explored tiles), and the labyrinth
//! corridor-follower.

use crate::context::BotContext;
use crate::enums::{Direction, GeneratorType};
use crate::goals::{BotGoal, GoalKind};
use crate::model::{DungeonLevel, Point, ADJACENT_OFFSETS};
use crate::state::BotState;
use crate::step::recency_penalty;
use serde::{Deserialize, Serialize};

/// Frontier targets further than this are ignored outright.
pub const FRONTIER_MAX_DISTANCE: i32 = 50;

/// A new frontier must beat the current one by more than this to steal the
/// goal.
pub const HYSTERESIS_MARGIN: i32 = 30;

/// Exploration is "complete" at this share of passable tiles explored.
pub const EXPLORATION_COMPLETE_PCT: u32 = 85;

/// Per-occurrence penalty for targets sitting in the recent step history.
const RECENT_VISIT_PENALTY: i32 = 20;

/// Frontier positions, recomputed only when the explored counter moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierCache {
    pub explored_count: u32,
    pub depth: i32,
    pub frontiers: Vec<Point>,
}

/// Unexplored passable tiles adjacent to explored passable ground.
fn scan_frontiers(level: &DungeonLevel) -> Vec<Point> {
    let mut frontiers = Vec::new();
    for y in 0..level.height {
        for x in 0..level.width {
            let p = Point::new(x, y);
            if !level.is_passable(p) || level.is_explored(p) {
                continue;
            }
            let has_explored_neighbour = ADJACENT_OFFSETS.iter().any(|&(dx, dy)| {
                let n = p.offset(dx, dy);
                level.is_passable(n) && level.is_explored(n)
            });
            if has_explored_neighbour {
                frontiers.push(p);
            }
        }
    }
    frontiers
}

/// Cached frontier lookup. Positions are stable while `explored_count`
/// holds; scores are always recomputed by the caller.
pub fn frontier_tiles<'a>(
    level: &DungeonLevel,
    depth: i32,
    cache: &'a mut Option<FrontierCache>,
) -> &'a [Point] {
    let stale = match cache {
        Some(c) => c.explored_count != level.explored_count || c.depth != depth,
        None => true,
    };
    if stale {
        *cache = Some(FrontierCache {
            explored_count: level.explored_count,
            depth,
            frontiers: scan_frontiers(level),
        });
    }
    &cache.as_ref().unwrap().frontiers
}

/// Explored passable tiles not yet seen this visit; the sweep analogue of a
/// frontier.
pub fn sweep_frontiers(level: &DungeonLevel, state: &BotState) -> Vec<Point> {
    let mut tiles = Vec::new();
    for y in 0..level.height {
        for x in 0..level.width {
            let p = Point::new(x, y);
            if level.is_passable(p)
                && level.is_explored(p)
                && !state.seen_this_visit.contains(p)
            {
                tiles.push(p);
            }
        }
    }
    tiles
}

fn unexplored_neighbours(level: &DungeonLevel, p: Point) -> i32 {
    ADJACENT_OFFSETS
        .iter()
        .filter(|&&(dx, dy)| {
            let n = p.offset(dx, dy);
            level.in_bounds(n) && !level.is_explored(n)
        })
        .count() as i32
}

fn unseen_neighbours(level: &DungeonLevel, state: &BotState, p: Point) -> i32 {
    ADJACENT_OFFSETS
        .iter()
        .filter(|&&(dx, dy)| {
            let n = p.offset(dx, dy);
            level.in_bounds(n) && !state.seen_this_visit.contains(n)
        })
        .count() as i32
}

fn walkable_neighbours(level: &DungeonLevel, p: Point) -> i32 {
    ADJACENT_OFFSETS
        .iter()
        .filter(|&&(dx, dy)| level.is_passable(p.offset(dx, dy)))
        .count() as i32
}

/// Entry point for a frontier: its first explored passable 8-neighbour in
/// scan order.
fn frontier_entry(level: &DungeonLevel, frontier: Point) -> Option<Point> {
    ADJACENT_OFFSETS.iter().find_map(|&(dx, dy)| {
        let n = frontier.offset(dx, dy);
        if level.is_passable(n) && level.is_explored(n) {
            Some(n)
        } else {
            None
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorationTarget {
    /// Tile to walk to (the frontier's entry point, or the sweep tile).
    pub target: Point,
    /// The frontier tile that motivated it.
    pub frontier: Point,
    pub score: i32,
}

fn directional_bonus(from: Point, goal: Point, candidate: Point) -> i32 {
    let gv = ((goal.x - from.x) as f64, (goal.y - from.y) as f64);
    let cv = ((candidate.x - from.x) as f64, (candidate.y - from.y) as f64);
    let glen = (gv.0 * gv.0 + gv.1 * gv.1).sqrt();
    let clen = (cv.0 * cv.0 + cv.1 * cv.1).sqrt();
    if glen < 1e-9 || clen < 1e-9 {
        return 0;
    }
    let cos = (gv.0 * cv.0 + gv.1 * cv.1) / (glen * clen);
    (cos * 30.0).round() as i32
}

/// Score all frontier candidates and pick the best, with hysteresis toward
/// the current exploration goal.
pub fn find_exploration_target(
    ctx: &BotContext,
    state: &mut BotState,
    sweep_mode: bool,
) -> Option<ExplorationTarget> {
    let level = &ctx.world.level;
    let pos = ctx.position();
    let depth = ctx.depth();
    let turn = ctx.turn;

    let current_target = match &state.current_goal {
        Some(BotGoal {
            kind: GoalKind::Explore,
            target: Some(t),
            ..
        }) => Some(*t),
        _ => None,
    };

    // Candidate (frontier, target) pairs.
    let candidates: Vec<(Point, Point)> = if sweep_mode {
        sweep_frontiers(level, state)
            .into_iter()
            .map(|f| (f, f))
            .collect()
    } else {
        let mut cache = state.frontier_cache.take();
        let frontiers = frontier_tiles(level, depth, &mut cache).to_vec();
        state.frontier_cache = cache;
        frontiers
            .into_iter()
            .filter_map(|f| frontier_entry(level, f).map(|entry| (f, entry)))
            .collect()
    };
    if candidates.is_empty() {
        return None;
    }

    // Interest is scored up front so the blacklist's lazy eviction below
    // can borrow the state mutably.
    let scored: Vec<(Point, Point, i32)> = candidates
        .into_iter()
        .map(|(f, t)| {
            let interest = if sweep_mode {
                unseen_neighbours(level, state, f)
            } else {
                unexplored_neighbours(level, f)
            };
            (f, t, interest)
        })
        .collect();
    let richest_interest = scored.iter().map(|&(_, _, i)| i).max().unwrap_or(0);

    let mut best: Option<ExplorationTarget> = None;
    let mut current_scored: Option<ExplorationTarget> = None;

    for (frontier, target, interest) in scored {
        if target == pos {
            continue;
        }
        let distance = pos.chebyshev(target);
        if distance > FRONTIER_MAX_DISTANCE {
            continue;
        }
        if state.is_blacklisted(target, turn) {
            continue;
        }

        let mut score = 15 * interest;

        if let Some(goal) = current_target {
            if target == goal {
                score += 150;
            } else {
                let d = target.chebyshev(goal);
                if d <= 8 {
                    score += 75 * (8 - d) / 8;
                }
            }
            score += directional_bonus(pos, goal, target);
        }

        score -= distance;

        for &past in state.recent_positions.iter_recent() {
            if past == target {
                score -= RECENT_VISIT_PENALTY;
            }
        }

        // Dead-end demotion only applies when a richer frontier exists.
        if interest == 1 && walkable_neighbours(level, target) <= 3 && richest_interest >= 2 {
            score -= 50;
        }

        if distance < 5 {
            score -= (5 - distance) * 12;
        }

        let candidate = ExplorationTarget {
            target,
            frontier,
            score,
        };
        if Some(target) == current_target {
            current_scored = Some(candidate);
        }
        if best.map_or(true, |b| score > b.score) {
            best = Some(candidate);
        }
    }

    let best = best?;
    if let Some(current) = current_scored {
        if best.score - current.score <= HYSTERESIS_MARGIN {
            return Some(current);
        }
    }
    Some(best)
}

/// Level-wide exploration completion check; labyrinths settle for less.
pub fn exploration_complete(level: &DungeonLevel) -> bool {
    let threshold = if level.generator_type == GeneratorType::Labyrinth {
        EXPLORATION_COMPLETE_PCT * 3 / 4
    } else {
        EXPLORATION_COMPLETE_PCT
    };
    level.exploration_pct() >= threshold
}

/// Corridor-following step for labyrinth levels. Returns `None` when the
/// bot should leave corridor mode (a frontier target is close by, or no
/// cardinal continuation exists).
pub fn corridor_step(ctx: &BotContext, state: &mut BotState) -> Option<Direction> {
    let level = &ctx.world.level;
    let pos = ctx.position();

    // A nearby frontier ends corridor mode; regular scoring takes over.
    let mut cache = state.frontier_cache.take();
    let near_frontier = frontier_tiles(level, ctx.depth(), &mut cache)
        .iter()
        .any(|f| f.chebyshev(pos) <= 8);
    state.frontier_cache = cache;
    if near_frontier {
        state.corridor_facing = None;
        return None;
    }

    let facing = state.corridor_facing;
    let mut best: Option<(i32, Direction)> = None;
    for dir in Direction::CARDINALS {
        let n = pos.step(dir);
        if !level.is_passable(n) {
            continue;
        }
        if ctx
            .visible_monsters
            .iter()
            .any(|m| m.position == n)
        {
            continue;
        }
        let mut score = 0;
        if Some(dir) == facing {
            score -= 100;
        }
        if unexplored_neighbours(level, n) > 0 {
            score -= 50;
        }
        score += recency_penalty(n, &state.recent_positions);
        if best.map_or(true, |(b, _)| score < b) {
            best = Some((score, dir));
        }
    }

    let (_, dir) = best?;
    state.corridor_facing = Some(dir);
    Some(dir)
}

#[cfg(test)]
#[path = "./explore_test.rs"]
mod explore_test;
