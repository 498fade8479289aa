//! Flow pathfinder.
//!
//! Multi-source reverse BFS over the level's passable bitmap, producing an
//! 8-connected unit-cost distance field from any set of goal tiles. Closed
//! doors count as passable (the bot bumps them open). With an avoidance
//! reference, neighbours whose danger exceeds the threshold are skipped.

use crate::grids::{DangerGrid, FlowGrid, FlowQueue, FLOW_MAX, FLOW_UNREACHABLE};
use crate::model::{DungeonLevel, Point, ADJACENT_OFFSETS};
use serde::{Deserialize, Serialize};

/// Danger-aware exclusion: a neighbour n is skipped iff
/// `danger[n] > threshold`.
pub struct Avoidance<'a> {
    pub danger: &'a DangerGrid,
    pub threshold: i32,
}

/// Compute the flow field from `goals` into `out`. An empty goal set (or one
/// with no in-bounds passable goal) leaves the whole field unreachable.
pub fn compute_flow_into(
    level: &DungeonLevel,
    goals: &[Point],
    avoidance: Option<&Avoidance>,
    queue: &mut FlowQueue,
    out: &mut FlowGrid,
) {
    out.reset_for(level.width, level.height);
    queue.ensure_capacity(level.area());

    for &goal in goals {
        if !level.is_passable(goal) {
            continue;
        }
        if out.get(goal) != FLOW_UNREACHABLE {
            continue; // duplicate goal
        }
        out.set(goal, 0);
        queue.push(goal.x as u16, goal.y as u16, 0);
    }

    while let Some((x, y, cost)) = queue.pop() {
        if cost >= FLOW_MAX {
            continue;
        }
        let here = Point::new(x as i32, y as i32);
        for (dx, dy) in ADJACENT_OFFSETS {
            let n = here.offset(dx, dy);
            if !level.is_passable(n) {
                continue;
            }
            if out.get(n) != FLOW_UNREACHABLE {
                continue;
            }
            if let Some(avoid) = avoidance {
                if avoid.danger.get(n) > avoid.threshold {
                    continue;
                }
            }
            out.set(n, cost + 1);
            queue.push(n.x as u16, n.y as u16, cost + 1);
        }
    }
}

pub fn compute_flow(
    level: &DungeonLevel,
    goal: Point,
    avoidance: Option<&Avoidance>,
    queue: &mut FlowQueue,
) -> FlowGrid {
    let mut out = FlowGrid::new(level.width, level.height);
    compute_flow_into(level, &[goal], avoidance, queue, &mut out);
    out
}

pub fn compute_exploration_flow(
    level: &DungeonLevel,
    goals: &[Point],
    avoidance: Option<&Avoidance>,
    queue: &mut FlowQueue,
) -> FlowGrid {
    let mut out = FlowGrid::new(level.width, level.height);
    compute_flow_into(level, goals, avoidance, queue, &mut out);
    out
}

pub const SINGLE_GOAL_CACHE_MAX_AGE: u64 = 10;
pub const EXPLORATION_CACHE_MAX_AGE: u64 = 5;
pub const SWEEP_CACHE_MAX_AGE: u64 = 5;

/// Cached single-goal flow, keyed by the goal tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleGoalFlowCache {
    pub goal: Point,
    pub depth: i32,
    pub computed_at: u64,
    pub flow: FlowGrid,
}

impl SingleGoalFlowCache {
    pub fn is_valid(&self, goal: Point, depth: i32, turn: u64) -> bool {
        self.goal == goal
            && self.depth == depth
            && turn.saturating_sub(self.computed_at) <= SINGLE_GOAL_CACHE_MAX_AGE
    }
}

/// Cached exploration-frontier flow, keyed by the explored counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationFlowCache {
    pub explored_count: u32,
    pub depth: i32,
    pub computed_at: u64,
    pub flow: FlowGrid,
}

impl ExplorationFlowCache {
    pub fn is_valid(&self, explored_count: u32, depth: i32, turn: u64) -> bool {
        self.explored_count == explored_count
            && self.depth == depth
            && turn.saturating_sub(self.computed_at) <= EXPLORATION_CACHE_MAX_AGE
    }
}

/// Cached sweep flow, keyed by the seen counter and the bot position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFlowCache {
    pub seen_count: u32,
    pub origin: Point,
    pub depth: i32,
    pub computed_at: u64,
    pub flow: FlowGrid,
}

impl SweepFlowCache {
    pub fn is_valid(&self, seen_count: u32, origin: Point, depth: i32, turn: u64) -> bool {
        self.seen_count == seen_count
            && self.origin == origin
            && self.depth == depth
            && turn.saturating_sub(self.computed_at) <= SWEEP_CACHE_MAX_AGE
    }
}

#[cfg(test)]
#[path = "./flow_test.rs"]
mod flow_test;
