//! Single-step selector.
//!
//! Given a flow field, picks the one adjacent step that minimises a
//! composite score. Ties resolve by the fixed NW..SE scan order, so the
//! choice is deterministic.

use crate::enums::Direction;
use crate::grids::{FlowGrid, FLOW_UNREACHABLE};
use crate::model::{DungeonLevel, Monster, Point, ADJACENT_OFFSETS};
use crate::state::StepHistory;

const AWAY_PENALTY: i32 = 100;
const SIDEWAYS_PENALTY: i32 = 50;
const CARDINAL_BONUS: i32 = -5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChoice {
    Move(Direction),
    /// Already standing on a flow source.
    Wait,
}

/// Penalty for stepping onto a recently visited tile. Counts every
/// occurrence in the bounded history; fresher visits weigh more.
pub fn recency_penalty(candidate: Point, history: &StepHistory) -> i32 {
    let mut penalty = 0;
    for (age, &past) in history.iter_recent().enumerate() {
        if past == candidate {
            let recency = age as i32 + 1;
            penalty += (50 - recency * 2).max(10);
        }
    }
    penalty
}

/// Pick the best adjacent step toward the flow sources. Returns `None` when
/// every neighbour is rejected (blocked in), `Some(Wait)` when already on a
/// source tile.
pub fn select_step(
    level: &DungeonLevel,
    flow: &FlowGrid,
    pos: Point,
    monsters: &[Monster],
    history: &StepHistory,
) -> Option<StepChoice> {
    let here = flow.get(pos);
    if here == 0 {
        return Some(StepChoice::Wait);
    }

    let mut best: Option<(i32, Direction)> = None;
    for (dx, dy) in ADJACENT_OFFSETS {
        let n = pos.offset(dx, dy);
        if !level.is_passable(n) {
            continue;
        }
        let cost = flow.get(n);
        if cost == FLOW_UNREACHABLE {
            continue;
        }
        if monsters
            .iter()
            .any(|m| m.is_alive() && m.visible && m.position == n)
        {
            continue;
        }
        let dir = match Direction::from_delta(dx, dy) {
            Some(d) => d,
            None => continue,
        };

        let mut score = cost as i32;
        if cost > here {
            score += AWAY_PENALTY;
        } else if cost == here {
            score += SIDEWAYS_PENALTY;
        }
        if dir.is_cardinal() {
            score += CARDINAL_BONUS;
        }
        score += recency_penalty(n, history);

        // Strict comparison keeps the first tile in scan order on ties.
        if best.map_or(true, |(b, _)| score < b) {
            best = Some((score, dir));
        }
    }

    best.map(|(_, dir)| StepChoice::Move(dir))
}

#[cfg(test)]
#[path = "./step_test.rs"]
mod step_test;
