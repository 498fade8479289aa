//! Persistent per-agent state.
//!
//! [`BotState`] is the only thing the engine mutates. It survives across
//! ticks; a detected depth change runs the level-entry reset, which clears
//! per-level fields and keeps the cross-level ones (farming, flips, town
//! bookkeeping).

use crate::config::BotCapabilities;
use crate::danger::DangerResult;
use crate::enums::Direction;
use crate::events::DecisionEvent;
use crate::explore::FrontierCache;
use crate::flow::{ExplorationFlowCache, SingleGoalFlowCache, SweepFlowCache};
use crate::goals::BotGoal;
use crate::grids::{FlowQueue, SeenGrid};
use crate::model::{EntityId, Point, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Bounded ring of recently occupied tiles, most recent last.
pub const STEP_HISTORY_LEN: usize = 25;

/// Blacklist entries expire this many turns after insertion.
pub const BLACKLIST_TTL: u64 = 100;

/// Window for the HP-rate sampler used by DOT detection.
pub const HP_SAMPLE_LEN: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepHistory {
    positions: VecDeque<Point>,
}

impl StepHistory {
    pub fn push(&mut self, p: Point) {
        if self.positions.len() == STEP_HISTORY_LEN {
            self.positions.pop_front();
        }
        self.positions.push_back(p);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Iterate from the most recent entry backwards.
    pub fn iter_recent(&self) -> impl Iterator<Item = &Point> {
        self.positions.iter().rev()
    }

    pub fn nth_recent(&self, n: usize) -> Option<Point> {
        self.positions.iter().rev().nth(n).copied()
    }
}

/// JSON objects key on strings, so the blacklist round-trips as an entry
/// list instead of a map.
mod point_map_serde {
    use super::Point;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        map: &HashMap<Point, u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<(Point, u64)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<Point, u64>, D::Error> {
        let entries: Vec<(Point, u64)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownNeeds {
    pub tp: bool,
    pub healing: bool,
    pub escape: bool,
}

impl TownNeeds {
    pub fn any(&self) -> bool {
        self.tp || self.healing || self.escape
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BotState {
    /// Depth the per-level state belongs to; `None` before the first tick.
    pub current_depth: Option<i32>,
    pub turns_on_level: u32,
    pub recent_positions: StepHistory,
    pub last_move_direction: Option<Direction>,

    pub current_goal: Option<BotGoal>,
    pub last_progress_turn: u64,
    pub twitch_counter: u32,
    pub flee_cooldown_until: u64,

    pub known_stairs_up: Option<Point>,
    pub known_stairs_down: Option<Point>,

    pub single_goal_flow: Option<SingleGoalFlowCache>,
    pub exploration_flow: Option<ExplorationFlowCache>,
    pub sweep_flow: Option<SweepFlowCache>,
    pub frontier_cache: Option<FrontierCache>,
    #[serde(with = "point_map_serde")]
    pub exploration_blacklist: HashMap<Point, u64>,

    pub farming_mode: bool,
    pub farm_blocked_depth: i32,
    pub farm_gold_target: i64,
    pub farm_start_turn: u64,

    pub tethered_origin: Option<Point>,
    pub tethered_radius: i32,
    pub tethered_flip_count: u32,

    pub sweep_mode: bool,
    pub sweep_start_turn: u64,
    pub sweep_exhausted: bool,
    pub sweep_flip_active: bool,
    pub sweep_flip_target_depth: i32,
    pub sweep_flip_visited_blocked: bool,

    pub hunting_unique_blocker: Option<EntityId>,
    pub unique_hunt_flip_depth: Option<i32>,
    pub morgoth_flip_active: bool,

    pub healer_visited: bool,
    pub shops_visited_for_selling: HashSet<u8>,
    pub shops_visited_for_buying: HashSet<u8>,
    pub town_needs: TownNeeds,
    /// Depth to return to after a town trip, once a portal is available.
    pub town_return_depth: Option<i32>,

    pub hp_samples: VecDeque<i32>,
    pub seen_this_visit: SeenGrid,
    pub corridor_facing: Option<Direction>,
    pub danger_blocked_descent: bool,

    #[serde(skip)]
    pub danger: Option<DangerResult>,
    #[serde(skip)]
    pub flow_queue: FlowQueue,
    #[serde(skip)]
    pub trace: Vec<DecisionEvent>,
}

impl BotState {
    pub fn new() -> BotState {
        BotState::default()
    }

    /// Level-entry reset. Idempotent: running it twice against the same
    /// snapshot leaves the same state as running it once.
    pub fn on_level_change(&mut self, world: &WorldSnapshot, caps: &BotCapabilities) {
        let depth = world.character.depth;
        self.current_depth = Some(depth);
        self.turns_on_level = 0;
        self.twitch_counter = 0;
        self.last_progress_turn = world.turn;

        self.recent_positions.clear();
        self.last_move_direction = None;
        self.current_goal = None;
        self.single_goal_flow = None;
        self.exploration_flow = None;
        self.sweep_flow = None;
        self.frontier_cache = None;
        self.exploration_blacklist.clear();
        self.danger = None;
        self.corridor_facing = None;
        self.danger_blocked_descent = false;
        self.hp_samples.clear();

        self.seen_this_visit
            .reset_for(world.level.width, world.level.height);

        // Per-level sweep state; the cross-level flip fields survive.
        self.sweep_mode = false;
        self.sweep_start_turn = world.turn;
        self.sweep_exhausted = false;

        self.known_stairs_up = world.level.stairs_up;
        self.known_stairs_down = world.level.stairs_down;

        if self.farming_mode && caps.surf > 0 && caps.surf_range.contains(depth) {
            self.tethered_origin = Some(world.character.position);
            self.tethered_radius = caps.surf_radii().first().copied().unwrap_or(0);
        } else {
            self.tethered_origin = None;
            self.tethered_radius = 0;
        }

        if depth == 0 {
            self.healer_visited = false;
            self.shops_visited_for_selling.clear();
            self.shops_visited_for_buying.clear();
        }
    }

    pub fn note_progress(&mut self, turn: u64) {
        self.last_progress_turn = turn;
    }

    pub fn record_position(&mut self, p: Point) {
        self.recent_positions.push(p);
    }

    pub fn record_hp(&mut self, hp: i32) {
        if self.hp_samples.len() == HP_SAMPLE_LEN {
            self.hp_samples.pop_front();
        }
        self.hp_samples.push_back(hp);
    }

    /// Average HP lost per turn over the sample window. Positive while the
    /// character is losing HP.
    pub fn hp_drop_rate(&self) -> f64 {
        if self.hp_samples.len() < 2 {
            return 0.0;
        }
        let first = *self.hp_samples.front().unwrap();
        let last = *self.hp_samples.back().unwrap();
        (first - last) as f64 / (self.hp_samples.len() - 1) as f64
    }

    pub fn blacklist(&mut self, p: Point, turn: u64) {
        self.exploration_blacklist.insert(p, turn + BLACKLIST_TTL);
    }

    /// Lazy-evicting membership check.
    pub fn is_blacklisted(&mut self, p: Point, turn: u64) -> bool {
        match self.exploration_blacklist.get(&p) {
            Some(&expiry) if expiry > turn => true,
            Some(_) => {
                self.exploration_blacklist.remove(&p);
                false
            }
            None => false,
        }
    }

    pub fn gc_blacklist(&mut self, turn: u64) {
        self.exploration_blacklist.retain(|_, &mut expiry| expiry > turn);
    }

    pub fn invalidate_single_goal_flow(&mut self) {
        self.single_goal_flow = None;
    }

    /// Full recovery purge (stuck level 6).
    pub fn purge_navigation(&mut self) {
        self.current_goal = None;
        self.single_goal_flow = None;
        self.exploration_flow = None;
        self.sweep_flow = None;
        self.frontier_cache = None;
        self.exploration_blacklist.clear();
        self.recent_positions.clear();
        self.corridor_facing = None;
    }
}
