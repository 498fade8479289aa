//! Dense grid primitives.
//!
//! All grids index as `y * width + x` and never materialise points in hot
//! loops. Buffers are sized once per level and reused across ticks.

use crate::model::Point;
use serde::{Deserialize, Serialize};

/// Per-tile threat scalar. Non-negative after a danger pass; additions
/// saturate instead of wrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DangerGrid {
    pub width: i32,
    pub height: i32,
    cells: Vec<i16>,
}

impl DangerGrid {
    pub fn new(width: i32, height: i32) -> DangerGrid {
        DangerGrid {
            width,
            height,
            cells: vec![0; (width * height) as usize],
        }
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    pub fn get(&self, p: Point) -> i32 {
        if !self.in_bounds(p) {
            return 0;
        }
        self.cells[(p.y * self.width + p.x) as usize] as i32
    }

    pub fn add(&mut self, p: Point, amount: i32) {
        if !self.in_bounds(p) {
            return;
        }
        let idx = (p.y * self.width + p.x) as usize;
        let sum = self.cells[idx] as i32 + amount;
        self.cells[idx] = sum.clamp(0, i16::MAX as i32) as i16;
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn max_value(&self) -> i32 {
        self.cells.iter().copied().max().unwrap_or(0) as i32
    }

    /// Resize for a new level geometry, clearing all cells.
    pub fn reset_for(&mut self, width: i32, height: i32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.cells = vec![0; (width * height) as usize];
        } else {
            self.clear();
        }
    }
}

pub const FLOW_UNREACHABLE: u8 = 255;
pub const FLOW_MAX: u8 = 254;

/// Multi-source distance field. 255 marks unreachable tiles; reachable
/// values saturate at 254.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowGrid {
    pub width: i32,
    pub height: i32,
    cells: Vec<u8>,
}

impl FlowGrid {
    pub fn new(width: i32, height: i32) -> FlowGrid {
        FlowGrid {
            width,
            height,
            cells: vec![FLOW_UNREACHABLE; (width * height) as usize],
        }
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    pub fn get(&self, p: Point) -> u8 {
        if !self.in_bounds(p) {
            return FLOW_UNREACHABLE;
        }
        self.cells[(p.y * self.width + p.x) as usize]
    }

    pub fn set(&mut self, p: Point, cost: u8) {
        if self.in_bounds(p) {
            self.cells[(p.y * self.width + p.x) as usize] = cost;
        }
    }

    pub fn fill_unreachable(&mut self) {
        self.cells.fill(FLOW_UNREACHABLE);
    }

    pub fn reset_for(&mut self, width: i32, height: i32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.cells = vec![FLOW_UNREACHABLE; (width * height) as usize];
        } else {
            self.fill_unreachable();
        }
    }
}

/// Tiles seen during the current visit to a level, plus an O(1) count.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeenGrid {
    pub width: i32,
    pub height: i32,
    cells: Vec<u8>,
    count: u32,
}

impl SeenGrid {
    pub fn new(width: i32, height: i32) -> SeenGrid {
        SeenGrid {
            width,
            height,
            cells: vec![0; (width * height) as usize],
            count: 0,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return false;
        }
        self.cells[(p.y * self.width + p.x) as usize] != 0
    }

    /// Returns true if the tile was newly inserted.
    pub fn insert(&mut self, p: Point) -> bool {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return false;
        }
        let idx = (p.y * self.width + p.x) as usize;
        if self.cells[idx] != 0 {
            return false;
        }
        self.cells[idx] = 1;
        self.count += 1;
        true
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset_for(&mut self, width: i32, height: i32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.cells = vec![0; (width * height) as usize];
        } else {
            self.cells.fill(0);
        }
        self.count = 0;
    }
}

/// Pre-allocated FIFO for the flow BFS. Capacity equals the level area, so a
/// push can never fail mid-search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowQueue {
    xs: Vec<u16>,
    ys: Vec<u16>,
    costs: Vec<u8>,
    head: usize,
    len: usize,
}

impl FlowQueue {
    pub fn ensure_capacity(&mut self, area: usize) {
        if self.xs.len() < area {
            self.xs.resize(area, 0);
            self.ys.resize(area, 0);
            self.costs.resize(area, 0);
        }
        self.head = 0;
        self.len = 0;
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, x: u16, y: u16, cost: u8) {
        debug_assert!(self.len < self.xs.len(), "flow queue overflow");
        let tail = (self.head + self.len) % self.xs.len();
        self.xs[tail] = x;
        self.ys[tail] = y;
        self.costs[tail] = cost;
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<(u16, u16, u8)> {
        if self.len == 0 {
            return None;
        }
        let entry = (self.xs[self.head], self.ys[self.head], self.costs[self.head]);
        self.head = (self.head + 1) % self.xs.len();
        self.len -= 1;
        Some(entry)
    }
}
