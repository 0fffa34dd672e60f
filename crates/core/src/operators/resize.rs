//! Grows or shrinks the grid by a fixed increment on both axes.

use rand_chacha::ChaCha8Rng;

use super::{MazeOperator, PlanCache};
use crate::maze::Maze;
use crate::seed::random_usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ResizePlan {
    width: usize,
    height: usize,
    offset_x: i32,
    offset_y: i32,
}

/// Size limits and step of a resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeLimits {
    pub increment: i32,
    pub min_size: usize,
    pub max_size: usize,
}

#[derive(Clone, Debug)]
pub struct ResizeOperator {
    limits: ResizeLimits,
    cost_per_cell: f64,
    cache: PlanCache<ResizePlan>,
}

impl ResizeOperator {
    pub fn new(limits: ResizeLimits, cost_per_cell: f64, seed: u64) -> Self {
        Self { limits, cost_per_cell, cache: PlanCache::new(seed) }
    }

    fn cost_of(&self, maze: &Maze, plan: ResizePlan) -> f64 {
        let before = maze.width() * maze.height();
        let after = plan.width * plan.height;
        before.abs_diff(after) as f64 * self.cost_per_cell
    }
}

fn make_plan(limits: ResizeLimits, maze: &Maze, rng: &mut ChaCha8Rng) -> Option<ResizePlan> {
    let grown = |size: usize| usize::try_from(size as i64 + i64::from(limits.increment)).ok();
    let width = grown(maze.width())?;
    let height = grown(maze.height())?;
    let allowed = limits.min_size..=limits.max_size;
    if limits.increment == 0 || !allowed.contains(&width) || !allowed.contains(&height) {
        return None;
    }

    // Growing shifts the old content by 0..=increment; shrinking crops up to
    // |increment| cells off the leading edges.
    let span = limits.increment.unsigned_abs() as i32;
    let low = limits.increment.min(0);
    let mut offsets: Vec<(i32, i32)> = (0..=span)
        .flat_map(|dx| (0..=span).map(move |dy| (low + dx, low + dy)))
        .collect();
    while !offsets.is_empty() {
        let (offset_x, offset_y) = offsets.swap_remove(random_usize(rng, 0, offsets.len() - 1));
        let plan = ResizePlan { width, height, offset_x, offset_y };
        if keeps_path(maze, plan) {
            return Some(plan);
        }
    }
    None
}

fn keeps_path(maze: &Maze, plan: ResizePlan) -> bool {
    maze.resized(plan.width, plan.height, plan.offset_x, plan.offset_y)
        .is_ok_and(|resized| resized.shortest_path().is_ok())
}

impl MazeOperator for ResizeOperator {
    fn label(&self) -> &'static str {
        "resize"
    }

    fn estimate_cost(&mut self, maze: &Maze, _remaining_budget: f64) -> f64 {
        let limits = self.limits;
        let plan = self.cache.plan(maze, |rng| make_plan(limits, maze, rng)).copied();
        match plan {
            Some(plan) => self.cost_of(maze, plan),
            None => f64::INFINITY,
        }
    }

    fn change_maze(&mut self, maze: &mut Maze) -> bool {
        let plan = match self.cache.take(maze) {
            Some(plan) => Some(plan),
            None => {
                self.estimate_cost(maze, f64::INFINITY);
                self.cache.take(maze)
            }
        };
        let Some(plan) = plan else {
            return false;
        };
        match maze.resized(plan.width, plan.height, plan.offset_x, plan.offset_y) {
            Ok(resized) => {
                *maze = resized;
                true
            }
            Err(_) => false,
        }
    }
}
