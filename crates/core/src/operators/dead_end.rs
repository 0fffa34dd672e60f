//! Grows dead-end branches off the passable network.

use rand_chacha::ChaCha8Rng;

use super::{MazeOperator, PlanCache};
use crate::analysis::reachable_from;
use crate::maze::{Maze, Neighborhood};
use crate::seed::random_usize;
use crate::types::{Action, NodeType, Pos};

const ROOT_ATTEMPTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeadEndLimits {
    pub max_branches: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub cost_per_branch: f64,
    pub cost_per_cell: f64,
}

impl DeadEndLimits {
    fn cost(&self, branches: usize, cells: usize) -> f64 {
        branches as f64 * self.cost_per_branch + cells as f64 * self.cost_per_cell
    }
}

#[derive(Clone, Debug)]
pub struct DeadEndOperator {
    limits: DeadEndLimits,
    cache: PlanCache<Vec<Vec<Pos>>>,
}

impl DeadEndOperator {
    pub fn new(limits: DeadEndLimits, seed: u64) -> Self {
        Self { limits, cache: PlanCache::new(seed) }
    }
}

/// A wall cell can join a branch grown from `current` if it touches the network only
/// through `current`, diagonals included. Cells beside `current` may touch it diagonally.
fn extends_dead_end(maze: &Maze, current: Pos, candidate: Pos) -> bool {
    if !maze.in_bounds(candidate) || maze.node_type(candidate) != NodeType::Wall {
        return false;
    }
    if maze.passable_neighbors(candidate, Neighborhood::Cardinal) != [current] {
        return false;
    }
    maze.passable_neighbors(candidate, Neighborhood::Moore)
        .into_iter()
        .all(|pos| pos == current || pos.manhattan(current) == 1)
}

fn grow_branch(
    scratch: &mut Maze,
    root: Pos,
    length: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Pos> {
    let mut branch = Vec::with_capacity(length);
    let mut current = root;
    while branch.len() < length {
        let options: Vec<Pos> = Action::ALL
            .iter()
            .map(|&action| current.step(action))
            .filter(|&next| extends_dead_end(scratch, current, next))
            .collect();
        if options.is_empty() {
            break;
        }
        let next = options[random_usize(rng, 0, options.len() - 1)];
        if scratch.set_node_type(next, NodeType::Passable).is_err() {
            break;
        }
        branch.push(next);
        current = next;
    }
    branch
}

fn make_plan(
    limits: DeadEndLimits,
    maze: &Maze,
    remaining_budget: f64,
    rng: &mut ChaCha8Rng,
) -> Option<Vec<Vec<Pos>>> {
    let min_length = limits.min_length.max(1);
    if limits.max_branches == 0 || limits.max_length < min_length {
        return None;
    }
    let mut scratch = maze.clone();
    let mut branches: Vec<Vec<Pos>> = Vec::new();
    let mut cells = 0;
    let target = random_usize(rng, 1, limits.max_branches);

    while branches.len() < target {
        let left = remaining_budget - limits.cost(branches.len() + 1, cells);
        let affordable = if limits.cost_per_cell > 0.0 {
            if left < 0.0 { 0 } else { (left / limits.cost_per_cell).floor() as usize }
        } else if left >= 0.0 {
            usize::MAX
        } else {
            0
        };
        let length = random_usize(rng, min_length, limits.max_length).min(affordable);
        if length < min_length {
            break;
        }

        // Branches only grow off cells the agent can actually walk to.
        let roots: Vec<Pos> = scratch
            .start()
            .map(|start| reachable_from(&scratch, start).into_iter().collect())
            .unwrap_or_default();
        let mut grown = None;
        for _ in 0..ROOT_ATTEMPTS {
            let Some(&root) = roots.get(random_usize(rng, 0, roots.len().max(1) - 1)) else {
                break;
            };
            let branch = grow_branch(&mut scratch, root, length, rng);
            if branch.len() >= min_length {
                grown = Some(branch);
                break;
            }
            for &pos in &branch {
                // Cells were walls a moment ago, so reverting cannot hit a role node.
                let _ = scratch.set_node_type(pos, NodeType::Wall);
            }
        }
        let Some(branch) = grown else {
            break;
        };
        cells += branch.len();
        branches.push(branch);
    }

    (!branches.is_empty()).then_some(branches)
}

impl MazeOperator for DeadEndOperator {
    fn label(&self) -> &'static str {
        "dead_end"
    }

    fn estimate_cost(&mut self, maze: &Maze, remaining_budget: f64) -> f64 {
        let limits = self.limits;
        match self.cache.plan(maze, |rng| make_plan(limits, maze, remaining_budget, rng)) {
            Some(branches) => {
                let cells = branches.iter().map(Vec::len).sum();
                limits.cost(branches.len(), cells)
            }
            None => f64::INFINITY,
        }
    }

    fn change_maze(&mut self, maze: &mut Maze) -> bool {
        let branches = match self.cache.take(maze) {
            Some(branches) => Some(branches),
            None => {
                self.estimate_cost(maze, f64::INFINITY);
                self.cache.take(maze)
            }
        };
        let Some(branches) = branches else {
            return false;
        };
        let cells: Vec<Pos> = branches.into_iter().flatten().collect();
        !cells.is_empty() && maze.set_nodes(&cells, NodeType::Passable).is_ok()
    }
}
