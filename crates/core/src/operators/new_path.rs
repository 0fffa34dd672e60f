//! Carves an extra corridor between two passable nodes.

use rand_chacha::ChaCha8Rng;

use super::{MazeOperator, PlanCache};
use crate::maze::Maze;
use crate::seed::random_usize;
use crate::types::{NodeType, Pos};

/// Lengths are counted in carved wall cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewPathLimits {
    pub min_length: usize,
    pub max_length: usize,
    pub cost_per_cell: f64,
    pub attempts: usize,
}

#[derive(Clone, Debug)]
pub struct NewPathOperator {
    limits: NewPathLimits,
    cache: PlanCache<Vec<Pos>>,
}

impl NewPathOperator {
    pub fn new(limits: NewPathLimits, seed: u64) -> Self {
        Self { limits, cache: PlanCache::new(seed) }
    }
}

/// A random staircase walk from `from` to `to`, both included. Every step moves one
/// cell closer to `to`, so the walk stays inside the bounding box of its endpoints.
pub(crate) fn monotone_walk(from: Pos, to: Pos, rng: &mut ChaCha8Rng) -> Vec<Pos> {
    let mut walk = vec![from];
    let mut current = from;
    while current != to {
        let dx = (to.x - current.x).signum();
        let dy = (to.y - current.y).signum();
        let horizontal = match (dx, dy) {
            (0, _) => false,
            (_, 0) => true,
            _ => random_usize(rng, 0, 1) == 0,
        };
        current = if horizontal {
            Pos::new(current.x + dx, current.y)
        } else {
            Pos::new(current.x, current.y + dy)
        };
        walk.push(current);
    }
    walk
}

fn make_plan(
    limits: NewPathLimits,
    maze: &Maze,
    remaining_budget: f64,
    rng: &mut ChaCha8Rng,
) -> Option<Vec<Pos>> {
    let affordable = if limits.cost_per_cell > 0.0 {
        (remaining_budget / limits.cost_per_cell).floor().min(usize::MAX as f64) as usize
    } else {
        usize::MAX
    };
    let cap = limits.max_length.min(affordable);
    let min_length = limits.min_length.max(1);
    let candidates = maze.passable_positions();
    if candidates.len() < 2 || cap < min_length {
        return None;
    }

    for _ in 0..limits.attempts {
        let from = candidates[random_usize(rng, 0, candidates.len() - 1)];
        let to = candidates[random_usize(rng, 0, candidates.len() - 1)];
        if from == to {
            continue;
        }
        let carved: Vec<Pos> = monotone_walk(from, to, rng)
            .into_iter()
            .filter(|&pos| maze.node_type(pos) == NodeType::Wall)
            .collect();
        if (min_length..=cap).contains(&carved.len()) {
            return Some(carved);
        }
    }
    None
}

impl MazeOperator for NewPathOperator {
    fn label(&self) -> &'static str {
        "new_path"
    }

    fn estimate_cost(&mut self, maze: &Maze, remaining_budget: f64) -> f64 {
        let limits = self.limits;
        match self.cache.plan(maze, |rng| make_plan(limits, maze, remaining_budget, rng)) {
            Some(carved) => carved.len() as f64 * limits.cost_per_cell,
            None => f64::INFINITY,
        }
    }

    fn change_maze(&mut self, maze: &mut Maze) -> bool {
        let carved = match self.cache.take(maze) {
            Some(carved) => Some(carved),
            None => {
                self.estimate_cost(maze, f64::INFINITY);
                self.cache.take(maze)
            }
        };
        match carved {
            Some(carved) if !carved.is_empty() => {
                maze.set_nodes(&carved, NodeType::Passable).is_ok()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::RewardScheme;
    use crate::seed::stream_rng;

    fn limits(min_length: usize, max_length: usize) -> NewPathLimits {
        NewPathLimits { min_length, max_length, cost_per_cell: 1.0, attempts: 64 }
    }

    fn open_ends() -> Maze {
        Maze::from_rows(
            &["S#####", "######", "######", "######", "#####E"],
            RewardScheme::default(),
        )
        .expect("valid layout")
    }

    #[test]
    fn monotone_walk_is_a_shortest_staircase() {
        let mut rng = stream_rng(5, 1);
        let from = Pos::new(1, 4);
        let to = Pos::new(5, 0);
        let walk = monotone_walk(from, to, &mut rng);
        assert_eq!(walk.first(), Some(&from));
        assert_eq!(walk.last(), Some(&to));
        assert_eq!(walk.len() as u32, from.manhattan(to) + 1);
        assert!(walk.windows(2).all(|pair| pair[0].manhattan(pair[1]) == 1));
    }

    #[test]
    fn carving_connects_isolated_endpoints() {
        let mut maze = open_ends();
        assert!(maze.shortest_path().is_err());
        let mut operator = NewPathOperator::new(limits(1, 20), 11);

        let cost = operator.estimate_cost(&maze, 100.0);
        assert_eq!(cost, 8.0, "eight wall cells lie between the corners");
        assert!(operator.change_maze(&mut maze));
        assert_eq!(maze.passable_count(), 10);
        assert_eq!(maze.shortest_path_length(), Ok(9));
    }

    #[test]
    fn budget_caps_the_carved_length() {
        let maze = open_ends();
        let mut operator = NewPathOperator::new(limits(1, 20), 11);
        assert_eq!(operator.estimate_cost(&maze, 7.5), f64::INFINITY);
    }

    #[test]
    fn estimate_is_pure_and_repeatable() {
        let maze = open_ends();
        let before = maze.clone();
        let mut operator = NewPathOperator::new(limits(1, 20), 2);
        let first = operator.estimate_cost(&maze, 50.0);
        assert_eq!(operator.estimate_cost(&maze, 50.0), first);
        assert_eq!(maze, before);
    }

    #[test]
    fn stale_plan_is_replaced_after_the_maze_changes() {
        let mut maze = open_ends();
        let mut operator = NewPathOperator::new(limits(1, 20), 4);
        operator.estimate_cost(&maze, 50.0);
        maze.set_node_type(Pos::new(1, 0), NodeType::Passable).expect("in bounds");

        assert!(operator.change_maze(&mut maze));
        assert_eq!(maze.shortest_path_length(), Ok(9));
    }
}
