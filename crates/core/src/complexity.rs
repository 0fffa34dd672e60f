//! Difficulty score of a maze: optimal path length, parallel-route size and the
//! depth-weighted structure of the dead-end branches hanging off both.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::analysis::parallel_routes;
use crate::error::MazeError;
use crate::maze::{Maze, Neighborhood};
use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityWeights {
    /// Per move on the shortest path.
    pub action: f64,
    /// Per node on a parallel route.
    pub parallel_node: f64,
    /// Dead-end and corridor nodes inside a branch.
    pub normal: f64,
    pub three_way: f64,
    pub four_way: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self { action: 1.0, parallel_node: 0.5, normal: 0.25, three_way: 1.0, four_way: 1.5 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ComplexityBreakdown {
    pub path: f64,
    pub parallel: f64,
    pub dead_end: f64,
    pub total: f64,
}

/// Weight applied to a junction found `depth` junctions deep into a branch.
pub fn depth_weight(depth: u32) -> f64 {
    1.0 + ((f64::from(depth) * 0.25).exp() - 1.0)
}

pub fn calculate_complexity(
    maze: &Maze,
    weights: &ComplexityWeights,
) -> Result<ComplexityBreakdown, MazeError> {
    let path_length = maze.shortest_path_length()?;
    let routes = parallel_routes(maze)?;

    let mut ignore: BTreeSet<Pos> = maze.shortest_path()?.iter().copied().collect();
    let parallel_nodes = routes.nodes.difference(&ignore).count();
    ignore.extend(routes.nodes.iter().copied());

    let path = path_length as f64 * weights.action;
    let parallel = parallel_nodes as f64 * weights.parallel_node;
    let dead_end = dead_end_score(maze, &ignore, weights);
    Ok(ComplexityBreakdown { path, parallel, dead_end, total: path + parallel + dead_end })
}

fn dead_end_score(maze: &Maze, ignore: &BTreeSet<Pos>, weights: &ComplexityWeights) -> f64 {
    let mut visited = BTreeSet::new();
    let mut score = 0.0;
    for &anchor in ignore {
        for entry in maze.passable_neighbors(anchor, Neighborhood::Cardinal) {
            if ignore.contains(&entry) || !visited.insert(entry) {
                continue;
            }
            score += branch_score(maze, entry, ignore, &mut visited, weights);
        }
    }
    score
}

/// Breadth-first walk of one branch. Nodes reached through a junction sit one level
/// deeper than the junction itself.
fn branch_score(
    maze: &Maze,
    entry: Pos,
    ignore: &BTreeSet<Pos>,
    visited: &mut BTreeSet<Pos>,
    weights: &ComplexityWeights,
) -> f64 {
    let mut score = 0.0;
    let mut queue = VecDeque::from([(entry, 0_u32)]);
    while let Some((current, depth)) = queue.pop_front() {
        let neighbors = maze.passable_neighbors(current, Neighborhood::Cardinal);
        score += match neighbors.len() {
            3 => weights.three_way * depth_weight(depth),
            4 => weights.four_way * depth_weight(depth),
            _ => weights.normal,
        };
        let child_depth = if neighbors.len() > 2 { depth + 1 } else { depth };
        for next in neighbors {
            if !ignore.contains(&next) && visited.insert(next) {
                queue.push_back((next, child_depth));
            }
        }
    }
    score
}
