//! Unit-cost breadth-first search over the passable subgraph.
//! Neighbours are expanded in `Action::ALL` order, so results are deterministic.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::maze::{Maze, Neighborhood};
use crate::types::Pos;

/// Shortest path from `from` to `to`, both endpoints included.
pub fn shortest_path(maze: &Maze, from: Pos, to: Pos) -> Option<Vec<Pos>> {
    if !maze.is_passable(from) || !maze.is_passable(to) {
        return None;
    }
    if from == to {
        return Some(vec![from]);
    }

    let mut came_from = BTreeMap::new();
    let mut queue = VecDeque::from([from]);
    let mut seen = BTreeSet::from([from]);
    while let Some(current) = queue.pop_front() {
        for next in maze.passable_neighbors(current, Neighborhood::Cardinal) {
            if !seen.insert(next) {
                continue;
            }
            came_from.insert(next, current);
            if next == to {
                return Some(reconstruct_path(&came_from, from, to));
            }
            queue.push_back(next);
        }
    }
    None
}

pub fn reachable_from(maze: &Maze, start: Pos) -> BTreeSet<Pos> {
    let mut visited = BTreeSet::new();
    if !maze.is_passable(start) {
        return visited;
    }

    let mut queue = VecDeque::from([start]);
    visited.insert(start);
    while let Some(current) = queue.pop_front() {
        for next in maze.passable_neighbors(current, Neighborhood::Cardinal) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

fn reconstruct_path(came_from: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Vec<Pos> {
    let mut current = goal;
    let mut result = vec![current];
    while current != start {
        let Some(&previous) = came_from.get(&current) else {
            break;
        };
        current = previous;
        result.push(current);
    }
    result.reverse();
    result
}
