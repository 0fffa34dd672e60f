//! Detection of alternate routes that leave the shortest path and rejoin it
//! at a different node.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::MazeError;
use crate::maze::{Maze, Neighborhood};
use crate::types::Pos;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParallelRoutes {
    /// One entry per connected region of route nodes, ordered by where it leaves the
    /// path. Overlapping detours share a region. Nodes are listed breadth-first from
    /// the node that leaves the path earliest, so an entry is not a walk.
    pub routes: Vec<Vec<Pos>>,
    /// Every node of every route.
    pub nodes: BTreeSet<Pos>,
}

impl ParallelRoutes {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Collects off-path nodes that lie between two distinct nodes of the shortest path.
///
/// A node qualifies when some simple off-path detour from one path node to a different
/// path node passes through it. Loops that hang off a detour through a single node do
/// not qualify, and neither do dead ends.
pub fn parallel_routes(maze: &Maze) -> Result<ParallelRoutes, MazeError> {
    let path = maze.shortest_path()?;
    let on_path: BTreeSet<Pos> = path.iter().copied().collect();
    let mut assigned = BTreeSet::new();
    let mut result = ParallelRoutes::default();

    for &anchor in path {
        for entry in maze.passable_neighbors(anchor, Neighborhood::Cardinal) {
            if on_path.contains(&entry) || assigned.contains(&entry) {
                continue;
            }
            let region = off_path_region(maze, entry, &on_path);
            assigned.extend(region.iter().copied());
            for route in routes_in_region(maze, &region, &on_path, path) {
                result.nodes.extend(route.iter().copied());
                result.routes.push(route);
            }
        }
    }
    Ok(result)
}

fn off_path_region(maze: &Maze, entry: Pos, on_path: &BTreeSet<Pos>) -> BTreeSet<Pos> {
    let mut region = BTreeSet::from([entry]);
    let mut queue = VecDeque::from([entry]);
    while let Some(current) = queue.pop_front() {
        for next in maze.passable_neighbors(current, Neighborhood::Cardinal) {
            if !on_path.contains(&next) && region.insert(next) {
                queue.push_back(next);
            }
        }
    }
    region
}

fn attachments(maze: &Maze, pos: Pos, on_path: &BTreeSet<Pos>) -> Vec<Pos> {
    maze.passable_neighbors(pos, Neighborhood::Cardinal)
        .into_iter()
        .filter(|next| on_path.contains(next))
        .collect()
}

fn routes_in_region(
    maze: &Maze,
    region: &BTreeSet<Pos>,
    on_path: &BTreeSet<Pos>,
    path: &[Pos],
) -> Vec<Vec<Pos>> {
    let network = RouteNetwork::new(maze, region, on_path);
    let mut alive: BTreeSet<Pos> =
        region.iter().copied().filter(|&pos| network.joins_two_anchors(pos)).collect();

    let path_index: BTreeMap<Pos, usize> =
        path.iter().enumerate().map(|(idx, &pos)| (pos, idx)).collect();
    let mut routes = Vec::new();
    while let Some(seed) = earliest_attached(maze, &alive, on_path, &path_index) {
        let mut route = Vec::new();
        let mut queue = VecDeque::from([seed]);
        alive.remove(&seed);
        while let Some(current) = queue.pop_front() {
            route.push(current);
            for next in maze.passable_neighbors(current, Neighborhood::Cardinal) {
                if alive.remove(&next) {
                    queue.push_back(next);
                }
            }
        }
        routes.push(route);
    }
    routes
}

struct FlowEdge {
    to: usize,
    capacity: u8,
}

/// Unit-capacity flow network over one off-path region.
///
/// Every region node is split into an entry and an exit joined by a single unit edge,
/// so two augmenting paths never share a node. Each path node the region touches
/// drains into the sink through its own unit edge, so two units of flow end on two
/// different path nodes.
struct RouteNetwork {
    index: BTreeMap<Pos, usize>,
    sink: usize,
    edges: Vec<FlowEdge>,
    adjacency: Vec<Vec<usize>>,
}

impl RouteNetwork {
    fn new(maze: &Maze, region: &BTreeSet<Pos>, on_path: &BTreeSet<Pos>) -> Self {
        let index: BTreeMap<Pos, usize> =
            region.iter().enumerate().map(|(idx, &pos)| (pos, idx)).collect();
        let anchors: BTreeMap<Pos, usize> = region
            .iter()
            .flat_map(|&pos| attachments(maze, pos, on_path))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(idx, pos)| (pos, idx))
            .collect();
        let first_anchor = 2 * region.len();
        let sink = first_anchor + anchors.len();
        let mut network = Self {
            index: BTreeMap::new(),
            sink,
            edges: Vec::new(),
            adjacency: vec![Vec::new(); sink + 1],
        };

        for (idx, &pos) in region.iter().enumerate() {
            network.add_edge(2 * idx, 2 * idx + 1);
            for next in maze.passable_neighbors(pos, Neighborhood::Cardinal) {
                if let Some(&other) = index.get(&next) {
                    network.add_edge(2 * idx + 1, 2 * other);
                } else if let Some(&anchor) = anchors.get(&next) {
                    network.add_edge(2 * idx + 1, first_anchor + anchor);
                }
            }
        }
        for anchor in 0..anchors.len() {
            network.add_edge(first_anchor + anchor, sink);
        }
        network.index = index;
        network
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        self.adjacency[from].push(self.edges.len());
        self.edges.push(FlowEdge { to, capacity: 1 });
        self.adjacency[to].push(self.edges.len());
        self.edges.push(FlowEdge { to: from, capacity: 0 });
    }

    /// Whether `pos` has two node-disjoint ways out to two different path nodes,
    /// i.e. whether it sits on some simple detour between them.
    fn joins_two_anchors(&self, pos: Pos) -> bool {
        let Some(&idx) = self.index.get(&pos) else {
            return false;
        };
        let source = 2 * idx + 1;
        let mut capacity: Vec<u8> = self.edges.iter().map(|edge| edge.capacity).collect();
        (0..2).all(|_| self.augment(source, &mut capacity))
    }

    fn augment(&self, source: usize, capacity: &mut [u8]) -> bool {
        let mut via: Vec<Option<usize>> = vec![None; self.adjacency.len()];
        let mut seen = vec![false; self.adjacency.len()];
        seen[source] = true;
        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            if current == self.sink {
                break;
            }
            for &edge in &self.adjacency[current] {
                let to = self.edges[edge].to;
                if capacity[edge] > 0 && !seen[to] {
                    seen[to] = true;
                    via[to] = Some(edge);
                    queue.push_back(to);
                }
            }
        }
        if !seen[self.sink] {
            return false;
        }
        let mut current = self.sink;
        while let Some(edge) = via[current] {
            capacity[edge] -= 1;
            capacity[edge ^ 1] += 1;
            current = self.edges[edge ^ 1].to;
        }
        true
    }
}

/// The live node attached to the lowest path index, ties broken by position.
fn earliest_attached(
    maze: &Maze,
    alive: &BTreeSet<Pos>,
    on_path: &BTreeSet<Pos>,
    path_index: &BTreeMap<Pos, usize>,
) -> Option<Pos> {
    alive
        .iter()
        .copied()
        .map(|pos| {
            let first = attachments(maze, pos, on_path)
                .iter()
                .filter_map(|anchor| path_index.get(anchor).copied())
                .min()
                .unwrap_or(usize::MAX);
            (first, pos)
        })
        .min()
        .map(|(_, pos)| pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::RewardScheme;

    fn maze(rows: &[&str]) -> Maze {
        Maze::from_rows(rows, RewardScheme::default()).expect("valid layout")
    }

    #[test]
    fn single_bypass_corridor_is_one_route_of_eight_nodes() {
        let maze = maze(&[
            "#S..E#", //
            "#.##.#",
            "#.##.#",
            "#....#",
            "#.####",
            "######",
        ]);
        let routes = parallel_routes(&maze).expect("connected");
        assert_eq!(routes.routes.len(), 1);
        assert_eq!(routes.routes[0].len(), 8);
        assert_eq!(routes.node_count(), 8);
        assert!(!routes.nodes.contains(&Pos::new(1, 4)), "dangling branch is not a route");
        assert_eq!(routes.routes[0][0], Pos::new(1, 1), "route starts where it leaves the path");
    }

    #[test]
    fn disjoint_bypasses_are_reported_separately() {
        let maze = maze(&[
            "...##", //
            "S...E",
            "##...",
        ]);
        let routes = parallel_routes(&maze).expect("connected");
        assert_eq!(routes.routes.len(), 2);
        assert_eq!(routes.routes[0].len(), 3);
        assert_eq!(routes.routes[1].len(), 3);
        assert!(routes.nodes.contains(&Pos::new(0, 0)));
        assert!(routes.nodes.contains(&Pos::new(4, 2)));
        assert_eq!(routes.node_count(), 6);
    }

    #[test]
    fn loop_returning_to_the_same_path_node_is_not_a_route() {
        let maze = maze(&[
            "#...#", //
            "#.#.#",
            "#...#",
            "##.##",
            "S...E",
        ]);
        // The ring hangs off path node (2,4) through the single stem (2,3).
        let routes = parallel_routes(&maze).expect("connected");
        assert!(routes.routes.is_empty(), "{routes:?}");
    }

    #[test]
    fn loop_hanging_off_a_bypass_is_not_part_of_the_route() {
        let maze = maze(&[
            "S...E", //
            ".###.",
            ".....",
            "##.##",
            "#...#",
            "#.#.#",
            "#...#",
        ]);
        // The ring below row 3 joins the bypass only through (2,3).
        let routes = parallel_routes(&maze).expect("connected");
        assert_eq!(routes.routes.len(), 1);
        assert_eq!(routes.node_count(), 7, "{routes:?}");
        for ring in [Pos::new(2, 3), Pos::new(2, 4), Pos::new(1, 5), Pos::new(3, 6)] {
            assert!(!routes.nodes.contains(&ring), "{ring:?} is a dead-end loop");
        }
        assert_eq!(routes.routes[0][0], Pos::new(0, 1));
    }

    #[test]
    fn overlapping_detours_share_one_region() {
        let maze = maze(&[
            "S...E", //
            ".#.#.",
            ".....",
        ]);
        let routes = parallel_routes(&maze).expect("connected");
        assert_eq!(routes.routes.len(), 1);
        assert_eq!(routes.routes[0].len(), 8);
        assert!(routes.nodes.contains(&Pos::new(2, 1)), "chord to the middle of the path");
        assert_eq!(routes.routes[0][0], Pos::new(0, 1));
    }

    #[test]
    fn dead_ends_only_yield_no_routes() {
        let maze = maze(&[
            "S.....E", //
            "#.#.#.#",
            "#.#.###",
        ]);
        let routes = parallel_routes(&maze).expect("connected");
        assert!(routes.routes.is_empty());
        assert!(routes.nodes.is_empty());
    }

    #[test]
    fn disconnected_maze_reports_no_path() {
        let maze = maze(&["S#E"]);
        assert_eq!(parallel_routes(&maze), Err(MazeError::NoPathExists));
    }
}
