//! The maze grid: an arena of nodes addressed by position, the start/end designation,
//! and a shortest-path cache that every topology change invalidates.

mod node;
mod text;

use std::cell::OnceCell;

use xxhash_rust::xxh3::xxh3_64;

use crate::analysis::pathing;
use crate::error::MazeError;
use crate::types::{Action, NodeType, Pos, StateKey};

pub use node::{Node, RewardScheme};

/// Which neighbours count as adjacent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighborhood {
    Cardinal,
    Moore,
}

const MOORE_OFFSETS: [(i32, i32); 8] =
    [(0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1)];

#[derive(Clone, Debug)]
pub struct Maze {
    width: usize,
    height: usize,
    nodes: Vec<Node>,
    rewards: RewardScheme,
    start: Option<Pos>,
    end: Option<Pos>,
    path_cache: OnceCell<Vec<Pos>>,
}

impl PartialEq for Maze {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.start == other.start
            && self.end == other.end
            && self.nodes == other.nodes
    }
}

impl Maze {
    /// A walls-only grid with no start or end assigned.
    pub fn new(width: usize, height: usize, rewards: RewardScheme) -> Result<Self, MazeError> {
        if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        let mut nodes = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                nodes.push(rewards.node(Pos::new(x as i32, y as i32), NodeType::Wall));
            }
        }
        Ok(Self {
            width,
            height,
            nodes,
            rewards,
            start: None,
            end: None,
            path_cache: OnceCell::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rewards(&self) -> &RewardScheme {
        &self.rewards
    }

    pub fn start(&self) -> Option<Pos> {
        self.start
    }

    pub fn end(&self) -> Option<Pos> {
        self.end
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn node(&self, pos: Pos) -> Option<&Node> {
        self.index(pos).map(|idx| &self.nodes[idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Out-of-bounds positions read as walls.
    pub fn node_type(&self, pos: Pos) -> NodeType {
        self.node(pos).map_or(NodeType::Wall, Node::kind)
    }

    pub fn is_passable(&self, pos: Pos) -> bool {
        self.node_type(pos).is_passable()
    }

    pub fn passable_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_passable()).count()
    }

    pub fn passable_positions(&self) -> Vec<Pos> {
        self.nodes.iter().filter(|node| node.is_passable()).map(Node::pos).collect()
    }

    pub fn passable_neighbors(&self, pos: Pos, neighborhood: Neighborhood) -> Vec<Pos> {
        match neighborhood {
            Neighborhood::Cardinal => Action::ALL
                .iter()
                .map(|&action| pos.step(action))
                .filter(|&next| self.is_passable(next))
                .collect(),
            Neighborhood::Moore => MOORE_OFFSETS
                .iter()
                .map(|&(dx, dy)| Pos::new(pos.x + dx, pos.y + dy))
                .filter(|&next| self.is_passable(next))
                .collect(),
        }
    }

    /// Moves available from `pos`, in `Action::ALL` order.
    pub fn available_actions(&self, pos: Pos) -> Vec<Action> {
        Action::ALL.iter().copied().filter(|&action| self.is_passable(pos.step(action))).collect()
    }

    /// Fingerprint of the node's cardinal passability, recomputed on every call.
    pub fn state_of(&self, pos: Pos) -> StateKey {
        let open = Action::ALL.map(|action| self.is_passable(pos.step(action)));
        StateKey::from_pattern(open)
    }

    /// Re-types a node. Start and end go through their dedicated setters; the nodes
    /// currently holding those roles cannot be overwritten.
    pub fn set_node_type(&mut self, pos: Pos, kind: NodeType) -> Result<(), MazeError> {
        match kind {
            NodeType::Start => return self.set_start(pos),
            NodeType::End => return self.set_end(pos),
            NodeType::Wall | NodeType::Passable => {}
        }
        let idx = self.index(pos).ok_or(MazeError::OutOfBounds { pos })?;
        if self.start == Some(pos) || self.end == Some(pos) {
            return Err(MazeError::ProtectedNode { pos });
        }
        if self.nodes[idx].kind() != kind {
            self.rewards.retype(&mut self.nodes[idx], kind);
            self.invalidate_path();
        }
        Ok(())
    }

    /// Applies one type to many nodes. Validation happens before any node changes.
    pub fn set_nodes(&mut self, positions: &[Pos], kind: NodeType) -> Result<(), MazeError> {
        if matches!(kind, NodeType::Start | NodeType::End) && positions.len() > 1 {
            return Err(MazeError::ProtectedNode { pos: positions[1] });
        }
        for &pos in positions {
            if !self.in_bounds(pos) {
                return Err(MazeError::OutOfBounds { pos });
            }
            if !matches!(kind, NodeType::Start | NodeType::End)
                && (self.start == Some(pos) || self.end == Some(pos))
            {
                return Err(MazeError::ProtectedNode { pos });
            }
        }
        for &pos in positions {
            self.set_node_type(pos, kind)?;
        }
        Ok(())
    }

    pub fn set_start(&mut self, pos: Pos) -> Result<(), MazeError> {
        self.assign_role(pos, NodeType::Start)
    }

    pub fn set_end(&mut self, pos: Pos) -> Result<(), MazeError> {
        self.assign_role(pos, NodeType::End)
    }

    fn assign_role(&mut self, pos: Pos, role: NodeType) -> Result<(), MazeError> {
        let idx = self.index(pos).ok_or(MazeError::OutOfBounds { pos })?;
        let (current, other) = match role {
            NodeType::Start => (self.start, self.end),
            _ => (self.end, self.start),
        };
        if other == Some(pos) {
            return Err(MazeError::ProtectedNode { pos });
        }
        if current == Some(pos) {
            return Ok(());
        }
        if let Some(previous) = current.and_then(|previous| self.index(previous)) {
            self.rewards.retype(&mut self.nodes[previous], NodeType::Passable);
        }
        self.rewards.retype(&mut self.nodes[idx], role);
        match role {
            NodeType::Start => self.start = Some(pos),
            _ => self.end = Some(pos),
        }
        self.invalidate_path();
        Ok(())
    }

    /// Start-to-end path including both endpoints, cached until the next mutation.
    pub fn shortest_path(&self) -> Result<&[Pos], MazeError> {
        if let Some(path) = self.path_cache.get() {
            return Ok(path);
        }
        let start = self.start.ok_or(MazeError::MissingStart)?;
        let end = self.end.ok_or(MazeError::MissingEnd)?;
        let path = pathing::shortest_path(self, start, end).ok_or(MazeError::NoPathExists)?;
        Ok(self.path_cache.get_or_init(|| path))
    }

    /// Number of moves on the shortest start-to-end path.
    pub fn shortest_path_length(&self) -> Result<usize, MazeError> {
        Ok(self.shortest_path()?.len() - 1)
    }

    /// Copies this maze into a grid of a different size. The old cell at `(x, y)` lands
    /// at `(x + offset_x, y + offset_y)`; cells without a source become walls. Fails if
    /// the start or end would fall outside the new grid.
    pub fn resized(
        &self,
        width: usize,
        height: usize,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<Maze, MazeError> {
        let mut resized = Maze::new(width, height, self.rewards)?;
        let shift = |pos: Pos| Pos::new(pos.x + offset_x, pos.y + offset_y);
        for role in [self.start, self.end].into_iter().flatten() {
            if !resized.in_bounds(shift(role)) {
                return Err(MazeError::OutOfBounds { pos: shift(role) });
            }
        }
        for node in &self.nodes {
            let target = shift(node.pos());
            if let Some(idx) = resized.index(target) {
                resized.nodes[idx] = self.rewards.relocate(node, target);
            }
        }
        resized.start = self.start.map(shift);
        resized.end = self.end.map(shift);
        Ok(resized)
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.nodes.len() + 24);
        bytes.extend((self.width as u32).to_le_bytes());
        bytes.extend((self.height as u32).to_le_bytes());
        for node in &self.nodes {
            bytes.push(match node.kind() {
                NodeType::Wall => 0,
                NodeType::Passable => 1,
                NodeType::Start => 2,
                NodeType::End => 3,
            });
        }
        for role in [self.start, self.end] {
            let pos = role.unwrap_or(Pos::new(-1, -1));
            bytes.extend(pos.y.to_le_bytes());
            bytes.extend(pos.x.to_le_bytes());
        }
        bytes
    }

    pub fn structure_hash(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| (pos.y as usize) * self.width + (pos.x as usize))
    }

    fn invalidate_path(&mut self) {
        self.path_cache = OnceCell::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Maze {
        Maze::from_rows(&["#####", "#S.E#", "#####"], RewardScheme::default())
            .expect("valid layout")
    }

    #[test]
    fn new_maze_is_all_walls_without_roles() {
        let maze = Maze::new(4, 3, RewardScheme::default()).expect("valid dimensions");
        assert_eq!(maze.passable_count(), 0);
        assert_eq!(maze.start(), None);
        assert_eq!(maze.end(), None);
        assert_eq!(maze.shortest_path(), Err(MazeError::MissingStart));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            Maze::new(0, 3, RewardScheme::default()),
            Err(MazeError::InvalidDimensions { width: 0, height: 3 })
        );
    }

    #[test]
    fn state_fingerprint_tracks_mutations() {
        let mut maze = corridor();
        let middle = Pos::new(2, 1);
        assert_eq!(maze.state_of(middle).as_str(), "0101");

        maze.set_node_type(Pos::new(2, 0), NodeType::Passable).expect("in bounds");
        assert_eq!(maze.state_of(middle).as_str(), "1101");
        assert_eq!(maze.available_actions(middle), vec![Action::Up, Action::Right, Action::Left]);
    }

    #[test]
    fn moore_neighbourhood_includes_diagonals() {
        let mut maze = corridor();
        maze.set_node_type(Pos::new(3, 2), NodeType::Passable).expect("in bounds");
        let middle = Pos::new(2, 1);
        assert_eq!(maze.passable_neighbors(middle, Neighborhood::Cardinal).len(), 2);
        assert_eq!(
            maze.passable_neighbors(middle, Neighborhood::Moore),
            vec![Pos::new(3, 1), Pos::new(3, 2), Pos::new(1, 1)]
        );
    }

    #[test]
    fn reassigning_start_reverts_previous_holder() {
        let mut maze = corridor();
        let old_start = Pos::new(1, 1);
        let new_start = Pos::new(2, 1);
        maze.set_start(new_start).expect("in bounds");

        let old = maze.node(old_start).expect("in bounds");
        assert_eq!(old.kind(), NodeType::Passable);
        assert_eq!(old.reward(), maze.rewards().way);
        assert_eq!(maze.node_type(new_start), NodeType::Start);
        assert_eq!(maze.start(), Some(new_start));
        assert_eq!(maze.shortest_path_length(), Ok(1));
    }

    #[test]
    fn end_node_carries_terminal_reward() {
        let maze = corridor();
        let end = maze.node(Pos::new(3, 1)).expect("in bounds");
        assert_eq!(end.kind(), NodeType::End);
        assert_eq!(end.reward(), RewardScheme::default().end);
    }

    #[test]
    fn role_holders_cannot_be_overwritten() {
        let mut maze = corridor();
        assert_eq!(
            maze.set_node_type(Pos::new(1, 1), NodeType::Wall),
            Err(MazeError::ProtectedNode { pos: Pos::new(1, 1) })
        );
        assert_eq!(
            maze.set_start(Pos::new(3, 1)),
            Err(MazeError::ProtectedNode { pos: Pos::new(3, 1) })
        );
    }

    #[test]
    fn bulk_update_validates_before_mutating() {
        let mut maze = corridor();
        let before = maze.clone();
        let result = maze.set_nodes(&[Pos::new(1, 0), Pos::new(9, 9)], NodeType::Passable);
        assert_eq!(result, Err(MazeError::OutOfBounds { pos: Pos::new(9, 9) }));
        assert_eq!(maze, before);
    }

    #[test]
    fn path_cache_is_invalidated_by_topology_change() {
        let mut maze = Maze::from_rows(
            &["#######", "#S...E#", "#.###.#", "#.....#", "#######"],
            RewardScheme::default(),
        )
        .expect("valid layout");
        assert_eq!(maze.shortest_path_length(), Ok(4));

        maze.set_node_type(Pos::new(3, 1), NodeType::Wall).expect("in bounds");
        assert_eq!(maze.shortest_path_length(), Ok(8));

        maze.set_node_type(Pos::new(1, 2), NodeType::Wall).expect("in bounds");
        assert_eq!(maze.shortest_path(), Err(MazeError::NoPathExists));
    }

    #[test]
    fn deep_copy_is_independent_of_the_original() {
        let original = corridor();
        let mut copy = original.clone();
        copy.set_node_type(Pos::new(2, 0), NodeType::Passable).expect("in bounds");
        copy.set_start(Pos::new(2, 1)).expect("in bounds");

        assert_eq!(original.node_type(Pos::new(2, 0)), NodeType::Wall);
        assert_eq!(original.start(), Some(Pos::new(1, 1)));
        assert_ne!(original, copy);
        assert_ne!(original.structure_hash(), copy.structure_hash());
    }

    #[test]
    fn resized_grid_shifts_content_and_pads_with_walls() {
        let maze = corridor();
        let grown = maze.resized(7, 5, 1, 1).expect("roles stay inside");
        assert_eq!(grown.rows(), vec!["#######", "#######", "##S.E##", "#######", "#######"]);
        assert_eq!(grown.start(), Some(Pos::new(2, 2)));
        assert_eq!(grown.shortest_path_length(), Ok(2));
        assert_eq!(grown.node(Pos::new(3, 2)).map(Node::pos), Some(Pos::new(3, 2)));
    }

    #[test]
    fn shrinking_crops_around_the_roles() {
        let maze = corridor();
        let cropped = maze.resized(3, 3, -1, 0).expect("roles stay inside");
        assert_eq!(cropped.rows(), vec!["###", "S.E", "###"]);
        assert_eq!(
            maze.resized(3, 3, -2, 0),
            Err(MazeError::OutOfBounds { pos: Pos::new(-1, 1) })
        );
    }

    #[test]
    fn structure_hash_ignores_node_identity() {
        let a = corridor();
        let b = corridor();
        assert_eq!(a.structure_hash(), b.structure_hash());
        assert_eq!(a, b);
    }
}
