use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    pub fn step(self, action: Action) -> Self {
        let (dx, dy) = action.delta();
        Self { y: self.y + dy, x: self.x + dx }
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Agent moves. Declaration order is the column order of Q-table exports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Right,
    Down,
    Left,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, -1),
            Action::Right => (1, 0),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Up => "Up",
            Action::Right => "Right",
            Action::Down => "Down",
            Action::Left => "Left",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Wall,
    Passable,
    Start,
    End,
}

impl NodeType {
    pub fn is_passable(self) -> bool {
        !matches!(self, NodeType::Wall)
    }
}

/// Q-table key derived from the passability of a node's four cardinal neighbours.
///
/// Nodes sharing a local pattern share a key, and therefore share learned values.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateKey(String);

impl StateKey {
    pub fn from_pattern(open: [bool; 4]) -> Self {
        Self(open.iter().map(|&passable| if passable { '1' } else { '0' }).collect())
    }

    pub fn from_string(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_follows_screen_coordinates() {
        let origin = Pos::new(3, 3);
        assert_eq!(origin.step(Action::Up), Pos::new(3, 2));
        assert_eq!(origin.step(Action::Right), Pos::new(4, 3));
        assert_eq!(origin.step(Action::Down), Pos::new(3, 4));
        assert_eq!(origin.step(Action::Left), Pos::new(2, 3));
    }

    #[test]
    fn state_key_encodes_up_right_down_left() {
        assert_eq!(StateKey::from_pattern([true, false, false, true]).as_str(), "1001");
        assert_eq!(StateKey::from_pattern([false; 4]).as_str(), "0000");
    }

    #[test]
    fn only_walls_block_movement() {
        assert!(!NodeType::Wall.is_passable());
        assert!(NodeType::Passable.is_passable());
        assert!(NodeType::Start.is_passable());
        assert!(NodeType::End.is_passable());
    }
}
