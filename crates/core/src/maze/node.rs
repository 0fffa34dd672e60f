//! Grid cells and the reward scheme that keeps a cell's type and reward in step.

use serde::{Deserialize, Serialize};

use crate::types::{NodeType, Pos};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pos: Pos,
    kind: NodeType,
    reward: f64,
}

impl Node {
    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn kind(&self) -> NodeType {
        self.kind
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn is_passable(&self) -> bool {
        self.kind.is_passable()
    }
}

/// Builds nodes and re-types them so that type and reward never disagree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardScheme {
    /// Reward carried by impassable nodes.
    pub wall: f64,
    /// Per-step reward for passable and start nodes.
    pub way: f64,
    /// Terminal reward of the end node.
    pub end: f64,
}

impl Default for RewardScheme {
    fn default() -> Self {
        Self { wall: -1.0, way: -0.1, end: 10.0 }
    }
}

impl RewardScheme {
    pub fn reward_for(&self, kind: NodeType) -> f64 {
        match kind {
            NodeType::Wall => self.wall,
            NodeType::Passable | NodeType::Start => self.way,
            NodeType::End => self.end,
        }
    }

    pub fn node(&self, pos: Pos, kind: NodeType) -> Node {
        Node { pos, kind, reward: self.reward_for(kind) }
    }

    pub(crate) fn retype(&self, node: &mut Node, kind: NodeType) {
        node.kind = kind;
        node.reward = self.reward_for(kind);
    }

    pub(crate) fn relocate(&self, node: &Node, pos: Pos) -> Node {
        self.node(pos, node.kind)
    }
}
