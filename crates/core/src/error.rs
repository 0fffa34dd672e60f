//! Error taxonomy shared by the maze engine, the Q-table and the training loop.

use thiserror::Error;

use crate::types::{Action, Pos, StateKey};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MazeError {
    #[error("no path exists between start and end")]
    NoPathExists,
    #[error("position {pos:?} is outside the maze")]
    OutOfBounds { pos: Pos },
    #[error("maze has no start node")]
    MissingStart,
    #[error("maze has no end node")]
    MissingEnd,
    #[error("invalid maze dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("node {pos:?} holds the start or end designation")]
    ProtectedNode { pos: Pos },
    #[error("invalid layout at row {row}: {reason}")]
    InvalidLayout { row: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QTableError {
    #[error("state {0} is not in the Q-table")]
    StateNotFound(StateKey),
    #[error("action {action:?} is not recorded for state {state}")]
    ActionNotFound { state: StateKey, action: Action },
    #[error("state {0} has no recorded actions")]
    EmptyActionSet(StateKey),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown {category} kind '{kind}'")]
    UnknownKind { category: &'static str, kind: String },
    #[error("'{kind}' does not accept parameter '{param}'")]
    UnknownParameter { kind: String, param: String },
    #[error("'{kind}' requires parameter '{param}'")]
    MissingParameter { kind: String, param: String },
    #[error("'{kind}' parameter '{param}' is invalid: {reason}")]
    InvalidParameter { kind: String, param: String, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Maze(#[from] MazeError),
    #[error(transparent)]
    QTable(#[from] QTableError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("agent has no available action in state {state}")]
    NoActions { state: StateKey },
}
