pub mod agent;
pub mod analysis;
pub mod complexity;
pub mod config;
pub mod criteria;
pub mod error;
pub mod generator;
pub mod maze;
pub mod operators;
pub mod policy;
pub mod qtable;
pub mod registry;
pub mod seed;
pub mod training;
pub mod types;

pub use agent::{Agent, Transition};
pub use complexity::{ComplexityBreakdown, ComplexityWeights, calculate_complexity};
pub use config::{ComponentSpec, LevelTransition, RunConfig};
pub use error::{ConfigError, MazeError, QTableError, TrainingError};
pub use maze::{Maze, Neighborhood, Node, RewardScheme};
pub use qtable::QTable;
pub use registry::{Registries, Registry};
pub use training::{
    AdvanceResult, AdvanceStopReason, CancelHandle, Phase, StepEvent, Training, TrainingSink,
    TrainingState,
};
pub use types::*;
