//! Run configuration. Parsing lives with the front ends; this module only defines the
//! shape, the defaults and the numeric preconditions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::complexity::ComplexityWeights;
use crate::error::ConfigError;
use crate::maze::RewardScheme;
use crate::registry::kinds;

/// A component picked by tag, with its numeric parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ComponentSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), params: BTreeMap::new() }
    }

    pub fn with(mut self, param: impl Into<String>, value: f64) -> Self {
        self.params.insert(param.into(), value);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub alpha: f64,
    pub gamma: f64,
    pub initial_q_value: f64,
    pub reset_qtable_per_level: bool,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self { alpha: 0.1, gamma: 0.9, initial_q_value: 0.0, reset_qtable_per_level: false }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub width: usize,
    pub height: usize,
    /// Fixed first level in text form. Generated from the seed when absent.
    pub layout: Option<Vec<String>>,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self { width: 8, height: 8, layout: None }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelTransition {
    /// Mutate the previous level's maze in place.
    #[default]
    Mutate,
    /// Start every level from a freshly generated maze, then mutate it.
    Regenerate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Budget of the first level transition.
    pub budget: f64,
    /// Added to the budget for every level after the first.
    pub budget_delta: f64,
    pub transition: LevelTransition,
    pub operators: Vec<ComponentSpec>,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            budget: 10.0,
            budget_delta: 2.0,
            transition: LevelTransition::Mutate,
            operators: vec![
                ComponentSpec::new(kinds::NEW_PATH).with("max_length", 6.0),
                ComponentSpec::new(kinds::DEAD_END).with("max_branches", 2.0).with("max_length", 4.0),
                ComponentSpec::new(kinds::RESIZE).with("increment", 1.0).with("cost_per_cell", 0.2),
            ],
        }
    }
}

impl MutationConfig {
    /// Budget of the mutation that produces `level`. Level 0 is never mutated.
    pub fn budget_for_level(&self, level: u32) -> f64 {
        if level == 0 {
            return 0.0;
        }
        (self.budget + f64::from(level - 1) * self.budget_delta).max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub seed: u64,
    pub levels: u32,
    pub learning: LearningConfig,
    pub rewards: RewardScheme,
    pub maze: MazeConfig,
    pub mutation: MutationConfig,
    pub complexity: ComplexityWeights,
    pub policy: ComponentSpec,
    pub episode_criteria: Vec<ComponentSpec>,
    pub level_criteria: Vec<ComponentSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            levels: 5,
            learning: LearningConfig::default(),
            rewards: RewardScheme::default(),
            maze: MazeConfig::default(),
            mutation: MutationConfig::default(),
            complexity: ComplexityWeights::default(),
            policy: ComponentSpec::new(kinds::EPSILON_GREEDY)
                .with("epsilon", 0.2)
                .with("decay", 0.999)
                .with("min_epsilon", 0.01),
            episode_criteria: vec![
                ComponentSpec::new(kinds::REACHED_END),
                ComponentSpec::new(kinds::MAX_ACTIONS).with("limit", 500.0),
            ],
            level_criteria: vec![
                ComponentSpec::new(kinds::EPISODE_LIMIT).with("episodes", 200.0),
                ComponentSpec::new(kinds::OPTIMAL_PATH_STREAK)
                    .with("episodes", 5.0)
                    .with("tolerance", 0.0),
            ],
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let learning = &self.learning;
        if self.levels == 0 {
            return Err(ConfigError::Invalid("levels must be at least 1".to_owned()));
        }
        if learning.alpha.is_nan() || learning.alpha <= 0.0 || learning.alpha > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "alpha must lie in (0, 1], got {}",
                learning.alpha
            )));
        }
        if !(0.0..=1.0).contains(&learning.gamma) {
            return Err(ConfigError::Invalid(format!(
                "gamma must lie in [0, 1], got {}",
                learning.gamma
            )));
        }
        if !learning.initial_q_value.is_finite() {
            return Err(ConfigError::Invalid("initial_q_value must be finite".to_owned()));
        }
        let rewards = &self.rewards;
        if ![rewards.wall, rewards.way, rewards.end].iter().all(|value| value.is_finite()) {
            return Err(ConfigError::Invalid("rewards must be finite".to_owned()));
        }
        let mutation = &self.mutation;
        if !mutation.budget.is_finite() || mutation.budget < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "mutation budget must be non-negative, got {}",
                mutation.budget
            )));
        }
        if !mutation.budget_delta.is_finite() {
            return Err(ConfigError::Invalid("mutation budget_delta must be finite".to_owned()));
        }
        if self.maze.width < 2 || self.maze.height < 2 {
            return Err(ConfigError::Invalid(format!(
                "maze must be at least 2x2, got {}x{}",
                self.maze.width, self.maze.height
            )));
        }
        if let Some(layout) = &self.maze.layout {
            let width = layout.first().map_or(0, |row| row.chars().count());
            if width == 0 || layout.iter().any(|row| row.chars().count() != width) {
                return Err(ConfigError::Invalid(
                    "maze layout must be non-empty and rectangular".to_owned(),
                ));
            }
        }
        if self.episode_criteria.is_empty() || self.level_criteria.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one episode and one level criterion are required".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(RunConfig::default().validate(), Ok(()));
    }

    #[test]
    fn learning_rates_are_range_checked() {
        let mut config = RunConfig::default();
        config.learning.alpha = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = RunConfig::default();
        config.learning.gamma = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn negative_budget_and_zero_levels_are_rejected() {
        let mut config = RunConfig::default();
        config.mutation.budget = -1.0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.levels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn ragged_layout_is_rejected() {
        let mut config = RunConfig::default();
        config.maze.layout = Some(vec!["S..".to_owned(), "..E.".to_owned()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn budget_grows_per_level() {
        let mutation = MutationConfig { budget: 4.0, budget_delta: 1.5, ..Default::default() };
        assert_eq!(mutation.budget_for_level(0), 0.0);
        assert_eq!(mutation.budget_for_level(1), 4.0);
        assert_eq!(mutation.budget_for_level(3), 7.0);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{"seed": 7, "learning": {"alpha": 0.5}, "mutation": {"transition": "regenerate"}}"#,
        )
        .expect("valid json");
        assert_eq!(config.seed, 7);
        assert_eq!(config.learning.alpha, 0.5);
        assert_eq!(config.learning.gamma, 0.9);
        assert_eq!(config.mutation.transition, LevelTransition::Regenerate);
        assert_eq!(config.mutation.operators.len(), 3);
    }
}
