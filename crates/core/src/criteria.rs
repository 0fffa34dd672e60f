//! Stopping and advancement predicates evaluated against the training state.

use crate::error::ConfigError;
use crate::training::TrainingState;

/// A predicate over the training state. Criteria are compared, deduplicated and
/// counted by [`Criterion::label`], which must be stable for a given configuration.
pub trait Criterion {
    fn is_met(&mut self, state: &TrainingState<'_>) -> bool;

    /// Clears anything accumulated since the last reset. Called at each level start.
    fn reset(&mut self) {}

    fn label(&self) -> String;
}

fn invalid(kind: &str, param: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        kind: kind.to_owned(),
        param: param.to_owned(),
        reason: reason.into(),
    }
}

/// The agent stands on the end node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReachedEnd;

impl Criterion for ReachedEnd {
    fn is_met(&mut self, state: &TrainingState<'_>) -> bool {
        state.at_end
    }

    fn label(&self) -> String {
        "reached_end".to_owned()
    }
}

/// The current episode has taken `limit` actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxActions {
    limit: usize,
}

impl MaxActions {
    pub fn new(limit: usize) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(invalid("max_actions", "limit", "must be positive"));
        }
        Ok(Self { limit })
    }
}

impl Criterion for MaxActions {
    fn is_met(&mut self, state: &TrainingState<'_>) -> bool {
        state.actions_in_episode >= self.limit
    }

    fn label(&self) -> String {
        format!("max_actions({})", self.limit)
    }
}

/// The level has run `episodes` complete episodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeLimit {
    episodes: usize,
}

impl EpisodeLimit {
    pub fn new(episodes: usize) -> Result<Self, ConfigError> {
        if episodes == 0 {
            return Err(invalid("episode_limit", "episodes", "must be positive"));
        }
        Ok(Self { episodes })
    }
}

impl Criterion for EpisodeLimit {
    fn is_met(&mut self, state: &TrainingState<'_>) -> bool {
        state.completed_episodes.len() >= self.episodes
    }

    fn label(&self) -> String {
        format!("episode_limit({})", self.episodes)
    }
}

/// `episodes` consecutive episodes reached the end within `tolerance` of the optimal
/// action count.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimalPathStreak {
    episodes: usize,
    tolerance: f64,
    streak: usize,
    seen: usize,
}

impl OptimalPathStreak {
    pub fn new(episodes: usize, tolerance: f64) -> Result<Self, ConfigError> {
        if episodes == 0 {
            return Err(invalid("optimal_path_streak", "episodes", "must be positive"));
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(invalid("optimal_path_streak", "tolerance", "must be non-negative"));
        }
        Ok(Self { episodes, tolerance, streak: 0, seen: 0 })
    }

    pub fn streak(&self) -> usize {
        self.streak
    }
}

impl Criterion for OptimalPathStreak {
    fn is_met(&mut self, state: &TrainingState<'_>) -> bool {
        let allowed = state.optimal_path_length as f64 * (1.0 + self.tolerance);
        for episode in state.completed_episodes.iter().skip(self.seen) {
            if episode.reached_end && episode.actions as f64 <= allowed {
                self.streak += 1;
            } else {
                self.streak = 0;
            }
        }
        self.seen = state.completed_episodes.len();
        self.streak >= self.episodes
    }

    fn reset(&mut self) {
        self.streak = 0;
        self.seen = 0;
    }

    fn label(&self) -> String {
        format!("optimal_path_streak({}, {})", self.episodes, self.tolerance)
    }
}
