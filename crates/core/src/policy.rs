//! Exploration policies: how the agent picks among the actions of a state.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::agent::Transition;
use crate::error::{ConfigError, TrainingError};
use crate::qtable::QTable;
use crate::seed::{choose, random_unit};
use crate::types::{Action, StateKey};

pub trait ExplorationPolicy {
    fn label(&self) -> &'static str;

    /// Picks one of the actions recorded for `state`.
    fn choose_action(&mut self, state: &StateKey, qtable: &QTable)
    -> Result<Action, TrainingError>;

    /// Called once the Q-value of `transition` has been updated.
    fn post_processing(&mut self, _transition: &Transition, _qtable: &QTable) {}
}

/// Always exploits; ties go to the first action in Up, Right, Down, Left order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Greedy;

impl ExplorationPolicy for Greedy {
    fn label(&self) -> &'static str {
        "greedy"
    }

    fn choose_action(
        &mut self,
        state: &StateKey,
        qtable: &QTable,
    ) -> Result<Action, TrainingError> {
        Ok(qtable.best_action(state)?.0)
    }
}

#[derive(Clone, Debug)]
pub struct EpsilonGreedy {
    epsilon: f64,
    decay: f64,
    min_epsilon: f64,
    rng: ChaCha8Rng,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64, decay: f64, min_epsilon: f64, seed: u64) -> Result<Self, ConfigError> {
        for (param, value) in [("epsilon", epsilon), ("decay", decay), ("min_epsilon", min_epsilon)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidParameter {
                    kind: "epsilon_greedy".to_owned(),
                    param: param.to_owned(),
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }
        Ok(Self { epsilon, decay, min_epsilon, rng: ChaCha8Rng::seed_from_u64(seed) })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl ExplorationPolicy for EpsilonGreedy {
    fn label(&self) -> &'static str {
        "epsilon_greedy"
    }

    fn choose_action(
        &mut self,
        state: &StateKey,
        qtable: &QTable,
    ) -> Result<Action, TrainingError> {
        if random_unit(&mut self.rng) < self.epsilon {
            let actions = qtable.actions(state)?;
            if let Some(&action) = choose(&mut self.rng, &actions) {
                return Ok(action);
            }
        }
        Ok(qtable.best_action(state)?.0)
    }

    fn post_processing(&mut self, _transition: &Transition, _qtable: &QTable) {
        self.epsilon = (self.epsilon * self.decay).max(self.min_epsilon);
    }
}

/// Uniform choice among the recorded actions.
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl ExplorationPolicy for RandomPolicy {
    fn label(&self) -> &'static str {
        "random"
    }

    fn choose_action(
        &mut self,
        state: &StateKey,
        qtable: &QTable,
    ) -> Result<Action, TrainingError> {
        let actions = qtable.actions(state)?;
        choose(&mut self.rng, &actions)
            .copied()
            .ok_or_else(|| TrainingError::NoActions { state: state.clone() })
    }
}
