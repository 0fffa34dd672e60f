//! The learning agent: position, Q-table and the one-step Q-learning update.

use serde::Serialize;

use crate::error::{QTableError, TrainingError};
use crate::maze::{Maze, Node};
use crate::policy::ExplorationPolicy;
use crate::qtable::QTable;
use crate::types::{Action, Pos, StateKey};

/// Everything one update touched, handed to the policy and to sinks.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transition {
    pub from: Pos,
    pub to: Pos,
    pub from_state: StateKey,
    pub to_state: StateKey,
    pub action: Action,
    pub reward: f64,
    pub old_q: f64,
    pub new_q: f64,
}

#[derive(Clone, Debug)]
pub struct Agent {
    pos: Pos,
    qtable: QTable,
    alpha: f64,
    gamma: f64,
    action_count: usize,
    episode_reward: f64,
}

impl Agent {
    pub fn new(pos: Pos, qtable: QTable, alpha: f64, gamma: f64) -> Self {
        Self { pos, qtable, alpha, gamma, action_count: 0, episode_reward: 0.0 }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn qtable(&self) -> &QTable {
        &self.qtable
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Actions taken in the current episode.
    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Reward collected in the current episode.
    pub fn episode_reward(&self) -> f64 {
        self.episode_reward
    }

    /// Puts the agent on `pos` with fresh episode counters. The Q-table is kept.
    pub fn reset_episode(&mut self, pos: Pos) {
        self.pos = pos;
        self.action_count = 0;
        self.episode_reward = 0.0;
    }

    pub fn clear_qtable(&mut self) {
        self.qtable.clear();
    }

    /// Fingerprint of `pos`, registering it with its current actions if unseen.
    pub fn observe(&mut self, maze: &Maze, pos: Pos) -> StateKey {
        let state = maze.state_of(pos);
        if !self.qtable.contains(&state) {
            self.qtable.add_entry(&state, &maze.available_actions(pos));
        }
        state
    }

    /// One interaction: pick an action, move, and apply
    /// `Q(s,a) += alpha * (r + gamma * max Q(s',.) - Q(s,a))`.
    ///
    /// `s'` is registered before its maximum is read; a successor without actions
    /// contributes the table's initial value.
    pub fn step(
        &mut self,
        maze: &Maze,
        policy: &mut dyn ExplorationPolicy,
    ) -> Result<Transition, TrainingError> {
        let from = self.pos;
        let from_state = self.observe(maze, from);
        if self.qtable.actions(&from_state)?.is_empty() {
            return Err(TrainingError::NoActions { state: from_state });
        }

        let action = policy.choose_action(&from_state, &self.qtable)?;
        let old_q = self.qtable.q_value(&from_state, action)?;
        let to = from.step(action);
        let reward = maze.node(to).map_or(maze.rewards().wall, Node::reward);

        let to_state = self.observe(maze, to);
        let next_max = match self.qtable.highest_value(&to_state) {
            Ok(value) => value,
            Err(QTableError::EmptyActionSet(_)) => self.qtable.initial_value(),
            Err(err) => return Err(err.into()),
        };
        let new_q = old_q + self.alpha * (reward + self.gamma * next_max - old_q);
        self.qtable.set_q_value(&from_state, action, new_q)?;

        let transition =
            Transition { from, to, from_state, to_state, action, reward, old_q, new_q };
        policy.post_processing(&transition, &self.qtable);

        self.pos = to;
        self.action_count += 1;
        self.episode_reward += reward;
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::RewardScheme;
    use crate::policy::Greedy;

    fn corridor() -> Maze {
        Maze::from_rows(&["S..E"], RewardScheme { wall: -5.0, way: -1.0, end: 10.0 })
            .expect("valid layout")
    }

    #[test]
    fn alpha_one_gamma_zero_stores_the_raw_reward() {
        let maze = corridor();
        let start = maze.start().expect("start");
        let mut table = QTable::new(0.0);
        let state = maze.state_of(start);
        table.add_entry(&state, &[Action::Right]);
        table.set_q_value(&state, Action::Right, 123.0).expect("known pair");
        let mut agent = Agent::new(start, table, 1.0, 0.0);

        let transition = agent.step(&maze, &mut Greedy).expect("step");
        assert_eq!(transition.old_q, 123.0);
        assert_eq!(transition.new_q, -1.0);
        assert_eq!(agent.qtable().q_value(&state, Action::Right), Ok(-1.0));
    }

    #[test]
    fn successor_is_registered_before_its_maximum_is_read() {
        let maze = corridor();
        let start = maze.start().expect("start");
        let mut agent = Agent::new(start, QTable::new(2.0), 0.5, 1.0);

        let transition = agent.step(&maze, &mut Greedy).expect("step");
        assert_eq!(transition.from_state.as_str(), "0100");
        assert_eq!(transition.to_state.as_str(), "0101");
        assert!(agent.qtable().contains(&transition.to_state));
        // 2 + 0.5 * (-1 + 1 * 2 - 2)
        assert_eq!(transition.new_q, 1.5);
        assert_eq!(agent.pos(), Pos::new(1, 0));
        assert_eq!(agent.action_count(), 1);
        assert_eq!(agent.episode_reward(), -1.0);
    }

    #[test]
    fn boxed_in_agent_reports_no_actions() {
        let maze = Maze::from_rows(&["S#E"], RewardScheme::default()).expect("valid layout");
        let mut agent = Agent::new(Pos::new(0, 0), QTable::new(0.0), 0.5, 0.9);
        let err = agent.step(&maze, &mut Greedy).expect_err("no moves");
        assert!(matches!(err, TrainingError::NoActions { .. }));
    }

    #[test]
    fn reset_keeps_learned_values() {
        let maze = corridor();
        let start = maze.start().expect("start");
        let mut agent = Agent::new(start, QTable::new(0.0), 0.5, 0.9);
        agent.step(&maze, &mut Greedy).expect("step");
        agent.reset_episode(start);
        assert_eq!(agent.pos(), start);
        assert_eq!(agent.action_count(), 0);
        assert_eq!(agent.episode_reward(), 0.0);
        assert_eq!(agent.qtable().len(), 2);
    }
}
