//! Episode and level state machine driving the agent through a curriculum of mazes.

mod records;

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::agent::Agent;
use crate::analysis::{MutationOutcome, change_maze};
use crate::complexity::calculate_complexity;
use crate::config::{LevelTransition, RunConfig};
use crate::criteria::Criterion;
use crate::error::{MazeError, TrainingError};
use crate::generator::MazeGenerator;
use crate::maze::Maze;
use crate::operators::MazeOperator;
use crate::policy::ExplorationPolicy;
use crate::qtable::QTable;
use crate::registry::Registries;
use crate::seed::{derive_level_seed, mix_seed_stream, stream_rng, streams};
use crate::types::Pos;

pub use records::{
    EpisodeRecord, LevelOutcome, LevelRecord, MemorySink, NullSink, StepRecord, TrainingSink,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    AwaitingAction,
    EpisodeEnded,
    LevelEnded,
    TrainingFinished,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub actions: usize,
    pub reward: f64,
    pub reached_end: bool,
}

/// Read-only view handed to criteria.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingState<'a> {
    pub level: u32,
    pub episode: u32,
    pub phase: Phase,
    pub actions_in_episode: usize,
    pub episode_reward: f64,
    pub agent_pos: Pos,
    pub at_end: bool,
    pub optimal_path_length: usize,
    /// Episodes finished so far in the current level, oldest first.
    pub completed_episodes: &'a [EpisodeSummary],
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepEvent {
    /// The agent moved. `episode` is set when the move ended the episode.
    Action { step: StepRecord, episode: Option<EpisodeRecord> },
    EpisodeStarted { level: u32, episode: u32 },
    LevelStarted(LevelRecord),
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceStopReason {
    Finished,
    Cancelled,
    BudgetExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvanceResult {
    pub simulated_steps: u32,
    pub stop_reason: AdvanceStopReason,
}

/// Shared flag a host can set to stop [`Training::advance`] at the next step boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Training {
    config: RunConfig,
    generator: MazeGenerator,
    maze: Maze,
    agent: Agent,
    policy: Box<dyn ExplorationPolicy>,
    operators: Vec<Box<dyn MazeOperator>>,
    episode_criteria: Vec<Box<dyn Criterion>>,
    level_criteria: Vec<Box<dyn Criterion>>,
    mutation_rng: ChaCha8Rng,
    phase: Phase,
    level: u32,
    episode: u32,
    optimal_path_length: usize,
    completed: Vec<EpisodeSummary>,
    criterion_counts: BTreeMap<String, usize>,
    level_records: Vec<LevelRecord>,
    level_outcomes: Vec<LevelOutcome>,
    pending_level: Option<LevelRecord>,
    cancel: CancelHandle,
}

impl Training {
    pub fn new(config: RunConfig, registries: &Registries) -> Result<Self, TrainingError> {
        config.validate()?;
        let seed = config.seed;
        let policy = registries.policies.build(&config.policy, mix_seed_stream(seed, streams::POLICY))?;
        let operators = config
            .mutation
            .operators
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                let stream = streams::OPERATOR_BASE + idx as u64;
                registries.operators.build(spec, mix_seed_stream(seed, stream))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let episode_criteria = config
            .episode_criteria
            .iter()
            .map(|spec| registries.criteria.build(spec, seed))
            .collect::<Result<Vec<_>, _>>()?;
        let level_criteria = config
            .level_criteria
            .iter()
            .map(|spec| registries.criteria.build(spec, seed))
            .collect::<Result<Vec<_>, _>>()?;

        let generator = MazeGenerator::new(config.maze.width, config.maze.height, config.rewards);
        let maze = match &config.maze.layout {
            Some(rows) => Maze::from_rows(rows, config.rewards)?,
            None => generator.generate(derive_level_seed(seed, 0))?,
        };
        let start = maze.start().ok_or(MazeError::MissingStart)?;
        let learning = config.learning;
        let agent =
            Agent::new(start, QTable::new(learning.initial_q_value), learning.alpha, learning.gamma);

        let mut training = Self {
            mutation_rng: stream_rng(seed, streams::MUTATION),
            config,
            generator,
            maze,
            agent,
            policy,
            operators,
            episode_criteria,
            level_criteria,
            phase: Phase::AwaitingAction,
            level: 0,
            episode: 0,
            optimal_path_length: 0,
            completed: Vec::new(),
            criterion_counts: BTreeMap::new(),
            level_records: Vec::new(),
            level_outcomes: Vec::new(),
            pending_level: None,
            cancel: CancelHandle::default(),
        };
        let record = training.enter_level(0, 0.0, MutationOutcome::default())?;
        training.pending_level = Some(record);
        Ok(training)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn level_records(&self) -> &[LevelRecord] {
        &self.level_records
    }

    /// Completed levels with their criterion counts.
    pub fn level_outcomes(&self) -> &[LevelOutcome] {
        &self.level_outcomes
    }

    /// How often each criterion fired in the current level, by label.
    pub fn criterion_counts(&self) -> &BTreeMap<String, usize> {
        &self.criterion_counts
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> TrainingState<'_> {
        TrainingState {
            level: self.level,
            episode: self.episode,
            phase: self.phase,
            actions_in_episode: self.agent.action_count(),
            episode_reward: self.agent.episode_reward(),
            agent_pos: self.agent.pos(),
            at_end: self.maze.end() == Some(self.agent.pos()),
            optimal_path_length: self.optimal_path_length,
            completed_episodes: &self.completed,
        }
    }

    /// Performs one state-machine transition. The first call announces level 0.
    pub fn step(&mut self) -> Result<StepEvent, TrainingError> {
        if let Some(record) = self.pending_level.take() {
            return Ok(StepEvent::LevelStarted(record));
        }
        match self.phase {
            Phase::AwaitingAction => self.act(),
            Phase::EpisodeEnded => {
                self.start_episode();
                Ok(StepEvent::EpisodeStarted { level: self.level, episode: self.episode })
            }
            Phase::LevelEnded => {
                if self.level + 1 >= self.config.levels {
                    info!("training finished after {} levels", self.level + 1);
                    self.phase = Phase::TrainingFinished;
                    return Ok(StepEvent::Finished);
                }
                let record = self.next_level()?;
                Ok(StepEvent::LevelStarted(record))
            }
            Phase::TrainingFinished => Ok(StepEvent::Finished),
        }
    }

    /// Steps until training finishes, the handle is cancelled, or `max_steps` transitions
    /// have run. Records go to `sink` as they are produced.
    pub fn advance(
        &mut self,
        max_steps: u32,
        sink: &mut dyn TrainingSink,
    ) -> Result<AdvanceResult, TrainingError> {
        let mut steps = 0;
        loop {
            if self.phase == Phase::TrainingFinished && self.pending_level.is_none() {
                return Ok(AdvanceResult {
                    simulated_steps: steps,
                    stop_reason: AdvanceStopReason::Finished,
                });
            }
            if self.cancel.is_cancelled() {
                return Ok(AdvanceResult {
                    simulated_steps: steps,
                    stop_reason: AdvanceStopReason::Cancelled,
                });
            }
            if steps >= max_steps {
                return Ok(AdvanceResult {
                    simulated_steps: steps,
                    stop_reason: AdvanceStopReason::BudgetExhausted,
                });
            }

            let event = self.step()?;
            steps += 1;
            match &event {
                StepEvent::Action { step, episode } => {
                    sink.record_step(step);
                    if let Some(episode) = episode {
                        sink.record_episode(episode);
                    }
                }
                StepEvent::LevelStarted(record) => sink.record_level(record),
                StepEvent::EpisodeStarted { .. } | StepEvent::Finished => {}
            }
        }
    }

    fn act(&mut self) -> Result<StepEvent, TrainingError> {
        let transition = self.agent.step(&self.maze, self.policy.as_mut())?;
        let step = StepRecord {
            level: self.level,
            episode: self.episode,
            action_index: self.agent.action_count(),
            from: transition.from,
            to: transition.to,
            old_state: transition.from_state,
            new_state: transition.to_state,
            action: transition.action,
            reward: transition.reward,
            old_q: transition.old_q,
            new_q: transition.new_q,
        };

        let episode_fired = self.evaluate(CriterionGroup::Episode);
        if episode_fired.is_empty() {
            return Ok(StepEvent::Action { step, episode: None });
        }

        let summary = EpisodeSummary {
            episode: self.episode,
            actions: self.agent.action_count(),
            reward: self.agent.episode_reward(),
            reached_end: self.state().at_end,
        };
        self.completed.push(summary);
        self.phase = Phase::EpisodeEnded;

        let level_fired = self.evaluate(CriterionGroup::Level);
        if !level_fired.is_empty() {
            debug!("level {} ended by {level_fired:?}", self.level);
            self.phase = Phase::LevelEnded;
            self.level_outcomes.push(LevelOutcome {
                level: self.level,
                episodes: self.completed.len(),
                criterion_counts: self.criterion_counts.clone(),
            });
        }

        let episode = EpisodeRecord {
            level: self.level,
            episode: self.episode,
            actions: summary.actions,
            reward: summary.reward,
            reached_end: summary.reached_end,
            episode_criteria: episode_fired,
            level_criteria: level_fired,
            qtable: self.agent.qtable().clone(),
        };
        Ok(StepEvent::Action { step, episode: Some(episode) })
    }

    /// Runs every criterion of a group, without short-circuiting, and counts the ones
    /// that fired.
    fn evaluate(&mut self, group: CriterionGroup) -> Vec<String> {
        let mut criteria = match group {
            CriterionGroup::Episode => mem::take(&mut self.episode_criteria),
            CriterionGroup::Level => mem::take(&mut self.level_criteria),
        };
        let state = self.state();
        let fired: Vec<String> = criteria
            .iter_mut()
            .filter_map(|criterion| criterion.is_met(&state).then(|| criterion.label()))
            .collect();
        match group {
            CriterionGroup::Episode => self.episode_criteria = criteria,
            CriterionGroup::Level => self.level_criteria = criteria,
        }
        for label in &fired {
            *self.criterion_counts.entry(label.clone()).or_default() += 1;
        }
        fired
    }

    fn start_episode(&mut self) {
        self.episode += 1;
        if let Some(start) = self.maze.start() {
            self.agent.reset_episode(start);
        }
        self.phase = Phase::AwaitingAction;
    }

    fn next_level(&mut self) -> Result<LevelRecord, TrainingError> {
        let level = self.level + 1;
        let budget = self.config.mutation.budget_for_level(level);
        let base = match self.config.mutation.transition {
            LevelTransition::Mutate => self.maze.clone(),
            LevelTransition::Regenerate => {
                self.generator.generate(derive_level_seed(self.config.seed, level))?
            }
        };

        let mut candidate = base.clone();
        let outcome =
            change_maze(&mut candidate, &mut self.operators, budget, &mut self.mutation_rng);
        self.maze = if candidate.shortest_path().is_ok() {
            candidate
        } else {
            warn!("mutation for level {level} disconnected the maze, keeping the unmutated layout");
            base
        };
        self.enter_level(level, budget, outcome)
    }

    fn enter_level(
        &mut self,
        level: u32,
        budget: f64,
        outcome: MutationOutcome,
    ) -> Result<LevelRecord, TrainingError> {
        let start = self.maze.start().ok_or(MazeError::MissingStart)?;
        self.optimal_path_length = self.maze.shortest_path_length()?;
        let complexity = calculate_complexity(&self.maze, &self.config.complexity)?;

        self.level = level;
        self.episode = 0;
        self.completed.clear();
        self.criterion_counts.clear();
        for criterion in self.episode_criteria.iter_mut().chain(self.level_criteria.iter_mut()) {
            criterion.reset();
        }
        if self.config.learning.reset_qtable_per_level {
            self.agent.clear_qtable();
        }
        self.agent.reset_episode(start);
        self.phase = Phase::AwaitingAction;

        info!(
            "level {level}: {}x{} maze, optimal path {}, complexity {:.3}, mutation cost {:.3}/{budget:.3}",
            self.maze.width(),
            self.maze.height(),
            self.optimal_path_length,
            complexity.total,
            outcome.cost,
        );
        let record = LevelRecord {
            level,
            budget,
            mutation_cost: outcome.cost,
            operators_applied: outcome.applied,
            optimal_path_length: self.optimal_path_length,
            complexity,
            structure_hash: self.maze.structure_hash(),
            width: self.maze.width(),
            height: self.maze.height(),
            maze: self.maze.rows(),
        };
        self.level_records.push(record.clone());
        Ok(record)
    }
}

#[derive(Clone, Copy)]
enum CriterionGroup {
    Episode,
    Level,
}
