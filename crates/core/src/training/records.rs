//! Per-step, per-episode and per-level records, and the sink that receives them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::complexity::ComplexityBreakdown;
use crate::qtable::QTable;
use crate::types::{Action, Pos, StateKey};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepRecord {
    pub level: u32,
    pub episode: u32,
    /// 1-based index of the action within its episode.
    pub action_index: usize,
    pub from: Pos,
    pub to: Pos,
    pub old_state: StateKey,
    pub new_state: StateKey,
    pub action: Action,
    pub reward: f64,
    pub old_q: f64,
    pub new_q: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EpisodeRecord {
    pub level: u32,
    pub episode: u32,
    pub actions: usize,
    pub reward: f64,
    pub reached_end: bool,
    /// Episode criteria that stopped the episode, by label.
    pub episode_criteria: Vec<String>,
    /// Level criteria that fired after it, by label.
    pub level_criteria: Vec<String>,
    pub qtable: QTable,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelRecord {
    pub level: u32,
    pub budget: f64,
    pub mutation_cost: f64,
    pub operators_applied: Vec<&'static str>,
    pub optimal_path_length: usize,
    pub complexity: ComplexityBreakdown,
    pub structure_hash: u64,
    pub width: usize,
    pub height: usize,
    pub maze: Vec<String>,
}

/// How a level ended: episodes played and how often each criterion fired.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LevelOutcome {
    pub level: u32,
    pub episodes: usize,
    pub criterion_counts: BTreeMap<String, usize>,
}

pub trait TrainingSink {
    fn record_step(&mut self, step: &StepRecord);
    fn record_episode(&mut self, episode: &EpisodeRecord);
    fn record_level(&mut self, level: &LevelRecord);
}

/// Drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TrainingSink for NullSink {
    fn record_step(&mut self, _step: &StepRecord) {}
    fn record_episode(&mut self, _episode: &EpisodeRecord) {}
    fn record_level(&mut self, _level: &LevelRecord) {}
}

/// Keeps every record in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub steps: Vec<StepRecord>,
    pub episodes: Vec<EpisodeRecord>,
    pub levels: Vec<LevelRecord>,
}

impl TrainingSink for MemorySink {
    fn record_step(&mut self, step: &StepRecord) {
        self.steps.push(step.clone());
    }

    fn record_episode(&mut self, episode: &EpisodeRecord) {
        self.episodes.push(episode.clone());
    }

    fn record_level(&mut self, level: &LevelRecord) {
        self.levels.push(level.clone());
    }
}
