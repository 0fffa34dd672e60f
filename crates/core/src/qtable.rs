//! Sparse state-action value table keyed by state fingerprints.

use std::collections::BTreeMap;
use std::fmt::Write;

use log::debug;
use serde::Serialize;

use crate::error::QTableError;
use crate::types::{Action, StateKey};

pub const CSV_HEADER: &str = "State;Up;Right;Down;Left";

/// Entries are created explicitly with [`QTable::add_entry`]; lookups of unknown
/// states or actions are errors rather than implicit defaults. `Clone` is a deep copy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QTable {
    initial_value: f64,
    entries: BTreeMap<StateKey, BTreeMap<Action, f64>>,
}

impl QTable {
    pub fn new(initial_value: f64) -> Self {
        Self { initial_value, entries: BTreeMap::new() }
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, state: &StateKey) -> bool {
        self.entries.contains_key(state)
    }

    pub fn states(&self) -> impl Iterator<Item = &StateKey> {
        self.entries.keys()
    }

    /// Registers `state` with every action set to the initial value. Returns `false`
    /// and leaves the table untouched if the state is already known.
    pub fn add_entry(&mut self, state: &StateKey, actions: &[Action]) -> bool {
        if self.entries.contains_key(state) {
            debug!("state {state} already in Q-table, keeping existing entry");
            return false;
        }
        let values = actions.iter().map(|&action| (action, self.initial_value)).collect();
        self.entries.insert(state.clone(), values);
        true
    }

    pub fn actions(&self, state: &StateKey) -> Result<Vec<Action>, QTableError> {
        Ok(self.entry(state)?.keys().copied().collect())
    }

    pub fn q_value(&self, state: &StateKey, action: Action) -> Result<f64, QTableError> {
        self.entry(state)?
            .get(&action)
            .copied()
            .ok_or_else(|| QTableError::ActionNotFound { state: state.clone(), action })
    }

    pub fn set_q_value(
        &mut self,
        state: &StateKey,
        action: Action,
        value: f64,
    ) -> Result<(), QTableError> {
        let slot = self
            .entries
            .get_mut(state)
            .ok_or_else(|| QTableError::StateNotFound(state.clone()))?
            .get_mut(&action)
            .ok_or_else(|| QTableError::ActionNotFound { state: state.clone(), action })?;
        *slot = value;
        Ok(())
    }

    pub fn highest_value(&self, state: &StateKey) -> Result<f64, QTableError> {
        self.best_action(state).map(|(_, value)| value)
    }

    /// The highest-valued action; ties go to the earliest action in `Action::ALL` order.
    pub fn best_action(&self, state: &StateKey) -> Result<(Action, f64), QTableError> {
        let mut best: Option<(Action, f64)> = None;
        for (&action, &value) in self.entry(state)? {
            if best.is_none_or(|(_, top)| value > top) {
                best = Some((action, value));
            }
        }
        best.ok_or_else(|| QTableError::EmptyActionSet(state.clone()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One `;`-separated row per state, `NaN` where the state has no such action.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        csv.push('\n');
        for (state, values) in &self.entries {
            csv.push_str(state.as_str());
            for action in Action::ALL {
                match values.get(&action) {
                    Some(value) => {
                        let _ = write!(csv, ";{value}");
                    }
                    None => csv.push_str(";NaN"),
                }
            }
            csv.push('\n');
        }
        csv
    }

    fn entry(&self, state: &StateKey) -> Result<&BTreeMap<Action, f64>, QTableError> {
        self.entries.get(state).ok_or_else(|| QTableError::StateNotFound(state.clone()))
    }
}
