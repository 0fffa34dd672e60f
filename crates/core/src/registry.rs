//! Tag-to-constructor tables for the configurable components.

use std::collections::BTreeMap;

use crate::config::ComponentSpec;
use crate::criteria::{Criterion, EpisodeLimit, MaxActions, OptimalPathStreak, ReachedEnd};
use crate::error::ConfigError;
use crate::operators::{
    DeadEndLimits, DeadEndOperator, MazeOperator, NewPathLimits, NewPathOperator, ResizeLimits,
    ResizeOperator,
};
use crate::policy::{EpsilonGreedy, ExplorationPolicy, Greedy, RandomPolicy};

pub mod kinds {
    pub const REACHED_END: &str = "reached_end";
    pub const MAX_ACTIONS: &str = "max_actions";
    pub const EPISODE_LIMIT: &str = "episode_limit";
    pub const OPTIMAL_PATH_STREAK: &str = "optimal_path_streak";

    pub const RESIZE: &str = "resize";
    pub const NEW_PATH: &str = "new_path";
    pub const DEAD_END: &str = "dead_end";

    pub const GREEDY: &str = "greedy";
    pub const EPSILON_GREEDY: &str = "epsilon_greedy";
    pub const RANDOM: &str = "random";
}

/// Typed access to the parameters of one component spec.
pub struct Params<'a> {
    kind: &'a str,
    values: &'a BTreeMap<String, f64>,
}

impl Params<'_> {
    fn invalid(&self, param: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidParameter {
            kind: self.kind.to_owned(),
            param: param.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn number(&self, param: &str) -> Result<f64, ConfigError> {
        let value = *self.values.get(param).ok_or_else(|| ConfigError::MissingParameter {
            kind: self.kind.to_owned(),
            param: param.to_owned(),
        })?;
        if !value.is_finite() {
            return Err(self.invalid(param, "must be finite"));
        }
        Ok(value)
    }

    pub fn number_or(&self, param: &str, default: f64) -> Result<f64, ConfigError> {
        if self.values.contains_key(param) { self.number(param) } else { Ok(default) }
    }

    pub fn integer(&self, param: &str) -> Result<i64, ConfigError> {
        let value = self.number(param)?;
        if value.fract() != 0.0 || value.abs() > i32::MAX as f64 {
            return Err(self.invalid(param, format!("{value} is not an integer")));
        }
        Ok(value as i64)
    }

    pub fn count(&self, param: &str) -> Result<usize, ConfigError> {
        let value = self.integer(param)?;
        usize::try_from(value).map_err(|_| self.invalid(param, "must not be negative"))
    }

    pub fn count_or(&self, param: &str, default: usize) -> Result<usize, ConfigError> {
        if self.values.contains_key(param) { self.count(param) } else { Ok(default) }
    }

    pub fn positive(&self, param: &str, default: f64) -> Result<f64, ConfigError> {
        let value = self.number_or(param, default)?;
        if value <= 0.0 {
            return Err(self.invalid(param, "must be positive"));
        }
        Ok(value)
    }
}

pub type Constructor<T> = fn(&Params<'_>, u64) -> Result<Box<T>, ConfigError>;

struct Entry<T: ?Sized> {
    params: &'static [&'static str],
    build: Constructor<T>,
}

pub struct Registry<T: ?Sized> {
    category: &'static str,
    entries: BTreeMap<&'static str, Entry<T>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new(category: &'static str) -> Self {
        Self { category, entries: BTreeMap::new() }
    }

    /// Adds or replaces the constructor for `kind`.
    pub fn register(
        &mut self,
        kind: &'static str,
        params: &'static [&'static str],
        build: Constructor<T>,
    ) {
        self.entries.insert(kind, Entry { params, build });
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn build(&self, spec: &ComponentSpec, seed: u64) -> Result<Box<T>, ConfigError> {
        let entry = self.entries.get(spec.kind.as_str()).ok_or_else(|| ConfigError::UnknownKind {
            category: self.category,
            kind: spec.kind.clone(),
        })?;
        if let Some(param) = spec.params.keys().find(|param| !entry.params.contains(&param.as_str())) {
            return Err(ConfigError::UnknownParameter {
                kind: spec.kind.clone(),
                param: param.clone(),
            });
        }
        (entry.build)(&Params { kind: &spec.kind, values: &spec.params }, seed)
    }
}

pub struct Registries {
    pub criteria: Registry<dyn Criterion>,
    pub operators: Registry<dyn MazeOperator>,
    pub policies: Registry<dyn ExplorationPolicy>,
}

impl Default for Registries {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registries {
    pub fn builtin() -> Self {
        let mut criteria: Registry<dyn Criterion> = Registry::new("criterion");
        criteria.register(kinds::REACHED_END, &[], |_, _| Ok(Box::new(ReachedEnd)));
        criteria.register(kinds::MAX_ACTIONS, &["limit"], |params, _| {
            Ok(Box::new(MaxActions::new(params.count("limit")?)?))
        });
        criteria.register(kinds::EPISODE_LIMIT, &["episodes"], |params, _| {
            Ok(Box::new(EpisodeLimit::new(params.count("episodes")?)?))
        });
        criteria.register(kinds::OPTIMAL_PATH_STREAK, &["episodes", "tolerance"], |params, _| {
            Ok(Box::new(OptimalPathStreak::new(
                params.count("episodes")?,
                params.number_or("tolerance", 0.0)?,
            )?))
        });

        let mut operators: Registry<dyn MazeOperator> = Registry::new("operator");
        operators.register(
            kinds::RESIZE,
            &["increment", "cost_per_cell", "min_size", "max_size"],
            build_resize,
        );
        operators.register(
            kinds::NEW_PATH,
            &["min_length", "max_length", "cost_per_cell", "attempts"],
            build_new_path,
        );
        operators.register(
            kinds::DEAD_END,
            &["max_branches", "min_length", "max_length", "cost_per_branch", "cost_per_cell"],
            build_dead_end,
        );

        let mut policies: Registry<dyn ExplorationPolicy> = Registry::new("policy");
        policies.register(kinds::GREEDY, &[], |_, _| Ok(Box::new(Greedy)));
        policies.register(kinds::EPSILON_GREEDY, &["epsilon", "decay", "min_epsilon"], |params, seed| {
            Ok(Box::new(EpsilonGreedy::new(
                params.number("epsilon")?,
                params.number_or("decay", 1.0)?,
                params.number_or("min_epsilon", 0.0)?,
                seed,
            )?))
        });
        policies.register(kinds::RANDOM, &[], |_, seed| Ok(Box::new(RandomPolicy::new(seed))));

        Self { criteria, operators, policies }
    }
}

fn build_resize(params: &Params<'_>, seed: u64) -> Result<Box<dyn MazeOperator>, ConfigError> {
    let increment = params.integer("increment")?;
    if increment == 0 {
        return Err(params.invalid("increment", "must not be zero"));
    }
    let limits = ResizeLimits {
        increment: increment as i32,
        min_size: params.count_or("min_size", 3)?.max(2),
        max_size: params.count_or("max_size", 64)?,
    };
    if limits.max_size < limits.min_size {
        return Err(params.invalid("max_size", "must not be below min_size"));
    }
    Ok(Box::new(ResizeOperator::new(limits, params.positive("cost_per_cell", 1.0)?, seed)))
}

fn build_new_path(params: &Params<'_>, seed: u64) -> Result<Box<dyn MazeOperator>, ConfigError> {
    let limits = NewPathLimits {
        min_length: params.count_or("min_length", 1)?.max(1),
        max_length: params.count("max_length")?,
        cost_per_cell: params.positive("cost_per_cell", 1.0)?,
        attempts: params.count_or("attempts", 16)?,
    };
    if limits.max_length < limits.min_length {
        return Err(params.invalid("max_length", "must not be below min_length"));
    }
    Ok(Box::new(NewPathOperator::new(limits, seed)))
}

fn build_dead_end(params: &Params<'_>, seed: u64) -> Result<Box<dyn MazeOperator>, ConfigError> {
    let limits = DeadEndLimits {
        max_branches: params.count_or("max_branches", 1)?,
        min_length: params.count_or("min_length", 1)?.max(1),
        max_length: params.count("max_length")?,
        cost_per_branch: params.number_or("cost_per_branch", 1.0)?,
        cost_per_cell: params.number_or("cost_per_cell", 0.5)?,
    };
    if limits.max_branches == 0 {
        return Err(params.invalid("max_branches", "must be positive"));
    }
    if limits.max_length < limits.min_length {
        return Err(params.invalid("max_length", "must not be below min_length"));
    }
    if limits.cost_per_branch < 0.0
        || limits.cost_per_cell < 0.0
        || limits.cost_per_branch + limits.cost_per_cell <= 0.0
    {
        return Err(params.invalid("cost_per_branch", "costs must be non-negative with a positive sum"));
    }
    Ok(Box::new(DeadEndOperator::new(limits, seed)))
}
