//! Loading run configurations from TOML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use maze_core::RunConfig;

pub fn parse_run_config(text: &str) -> Result<RunConfig> {
    let config: RunConfig = toml::from_str(text).context("Failed to parse run configuration")?;
    config.validate().context("Invalid run configuration")?;
    Ok(config)
}

pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_run_config(&text).with_context(|| format!("In config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use maze_core::{LevelTransition, RewardScheme};
    use tempfile::tempdir;

    use super::*;

    const SAMPLE: &str = r##"
seed = 11
levels = 3

[learning]
alpha = 0.5
gamma = 0.8
reset_qtable_per_level = true

[rewards]
end = 25.0

[maze]
layout = ["S..#", "#..E"]

[mutation]
budget = 4.0
budget_delta = 1.0
transition = "regenerate"
operators = [
    { kind = "new_path", params = { max_length = 5 } },
    { kind = "resize", params = { increment = 1, cost_per_cell = 0.5 } },
]

[policy]
kind = "epsilon_greedy"
params = { epsilon = 0.3, decay = 0.99 }

[[episode_criteria]]
kind = "reached_end"

[[level_criteria]]
kind = "episode_limit"
params = { episodes = 10 }
"##;

    #[test]
    fn test_sample_config_parses_with_defaults_filled_in() {
        let config = parse_run_config(SAMPLE).expect("valid config");
        assert_eq!(config.seed, 11);
        assert_eq!(config.learning.alpha, 0.5);
        assert_eq!(config.learning.initial_q_value, 0.0);
        assert!(config.learning.reset_qtable_per_level);
        assert_eq!(config.rewards.end, 25.0);
        assert_eq!(config.rewards.way, RewardScheme::default().way);
        assert_eq!(config.mutation.transition, LevelTransition::Regenerate);
        assert_eq!(config.mutation.operators.len(), 2);
        assert_eq!(config.mutation.operators[1].params.get("increment"), Some(&1.0));
        assert_eq!(config.policy.kind, "epsilon_greedy");
        assert_eq!(config.level_criteria[0].params.get("episodes"), Some(&10.0));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = parse_run_config("[learning]\nalpha = 2.0\n").expect_err("alpha out of range");
        assert!(format!("{err:#}").contains("alpha"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("run.toml");
        fs::write(&path, SAMPLE).expect("write config");
        let config = load_run_config(&path).expect("loads");
        assert_eq!(config.levels, 3);

        let missing = dir.path().join("missing.toml");
        let err = load_run_config(&missing).expect_err("missing file");
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[test]
    fn test_shipped_default_config_matches_built_in_defaults() {
        let config = parse_run_config(include_str!("../../../configs/default.toml"))
            .expect("shipped config is valid");
        let defaults = RunConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.learning, defaults.learning);
        assert_eq!(config.rewards, defaults.rewards);
        assert_eq!(config.mutation, defaults.mutation);
        assert_eq!(config.complexity, defaults.complexity);
        assert_eq!(config.policy, defaults.policy);
        assert_eq!(config.episode_criteria, defaults.episode_criteria);
        assert_eq!(config.level_criteria, defaults.level_criteria);
    }
}
