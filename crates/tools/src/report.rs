//! Report files for a training run: JSON lines per episode and level, one Q-table CSV
//! per finished level and a JSON summary.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use maze_core::training::{EpisodeRecord, LevelOutcome, LevelRecord, StepRecord};
use maze_core::{RunConfig, TrainingSink};
use serde::Serialize;

pub const EPISODES_FILE: &str = "episodes.jsonl";
pub const LEVELS_FILE: &str = "levels.jsonl";
pub const SUMMARY_FILE: &str = "summary.json";

pub fn qtable_file_name(level: u32) -> String {
    format!("qtable_level_{level}.csv")
}

/// Streams records into an output directory.
///
/// Sink callbacks cannot fail, so the first I/O error is kept and returned by
/// [`ReportWriter::finish`]; later records are dropped.
pub struct ReportWriter {
    dir: PathBuf,
    episodes: BufWriter<File>,
    levels: BufWriter<File>,
    steps: u64,
    error: Option<io::Error>,
}

impl ReportWriter {
    pub fn create(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            episodes: BufWriter::new(File::create(dir.join(EPISODES_FILE))?),
            levels: BufWriter::new(File::create(dir.join(LEVELS_FILE))?),
            steps: 0,
            error: None,
        })
    }

    pub fn steps_recorded(&self) -> u64 {
        self.steps
    }

    pub fn finish(mut self) -> io::Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.episodes.flush()?;
        self.levels.flush()
    }

    fn keep_first_error(&mut self, result: io::Result<()>) {
        if let Err(err) = result
            && self.error.is_none()
        {
            self.error = Some(err);
        }
    }
}

fn write_json_line<T: Serialize>(writer: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
    writer.write_all(b"\n")
}

impl TrainingSink for ReportWriter {
    fn record_step(&mut self, _step: &StepRecord) {
        self.steps += 1;
    }

    fn record_episode(&mut self, episode: &EpisodeRecord) {
        if self.error.is_some() {
            return;
        }
        let mut result = write_json_line(&mut self.episodes, episode);
        if result.is_ok() && !episode.level_criteria.is_empty() {
            let path = self.dir.join(qtable_file_name(episode.level));
            result = fs::write(path, episode.qtable.to_csv());
        }
        self.keep_first_error(result);
    }

    fn record_level(&mut self, level: &LevelRecord) {
        if self.error.is_some() {
            return;
        }
        let result = write_json_line(&mut self.levels, level);
        self.keep_first_error(result);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub config: &'a RunConfig,
    pub simulated_steps: u64,
    pub stop_reason: String,
    pub levels: &'a [LevelOutcome],
    pub final_qtable_states: usize,
}

/// Writes `summary.json` through a temporary file so a crash never leaves it half written.
pub fn write_summary(dir: &Path, summary: &RunSummary<'_>) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(SUMMARY_FILE);
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, &path)
}

#[cfg(test)]
mod tests {
    use maze_core::registry::kinds;
    use maze_core::{AdvanceStopReason, ComponentSpec, Registries, Training};
    use tempfile::tempdir;

    use super::*;

    fn short_run_config() -> RunConfig {
        let mut config = RunConfig { seed: 5, levels: 2, ..Default::default() };
        config.maze.width = 5;
        config.maze.height = 5;
        config.policy = ComponentSpec::new(kinds::RANDOM);
        config.episode_criteria = vec![
            ComponentSpec::new(kinds::REACHED_END),
            ComponentSpec::new(kinds::MAX_ACTIONS).with("limit", 50.0),
        ];
        config.level_criteria =
            vec![ComponentSpec::new(kinds::EPISODE_LIMIT).with("episodes", 3.0)];
        config
    }

    #[test]
    fn test_report_files_are_written_per_level() {
        let dir = tempdir().expect("tempdir");
        let config = short_run_config();
        let mut training = Training::new(config.clone(), &Registries::builtin()).expect("valid");
        let mut writer = ReportWriter::create(dir.path()).expect("create report");
        let result = training.advance(100_000, &mut writer).expect("runs");
        assert_eq!(result.stop_reason, AdvanceStopReason::Finished);
        assert!(writer.steps_recorded() > 0);
        writer.finish().expect("flush");

        let episodes = fs::read_to_string(dir.path().join(EPISODES_FILE)).expect("episodes");
        assert_eq!(episodes.lines().count(), 6);
        for line in episodes.lines() {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            assert!(value.get("qtable").is_some());
        }
        let levels = fs::read_to_string(dir.path().join(LEVELS_FILE)).expect("levels");
        assert_eq!(levels.lines().count(), 2);

        for level in 0..2 {
            let csv = fs::read_to_string(dir.path().join(qtable_file_name(level))).expect("csv");
            assert!(csv.starts_with("State;Up;Right;Down;Left\n"));
        }
    }

    #[test]
    fn test_summary_is_written_atomically() {
        let dir = tempdir().expect("tempdir");
        let config = short_run_config();
        let summary = RunSummary {
            config: &config,
            simulated_steps: 12,
            stop_reason: "Finished".to_owned(),
            levels: &[],
            final_qtable_states: 0,
        };
        write_summary(dir.path(), &summary).expect("write summary");

        let path = dir.path().join(SUMMARY_FILE);
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(value["simulated_steps"], 12);
        assert_eq!(value["config"]["seed"], 5);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
