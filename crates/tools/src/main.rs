use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use maze_core::{Registries, Training};
use tools::config_file::load_run_config;
use tools::report::{ReportWriter, RunSummary, write_summary};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML run configuration
    #[arg(short, long)]
    config: PathBuf,
    /// Directory that receives the report files
    #[arg(short, long, default_value = "reports")]
    out: PathBuf,
    /// Overrides the seed from the configuration
    #[arg(short, long)]
    seed: Option<u64>,
    /// Upper bound on state-machine steps before the run is cut short
    #[arg(long, default_value_t = 10_000_000)]
    max_steps: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = load_run_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut training = Training::new(config, &Registries::builtin())
        .context("Failed to set up training run")?;
    let mut writer = ReportWriter::create(&args.out)
        .with_context(|| format!("Failed to create report directory: {}", args.out.display()))?;

    let result = training.advance(args.max_steps, &mut writer).context("Training failed")?;
    let steps = writer.steps_recorded();
    writer
        .finish()
        .with_context(|| format!("Failed to write reports to {}", args.out.display()))?;

    let summary = RunSummary {
        config: training.config(),
        simulated_steps: u64::from(result.simulated_steps),
        stop_reason: format!("{:?}", result.stop_reason),
        levels: training.level_outcomes(),
        final_qtable_states: training.agent().qtable().len(),
    };
    write_summary(&args.out, &summary).context("Failed to write summary")?;

    info!(
        "run stopped ({:?}) after {} transitions and {steps} actions; reports in {}",
        result.stop_reason,
        result.simulated_steps,
        args.out.display()
    );
    Ok(())
}
