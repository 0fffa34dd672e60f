use anyhow::{Result, bail};
use clap::Parser;
use env_logger::Env;
use maze_core::analysis::change_maze;
use maze_core::generator::MazeGenerator;
use maze_core::registry::kinds;
use maze_core::seed::{mix_seed_stream, stream_rng, streams};
use maze_core::{
    ComplexityWeights, ComponentSpec, Maze, Registries, RewardScheme, calculate_complexity,
};
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Number of generated mazes to mutate
    #[arg(short, long, default_value_t = 500)]
    iterations: u32,
    #[arg(short, long, default_value_t = 30.0)]
    budget: f64,
}

fn operator_specs(rng: &mut ChaCha8Rng) -> Vec<ComponentSpec> {
    let increment = if rng.next_u64() % 2 == 0 { 1.0 } else { -1.0 };
    vec![
        ComponentSpec::new(kinds::RESIZE).with("increment", increment).with("cost_per_cell", 0.2),
        ComponentSpec::new(kinds::NEW_PATH).with("max_length", (rng.next_u64() % 8 + 1) as f64),
        ComponentSpec::new(kinds::DEAD_END)
            .with("max_branches", (rng.next_u64() % 3 + 1) as f64)
            .with("max_length", (rng.next_u64() % 5 + 1) as f64),
    ]
}

fn mutate(seed: u64, maze: &mut Maze, specs: &[ComponentSpec], budget: f64) -> Result<f64> {
    let registries = Registries::builtin();
    let mut operators = specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let stream = streams::OPERATOR_BASE + idx as u64;
            registries.operators.build(spec, mix_seed_stream(seed, stream))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut rng = stream_rng(seed, streams::MUTATION);
    Ok(change_maze(maze, &mut operators, budget, &mut rng).cost)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    println!(
        "Starting mutation fuzz on seed {} for {} mazes (budget {})...",
        args.seed, args.iterations, args.budget
    );
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    for iteration in 0..args.iterations {
        let seed = rng.next_u64();
        let width = (rng.next_u64() % 12 + 3) as usize;
        let height = (rng.next_u64() % 12 + 3) as usize;
        let specs = operator_specs(&mut rng);
        let generator = MazeGenerator::new(width, height, RewardScheme::default());

        let mut maze = generator.generate(seed)?;
        let cost = mutate(seed, &mut maze, &specs, args.budget)?;
        if cost > args.budget {
            bail!("iteration {iteration} (seed {seed}): cost {cost} exceeds budget {}", args.budget);
        }
        if maze.shortest_path().is_err() {
            bail!("iteration {iteration} (seed {seed}): start and end disconnected\n{maze}");
        }
        calculate_complexity(&maze, &ComplexityWeights::default())?;

        let mut replay = generator.generate(seed)?;
        mutate(seed, &mut replay, &specs, args.budget)?;
        if replay.structure_hash() != maze.structure_hash() {
            bail!("iteration {iteration} (seed {seed}): mutation is not reproducible");
        }
    }

    println!("Mutation fuzzing completed successfully.");
    Ok(())
}
