//! Structural analysis over a maze: shortest paths, parallel routes, and the
//! budgeted mutation driver that applies operators.

pub mod pathing;

mod mutation;
mod parallel;

pub use mutation::{MAX_MUTATION_ROUNDS, MutationOutcome, change_maze};
pub use parallel::{ParallelRoutes, parallel_routes};
pub use pathing::{reachable_from, shortest_path};
