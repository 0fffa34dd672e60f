//! Maze mutation operators. An operator plans and prices a change without touching
//! the maze; the mutation driver decides whether it gets applied.

mod dead_end;
mod new_path;
mod resize;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::maze::Maze;

pub use dead_end::{DeadEndLimits, DeadEndOperator};
pub(crate) use new_path::monotone_walk;
pub use new_path::{NewPathLimits, NewPathOperator};
pub use resize::{ResizeLimits, ResizeOperator};

pub trait MazeOperator {
    fn label(&self) -> &'static str;

    /// Plans the next change for `maze` and returns its cost. Never mutates the maze.
    /// Returns `f64::INFINITY` when no change fitting `remaining_budget` exists.
    fn estimate_cost(&mut self, maze: &Maze, remaining_budget: f64) -> f64;

    /// Applies the pending plan, planning without a budget cap if the maze changed
    /// since the last estimate. Returns whether the maze was modified.
    fn change_maze(&mut self, maze: &mut Maze) -> bool;
}

/// Seeded plan bookkeeping shared by the operators.
///
/// Planning draws from a copy of the stream; the stream only advances when the plan
/// is taken for application, so repeated estimates against the same maze agree.
#[derive(Clone, Debug)]
pub(crate) struct PlanCache<P> {
    rng: ChaCha8Rng,
    pending: Option<PendingPlan<P>>,
}

#[derive(Clone, Debug)]
struct PendingPlan<P> {
    plan: P,
    maze_hash: u64,
    rng_after: ChaCha8Rng,
}

impl<P> PlanCache<P> {
    pub(crate) fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), pending: None }
    }

    pub(crate) fn plan(
        &mut self,
        maze: &Maze,
        make: impl FnOnce(&mut ChaCha8Rng) -> Option<P>,
    ) -> Option<&P> {
        let mut rng = self.rng.clone();
        self.pending = make(&mut rng).map(|plan| PendingPlan {
            plan,
            maze_hash: maze.structure_hash(),
            rng_after: rng,
        });
        self.pending.as_ref().map(|pending| &pending.plan)
    }

    pub(crate) fn take(&mut self, maze: &Maze) -> Option<P> {
        let pending = self.pending.take()?;
        if pending.maze_hash != maze.structure_hash() {
            return None;
        }
        self.rng = pending.rng_after;
        Some(pending.plan)
    }
}
