//! Budgeted, seeded application of maze operators.

use log::debug;
use rand_chacha::ChaCha8Rng;

use crate::maze::Maze;
use crate::operators::MazeOperator;
use crate::seed::random_usize;

/// Hard stop for operators that keep reporting tiny costs.
pub const MAX_MUTATION_ROUNDS: usize = 10_000;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutationOutcome {
    /// Total estimated cost charged against the budget.
    pub cost: f64,
    /// Labels of operators that changed the maze, in application order.
    pub applied: Vec<&'static str>,
    /// Operators that were charged but left the maze as it was.
    pub unchanged: usize,
}

/// Repeatedly applies operators until none fits the remaining budget.
///
/// Each round every operator prices its next change; one of the affordable operators is
/// picked uniformly with `rng` and applied. The estimate is charged even when the
/// operator ends up changing nothing, so the loop always makes progress toward the
/// budget. Zero-cost and non-finite estimates are never affordable.
pub fn change_maze(
    maze: &mut Maze,
    operators: &mut [Box<dyn MazeOperator>],
    budget: f64,
    rng: &mut ChaCha8Rng,
) -> MutationOutcome {
    let mut outcome = MutationOutcome::default();
    if budget.is_nan() || budget <= 0.0 {
        return outcome;
    }

    for _ in 0..MAX_MUTATION_ROUNDS {
        let remaining = budget - outcome.cost;
        let mut affordable = Vec::new();
        for (idx, operator) in operators.iter_mut().enumerate() {
            let cost = operator.estimate_cost(maze, remaining);
            if cost.is_finite() && cost > 0.0 && outcome.cost + cost <= budget {
                affordable.push((idx, cost));
            } else {
                debug!("operator {} rejected: cost {cost} with {remaining} left", operator.label());
            }
        }
        if affordable.is_empty() {
            break;
        }

        let (idx, cost) = affordable[random_usize(rng, 0, affordable.len() - 1)];
        let operator = &mut operators[idx];
        outcome.cost += cost;
        if operator.change_maze(maze) {
            outcome.applied.push(operator.label());
        } else {
            outcome.unchanged += 1;
        }
    }
    outcome
}
