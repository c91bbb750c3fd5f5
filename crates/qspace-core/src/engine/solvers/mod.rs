//! Interchangeable strategies for the discrete problems.
//!
//! [`DiscreteSolver`] is implemented by the exact MILP solver and the
//! simulated-annealing heuristic. [`select_solver`] picks one from the
//! requested [`SolverMethod`], the problem size and backend availability.

pub mod exact;
pub mod heuristic;

use super::config::{AnnealingConfig, SolverMethod};
use super::error::EngineError;
use super::problems::{AssignmentProblem, OrderingProblem, PolarityProblem};
use super::progress::ProgressReporter;
use super::state::SolveOutcome;
use std::time::Duration;
use tracing::{debug, info};

/// Per-invocation settings shared by every strategy.
pub struct SolveContext<'a> {
    pub time_limit: Option<Duration>,
    pub seed: u64,
    pub annealing: AnnealingConfig,
    /// Ordering only: positions fixed per exact round.
    pub segment_len: Option<usize>,
    pub reporter: &'a ProgressReporter<'a>,
}

pub trait DiscreteSolver {
    fn name(&self) -> &'static str;

    /// Whether a finished run carries an optimality proof. Such solvers are
    /// never started without a time limit under [`SolverMethod::Auto`].
    fn proves_optimality(&self) -> bool {
        false
    }

    fn solve_polarity(
        &self,
        problem: &PolarityProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<bool>>, EngineError>;

    fn solve_ordering(
        &self,
        problem: &OrderingProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<usize>>, EngineError>;

    fn solve_assignment(
        &self,
        problem: &AssignmentProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<Option<usize>>>, EngineError>;
}

/// Informational events raised while choosing a strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// `Auto` wanted the exact solver but no backend is compiled in.
    SolverFallback { reason: String },
    /// `Auto` skipped the exact solver because the problem is too large.
    ExactSizeExceeded { size: usize, limit: usize },
}

/// Resolves a [`SolverMethod`] to a concrete strategy.
///
/// # Errors
///
/// Returns [`EngineError::SolverUnavailable`] when `Exact` is requested
/// explicitly and no backend exists.
pub fn select_solver(
    method: SolverMethod,
    size: usize,
    exact_size_limit: usize,
) -> Result<(Box<dyn DiscreteSolver>, Vec<Notice>), EngineError> {
    match method {
        SolverMethod::Heuristic => Ok((Box::new(heuristic::HeuristicSolver), Vec::new())),
        SolverMethod::Exact => {
            let solver = exact::ExactSolver::new()?;
            Ok((Box::new(solver), Vec::new()))
        }
        SolverMethod::Auto => {
            if size > exact_size_limit {
                debug!(
                    size,
                    limit = exact_size_limit,
                    "Problem exceeds the exact size limit; using the heuristic solver."
                );
                return Ok((
                    Box::new(heuristic::HeuristicSolver),
                    vec![Notice::ExactSizeExceeded {
                        size,
                        limit: exact_size_limit,
                    }],
                ));
            }
            match exact::ExactSolver::new() {
                Ok(solver) => Ok((Box::new(solver), Vec::new())),
                Err(EngineError::SolverUnavailable(reason)) => {
                    info!("Exact solver unavailable ({reason}); falling back to the heuristic solver.");
                    Ok((
                        Box::new(heuristic::HeuristicSolver),
                        vec![Notice::SolverFallback { reason }],
                    ))
                }
                Err(e) => Err(e),
            }
        }
    }
}
