pub mod backend;
pub mod formulation;

use self::backend::{BackendError, MilpBackend, MilpModel, MilpOptions, MilpSolution, default_backend};
use self::formulation::{AssignmentFormulation, OrderingFormulation, PolarityFormulation};
use super::heuristic::{HeuristicSolver, greedy_ordering};
use super::{DiscreteSolver, SolveContext};
use crate::engine::error::EngineError;
use crate::engine::problems::{AssignmentProblem, OrderingProblem, PolarityProblem};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{SolveOutcome, SolveStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Fraction of the time limit spent on the heuristic incumbent.
const INCUMBENT_TIME_SHARE: f64 = 0.25;

/// Solves the discrete problems to proven optimality through a MILP backend.
///
/// A heuristic incumbent is computed first and handed to the backend as a
/// warm start. The backend runs on the calling thread under the remaining
/// wall-clock budget; if it stops without a proof, the better of its
/// incumbent and the heuristic one is returned with
/// [`SolveStatus::TimeLimit`].
pub struct ExactSolver {
    backend: Arc<dyn MilpBackend>,
}

impl ExactSolver {
    /// Uses the backend compiled into this build.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SolverUnavailable`] when the crate was built
    /// without the `milp` feature.
    pub fn new() -> Result<Self, EngineError> {
        default_backend()
            .map(|backend| Self { backend })
            .ok_or_else(|| {
                EngineError::SolverUnavailable(
                    "no MILP backend compiled in (enable the `milp` feature)".to_string(),
                )
            })
    }

    pub fn with_backend(backend: Arc<dyn MilpBackend>) -> Self {
        Self { backend }
    }

    /// Runs the backend; `None` means it was interrupted before finding any
    /// feasible point, or no time was left to start it.
    fn run(
        &self,
        model: &MilpModel,
        options: MilpOptions,
    ) -> Result<Option<MilpSolution>, EngineError> {
        if options.time_limit.is_some_and(|left| left.is_zero()) {
            return Ok(None);
        }
        debug!(
            backend = self.backend.name(),
            variables = model.variables.len(),
            integers = model.num_integer_variables(),
            constraints = model.constraints.len(),
            time_limit = ?options.time_limit,
            "Delegating MILP model."
        );
        let solution = match self.backend.solve(model, &options) {
            Ok(solution) => solution,
            Err(BackendError::Interrupted) => return Ok(None),
            Err(e) => return Err(backend_failure(e)),
        };
        if solution.values.len() != model.variables.len() {
            return Err(backend_failure(BackendError::MalformedSolution {
                expected: model.variables.len(),
                actual: solution.values.len(),
            }));
        }
        Ok(Some(solution))
    }
}

/// Runs `solve` with the heuristic's share of the budget and no progress
/// output.
fn heuristic_incumbent<T>(
    context: &SolveContext,
    solve: impl FnOnce(&SolveContext) -> Result<SolveOutcome<T>, EngineError>,
) -> Result<SolveOutcome<T>, EngineError> {
    let silent = ProgressReporter::new();
    let budgeted = SolveContext {
        time_limit: context
            .time_limit
            .map(|limit| limit.mul_f64(INCUMBENT_TIME_SHARE)),
        seed: context.seed,
        annealing: context.annealing,
        segment_len: context.segment_len,
        reporter: &silent,
    };
    let incumbent = solve(&budgeted)?;
    debug!(objective = incumbent.objective, "Heuristic incumbent ready.");
    Ok(incumbent)
}

fn time_left(start: Instant, limit: Option<Duration>) -> Option<Duration> {
    limit.map(|limit| limit.saturating_sub(start.elapsed()))
}

/// Final outcome from the backend's answer and the heuristic incumbent.
fn settle<T>(
    solved: Option<(T, f64, bool)>,
    incumbent: SolveOutcome<T>,
    start: Instant,
) -> SolveOutcome<T> {
    let elapsed = start.elapsed();
    match solved {
        Some((solution, objective, true)) => SolveOutcome {
            solution,
            objective,
            status: SolveStatus::Optimal,
            moves: incumbent.moves,
            elapsed,
        },
        Some((solution, objective, false)) => SolveOutcome {
            solution,
            objective,
            status: SolveStatus::TimeLimit,
            moves: incumbent.moves,
            elapsed,
        }
        .better_of(SolveOutcome {
            status: SolveStatus::TimeLimit,
            elapsed,
            ..incumbent
        }),
        None => SolveOutcome {
            status: SolveStatus::TimeLimit,
            elapsed,
            ..incumbent
        },
    }
}

fn backend_failure(error: BackendError) -> EngineError {
    EngineError::InternalInconsistency {
        phase: "exact_solver",
        reason: error.to_string(),
    }
}

fn undecodable(problem: &str) -> EngineError {
    EngineError::InternalInconsistency {
        phase: "exact_solver",
        reason: format!("backend solution does not decode to a valid {problem} configuration"),
    }
}

impl DiscreteSolver for ExactSolver {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn proves_optimality(&self) -> bool {
        true
    }

    #[instrument(skip_all, name = "exact_polarity", fields(n = problem.len()))]
    fn solve_polarity(
        &self,
        problem: &PolarityProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<bool>>, EngineError> {
        let start = Instant::now();
        context.reporter.report(Progress::TaskStart { total_steps: 1 });
        let incumbent = heuristic_incumbent(context, |ctx| HeuristicSolver.solve_polarity(problem, ctx))?;
        let formulation = PolarityFormulation::build(problem);
        let options = MilpOptions {
            time_limit: time_left(start, context.time_limit),
            warm_start: Some(formulation.encode(&incumbent.solution)),
        };

        let solved = self.run(&formulation.model, options)?.map(|solution| {
            let flips = formulation.decode(&solution.values);
            let objective = problem.objective(&flips);
            (flips, objective, solution.proven_optimal)
        });
        if solved.as_ref().is_none_or(|(_, _, proven)| !proven) {
            warn!("Exact polarity solve hit the time limit; returning the best incumbent.");
        }
        let outcome = settle(solved, incumbent, start);
        context.reporter.report(Progress::TaskIncrement);
        context.reporter.report(Progress::TaskFinish);
        Ok(outcome)
    }

    #[instrument(skip_all, name = "exact_ordering", fields(n = problem.len()))]
    fn solve_ordering(
        &self,
        problem: &OrderingProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<usize>>, EngineError> {
        let start = Instant::now();
        let n = problem.len();
        let segment_len = context.segment_len.unwrap_or(n).clamp(1, n.max(1));
        let mut status = if segment_len >= n {
            SolveStatus::Optimal
        } else {
            SolveStatus::BestEffort
        };
        let incumbent = heuristic_incumbent(context, |ctx| HeuristicSolver.solve_ordering(problem, ctx))?;

        context.reporter.report(Progress::TaskStart {
            total_steps: n.div_ceil(segment_len) as u64,
        });
        let mut ordering: Vec<usize> = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        while ordering.len() < n {
            let remaining: Vec<usize> = (0..n).filter(|&i| !placed[i]).collect();
            if remaining.len() == 1 {
                ordering.push(remaining[0]);
                placed[remaining[0]] = true;
                context.reporter.report(Progress::TaskIncrement);
                continue;
            }

            let formulation = OrderingFormulation::build(problem, &ordering, &remaining, segment_len);
            // Warm start from the best known completion of the fixed prefix.
            let completion = if ordering.is_empty() {
                incumbent.solution.clone()
            } else {
                greedy_ordering(problem, &ordering)
            };
            let m = ordering.len();
            let len = segment_len.min(remaining.len());
            let options = MilpOptions {
                time_limit: time_left(start, context.time_limit),
                warm_start: formulation.encode(&completion[m..m + len]),
            };

            let Some(solution) = self.run(&formulation.model, options)? else {
                warn!(
                    fixed = ordering.len(),
                    "Exact ordering solve hit the time limit; completing greedily."
                );
                ordering = greedy_ordering(problem, &ordering);
                status = SolveStatus::TimeLimit;
                break;
            };
            if !solution.proven_optimal {
                status = SolveStatus::TimeLimit;
            }
            let segment = formulation
                .decode(&solution.values)
                .ok_or_else(|| undecodable("ordering"))?;
            for &i in &segment {
                if placed[i] {
                    return Err(undecodable("ordering"));
                }
                placed[i] = true;
            }
            debug!(fixed = ordering.len() + segment.len(), "Fixed ordering segment.");
            ordering.extend(segment);
            context.reporter.report(Progress::TaskIncrement);
        }
        context.reporter.report(Progress::TaskFinish);

        let elapsed = start.elapsed();
        let outcome = SolveOutcome {
            objective: problem.objective(&ordering),
            solution: ordering,
            status,
            moves: incumbent.moves,
            elapsed,
        };
        if status == SolveStatus::Optimal {
            return Ok(outcome);
        }
        Ok(outcome.better_of(SolveOutcome {
            status,
            elapsed,
            ..incumbent
        }))
    }

    #[instrument(skip_all, name = "exact_assignment", fields(n = problem.len()))]
    fn solve_assignment(
        &self,
        problem: &AssignmentProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<Option<usize>>>, EngineError> {
        let start = Instant::now();
        context.reporter.report(Progress::TaskStart { total_steps: 1 });
        let incumbent =
            heuristic_incumbent(context, |ctx| HeuristicSolver.solve_assignment(problem, ctx))?;
        let formulation = AssignmentFormulation::build(problem);
        let options = MilpOptions {
            time_limit: time_left(start, context.time_limit),
            warm_start: Some(formulation.encode(&incumbent.solution)),
        };

        let solved = match self.run(&formulation.model, options)? {
            Some(solution) => {
                let groups = formulation.decode(&solution.values);
                if !problem.is_feasible(&groups) {
                    return Err(undecodable("assignment"));
                }
                let objective = problem.objective(&groups);
                Some((groups, objective, solution.proven_optimal))
            }
            None => None,
        };
        if solved.as_ref().is_none_or(|(_, _, proven)| !proven) {
            warn!("Exact assignment solve hit the time limit; returning the best incumbent.");
        }
        let outcome = settle(solved, incumbent, start);
        context.reporter.report(Progress::TaskIncrement);
        context.reporter.report(Progress::TaskFinish);
        Ok(outcome)
    }
}
