use super::{kept_input_status, regroup, solve_context};
use crate::core::energy::model::{PointSet, apply_signs};
use crate::core::models::scheme::Scheme;
use crate::engine::config::{DiscreteConfig, DiscreteConfigBuilder, SolverMethod};
use crate::engine::error::EngineError;
use crate::engine::problems::PolarityProblem;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solvers::{Notice, select_solver};
use crate::engine::state::SolveStatus;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct PolarityResult {
    pub scheme: Scheme,
    /// Flip flag per direction in flat order.
    pub flips: Vec<bool>,
    /// Polar energy of the returned scheme.
    pub energy: f64,
    /// Polar energy of the input scheme.
    pub initial_energy: f64,
    /// The solver's status, or [`SolveStatus::BestEffort`] when the input
    /// signs were kept over an unproven solver result.
    pub status: SolveStatus,
    pub solver: &'static str,
    pub notices: Vec<Notice>,
}

/// Chooses a sign per direction so the signed set is as uniform as possible
/// on the full sphere.
///
/// Negating every direction leaves the objective unchanged, so the returned
/// flips are one of two equivalent optima.
pub fn optimize_polarity(
    scheme: &Scheme,
    method: SolverMethod,
    time_limit: Option<Duration>,
) -> Result<PolarityResult, EngineError> {
    let config = DiscreteConfigBuilder::new()
        .method(method)
        .time_limit(time_limit)
        .build()?;
    run(scheme, &config, &ProgressReporter::new())
}

#[instrument(skip_all, name = "polarity_workflow")]
pub fn run(
    scheme: &Scheme,
    config: &DiscreteConfig,
    reporter: &ProgressReporter,
) -> Result<PolarityResult, EngineError> {
    let model = config.energy.model();
    let points = PointSet::from_scheme(scheme);
    let problem = PolarityProblem::new(&model, &points);
    let (solver, notices) = select_solver(config.method, problem.size(), config.exact_size_limit)?;
    info!(
        solver = solver.name(),
        directions = points.len(),
        "Optimizing polarity."
    );

    reporter.report(Progress::PhaseStart { name: "Polarity" });
    let context = solve_context(config, solver.as_ref(), reporter);
    let outcome = solver.solve_polarity(&problem, &context)?;
    reporter.report(Progress::PhaseFinish);

    let unflipped = vec![false; points.len()];
    let initial_energy = problem.objective(&unflipped);
    let (flips, energy, status) = if outcome.objective <= initial_energy {
        (outcome.solution, outcome.objective, outcome.status)
    } else {
        debug!("Solver result is worse than the input signs; keeping the input.");
        (unflipped, initial_energy, kept_input_status(outcome.status))
    };

    let signed = apply_signs(points.directions(), &flips);
    let result = PolarityResult {
        scheme: regroup(scheme, &signed)?,
        flips,
        energy,
        initial_energy,
        status,
        solver: solver.name(),
        notices,
    };
    info!(
        flipped = result.flips.iter().filter(|&&f| f).count(),
        energy = result.energy,
        initial_energy = result.initial_energy,
        status = %result.status,
        "Polarity optimization complete."
    );
    Ok(result)
}
