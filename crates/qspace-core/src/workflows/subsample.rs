use super::{solve_context, validate_strengths};
use crate::core::energy::model::PointSet;
use crate::core::models::direction::Direction;
use crate::core::models::scheme::Scheme;
use crate::engine::config::{DiscreteConfig, DiscreteConfigBuilder, SolverMethod};
use crate::engine::error::EngineError;
use crate::engine::problems::AssignmentProblem;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solvers::{Notice, select_solver};
use crate::engine::state::{SolveOutcome, SolveStatus};
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct SubsampleResult {
    pub scheme: Scheme,
    /// Flat input indices behind each output shell, in input order.
    pub selected: Vec<Vec<usize>>,
    /// Weighted energy of the returned scheme.
    pub energy: f64,
    pub status: SolveStatus,
    pub solver: &'static str,
    pub notices: Vec<Notice>,
}

/// Keeps `subset_sizes[s]` directions of each shell `s`, chosen so that the
/// kept scheme is as uniform as possible.
pub fn subsample(
    scheme: &Scheme,
    subset_sizes: &[usize],
    method: SolverMethod,
    time_limit: Option<Duration>,
) -> Result<SubsampleResult, EngineError> {
    let config = DiscreteConfigBuilder::new()
        .method(method)
        .time_limit(time_limit)
        .build()?;
    run(scheme, subset_sizes, &config, &ProgressReporter::new())
}

/// Splits one shell into disjoint groups that become the shells of the
/// output.
///
/// Each group is near-uniform on its own and the union of all groups stays
/// uniform. Points not assigned to any group are dropped.
pub fn partition(
    scheme: &Scheme,
    shell: usize,
    group_sizes: &[usize],
    group_strengths: Option<&[f64]>,
) -> Result<SubsampleResult, EngineError> {
    run_partition(
        scheme,
        shell,
        group_sizes,
        group_strengths,
        &DiscreteConfig::default(),
        &ProgressReporter::new(),
    )
}

#[instrument(skip_all, name = "subsample_workflow")]
pub fn run(
    scheme: &Scheme,
    subset_sizes: &[usize],
    config: &DiscreteConfig,
    reporter: &ProgressReporter,
) -> Result<SubsampleResult, EngineError> {
    if subset_sizes.len() != scheme.num_shells() {
        return Err(EngineError::InvalidShellSpec(format!(
            "{} subset size(s) given for {} shell(s)",
            subset_sizes.len(),
            scheme.num_shells()
        )));
    }
    for (s, (&size, available)) in subset_sizes.iter().zip(scheme.shell_counts()).enumerate() {
        if size == 0 || size > available {
            return Err(EngineError::InvalidShellSpec(format!(
                "shell {s} cannot keep {size} of its {available} direction(s)"
            )));
        }
    }

    let model = config.energy.model();
    let points = PointSet::from_scheme(scheme);
    let problem = AssignmentProblem::subsample(&model, &points, config.symmetry, subset_sizes);
    let (solver, notices) = select_solver(config.method, problem.size(), config.exact_size_limit)?;
    info!(
        solver = solver.name(),
        directions = points.len(),
        kept = subset_sizes.iter().sum::<usize>(),
        "Subsampling scheme."
    );

    reporter.report(Progress::PhaseStart { name: "Subsampling" });
    let context = solve_context(config, solver.as_ref(), reporter);
    let outcome = solver.solve_assignment(&problem, &context)?;
    reporter.report(Progress::PhaseFinish);

    assemble(
        points.directions(),
        0,
        &problem,
        outcome,
        &scheme.strengths(),
        solver.name(),
        notices,
    )
}

#[instrument(skip_all, name = "partition_workflow")]
pub fn run_partition(
    scheme: &Scheme,
    shell: usize,
    group_sizes: &[usize],
    group_strengths: Option<&[f64]>,
    config: &DiscreteConfig,
    reporter: &ProgressReporter,
) -> Result<SubsampleResult, EngineError> {
    let source = scheme.shell(shell).ok_or_else(|| {
        EngineError::InvalidShellSpec(format!(
            "shell {shell} does not exist in a scheme of {} shell(s)",
            scheme.num_shells()
        ))
    })?;
    if group_sizes.is_empty() || group_sizes.contains(&0) {
        return Err(EngineError::InvalidShellSpec(
            "every partition group needs at least one direction".to_string(),
        ));
    }
    let requested: usize = group_sizes.iter().sum();
    if requested > source.len() {
        return Err(EngineError::InvalidShellSpec(format!(
            "groups need {requested} directions but shell {shell} has {}",
            source.len()
        )));
    }
    let strengths = validate_strengths(group_strengths, group_sizes.len())?;

    let model = config.energy.model();
    let problem =
        AssignmentProblem::partition(&model, source.directions(), config.symmetry, group_sizes);
    let (solver, notices) = select_solver(config.method, problem.size(), config.exact_size_limit)?;
    info!(
        solver = solver.name(),
        shell,
        groups = group_sizes.len(),
        "Partitioning shell."
    );

    reporter.report(Progress::PhaseStart { name: "Partitioning" });
    let context = solve_context(config, solver.as_ref(), reporter);
    let outcome = solver.solve_assignment(&problem, &context)?;
    reporter.report(Progress::PhaseFinish);

    let offset = scheme.offsets()[shell];
    assemble(
        source.directions(),
        offset,
        &problem,
        outcome,
        &strengths,
        solver.name(),
        notices,
    )
}

/// Builds the output scheme from a group label per direction.
fn assemble(
    directions: &[Direction],
    offset: usize,
    problem: &AssignmentProblem,
    outcome: SolveOutcome<Vec<Option<usize>>>,
    strengths: &[Option<f64>],
    solver: &'static str,
    notices: Vec<Notice>,
) -> Result<SubsampleResult, EngineError> {
    if !problem.is_feasible(&outcome.solution) {
        return Err(EngineError::InternalInconsistency {
            phase: "subsample",
            reason: "solver returned an assignment that misses the group sizes".to_string(),
        });
    }

    let mut groups: Vec<Vec<Direction>> = vec![Vec::new(); problem.num_groups()];
    let mut selected: Vec<Vec<usize>> = vec![Vec::new(); problem.num_groups()];
    for (i, group) in outcome.solution.iter().enumerate() {
        if let Some(g) = *group {
            groups[g].push(directions[i]);
            selected[g].push(offset + i);
        }
    }

    let result = SubsampleResult {
        scheme: Scheme::from_groups(strengths, groups)?,
        selected,
        energy: outcome.objective,
        status: outcome.status,
        solver,
        notices,
    };
    info!(
        energy = result.energy,
        status = %result.status,
        "Selection complete."
    );
    Ok(result)
}
