use super::{kept_input_status, solve_context};
use crate::core::energy::model::PointSet;
use crate::core::models::direction::Direction;
use crate::core::models::scheme::Scheme;
use crate::core::models::table::SchemeTable;
use crate::engine::config::{DiscreteConfig, DiscreteConfigBuilder, SolverMethod};
use crate::engine::error::EngineError;
use crate::engine::problems::OrderingProblem;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solvers::{Notice, select_solver};
use crate::engine::state::SolveStatus;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct OrderingResult {
    /// Input directions with each shell listed in acquisition order.
    pub scheme: Scheme,
    /// Acquisition position to flat index of the input scheme, across all
    /// shells.
    pub ordering: Vec<usize>,
    /// Cumulative prefix energy of `ordering`.
    pub objective: f64,
    /// Cumulative prefix energy of the input order.
    pub identity_objective: f64,
    /// The solver's status, or [`SolveStatus::BestEffort`] when the input
    /// order was kept over an unproven solver result.
    pub status: SolveStatus,
    pub solver: &'static str,
    pub notices: Vec<Notice>,
}

impl OrderingResult {
    /// Numeric table of `input` with one row per direction in acquisition
    /// order, interleaving shells as `ordering` does.
    ///
    /// `scheme` keeps only the order within each shell; this table is the
    /// form to write when the order across shells matters.
    pub fn acquisition_table(&self, input: &Scheme) -> Result<SchemeTable, EngineError> {
        let table = input.to_table();
        let directions = self
            .ordering
            .iter()
            .map(|&flat| {
                table.directions.get(flat).copied().ok_or_else(|| {
                    EngineError::InternalInconsistency {
                        phase: "ordering",
                        reason: format!("flat index {flat} is out of range"),
                    }
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(SchemeTable {
            directions,
            strengths: table.strengths,
        })
    }
}

/// Orders all directions so that every prefix of the acquisition is as
/// uniform as possible.
///
/// The input order wins ties: it is kept unless the solver finds something
/// strictly better.
pub fn optimize_ordering(
    scheme: &Scheme,
    method: SolverMethod,
    time_limit: Option<Duration>,
) -> Result<OrderingResult, EngineError> {
    let config = DiscreteConfigBuilder::new()
        .method(method)
        .time_limit(time_limit)
        .build()?;
    run(scheme, &config, &ProgressReporter::new())
}

#[instrument(skip_all, name = "ordering_workflow")]
pub fn run(
    scheme: &Scheme,
    config: &DiscreteConfig,
    reporter: &ProgressReporter,
) -> Result<OrderingResult, EngineError> {
    let model = config.energy.model();
    let points = PointSet::from_scheme(scheme);
    let problem = OrderingProblem::new(&model, &points, config.symmetry);
    let (solver, notices) = select_solver(
        config.method,
        problem.size(config.segment_len),
        config.exact_size_limit,
    )?;
    info!(
        solver = solver.name(),
        directions = points.len(),
        segment_len = ?config.segment_len,
        "Optimizing acquisition order."
    );

    reporter.report(Progress::PhaseStart { name: "Ordering" });
    let context = solve_context(config, solver.as_ref(), reporter);
    let outcome = solver.solve_ordering(&problem, &context)?;
    reporter.report(Progress::PhaseFinish);

    let identity: Vec<usize> = (0..points.len()).collect();
    let identity_objective = problem.objective(&identity);
    let (ordering, objective, status) = if identity_objective <= outcome.objective {
        debug!("Input order is not worse than the solver result; keeping it.");
        (identity, identity_objective, kept_input_status(outcome.status))
    } else {
        (outcome.solution, outcome.objective, outcome.status)
    };

    let result = OrderingResult {
        scheme: reorder_shells(scheme, &ordering)?,
        ordering,
        objective,
        identity_objective,
        status,
        solver: solver.name(),
        notices,
    };
    info!(
        objective = result.objective,
        identity_objective = result.identity_objective,
        status = %result.status,
        "Ordering complete."
    );
    Ok(result)
}

/// Lists each shell's directions in the order they appear in `ordering`.
fn reorder_shells(scheme: &Scheme, ordering: &[usize]) -> Result<Scheme, EngineError> {
    let mut groups: Vec<Vec<Direction>> = vec![Vec::new(); scheme.num_shells()];
    for &flat in ordering {
        let (shell, index) = scheme.locate(flat).ok_or_else(|| EngineError::InternalInconsistency {
            phase: "ordering",
            reason: format!("flat index {flat} is out of range"),
        })?;
        let direction = scheme
            .shell(shell)
            .and_then(|s| s.direction(index))
            .copied()
            .ok_or_else(|| EngineError::InternalInconsistency {
                phase: "ordering",
                reason: format!("flat index {flat} does not resolve to a direction"),
            })?;
        groups[shell].push(direction);
    }
    Ok(Scheme::from_groups(&scheme.strengths(), groups)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::model::{Configuration, EnergyModel};
    use crate::core::utils::geometry::fibonacci_sphere;

    fn clustered_first_scheme() -> Scheme {
        // Two near-duplicates at the front make the input order poor.
        let mut directions = vec![
            Direction::new(0.0, 0.0, 1.0).unwrap(),
            Direction::new(0.01, 0.0, 1.0).unwrap(),
        ];
        directions.extend(fibonacci_sphere(6, 0.7));
        Scheme::single_shell(None, directions).unwrap()
    }

    #[test]
    fn heuristic_ordering_beats_poor_input_order() {
        let scheme = clustered_first_scheme();
        let result = optimize_ordering(&scheme, SolverMethod::Heuristic, None).unwrap();
        assert!(result.objective < result.identity_objective);
        let mut sorted = result.ordering.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn objective_matches_cumulative_prefix_energy() {
        let scheme = clustered_first_scheme();
        let result = optimize_ordering(&scheme, SolverMethod::Heuristic, None).unwrap();
        let model = EnergyModel::default();
        let expected = model
            .objective(
                &PointSet::from_scheme(&scheme),
                &Configuration::Permutation(result.ordering.clone()),
                Default::default(),
            )
            .unwrap();
        assert!((expected - result.objective).abs() < 1e-9 * expected);
    }

    #[test]
    fn two_points_keep_input_order() {
        let scheme = Scheme::single_shell(None, fibonacci_sphere(2, 0.0)).unwrap();
        let result = optimize_ordering(&scheme, SolverMethod::Heuristic, None).unwrap();
        assert_eq!(result.ordering, vec![0, 1]);
        assert_eq!(result.scheme, scheme);
        assert_eq!(result.status, SolveStatus::BestEffort);
    }

    #[test]
    fn reorder_shells_keeps_shell_membership() {
        let scheme = Scheme::from_groups(
            &[Some(1000.0), Some(2000.0)],
            vec![fibonacci_sphere(2, 0.0), fibonacci_sphere(2, 0.5)],
        )
        .unwrap();
        let reordered = reorder_shells(&scheme, &[3, 0, 2, 1]).unwrap();
        let original = scheme.directions();
        assert_eq!(
            reordered.shell(0).unwrap().directions(),
            &[original[0], original[1]]
        );
        assert_eq!(
            reordered.shell(1).unwrap().directions(),
            &[original[3], original[2]]
        );
    }

    #[test]
    fn acquisition_table_interleaves_shells_in_ordering_order() {
        let scheme = Scheme::from_groups(
            &[Some(1000.0), Some(2000.0)],
            vec![fibonacci_sphere(3, 0.0), fibonacci_sphere(3, 0.5)],
        )
        .unwrap();
        let result = optimize_ordering(&scheme, SolverMethod::Heuristic, None).unwrap();
        let table = result.acquisition_table(&scheme).unwrap();
        let input = scheme.to_table();
        let expected: Vec<_> = result.ordering.iter().map(|&i| input.directions[i]).collect();
        assert_eq!(table.directions, expected);
        assert_eq!(table.strengths, input.strengths);
        assert_eq!(Scheme::from_table(&table).unwrap(), result.scheme);
    }

    #[test]
    fn acquisition_table_rejects_out_of_range_ordering() {
        let scheme = Scheme::single_shell(None, fibonacci_sphere(2, 0.0)).unwrap();
        let mut result = optimize_ordering(&scheme, SolverMethod::Heuristic, None).unwrap();
        result.ordering = vec![0, 5];
        assert!(matches!(
            result.acquisition_table(&scheme),
            Err(EngineError::InternalInconsistency { .. })
        ));
    }
}
