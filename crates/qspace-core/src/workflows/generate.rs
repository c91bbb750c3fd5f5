use super::validate_strengths;
use crate::core::energy::term::EnergyTerm;
use crate::core::models::direction::Direction;
use crate::core::models::scheme::Scheme;
use crate::core::utils::geometry::{GOLDEN_ANGLE, fibonacci_sphere, random_sphere};
use crate::engine::config::{GenerationConfig, GenerationConfigBuilder};
use crate::engine::continuous::{ConvergenceStatus, SphereDescent};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub scheme: Scheme,
    pub energy: EnergyTerm,
    pub iterations: usize,
    /// `NonConvergence` is a warning: the best configuration reached is
    /// still returned.
    pub status: ConvergenceStatus,
}

/// Generates uniform directions with default tunables.
///
/// A `seed` starts the descent from seeded random points; without one the
/// start is a deterministic Fibonacci lattice per shell. Either way the
/// output is reproducible.
pub fn generate(
    shell_counts: &[usize],
    shell_strengths: Option<&[f64]>,
    seed: Option<u64>,
) -> Result<GenerationResult, EngineError> {
    let config = GenerationConfigBuilder::new()
        .shell_counts(shell_counts.to_vec())
        .shell_strengths(shell_strengths.map(<[f64]>::to_vec))
        .seed(seed)
        .build()?;
    run(&config, &ProgressReporter::new())
}

#[instrument(skip_all, name = "generation_workflow")]
pub fn run(
    config: &GenerationConfig,
    reporter: &ProgressReporter,
) -> Result<GenerationResult, EngineError> {
    let strengths = validate_shell_spec(&config.shell_counts, config.shell_strengths.as_deref())?;
    info!(
        shells = config.shell_counts.len(),
        directions = config.shell_counts.iter().sum::<usize>(),
        seeded = config.seed.is_some(),
        "Generating directions."
    );

    reporter.report(Progress::PhaseStart {
        name: "Initialization",
    });
    let groups = initial_groups(&config.shell_counts, config.seed);
    reporter.report(Progress::PhaseFinish);

    descend(groups, &strengths, config, reporter)
}

/// Continues the descent from the directions of `initial`.
///
/// The shell layout and strengths come from `initial`; the counts, strengths
/// and seed in `config` are ignored.
#[instrument(skip_all, name = "refine_workflow")]
pub fn refine(
    initial: &Scheme,
    config: &GenerationConfig,
    reporter: &ProgressReporter,
) -> Result<GenerationResult, EngineError> {
    info!(
        shells = initial.num_shells(),
        directions = initial.num_directions(),
        "Refining scheme."
    );
    let groups = initial
        .shells()
        .iter()
        .map(|shell| shell.directions().to_vec())
        .collect();
    descend(groups, &initial.strengths(), config, reporter)
}

fn validate_shell_spec(
    counts: &[usize],
    strengths: Option<&[f64]>,
) -> Result<Vec<Option<f64>>, EngineError> {
    if counts.is_empty() {
        return Err(EngineError::InvalidShellSpec(
            "at least one shell count is required".to_string(),
        ));
    }
    if let Some(s) = counts.iter().position(|&count| count == 0) {
        return Err(EngineError::InvalidShellSpec(format!(
            "shell {s} has a direction count of zero"
        )));
    }
    validate_strengths(strengths, counts.len())
}

/// Starting points per shell.
///
/// Lattice shells are rotated against each other so equal-count shells do
/// not start on top of one another.
fn initial_groups(counts: &[usize], seed: Option<u64>) -> Vec<Vec<Direction>> {
    match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            counts
                .iter()
                .map(|&count| random_sphere(count, &mut rng))
                .collect()
        }
        None => {
            let step = GOLDEN_ANGLE / counts.len() as f64;
            counts
                .iter()
                .enumerate()
                .map(|(s, &count)| fibonacci_sphere(count, s as f64 * step))
                .collect()
        }
    }
}

fn descend(
    groups: Vec<Vec<Direction>>,
    strengths: &[Option<f64>],
    config: &GenerationConfig,
    reporter: &ProgressReporter,
) -> Result<GenerationResult, EngineError> {
    let model = config.energy.model();
    let num_groups = groups.len();
    let counts: Vec<usize> = groups.iter().map(Vec::len).collect();
    let labels: Vec<usize> = counts
        .iter()
        .enumerate()
        .flat_map(|(s, &count)| std::iter::repeat_n(s, count))
        .collect();
    let points: Vec<Direction> = groups.into_iter().flatten().collect();

    reporter.report(Progress::PhaseStart { name: "Descent" });
    let outcome = SphereDescent::new(
        &model,
        config.symmetry,
        points,
        labels,
        num_groups,
        &config.descent,
    )
    .run(&config.descent, reporter);
    reporter.report(Progress::PhaseFinish);

    match outcome.status {
        ConvergenceStatus::Converged => info!(
            iterations = outcome.iterations,
            energy = outcome.energy.total(),
            "Descent converged."
        ),
        ConvergenceStatus::NonConvergence(reason) => warn!(
            ?reason,
            iterations = outcome.iterations,
            energy = outcome.energy.total(),
            "Descent stopped before converging; returning the best configuration."
        ),
    }

    let mut rest = outcome.directions.as_slice();
    let mut shells = Vec::with_capacity(num_groups);
    for count in counts {
        let (head, tail) = rest.split_at(count);
        shells.push(head.to_vec());
        rest = tail;
    }
    let scheme = Scheme::from_groups(strengths, shells)?;

    Ok(GenerationResult {
        scheme,
        energy: outcome.energy,
        iterations: outcome.iterations,
        status: outcome.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::model::{EnergyModel, SymmetryMode};
    use crate::core::models::direction::NORM_TOLERANCE;
    use crate::engine::config::DescentConfig;

    #[test]
    fn rejects_empty_and_zero_counts() {
        assert!(matches!(
            generate(&[], None, None),
            Err(EngineError::InvalidShellSpec(_))
        ));
        assert!(matches!(
            generate(&[4, 0], None, None),
            Err(EngineError::InvalidShellSpec(_))
        ));
    }

    #[test]
    fn rejects_mismatched_or_duplicate_strengths() {
        assert!(matches!(
            generate(&[4, 4], Some(&[1000.0]), None),
            Err(EngineError::InvalidShellSpec(_))
        ));
        assert!(matches!(
            generate(&[4, 4], Some(&[1000.0, 1000.0]), None),
            Err(EngineError::InvalidShellSpec(_))
        ));
        assert!(matches!(
            generate(&[4], Some(&[-5.0]), None),
            Err(EngineError::InvalidShellSpec(_))
        ));
    }

    #[test]
    fn same_seed_gives_same_scheme() {
        let a = generate(&[8], None, Some(42)).unwrap();
        let b = generate(&[8], None, Some(42)).unwrap();
        assert_eq!(a.scheme, b.scheme);
    }

    #[test]
    fn unseeded_generation_is_deterministic() {
        let a = generate(&[6, 6], None, None).unwrap();
        let b = generate(&[6, 6], None, None).unwrap();
        assert_eq!(a.scheme, b.scheme);
    }

    #[test]
    fn generated_directions_are_unit_and_energy_drops_from_start() {
        let result = generate(&[12], None, Some(7)).unwrap();
        for d in result.scheme.directions() {
            assert!((d.as_vector().norm() - 1.0).abs() < NORM_TOLERANCE);
        }
        let model = EnergyModel::default();
        let start = random_sphere(12, &mut StdRng::seed_from_u64(7));
        let start_energy = model
            .energy_of(&start, &[0; 12], 1, SymmetryMode::Antipodal)
            .total();
        assert!(result.energy.total() < start_energy);
    }

    #[test]
    fn refine_keeps_layout_and_does_not_raise_energy() {
        let initial = generate(&[5, 7], Some(&[1000.0, 3000.0]), Some(1)).unwrap();
        let config = GenerationConfigBuilder::new()
            .shell_counts(vec![5, 7])
            .descent(DescentConfig {
                max_iterations: 50,
                ..DescentConfig::default()
            })
            .build()
            .unwrap();
        let refined = refine(&initial.scheme, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(refined.scheme.shell_counts(), vec![5, 7]);
        assert_eq!(refined.scheme.strengths(), vec![Some(1000.0), Some(3000.0)]);
        assert!(refined.energy.total() <= initial.energy.total() + 1e-9);
    }
}
