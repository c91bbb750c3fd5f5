use qspace::core::energy::model::apply_signs;
use qspace::core::models::direction::NORM_TOLERANCE;
use qspace::core::utils::geometry::random_sphere;
use qspace::{
    Configuration, EnergyModel, PointSet, Scheme, SolverMethod, SymmetryMode, generate,
    optimize_ordering, optimize_polarity, subsample,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

fn polar_energy(scheme: &Scheme) -> f64 {
    EnergyModel::default()
        .scheme_energy(scheme, SymmetryMode::Polar)
        .total()
}

fn random_scheme(n: usize, seed: u64) -> Scheme {
    Scheme::single_shell(None, random_sphere(n, &mut StdRng::seed_from_u64(seed))).unwrap()
}

fn assert_unit(scheme: &Scheme) {
    for d in scheme.directions() {
        assert!(
            (d.as_vector().norm() - 1.0).abs() < NORM_TOLERANCE,
            "direction {d:?} is off the sphere"
        );
    }
}

fn relative_gap(a: f64, b: f64) -> f64 {
    (a - b).abs() / a.abs().max(b.abs())
}

#[test]
fn flipping_every_sign_leaves_polar_energy_unchanged() {
    let scheme = random_scheme(9, 21);
    let points = PointSet::from_scheme(&scheme);
    let model = EnergyModel::default();
    let flips: Vec<bool> = (0..9).map(|i| i % 3 == 0).collect();
    let complement: Vec<bool> = flips.iter().map(|f| !f).collect();
    let a = model
        .objective(&points, &Configuration::Signs(flips), SymmetryMode::Polar)
        .unwrap();
    let b = model
        .objective(&points, &Configuration::Signs(complement), SymmetryMode::Polar)
        .unwrap();
    assert!(relative_gap(a, b) < 1e-12);

    let result = optimize_polarity(&scheme, SolverMethod::Heuristic, None).unwrap();
    let all_flipped: Vec<bool> = vec![true; 9];
    let negated = apply_signs(&result.scheme.directions(), &all_flipped);
    let negated = Scheme::single_shell(None, negated).unwrap();
    assert!(relative_gap(polar_energy(&result.scheme), polar_energy(&negated)) < 1e-12);
}

#[test]
fn polarity_of_six_generated_directions_beats_every_single_flip() {
    let generated = generate(&[6], None, Some(8)).unwrap().scheme;
    let result = optimize_polarity(&generated, SolverMethod::Auto, None).unwrap();
    assert_eq!(result.scheme.num_directions(), 6);
    assert_unit(&result.scheme);

    let directions = generated.directions();
    let mut best_baseline = polar_energy(&generated);
    for i in 0..6 {
        let flips: Vec<bool> = (0..6).map(|k| k == i).collect();
        let flipped = Scheme::single_shell(None, apply_signs(&directions, &flips)).unwrap();
        best_baseline = best_baseline.min(polar_energy(&flipped));
    }
    assert!(polar_energy(&result.scheme) <= best_baseline * (1.0 + 1e-9));
}

#[test]
fn ordering_is_never_worse_than_identity() {
    for (n, seed) in [(3, 1), (7, 2), (12, 3)] {
        let scheme = random_scheme(n, seed);
        let result = optimize_ordering(&scheme, SolverMethod::Heuristic, None).unwrap();
        assert!(result.objective <= result.identity_objective);
        assert_eq!(result.scheme.num_directions(), n);
    }
}

#[test]
fn multi_shell_ordering_interleaves_without_changing_shells() {
    let generated = generate(&[5, 5], Some(&[1000.0, 2000.0]), Some(4))
        .unwrap()
        .scheme;
    let result = optimize_ordering(&generated, SolverMethod::Heuristic, None).unwrap();
    assert_eq!(result.scheme.shell_counts(), vec![5, 5]);
    assert_eq!(result.scheme.strengths(), generated.strengths());
    for (s, shell) in result.scheme.shells().iter().enumerate() {
        for d in shell.directions() {
            assert!(generated.shell(s).unwrap().directions().contains(d));
        }
    }
}

#[test]
fn full_size_subsample_keeps_the_energy() {
    let generated = generate(&[5, 7], Some(&[1000.0, 2000.0]), Some(9))
        .unwrap()
        .scheme;
    let model = EnergyModel::default();
    let before = model
        .scheme_energy(&generated, SymmetryMode::Antipodal)
        .total();
    let result = subsample(&generated, &[5, 7], SolverMethod::Heuristic, None).unwrap();
    let after = model
        .scheme_energy(&result.scheme, SymmetryMode::Antipodal)
        .total();
    assert!(relative_gap(before, after) < 1e-10);
    assert!(relative_gap(before, result.energy) < 1e-10);
}

#[test]
fn subsample_three_of_six_keeps_original_members() {
    let generated = generate(&[6], None, Some(12)).unwrap().scheme;
    let result = subsample(&generated, &[3], SolverMethod::Auto, None).unwrap();
    assert_eq!(result.scheme.num_directions(), 3);
    let original = generated.directions();
    for d in result.scheme.directions() {
        assert!(original.contains(&d));
    }
}

#[test]
fn auto_polarity_on_forty_directions_finishes_promptly() {
    let scheme = random_scheme(40, 41);
    let start = Instant::now();
    let result = optimize_polarity(&scheme, SolverMethod::Auto, None).unwrap();
    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(result.solver, "heuristic");
    assert!(result.energy <= result.initial_energy);
    assert_unit(&result.scheme);
}

#[cfg(feature = "milp")]
mod exact_against_heuristic {
    use super::*;
    use qspace::SolveStatus;

    #[test]
    fn polarity_agrees_within_one_percent_on_six_points() {
        let scheme = random_scheme(6, 31);
        let exact = optimize_polarity(&scheme, SolverMethod::Exact, None).unwrap();
        let heuristic = optimize_polarity(&scheme, SolverMethod::Heuristic, None).unwrap();
        assert_eq!(exact.status, SolveStatus::Optimal);
        assert!(relative_gap(exact.energy, heuristic.energy) <= 0.01);
    }

    #[test]
    fn subsample_agrees_within_one_percent_on_six_points() {
        let scheme = random_scheme(6, 32);
        let exact = subsample(&scheme, &[3], SolverMethod::Exact, None).unwrap();
        let heuristic = subsample(&scheme, &[3], SolverMethod::Heuristic, None).unwrap();
        assert_eq!(exact.status, SolveStatus::Optimal);
        assert!(relative_gap(exact.energy, heuristic.energy) <= 0.01);
    }

    #[test]
    fn exact_ordering_is_no_worse_than_heuristic_on_five_points() {
        let scheme = random_scheme(5, 33);
        let exact = optimize_ordering(&scheme, SolverMethod::Exact, None).unwrap();
        let heuristic = optimize_ordering(&scheme, SolverMethod::Heuristic, None).unwrap();
        assert!(exact.objective <= heuristic.objective * (1.0 + 1e-6));
    }

    #[test]
    fn auto_reports_the_size_limit_on_forty_directions() {
        let scheme = random_scheme(40, 42);
        let result = optimize_polarity(&scheme, SolverMethod::Auto, None).unwrap();
        assert!(matches!(
            result.notices.as_slice(),
            [qspace::Notice::ExactSizeExceeded { size: 40, .. }]
        ));
    }

    #[test]
    fn exact_polarity_on_forty_directions_returns_within_its_time_limit() {
        let scheme = random_scheme(40, 43);
        let start = Instant::now();
        let result =
            optimize_polarity(&scheme, SolverMethod::Exact, Some(Duration::from_millis(500)))
                .unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(result.solver, "exact");
        assert!(result.energy <= result.initial_energy);
        assert_unit(&result.scheme);
    }
}

#[cfg(not(feature = "milp"))]
#[test]
fn auto_falls_back_to_the_heuristic_without_a_backend() {
    let scheme = random_scheme(6, 40);
    let result = optimize_polarity(&scheme, SolverMethod::Auto, None).unwrap();
    assert_eq!(result.solver, "heuristic");
    assert!(matches!(
        result.notices.as_slice(),
        [qspace::Notice::SolverFallback { .. }]
    ));
}
