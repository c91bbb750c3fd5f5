use qspace::core::models::direction::NORM_TOLERANCE;
use qspace::core::utils::statistics::covering_radius;
use qspace::{EngineError, EnergyModel, SymmetryMode, generate};

fn assert_unit(scheme: &qspace::Scheme) {
    for d in scheme.directions() {
        assert!(
            (d.as_vector().norm() - 1.0).abs() < NORM_TOLERANCE,
            "direction {d:?} is off the sphere"
        );
    }
}

#[test]
fn generated_directions_have_unit_norm() {
    for (counts, seed) in [(vec![1], None), (vec![15], Some(3)), (vec![10, 20], None)] {
        let result = generate(&counts, None, seed).unwrap();
        assert_eq!(result.scheme.shell_counts(), counts);
        assert_unit(&result.scheme);
    }
}

#[test]
fn two_shells_with_strengths_are_labeled_in_order() {
    let result = generate(&[4, 4], Some(&[1000.0, 2000.0]), Some(11)).unwrap();
    assert_eq!(result.scheme.num_shells(), 2);
    assert_eq!(result.scheme.shell_counts(), vec![4, 4]);
    assert_eq!(result.scheme.strengths(), vec![Some(1000.0), Some(2000.0)]);
    assert_unit(&result.scheme);
}

#[test]
fn reported_energy_matches_the_scheme() {
    let result = generate(&[6, 9], None, Some(5)).unwrap();
    let energy = EnergyModel::default().scheme_energy(&result.scheme, SymmetryMode::Antipodal);
    assert!((energy.total() - result.energy.total()).abs() < 1e-9 * energy.total());
    assert!((energy.cross_shell - result.energy.cross_shell).abs() < 1e-9 * energy.total());
}

#[test]
fn six_directions_spread_out_under_antipodal_symmetry() {
    // Six antipodal directions admit the icosahedral axes, 63.4 degrees apart.
    let result = generate(&[6], None, Some(2)).unwrap();
    let radius = covering_radius(&result.scheme.directions(), true).unwrap();
    assert!(radius.to_degrees() > 50.0, "covering radius {}", radius.to_degrees());
}

#[test]
fn degenerate_shell_specs_fail_before_optimizing() {
    let cases: [(&[usize], Option<&[f64]>); 4] = [
        (&[], None),
        (&[3, 0], None),
        (&[3, 3], Some(&[1000.0])),
        (&[3, 3], Some(&[1000.0, 1000.0])),
    ];
    for (counts, strengths) in cases {
        assert!(matches!(
            generate(counts, strengths, None),
            Err(EngineError::InvalidShellSpec(_))
        ));
    }
}
