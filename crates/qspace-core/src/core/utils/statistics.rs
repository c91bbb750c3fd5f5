use crate::core::models::direction::Direction;
use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI};

/// Smallest pairwise angle (radians) of a direction set.
///
/// With `antipodal` set, each pair is measured against the nearer image of
/// its partner. Returns `None` for fewer than two directions.
pub fn covering_radius(directions: &[Direction], antipodal: bool) -> Option<f64> {
    let mut best: Option<f64> = None;
    for (i, u) in directions.iter().enumerate() {
        for v in &directions[i + 1..] {
            let angle = u.angle_to(v, antipodal);
            best = Some(best.map_or(angle, |b| b.min(angle)));
        }
    }
    best
}

/// Upper bound on the covering radius achievable by `n` points.
///
/// Derived from the spherical-code bound on the chord length
/// `sqrt(4 - csc^2(pi n / (6 (n - 2))))`. For fewer than three points the
/// bound is `pi / 2`.
pub fn covering_radius_upper_bound(n: usize) -> f64 {
    if n < 3 {
        return FRAC_PI_2;
    }
    let n = n as f64;
    let csc = 1.0 / (PI * n / (6.0 * (n - 2.0))).sin();
    let chord = (4.0 - csc * csc).max(0.0).sqrt();
    ((2.0 - chord * chord) / 2.0).clamp(-1.0, 1.0).acos()
}

/// Norm of the mean vector; zero for a perfectly balanced set.
pub fn norm_of_mean(directions: &[Direction]) -> f64 {
    if directions.is_empty() {
        return 0.0;
    }
    let sum: Vector3<f64> = directions.iter().map(|d| *d.as_vector()).sum();
    (sum / directions.len() as f64).norm()
}
