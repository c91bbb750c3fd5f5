use crate::core::models::direction::Direction;
use nalgebra::Vector3;
use rand::Rng;
use std::f64::consts::PI;

/// Golden angle in radians, `pi * (3 - sqrt(5))`.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Deterministic, near-uniform points on the full sphere.
///
/// Point `i` sits at height `z = 1 - (2i + 1) / n` and azimuth
/// `i * GOLDEN_ANGLE + azimuth_offset`. Different offsets give rotated
/// copies of the same lattice.
pub fn fibonacci_sphere(n: usize, azimuth_offset: f64) -> Vec<Direction> {
    (0..n)
        .filter_map(|i| {
            let z = 1.0 - (2.0 * i as f64 + 1.0) / n as f64;
            let radius = (1.0 - z * z).max(0.0).sqrt();
            let phi = i as f64 * GOLDEN_ANGLE + azimuth_offset;
            Direction::from_vector(Vector3::new(radius * phi.cos(), radius * phi.sin(), z)).ok()
        })
        .collect()
}

/// Uniform random points on the sphere (Archimedes' projection: uniform
/// height and uniform azimuth).
pub fn random_sphere(n: usize, rng: &mut impl Rng) -> Vec<Direction> {
    let mut points = Vec::with_capacity(n);
    while points.len() < n {
        let z: f64 = rng.gen_range(-1.0..=1.0);
        let phi: f64 = rng.gen_range(0.0..(2.0 * PI));
        let radius = (1.0 - z * z).max(0.0).sqrt();
        if let Ok(d) = Direction::from_vector(Vector3::new(radius * phi.cos(), radius * phi.sin(), z)) {
            points.push(d);
        }
    }
    points
}

/// Component of `v` orthogonal to the unit vector `u`.
#[inline]
pub fn project_to_tangent(u: &Vector3<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    v - u * u.dot(v)
}
