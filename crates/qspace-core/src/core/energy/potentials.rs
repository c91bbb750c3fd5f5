/// Regularization added to squared chord lengths so coincident points stay finite.
pub const CHORD_EPSILON: f64 = 1e-12;

/// Inverse-power repulsion on the squared chordal distance:
/// `(d2 + eps)^(-exponent / 2)`.
#[inline]
pub fn inverse_power(chord_squared: f64, exponent: f64) -> f64 {
    (chord_squared + CHORD_EPSILON).powf(-0.5 * exponent)
}

/// Derivative of [`inverse_power`] with respect to the squared chord length.
///
/// The gradient with respect to a point is this factor times `2 * (u - v)`.
#[inline]
pub fn inverse_power_slope(chord_squared: f64, exponent: f64) -> f64 {
    -0.5 * exponent * (chord_squared + CHORD_EPSILON).powf(-0.5 * exponent - 1.0)
}

/// Antipodally symmetrized repulsion: the sum over both images of the partner.
#[inline]
pub fn antipodal_inverse_power(chord_squared: f64, antipodal_chord_squared: f64, exponent: f64) -> f64 {
    inverse_power(chord_squared, exponent) + inverse_power(antipodal_chord_squared, exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE * a.abs().max(1.0)
    }

    #[test]
    fn inverse_power_with_exponent_two_is_reciprocal_squared_distance() {
        assert!(f64_approx_equal(inverse_power(4.0, 2.0), 0.25));
        assert!(f64_approx_equal(inverse_power(1.0, 2.0), 1.0));
    }

    #[test]
    fn inverse_power_respects_configured_exponent() {
        assert!(f64_approx_equal(inverse_power(4.0, 1.0), 0.5));
        assert!(f64_approx_equal(inverse_power(4.0, 4.0), 1.0 / 16.0));
    }

    #[test]
    fn inverse_power_grows_without_bound_toward_coincidence() {
        let far = inverse_power(1e-2, 2.0);
        let near = inverse_power(1e-6, 2.0);
        assert!(near > 1e3 * far);
        assert!(inverse_power(0.0, 2.0).is_finite());
    }

    #[test]
    fn slope_matches_finite_difference() {
        let d2 = 0.7;
        let h = 1e-6;
        let numeric = (inverse_power(d2 + h, 3.0) - inverse_power(d2 - h, 3.0)) / (2.0 * h);
        assert!((numeric - inverse_power_slope(d2, 3.0)).abs() < 1e-5);
    }

    #[test]
    fn antipodal_inverse_power_sums_both_images() {
        let total = antipodal_inverse_power(1.0, 3.0, 2.0);
        assert!(f64_approx_equal(total, 1.0 + 1.0 / 3.0));
    }
}
