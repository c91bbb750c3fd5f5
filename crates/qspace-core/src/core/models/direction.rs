use super::error::ModelError;
use nalgebra::Vector3;
use std::ops::Neg;

/// Maximum deviation from unit norm tolerated for a stored direction.
pub const NORM_TOLERANCE: f64 = 1e-6;

/// A sampling orientation: a unit vector in 3-space.
///
/// The unit-norm invariant is enforced at construction. Every constructor
/// normalizes its input, so a `Direction` can never be observed off the sphere.
/// Directions are immutable values; operations that move a direction produce
/// a new one through the same normalizing path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    vector: Vector3<f64>,
}

impl Direction {
    /// Creates a direction from raw coordinates.
    ///
    /// # Arguments
    ///
    /// * `x`, `y`, `z` - Cartesian components; need not be normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonFiniteComponent`] for NaN or infinite input and
    /// [`ModelError::ZeroLengthDirection`] for a (near) zero vector.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, ModelError> {
        Self::from_vector(Vector3::new(x, y, z))
    }

    /// Creates a direction by normalizing `vector`.
    pub fn from_vector(vector: Vector3<f64>) -> Result<Self, ModelError> {
        if !vector.iter().all(|c| c.is_finite()) {
            return Err(ModelError::NonFiniteComponent);
        }
        let norm = vector.norm();
        if norm < f64::EPSILON {
            return Err(ModelError::ZeroLengthDirection);
        }
        Ok(Self {
            vector: vector / norm,
        })
    }

    /// Retraction used by the descent loop: normalizes a vector that is known
    /// to be close to the sphere.
    pub(crate) fn retract(vector: Vector3<f64>) -> Option<Self> {
        Self::from_vector(vector).ok()
    }

    #[inline]
    pub fn as_vector(&self) -> &Vector3<f64> {
        &self.vector
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.vector.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.vector.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.vector.z
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.vector.x, self.vector.y, self.vector.z]
    }

    /// The antipodal direction `-self`.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            vector: -self.vector,
        }
    }

    #[inline]
    pub fn dot(&self, other: &Direction) -> f64 {
        self.vector.dot(&other.vector)
    }

    /// Squared chordal distance `|u - v|^2`.
    #[inline]
    pub fn chord_squared(&self, other: &Direction) -> f64 {
        (self.vector - other.vector).norm_squared()
    }

    /// Squared chordal distance to the antipode of `other`, `|u + v|^2`.
    #[inline]
    pub fn antipodal_chord_squared(&self, other: &Direction) -> f64 {
        (self.vector + other.vector).norm_squared()
    }

    /// Angle in radians between two directions. With `antipodal` set the
    /// angle to the nearer of `other` and `-other` is returned, in `[0, pi/2]`.
    pub fn angle_to(&self, other: &Direction, antipodal: bool) -> f64 {
        let cos = self.dot(other);
        let cos = if antipodal { cos.abs() } else { cos };
        cos.clamp(-1.0, 1.0).acos()
    }

    /// Returns `true` if both directions coincide within `tolerance`.
    pub fn approx_eq(&self, other: &Direction, tolerance: f64) -> bool {
        (self.vector - other.vector).norm() <= tolerance
    }
}

impl Neg for Direction {
    type Output = Direction;

    fn neg(self) -> Self::Output {
        self.flipped()
    }
}

impl TryFrom<[f64; 3]> for Direction {
    type Error = ModelError;

    fn try_from(value: [f64; 3]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<Direction> for Vector3<f64> {
    fn from(direction: Direction) -> Self {
        direction.vector
    }
}
