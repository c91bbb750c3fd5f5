use super::direction::Direction;
use super::error::ModelError;

/// An ordered group of directions acquired at one strength (b-value).
///
/// The number of directions is fixed at construction. The strength is
/// optional: generated schemes may be unlabeled until the caller assigns
/// b-values.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    strength: Option<f64>,
    directions: Vec<Direction>,
}

impl Shell {
    /// Creates a shell.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyShell`] for an empty direction list and
    /// [`ModelError::InvalidStrength`] for a negative or non-finite strength.
    /// The `index` is only used to label the error.
    pub fn new(
        index: usize,
        strength: Option<f64>,
        directions: Vec<Direction>,
    ) -> Result<Self, ModelError> {
        if directions.is_empty() {
            return Err(ModelError::EmptyShell { shell: index });
        }
        if let Some(value) = strength {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidStrength {
                    shell: index,
                    value,
                });
            }
        }
        Ok(Self {
            strength,
            directions,
        })
    }

    #[inline]
    pub fn strength(&self) -> Option<f64> {
        self.strength
    }

    #[inline]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Always `false` for a constructed shell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub fn direction(&self, index: usize) -> Option<&Direction> {
        self.directions.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_x() -> Direction {
        Direction::new(1.0, 0.0, 0.0).unwrap()
    }

    #[test]
    fn new_rejects_empty_direction_list() {
        assert_eq!(
            Shell::new(2, Some(1000.0), Vec::new()),
            Err(ModelError::EmptyShell { shell: 2 })
        );
    }

    #[test]
    fn new_rejects_negative_strength() {
        let result = Shell::new(0, Some(-5.0), vec![unit_x()]);
        assert!(matches!(
            result,
            Err(ModelError::InvalidStrength { shell: 0, .. })
        ));
    }

    #[test]
    fn new_accepts_zero_and_missing_strength() {
        assert!(Shell::new(0, Some(0.0), vec![unit_x()]).is_ok());
        let shell = Shell::new(0, None, vec![unit_x(), -unit_x()]).unwrap();
        assert_eq!(shell.len(), 2);
        assert_eq!(shell.strength(), None);
        assert!(!shell.is_empty());
    }
}
