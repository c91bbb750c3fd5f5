use std::ops::{Add, AddAssign};

/// Energy split by pair type: pairs inside one shell (or group) and pairs
/// straddling two shells. Both parts already carry their pair weights.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTerm {
    pub intra_shell: f64,
    pub cross_shell: f64,
}

impl EnergyTerm {
    pub fn new(intra_shell: f64, cross_shell: f64) -> Self {
        Self {
            intra_shell,
            cross_shell,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.intra_shell + self.cross_shell
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            intra_shell: self.intra_shell + rhs.intra_shell,
            cross_shell: self.cross_shell + rhs.cross_shell,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.intra_shell += rhs.intra_shell;
        self.cross_shell += rhs.cross_shell;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_returns_sum_of_both_parts() {
        let term = EnergyTerm::new(1.5, 2.5);
        assert_eq!(term.total(), 4.0);
    }

    #[test]
    fn add_sums_each_field_correctly() {
        let result = EnergyTerm::new(1.0, 2.0) + EnergyTerm::new(3.0, 4.0);
        assert_eq!(result, EnergyTerm::new(4.0, 6.0));
    }

    #[test]
    fn add_assign_accumulates_each_field_correctly() {
        let mut a = EnergyTerm::new(1.0, 2.0);
        a += EnergyTerm::new(0.5, 0.25);
        assert_eq!(a, EnergyTerm::new(1.5, 2.25));
    }

    #[test]
    fn default_initializes_all_fields_to_zero() {
        let term = EnergyTerm::default();
        assert_eq!(term.intra_shell, 0.0);
        assert_eq!(term.cross_shell, 0.0);
    }
}
