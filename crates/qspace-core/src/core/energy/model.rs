use super::potentials;
use super::term::EnergyTerm;
use crate::core::models::direction::Direction;
use crate::core::models::scheme::Scheme;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_EXPONENT: f64 = 2.0;
pub const DEFAULT_SHELL_WEIGHT: f64 = 0.5;

/// Whether a direction is distinguished from its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymmetryMode {
    /// `u` and `-u` are different points; the plain kernel applies.
    Polar,
    /// `u` and `-u` are the same point; the kernel is summed over both images.
    #[default]
    Antipodal,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObjectiveError {
    #[error("Configuration covers {actual} points but the point set has {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Ordering is not a permutation of 0..{0}")]
    InvalidPermutation(usize),
    #[error("Point {point} is assigned to group {group}, but only {num_groups} group(s) exist")]
    GroupOutOfRange {
        point: usize,
        group: usize,
        num_groups: usize,
    },
    #[error("Prefix length {k} exceeds the ordering length {len}")]
    PrefixTooLong { k: usize, len: usize },
}

/// Flattened solver view of a scheme: directions in flat order with their
/// group (shell) labels.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    directions: Vec<Direction>,
    labels: Vec<usize>,
    num_groups: usize,
}

impl PointSet {
    pub fn from_scheme(scheme: &Scheme) -> Self {
        Self {
            directions: scheme.directions(),
            labels: scheme.labels(),
            num_groups: scheme.num_shells(),
        }
    }

    /// A point set in which every direction belongs to one group.
    pub fn single_group(directions: Vec<Direction>) -> Self {
        let labels = vec![0; directions.len()];
        Self {
            directions,
            labels,
            num_groups: 1,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    #[inline]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    #[inline]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }
}

/// A candidate solution of one of the discrete problems.
#[derive(Debug, Clone, PartialEq)]
pub enum Configuration {
    /// Polarity: `true` flips the point at that flat index.
    Signs(Vec<bool>),
    /// Ordering: acquisition position -> flat point index.
    Permutation(Vec<usize>),
    /// Subsampling / partitioning: `None` leaves a point out, `Some(g)`
    /// places it in group `g` of `num_groups`.
    Assignment {
        groups: Vec<Option<usize>>,
        num_groups: usize,
    },
}

/// The uniformity functional shared by every optimizer.
///
/// The pairwise kernel is an inverse power of the chordal distance with a
/// tunable exponent. Pairs are weighted by group membership with the shell
/// weight `w`: same-group pairs weigh `w / S + (1 - w)`, cross-group pairs
/// weigh `1 - w`, where `S` is the number of groups. This is
/// `w / S * sum_s E(shell s) + (1 - w) * E(union)`, and every pair weighs 1
/// when there is a single group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyModel {
    exponent: f64,
    shell_weight: f64,
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_EXPONENT,
            shell_weight: DEFAULT_SHELL_WEIGHT,
        }
    }
}

impl EnergyModel {
    pub fn new(exponent: f64, shell_weight: f64) -> Self {
        Self {
            exponent,
            shell_weight,
        }
    }

    #[inline]
    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    #[inline]
    pub fn shell_weight(&self) -> f64 {
        self.shell_weight
    }

    /// Plain repulsive kernel; symmetric in its arguments.
    #[inline]
    pub fn pairwise_potential(&self, u: &Direction, v: &Direction) -> f64 {
        potentials::inverse_power(u.chord_squared(v), self.exponent)
    }

    /// Kernel summed over both antipodal images of the partner.
    #[inline]
    pub fn antipodal_potential(&self, u: &Direction, v: &Direction) -> f64 {
        potentials::antipodal_inverse_power(
            u.chord_squared(v),
            u.antipodal_chord_squared(v),
            self.exponent,
        )
    }

    #[inline]
    pub fn potential(&self, u: &Direction, v: &Direction, mode: SymmetryMode) -> f64 {
        match mode {
            SymmetryMode::Polar => self.pairwise_potential(u, v),
            SymmetryMode::Antipodal => self.antipodal_potential(u, v),
        }
    }

    /// Weight of a pair whose members sit in groups `a` and `b`.
    #[inline]
    pub fn pair_weight(&self, a: usize, b: usize, num_groups: usize) -> f64 {
        let cross = 1.0 - self.shell_weight;
        if a == b {
            self.shell_weight / num_groups.max(1) as f64 + cross
        } else {
            cross
        }
    }

    /// Weighted energy of an arbitrary labeled direction list.
    pub fn energy_of(
        &self,
        directions: &[Direction],
        labels: &[usize],
        num_groups: usize,
        mode: SymmetryMode,
    ) -> EnergyTerm {
        let mut term = EnergyTerm::default();
        for i in 0..directions.len() {
            for j in (i + 1)..directions.len() {
                let e = self.pair_weight(labels[i], labels[j], num_groups)
                    * self.potential(&directions[i], &directions[j], mode);
                if labels[i] == labels[j] {
                    term.intra_shell += e;
                } else {
                    term.cross_shell += e;
                }
            }
        }
        term
    }

    /// Weighted energy over all pairs of the point set.
    pub fn total_energy(&self, points: &PointSet, mode: SymmetryMode) -> EnergyTerm {
        self.energy_of(points.directions(), points.labels(), points.num_groups(), mode)
    }

    /// Total energy of the scheme as-is.
    pub fn scheme_energy(&self, scheme: &Scheme, mode: SymmetryMode) -> EnergyTerm {
        self.total_energy(&PointSet::from_scheme(scheme), mode)
    }

    /// Energy of the first `k` points of `ordering`.
    pub fn prefix_energy(
        &self,
        points: &PointSet,
        ordering: &[usize],
        k: usize,
        mode: SymmetryMode,
    ) -> Result<EnergyTerm, ObjectiveError> {
        check_permutation(points.len(), ordering)?;
        if k > ordering.len() {
            return Err(ObjectiveError::PrefixTooLong {
                k,
                len: ordering.len(),
            });
        }
        let (directions, labels): (Vec<Direction>, Vec<usize>) = ordering[..k]
            .iter()
            .map(|&i| (points.directions()[i], points.labels()[i]))
            .unzip();
        Ok(self.energy_of(&directions, &labels, points.num_groups(), mode))
    }

    /// `sum_{k=1..N} prefix_energy(ordering, k)`.
    ///
    /// A pair whose later member sits at 0-based position `q` appears in the
    /// last `N - q` prefixes, so the sum is evaluated in one O(N^2) pass.
    pub fn cumulative_prefix_energy(
        &self,
        points: &PointSet,
        ordering: &[usize],
        mode: SymmetryMode,
    ) -> Result<f64, ObjectiveError> {
        check_permutation(points.len(), ordering)?;
        let n = ordering.len();
        let dirs = points.directions();
        let labels = points.labels();
        let mut total = 0.0;
        for q in 1..n {
            let j = ordering[q];
            let multiplicity = (n - q) as f64;
            for &i in &ordering[..q] {
                total += multiplicity
                    * self.pair_weight(labels[i], labels[j], points.num_groups())
                    * self.potential(&dirs[i], &dirs[j], mode);
            }
        }
        Ok(total)
    }

    /// The single objective entry point for every discrete problem.
    ///
    /// - `Signs`: energy of the signed directions.
    /// - `Permutation`: cumulative prefix energy.
    /// - `Assignment`: energy of the selected points under their assigned
    ///   group labels; unselected points do not contribute.
    pub fn objective(
        &self,
        points: &PointSet,
        configuration: &Configuration,
        mode: SymmetryMode,
    ) -> Result<f64, ObjectiveError> {
        match configuration {
            Configuration::Signs(flips) => {
                check_length(points.len(), flips.len())?;
                let signed = apply_signs(points.directions(), flips);
                Ok(self
                    .energy_of(&signed, points.labels(), points.num_groups(), mode)
                    .total())
            }
            Configuration::Permutation(ordering) => {
                self.cumulative_prefix_energy(points, ordering, mode)
            }
            Configuration::Assignment { groups, num_groups } => {
                check_length(points.len(), groups.len())?;
                let mut directions = Vec::new();
                let mut labels = Vec::new();
                for (point, group) in groups.iter().enumerate() {
                    if let Some(g) = *group {
                        if g >= *num_groups {
                            return Err(ObjectiveError::GroupOutOfRange {
                                point,
                                group: g,
                                num_groups: *num_groups,
                            });
                        }
                        directions.push(points.directions()[point]);
                        labels.push(g);
                    }
                }
                Ok(self
                    .energy_of(&directions, &labels, *num_groups, mode)
                    .total())
            }
        }
    }
}

/// Applies per-point flips.
pub fn apply_signs(directions: &[Direction], flips: &[bool]) -> Vec<Direction> {
    directions
        .iter()
        .zip(flips.iter())
        .map(|(d, &flip)| if flip { d.flipped() } else { *d })
        .collect()
}

fn check_length(expected: usize, actual: usize) -> Result<(), ObjectiveError> {
    if expected != actual {
        return Err(ObjectiveError::LengthMismatch { expected, actual });
    }
    Ok(())
}

pub(crate) fn check_permutation(n: usize, ordering: &[usize]) -> Result<(), ObjectiveError> {
    check_length(n, ordering.len())?;
    let mut seen = vec![false; n];
    for &i in ordering {
        if i >= n || seen[i] {
            return Err(ObjectiveError::InvalidPermutation(n));
        }
        seen[i] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn dir(x: f64, y: f64, z: f64) -> Direction {
        Direction::new(x, y, z).unwrap()
    }

    fn octahedron_half() -> Vec<Direction> {
        vec![dir(1.0, 0.0, 0.0), dir(0.0, 1.0, 0.0), dir(0.0, 0.0, 1.0)]
    }

    fn skewed_set() -> Vec<Direction> {
        vec![
            dir(1.0, 0.1, 0.0),
            dir(0.9, 0.3, 0.2),
            dir(-0.2, 1.0, 0.1),
            dir(0.1, -0.3, 1.0),
            dir(-0.7, -0.6, 0.2),
        ]
    }

    #[test]
    fn pairwise_potential_is_symmetric() {
        let model = EnergyModel::default();
        let u = dir(1.0, 0.2, 0.3);
        let v = dir(-0.4, 1.0, 0.1);
        assert!((model.pairwise_potential(&u, &v) - model.pairwise_potential(&v, &u)).abs() < TOLERANCE);
        assert!((model.antipodal_potential(&u, &v) - model.antipodal_potential(&v, &u)).abs() < TOLERANCE);
    }

    #[test]
    fn antipodal_potential_ignores_partner_sign() {
        let model = EnergyModel::default();
        let u = dir(1.0, 0.2, 0.3);
        let v = dir(-0.4, 1.0, 0.1);
        let a = model.antipodal_potential(&u, &v);
        let b = model.antipodal_potential(&u, &v.flipped());
        assert!((a - b).abs() < TOLERANCE);
    }

    #[test]
    fn orthogonal_pair_energy_matches_closed_form() {
        let model = EnergyModel::new(2.0, 0.5);
        let points = PointSet::single_group(octahedron_half());
        let total = model.total_energy(&points, SymmetryMode::Polar).total();
        // Each orthogonal pair has squared chord 2, three pairs.
        assert!((total - 1.5).abs() < 1e-9);
        let antipodal = model.total_energy(&points, SymmetryMode::Antipodal).total();
        assert!((antipodal - 3.0).abs() < 1e-9);
    }

    #[test]
    fn pair_weights_reduce_to_one_for_a_single_group() {
        let model = EnergyModel::new(2.0, 0.3);
        assert!((model.pair_weight(0, 0, 1) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn pair_weights_split_intra_and_cross_terms() {
        let model = EnergyModel::new(2.0, 0.5);
        assert!((model.pair_weight(0, 0, 2) - 0.75).abs() < TOLERANCE);
        assert!((model.pair_weight(0, 1, 2) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn total_energy_reports_cross_shell_part_separately() {
        let model = EnergyModel::default();
        let scheme = Scheme::from_groups(
            &[Some(1000.0), Some(2000.0)],
            vec![
                vec![dir(1.0, 0.0, 0.0), dir(0.0, 1.0, 0.0)],
                vec![dir(0.0, 0.0, 1.0)],
            ],
        )
        .unwrap();
        let term = model.scheme_energy(&scheme, SymmetryMode::Polar);
        assert!((term.intra_shell - 0.75 * 0.5).abs() < TOLERANCE);
        assert!((term.cross_shell - 2.0 * 0.5 * 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn global_sign_flip_leaves_polar_energy_unchanged() {
        let model = EnergyModel::default();
        let points = PointSet::single_group(skewed_set());
        let partial = vec![true, false, true, false, false];
        let complement: Vec<bool> = partial.iter().map(|f| !f).collect();
        let a = model
            .objective(&points, &Configuration::Signs(partial), SymmetryMode::Polar)
            .unwrap();
        let b = model
            .objective(&points, &Configuration::Signs(complement), SymmetryMode::Polar)
            .unwrap();
        assert!((a - b).abs() < 1e-9 * a.max(1.0));
    }

    #[test]
    fn cumulative_prefix_energy_equals_sum_of_prefix_energies() {
        let model = EnergyModel::default();
        let points = PointSet::single_group(skewed_set());
        let ordering = vec![3, 0, 4, 2, 1];
        let expected: f64 = (1..=5)
            .map(|k| {
                model
                    .prefix_energy(&points, &ordering, k, SymmetryMode::Antipodal)
                    .unwrap()
                    .total()
            })
            .sum();
        let actual = model
            .cumulative_prefix_energy(&points, &ordering, SymmetryMode::Antipodal)
            .unwrap();
        assert!((expected - actual).abs() < 1e-9 * expected);
    }

    #[test]
    fn full_prefix_equals_total_energy() {
        let model = EnergyModel::default();
        let points = PointSet::single_group(skewed_set());
        let ordering = vec![4, 3, 2, 1, 0];
        let full = model
            .prefix_energy(&points, &ordering, 5, SymmetryMode::Antipodal)
            .unwrap()
            .total();
        let total = model.total_energy(&points, SymmetryMode::Antipodal).total();
        assert!((full - total).abs() < 1e-9 * total);
    }

    #[test]
    fn objective_rejects_invalid_permutation() {
        let model = EnergyModel::default();
        let points = PointSet::single_group(octahedron_half());
        let result = model.objective(
            &points,
            &Configuration::Permutation(vec![0, 0, 1]),
            SymmetryMode::Antipodal,
        );
        assert_eq!(result, Err(ObjectiveError::InvalidPermutation(3)));
    }

    #[test]
    fn objective_of_full_assignment_equals_total_energy() {
        let model = EnergyModel::default();
        let points = PointSet::single_group(skewed_set());
        let config = Configuration::Assignment {
            groups: vec![Some(0); 5],
            num_groups: 1,
        };
        let a = model
            .objective(&points, &config, SymmetryMode::Antipodal)
            .unwrap();
        let b = model.total_energy(&points, SymmetryMode::Antipodal).total();
        assert!((a - b).abs() < 1e-9 * b);
    }

    #[test]
    fn objective_of_assignment_ignores_unselected_points() {
        let model = EnergyModel::default();
        let points = PointSet::single_group(octahedron_half());
        let config = Configuration::Assignment {
            groups: vec![Some(0), None, Some(0)],
            num_groups: 1,
        };
        let value = model
            .objective(&points, &config, SymmetryMode::Polar)
            .unwrap();
        assert!((value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn objective_rejects_out_of_range_group() {
        let model = EnergyModel::default();
        let points = PointSet::single_group(octahedron_half());
        let config = Configuration::Assignment {
            groups: vec![Some(0), Some(2), None],
            num_groups: 2,
        };
        assert!(matches!(
            model.objective(&points, &config, SymmetryMode::Polar),
            Err(ObjectiveError::GroupOutOfRange { point: 1, group: 2, .. })
        ));
    }
}
