//! Precomputed forms of the three discrete problems.
//!
//! Each problem owns its pair-energy tables and exposes its objective plus the
//! O(N) change of that objective under one local move. Solvers never touch
//! directions directly.

use super::cache::PairEnergyCache;
use crate::core::energy::model::{EnergyModel, PointSet, SymmetryMode};
use crate::core::models::direction::Direction;

/// Sign assignment. `true` flips a point.
///
/// Negating every point is a symmetry of the objective; no point is pinned,
/// so both members of each optimal pair are valid answers.
#[derive(Debug, Clone)]
pub struct PolarityProblem {
    same: PairEnergyCache,
    opposite: PairEnergyCache,
}

impl PolarityProblem {
    pub fn new(model: &EnergyModel, points: &PointSet) -> Self {
        Self {
            same: PairEnergyCache::weighted(model, points, SymmetryMode::Polar),
            opposite: PairEnergyCache::weighted_opposite(model, points),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.same.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.same.is_empty()
    }

    /// Number of binary decisions.
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Energy of a pair when both points keep (or both flip) their sign.
    #[inline]
    pub fn same_sign(&self, i: usize, j: usize) -> f64 {
        self.same.get(i, j)
    }

    /// Energy of a pair when exactly one of the points is flipped.
    #[inline]
    pub fn opposite_sign(&self, i: usize, j: usize) -> f64 {
        self.opposite.get(i, j)
    }

    #[inline]
    fn pair(&self, flips: &[bool], i: usize, j: usize) -> f64 {
        if flips[i] == flips[j] {
            self.same.get(i, j)
        } else {
            self.opposite.get(i, j)
        }
    }

    pub fn objective(&self, flips: &[bool]) -> f64 {
        let n = self.len();
        let mut total = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                total += self.pair(flips, i, j);
            }
        }
        total
    }

    /// Objective change when point `i` is flipped.
    pub fn flip_delta(&self, flips: &[bool], i: usize) -> f64 {
        (0..self.len())
            .filter(|&j| j != i)
            .map(|j| {
                let (a, b) = (self.same.get(i, j), self.opposite.get(i, j));
                if flips[i] == flips[j] { b - a } else { a - b }
            })
            .sum()
    }

    pub(crate) fn mean_pair_energy(&self) -> f64 {
        self.same.mean_pair_energy()
    }
}

/// Acquisition ordering. A permutation maps position to flat point index.
///
/// The objective is the sum of prefix energies, which weighs each pair by
/// `N - q`, where `q` is the 0-based position of its later member.
#[derive(Debug, Clone)]
pub struct OrderingProblem {
    pairs: PairEnergyCache,
}

impl OrderingProblem {
    pub fn new(model: &EnergyModel, points: &PointSet, mode: SymmetryMode) -> Self {
        Self {
            pairs: PairEnergyCache::weighted(model, points, mode),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of binary decisions of the first exact round.
    pub fn size(&self, segment_len: Option<usize>) -> usize {
        let n = self.len();
        n * segment_len.map_or(n, |len| len.min(n))
    }

    #[inline]
    pub fn pair(&self, i: usize, j: usize) -> f64 {
        self.pairs.get(i, j)
    }

    /// Sum of pair energies between point `i` and every point in `others`.
    pub fn sum_against(&self, i: usize, others: &[usize]) -> f64 {
        self.pairs.sum_against(i, others)
    }

    pub fn objective(&self, ordering: &[usize]) -> f64 {
        let n = ordering.len();
        let mut total = 0.0;
        for q in 1..n {
            let later = ordering[q];
            total += (n - q) as f64 * self.pairs.sum_against(later, &ordering[..q]);
        }
        total
    }

    /// Objective change when the points at positions `a` and `b` trade places.
    pub fn swap_delta(&self, ordering: &[usize], a: usize, b: usize) -> f64 {
        if a == b {
            return 0.0;
        }
        let (x, y) = (ordering[a], ordering[b]);
        ordering
            .iter()
            .enumerate()
            .filter(|&(q, _)| q != a && q != b)
            .map(|(q, &z)| {
                let gain = a.max(q) as f64 - b.max(q) as f64;
                (self.pairs.get(x, z) - self.pairs.get(y, z)) * gain
            })
            .sum()
    }

    pub(crate) fn mean_pair_energy(&self) -> f64 {
        self.pairs.mean_pair_energy()
    }
}

/// Selection of labeled subsets.
///
/// Point `i` may join any group in `allowed[i]` or stay unselected; group `g`
/// must receive exactly `targets[g]` points. Pairs are weighted by the group
/// labels they end up with.
#[derive(Debug, Clone)]
pub struct AssignmentProblem {
    kernel: PairEnergyCache,
    weights: Vec<Vec<f64>>,
    allowed: Vec<Vec<usize>>,
    targets: Vec<usize>,
}

impl AssignmentProblem {
    /// Per-shell subsampling: points stay in their own shell; group `s`
    /// selects `sizes[s]` of them.
    pub fn subsample(
        model: &EnergyModel,
        points: &PointSet,
        mode: SymmetryMode,
        sizes: &[usize],
    ) -> Self {
        let allowed = points.labels().iter().map(|&s| vec![s]).collect();
        Self::new(model, points.directions(), mode, allowed, sizes.to_vec())
    }

    /// Splits one direction set into disjoint groups of the given sizes.
    pub fn partition(
        model: &EnergyModel,
        directions: &[Direction],
        mode: SymmetryMode,
        sizes: &[usize],
    ) -> Self {
        let all: Vec<usize> = (0..sizes.len()).collect();
        let allowed = vec![all; directions.len()];
        Self::new(model, directions, mode, allowed, sizes.to_vec())
    }

    fn new(
        model: &EnergyModel,
        directions: &[Direction],
        mode: SymmetryMode,
        allowed: Vec<Vec<usize>>,
        targets: Vec<usize>,
    ) -> Self {
        let num_groups = targets.len();
        let weights = (0..num_groups)
            .map(|a| {
                (0..num_groups)
                    .map(|b| model.pair_weight(a, b, num_groups))
                    .collect()
            })
            .collect();
        Self {
            kernel: PairEnergyCache::kernel(model, directions, mode),
            weights,
            allowed,
            targets,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.kernel.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kernel.is_empty()
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    #[inline]
    pub fn allowed(&self, i: usize) -> &[usize] {
        &self.allowed[i]
    }

    pub fn is_allowed(&self, i: usize, group: Option<usize>) -> bool {
        group.is_none_or(|g| self.allowed[i].contains(&g))
    }

    /// Number of binary decisions.
    pub fn size(&self) -> usize {
        self.allowed.iter().map(Vec::len).sum()
    }

    #[inline]
    pub fn kernel(&self, i: usize, j: usize) -> f64 {
        self.kernel.get(i, j)
    }

    #[inline]
    pub fn weight(&self, a: usize, b: usize) -> f64 {
        self.weights[a][b]
    }

    #[inline]
    fn label_weight(&self, a: Option<usize>, b: Option<usize>) -> f64 {
        match (a, b) {
            (Some(a), Some(b)) => self.weights[a][b],
            _ => 0.0,
        }
    }

    pub fn objective(&self, groups: &[Option<usize>]) -> f64 {
        let n = self.len();
        let mut total = 0.0;
        for i in 0..n {
            if groups[i].is_none() {
                continue;
            }
            for j in (i + 1)..n {
                total += self.label_weight(groups[i], groups[j]) * self.kernel.get(i, j);
            }
        }
        total
    }

    /// Energy added by placing point `i` in `group` against the current
    /// selection (`i` itself excluded).
    pub fn insertion_cost(&self, groups: &[Option<usize>], i: usize, group: usize) -> f64 {
        groups
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != i)
            .map(|(k, &label)| self.label_weight(Some(group), label) * self.kernel.get(i, k))
            .sum()
    }

    /// Whether `i` and `j` may trade labels.
    pub fn can_exchange(&self, groups: &[Option<usize>], i: usize, j: usize) -> bool {
        i != j
            && groups[i] != groups[j]
            && self.is_allowed(i, groups[j])
            && self.is_allowed(j, groups[i])
    }

    /// Objective change when points `i` and `j` trade labels.
    pub fn exchange_delta(&self, groups: &[Option<usize>], i: usize, j: usize) -> f64 {
        let (gi, gj) = (groups[i], groups[j]);
        groups
            .iter()
            .enumerate()
            .filter(|&(k, label)| k != i && k != j && label.is_some())
            .map(|(k, &label)| {
                (self.kernel.get(i, k) - self.kernel.get(j, k))
                    * (self.label_weight(gj, label) - self.label_weight(gi, label))
            })
            .sum()
    }

    /// Whether every group holds exactly its target count of allowed points.
    pub fn is_feasible(&self, groups: &[Option<usize>]) -> bool {
        if groups.len() != self.len() {
            return false;
        }
        let mut counts = vec![0usize; self.num_groups()];
        for (i, group) in groups.iter().enumerate() {
            if let Some(g) = *group {
                if g >= self.num_groups() || !self.is_allowed(i, Some(g)) {
                    return false;
                }
                counts[g] += 1;
            }
        }
        counts == self.targets
    }

    pub(crate) fn mean_pair_energy(&self) -> f64 {
        self.kernel.mean_pair_energy()
    }
}
