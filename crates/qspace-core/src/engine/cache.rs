use crate::core::energy::model::{EnergyModel, PointSet, SymmetryMode};
use crate::core::models::direction::Direction;
use nalgebra::DMatrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Dense symmetric table of pair energies with a zero diagonal.
///
/// Discrete solvers evaluate millions of moves against a fixed point set, so
/// every pair potential is computed once up front.
#[derive(Debug, Clone, PartialEq)]
pub struct PairEnergyCache {
    data: DMatrix<f64>,
}

impl PairEnergyCache {
    /// Fills the table from `pair(i, j)` for `i < j`.
    pub fn from_fn<F>(n: usize, pair: F) -> Self
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        let compute_row = |i: usize| -> Vec<(usize, f64)> {
            ((i + 1)..n).map(|j| (j, pair(i, j))).collect()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<(usize, f64)>> = (0..n).into_par_iter().map(compute_row).collect();
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<(usize, f64)>> = (0..n).map(compute_row).collect();

        let mut data = DMatrix::zeros(n, n);
        for (i, row) in rows.into_iter().enumerate() {
            for (j, value) in row {
                data[(i, j)] = value;
                data[(j, i)] = value;
            }
        }
        Self { data }
    }

    /// Unweighted kernel under `mode`.
    pub fn kernel(model: &EnergyModel, directions: &[Direction], mode: SymmetryMode) -> Self {
        Self::from_fn(directions.len(), |i, j| {
            model.potential(&directions[i], &directions[j], mode)
        })
    }

    /// Shell-weighted kernel under `mode`, using the point set's own labels.
    pub fn weighted(model: &EnergyModel, points: &PointSet, mode: SymmetryMode) -> Self {
        let dirs = points.directions();
        let labels = points.labels();
        Self::from_fn(points.len(), |i, j| {
            model.pair_weight(labels[i], labels[j], points.num_groups())
                * model.potential(&dirs[i], &dirs[j], mode)
        })
    }

    /// Shell-weighted polar kernel with the second point of each pair negated.
    pub fn weighted_opposite(model: &EnergyModel, points: &PointSet) -> Self {
        let dirs = points.directions();
        let labels = points.labels();
        Self::from_fn(points.len(), |i, j| {
            model.pair_weight(labels[i], labels[j], points.num_groups())
                * model.pairwise_potential(&dirs[i], &dirs[j].flipped())
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }

    /// Mean over all off-diagonal entries; zero for fewer than two points.
    pub fn mean_pair_energy(&self) -> f64 {
        let n = self.len();
        if n < 2 {
            return 0.0;
        }
        self.data.sum() / (n * (n - 1)) as f64
    }

    /// Sum of `get(i, j)` over `j` in `others`.
    pub fn sum_against(&self, i: usize, others: &[usize]) -> f64 {
        others.iter().map(|&j| self.data[(i, j)]).sum()
    }
}
