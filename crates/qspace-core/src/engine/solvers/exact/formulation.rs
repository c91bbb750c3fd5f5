//! Linearized MILP models of the discrete problems and their decoders.
//!
//! Products of binaries are replaced by auxiliary continuous variables. Where
//! every objective coefficient on an auxiliary is non-negative, the McCormick
//! lower envelope alone is tight at the optimum; polarity uses the full XOR
//! description because its coefficients have either sign.

use super::backend::{MilpModel, Relation, VariableSpec};
use crate::engine::problems::{AssignmentProblem, OrderingProblem, PolarityProblem};

const BINARY_THRESHOLD: f64 = 0.5;

#[inline]
fn is_set(value: f64) -> bool {
    value > BINARY_THRESHOLD
}

/// Polarity model: `h_i` flips point `i`; `y_ij = h_i XOR h_j`.
///
/// Objective `sum a_ij + (b_ij - a_ij) y_ij`, where `a` is the same-sign and
/// `b` the opposite-sign pair energy.
pub struct PolarityFormulation {
    pub model: MilpModel,
    flips: Vec<usize>,
}

impl PolarityFormulation {
    pub fn build(problem: &PolarityProblem) -> Self {
        let n = problem.len();
        let mut model = MilpModel::default();
        let flips: Vec<usize> = (0..n)
            .map(|_| model.add_variable(VariableSpec::BINARY))
            .collect();

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (problem.same_sign(i, j), problem.opposite_sign(i, j));
                model.objective_constant += a;
                let y = model.add_variable(VariableSpec::UNIT);
                model.add_objective_term(y, b - a);
                let (hi, hj) = (flips[i], flips[j]);
                model.add_constraint(vec![(y, 1.0), (hi, -1.0), (hj, -1.0)], Relation::LessEq, 0.0);
                model.add_constraint(vec![(y, 1.0), (hi, -1.0), (hj, 1.0)], Relation::GreaterEq, 0.0);
                model.add_constraint(vec![(y, 1.0), (hi, 1.0), (hj, -1.0)], Relation::GreaterEq, 0.0);
                model.add_constraint(vec![(y, 1.0), (hi, 1.0), (hj, 1.0)], Relation::LessEq, 2.0);
            }
        }
        Self { model, flips }
    }

    pub fn decode(&self, values: &[f64]) -> Vec<bool> {
        self.flips.iter().map(|&v| is_set(values[v])).collect()
    }

    /// Feasible model point for a sign pattern.
    pub fn encode(&self, flips: &[bool]) -> Vec<f64> {
        let mut values = vec![0.0; self.model.variables.len()];
        for (&v, &flip) in self.flips.iter().zip(flips) {
            values[v] = if flip { 1.0 } else { 0.0 };
        }
        self.model.complete_auxiliaries(&mut values);
        values
    }
}

/// One round of segment-wise ordering.
///
/// Given a fixed `prefix`, chooses which of the `remaining` points occupy the
/// next `segment_len` positions and in which order. `x_ip` places remaining
/// point `i` at segment position `p`; the prefix indicator
/// `a_ik = sum_{p <= k} x_ip` is substituted directly into
/// `z_ijk >= a_ik + a_jk - 1`, so `sum_k z_ijk` counts the segment prefixes
/// containing both points.
pub struct OrderingFormulation {
    pub model: MilpModel,
    remaining: Vec<usize>,
    placement: Vec<Vec<usize>>,
    segment_len: usize,
}

impl OrderingFormulation {
    pub fn build(
        problem: &OrderingProblem,
        prefix: &[usize],
        remaining: &[usize],
        segment_len: usize,
    ) -> Self {
        let n = problem.len();
        let m = prefix.len();
        let r = remaining.len();
        let len = segment_len.min(r);
        let mut model = MilpModel::default();

        let placement: Vec<Vec<usize>> = (0..r)
            .map(|_| {
                (0..len)
                    .map(|_| model.add_variable(VariableSpec::BINARY))
                    .collect()
            })
            .collect();

        // Each point takes at most one position (exactly one if all remaining
        // points fit in this segment); each position holds exactly one point.
        let point_relation = if len == r {
            Relation::Equal
        } else {
            Relation::LessEq
        };
        for row in &placement {
            model.add_constraint(row.iter().map(|&v| (v, 1.0)).collect(), point_relation, 1.0);
        }
        for p in 0..len {
            model.add_constraint(
                placement.iter().map(|row| (row[p], 1.0)).collect(),
                Relation::Equal,
                1.0,
            );
        }

        // Pairs with a prefix point are linear in the placement.
        for (ri, &i) in remaining.iter().enumerate() {
            let against_prefix = problem.sum_against(i, prefix);
            for (p, &x) in placement[ri].iter().enumerate() {
                model.add_objective_term(x, (n - m - p) as f64 * against_prefix);
            }
        }

        // Pairs inside the segment. A pair placed at segment positions up to
        // `len - 1` stays in the `n - m - len` prefixes after the segment too.
        let tail = (n - m - len) as f64;
        for ri in 0..r {
            for rj in (ri + 1)..r {
                let e = problem.pair(remaining[ri], remaining[rj]);
                if e == 0.0 {
                    continue;
                }
                for k in 0..len {
                    let z = model.add_variable(VariableSpec::UNIT);
                    let weight = if k + 1 == len { 1.0 + tail } else { 1.0 };
                    model.add_objective_term(z, e * weight);
                    let mut terms = vec![(z, 1.0)];
                    terms.extend(placement[ri][..=k].iter().map(|&x| (x, -1.0)));
                    terms.extend(placement[rj][..=k].iter().map(|&x| (x, -1.0)));
                    model.add_constraint(terms, Relation::GreaterEq, -1.0);
                }
            }
        }

        Self {
            model,
            remaining: remaining.to_vec(),
            placement,
            segment_len: len,
        }
    }

    /// Flat indices placed at each segment position, or `None` if some
    /// position is not filled by exactly one point.
    pub fn decode(&self, values: &[f64]) -> Option<Vec<usize>> {
        (0..self.segment_len)
            .map(|p| {
                let mut chosen = self
                    .placement
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| is_set(values[row[p]]))
                    .map(|(ri, _)| self.remaining[ri]);
                match (chosen.next(), chosen.next()) {
                    (Some(i), None) => Some(i),
                    _ => None,
                }
            })
            .collect()
    }

    /// Feasible model point placing `segment` at the segment positions, or
    /// `None` if it does not fill the segment with remaining points.
    pub fn encode(&self, segment: &[usize]) -> Option<Vec<f64>> {
        if segment.len() != self.segment_len {
            return None;
        }
        let mut values = vec![0.0; self.model.variables.len()];
        for (p, i) in segment.iter().enumerate() {
            let ri = self.remaining.iter().position(|r| r == i)?;
            values[self.placement[ri][p]] = 1.0;
        }
        self.model.complete_auxiliaries(&mut values);
        Some(values)
    }
}

/// Subsampling and partitioning: `h_ig` puts point `i` in group `g`.
///
/// `sum_g h_ig <= 1`, `sum_i h_ig = K_g`, and for every pair of candidate
/// labels `z >= h_ig + h_jg' - 1` carries the weighted pair energy.
pub struct AssignmentFormulation {
    pub model: MilpModel,
    labels: Vec<Vec<(usize, usize)>>,
}

impl AssignmentFormulation {
    pub fn build(problem: &AssignmentProblem) -> Self {
        let n = problem.len();
        let mut model = MilpModel::default();
        let labels: Vec<Vec<(usize, usize)>> = (0..n)
            .map(|i| {
                problem
                    .allowed(i)
                    .iter()
                    .map(|&g| (g, model.add_variable(VariableSpec::BINARY)))
                    .collect()
            })
            .collect();

        for row in &labels {
            if row.len() > 1 {
                model.add_constraint(row.iter().map(|&(_, v)| (v, 1.0)).collect(), Relation::LessEq, 1.0);
            }
        }
        for (g, &target) in problem.targets().iter().enumerate() {
            let terms: Vec<(usize, f64)> = labels
                .iter()
                .flat_map(|row| row.iter().filter(|&&(label, _)| label == g))
                .map(|&(_, v)| (v, 1.0))
                .collect();
            model.add_constraint(terms, Relation::Equal, target as f64);
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let kernel = problem.kernel(i, j);
                for &(gi, hi) in &labels[i] {
                    for &(gj, hj) in &labels[j] {
                        let coefficient = problem.weight(gi, gj) * kernel;
                        if coefficient <= 0.0 {
                            continue;
                        }
                        let z = model.add_variable(VariableSpec::UNIT);
                        model.add_objective_term(z, coefficient);
                        model.add_constraint(
                            vec![(z, 1.0), (hi, -1.0), (hj, -1.0)],
                            Relation::GreaterEq,
                            -1.0,
                        );
                    }
                }
            }
        }
        Self { model, labels }
    }

    pub fn decode(&self, values: &[f64]) -> Vec<Option<usize>> {
        self.labels
            .iter()
            .map(|row| {
                row.iter()
                    .find(|&&(_, v)| is_set(values[v]))
                    .map(|&(g, _)| g)
            })
            .collect()
    }

    pub fn encode(&self, groups: &[Option<usize>]) -> Vec<f64> {
        let mut values = vec![0.0; self.model.variables.len()];
        for (row, group) in self.labels.iter().zip(groups) {
            if let Some(&(_, v)) = row.iter().find(|&&(g, _)| Some(g) == *group) {
                values[v] = 1.0;
            }
        }
        self.model.complete_auxiliaries(&mut values);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::model::{EnergyModel, PointSet, SymmetryMode};
    use crate::core::utils::geometry::fibonacci_sphere;

    fn points(n: usize) -> PointSet {
        PointSet::single_group(fibonacci_sphere(n, 0.2))
    }

    #[test]
    fn polarity_formulation_objective_matches_problem_at_integer_points() {
        let model = EnergyModel::default();
        let problem = PolarityProblem::new(&model, &points(5));
        let formulation = PolarityFormulation::build(&problem);
        let flips = vec![true, false, true, false, false];

        let mut values = vec![0.0; formulation.model.variables.len()];
        for (i, &f) in flips.iter().enumerate() {
            values[formulation.flips[i]] = if f { 1.0 } else { 0.0 };
        }
        // y_ij follows the binaries in pair order.
        let mut next = 5;
        for i in 0..5 {
            for j in (i + 1)..5 {
                values[next] = if flips[i] != flips[j] { 1.0 } else { 0.0 };
                next += 1;
            }
        }
        let expected = problem.objective(&flips);
        assert!((formulation.model.evaluate(&values) - expected).abs() < 1e-9 * expected);
        assert_eq!(formulation.decode(&values), flips);
    }

    #[test]
    fn full_ordering_formulation_objective_matches_problem() {
        let model = EnergyModel::default();
        let problem = OrderingProblem::new(&model, &points(4), SymmetryMode::Antipodal);
        let remaining = vec![0, 1, 2, 3];
        let formulation = OrderingFormulation::build(&problem, &[], &remaining, 4);
        let ordering = vec![2, 0, 3, 1];

        let mut values = vec![0.0; formulation.model.variables.len()];
        for (p, &i) in ordering.iter().enumerate() {
            values[formulation.placement[i][p]] = 1.0;
        }
        formulation.model.complete_auxiliaries(&mut values);

        let expected = problem.objective(&ordering);
        assert!((formulation.model.evaluate(&values) - expected).abs() < 1e-9 * expected);
        assert_eq!(formulation.decode(&values), Some(ordering));
    }

    #[test]
    fn segment_formulation_accounts_for_fixed_prefix() {
        let model = EnergyModel::default();
        let problem = OrderingProblem::new(&model, &points(5), SymmetryMode::Antipodal);
        let prefix = vec![4, 1];
        let remaining = vec![0, 2, 3];
        let formulation = OrderingFormulation::build(&problem, &prefix, &remaining, 3);
        let tail = vec![3, 0, 2];

        let mut values = vec![0.0; formulation.model.variables.len()];
        for (p, &i) in tail.iter().enumerate() {
            let ri = remaining.iter().position(|&r| r == i).unwrap();
            values[formulation.placement[ri][p]] = 1.0;
        }
        formulation.model.complete_auxiliaries(&mut values);

        let full: Vec<usize> = prefix.iter().chain(tail.iter()).copied().collect();
        let prefix_only = {
            let n = 5.0;
            (n - 1.0) * problem.pair(4, 1)
        };
        let expected = problem.objective(&full) - prefix_only;
        assert!((formulation.model.evaluate(&values) - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn encoded_points_decode_back_with_the_problem_objective() {
        let model = EnergyModel::default();
        let set = points(5);

        let polarity = PolarityProblem::new(&model, &set);
        let formulation = PolarityFormulation::build(&polarity);
        let flips = vec![false, true, true, false, true];
        let values = formulation.encode(&flips);
        let expected = polarity.objective(&flips);
        assert_eq!(formulation.decode(&values), flips);
        assert!((formulation.model.evaluate(&values) - expected).abs() < 1e-9 * expected);

        let ordering = OrderingProblem::new(&model, &set, SymmetryMode::Antipodal);
        let formulation = OrderingFormulation::build(&ordering, &[], &[0, 1, 2, 3, 4], 2);
        let values = formulation.encode(&[3, 1]).unwrap();
        assert_eq!(formulation.decode(&values), Some(vec![3, 1]));
        assert!(formulation.encode(&[3]).is_none());

        let dirs = fibonacci_sphere(5, 0.0);
        let assignment = AssignmentProblem::partition(&model, &dirs, SymmetryMode::Antipodal, &[2, 2]);
        let formulation = AssignmentFormulation::build(&assignment);
        let groups = vec![Some(0), Some(1), None, Some(1), Some(0)];
        let values = formulation.encode(&groups);
        let expected = assignment.objective(&groups);
        assert_eq!(formulation.decode(&values), groups);
        assert!((formulation.model.evaluate(&values) - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn ordering_decode_rejects_doubly_filled_position() {
        let model = EnergyModel::default();
        let problem = OrderingProblem::new(&model, &points(3), SymmetryMode::Antipodal);
        let formulation = OrderingFormulation::build(&problem, &[], &[0, 1, 2], 3);
        let mut values = vec![0.0; formulation.model.variables.len()];
        values[formulation.placement[0][0]] = 1.0;
        values[formulation.placement[1][0]] = 1.0;
        assert_eq!(formulation.decode(&values), None);
    }

    #[test]
    fn assignment_formulation_objective_matches_problem() {
        let model = EnergyModel::default();
        let dirs = fibonacci_sphere(5, 0.0);
        let problem = AssignmentProblem::partition(&model, &dirs, SymmetryMode::Antipodal, &[2, 1]);
        let formulation = AssignmentFormulation::build(&problem);
        let groups = vec![Some(1), None, Some(0), None, Some(0)];

        let mut values = vec![0.0; formulation.model.variables.len()];
        for (i, group) in groups.iter().enumerate() {
            if let Some(g) = group {
                let (_, v) = formulation.labels[i][*g];
                values[v] = 1.0;
            }
        }
        formulation.model.complete_auxiliaries(&mut values);

        let expected = problem.objective(&groups);
        assert!((formulation.model.evaluate(&values) - expected).abs() < 1e-9 * expected);
        assert_eq!(formulation.decode(&values), groups);
    }
}
