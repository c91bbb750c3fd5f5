use super::budget::{Budget, BudgetCheck, BudgetTracker};
use super::config::DescentConfig;
use super::progress::{Progress, ProgressReporter};
use crate::core::energy::model::{EnergyModel, SymmetryMode};
use crate::core::energy::potentials::inverse_power_slope;
use crate::core::energy::term::EnergyTerm;
use crate::core::models::direction::Direction;
use crate::core::utils::geometry::project_to_tangent;
use nalgebra::Vector3;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const STEP_GROWTH: f64 = 1.2;
const STEP_SHRINK: f64 = 0.5;
const STATUS_INTERVAL: usize = 50;

/// Why a descent stopped before converging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    IterationCap,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    Converged,
    /// Stopped by a budget; the best configuration seen is still returned.
    NonConvergence(StopReason),
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged)
    }
}

#[derive(Debug, Clone)]
pub struct DescentOutcome {
    pub directions: Vec<Direction>,
    pub energy: EnergyTerm,
    pub iterations: usize,
    pub status: ConvergenceStatus,
}

/// Result of one descent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The energy decreased; the new configuration was accepted.
    Improved,
    /// No step above the minimum size decreases the energy.
    Collapsed,
}

/// Projected gradient descent of the weighted repulsion energy on the sphere.
///
/// All points move together along the negative tangent gradient. The step
/// is normalized so that the point with the largest gradient moves by
/// exactly `step` before retraction. Only energy-decreasing steps are
/// accepted, so the current configuration is always the best seen.
pub struct SphereDescent<'a> {
    model: &'a EnergyModel,
    mode: SymmetryMode,
    labels: Vec<usize>,
    num_groups: usize,
    points: Vec<Direction>,
    energy: f64,
    step: f64,
    min_step: f64,
}

impl<'a> SphereDescent<'a> {
    pub fn new(
        model: &'a EnergyModel,
        mode: SymmetryMode,
        points: Vec<Direction>,
        labels: Vec<usize>,
        num_groups: usize,
        config: &DescentConfig,
    ) -> Self {
        let energy = model.energy_of(&points, &labels, num_groups, mode).total();
        Self {
            model,
            mode,
            labels,
            num_groups,
            points,
            energy,
            step: config.initial_step,
            min_step: config.min_step,
        }
    }

    #[inline]
    pub fn energy(&self) -> f64 {
        self.energy
    }

    #[inline]
    pub fn step_size(&self) -> f64 {
        self.step
    }

    #[inline]
    pub fn points(&self) -> &[Direction] {
        &self.points
    }

    /// Euclidean gradient of the weighted energy with respect to each point.
    pub fn gradient(&self) -> Vec<Vector3<f64>> {
        let gradient_at = |i: usize| -> Vector3<f64> {
            let u = self.points[i].as_vector();
            let mut g = Vector3::zeros();
            for (j, other) in self.points.iter().enumerate() {
                if j == i {
                    continue;
                }
                let v = other.as_vector();
                let w = self
                    .model
                    .pair_weight(self.labels[i], self.labels[j], self.num_groups);
                let diff = u - v;
                g += diff * (2.0 * w * inverse_power_slope(diff.norm_squared(), self.model.exponent()));
                if self.mode == SymmetryMode::Antipodal {
                    let sum = u + v;
                    g += sum
                        * (2.0 * w * inverse_power_slope(sum.norm_squared(), self.model.exponent()));
                }
            }
            g
        };

        let n = self.points.len();
        #[cfg(feature = "parallel")]
        let gradient = (0..n).into_par_iter().map(gradient_at).collect();
        #[cfg(not(feature = "parallel"))]
        let gradient = (0..n).map(gradient_at).collect();
        gradient
    }

    fn weighted_energy(&self, points: &[Direction]) -> f64 {
        self.model
            .energy_of(points, &self.labels, self.num_groups, self.mode)
            .total()
    }

    /// Takes one step, halving and retrying until the energy decreases or
    /// the step collapses below the minimum.
    pub fn step(&mut self) -> StepResult {
        let descent: Vec<Vector3<f64>> = self
            .gradient()
            .iter()
            .zip(&self.points)
            .map(|(g, p)| -project_to_tangent(p.as_vector(), g))
            .collect();
        let largest = descent.iter().map(|d| d.norm()).fold(0.0, f64::max);
        if !(largest > f64::MIN_POSITIVE) {
            return StepResult::Collapsed;
        }

        while self.step >= self.min_step {
            let scale = self.step / largest;
            let candidate: Option<Vec<Direction>> = self
                .points
                .iter()
                .zip(&descent)
                .map(|(p, d)| Direction::retract(p.as_vector() + d * scale))
                .collect();
            if let Some(candidate) = candidate {
                let energy = self.weighted_energy(&candidate);
                if energy < self.energy {
                    trace!(step = self.step, energy, "Accepted descent step.");
                    self.points = candidate;
                    self.energy = energy;
                    self.step *= STEP_GROWTH;
                    return StepResult::Improved;
                }
            }
            self.step *= STEP_SHRINK;
        }
        StepResult::Collapsed
    }

    /// Steps until convergence or budget exhaustion.
    pub fn run(mut self, config: &DescentConfig, reporter: &ProgressReporter) -> DescentOutcome {
        let mut tracker = BudgetTracker::start(Budget {
            max_iterations: Some(config.max_iterations),
            time_limit: config.time_limit(),
            convergence: Some(config.convergence),
        });

        reporter.report(Progress::TaskStart {
            total_steps: config.max_iterations as u64,
        });
        let status = loop {
            match tracker.check() {
                BudgetCheck::Continue => {}
                BudgetCheck::Converged => break ConvergenceStatus::Converged,
                BudgetCheck::IterationCap => {
                    break ConvergenceStatus::NonConvergence(StopReason::IterationCap);
                }
                BudgetCheck::TimeLimit => {
                    break ConvergenceStatus::NonConvergence(StopReason::TimeLimit);
                }
            }
            if self.step() == StepResult::Collapsed {
                debug!(
                    iterations = tracker.iterations(),
                    step = self.step,
                    "Descent step collapsed."
                );
                break ConvergenceStatus::Converged;
            }
            tracker.record(self.energy);
            reporter.report(Progress::TaskIncrement);
            if tracker.iterations() % STATUS_INTERVAL == 0 {
                reporter.report(Progress::StatusUpdate {
                    text: format!("E = {:.6}", self.energy),
                });
            }
        };
        reporter.report(Progress::TaskFinish);

        let energy = self
            .model
            .energy_of(&self.points, &self.labels, self.num_groups, self.mode);
        DescentOutcome {
            directions: self.points,
            energy,
            iterations: tracker.iterations(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::direction::NORM_TOLERANCE;
    use crate::core::utils::geometry::random_sphere;
    use crate::engine::config::ConvergenceConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(max_iterations: usize) -> DescentConfig {
        DescentConfig {
            max_iterations,
            ..DescentConfig::default()
        }
    }

    /// Central difference of the energy along `axis` through the retraction.
    fn numeric_gradient(descent: &SphereDescent, i: usize, axis: usize) -> f64 {
        let h = 1e-6;
        let shifted = |delta: f64| {
            let mut points = descent.points().to_vec();
            let mut v = *points[i].as_vector();
            v[axis] += delta;
            points[i] = Direction::retract(v).unwrap();
            descent.weighted_energy(&points)
        };
        (shifted(h) - shifted(-h)) / (2.0 * h)
    }

    #[test]
    fn tangent_gradient_matches_finite_differences() {
        let model = EnergyModel::default();
        let points = random_sphere(5, &mut StdRng::seed_from_u64(3));
        let descent = SphereDescent::new(
            &model,
            SymmetryMode::Antipodal,
            points,
            vec![0; 5],
            1,
            &DescentConfig::default(),
        );
        let gradient = descent.gradient();
        let u = *descent.points()[2].as_vector();
        let tangent = project_to_tangent(&u, &gradient[2]);
        // Finite differences through normalization see only the tangent part.
        for axis in 0..3 {
            let numeric = numeric_gradient(&descent, 2, axis);
            assert!(
                (numeric - tangent[axis]).abs() < 1e-4 * tangent.norm().max(1.0),
                "axis {axis}: numeric {numeric}, analytic {}",
                tangent[axis]
            );
        }
    }

    #[test]
    fn step_never_increases_energy() {
        let model = EnergyModel::default();
        let points = random_sphere(12, &mut StdRng::seed_from_u64(9));
        let mut descent = SphereDescent::new(
            &model,
            SymmetryMode::Antipodal,
            points,
            vec![0; 12],
            1,
            &DescentConfig::default(),
        );
        let mut previous = descent.energy();
        for _ in 0..20 {
            if descent.step() == StepResult::Collapsed {
                break;
            }
            assert!(descent.energy() < previous);
            previous = descent.energy();
        }
    }

    #[test]
    fn run_keeps_points_on_the_sphere_and_lowers_energy() {
        let model = EnergyModel::default();
        let points = random_sphere(10, &mut StdRng::seed_from_u64(1));
        let initial = model
            .energy_of(&points, &[0; 10], 1, SymmetryMode::Antipodal)
            .total();
        let descent = SphereDescent::new(
            &model,
            SymmetryMode::Antipodal,
            points,
            vec![0; 10],
            1,
            &config(500),
        );
        let outcome = descent.run(&config(500), &ProgressReporter::new());
        assert!(outcome.energy.total() < initial);
        for d in &outcome.directions {
            assert!((d.as_vector().norm() - 1.0).abs() < NORM_TOLERANCE);
        }
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let model = EnergyModel::default();
        let points = random_sphere(20, &mut StdRng::seed_from_u64(4));
        let tight = DescentConfig {
            max_iterations: 2,
            convergence: ConvergenceConfig {
                energy_threshold: 0.0,
                patience_iterations: 1000,
            },
            ..DescentConfig::default()
        };
        let outcome = SphereDescent::new(
            &model,
            SymmetryMode::Antipodal,
            points,
            vec![0; 20],
            1,
            &tight,
        )
        .run(&tight, &ProgressReporter::new());
        assert_eq!(
            outcome.status,
            ConvergenceStatus::NonConvergence(StopReason::IterationCap)
        );
        assert_eq!(outcome.iterations, 2);
    }

    #[test]
    fn single_point_converges_immediately() {
        let model = EnergyModel::default();
        let points = random_sphere(1, &mut StdRng::seed_from_u64(0));
        let outcome = SphereDescent::new(
            &model,
            SymmetryMode::Antipodal,
            points,
            vec![0],
            1,
            &DescentConfig::default(),
        )
        .run(&DescentConfig::default(), &ProgressReporter::new());
        assert!(outcome.status.is_converged());
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.energy.total(), 0.0);
    }
}
