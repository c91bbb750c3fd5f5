use super::config::ConvergenceConfig;
use std::time::{Duration, Instant};

/// Limits checked between the steps of an iterative optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Budget {
    pub max_iterations: Option<usize>,
    pub time_limit: Option<Duration>,
    pub convergence: Option<ConvergenceConfig>,
}

/// Verdict of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCheck {
    Continue,
    Converged,
    IterationCap,
    TimeLimit,
}

#[derive(Debug, Clone)]
pub struct BudgetTracker {
    budget: Budget,
    start: Instant,
    iterations: usize,
    stalled: usize,
    last_energy: Option<f64>,
}

impl BudgetTracker {
    pub fn start(budget: Budget) -> Self {
        Self {
            budget,
            start: Instant::now(),
            iterations: 0,
            stalled: 0,
            last_energy: None,
        }
    }

    /// Records a completed step and the objective it reached.
    ///
    /// A step counts as stalled when its relative improvement over the
    /// previous step falls below the convergence threshold.
    pub fn record(&mut self, energy: f64) {
        self.iterations += 1;
        if let (Some(previous), Some(convergence)) = (self.last_energy, self.budget.convergence) {
            let improvement = (previous - energy) / previous.abs().max(f64::MIN_POSITIVE);
            if improvement < convergence.energy_threshold {
                self.stalled += 1;
            } else {
                self.stalled = 0;
            }
        }
        self.last_energy = Some(energy);
    }

    pub fn check(&self) -> BudgetCheck {
        if let Some(convergence) = self.budget.convergence {
            if self.stalled >= convergence.patience_iterations {
                return BudgetCheck::Converged;
            }
        }
        if let Some(limit) = self.budget.time_limit {
            if self.start.elapsed() >= limit {
                return BudgetCheck::TimeLimit;
            }
        }
        if let Some(cap) = self.budget.max_iterations {
            if self.iterations >= cap {
                return BudgetCheck::IterationCap;
            }
        }
        BudgetCheck::Continue
    }

    pub fn is_time_exhausted(&self) -> bool {
        self.budget
            .time_limit
            .is_some_and(|limit| self.start.elapsed() >= limit)
    }

    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
