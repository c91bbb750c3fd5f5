use std::fmt;
use std::time::Duration;

/// Quality guarantee attached to a discrete solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven optimal by the exact backend.
    Optimal,
    /// The exact backend ran out of time; the incumbent was returned.
    TimeLimit,
    /// Local search or segmented exact solve; no optimality proof.
    BestEffort,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::TimeLimit => write!(f, "time limit reached"),
            SolveStatus::BestEffort => write!(f, "best effort"),
        }
    }
}

/// What a discrete solver hands back for one problem.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome<T> {
    pub solution: T,
    pub objective: f64,
    pub status: SolveStatus,
    /// Accepted plus rejected local-search moves, including those spent on
    /// the exact solver's incumbent.
    pub moves: u64,
    pub elapsed: Duration,
}

impl<T> SolveOutcome<T> {
    /// Keeps whichever of two outcomes has the lower objective, preferring
    /// `self` on ties.
    pub fn better_of(self, other: Self) -> Self {
        if other.objective < self.objective {
            other
        } else {
            self
        }
    }
}
