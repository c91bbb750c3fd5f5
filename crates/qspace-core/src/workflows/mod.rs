//! # Workflows Module
//!
//! The public entry points of the library. Each workflow validates its input,
//! builds the optimization problem, picks a solver strategy and assembles a
//! new [`Scheme`](crate::core::models::scheme::Scheme) from the result. Input
//! schemes are never modified.
//!
//! - **Generation** ([`generate`]) - Uniform directions from shell counts, or refinement of a given scheme
//! - **Polarity** ([`polarity`]) - Per-direction sign flips minimizing the polar energy
//! - **Ordering** ([`ordering`]) - Acquisition orders whose every prefix is uniform
//! - **Subsampling** ([`subsample`]) - Uniform subsets per shell and partitions of one shell
//!
//! Every workflow has a convenience function with default parameters and a
//! `run` form taking a full configuration and a progress reporter.

pub mod generate;
pub mod ordering;
pub mod polarity;
pub mod subsample;

use crate::core::models::direction::Direction;
use crate::core::models::scheme::Scheme;
use crate::engine::config::DiscreteConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::solvers::{DiscreteSolver, SolveContext};
use crate::engine::state::SolveStatus;

/// Checks optional shell strengths against the number of shells.
///
/// Strengths must be finite, non-negative and pairwise distinct.
pub(crate) fn validate_strengths(
    strengths: Option<&[f64]>,
    num_shells: usize,
) -> Result<Vec<Option<f64>>, EngineError> {
    let Some(strengths) = strengths else {
        return Ok(vec![None; num_shells]);
    };
    if strengths.len() != num_shells {
        return Err(EngineError::InvalidShellSpec(format!(
            "{} strength(s) given for {} shell(s)",
            strengths.len(),
            num_shells
        )));
    }
    for (s, &value) in strengths.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::InvalidShellSpec(format!(
                "shell {s} has invalid strength {value}"
            )));
        }
        if let Some(first) = strengths[..s].iter().position(|&other| other == value) {
            return Err(EngineError::InvalidShellSpec(format!(
                "shells {first} and {s} share the strength {value}"
            )));
        }
    }
    Ok(strengths.iter().copied().map(Some).collect())
}

/// Splits flat-ordered directions back into shells of `template`.
pub(crate) fn regroup(template: &Scheme, directions: &[Direction]) -> Result<Scheme, EngineError> {
    let mut groups = Vec::with_capacity(template.num_shells());
    let mut rest = directions;
    for count in template.shell_counts() {
        if rest.len() < count {
            return Err(EngineError::InternalInconsistency {
                phase: "regroup",
                reason: format!("{} directions left for a shell of {count}", rest.len()),
            });
        }
        let (head, tail) = rest.split_at(count);
        groups.push(head.to_vec());
        rest = tail;
    }
    Ok(Scheme::from_groups(&template.strengths(), groups)?)
}

pub(crate) fn solve_context<'a>(
    config: &DiscreteConfig,
    solver: &dyn DiscreteSolver,
    reporter: &'a ProgressReporter<'a>,
) -> SolveContext<'a> {
    let time_limit = if solver.proves_optimality() {
        config.exact_time_limit()
    } else {
        config.time_limit()
    };
    SolveContext {
        time_limit,
        seed: config.seed,
        annealing: config.annealing,
        segment_len: config.segment_len,
        reporter,
    }
}

/// Status reported when a workflow returns its input instead of the solver's
/// answer. An input no worse than a proven optimum is optimal too; otherwise
/// nothing is claimed about it.
pub(crate) fn kept_input_status(solver_status: SolveStatus) -> SolveStatus {
    match solver_status {
        SolveStatus::Optimal => SolveStatus::Optimal,
        SolveStatus::TimeLimit | SolveStatus::BestEffort => SolveStatus::BestEffort,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::fibonacci_sphere;

    #[test]
    fn validate_strengths_without_values_leaves_shells_unlabeled() {
        assert_eq!(validate_strengths(None, 2).unwrap(), vec![None, None]);
    }

    #[test]
    fn validate_strengths_rejects_length_mismatch() {
        assert!(matches!(
            validate_strengths(Some(&[1000.0]), 2),
            Err(EngineError::InvalidShellSpec(_))
        ));
    }

    #[test]
    fn validate_strengths_rejects_negative_and_duplicate_values() {
        assert!(validate_strengths(Some(&[-1.0, 2.0]), 2).is_err());
        assert!(validate_strengths(Some(&[f64::NAN]), 1).is_err());
        assert!(validate_strengths(Some(&[1000.0, 1000.0]), 2).is_err());
    }

    #[test]
    fn regroup_follows_template_shell_sizes() {
        let template = Scheme::from_groups(
            &[Some(1000.0), Some(2000.0)],
            vec![fibonacci_sphere(2, 0.0), fibonacci_sphere(3, 0.0)],
        )
        .unwrap();
        let flat = fibonacci_sphere(5, 1.0);
        let scheme = regroup(&template, &flat).unwrap();
        assert_eq!(scheme.shell_counts(), vec![2, 3]);
        assert_eq!(scheme.strengths(), vec![Some(1000.0), Some(2000.0)]);
        assert_eq!(scheme.directions(), flat);
    }

    #[test]
    fn kept_input_never_inherits_a_time_limit_status() {
        assert_eq!(kept_input_status(SolveStatus::TimeLimit), SolveStatus::BestEffort);
        assert_eq!(kept_input_status(SolveStatus::BestEffort), SolveStatus::BestEffort);
        assert_eq!(kept_input_status(SolveStatus::Optimal), SolveStatus::Optimal);
    }
}
