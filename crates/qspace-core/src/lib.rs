//! # qspace Core Library
//!
//! Generation and refinement of diffusion MRI sampling schemes: sets of unit
//! directions, grouped into shells, that cover the sphere as uniformly as
//! possible.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Direction`, `Shell`, `Scheme`),
//!   the repulsion energy shared by every optimizer, sphere geometry, uniformity statistics
//!   and the CSV table format.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the projected gradient descent on the
//!   sphere, the discrete problem family (polarity, ordering, subsampling) and the two
//!   interchangeable solver strategies: an exact MILP formulation and simulated annealing.
//!
//! - **[`workflows`]: The Public API.** Complete procedures that validate input, choose a
//!   solver and return a new scheme: [`generate`], [`optimize_polarity`],
//!   [`optimize_ordering`], [`subsample`] and [`partition`].

pub mod core;
pub mod engine;
pub mod workflows;

pub use crate::core::energy::model::{Configuration, EnergyModel, PointSet, SymmetryMode};
pub use crate::core::energy::term::EnergyTerm;
pub use crate::core::models::direction::Direction;
pub use crate::core::models::error::ModelError;
pub use crate::core::models::scheme::Scheme;
pub use crate::core::models::shell::Shell;
pub use crate::engine::config::SolverMethod;
pub use crate::engine::continuous::{ConvergenceStatus, StopReason};
pub use crate::engine::error::EngineError;
pub use crate::engine::solvers::Notice;
pub use crate::engine::state::SolveStatus;
pub use crate::workflows::generate::{GenerationResult, generate, refine};
pub use crate::workflows::ordering::{OrderingResult, optimize_ordering};
pub use crate::workflows::polarity::{PolarityResult, optimize_polarity};
pub use crate::workflows::subsample::{SubsampleResult, partition, subsample};
