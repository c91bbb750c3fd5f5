//! # Engine Module
//!
//! Optimizers that turn the energy model into schemes: the continuous descent
//! on the sphere and the discrete solvers for polarity, ordering and
//! subsampling.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tunable parameters with builders and TOML loading
//! - **Budgets** ([`budget`]) - Iteration, wall-clock and stall limits shared by iterative loops
//! - **Continuous descent** ([`continuous`]) - Projected gradient descent over the sphere
//! - **Discrete problems** ([`problems`]) - Cached pair energies and O(N) move deltas
//! - **Solvers** ([`solvers`]) - Exact MILP and simulated-annealing strategies
//! - **State** ([`state`]) - Solve outcomes and their quality status
//! - **Progress** ([`progress`]) - Callback-based progress events
//! - **Errors** ([`error`]) - The engine error taxonomy

pub mod budget;
pub(crate) mod cache;
pub mod config;
pub mod continuous;
pub mod error;
pub mod problems;
pub mod progress;
pub mod solvers;
pub mod state;
pub(crate) mod utils;
