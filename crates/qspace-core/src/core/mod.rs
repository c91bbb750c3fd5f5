//! # Core Module
//!
//! Stateless building blocks: the scheme data model, the uniformity energy
//! shared by every optimizer, sphere geometry helpers and the CSV table I/O.
//!
//! ## Architecture
//!
//! - **Scheme Representation** ([`models`]) - Directions, shells, schemes and the numeric table
//! - **Uniformity Objective** ([`energy`]) - Pair kernels, shell weighting and the discrete objective
//! - **File I/O** ([`io`]) - CSV reading and writing through `io::Read` / `io::Write`
//! - **Utilities** ([`utils`]) - Sphere sampling and uniformity statistics

pub mod energy;
pub mod io;
pub mod models;
pub mod utils;
