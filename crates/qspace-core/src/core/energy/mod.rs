//! # Energy Module
//!
//! The uniformity objective shared by generation, polarity, ordering and
//! subsampling. A point set is scored by summing an inverse-power repulsion
//! over all pairs, optionally symmetrized over antipodal images and weighted by
//! shell membership. Lower energy means a more even spread on the sphere.
//!
//! ## Key Components
//!
//! - [`potentials`] - Scalar kernels on squared chord lengths and their slopes
//! - [`term`] - Intra-shell / cross-shell energy breakdown
//! - [`model`] - [`model::EnergyModel`], the [`model::Configuration`] tagged union and the
//!   single `objective` entry point

pub mod model;
pub(crate) mod potentials;
pub mod term;
