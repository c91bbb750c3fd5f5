//! # Core Models Module
//!
//! Data structures describing a direction scheme: unit [`direction::Direction`]s grouped
//! into [`shell::Shell`]s that share an acquisition strength, and the [`scheme::Scheme`]
//! that owns them.
//!
//! ## Key Components
//!
//! - [`direction`] - Unit vectors with the norm invariant enforced at construction
//! - [`shell`] - Ordered direction groups with an optional b-value
//! - [`scheme`] - The full ordered shell sequence, flat indexing and validation
//! - [`table`] - The plain numeric table exchanged with the I/O layer
//! - [`error`] - Validation errors raised while building the models

pub mod direction;
pub mod error;
pub mod scheme;
pub mod shell;
pub mod table;
