pub mod geometry;
pub mod statistics;
