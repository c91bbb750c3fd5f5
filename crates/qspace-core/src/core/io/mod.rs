//! Reading and writing schemes.
//!
//! Every scheme round-trips through the plain numeric table; this module
//! serializes that table as CSV with one `x,y,z,shell,strength` row per
//! direction.

pub mod csv;
pub mod traits;
