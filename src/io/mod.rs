//! Input/output helpers.
//!
//! - curve JSON read/write (`curve`)
//! - cut table CSV export (`export`)

pub mod curve;
pub mod export;

pub use curve::*;
pub use export::*;
