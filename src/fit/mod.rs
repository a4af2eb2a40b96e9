//! Profile fitting.
//!
//! Responsibilities:
//!
//! - moment-matched multi-start initial guesses (`start`)
//! - Levenberg–Marquardt fit of the 3-parameter gamma CDF per start (`fitter`)
//! - choose the lowest-SSE converged start and report fit quality

pub mod fitter;
pub mod start;

pub use fitter::*;
pub use start::*;
