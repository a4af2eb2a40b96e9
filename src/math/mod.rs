//! Numerical building blocks: gamma CDF, least squares, Levenberg–Marquardt, bisection.

pub mod gamma;
pub mod lm;
pub mod ols;
pub mod root;

pub use gamma::*;
pub use lm::*;
pub use ols::*;
pub use root::*;
