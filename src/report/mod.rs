//! Reporting utilities: per-sample residuals and formatted terminal output.

use crate::domain::{DistillationCurve, FitResult};

pub mod format;

pub use format::*;

/// Observed vs fitted fraction at one assay temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleResidual {
    pub temperature: f64,
    pub observed: f64,
    pub fitted: f64,
    /// `observed - fitted`.
    pub residual: f64,
}

/// Compute fitted values and residuals for each sample a fit was made from.
pub fn compute_residuals(fit: &FitResult) -> Vec<SampleResidual> {
    fit.samples()
        .iter()
        .map(|s| {
            let fitted = fit.fraction_at(s.temperature);
            SampleResidual {
                temperature: s.temperature,
                observed: s.fraction,
                fitted,
                residual: s.fraction - fitted,
            }
        })
        .collect()
}

/// Largest absolute residual (0 for an empty list).
pub fn max_abs_residual(residuals: &[SampleResidual]) -> f64 {
    residuals.iter().map(|r| r.residual.abs()).fold(0.0, f64::max)
}
