//! Gamma CDF profile fitting.
//!
//! Given cleaned samples `(T_i, F_i)` we minimize
//!
//! ```text
//! Σ (CDF_gamma(T_i; shape, location, scale) - F_i)²
//! ```
//!
//! over `θ = (ln k, μ, ln σ)`: log shape, distribution mean and log standard
//! deviation. Then `scale = σ/√k` and `location = μ - √k·σ`. Centre and spread
//! are pinned by the data whatever the skew, so near-symmetric profiles
//! (which push `k` towards infinity) trace a flat valley in `ln k` instead of
//! a curved ridge through `(location, scale)`. `ln k` is boxed by
//! [`FitterConfig::shape_bounds`].
//!
//! Each moment-matched start (see [`crate::fit::start`]) is optimized
//! independently; the converged start with the lowest SSE wins, ties broken by
//! start order so results are deterministic.

use log::debug;

use crate::domain::{FitQuality, FitResult, GammaParams, Sample, TemperatureSpan};
use crate::error::DistillError;
use crate::fit::start::{DEFAULT_START_SHAPES, initial_guesses};
use crate::math::{LmConfig, LmStop, levenberg_marquardt_bounded};
use crate::normalize::MIN_SAMPLES;

/// Default `(min, max)` gamma shape. Above the maximum the CDF is a normal
/// curve to well within assay precision.
pub const DEFAULT_SHAPE_BOUNDS: (f64, f64) = (0.05, 1e3);

/// Fitter configuration: optimizer budget plus the multi-start grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FitterConfig {
    pub solver: LmConfig,
    /// Gamma shapes used to seed the multi-start search.
    pub start_shapes: Vec<f64>,
    /// Inclusive `(min, max)` range the fitted shape is kept in.
    pub shape_bounds: (f64, f64),
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            solver: LmConfig::default(),
            start_shapes: DEFAULT_START_SHAPES.to_vec(),
            shape_bounds: DEFAULT_SHAPE_BOUNDS,
        }
    }
}

impl FitterConfig {
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.solver.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_start_shapes(mut self, shapes: Vec<f64>) -> Self {
        self.start_shapes = shapes;
        self
    }

    #[must_use]
    pub fn with_shape_bounds(mut self, min: f64, max: f64) -> Self {
        self.shape_bounds = (min, max);
        self
    }
}

/// Gamma parameters from `θ = (ln k, μ, ln σ)`.
fn params_from_theta(theta: &[f64]) -> Option<GammaParams> {
    let shape = theta[0].exp();
    let sd = theta[2].exp();
    let root = shape.sqrt();
    GammaParams::new(shape, theta[1] - root * sd, sd / root)
}

/// `θ = (ln k, μ, ln σ)` of a gamma distribution.
fn theta_from_params(params: &GammaParams) -> [f64; 3] {
    let mean = params.location + params.shape * params.scale;
    let sd = params.shape.sqrt() * params.scale;
    [params.shape.ln(), mean, sd.ln()]
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: GammaParams,
    sse: f64,
    iterations: usize,
}

/// Fits the gamma CDF model to a single crude's samples.
#[derive(Debug, Clone, Default)]
pub struct ProfileFitter {
    config: FitterConfig,
}

impl ProfileFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitterConfig {
        &self.config
    }

    /// Fit the model and report parameters plus goodness of fit.
    pub fn fit(&self, samples: &[Sample]) -> Result<FitResult, DistillError> {
        let mut samples: Vec<Sample> = samples
            .iter()
            .copied()
            .filter(|s| s.temperature.is_finite() && s.fraction.is_finite())
            .collect();
        if samples.len() < MIN_SAMPLES {
            return Err(DistillError::InsufficientData {
                found: samples.len(),
                required: MIN_SAMPLES,
            });
        }
        samples.sort_by(|a, b| a.temperature.total_cmp(&b.temperature));

        let (min_shape, max_shape) = self.config.shape_bounds;
        if !(min_shape > 0.0 && min_shape <= max_shape) {
            return Err(DistillError::FitDidNotConverge {
                iterations: 0,
                reason: format!("invalid shape bounds ({min_shape}, {max_shape})"),
            });
        }
        let bounds = [(min_shape.ln(), max_shape.ln())];

        let starts = initial_guesses(&samples, &self.config.start_shapes);
        if starts.is_empty() {
            return Err(DistillError::FitDidNotConverge {
                iterations: 0,
                reason: "no valid starting point (check start shapes)".to_string(),
            });
        }

        let residuals = |theta: &[f64]| -> Option<Vec<f64>> {
            let params = params_from_theta(theta)?;
            Some(
                samples
                    .iter()
                    .map(|s| params.cdf(s.temperature) - s.fraction)
                    .collect(),
            )
        };

        let mut candidates = Vec::with_capacity(starts.len());
        let mut max_iterations_used = 0;
        let mut last_stop = LmStop::InvalidStart;

        for (idx, start) in starts.iter().enumerate() {
            let theta0 = theta_from_params(start);
            let outcome = levenberg_marquardt_bounded(&residuals, &theta0, &bounds, &self.config.solver);
            max_iterations_used = max_iterations_used.max(outcome.iterations);
            last_stop = outcome.stop;
            debug!(
                "start #{idx} shape0={:.3}: stop={:?} iterations={} sse={:.6e}",
                start.shape, outcome.stop, outcome.iterations, outcome.sse
            );

            if !outcome.converged() {
                continue;
            }
            let Some(params) = params_from_theta(&outcome.params) else {
                continue;
            };
            if !outcome.sse.is_finite() {
                continue;
            }
            candidates.push(Candidate {
                idx,
                params,
                sse: outcome.sse,
                iterations: outcome.iterations,
            });
        }

        // Deterministic selection: pick the minimum SSE; break ties by start index.
        let Some(best) = candidates
            .iter()
            .min_by(|a, b| a.sse.total_cmp(&b.sse).then(a.idx.cmp(&b.idx)))
        else {
            return Err(DistillError::FitDidNotConverge {
                iterations: max_iterations_used,
                reason: format!(
                    "none of {} starts converged within {} iterations (last stop: {last_stop:?})",
                    starts.len(),
                    self.config.solver.max_iterations
                ),
            });
        };

        let quality = fit_quality(&samples, &best.params, best.sse, best.iterations, best.idx);
        debug!(
            "fitted gamma profile: shape={:.4} location={:.3} scale={:.4} R²={:.5}",
            best.params.shape, best.params.location, best.params.scale, quality.r_squared
        );

        let span = TemperatureSpan::of_samples(&samples).ok_or_else(|| DistillError::InsufficientData {
            found: 0,
            required: MIN_SAMPLES,
        })?;
        Ok(FitResult::new(best.params, quality, samples, span))
    }
}

/// Fit with the default configuration.
pub fn fit(samples: &[Sample]) -> Result<FitResult, DistillError> {
    ProfileFitter::new().fit(samples)
}

/// Coefficient of determination and error summaries over the fitted samples.
pub fn fit_quality(
    samples: &[Sample],
    params: &GammaParams,
    sse: f64,
    iterations: usize,
    start_index: usize,
) -> FitQuality {
    let n = samples.len();
    let mean = samples.iter().map(|s| s.fraction).sum::<f64>() / n as f64;
    let ss_tot: f64 = samples.iter().map(|s| (s.fraction - mean).powi(2)).sum();
    let ss_res: f64 = samples
        .iter()
        .map(|s| (s.fraction - params.cdf(s.temperature)).powi(2))
        .sum();

    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else if ss_res <= 1e-14 {
        1.0
    } else {
        0.0
    };

    FitQuality {
        r_squared,
        sse,
        rmse: (sse / n as f64).sqrt(),
        n_samples: n,
        iterations,
        start_index,
    }
}
