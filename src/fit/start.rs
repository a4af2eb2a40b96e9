//! Multi-start initial guesses for the gamma fit.
//!
//! The samples describe an empirical CDF; its increments give a discrete
//! distribution of boiling temperatures with mean `μ` and standard deviation
//! `σ`. For each candidate shape `k` we moment-match the other two parameters:
//!
//! - `scale = σ / √k`
//! - `location = μ - k · scale = μ - √k · σ`
//!
//! so every start has the right centre and spread and only differs in skew.

use crate::domain::{GammaParams, Sample};

/// Default shape grid (low skew ↔ high shape).
pub const DEFAULT_START_SHAPES: &[f64] = &[0.75, 1.5, 3.0, 6.0, 12.0, 24.0];

/// Empirical mean and standard deviation of the distribution implied by the samples.
pub fn empirical_moments(samples: &[Sample]) -> (f64, f64) {
    let (t_min, t_max) = samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.temperature), hi.max(s.temperature))
    });
    let span = (t_max - t_min).max(0.0);

    let mut mass = 0.0;
    let mut m1 = 0.0;
    let mut m2 = 0.0;
    for w in samples.windows(2) {
        let d_f = w[1].fraction - w[0].fraction;
        if d_f <= 0.0 {
            continue;
        }
        let width = w[1].temperature - w[0].temperature;
        let mid = 0.5 * (w[0].temperature + w[1].temperature);
        mass += d_f;
        m1 += d_f * mid;
        // Mass spread uniformly across the interval.
        m2 += d_f * (mid * mid + width * width / 12.0);
    }

    let floor = (span * 0.01).max(1e-6);
    if mass <= 0.0 {
        let mean = samples.iter().map(|s| s.temperature).sum::<f64>() / samples.len().max(1) as f64;
        return (mean, (span / 4.0).max(floor));
    }

    let mean = m1 / mass;
    let var = (m2 / mass - mean * mean).max(0.0);
    (mean, var.sqrt().max(floor))
}

/// Moment-matched starting parameters, one per shape in `shapes`.
pub fn initial_guesses(samples: &[Sample], shapes: &[f64]) -> Vec<GammaParams> {
    let (mean, sd) = empirical_moments(samples);
    shapes
        .iter()
        .filter_map(|&k| {
            let scale = sd / k.sqrt();
            GammaParams::new(k, mean - k * scale, scale)
        })
        .collect()
}
