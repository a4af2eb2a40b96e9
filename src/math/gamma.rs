//! Gamma CDF evaluation for the 3-parameter (shifted) gamma model.

use statrs::distribution::{ContinuousCDF, Gamma};

/// Evaluate `F(t) = P(shape, (t - location) / scale)`.
///
/// Returns `0` for `t <= location`, `1` for `t = +inf`, and `NaN` when the
/// parameters are outside the family (`shape <= 0`, `scale <= 0`, non-finite).
pub fn gamma_cdf(shape: f64, location: f64, scale: f64, t: f64) -> f64 {
    if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0 && location.is_finite()) {
        return f64::NAN;
    }
    if t.is_nan() {
        return f64::NAN;
    }
    let x = t - location;
    if x <= 0.0 {
        return 0.0;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    match Gamma::new(shape, 1.0 / scale) {
        Ok(dist) => dist.cdf(x).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}
