//! Distillation cut table: temperature at which a curve reaches each fraction.

use serde::Serialize;

use crate::domain::DistillationCurve;
use crate::math::bisect;

/// Standard reporting cuts: 5 %, 10 % … 90 %, 95 %.
pub const STANDARD_CUTS: [f64; 11] = [0.05, 0.10, 0.20, 0.30, 0.40, 0.50, 0.60, 0.70, 0.80, 0.90, 0.95];

const TEMPERATURE_TOL: f64 = 1e-6;
const MAX_BISECTIONS: usize = 200;
const MAX_EXPANSIONS: usize = 60;

/// One row of a cut table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CutPoint {
    pub fraction: f64,
    /// `None` when the curve never reaches `fraction`.
    pub temperature: Option<f64>,
}

/// Temperatures at which `curve` reaches each of `cuts`.
///
/// The search starts at the curve's support start and expands upward from
/// `hint_max` (typically the highest observed temperature) until the cut is
/// bracketed.
pub fn cut_temperatures<C: DistillationCurve + ?Sized>(curve: &C, cuts: &[f64], hint_max: f64) -> Vec<CutPoint> {
    let lo = curve.support_start();
    cuts.iter()
        .map(|&fraction| CutPoint {
            fraction,
            temperature: temperature_at(curve, fraction, lo, hint_max),
        })
        .collect()
}

/// Invert a monotone curve at `fraction`.
pub fn temperature_at<C: DistillationCurve + ?Sized>(curve: &C, fraction: f64, lo: f64, hint_max: f64) -> Option<f64> {
    if !(lo.is_finite() && (0.0..=1.0).contains(&fraction)) {
        return None;
    }
    let mut hi = if hint_max.is_finite() && hint_max > lo { hint_max } else { lo + 1.0 };
    let mut expansions = 0;
    while curve.fraction_at(hi) < fraction {
        if expansions == MAX_EXPANSIONS {
            return None;
        }
        hi = lo + 2.0 * (hi - lo);
        expansions += 1;
    }

    bisect(
        |t| curve.fraction_at(t) - fraction,
        lo,
        hi,
        TEMPERATURE_TOL,
        MAX_BISECTIONS,
    )
    .map(|b| b.root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GammaParams;

    #[test]
    fn standard_table_has_eleven_rows() {
        let curve = GammaParams::new(3.0, 30.0, 60.0).unwrap();
        let table = cut_temperatures(&curve, &STANDARD_CUTS, 400.0);
        assert_eq!(table.len(), 11);
        assert!(table.iter().all(|c| c.temperature.is_some()));
        let temps: Vec<f64> = table.iter().filter_map(|c| c.temperature).collect();
        assert!(temps.windows(2).all(|w| w[0] < w[1]), "{temps:?}");
    }

    #[test]
    fn inversion_round_trips_through_the_curve() {
        let curve = GammaParams::new(1.0, 100.0, 50.0).unwrap();
        // Exponential: F(T) = 1 - exp(-(T-100)/50) → T50 = 100 + 50 ln 2.
        let t50 = temperature_at(&curve, 0.5, 100.0, 120.0).unwrap();
        assert!((t50 - (100.0 + 50.0 * 2f64.ln())).abs() < 1e-5, "{t50}");
    }

    #[test]
    fn unreachable_fraction_is_none() {
        let curve = GammaParams::new(1.0, 0.0, 10.0).unwrap();
        assert!(temperature_at(&curve, 1.5, 0.0, 10.0).is_none());
    }
}
