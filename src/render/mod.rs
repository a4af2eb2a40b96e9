//! Rendering sinks for fitted profiles.
//!
//! Fitting never depends on rendering: the pipeline hands a [`ProfilePlot`] to
//! an optional [`RenderSink`] and ignores what the sink does with it.

use crate::domain::{DistillationCurve, FitResult, Sample};

pub mod ascii;

pub use ascii::*;

/// Number of points used to draw a fitted curve.
pub const DEFAULT_CURVE_POINTS: usize = 200;

/// Observed samples plus a fitted curve, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePlot {
    pub title: String,
    pub observed: Vec<Sample>,
    /// `(temperature, fraction)` pairs along the fitted curve.
    pub curve: Vec<(f64, f64)>,
}

impl ProfilePlot {
    /// Plot of a fit: its samples and the curve from 0 °C to the hottest sample.
    pub fn for_fit(fit: &FitResult, title: impl Into<String>) -> Self {
        let t_max = fit.span().max.max(1.0);
        Self {
            title: title.into(),
            observed: fit.samples().to_vec(),
            curve: sample_curve(fit, 0.0, t_max, DEFAULT_CURVE_POINTS),
        }
    }

    /// Curve-only plot over `[t0, t1]`.
    pub fn for_curve<C: DistillationCurve + ?Sized>(curve: &C, title: impl Into<String>, t0: f64, t1: f64) -> Self {
        Self {
            title: title.into(),
            observed: Vec::new(),
            curve: sample_curve(curve, t0, t1, DEFAULT_CURVE_POINTS),
        }
    }
}

/// Receives plots for visual inspection.
pub trait RenderSink {
    fn render(&mut self, plot: &ProfilePlot);
}

impl<F> RenderSink for F
where
    F: FnMut(&ProfilePlot),
{
    fn render(&mut self, plot: &ProfilePlot) {
        self(plot)
    }
}

/// Evaluate `curve` at `n` evenly spaced temperatures over `[t0, t1]`.
pub fn sample_curve<C: DistillationCurve + ?Sized>(curve: &C, t0: f64, t1: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let t = t0 + u * (t1 - t0);
            (t, curve.fraction_at(t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GammaParams;

    #[test]
    fn sample_curve_spans_endpoints() {
        let curve = GammaParams::new(2.0, 0.0, 10.0).unwrap();
        let pts = sample_curve(&curve, 0.0, 100.0, 11);
        assert_eq!(pts.len(), 11);
        assert_eq!(pts[0], (0.0, 0.0));
        assert_eq!(pts[10].0, 100.0);
    }

    #[test]
    fn closures_are_sinks() {
        let mut titles = Vec::new();
        {
            let mut sink = |p: &ProfilePlot| titles.push(p.title.clone());
            let plot = ProfilePlot {
                title: "MGS".to_string(),
                observed: vec![],
                curve: vec![],
            };
            sink.render(&plot);
        }
        assert_eq!(titles, vec!["MGS".to_string()]);
    }
}
