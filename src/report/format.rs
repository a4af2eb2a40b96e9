//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::ProfileRun;
use crate::mixture::{CutPoint, MixtureCurve};
use crate::report::{SampleResidual, compute_residuals, max_abs_residual};

/// Format a single-profile fit: data summary, parameters, diagnostics, residuals.
pub fn format_fit_summary(run: &ProfileRun) -> String {
    let fit = &run.fit;
    let norm = &run.normalized;
    let mut out = String::new();

    out.push_str("=== distill - Distillation Profile Fit ===\n");
    out.push_str(&format!("Crude: {}\n", fit.crude()));
    if let Some(label) = fit.label() {
        out.push_str(&format!("Requested: {}\n", label.date));
    }
    if let Some(published) = norm.published {
        out.push_str(&format!("Published: {published}\n"));
    }
    let span = fit.span();
    out.push_str(&format!(
        "Samples: n={} | T=[{:.1}, {:.1}] °C | dropped {} of {} cells\n",
        norm.samples.len(),
        span.min,
        span.max,
        norm.dropped.len(),
        norm.cells_read,
    ));

    let q = fit.quality();
    out.push_str("\nGamma CDF model:\n");
    out.push_str(&format!("- shape    : {:.6}\n", fit.shape()));
    out.push_str(&format!("- location : {:.4} °C\n", fit.location()));
    out.push_str(&format!("- scale    : {:.4} °C\n", fit.scale()));
    out.push_str(&format!(
        "R²={:.6} SSE={:.3e} RMSE={:.4} iterations={} start={}\n",
        q.r_squared, q.sse, q.rmse, q.iterations, q.start_index
    ));

    let residuals = compute_residuals(fit);
    out.push('\n');
    out.push_str(&format_residual_table(&residuals));
    out.push_str(&format!("max |residual| = {:.4}\n", max_abs_residual(&residuals)));

    out
}

fn format_residual_table(rows: &[SampleResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>10} {:>10} {:>10} {:>10}\n", "temp_c", "observed", "fitted", "residual"));
    out.push_str(&format!("{:-<10} {:-<10} {:-<10} {:-<10}\n", "", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:>10.1} {:>10.4} {:>10.4} {:>10.4}\n",
            r.temperature, r.observed, r.fitted, r.residual
        ));
    }
    out
}

/// Format a blend: both components, their weights and the union temperature span.
pub fn format_blend_summary(curve: &MixtureCurve) -> String {
    let mut out = String::new();

    out.push_str("=== distill - Crude Blend ===\n");
    for (i, c) in curve.components().iter().enumerate() {
        out.push_str(&format!(
            "Crude {}: {:<8} date={:<10} volume={:<10} weight={:.4} R²={:.5}\n",
            i + 1,
            c.crude,
            c.date,
            fmt_num(c.volume),
            c.weight,
            c.r_squared
        ));
        out.push_str(&format!(
            "         shape={:.4} location={:.2} scale={:.3} | T=[{:.1}, {:.1}] °C\n",
            c.params.shape, c.params.location, c.params.scale, c.span.min, c.span.max
        ));
    }
    let domain = curve.domain();
    out.push_str(&format!("Blend domain: T=[{:.1}, {:.1}] °C\n", domain.min, domain.max));

    out
}

/// Format a cut table (fraction → temperature).
pub fn format_cut_table(cuts: &[CutPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>9} {:>12}\n", "evap_%", "temp_c"));
    out.push_str(&format!("{:-<9} {:-<12}\n", "", ""));
    for cut in cuts {
        let temp = cut
            .temperature
            .map(|t| format!("{t:.1}"))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!("{:>9.0} {:>12}\n", cut.fraction * 100.0, temp));
    }
    out
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e12 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_table_marks_unreached_cuts() {
        let cuts = [
            CutPoint {
                fraction: 0.05,
                temperature: Some(98.04),
            },
            CutPoint {
                fraction: 0.95,
                temperature: None,
            },
        ];
        let table = format_cut_table(&cuts);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].ends_with("98.0"), "{table}");
        assert!(lines[3].trim_start().starts_with("95"), "{table}");
        assert!(lines[3].ends_with("n/a"), "{table}");
    }

    #[test]
    fn volumes_print_without_trailing_zeros() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(2.5), "2.5");
    }
}
