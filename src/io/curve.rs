//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fitted profile or blend:
//! - one gamma component per crude (label, weight, parameters, fit quality)
//! - a precomputed grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveComponent, CurveFile, CurveGrid, CurveKind, DistillationCurve, FitResult};
use crate::error::AppError;
use crate::mixture::MixtureCurve;
use crate::render::sample_curve;

/// Number of grid points stored in a curve file.
pub const CURVE_GRID_POINTS: usize = 201;

const TOOL_NAME: &str = "distill";

/// Curve file for a single fitted profile.
pub fn profile_curve_file(fit: &FitResult) -> CurveFile {
    let component = CurveComponent {
        crude: fit.crude().to_string(),
        date: fit.label().map(|l| l.date.to_string()).unwrap_or_default(),
        weight: 1.0,
        params: fit.params(),
        quality: Some(fit.quality().clone()),
    };
    CurveFile {
        tool: TOOL_NAME.to_string(),
        kind: CurveKind::Profile,
        components: vec![component],
        grid: build_grid(fit, 0.0, fit.span().max, CURVE_GRID_POINTS),
    }
}

/// Curve file for a two-crude blend.
pub fn mixture_curve_file(curve: &MixtureCurve) -> CurveFile {
    let components = curve
        .components()
        .iter()
        .map(|c| CurveComponent {
            crude: c.crude.clone(),
            date: c.date.clone(),
            weight: c.weight,
            params: c.params,
            quality: None,
        })
        .collect();
    CurveFile {
        tool: TOOL_NAME.to_string(),
        kind: CurveKind::Mixture,
        components,
        grid: build_grid(curve, 0.0, curve.domain().max, CURVE_GRID_POINTS),
    }
}

/// Write a single-profile curve JSON file.
pub fn write_profile_curve_json(path: &Path, fit: &FitResult) -> Result<(), AppError> {
    write_curve_json(path, &profile_curve_file(fit))
}

/// Write a blend curve JSON file.
pub fn write_mixture_curve_json(path: &Path, curve: &MixtureCurve) -> Result<(), AppError> {
    write_curve_json(path, &mixture_curve_file(curve))
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    if curve.components.is_empty() {
        return Err(AppError::new(2, "Invalid curve JSON: no components."));
    }
    if curve.grid.temperature_c.len() != curve.grid.fraction.len() {
        return Err(AppError::new(2, "Invalid curve JSON: grid columns differ in length."));
    }
    Ok(curve)
}

fn build_grid<C: DistillationCurve + ?Sized>(curve: &C, t_min: f64, t_max: f64, n: usize) -> CurveGrid {
    let mut t0 = t_min;
    let mut t1 = t_max;
    if !(t0.is_finite() && t1.is_finite()) || t1 <= t0 {
        t0 = 0.0;
        t1 = 600.0;
    }
    let (temperature_c, fraction) = sample_curve(curve, t0, t1, n).into_iter().unzip();
    CurveGrid { temperature_c, fraction }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssayDate, FitQuality, GammaParams, Sample};

    fn fit() -> FitResult {
        let params = GammaParams::new(3.0, 100.0, 50.0).unwrap();
        let samples: Vec<Sample> = [150.0, 250.0, 350.0, 450.0]
            .iter()
            .map(|&t| Sample::new(t, params.cdf(t)))
            .collect();
        let quality = FitQuality {
            r_squared: 1.0,
            sse: 0.0,
            rmse: 0.0,
            n_samples: samples.len(),
            iterations: 4,
            start_index: 2,
        };
        let span = crate::domain::TemperatureSpan::of_samples(&samples).unwrap();
        FitResult::new(params, quality, samples, span).labelled("MGS", &AssayDate::Recent)
    }

    #[test]
    fn profile_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mgs.json");
        let fit = fit();
        write_profile_curve_json(&path, &fit).unwrap();

        let curve = read_curve_json(&path).unwrap();
        assert_eq!(curve.kind, CurveKind::Profile);
        assert_eq!(curve.components[0].crude, "MGS");
        assert_eq!(curve.components[0].date, "recent");
        assert_eq!(curve.grid.temperature_c.len(), CURVE_GRID_POINTS);
        assert_eq!(curve.grid.temperature_c[0], 0.0);
        assert_eq!(*curve.grid.temperature_c.last().unwrap(), 450.0);
        // The stored grid agrees with the stored parameters.
        for (t, f) in curve.grid.temperature_c.iter().zip(&curve.grid.fraction) {
            assert!((curve.fraction_at(*t) - f).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_curve_without_components() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(
            &path,
            r#"{"tool":"distill","kind":"mixture","components":[],"grid":{"temperature_c":[],"fraction":[]}}"#,
        )
        .unwrap();
        assert_eq!(read_curve_json(&path).unwrap_err().exit_code(), 2);
    }
}
