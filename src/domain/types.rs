//! Shared domain types.
//!
//! Samples, fitted parameters and curve files are kept small and serializable
//! so they can be:
//!
//! - used in-memory during fitting and blending
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DistillError;
use crate::math::gamma_cdf;

/// Which published assay to request from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AssayDate {
    /// The most recently published assay.
    #[default]
    Recent,
    /// The assay published on a specific day.
    On(NaiveDate),
}

impl AssayDate {
    /// Query-string form used by the assay source (`recent` or `YYYY-MM-DD`).
    pub fn as_query(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AssayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssayDate::Recent => write!(f, "recent"),
            AssayDate::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for AssayDate {
    type Err = DistillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("recent") {
            return Ok(AssayDate::Recent);
        }
        // chrono accepts single-digit fields; the source does not.
        let well_formed = trimmed.len() == 10
            && trimmed
                .char_indices()
                .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
        if !well_formed {
            return Err(DistillError::InvalidDate { input: s.to_string() });
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(AssayDate::On)
            .map_err(|_| DistillError::InvalidDate { input: s.to_string() })
    }
}

/// Validate and normalize a crude acronym (e.g. `mgs` → `MGS`).
pub fn parse_crude_code(raw: &str) -> Result<String, DistillError> {
    let code = raw.trim();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DistillError::InvalidCrudeCode { input: raw.to_string() });
    }
    Ok(code.to_ascii_uppercase())
}

/// Which crude of a two-crude blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendSide {
    First,
    Second,
}

impl fmt::Display for BlendSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendSide::First => write!(f, "1"),
            BlendSide::Second => write!(f, "2"),
        }
    }
}

/// One point of a distillation profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Temperature (°C).
    pub temperature: f64,
    /// Cumulative fraction evaporated, in `[0, 1]`.
    pub fraction: f64,
}

impl Sample {
    pub fn new(temperature: f64, fraction: f64) -> Self {
        Self { temperature, fraction }
    }
}

/// Closed temperature interval covered by observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSpan {
    pub min: f64,
    pub max: f64,
}

impl TemperatureSpan {
    /// Span of a non-empty sample set.
    pub fn of_samples(samples: &[Sample]) -> Option<Self> {
        let mut iter = samples.iter().map(|s| s.temperature).filter(|t| t.is_finite());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some(Self { min, max })
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }
}

/// Anything that maps temperature to cumulative fraction evaporated.
pub trait DistillationCurve {
    fn fraction_at(&self, temperature: f64) -> f64;

    /// Temperature at or below which nothing has evaporated.
    fn support_start(&self) -> f64;
}

/// Parameters of the 3-parameter gamma CDF model.
///
/// `F(T) = P(shape, (T - location) / scale)` where `P` is the regularized lower
/// incomplete gamma function, and `F(T) = 0` for `T <= location`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    pub shape: f64,
    pub location: f64,
    pub scale: f64,
}

impl GammaParams {
    /// Returns `None` unless shape and scale are finite and strictly positive.
    pub fn new(shape: f64, location: f64, scale: f64) -> Option<Self> {
        let valid = shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0 && location.is_finite();
        valid.then_some(Self { shape, location, scale })
    }

    pub fn cdf(&self, temperature: f64) -> f64 {
        gamma_cdf(self.shape, self.location, self.scale, temperature)
    }
}

impl DistillationCurve for GammaParams {
    fn fraction_at(&self, temperature: f64) -> f64 {
        self.cdf(temperature)
    }

    fn support_start(&self) -> f64 {
        self.location
    }
}

/// Fit-quality diagnostics reported alongside the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    /// Coefficient of determination over the fitted samples, in `[0, 1]`.
    pub r_squared: f64,
    pub sse: f64,
    pub rmse: f64,
    pub n_samples: usize,
    /// Optimizer iterations used by the winning start.
    pub iterations: usize,
    /// Index of the winning start in the multi-start grid.
    pub start_index: usize,
}

/// Crude + date a fit was produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLabel {
    pub crude: String,
    pub date: AssayDate,
}

/// Fitted gamma profile for one crude/date query. Immutable once produced.
#[derive(Debug, Clone)]
pub struct FitResult {
    params: GammaParams,
    quality: FitQuality,
    samples: Vec<Sample>,
    span: TemperatureSpan,
    label: Option<ProfileLabel>,
}

impl FitResult {
    pub(crate) fn new(params: GammaParams, quality: FitQuality, samples: Vec<Sample>, span: TemperatureSpan) -> Self {
        Self {
            params,
            quality,
            samples,
            span,
            label: None,
        }
    }

    /// Attach the crude/date this fit belongs to.
    pub(crate) fn labelled(mut self, crude: &str, date: &AssayDate) -> Self {
        self.label = Some(ProfileLabel {
            crude: crude.to_string(),
            date: date.clone(),
        });
        self
    }

    pub fn params(&self) -> GammaParams {
        self.params
    }

    pub fn shape(&self) -> f64 {
        self.params.shape
    }

    pub fn location(&self) -> f64 {
        self.params.location
    }

    pub fn scale(&self) -> f64 {
        self.params.scale
    }

    pub fn quality(&self) -> &FitQuality {
        &self.quality
    }

    pub fn r_squared(&self) -> f64 {
        self.quality.r_squared
    }

    /// Samples the parameters were fitted to, sorted by temperature.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Observed temperature span of the fitted samples.
    pub fn span(&self) -> TemperatureSpan {
        self.span
    }

    pub fn label(&self) -> Option<&ProfileLabel> {
        self.label.as_ref()
    }

    /// Crude code, or `"?"` for fits made directly from samples.
    pub fn crude(&self) -> &str {
        self.label.as_ref().map(|l| l.crude.as_str()).unwrap_or("?")
    }
}

impl DistillationCurve for FitResult {
    fn fraction_at(&self, temperature: f64) -> f64 {
        self.params.cdf(temperature)
    }

    fn support_start(&self) -> f64 {
        self.params.location
    }
}

/// One row of a raw assay table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Row header (e.g. `IBP`, `5`, `Temperature`).
    pub label: String,
    /// Data cells, aligned with `RawTable::columns`.
    pub cells: Vec<String>,
}

/// Assay table as returned by a provider, before any cleaning.
///
/// Cells are kept as text so missing/non-numeric markers survive until the
/// normalizer decides what to drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub crude: String,
    /// Publication date, when the provider knows it.
    pub published: Option<NaiveDate>,
    /// Column headers for the data cells (the row-label column excluded).
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(crude: impl Into<String>, published: Option<NaiveDate>, columns: Vec<String>) -> Self {
        Self {
            crude: crude.into(),
            published,
            columns,
            rows: Vec::new(),
        }
    }

    /// Builder-style row push (handy for tests and in-memory providers).
    pub fn with_row<S: Into<String>>(mut self, label: impl Into<String>, cells: impl IntoIterator<Item = S>) -> Self {
        self.rows.push(RawRow {
            label: label.into(),
            cells: cells.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.cells.is_empty())
    }
}

/// What a curve JSON file describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Profile,
    Mixture,
}

/// One gamma component of an exported curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveComponent {
    pub crude: String,
    pub date: String,
    pub weight: f64,
    pub params: GammaParams,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quality: Option<FitQuality>,
}

/// Precomputed curve grid for quick plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub temperature_c: Vec<f64>,
    pub fraction: Vec<f64>,
}

/// Portable representation of a fitted profile or blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub kind: CurveKind,
    pub components: Vec<CurveComponent>,
    pub grid: CurveGrid,
}

impl DistillationCurve for CurveFile {
    fn fraction_at(&self, temperature: f64) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.params.cdf(temperature))
            .sum()
    }

    fn support_start(&self) -> f64 {
        self.components
            .iter()
            .map(|c| c.params.location)
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assay_date_parses_recent_and_iso_dates() {
        assert_eq!("recent".parse::<AssayDate>().unwrap(), AssayDate::Recent);
        assert_eq!(
            "2020-06-10".parse::<AssayDate>().unwrap(),
            AssayDate::On(NaiveDate::from_ymd_opt(2020, 6, 10).unwrap())
        );
        assert_eq!(AssayDate::Recent.as_query(), "recent");
        assert_eq!("2020-06-10".parse::<AssayDate>().unwrap().to_string(), "2020-06-10");
    }

    #[test]
    fn assay_date_rejects_other_formats() {
        for bad in ["01-01-01", "2020-6-1", "2020-13-01", "yesterday", ""] {
            let err = bad.parse::<AssayDate>().unwrap_err();
            assert!(matches!(err, DistillError::InvalidDate { .. }), "{bad}");
        }
    }

    #[test]
    fn crude_codes_are_uppercased_and_validated() {
        assert_eq!(parse_crude_code(" mgs ").unwrap(), "MGS");
        assert!(parse_crude_code("").is_err());
        assert!(parse_crude_code("M G").is_err());
    }

    #[test]
    fn gamma_params_reject_non_positive_shape_or_scale() {
        assert!(GammaParams::new(2.0, 0.0, 10.0).is_some());
        assert!(GammaParams::new(0.0, 0.0, 10.0).is_none());
        assert!(GammaParams::new(2.0, 0.0, -1.0).is_none());
        assert!(GammaParams::new(2.0, f64::NAN, 1.0).is_none());
    }

    #[test]
    fn span_union_covers_both() {
        let a = TemperatureSpan { min: 40.0, max: 300.0 };
        let b = TemperatureSpan { min: 150.0, max: 450.0 };
        let u = a.union(b);
        assert_eq!(u.min, 40.0);
        assert_eq!(u.max, 450.0);
        assert_eq!(u.midpoint(), 245.0);
    }
}
