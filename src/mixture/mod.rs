//! Two-crude blend profiles.
//!
//! A blend is modelled as the volume-weighted superposition of the two fitted
//! component CDFs:
//!
//! ```text
//! F_blend(T) = w1 · F1(T) + w2 · F2(T),   w_i = V_i / (V1 + V2)
//! ```
//!
//! Each crude's molecules are assumed to boil off under the same distribution
//! whether blended or not, so no further regression is done on the mixture.

use log::info;
use serde::Serialize;

use crate::app::pipeline::fit_profile_with;
use crate::data::ProfileProvider;
use crate::domain::{AssayDate, BlendSide, DistillationCurve, FitResult, GammaParams, TemperatureSpan};
use crate::error::DistillError;
use crate::fit::ProfileFitter;

pub mod cuts;

pub use cuts::*;

/// Normalized blend weights `(w1, w2)` with `w1 + w2 = 1`.
///
/// Fails with `InvalidVolume` if either volume is not finite or `<= 0`.
pub fn mixture_weights(volume1: f64, volume2: f64) -> Result<(f64, f64), DistillError> {
    for (side, volume) in [(BlendSide::First, volume1), (BlendSide::Second, volume2)] {
        if !(volume.is_finite() && volume > 0.0) {
            return Err(DistillError::InvalidVolume { side, volume });
        }
    }
    // Scale by the larger volume so the sum cannot overflow.
    let largest = volume1.max(volume2);
    let (a, b) = (volume1 / largest, volume2 / largest);
    let w1 = a / (a + b);
    Ok((w1, 1.0 - w1))
}

/// Two fitted crudes plus their blend volumes.
#[derive(Debug, Clone)]
pub struct MixtureSpec {
    first: FitResult,
    second: FitResult,
    volumes: (f64, f64),
    weights: (f64, f64),
}

impl MixtureSpec {
    pub fn new(first: FitResult, second: FitResult, volume1: f64, volume2: f64) -> Result<Self, DistillError> {
        let weights = mixture_weights(volume1, volume2)?;
        Ok(Self {
            first,
            second,
            volumes: (volume1, volume2),
            weights,
        })
    }

    pub fn first(&self) -> &FitResult {
        &self.first
    }

    pub fn second(&self) -> &FitResult {
        &self.second
    }

    pub fn volumes(&self) -> (f64, f64) {
        self.volumes
    }

    pub fn weights(&self) -> (f64, f64) {
        self.weights
    }

    /// The blend's distillation curve.
    pub fn curve(&self) -> MixtureCurve {
        MixtureCurve {
            components: [
                MixtureComponent::from_fit(&self.first, self.weights.0, self.volumes.0),
                MixtureComponent::from_fit(&self.second, self.weights.1, self.volumes.1),
            ],
        }
    }
}

/// One weighted gamma component of a blend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixtureComponent {
    pub crude: String,
    pub date: String,
    pub volume: f64,
    pub weight: f64,
    pub params: GammaParams,
    pub r_squared: f64,
    /// Observed temperature span of this crude's assay.
    pub span: TemperatureSpan,
}

impl MixtureComponent {
    fn from_fit(fit: &FitResult, weight: f64, volume: f64) -> Self {
        Self {
            crude: fit.crude().to_string(),
            date: fit.label().map(|l| l.date.to_string()).unwrap_or_default(),
            volume,
            weight,
            params: fit.params(),
            r_squared: fit.r_squared(),
            span: fit.span(),
        }
    }
}

/// Blend curve `T ↦ w1·F1(T) + w2·F2(T)`, evaluated on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureCurve {
    components: [MixtureComponent; 2],
}

impl MixtureCurve {
    pub fn evaluate(&self, temperature: f64) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.params.cdf(temperature))
            .sum()
    }

    pub fn components(&self) -> &[MixtureComponent; 2] {
        &self.components
    }

    pub fn weights(&self) -> (f64, f64) {
        (self.components[0].weight, self.components[1].weight)
    }

    /// Union of both crudes' observed temperature spans.
    pub fn domain(&self) -> TemperatureSpan {
        self.components[0].span.union(self.components[1].span)
    }

    /// Evaluate the curve on `n` evenly spaced temperatures over `[t0, t1]`.
    pub fn grid(&self, t0: f64, t1: f64, n: usize) -> Vec<(f64, f64)> {
        crate::render::sample_curve(self, t0, t1, n)
    }
}

impl DistillationCurve for MixtureCurve {
    fn fraction_at(&self, temperature: f64) -> f64 {
        self.evaluate(temperature)
    }

    fn support_start(&self) -> f64 {
        self.components[0]
            .params
            .location
            .min(self.components[1].params.location)
    }
}

/// Fit both crudes and combine them into a blend curve.
///
/// Volumes are validated before any data is fetched. Crude 1 is fitted before
/// crude 2; a failure on either side aborts the blend and is tagged with the
/// side that failed.
pub fn combine<P: ProfileProvider + ?Sized>(
    provider: &P,
    fitter: &ProfileFitter,
    crude1: &str,
    crude2: &str,
    volume1: f64,
    volume2: f64,
    date: &AssayDate,
) -> Result<MixtureCurve, DistillError> {
    mixture_weights(volume1, volume2)?;

    let first = fit_profile_with(provider, fitter, crude1, date, None)
        .map_err(|e| e.in_blend(BlendSide::First, crude1))?
        .fit;
    let second = fit_profile_with(provider, fitter, crude2, date, None)
        .map_err(|e| e.in_blend(BlendSide::Second, crude2))?
        .fit;

    let spec = MixtureSpec::new(first, second, volume1, volume2)?;
    let (w1, w2) = spec.weights();
    info!("blend {crude1}:{crude2} weights {w1:.4}/{w2:.4}");
    Ok(spec.curve())
}
