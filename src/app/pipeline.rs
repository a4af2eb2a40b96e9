//! Shared profile pipeline used by the CLI and the library entry points.
//!
//! provider fetch -> normalize -> fit -> (optional) render
//!
//! The mixture combiner runs this once per crude, so both crudes of a blend go
//! through exactly the same steps as a single-crude fit.

use log::info;

use crate::data::ProfileProvider;
use crate::domain::{AssayDate, FitResult, parse_crude_code};
use crate::error::{DistillError, DistillResult};
use crate::fit::ProfileFitter;
use crate::mixture::{MixtureCurve, combine};
use crate::normalize::{NormalizedProfile, normalize};
use crate::render::{ProfilePlot, RenderSink};

/// Outputs of one profile run.
#[derive(Debug, Clone)]
pub struct ProfileRun {
    pub fit: FitResult,
    /// Cleaned samples and the cells dropped on the way.
    pub normalized: NormalizedProfile,
}

/// Fetch, normalize and fit one crude with an explicit fitter.
///
/// The sink (if any) receives the fitted plot after the fit succeeds; it never
/// influences the result.
pub fn fit_profile_with<P: ProfileProvider + ?Sized>(
    provider: &P,
    fitter: &ProfileFitter,
    crude: &str,
    date: &AssayDate,
    sink: Option<&mut dyn RenderSink>,
) -> DistillResult<ProfileRun> {
    let code = parse_crude_code(crude).map_err(|e| e.in_profile(crude, date))?;

    let table = match provider.get_profile(&code, date)? {
        Some(table) if !table.is_empty() => table,
        _ => {
            return Err(DistillError::DataUnavailable {
                crude: code,
                date: date.clone(),
            });
        }
    };

    let normalized = normalize(&table).map_err(|e| e.in_profile(&code, date))?;
    let fit = fitter
        .fit(&normalized.samples)
        .map_err(|e| e.in_profile(&code, date))?
        .labelled(&code, date);

    info!(
        "{code} ({date}): shape={:.4} location={:.2} scale={:.3} R²={:.5}",
        fit.shape(),
        fit.location(),
        fit.scale(),
        fit.r_squared()
    );

    if let Some(sink) = sink {
        sink.render(&ProfilePlot::for_fit(&fit, format!("{code} ({date})")));
    }

    Ok(ProfileRun { fit, normalized })
}

/// Fit the distillation profile of one crude with the default fitter.
pub fn fit_profile<P: ProfileProvider + ?Sized>(
    provider: &P,
    crude: &str,
    date: &AssayDate,
    sink: Option<&mut dyn RenderSink>,
) -> DistillResult<FitResult> {
    fit_profile_with(provider, &ProfileFitter::new(), crude, date, sink).map(|run| run.fit)
}

/// Volume-weighted blend of two crudes' fitted profiles.
pub fn mixture_profile<P: ProfileProvider + ?Sized>(
    provider: &P,
    crude1: &str,
    crude2: &str,
    volume1: f64,
    volume2: f64,
    date: &AssayDate,
) -> DistillResult<MixtureCurve> {
    combine(provider, &ProfileFitter::new(), crude1, crude2, volume1, volume2, date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryProvider;
    use crate::domain::RawTable;
    use crate::error::ErrorKind;

    fn provider() -> MemoryProvider {
        MemoryProvider::new()
            .with_table(
                RawTable::new("MGS", None, vec!["Temperature (oC)".to_string()])
                    .with_row("IBP", ["150"])
                    .with_row("10", ["210"])
                    .with_row("30", ["270"])
                    .with_row("50", ["320"])
                    .with_row("70", ["370"])
                    .with_row("95", ["450"]),
            )
            .with_table(
                RawTable::new("BAD", None, vec!["Temperature (oC)".to_string()])
                    .with_row("IBP", ["150"])
                    .with_row("10", ["-"]),
            )
    }

    #[test]
    fn fits_and_labels_profile() {
        let fit = fit_profile(&provider(), "mgs", &AssayDate::Recent, None).unwrap();
        assert_eq!(fit.crude(), "MGS");
        assert!(fit.r_squared() > 0.98, "R² = {}", fit.r_squared());
        assert_eq!(fit.samples().len(), 6);
    }

    #[test]
    fn unknown_crude_is_data_unavailable() {
        let err = fit_profile(&provider(), "ABC", &AssayDate::Recent, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    }

    #[test]
    fn sparse_table_is_insufficient_data() {
        let err = fit_profile(&provider(), "BAD", &AssayDate::Recent, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        assert!(err.to_string().contains("BAD"), "{err}");
    }

    #[test]
    fn invalid_code_is_rejected_before_fetch() {
        let err = fit_profile(&provider(), "M-GS", &AssayDate::Recent, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCrudeCode);
    }

    #[test]
    fn sink_sees_plot_without_changing_result() {
        let mut titles = Vec::new();
        let mut sink = |plot: &ProfilePlot| titles.push(plot.title.clone());
        let with_sink = fit_profile(&provider(), "MGS", &AssayDate::Recent, Some(&mut sink)).unwrap();
        let without = fit_profile(&provider(), "MGS", &AssayDate::Recent, None).unwrap();

        assert_eq!(titles, vec!["MGS (recent)".to_string()]);
        assert_eq!(with_sink.params(), without.params());
    }

    #[test]
    fn run_reports_normalizer_output() {
        let run = fit_profile_with(&provider(), &ProfileFitter::new(), "MGS", &AssayDate::Recent, None).unwrap();
        assert!(run.normalized.dropped.is_empty());
        assert_eq!(run.normalized.samples.len(), run.fit.samples().len());
    }
}
