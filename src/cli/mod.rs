//! Command-line parsing for the distillation profile fitter.
//!
//! Argument parsing stays here; the workflow lives in `crate::app`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::AssayDate;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "distill",
    version,
    about = "Crude oil distillation profile fitting and blending"
)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Data source overrides (take precedence over `DISTILL_*` environment variables).
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// Read assay tables from CSV files in this directory instead of HTTP.
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Assay page URL.
    #[arg(long, value_name = "URL", global = true)]
    pub source_url: Option<String>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the distillation profile of one crude.
    Fit(FitArgs),
    /// Fit two crudes and print their volume-weighted blend.
    Blend(BlendArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
}

/// Plot size and toggle shared by `fit` and `blend`.
#[derive(Debug, Args, Clone)]
pub struct PlotOptions {
    /// Disable the ASCII plot.
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Crude acronym (e.g. MGS, RA).
    pub crude: String,

    /// Assay date: `recent` or YYYY-MM-DD.
    #[arg(long, default_value = "recent")]
    pub date: AssayDate,

    #[command(flatten)]
    pub plot: PlotOptions,

    /// Export the fitted curve to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BlendArgs {
    /// First crude acronym.
    pub crude1: String,

    /// Second crude acronym.
    pub crude2: String,

    /// Volume of the first crude (any unit, must be > 0).
    #[arg(long, allow_negative_numbers = true)]
    pub vol1: f64,

    /// Volume of the second crude (same unit as --vol1, must be > 0).
    #[arg(long, allow_negative_numbers = true)]
    pub vol2: f64,

    /// Assay date used for both crudes: `recent` or YYYY-MM-DD.
    #[arg(long, default_value = "recent")]
    pub date: AssayDate,

    #[command(flatten)]
    pub plot: PlotOptions,

    /// Export the blend curve to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Export the blend's cut-point table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_table: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Curve JSON file produced by `distill fit|blend --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_blend_with_globals() {
        let cli = Cli::try_parse_from([
            "distill", "-vv", "blend", "MGS", "RA", "--vol1", "3", "--vol2", "1", "--date", "2020-06-10",
            "--data-dir", "/tmp/a", "--no-plot",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.source.data_dir, Some(PathBuf::from("/tmp/a")));
        let Command::Blend(args) = cli.command else {
            panic!("expected blend");
        };
        assert_eq!((args.vol1, args.vol2), (3.0, 1.0));
        assert_eq!(args.date.to_string(), "2020-06-10");
        assert!(args.plot.no_plot);
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Cli::try_parse_from(["distill", "fit", "MGS", "--date", "2020-6-1"]).is_err());
    }

    #[test]
    fn fit_defaults_to_recent() {
        let cli = Cli::try_parse_from(["distill", "fit", "MGS"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.date, AssayDate::Recent);
        assert_eq!(args.plot.width, 100);
    }
}
