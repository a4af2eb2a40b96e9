//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds the configured data provider
//! - runs the profile / blend pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use log::debug;

use crate::cli::{BlendArgs, Cli, Command, FitArgs, PlotArgs, SourceArgs};
use crate::config::SourceConfig;
use crate::data::ProfileProvider;
use crate::error::AppError;
use crate::fit::ProfileFitter;
use crate::mixture::{STANDARD_CUTS, combine, cut_temperatures};
use crate::render::{AsciiPlot, ProfilePlot, RenderSink, render_ascii};

pub mod pipeline;

/// Entry point for the `distill` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(&cli.source, args),
        Command::Blend(args) => handle_blend(&cli.source, args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // A logger may already be installed when embedded.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).try_init();
}

fn provider_from_args(source: &SourceArgs) -> Result<Box<dyn ProfileProvider>, AppError> {
    let config = SourceConfig::from_env()?.with_overrides(source.data_dir.clone(), source.source_url.clone());
    debug!("source config: {config:?}");
    config.provider()
}

fn handle_fit(source: &SourceArgs, args: FitArgs) -> Result<(), AppError> {
    let provider = provider_from_args(source)?;
    let fitter = ProfileFitter::new();

    let mut plot = AsciiPlot::new(args.plot.width, args.plot.height);
    let sink: Option<&mut dyn RenderSink> = if args.plot.no_plot { None } else { Some(&mut plot) };
    let run = pipeline::fit_profile_with(&provider, &fitter, &args.crude, &args.date, sink)?;

    println!("{}", crate::report::format_fit_summary(&run));
    for rendered in plot.rendered() {
        println!("{rendered}");
    }

    if let Some(path) = &args.export_curve {
        crate::io::curve::write_profile_curve_json(path, &run.fit)?;
    }

    Ok(())
}

fn handle_blend(source: &SourceArgs, args: BlendArgs) -> Result<(), AppError> {
    let provider = provider_from_args(source)?;
    let fitter = ProfileFitter::new();

    let curve = combine(
        &provider,
        &fitter,
        &args.crude1,
        &args.crude2,
        args.vol1,
        args.vol2,
        &args.date,
    )?;
    let domain = curve.domain();
    let cuts = cut_temperatures(&curve, &STANDARD_CUTS, domain.max);

    println!("{}", crate::report::format_blend_summary(&curve));
    println!("{}", crate::report::format_cut_table(&cuts));

    if !args.plot.no_plot {
        let [c1, c2] = curve.components();
        let title = format!("{} + {} ({})", c1.crude, c2.crude, args.date);
        let plot = ProfilePlot::for_curve(&curve, title, 0.0_f64.min(domain.min), domain.max);
        println!("{}", render_ascii(&plot, args.plot.width, args.plot.height));
    }

    if let Some(path) = &args.export_curve {
        crate::io::curve::write_mixture_curve_json(path, &curve)?;
    }
    if let Some(path) = &args.export_table {
        crate::io::export::write_cut_table_csv(path, &cuts)?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;

    let title = curve
        .components
        .iter()
        .map(|c| c.crude.as_str())
        .collect::<Vec<_>>()
        .join(" + ");
    let plot = ProfilePlot {
        title,
        observed: Vec::new(),
        curve: curve
            .grid
            .temperature_c
            .iter()
            .copied()
            .zip(curve.grid.fraction.iter().copied())
            .collect(),
    };

    println!("{}", render_ascii(&plot, args.width, args.height));
    Ok(())
}
