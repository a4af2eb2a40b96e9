//! `distill-blend` library crate.
//!
//! Fits crude oil distillation profiles (cumulative fraction evaporated vs
//! temperature) with a 3-parameter gamma CDF and blends two fitted crudes by
//! volume. The binary (`distill`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes or touching the network
//! - data providers and render sinks can be swapped by callers

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod mixture;
pub mod normalize;
pub mod render;
pub mod report;

pub use app::pipeline::{ProfileRun, fit_profile, fit_profile_with, mixture_profile};
pub use data::{CrudeMonitorClient, CsvDirProvider, MemoryProvider, ProfileProvider};
pub use domain::{AssayDate, BlendSide, DistillationCurve, FitQuality, FitResult, GammaParams, Sample};
pub use error::{AppError, DistillError, DistillResult, ErrorKind};
pub use fit::{FitterConfig, ProfileFitter};
pub use mixture::{MixtureCurve, combine};
pub use render::{AsciiPlot, ProfilePlot, RenderSink};
