//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - request options (`AssayDate`, `BlendSide`)
//! - raw provider tables (`RawTable`) and cleaned samples (`Sample`)
//! - fit outputs (`GammaParams`, `FitResult`, `FitQuality`)
//! - the portable curve file schema (`CurveFile`)

pub mod types;

pub use types::*;
