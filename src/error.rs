//! Error types.
//!
//! The library reports failures through [`DistillError`]; the binary converts
//! those into [`AppError`], which carries the process exit code.

use thiserror::Error;

use crate::domain::{AssayDate, BlendSide};

/// A specialized Result type for profile fitting and blending.
pub type DistillResult<T> = Result<T, DistillError>;

/// Coarse classification of a [`DistillError`], independent of context wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DataUnavailable,
    InsufficientData,
    FitDidNotConverge,
    InvalidVolume,
    InvalidDate,
    InvalidCrudeCode,
    Provider,
    MalformedTable,
}

/// Errors raised while fetching, normalizing, fitting or blending profiles.
#[derive(Error, Debug, Clone)]
pub enum DistillError {
    /// The provider has no published assay for this crude/date.
    #[error("No distillation data published for crude '{crude}' ({date}).")]
    DataUnavailable { crude: String, date: AssayDate },

    /// Too few usable samples remain to identify the 3-parameter model.
    #[error("Insufficient data: need at least {required} valid samples, got {found}.")]
    InsufficientData { found: usize, required: usize },

    /// The optimizer ran out of budget or produced invalid parameters.
    #[error("Fit did not converge after {iterations} iterations: {reason}")]
    FitDidNotConverge { iterations: usize, reason: String },

    /// A blend volume is zero, negative or not finite.
    #[error("Invalid volume for crude {side}: {volume} (volumes must be > 0).")]
    InvalidVolume { side: BlendSide, volume: f64 },

    #[error("Invalid date '{input}': expected 'recent' or YYYY-MM-DD.")]
    InvalidDate { input: String },

    #[error("Invalid crude code '{input}': expected a non-empty alphanumeric acronym.")]
    InvalidCrudeCode { input: String },

    /// Transport or parse failure inside a data provider.
    #[error("Data provider failed for crude '{crude}' ({date}): {message}")]
    Provider {
        crude: String,
        date: AssayDate,
        message: String,
    },

    #[error("Unrecognized assay table layout: {reason}")]
    MalformedTable { reason: String },

    /// Context added by the single-profile pipeline.
    #[error("Crude '{crude}' ({date}): {source}")]
    Profile {
        crude: String,
        date: AssayDate,
        #[source]
        source: Box<DistillError>,
    },

    /// Context added by the mixture combiner: which side of the blend failed.
    #[error("Crude {side} of the blend ('{crude}'): {source}")]
    Blend {
        side: BlendSide,
        crude: String,
        #[source]
        source: Box<DistillError>,
    },
}

impl DistillError {
    /// Taxonomy of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DistillError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            DistillError::InsufficientData { .. } => ErrorKind::InsufficientData,
            DistillError::FitDidNotConverge { .. } => ErrorKind::FitDidNotConverge,
            DistillError::InvalidVolume { .. } => ErrorKind::InvalidVolume,
            DistillError::InvalidDate { .. } => ErrorKind::InvalidDate,
            DistillError::InvalidCrudeCode { .. } => ErrorKind::InvalidCrudeCode,
            DistillError::Provider { .. } => ErrorKind::Provider,
            DistillError::MalformedTable { .. } => ErrorKind::MalformedTable,
            DistillError::Profile { source, .. } | DistillError::Blend { source, .. } => source.kind(),
        }
    }

    /// Which side of a blend failed, if this error came from the mixture combiner.
    pub fn blend_side(&self) -> Option<BlendSide> {
        match self {
            DistillError::Blend { side, .. } => Some(*side),
            _ => None,
        }
    }

    pub(crate) fn in_profile(self, crude: &str, date: &AssayDate) -> Self {
        match self {
            // Already carries crude + date.
            e @ (DistillError::DataUnavailable { .. } | DistillError::Provider { .. }) => e,
            e => DistillError::Profile {
                crude: crude.to_string(),
                date: date.clone(),
                source: Box::new(e),
            },
        }
    }

    pub(crate) fn in_blend(self, side: BlendSide, crude: &str) -> Self {
        DistillError::Blend {
            side,
            crude: crude.to_string(),
            source: Box::new(self),
        }
    }
}

/// CLI-level error: a message plus the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<DistillError> for AppError {
    fn from(err: DistillError) -> Self {
        let exit_code = match err.kind() {
            ErrorKind::Provider | ErrorKind::FitDidNotConverge => 4,
            _ => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
