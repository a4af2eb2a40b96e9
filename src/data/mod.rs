//! Data providers: where raw assay tables come from.
//!
//! The fitting core only sees the [`ProfileProvider`] trait. Implementations:
//!
//! - [`CrudeMonitorClient`]: the public assay site over HTTP
//! - [`CsvDirProvider`]: a local directory of assay CSV exports
//! - [`MemoryProvider`]: in-memory tables (tests, embedding callers)

use crate::domain::{AssayDate, RawTable};
use crate::error::DistillError;

pub mod crude_monitor;
pub mod csv_dir;
pub mod html;
pub mod memory;

pub use crude_monitor::CrudeMonitorClient;
pub use csv_dir::CsvDirProvider;
pub use memory::MemoryProvider;

/// Source of raw distillation assay tables.
pub trait ProfileProvider {
    /// Fetch the assay table for `crude` published on `date`.
    ///
    /// `Ok(None)` means nothing is published for that crude/date; `Err` is a
    /// transport or parse failure.
    fn get_profile(&self, crude: &str, date: &AssayDate) -> Result<Option<RawTable>, DistillError>;
}

impl<P: ProfileProvider + ?Sized> ProfileProvider for &P {
    fn get_profile(&self, crude: &str, date: &AssayDate) -> Result<Option<RawTable>, DistillError> {
        (**self).get_profile(crude, date)
    }
}

impl<P: ProfileProvider + ?Sized> ProfileProvider for Box<P> {
    fn get_profile(&self, crude: &str, date: &AssayDate) -> Result<Option<RawTable>, DistillError> {
        (**self).get_profile(crude, date)
    }
}
