//! Data source configuration (environment + `.env`, overridable from the CLI).

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::data::{CrudeMonitorClient, CsvDirProvider, ProfileProvider};
use crate::error::AppError;

pub const DEFAULT_SOURCE_URL: &str = "https://crudemonitor.ca/crudes/dist.php";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_SOURCE_URL: &str = "DISTILL_SOURCE_URL";
const ENV_DATA_DIR: &str = "DISTILL_DATA_DIR";
const ENV_TIMEOUT: &str = "DISTILL_HTTP_TIMEOUT_SECS";

/// Where assay tables come from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub base_url: String,
    /// When set, tables are read from CSV files in this directory instead of HTTP.
    pub data_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOURCE_URL.to_string(),
            data_dir: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SourceConfig {
    /// Read `DISTILL_*` variables, loading `.env` first if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(url) = get(ENV_SOURCE_URL) {
            config.base_url = url;
        }
        config.data_dir = get(ENV_DATA_DIR).map(PathBuf::from);
        if let Some(raw) = get(ENV_TIMEOUT) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| AppError::new(2, format!("{ENV_TIMEOUT} must be a positive integer, got '{raw}'.")))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, source_url: Option<String>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = Some(dir);
        }
        if let Some(url) = source_url {
            self.base_url = url;
        }
        self
    }

    /// Construct the provider this configuration selects.
    pub fn provider(&self) -> Result<Box<dyn ProfileProvider>, AppError> {
        match &self.data_dir {
            Some(dir) => {
                debug!("reading assay tables from {}", dir.display());
                Ok(Box::new(CsvDirProvider::new(dir.clone())))
            }
            None => {
                debug!("fetching assay tables from {}", self.base_url);
                Ok(Box::new(CrudeMonitorClient::from_config(self)?))
            }
        }
    }
}
