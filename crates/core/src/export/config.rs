//! Export run configuration

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default number of documents per batch
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Output format for record data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Ruby scripts that build and save the records
    #[default]
    Script,
    /// JSON arrays of `{id, data}` documents
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Script => "rb",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "script" | "rb" | "ruby" => Ok(Self::Script),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "Unknown output format '{}' (expected script or json)",
                other
            )),
        }
    }
}

/// Configuration for one export run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the output units are written under
    pub export_dir: PathBuf,
    /// Documents per batch
    pub batch_size: usize,
    /// Output format for record data
    pub format: OutputFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("record-data-files"),
            batch_size: DEFAULT_BATCH_SIZE,
            format: OutputFormat::Script,
        }
    }
}

impl ExportConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory
    pub fn with_export_dir(mut self, export_dir: impl Into<PathBuf>) -> Self {
        self.export_dir = export_dir.into();
        self
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("Batch size must be greater than 0".to_string());
        }
        if self.export_dir.as_os_str().is_empty() {
            return Err("Export directory must not be empty".to_string());
        }
        Ok(())
    }
}
