//! Settings file
//!
//! Every key is optional. Positional command arguments take precedence over
//! the values read here.

use std::fs;
use std::path::{Path, PathBuf};

use primero_migration_core::export::UserExportOptions;
use serde::Deserialize;

use crate::error::CliError;

/// Contents of the `--config` TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Output directory, overriding each command's default
    pub export_dir: Option<PathBuf>,
    /// Directory the log files are written to
    pub log_dir: PathBuf,
    pub batch_size: Option<usize>,
    /// Locales for translated labels
    pub locales: Vec<String>,
    pub users: UserExportOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            export_dir: None,
            log_dir: PathBuf::from("."),
            batch_size: None,
            locales: vec!["en".to_string()],
            users: UserExportOptions::default(),
        }
    }
}

impl Settings {
    /// Load the settings file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path).map_err(|source| CliError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|message| CliError::SettingsParse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let settings: Settings = toml::from_str(contents).map_err(|e| e.to_string())?;
        if settings.batch_size == Some(0) {
            return Err("batch_size must be greater than 0".to_string());
        }
        Ok(settings)
    }
}
