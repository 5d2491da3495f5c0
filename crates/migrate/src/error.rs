//! CLI error types

use std::path::PathBuf;

use primero_migration_core::{ExportError, SourceError};
use thiserror::Error;

/// Fatal errors that end a command
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read settings file {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {message}")]
    SettingsParse { path: PathBuf, message: String },

    #[error("Cannot create log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl CliError {
    /// Message printed to the operator, with a hint where one helps
    pub fn user_message(&self) -> String {
        match self {
            CliError::Source(e) => e.user_message(),
            CliError::Export(e) => e.user_message(),
            CliError::SettingsParse { path, message } => format!(
                "Settings file '{}' is not valid TOML: {}",
                path.display(),
                message
            ),
            other => other.to_string(),
        }
    }
}
