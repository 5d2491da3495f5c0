//! Error types for export runs

use std::path::PathBuf;

use thiserror::Error;

use crate::model::IdentifierError;
use crate::normalize::NormalizeError;
use crate::serialize::SerializeError;
use crate::source::SourceError;

/// Errors raised while exporting
///
/// Errors returned from an exporter's `render` fail only the record being
/// rendered. Errors raised by the driver itself (source, directory or file
/// failures) abort the run.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Reading from the source store failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A record could not be normalized
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// A value could not be rendered
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// A document id could not be made canonical
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Output directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be opened or written
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document lacks something the exporter needs
    #[error("Invalid {collection} document: {reason}")]
    InvalidDocument {
        collection: &'static str,
        reason: String,
    },

    /// Invalid runtime configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExportError {
    pub fn invalid_document(collection: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            collection,
            reason: reason.into(),
        }
    }

    /// Whether this error ends the whole run rather than one record
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Source(SourceError::AttachmentNotFound { .. })
            | Self::Source(SourceError::InvalidAttachment { .. }) => false,
            Self::Source(_) | Self::CreateDir { .. } | Self::Write { .. } => true,
            Self::InvalidConfig(_) => true,
            _ => false,
        }
    }

    /// Message with a hint for the command line
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(e) => e.user_message(),
            Self::CreateDir { path, .. } | Self::Write { path, .. } => format!(
                "{}\n\nCheck that {} is writable and the disk is not full.",
                self,
                path.display()
            ),
            Self::InvalidConfig(_) => format!("{}\n\nCheck the settings file and arguments.", self),
            _ => self.to_string(),
        }
    }
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
