//! Error types for source store access

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the v1 store
#[derive(Error, Debug)]
pub enum SourceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A collection file could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line or document is not valid JSON
    #[error("JSON parsing error in {path} at line {line}: {error}")]
    JsonParse {
        path: PathBuf,
        line: usize,
        error: String,
    },

    /// A `.json` collection file that is not an array
    #[error("Collection file {0} must contain a JSON array")]
    NotAnArray(PathBuf),

    /// A collection entry that is not an object
    #[error("Entry {index} of {collection} is not a JSON object")]
    NotAnObject { collection: String, index: usize },

    /// Attachment missing from both the attachment directory and the document
    #[error("Attachment '{key}' not found for document {id}")]
    AttachmentNotFound { id: String, key: String },

    /// Inline attachment data that cannot be decoded
    #[error("Attachment '{key}' of document {id} is invalid: {reason}")]
    InvalidAttachment {
        id: String,
        key: String,
        reason: String,
    },

    /// Document without an identifier where one is required
    #[error("Document in {0} has no id")]
    MissingId(String),
}

impl SourceError {
    /// Get a user-friendly error message with a hint
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Read { path, .. } => format!(
                "Cannot read '{}'. Check the dump directory and file permissions.",
                path.display()
            ),
            SourceError::JsonParse { path, line, .. } => format!(
                "'{}' is not valid JSON Lines (line {}). Re-export the collection from CouchDB.",
                path.display(),
                line
            ),
            SourceError::NotAnArray(path) => format!(
                "'{}' must hold a JSON array of documents, or use the .jsonl format.",
                path.display()
            ),
            _ => self.to_string(),
        }
    }
}

/// Result type for source store access
pub type SourceResult<T> = Result<T, SourceError>;
