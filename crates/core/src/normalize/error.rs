//! Error types for normalization

use thiserror::Error;

use crate::model::IdentifierError;

/// Errors that fail a single record during normalization
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Date field that cannot be parsed
    #[error("Field '{field}' has an invalid date: {value}")]
    InvalidDate { field: String, value: String },

    /// Date-time field that cannot be parsed
    #[error("Field '{field}' has an invalid timestamp: {value}")]
    InvalidDateTime { field: String, value: String },

    /// Polarity flip applied to something other than a boolean
    #[error("Field '{field}' must be a boolean to be negated, found {found}")]
    NotBoolean { field: String, found: &'static str },

    /// A rule target that is also a rule source
    #[error("Rule target '{0}' is also renamed by another rule")]
    CyclicRename(String),

    /// Required attribute missing from a source document
    #[error("Document is missing required field '{0}'")]
    MissingField(&'static str),

    /// Identifier formatting failure
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// Result type for normalization
pub type NormalizeResult<T> = Result<T, NormalizeError>;
