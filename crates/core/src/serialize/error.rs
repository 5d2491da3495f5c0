//! Error types for serialization

use thiserror::Error;

/// Errors that can occur while rendering a record
#[derive(Error, Debug)]
pub enum SerializeError {
    /// A list that starts with a range holds some other value
    #[error("Range list contains a {found} value")]
    MixedRangeList { found: &'static str },

    /// Target-language expressions have no JSON form
    #[error("Expression cannot be written as JSON: {0}")]
    ExprInJson(String),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for serialization
pub type SerializeResult<T> = Result<T, SerializeError>;
