use thiserror::Error;

/// Errors from metadata normalization, merging, and encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// The input is neither a mapping nor a structured record.
    #[error("metadata must be a mapping or a structured record; got {found}")]
    InvalidShape { found: String },

    /// An unrecognized merge mode name.
    #[error("Invalid metadata update mode: {0}")]
    InvalidMode(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for codec operations.
pub type MergeResult<T> = Result<T, MergeError>;
