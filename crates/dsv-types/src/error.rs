use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid dataset id: {0}")]
    InvalidDatasetId(String),

    #[error("invalid version kind: {0}")]
    InvalidVersionKind(String),

    #[error("invalid version file name: {0}")]
    InvalidVersionName(String),
}
