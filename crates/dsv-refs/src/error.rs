//! Error types for pointer operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or swapping pointers.
#[derive(Debug, Error)]
pub enum RefError {
    /// The pointer names something that is not a version file of its kind.
    #[error("pointer {} has invalid target: {target}", .pointer.display())]
    InvalidTarget { pointer: PathBuf, target: String },

    /// The pointer exists but its target file is gone.
    #[error("pointer {} targets missing file {}", .pointer.display(), .target.display())]
    Dangling { pointer: PathBuf, target: PathBuf },

    /// I/O error during pointer operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for pointer operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
