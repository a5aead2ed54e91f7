use std::path::PathBuf;

use dsv_merge::MergeError;
use dsv_refs::RefError;
use dsv_types::{DatasetId, VersionName};

use crate::payload::TextEncoding;

/// Errors from dataset store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The dataset directory does not exist.
    #[error("dataset {0} does not exist")]
    DatasetNotFound(DatasetId),

    /// No current metadata for the dataset.
    #[error("metadata for dataset {0} does not exist")]
    MetadataNotFound(DatasetId),

    /// No current data for the dataset.
    #[error("data for dataset {0} does not exist")]
    DataNotFound(DatasetId),

    /// The data pointer survives but its target file was removed.
    #[error("data file '{}' for dataset {id} is missing", .path.display())]
    DataFileMissing { id: DatasetId, path: PathBuf },

    /// The requested historical version does not exist.
    #[error("version {version} of dataset {id} does not exist")]
    VersionNotFound { id: DatasetId, version: VersionName },

    /// Metadata input is neither a mapping nor a structured record.
    #[error("invalid metadata: {0}")]
    InvalidMetadataShape(String),

    /// An unrecognized merge mode name.
    #[error("Invalid metadata update mode: {0}")]
    InvalidMergeMode(String),

    /// Metadata could not be serialized for writing.
    #[error("cannot serialize metadata: {0}")]
    Serialization(String),

    /// A text payload cannot be converted in the requested encoding.
    #[error("cannot convert text as {encoding}: {reason}")]
    Encoding {
        encoding: TextEncoding,
        reason: String,
    },

    /// A stored metadata version is not a JSON object.
    #[error("corrupt metadata for dataset {id}: {reason}")]
    CorruptMetadata { id: DatasetId, reason: String },

    /// A pointer names something other than a version of its kind.
    #[error("pointer error: {0}")]
    Pointer(RefError),

    /// Underlying filesystem failure.
    #[error("storage I/O failure: {0}")]
    Storage(#[from] std::io::Error),
}

/// Coarse classification used at service boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Something the operation requires does not exist.
    NotFound,
    /// The caller's input was rejected.
    InvalidInput,
    /// Filesystem or on-disk state failure.
    Storage,
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::DatasetNotFound(_)
            | StoreError::MetadataNotFound(_)
            | StoreError::DataNotFound(_)
            | StoreError::DataFileMissing { .. }
            | StoreError::VersionNotFound { .. } => ErrorClass::NotFound,
            StoreError::InvalidMetadataShape(_)
            | StoreError::InvalidMergeMode(_)
            | StoreError::Encoding { .. } => ErrorClass::InvalidInput,
            StoreError::Serialization(_)
            | StoreError::CorruptMetadata { .. }
            | StoreError::Pointer(_)
            | StoreError::Storage(_) => ErrorClass::Storage,
        }
    }

    /// Returns `true` for the not-found family.
    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }
}

impl From<MergeError> for StoreError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::InvalidShape { .. } => StoreError::InvalidMetadataShape(e.to_string()),
            MergeError::InvalidMode(mode) => StoreError::InvalidMergeMode(mode),
            MergeError::Serialization(reason) => StoreError::Serialization(reason),
        }
    }
}

impl From<RefError> for StoreError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::Io(io) => StoreError::Storage(io),
            other => StoreError::Pointer(other),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_family() {
        let id = DatasetId::new();
        assert!(StoreError::DatasetNotFound(id).is_not_found());
        assert!(StoreError::MetadataNotFound(id).is_not_found());
        assert!(StoreError::DataNotFound(id).is_not_found());
        assert!(!StoreError::InvalidMetadataShape("x".into()).is_not_found());
    }

    #[test]
    fn messages_name_the_dataset() {
        let id: DatasetId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(
            StoreError::DatasetNotFound(id).to_string(),
            "dataset 67e55044-10b1-426f-9247-bb680e5fe0c8 does not exist"
        );
    }

    #[test]
    fn pointer_io_becomes_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::from(RefError::Io(io));
        assert_eq!(err.class(), ErrorClass::Storage);
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[test]
    fn shape_errors_are_client_input() {
        let err = StoreError::from(MergeError::InvalidShape { found: "array".into() });
        assert_eq!(err.class(), ErrorClass::InvalidInput);
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn merge_errors_keep_their_class() {
        let err = StoreError::from(MergeError::InvalidMode("merge".into()));
        assert_eq!(err.class(), ErrorClass::InvalidInput);
        assert_eq!(err.to_string(), "Invalid metadata update mode: merge");

        let err = StoreError::from(MergeError::Serialization("key must be a string".into()));
        assert!(matches!(err, StoreError::Serialization(_)));
        assert_eq!(err.class(), ErrorClass::Storage);
    }
}
