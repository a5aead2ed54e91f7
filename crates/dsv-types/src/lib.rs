//! Foundation types for the datasets store.
//!
//! Every other `dsv-*` crate depends on `dsv-types` for the identifiers that
//! name datasets and the version files stored under them.
//!
//! # Key Types
//!
//! - [`DatasetId`]: UUID identifying a dataset and naming its directory
//! - [`VersionKind`]: which artifact a version holds (data or metadata)
//! - [`VersionStamp`]: millisecond timestamp ordering versions of one kind
//! - [`VersionName`]: the `<kind>-<stamp>.<ext>` file name of a version

pub mod dataset;
pub mod error;
pub mod version;

pub use dataset::DatasetId;
pub use error::TypeError;
pub use version::{VersionKind, VersionName, VersionStamp};
