//! Versioned filesystem store for dataset payloads and metadata.
//!
//! Every dataset owns one directory under the store root, named by its
//! [`DatasetId`]. Writes never modify a file: each one creates a new
//! timestamp-named version and then moves the kind's current pointer onto it.
//!
//! ```text
//! <root>/<id>/metadata.json          -> metadata-<stamp>.json
//! <root>/<id>/metadata-<stamp>.json
//! <root>/<id>/data.bin               -> data-<stamp>.bin
//! <root>/<id>/data-<stamp>.bin
//! ```
//!
//! # Design Rules
//!
//! 1. Version files are immutable and never overwritten.
//! 2. Write-then-link: a version is fully written before a pointer names it.
//! 3. Writers for one dataset are serialized by a per-dataset lock; writers
//!    for different datasets run in parallel.
//! 4. Readers take no lock. They see the pointer before or after a swap,
//!    never a half-written version.
//! 5. All I/O errors are propagated, never silently ignored.
//!
//! Locks are in-process only. Two stores (or two processes) sharing a root
//! are not coordinated.

pub mod config;
pub mod error;
pub mod layout;
pub mod lock;
pub mod payload;
pub mod store;
pub mod version;

pub use config::StoreConfig;
pub use error::{ErrorClass, StoreError, StoreResult};
pub use layout::DatasetLayout;
pub use lock::{KeyGuard, KeyLockTable};
pub use payload::{Payload, TextEncoding};
pub use store::FsStore;
pub use version::{VersionWriter, WrittenVersion};

pub use dsv_merge::{IntoMetadata, MergeError, MergeMode, Metadata, Record};
pub use dsv_types::{DatasetId, VersionKind, VersionName, VersionStamp};
