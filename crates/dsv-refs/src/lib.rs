//! Current-version pointers for the datasets store.
//!
//! Each dataset directory carries one pointer per [`VersionKind`]:
//! `data.bin` and `metadata.json`. A pointer is a relative symlink naming the
//! newest version file of its kind, so the directory can be moved without
//! breaking it.
//!
//! # Architecture
//!
//! - **Versions** are immutable files written before any pointer names them.
//! - **Pointers** are replaced, never edited: a fresh symlink is created under
//!   a temporary name and renamed over the pointer in one step, so a reader
//!   sees either the old target or the new one.
//!
//! # Modules
//!
//! - [`error`]: Error types for pointer operations
//! - [`pointer`]: read, resolve, and swap pointers
//! - [`scan`]: enumerate the version files in a dataset directory
//!
//! [`VersionKind`]: dsv_types::VersionKind

pub mod error;
pub mod pointer;
pub mod scan;

pub use error::{RefError, RefResult};
pub use pointer::{pointer_path, read_pointer, resolve_pointer, swap_pointer};
pub use scan::{latest_version, list_versions};
