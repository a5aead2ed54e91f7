//! Metadata codec for the datasets store.
//!
//! Metadata documents are flat-at-the-top JSON objects. Callers hand the
//! store anything that can become one (a JSON object, a string-keyed map, or
//! a serializable record) and this crate turns it into the canonical
//! [`Metadata`] mapping, merges it with what is already stored, and encodes
//! it as the bytes written to a metadata version file.
//!
//! # Modules
//!
//! - [`metadata`]: [`Metadata`], the [`IntoMetadata`] capability, [`Record`]
//! - [`merge`]: [`MergeMode`] and the shallow [`merge()`] function
//! - [`codec`]: canonical JSON encoding (sorted keys, 2-space indent)
//! - [`error`]: [`MergeError`]

pub mod codec;
pub mod error;
pub mod merge;
pub mod metadata;

pub use codec::{decode, encode};
pub use error::{MergeError, MergeResult};
pub use merge::{merge, MergeMode};
pub use metadata::{normalize, IntoMetadata, Metadata, Record};
