//! Enumerating version files in a dataset directory.

use std::fs;
use std::io;
use std::path::Path;

use dsv_types::{VersionKind, VersionName};
use tracing::debug;

use crate::error::RefResult;
use crate::pointer::is_temp_link;

/// All versions of `kind` in `dir`, oldest first.
///
/// Pointers, temporary links, and foreign files are skipped. A missing
/// directory yields an empty list.
pub fn list_versions(dir: &Path, kind: VersionKind) -> RefResult<Vec<VersionName>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name == kind.pointer_name() || is_temp_link(name) {
            continue;
        }
        match VersionName::parse(name) {
            Ok(version) if version.kind == kind => versions.push(version),
            Ok(_) => {}
            Err(_) => debug!(dir = %dir.display(), name, "skipping non-version entry"),
        }
    }
    versions.sort();
    Ok(versions)
}

/// The newest version of `kind` in `dir`, if any.
pub fn latest_version(dir: &Path, kind: VersionKind) -> RefResult<Option<VersionName>> {
    Ok(list_versions(dir, kind)?.pop())
}
