//! Reading, resolving, and swapping current-version pointers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dsv_types::{VersionKind, VersionName};
use tracing::debug;

use crate::error::{RefError, RefResult};

/// Distinguishes temporary link names created by this process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Canonical pointer path for `kind` inside a dataset directory.
pub fn pointer_path(dir: &Path, kind: VersionKind) -> PathBuf {
    dir.join(kind.pointer_name())
}

/// Read the version a pointer names, without touching the target.
///
/// Returns `Ok(None)` if the pointer does not exist.
pub fn read_pointer(dir: &Path, kind: VersionKind) -> RefResult<Option<VersionName>> {
    let pointer = pointer_path(dir, kind);
    let target = match fs::read_link(&pointer) {
        Ok(target) => target,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let invalid = || RefError::InvalidTarget {
        pointer: pointer.clone(),
        target: target.display().to_string(),
    };
    let file_name = target.to_str().ok_or_else(invalid)?;
    let version = VersionName::parse(file_name).map_err(|_| invalid())?;
    if version.kind != kind {
        return Err(invalid());
    }
    Ok(Some(version))
}

/// Resolve a pointer to the absolute path of the version file it names.
///
/// Returns `Ok(None)` if the pointer does not exist, and
/// [`RefError::Dangling`] if it exists but its target was removed.
pub fn resolve_pointer(dir: &Path, kind: VersionKind) -> RefResult<Option<PathBuf>> {
    let Some(version) = read_pointer(dir, kind)? else {
        return Ok(None);
    };
    let target = dir.join(version.file_name());
    match fs::metadata(&target) {
        Ok(meta) if meta.is_file() => Ok(Some(target)),
        Ok(_) => Err(RefError::Dangling {
            pointer: pointer_path(dir, kind),
            target,
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(RefError::Dangling {
            pointer: pointer_path(dir, kind),
            target,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Point `kind`'s pointer at `version`.
///
/// The new link is created under a temporary name and renamed over the
/// pointer, so the pointer is never absent once it has been written. Callers
/// serialize swaps for one directory.
pub fn swap_pointer(dir: &Path, version: &VersionName) -> RefResult<()> {
    let pointer = pointer_path(dir, version.kind);
    let temp = dir.join(format!(
        ".{}.tmp-{}-{}",
        version.kind.pointer_name(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    symlink(Path::new(&version.file_name()), &temp)?;
    if let Err(e) = fs::rename(&temp, &pointer) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    debug!(pointer = %pointer.display(), target = %version, "pointer swapped");
    Ok(())
}

/// Returns `true` for file names used as temporary links during a swap.
pub fn is_temp_link(name: &str) -> bool {
    name.starts_with('.') && name.contains(".tmp-")
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
