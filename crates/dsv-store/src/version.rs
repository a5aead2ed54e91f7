//! Writing immutable version files.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dsv_types::{VersionKind, VersionName, VersionStamp};
use tracing::debug;

/// A version file that has been fully written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenVersion {
    pub name: VersionName,
    pub path: PathBuf,
}

/// Creates version files under collision-free, increasing names.
#[derive(Clone, Debug, Default)]
pub struct VersionWriter {
    sync: bool,
}

impl VersionWriter {
    /// With `sync`, every version file is `fsync`ed before it is returned.
    pub fn new(sync: bool) -> Self {
        Self { sync }
    }

    /// Write `payload` as a new version of `kind` in `dir`.
    ///
    /// The stamp starts at the current time, or just after `after` if that is
    /// later, and is bumped one millisecond at a time until the name is free.
    /// Files are created exclusively, so an existing version is never
    /// overwritten. Write errors are returned as-is; running out of stamps
    /// is an error of kind `Other`.
    pub fn write(
        &self,
        dir: &Path,
        kind: VersionKind,
        payload: &[u8],
        after: Option<&VersionName>,
    ) -> io::Result<WrittenVersion> {
        let mut stamp = VersionStamp::now();
        if let Some(after) = after {
            let floor = after.next().ok_or_else(|| stamps_exhausted(after))?;
            stamp = stamp.max(floor.stamp);
        }
        let mut name = VersionName::new(kind, stamp);

        loop {
            let path = dir.join(name.file_name());
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let written = file.write_all(payload).and_then(|()| {
                        if self.sync {
                            file.sync_all()
                        } else {
                            Ok(())
                        }
                    });
                    if let Err(e) = written {
                        // A torn version must not be picked up by history scans.
                        let _ = fs::remove_file(&path);
                        return Err(e);
                    }
                    debug!(path = %path.display(), bytes = payload.len(), "version written");
                    return Ok(WrittenVersion { name, path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    name = name.next().ok_or_else(|| stamps_exhausted(&name))?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn stamps_exhausted(last: &VersionName) -> io::Error {
    io::Error::other(format!("no version stamp left after {last}"))
}
