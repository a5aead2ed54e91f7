//! Mapping datasets to directories under the store root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dsv_types::{DatasetId, VersionKind, VersionName};
use tracing::{debug, warn};

/// Resolves dataset ids to on-disk locations and manages dataset directories.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<id>`
    pub fn dataset_dir(&self, id: &DatasetId) -> PathBuf {
        self.root.join(id.dir_name())
    }

    /// `<root>/<id>/data.bin` or `<root>/<id>/metadata.json`
    pub fn pointer_path(&self, id: &DatasetId, kind: VersionKind) -> PathBuf {
        dsv_refs::pointer_path(&self.dataset_dir(id), kind)
    }

    /// `<root>/<id>/<kind>-<stamp>.<ext>`
    pub fn version_path(&self, id: &DatasetId, version: &VersionName) -> PathBuf {
        self.dataset_dir(id).join(version.file_name())
    }

    /// `true` if the dataset directory exists, whatever it contains.
    pub fn dir_exists(&self, id: &DatasetId) -> bool {
        self.dataset_dir(id).is_dir()
    }

    /// Create the dataset directory if absent. Returns `true` if it was created.
    pub fn ensure_dir(&self, id: &DatasetId) -> io::Result<bool> {
        let dir = self.dataset_dir(id);
        if dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&dir)?;
        Ok(true)
    }

    /// Remove every entry of the dataset directory and the directory itself.
    ///
    /// Returns `Ok(false)` if the directory did not exist.
    pub fn remove_dir(&self, id: &DatasetId) -> io::Result<bool> {
        let dir = self.dataset_dir(id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let removed = if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match removed {
                Ok(()) => debug!(path = %path.display(), "removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        match fs::remove_dir(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Ids of every dataset directory under the root, sorted.
    pub fn dataset_ids(&self) -> io::Result<Vec<DatasetId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            match name.to_str().map(str::parse::<DatasetId>) {
                Some(Ok(id)) => ids.push(id),
                _ => warn!(
                    root = %self.root.display(),
                    name = %name.to_string_lossy(),
                    "skipping directory that is not a dataset id"
                ),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_layout() {
        let layout = DatasetLayout::new("/data");
        let id: DatasetId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(
            layout.dataset_dir(&id),
            PathBuf::from("/data/67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert_eq!(
            layout.pointer_path(&id, VersionKind::Metadata),
            PathBuf::from("/data/67e55044-10b1-426f-9247-bb680e5fe0c8/metadata.json")
        );
        let version = VersionName::parse("data-5.bin").unwrap();
        assert_eq!(
            layout.version_path(&id, &version),
            PathBuf::from("/data/67e55044-10b1-426f-9247-bb680e5fe0c8/data-5.bin")
        );
    }

    #[test]
    fn ensure_and_remove() {
        let root = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(root.path());
        let id = DatasetId::new();

        assert!(!layout.dir_exists(&id));
        assert!(layout.ensure_dir(&id).unwrap());
        assert!(!layout.ensure_dir(&id).unwrap());
        fs::write(layout.dataset_dir(&id).join("data-1.bin"), b"x").unwrap();

        assert!(layout.remove_dir(&id).unwrap());
        assert!(!layout.dir_exists(&id));
        assert!(!layout.remove_dir(&id).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn remove_handles_dangling_links() {
        let root = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(root.path());
        let id = DatasetId::new();
        layout.ensure_dir(&id).unwrap();
        std::os::unix::fs::symlink("data-9.bin", layout.pointer_path(&id, VersionKind::Data))
            .unwrap();

        assert!(layout.remove_dir(&id).unwrap());
        assert!(!layout.dataset_dir(&id).exists());
    }

    #[test]
    fn dataset_ids_skip_foreign_entries() {
        let root = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(root.path());
        let a = DatasetId::new();
        let b = DatasetId::new();
        layout.ensure_dir(&a).unwrap();
        layout.ensure_dir(&b).unwrap();
        fs::create_dir(root.path().join("lost+found")).unwrap();
        fs::write(root.path().join("README"), b"").unwrap();

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(layout.dataset_ids().unwrap(), expected);
    }
}
