//! The filesystem-backed dataset store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dsv_merge::{IntoMetadata, MergeMode, Metadata};
use dsv_refs::RefError;
use dsv_types::{DatasetId, VersionKind, VersionName};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::layout::DatasetLayout;
use crate::lock::KeyLockTable;
use crate::payload::{Payload, TextEncoding};
use crate::version::{VersionWriter, WrittenVersion};

/// Persists dataset payloads and metadata as versioned files.
///
/// Write operations (`store_metadata`, `update_metadata`, `store_data`,
/// `delete_dataset`) hold the dataset's lock for their whole duration, so the
/// number of version files always equals the number of completed writes.
/// Both kinds share one lock per dataset. Read operations take no lock.
pub struct FsStore {
    layout: DatasetLayout,
    writer: VersionWriter,
    locks: KeyLockTable,
}

impl FsStore {
    /// Open a store, creating the root directory if absent.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&config.root)?;
        let root = fs::canonicalize(&config.root)?;
        info!(root = %root.display(), sync_writes = config.sync_writes, "dataset store opened");
        Ok(Self {
            layout: DatasetLayout::new(root),
            writer: VersionWriter::new(config.sync_writes),
            locks: KeyLockTable::new(),
        })
    }

    /// Absolute path of the store root.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    // ---- Metadata ----

    /// Write `metadata` as the dataset's current metadata, creating the
    /// dataset if needed. Replaces whatever metadata was current.
    ///
    /// Returns the path of the new metadata version.
    pub fn store_metadata(
        &self,
        id: DatasetId,
        metadata: impl IntoMetadata,
    ) -> StoreResult<PathBuf> {
        let payload = metadata.into_metadata()?;
        let _guard = self.locks.acquire(id);

        if self.layout.ensure_dir(&id)? {
            info!(dataset = %id, "dataset created");
        }
        let written = self.write_metadata_version(&id, &payload)?;
        Ok(written.path)
    }

    /// Current metadata of a dataset.
    pub fn fetch_metadata(&self, id: DatasetId) -> StoreResult<Metadata> {
        self.read_current_metadata(&id)?
            .ok_or(StoreError::MetadataNotFound(id))
    }

    /// Merge `metadata` into the dataset's current metadata and store the
    /// result as a new version.
    ///
    /// With [`MergeMode::Overlay`] a missing current document counts as empty.
    /// Fails with [`StoreError::DatasetNotFound`] if the dataset directory
    /// does not exist. Returns the merged document.
    pub fn update_metadata(
        &self,
        id: DatasetId,
        metadata: impl IntoMetadata,
        mode: MergeMode,
    ) -> StoreResult<Metadata> {
        let _guard = self.locks.acquire(id);
        if !self.layout.dir_exists(&id) {
            return Err(StoreError::DatasetNotFound(id));
        }

        let incoming = metadata.into_metadata()?;
        let current = match mode {
            MergeMode::Overlay => self.read_current_metadata(&id)?.unwrap_or_default(),
            MergeMode::Override => Metadata::new(),
        };
        let merged = dsv_merge::merge(current, incoming, mode);

        self.write_metadata_version(&id, &merged)?;
        debug!(dataset = %id, %mode, keys = merged.len(), "metadata updated");
        Ok(merged)
    }

    // ---- Data ----

    /// Store a new data version. The dataset must already exist.
    ///
    /// Returns the path of the new data version.
    pub fn store_data(&self, id: DatasetId, payload: impl Into<Payload>) -> StoreResult<PathBuf> {
        let _guard = self.locks.acquire(id);
        if !self.layout.dir_exists(&id) {
            return Err(StoreError::DatasetNotFound(id));
        }

        let bytes = payload.into().into_bytes()?;
        let written = self.write_version(&id, VersionKind::Data, &bytes)?;
        Ok(written.path)
    }

    /// Current data payload of a dataset, as raw bytes.
    pub fn fetch_data(&self, id: DatasetId) -> StoreResult<Vec<u8>> {
        read_file(&self.layout.pointer_path(&id, VersionKind::Data))?
            .ok_or(StoreError::DataNotFound(id))
    }

    /// Current data payload of a dataset, decoded as text.
    pub fn fetch_data_text(&self, id: DatasetId, encoding: TextEncoding) -> StoreResult<String> {
        encoding.decode(&self.fetch_data(id)?)
    }

    /// Absolute path of the current data version.
    ///
    /// Fails with [`StoreError::DataFileMissing`] if the pointer survives but
    /// its target was removed from disk.
    pub fn data_path(&self, id: DatasetId) -> StoreResult<PathBuf> {
        let dir = self.layout.dataset_dir(&id);
        match dsv_refs::resolve_pointer(&dir, VersionKind::Data) {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Err(StoreError::DataNotFound(id)),
            Err(RefError::Dangling { target, .. }) => {
                Err(StoreError::DataFileMissing { id, path: target })
            }
            Err(e) => Err(e.into()),
        }
    }

    // ---- Lifecycle ----

    /// `true` only if both the current data and the current metadata exist.
    pub fn dataset_exists(&self, id: DatasetId) -> bool {
        VersionKind::ALL
            .iter()
            .all(|kind| self.layout.pointer_path(&id, *kind).is_file())
    }

    /// `true` if the dataset directory exists, whatever it contains.
    pub fn dataset_dir_exists(&self, id: DatasetId) -> bool {
        self.layout.dir_exists(&id)
    }

    /// Remove every version and pointer of a dataset, and the dataset
    /// directory. Deleting an absent dataset is a no-op.
    pub fn delete_dataset(&self, id: DatasetId) -> StoreResult<()> {
        let guard = self.locks.acquire(id);
        let removed = self.layout.remove_dir(&id)?;
        self.locks.forget(&guard);
        guard.release();

        if removed {
            info!(dataset = %id, "dataset deleted");
        }
        Ok(())
    }

    /// Ids of every dataset under the root.
    pub fn list_datasets(&self) -> StoreResult<Vec<DatasetId>> {
        Ok(self.layout.dataset_ids()?)
    }

    // ---- History ----

    /// Every version of `kind` for a dataset, oldest first.
    pub fn list_versions(&self, id: DatasetId, kind: VersionKind) -> StoreResult<Vec<VersionName>> {
        if !self.layout.dir_exists(&id) {
            return Err(StoreError::DatasetNotFound(id));
        }
        Ok(dsv_refs::list_versions(&self.layout.dataset_dir(&id), kind)?)
    }

    /// The version the current pointer of `kind` names, if any.
    pub fn current_version(
        &self,
        id: DatasetId,
        kind: VersionKind,
    ) -> StoreResult<Option<VersionName>> {
        Ok(dsv_refs::read_pointer(&self.layout.dataset_dir(&id), kind)?)
    }

    /// Contents of one historical version.
    pub fn read_version(&self, id: DatasetId, version: &VersionName) -> StoreResult<Vec<u8>> {
        read_file(&self.layout.version_path(&id, version))?.ok_or(StoreError::VersionNotFound {
            id,
            version: *version,
        })
    }

    // ---- Internals ----

    fn read_current_metadata(&self, id: &DatasetId) -> StoreResult<Option<Metadata>> {
        let Some(bytes) = read_file(&self.layout.pointer_path(id, VersionKind::Metadata))? else {
            return Ok(None);
        };
        dsv_merge::decode(&bytes)
            .map(Some)
            .map_err(|e| StoreError::CorruptMetadata {
                id: *id,
                reason: e.to_string(),
            })
    }

    fn write_metadata_version(
        &self,
        id: &DatasetId,
        metadata: &Metadata,
    ) -> StoreResult<WrittenVersion> {
        let bytes = dsv_merge::encode(metadata)?;
        self.write_version(id, VersionKind::Metadata, &bytes)
    }

    /// Write a version and swap the pointer onto it. Caller holds the lock.
    fn write_version(
        &self,
        id: &DatasetId,
        kind: VersionKind,
        bytes: &[u8],
    ) -> StoreResult<WrittenVersion> {
        let dir = self.layout.dataset_dir(id);
        // An absent or unreadable pointer falls back to the newest version
        // on disk, so the new stamp still sorts after every existing one.
        let current = match dsv_refs::read_pointer(&dir, kind) {
            Ok(Some(current)) => Some(current),
            Ok(None) | Err(_) => dsv_refs::latest_version(&dir, kind)?,
        };
        let written = self.writer.write(&dir, kind, bytes, current.as_ref())?;
        dsv_refs::swap_pointer(&dir, &written.name)?;
        Ok(written)
    }
}

impl std::fmt::Debug for FsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStore")
            .field("root", &self.layout.root())
            .field("locks", &self.locks)
            .finish()
    }
}

/// Read a file through any symlinks; `Ok(None)` if it (or its target) is absent.
fn read_file(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
