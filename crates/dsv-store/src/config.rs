use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Filesystem store settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory holding one subdirectory per dataset.
    pub root: PathBuf,
    /// `fsync` each version file before its pointer is swapped.
    pub sync_writes: bool,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/tmp/_datasets"),
            sync_writes: false,
        }
    }
}
