use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::metadata::Metadata;

/// How incoming metadata combines with the stored document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Shallow union; keys in the incoming document win.
    Overlay,
    /// The incoming document replaces the stored one wholesale.
    #[default]
    Override,
}

impl MergeMode {
    /// Map the boolean `overlay` flag used by callers onto a mode.
    pub fn from_overlay(overlay: bool) -> Self {
        if overlay {
            MergeMode::Overlay
        } else {
            MergeMode::Override
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, MergeMode::Overlay)
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Overlay => f.write_str("overlay"),
            MergeMode::Override => f.write_str("override"),
        }
    }
}

impl FromStr for MergeMode {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlay" => Ok(MergeMode::Overlay),
            "override" => Ok(MergeMode::Override),
            _ => Err(MergeError::InvalidMode(s.to_string())),
        }
    }
}

/// Combine `current` and `incoming` according to `mode`.
///
/// The merge is shallow: a nested object under a key present in `incoming`
/// replaces the stored value wholesale.
pub fn merge(current: Metadata, incoming: Metadata, mode: MergeMode) -> Metadata {
    match mode {
        MergeMode::Override => incoming,
        MergeMode::Overlay => {
            let mut merged = current;
            for (key, value) in incoming {
                merged.insert(key, value);
            }
            merged
        }
    }
}
