//! Version kinds, stamps, and file names.
//!
//! A dataset directory holds immutable version files named
//! `<kind>-<stamp>.<ext>` plus one current pointer per kind:
//!
//! ```text
//! metadata.json          -> metadata-1718000000123.json
//! metadata-<stamp>.json
//! data.bin               -> data-1718000000456.bin
//! data-<stamp>.bin
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The artifact a version file holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionKind {
    /// Opaque binary or text payload.
    Data,
    /// JSON metadata document.
    Metadata,
}

impl VersionKind {
    /// All kinds, in directory listing order.
    pub const ALL: [VersionKind; 2] = [VersionKind::Data, VersionKind::Metadata];

    /// File name prefix of version files of this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            VersionKind::Data => "data",
            VersionKind::Metadata => "metadata",
        }
    }

    /// File extension of version files of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            VersionKind::Data => "bin",
            VersionKind::Metadata => "json",
        }
    }

    /// Name of the current pointer for this kind (e.g. `metadata.json`).
    pub fn pointer_name(&self) -> String {
        format!("{}.{}", self.prefix(), self.extension())
    }
}

impl fmt::Display for VersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for VersionKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(VersionKind::Data),
            "metadata" => Ok(VersionKind::Metadata),
            other => Err(TypeError::InvalidVersionKind(other.to_string())),
        }
    }
}

/// Millisecond wall-clock stamp of a version file.
///
/// Stamps only move forward within one `(dataset, kind)`: a writer that finds
/// its stamp taken bumps it with [`VersionStamp::next`] until the name is free.
/// Stamps are rendered in decimal without leading zeros.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionStamp(u64);

impl VersionStamp {
    /// Create a stamp from explicit milliseconds since the UNIX epoch.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Stamp for the current wall-clock time.
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    /// The stamp one millisecond later, or `None` at `u64::MAX`.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Milliseconds since the UNIX epoch.
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File name of one immutable version: `<kind>-<stamp>.<ext>`.
///
/// Ordering: `kind` first, then `stamp`, so sorting a directory listing puts
/// each kind's versions in write order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionName {
    pub kind: VersionKind,
    pub stamp: VersionStamp,
}

impl VersionName {
    pub fn new(kind: VersionKind, stamp: VersionStamp) -> Self {
        Self { kind, stamp }
    }

    /// The on-disk file name.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.kind.prefix(),
            self.stamp,
            self.kind.extension()
        )
    }

    /// The same kind, one millisecond later.
    pub fn next(&self) -> Option<Self> {
        self.stamp.next().map(|stamp| Self::new(self.kind, stamp))
    }

    /// Parse a version file name. Pointer names and foreign files are rejected.
    pub fn parse(name: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidVersionName(name.to_string());
        let (stem, ext) = name.rsplit_once('.').ok_or_else(invalid)?;
        let (prefix, digits) = stem.split_once('-').ok_or_else(invalid)?;
        let kind: VersionKind = prefix.parse().map_err(|_| invalid())?;
        if ext != kind.extension() {
            return Err(invalid());
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // Only the canonical rendering names the file on disk.
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(invalid());
        }
        let ms: u64 = digits.parse().map_err(|_| invalid())?;
        Ok(Self::new(kind, VersionStamp::from_millis(ms)))
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

impl FromStr for VersionName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pointer_names() {
        assert_eq!(VersionKind::Data.pointer_name(), "data.bin");
        assert_eq!(VersionKind::Metadata.pointer_name(), "metadata.json");
    }

    #[test]
    fn file_name_format() {
        let name = VersionName::new(VersionKind::Metadata, VersionStamp::from_millis(1000));
        assert_eq!(name.file_name(), "metadata-1000.json");
        let name = VersionName::new(VersionKind::Data, VersionStamp::from_millis(42));
        assert_eq!(format!("{name}"), "data-42.bin");
    }

    #[test]
    fn parse_version_names() {
        let name = VersionName::parse("data-1718000000123.bin").unwrap();
        assert_eq!(name.kind, VersionKind::Data);
        assert_eq!(name.stamp.as_millis(), 1_718_000_000_123);
    }

    #[test]
    fn parse_rejects_pointers_and_foreign_files() {
        assert!(VersionName::parse("data.bin").is_err());
        assert!(VersionName::parse("metadata.json").is_err());
        assert!(VersionName::parse("data-12.json").is_err());
        assert!(VersionName::parse("metadata-12.bin").is_err());
        assert!(VersionName::parse("data-.bin").is_err());
        assert!(VersionName::parse("data-+12.bin").is_err());
        assert!(VersionName::parse("blob-12.bin").is_err());
        assert!(VersionName::parse(".data.bin.tmp-1").is_err());
    }

    #[test]
    fn parse_rejects_leading_zeros() {
        assert!(VersionName::parse("data-005.bin").is_err());
        assert!(VersionName::parse("metadata-00.json").is_err());
        let zero = VersionName::parse("data-0.bin").unwrap();
        assert_eq!(zero.stamp.as_millis(), 0);
        assert_eq!(zero.file_name(), "data-0.bin");
    }

    #[test]
    fn parse_rejects_out_of_range_stamp() {
        assert!(VersionName::parse("data-18446744073709551616.bin").is_err());
        let max = VersionName::parse("data-18446744073709551615.bin").unwrap();
        assert_eq!(max.stamp.as_millis(), u64::MAX);
    }

    #[test]
    fn next_bumps_by_one_millisecond() {
        let name = VersionName::new(VersionKind::Data, VersionStamp::from_millis(7));
        let next = name.next().unwrap();
        assert_eq!(next.stamp.as_millis(), 8);
        assert_eq!(next.kind, VersionKind::Data);
    }

    #[test]
    fn next_stops_at_max_stamp() {
        assert!(VersionStamp::from_millis(u64::MAX).next().is_none());
        let last = VersionName::new(VersionKind::Metadata, VersionStamp::from_millis(u64::MAX));
        assert!(last.next().is_none());
    }

    #[test]
    fn now_produces_reasonable_timestamp() {
        // Should be after 2020-01-01 (1577836800000 ms)
        assert!(VersionStamp::now().as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn kind_parse_and_serde() {
        assert_eq!("data".parse::<VersionKind>().unwrap(), VersionKind::Data);
        assert!("blob".parse::<VersionKind>().is_err());
        let json = serde_json::to_string(&VersionKind::Metadata).unwrap();
        assert_eq!(json, "\"metadata\"");
    }

    proptest! {
        #[test]
        fn name_order_follows_stamp_order(a in 0u64..u64::MAX / 2, b in 0u64..u64::MAX / 2) {
            let na = VersionName::new(VersionKind::Metadata, VersionStamp::from_millis(a));
            let nb = VersionName::new(VersionKind::Metadata, VersionStamp::from_millis(b));
            prop_assert_eq!(na.cmp(&nb), a.cmp(&b));
            prop_assert_eq!(VersionName::parse(&na.file_name()).unwrap(), na);
        }
    }
}
