//! Subtree fingerprints used as cache keys
//!
//! A fingerprint is the node path plus a BLAKE3 digest over every entry below
//! the node: its relative path and its newest timestamp (`max(ctime, mtime)`).
//! Content is never read. The digest is always computed from a full rescan.

use crate::error::RoError;
use crate::path;
use blake3::Hasher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Cache key for one node: `(path, digest)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub path: PathBuf,
    pub digest: String,
}

impl Fingerprint {
    /// String form used by key/value backends
    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path.display(), self.digest)
    }
}

/// Compute the fingerprint of the subtree rooted at `root`
pub fn compute(root: &Path) -> Result<Fingerprint, RoError> {
    if !root.is_dir() {
        return Err(RoError::NotFound(format!("{:?} is not a directory", root)));
    }

    let entries = scan(root);
    let joined = entries
        .iter()
        .map(|(relative, stamp)| format!("{}@{}", relative, stamp))
        .collect::<Vec<_>>()
        .join(", ");

    let mut hasher = Hasher::new();
    hasher.update(joined.as_bytes());
    let digest = hex::encode(hasher.finalize().as_bytes());

    debug!(path = %root.display(), entries = entries.len(), %digest, "Computed fingerprint");

    Ok(Fingerprint {
        path: root.to_path_buf(),
        digest,
    })
}

/// Collect sorted `(relative_path, timestamp)` pairs for every entry under `root`
///
/// Entries that cannot be read are skipped rather than failing the scan.
/// Hidden entries are not part of a node and are skipped too.
pub fn scan(root: &Path) -> Vec<(String, String)> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                trace!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let relative = match path::relative_to(entry.path(), root) {
            Some(relative) => relative,
            None => continue,
        };
        if path::is_hidden(&relative) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                trace!(path = %entry.path().display(), "Skipping entry without metadata: {}", e);
                continue;
            }
        };

        if let Some(stamp) = newest_timestamp(&metadata) {
            entries.push((relative, format_timestamp(&stamp)));
        }
    }

    entries.sort();
    entries
}

/// `max(ctime, mtime)` for an entry
fn newest_timestamp(metadata: &Metadata) -> Option<DateTime<Utc>> {
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let changed = change_time(metadata);
    match (modified, changed) {
        (Some(m), Some(c)) => Some(m.max(c)),
        (m, c) => m.or(c),
    }
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    use std::os::unix::fs::MetadataExt;
    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
}

#[cfg(not(unix))]
fn change_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    metadata.created().ok().map(DateTime::<Utc>::from)
}

/// RFC 3339 in UTC with exactly two fractional digits
pub fn format_timestamp(stamp: &DateTime<Utc>) -> String {
    format!(
        "{}.{:02}Z",
        stamp.format("%Y-%m-%dT%H:%M:%S"),
        stamp.timestamp_subsec_nanos() / 10_000_000
    )
}
