//! Cache entries and the on-disk metadata record.
//!
//! The record is a JSON object keyed by source path:
//!
//! ```json
//! {
//!   "/photos/a.jpg": {
//!     "last_modified": 1700000000000,
//!     "size_bytes": 18234,
//!     "last_access": 1700000500000,
//!     "cache_file": "/home/u/.config/slidecache/thumbnails/3a7b...e1.thumb"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A persisted thumbnail and the data needed to decide if it is still valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Original image this thumbnail was generated from
    pub source_path: PathBuf,
    /// Generated thumbnail file inside the cache directory
    pub cache_file: PathBuf,
    /// Source modification time (epoch ms) at generation time
    pub source_mtime: i64,
    /// Size of `cache_file` in bytes
    pub size_bytes: u64,
    /// Last time the thumbnail was served (epoch ms)
    pub last_access: i64,
}

impl CacheEntry {
    /// Whether the entry still describes a source with this modification time.
    pub fn matches_mtime(&self, source_mtime: i64) -> bool {
        self.source_mtime == source_mtime
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EntryRecord {
    last_modified: i64,
    size_bytes: u64,
    last_access: i64,
    cache_file: String,
}

/// Serialized form of the whole metadata map.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord(BTreeMap<String, EntryRecord>);

impl MetadataRecord {
    /// Build a record from live entries.
    ///
    /// JSON keys must be valid UTF-8, so entries whose source or thumbnail
    /// path is not are left out and regenerated next session.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a CacheEntry>) -> Self {
        let map = entries
            .into_iter()
            .filter_map(|entry| {
                let (Some(source), Some(cache_file)) =
                    (entry.source_path.to_str(), entry.cache_file.to_str())
                else {
                    tracing::debug!(
                        source = %entry.source_path.display(),
                        "path is not valid UTF-8, not persisting its entry"
                    );
                    return None;
                };
                Some((
                    source.to_owned(),
                    EntryRecord {
                        last_modified: entry.source_mtime,
                        size_bytes: entry.size_bytes,
                        last_access: entry.last_access,
                        cache_file: cache_file.to_owned(),
                    },
                ))
            })
            .collect();
        MetadataRecord(map)
    }

    /// Parse a record, returning `None` for anything malformed.
    pub fn parse(contents: &str) -> Option<Self> {
        serde_json::from_str(contents).ok()
    }

    /// Convert back into entries keyed by source path.
    pub fn into_entries(self) -> impl Iterator<Item = CacheEntry> {
        self.0.into_iter().map(|(source, record)| CacheEntry {
            source_path: PathBuf::from(source),
            cache_file: PathBuf::from(record.cache_file),
            source_mtime: record.last_modified,
            size_bytes: record.size_bytes,
            last_access: record.last_access,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
