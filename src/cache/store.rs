//! Thumbnail store backed by a cache directory and a JSON metadata record.
//!
//! Thumbnail files are named by the SHA-256 of the source path, so the same
//! source always lands in the same file. The metadata map lives behind a
//! mutex; encoding and writing happen outside it so a slow thumbnail never
//! blocks lookups from other threads. A clear generation counter, bumped
//! under the same mutex, lets a write that raced `clear_all` discard itself.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use image::DynamicImage;
use sha2::{Digest, Sha256};

use super::entry::{CacheEntry, MetadataRecord};
use crate::clock::{mtime_millis, now_millis};
use crate::error::{CacheError, CacheResult};
use crate::imaging;

/// File name of the metadata record inside the cache directory.
pub const METADATA_FILENAME: &str = "cache_metadata.json";

/// Extension given to every generated thumbnail file.
pub const THUMBNAIL_EXTENSION: &str = "thumb";

/// Default JPEG quality for generated thumbnails.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Persistent source-path to thumbnail mapping.
pub struct CacheStore {
    dir: PathBuf,
    metadata_path: PathBuf,
    jpeg_quality: u8,
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    /// Bumped by every `clear_all`, only while `entries` is locked
    generation: AtomicU64,
}

impl CacheStore {
    /// Create a store over `dir` without touching the filesystem.
    pub fn new(dir: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        let dir = dir.into();
        Self {
            metadata_path: dir.join(METADATA_FILENAME),
            dir,
            jpeg_quality,
            entries: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Create the cache directory if needed and restore persisted metadata.
    pub fn open(dir: impl Into<PathBuf>, jpeg_quality: u8) -> CacheResult<Self> {
        let store = Self::new(dir, jpeg_quality);
        fs::create_dir_all(&store.dir).map_err(|e| CacheError::io(&store.dir, e))?;
        store.restore();
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of `clear_all` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Deterministic thumbnail location for a source path.
    ///
    /// The digest covers the raw path bytes, so paths that differ only in
    /// invalid UTF-8 still get distinct files.
    pub fn cache_file_for(&self, source: &Path) -> PathBuf {
        let digest = Sha256::digest(source.as_os_str().as_encoded_bytes());
        self.dir
            .join(format!("{}.{}", hex::encode(digest), THUMBNAIL_EXTENSION))
    }

    /// Return the entry for `source` if it is still valid.
    ///
    /// Valid means the source's current mtime equals the recorded one and the
    /// thumbnail file still exists. Only `stat` calls are made.
    pub fn lookup(&self, source: &Path) -> Option<CacheEntry> {
        let entry = self.lock().get(source).cloned()?;
        let meta = fs::metadata(source).ok()?;
        if !entry.matches_mtime(mtime_millis(&meta)) || !entry.cache_file.is_file() {
            return None;
        }
        Some(entry)
    }

    /// Raw entry regardless of validity.
    pub fn get(&self, source: &Path) -> Option<CacheEntry> {
        self.lock().get(source).cloned()
    }

    /// Encode `thumbnail` as JPEG, write it, and upsert the entry.
    ///
    /// On any write failure no entry is recorded.
    pub fn store(
        &self,
        source: &Path,
        thumbnail: &DynamicImage,
        source_mtime: i64,
    ) -> CacheResult<CacheEntry> {
        self.store_for_generation(source, thumbnail, source_mtime, self.generation())
    }

    /// Like `store`, but only if no `clear_all` has run since `generation`
    /// was read. Otherwise the written file is deleted again and
    /// `CacheError::Cleared` is returned.
    pub fn store_for_generation(
        &self,
        source: &Path,
        thumbnail: &DynamicImage,
        source_mtime: i64,
        generation: u64,
    ) -> CacheResult<CacheEntry> {
        let cache_file = self.cache_file_for(source);
        let bytes = imaging::encode_jpeg(thumbnail, self.jpeg_quality, &cache_file)?;

        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let tmp = cache_file.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(|e| CacheError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &cache_file) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::io(&cache_file, e));
        }
        let size_bytes = fs::metadata(&cache_file)
            .map_err(|e| CacheError::io(&cache_file, e))?
            .len();

        let entry = CacheEntry {
            source_path: source.to_path_buf(),
            cache_file,
            source_mtime,
            size_bytes,
            last_access: now_millis(),
        };

        let mut entries = self.lock();
        if self.generation() != generation {
            let _ = delete_file(&entry.cache_file);
            return Err(CacheError::Cleared {
                path: source.to_path_buf(),
            });
        }
        entries.insert(source.to_path_buf(), entry.clone());
        Ok(entry)
    }

    /// Mark an entry as just served. Returns false if there is no entry.
    pub fn touch(&self, source: &Path) -> bool {
        self.touch_at(source, now_millis())
    }

    /// Set an entry's last access time explicitly.
    pub fn touch_at(&self, source: &Path, last_access: i64) -> bool {
        match self.lock().get_mut(source) {
            Some(entry) => {
                entry.last_access = last_access;
                true
            }
            None => false,
        }
    }

    /// Insert or replace an entry as-is.
    pub fn insert_entry(&self, entry: CacheEntry) {
        self.lock().insert(entry.source_path.clone(), entry);
    }

    /// Delete the thumbnail file and drop the entry.
    ///
    /// A missing file counts as deleted. Any other deletion error leaves the
    /// entry in place.
    pub fn remove(&self, source: &Path) -> CacheResult<Option<CacheEntry>> {
        let mut entries = self.lock();
        let Some(entry) = entries.get(source) else {
            return Ok(None);
        };
        delete_file(&entry.cache_file)?;
        Ok(entries.remove(source))
    }

    /// Delete every file in the cache directory and empty the metadata map.
    ///
    /// Individual deletion failures are logged, never returned. The metadata
    /// record is deleted along with everything else; a missing record
    /// restores as an empty cache.
    pub fn clear_all(&self) -> CacheResult<usize> {
        let mut entries = self.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let mut removed = 0;

        if let Ok(read_dir) = fs::read_dir(&self.dir) {
            for dirent in read_dir.flatten() {
                let path = dirent.path();
                if !path.is_file() {
                    continue;
                }
                match delete_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(error = %e, "failed to delete cache file"),
                }
            }
        }
        entries.clear();

        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        tracing::info!(removed, dir = %self.dir.display(), "cache cleared");
        Ok(removed)
    }

    /// Write the full metadata map to the record file.
    pub fn persist(&self) -> CacheResult<()> {
        let record = {
            let entries = self.lock();
            MetadataRecord::from_entries(entries.values())
        };
        self.write_record(&record)?;
        tracing::debug!(entries = record.len(), "cache metadata persisted");
        Ok(())
    }

    fn write_record(&self, record: &MetadataRecord) -> CacheResult<()> {
        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.metadata_path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| CacheError::io(&tmp, e))?;
        fs::rename(&tmp, &self.metadata_path).map_err(|e| CacheError::io(&self.metadata_path, e))
    }

    /// Replace the in-memory map with the persisted record.
    ///
    /// A missing or corrupt record yields an empty cache. Entries whose
    /// thumbnail path is not the one this store would use for their source
    /// are dropped. Returns the number of entries loaded.
    pub fn restore(&self) -> usize {
        let record = match fs::read_to_string(&self.metadata_path) {
            Ok(contents) => MetadataRecord::parse(&contents).unwrap_or_else(|| {
                tracing::warn!(
                    path = %self.metadata_path.display(),
                    "cache metadata is corrupt, starting cold"
                );
                MetadataRecord::default()
            }),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, "cache metadata unreadable, starting cold");
                }
                MetadataRecord::default()
            }
        };

        let mut entries = self.lock();
        entries.clear();
        for entry in record.into_entries() {
            if entry.cache_file != self.cache_file_for(&entry.source_path) {
                tracing::warn!(
                    source = %entry.source_path.display(),
                    cache_file = %entry.cache_file.display(),
                    "ignoring cache entry with unexpected thumbnail path"
                );
                continue;
            }
            entries.insert(entry.source_path.clone(), entry);
        }
        tracing::debug!(entries = entries.len(), "cache metadata restored");
        entries.len()
    }

    /// Sum of `size_bytes` over all entries, recomputed on every call.
    pub fn total_size(&self) -> u64 {
        self.lock().values().map(|e| e.size_bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of all entries sorted by source path.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut all: Vec<CacheEntry> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        all
    }
}

/// Remove a file, treating "already gone" as success.
pub(crate) fn delete_file(path: &Path) -> CacheResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(path, e)),
    }
}
