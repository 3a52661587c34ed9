//! Size-budget eviction over a `CacheStore`
//!
//! When the cache grows past its budget, least recently accessed entries are
//! removed until usage drops to 90% of the budget. Entries whose file can't
//! be deleted stay in the metadata so the size accounting remains honest;
//! they are retried on the next pass.

use std::path::PathBuf;

use humansize::{format_size, BINARY};

use super::store::{delete_file, CacheStore};

/// Fraction of the budget that an eviction pass reduces usage to.
pub const EVICTION_TARGET_RATIO: f64 = 0.9;

/// Smallest budget accepted, in megabytes.
pub const MIN_BUDGET_MB: f64 = 1.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Result of one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Number of entries considered
    pub scanned: usize,
    /// Total cached bytes before the pass
    pub bytes_before: u64,
    /// Total cached bytes after the pass
    pub bytes_after: u64,
    /// Source paths whose thumbnails were removed, in removal order
    pub removed: Vec<PathBuf>,
    /// Entries kept because their file could not be deleted
    pub failed: Vec<PathBuf>,
}

impl EvictionReport {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Evicted {} of {} thumbnails, {} -> {} (freed {})",
            self.removed.len(),
            self.scanned,
            format_size(self.bytes_before, BINARY),
            format_size(self.bytes_after, BINARY),
            format_size(self.bytes_reclaimed(), BINARY),
        );
        if !self.failed.is_empty() {
            line.push_str(&format!(", {} could not be deleted", self.failed.len()));
        }
        line
    }
}

/// LRU eviction policy with a byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evictor {
    budget_bytes: u64,
}

impl Evictor {
    pub fn new(budget_bytes: u64) -> Self {
        Self { budget_bytes }
    }

    /// Budget given in megabytes, clamped to at least 1 MB.
    pub fn from_megabytes(megabytes: f64) -> Self {
        Self::new(budget_bytes_from_mb(megabytes))
    }

    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }

    /// Usage an over-budget pass reduces to.
    pub fn target_bytes(&self) -> u64 {
        (self.budget_bytes as f64 * EVICTION_TARGET_RATIO) as u64
    }

    /// Run one eviction pass.
    ///
    /// No-op while usage is within budget. Otherwise entries are visited
    /// oldest access first (ties broken by source path) and removed until
    /// usage is at or below the target. The most recently used entry larger
    /// than the whole budget is left in place, so usage may stay above
    /// budget by at most that entry's size.
    pub fn run(&self, store: &CacheStore) -> EvictionReport {
        let mut entries = store.lock();
        let bytes_before: u64 = entries.values().map(|e| e.size_bytes).sum();
        let mut report = EvictionReport {
            scanned: entries.len(),
            bytes_before,
            bytes_after: bytes_before,
            ..Default::default()
        };

        if bytes_before <= self.budget_bytes {
            return report;
        }

        let mut candidates: Vec<(i64, PathBuf, PathBuf, u64)> = entries
            .values()
            .map(|e| {
                (
                    e.last_access,
                    e.source_path.clone(),
                    e.cache_file.clone(),
                    e.size_bytes,
                )
            })
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        // At most one oversized entry survives: the most recently used one
        let oversized = candidates
            .iter()
            .rev()
            .find(|c| c.3 > self.budget_bytes)
            .map(|c| c.1.clone());

        let target = self.target_bytes();
        let mut current = bytes_before;
        for (_, source, cache_file, size) in candidates {
            if current <= target {
                break;
            }
            if oversized.as_ref() == Some(&source) {
                tracing::debug!(
                    source = %source.display(),
                    size,
                    "thumbnail larger than budget, leaving it"
                );
                continue;
            }
            match delete_file(&cache_file) {
                Ok(()) => {
                    entries.remove(&source);
                    current = current.saturating_sub(size);
                    report.removed.push(source);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "eviction could not delete thumbnail, keeping entry");
                    report.failed.push(source);
                }
            }
        }

        report.bytes_after = current;
        tracing::info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            bytes_before,
            bytes_after = current,
            "eviction pass finished"
        );
        report
    }
}

/// Convert a megabyte budget to bytes, enforcing the 1 MB minimum.
pub fn budget_bytes_from_mb(megabytes: f64) -> u64 {
    let mb = if megabytes.is_finite() {
        megabytes.max(MIN_BUDGET_MB)
    } else {
        MIN_BUDGET_MB
    };
    (mb * BYTES_PER_MB) as u64
}
