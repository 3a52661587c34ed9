//! Cache usage statistics

use std::path::PathBuf;

use humansize::{format_size, BINARY};

use super::store::CacheStore;

/// Snapshot of cache usage against its budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub directory: PathBuf,
    pub entries: usize,
    pub total_bytes: u64,
    pub budget_bytes: u64,
    /// Oldest last-access timestamp (epoch ms), if any entries exist
    pub oldest_access: Option<i64>,
}

impl CacheStats {
    pub fn collect(store: &CacheStore, budget_bytes: u64) -> Self {
        let entries = store.entries();
        Self {
            directory: store.dir().to_path_buf(),
            entries: entries.len(),
            total_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            budget_bytes,
            oldest_access: entries.iter().map(|e| e.last_access).min(),
        }
    }

    /// Usage as a percentage of the budget.
    pub fn usage_percent(&self) -> f64 {
        if self.budget_bytes == 0 {
            0.0
        } else {
            self.total_bytes as f64 * 100.0 / self.budget_bytes as f64
        }
    }

    pub fn size_human(&self) -> String {
        format_size(self.total_bytes, BINARY)
    }

    /// Format a summary for display
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Thumbnail cache: {} of {} ({:.1}%)\n   Entries: {}\n   Directory: {}",
            self.size_human(),
            format_size(self.budget_bytes, BINARY),
            self.usage_percent(),
            self.entries,
            self.directory.display()
        );

        if let Some(oldest) = self
            .oldest_access
            .and_then(chrono::DateTime::from_timestamp_millis)
        {
            summary.push_str(&format!(
                "\n   Least recently used: {}",
                oldest.format("%Y-%m-%d %H:%M")
            ));
        }

        summary
    }
}
