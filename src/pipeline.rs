//! Assembled image pipeline
//!
//! `ImagePipeline` owns the cache store, the thumbnail worker and the
//! prefetcher, and hands the consumer one receiver per result stream.
//! Results are delivered as messages; the consumer drains them on its own
//! thread.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::cache::{budget_bytes_from_mb, CacheStats, CacheStore, EvictionReport, Evictor};
use crate::config::Config;
use crate::error::CacheResult;
use crate::imaging::Size;
use crate::prefetch::{PrefetchRequest, PrefetchResult, Prefetcher};
use crate::worker::{PriorityWindow, PriorityWorker, WorkerEvent, WorkerSettings};

/// Cache, thumbnail worker and prefetcher wired together.
pub struct ImagePipeline {
    store: Arc<CacheStore>,
    thumbnails: PriorityWorker,
    prefetcher: Prefetcher,
    events: Sender<WorkerEvent>,
    budget_bytes: AtomicU64,
    closed: bool,
}

impl ImagePipeline {
    /// Open the cache directory from `config`, restore its metadata and
    /// start both background threads.
    pub fn start(
        config: &Config,
    ) -> CacheResult<(Self, Receiver<WorkerEvent>, Receiver<PrefetchResult>)> {
        let store = Arc::new(CacheStore::open(
            config.cache_directory(),
            config.cache.jpeg_quality,
        )?);
        Self::with_store(store, config)
    }

    /// Start the background threads on an already opened store.
    pub fn with_store(
        store: Arc<CacheStore>,
        config: &Config,
    ) -> CacheResult<(Self, Receiver<WorkerEvent>, Receiver<PrefetchResult>)> {
        let settings = WorkerSettings::from_config(&config.cache);
        let (event_tx, event_rx) = mpsc::channel();
        let (image_tx, image_rx) = mpsc::channel();

        let thumbnails = PriorityWorker::spawn(Arc::clone(&store), settings, event_tx.clone())?;
        let prefetcher = Prefetcher::spawn(config.prefetch.queue_capacity, image_tx)?;

        tracing::debug!(
            dir = %store.dir().display(),
            entries = store.len(),
            "image pipeline started"
        );

        let pipeline = Self {
            store,
            thumbnails,
            prefetcher,
            events: event_tx,
            budget_bytes: AtomicU64::new(settings.budget_bytes),
            closed: false,
        };
        Ok((pipeline, event_rx, image_rx))
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn cache_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Replace the folder contents the worker walks. Returns the revision
    /// that results for this list will carry.
    pub fn set_paths(&self, paths: Vec<PathBuf>) -> u64 {
        self.thumbnails.set_paths(paths)
    }

    /// Move the visible window. Returns the current revision.
    pub fn set_window(&self, window: PriorityWindow) -> u64 {
        self.thumbnails.set_window(window)
    }

    /// Shorthand for showing page `page` of `per_page` thumbnails.
    pub fn show_page(&self, page: usize, per_page: usize) -> u64 {
        self.set_window(PriorityWindow::for_page(page, per_page))
    }

    pub fn revision(&self) -> u64 {
        self.thumbnails.revision()
    }

    /// Change the eviction budget. Applied at the worker's next housekeeping.
    pub fn set_budget_mb(&self, megabytes: f64) {
        let budget_bytes = budget_bytes_from_mb(megabytes);
        self.budget_bytes.store(budget_bytes, Ordering::Relaxed);
        self.thumbnails.set_budget_bytes(budget_bytes);
    }

    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes.load(Ordering::Relaxed)
    }

    /// Queue a full-size decode fitted to `target`.
    ///
    /// Returns the oldest pending request if it was dropped to make room.
    pub fn request_image(
        &self,
        path: impl Into<PathBuf>,
        target: Size,
    ) -> Option<PrefetchRequest> {
        self.prefetcher.submit(path, target)
    }

    /// Delete every cached file and forget all entries.
    ///
    /// The worker restarts its walk so thumbnails are regenerated, and a
    /// `WorkerEvent::CacheCleared` is sent ahead of the new results.
    pub fn clear_cache(&self) -> CacheResult<usize> {
        let removed = self.store.clear_all()?;
        self.thumbnails.restart_with(|| {
            let _ = self.events.send(WorkerEvent::CacheCleared);
        });
        tracing::info!(removed, "thumbnail cache cleared");
        Ok(removed)
    }

    /// Run eviction immediately against the current budget.
    pub fn evict_now(&self) -> EvictionReport {
        Evictor::new(self.budget_bytes()).run(&self.store)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats::collect(&self.store, self.budget_bytes())
    }

    /// Stop both threads and write the metadata record.
    pub fn shutdown(mut self) -> CacheResult<()> {
        self.close()
    }

    fn close(&mut self) -> CacheResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.thumbnails.stop();
        self.prefetcher.stop();
        self.store.persist()
    }
}

impl Drop for ImagePipeline {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to persist cache metadata on shutdown");
        }
    }
}
