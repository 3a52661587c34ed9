//! Background thumbnail worker
//!
//! A single thread walks the whole path list, serving the visible window
//! first. Every change to the list or the window bumps a revision number;
//! the worker checks it between items and restarts its walk from the new
//! priority order as soon as it moves.
//!
//! # Lifecycle
//!
//! - Idle while no paths are assigned
//! - Walk in priority order, emitting `WorkerEvent::Thumbnail` per item
//! - After a completed walk, wait up to the idle interval, then walk again
//!   to pick up sources that appeared or changed
//! - Eviction runs on every wake and at least once per idle interval while
//!   walking, whatever the walk produced
//!
//! Shutdown sets an abort flag, wakes the thread and joins it.

pub mod event;
pub mod window;

pub use event::{PassStats, ThumbnailResult, WorkerEvent};
pub use window::{priority_order, PriorityWindow};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::cache::{CacheStore, Evictor};
use crate::clock::mtime_millis;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::imaging;

/// Default cap on the largest thumbnail side, in pixels.
pub const DEFAULT_THUMBNAIL_MAX_DIM: u32 = 300;

/// Default bounded wait between idle walks.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Tunables for the thumbnail worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Largest thumbnail side in pixels
    pub max_dim: u32,
    /// Idle wait and housekeeping period
    pub idle_interval: Duration,
    /// Initial eviction budget in bytes
    pub budget_bytes: u64,
}

impl WorkerSettings {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            max_dim: config.thumbnail_max_dim.max(1),
            idle_interval: Duration::from_millis(config.idle_interval_ms.max(1)),
            budget_bytes: config.budget_bytes(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// State shared between the owner and the worker thread.
struct Assignment {
    paths: Arc<Vec<PathBuf>>,
    window: PriorityWindow,
    revision: u64,
    budget_bytes: u64,
    abort: bool,
}

struct Shared {
    state: Mutex<Assignment>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Assignment> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the background thumbnail thread.
pub struct PriorityWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl PriorityWorker {
    /// Spawn the worker thread. It stays idle until paths are assigned.
    pub fn spawn(
        store: Arc<CacheStore>,
        settings: WorkerSettings,
        events: Sender<WorkerEvent>,
    ) -> CacheResult<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(Assignment {
                paths: Arc::new(Vec::new()),
                window: PriorityWindow::default(),
                revision: 0,
                budget_bytes: settings.budget_bytes,
                abort: false,
            }),
            wake: Condvar::new(),
        });

        let runner = WalkRunner {
            shared: Arc::clone(&shared),
            store,
            settings,
            events,
            delivered: HashMap::new(),
            delivered_revision: 0,
            last_housekeeping: Instant::now(),
        };
        let handle = thread::Builder::new()
            .name("thumbnail-worker".to_string())
            .spawn(move || runner.run())
            .map_err(CacheError::Spawn)?;

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Replace the whole path list. Always restarts the walk.
    ///
    /// Returns the new revision.
    pub fn set_paths(&self, paths: Vec<PathBuf>) -> u64 {
        let mut state = self.shared.lock();
        state.paths = Arc::new(paths);
        state.revision += 1;
        self.shared.wake.notify_all();
        state.revision
    }

    /// Move the priority window. Restarts the walk only if it changed.
    ///
    /// Returns the current revision.
    pub fn set_window(&self, window: PriorityWindow) -> u64 {
        let mut state = self.shared.lock();
        if state.window != window {
            state.window = window;
            state.revision += 1;
            self.shared.wake.notify_all();
        }
        state.revision
    }

    /// Change the eviction budget; applied on the next housekeeping tick.
    pub fn set_budget_bytes(&self, budget_bytes: u64) {
        let mut state = self.shared.lock();
        state.budget_bytes = budget_bytes;
        self.shared.wake.notify_all();
    }

    /// Bump the revision and run `notify` before the worker can observe it.
    ///
    /// Anything `notify` sends on the event channel precedes every result
    /// of the new revision.
    pub fn restart_with(&self, notify: impl FnOnce()) -> u64 {
        let mut state = self.shared.lock();
        state.revision += 1;
        notify();
        self.shared.wake.notify_all();
        state.revision
    }

    pub fn revision(&self) -> u64 {
        self.shared.lock().revision
    }

    pub fn window(&self) -> PriorityWindow {
        self.shared.lock().window
    }

    /// Number of paths in the current assignment.
    pub fn path_count(&self) -> usize {
        self.shared.lock().paths.len()
    }

    /// Signal abort, wake the thread and wait for it to exit.
    pub fn stop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.abort = true;
            self.shared.wake.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("thumbnail worker panicked");
            }
        }
    }
}

impl Drop for PriorityWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

enum WalkOutcome {
    Completed(PassStats),
    Restarted,
    Aborted,
}

enum ItemOutcome {
    Generated,
    Reused,
    Unchanged,
    Skipped,
    /// Result was ready but the assignment moved on before it was sent
    Superseded,
}

/// State owned by the worker thread.
struct WalkRunner {
    shared: Arc<Shared>,
    store: Arc<CacheStore>,
    settings: WorkerSettings,
    events: Sender<WorkerEvent>,
    /// Index -> source mtime of everything emitted in `delivered_revision`
    delivered: HashMap<usize, i64>,
    delivered_revision: u64,
    last_housekeeping: Instant,
}

impl WalkRunner {
    fn run(mut self) {
        tracing::debug!("thumbnail worker started");
        while let Some((paths, window, revision)) = self.next_assignment() {
            if revision != self.delivered_revision {
                self.delivered.clear();
                self.delivered_revision = revision;
            }

            match self.walk(&paths, window, revision) {
                WalkOutcome::Aborted => break,
                WalkOutcome::Restarted => {
                    tracing::debug!(revision, "assignment changed, restarting walk");
                    continue;
                }
                WalkOutcome::Completed(stats) => {
                    tracing::info!(
                        revision,
                        generated = stats.generated,
                        reused = stats.reused,
                        unchanged = stats.unchanged,
                        skipped = stats.skipped,
                        "thumbnail pass complete"
                    );
                    let _ = self
                        .events
                        .send(WorkerEvent::PassComplete { revision, stats });
                }
            }

            if !self.idle_wait(revision) {
                break;
            }
            self.housekeeping();
        }
        tracing::debug!("thumbnail worker stopped");
    }

    /// Block until there is a non-empty path list. `None` means abort.
    fn next_assignment(&self) -> Option<(Arc<Vec<PathBuf>>, PriorityWindow, u64)> {
        let mut state = self.shared.lock();
        loop {
            if state.abort {
                return None;
            }
            if !state.paths.is_empty() {
                return Some((Arc::clone(&state.paths), state.window, state.revision));
            }
            state = self
                .shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Bounded wait after a completed walk. Returns false on abort.
    fn idle_wait(&self, revision: u64) -> bool {
        let state = self.shared.lock();
        if state.abort {
            return false;
        }
        if state.revision != revision {
            return true;
        }
        let (state, _) = self
            .shared
            .wake
            .wait_timeout(state, self.settings.idle_interval)
            .unwrap_or_else(PoisonError::into_inner);
        !state.abort
    }

    /// Run an eviction pass with the current budget.
    fn housekeeping(&mut self) {
        let budget = self.shared.lock().budget_bytes;
        let report = Evictor::new(budget).run(&self.store);
        if !report.removed.is_empty() || !report.failed.is_empty() {
            tracing::debug!(summary = %report.summary(), "housekeeping");
        }
        self.last_housekeeping = Instant::now();
    }

    /// Check abort and revision between items.
    fn still_current(&self, revision: u64) -> Result<(), WalkOutcome> {
        let state = self.shared.lock();
        if state.abort {
            Err(WalkOutcome::Aborted)
        } else if state.revision != revision {
            Err(WalkOutcome::Restarted)
        } else {
            Ok(())
        }
    }

    fn walk(&mut self, paths: &[PathBuf], window: PriorityWindow, revision: u64) -> WalkOutcome {
        let mut stats = PassStats::default();

        for index in priority_order(paths.len(), window) {
            if let Err(outcome) = self.still_current(revision) {
                return outcome;
            }
            if self.last_housekeeping.elapsed() >= self.settings.idle_interval {
                self.housekeeping();
            }

            match self.process(index, &paths[index], revision) {
                ItemOutcome::Generated => stats.generated += 1,
                ItemOutcome::Reused => stats.reused += 1,
                ItemOutcome::Unchanged => stats.unchanged += 1,
                ItemOutcome::Skipped => stats.skipped += 1,
                ItemOutcome::Superseded => {
                    return self
                        .still_current(revision)
                        .err()
                        .unwrap_or(WalkOutcome::Restarted)
                }
            }
        }

        WalkOutcome::Completed(stats)
    }

    fn process(&mut self, index: usize, path: &Path, revision: u64) -> ItemOutcome {
        let meta = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta,
            _ => {
                tracing::debug!(index, path = %path.display(), "source missing, skipping");
                return ItemOutcome::Skipped;
            }
        };
        let mtime = mtime_millis(&meta);
        let generation = self.store.generation();

        if self.delivered.get(&index) == Some(&mtime) {
            return ItemOutcome::Unchanged;
        }

        if let Some(entry) = self.store.lookup(path) {
            match imaging::decode(&entry.cache_file) {
                Ok(image) => {
                    if !self.emit(revision, index, path, image, true) {
                        return ItemOutcome::Superseded;
                    }
                    self.store.touch(path);
                    self.delivered.insert(index, mtime);
                    return ItemOutcome::Reused;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "cached thumbnail unreadable, regenerating");
                }
            }
        }

        let image = match imaging::decode_thumbnail(path, self.settings.max_dim) {
            Ok(image) => image,
            Err(e) => {
                tracing::debug!(index, error = %e, "cannot decode source, skipping");
                return ItemOutcome::Skipped;
            }
        };
        match self.store.store_for_generation(path, &image, mtime, generation) {
            Ok(_) => {}
            Err(e @ CacheError::Cleared { .. }) => {
                tracing::debug!(error = %e, "cache cleared during generation, not recorded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to write thumbnail, will retry next visit");
            }
        }
        if !self.emit(revision, index, path, image, false) {
            return ItemOutcome::Superseded;
        }
        self.delivered.insert(index, mtime);
        ItemOutcome::Generated
    }

    /// Send a thumbnail if the assignment is still `revision`.
    ///
    /// The lock is held while sending, so once `set_window` or `set_paths`
    /// returns no further result of the old revision is delivered.
    fn emit(
        &self,
        revision: u64,
        index: usize,
        path: &Path,
        image: image::DynamicImage,
        cached: bool,
    ) -> bool {
        let state = self.shared.lock();
        if state.abort || state.revision != revision {
            return false;
        }
        let _ = self.events.send(WorkerEvent::Thumbnail(ThumbnailResult {
            revision,
            index,
            path: path.to_path_buf(),
            image,
            cached,
        }));
        true
    }
}
