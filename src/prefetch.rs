//! Full-resolution image prefetcher for the slideshow view
//!
//! Requests go into a small FIFO. When it is full the oldest request is
//! dropped, since the most recent navigation is what the viewer is waiting
//! for. A single thread decodes one request at a time, scaled to fit the
//! requested size. Nothing is cached; failures are skipped.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use image::DynamicImage;

use crate::error::{CacheError, CacheResult};
use crate::imaging::{self, Size};

/// Default number of queued requests.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// A pending decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchRequest {
    pub path: PathBuf,
    pub target: Size,
}

/// A decoded image, fitted inside the requested size.
#[derive(Debug, Clone)]
pub struct PrefetchResult {
    pub path: PathBuf,
    pub target: Size,
    pub image: DynamicImage,
}

/// Bounded FIFO of prefetch requests.
#[derive(Debug)]
pub struct PrefetchQueue {
    requests: VecDeque<PrefetchRequest>,
    capacity: usize,
}

impl PrefetchQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            requests: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a request, dropping and returning the oldest one if full.
    pub fn push(&mut self, request: PrefetchRequest) -> Option<PrefetchRequest> {
        let dropped = if self.requests.len() >= self.capacity {
            self.requests.pop_front()
        } else {
            None
        };
        self.requests.push_back(request);
        dropped
    }

    /// Take the oldest request.
    pub fn pop(&mut self) -> Option<PrefetchRequest> {
        self.requests.pop_front()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrefetchRequest> {
        self.requests.iter()
    }
}

struct QueueState {
    queue: PrefetchQueue,
    abort: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the prefetch thread.
pub struct Prefetcher {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Prefetcher {
    /// Spawn the prefetch thread with a queue of `capacity` requests.
    pub fn spawn(capacity: usize, results: Sender<PrefetchResult>) -> CacheResult<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                queue: PrefetchQueue::new(capacity),
                abort: false,
            }),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("prefetch-worker".to_string())
            .spawn(move || run(worker_shared, results))
            .map_err(CacheError::Spawn)?;

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Queue a decode of `path` fitted inside `target`.
    ///
    /// Returns the request that was dropped to make room, if any.
    pub fn submit(&self, path: impl Into<PathBuf>, target: Size) -> Option<PrefetchRequest> {
        let mut state = self.shared.lock();
        let dropped = state.queue.push(PrefetchRequest {
            path: path.into(),
            target,
        });
        if let Some(old) = &dropped {
            tracing::debug!(path = %old.path.display(), "prefetch queue full, dropped oldest");
        }
        self.shared.wake.notify_one();
        dropped
    }

    /// Requests not yet picked up by the worker, oldest first.
    pub fn pending(&self) -> Vec<PrefetchRequest> {
        self.shared.lock().queue.iter().cloned().collect()
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
                tracing::warn!("prefetch worker panicked");
            }
        }
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn next_request(shared: &Shared) -> Option<PrefetchRequest> {
    let mut state = shared.lock();
    loop {
        if state.abort {
            return None;
        }
        if let Some(request) = state.queue.pop() {
            return Some(request);
        }
        state = shared
            .wake
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

fn run(shared: Arc<Shared>, results: Sender<PrefetchResult>) {
    while let Some(request) = next_request(&shared) {
        match imaging::decode_fitted(&request.path, request.target) {
            Ok(image) => {
                let _ = results.send(PrefetchResult {
                    path: request.path,
                    target: request.target,
                    image,
                });
            }
            Err(e) => {
                tracing::debug!(path = %request.path.display(), error = %e, "prefetch skipped");
            }
        }
    }
}
