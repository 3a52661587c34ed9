//! Messages sent from the thumbnail worker to its consumer.

use std::path::PathBuf;

use image::DynamicImage;

/// A thumbnail ready for display at `index` of the current path list.
#[derive(Debug, Clone)]
pub struct ThumbnailResult {
    /// Assignment this result was produced for
    pub revision: u64,
    pub index: usize,
    pub path: PathBuf,
    pub image: DynamicImage,
    /// True when served from an existing cache file
    pub cached: bool,
}

/// Per-walk counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Thumbnails newly generated
    pub generated: usize,
    /// Thumbnails served from cache files
    pub reused: usize,
    /// Indices already delivered earlier in the same assignment
    pub unchanged: usize,
    /// Missing or undecodable sources
    pub skipped: usize,
}

/// Everything the thumbnail worker can report.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A thumbnail was produced or loaded from cache.
    Thumbnail(ThumbnailResult),
    /// A walk over the whole list finished without being restarted.
    PassComplete { revision: u64, stats: PassStats },
    /// A clear-cache request has finished.
    CacheCleared,
}

impl WorkerEvent {
    /// The thumbnail payload, if this is a thumbnail event.
    pub fn thumbnail(&self) -> Option<&ThumbnailResult> {
        match self {
            WorkerEvent::Thumbnail(result) => Some(result),
            _ => None,
        }
    }
}
