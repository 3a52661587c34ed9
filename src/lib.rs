//! slidecache library
//!
//! Background thumbnail caching and image prefetching for an image viewer.
//! The consumer assigns a path list and a visible window; a worker thread
//! produces downscaled thumbnails in priority order, keeps them on disk under
//! a size budget, and a second thread decodes full images for display.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod imaging;
pub mod library;
pub mod logging;
pub mod pipeline;
pub mod prefetch;
pub mod worker;

pub use cache::{CacheEntry, CacheStats, CacheStore, EvictionReport, Evictor};
pub use config::Config;
pub use error::{CacheError, CacheResult};
pub use imaging::Size;
pub use pipeline::ImagePipeline;
pub use prefetch::{PrefetchRequest, PrefetchResult, Prefetcher};
pub use worker::{PassStats, PriorityWindow, PriorityWorker, ThumbnailResult, WorkerEvent};
