//! On-disk thumbnail cache
//!
//! `CacheStore` maps source images to downscaled JPEG files plus a JSON
//! metadata record. `Evictor` keeps the store under a byte budget using
//! least-recently-used order.

pub mod entry;
pub mod evict;
pub mod stats;
pub mod store;

pub use entry::{CacheEntry, MetadataRecord};
pub use evict::{budget_bytes_from_mb, EvictionReport, Evictor};
pub use stats::CacheStats;
pub use store::{CacheStore, DEFAULT_JPEG_QUALITY, METADATA_FILENAME, THUMBNAIL_EXTENSION};
