//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use crate::cache::{budget_bytes_from_mb, DEFAULT_JPEG_QUALITY};
use crate::prefetch::DEFAULT_QUEUE_CAPACITY;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub prefetch: PrefetchConfig,
}

/// Thumbnail cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory (supports ~/ prefix)
    #[serde(default = "default_cache_directory")]
    pub directory: String,
    /// Size budget in megabytes; values below 1.0 are treated as 1.0
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: f64,
    /// Largest thumbnail side in pixels
    #[serde(default = "default_thumbnail_max_dim")]
    pub thumbnail_max_dim: u32,
    /// JPEG quality for generated thumbnails
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Idle wait between walks and housekeeping period
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
}

pub fn default_cache_directory() -> String {
    "~/.config/slidecache/thumbnails".to_string()
}

pub fn default_max_size_mb() -> f64 {
    100.0
}

pub fn default_thumbnail_max_dim() -> u32 {
    300
}

pub fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

pub fn default_idle_interval_ms() -> u64 {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            max_size_mb: default_max_size_mb(),
            thumbnail_max_dim: default_thumbnail_max_dim(),
            jpeg_quality: default_jpeg_quality(),
            idle_interval_ms: default_idle_interval_ms(),
        }
    }
}

impl CacheConfig {
    /// Budget in bytes with the 1 MB floor applied.
    pub fn budget_bytes(&self) -> u64 {
        budget_bytes_from_mb(self.max_size_mb)
    }
}

/// Source folder scanning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Last used image folder (empty = none)
    #[serde(default)]
    pub folder: String,
    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
    /// Shuffle instead of sorting
    #[serde(default)]
    pub random_order: bool,
    /// File extensions treated as images (case-insensitive, no dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

pub fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "bmp", "gif"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            folder: String::new(),
            recursive: false,
            random_order: false,
            extensions: default_extensions(),
        }
    }
}

/// Slideshow prefetch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

pub fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}
