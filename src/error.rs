//! Error types for cache and image operations.
//!
//! Background workers never propagate these: a failed item is logged and
//! skipped. They surface only from explicit calls like `CacheStore::store`
//! or `CacheStore::persist`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the thumbnail cache and image decoding.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Image could not be decoded or encoded.
    #[error("Image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image header reported a zero-sized image.
    #[error("Invalid image dimensions: {path}")]
    InvalidDimensions { path: PathBuf },

    /// The cache was cleared while this thumbnail was being written.
    #[error("Cache cleared while writing {path}")]
    Cleared { path: PathBuf },

    /// Background thread could not be started.
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// Metadata record could not be serialized.
    #[error("Metadata serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        CacheError::Image {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the file simply isn't there.
    pub fn is_not_found(&self) -> bool {
        match self {
            CacheError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            CacheError::Image {
                source: image::ImageError::IoError(e),
                ..
            } => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
