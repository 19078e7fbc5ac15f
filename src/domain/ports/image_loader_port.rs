//! Port definition for image loading.

use crate::domain::entities::{CellBox, ImageId, LoadedImage};

/// Result type for image operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur while loading an image.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Image not found in cache.
    #[error("Image not found: {0}")]
    NotFound(String),
    /// Failed to decode image.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// Network error during download.
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Loads images, checking caches first then network.
#[async_trait::async_trait]
pub trait ImageLoaderPort: Send + Sync {
    /// Loads and scales an image to fit `cells` half-block cells.
    async fn load(&self, id: &ImageId, url: &str, cells: CellBox) -> CacheResult<LoadedImage>;
}
