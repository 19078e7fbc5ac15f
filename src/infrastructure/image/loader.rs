//! Image loading orchestrator.
//!
//! Lookups go memory -> disk -> network; every result is scaled to the
//! requested cell box before being cached in memory.

use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;
use image::imageops::FilterType;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::disk_cache::DiskImageCache;
use super::memory_cache::MemoryImageCache;
use crate::domain::entities::{CellBox, ImageId, ImageSource, LoadedImage};
use crate::domain::ports::{CacheError, CacheResult, ImageLoaderPort};

/// Configuration for the image loader.
#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    pub memory_entries: usize,
    pub max_concurrent_downloads: usize,
    pub timeout_secs: u64,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            memory_entries: super::memory_cache::DEFAULT_MEMORY_ENTRIES,
            max_concurrent_downloads: 4,
            timeout_secs: 30,
        }
    }
}

pub struct ImageLoader {
    memory: MemoryImageCache,
    disk: Option<Arc<DiskImageCache>>,
    http: reqwest::Client,
    downloads: Semaphore,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("memory_entries", &self.memory.len())
            .field("disk", &self.disk.is_some())
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Creates a loader; without a disk cache every miss goes to the network.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &ImageLoaderConfig, disk: Option<Arc<DiskImageCache>>) -> CacheResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CacheError::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            memory: MemoryImageCache::new(config.memory_entries),
            disk,
            http,
            downloads: Semaphore::new(config.max_concurrent_downloads.max(1)),
        })
    }

    /// Creates a loader backed by the platform cache directory, falling back
    /// to memory only when that directory is unusable.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub async fn with_defaults() -> CacheResult<Self> {
        let disk = match DiskImageCache::default_location().await {
            Ok(disk) => Some(Arc::new(disk)),
            Err(e) => {
                warn!(error = %e, "Image disk cache unavailable");
                None
            }
        };
        Self::new(&ImageLoaderConfig::default(), disk)
    }

    async fn download(&self, url: &str) -> CacheResult<Bytes> {
        let _permit = self
            .downloads
            .acquire()
            .await
            .map_err(|e| CacheError::NetworkError(e.to_string()))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::NetworkError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CacheError::NetworkError(format!("HTTP {}", response.status())));
        }

        response
            .bytes()
            .await
            .map_err(|e| CacheError::NetworkError(format!("Failed to read body: {e}")))
    }

    fn finish(&self, id: &ImageId, cells: CellBox, image: DynamicImage, source: ImageSource) -> LoadedImage {
        let image = Arc::new(image);
        self.memory.put(id.clone(), cells, image.clone());
        LoadedImage {
            id: id.clone(),
            image,
            source,
        }
    }
}

/// Decodes and scales off the async runtime.
async fn decode_scaled(bytes: Bytes, cells: CellBox) -> CacheResult<DynamicImage> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|img| scale_to_cells(&img, cells))
            .map_err(|e| CacheError::DecodeError(format!("Failed to decode image: {e}")))
    })
    .await
    .map_err(|e| CacheError::DecodeError(format!("Decode task panicked: {e}")))?
}

/// Each cell shows two vertically stacked pixels.
#[must_use]
pub fn scale_to_cells(image: &DynamicImage, cells: CellBox) -> DynamicImage {
    let width = u32::from(cells.width.max(1));
    let height = u32::from(cells.height.max(1)) * 2;
    image.resize(width, height, FilterType::Triangle)
}

#[async_trait::async_trait]
impl ImageLoaderPort for ImageLoader {
    async fn load(&self, id: &ImageId, url: &str, cells: CellBox) -> CacheResult<LoadedImage> {
        if let Some(image) = self.memory.get(id, cells) {
            return Ok(LoadedImage {
                id: id.clone(),
                image,
                source: ImageSource::MemoryCache,
            });
        }

        if let Some(disk) = &self.disk
            && let Some(bytes) = disk.get_bytes(id).await
        {
            match decode_scaled(Bytes::from(bytes), cells).await {
                Ok(image) => return Ok(self.finish(id, cells, image, ImageSource::DiskCache)),
                Err(e) => warn!(id = %id, error = %e, "Discarding unreadable cached image"),
            }
        }

        debug!(id = %id, url, "Downloading image");
        let bytes = self.download(url).await?;

        if let Some(disk) = self.disk.clone() {
            let id = id.clone();
            let bytes = bytes.clone();
            tokio::spawn(async move {
                if let Err(e) = disk.put_bytes(&id, &bytes).await {
                    warn!(id = %id, error = %e, "Failed to cache image to disk");
                }
            });
        }

        let image = decode_scaled(bytes, cells).await?;
        Ok(self.finish(id, cells, image, ImageSource::Network))
    }
}
