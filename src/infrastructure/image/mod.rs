//! Image loading with memory and disk caches.

mod disk_cache;
mod loader;
mod memory_cache;

pub use disk_cache::DiskImageCache;
pub use loader::{ImageLoader, ImageLoaderConfig, scale_to_cells};
pub use memory_cache::MemoryImageCache;
