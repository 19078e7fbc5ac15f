//! Raw image bytes persisted under the user cache directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use tokio::fs;
use tracing::{debug, trace, warn};

use crate::domain::entities::ImageId;
use crate::domain::ports::{CacheError, CacheResult};

/// Size limit of the on-disk cache, 100 MB.
pub const DEFAULT_MAX_DISK_BYTES: u64 = 100 * 1024 * 1024;

const EXTENSION: &str = "img";

pub struct DiskImageCache {
    dir: PathBuf,
    max_bytes: u64,
    used_bytes: AtomicU64,
}

impl DiskImageCache {
    /// Opens (creating if needed) a cache rooted at `dir`.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or listed.
    pub async fn open(dir: PathBuf, max_bytes: u64) -> CacheResult<Self> {
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create cache dir: {e}")))?;

        let used: u64 = Self::entries(&dir)
            .await?
            .iter()
            .map(|(_, _, len)| len)
            .sum();
        debug!(dir = %dir.display(), used, "Opened image disk cache");

        Ok(Self {
            dir,
            max_bytes,
            used_bytes: AtomicU64::new(used),
        })
    }

    /// Opens the cache in the platform cache directory.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub async fn default_location() -> CacheResult<Self> {
        let dir = directories::ProjectDirs::from("com", "linuxmobile", "sidecord").map_or_else(
            || std::env::temp_dir().join("sidecord").join("images"),
            |dirs| dirs.cache_dir().join("images"),
        );
        Self::open(dir, DEFAULT_MAX_DISK_BYTES).await
    }

    fn path_for(&self, id: &ImageId) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", id.as_str()))
    }

    pub async fn get_bytes(&self, id: &ImageId) -> Option<Vec<u8>> {
        let bytes = fs::read(self.path_for(id)).await.ok();
        trace!(id = %id, hit = bytes.is_some(), "Disk cache lookup");
        bytes
    }

    /// Stores `bytes`, pruning least recently touched files once over the limit.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub async fn put_bytes(&self, id: &ImageId, bytes: &[u8]) -> CacheResult<()> {
        let path = self.path_for(id);
        let previous = fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);

        fs::write(&path, bytes)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to write cache file: {e}")))?;

        let used = self.used_bytes().saturating_sub(previous) + bytes.len() as u64;
        self.used_bytes.store(used, Ordering::Relaxed);

        if used > self.max_bytes {
            self.prune(used).await;
        }
        Ok(())
    }

    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes.load(Ordering::Relaxed)
    }

    async fn prune(&self, used: u64) {
        let Ok(mut files) = Self::entries(&self.dir).await else {
            return;
        };
        files.sort_by_key(|(_, modified, _)| *modified);

        let target = used - self.max_bytes + self.max_bytes / 10;
        let mut freed = 0u64;
        for (path, _, len) in files {
            if freed >= target {
                break;
            }
            match fs::remove_file(&path).await {
                Ok(()) => freed += len,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to prune cache file"),
            }
        }

        self.used_bytes
            .store(used.saturating_sub(freed), Ordering::Relaxed);
        debug!(freed, "Pruned image disk cache");
    }

    async fn entries(dir: &Path) -> CacheResult<Vec<(PathBuf, SystemTime, u64)>> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        let mut files = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, modified, meta.len()));
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_put_and_get_bytes() {
        let dir = TempDir::new().unwrap();
        let cache = DiskImageCache::open(dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        let id = ImageId::new("abc");

        assert!(cache.get_bytes(&id).await.is_none());
        assert_ok!(cache.put_bytes(&id, &[1, 2, 3]).await);
        assert_eq!(cache.get_bytes(&id).await, Some(vec![1, 2, 3]));
        assert_eq!(cache.used_bytes(), 3);
    }

    #[tokio::test]
    async fn test_overwrite_does_not_double_count() {
        let dir = TempDir::new().unwrap();
        let cache = DiskImageCache::open(dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        let id = ImageId::new("abc");

        cache.put_bytes(&id, &[0; 10]).await.unwrap();
        cache.put_bytes(&id, &[0; 4]).await.unwrap();
        assert_eq!(cache.used_bytes(), 4);
    }

    #[tokio::test]
    async fn test_prunes_when_over_limit() {
        let dir = TempDir::new().unwrap();
        let cache = DiskImageCache::open(dir.path().to_path_buf(), 100)
            .await
            .unwrap();

        for i in 0..5 {
            cache
                .put_bytes(&ImageId::new(format!("img{i}")), &[0; 40])
                .await
                .unwrap();
        }

        assert!(cache.used_bytes() <= 100);
    }

    #[tokio::test]
    async fn test_reopen_counts_existing_files() {
        let dir = TempDir::new().unwrap();
        {
            let cache = DiskImageCache::open(dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put_bytes(&ImageId::new("a"), &[0; 7]).await.unwrap();
        }
        let cache = DiskImageCache::open(dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(cache.used_bytes(), 7);
    }
}
