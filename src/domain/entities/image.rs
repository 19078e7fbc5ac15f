//! Domain types for images shown in the UI (avatars, emoji, attachments).

use std::sync::Arc;

/// Unique identifier for a cached image, derived from its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(pub String);

impl ImageId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an `ImageId` from a URL by hashing it.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(url.as_bytes());
        Self(hex::encode(&digest[..16]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an image was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// In-memory LRU cache.
    MemoryCache,
    /// Disk cache.
    DiskCache,
    /// Downloaded.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::DiskCache => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// A decoded image ready for rendering.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub id: ImageId,
    pub image: Arc<image::DynamicImage>,
    pub source: ImageSource,
}

/// Target size, in terminal cells, an image is scaled into before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellBox {
    pub width: u16,
    pub height: u16,
}

impl CellBox {
    pub const AVATAR: Self = Self { width: 4, height: 2 };
    pub const EMOJI: Self = Self { width: 2, height: 1 };
    pub const ATTACHMENT: Self = Self { width: 24, height: 8 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_from_url() {
        let id = ImageId::from_url("https://cdn.discordapp.com/avatars/1/abc.png");
        assert_eq!(id.as_str().len(), 32);
        assert_eq!(id, ImageId::from_url("https://cdn.discordapp.com/avatars/1/abc.png"));
    }
}
