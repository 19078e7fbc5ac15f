use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::VoiceError;

/// Datagram transport of a voice connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceSocketPort: Send + Sync {
    /// Sends one encoded voice packet.
    async fn send(&self, packet: Bytes) -> Result<(), VoiceError>;
}
