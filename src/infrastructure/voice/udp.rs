use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::domain::errors::VoiceError;
use crate::domain::ports::VoiceSocketPort;

/// UDP socket connected to a voice server.
#[derive(Debug)]
pub struct UdpVoiceSocket {
    socket: UdpSocket,
}

impl UdpVoiceSocket {
    /// Binds an ephemeral local port and connects it to `remote`.
    ///
    /// # Errors
    /// Returns error if the socket cannot be bound or connected.
    pub async fn connect(remote: SocketAddr) -> Result<Self, VoiceError> {
        let local: SocketAddr = if remote.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(remote).await?;
        debug!(%remote, "Voice socket connected");
        Ok(Self { socket })
    }

    /// Local address of the socket.
    ///
    /// # Errors
    /// Returns error if the OS cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr, VoiceError> {
        Ok(self.socket.local_addr()?)
    }
}

#[async_trait]
impl VoiceSocketPort for UdpVoiceSocket {
    async fn send(&self, packet: Bytes) -> Result<(), VoiceError> {
        let sent = self.socket.send(&packet).await?;
        if sent < packet.len() {
            return Err(VoiceError::send(format!(
                "short write: {sent} of {} bytes",
                packet.len()
            )));
        }
        Ok(())
    }
}
