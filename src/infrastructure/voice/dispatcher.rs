use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::errors::VoiceError;
use crate::domain::ports::VoiceSocketPort;

/// Non-fatal diagnostics raised while dispatching voice packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Debug(String),
}

/// Hands encoded voice packets to the UDP transport.
///
/// Send failures never escape `send_packet`; they are reported as
/// `VoiceEvent::Debug` messages instead.
pub struct VoiceDispatcher {
    socket: Option<Arc<dyn VoiceSocketPort>>,
    events: mpsc::UnboundedSender<VoiceEvent>,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl VoiceDispatcher {
    #[must_use]
    pub fn new(events: mpsc::UnboundedSender<VoiceEvent>) -> Self {
        Self {
            socket: None,
            events,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_socket(mut self, socket: Arc<dyn VoiceSocketPort>) -> Self {
        self.socket = Some(socket);
        self
    }

    /// Replaces (or removes) the transport, e.g. after a voice server move.
    pub fn set_socket(&mut self, socket: Option<Arc<dyn VoiceSocketPort>>) {
        self.socket = socket;
    }

    pub async fn send_packet(&self, packet: Bytes) {
        let result = match &self.socket {
            Some(socket) => socket.send(packet).await,
            None => Err(VoiceError::NoSocket),
        };

        match result {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                let message = format!("Failed to send a packet - {e}");
                debug!("{message}");
                let _ = self.events.send(VoiceEvent::Debug(message));
            }
        }
    }

    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockVoiceSocketPort;

    #[tokio::test]
    async fn test_missing_socket_emits_debug_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = VoiceDispatcher::new(tx);

        dispatcher.send_packet(Bytes::from_static(b"x")).await;

        assert_eq!(
            rx.try_recv().unwrap(),
            VoiceEvent::Debug("Failed to send a packet - no UDP socket".into())
        );
        assert_eq!(dispatcher.dropped(), 1);
        assert_eq!(dispatcher.sent(), 0);
    }

    #[tokio::test]
    async fn test_send_error_is_swallowed() {
        let mut socket = MockVoiceSocketPort::new();
        socket
            .expect_send()
            .times(1)
            .returning(|_| Err(VoiceError::send("Connection refused")));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = VoiceDispatcher::new(tx).with_socket(Arc::new(socket));

        dispatcher.send_packet(Bytes::from_static(b"x")).await;

        assert_eq!(
            rx.try_recv().unwrap(),
            VoiceEvent::Debug("Failed to send a packet - Connection refused".into())
        );
    }

    #[tokio::test]
    async fn test_successful_sends_are_counted() {
        let mut socket = MockVoiceSocketPort::new();
        socket
            .expect_send()
            .withf(|packet| packet.as_ref() == b"frame")
            .times(3)
            .returning(|_| Ok(()));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = VoiceDispatcher::new(tx).with_socket(Arc::new(socket));

        for _ in 0..3 {
            dispatcher.send_packet(Bytes::from_static(b"frame")).await;
        }

        assert_eq!(dispatcher.sent(), 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_event_channel_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut dispatcher = VoiceDispatcher::new(tx);
        dispatcher.set_socket(None);

        dispatcher.send_packet(Bytes::new()).await;
        assert_eq!(dispatcher.dropped(), 1);
    }
}
