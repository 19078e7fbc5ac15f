use thiserror::Error;

/// Failures while handing a voice packet to the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoiceError {
    /// The voice connection has no UDP socket yet (or lost it).
    #[error("no UDP socket")]
    NoSocket,

    /// The socket refused the datagram.
    #[error("{message}")]
    Send { message: String },
}

impl VoiceError {
    #[must_use]
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for VoiceError {
    fn from(err: std::io::Error) -> Self {
        Self::send(err.to_string())
    }
}
