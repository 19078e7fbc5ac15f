//! Domain error types.

mod client_error;
mod voice_error;

pub use client_error::ClientError;
pub use voice_error::VoiceError;
