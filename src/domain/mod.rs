//! Domain layer with core entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{Identity, User};
pub use errors::{ClientError, VoiceError};
pub use ports::{ChatClientPort, ClientEvent, ImageLoaderPort, VoiceSocketPort};
