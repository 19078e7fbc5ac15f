mod chat_client_port;
mod image_loader_port;
mod voice_socket_port;

pub use chat_client_port::{ChatClientPort, ClientEvent, FetchMessagesOptions};
pub use image_loader_port::{CacheError, CacheResult, ImageLoaderPort};
pub use voice_socket_port::VoiceSocketPort;

#[cfg(test)]
pub mod mocks {
    pub use super::chat_client_port::mock::MockChatClient;
    pub use super::voice_socket_port::MockVoiceSocketPort;
}
