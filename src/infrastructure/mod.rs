//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Discord REST client.
pub mod discord;
/// Image loading and caching.
pub mod image;
/// File logging setup.
pub mod logging;
/// Voice UDP socket and dispatcher.
pub mod voice;

pub use config::{AppConfig, CliArgs, LogLevel, StorageManager, UiConfig};
pub use discord::DiscordClient;
pub use image::{DiskImageCache, ImageLoader, ImageLoaderConfig};
pub use voice::{UdpVoiceSocket, VoiceDispatcher, VoiceEvent};
