//! Application services.

pub mod message_cache;
pub mod throttle;

pub use message_cache::MessageCache;
pub use throttle::{RateWindow, Throttle};
