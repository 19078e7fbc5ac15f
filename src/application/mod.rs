//! Application layer: the event bus and UI-independent services.

/// Application-wide events.
pub mod events;
/// Stateful helpers shared by widgets and adapters.
pub mod services;

pub use events::{Anchor, AppEvent, EventBus, View, ViewOptions};
