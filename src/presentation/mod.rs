//! Presentation layer with UI components and event handling.

/// Key bindings and widget commands.
pub mod commands;
/// Terminal event helpers.
pub mod events;
/// UI screens.
pub mod ui;
/// Reusable widgets.
pub mod widgets;

pub use ui::App;
