//! UI screens and the application loop.

mod app;
mod backend;
mod main_screen;

pub use app::App;
pub use backend::{Action, Backend, BackendCommand};
pub use main_screen::{Focus, MainScreen};
