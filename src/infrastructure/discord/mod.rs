//! Discord REST adapter and CDN helpers.

pub mod cdn;
mod client;
mod dto;

pub use client::DiscordClient;
