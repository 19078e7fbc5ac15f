//! Voice packet dispatch over UDP.

mod dispatcher;
mod udp;

pub use dispatcher::{VoiceDispatcher, VoiceEvent};
pub use udp::UdpVoiceSocket;
