//! Domain entity definitions.

mod channel;
mod guild;
mod identity;
mod image;
mod member;
mod message;
mod presence;
mod token;
mod user;

pub use channel::{Channel, ChannelId, ChannelKind};
pub use guild::{Guild, GuildId};
pub use identity::Identity;
pub use image::{CellBox, ImageId, ImageSource, LoadedImage};
pub use member::Member;
pub use message::{Attachment, Message, MessageId};
pub use presence::{Activity, ActivityEmoji, ActivityKind, Presence, PresenceStatus};
pub use token::AuthToken;
pub use user::{User, UserId};
