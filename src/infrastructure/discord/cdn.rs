//! Discord CDN URL builders.

use crate::domain::entities::{ActivityEmoji, Attachment, Member, User};

const CDN_BASE: &str = "https://cdn.discordapp.com";
const AVATAR_SIZE: u32 = 256;
const EMOJI_SIZE: u32 = 64;
/// Attachment previews are fetched at this width.
const PREVIEW_WIDTH: u32 = 320;

/// Avatar of a user, or the default avatar when they have none.
#[must_use]
pub fn user_avatar_url(user: &User) -> String {
    user.avatar().map_or_else(
        || default_avatar_url(user),
        |hash| format!("{CDN_BASE}/avatars/{}/{hash}.png?size={AVATAR_SIZE}", user.id()),
    )
}

/// Guild-specific avatar of a member, falling back to their user avatar.
#[must_use]
pub fn member_avatar_url(member: &Member) -> String {
    member.avatar().map_or_else(
        || user_avatar_url(member.user()),
        |hash| {
            format!(
                "{CDN_BASE}/guilds/{}/users/{}/avatars/{hash}.png?size={AVATAR_SIZE}",
                member.guild_id(),
                member.user_id()
            )
        },
    )
}

#[must_use]
pub fn default_avatar_url(user: &User) -> String {
    let index = if user.is_migrated() {
        (user.id().as_u64() >> 22) % 6
    } else {
        user.discriminator().parse::<u64>().unwrap_or(0) % 5
    };
    format!("{CDN_BASE}/embed/avatars/{index}.png")
}

/// Image of a custom emoji; unicode emoji have none.
#[must_use]
pub fn emoji_url(emoji: &ActivityEmoji) -> Option<String> {
    emoji
        .id
        .as_ref()
        .map(|id| format!("{CDN_BASE}/emojis/{id}.png?size={EMOJI_SIZE}"))
}

/// Downscaled preview of an image attachment.
#[must_use]
pub fn attachment_preview_url(attachment: &Attachment) -> String {
    let url = attachment.url();
    if !url.contains("cdn.discordapp.com") && !url.contains("media.discordapp.net") {
        return url.to_string();
    }

    let (base, query) = url.split_once('?').unwrap_or((url, ""));
    let mut params = vec![format!("width={PREVIEW_WIDTH}"), "format=png".to_string()];
    params.extend(
        query
            .split('&')
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let key = p.split('=').next().unwrap_or("");
                !["width", "height", "format", "size"].contains(&key)
            })
            .map(str::to_string),
    );

    format!("{base}?{}", params.join("&"))
}
