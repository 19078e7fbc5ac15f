mod button_registry;
mod channel_list;
mod footer_bar;
mod members_list;
mod message_panel;
mod popups;
mod thumbnail;
mod user_button;
mod viewport;

pub use button_registry::ButtonRegistry;
pub use channel_list::{CHANNEL_LIST_WIDTH, ChannelEntry, ChannelList, ChannelListState};
pub use footer_bar::{FocusContext, FooterBar, FooterBarStyle};
pub use members_list::{MEMBERS_LIST_WIDTH, MembersList, MembersListState};
pub use message_panel::{HistoryOutcome, INITIAL_HISTORY, MessagePanel, MessagePanelState};
pub use popups::{Popup, PopupOutcome, ProfileCard, UserMenu};
pub use thumbnail::{ImageRequest, ImageSlot, ImageTarget, Thumbnail};
pub use user_button::{PROFILE_POPUP_WIDTH, StatusEmoji, UserButton, UserButtonView, activity_text};
pub use viewport::Viewport;
