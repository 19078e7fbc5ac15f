//! Lookup of live user buttons for event-driven refreshes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::thumbnail::ImageTarget;
use super::user_button::UserButton;
use crate::domain::entities::{Identity, LoadedImage, Presence, UserId};
use crate::domain::ports::ClientEvent;

/// Maps identities to the buttons currently on screen.
///
/// Entries are weak: dropping a button is enough to retire it, and
/// [`ButtonRegistry::sweep`] discards the dead slots.
#[derive(Default)]
pub struct ButtonRegistry {
    buttons: HashMap<Identity, Weak<RefCell<UserButton>>>,
    presences: HashMap<UserId, Presence>,
}

impl ButtonRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, identity: Identity, button: &Rc<RefCell<UserButton>>) {
        self.buttons.insert(identity, Rc::downgrade(button));
    }

    /// Removes every entry pointing at `button`.
    pub fn deregister(&mut self, button: &Rc<RefCell<UserButton>>) {
        let target = Rc::downgrade(button);
        self.buttons.retain(|_, weak| !weak.ptr_eq(&target));
    }

    #[must_use]
    pub fn get(&self, identity: Identity) -> Option<Rc<RefCell<UserButton>>> {
        self.buttons.get(&identity).and_then(Weak::upgrade)
    }

    /// Drops entries whose button is gone; returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let before = self.buttons.len();
        self.buttons.retain(|_, weak| weak.strong_count() > 0);
        let removed = before - self.buttons.len();
        if removed > 0 {
            trace!(removed, "Swept dead user buttons");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Last known presence of a user.
    #[must_use]
    pub fn presence(&self, user_id: UserId) -> Option<&Presence> {
        self.presences.get(&user_id)
    }

    /// Updates every affected button. Returns true when something changed on screen.
    pub fn apply_client_event(&mut self, event: &ClientEvent) -> bool {
        match event {
            ClientEvent::PresenceUpdate { user_id, presence } => {
                self.presences.insert(*user_id, presence.clone());
                let mut changed = false;
                for button in self.buttons_of(*user_id) {
                    button.borrow_mut().load_presence(presence);
                    changed = true;
                }
                changed
            }
            ClientEvent::MemberUpdate { new, .. } => {
                let Some(button) = self.get(Identity::from(new)) else {
                    return false;
                };
                let mut button = button.borrow_mut();
                if button.set_member(new.clone()) {
                    button.reset_avatar();
                }
                button.refresh();
                true
            }
            ClientEvent::UserUpdate { new, .. } => {
                let mut changed = false;
                for button in self.buttons_of(new.id()) {
                    let mut button = button.borrow_mut();
                    // Member buttons are refreshed through MemberUpdate.
                    if button.member().is_some() {
                        continue;
                    }
                    if button.set_user(new.clone()) {
                        button.reset_avatar();
                    }
                    button.refresh();
                    changed = true;
                }
                changed
            }
            ClientEvent::Ready { .. } | ClientEvent::MessageCreate { .. } => false,
        }
    }

    /// Routes a fetched avatar or emoji to its button.
    pub fn apply_image(&self, target: &ImageTarget, result: Result<LoadedImage, String>) -> bool {
        match target {
            ImageTarget::Avatar(identity) => self.get(*identity).is_some_and(|button| {
                button.borrow_mut().set_avatar(result);
                true
            }),
            ImageTarget::StatusEmoji(identity) => self.get(*identity).is_some_and(|button| {
                button.borrow_mut().set_emoji(result);
                true
            }),
            ImageTarget::Attachment { .. } => false,
        }
    }

    /// Distinct live buttons for a user across all identities.
    fn buttons_of(&self, user_id: UserId) -> Vec<Rc<RefCell<UserButton>>> {
        let mut found: Vec<Rc<RefCell<UserButton>>> = Vec::new();
        for (identity, weak) in &self.buttons {
            if identity.user_id() != user_id {
                continue;
            }
            if let Some(button) = weak.upgrade()
                && !found.iter().any(|b| Rc::ptr_eq(b, &button))
            {
                found.push(button);
            }
        }
        found
    }
}
