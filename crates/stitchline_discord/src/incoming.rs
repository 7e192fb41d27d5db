//! Discord events to workflow events.

use serenity::all::UserId;
use stitchline_core::{ChatId, Incoming};

use crate::render::MENU_PREFIX;

pub fn chat_id(user: UserId) -> ChatId {
    ChatId(user.get() as i64)
}

/// A pressed button. Menu buttons come back as the text of their label.
pub fn from_component(custom_id: &str) -> Incoming {
    match custom_id.strip_prefix(MENU_PREFIX) {
        Some(label) => Incoming::Text(label.to_string()),
        None => Incoming::Button(custom_id.to_string()),
    }
}

pub fn from_slash(name: &str) -> Incoming {
    Incoming::Command {
        name: name.to_lowercase(),
        args: String::new(),
    }
}

/// Direct messages are always handled; guild channels only when listed.
pub fn accepts_channel(is_dm: bool, channel: u64, allowed_channels: &[u64]) -> bool {
    is_dm || allowed_channels.contains(&channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn menu_components_become_text() {
        assert_eq!(
            from_component("text:Start work"),
            Incoming::Text("Start work".into())
        );
        assert_eq!(
            from_component("party_100"),
            Incoming::Button("party_100".into())
        );
    }

    #[test]
    fn slash_commands_keep_their_name() {
        assert_eq!(
            from_slash("Start"),
            Incoming::Command {
                name: "start".into(),
                args: String::new()
            }
        );
    }

    #[test]
    fn guild_channels_must_be_allowed() {
        assert!(accepts_channel(true, 5, &[]));
        assert!(!accepts_channel(false, 5, &[]));
        assert!(accepts_channel(false, 5, &[4, 5]));
    }

    #[test]
    fn chat_ids_follow_user_ids() {
        assert_eq!(chat_id(UserId::new(42)), ChatId(42));
    }
}
