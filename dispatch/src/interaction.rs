//! The platform-facing side of one command invocation.

use crate::error::Result;

/// Reaction used to acknowledge a command that has nothing else to say.
pub const GREEN_CHECK: &str = "\u{2705}";

/// One inbound message or slash interaction, as seen by the dispatcher.
///
/// Implemented by the platform binding. Replies go back to wherever the
/// invocation came from.
pub trait Interaction {
    /// ID of the person who sent the command.
    fn author_id(&self) -> u64;

    /// Guild the command was sent in, or `None` outside guild text channels.
    fn guild_id(&self) -> Option<u64>;

    /// Roles the author holds in the guild.
    fn role_ids(&self) -> &[u64] {
        &[]
    }

    /// Whether the author administers the guild.
    fn is_guild_admin(&self) -> bool {
        false
    }

    /// Raw message text. Empty for slash interactions.
    fn content(&self) -> &str;

    /// Sends `text` back to the channel or interaction.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Reply`](crate::DispatchError::Reply) when the
    /// platform does not accept the message.
    fn reply(&self, text: &str) -> Result<()>;

    /// Acknowledges the command with [`GREEN_CHECK`]. Returns whether the
    /// acknowledgement was delivered.
    fn give_check(&self) -> bool;
}

/// Replies on behalf of one command, prefixed with its determination tag.
///
/// ```
/// # use command_manual_dispatch::{Interaction, Replier, Result};
/// # use std::cell::RefCell;
/// # struct Channel(RefCell<Vec<String>>);
/// # impl Interaction for Channel {
/// #     fn author_id(&self) -> u64 { 1 }
/// #     fn guild_id(&self) -> Option<u64> { Some(2) }
/// #     fn content(&self) -> &str { "" }
/// #     fn reply(&self, text: &str) -> Result<()> { self.0.borrow_mut().push(text.to_string()); Ok(()) }
/// #     fn give_check(&self) -> bool { true }
/// # }
/// let channel = Channel(RefCell::new(Vec::new()));
/// let replier = Replier::new(&channel, "%tier list");
/// replier.reply("no tiers yet").unwrap();
/// replier.reply_untagged("plain").unwrap();
/// assert_eq!(*channel.0.borrow(), ["%tier list: no tiers yet", "plain"]);
/// ```
pub struct Replier<'a> {
    interaction: &'a dyn Interaction,
    tag: String,
}

impl<'a> Replier<'a> {
    pub fn new(interaction: &'a dyn Interaction, tag: impl Into<String>) -> Self {
        Self {
            interaction,
            tag: tag.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Sends `text` as `"{tag}: {text}"`.
    ///
    /// # Errors
    ///
    /// Propagates the interaction's reply failure.
    pub fn reply(&self, text: &str) -> Result<()> {
        self.interaction.reply(&format!("{}: {}", self.tag, text))
    }

    /// Sends `text` as is.
    ///
    /// # Errors
    ///
    /// Propagates the interaction's reply failure.
    pub fn reply_untagged(&self, text: &str) -> Result<()> {
        self.interaction.reply(text)
    }
}
