//! Command dispatch over validated manuals.
//!
//! A [`Dispatcher`] is built once at startup from stock commands and
//! [`Module`]s. Building validates every manual and the handlers wired to
//! it; broken commands are logged and left out. Afterwards the dispatcher
//! is immutable and can serve concurrent messages.
//!
//! For each message, [`Dispatcher::process_message`] resolves the guild
//! prefix, finds the called command (stock commands first), enforces
//! [`Permissions`], selects the subcommand, checks arguments, and runs the
//! handler with one datastore connection held for the duration of the call.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//!
//! use command_manual_core::{CommandArgument, SubcommandManual};
//! use command_manual_dispatch::*;
//!
//! struct NoDatabase;
//!
//! impl ConnectionSource for NoDatabase {
//!     type Connection = ();
//!     type Guard<'a> = Box<()>;
//!
//!     fn acquire(&self, _tag: &str) -> std::result::Result<Box<()>, StoreError> {
//!         Ok(Box::new(()))
//!     }
//! }
//!
//! struct Message {
//!     content: &'static str,
//!     replies: RefCell<Vec<String>>,
//! }
//!
//! impl Interaction for Message {
//!     fn author_id(&self) -> u64 { 1 }
//!     fn guild_id(&self) -> Option<u64> { Some(2) }
//!     fn content(&self) -> &str { self.content }
//!     fn reply(&self, text: &str) -> Result<()> {
//!         self.replies.borrow_mut().push(text.to_string());
//!         Ok(())
//!     }
//!     fn give_check(&self) -> bool { true }
//! }
//!
//! let echo = SubcommandManual::new("echo", "::<prefix>echo:: $1", "Repeats you.")
//!     .with_argument(CommandArgument::required("text", "text"));
//!
//! let dispatcher = Dispatcher::builder(NoDatabase)
//!     .stock(BotCommand::<NoDatabase>::simple(echo, |invocation| {
//!         let text = invocation.arguments.text("text").unwrap_or_default().to_string();
//!         invocation.reply(&text)?;
//!         Ok(CommandOutcome::Succeeded)
//!     }))
//!     .build();
//!
//! let message = Message { content: "%echo hello there", replies: RefCell::new(Vec::new()) };
//! let report = dispatcher.process_message(&message);
//! assert!(report.command_worked());
//! assert_eq!(message.replies.borrow()[0], "%echo: hello there");
//! ```

mod command;
mod dispatcher;
mod document;
mod error;
mod interaction;
mod permissions;
mod slash;
mod stock;
mod store;

pub use command::{
    BotCommand, CommandKind, CommandOutcome, Handler, Invocation, Module, ParentHandler,
    PreDispatch, PreDispatchHook,
};
pub use dispatcher::{DispatchReport, Dispatcher, DispatcherBuilder, RejectedCommand};
pub use error::{DispatchError, Result, StoreError};
pub use interaction::{GREEN_CHECK, Interaction, Replier};
pub use permissions::{Permissions, allowed};
pub use slash::{
    SlashCall, SlashChoice, SlashCommandData, SlashOption, SlashOptionType, SlashOptionValue,
    arguments_from_options, option_from_argument, option_name, registration_data,
    slash_command_data,
};
pub use stock::{commands, idexplain, info, prefix, stock_commands};
pub use store::{ConnectionSource, MemoryPrefixStore, PrefixStore, validate_guild_prefix};
