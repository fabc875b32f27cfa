//! Commands, their handlers, and the modules that group them.

use std::fmt;

use command_manual_core::{CommandManual, MultifacetedCommandManual, SimpleCommandManual, SubcommandManual};
use command_manual_syntax::ValidatedArguments;
use serde::Serialize;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::interaction::{Interaction, Replier};
use crate::permissions::Permissions;
use crate::store::ConnectionSource;

/// What happened when a command ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "reason", rename_all = "snake_case")]
pub enum CommandOutcome {
    DidNotSucceed,
    Succeeded,
    /// The caller may not do this; the reason, when given, is shown to them.
    Unauthorized(Option<String>),
    Invalid,
    /// Returned by a pre-dispatch hook to let the subcommand handler run.
    PassThrough,
}

/// Everything a handler gets for one call.
pub struct Invocation<'a, C: ConnectionSource> {
    pub arguments: &'a ValidatedArguments,
    pub interaction: &'a dyn Interaction,
    /// Held for exactly this call.
    pub connection: &'a mut C::Connection,
    /// Prefix in effect where the command was sent.
    pub prefix: &'a str,
    pub replier: Replier<'a>,
    pub dispatcher: &'a Dispatcher<C>,
}

impl<C: ConnectionSource> Invocation<'_, C> {
    /// Replies prefixed with the command's determination tag.
    ///
    /// # Errors
    ///
    /// Propagates the interaction's reply failure.
    pub fn reply(&self, text: &str) -> Result<()> {
        self.replier.reply(text)
    }
}

/// What a parent command's pre-dispatch hook sees before the subcommand runs.
pub struct PreDispatch<'a, C: ConnectionSource> {
    pub subcommand: &'a SubcommandManual,
    pub arguments: &'a ValidatedArguments,
    pub interaction: &'a dyn Interaction,
    pub prefix: &'a str,
    /// Tagged with `{prefix}{command name}`.
    pub replier: Replier<'a>,
    pub dispatcher: &'a Dispatcher<C>,
}

pub type Handler<C> = Box<dyn Fn(&mut Invocation<'_, C>) -> Result<CommandOutcome> + Send + Sync>;

pub type PreDispatchHook<C> = Box<dyn Fn(&PreDispatch<'_, C>) -> Result<CommandOutcome> + Send + Sync>;

/// Handlers for a parent command: an optional pre-dispatch hook and one
/// handler per subcommand.
///
/// Without a hook every matched subcommand passes through.
pub struct ParentHandler<C: ConnectionSource> {
    pre_dispatch: Option<PreDispatchHook<C>>,
    handlers: Vec<(String, Handler<C>)>,
}

impl<C: ConnectionSource> ParentHandler<C> {
    pub fn new() -> Self {
        Self {
            pre_dispatch: None,
            handlers: Vec::new(),
        }
    }

    /// Runs before every subcommand. Anything but
    /// [`CommandOutcome::PassThrough`] stops the call.
    pub fn pre_dispatch<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PreDispatch<'_, C>) -> Result<CommandOutcome> + Send + Sync + 'static,
    {
        self.pre_dispatch = Some(Box::new(hook));
        self
    }

    pub fn subcommand<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Invocation<'_, C>) -> Result<CommandOutcome> + Send + Sync + 'static,
    {
        self.handlers.push((name.to_string(), Box::new(handler)));
        self
    }

    pub fn handler(&self, subcommand: &str) -> Option<&Handler<C>> {
        self.handlers
            .iter()
            .find(|(name, _)| name == subcommand)
            .map(|(_, handler)| handler)
    }

    pub(crate) fn run_pre_dispatch(&self, context: &PreDispatch<'_, C>) -> Result<CommandOutcome> {
        match &self.pre_dispatch {
            Some(hook) => hook(context),
            None => Ok(CommandOutcome::PassThrough),
        }
    }

    fn handled_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(name, _)| name.as_str())
    }
}

impl<C: ConnectionSource> Default for ParentHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

pub enum CommandKind<C: ConnectionSource> {
    Simple(Handler<C>),
    Parent(ParentHandler<C>),
}

/// A command the bot answers: its manual, who may use it, and its handlers.
pub struct BotCommand<C: ConnectionSource> {
    pub manual: CommandManual,
    pub permissions: Option<Permissions>,
    /// Hide the command entirely from callers it does not allow.
    pub no_use_no_see: bool,
    kind: CommandKind<C>,
}

impl<C: ConnectionSource> BotCommand<C> {
    pub fn simple<F>(manual: SimpleCommandManual, handler: F) -> Self
    where
        F: Fn(&mut Invocation<'_, C>) -> Result<CommandOutcome> + Send + Sync + 'static,
    {
        Self {
            manual: manual.into(),
            permissions: None,
            no_use_no_see: false,
            kind: CommandKind::Simple(Box::new(handler)),
        }
    }

    pub fn parent(manual: MultifacetedCommandManual, handlers: ParentHandler<C>) -> Self {
        Self {
            manual: manual.into(),
            permissions: None,
            no_use_no_see: false,
            kind: CommandKind::Parent(handlers),
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn hidden_when_unauthorized(mut self) -> Self {
        self.no_use_no_see = true;
        self
    }

    pub fn name(&self) -> &str {
        self.manual.name()
    }

    pub fn kind(&self) -> &CommandKind<C> {
        &self.kind
    }

    /// Mismatches between the manual and the handlers wired to it.
    pub(crate) fn wiring_problems(&self) -> Vec<String> {
        match (&self.manual, &self.kind) {
            (CommandManual::Simple(_), CommandKind::Simple(_)) => Vec::new(),
            (CommandManual::Multifaceted(manual), CommandKind::Parent(handlers)) => {
                let mut problems: Vec<String> = manual
                    .subcommands
                    .iter()
                    .filter(|sub| handlers.handler(&sub.name).is_none())
                    .map(|sub| format!("no handler for subcommand \"{}\"", sub.name))
                    .collect();
                problems.extend(
                    handlers
                        .handled_names()
                        .filter(|name| manual.find_subcommand(name).is_none())
                        .map(|name| format!("handler for undeclared subcommand \"{name}\"")),
                );
                problems
            }
            (CommandManual::Simple(_), CommandKind::Parent(_)) => {
                vec!["simple manual wired to subcommand handlers".to_string()]
            }
            (CommandManual::Multifaceted(_), CommandKind::Simple(_)) => {
                vec!["multifaceted manual wired to a single handler".to_string()]
            }
        }
    }
}

impl<C: ConnectionSource> fmt::Debug for BotCommand<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotCommand")
            .field("name", &self.name())
            .field("permissions", &self.permissions)
            .field("no_use_no_see", &self.no_use_no_see)
            .finish_non_exhaustive()
    }
}

/// A named group of commands sharing permissions.
pub struct Module<C: ConnectionSource> {
    pub name: String,
    pub permissions: Option<Permissions>,
    /// Leave the module out of the manual document for callers it does
    /// not allow.
    pub hide_when_contradicts_permissions: bool,
    /// Module data is kept per guild.
    pub servers_are_universes: bool,
    pub(crate) commands: Vec<BotCommand<C>>,
}

impl<C: ConnectionSource> Module<C> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            permissions: None,
            hide_when_contradicts_permissions: false,
            servers_are_universes: false,
            commands: Vec::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn hidden_when_unauthorized(mut self) -> Self {
        self.hide_when_contradicts_permissions = true;
        self
    }

    pub fn per_server(mut self) -> Self {
        self.servers_are_universes = true;
        self
    }

    pub fn with_command(mut self, command: BotCommand<C>) -> Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[BotCommand<C>] {
        &self.commands
    }
}

impl<C: ConnectionSource> fmt::Debug for Module<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("permissions", &self.permissions)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}
