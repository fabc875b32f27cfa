//! Startup-validated command registry and the per-message dispatch flow.

use std::time::Instant;

use command_manual_core::{CommandManual, MultifacetedCommandManual, SubcommandManual};
use command_manual_db::{BotConfig, manual_problems};
use command_manual_syntax::{
    MatcherCache, RawArguments, SubcommandMatch, ValidatedArguments, check, command_regex,
    determination_tag, indent,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::command::{
    BotCommand, CommandKind, CommandOutcome, Handler, Invocation, Module, ParentHandler,
    PreDispatch,
};
use crate::error::DispatchError;
use crate::interaction::{Interaction, Replier};
use crate::permissions::allowed;
use crate::slash::{SlashCall, arguments_from_options};
use crate::store::{ConnectionSource, PrefixStore};

const DEFAULT_UNAUTHORIZED: &str = "You are not authorized to use that command. This could be because of command permissions. This command might not allow you to view who is authorized.";

const NOT_IN_GUILD: &str = "The command must be used in a guild text channel.";

/// A command left out of dispatch because its manual or wiring is broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedCommand {
    /// `None` for stock commands.
    pub module: Option<String>,
    pub name: String,
    pub reasons: Vec<String>,
}

/// What [`Dispatcher::process_message`] did with one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    pub did_find_command: bool,
    pub command_name: Option<String>,
    pub module_name: Option<String>,
    pub no_use_no_see: bool,
    /// `None` when no command was found.
    pub outcome: Option<CommandOutcome>,
    /// Time spent inside the command, when it ran.
    pub call_to_return_span_ms: Option<f64>,
}

impl DispatchReport {
    fn not_found() -> Self {
        Self {
            did_find_command: false,
            command_name: None,
            module_name: None,
            no_use_no_see: false,
            outcome: None,
            call_to_return_span_ms: None,
        }
    }

    pub fn command_worked(&self) -> bool {
        self.outcome == Some(CommandOutcome::Succeeded)
    }

    pub fn command_authorized(&self) -> bool {
        !matches!(self.outcome, Some(CommandOutcome::Unauthorized(_)))
    }

    pub fn did_use_module(&self) -> bool {
        self.module_name.is_some()
    }
}

/// Collects stock commands, modules and collaborators, then validates
/// everything once in [`build`](Self::build).
pub struct DispatcherBuilder<C: ConnectionSource> {
    global_prefix: String,
    bot_name: String,
    maintainer_tag: Option<String>,
    stock: Vec<BotCommand<C>>,
    modules: Vec<Module<C>>,
    connections: C,
    prefixes: Option<Box<dyn PrefixStore>>,
}

impl<C: ConnectionSource> DispatcherBuilder<C> {
    pub fn new(connections: C) -> Self {
        let defaults = BotConfig::default();
        Self {
            global_prefix: defaults.global_prefix,
            bot_name: defaults.bot_name,
            maintainer_tag: None,
            stock: Vec::new(),
            modules: Vec::new(),
            connections,
            prefixes: None,
        }
    }

    /// Takes prefix, bot name and maintainer from `config`.
    pub fn from_config(config: &BotConfig, connections: C) -> Self {
        Self::new(connections)
            .global_prefix(&config.global_prefix)
            .bot_name(&config.bot_name)
            .maintainer_tag(config.maintainer_tag.as_deref())
    }

    pub fn global_prefix(mut self, prefix: &str) -> Self {
        self.global_prefix = prefix.to_string();
        self
    }

    pub fn bot_name(mut self, name: &str) -> Self {
        self.bot_name = name.to_string();
        self
    }

    pub fn maintainer_tag(mut self, tag: Option<&str>) -> Self {
        self.maintainer_tag = tag.map(str::to_string);
        self
    }

    pub fn prefix_store(mut self, store: impl PrefixStore + 'static) -> Self {
        self.prefixes = Some(Box::new(store));
        self
    }

    /// Adds a command checked before every module command.
    pub fn stock(mut self, command: BotCommand<C>) -> Self {
        self.stock.push(command);
        self
    }

    pub fn stock_commands(mut self, commands: impl IntoIterator<Item = BotCommand<C>>) -> Self {
        self.stock.extend(commands);
        self
    }

    pub fn module(mut self, module: Module<C>) -> Self {
        self.modules.push(module);
        self
    }

    /// Validates every manual and handler wiring.
    ///
    /// Commands with problems are logged, recorded in
    /// [`Dispatcher::rejected`], and left out. A command whose name is
    /// already taken is rejected; stock commands claim names first.
    pub fn build(self) -> Dispatcher<C> {
        let mut rejected = Vec::new();
        let mut taken: Vec<String> = Vec::new();

        let stock = admit(self.stock, None, &mut taken, &mut rejected);
        let modules = self
            .modules
            .into_iter()
            .map(|mut module| {
                let commands = std::mem::take(&mut module.commands);
                module.commands = admit(commands, Some(module.name.as_str()), &mut taken, &mut rejected);
                module
            })
            .collect();

        Dispatcher {
            global_prefix: self.global_prefix,
            bot_name: self.bot_name,
            maintainer_tag: self.maintainer_tag,
            stock,
            modules,
            rejected,
            connections: self.connections,
            prefixes: self.prefixes,
            matchers: MatcherCache::new(),
        }
    }
}

fn admit<C: ConnectionSource>(
    commands: Vec<BotCommand<C>>,
    module: Option<&str>,
    taken: &mut Vec<String>,
    rejected: &mut Vec<RejectedCommand>,
) -> Vec<BotCommand<C>> {
    let mut admitted = Vec::new();
    for command in commands {
        let mut reasons = manual_problems(&command.manual);
        reasons.extend(command.wiring_problems());
        if taken.iter().any(|name| name.eq_ignore_ascii_case(command.name())) {
            reasons.push("command name already taken".to_string());
        }

        if reasons.is_empty() {
            taken.push(command.name().to_string());
            admitted.push(command);
        } else {
            warn!(
                module = module.unwrap_or("stock"),
                command = %command.name(),
                reasons = %reasons.join("; "),
                "excluding command from dispatch"
            );
            rejected.push(RejectedCommand {
                module: module.map(str::to_string),
                name: command.name().to_string(),
                reasons,
            });
        }
    }
    admitted
}

/// The immutable command registry and its collaborators.
///
/// Safe to share between concurrent message handlers.
pub struct Dispatcher<C: ConnectionSource> {
    global_prefix: String,
    bot_name: String,
    maintainer_tag: Option<String>,
    stock: Vec<BotCommand<C>>,
    modules: Vec<Module<C>>,
    rejected: Vec<RejectedCommand>,
    connections: C,
    prefixes: Option<Box<dyn PrefixStore>>,
    /// Syntax matchers per manual and prefix, filled as messages arrive.
    matchers: MatcherCache,
}

enum Selection<'d, C: ConnectionSource> {
    Allowed(&'d BotCommand<C>, Option<&'d Module<C>>),
    Denied(&'d BotCommand<C>, Option<&'d Module<C>>),
}

/// A subcommand ready to be checked and run.
enum Target<'d, C: ConnectionSource> {
    Simple {
        manual: &'d SubcommandManual,
        handler: &'d Handler<C>,
    },
    Subcommand {
        parent: &'d MultifacetedCommandManual,
        handlers: &'d ParentHandler<C>,
        subcommand: &'d SubcommandManual,
    },
}

impl<C: ConnectionSource> Dispatcher<C> {
    pub fn builder(connections: C) -> DispatcherBuilder<C> {
        DispatcherBuilder::new(connections)
    }

    pub fn global_prefix(&self) -> &str {
        &self.global_prefix
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    pub fn maintainer_tag(&self) -> Option<&str> {
        self.maintainer_tag.as_deref()
    }

    pub fn stock_commands(&self) -> &[BotCommand<C>] {
        &self.stock
    }

    pub fn modules(&self) -> &[Module<C>] {
        &self.modules
    }

    pub fn rejected(&self) -> &[RejectedCommand] {
        &self.rejected
    }

    pub fn connections(&self) -> &C {
        &self.connections
    }

    pub fn prefixes(&self) -> Option<&dyn PrefixStore> {
        self.prefixes.as_deref()
    }

    /// Looks a command up by name, stock commands first.
    pub fn find_command(&self, name: &str) -> Option<(&BotCommand<C>, Option<&Module<C>>)> {
        self.stock
            .iter()
            .find(|command| command.name().eq_ignore_ascii_case(name))
            .map(|command| (command, None))
            .or_else(|| {
                self.modules.iter().find_map(|module| {
                    module
                        .commands
                        .iter()
                        .find(|command| command.name().eq_ignore_ascii_case(name))
                        .map(|command| (command, Some(module)))
                })
            })
    }

    /// The guild's own prefix, else the global prefix. Store failures are
    /// logged and fall back to the global prefix.
    pub fn resolve_prefix(&self, guild_id: Option<u64>) -> String {
        let (Some(guild), Some(store)) = (guild_id, self.prefixes.as_deref()) else {
            return self.global_prefix.clone();
        };
        match store.get_prefix(guild) {
            Ok(Some(prefix)) => prefix,
            Ok(None) => self.global_prefix.clone(),
            Err(err) => {
                warn!(guild, error = %err, "prefix lookup failed, using the global prefix");
                self.global_prefix.clone()
            }
        }
    }

    /// Finds the command a message calls and runs it.
    ///
    /// Only guild messages are considered. Stock commands are checked before
    /// module commands, and commands of modules the author may not use are
    /// skipped. A matching command the author may not use is reported as
    /// unauthorized unless it hides itself.
    pub fn process_message(&self, interaction: &dyn Interaction) -> DispatchReport {
        let Some(guild_id) = interaction.guild_id() else {
            debug!("ignoring message outside a guild");
            return DispatchReport::not_found();
        };
        let prefix = self.resolve_prefix(Some(guild_id));
        let content = interaction.content();

        let selection = self.select(interaction, |command| {
            match command_regex(command.name(), &prefix) {
                Ok(regex) => {
                    debug!(command = %command.name(), pattern = %regex.as_str(), "testing message");
                    regex.is_match(content)
                }
                Err(err) => {
                    error!(command = %command.name(), error = %err, "cannot match command");
                    false
                }
            }
        });

        match selection {
            None => DispatchReport::not_found(),
            Some(Selection::Denied(command, module)) => {
                self.finish(interaction, command, module, CommandOutcome::Unauthorized(None), None)
            }
            Some(Selection::Allowed(command, module)) => {
                let start = Instant::now();
                let outcome = match self.message_target(command, interaction, &prefix) {
                    Ok((target, raw)) => self.execute(target, raw, interaction, &prefix),
                    Err(outcome) => outcome,
                };
                let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                self.finish(interaction, command, module, outcome, Some(elapsed))
            }
        }
    }

    /// Runs a slash-command interaction.
    ///
    /// Options are mapped back to raw argument values and go through the
    /// same checks, hooks and handlers as a typed message.
    pub fn process_slash(&self, interaction: &dyn Interaction, call: &SlashCall) -> DispatchReport {
        let selection =
            self.select(interaction, |command| command.name().eq_ignore_ascii_case(&call.command));

        match selection {
            None => {
                warn!(command = %call.command, "slash call for an unknown command");
                self.say(interaction, &self.removed_integration());
                DispatchReport::not_found()
            }
            Some(Selection::Denied(command, module)) => {
                self.finish(interaction, command, module, CommandOutcome::Unauthorized(None), None)
            }
            Some(Selection::Allowed(command, module)) => {
                if interaction.guild_id().is_none() {
                    let outcome = CommandOutcome::Unauthorized(Some(NOT_IN_GUILD.to_string()));
                    return self.finish(interaction, command, module, outcome, None);
                }
                let prefix = self.resolve_prefix(interaction.guild_id());
                let start = Instant::now();
                let outcome = match self.slash_target(command, call) {
                    Some((target, raw)) => self.execute(target, raw, interaction, &prefix),
                    None => {
                        self.say(interaction, &self.removed_integration());
                        CommandOutcome::DidNotSucceed
                    }
                };
                let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                self.finish(interaction, command, module, outcome, Some(elapsed))
            }
        }
    }

    fn select<'d>(
        &'d self,
        interaction: &dyn Interaction,
        calls: impl Fn(&BotCommand<C>) -> bool,
    ) -> Option<Selection<'d, C>> {
        let stock = self.stock.iter().map(|command| (command, None::<&Module<C>>));
        let modules = self
            .modules
            .iter()
            .filter(|module| allowed(interaction, module.permissions.as_ref()))
            .flat_map(|module| module.commands.iter().map(move |command| (command, Some(module))));

        for (command, module) in stock.chain(modules) {
            if !calls(command) {
                continue;
            }
            if allowed(interaction, command.permissions.as_ref()) {
                return Some(Selection::Allowed(command, module));
            }
            if !command.no_use_no_see {
                return Some(Selection::Denied(command, module));
            }
        }
        None
    }

    fn message_target<'d>(
        &'d self,
        command: &'d BotCommand<C>,
        interaction: &dyn Interaction,
        prefix: &str,
    ) -> Result<(Target<'d, C>, RawArguments), CommandOutcome> {
        let content = interaction.content();
        match (&command.manual, command.kind()) {
            (CommandManual::Simple(manual), CommandKind::Simple(handler)) => {
                let matcher = self.matchers.get(manual, prefix).map_err(|err| {
                    error!(command = %manual.name, error = %err, "syntax template failed to compile");
                    CommandOutcome::DidNotSucceed
                })?;
                let Some(raw) = matcher.extract(content) else {
                    self.say(
                        interaction,
                        &format!(
                            "{}: your message did not match the syntax of this command. Try using '{prefix}commands' to see its syntax.",
                            matcher.determination_tag()
                        ),
                    );
                    return Err(CommandOutcome::DidNotSucceed);
                };
                Ok((Target::Simple { manual, handler }, raw))
            }
            (CommandManual::Multifaceted(parent), CommandKind::Parent(handlers)) => {
                match self.matchers.first_matching_subcommand(parent, prefix, content) {
                    SubcommandMatch::Matched {
                        subcommand,
                        arguments,
                    } => Ok((
                        Target::Subcommand {
                            parent,
                            handlers,
                            subcommand,
                        },
                        arguments,
                    )),
                    SubcommandMatch::NoMatch {
                        attempted: Some(subcommand),
                        ..
                    } => {
                        self.say(
                            interaction,
                            &format!(
                                "{prefix}{}: your message did not match the syntax of subcommand {}. Try using '{prefix}commands' to see the syntax for each subcommand.",
                                parent.name, subcommand.name
                            ),
                        );
                        Err(CommandOutcome::DidNotSucceed)
                    }
                    SubcommandMatch::NoMatch { attempted: None, .. } => {
                        self.say(
                            interaction,
                            &format!(
                                "{prefix}{}: your message had no matching subcommands. Try using '{prefix}commands' to see the syntax for each subcommand.",
                                parent.name
                            ),
                        );
                        Err(CommandOutcome::DidNotSucceed)
                    }
                }
            }
            _ => {
                error!(command = %command.name(), "manual and handlers disagree");
                Err(CommandOutcome::DidNotSucceed)
            }
        }
    }

    fn slash_target<'d>(
        &'d self,
        command: &'d BotCommand<C>,
        call: &SlashCall,
    ) -> Option<(Target<'d, C>, RawArguments)> {
        match (&command.manual, command.kind()) {
            (CommandManual::Simple(manual), CommandKind::Simple(handler)) => Some((
                Target::Simple { manual, handler },
                arguments_from_options(manual, &call.options),
            )),
            (CommandManual::Multifaceted(parent), CommandKind::Parent(handlers)) => {
                let chosen = call.options.first()?;
                let subcommand = parent.find_subcommand(&chosen.name)?;
                Some((
                    Target::Subcommand {
                        parent,
                        handlers,
                        subcommand,
                    },
                    arguments_from_options(subcommand, &chosen.options),
                ))
            }
            _ => None,
        }
    }

    fn execute(
        &self,
        target: Target<'_, C>,
        raw: RawArguments,
        interaction: &dyn Interaction,
        prefix: &str,
    ) -> CommandOutcome {
        match target {
            Target::Simple { manual, handler } => {
                let heading = format!(
                    "{prefix}{}: your message did not have the proper arguments. Try using '{prefix}commands' to see the syntax for this command.",
                    manual.name
                );
                let Some(arguments) = self.check_or_reply(manual, &raw, interaction, &heading) else {
                    return CommandOutcome::DidNotSucceed;
                };
                let tag = tag_of(manual, prefix, &manual.name);
                self.invoke(handler, &arguments, interaction, prefix, tag)
            }
            Target::Subcommand {
                parent,
                handlers,
                subcommand,
            } => {
                let heading = format!(
                    "{prefix}{}: your message did not have the proper arguments for subcommand {}. Try using '{prefix}commands' to see the syntax for each subcommand.",
                    parent.name, subcommand.name
                );
                let Some(arguments) = self.check_or_reply(subcommand, &raw, interaction, &heading)
                else {
                    return CommandOutcome::DidNotSucceed;
                };

                let context = PreDispatch {
                    subcommand,
                    arguments: &arguments,
                    interaction,
                    prefix,
                    replier: Replier::new(interaction, format!("{prefix}{}", parent.name)),
                    dispatcher: self,
                };
                match handlers.run_pre_dispatch(&context) {
                    Ok(CommandOutcome::PassThrough) => {
                        debug!(command = %parent.name, subcommand = %subcommand.name, "passing through to subcommand");
                    }
                    Ok(outcome) => return outcome,
                    Err(err) => return self.internal_error(interaction, &parent.name, &err),
                }

                let Some(handler) = handlers.handler(&subcommand.name) else {
                    error!(command = %parent.name, subcommand = %subcommand.name, "no handler for subcommand");
                    return CommandOutcome::DidNotSucceed;
                };
                let fallback = format!("{} {}", parent.name, subcommand.name);
                let tag = tag_of(subcommand, prefix, &fallback);
                self.invoke(handler, &arguments, interaction, prefix, tag)
            }
        }
    }

    fn check_or_reply(
        &self,
        manual: &SubcommandManual,
        raw: &RawArguments,
        interaction: &dyn Interaction,
        heading: &str,
    ) -> Option<ValidatedArguments> {
        match check(manual, raw) {
            Ok(arguments) => Some(arguments),
            Err(failure) => {
                debug!(syntax = %manual.name, reasons = %failure, "arguments rejected");
                let reasons: Vec<String> = failure
                    .information
                    .iter()
                    .map(|reason| format!("{}.", indent(reason)))
                    .collect();
                self.say(interaction, &format!("{heading}\n{}", reasons.join("\n")));
                None
            }
        }
    }

    /// Runs `handler` with one connection held for the duration of the call.
    fn invoke(
        &self,
        handler: &Handler<C>,
        arguments: &ValidatedArguments,
        interaction: &dyn Interaction,
        prefix: &str,
        tag: String,
    ) -> CommandOutcome {
        let mut connection = match self.connections.acquire(&tag) {
            Ok(connection) => connection,
            Err(err) => return self.internal_error(interaction, &tag, &DispatchError::from(err)),
        };
        debug!(tag = %tag, "connection acquired");

        let result = {
            let mut invocation = Invocation {
                arguments,
                interaction,
                connection: &mut *connection,
                prefix,
                replier: Replier::new(interaction, tag.clone()),
                dispatcher: self,
            };
            handler(&mut invocation)
        };
        drop(connection);
        debug!(tag = %tag, "connection released");

        match result {
            Ok(outcome) => outcome,
            Err(err) => self.internal_error(interaction, &tag, &err),
        }
    }

    fn finish(
        &self,
        interaction: &dyn Interaction,
        command: &BotCommand<C>,
        module: Option<&Module<C>>,
        outcome: CommandOutcome,
        elapsed_ms: Option<f64>,
    ) -> DispatchReport {
        if let CommandOutcome::Unauthorized(reason) = &outcome
            && !command.no_use_no_see
        {
            let text = match reason {
                Some(reason) => format!("You are not authorized to use that command. Reason: {reason}"),
                None => DEFAULT_UNAUTHORIZED.to_string(),
            };
            self.say(interaction, &text);
        }
        if outcome == CommandOutcome::Succeeded
            && let Some(ms) = elapsed_ms
        {
            info!(command = %command.name(), "bot command ran successfully in {ms:.3} ms");
        }

        DispatchReport {
            did_find_command: true,
            command_name: Some(command.name().to_string()),
            module_name: module.map(|m| m.name.clone()),
            no_use_no_see: command.no_use_no_see,
            outcome: Some(outcome),
            call_to_return_span_ms: elapsed_ms,
        }
    }

    fn internal_error(
        &self,
        interaction: &dyn Interaction,
        tag: &str,
        err: &DispatchError,
    ) -> CommandOutcome {
        error!(tag = %tag, error = %err, "command failed");
        let text = match &self.maintainer_tag {
            Some(maintainer) => {
                format!("{tag}: an internal error has occurred. Contact {maintainer} for help.")
            }
            None => format!("{tag}: an internal error has occurred."),
        };
        self.say(interaction, &text);
        CommandOutcome::DidNotSucceed
    }

    fn removed_integration(&self) -> String {
        match &self.maintainer_tag {
            Some(maintainer) => format!(
                "An internal error has occurred (you used an integration that has been removed). Contact {maintainer} for help."
            ),
            None => "An internal error has occurred (you used an integration that has been removed).".to_string(),
        }
    }

    pub(crate) fn say(&self, interaction: &dyn Interaction, text: &str) {
        if let Err(err) = interaction.reply(text) {
            warn!(error = %err, "failed to deliver reply");
        }
    }
}

fn tag_of(manual: &SubcommandManual, prefix: &str, fallback: &str) -> String {
    determination_tag(manual, prefix).unwrap_or_else(|_| format!("{prefix}{fallback}"))
}
