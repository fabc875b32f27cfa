//! Commands every bot carries, checked before any module command.

use command_manual_core::{CommandArgument, MultifacetedCommandManual, SubcommandManual};

use crate::command::{BotCommand, CommandOutcome, ParentHandler};
use crate::error::StoreError;
use crate::store::ConnectionSource;

const ID_EXPLANATION: &str = "A Discord ID, or Snowflake, is a long string of numbers used to represent a specific server, channel, user, or message.\n**Q: How do I get it?**\n**A: **First, turn on Developer Mode. To do so, go to Settings -> Advanced and switch on Developer Mode. Then, simply right click on the server, channel, user, or message that you want the ID of and click 'Copy ID'.\nNote: You can also send a mention of a user or a link to a channel in place of their ID for the purpose of bot commands.";

const SAME_AS_GLOBAL: &str = "Setting a local prefix the same as the global prefix is not allowed for flexibility reasons. However, since the prefix you wanted to set was already the prefix, you can use it just like you would if this command had worked.";

const ADMINS_ONLY: &str = "You must be a server administrator to change the server prefix.";

/// `idexplain`, `info`, `commands` and `prefix <get/set/reset>`.
pub fn stock_commands<C: ConnectionSource>() -> Vec<BotCommand<C>> {
    vec![idexplain(), info(), commands(), prefix()]
}

pub fn idexplain<C: ConnectionSource>() -> BotCommand<C> {
    let manual = SubcommandManual::new(
        "idexplain",
        "::<prefix>idexplain::",
        "Explains the concept of an ID on Discord, also known as a Snowflake.",
    );
    BotCommand::<C>::simple(manual, |invocation| {
        invocation.replier.reply_untagged(ID_EXPLANATION)?;
        Ok(CommandOutcome::Succeeded)
    })
}

pub fn info<C: ConnectionSource>() -> BotCommand<C> {
    let manual = SubcommandManual::new(
        "info",
        "::<prefix>info::",
        "Provides a description of useful commands and the design of the bot.",
    );
    BotCommand::<C>::simple(manual, |invocation| {
        let prefix = invocation.prefix;
        let global = invocation.dispatcher.global_prefix();
        let mut text = format!(
            "**Useful commands**:\n{prefix}commands: Lists the commands this bot has.\n{prefix}prefix get: Tells you the prefix to use on this server."
        );
        if prefix == global {
            text.push_str(&format!(
                "\nThe prefix on this server is the same as the global prefix, {global}."
            ));
        } else {
            text.push_str(&format!(
                "\nThe global prefix, which applies to servers that haven't set a local prefix, is {global}."
            ));
        }
        invocation.replier.reply_untagged(&text)?;
        Ok(CommandOutcome::Succeeded)
    })
}

pub fn commands<C: ConnectionSource>() -> BotCommand<C> {
    let manual = SubcommandManual::new(
        "commands",
        "::<prefix>commands::",
        "Shows the syntax of every command you can use.",
    );
    BotCommand::<C>::simple(manual, |invocation| {
        let document = invocation
            .dispatcher
            .manual_document(invocation.interaction, invocation.prefix);
        invocation.replier.reply_untagged(&document)?;
        Ok(CommandOutcome::Succeeded)
    })
}

pub fn prefix<C: ConnectionSource>() -> BotCommand<C> {
    let manual = MultifacetedCommandManual::new(
        "prefix",
        "Manage or get the prefix for your current server.",
    )
    .with_subcommand(SubcommandManual::new(
        "get",
        "::<prefix>prefix get::",
        "Tells you the only valid prefix that you can use on this server to activate the bot's commands.",
    ))
    .with_subcommand(
        SubcommandManual::new(
            "set",
            "::<prefix>prefix set:: NEW $1",
            "Sets the provided string as the local prefix, overriding the global prefix.",
        )
        .with_argument(
            CommandArgument::required("string or symbol", "new_prefix")
                .with_short_description("new prefix"),
        ),
    )
    .with_subcommand(SubcommandManual::new(
        "reset",
        "::<prefix>prefix reset::",
        "Removes the local prefix so the global prefix applies again.",
    ));

    let handlers = ParentHandler::<C>::new()
        .subcommand("get", |invocation| {
            let global = invocation.dispatcher.global_prefix();
            let text = if invocation.prefix.trim() == global.trim() {
                format!(
                    "The global prefix is \"{}\" and it hasn't been changed locally, but you already knew that.",
                    invocation.prefix
                )
            } else {
                format!(
                    "The local prefix is \"{}\", but you already knew that.",
                    invocation.prefix
                )
            };
            invocation.replier.reply_untagged(&text)?;
            Ok(CommandOutcome::Succeeded)
        })
        .subcommand("set", |invocation| {
            if !invocation.interaction.is_guild_admin() {
                return Ok(CommandOutcome::Unauthorized(Some(ADMINS_ONLY.to_string())));
            }
            let (Some(guild), Some(new_prefix)) = (
                invocation.interaction.guild_id(),
                invocation.arguments.text("new_prefix"),
            ) else {
                return Ok(CommandOutcome::Invalid);
            };
            if new_prefix == invocation.dispatcher.global_prefix() {
                invocation.replier.reply_untagged(SAME_AS_GLOBAL)?;
                return Ok(CommandOutcome::Succeeded);
            }
            let Some(store) = invocation.dispatcher.prefixes() else {
                invocation.reply("this bot does not keep server prefixes.")?;
                return Ok(CommandOutcome::DidNotSucceed);
            };

            match store.set_prefix(guild, new_prefix) {
                Ok(()) if invocation.interaction.give_check() => Ok(CommandOutcome::Succeeded),
                Ok(()) => Ok(CommandOutcome::DidNotSucceed),
                Err(StoreError::InvalidPrefix(_)) => {
                    invocation.reply("a prefix cannot contain whitespace.")?;
                    Ok(CommandOutcome::DidNotSucceed)
                }
                Err(err) => Err(err.into()),
            }
        })
        .subcommand("reset", |invocation| {
            if !invocation.interaction.is_guild_admin() {
                return Ok(CommandOutcome::Unauthorized(Some(ADMINS_ONLY.to_string())));
            }
            let (Some(guild), Some(store)) = (
                invocation.interaction.guild_id(),
                invocation.dispatcher.prefixes(),
            ) else {
                invocation.reply("this server has no local prefix.")?;
                return Ok(CommandOutcome::Succeeded);
            };

            if store.clear_prefix(guild)? {
                invocation.reply(&format!(
                    "the local prefix was removed. The global prefix, {}, applies again.",
                    invocation.dispatcher.global_prefix()
                ))?;
            } else {
                invocation.reply("this server has no local prefix.")?;
            }
            Ok(CommandOutcome::Succeeded)
        });

    BotCommand::parent(manual, handlers)
}
