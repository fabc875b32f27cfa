//! Slash-command registration data derived from manuals, and the mapping
//! from interaction options back to raw argument values.

use command_manual_core::{
    BaseType, CommandArgument, CommandManual, MultifacetedCommandManual, SubcommandManual,
};
use command_manual_syntax::RawArguments;
use serde::{Deserialize, Serialize};

use crate::command::BotCommand;
use crate::store::ConnectionSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlashOptionType {
    SubCommand,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
}

impl From<BaseType> for SlashOptionType {
    fn from(base: BaseType) -> Self {
        match base {
            BaseType::String => Self::String,
            BaseType::Integer => Self::Integer,
            BaseType::Boolean => Self::Boolean,
            BaseType::User => Self::User,
            BaseType::Channel => Self::Channel,
            BaseType::Role => Self::Role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashChoice {
    pub name: String,
    pub value: String,
}

/// One registered option: an argument, or a subcommand with its own options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashOption {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub option_type: SlashOptionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<SlashChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SlashOption>,
}

/// A chat-input command registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommandData {
    pub name: String,
    pub description: String,
    pub options: Vec<SlashOption>,
}

/// Option name for an argument: its short description (else its name),
/// lowercased, spaces turned into dashes.
///
/// ```
/// use command_manual_core::CommandArgument;
/// use command_manual_dispatch::option_name;
///
/// let arg = CommandArgument::optional("server ID", "guild_id")
///     .with_short_description("Server To Set On");
/// assert_eq!(option_name(&arg), "server-to-set-on");
/// assert_eq!(option_name(&CommandArgument::required("jump name", "name")), "jump-name");
/// ```
pub fn option_name(argument: &CommandArgument) -> String {
    argument
        .short_description
        .as_deref()
        .unwrap_or(&argument.name)
        .to_lowercase()
        .split(' ')
        .collect::<Vec<_>>()
        .join("-")
}

/// Choice constraints become a string option with a choice list; everything
/// else uses the argument's base type.
pub fn option_from_argument(argument: &CommandArgument) -> SlashOption {
    let choices = argument
        .further_constraint
        .as_ref()
        .and_then(|constraint| constraint.choices())
        .unwrap_or_default();

    let option_type = if choices.is_empty() {
        argument.base_type.into()
    } else {
        SlashOptionType::String
    };

    SlashOption {
        name: option_name(argument),
        description: argument.name.clone(),
        option_type,
        required: !argument.optional,
        choices: choices
            .iter()
            .map(|choice| SlashChoice {
                name: choice.clone(),
                value: choice.clone(),
            })
            .collect(),
        options: Vec::new(),
    }
}

fn subcommand_option(manual: &SubcommandManual) -> SlashOption {
    SlashOption {
        name: manual.name.clone(),
        description: manual.description.clone(),
        option_type: SlashOptionType::SubCommand,
        required: false,
        choices: Vec::new(),
        options: manual.arguments.iter().map(option_from_argument).collect(),
    }
}

fn multifaceted_data(manual: &MultifacetedCommandManual) -> SlashCommandData {
    SlashCommandData {
        name: manual.name.clone(),
        description: manual.description.clone(),
        options: manual.subcommands.iter().map(subcommand_option).collect(),
    }
}

/// Registration data for a manual.
///
/// ```
/// use command_manual_core::{CommandArgument, MultifacetedCommandManual, SubcommandManual, TypeConstraint};
/// use command_manual_dispatch::{SlashOptionType, slash_command_data};
///
/// let manual = MultifacetedCommandManual::new("tj", "Manage your jumps.").with_subcommand(
///     SubcommandManual::new("list", "::<prefix>tj list::{opt $1}[ SOURCE $1]", "Lists jumps.")
///         .with_argument(
///             CommandArgument::optional("source", "source")
///                 .with_constraint(TypeConstraint::choice("source", ["all", "mine"])),
///         ),
/// );
/// let data = slash_command_data(&manual.into());
/// assert_eq!(data.options[0].option_type, SlashOptionType::SubCommand);
/// assert_eq!(data.options[0].options[0].choices.len(), 2);
/// ```
pub fn slash_command_data(manual: &CommandManual) -> SlashCommandData {
    match manual {
        CommandManual::Simple(manual) => SlashCommandData {
            name: manual.name.clone(),
            description: manual.description.clone(),
            options: manual.arguments.iter().map(option_from_argument).collect(),
        },
        CommandManual::Multifaceted(manual) => multifaceted_data(manual),
    }
}

/// Registration data for a command, or `None` for commands that hide
/// themselves from callers they do not allow.
pub fn registration_data<C: ConnectionSource>(command: &BotCommand<C>) -> Option<SlashCommandData> {
    if command.no_use_no_see {
        return None;
    }
    Some(slash_command_data(&command.manual))
}

/// One option value delivered with an interaction.
///
/// User and channel options carry the selected ID as their value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlashOptionValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    /// Options of a chosen subcommand.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SlashOptionValue>,
}

impl SlashOptionValue {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
            options: Vec::new(),
        }
    }

    pub fn subcommand(name: &str, options: Vec<SlashOptionValue>) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            options,
        }
    }
}

/// An invoked slash command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlashCall {
    pub command: String,
    #[serde(default)]
    pub options: Vec<SlashOptionValue>,
}

/// Maps interaction options to raw argument values by option name.
///
/// Arguments without an option are absent.
pub fn arguments_from_options(manual: &SubcommandManual, options: &[SlashOptionValue]) -> RawArguments {
    let mut raw = RawArguments::for_manual(manual);
    for argument in &manual.arguments {
        let name = option_name(argument);
        let value = options
            .iter()
            .find(|option| option.name == name)
            .and_then(|option| option.value.as_deref());
        if let Some(value) = value {
            raw.set(&argument.id, value);
        }
    }
    raw
}
