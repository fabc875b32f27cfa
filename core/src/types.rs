//! Command manual type definitions.
//!
//! A manual describes a command declaratively: its name, a syntax template,
//! its positional arguments, and help text. Manuals are built once at
//! startup and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::TypeConstraint;

/// Platform option type used when registering slash commands.
///
/// # Examples
///
/// ```
/// use command_manual_core::BaseType;
///
/// assert_eq!(BaseType::default(), BaseType::String);
/// assert_eq!(serde_json::to_string(&BaseType::Channel).unwrap(), "\"CHANNEL\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseType {
    #[default]
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
}

/// An argument a command or subcommand takes.
///
/// Position in the owning manual's `arguments` list is the positional index:
/// the first argument is referenced as `$1` in the syntax template.
///
/// # Examples
///
/// ```
/// use command_manual_core::{CommandArgument, TypeConstraint};
///
/// let user = CommandArgument::optional("user ID", "user")
///     .with_constraint(TypeConstraint::Snowflake);
/// assert!(user.optional);
/// assert_eq!(user.id, "user");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArgument {
    /// Concise description of the argument's purpose, shown in syntaxes.
    pub name: String,
    /// Machine key, unique within one manual.
    pub id: String,
    /// Whether the argument can be left out.
    pub optional: bool,
    /// Validation and normalization applied to the raw value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub further_constraint: Option<TypeConstraint>,
    /// Option type for slash-command registration.
    #[serde(default)]
    pub base_type: BaseType,
    /// Option name for slash-command registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
}

impl CommandArgument {
    pub fn required(name: &str, id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            optional: false,
            further_constraint: None,
            base_type: BaseType::String,
            short_description: None,
        }
    }

    pub fn optional(name: &str, id: &str) -> Self {
        Self {
            optional: true,
            ..Self::required(name, id)
        }
    }

    pub fn with_constraint(mut self, constraint: TypeConstraint) -> Self {
        self.further_constraint = Some(constraint);
        self
    }

    pub fn with_base_type(mut self, base_type: BaseType) -> Self {
        self.base_type = base_type;
        self
    }

    pub fn with_short_description(mut self, short: &str) -> Self {
        self.short_description = Some(short.to_string());
        self
    }
}

/// One syntax of a command, e.g. `%tj list` as part of `%tj`.
///
/// The `syntax` field is a template such as
/// `<prefix>proof get NAME $1{opt $2}[ USER $2]`, where the bracketed part is
/// only present when argument `$2` is provided.
///
/// # Examples
///
/// ```
/// use command_manual_core::{CommandArgument, SubcommandManual};
///
/// let get = SubcommandManual::new(
///     "get",
///     "<prefix>proof get NAME $1{opt $2}[ USER $2]",
///     "Retrieves the link to a proof.",
/// )
/// .with_argument(CommandArgument::required("jump name", "name"))
/// .with_argument(CommandArgument::optional("user ID", "user"));
///
/// assert_eq!(get.optional_indices(), vec![1]);
/// assert!(get.argument("user").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcommandManual {
    pub name: String,
    pub syntax: String,
    pub arguments: Vec<CommandArgument>,
    /// Describe optional parts inline instead of listing every combination.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub compact_syntaxes: bool,
    pub description: String,
}

/// A command with exactly one syntax.
pub type SimpleCommandManual = SubcommandManual;

impl SubcommandManual {
    pub fn new(name: &str, syntax: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            syntax: syntax.to_string(),
            arguments: Vec::new(),
            compact_syntaxes: false,
            description: description.to_string(),
        }
    }

    pub fn with_argument(mut self, argument: CommandArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Switches help output to a single inline syntax.
    pub fn compact(mut self) -> Self {
        self.compact_syntaxes = true;
        self
    }

    /// Finds an argument by its machine id.
    pub fn argument(&self, id: &str) -> Option<&CommandArgument> {
        self.arguments.iter().find(|a| a.id == id)
    }

    /// Zero-based positions of optional arguments, in declaration order.
    pub fn optional_indices(&self) -> Vec<usize> {
        self.arguments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.optional)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A command made of several subcommands, e.g. `%tj <list/info/set>`.
///
/// # Examples
///
/// ```
/// use command_manual_core::{MultifacetedCommandManual, SubcommandManual};
///
/// let tj = MultifacetedCommandManual::new("tj", "Manage your jumps.")
///     .with_subcommand(SubcommandManual::new("list", "<prefix>tj list", "Lists jumps."))
///     .with_subcommand(SubcommandManual::new("info", "<prefix>tj info $1", "Shows a jump."));
///
/// assert_eq!(tj.subcommand_names(), vec!["list", "info"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultifacetedCommandManual {
    pub name: String,
    pub subcommands: Vec<SubcommandManual>,
    pub description: String,
}

impl MultifacetedCommandManual {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            subcommands: Vec::new(),
            description: description.to_string(),
        }
    }

    pub fn with_subcommand(mut self, subcommand: SubcommandManual) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    pub fn find_subcommand(&self, name: &str) -> Option<&SubcommandManual> {
        self.subcommands.iter().find(|s| s.name == name)
    }

    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }
}

/// A validated manual of either shape.
///
/// Consumers branch on the variant instead of probing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandManual {
    Simple(SimpleCommandManual),
    Multifaceted(MultifacetedCommandManual),
}

impl CommandManual {
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(m) => &m.name,
            Self::Multifaceted(m) => &m.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Simple(m) => &m.description,
            Self::Multifaceted(m) => &m.description,
        }
    }

    pub fn kind(&self) -> ManualKind {
        match self {
            Self::Simple(_) => ManualKind::Simple,
            Self::Multifaceted(_) => ManualKind::Multifaceted,
        }
    }

    /// Every syntax-bearing manual: the manual itself, or its subcommands.
    pub fn syntaxes(&self) -> Vec<&SubcommandManual> {
        match self {
            Self::Simple(m) => vec![m],
            Self::Multifaceted(m) => m.subcommands.iter().collect(),
        }
    }
}

impl From<SimpleCommandManual> for CommandManual {
    fn from(manual: SimpleCommandManual) -> Self {
        Self::Simple(manual)
    }
}

impl From<MultifacetedCommandManual> for CommandManual {
    fn from(manual: MultifacetedCommandManual) -> Self {
        Self::Multifaceted(manual)
    }
}

/// Structural category of an arbitrary manual declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualKind {
    Simple,
    Multifaceted,
    Invalid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_builders() {
        let arg = CommandArgument::optional("channel", "channel_snowflake")
            .with_constraint(TypeConstraint::Snowflake)
            .with_base_type(BaseType::Channel)
            .with_short_description("channel");

        assert!(arg.optional);
        assert_eq!(arg.further_constraint, Some(TypeConstraint::Snowflake));
        assert_eq!(arg.base_type, BaseType::Channel);
        assert_eq!(arg.short_description.as_deref(), Some("channel"));
    }

    #[test]
    fn test_optional_indices_follow_declaration_order() {
        let manual = SubcommandManual::new("update", "<prefix>tier update NAME $1", "")
            .with_argument(CommandArgument::required("name", "name"))
            .with_argument(CommandArgument::optional("new name", "new_name"))
            .with_argument(CommandArgument::required("x", "x"))
            .with_argument(CommandArgument::optional("rank", "rank"));

        assert_eq!(manual.optional_indices(), vec![1, 3]);
    }

    #[test]
    fn test_command_manual_accessors() {
        let simple: CommandManual =
            SubcommandManual::new("info", "<prefix>info", "Shows bot info.").into();
        assert_eq!(simple.name(), "info");
        assert_eq!(simple.kind(), ManualKind::Simple);
        assert_eq!(simple.syntaxes().len(), 1);

        let multi: CommandManual = MultifacetedCommandManual::new("tier", "Tiers.")
            .with_subcommand(SubcommandManual::new("delete", "<prefix>tier delete $1", ""))
            .into();
        assert_eq!(multi.description(), "Tiers.");
        assert_eq!(multi.kind(), ManualKind::Multifaceted);
        assert_eq!(multi.syntaxes()[0].name, "delete");
    }

    #[test]
    fn test_compact_flag_omitted_when_false() {
        let manual = SubcommandManual::new("info", "<prefix>info", "d");
        let json = serde_json::to_value(&manual).unwrap();
        assert!(json.get("compact_syntaxes").is_none());

        let json = serde_json::to_value(manual.compact()).unwrap();
        assert_eq!(json["compact_syntaxes"], serde_json::json!(true));
    }
}
