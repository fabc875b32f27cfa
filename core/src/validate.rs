//! Structural classification and semantic validation of manuals.
//!
//! Manual declarations loaded from files arrive as untyped JSON values.
//! [`classify`] inspects required fields in a fixed order and returns an
//! explicit [`Classification`]: a typed simple manual, a typed multifaceted
//! manual, or the reason the value is neither. [`validate_manual`] then
//! checks invariants the shape alone cannot express, such as unique argument
//! ids.
//!
//! # Examples
//!
//! ```
//! use command_manual_core::*;
//! use serde_json::json;
//!
//! let value = json!({
//!     "name": "choose",
//!     "syntax": "<prefix>jumprole choose $1",
//!     "arguments": [{"name": "channel", "id": "channel_snowflake", "optional": false}],
//!     "description": "Designates a Jumprole commands channel."
//! });
//! assert_eq!(classify(&value).kind(), ManualKind::Simple);
//!
//! // Missing description: invalid, whatever else is present
//! let value = json!({"name": "choose", "syntax": "<prefix>x", "arguments": []});
//! assert_eq!(classify(&value).kind(), ManualKind::Invalid);
//! ```

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    BaseType, CommandArgument, CommandManual, ManualKind, MultifacetedCommandManual,
    SimpleCommandManual, SubcommandManual, TypeConstraint,
};

const MAX_SHOWN_VALUE_LEN: usize = 60;

/// Why a manual declaration was rejected.
///
/// Every variant names the offending field (as a path when nested) so the
/// startup log is enough to find the broken declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManualError {
    #[error("expected an object, found {found}")]
    NotAnObject { found: String },
    #[error("missing {expected} field \"{field}\"")]
    MissingField {
        field: String,
        expected: &'static str,
    },
    #[error("field \"{field}\" should be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("field \"{field}\" is not a valid constraint ({reason}), found {found}")]
    InvalidConstraint {
        field: String,
        reason: String,
        found: String,
    },
    #[error("arguments[{index}]: {reason}")]
    InvalidArgument {
        index: usize,
        reason: Box<ManualError>,
    },
    #[error("subcommands[{index}]: {reason}")]
    InvalidSubcommand {
        index: usize,
        reason: Box<ManualError>,
    },
    #[error("name cannot be empty")]
    EmptyName,
    #[error("command name \"{0}\" contains whitespace")]
    NameContainsWhitespace(String),
    #[error("duplicate argument id \"{id}\" in \"{manual}\"")]
    DuplicateArgumentId { manual: String, id: String },
    #[error("duplicate subcommand \"{0}\"")]
    DuplicateSubcommand(String),
}

/// Result of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Simple(SimpleCommandManual),
    Multifaceted(MultifacetedCommandManual),
    Invalid(ManualError),
}

impl Classification {
    pub fn kind(&self) -> ManualKind {
        match self {
            Self::Simple(_) => ManualKind::Simple,
            Self::Multifaceted(_) => ManualKind::Multifaceted,
            Self::Invalid(_) => ManualKind::Invalid,
        }
    }

    /// Converts into a typed manual, or the rejection reason.
    ///
    /// # Errors
    ///
    /// Returns the [`ManualError`] carried by [`Classification::Invalid`].
    pub fn into_manual(self) -> Result<CommandManual, ManualError> {
        match self {
            Self::Simple(m) => Ok(CommandManual::Simple(m)),
            Self::Multifaceted(m) => Ok(CommandManual::Multifaceted(m)),
            Self::Invalid(err) => Err(err),
        }
    }
}

/// Classifies an arbitrary declaration as a simple manual, a multifaceted
/// manual, or invalid.
///
/// The simple shape is tried first. When both shapes fail, the reported
/// reason comes from the multifaceted check if the value has a
/// `subcommands` key, and from the simple check otherwise.
pub fn classify(value: &Value) -> Classification {
    let simple_err = match simple_from_value(value) {
        Ok(manual) => return Classification::Simple(manual),
        Err(err) => err,
    };
    let multi_err = match multifaceted_from_value(value) {
        Ok(manual) => return Classification::Multifaceted(manual),
        Err(err) => err,
    };

    let looks_multifaceted = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("subcommands"));
    Classification::Invalid(if looks_multifaceted {
        multi_err
    } else {
        simple_err
    })
}

/// Validates a single argument declaration.
///
/// # Errors
///
/// Returns the first structural problem found, checking `name`, `id`,
/// `optional`, `further_constraint`, `base_type`, and `short_description` in
/// that order.
pub fn argument_from_value(value: &Value) -> Result<CommandArgument, ManualError> {
    let obj = as_object(value)?;
    let name = require_string(obj, "name")?;
    let id = require_string(obj, "id")?;
    let optional = match obj.get("optional") {
        Some(Value::Bool(b)) => *b,
        Some(other) => return Err(wrong_type("optional", "a boolean", other)),
        None => return Err(missing("optional", "boolean")),
    };

    let further_constraint = match obj.get("further_constraint") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<TypeConstraint>(raw.clone()).map_err(|err| {
                ManualError::InvalidConstraint {
                    field: "further_constraint".to_string(),
                    reason: err.to_string(),
                    found: show(raw),
                }
            })?,
        ),
    };

    let base_type = match obj.get("base_type") {
        None | Some(Value::Null) => BaseType::default(),
        Some(raw) => serde_json::from_value::<BaseType>(raw.clone()).map_err(|_| {
            wrong_type(
                "base_type",
                "one of STRING, INTEGER, BOOLEAN, USER, CHANNEL, ROLE",
                raw,
            )
        })?,
    };

    let short_description = match obj.get("short_description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => return Err(wrong_type("short_description", "a string", other)),
    };

    Ok(CommandArgument {
        name,
        id,
        optional,
        further_constraint,
        base_type,
        short_description,
    })
}

/// Validates a simple (or subcommand) manual declaration.
///
/// # Errors
///
/// Returns the first structural problem found. Argument problems are wrapped
/// in [`ManualError::InvalidArgument`] with the argument's position.
pub fn simple_from_value(value: &Value) -> Result<SimpleCommandManual, ManualError> {
    let obj = as_object(value)?;
    let name = require_string(obj, "name")?;
    let syntax = require_string(obj, "syntax")?;
    let raw_arguments = require_array(obj, "arguments")?;
    let description = require_string(obj, "description")?;
    let compact_syntaxes = match obj.get("compact_syntaxes") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => return Err(wrong_type("compact_syntaxes", "a boolean", other)),
    };

    let arguments = raw_arguments
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            argument_from_value(raw).map_err(|reason| ManualError::InvalidArgument {
                index,
                reason: Box::new(reason),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SubcommandManual {
        name,
        syntax,
        arguments,
        compact_syntaxes,
        description,
    })
}

/// Validates a multifaceted manual declaration.
///
/// # Errors
///
/// Returns the first structural problem found. Subcommand problems are
/// wrapped in [`ManualError::InvalidSubcommand`] with the subcommand's
/// position.
pub fn multifaceted_from_value(value: &Value) -> Result<MultifacetedCommandManual, ManualError> {
    let obj = as_object(value)?;
    let name = require_string(obj, "name")?;
    let raw_subcommands = require_array(obj, "subcommands")?;
    let description = require_string(obj, "description")?;

    let subcommands = raw_subcommands
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            simple_from_value(raw).map_err(|reason| ManualError::InvalidSubcommand {
                index,
                reason: Box::new(reason),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MultifacetedCommandManual {
        name,
        subcommands,
        description,
    })
}

/// Checks invariants of a typed manual that its shape cannot express.
///
/// Returns every problem found; an empty vector means the manual is sound.
///
/// # Examples
///
/// ```
/// use command_manual_core::*;
///
/// let manual = SubcommandManual::new("set", "<prefix>tj set $1 $2", "")
///     .with_argument(CommandArgument::required("a", "value"))
///     .with_argument(CommandArgument::required("b", "value"));
///
/// let errors = validate_manual(&manual.into());
/// assert!(errors.iter().any(|e| matches!(e, ManualError::DuplicateArgumentId { .. })));
/// ```
pub fn validate_manual(manual: &CommandManual) -> Vec<ManualError> {
    let mut errors = Vec::new();

    let name = manual.name();
    if name.trim().is_empty() {
        errors.push(ManualError::EmptyName);
    } else if name.chars().any(char::is_whitespace) {
        errors.push(ManualError::NameContainsWhitespace(name.to_string()));
    }

    if let CommandManual::Multifaceted(multi) = manual {
        let mut seen = HashSet::new();
        for sub in &multi.subcommands {
            if !seen.insert(sub.name.as_str()) {
                errors.push(ManualError::DuplicateSubcommand(sub.name.clone()));
            }
            if sub.name.trim().is_empty() {
                errors.push(ManualError::EmptyName);
            }
        }
    }

    for syntax in manual.syntaxes() {
        let mut ids = HashSet::new();
        for argument in &syntax.arguments {
            if !ids.insert(argument.id.as_str()) {
                errors.push(ManualError::DuplicateArgumentId {
                    manual: syntax.name.clone(),
                    id: argument.id.clone(),
                });
            }
        }
    }

    errors
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ManualError> {
    value.as_object().ok_or_else(|| ManualError::NotAnObject {
        found: show(value),
    })
}

fn require_string(obj: &Map<String, Value>, field: &str) -> Result<String, ManualError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(wrong_type(field, "a string", other)),
        None => Err(missing(field, "string")),
    }
}

fn require_array<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a Vec<Value>, ManualError> {
    match obj.get(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(wrong_type(field, "an array", other)),
        None => Err(missing(field, "array")),
    }
}

fn missing(field: &str, expected: &'static str) -> ManualError {
    ManualError::MissingField {
        field: field.to_string(),
        expected,
    }
}

fn wrong_type(field: &str, expected: &'static str, found: &Value) -> ManualError {
    ManualError::WrongType {
        field: field.to_string(),
        expected,
        found: show(found),
    }
}

fn show(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_SHOWN_VALUE_LEN {
        return rendered;
    }
    let truncated: String = rendered.chars().take(MAX_SHOWN_VALUE_LEN).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn choose_value() -> Value {
        json!({
            "name": "choose",
            "syntax": "<prefix>jumprole choose $1",
            "arguments": [{
                "name": "channel",
                "id": "channel_snowflake",
                "optional": false,
                "further_constraint": {"type": "snowflake"},
                "base_type": "CHANNEL"
            }],
            "description": "Designates a Jumprole commands channel."
        })
    }

    #[test]
    fn test_classify_simple_manual() {
        let Classification::Simple(manual) = classify(&choose_value()) else {
            panic!("expected a simple manual");
        };
        assert_eq!(manual.arguments[0].base_type, BaseType::Channel);
        assert_eq!(
            manual.arguments[0].further_constraint,
            Some(TypeConstraint::Snowflake)
        );
        assert!(!manual.compact_syntaxes);
    }

    #[test]
    fn test_classify_multifaceted_manual() {
        let value = json!({
            "name": "jumprole",
            "subcommands": [choose_value()],
            "description": "Jumprole management."
        });
        let Classification::Multifaceted(manual) = classify(&value) else {
            panic!("expected a multifaceted manual");
        };
        assert_eq!(manual.subcommand_names(), vec!["choose"]);
    }

    #[test]
    fn test_missing_description_is_invalid() {
        let mut value = choose_value();
        value.as_object_mut().unwrap().remove("description");

        let classification = classify(&value);
        assert_eq!(
            classification,
            Classification::Invalid(ManualError::MissingField {
                field: "description".to_string(),
                expected: "string",
            })
        );
    }

    #[test]
    fn test_bad_subcommand_reports_multifaceted_reason() {
        let mut sub = choose_value();
        sub["arguments"][0]["optional"] = json!("no");
        let value = json!({
            "name": "jumprole",
            "subcommands": [sub],
            "description": "Jumprole management."
        });

        let Classification::Invalid(err) = classify(&value) else {
            panic!("expected invalid");
        };
        assert_eq!(
            err.to_string(),
            "subcommands[0]: arguments[0]: field \"optional\" should be a boolean, found \"no\""
        );
    }

    #[test]
    fn test_non_boolean_compact_syntaxes_is_rejected() {
        let mut value = choose_value();
        value["compact_syntaxes"] = json!("yes");
        assert!(matches!(
            classify(&value),
            Classification::Invalid(ManualError::WrongType { .. })
        ));

        value["compact_syntaxes"] = Value::Null;
        assert_eq!(classify(&value).kind(), ManualKind::Simple);
    }

    #[test]
    fn test_bad_constraint_names_field() {
        let mut value = choose_value();
        value["arguments"][0]["further_constraint"] = json!({"type": "colour"});
        let Classification::Invalid(err) = classify(&value) else {
            panic!("expected invalid");
        };
        assert!(err.to_string().contains("further_constraint"));
    }

    #[test]
    fn test_non_object_is_invalid() {
        let Classification::Invalid(err) = classify(&json!(42)) else {
            panic!("expected invalid");
        };
        assert_eq!(err.to_string(), "expected an object, found 42");
    }

    #[test]
    fn test_long_values_are_truncated_in_messages() {
        let long = "x".repeat(200);
        let err = wrong_type("name", "a string", &json!([long]));
        assert!(err.to_string().ends_with("..."));
    }

    #[test]
    fn test_validate_manual_rejects_whitespace_and_duplicates() {
        let manual: CommandManual = MultifacetedCommandManual::new("jump role", "")
            .with_subcommand(SubcommandManual::new("a", "<prefix>x", ""))
            .with_subcommand(SubcommandManual::new("a", "<prefix>y", ""))
            .into();

        let errors = validate_manual(&manual);
        assert_eq!(
            errors,
            vec![
                ManualError::NameContainsWhitespace("jump role".to_string()),
                ManualError::DuplicateSubcommand("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_validate_manual_accepts_sound_manual() {
        let Classification::Simple(manual) = classify(&choose_value()) else {
            panic!("expected a simple manual");
        };
        assert!(validate_manual(&manual.into()).is_empty());
    }
}
