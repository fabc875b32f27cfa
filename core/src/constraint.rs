//! Typed validators and normalizers for primitive argument kinds.
//!
//! A [`TypeConstraint`] is attached to a [`CommandArgument`](crate::CommandArgument)
//! as its `further_constraint`. Validation turns the raw text extracted from a
//! message into a normalized [`ArgumentValue`], or reports a
//! [`ConstraintFailure`] naming what was expected and what was received.
//!
//! # Examples
//!
//! ```
//! use command_manual_core::{ArgumentValue, TypeConstraint};
//!
//! let rank = TypeConstraint::uint4();
//! assert_eq!(rank.validate("12").unwrap(), ArgumentValue::Integer(12));
//! assert!(rank.validate("-1").is_err());
//!
//! let sort = TypeConstraint::choice("sort order", ["Jump ID", "Entry Added Date"]);
//! assert_eq!(
//!     sort.validate("entry-added date").unwrap(),
//!     ArgumentValue::Choice("Entry Added Date".into()),
//! );
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Constraint applied to a raw argument string.
///
/// Serialized with an internal `type` tag so manuals can be declared in JSON
/// or YAML:
///
/// ```
/// use command_manual_core::TypeConstraint;
///
/// let parsed: TypeConstraint =
///     serde_json::from_str(r#"{"type": "integer", "min": 0, "max": 10}"#).unwrap();
/// assert_eq!(parsed, TypeConstraint::Integer { min: Some(0), max: Some(10) });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeConstraint {
    /// A platform snowflake ID, bare or wrapped as a mention.
    Snowflake,
    /// A yes/no value.
    Boolean,
    /// One of a fixed list of values, compared after normalization.
    Choice {
        /// Display name for the value set (e.g. "kingdom").
        name: String,
        /// Canonical spellings of the accepted values.
        choices: Vec<String>,
    },
    /// A whole number within inclusive bounds.
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    /// Free text with character-count bounds.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// An http(s) link, optionally restricted to a set of domains.
    Link {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        domains: Vec<String>,
    },
}

/// A normalized argument value produced by [`TypeConstraint::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Boolean(bool),
    Integer(i64),
    Snowflake(u64),
    Choice(String),
    Link(String),
    Text(String),
}

impl ArgumentValue {
    /// Returns the string payload for text, choice, and link values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Choice(s) | Self::Link(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_snowflake(&self) -> Option<u64> {
        match self {
            Self::Snowflake(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Snowflake(id) => write!(f, "{id}"),
            Self::Choice(s) | Self::Link(s) | Self::Text(s) => f.write_str(s),
        }
    }
}

/// Why a raw value was rejected by a [`TypeConstraint`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintFailure {
    #[error("expected a user, channel, or role ID (a number like 864326626111913995), got \"{value}\"")]
    NotASnowflake { value: String },
    #[error("expected yes or no (true/false), got \"{value}\"")]
    NotABoolean { value: String },
    #[error("expected a {name} (one of: {}), got \"{value}\"", choices.join(", "))]
    NotAChoice {
        value: String,
        name: String,
        choices: Vec<String>,
    },
    #[error("expected a whole number, got \"{value}\"")]
    NotAnInteger { value: String },
    #[error("expected {expected}, got {value}")]
    OutOfRange { value: i64, expected: String },
    #[error("expected {expected}, got {length} characters")]
    BadLength { length: usize, expected: String },
    #[error("expected an http or https link, got \"{value}\"")]
    NotALink { value: String },
    #[error("expected a link to {}, got a link to \"{host}\"", domains.join(" or "))]
    DisallowedDomain { host: String, domains: Vec<String> },
}

impl TypeConstraint {
    /// Unsigned four-byte integer range, `0..=4294967295`.
    pub fn uint4() -> Self {
        Self::Integer {
            min: Some(0),
            max: Some(i64::from(u32::MAX)),
        }
    }

    /// Builds a choice constraint from any iterable of strings.
    pub fn choice<I, S>(name: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice {
            name: name.to_string(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a link constraint restricted to the given domains.
    pub fn link_to<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Link {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Enumerable choices, used for platform-native choice pickers.
    pub fn choices(&self) -> Option<&[String]> {
        match self {
            Self::Choice { choices, .. } => Some(choices),
            _ => None,
        }
    }

    /// Validates and normalizes `raw`.
    ///
    /// Surrounding whitespace is ignored by every constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintFailure`] describing the expected shape and the
    /// offending value.
    pub fn validate(&self, raw: &str) -> Result<ArgumentValue, ConstraintFailure> {
        let value = raw.trim();
        match self {
            Self::Snowflake => parse_snowflake(value)
                .map(ArgumentValue::Snowflake)
                .ok_or_else(|| ConstraintFailure::NotASnowflake {
                    value: value.to_string(),
                }),
            Self::Boolean => parse_boolean(value)
                .map(ArgumentValue::Boolean)
                .ok_or_else(|| ConstraintFailure::NotABoolean {
                    value: value.to_string(),
                }),
            Self::Choice { name, choices } => {
                let wanted = normalize_choice(value);
                choices
                    .iter()
                    .find(|choice| normalize_choice(choice) == wanted)
                    .map(|choice| ArgumentValue::Choice(choice.clone()))
                    .ok_or_else(|| ConstraintFailure::NotAChoice {
                        value: value.to_string(),
                        name: name.clone(),
                        choices: choices.clone(),
                    })
            }
            Self::Integer { min, max } => {
                let n: i64 = value.parse().map_err(|_| ConstraintFailure::NotAnInteger {
                    value: value.to_string(),
                })?;
                let above_min = min.is_none_or(|lo| n >= lo);
                let below_max = max.is_none_or(|hi| n <= hi);
                if above_min && below_max {
                    Ok(ArgumentValue::Integer(n))
                } else {
                    Err(ConstraintFailure::OutOfRange {
                        value: n,
                        expected: self.to_string(),
                    })
                }
            }
            Self::Text {
                min_length,
                max_length,
            } => {
                let length = value.chars().count();
                let long_enough = min_length.is_none_or(|lo| length >= lo);
                let short_enough = max_length.is_none_or(|hi| length <= hi);
                if long_enough && short_enough {
                    Ok(ArgumentValue::Text(value.to_string()))
                } else {
                    Err(ConstraintFailure::BadLength {
                        length,
                        expected: self.to_string(),
                    })
                }
            }
            Self::Link { domains } => validate_link(value, domains),
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snowflake => f.write_str("a user, channel, or role ID"),
            Self::Boolean => f.write_str("yes or no"),
            Self::Choice { name, choices } => {
                write!(f, "a {name} (one of: {})", choices.join(", "))
            }
            Self::Integer { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => write!(f, "a whole number from {lo} to {hi}"),
                (Some(lo), None) => write!(f, "a whole number of at least {lo}"),
                (None, Some(hi)) => write!(f, "a whole number of at most {hi}"),
                (None, None) => f.write_str("a whole number"),
            },
            Self::Text {
                min_length,
                max_length,
            } => match (min_length, max_length) {
                (Some(lo), Some(hi)) => write!(f, "text of {lo} to {hi} characters"),
                (Some(lo), None) => write!(f, "text of at least {lo} characters"),
                (None, Some(hi)) => write!(f, "text of at most {hi} characters"),
                (None, None) => f.write_str("text"),
            },
            Self::Link { domains } if domains.is_empty() => f.write_str("an http or https link"),
            Self::Link { domains } => write!(f, "a link to {}", domains.join(" or ")),
        }
    }
}

/// Normalizes free-form input for choice comparison.
///
/// Trims, turns `-` and `_` into spaces, drops everything that is not
/// alphanumeric or whitespace, lowercases, and collapses runs of whitespace.
///
/// ```
/// use command_manual_core::normalize_choice;
///
/// assert_eq!(normalize_choice("  Entry_Added-Date! "), "entry added date");
/// ```
pub fn normalize_choice(input: &str) -> String {
    let kept: String = input
        .trim()
        .chars()
        .map(|ch| if ch == '-' || ch == '_' { ' ' } else { ch })
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_snowflake(value: &str) -> Option<u64> {
    let inner = match value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
        Some(wrapped) => ["@!", "@&", "@", "#"]
            .iter()
            .find_map(|sigil| wrapped.strip_prefix(sigil))?,
        None => value,
    };
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn validate_link(value: &str, domains: &[String]) -> Result<ArgumentValue, ConstraintFailure> {
    let not_a_link = || ConstraintFailure::NotALink {
        value: value.to_string(),
    };
    let url = Url::parse(value).map_err(|_| not_a_link())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(not_a_link());
    }
    let host = url.host_str().ok_or_else(not_a_link)?.to_ascii_lowercase();

    if !domains.is_empty() {
        let allowed = domains.iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        });
        if !allowed {
            return Err(ConstraintFailure::DisallowedDomain {
                host,
                domains: domains.to_vec(),
            });
        }
    }

    Ok(ArgumentValue::Link(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_accepts_bare_and_mention_forms() {
        let c = TypeConstraint::Snowflake;
        assert_eq!(
            c.validate("864326626111913995").unwrap(),
            ArgumentValue::Snowflake(864326626111913995)
        );
        assert_eq!(c.validate("<@!42>").unwrap(), ArgumentValue::Snowflake(42));
        assert_eq!(c.validate("<#7>").unwrap(), ArgumentValue::Snowflake(7));
        assert_eq!(c.validate("<@&9>").unwrap(), ArgumentValue::Snowflake(9));
    }

    #[test]
    fn test_snowflake_rejects_garbage() {
        let c = TypeConstraint::Snowflake;
        for bad in ["", "abc", "12a", "<@>", "<!42>", "99999999999999999999999"] {
            assert!(
                matches!(c.validate(bad), Err(ConstraintFailure::NotASnowflake { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_boolean_spellings() {
        let c = TypeConstraint::Boolean;
        assert_eq!(c.validate("Yes").unwrap(), ArgumentValue::Boolean(true));
        assert_eq!(c.validate("off").unwrap(), ArgumentValue::Boolean(false));
        let err = c.validate("maybe").unwrap_err();
        assert!(err.to_string().contains("\"maybe\""));
    }

    #[test]
    fn test_choice_normalizes_to_canonical_spelling() {
        let c = TypeConstraint::choice("kingdom", ["Cap", "Cascade", "Sand"]);
        assert_eq!(
            c.validate("  CASCADE ").unwrap(),
            ArgumentValue::Choice("Cascade".into())
        );
        let err = c.validate("Lake").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected a kingdom (one of: Cap, Cascade, Sand), got \"Lake\""
        );
        assert_eq!(c.choices().map(<[String]>::len), Some(3));
    }

    #[test]
    fn test_integer_bounds_are_inclusive() {
        let c = TypeConstraint::Integer {
            min: Some(1),
            max: Some(5),
        };
        assert_eq!(c.validate("1").unwrap(), ArgumentValue::Integer(1));
        assert_eq!(c.validate("5").unwrap(), ArgumentValue::Integer(5));
        let err = c.validate("6").unwrap_err();
        assert_eq!(err.to_string(), "expected a whole number from 1 to 5, got 6");
        assert!(matches!(
            c.validate("2.5"),
            Err(ConstraintFailure::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_uint4_range() {
        let c = TypeConstraint::uint4();
        assert!(c.validate("4294967295").is_ok());
        assert!(c.validate("4294967296").is_err());
    }

    #[test]
    fn test_text_length_counts_characters() {
        let c = TypeConstraint::Text {
            min_length: Some(2),
            max_length: Some(4),
        };
        assert_eq!(c.validate(" äöü ").unwrap(), ArgumentValue::Text("äöü".into()));
        assert!(matches!(
            c.validate("a"),
            Err(ConstraintFailure::BadLength { length: 1, .. })
        ));
    }

    #[test]
    fn test_link_domain_restriction() {
        let c = TypeConstraint::link_to(["youtube.com", "youtu.be"]);
        assert!(c.validate("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(c.validate("https://youtu.be/abc").is_ok());
        assert!(matches!(
            c.validate("https://notyoutube.com/watch"),
            Err(ConstraintFailure::DisallowedDomain { .. })
        ));
        assert!(matches!(
            c.validate("ftp://youtube.com/x"),
            Err(ConstraintFailure::NotALink { .. })
        ));
        assert!(matches!(
            c.validate("not a link"),
            Err(ConstraintFailure::NotALink { .. })
        ));
    }

    #[test]
    fn test_constraint_deserializes_from_tagged_json() {
        let parsed: TypeConstraint = serde_json::from_str(
            r#"{"type": "choice", "name": "tier", "choices": ["Easy", "Hard"]}"#,
        )
        .unwrap();
        assert_eq!(parsed, TypeConstraint::choice("tier", ["Easy", "Hard"]));

        let parsed: TypeConstraint = serde_json::from_str(r#"{"type": "snowflake"}"#).unwrap();
        assert_eq!(parsed, TypeConstraint::Snowflake);
    }
}
