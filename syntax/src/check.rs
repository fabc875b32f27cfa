//! Validation and normalization of extracted arguments.

use command_manual_core::{ArgumentValue, SubcommandManual};
use serde::Serialize;
use thiserror::Error;

use crate::arguments::{RawArguments, ValidatedArguments};

/// Every reason a set of raw arguments was rejected, in declaration order.
///
/// These reasons are meant to be shown to the person who sent the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}", information.join("; "))]
pub struct CheckFailure {
    pub information: Vec<String>,
}

/// Checks raw argument text against a manual's declared arguments.
///
/// Blank values count as absent. Absent optional arguments become `None`;
/// absent required arguments and constraint failures are reported. All
/// arguments are checked before returning, so the failure lists every
/// problem at once. Arguments without a constraint are normalized to
/// trimmed text.
///
/// # Errors
///
/// Returns a [`CheckFailure`] when any argument is missing or invalid.
///
/// # Examples
///
/// ```
/// use command_manual_core::{ArgumentValue, CommandArgument, SubcommandManual, TypeConstraint};
/// use command_manual_syntax::{RawArguments, check};
///
/// let manual = SubcommandManual::new("rank", "<prefix>tier rank $1{opt $2}[ RANK $2]", "")
///     .with_argument(CommandArgument::required("tier name", "name"))
///     .with_argument(
///         CommandArgument::optional("rank", "rank").with_constraint(TypeConstraint::uint4()),
///     );
///
/// let validated = check(&manual, &RawArguments::new().with("name", " Gold ")).unwrap();
/// assert_eq!(validated.text("name"), Some("Gold"));
/// assert_eq!(validated.get("rank"), None);
/// assert_eq!(validated.len(), 2);
///
/// let failure = check(&manual, &RawArguments::new().with("rank", "x")).unwrap_err();
/// assert_eq!(failure.information.len(), 2);
/// ```
pub fn check(
    manual: &SubcommandManual,
    raw: &RawArguments,
) -> Result<ValidatedArguments, CheckFailure> {
    let mut validated = ValidatedArguments::default();
    let mut information = Vec::new();

    for argument in &manual.arguments {
        let supplied = raw.get(&argument.id).filter(|v| !v.trim().is_empty());

        let Some(value) = supplied else {
            if !argument.optional {
                information.push(format!("missing required argument \"{}\"", argument.name));
            }
            validated.insert(&argument.id, None);
            continue;
        };

        let normalized = match &argument.further_constraint {
            Some(constraint) => constraint.validate(value),
            None => Ok(ArgumentValue::Text(value.trim().to_string())),
        };
        match normalized {
            Ok(normalized) => validated.insert(&argument.id, Some(normalized)),
            Err(failure) => information.push(format!("argument \"{}\": {failure}", argument.name)),
        }
    }

    if information.is_empty() {
        Ok(validated)
    } else {
        Err(CheckFailure { information })
    }
}
