//! The syntax template engine for command manuals.
//!
//! - [`Template`] scans the template language (`<prefix>`, `$N`,
//!   `{opt $K}[...]`, `::` tag markers) with position-indexed errors.
//! - [`expand`] lists every concrete syntax, or one compact syntax.
//! - [`SyntaxMatcher`] decides whether a message calls a manual and extracts
//!   raw argument text; [`first_matching_subcommand`] picks the subcommand of
//!   a multifaceted manual.
//! - [`check`] validates and normalizes extracted arguments.
//! - [`render`] produces help text; [`lint_manual`] reports template problems
//!   at load time.
//!
//! Everything here is a pure function of immutable manuals, safe to call
//! from concurrent invocations.
//!
//! # Example
//!
//! ```
//! use command_manual_core::{CommandArgument, SubcommandManual, TypeConstraint};
//! use command_manual_syntax::*;
//!
//! let manual = SubcommandManual::new(
//!     "choose",
//!     "<prefix>jumprole choose $1",
//!     "Designates a Jumprole commands channel.",
//! )
//! .with_argument(
//!     CommandArgument::required("channel", "channel_snowflake")
//!         .with_constraint(TypeConstraint::Snowflake),
//! );
//!
//! assert_eq!(
//!     expand(&manual, &manual.syntax, "%").unwrap(),
//!     vec!["%jumprole choose <channel>"],
//! );
//!
//! let raw = extract(&manual, "%", "%jumprole choose <#864326626111913995>")
//!     .unwrap()
//!     .unwrap();
//! let validated = check(&manual, &raw).unwrap();
//! assert_eq!(validated.snowflake("channel_snowflake"), Some(864326626111913995));
//! ```

mod arguments;
mod check;
mod expand;
mod lint;
mod matcher;
mod render;
mod template;

pub use arguments::{RawArguments, ValidatedArguments};
pub use check::{CheckFailure, check};
pub use expand::{SyntaxMode, expand, expand_lossy, expand_template};
pub use lint::{LintIssue, lint_manual, lint_syntax};
pub use matcher::{
    CommandRegexError, MatcherCache, SubcommandMatch, SyntaxMatcher, command_regex,
    determination_tag, extract, first_matching_subcommand, is_attempted_call, is_call,
};
pub use render::{INDENT, indent, render, render_multifaceted, render_simple};
pub use template::{Fragment, Segment, Template, TemplateError, TemplateErrorKind};
