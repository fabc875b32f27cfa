//! Core command manual types and structural validation.
//!
//! This crate defines the declarative description of a chat-bot command:
//!
//! - [`SubcommandManual`] (alias [`SimpleCommandManual`]): one syntax
//!   template with its arguments and description.
//! - [`MultifacetedCommandManual`]: a command grouping several subcommands.
//! - [`CommandArgument`]: a positional argument with an optional
//!   [`TypeConstraint`].
//! - [`CommandManual`]: either shape, after classification.
//!
//! Declarations loaded at runtime are classified with [`classify`], which
//! never trusts a value's shape without checking every required field, and
//! then checked with [`validate_manual`].
//!
//! # Example
//!
//! ```
//! use command_manual_core::*;
//!
//! let manual = MultifacetedCommandManual::new("proof", "Manage jump proofs.")
//!     .with_subcommand(
//!         SubcommandManual::new(
//!             "get",
//!             "<prefix>proof get NAME $1{opt $2}[ USER $2]",
//!             "Retrieves the link to a proof.",
//!         )
//!         .with_argument(CommandArgument::required("jump name", "name"))
//!         .with_argument(
//!             CommandArgument::optional("user ID", "user")
//!                 .with_constraint(TypeConstraint::Snowflake),
//!         ),
//!     );
//!
//! let manual = CommandManual::from(manual);
//! assert!(validate_manual(&manual).is_empty());
//! assert_eq!(manual.syntaxes()[0].optional_indices(), vec![1]);
//! ```

mod constraint;
mod types;
mod validate;

pub use constraint::{ArgumentValue, ConstraintFailure, TypeConstraint, normalize_choice};
pub use types::*;
pub use validate::{
    Classification, ManualError, argument_from_value, classify, multifaceted_from_value,
    simple_from_value, validate_manual,
};
