//! Help text rendering.
//!
//! ```text
//! tj <list/info>
//!     Description: Manage your jumps.
//!
//!     list:
//!         1. %tj list
//!         2. %tj list SOURCE <source>
//!         Description: Lists jumps.
//!     info:
//!         1. %tj info <jump name>
//!         Description: Shows a jump.
//! ```

use command_manual_core::{CommandManual, MultifacetedCommandManual, SubcommandManual};

use crate::expand::expand_lossy;

/// One level of indentation.
pub const INDENT: &str = "    ";

/// Prefixes every line of `text` with [`INDENT`].
///
/// Applying it repeatedly keeps nested blocks aligned.
///
/// ```
/// use command_manual_syntax::indent;
///
/// assert_eq!(indent("a\nb"), "    a\n    b");
/// assert_eq!(indent(&indent("a")), "        a");
/// ```
pub fn indent(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a simple manual: a `name:` header, the numbered syntaxes, and the
/// description.
pub fn render_simple(manual: &SubcommandManual, prefix: &str) -> String {
    let numbered = expand_lossy(manual, prefix)
        .iter()
        .enumerate()
        .map(|(i, syntax)| format!("{}. {syntax}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}:\n{}\n{}",
        manual.name,
        indent(&numbered),
        indent(&format!("Description: {}", manual.description))
    )
}

/// Renders a multifaceted manual: a `name <a/b/c>` header, the description,
/// then every subcommand one level in.
pub fn render_multifaceted(manual: &MultifacetedCommandManual, prefix: &str) -> String {
    let subcommands = manual
        .subcommands
        .iter()
        .map(|sub| render_simple(sub, prefix))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{} <{}>\n{}\n\n{}",
        manual.name,
        manual.subcommand_names().join("/"),
        indent(&format!("Description: {}", manual.description)),
        indent(&subcommands)
    )
}

/// Renders either kind of manual with `prefix` substituted.
pub fn render(manual: &CommandManual, prefix: &str) -> String {
    match manual {
        CommandManual::Simple(m) => render_simple(m, prefix),
        CommandManual::Multifaceted(m) => render_multifaceted(m, prefix),
    }
}
