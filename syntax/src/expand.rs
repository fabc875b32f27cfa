//! Expansion of syntax templates into concrete, human-readable syntaxes.
//!
//! A template with optional fragments describes several syntaxes at once.
//! In [`SyntaxMode::Enumerated`] every combination of present and absent
//! optional arguments is listed; in [`SyntaxMode::Compact`] a single syntax
//! describes each optional part inline as `(optional: ...)`.
//!
//! # Examples
//!
//! ```
//! use command_manual_core::{CommandArgument, SubcommandManual};
//! use command_manual_syntax::expand;
//!
//! let manual = SubcommandManual::new("x", "<prefix>x $1{opt $2}[ A $2]{opt $3}[ B $3]", "")
//!     .with_argument(CommandArgument::required("a", "a"))
//!     .with_argument(CommandArgument::optional("b", "b"))
//!     .with_argument(CommandArgument::optional("c", "c"));
//!
//! let syntaxes = expand(&manual, &manual.syntax, "%").unwrap();
//! assert_eq!(
//!     syntaxes,
//!     vec!["%x <a>", "%x <a> A <b>", "%x <a> B <c>", "%x <a> A <b> B <c>"],
//! );
//!
//! let compact = expand(&manual.clone().compact(), &manual.syntax, "%").unwrap();
//! assert_eq!(compact, vec!["%x <a>(optional: A <b>)(optional: B <c>)"]);
//! ```

use command_manual_core::SubcommandManual;
use serde::Serialize;
use tracing::{debug, warn};

use crate::template::{Fragment, Segment, Template, TemplateError};

/// How optional fragments are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxMode {
    /// One syntax per combination of optional arguments.
    Enumerated,
    /// One syntax with every optional part described inline.
    Compact,
}

impl SyntaxMode {
    pub fn of(manual: &SubcommandManual) -> Self {
        if manual.compact_syntaxes {
            Self::Compact
        } else {
            Self::Enumerated
        }
    }
}

/// Expands `syntax` using the arguments and mode of `manual`.
///
/// `syntax` is normally `manual.syntax`; it is taken separately so a
/// template can be previewed against a manual's arguments before it is
/// stored.
///
/// # Errors
///
/// Returns a [`TemplateError`] when the template does not scan.
pub fn expand(
    manual: &SubcommandManual,
    syntax: &str,
    prefix: &str,
) -> Result<Vec<String>, TemplateError> {
    let template = Template::parse(syntax)?;
    Ok(expand_template(
        manual,
        &template,
        prefix,
        SyntaxMode::of(manual),
    ))
}

/// Expands a parsed template in the given mode.
///
/// Enumerated output lists combinations in binary-counting order over the
/// optional arguments that own a fragment: the first optional argument is
/// the least significant bit, so the first syntax has every optional part
/// absent and the last has every part present.
///
/// Fragments tied to a required or undeclared argument are kept as written
/// (with arguments substituted), and `$N` past the argument list stays
/// literal. Each syntax is trimmed.
pub fn expand_template(
    manual: &SubcommandManual,
    template: &Template,
    prefix: &str,
    mode: SyntaxMode,
) -> Vec<String> {
    let toggles: Vec<usize> = template
        .fragment_arguments()
        .into_iter()
        .filter(|&index| manual.arguments.get(index).is_some_and(|a| a.optional))
        .collect();

    let renderer = Renderer { manual, prefix };
    let syntaxes: Vec<String> = match mode {
        SyntaxMode::Compact => vec![
            renderer
                .render(template.segments(), &|_| Presence::Inline)
                .trim()
                .to_string(),
        ],
        SyntaxMode::Enumerated => (0..1usize << toggles.len())
            .map(|mask| {
                let presence = |argument: usize| match toggles.iter().position(|&t| t == argument)
                {
                    Some(bit) if (mask >> bit) & 1 == 1 => Presence::Present,
                    _ => Presence::Absent,
                };
                renderer
                    .render(template.segments(), &presence)
                    .trim()
                    .to_string()
            })
            .collect(),
    };

    debug!(
        manual = %manual.name,
        ?mode,
        count = syntaxes.len(),
        "expanded syntax template"
    );
    syntaxes
}

/// Expands `manual.syntax`, falling back to the raw template on error.
///
/// Used where a broken template must still produce visible output, such as
/// help text. The fallback substitutes `<prefix>` and drops `::` markers.
pub fn expand_lossy(manual: &SubcommandManual, prefix: &str) -> Vec<String> {
    match expand(manual, &manual.syntax, prefix) {
        Ok(syntaxes) => syntaxes,
        Err(err) => {
            warn!(manual = %manual.name, error = %err, "rendering unparsable syntax template as written");
            vec![manual.syntax.replace("<prefix>", prefix).replace("::", "")]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Present,
    Absent,
    Inline,
}

struct Renderer<'a> {
    manual: &'a SubcommandManual,
    prefix: &'a str,
}

impl Renderer<'_> {
    fn render(&self, segments: &[Segment], presence: &dyn Fn(usize) -> Presence) -> String {
        let mut out = String::new();
        self.render_into(segments, presence, &mut out);
        out
    }

    fn render_into(
        &self,
        segments: &[Segment],
        presence: &dyn Fn(usize) -> Presence,
        out: &mut String,
    ) {
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Prefix => out.push_str(self.prefix),
                Segment::TagMarker => {}
                Segment::Argument { argument, .. } => self.push_argument(*argument, out),
                Segment::Optional(fragment) => self.render_fragment(fragment, presence, out),
            }
        }
    }

    fn push_argument(&self, argument: usize, out: &mut String) {
        match self.manual.arguments.get(argument) {
            Some(declared) => {
                out.push('<');
                out.push_str(&declared.name);
                out.push('>');
            }
            None => {
                out.push('$');
                out.push_str(&(argument + 1).to_string());
            }
        }
    }

    fn render_fragment(
        &self,
        fragment: &Fragment,
        presence: &dyn Fn(usize) -> Presence,
        out: &mut String,
    ) {
        let toggleable = self
            .manual
            .arguments
            .get(fragment.argument)
            .is_some_and(|a| a.optional);
        if !toggleable {
            out.push_str(&format!("{{opt ${}}}[", fragment.argument + 1));
            self.render_into(&fragment.body, presence, out);
            out.push(']');
            return;
        }

        match presence(fragment.argument) {
            Presence::Absent => {}
            Presence::Present => self.render_into(&fragment.body, presence, out),
            Presence::Inline => {
                let body = self.render(&fragment.body, presence);
                out.push_str("(optional: ");
                out.push_str(body.trim_start());
                out.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use command_manual_core::{CommandArgument, TypeConstraint};

    use super::*;

    fn choose() -> SubcommandManual {
        SubcommandManual::new(
            "choose",
            "<prefix>jumprole choose $1",
            "Designates a Jumprole commands channel.",
        )
        .with_argument(
            CommandArgument::required("channel", "channel_snowflake")
                .with_constraint(TypeConstraint::Snowflake),
        )
    }

    fn tier_update() -> SubcommandManual {
        SubcommandManual::new(
            "update",
            "::<prefix>tier update:: NAME $1{opt $2}[ NEW NAME $2]{opt $3}[ RANK $3]",
            "Updates a tier.",
        )
        .with_argument(CommandArgument::required("tier name", "name"))
        .with_argument(CommandArgument::optional("new tier name", "new_name"))
        .with_argument(
            CommandArgument::optional("rank", "rank").with_constraint(TypeConstraint::uint4()),
        )
    }

    #[test]
    fn test_expand_without_optionals_yields_one_syntax() {
        let manual = choose();
        let syntaxes = expand(&manual, &manual.syntax, "%").unwrap();
        assert_eq!(syntaxes, vec!["%jumprole choose <channel>"]);
    }

    #[test]
    fn test_expand_enumerates_in_binary_order_and_strips_markers() {
        let manual = tier_update();
        let syntaxes = expand(&manual, &manual.syntax, "!").unwrap();
        assert_eq!(
            syntaxes,
            vec![
                "!tier update NAME <tier name>",
                "!tier update NAME <tier name> NEW NAME <new tier name>",
                "!tier update NAME <tier name> RANK <rank>",
                "!tier update NAME <tier name> NEW NAME <new tier name> RANK <rank>",
            ]
        );
    }

    #[test]
    fn test_expand_count_is_power_of_two_without_duplicates() {
        let mut manual = SubcommandManual::new("s", "<prefix>s", "");
        let mut syntax = String::from("<prefix>s");
        for i in 1..=4 {
            let id = format!("arg{i}");
            manual = manual.with_argument(CommandArgument::optional(&id, &id));
            syntax.push_str(&format!("{{opt ${i}}}[ K{i} ${i}]"));
        }

        let syntaxes = expand(&manual, &syntax, "%").unwrap();
        assert_eq!(syntaxes.len(), 16);
        let unique: HashSet<_> = syntaxes.iter().collect();
        assert_eq!(unique.len(), 16);
        assert_eq!(syntaxes[0], "%s");
        assert_eq!(
            syntaxes[15],
            "%s K1 <arg1> K2 <arg2> K3 <arg3> K4 <arg4>"
        );
        assert_eq!(syntaxes, expand(&manual, &syntax, "%").unwrap());
    }

    #[test]
    fn test_compact_mode_yields_single_inline_syntax() {
        let manual = SubcommandManual::new("get", "<prefix>proof get NAME $1{opt $2}[ USER $2]", "")
            .with_argument(CommandArgument::required("jump name", "name"))
            .with_argument(CommandArgument::optional("user ID", "user"))
            .compact();

        let syntaxes = expand(&manual, &manual.syntax, "%").unwrap();
        assert_eq!(
            syntaxes,
            vec!["%proof get NAME <jump name>(optional: USER <user ID>)"]
        );
    }

    #[test]
    fn test_eleven_optionals_are_all_enumerated() {
        let mut manual = SubcommandManual::new("s", "<prefix>s", "");
        let mut syntax = String::from("<prefix>s");
        for i in 1..=11 {
            let id = format!("arg{i}");
            manual = manual.with_argument(CommandArgument::optional(&id, &id));
            syntax.push_str(&format!("{{opt ${i}}}[ K{i} ${i}]"));
        }

        let syntaxes = expand(&manual, &syntax, "%").unwrap();
        assert_eq!(syntaxes.len(), 2048);
        assert_eq!(syntaxes.iter().collect::<HashSet<_>>().len(), 2048);
        assert_eq!(syntaxes[0], "%s");
        assert!(syntaxes[2047].ends_with(" K11 <arg11>"));
        assert!(syntaxes.iter().all(|s| !s.contains("(optional:")));
    }

    #[test]
    fn test_degraded_fragments_are_rendered_as_written() {
        let manual = SubcommandManual::new("x", "<prefix>x {opt $1}[ A $1]{opt $2}[ B $2] $3", "")
            .with_argument(CommandArgument::required("a", "a"));
        let syntaxes = expand(&manual, &manual.syntax, "%").unwrap();
        assert_eq!(syntaxes, vec!["%x {opt $1}[ A <a>]{opt $2}[ B $2] $3"]);
    }

    #[test]
    fn test_expand_lossy_falls_back_to_raw_template() {
        let manual = SubcommandManual::new("x", "::<prefix>x:: {opt $1}[", "");
        assert_eq!(expand_lossy(&manual, "%"), vec!["%x {opt $1}["]);
    }

    #[test]
    fn test_syntax_mode_follows_manual_flag() {
        assert_eq!(SyntaxMode::of(&choose()), SyntaxMode::Enumerated);
        assert_eq!(SyntaxMode::of(&choose().compact()), SyntaxMode::Compact);
    }
}
