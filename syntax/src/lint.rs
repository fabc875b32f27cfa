//! Load-time checks for syntax templates.

use std::fmt;

use command_manual_core::{CommandManual, SubcommandManual};

use crate::template::{Template, TemplateError};

/// A template problem found in one syntax of a manual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// Name of the simple manual or subcommand owning the syntax.
    pub syntax_name: String,
    pub syntax: String,
    pub error: TemplateError,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} in `{}`", self.syntax_name, self.error, self.syntax)
    }
}

/// Every problem in one template: its scan error, or each reference and
/// fragment that does not fit the argument list.
pub fn lint_syntax(manual: &SubcommandManual) -> Vec<TemplateError> {
    match Template::parse(&manual.syntax) {
        Ok(template) => template.check_arguments(&manual.arguments),
        Err(err) => vec![err],
    }
}

/// Lints every syntax of `manual`.
///
/// ```
/// use command_manual_core::{CommandArgument, SubcommandManual};
/// use command_manual_syntax::lint_manual;
///
/// let manual = SubcommandManual::new("x", "<prefix>x $1 $2", "")
///     .with_argument(CommandArgument::required("a", "a"));
/// let issues = lint_manual(&manual.into());
/// assert_eq!(issues.len(), 1);
/// assert_eq!(
///     issues[0].to_string(),
///     "x: `$2` refers past the 1 declared arguments at index 13 in `<prefix>x $1 $2`",
/// );
/// ```
pub fn lint_manual(manual: &CommandManual) -> Vec<LintIssue> {
    manual
        .syntaxes()
        .into_iter()
        .flat_map(|syntax| {
            lint_syntax(syntax).into_iter().map(|error| LintIssue {
                syntax_name: syntax.name.clone(),
                syntax: syntax.syntax.clone(),
                error,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use command_manual_core::{CommandArgument, MultifacetedCommandManual};

    use super::*;
    use crate::template::TemplateErrorKind;

    #[test]
    fn test_clean_manual_has_no_issues() {
        let manual = SubcommandManual::new("get", "<prefix>proof get NAME $1{opt $2}[ USER $2]", "")
            .with_argument(CommandArgument::required("jump name", "name"))
            .with_argument(CommandArgument::optional("user ID", "user"));
        assert!(lint_manual(&manual.into()).is_empty());
    }

    #[test]
    fn test_issues_name_their_subcommand() {
        let manual = MultifacetedCommandManual::new("tier", "")
            .with_subcommand(SubcommandManual::new("list", "<prefix>tier list", ""))
            .with_subcommand(
                SubcommandManual::new("delete", "<prefix>tier delete $1{opt $1}[ NOW]", "")
                    .with_argument(CommandArgument::required("tier name", "name")),
            )
            .with_subcommand(SubcommandManual::new("add", "<prefix>tier add {opt $1}[", ""));

        let issues = lint_manual(&manual.into());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].syntax_name, "delete");
        assert!(matches!(
            issues[0].error.kind,
            TemplateErrorKind::FragmentOnRequired { .. }
        ));
        assert_eq!(issues[1].syntax_name, "add");
        assert_eq!(issues[1].error.kind, TemplateErrorKind::UnterminatedFragment);
    }
}
