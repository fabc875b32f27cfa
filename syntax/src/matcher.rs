//! Call matching and raw argument extraction.
//!
//! A [`SyntaxMatcher`] is compiled from one subcommand manual and one prefix.
//! It accepts any of the syntaxes the template expands to, case-insensitively:
//!
//! - literal whitespace matches one or more whitespace characters,
//! - `<prefix>` matches the prefix followed by optional whitespace,
//! - each `$N` slot takes a double-quoted span or the shortest run of text
//!   that lets the rest of the template match,
//! - each optional fragment may be present, absent or written the way
//!   compact syntaxes show it, `(optional: ...)`.
//!
//! Outcomes are kept distinct: a broken template is a [`TemplateError`], a
//! message that is not this command is `false` / `None`.
//!
//! # Examples
//!
//! ```
//! use command_manual_core::{CommandArgument, SubcommandManual};
//! use command_manual_syntax::SyntaxMatcher;
//!
//! let manual = SubcommandManual::new("get", "::<prefix>proof get:: NAME $1{opt $2}[ USER $2]", "")
//!     .with_argument(CommandArgument::required("jump name", "name"))
//!     .with_argument(CommandArgument::optional("user ID", "user"));
//!
//! let matcher = SyntaxMatcher::compile(&manual, "%").unwrap();
//! let raw = matcher.extract("%proof get name Jump One user 864326626111913995").unwrap();
//! assert_eq!(raw.get("name"), Some("Jump One"));
//! assert_eq!(raw.get("user"), Some("864326626111913995"));
//!
//! assert!(matcher.is_attempted_call("%proof get"));
//! assert!(!matcher.is_call("%proof get"));
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use command_manual_core::{MultifacetedCommandManual, SubcommandManual};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error};

use crate::arguments::RawArguments;
use crate::template::{Segment, Template, TemplateError, TemplateErrorKind};

const ARGUMENT_PATTERN: &str = r#"("[^"]*"|.+?)"#;

/// A subcommand manual compiled against one prefix.
#[derive(Debug, Clone)]
pub struct SyntaxMatcher {
    regex: Regex,
    tag: Regex,
    tag_text: String,
    /// Capture group `i + 1` holds argument `slots[i]`.
    slots: Vec<usize>,
    argument_ids: Vec<String>,
}

impl SyntaxMatcher {
    /// Compiles `manual.syntax` for `prefix`.
    ///
    /// # Errors
    ///
    /// Returns the first problem in the template: a scan error, a `$N` past
    /// the argument list, a fragment tied to a non-optional argument or an
    /// optional argument with no fragment.
    pub fn compile(manual: &SubcommandManual, prefix: &str) -> Result<Self, TemplateError> {
        let template = Template::parse(&manual.syntax)?;
        if let Some(err) = template.check_arguments(&manual.arguments).into_iter().next() {
            return Err(err);
        }

        let mut slots = Vec::new();
        let mut body = String::new();
        push_pattern(&trimmed(template.segments()), prefix, &mut slots, &mut body);
        let regex = build_regex(&format!(r"(?is)^\s*{body}\s*$"))?;

        let tag_segments = template.tag_segments();
        let mut tag_body = String::new();
        push_pattern(&tag_segments, prefix, &mut Vec::new(), &mut tag_body);
        let tag = build_regex(&format!(r"(?is)^\s*{tag_body}(?:\s|$)"))?;

        debug!(manual = %manual.name, pattern = %regex.as_str(), "compiled syntax matcher");

        Ok(Self {
            regex,
            tag,
            tag_text: render_tag(&tag_segments, manual, prefix),
            slots,
            argument_ids: manual.arguments.iter().map(|a| a.id.clone()).collect(),
        })
    }

    /// Whether `input` is a complete, well-formed call.
    pub fn is_call(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// Whether `input` starts with this command's determination tag, whatever
    /// follows it.
    pub fn is_attempted_call(&self, input: &str) -> bool {
        self.tag.is_match(input)
    }

    /// The determination tag with the prefix substituted, e.g. `%tj list`.
    pub fn determination_tag(&self) -> &str {
        &self.tag_text
    }

    /// Extracts raw argument text, or `None` when `input` is not a call.
    ///
    /// Every declared argument gets an entry. Quoted values lose their
    /// quotes; an argument referenced more than once takes its first
    /// non-empty capture.
    pub fn extract(&self, input: &str) -> Option<RawArguments> {
        let captures = self.regex.captures(input)?;
        let mut raw = RawArguments::new();
        for id in &self.argument_ids {
            raw.set_absent(id);
        }

        for (group, &argument) in self.slots.iter().enumerate() {
            let Some(found) = captures.get(group + 1) else {
                continue;
            };
            let value = unquote(found.as_str().trim());
            let id = &self.argument_ids[argument];
            if !value.is_empty() && raw.get(id).is_none() {
                raw.set(id, value);
            }
        }
        Some(raw)
    }
}

/// Whether `input` is a call of `manual`.
///
/// # Errors
///
/// Returns a [`TemplateError`] when the manual's template is broken.
pub fn is_call(manual: &SubcommandManual, prefix: &str, input: &str) -> Result<bool, TemplateError> {
    Ok(SyntaxMatcher::compile(manual, prefix)?.is_call(input))
}

/// Whether `input` attempts to call `manual`, judged by its determination tag.
///
/// # Errors
///
/// Returns a [`TemplateError`] when the manual's template is broken.
pub fn is_attempted_call(
    manual: &SubcommandManual,
    prefix: &str,
    input: &str,
) -> Result<bool, TemplateError> {
    Ok(SyntaxMatcher::compile(manual, prefix)?.is_attempted_call(input))
}

/// Extracts raw arguments from `input`, or `None` when it is not a call.
///
/// # Errors
///
/// Returns a [`TemplateError`] when the manual's template is broken.
pub fn extract(
    manual: &SubcommandManual,
    prefix: &str,
    input: &str,
) -> Result<Option<RawArguments>, TemplateError> {
    Ok(SyntaxMatcher::compile(manual, prefix)?.extract(input))
}

/// Renders the identifying part of a manual's syntax, e.g. `%jumprole choose`.
///
/// # Errors
///
/// Returns a [`TemplateError`] when the template does not scan.
pub fn determination_tag(manual: &SubcommandManual, prefix: &str) -> Result<String, TemplateError> {
    let template = Template::parse(&manual.syntax)?;
    Ok(render_tag(&template.tag_segments(), manual, prefix))
}

/// Result of [`first_matching_subcommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubcommandMatch<'m> {
    Matched {
        subcommand: &'m SubcommandManual,
        arguments: RawArguments,
    },
    NoMatch {
        /// First subcommand whose determination tag the input carries.
        attempted: Option<&'m SubcommandManual>,
        /// Subcommands skipped because their template is broken.
        broken: Vec<(&'m str, TemplateError)>,
    },
}

/// Selects the first subcommand, in declaration order, that `input` calls.
///
/// Subcommands with broken templates are logged and skipped.
///
/// Every subcommand is compiled on each call; a [`MatcherCache`] keeps the
/// compiled matchers between calls.
pub fn first_matching_subcommand<'m>(
    manual: &'m MultifacetedCommandManual,
    prefix: &str,
    input: &str,
) -> SubcommandMatch<'m> {
    match_subcommands(manual, input, |subcommand| {
        SyntaxMatcher::compile(subcommand, prefix)
    })
}

fn match_subcommands<'m, M>(
    manual: &'m MultifacetedCommandManual,
    input: &str,
    mut compile: impl FnMut(&SubcommandManual) -> Result<M, TemplateError>,
) -> SubcommandMatch<'m>
where
    M: Borrow<SyntaxMatcher>,
{
    let mut attempted = None;
    let mut broken = Vec::new();

    for subcommand in &manual.subcommands {
        let matcher = match compile(subcommand) {
            Ok(matcher) => matcher,
            Err(err) => {
                error!(
                    command = %manual.name,
                    subcommand = %subcommand.name,
                    error = %err,
                    "skipping subcommand with broken syntax template"
                );
                broken.push((subcommand.name.as_str(), err));
                continue;
            }
        };

        let matcher: &SyntaxMatcher = matcher.borrow();
        if let Some(arguments) = matcher.extract(input) {
            return SubcommandMatch::Matched {
                subcommand,
                arguments,
            };
        }
        if attempted.is_none() && matcher.is_attempted_call(input) {
            attempted = Some(subcommand);
        }
    }

    SubcommandMatch::NoMatch { attempted, broken }
}

type CompiledMatcher = Result<Arc<SyntaxMatcher>, TemplateError>;

/// Compiled matchers kept across calls, keyed by manual name, syntax
/// template and prefix.
///
/// A manual must keep its arguments for as long as its matchers are cached.
/// Broken templates are cached too, as their error.
#[derive(Debug, Default)]
pub struct MatcherCache {
    compiled: Mutex<HashMap<(String, String, String), CompiledMatcher>>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The matcher for `manual` under `prefix`, compiled on first use.
    ///
    /// # Errors
    ///
    /// Returns the [`TemplateError`] that [`SyntaxMatcher::compile`] gave.
    pub fn get(&self, manual: &SubcommandManual, prefix: &str) -> CompiledMatcher {
        let key = (manual.name.clone(), manual.syntax.clone(), prefix.to_string());
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        compiled
            .entry(key)
            .or_insert_with(|| SyntaxMatcher::compile(manual, prefix).map(Arc::new))
            .clone()
    }

    /// [`first_matching_subcommand`] with matchers taken from the cache.
    pub fn first_matching_subcommand<'m>(
        &self,
        manual: &'m MultifacetedCommandManual,
        prefix: &str,
        input: &str,
    ) -> SubcommandMatch<'m> {
        match_subcommands(manual, input, |subcommand| self.get(subcommand, prefix))
    }

    pub fn len(&self) -> usize {
        self.compiled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRegexError {
    #[error("command name \"{0}\" must be non-empty and contain no whitespace")]
    IllegalCommandName(String),
    #[error("command prefix cannot be empty")]
    IllegalPrefix,
    #[error("command pattern failed to compile: {0}")]
    Pattern(String),
}

/// Recognises `name` invoked after `prefix`, case-insensitively.
///
/// ```
/// use command_manual_syntax::command_regex;
///
/// let regex = command_regex("tj", "%").unwrap();
/// assert!(regex.is_match("%TJ list"));
/// assert!(regex.is_match("% tj"));
/// assert!(!regex.is_match("%tjx"));
/// ```
///
/// # Errors
///
/// Rejects empty names, names containing whitespace, and empty prefixes.
pub fn command_regex(name: &str, prefix: &str) -> Result<Regex, CommandRegexError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(CommandRegexError::IllegalCommandName(name.to_string()));
    }
    if prefix.is_empty() {
        return Err(CommandRegexError::IllegalPrefix);
    }
    let pattern = format!(
        r"(?i)^{}\s*{}(?:\s|$)",
        regex::escape(prefix),
        regex::escape(name)
    );
    Regex::new(&pattern).map_err(|err| CommandRegexError::Pattern(err.to_string()))
}

fn build_regex(pattern: &str) -> Result<Regex, TemplateError> {
    Regex::new(pattern)
        .map_err(|err| TemplateError::new(TemplateErrorKind::Pattern(err.to_string()), 0))
}

/// Drops leading whitespace of the first text segment and trailing
/// whitespace of the last; the pattern wrapper already allows both.
fn trimmed(segments: &[Segment]) -> Vec<Segment> {
    let mut out = segments.to_vec();
    if let Some(Segment::Text(text)) = out.first_mut() {
        *text = text.trim_start().to_string();
    }
    if let Some(Segment::Text(text)) = out.last_mut() {
        *text = text.trim_end().to_string();
    }
    out
}

fn push_pattern(segments: &[Segment], prefix: &str, slots: &mut Vec<usize>, out: &mut String) {
    // Whitespace before a fragment belongs to the fragment, so an absent
    // fragment does not leave a dangling `\s+`.
    let mut carried_space = false;

    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text(text) => {
                let before_fragment = matches!(segments.get(i + 1), Some(Segment::Optional(_)));
                if before_fragment && text.ends_with(char::is_whitespace) {
                    push_literal(text.trim_end(), out);
                    carried_space = true;
                    continue;
                }
                push_literal(text, out);
            }
            Segment::Prefix => {
                out.push_str(&regex::escape(prefix));
                out.push_str(r"\s*");
            }
            Segment::TagMarker => {}
            Segment::Argument { argument, .. } => {
                slots.push(*argument);
                out.push_str(ARGUMENT_PATTERN);
            }
            Segment::Optional(fragment) => {
                // The fragment as written, or as compact syntaxes show it:
                // `(optional: <body>)`. Both alternatives capture into the
                // same slots; `extract` keeps whichever one matched.
                out.push_str("(?:(?:");
                let body_spaced = matches!(
                    fragment.body.first(),
                    Some(Segment::Text(t)) if t.starts_with(char::is_whitespace)
                );
                if carried_space && !body_spaced {
                    out.push_str(r"\s+");
                }
                push_pattern(&fragment.body, prefix, slots, out);
                out.push_str(r")|\s*\(optional:\s*");
                push_pattern(&trimmed(&fragment.body), prefix, slots, out);
                out.push_str(r"\s*\))?");
            }
        }
        carried_space = false;
    }
}

fn push_literal(text: &str, out: &mut String) {
    let mut in_space = false;
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push_str(r"\s+");
            }
            in_space = true;
        } else {
            out.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
            in_space = false;
        }
    }
}

fn render_tag(segments: &[Segment], manual: &SubcommandManual, prefix: &str) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Prefix => out.push_str(prefix),
            Segment::Argument { argument, .. } => match manual.arguments.get(*argument) {
                Some(declared) => {
                    out.push('<');
                    out.push_str(&declared.name);
                    out.push('>');
                }
                None => out.push_str(&format!("${}", argument + 1)),
            },
            Segment::TagMarker | Segment::Optional(_) => {}
        }
    }
    out.trim().to_string()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
