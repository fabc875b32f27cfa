//! Scanner for the syntax template language.
//!
//! A template is plain text with four kinds of tokens:
//!
//! - `<prefix>`: replaced by the guild's command prefix.
//! - `$N`: the N-th declared argument, counting from 1.
//! - `{opt $K}[...]`: an optional fragment, present only when argument K is
//!   provided. Fragments do not nest.
//! - `::`: a pair of markers delimiting the determination tag, the part of
//!   the syntax that identifies which command a message is attempting.
//!
//! The scanner tracks byte positions so every [`TemplateError`] points at the
//! offending token.

use command_manual_core::CommandArgument;
use thiserror::Error;

const PREFIX_PLACEHOLDER: &str = "<prefix>";
const TAG_MARKER: &str = "::";
const OPT_OPEN: &str = "{opt";

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Prefix,
    TagMarker,
    /// Reference to a declared argument; `argument` is zero-based, `at` is
    /// the byte index of the `$`.
    Argument { argument: usize, at: usize },
    Optional(Fragment),
}

/// An optional fragment `{opt $K}[body]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Zero-based index of the argument the fragment depends on.
    pub argument: usize,
    /// Byte index of the opening `{`.
    pub at: usize,
    pub body: Vec<Segment>,
    /// The fragment exactly as written.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateErrorKind {
    #[error("`{0}` is not a valid argument reference (arguments are numbered from $1)")]
    InvalidReference(String),
    #[error("malformed optional fragment header, expected `{{opt $N}}[`")]
    MalformedHeader,
    #[error("optional fragment is missing its closing `]`")]
    UnterminatedFragment,
    #[error("optional fragment has an empty body")]
    EmptyFragment,
    #[error("optional fragments cannot be nested")]
    NestedFragment,
    #[error("determination tag markers `::` cannot appear inside an optional fragment")]
    MarkerInFragment,
    #[error("determination tag markers `::` must come as a single pair")]
    UnbalancedTagMarkers,
    #[error("`${reference}` refers past the {declared} declared arguments")]
    ArgumentOutOfRange { reference: usize, declared: usize },
    #[error("fragment `{{opt ${reference}}}` depends on required argument \"{name}\"")]
    FragmentOnRequired { reference: usize, name: String },
    #[error("optional argument \"{name}\" (${reference}) has no `{{opt ${reference}}}` fragment")]
    OptionalWithoutFragment { reference: usize, name: String },
    #[error("template does not compile to a usable pattern: {0}")]
    Pattern(String),
}

/// A template problem with the byte index it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at index {index}")]
pub struct TemplateError {
    pub kind: TemplateErrorKind,
    pub index: usize,
}

impl TemplateError {
    pub fn new(kind: TemplateErrorKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// A parsed syntax template.
///
/// # Examples
///
/// ```
/// use command_manual_syntax::{Segment, Template};
///
/// let template = Template::parse("<prefix>proof get NAME $1{opt $2}[ USER $2]").unwrap();
/// assert_eq!(template.segments()[0], Segment::Prefix);
/// assert_eq!(template.fragments().count(), 1);
/// assert_eq!(template.fragment_arguments(), vec![1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Scans `source` into segments.
    ///
    /// # Errors
    ///
    /// Returns the first grammar error: `$0`, a malformed or unterminated
    /// fragment, an empty or nested fragment, or unbalanced `::` markers.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut scanner = Scanner {
            source,
            pos: 0,
            markers: Vec::new(),
        };
        let segments = scanner.segments(false)?;

        match scanner.markers.len() {
            0 | 2 => {}
            1 => {
                return Err(TemplateError::new(
                    TemplateErrorKind::UnbalancedTagMarkers,
                    scanner.markers[0],
                ));
            }
            _ => {
                return Err(TemplateError::new(
                    TemplateErrorKind::UnbalancedTagMarkers,
                    scanner.markers[2],
                ));
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Optional(fragment) => Some(fragment),
            _ => None,
        })
    }

    pub fn has_tag_markers(&self) -> bool {
        self.segments.contains(&Segment::TagMarker)
    }

    /// Zero-based arguments that own at least one fragment, ascending.
    pub fn fragment_arguments(&self) -> Vec<usize> {
        let mut arguments: Vec<usize> = self.fragments().map(|f| f.argument).collect();
        arguments.sort_unstable();
        arguments.dedup();
        arguments
    }

    /// Every `$N` reference as `(argument, byte index)`, fragment bodies
    /// included, in source order.
    pub fn references(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        collect_references(&self.segments, &mut out);
        out
    }

    /// Checks the template against the argument list it will be used with.
    ///
    /// Reports references past the end of the list, fragments tied to
    /// arguments that are not optional and optional arguments without a
    /// fragment. The last are reported at their first reference, or at the
    /// end of the template when they are never referenced.
    pub fn check_arguments(&self, arguments: &[CommandArgument]) -> Vec<TemplateError> {
        let declared = arguments.len();
        let mut errors = Vec::new();

        for fragment in self.fragments() {
            match arguments.get(fragment.argument) {
                None => errors.push(TemplateError::new(
                    TemplateErrorKind::ArgumentOutOfRange {
                        reference: fragment.argument + 1,
                        declared,
                    },
                    fragment.at,
                )),
                Some(argument) if !argument.optional => errors.push(TemplateError::new(
                    TemplateErrorKind::FragmentOnRequired {
                        reference: fragment.argument + 1,
                        name: argument.name.clone(),
                    },
                    fragment.at,
                )),
                Some(_) => {}
            }
        }

        let references = self.references();
        for (argument, at) in &references {
            let (argument, at) = (*argument, *at);
            if argument >= declared {
                errors.push(TemplateError::new(
                    TemplateErrorKind::ArgumentOutOfRange {
                        reference: argument + 1,
                        declared,
                    },
                    at,
                ));
            }
        }

        let owned = self.fragment_arguments();
        for (index, argument) in arguments.iter().enumerate() {
            if !argument.optional || owned.contains(&index) {
                continue;
            }
            let at = references
                .iter()
                .find(|(referenced, _)| *referenced == index)
                .map_or(self.source.len(), |&(_, at)| at);
            errors.push(TemplateError::new(
                TemplateErrorKind::OptionalWithoutFragment {
                    reference: index + 1,
                    name: argument.name.clone(),
                },
                at,
            ));
        }

        errors.sort_by_key(|e| e.index);
        errors
    }

    /// Segments forming the determination tag.
    ///
    /// With `::` markers these are the segments between them; otherwise the
    /// leading segments up to the first argument or fragment. Surrounding
    /// whitespace is trimmed.
    pub fn tag_segments(&self) -> Vec<Segment> {
        let mut tag: Vec<Segment> = if self.has_tag_markers() {
            self.segments
                .iter()
                .skip_while(|s| **s != Segment::TagMarker)
                .skip(1)
                .take_while(|s| **s != Segment::TagMarker)
                .cloned()
                .collect()
        } else {
            self.segments
                .iter()
                .take_while(|s| matches!(s, Segment::Text(_) | Segment::Prefix))
                .cloned()
                .collect()
        };

        if let Some(Segment::Text(text)) = tag.first_mut() {
            *text = text.trim_start().to_string();
        }
        if let Some(Segment::Text(text)) = tag.last_mut() {
            *text = text.trim_end().to_string();
        }
        tag.retain(|s| !matches!(s, Segment::Text(t) if t.is_empty()));
        tag
    }
}

fn collect_references(segments: &[Segment], out: &mut Vec<(usize, usize)>) {
    for segment in segments {
        match segment {
            Segment::Argument { argument, at } => out.push((*argument, *at)),
            Segment::Optional(fragment) => collect_references(&fragment.body, out),
            _ => {}
        }
    }
}

struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    markers: Vec<usize>,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn segments(&mut self, in_fragment: bool) -> Result<Vec<Segment>, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();

        while let Some(ch) = self.rest().chars().next() {
            if in_fragment && ch == ']' {
                break;
            }

            if self.rest().starts_with(PREFIX_PLACEHOLDER) {
                flush_text(&mut text, &mut segments);
                segments.push(Segment::Prefix);
                self.pos += PREFIX_PLACEHOLDER.len();
                continue;
            }

            if self.rest().starts_with(TAG_MARKER) {
                if in_fragment {
                    return Err(TemplateError::new(
                        TemplateErrorKind::MarkerInFragment,
                        self.pos,
                    ));
                }
                flush_text(&mut text, &mut segments);
                self.markers.push(self.pos);
                segments.push(Segment::TagMarker);
                self.pos += TAG_MARKER.len();
                continue;
            }

            if ch == '$'
                && let Some((argument, len)) = self.reference()?
            {
                flush_text(&mut text, &mut segments);
                segments.push(Segment::Argument {
                    argument,
                    at: self.pos,
                });
                self.pos += len;
                continue;
            }

            if ch == '{' && self.at_fragment_header() {
                if in_fragment {
                    return Err(TemplateError::new(
                        TemplateErrorKind::NestedFragment,
                        self.pos,
                    ));
                }
                flush_text(&mut text, &mut segments);
                let fragment = self.fragment()?;
                segments.push(Segment::Optional(fragment));
                continue;
            }

            text.push(ch);
            self.pos += ch.len_utf8();
        }

        flush_text(&mut text, &mut segments);
        Ok(segments)
    }

    /// `{opt` (any case) followed by whitespace or `$`.
    fn at_fragment_header(&self) -> bool {
        let rest = self.rest();
        let Some(head) = rest.get(..OPT_OPEN.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(OPT_OPEN) {
            return false;
        }
        rest[OPT_OPEN.len()..]
            .chars()
            .next()
            .is_some_and(|c| c == '$' || c.is_whitespace())
    }

    /// Reads `$N` at the cursor without consuming it. Returns the zero-based
    /// argument and the token length, or `None` when the cursor is not at a
    /// `$` followed by digits.
    fn reference(&self) -> Result<Option<(usize, usize)>, TemplateError> {
        let rest = self.rest();
        if !rest.starts_with('$') {
            return Ok(None);
        }
        let digits = rest[1..].bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Ok(None);
        }
        let token = &rest[..=digits];
        match token[1..].parse::<usize>() {
            Ok(n) if n > 0 => Ok(Some((n - 1, token.len()))),
            _ => Err(TemplateError::new(
                TemplateErrorKind::InvalidReference(token.to_string()),
                self.pos,
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        let skipped = self.rest().len() - self.rest().trim_start().len();
        self.pos += skipped;
    }

    fn expect(&mut self, ch: char, start: usize) -> Result<(), TemplateError> {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(TemplateError::new(TemplateErrorKind::MalformedHeader, start))
        }
    }

    fn fragment(&mut self) -> Result<Fragment, TemplateError> {
        let start = self.pos;
        self.pos += OPT_OPEN.len();
        self.skip_whitespace();

        let Some((argument, len)) = self.reference()? else {
            return Err(TemplateError::new(TemplateErrorKind::MalformedHeader, start));
        };
        self.pos += len;
        self.skip_whitespace();
        self.expect('}', start)?;
        self.skip_whitespace();
        self.expect('[', start)?;

        let body = self.segments(true)?;
        if !self.rest().starts_with(']') {
            return Err(TemplateError::new(
                TemplateErrorKind::UnterminatedFragment,
                start,
            ));
        }
        self.pos += 1;

        let blank = body
            .iter()
            .all(|s| matches!(s, Segment::Text(t) if t.trim().is_empty()));
        if blank {
            return Err(TemplateError::new(TemplateErrorKind::EmptyFragment, start));
        }

        Ok(Fragment {
            argument,
            at: start,
            body,
            raw: self.source[start..self.pos].to_string(),
        })
    }
}

fn flush_text(text: &mut String, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}
