use std::cmp::max;
use std::fmt;
use std::io;

#[cfg(feature = "unicode")]
use unicode_width::UnicodeWidthStr;

use crate::types::span::Span;

/// A convenient type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An expression could not be parsed.
    Syntax,
    /// An expression could not be evaluated or its value could not be
    /// formatted.
    Eval,
    /// The element nesting of the output was violated, or a conditional
    /// branch appeared without a preceding `if`.
    Structural,
    /// An unknown mixin or an unusable mixin declaration.
    Lookup,
    /// A mixin was called with too few arguments.
    Arity,
    /// An include target is unknown, or includes were nested too deeply.
    Include,
    /// Writing to the output failed.
    Io,
}

/// An error that can occur during expression parsing or rendering.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    /// Whether the error aborts rendering regardless of options.
    fatal: bool,
    /// The included template in which the error occurred.
    name: Option<String>,
    /// The expression source and the span within it.
    span: Option<(String, Span)>,
}

impl Error {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            fatal: matches!(kind, ErrorKind::Structural | ErrorKind::Io),
            name: None,
            span: None,
        }
    }

    /// A syntax error pointing into the expression source. The span is
    /// dropped when there is no source to point into.
    pub(crate) fn syntax(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        let span = match source.is_empty() {
            true => None,
            false => Some((source.to_owned(), span.into())),
        };
        Self {
            span,
            ..Self::new(ErrorKind::Syntax, msg)
        }
    }

    pub(crate) fn eval(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Eval, msg)
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, msg)
    }

    pub(crate) fn lookup(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lookup, msg)
    }

    pub(crate) fn arity(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, msg)
    }

    pub(crate) fn include(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Include, msg)
    }

    pub(crate) fn max_include_depth(max: usize) -> Self {
        Self {
            fatal: true,
            ..Self::include(format!("reached maximum include depth ({max})"))
        }
    }

    /// Attaches the name of the template the error occurred in, keeping the
    /// innermost name if one is already set.
    pub(crate) fn with_template_name(mut self, name: impl Into<String>) -> Self {
        if self.name.is_none() {
            self.name = Some(name.into());
        }
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message without any source location.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the name of the included template the error occurred in.
    pub fn template_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this error aborts rendering even when `stop_on_error` is
    /// disabled.
    ///
    /// This is the case for structural failures, output failures and
    /// exceeding the maximum include depth.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn is_structural(&self) -> bool {
        self.kind == ErrorKind::Structural
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::new(ErrorKind::Eval, msg.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::new(ErrorKind::Io, format!("io error: {err}"))
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Self::new(ErrorKind::Io, "failed to write to the output")
    }
}

impl From<crate::fmt::Error> for Error {
    fn from(err: crate::fmt::Error) -> Self {
        match err.message() {
            Some(msg) => Self::eval(msg),
            None => Self::from(fmt::Error),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => fmt_pretty(&self.msg, source, *span, f),
            None => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            if !f.alternate() {
                write!(f, "{name}: ")?;
            }
        }
        match &self.span {
            Some((source, span)) => {
                if f.alternate() {
                    fmt_pretty(&self.msg, source, *span, f)
                } else {
                    write!(f, "{} between bytes {} and {}", self.msg, span.m, span.n)
                }
            }
            None => write!(f, "{}", self.msg),
        }
    }
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lines: Vec<_> = source.split_terminator('\n').collect();
    let (line, col) = to_line_col(&lines, span.m);
    let width = max(1, width(&source[span]));
    let code = lines
        .get(line)
        .or_else(|| lines.last())
        .copied()
        .unwrap_or_default();

    let num = (line + 1).to_string();
    let pad = num.len();
    let pipe = "|";
    let underline = "^".repeat(width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = msg
    )
}

fn to_line_col(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut n = 0;
    for (i, line) in lines.iter().enumerate() {
        let len = line.len() + 1;
        if n + len > offset {
            return (i, width(&line[..offset - n]));
        }
        n += len;
    }
    (
        lines.len().saturating_sub(1),
        lines.last().map(|l| width(l)).unwrap_or(0),
    )
}

#[cfg(feature = "unicode")]
fn width(s: &str) -> usize {
    s.width()
}

#[cfg(not(feature = "unicode"))]
fn width(s: &str) -> usize {
    s.chars().count()
}
