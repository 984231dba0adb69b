//! Output sinks and the formatting rules for values.
//!
//! Rendered text is written to a [`Formatter`], an append-only façade over a
//! [`String`] or an arbitrary [`std::io::Write`] buffer. The functions in this
//! module define how a [`Value`] is turned into text, both for plain output
//! and for HTML attributes. The compiler uses the exact same functions when it
//! folds constant expressions, so folding never changes the rendered result.
//!
//! # Examples
//!
//! ```
//! use pugvm::fmt::{self, Formatter};
//! use pugvm::Value;
//!
//! let mut s = String::new();
//! let mut f = Formatter::with_string(&mut s);
//! fmt::attr(&mut f, "class", &Value::from(["a", "b"]), true)?;
//! fmt::attr(&mut f, "hidden", &Value::Bool(true), true)?;
//! fmt::attr(&mut f, "title", &Value::None, true)?;
//! assert_eq!(s, r#" class="a b" hidden"#);
//! # Ok::<(), pugvm::fmt::Error>(())
//! ```

use std::fmt;
use std::fmt::Write;
use std::io;

use crate::Value;

/// A [`std::fmt::Write`] façade.
pub struct Formatter<'a> {
    buf: &'a mut (dyn fmt::Write + 'a),
}

/// The result type returned from formatting functions.
pub type Result = std::result::Result<(), Error>;

/// The error type returned from formatting functions.
#[derive(Debug, Clone)]
pub struct Error(Option<String>);

pub(crate) struct Writer<W> {
    writer: W,
    err: Option<io::Error>,
}

impl<'a> Formatter<'a> {
    /// Construct a formatter that appends to the given string.
    pub fn with_string(buf: &'a mut String) -> Self {
        Self { buf }
    }

    pub(crate) fn with_writer<W>(buf: &'a mut Writer<W>) -> Self
    where
        W: io::Write,
    {
        Self { buf }
    }
}

impl fmt::Write for Formatter<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        fmt::Write::write_str(self.buf, s)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        fmt::Write::write_char(self.buf, c)
    }

    #[inline]
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        fmt::Write::write_fmt(self.buf, args)
    }
}

impl Error {
    pub(crate) fn message(self) -> Option<String> {
        self.0
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(msg) => write!(f, "{msg}"),
            None => write!(f, "format error"),
        }
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self(Some(msg.to_owned()))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self(Some(msg))
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Self(None)
    }
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer, err: None }
    }

    pub fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}

impl<W> fmt::Write for Writer<W>
where
    W: io::Write,
{
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_all(s.as_bytes()).map_err(|e| {
            self.err = Some(e);
            fmt::Error
        })
    }
}

/// Writes the string with `&`, `<`, `>`, `"` and `'` replaced by their HTML
/// entities.
pub fn escape_html(f: &mut Formatter<'_>, s: &str) -> Result {
    let mut last = 0;
    for (i, c) in s.char_indices() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#39;",
            _ => continue,
        };
        f.write_str(&s[last..i])?;
        f.write_str(entity)?;
        last = i + 1;
    }
    f.write_str(&s[last..])?;
    Ok(())
}

/// The default value formatter.
///
/// Values are formatted as follows:
/// - [`Value::None`]: empty string
/// - [`Value::Bool`]: `true` or `false`
/// - [`Value::Integer`]: the integer formatted using [`Display`][std::fmt::Display]
/// - [`Value::Float`]: the float formatted using [`Display`][std::fmt::Display]
/// - [`Value::String`]: the string, unescaped
///
/// Errors if the value is a [`Value::List`] or [`Value::Map`].
#[inline]
pub fn default(f: &mut Formatter<'_>, value: &Value) -> Result {
    match value {
        Value::None => {}
        Value::Bool(b) => write!(f, "{b}")?,
        Value::Integer(n) => write!(f, "{n}")?,
        Value::Float(n) => write!(f, "{n}")?,
        Value::String(s) => f.write_str(s)?,
        value => return Err(err_unformattable(value)),
    }
    Ok(())
}

/// Formats the value like [`default`] and HTML escapes the result.
pub fn escape(f: &mut Formatter<'_>, value: &Value) -> Result {
    match value {
        Value::String(s) => escape_html(f, s),
        value => default(f, value),
    }
}

/// Formats the value using [`escape`] or [`default`].
pub fn text(f: &mut Formatter<'_>, value: &Value, escaped: bool) -> Result {
    match escaped {
        true => escape(f, value),
        false => default(f, value),
    }
}

/// Formats a single attribute, including its leading space.
///
/// - [`Value::None`] and `false`: nothing at all
/// - `true`: the bare attribute name, e.g. ` checked`
/// - [`Value::List`]: the elements joined by a space, e.g. ` class="a b"`
/// - [`Value::Map`]: style syntax, e.g. ` style="color:red;"`
/// - any other value: ` name="value"`
pub fn attr(f: &mut Formatter<'_>, name: &str, value: &Value, escaped: bool) -> Result {
    match value {
        Value::None | Value::Bool(false) => Ok(()),
        Value::Bool(true) => {
            write!(f, " {name}")?;
            Ok(())
        }
        Value::List(list) => {
            write!(f, " {name}=\"")?;
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    f.write_char(' ')?;
                }
                text(f, item, escaped)?;
            }
            f.write_char('"')?;
            Ok(())
        }
        Value::Map(map) => {
            write!(f, " {name}=\"")?;
            for (key, value) in map {
                text(f, &Value::String(key.clone()), escaped)?;
                f.write_char(':')?;
                text(f, value, escaped)?;
                f.write_char(';')?;
            }
            f.write_char('"')?;
            Ok(())
        }
        value => {
            write!(f, " {name}=\"")?;
            text(f, value, escaped)?;
            f.write_char('"')?;
            Ok(())
        }
    }
}

/// Formats every entry of a map as an escaped attribute, in key order.
///
/// Errors if the value is not a [`Value::Map`].
pub fn attr_map(f: &mut Formatter<'_>, value: &Value) -> Result {
    match value {
        Value::Map(map) => {
            for (name, value) in map {
                attr(f, name, value, true)?;
            }
            Ok(())
        }
        value => Err(Error::from(format!(
            "attribute list evaluated to {}, expected map",
            value.human()
        ))),
    }
}

fn err_unformattable(value: &Value) -> Error {
    Error::from(format!(
        "expression evaluated to unformattable type {}",
        value.human()
    ))
}
