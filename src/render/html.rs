//! Structural repair of the rendered document.
//!
//! The session tracks every open element. Content that is not wrapped in an
//! `<html>` element gets one, and content outside of `<head>` gets exactly one
//! `<body>`. The closing tags of these wrappers are pushed onto the tag stack
//! as virtual entries and written when an enclosing element closes or when
//! the top level render finishes.

use std::fmt::Write;

use crate::fmt::Formatter;
use crate::render::Session;
use crate::{Error, Result};

/// An element on the tag stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenTag<'r> {
    /// An element opened by the program, holds the element name.
    Real(&'r str),
    /// A wrapper inserted by the renderer, holds its closing tag.
    Virtual(&'static str),
}

impl<'r> Session<'r> {
    /// Writes an opening tag prefix, `<name`.
    pub(crate) fn open_tag(&mut self, f: &mut Formatter<'_>, text: &'r str) -> Result<()> {
        let name = &text[1..];
        self.line_feed(f)?;
        if self.tags.is_empty() && !is(name, "html") {
            self.wrap(f, "html")?;
        }
        if is(name, "head") {
            self.within_head = true;
        } else if !is(name, "html") && !self.within_head {
            if is(name, "body") {
                self.within_body = true;
            } else if !self.within_body {
                self.wrap(f, "body")?;
            }
        }
        self.tags.push(OpenTag::Real(name));
        f.write_str(text)?;
        Ok(())
    }

    /// Writes the prefix of a self-closing tag, which is never pushed.
    pub(crate) fn inline_tag(&mut self, f: &mut Formatter<'_>, text: &'r str) -> Result<()> {
        let name = &text[1..];
        if self.tags.is_empty() && !is(name, "html") {
            self.wrap(f, "html")?;
        }
        if !is(name, "head") && !self.within_head && !is(name, "body") && !self.within_body {
            self.wrap(f, "body")?;
        }
        self.line_feed(f)?;
        f.write_str(text)?;
        Ok(())
    }

    /// Writes a closing tag, `</name>`, first closing any wrappers that were
    /// opened inside the element.
    pub(crate) fn close_tag(&mut self, f: &mut Formatter<'_>, text: &'r str) -> Result<()> {
        loop {
            match self.tags.pop() {
                Some(OpenTag::Virtual(closer)) => self.unwrap(f, closer)?,
                Some(OpenTag::Real(name)) => {
                    if is(name, "head") {
                        self.within_head = false;
                    } else if is(name, "body") {
                        self.within_body = false;
                    }
                    break;
                }
                None => {
                    return Err(Error::structural(format!(
                        "unexpected closing tag `{text}`, no element is open"
                    )));
                }
            }
        }
        f.write_str(text)?;
        if self.options.line_feeds && !self.tags.is_empty() {
            f.write_char('\n')?;
        }
        Ok(())
    }

    /// Closes the remaining wrappers at the end of the top level render.
    pub(crate) fn finish(&mut self, f: &mut Formatter<'_>) -> Result<()> {
        while let Some(tag) = self.tags.pop() {
            match tag {
                OpenTag::Virtual(closer) => self.unwrap(f, closer)?,
                OpenTag::Real(name) => {
                    return Err(Error::structural(format!(
                        "element `{name}` was never closed"
                    )));
                }
            }
        }
        Ok(())
    }

    fn wrap(&mut self, f: &mut Formatter<'_>, name: &'static str) -> Result<()> {
        let (open, closer) = match name {
            "html" => ("<html>", "</html>"),
            _ => ("<body>", "</body>"),
        };
        tracing::trace!(element = name, "inserting wrapper");
        f.write_str(open)?;
        self.tags.push(OpenTag::Virtual(closer));
        if closer == "</body>" {
            self.within_body = true;
        }
        Ok(())
    }

    fn unwrap(&mut self, f: &mut Formatter<'_>, closer: &'static str) -> Result<()> {
        f.write_str(closer)?;
        if closer == "</body>" {
            self.within_body = false;
        }
        Ok(())
    }

    fn line_feed(&mut self, f: &mut Formatter<'_>) -> Result<()> {
        if self.options.line_feeds && !self.tags.is_empty() {
            f.write_char('\n')?;
        }
        Ok(())
    }
}

fn is(name: &str, element: &str) -> bool {
    name.eq_ignore_ascii_case(element)
}
