//! Defines a compiled [`Program`], a tree of [`Instr`] that can be executed by
//! the renderer.

use std::fmt;
use std::fmt::Write;

use crate::types::expr::Expr;

/// Flags that control compilation and rendering.
///
/// Every [`Program`] records the options it was compiled with. The render
/// entry points accept overriding options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Indent nested block elements and put them on their own lines.
    pub pretty: bool,
    /// Insert a newline around tags that are nested in another tag.
    pub line_feeds: bool,
    /// Abort rendering on the first evaluation, lookup or arity failure
    /// instead of reporting it and carrying on.
    pub stop_on_error: bool,
}

impl Options {
    /// Options with every flag disabled.
    pub const fn new() -> Self {
        Self {
            pretty: false,
            line_feeds: false,
            stop_on_error: false,
        }
    }

    /// Options with only `pretty` enabled.
    pub const fn pretty() -> Self {
        Self::new().with_pretty(true)
    }

    pub const fn with_pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    pub const fn with_line_feeds(mut self, yes: bool) -> Self {
        self.line_feeds = yes;
        self
    }

    pub const fn with_stop_on_error(mut self, yes: bool) -> Self {
        self.stop_on_error = yes;
        self
    }
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) root: Instr,
    pub(crate) options: Options,
    pub(crate) includes: Vec<String>,
}

/// A single instruction.
///
/// Block shaped instructions own their nested instructions. Literal text has
/// already been coalesced by the compiler so that adjacent [`Instr::Html`]
/// instructions never occur.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// A nested sequence of instructions.
    Block(Vec<Instr>),

    /// Literal HTML, emitted verbatim.
    Html(String),

    /// An opening tag prefix `<name` or a closing tag `</name>`.
    Tag(String),

    /// The prefix of a self-closing tag, `<name`, never pushed on the tag
    /// stack.
    InlineTag(String),

    /// Evaluate and emit an expression.
    Output { expr: Expr, escape: bool },

    /// Evaluate an expression and emit it as the named attribute.
    Attr {
        name: String,
        expr: Expr,
        escape: bool,
    },

    /// Evaluate a map and emit each entry as an attribute.
    AttrMap(Expr),

    /// Evaluate an expression for its side effects.
    Code(Expr),

    If { cond: Expr, body: Vec<Instr> },
    Unless { cond: Expr, body: Vec<Instr> },
    ElseIf { cond: Expr, body: Vec<Instr> },
    Else(Vec<Instr>),

    Case { subject: Expr, body: Vec<Instr> },
    /// A case branch, an empty body falls through to the next branch.
    When { value: Expr, body: Vec<Instr> },
    Default(Vec<Instr>),

    Each {
        var: String,
        iterable: Expr,
        body: Vec<Instr>,
    },
    EachPair {
        value: String,
        key: String,
        iterable: Expr,
        body: Vec<Instr>,
    },
    While { cond: Expr, body: Vec<Instr> },

    /// Register a mixin, the declaration is a call or a bare identifier.
    Mixin {
        name: String,
        decl: Expr,
        body: Vec<Instr>,
    },
    MixinCall { name: String, args: Option<Expr> },

    /// Render another template, `depth` is the indentation level at the
    /// include site.
    Include { name: String, depth: usize },
}

impl Program {
    pub(crate) fn new(root: Vec<Instr>, options: Options, includes: Vec<String>) -> Self {
        Self {
            root: Instr::Block(root),
            options,
            includes,
        }
    }

    /// Returns the root block instruction.
    pub fn root(&self) -> &Instr {
        &self.root
    }

    /// Returns the instructions of the root block.
    pub fn body(&self) -> &[Instr] {
        match &self.root {
            Instr::Block(body) => body,
            instr => std::slice::from_ref(instr),
        }
    }

    /// Returns the options this program was compiled with.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Returns the distinct include targets in the order they were found.
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Returns the total number of instructions, excluding the root.
    pub fn len(&self) -> usize {
        self.root.count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.body().is_empty()
    }

    /// Writes the instruction tree as indented human readable labels.
    pub fn describe<W: Write>(&self, w: &mut W) -> fmt::Result {
        self.root.describe(w, 0)
    }
}

impl Instr {
    /// Returns the nested instructions of a block shaped instruction.
    pub fn children(&self) -> &[Instr] {
        match self {
            Self::Block(body)
            | Self::If { body, .. }
            | Self::Unless { body, .. }
            | Self::ElseIf { body, .. }
            | Self::Else(body)
            | Self::Case { body, .. }
            | Self::When { body, .. }
            | Self::Default(body)
            | Self::Each { body, .. }
            | Self::EachPair { body, .. }
            | Self::While { body, .. }
            | Self::Mixin { body, .. } => body,
            _ => &[],
        }
    }

    fn count(&self) -> usize {
        1 + self.children().iter().map(Self::count).sum::<usize>()
    }

    fn describe<W: Write>(&self, w: &mut W, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            w.write_str("  ")?;
        }
        match self {
            Self::Block(body) => write!(w, "<block> of {}", body.len())?,
            Self::Html(text) => write!(w, "<html-entity> {text:?}")?,
            Self::Tag(text) => write!(w, "<html-tag> {text}")?,
            Self::InlineTag(text) => write!(w, "<html-inline-tag> {text}")?,
            Self::Output { expr, escape: true } => {
                write!(w, "<escaped output expression> {expr}")?
            }
            Self::Output {
                expr,
                escape: false,
            } => write!(w, "<unescaped output expression> {expr}")?,
            Self::Attr {
                name,
                expr,
                escape: true,
            } => write!(w, "<escaped attribute expression> {name}={expr}")?,
            Self::Attr {
                name,
                expr,
                escape: false,
            } => write!(w, "<unescaped attribute expression> {name}!={expr}")?,
            Self::AttrMap(expr) => write!(w, "<attribute list> {expr}")?,
            Self::Code(expr) => write!(w, "<code> {expr}")?,
            Self::If { cond, .. } => write!(w, "<if> {cond}")?,
            Self::Unless { cond, .. } => write!(w, "<unless> {cond}")?,
            Self::ElseIf { cond, .. } => write!(w, "<elseif> {cond}")?,
            Self::Else(_) => w.write_str("<else>")?,
            Self::Case { subject, .. } => write!(w, "<case> {subject}")?,
            Self::When { value, .. } => write!(w, "<when> {value}")?,
            Self::Default(_) => w.write_str("<default>")?,
            Self::Each { var, .. } => write!(w, "<each> {var}")?,
            Self::EachPair { value, key, .. } => write!(w, "<each> {value} {key}")?,
            Self::While { cond, .. } => write!(w, "<while> {cond}")?,
            Self::Mixin { name, .. } => write!(w, "<mixin> {name}")?,
            Self::MixinCall { name, .. } => write!(w, "<mixin-call> {name}")?,
            Self::Include { name, .. } => write!(w, "<include> {name}")?,
        }
        w.write_char('\n')?;
        for child in self.children() {
            child.describe(w, depth + 1)?;
        }
        Ok(())
    }
}
