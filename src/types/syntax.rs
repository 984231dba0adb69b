//! The syntax tree consumed by the compiler.
//!
//! A [`Document`] is an arena of [`Node`]s linked as a tree: every node knows
//! its first and last child and its previous and next sibling. Node `0` is
//! always the root. Producing a document from template text is the job of a
//! parser outside of this crate; [`Document::build`] offers a builder for
//! constructing one by hand.

use std::fmt;
use std::fmt::Write;

use crate::types::expr::Expr;
use crate::Result;

/// A handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// A syntax tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next: Option<NodeId>,
    prev: Option<NodeId>,
}

/// The construct a [`Node`] represents.
///
/// `Text`, `Output` and `InlineTag` are inline content. Every other kind is a
/// line-level construct whose children are its nested lines, except for
/// `Piped` and `PlainLine` which only hold inline content.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    /// Literal text.
    Text(String),
    /// Interpolation, `#{expr}` when escaped and `!{expr}` otherwise.
    Output { expr: Expr, escape: bool },
    /// An interpolated tag, `#[tag ...]`.
    InlineTag(Tag),
    /// A tag line.
    Tag(Tag),
    /// A `| text` line.
    Piped,
    /// A line inside a text block.
    PlainLine,
    /// The block of plain lines following `tag.`.
    TextBlock,
    /// A `//` comment that is output as HTML, or a `//-` comment that is
    /// dropped.
    Comment { html: bool },
    /// A `- code`, `= expr` or `!= expr` line.
    Code { expr: Expr, mode: CodeMode },
    Doctype(String),
    If(Expr),
    Unless(Expr),
    ElseIf(Expr),
    Else,
    Case(Expr),
    When(Expr),
    Default,
    /// `each var in iterable`
    Each { var: String, iterable: Expr },
    /// `each value, key in iterable`
    EachPair {
        value: String,
        key: String,
        iterable: Expr,
    },
    While(Expr),
    /// `mixin name(params)`, the declaration is a call or a bare identifier.
    Mixin(Expr),
    /// `+name(args)`
    MixinCall { name: String, args: Option<Expr> },
    Include(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMode {
    /// `- code`, evaluated for side effects only.
    Run,
    /// `= expr`
    Escaped,
    /// `!= expr`
    Unescaped,
}

/// An HTML tag with its shorthand and attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    /// The element name, an empty name means `div`.
    pub name: String,
    /// `#id` shorthand.
    pub id: Option<String>,
    /// `.class` shorthands in source order.
    pub classes: Vec<String>,
    /// Attributes in source order.
    pub attrs: Vec<Attr>,
    /// A trailing `/`.
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// `name=value`, `name!=value` or just `name`.
    Pair {
        name: String,
        value: Option<Expr>,
        escape: bool,
    },
    /// `&attributes(expr)`
    Map(Expr),
}

impl Document {
    /// Construct a document with only a root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root)],
        }
    }

    /// Construct a document using a [`Builder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pugvm::syntax::{Document, Tag};
    ///
    /// let doc = Document::build(|b| {
    ///     b.tag(Tag::new("p").class("lead"), |b| {
    ///         b.text("Hello ")?.output("name")?;
    ///         Ok(())
    ///     })?;
    ///     Ok(())
    /// })?;
    /// # Ok::<(), pugvm::Error>(())
    /// ```
    pub fn build<F>(f: F) -> Result<Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        let mut doc = Self::new();
        let root = doc.root();
        f(&mut Builder {
            doc: &mut doc,
            parent: root,
        })?;
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node for the handle.
    ///
    /// # Panics
    ///
    /// If the handle belongs to another document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Appends a node as the last child of `parent`.
    pub fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let mut node = Node::new(kind);
        node.prev = self.node(parent).last_child;
        self.nodes.push(node);
        match self.nodes[id.0 as usize].prev {
            Some(prev) => self.nodes[prev.0 as usize].next = Some(id),
            None => self.nodes[parent.0 as usize].first_child = Some(id),
        }
        self.nodes[parent.0 as usize].last_child = Some(id);
        id
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns the number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root()).first_child.is_none()
    }

    /// Writes the tree as indented human readable labels.
    pub fn describe<W: Write>(&self, w: &mut W) -> fmt::Result {
        self.describe_node(w, self.root(), 0)
    }

    fn describe_node<W: Write>(&self, w: &mut W, id: NodeId, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            w.write_str("  ")?;
        }
        writeln!(w, "{}", self.node(id).kind)?;
        for child in self.children(id) {
            self.describe_node(w, child, depth + 1)?;
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            first_child: None,
            last_child: None,
            next: None,
            prev: None,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }
}

impl NodeKind {
    /// Whether this is inline content rather than a line.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Output { .. } | Self::InlineTag(_))
    }
}

/// An iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.doc.node(id).next;
        Some(id)
    }
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Adds an escaped attribute, parsing the value as an expression.
    pub fn attr(self, name: impl Into<String>, value: &str) -> Result<Self> {
        self.push_pair(name, Some(Expr::parse(value)?), true)
    }

    /// Adds an unescaped attribute, parsing the value as an expression.
    pub fn attr_raw(self, name: impl Into<String>, value: &str) -> Result<Self> {
        self.push_pair(name, Some(Expr::parse(value)?), false)
    }

    /// Adds an attribute without a value, e.g. `checked`.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(Attr::Pair {
            name: name.into(),
            value: None,
            escape: true,
        });
        self
    }

    /// Adds an `&attributes(...)` map, parsing the expression.
    pub fn attributes(mut self, expr: &str) -> Result<Self> {
        self.attrs.push(Attr::Map(Expr::parse(expr)?));
        Ok(self)
    }

    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self
    }

    /// The element name with the `div` default applied.
    pub fn element(&self) -> &str {
        match self.name.is_empty() {
            true => "div",
            false => &self.name,
        }
    }

    fn push_pair(mut self, name: impl Into<String>, value: Option<Expr>, escape: bool) -> Result<Self> {
        self.attrs.push(Attr::Pair {
            name: name.into(),
            value,
            escape,
        });
        Ok(self)
    }
}

/// Appends nodes to a [`Document`].
///
/// Methods taking a closure create a node and let the closure append its
/// children. Methods taking an expression source parse it with
/// [`Expr::parse`].
pub struct Builder<'a> {
    doc: &'a mut Document,
    parent: NodeId,
}

impl Builder<'_> {
    /// Appends a node without children.
    pub fn node(&mut self, kind: NodeKind) -> NodeId {
        self.doc.push(self.parent, kind)
    }

    /// Appends a node and lets the closure append its children.
    pub fn nest<F>(&mut self, kind: NodeKind, f: F) -> Result<NodeId>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        let id = self.doc.push(self.parent, kind);
        f(&mut Builder {
            doc: self.doc,
            parent: id,
        })?;
        Ok(id)
    }

    pub fn text(&mut self, text: impl Into<String>) -> Result<&mut Self> {
        self.node(NodeKind::Text(text.into()));
        Ok(self)
    }

    /// Appends an escaped interpolation.
    pub fn output(&mut self, expr: &str) -> Result<&mut Self> {
        let expr = Expr::parse(expr)?;
        self.node(NodeKind::Output { expr, escape: true });
        Ok(self)
    }

    /// Appends an unescaped interpolation.
    pub fn output_raw(&mut self, expr: &str) -> Result<&mut Self> {
        let expr = Expr::parse(expr)?;
        self.node(NodeKind::Output {
            expr,
            escape: false,
        });
        Ok(self)
    }

    pub fn tag<F>(&mut self, tag: Tag, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Tag(tag), f)?;
        Ok(self)
    }

    /// Appends a tag without any content.
    pub fn empty(&mut self, tag: Tag) -> Result<&mut Self> {
        self.node(NodeKind::Tag(tag));
        Ok(self)
    }

    pub fn inline_tag<F>(&mut self, tag: Tag, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::InlineTag(tag), f)?;
        Ok(self)
    }

    pub fn piped<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Piped, f)?;
        Ok(self)
    }

    pub fn text_block<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::TextBlock, f)?;
        Ok(self)
    }

    /// Appends a plain line containing only literal text.
    pub fn line(&mut self, text: impl Into<String>) -> Result<&mut Self> {
        let text = text.into();
        self.nest(NodeKind::PlainLine, |b| {
            b.text(text)?;
            Ok(())
        })?;
        Ok(self)
    }

    pub fn comment<F>(&mut self, html: bool, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Comment { html }, f)?;
        Ok(self)
    }

    /// Appends a `- code` line.
    pub fn code(&mut self, expr: &str) -> Result<&mut Self> {
        self.code_with(expr, CodeMode::Run)
    }

    pub fn code_with(&mut self, expr: &str, mode: CodeMode) -> Result<&mut Self> {
        let expr = Expr::parse(expr)?;
        self.node(NodeKind::Code { expr, mode });
        Ok(self)
    }

    pub fn doctype(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.node(NodeKind::Doctype(name.into()));
        Ok(self)
    }

    pub fn if_<F>(&mut self, cond: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::If(Expr::parse(cond)?), f)?;
        Ok(self)
    }

    pub fn unless<F>(&mut self, cond: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Unless(Expr::parse(cond)?), f)?;
        Ok(self)
    }

    pub fn else_if<F>(&mut self, cond: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::ElseIf(Expr::parse(cond)?), f)?;
        Ok(self)
    }

    pub fn else_<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Else, f)?;
        Ok(self)
    }

    pub fn case<F>(&mut self, subject: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Case(Expr::parse(subject)?), f)?;
        Ok(self)
    }

    pub fn when<F>(&mut self, value: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::When(Expr::parse(value)?), f)?;
        Ok(self)
    }

    pub fn default<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Default, f)?;
        Ok(self)
    }

    pub fn each<F>(&mut self, var: &str, iterable: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        let kind = NodeKind::Each {
            var: var.to_owned(),
            iterable: Expr::parse(iterable)?,
        };
        self.nest(kind, f)?;
        Ok(self)
    }

    pub fn each_pair<F>(&mut self, value: &str, key: &str, iterable: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        let kind = NodeKind::EachPair {
            value: value.to_owned(),
            key: key.to_owned(),
            iterable: Expr::parse(iterable)?,
        };
        self.nest(kind, f)?;
        Ok(self)
    }

    pub fn while_<F>(&mut self, cond: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::While(Expr::parse(cond)?), f)?;
        Ok(self)
    }

    /// Appends a mixin declaration, e.g. `item(name, count = 1)`.
    pub fn mixin<F>(&mut self, decl: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Builder<'_>) -> Result<()>,
    {
        self.nest(NodeKind::Mixin(Expr::parse(decl)?), f)?;
        Ok(self)
    }

    /// Appends a mixin call with an optional argument list source.
    pub fn call(&mut self, name: &str, args: Option<&str>) -> Result<&mut Self> {
        let args = args.map(Expr::parse).transpose()?;
        self.node(NodeKind::MixinCall {
            name: name.to_owned(),
            args,
        });
        Ok(self)
    }

    pub fn include(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.node(NodeKind::Include(name.into()));
        Ok(self)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Text(text) => write!(f, "Text {text:?}"),
            Self::Output { expr, escape } => {
                let sigil = if *escape { '#' } else { '!' };
                write!(f, "Output {sigil}{{{expr}}}")
            }
            Self::InlineTag(tag) => write!(f, "InlineTag {tag}"),
            Self::Tag(tag) => write!(f, "Tag {tag}"),
            Self::Piped => f.write_str("Piped"),
            Self::PlainLine => f.write_str("PlainLine"),
            Self::TextBlock => f.write_str("TextBlock"),
            Self::Comment { html: true } => f.write_str("Comment"),
            Self::Comment { html: false } => f.write_str("Comment (template)"),
            Self::Code { expr, mode } => {
                let sigil = match mode {
                    CodeMode::Run => "-",
                    CodeMode::Escaped => "=",
                    CodeMode::Unescaped => "!=",
                };
                write!(f, "Code {sigil} {expr}")
            }
            Self::Doctype(name) => write!(f, "Doctype {name}"),
            Self::If(expr) => write!(f, "If {expr}"),
            Self::Unless(expr) => write!(f, "Unless {expr}"),
            Self::ElseIf(expr) => write!(f, "ElseIf {expr}"),
            Self::Else => f.write_str("Else"),
            Self::Case(expr) => write!(f, "Case {expr}"),
            Self::When(expr) => write!(f, "When {expr}"),
            Self::Default => f.write_str("Default"),
            Self::Each { var, iterable } => write!(f, "Each {var} in {iterable}"),
            Self::EachPair {
                value,
                key,
                iterable,
            } => write!(f, "Each {value}, {key} in {iterable}"),
            Self::While(expr) => write!(f, "While {expr}"),
            Self::Mixin(expr) => write!(f, "Mixin {expr}"),
            Self::MixinCall { name, args } => match args {
                Some(args) => write!(f, "MixinCall +{name}({args})"),
                None => write!(f, "MixinCall +{name}"),
            },
            Self::Include(name) => write!(f, "Include {name}"),
        }
    }
}

/// Writes the tag in its shorthand form, e.g. `a#top.nav(2 attrs)`.
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        if !self.attrs.is_empty() {
            write!(f, "({} attrs)", self.attrs.len())?;
        }
        if self.self_closing {
            f.write_char('/')?;
        }
        Ok(())
    }
}
