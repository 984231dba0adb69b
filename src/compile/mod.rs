//! Lower a syntax tree into a program that can be executed by the renderer.
//!
//! The compiler makes a single recursive pass over the [`Document`]. Literal
//! text, tag delimiters and folded constants accumulate in a pending buffer
//! which is flushed into one [`Instr::Html`] whenever a dynamic instruction is
//! emitted, and whenever a nested block is entered or left.
//!
//! Compilation never fails. Constructs that cannot be lowered are dropped.

mod html;
mod lex;
mod parse;

use std::mem;

use crate::fmt::{self, Formatter};
use crate::render::eval;
use crate::types::expr::Expr;
use crate::types::program::{Instr, Options, Program};
use crate::types::syntax::{Attr, CodeMode, Document, NodeId, NodeKind, Tag};
use crate::Value;

/// Compile a document into a program.
pub fn program(doc: &Document, options: Options) -> Program {
    let mut compiler = Compiler::new(options.pretty);
    let mut root = Vec::new();
    compiler.compile_children(doc, doc.root(), &mut root);
    compiler.flush(&mut root);
    let program = Program::new(root, options, compiler.includes);
    tracing::debug!(
        instrs = program.len(),
        includes = ?program.includes(),
        "compiled template"
    );
    program
}

struct Compiler {
    pretty: bool,
    /// Whether anything that takes part in pretty printing was emitted yet.
    started: bool,
    indent: usize,
    /// Pending literal text.
    buf: String,
    includes: Vec<String>,
}

impl Compiler {
    fn new(pretty: bool) -> Self {
        Self {
            pretty,
            started: false,
            indent: 0,
            buf: String::new(),
            includes: Vec::new(),
        }
    }

    /// Compiles every child of `parent`, returning whether any of them
    /// produced block level output.
    fn compile_children(&mut self, doc: &Document, parent: NodeId, out: &mut Vec<Instr>) -> bool {
        let mut ret = false;
        // Set while skipping the branches of a conditional that was dropped.
        let mut orphaned = false;
        for id in doc.children(parent) {
            let node = doc.node(id);
            orphaned = match node.kind() {
                NodeKind::If(_) | NodeKind::Unless(_) => node.first_child().is_none(),
                NodeKind::Each { var, .. } => var.is_empty() || node.first_child().is_none(),
                NodeKind::EachPair { value, key, .. } => {
                    value.is_empty() || key.is_empty() || node.first_child().is_none()
                }
                NodeKind::ElseIf(_) | NodeKind::Else if orphaned => continue,
                _ => false,
            };
            if self.compile_node(doc, id, out) {
                ret = true;
            }
        }
        ret
    }

    fn compile_node(&mut self, doc: &Document, id: NodeId, out: &mut Vec<Instr>) -> bool {
        let node = doc.node(id);
        let prev = node.prev().map(|p| doc.node(p).kind());

        match node.kind() {
            NodeKind::Root | NodeKind::TextBlock => self.compile_children(doc, id, out),

            NodeKind::Text(text) => {
                self.buf.push_str(text);
                false
            }

            NodeKind::Output { expr, escape } => {
                self.compile_output(expr, *escape, out);
                false
            }

            NodeKind::Tag(tag) => self.compile_tag(doc, id, tag, false, out),

            NodeKind::InlineTag(tag) => self.compile_tag(doc, id, tag, true, out),

            NodeKind::Piped => {
                if matches!(prev, Some(NodeKind::Piped)) {
                    self.buf.push('\n');
                    if self.pretty {
                        self.tabs();
                    }
                }
                self.compile_children(doc, id, out)
            }

            NodeKind::PlainLine => {
                if self.pretty || matches!(prev, Some(NodeKind::PlainLine)) {
                    self.buf.push('\n');
                }
                self.tabs();
                self.compile_children(doc, id, out);
                true
            }

            NodeKind::Comment { html: true } => {
                self.start_indent(true);
                self.buf.push_str("<!--");
                let (inline, lines): (Vec<_>, Vec<_>) = doc
                    .children(id)
                    .partition(|&child| doc.node(child).kind().is_inline());
                for child in inline {
                    self.compile_node(doc, child, out);
                }
                if !lines.is_empty() {
                    if self.pretty {
                        self.indent += 1;
                    }
                    for child in lines {
                        self.compile_node(doc, child, out);
                    }
                    if self.pretty {
                        self.indent -= 1;
                        self.newline();
                    }
                }
                self.buf.push_str("-->");
                true
            }

            NodeKind::Comment { html: false } => false,

            NodeKind::Code { expr, mode } => {
                self.flush(out);
                out.push(match mode {
                    CodeMode::Run => Instr::Code(expr.clone()),
                    CodeMode::Escaped => Instr::Output {
                        expr: expr.clone(),
                        escape: true,
                    },
                    CodeMode::Unescaped => Instr::Output {
                        expr: expr.clone(),
                        escape: false,
                    },
                });
                false
            }

            NodeKind::Doctype(keyword) => {
                self.buf.push_str(&html::doctype(keyword));
                self.flush(out);
                true
            }

            NodeKind::If(cond) => self.compile_control(doc, id, false, out, |body| Instr::If {
                cond: cond.clone(),
                body,
            }),

            NodeKind::Unless(cond) => {
                self.compile_control(doc, id, false, out, |body| Instr::Unless {
                    cond: cond.clone(),
                    body,
                })
            }

            NodeKind::ElseIf(cond) => {
                self.compile_control(doc, id, false, out, |body| Instr::ElseIf {
                    cond: cond.clone(),
                    body,
                })
            }

            NodeKind::Else => self.compile_control(doc, id, false, out, Instr::Else),

            NodeKind::Case(subject) => {
                self.compile_control(doc, id, false, out, |body| Instr::Case {
                    subject: subject.clone(),
                    body,
                })
            }

            // An empty branch is kept so that the case falls through it.
            NodeKind::When(value) => self.compile_control(doc, id, true, out, |body| Instr::When {
                value: value.clone(),
                body,
            }),

            NodeKind::Default => self.compile_control(doc, id, false, out, Instr::Default),

            NodeKind::Each { var, iterable } => {
                if var.is_empty() {
                    return false;
                }
                self.compile_control(doc, id, false, out, |body| Instr::Each {
                    var: var.clone(),
                    iterable: iterable.clone(),
                    body,
                })
            }

            NodeKind::EachPair {
                value,
                key,
                iterable,
            } => {
                if value.is_empty() || key.is_empty() {
                    return false;
                }
                self.compile_control(doc, id, false, out, |body| Instr::EachPair {
                    value: value.clone(),
                    key: key.clone(),
                    iterable: iterable.clone(),
                    body,
                })
            }

            NodeKind::While(cond) => {
                self.compile_control(doc, id, false, out, |body| Instr::While {
                    cond: cond.clone(),
                    body,
                })
            }

            NodeKind::Mixin(decl) => {
                let Some(name) = decl.callee_name().or_else(|| decl.as_ident()) else {
                    return false;
                };
                self.compile_control(doc, id, false, out, |body| Instr::Mixin {
                    name: name.to_owned(),
                    decl: decl.clone(),
                    body,
                })
            }

            NodeKind::MixinCall { name, args } => {
                self.flush(out);
                out.push(Instr::MixinCall {
                    name: name.clone(),
                    args: args.clone(),
                });
                true
            }

            NodeKind::Include(name) => {
                self.flush(out);
                out.push(Instr::Include {
                    name: name.clone(),
                    depth: self.indent,
                });
                if !self.includes.contains(name) {
                    self.includes.push(name.clone());
                }
                true
            }
        }
    }

    /// Lowers a control construct into a single block shaped instruction.
    fn compile_control<F>(
        &mut self,
        doc: &Document,
        id: NodeId,
        allow_empty: bool,
        out: &mut Vec<Instr>,
        make: F,
    ) -> bool
    where
        F: FnOnce(Vec<Instr>) -> Instr,
    {
        if !allow_empty && doc.node(id).first_child().is_none() {
            return false;
        }
        self.flush(out);
        let mut body = Vec::new();
        let ret = self.compile_children(doc, id, &mut body);
        self.flush(&mut body);
        out.push(make(body));
        ret
    }

    fn compile_tag(
        &mut self,
        doc: &Document,
        id: NodeId,
        tag: &Tag,
        interpolated: bool,
        out: &mut Vec<Instr>,
    ) -> bool {
        let should_indent = !interpolated && self.start_indent(!html::is_inline(&tag.name));
        let element = tag.element();
        let self_closing = tag.self_closing || html::is_self_closing(&tag.name);

        self.flush(out);
        let open = format!("<{element}");
        out.push(match self_closing {
            true => Instr::InlineTag(open),
            false => Instr::Tag(open),
        });
        self.compile_attrs(tag, out);

        if self_closing {
            self.buf.push_str("/>");
            return true;
        }
        self.buf.push('>');

        if self.pretty {
            self.indent += 1;
        }
        let finalize = self.compile_children(doc, id, out);
        if self.pretty {
            self.indent -= 1;
        }
        if should_indent && finalize {
            self.newline();
        }

        self.flush(out);
        out.push(Instr::Tag(format!("</{element}>")));
        should_indent
    }

    fn compile_attrs(&mut self, tag: &Tag, out: &mut Vec<Instr>) {
        for attr in &tag.attrs {
            match attr {
                Attr::Pair { name, .. } if name.is_empty() => {}
                Attr::Pair {
                    name, value: None, ..
                } => {
                    self.buf.push(' ');
                    self.buf.push_str(name);
                }
                Attr::Pair {
                    name,
                    value: Some(expr),
                    escape,
                } => {
                    let folded = self.fold(expr, |f, v| fmt::attr(f, name, v, *escape));
                    if !folded {
                        self.flush(out);
                        out.push(Instr::Attr {
                            name: name.clone(),
                            expr: expr.clone(),
                            escape: *escape,
                        });
                    }
                }
                Attr::Map(expr) => {
                    if !self.fold(expr, fmt::attr_map) {
                        self.flush(out);
                        out.push(Instr::AttrMap(expr.clone()));
                    }
                }
            }
        }

        if let Some(id) = tag.id.as_deref().filter(|id| !id.is_empty()) {
            self.buf.push_str(" id=\"");
            self.buf.push_str(id);
            self.buf.push('"');
        }

        let mut classes = tag.classes.iter().filter(|c| !c.is_empty()).peekable();
        if classes.peek().is_some() {
            self.buf.push_str(" class=\"");
            for (i, class) in classes.enumerate() {
                if i > 0 {
                    self.buf.push(' ');
                }
                self.buf.push_str(class);
            }
            self.buf.push('"');
        }
    }

    fn compile_output(&mut self, expr: &Expr, escape: bool, out: &mut Vec<Instr>) {
        if !self.fold(expr, |f, v| fmt::text(f, v, escape)) {
            self.flush(out);
            out.push(Instr::Output {
                expr: expr.clone(),
                escape,
            });
        }
    }

    /// Evaluates a constant expression and appends its formatted text to the
    /// buffer. Returns false if the expression must be evaluated at run time.
    fn fold<F>(&mut self, expr: &Expr, write: F) -> bool
    where
        F: FnOnce(&mut Formatter<'_>, &Value) -> fmt::Result,
    {
        if !expr.is_const() {
            return false;
        }
        let Ok(value) = eval::eval(&mut eval::Constant, expr) else {
            return false;
        };
        let mut text = String::new();
        match write(&mut Formatter::with_string(&mut text), &value) {
            Ok(()) => {
                self.buf.push_str(&text);
                true
            }
            Err(_) => false,
        }
    }

    /// Starts a new indented line before block level output, except for the
    /// very first output.
    fn start_indent(&mut self, block: bool) -> bool {
        let should_indent = self.pretty && block;
        if should_indent && self.started {
            self.newline();
        } else {
            self.started = true;
        }
        should_indent
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        self.tabs();
    }

    fn tabs(&mut self) {
        for _ in 0..self.indent {
            self.buf.push('\t');
        }
    }

    fn flush(&mut self, out: &mut Vec<Instr>) {
        if !self.buf.is_empty() {
            out.push(Instr::Html(mem::take(&mut self.buf)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(doc: Document) -> Vec<Instr> {
        program(&doc, Options::new()).body().to_vec()
    }

    fn html(s: &str) -> Instr {
        Instr::Html(s.into())
    }

    fn tag(s: &str) -> Instr {
        Instr::Tag(s.into())
    }

    #[test]
    fn compile_coalesces_literals() {
        let doc = Document::build(|b| {
            b.tag(Tag::new("p").id("x").class("a").class("b"), |b| {
                b.text("Hello, ")?.output("'<World>'")?.text("!")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            compile(doc),
            [
                tag("<p"),
                html(r#" id="x" class="a b">Hello, &lt;World&gt;!"#),
                tag("</p>"),
            ]
        );
    }

    #[test]
    fn compile_flushes_around_dynamic_output() {
        let doc = Document::build(|b| {
            b.tag(Tag::new("").attr("href", "url")?, |b| {
                b.text("Hi ")?.output("name")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            compile(doc),
            [
                tag("<div"),
                Instr::Attr {
                    name: "href".into(),
                    expr: Expr::Var("url".into()),
                    escape: true,
                },
                html(">Hi "),
                Instr::Output {
                    expr: Expr::Var("name".into()),
                    escape: true,
                },
                tag("</div>"),
            ]
        );
    }

    #[test]
    fn compile_folds_constant_attributes() {
        let doc = Document::build(|b| {
            b.empty(
                Tag::new("input")
                    .attr("type", "'text'")?
                    .flag("required")
                    .attributes("{ 'data-x': 1 + 1 }")?,
            )?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            compile(doc),
            [
                Instr::InlineTag("<input".into()),
                html(r#" type="text" required data-x="2"/>"#),
            ]
        );
    }

    #[test]
    fn compile_drops_empty_controls() {
        let doc = Document::build(|b| {
            b.if_("a", |_| Ok(()))?;
            b.else_(|b| {
                b.text("orphan")?;
                Ok(())
            })?;
            b.case("x", |b| {
                b.when("1", |_| Ok(()))?;
                b.default(|_| Ok(()))?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            compile(doc),
            [Instr::Case {
                subject: Expr::Var("x".into()),
                body: vec![Instr::When {
                    value: Expr::Literal(Value::Integer(1)),
                    body: vec![],
                }],
            }]
        );
    }

    #[test]
    fn compile_drops_empty_loops() {
        let doc = Document::build(|b| {
            b.each("x", "items", |_| Ok(()))?;
            b.else_(|b| {
                b.text("none")?;
                Ok(())
            })?;
            b.each_pair("v", "k", "items", |_| Ok(()))?;
            b.text("after")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(compile(doc), [html("after")]);
    }

    #[test]
    fn compile_mixin_names() {
        let doc = Document::build(|b| {
            b.mixin("item(a, b = 1)", |b| {
                b.output("a")?;
                Ok(())
            })?;
            b.mixin("1 + 2", |b| {
                b.text("dropped")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        let body = compile(doc);
        assert_eq!(body.len(), 1);
        assert!(matches!(&body[0], Instr::Mixin { name, .. } if name == "item"));
    }

    #[test]
    fn compile_include_targets_deduplicated() {
        let doc = Document::build(|b| {
            b.include("a")?;
            b.tag(Tag::new("div"), |b| {
                b.include("b")?.include("a")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        let program = program(&doc, Options::pretty());
        assert_eq!(program.includes(), ["a", "b"]);
        assert!(program.body().contains(&Instr::Include {
            name: "b".into(),
            depth: 1,
        }));
        assert_eq!(
            program.body()[0],
            Instr::Include {
                name: "a".into(),
                depth: 0,
            }
        );
    }

    #[test]
    fn compile_pretty_indentation() {
        let doc = Document::build(|b| {
            b.tag(Tag::new("ul"), |b| {
                b.tag(Tag::new("li"), |b| {
                    b.text("a")?;
                    Ok(())
                })?;
                b.tag(Tag::new("li"), |b| {
                    b.inline_tag(Tag::new("b"), |b| {
                        b.text("b")?;
                        Ok(())
                    })?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        let program = program(&doc, Options::pretty());
        assert_eq!(
            program.body(),
            [
                tag("<ul"),
                html(">\n\t"),
                tag("<li"),
                html(">a"),
                tag("</li>"),
                html("\n\t"),
                tag("<li"),
                html(">"),
                tag("<b"),
                html(">b"),
                tag("</b>"),
                tag("</li>"),
                html("\n"),
                tag("</ul>"),
            ]
        );
    }
}
