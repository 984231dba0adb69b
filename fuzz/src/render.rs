#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pugvm::syntax::{Builder, Document, Tag};
use pugvm::{Engine, Options, Result};
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// A document node. There is no `while` and mixin calls only appear at the
/// top level, otherwise rendering could loop forever.
#[derive(Debug, Arbitrary)]
enum Node<'a> {
    Text(&'a str),
    Output(&'a str, bool),
    Tag(&'a str, Vec<(&'a str, &'a str)>, Vec<Node<'a>>),
    InlineTag(&'a str, Vec<Node<'a>>),
    Comment(bool, Vec<Node<'a>>),
    Code(&'a str),
    Doctype(&'a str),
    If(&'a str, Vec<Node<'a>>),
    Unless(&'a str, Vec<Node<'a>>),
    ElseIf(&'a str, Vec<Node<'a>>),
    Else(Vec<Node<'a>>),
    Case(&'a str, Vec<Node<'a>>),
    When(&'a str, Vec<Node<'a>>),
    Default(Vec<Node<'a>>),
    Each(&'a str, &'a str, Vec<Node<'a>>),
    Mixin(&'a str, Vec<Node<'a>>),
    Include(&'a str),
}

fn build(b: &mut Builder<'_>, nodes: &[Node<'_>]) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => {
                b.text(*text)?;
            }
            Node::Output(expr, true) => {
                b.output(expr)?;
            }
            Node::Output(expr, false) => {
                b.output_raw(expr)?;
            }
            Node::Tag(name, attrs, children) => {
                let mut tag = Tag::new(*name);
                for (name, value) in attrs {
                    tag = tag.attr(*name, value)?;
                }
                b.tag(tag, |b| build(b, children))?;
            }
            Node::InlineTag(name, children) => {
                b.inline_tag(Tag::new(*name), |b| build(b, children))?;
            }
            Node::Comment(html, children) => {
                b.comment(*html, |b| build(b, children))?;
            }
            Node::Code(expr) => {
                b.code(expr)?;
            }
            Node::Doctype(name) => {
                b.doctype(*name)?;
            }
            Node::If(cond, children) => {
                b.if_(cond, |b| build(b, children))?;
            }
            Node::Unless(cond, children) => {
                b.unless(cond, |b| build(b, children))?;
            }
            Node::ElseIf(cond, children) => {
                b.else_if(cond, |b| build(b, children))?;
            }
            Node::Else(children) => {
                b.else_(|b| build(b, children))?;
            }
            Node::Case(subject, children) => {
                b.case(subject, |b| build(b, children))?;
            }
            Node::When(value, children) => {
                b.when(value, |b| build(b, children))?;
            }
            Node::Default(children) => {
                b.default(|b| build(b, children))?;
            }
            Node::Each(var, iterable, children) => {
                b.each(var, iterable, |b| build(b, children))?;
            }
            Node::Mixin(decl, children) => {
                b.mixin(decl, |b| build(b, children))?;
            }
            Node::Include(name) => {
                b.include(*name)?;
            }
        }
    }
    Ok(())
}

type Input<'a> = (
    Vec<Node<'a>>,
    Vec<(&'a str, Option<&'a str>)>,
    Vec<(&'a str, Vec<Node<'a>>)>,
    Value,
    bool,
    bool,
    bool,
);

fuzz_target!(|data: Input<'_>| {
    let (root, calls, includes, value, pretty, line_feeds, stop_on_error) = data;
    let doc = Document::build(|b| {
        build(b, &root)?;
        for (name, args) in calls {
            b.call(name, args)?;
        }
        Ok(())
    });
    let Ok(doc) = doc else {
        return;
    };
    let options = Options::new()
        .with_pretty(pretty)
        .with_line_feeds(line_feeds)
        .with_stop_on_error(stop_on_error);
    let mut engine = Engine::with_options(options);
    for (name, nodes) in includes {
        if let Ok(doc) = Document::build(|b| build(b, &nodes)) {
            engine.add_template(name, &doc);
        }
    }
    let _ = engine.compile(&doc).render(&value);
});
