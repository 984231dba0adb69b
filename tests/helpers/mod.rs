#![allow(dead_code)]

mod writer;

use pugvm::{Document, Engine, Options, Result, Tag, Value};

pub use self::writer::Writer;

/// Compiles the document with the given options and renders it.
pub fn render(options: Options, doc: &Document, globals: &Value) -> Result<String> {
    Engine::with_options(options).compile(doc).render_from(globals)
}

/// Builds a document holding a single element with literal text.
pub fn element(name: &str, text: &str) -> Result<Document> {
    Document::build(|b| {
        b.tag(Tag::new(name), |b| {
            b.text(text)?;
            Ok(())
        })?;
        Ok(())
    })
}

/// Builds a document that outputs each expression in turn.
pub fn outputs(exprs: &[&str]) -> Result<Document> {
    Document::build(|b| {
        for expr in exprs {
            b.output(expr)?;
        }
        Ok(())
    })
}
