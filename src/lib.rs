//! A compiler and interpreter for indentation-based HTML templates in the
//! style of Pug (formerly Jade).
//!
//! Templates are trees of tags, text, interpolated expressions and control
//! constructs. Parsing template text is not the concern of this crate: it
//! starts from a [`Document`], either produced by a parser or assembled with
//! [`Document::build`], compiles it once into an immutable [`Program`] and
//! renders that program as many times as needed, from as many threads as
//! needed.
//!
//! # Features
//!
//! - Conditionals: `if`, `unless`, `else if`, `else`, `case`/`when`
//! - Loops: `each item in items`, `each value, key in map`, `while`
//! - Reusable parameterized fragments called mixins
//! - Includes of other templates or of raw text
//! - Constant folding of literal output and attributes
//! - Pretty printing with indentation, even across includes
//! - Automatic `<html>` and `<body>` wrappers around unwrapped content
//! - Render to a [`String`] or any [`std::io::Write`] implementor
//! - Render using any [`serde`] serializable values
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the options,
//! registered functions and named templates.
//!
//! ```
//! use pugvm::{Document, Engine, Tag};
//!
//! let doc = Document::build(|b| {
//!     b.tag(Tag::new("p").class("greeting"), |b| {
//!         b.text("Hello ")?.output("user.name")?.text("!")?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//!
//! let engine = Engine::new();
//! let result = engine
//!     .compile(&doc)
//!     .render(pugvm::value! { user: { name: "John Smith" } })?;
//!
//! assert_eq!(
//!     result,
//!     r#"<html><body><p class="greeting">Hello John Smith!</p></body></html>"#
//! );
//! # Ok::<(), pugvm::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Pretty printing
//!
//! ```
//! use pugvm::{Document, Engine, Options, Tag};
//!
//! let doc = Document::build(|b| {
//!     b.tag(Tag::new("ul"), |b| {
//!         b.each("item", "items", |b| {
//!             b.tag(Tag::new("li"), |b| {
//!                 b.output("item")?;
//!                 Ok(())
//!             })?;
//!             Ok(())
//!         })?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//!
//! let result = Engine::with_options(Options::pretty())
//!     .compile(&doc)
//!     .render(pugvm::value! { items: ["a", "b"] })?;
//!
//! assert_eq!(
//!     result,
//!     "<html><body><ul>\n\t<li>a</li>\n\t<li>b</li>\n</ul></body></html>"
//! );
//! # Ok::<(), pugvm::Error>(())
//! ```
//!
//! ### Mixins and includes
//!
//! ```
//! use pugvm::{Document, Engine, Tag};
//!
//! let mut engine = Engine::new();
//! engine.add_raw("footer", "<footer>(c)</footer>");
//!
//! let doc = Document::build(|b| {
//!     b.mixin("link(href, text = href)", |b| {
//!         b.tag(Tag::new("a").attr("href", "href")?, |b| {
//!             b.output("text")?;
//!             Ok(())
//!         })?;
//!         Ok(())
//!     })?;
//!     b.call("link", Some("'/home', 'Home'"))?;
//!     b.include("footer")?;
//!     Ok(())
//! })?;
//!
//! let result = engine.compile(&doc).render_from(&pugvm::Value::None)?;
//! assert_eq!(
//!     result,
//!     r#"<html><body><a href="/home">Home</a><footer>(c)</footer></body></html>"#
//! );
//! # Ok::<(), pugvm::Error>(())
//! ```
//!
//! ### Functions
//!
//! ```
//! use pugvm::{Document, Engine, Value};
//!
//! let mut engine = Engine::new();
//! engine.add_function("upper", |args| match args {
//!     [Value::String(s)] => Ok(Value::from(s.to_uppercase())),
//!     _ => Ok(Value::None),
//! });
//!
//! let doc = Document::build(|b| {
//!     b.output("upper(name)")?;
//!     Ok(())
//! })?;
//!
//! let result = engine.compile(&doc).render(pugvm::value! { name: "loud" })?;
//! assert_eq!(result, "LOUD");
//! # Ok::<(), pugvm::Error>(())
//! ```

mod compile;
mod error;
pub mod fmt;
mod macros;
mod render;
mod types;
mod value;

use std::collections::BTreeMap;
use std::io;

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::fmt::Formatter;
pub use crate::render::{reindent, Context, Env, Include, Mixin, Param, Session};
pub use crate::types::expr::{BinaryOp, Expr, UnaryOp};
pub use crate::types::program::{Instr, Options, Program};
pub use crate::types::syntax;
pub use crate::types::syntax::{Attr, Builder, CodeMode, Document, Node, NodeId, NodeKind, Tag};
#[cfg(feature = "serde")]
pub use crate::value::to_value;
pub use crate::value::{List, Map, Value};

use crate::fmt::Writer;

/// A function that can be called from template expressions.
type Function = dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static;

/// The compilation and rendering engine.
pub struct Engine {
    options: Options,
    functions: BTreeMap<String, Box<Function>>,
    templates: BTreeMap<String, Program>,
    raw: BTreeMap<String, String>,
    max_include_depth: usize,
}

/// A compiled template.
#[derive(Debug)]
pub struct Template<'engine> {
    engine: &'engine Engine,
    program: Program,
}

/// A reference to a compiled template in an [`Engine`].
#[derive(Debug, Clone, Copy)]
pub struct TemplateRef<'engine> {
    engine: &'engine Engine,
    program: &'engine Program,
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Construct a new engine with default options.
    #[inline]
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Construct a new engine that compiles templates with the given options.
    #[inline]
    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            functions: BTreeMap::new(),
            templates: BTreeMap::new(),
            raw: BTreeMap::new(),
            max_include_depth: render::DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Set the options used when compiling templates.
    ///
    /// Templates that were already added keep the options they were compiled
    /// with.
    #[inline]
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    #[inline]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Set the maximum number of nested includes.
    ///
    /// Defaults to 64.
    #[inline]
    pub fn set_max_include_depth(&mut self, depth: usize) {
        self.max_include_depth = depth;
    }

    /// Add a function that can be called from expressions.
    ///
    /// An error returned by the function becomes an evaluation error with the
    /// returned message.
    #[inline]
    pub fn add_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(f));
    }

    /// Compile a document and store it under the given name.
    ///
    /// Stored templates can be rendered with
    /// [`.get_template(..)`][Engine::get_template] and are include targets
    /// for other templates.
    #[inline]
    pub fn add_template(&mut self, name: impl Into<String>, doc: &Document) {
        let program = compile::program(doc, self.options);
        self.templates.insert(name.into(), program);
    }

    /// Store text that is emitted verbatim when included.
    #[inline]
    pub fn add_raw(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.raw.insert(name.into(), text.into());
    }

    /// Lookup a template by name.
    #[inline]
    pub fn get_template(&self, name: &str) -> Option<TemplateRef<'_>> {
        self.templates.get(name).map(|program| TemplateRef {
            engine: self,
            program,
        })
    }

    /// Compile a document without storing it.
    #[inline]
    pub fn compile(&self, doc: &Document) -> Template<'_> {
        Template {
            engine: self,
            program: compile::program(doc, self.options),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("functions", &self.functions.keys())
            .field("templates", &self.templates.keys())
            .field("raw", &self.raw.keys())
            .field("max_include_depth", &self.max_include_depth)
            .finish()
    }
}

macro_rules! impl_template {
    ($ty:ident, $program:ident => $expr:expr) => {
        impl<'engine> $ty<'engine> {
            /// Render the template to a string using the provided value.
            #[cfg(feature = "serde")]
            #[inline]
            pub fn render<S>(&self, globals: S) -> Result<String>
            where
                S: serde::Serialize,
            {
                self.render_from(&to_value(globals)?)
            }

            /// Render the template to a string using the provided [`Value`].
            #[inline]
            pub fn render_from(&self, globals: &Value) -> Result<String> {
                self.render_with(globals, self.program().options())
            }

            /// Render the template to a string, overriding the options it
            /// was compiled with.
            #[inline]
            pub fn render_with(&self, globals: &Value, options: Options) -> Result<String> {
                to_string(self.engine, self.program(), globals, options)
            }

            /// Render the template to a writer using the provided value.
            #[cfg(feature = "serde")]
            #[inline]
            pub fn render_to_writer<W, S>(&self, writer: W, globals: S) -> Result<()>
            where
                W: io::Write,
                S: serde::Serialize,
            {
                let program = self.program();
                to_writer(self.engine, program, &to_value(globals)?, program.options(), writer)
            }

            /// Render the template to a writer using the provided [`Value`]
            /// and options.
            #[inline]
            pub fn render_to_writer_with<W>(
                &self,
                writer: W,
                globals: &Value,
                options: Options,
            ) -> Result<()>
            where
                W: io::Write,
            {
                to_writer(self.engine, self.program(), globals, options, writer)
            }

            /// Returns the compiled program.
            #[inline]
            pub fn program(&self) -> &Program {
                let $program = &self.program;
                $expr
            }

            /// Returns the distinct include targets in the order they were
            /// found.
            #[inline]
            pub fn includes(&self) -> &[String] {
                self.program().includes()
            }

            /// Returns the instruction tree as indented human readable labels.
            pub fn describe(&self) -> String {
                let mut s = String::new();
                // writing to a string never fails
                let _ = self.program().describe(&mut s);
                s
            }
        }
    };
}

impl_template! { Template, program => program }
impl_template! { TemplateRef, program => *program }

fn to_string(engine: &Engine, program: &Program, globals: &Value, options: Options) -> Result<String> {
    let mut s = String::new();
    let mut f = Formatter::with_string(&mut s);
    run(engine, program, globals, options, &mut f)?;
    Ok(s)
}

fn to_writer<W>(
    engine: &Engine,
    program: &Program,
    globals: &Value,
    options: Options,
    writer: W,
) -> Result<()>
where
    W: io::Write,
{
    let mut w = Writer::new(writer);
    let mut f = Formatter::with_writer(&mut w);
    run(engine, program, globals, options, &mut f)
        .map_err(|err| w.take_err().map(Error::from).unwrap_or(err))
}

fn run(
    engine: &Engine,
    program: &Program,
    globals: &Value,
    options: Options,
    f: &mut Formatter<'_>,
) -> Result<()> {
    let mut env = Env::new(engine, globals);
    let mut session = Session::new(options).with_max_include_depth(engine.max_include_depth);
    program.run_in(&mut env, f, &mut session)
}
