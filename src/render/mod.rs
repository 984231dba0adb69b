//! Interpret a compiled [`Program`] into text.

mod context;
mod core;
mod env;
pub(crate) mod eval;
mod html;
mod indent;
mod stack;

use crate::fmt::Formatter;
use crate::render::core::RendererImpl;
use crate::render::html::OpenTag;
use crate::types::program::{Options, Program};
use crate::Result;

pub use crate::render::context::{Context, Include, Mixin, Param};
pub use crate::render::env::Env;
pub use crate::render::indent::reindent;

/// The default maximum number of nested includes.
pub(crate) const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// The mutable state of a single top level render.
///
/// A session is shared by a template and every template it includes, so that
/// elements opened in one file can be closed in another.
#[derive(Debug)]
pub struct Session<'r> {
    /// Open elements and inserted wrappers, innermost last.
    pub(crate) tags: Vec<OpenTag<'r>>,
    /// Templates currently being rendered, innermost last.
    pub(crate) templates: Vec<&'r Program>,
    pub(crate) within_head: bool,
    pub(crate) within_body: bool,
    pub(crate) options: Options,
    pub(crate) max_include_depth: usize,
}

impl<'r> Session<'r> {
    /// Construct a new session that renders with the given options.
    pub fn new(options: Options) -> Self {
        Self {
            tags: Vec::new(),
            templates: Vec::new(),
            within_head: false,
            within_body: false,
            options,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Set the maximum number of nested includes.
    ///
    /// Defaults to 64.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Returns the number of open elements, including inserted wrappers.
    pub fn open_elements(&self) -> usize {
        self.tags.len()
    }

    /// Returns the number of templates currently being rendered.
    pub fn depth(&self) -> usize {
        self.templates.len()
    }
}

impl Program {
    /// Render the program with the options it was compiled with.
    pub fn run<'r>(&'r self, ctx: &mut dyn Context<'r>, f: &mut Formatter<'_>) -> Result<()> {
        self.run_with(ctx, f, self.options)
    }

    /// Render the program with the given options.
    pub fn run_with<'r>(
        &'r self,
        ctx: &mut dyn Context<'r>,
        f: &mut Formatter<'_>,
        options: Options,
    ) -> Result<()> {
        self.run_in(ctx, f, &mut Session::new(options))
    }

    /// Render the program in an existing session.
    ///
    /// If no other template is being rendered in the session this is a top
    /// level render: once the program completes, inserted wrappers are closed
    /// and any element left open is an error. Otherwise the program renders as
    /// an include of the innermost template.
    pub fn run_in<'r>(
        &'r self,
        ctx: &mut dyn Context<'r>,
        f: &mut Formatter<'_>,
        session: &mut Session<'r>,
    ) -> Result<()> {
        let top = session.templates.is_empty();
        session.templates.push(self);
        let result = RendererImpl {
            ctx,
            session: &mut *session,
        }
        .render_block(f, self.body());
        session.templates.pop();
        result?;
        if top {
            session.finish(f)?;
        }
        Ok(())
    }
}
