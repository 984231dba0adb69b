//! The capability interface the interpreter renders through.

use std::fmt::Write;

use crate::fmt::{self, Formatter};
use crate::types::expr::Expr;
use crate::types::program::{Instr, Program};
use crate::{Error, Result};

/// The evaluation context of a render.
///
/// The interpreter never evaluates expressions or resolves names itself. It
/// asks the context, which owns the variables, the mixins and the include
/// targets. [`Env`][crate::Env] is the implementation used by
/// [`Engine`][crate::Engine], implement this trait to render a [`Program`]
/// against a different data model.
///
/// The lifetime `'r` is the lifetime of the programs being rendered. Mixins
/// borrow their bodies from the program that declared them.
pub trait Context<'r> {
    /// Evaluates an expression.
    fn eval(&mut self, expr: &Expr) -> Result<crate::Value>;

    /// Opens a new variable scope.
    fn push_scope(&mut self);

    /// Closes the innermost variable scope.
    fn pop_scope(&mut self);

    /// Removes every variable bound in the innermost scope.
    fn reset_scope(&mut self);

    /// Binds a variable in the innermost scope.
    fn set_var(&mut self, name: &str, value: crate::Value);

    /// Evaluates an expression and writes it as text.
    fn print(&mut self, f: &mut Formatter<'_>, expr: &Expr, escape: bool) -> Result<()> {
        let value = self.eval(expr)?;
        fmt::text(f, &value, escape)?;
        Ok(())
    }

    /// Evaluates an expression and writes it as the named attribute.
    fn print_attr(
        &mut self,
        f: &mut Formatter<'_>,
        name: &str,
        expr: &Expr,
        escape: bool,
    ) -> Result<()> {
        let value = self.eval(expr)?;
        fmt::attr(f, name, &value, escape)?;
        Ok(())
    }

    /// Evaluates an expression to a map and writes every entry as an
    /// attribute.
    fn print_attr_map(&mut self, f: &mut Formatter<'_>, expr: &Expr) -> Result<()> {
        let value = self.eval(expr)?;
        fmt::attr_map(f, &value)?;
        Ok(())
    }

    /// Registers a mixin in the innermost scope.
    fn set_mixin(&mut self, name: &'r str, mixin: Mixin<'r>);

    /// Looks up a mixin, innermost scope first.
    fn get_mixin(&self, name: &str) -> Option<Mixin<'r>>;

    /// Resolves an include target.
    fn load_include(&mut self, name: &str) -> Result<Include<'r>>;

    /// Reports an error that did not abort the render.
    ///
    /// The default implementation logs a warning and writes the error as an
    /// HTML comment.
    fn report(&mut self, err: &Error, f: &mut Formatter<'_>) -> Result<()> {
        tracing::warn!(kind = ?err.kind(), "{err}");
        write!(f, "<!-- Context error: {err} -->")?;
        Ok(())
    }
}

/// A resolved include target.
#[derive(Debug, Clone, Copy)]
pub enum Include<'r> {
    /// A compiled template, rendered in the session of the includer.
    Template(&'r Program),
    /// Text that is emitted verbatim.
    Raw(&'r str),
}

/// A registered mixin.
#[derive(Debug, Clone)]
pub struct Mixin<'r> {
    /// The declared parameters in order.
    pub params: Vec<Param<'r>>,
    /// The number of arguments a call must supply.
    pub required: usize,
    pub body: &'r [Instr],
}

/// A declared mixin parameter.
#[derive(Debug, Clone, Copy)]
pub struct Param<'r> {
    pub name: &'r str,
    pub default: Option<&'r Expr>,
}

impl<'r> Mixin<'r> {
    /// Builds a mixin from its declaration, either a bare name or a call whose
    /// arguments are identifiers optionally assigned a default value.
    ///
    /// Returns `None` if any parameter is not of that form.
    pub fn from_decl(decl: &'r Expr, body: &'r [Instr]) -> Option<Self> {
        if decl.as_ident().is_some() {
            return Some(Self {
                params: Vec::new(),
                required: 0,
                body,
            });
        }
        decl.callee_name()?;
        let params = decl
            .call_args()
            .into_iter()
            .map(|arg| match arg {
                Expr::Var(name) => Some(Param {
                    name,
                    default: None,
                }),
                Expr::Assign { target, value } => Some(Param {
                    name: target,
                    default: Some(&**value),
                }),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        let required = params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1);
        Some(Self {
            params,
            required,
            body,
        })
    }
}
