use crate::render::context::{Context, Include, Mixin};
use crate::render::eval::{self, Resolve};
use crate::render::stack::Stack;
use crate::types::expr::Expr;
use crate::{Engine, Error, Result, Value};

/// The evaluation context used by [`Engine`].
///
/// Variables resolve through the scope stack first and then through the
/// global map. Functions and include targets are looked up in the engine.
pub struct Env<'r> {
    engine: &'r Engine,
    globals: &'r Value,
    stack: Stack<'r>,
}

impl<'r> Env<'r> {
    /// Construct a context over the engine with the given globals.
    ///
    /// The globals are expected to be a [`Value::Map`], any other value binds
    /// nothing.
    pub fn new(engine: &'r Engine, globals: &'r Value) -> Self {
        Self {
            engine,
            globals,
            stack: Stack::new(),
        }
    }
}

impl Resolve for Env<'_> {
    fn lookup(&mut self, name: &str) -> Result<Value> {
        if let Some(value) = self.stack.get(name) {
            return Ok(value.clone());
        }
        let global = match self.globals {
            Value::Map(map) => map.get(name),
            _ => None,
        };
        global
            .cloned()
            .ok_or_else(|| Error::eval(format!("unknown variable `{name}`")))
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        self.stack.assign(name, value);
        Ok(())
    }

    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        match self.engine.functions.get(name) {
            Some(func) => func(args).map_err(Error::eval),
            None => Err(Error::eval(format!("unknown function `{name}`"))),
        }
    }
}

impl<'r> Context<'r> for Env<'r> {
    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        eval::eval(self, expr)
    }

    fn push_scope(&mut self) {
        self.stack.push();
    }

    fn pop_scope(&mut self) {
        self.stack.pop();
    }

    fn reset_scope(&mut self) {
        self.stack.reset();
    }

    fn set_var(&mut self, name: &str, value: Value) {
        self.stack.define(name, value);
    }

    fn set_mixin(&mut self, name: &'r str, mixin: Mixin<'r>) {
        self.stack.set_mixin(name, mixin);
    }

    fn get_mixin(&self, name: &str) -> Option<Mixin<'r>> {
        self.stack.get_mixin(name).cloned()
    }

    fn load_include(&mut self, name: &str) -> Result<Include<'r>> {
        if let Some(program) = self.engine.templates.get(name) {
            return Ok(Include::Template(program));
        }
        match self.engine.raw.get(name) {
            Some(text) => Ok(Include::Raw(text)),
            None => Err(Error::include(format!("unknown include target `{name}`"))),
        }
    }
}
