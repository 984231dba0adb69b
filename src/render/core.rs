use std::fmt::Write;

use crate::fmt::Formatter;
use crate::render::context::{Context, Include, Mixin};
use crate::render::indent::reindent;
use crate::render::Session;
use crate::types::expr::Expr;
use crate::types::program::Instr;
use crate::{Error, Result, Value};

pub(crate) struct RendererImpl<'a, 'r> {
    pub(crate) ctx: &'a mut dyn Context<'r>,
    pub(crate) session: &'a mut Session<'r>,
}

/// The names bound by a loop.
#[derive(Clone, Copy)]
enum LoopVars<'r> {
    Item(&'r str),
    Pair { value: &'r str, key: &'r str },
}

impl<'a, 'r> RendererImpl<'a, 'r> {
    pub(crate) fn render_block(&mut self, f: &mut Formatter<'_>, block: &'r [Instr]) -> Result<()> {
        let mut i = 0;
        while let Some(instr) = block.get(i) {
            i += 1;
            match instr {
                Instr::Block(body) | Instr::When { body, .. } | Instr::Default(body) => {
                    self.render_block(f, body)?;
                }

                Instr::Html(text) => f.write_str(text)?,

                Instr::Tag(text) if text.starts_with("</") => self.session.close_tag(f, text)?,

                Instr::Tag(text) => self.session.open_tag(f, text)?,

                Instr::InlineTag(text) => self.session.inline_tag(f, text)?,

                Instr::Output { expr, escape } => {
                    let result = self.ctx.print(f, expr, *escape);
                    self.check(f, result)?;
                }

                Instr::Attr { name, expr, escape } => {
                    let result = self.ctx.print_attr(f, name, expr, *escape);
                    self.check(f, result)?;
                }

                Instr::AttrMap(expr) => {
                    let result = self.ctx.print_attr_map(f, expr);
                    self.check(f, result)?;
                }

                Instr::Code(expr) => {
                    let result = self.ctx.eval(expr).map(drop);
                    self.check(f, result)?;
                }

                Instr::If { cond, body } => {
                    i += self.render_if(f, cond, body, false, &block[i..])?;
                }

                Instr::Unless { cond, body } => {
                    i += self.render_if(f, cond, body, true, &block[i..])?;
                }

                Instr::ElseIf { .. } | Instr::Else(_) => {
                    return Err(Error::structural(
                        "conditional branch without a preceding `if`",
                    ));
                }

                Instr::Case { subject, body } => {
                    self.ctx.push_scope();
                    let result = self.render_case(f, subject, body);
                    self.ctx.pop_scope();
                    result?;
                }

                Instr::Each {
                    var,
                    iterable,
                    body,
                } => {
                    let otherwise = take_else(block, &mut i);
                    let vars = LoopVars::Item(var);
                    self.render_each(f, vars, iterable, body, otherwise)?;
                }

                Instr::EachPair {
                    value,
                    key,
                    iterable,
                    body,
                } => {
                    let otherwise = take_else(block, &mut i);
                    let vars = LoopVars::Pair { value, key };
                    self.render_each(f, vars, iterable, body, otherwise)?;
                }

                Instr::While { cond, body } => self.render_while(f, cond, body)?,

                Instr::Mixin { name, decl, body } => match Mixin::from_decl(decl, body) {
                    Some(mixin) => self.ctx.set_mixin(name, mixin),
                    None => {
                        let err = Error::lookup(format!("Invalid mixin declaration: {name}"));
                        self.check(f, Err(err))?;
                    }
                },

                Instr::MixinCall { name, args } => self.call_mixin(f, name, args.as_ref())?,

                Instr::Include { name, depth } => self.include(f, name, *depth)?,
            }
        }
        Ok(())
    }

    /// Applies the failure policy to the result of a single construct.
    ///
    /// Fatal errors and any error under `stop_on_error` abort the render,
    /// other errors are reported and rendering carries on.
    fn check(&mut self, f: &mut Formatter<'_>, result: Result<()>) -> Result<()> {
        match result {
            Err(err) if !err.is_fatal() && !self.session.options.stop_on_error => {
                self.ctx.report(&err, f)
            }
            result => result,
        }
    }

    /// Evaluates a condition. A condition that fails to evaluate is reported
    /// and counts as not taken.
    fn test(&mut self, f: &mut Formatter<'_>, cond: &Expr, negate: bool) -> Result<bool> {
        match self.ctx.eval(cond) {
            Ok(value) => Ok(value.is_truthy() != negate),
            Err(err) => {
                self.check(f, Err(err))?;
                Ok(false)
            }
        }
    }

    /// Renders an `if` or `unless` chain, returning the number of following
    /// instructions that belong to it.
    fn render_if(
        &mut self,
        f: &mut Formatter<'_>,
        cond: &Expr,
        body: &'r [Instr],
        negate: bool,
        rest: &'r [Instr],
    ) -> Result<usize> {
        self.ctx.push_scope();
        let result = self.render_chain(f, cond, body, negate, rest);
        self.ctx.pop_scope();
        result
    }

    fn render_chain(
        &mut self,
        f: &mut Formatter<'_>,
        cond: &Expr,
        body: &'r [Instr],
        negate: bool,
        rest: &'r [Instr],
    ) -> Result<usize> {
        let mut done = self.test(f, cond, negate)?;
        if done {
            self.render_block(f, body)?;
        }
        let mut consumed = 0;
        for instr in rest {
            match instr {
                // `unless` never chains to an `else if`
                Instr::ElseIf { cond, body } if !negate => {
                    if !done && self.test(f, cond, false)? {
                        self.render_block(f, body)?;
                        done = true;
                    }
                }
                Instr::Else(body) => {
                    if !done {
                        self.render_block(f, body)?;
                        done = true;
                    }
                }
                _ => break,
            }
            consumed += 1;
        }
        Ok(consumed)
    }

    fn render_case(&mut self, f: &mut Formatter<'_>, subject: &Expr, body: &'r [Instr]) -> Result<()> {
        let subject = match self.ctx.eval(subject) {
            Ok(value) => value,
            Err(err) => return self.check(f, Err(err)),
        };
        let mut default = None;
        for (i, instr) in body.iter().enumerate() {
            match instr {
                Instr::When { value, .. } => {
                    let value = match self.ctx.eval(value) {
                        Ok(value) => value,
                        Err(err) => return self.check(f, Err(err)),
                    };
                    if value == subject {
                        return self.fall_through(f, &body[i..]);
                    }
                }
                Instr::Default(body) => default = Some(body),
                _ => {}
            }
        }
        match default {
            Some(body) => self.render_block(f, body),
            None => Ok(()),
        }
    }

    /// Renders the first non-empty branch, starting at the branch that
    /// matched.
    fn fall_through(&mut self, f: &mut Formatter<'_>, branches: &'r [Instr]) -> Result<()> {
        for instr in branches {
            match instr {
                Instr::When { body, .. } if body.is_empty() => continue,
                Instr::When { body, .. } | Instr::Default(body) => {
                    return self.render_block(f, body);
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn render_each(
        &mut self,
        f: &mut Formatter<'_>,
        vars: LoopVars<'r>,
        iterable: &Expr,
        body: &'r [Instr],
        otherwise: Option<&'r [Instr]>,
    ) -> Result<()> {
        self.ctx.push_scope();
        let result = self.render_loop(f, vars, iterable, body, otherwise);
        self.ctx.pop_scope();
        result
    }

    fn render_loop(
        &mut self,
        f: &mut Formatter<'_>,
        vars: LoopVars<'r>,
        iterable: &Expr,
        body: &'r [Instr],
        otherwise: Option<&'r [Instr]>,
    ) -> Result<()> {
        let iterable = match self.ctx.eval(iterable) {
            Ok(value) => value,
            Err(err) => {
                self.check(f, Err(err))?;
                return self.render_else(f, otherwise);
            }
        };
        match iterable {
            Value::List(list) if !list.is_empty() => {
                for (i, item) in list.into_iter().enumerate() {
                    self.bind(vars, item, Value::Integer(i as i64));
                    self.render_block(f, body)?;
                    self.ctx.reset_scope();
                }
                Ok(())
            }
            Value::Map(map) if !map.is_empty() => {
                for (key, item) in map {
                    self.bind(vars, item, Value::String(key));
                    self.render_block(f, body)?;
                    self.ctx.reset_scope();
                }
                Ok(())
            }
            Value::List(_) | Value::Map(_) => self.render_else(f, otherwise),
            value if value.is_truthy() => {
                self.bind(vars, value, Value::Integer(0));
                self.render_block(f, body)
            }
            _ => self.render_else(f, otherwise),
        }
    }

    fn render_else(&mut self, f: &mut Formatter<'_>, otherwise: Option<&'r [Instr]>) -> Result<()> {
        match otherwise {
            Some(body) => self.render_block(f, body),
            None => Ok(()),
        }
    }

    fn bind(&mut self, vars: LoopVars<'r>, item: Value, key: Value) {
        match vars {
            LoopVars::Item(var) => self.ctx.set_var(var, item),
            LoopVars::Pair { value, key: name } => {
                self.ctx.set_var(value, item);
                self.ctx.set_var(name, key);
            }
        }
    }

    /// Renders a `while` loop. A condition that fails to evaluate aborts the
    /// render regardless of `stop_on_error`.
    fn render_while(&mut self, f: &mut Formatter<'_>, cond: &Expr, body: &'r [Instr]) -> Result<()> {
        while self.ctx.eval(cond)?.is_truthy() {
            self.ctx.push_scope();
            let result = self.render_block(f, body);
            self.ctx.pop_scope();
            result?;
        }
        Ok(())
    }

    fn call_mixin(&mut self, f: &mut Formatter<'_>, name: &str, args: Option<&Expr>) -> Result<()> {
        let Some(mixin) = self.ctx.get_mixin(name) else {
            let err = Error::lookup(format!("Mixin with name {name} is not found"));
            return self.check(f, Err(err));
        };
        let args = args.map(Expr::flatten_comma).unwrap_or_default();
        if args.len() < mixin.required {
            let err = Error::arity(format!("Not enough arguments for mixin: {name}"));
            return self.check(f, Err(err));
        }

        // Arguments are evaluated in the scope of the caller, defaults in the
        // scope of the mixin so that they can refer to earlier parameters.
        let mut values = Vec::with_capacity(mixin.params.len());
        for arg in args.iter().take(mixin.params.len()) {
            match self.ctx.eval(arg) {
                Ok(value) => values.push(value),
                Err(err) => return self.check(f, Err(err)),
            }
        }

        self.ctx.push_scope();
        let result = self.render_mixin(f, &mixin, values);
        self.ctx.pop_scope();
        result
    }

    fn render_mixin(&mut self, f: &mut Formatter<'_>, mixin: &Mixin<'r>, values: Vec<Value>) -> Result<()> {
        let mut values = values.into_iter();
        for param in &mixin.params {
            let value = match (values.next(), param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => match self.ctx.eval(default) {
                    Ok(value) => value,
                    Err(err) => return self.check(f, Err(err)),
                },
                (None, None) => {
                    let err = Error::arity(format!("Invalid argument for {}", param.name));
                    return self.check(f, Err(err));
                }
            };
            self.ctx.set_var(param.name, value);
        }
        self.render_block(f, mixin.body)
    }

    fn include(&mut self, f: &mut Formatter<'_>, name: &str, depth: usize) -> Result<()> {
        let max = self.session.max_include_depth;
        if self.session.templates.len() > max {
            return Err(Error::max_include_depth(max));
        }
        let target = match self.ctx.load_include(name) {
            Ok(target) => target,
            Err(err) => return self.check(f, Err(err)),
        };
        tracing::debug!(name, depth, "rendering include");
        if self.session.options.pretty {
            let mut buf = String::new();
            self.render_include(&mut Formatter::with_string(&mut buf), name, target)?;
            reindent(&buf, depth, f)?;
        } else {
            self.render_include(f, name, target)?;
        }
        Ok(())
    }

    fn render_include(&mut self, f: &mut Formatter<'_>, name: &str, target: Include<'r>) -> Result<()> {
        match target {
            Include::Raw(text) => f.write_str(text)?,
            Include::Template(program) => program
                .run_in(&mut *self.ctx, f, &mut *self.session)
                .map_err(|err| err.with_template_name(name))?,
        }
        Ok(())
    }
}

/// Takes the `else` instruction following a loop, if there is one.
fn take_else<'r>(block: &'r [Instr], i: &mut usize) -> Option<&'r [Instr]> {
    match block.get(*i) {
        Some(Instr::Else(body)) => {
            *i += 1;
            Some(body.as_slice())
        }
        _ => None,
    }
}
