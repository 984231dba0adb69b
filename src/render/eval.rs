//! Evaluation of expressions against a variable resolver.

use std::cmp::Ordering;

use crate::fmt::{self, Formatter};
use crate::types::expr::{BinaryOp, Expr, UnaryOp};
use crate::{Error, List, Map, Result, Value};

/// Resolves the names an expression refers to.
pub(crate) trait Resolve {
    /// Returns the value bound to a variable.
    fn lookup(&mut self, name: &str) -> Result<Value>;

    /// Rebinds an existing variable, or defines it in the innermost scope.
    fn assign(&mut self, name: &str, value: Value) -> Result<()>;

    /// Calls a registered function.
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value>;
}

/// A resolver without any bindings, used for folding constants.
pub(crate) struct Constant;

impl Resolve for Constant {
    fn lookup(&mut self, name: &str) -> Result<Value> {
        Err(Error::eval(format!("`{name}` is not a constant")))
    }

    fn assign(&mut self, name: &str, _: Value) -> Result<()> {
        Err(Error::eval(format!("cannot assign `{name}` in a constant")))
    }

    fn call(&mut self, name: &str, _: &[Value]) -> Result<Value> {
        Err(Error::eval(format!("cannot call `{name}` in a constant")))
    }
}

/// Evaluates an expression.
pub(crate) fn eval<R: Resolve + ?Sized>(r: &mut R, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Var(name) => r.lookup(name),

        Expr::Member {
            base,
            name,
            optional,
        } => {
            let base = eval(r, base)?;
            member(base, name, *optional)
        }

        Expr::Index { base, index } => {
            let base = eval(r, base)?;
            let index = eval(r, index)?;
            lookup_index(base, &index)
        }

        Expr::Array(items) => items
            .iter()
            .map(|item| eval(r, item))
            .collect::<Result<List<_>>>()
            .map(Value::List),

        Expr::Dict(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), eval(r, value)?);
            }
            Ok(Value::Map(map))
        }

        Expr::Unary(UnaryOp::Not, e) => Ok(Value::Bool(!eval(r, e)?.is_truthy())),

        Expr::Unary(UnaryOp::Neg, e) => match eval(r, e)? {
            Value::Integer(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| Error::eval("integer overflow")),
            Value::Float(n) => Ok(Value::Float(-n)),
            value => Err(Error::eval(format!("cannot negate {}", value.human()))),
        },

        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let lhs = eval(r, lhs)?;
            match lhs.is_truthy() {
                true => eval(r, rhs),
                false => Ok(lhs),
            }
        }

        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let lhs = eval(r, lhs)?;
            match lhs.is_truthy() {
                true => Ok(lhs),
                false => eval(r, rhs),
            }
        }

        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(r, lhs)?;
            let rhs = eval(r, rhs)?;
            binary(*op, lhs, rhs)
        }

        Expr::Assign { target, value } => {
            let value = eval(r, value)?;
            r.assign(target, value.clone())?;
            Ok(value)
        }

        Expr::Call { callee, args } => {
            let name = callee
                .as_ident()
                .ok_or_else(|| Error::eval(format!("`{callee}` is not callable")))?;
            let args = match args {
                Some(args) => args
                    .flatten_comma()
                    .into_iter()
                    .map(|arg| eval(r, arg))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            r.call(name, &args)
        }

        Expr::Comma(lhs, rhs) => {
            eval(r, lhs)?;
            eval(r, rhs)
        }
    }
}

fn member(base: Value, name: &str, optional: bool) -> Result<Value> {
    match base {
        Value::Map(mut map) => match map.remove(name) {
            Some(value) => Ok(value),
            None if name == "length" => Ok(Value::Integer(map.len() as i64)),
            None if optional => Ok(Value::None),
            None => Err(Error::eval(format!("not found in map: `{name}`"))),
        },
        Value::List(list) if name == "length" => Ok(Value::Integer(list.len() as i64)),
        Value::String(s) if name == "length" => Ok(Value::Integer(s.chars().count() as i64)),
        Value::None if optional => Ok(Value::None),
        value => Err(Error::eval(format!(
            "cannot access `{name}` on {}",
            value.human()
        ))),
    }
}

fn lookup_index(base: Value, index: &Value) -> Result<Value> {
    match (base, index) {
        (Value::List(mut list), Value::Integer(i)) => {
            let len = list.len();
            usize::try_from(*i)
                .ok()
                .filter(|&i| i < len)
                .map(|i| list.swap_remove(i))
                .ok_or_else(|| Error::eval(format!("index out of bounds: {i}, length {len}")))
        }
        (Value::Map(mut map), Value::String(key)) => map
            .remove(key)
            .ok_or_else(|| Error::eval(format!("not found in map: `{key}`"))),
        (base, index) => Err(Error::eval(format!(
            "cannot index {} with {}",
            base.human(),
            index.human()
        ))),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    let value = match op {
        BinaryOp::Eq => Value::Bool(lhs == rhs),
        BinaryOp::Ne => Value::Bool(lhs != rhs),
        BinaryOp::Lt => Value::Bool(compare(op, &lhs, &rhs)? == Ordering::Less),
        BinaryOp::Le => Value::Bool(compare(op, &lhs, &rhs)? != Ordering::Greater),
        BinaryOp::Gt => Value::Bool(compare(op, &lhs, &rhs)? == Ordering::Greater),
        BinaryOp::Ge => Value::Bool(compare(op, &lhs, &rhs)? != Ordering::Less),
        BinaryOp::Add => match (lhs, rhs) {
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Value::List(a)
            }
            (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                let mut s = to_text(&a)?;
                s.push_str(&to_text(&b)?);
                Value::String(s)
            }
            (a, b) => arithmetic(op, a, b)?,
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, lhs, rhs)?
        }
        BinaryOp::And => match lhs.is_truthy() {
            true => rhs,
            false => lhs,
        },
        BinaryOp::Or => match lhs.is_truthy() {
            true => lhs,
            false => rhs,
        },
    };
    Ok(value)
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => {
            if b == 0 && matches!(op, BinaryOp::Div | BinaryOp::Rem) {
                return Err(Error::eval("division by zero"));
            }
            let n = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            n.map(Value::Integer)
                .ok_or_else(|| Error::eval("integer overflow"))
        }
        (a, b) => match (as_float(&a), as_float(&b)) {
            (Some(a), Some(b)) => Ok(Value::Float(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            })),
            _ => Err(Error::eval(format!(
                "unsupported operand types for `{}`: {} and {}",
                op.symbol(),
                a.human(),
                b.human()
            ))),
        },
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Ordering> {
    let ord = match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) => match (as_float(a), as_float(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    ord.ok_or_else(|| {
        Error::eval(format!(
            "cannot compare {} and {} with `{}`",
            lhs.human(),
            rhs.human(),
            op.symbol()
        ))
    })
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn to_text(value: &Value) -> Result<String> {
    let mut s = String::new();
    fmt::default(&mut Formatter::with_string(&mut s), value)?;
    Ok(s)
}
