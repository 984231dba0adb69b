//! Expression nodes referenced from the syntax tree and the compiled program.

use std::fmt;

use crate::Value;

/// An expression.
///
/// Expressions are produced by [`Expr::parse`] or built directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value, e.g. `"hello"`, `3`, `true` or `null`.
    Literal(Value),
    /// A variable, e.g. `user`.
    Var(String),
    /// Member access, e.g. `user.name` or `user?.name`.
    Member {
        base: Box<Expr>,
        name: String,
        optional: bool,
    },
    /// Index access, e.g. `users[0]` or `user["name"]`.
    Index { base: Box<Expr>, index: Box<Expr> },
    /// An array literal, e.g. `[1, x]`.
    Array(Vec<Expr>),
    /// A dictionary literal, e.g. `{a: 1, "b": x}`.
    Dict(Vec<(String, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// An assignment, e.g. `x = 1`.
    Assign { target: String, value: Box<Expr> },
    /// A call, e.g. `lower(name)` or `item()`.
    ///
    /// Multiple arguments are a comma chain.
    Call {
        callee: Box<Expr>,
        args: Option<Box<Expr>>,
    },
    /// A comma chain, e.g. `a, b`. Evaluates to the right operand.
    Comma(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Expr {
    /// Whether the expression can be evaluated without any context.
    ///
    /// Literals and operators over literals are constant. Variables, calls and
    /// assignments never are.
    pub fn is_const(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Var(_) | Self::Assign { .. } | Self::Call { .. } => false,
            Self::Member { base, .. } => base.is_const(),
            Self::Index { base, index } => base.is_const() && index.is_const(),
            Self::Array(items) => items.iter().all(Self::is_const),
            Self::Dict(entries) => entries.iter().all(|(_, e)| e.is_const()),
            Self::Unary(_, e) => e.is_const(),
            Self::Binary(_, lhs, rhs) | Self::Comma(lhs, rhs) => lhs.is_const() && rhs.is_const(),
        }
    }

    /// Returns the identifier if this expression is a bare variable.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the callee name if this is a call of a bare identifier.
    pub fn callee_name(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => callee.as_ident(),
            _ => None,
        }
    }

    /// Flattens a comma chain into its operands, left to right.
    pub fn flatten_comma(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        flatten(self, &mut out);
        out
    }

    /// Returns the arguments of a call as a flattened list.
    pub fn call_args(&self) -> Vec<&Expr> {
        match self {
            Self::Call {
                args: Some(args), ..
            } => args.flatten_comma(),
            _ => Vec::new(),
        }
    }
}

fn flatten<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Comma(lhs, rhs) => {
            flatten(lhs, out);
            flatten(rhs, out);
        }
        expr => out.push(expr),
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl BinaryOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

/// Writes the expression back in source form, fully parenthesized.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(Value::String(s)) => write!(f, "{s:?}"),
            Self::Literal(Value::None) => f.write_str("null"),
            Self::Literal(Value::Bool(b)) => write!(f, "{b}"),
            Self::Literal(Value::Integer(n)) => write!(f, "{n}"),
            Self::Literal(Value::Float(n)) => write!(f, "{n:?}"),
            Self::Literal(value) => write!(f, "<{}>", value.human()),
            Self::Var(name) => f.write_str(name),
            Self::Member {
                base,
                name,
                optional,
            } => {
                let op = if *optional { "?." } else { "." };
                write!(f, "{base}{op}{name}")
            }
            Self::Index { base, index } => write!(f, "{base}[{index}]"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Dict(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Unary(UnaryOp::Not, e) => write!(f, "!{e}"),
            Self::Unary(UnaryOp::Neg, e) => write!(f, "-{e}"),
            Self::Binary(op, lhs, rhs) => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Self::Assign { target, value } => write!(f, "({target} = {value})"),
            Self::Call { callee, args } => match args {
                Some(args) => write!(f, "{callee}({args})"),
                None => write!(f, "{callee}()"),
            },
            Self::Comma(lhs, rhs) => write!(f, "{lhs}, {rhs}"),
        }
    }
}
