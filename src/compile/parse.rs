use std::fmt::Display;

use crate::compile::lex::{Lexer, Token};
use crate::types::expr::{BinaryOp, Expr, UnaryOp};
use crate::types::span::Span;
use crate::{Error, Result, Value};

/// Expressions nested deeper than this are rejected.
const MAX_DEPTH: usize = 128;

impl Expr {
    /// Parses an expression from source.
    ///
    /// # Examples
    ///
    /// ```
    /// use pugvm::Expr;
    ///
    /// let expr = Expr::parse("user.name || 'anonymous'")?;
    /// assert_eq!(expr.to_string(), r#"(user.name || "anonymous")"#);
    /// # Ok::<(), pugvm::Error>(())
    /// ```
    pub fn parse(source: &str) -> Result<Expr> {
        Parser::new(source).parse_all()
    }
}

/// A recursive descent parser that constructs an [`Expr`] from a token
/// stream.
///
/// It sometimes needs to peek at the next token to know how to proceed and
/// uses the `peeked` buffer to do this.
struct Parser<'source> {
    /// A lexer that tokenizes the expression source.
    tokens: Lexer<'source>,

    /// Remember a peeked value, even if it was `None`
    peeked: Option<Option<(Token, Span)>>,

    /// The current nesting depth.
    depth: usize,
}

impl<'source> Parser<'source> {
    fn new(source: &'source str) -> Self {
        Self {
            tokens: Lexer::new(source),
            peeked: None,
            depth: 0,
        }
    }

    /// Parses a complete expression and expects the end of the source.
    fn parse_all(mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        match self.next()? {
            None => Ok(expr),
            Some((tk, span)) => Err(self.err_unexpected_token("end of expression", tk, span)),
        }
    }

    /// Parses a comma chain, the loosest binding construct.
    fn parse_expr(&mut self) -> Result<Expr> {
        self.enter()?;
        let mut lhs = self.parse_assign()?;
        while self.is_next(Token::Comma)? {
            self.next()?;
            let rhs = self.parse_assign()?;
            lhs = Expr::Comma(Box::new(lhs), Box::new(rhs));
        }
        self.depth -= 1;
        Ok(lhs)
    }

    /// Parses an assignment, which is right associative.
    fn parse_assign(&mut self) -> Result<Expr> {
        let begin = self.peek_span()?;
        let lhs = self.parse_binary(0)?;
        if !self.is_next(Token::Assign)? {
            return Ok(lhs);
        }
        let span = self.expect(Token::Assign)?;
        let target = match lhs {
            Expr::Var(name) => name,
            _ => {
                return Err(Error::syntax(
                    "invalid assignment target",
                    self.source(),
                    begin.combine(span),
                ));
            }
        };
        self.enter()?;
        let value = self.parse_assign()?;
        self.depth -= 1;
        Ok(Expr::Assign {
            target,
            value: Box::new(value),
        })
    }

    /// Parses binary operators using precedence climbing.
    fn parse_binary(&mut self, min: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek()? {
                Some((tk, _)) => match binary_op(tk) {
                    Some(op) => op,
                    None => break,
                },
                None => break,
            };
            let prec = precedence(op);
            if prec < min {
                break;
            }
            self.next()?;
            self.enter()?;
            let rhs = self.parse_binary(prec + 1)?;
            self.depth -= 1;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek()? {
            Some((Token::Bang, _)) => UnaryOp::Not,
            Some((Token::Minus, _)) => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.next()?;
        self.enter()?;
        let expr = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(expr)))
    }

    /// Parses member access, indexing and calls following a primary.
    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek()? {
                Some((Token::Dot | Token::QuestionDot, _)) => {
                    let (tk, _) = self.parse()?;
                    let span = self.expect(Token::Ident)?;
                    expr = Expr::Member {
                        base: Box::new(expr),
                        name: self.source()[span].to_owned(),
                        optional: tk == Token::QuestionDot,
                    };
                }
                Some((Token::OpenBracket, _)) => {
                    self.next()?;
                    let index = self.parse_expr()?;
                    self.expect(Token::CloseBracket)?;
                    expr = Expr::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some((Token::OpenParen, _)) => {
                    self.next()?;
                    let args = match self.is_next(Token::CloseParen)? {
                        true => None,
                        false => Some(Box::new(self.parse_expr()?)),
                    };
                    self.expect(Token::CloseParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let (tk, span) = self.parse()?;
        let expr = match tk {
            Token::Number => Expr::Literal(self.parse_literal_number(span)?),
            Token::String => Expr::Literal(Value::String(self.parse_string(span)?)),
            Token::Ident => match &self.source()[span] {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::None),
                ident => Expr::Var(ident.to_owned()),
            },
            Token::OpenParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::CloseParen)?;
                expr
            }
            Token::OpenBracket => {
                self.enter()?;
                let mut items = Vec::new();
                while !self.is_next(Token::CloseBracket)? {
                    items.push(self.parse_assign()?);
                    if !self.is_next(Token::Comma)? {
                        break;
                    }
                    self.next()?;
                }
                self.expect(Token::CloseBracket)?;
                self.depth -= 1;
                Expr::Array(items)
            }
            Token::OpenBrace => {
                self.enter()?;
                let mut entries = Vec::new();
                while !self.is_next(Token::CloseBrace)? {
                    let key = self.parse_key()?;
                    self.expect(Token::Colon)?;
                    entries.push((key, self.parse_assign()?));
                    if !self.is_next(Token::Comma)? {
                        break;
                    }
                    self.next()?;
                }
                self.expect(Token::CloseBrace)?;
                self.depth -= 1;
                Expr::Dict(entries)
            }
            tk => return Err(self.err_unexpected_token("expression", tk, span)),
        };
        Ok(expr)
    }

    /// Parses a dictionary key, either an identifier or a string.
    fn parse_key(&mut self) -> Result<String> {
        match self.parse()? {
            (Token::Ident, span) => Ok(self.source()[span].to_owned()),
            (Token::String, span) => self.parse_string(span),
            (tk, span) => Err(self.err_unexpected_token("identifier or string", tk, span)),
        }
    }

    /// Parses an integer or a float.
    fn parse_literal_number(&self, span: Span) -> Result<Value> {
        let raw = &self.source()[span];
        match self.parse_literal_integer(raw, span) {
            Ok(value) => Ok(value),
            Err(err) => match raw.parse::<f64>() {
                Ok(float) => Ok(Value::Float(float)),
                Err(_) if raw.contains('.') => {
                    Err(Error::syntax("invalid float literal", self.source(), span))
                }
                Err(_) => Err(err),
            },
        }
    }

    /// Parses an integer.
    fn parse_literal_integer(&self, raw: &str, span: Span) -> Result<Value> {
        let digits = raw.as_bytes();
        let (i, radix) = match digits {
            [b'0', b'b', ..] => (2, 2),
            [b'0', b'o', ..] => (2, 8),
            [b'0', b'x', ..] => (2, 16),
            _ => (0, 10),
        };
        let int = digits[i..]
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d != b'_')
            .try_fold(0i64, |acc, (j, &d)| {
                let x = (d as char).to_digit(radix).ok_or_else(|| {
                    let m = span.m + i + j;
                    Error::syntax(
                        format!("invalid digit for base {radix} literal"),
                        self.source(),
                        m..m + 1,
                    )
                })?;
                acc.checked_mul(radix.into())
                    .and_then(|v| v.checked_add(x.into()))
                    .ok_or_else(|| {
                        Error::syntax(
                            format!("base {radix} literal out of range for 64-bit integer"),
                            self.source(),
                            span,
                        )
                    })
            })?;
        Ok(Value::Integer(int))
    }

    /// Parses a string and handles escape characters.
    fn parse_string(&self, span: Span) -> Result<String> {
        let raw = &self.source()[span];
        let inner = &raw[1..raw.len() - 1];
        if !inner.contains('\\') {
            return Ok(inner.to_owned());
        }
        let mut iter = inner.char_indices().map(|(i, c)| (span.m + 1 + i, c));
        let mut string = String::with_capacity(inner.len());
        while let Some((i, c)) = iter.next() {
            if c != '\\' {
                string.push(c);
                continue;
            }
            let c = match iter.next() {
                Some((_, 'n')) => '\n',
                Some((_, 'r')) => '\r',
                Some((_, 't')) => '\t',
                Some((_, '\\')) => '\\',
                Some((_, '"')) => '"',
                Some((_, '\'')) => '\'',
                Some((j, esc)) => {
                    return Err(Error::syntax(
                        "unknown escape character",
                        self.source(),
                        i..j + esc.len_utf8(),
                    ));
                }
                None => {
                    return Err(Error::syntax("unknown escape character", self.source(), span));
                }
            };
            string.push(c);
        }
        Ok(string)
    }

    /// Tracks nesting so that pathological input cannot overflow the stack.
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let n = self.source().len();
            return Err(Error::syntax(
                "expression nested too deeply",
                self.source(),
                0..n,
            ));
        }
        Ok(())
    }

    /// Parses any token.
    fn parse(&mut self) -> Result<(Token, Span)> {
        match self.next()? {
            Some((tk, sp)) => Ok((tk, sp)),
            None => Err(self.err_unexpected_eof("token")),
        }
    }

    /// Parses the specified token and returns its span.
    fn expect(&mut self, exp: Token) -> Result<Span> {
        match self.next()? {
            Some((tk, span)) if tk == exp => Ok(span),
            Some((tk, span)) => Err(self.err_unexpected_token(exp.human(), tk, span)),
            None => Err(self.err_unexpected_eof(exp.human())),
        }
    }

    /// Returns `true` if the next token is equal to the provided one.
    fn is_next(&mut self, token: Token) -> Result<bool> {
        Ok(self.peek()?.map(|(tk, _)| tk == token).unwrap_or(false))
    }

    /// Returns the span of the next token, or an empty span at the end.
    fn peek_span(&mut self) -> Result<Span> {
        let n = self.source().len();
        Ok(self.peek()?.map(|(_, sp)| sp).unwrap_or(Span::from(n..n)))
    }

    /// Returns a copy of the next token without affecting the result of the
    /// following `.next()` call.
    fn peek(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked {
            Some(peeked) => Ok(peeked),
            None => {
                let peeked = self.tokens.next()?;
                self.peeked = Some(peeked);
                Ok(peeked)
            }
        }
    }

    /// Returns the next token and span in the stream.
    fn next(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked.take() {
            Some(v) => Ok(v),
            None => self.tokens.next(),
        }
    }

    fn source(&self) -> &'source str {
        self.tokens.source
    }

    fn err_unexpected_eof(&self, exp: impl Display) -> Error {
        let n = self.source().len();
        Error::syntax(format!("expected {exp}, found EOF"), self.source(), n..n)
    }

    fn err_unexpected_token(&self, exp: impl Display, got: Token, span: Span) -> Error {
        let got = got.human();
        Error::syntax(format!("expected {exp}, found {got}"), self.source(), span)
    }
}

fn binary_op(tk: Token) -> Option<BinaryOp> {
    let op = match tk {
        Token::OrOr => BinaryOp::Or,
        Token::AndAnd => BinaryOp::And,
        Token::Eq => BinaryOp::Eq,
        Token::Ne => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Le => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::Ge => BinaryOp::Ge,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 0,
        BinaryOp::And => 1,
        BinaryOp::Eq | BinaryOp::Ne => 2,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 3,
        BinaryOp::Add | BinaryOp::Sub => 4,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 5,
    }
}
