use crate::types::span::Span;
use crate::{Error, Result};

/// A lexer that tokenizes an expression source so that the parser doesn't
/// have to operate on raw text.
///
/// The lexer is implemented as a fallible iterator. The parser should
/// repeatedly call the [`.next()?`][Lexer::next] method to return the next
/// non-whitespace token until [`None`] is returned.
#[cfg_attr(test, derive(Debug))]
pub struct Lexer<'source> {
    /// The original expression source.
    pub source: &'source str,

    /// A cursor over the expression source.
    cursor: usize,
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `.`
    Dot,
    /// `?.`
    QuestionDot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `=`
    Assign,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `!`
    Bang,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// Sequence of whitespace characters
    Whitespace,
    /// A variable, attribute, or one of `true`, `false` and `null`
    Ident,
    /// An integer or float literal, e.g. `19`, `0b1011`, `0x7f` or `1.5`
    Number,
    /// A string literal, e.g. `"Hello World!\n"` or `'single'`
    String,
}

impl<'source> Lexer<'source> {
    /// Construct a new lexer.
    pub fn new(source: &'source str) -> Self {
        Self { source, cursor: 0 }
    }

    /// Returns the next non-whitespace token and its span.
    pub fn next(&mut self) -> Result<Option<(Token, Span)>> {
        loop {
            match self.lex()? {
                Some((Token::Whitespace, _)) => continue,
                next => return Ok(next),
            }
        }
    }

    /// Returns the next token and span.
    fn lex(&mut self) -> Result<Option<(Token, Span)>> {
        let i = self.cursor;

        // The map call here fixes the index to be relative to the actual
        // expression source.
        let mut iter = self.source[i..].char_indices().map(|(d, c)| (i + d, c));

        let (i, c) = match iter.next() {
            Some(next) => next,
            None => return Ok(None),
        };

        let peek = iter.clone().next().map(|(_, c)| c);

        let (tk, j) = match (c, peek) {
            // Two character tokens.
            ('?', Some('.')) => (Token::QuestionDot, i + 2),
            ('=', Some('=')) => (Token::Eq, i + 2),
            ('!', Some('=')) => (Token::Ne, i + 2),
            ('<', Some('=')) => (Token::Le, i + 2),
            ('>', Some('=')) => (Token::Ge, i + 2),
            ('&', Some('&')) => (Token::AndAnd, i + 2),
            ('|', Some('|')) => (Token::OrOr, i + 2),

            // Single character to token mappings.
            ('.', _) => (Token::Dot, i + 1),
            (',', _) => (Token::Comma, i + 1),
            (':', _) => (Token::Colon, i + 1),
            ('(', _) => (Token::OpenParen, i + 1),
            (')', _) => (Token::CloseParen, i + 1),
            ('[', _) => (Token::OpenBracket, i + 1),
            (']', _) => (Token::CloseBracket, i + 1),
            ('{', _) => (Token::OpenBrace, i + 1),
            ('}', _) => (Token::CloseBrace, i + 1),
            ('=', _) => (Token::Assign, i + 1),
            ('!', _) => (Token::Bang, i + 1),
            ('<', _) => (Token::Lt, i + 1),
            ('>', _) => (Token::Gt, i + 1),
            ('+', _) => (Token::Plus, i + 1),
            ('-', _) => (Token::Minus, i + 1),
            ('*', _) => (Token::Star, i + 1),
            ('/', _) => (Token::Slash, i + 1),
            ('%', _) => (Token::Percent, i + 1),

            // Multi-character tokens with a distinct start character.
            ('"' | '\'', _) => self.lex_string(iter, i, c)?,
            (c, _) if c.is_ascii_digit() => self.lex_number(iter),
            (c, _) if c.is_whitespace() => (Token::Whitespace, self.lex_while(iter, char::is_whitespace)),
            (c, _) if is_ident_start(c) => (Token::Ident, self.lex_while(iter, is_ident)),

            // Any other character...
            _ => {
                return Err(self.err_unexpected_character(i..(i + c.len_utf8())));
            }
        };

        self.cursor = j;
        Ok(Some((tk, Span::from(i..j))))
    }

    fn lex_string<I>(&mut self, mut iter: I, i: usize, quote: char) -> Result<(Token, usize)>
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        let mut escaped = false;
        loop {
            match iter.next() {
                None => {
                    return Err(self.err_undelimited_string(i..self.source.len()));
                }
                Some((j, '\r' | '\n')) => {
                    return Err(self.err_undelimited_string(i..j));
                }
                Some((j, c)) if c == quote && !escaped => {
                    return Ok((Token::String, j + 1));
                }
                Some((_, c)) => {
                    escaped = c == '\\' && !escaped;
                }
            }
        }
    }

    fn lex_number<I>(&mut self, mut iter: I) -> (Token, usize)
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        // A dot only continues the number when a digit follows it, so that
        // `1.5` is a float but member access on a number still lexes.
        loop {
            let mut ahead = iter.clone();
            match ahead.next() {
                Some((_, c)) if c.is_ascii_alphanumeric() || c == '_' => {
                    iter.next();
                }
                Some((_, '.')) if matches!(ahead.next(), Some((_, d)) if d.is_ascii_digit()) => {
                    iter.next();
                }
                Some((j, _)) => return (Token::Number, j),
                None => return (Token::Number, self.source.len()),
            }
        }
    }

    fn lex_while<I, P>(&mut self, mut iter: I, pred: P) -> usize
    where
        I: Iterator<Item = (usize, char)> + Clone,
        P: Fn(char) -> bool,
    {
        loop {
            match iter.clone().next() {
                Some((_, c)) if pred(c) => {
                    iter.next();
                }
                Some((j, _)) => return j,
                None => return self.source.len(),
            }
        }
    }

    fn err_unexpected_character(&self, span: impl Into<Span>) -> Error {
        Error::syntax("unexpected character", self.source, span)
    }

    fn err_undelimited_string(&self, span: impl Into<Span>) -> Error {
        Error::syntax("undelimited string", self.source, span)
    }
}

impl Token {
    pub fn human(&self) -> &'static str {
        match self {
            Self::Dot => "member access operator",
            Self::QuestionDot => "optional member access operator",
            Self::Comma => "comma",
            Self::Colon => "colon",
            Self::OpenParen => "open parenthesis",
            Self::CloseParen => "close parenthesis",
            Self::OpenBracket => "open bracket",
            Self::CloseBracket => "close bracket",
            Self::OpenBrace => "open brace",
            Self::CloseBrace => "close brace",
            Self::Assign => "assignment operator",
            Self::Eq => "`==`",
            Self::Ne => "`!=`",
            Self::Bang => "`!`",
            Self::Lt => "`<`",
            Self::Le => "`<=`",
            Self::Gt => "`>`",
            Self::Ge => "`>=`",
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Percent => "`%`",
            Self::AndAnd => "`&&`",
            Self::OrOr => "`||`",
            Self::Whitespace => "whitespace",
            Self::Ident => "identifier",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

#[cfg(feature = "unicode")]
fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

#[cfg(feature = "unicode")]
fn is_ident(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_ident_start(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '_' | '$')
}

#[cfg(not(feature = "unicode"))]
fn is_ident(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_' | '$')
}
