// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::iter::Peekable;
use std::str::CharIndices;

use crate::ast::Span;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    StringLiteral(String),
    NumberLiteral(f64),
    Dot,
    Bang,
    Question,
    Colon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Operator(Operator),
}

impl TokenKind {
    /// Tokens after which a `+`/`-` is a binary operator rather than a sign.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::NumberLiteral(_)
                | TokenKind::RightParen
                | TokenKind::RightBracket
        )
    }

    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("name `{name}`"),
            TokenKind::StringLiteral(value) => format!("string \"{value}\""),
            TokenKind::NumberLiteral(value) => format!("number {value}"),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Bang => "`!`".to_string(),
            TokenKind::Question => "`?`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::LeftParen => "`(`".to_string(),
            TokenKind::RightParen => "`)`".to_string(),
            TokenKind::LeftBracket => "`[`".to_string(),
            TokenKind::RightBracket => "`]`".to_string(),
            TokenKind::Operator(op) => format!("`{}`", op.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::DoubleSlash => "//",
            Operator::Percent => "%",
        }
    }
}

/// Splits an expression into tokens. Any character outside the grammar is a
/// tokenize error.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer::new(input);
    let mut tokens: Vec<Token> = Vec::new();
    while let Some(token) = lexer.next_token(tokens.last())? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn next_token(&mut self, previous: Option<&Token>) -> Result<Option<Token>, Error> {
        self.skip_whitespace();

        let Some((start, chr)) = self.chars.next() else {
            return Ok(None);
        };
        let after_operand = previous.is_some_and(|token| token.kind.ends_operand());

        let kind = match chr {
            '"' | '\'' => TokenKind::StringLiteral(self.read_string(chr, start)?),
            c if is_identifier_start(c) => TokenKind::Identifier(self.read_identifier(start)),
            c if c.is_ascii_digit() => TokenKind::NumberLiteral(self.read_number(start)?),
            '.' if !after_operand && self.peek_is_digit() => {
                TokenKind::NumberLiteral(self.read_number(start)?)
            }
            '+' | '-' if !after_operand && self.peek_starts_number() => {
                TokenKind::NumberLiteral(self.read_number(start)?)
            }
            '=' if self.eat('=') => TokenKind::Operator(Operator::Equal),
            '!' if self.eat('=') => TokenKind::Operator(Operator::NotEqual),
            '<' if self.eat('=') => TokenKind::Operator(Operator::LessOrEqual),
            '>' if self.eat('=') => TokenKind::Operator(Operator::GreaterOrEqual),
            '&' if self.eat('&') => TokenKind::Operator(Operator::And),
            '|' if self.eat('|') => TokenKind::Operator(Operator::Or),
            '/' if self.eat('/') => TokenKind::Operator(Operator::DoubleSlash),
            '<' => TokenKind::Operator(Operator::Less),
            '>' => TokenKind::Operator(Operator::Greater),
            '+' => TokenKind::Operator(Operator::Plus),
            '-' => TokenKind::Operator(Operator::Minus),
            '*' => TokenKind::Operator(Operator::Star),
            '/' => TokenKind::Operator(Operator::Slash),
            '%' => TokenKind::Operator(Operator::Percent),
            '!' => TokenKind::Bang,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            other => {
                return Err(Error::tokenize(
                    format!("invalid token '{other}'"),
                    Some(self.span_from(start)),
                ));
            }
        };

        Ok(Some(Token {
            kind,
            span: self.span_from(start),
        }))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|(_, ch)| *ch == expected).is_some()
    }

    fn peek_is_digit(&mut self) -> bool {
        self.chars.peek().is_some_and(|(_, ch)| ch.is_ascii_digit())
    }

    fn peek_starts_number(&mut self) -> bool {
        let mut ahead = self.chars.clone();
        match ahead.next() {
            Some((_, ch)) if ch.is_ascii_digit() => true,
            Some((_, '.')) => ahead.next().is_some_and(|(_, ch)| ch.is_ascii_digit()),
            _ => false,
        }
    }

    fn position(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.input.len(), |(index, _)| *index)
    }

    fn read_identifier(&mut self, start: usize) -> String {
        while self.chars.next_if(|(_, ch)| is_identifier_part(*ch)).is_some() {}
        let end = self.position();
        self.input[start..end].to_string()
    }

    /// Quoted strings run to the next matching quote; there are no escapes.
    fn read_string(&mut self, quote: char, start: usize) -> Result<String, Error> {
        let body_start = start + quote.len_utf8();
        for (index, ch) in self.chars.by_ref() {
            if ch == quote {
                return Ok(self.input[body_start..index].to_string());
            }
        }
        Err(Error::tokenize(
            "unterminated string literal",
            Some(Span::new(start, self.input.len())),
        ))
    }

    fn read_number(&mut self, start: usize) -> Result<f64, Error> {
        let mut seen_dot = self.input[start..].starts_with('.');
        loop {
            match self.chars.peek() {
                Some((_, ch)) if ch.is_ascii_digit() => {
                    self.chars.next();
                }
                Some((_, '.')) if !seen_dot => {
                    seen_dot = true;
                    self.chars.next();
                }
                _ => break,
            }
        }
        let end = self.position();
        let literal = &self.input[start..end];
        literal.parse::<f64>().map_err(|_| {
            Error::tokenize(
                format!("invalid number literal {literal}"),
                Some(Span::new(start, end)),
            )
        })
    }

    fn span_from(&mut self, start: usize) -> Span {
        Span::new(start, self.position())
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}
