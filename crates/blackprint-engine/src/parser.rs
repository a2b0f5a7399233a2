// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::ast::{BinaryOp, Expression, Span};
use crate::error::Error;
use crate::lexer::{self, Operator, Token, TokenKind};

/// Tightest binary level; `!` takes a whole expression of this level.
const MULTIPLICATIVE: u8 = 5;

/// Parses an expression source into an [`Expression`] tree.
///
/// Recursive descent from loosest to tightest binding:
///
/// - ternary `a ? b : c` (right associative)
/// - `||`, then `&&`
/// - comparisons `== != < > <= >=`
/// - additive `+ -`
/// - multiplicative `* / // %` and prefix `!`
/// - postfix `.name` / `[expr]` over literals, names and `( ... )`
///
/// An empty source parses to `null`. Tokens left over after a complete
/// expression are rejected.
pub fn parse_expression(source: &str) -> Result<Expression, Error> {
    let tokens = lexer::tokenize(source)?;
    if tokens.is_empty() {
        return Ok(Expression::Null);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        source_len: source.len(),
    };
    let expr = parser.parse_ternary()?;
    if let Some(token) = parser.peek() {
        return Err(Error::parse_with_span(
            format!("unexpected {}", token.kind.describe()),
            token.span,
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|token| &token.kind == kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_span(&self) -> Span {
        Span::new(self.source_len, self.source_len)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, Error> {
        match self.peek() {
            Some(token) if &token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(Error::parse_with_span(
                format!(
                    "expected {} but got {}",
                    kind.describe(),
                    token.kind.describe()
                ),
                token.span,
            )),
            None => Err(Error::parse_with_span(
                format!("expected {} but reached end of expression", kind.describe()),
                self.end_span(),
            )),
        }
    }

    fn parse_ternary(&mut self) -> Result<Expression, Error> {
        let cond = self.parse_binary(1)?;
        if !self.check(&TokenKind::Question) {
            return Ok(cond);
        }
        self.advance();
        let then = self.parse_ternary()?;
        self.expect(&TokenKind::Colon)?;
        let otherwise = self.parse_ternary()?;
        Ok(Expression::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Precedence climbing over [`BinaryOp::precedence`]; all binary
    /// operators associate to the left.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, Error> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek().and_then(|token| binary_op(&token.kind)) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        if self.check(&TokenKind::Bang) {
            self.advance();
            let operand = self.parse_binary(MULTIPLICATIVE)?;
            return Ok(Expression::Not(Box::new(operand)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, Error> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&TokenKind::Dot) {
                self.advance();
                let name = match self.advance() {
                    Some(Token {
                        kind: TokenKind::Identifier(name),
                        ..
                    }) => name,
                    Some(token) => {
                        return Err(Error::parse_with_span(
                            format!("expected property name but got {}", token.kind.describe()),
                            token.span,
                        ));
                    }
                    None => {
                        return Err(Error::parse_with_span(
                            "expected property name but reached end of expression",
                            self.end_span(),
                        ));
                    }
                };
                expr = Expression::Property {
                    target: Box::new(expr),
                    name,
                };
            } else if self.check(&TokenKind::LeftBracket) {
                self.advance();
                let index = self.parse_ternary()?;
                self.expect(&TokenKind::RightBracket)?;
                expr = Expression::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let Some(token) = self.advance() else {
            return Err(Error::parse_with_span(
                "unexpected end of expression",
                self.end_span(),
            ));
        };

        match token.kind {
            TokenKind::LeftParen => {
                let inner = self.parse_ternary()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::NumberLiteral(value) => Ok(Expression::Number(value)),
            TokenKind::StringLiteral(value) => Ok(Expression::String(value)),
            TokenKind::Identifier(name) => Ok(match name.as_str() {
                "true" => Expression::Bool(true),
                "false" => Expression::Bool(false),
                "null" => Expression::Null,
                _ => Expression::Name(name),
            }),
            other => Err(Error::parse_with_span(
                format!("unexpected {}", other.describe()),
                token.span,
            )),
        }
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let TokenKind::Operator(op) = kind else {
        return None;
    };
    Some(match op {
        Operator::Or => BinaryOp::Or,
        Operator::And => BinaryOp::And,
        Operator::Equal => BinaryOp::Equal,
        Operator::NotEqual => BinaryOp::NotEqual,
        Operator::Less => BinaryOp::Less,
        Operator::LessOrEqual => BinaryOp::LessOrEqual,
        Operator::Greater => BinaryOp::Greater,
        Operator::GreaterOrEqual => BinaryOp::GreaterOrEqual,
        Operator::Plus => BinaryOp::Add,
        Operator::Minus => BinaryOp::Sub,
        Operator::Star => BinaryOp::Mul,
        Operator::Slash => BinaryOp::Div,
        Operator::DoubleSlash => BinaryOp::FloorDiv,
        Operator::Percent => BinaryOp::Mod,
    })
}
