// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::ast::Span;
use thiserror::Error;

/// Unified error type for expression evaluation and template rendering.
///
/// Expression failures carry the `Span` of the offending token when one is
/// known. Every variant aborts the enclosing render; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid character or unterminated literal in an expression.
    #[error("tokenize error: {message}")]
    Tokenize { message: String, span: Option<Span> },
    /// Structurally invalid expression (unexpected token, missing delimiter).
    #[error("parse error: {message}")]
    Parse { message: String, span: Option<Span> },
    /// Operand of the wrong type for an operator or accessor.
    #[error("type error: {message}")]
    Type { message: String },
    /// Missing mapping key or out-of-range index.
    #[error("lookup error: {message}")]
    Lookup { message: String },
    /// Malformed control tag.
    #[error("template error: {message}")]
    Structure { message: String },
    /// The import resolver could not supply the named fragment.
    #[error("import error: failed to import template \"{name}\"")]
    Import {
        name: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    pub fn tokenize(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Tokenize {
            message: message.into(),
            span,
        }
    }

    pub fn parse(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn parse_with_span(message: impl Into<String>, span: Span) -> Self {
        Self::parse(message, Some(span))
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Error::Type {
            message: message.into(),
        }
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        Error::Lookup {
            message: message.into(),
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Error::Structure {
            message: message.into(),
        }
    }

    pub fn import(name: impl Into<String>) -> Self {
        Error::Import {
            name: name.into(),
            source: None,
        }
    }

    pub fn import_with_source(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Import {
            name: name.into(),
            source: Some(source.into()),
        }
    }

    /// Byte span into the expression source, when the error came from one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Tokenize { span, .. } | Error::Parse { span, .. } => *span,
            _ => None,
        }
    }
}
