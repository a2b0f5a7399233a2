#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! BlackPrint: HTML templates with an embedded expression language.
//!
//! A [`Template`] parses its HTML source once. Every [`Template::render`]
//! builds a fresh output tree from the parsed one, expanding the control
//! tags `for!`, `if!` and `ref!` and replacing `{{expr}}` placeholders in
//! text and attributes.

pub mod ast;
mod error;
pub mod html;
pub mod lexer;
mod parser;
mod resolver;
mod runtime;
pub mod telemetry;
mod value;

pub use ast::{BinaryOp, Expression, Span};
pub use error::Error;
pub use lexer::{Operator, Token, TokenKind};
pub use parser::parse_expression;
pub use resolver::{ImportResolver, NoImports};
pub use runtime::{evaluate, EvalContext};
pub use value::{format_number, Mapping, Value};

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use html::{Document, Element, Node};
use tracing::{debug, trace};

/// Nesting limit for `ref!` expansion; a fragment importing itself would
/// otherwise never terminate.
const MAX_REF_DEPTH: usize = 64;

/// Parsed template with its original source.
#[derive(Clone)]
pub struct Template {
    name: String,
    source: String,
    document: Document,
    resolver: Arc<dyn ImportResolver>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Template {
    /// Parses `source` as an HTML document. Parsing is lenient and never
    /// fails; malformed control tags surface as errors at render time.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        let source = source.into();
        let document = html::parse_document(&source);
        debug!(template = %name, len = source.len(), "parsed template");
        Self {
            name,
            source,
            document,
            resolver: Arc::new(NoImports),
        }
    }

    /// Reads and parses a template file. The template is named after the
    /// file name up to its first `.`, so `nav.bp.html` becomes `nav`.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Ok(Self::new(template_name_for(path), source))
    }

    /// Replaces the resolver consulted by `<ref! import="...">`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ImportResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed document. Rendering never modifies it.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Renders the template against `data`, returning `<!DOCTYPE html>`
    /// followed by the serialized document.
    pub async fn render(&self, data: &Value) -> Result<String, Error> {
        let started = Instant::now();
        let result = self.render_document(data).await;
        telemetry::record_render(&self.name, self.source.len(), started.elapsed(), result.is_ok());
        if let Err(err) = &result {
            debug!(template = %self.name, error = %err, "render failed");
        }
        result
    }

    async fn render_document(&self, data: &Value) -> Result<String, Error> {
        let mut ctx = EvalContext::new(data.clone());
        let renderer = Renderer {
            resolver: self.resolver.as_ref(),
        };
        let root = &self.document.root;
        let mut output = Element::new(root.name.clone());
        output.attributes = interpolate_attributes(&ctx, root)?;
        output.children = renderer.render_nodes(&mut ctx, &root.children, 0).await?;
        Ok(Document { root: output }.to_html())
    }
}

/// Derives a registry name from a template path: the file name up to its
/// first `.`.
pub fn template_name_for(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file_name,
    }
}

struct Renderer<'r> {
    resolver: &'r dyn ImportResolver,
}

impl<'r> Renderer<'r> {
    fn render_nodes<'a>(
        &'a self,
        ctx: &'a mut EvalContext,
        nodes: &'a [Node],
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<Node>, Error>>
    where
        'r: 'a,
    {
        async move {
            let mut output = Vec::with_capacity(nodes.len());
            for node in nodes {
                self.render_node(ctx, node, depth, &mut output).await?;
            }
            Ok(output)
        }
        .boxed()
    }

    async fn render_node(
        &self,
        ctx: &mut EvalContext,
        node: &Node,
        depth: usize,
        output: &mut Vec<Node>,
    ) -> Result<(), Error> {
        let element = match node {
            Node::Text(text) => {
                let text = interpolate(ctx, text)?.unwrap_or_else(|| text.clone());
                output.push(Node::Text(text));
                return Ok(());
            }
            Node::Comment(_) => {
                output.push(node.clone());
                return Ok(());
            }
            Node::Element(element) => element,
        };

        match element.name.as_str() {
            "for!" => self.render_for(ctx, element, depth, output).await,
            "if!" => self.render_if(ctx, element, depth, output).await,
            "ref!" => self.render_ref(ctx, element, depth, output).await,
            _ => {
                let mut rendered = Element::new(element.name.clone());
                rendered.attributes = interpolate_attributes(ctx, element)?;
                rendered.children = self.render_nodes(ctx, &element.children, depth).await?;
                output.push(Node::Element(rendered));
                Ok(())
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    async fn render_for(
        &self,
        ctx: &mut EvalContext,
        element: &Element,
        depth: usize,
        output: &mut Vec<Node>,
    ) -> Result<(), Error> {
        let (Some(var), Some(of)) = (element.attribute("var"), element.attribute("of")) else {
            return Err(Error::structure("<for!> tag must have var and of attributes"));
        };

        let source = match ctx.evaluate(of)? {
            Value::Sequence(items) => ForSource::Items(items),
            Value::Number(n) if n.is_finite() => ForSource::Range(range_len(n)),
            Value::Number(n) => {
                return Err(Error::structure(format!(
                    "<for! of=\"{of}\"> must be a finite number, got {}",
                    format_number(n)
                )))
            }
            _ => {
                return Err(Error::structure(format!(
                    "<for! of=\"{of}\"> returned a non-iterable value"
                )))
            }
        };
        let reversed = element.has_attribute("reversed");

        let take = match element.attribute("limit") {
            Some(limit) => match ctx.evaluate(limit)? {
                Value::Number(n) => limit_count(n),
                _ => {
                    return Err(Error::structure(format!(
                        "<for!> tag's limit attribute \"{limit}\" must evaluate to a number"
                    )))
                }
            },
            None => usize::MAX,
        };

        match source {
            ForSource::Items(mut items) => {
                if reversed {
                    items.reverse();
                }
                trace!(var, of, count = items.len().min(take), "expanding for!");
                for item in items.into_iter().take(take) {
                    self.render_iteration(ctx, var, item, element, depth, output).await?;
                }
            }
            ForSource::Range(len) => {
                let count = len.min(take);
                trace!(var, of, count, "expanding for!");
                for step in 0..count {
                    let index = if reversed { len - 1 - step } else { step };
                    let item = Value::Number(index as f64);
                    self.render_iteration(ctx, var, item, element, depth, output).await?;
                }
            }
        }
        Ok(())
    }

    async fn render_iteration(
        &self,
        ctx: &mut EvalContext,
        var: &str,
        item: Value,
        element: &Element,
        depth: usize,
        output: &mut Vec<Node>,
    ) -> Result<(), Error> {
        ctx.push_binding(var, item);
        let rendered = self.render_nodes(ctx, &element.children, depth).await;
        ctx.pop_binding();
        output.extend(rendered?);
        Ok(())
    }

    async fn render_if(
        &self,
        ctx: &mut EvalContext,
        element: &Element,
        depth: usize,
        output: &mut Vec<Node>,
    ) -> Result<(), Error> {
        let Some(cond) = element.attribute("cond") else {
            return Err(Error::structure("<if!> tag must have a cond attribute"));
        };

        let value = ctx.evaluate(cond)?;
        let mut truthy = !matches!(value, Value::Null | Value::Bool(false));
        if element.has_attribute("is-empty") {
            truthy = match &value {
                Value::Null => true,
                Value::Sequence(items) => items.is_empty(),
                _ => {
                    return Err(Error::structure(
                        "<if!> tag's is-empty attribute can only be used with sequences",
                    ))
                }
            };
        }
        if element.has_attribute("not") {
            truthy = !truthy;
        }

        if truthy {
            output.extend(self.render_nodes(ctx, &element.children, depth).await?);
        }
        Ok(())
    }

    async fn render_ref(
        &self,
        ctx: &mut EvalContext,
        element: &Element,
        depth: usize,
        output: &mut Vec<Node>,
    ) -> Result<(), Error> {
        let source = match (element.attribute("var"), element.attribute("import")) {
            (Some(var), None) => match ctx.evaluate(var)? {
                Value::String(source) => source,
                other => {
                    return Err(Error::structure(format!(
                        "<ref!> tag's var attribute \"{var}\" must evaluate to a string, but got {}",
                        other.type_name()
                    )))
                }
            },
            (None, Some(name)) => {
                let resolved = self.resolver.resolve(name).await;
                telemetry::record_import(name, resolved.is_some());
                debug!(import = name, found = resolved.is_some(), "resolved ref! import");
                resolved.ok_or_else(|| Error::import(name))?
            }
            _ => {
                return Err(Error::structure(
                    "<ref!> tag must have only one of either var or import attribute",
                ))
            }
        };

        if depth >= MAX_REF_DEPTH {
            return Err(Error::structure(format!(
                "<ref!> nesting exceeds {MAX_REF_DEPTH} levels"
            )));
        }

        let fragment = html::parse_fragment(&source);
        output.extend(self.render_nodes(ctx, &fragment, depth + 1).await?);
        Ok(())
    }
}

/// What a `for!` iterates: the items of a sequence, or the indices
/// `0..len` of a numeric range, produced one at a time.
enum ForSource {
    Items(Vec<Value>),
    Range(usize),
}

/// Length of the range `[0, n)` for a finite `n`; fractions are floored.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn range_len(n: f64) -> usize {
    if n <= 0.0 {
        0
    } else {
        n.floor() as usize
    }
}

/// Number of iterations a `limit` value allows: a fractional limit admits one
/// more item, anything at or below zero admits none.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn limit_count(limit: f64) -> usize {
    if limit.is_nan() || limit <= 0.0 {
        0
    } else if limit.is_infinite() {
        usize::MAX
    } else {
        limit.ceil() as usize
    }
}

/// Replaces every `{{expr}}` in `text`. Returns `None` when the text holds no
/// placeholder.
fn interpolate(ctx: &EvalContext, text: &str) -> Result<Option<String>, Error> {
    let mut rest = text;
    let mut output: Option<String> = None;

    while let Some((start, inner, end)) = find_placeholder(rest) {
        let out = output.get_or_insert_with(|| String::with_capacity(text.len()));
        out.push_str(&rest[..start]);
        match ctx.evaluate(inner)? {
            Value::Null => {}
            Value::Bool(flag) => out.push_str(if flag { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(n)),
            Value::String(s) => out.push_str(&s),
            other => {
                return Err(Error::type_mismatch(format!(
                    "expression {inner} must evaluate to a string, number, or boolean, got {}",
                    other.type_name()
                )))
            }
        }
        rest = &rest[end..];
    }

    Ok(output.map(|mut out| {
        out.push_str(rest);
        out
    }))
}

/// Finds the first `{{...}}` with a non-empty body on a single line.
/// Returns the placeholder's start, its body and the offset just past it.
fn find_placeholder(text: &str) -> Option<(usize, &str, usize)> {
    let mut from = 0;
    while let Some(offset) = text[from..].find("{{") {
        let start = from + offset;
        let body_start = start + 2;
        let body = &text[body_start..];
        // the body needs at least one character before `}}`
        let first_len = body.chars().next().map(char::len_utf8)?;
        if !body.starts_with('\n') {
            if let Some(close) = body[first_len..].find("}}") {
                let inner = &body[..first_len + close];
                if !inner.contains('\n') {
                    let end = body_start + inner.len() + 2;
                    return Some((start, inner, end));
                }
            }
        }
        from = start + 1;
    }
    None
}

fn interpolate_attributes(
    ctx: &EvalContext,
    element: &Element,
) -> Result<html::Attributes, Error> {
    let mut output = Element::new(element.name.clone());
    for attr in &element.attributes {
        let value = match interpolate(ctx, &attr.value)? {
            Some(value) if value.is_empty() || value == "false" => continue,
            Some(value) => value,
            None => attr.value.clone(),
        };
        let name = match interpolate(ctx, &attr.name)? {
            Some(name) if name.is_empty() || name == "false" => continue,
            Some(name) => name,
            None => attr.name.clone(),
        };
        output.set_attribute(name, value);
    }
    Ok(output.attributes)
}
