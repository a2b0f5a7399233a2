#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Lightweight markup for user content.
//!
//! ```text
//! [h1] Title
//! Some **bold** text with a [a "/link": link].
//!
//! [blockquote]
//!     Quoted paragraph
//! ```
//!
//! [`MarkupParser`] turns text into a tree of [`MarkupNode`]s and sanitizes
//! it against a [`TagDictionary`]; [`MarkupRenderer`] writes the tree as
//! escaped HTML. Neither step fails: unknown tags stay literal text and
//! disallowed attributes are dropped.

mod defaults;
mod dictionary;
mod inline;
mod node;
mod parser;
mod render;
mod sanitize;

pub use defaults::default_dictionary;
pub use dictionary::{
    block_tag, inline_tag, DictionaryConfig, DictionaryError, TagDefinition, TagDictionary,
    TagTranslation,
};
pub use inline::InlineParser;
pub use node::{Attributes, Content, MarkupNode};
pub use parser::MarkupParser;
pub use render::{escape_html, MarkupRenderer};

/// Parses, sanitizes and renders `text` in one step.
pub fn markup_to_html(text: &str, dict: &TagDictionary) -> String {
    let tree = MarkupParser::new(dict).parse(text);
    MarkupRenderer::new(dict).render_tree(&tree)
}
