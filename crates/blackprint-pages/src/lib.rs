#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Page assembly on top of the BlackPrint template engine.
//!
//! A [`TemplateRegistry`] holds the named templates of a site. Templates
//! import each other by name through `<ref! import="...">`, and every render
//! sees the [`SiteConfig`] under `site`. User written markup is converted
//! with [`render_markup`] and handed to templates as a string, to be placed
//! with `<ref! var="...">`.
//!
//! ```
//! use blackprint_pages::{render_markup, TemplateRegistry, Value};
//! use blackprint_pages::markup::default_dictionary;
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let mut registry = TemplateRegistry::new();
//! registry.register("post", r#"<article><ref! var="body"></ref!></article>"#);
//!
//! let body = render_markup("Hello **world**", default_dictionary());
//! let data = Value::from(json!({ "body": body }));
//! let html = block_on(registry.render("post", &data)).unwrap();
//! assert!(html.contains("<article><p>Hello <strong>world</strong></p></article>"));
//! ```

mod error;
mod registry;
mod site;

pub use blackprint_engine as engine;
pub use blackprint_engine::{Template, Value};
pub use blackprint_markup as markup;
pub use error::PagesError;
pub use registry::{TemplateRegistry, TEMPLATE_SUFFIX};
pub use site::SiteConfig;

use blackprint_markup::{MarkupParser, MarkupRenderer, TagDictionary};
use tracing::trace;

/// Parses, sanitizes and renders user markup to an HTML fragment.
pub fn render_markup(text: &str, dict: &TagDictionary) -> String {
    let tree = MarkupParser::new(dict).parse(text);
    let html = MarkupRenderer::new(dict).render_tree(&tree);
    trace!(input = text.len(), output = html.len(), "rendered markup");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackprint_markup::default_dictionary;

    #[test]
    fn markup_is_sanitized_before_rendering() {
        let html = render_markup(
            "[p onclick=\"x()\"] [a \"/post\" target=top: read]",
            default_dictionary(),
        );
        assert_eq!(html, "<p><a href=\"/post\">read</a></p>");
    }
}
