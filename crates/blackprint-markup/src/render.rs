// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::dictionary::TagDictionary;
use crate::node::{Content, MarkupNode};

/// Serializes sanitized markup trees to HTML.
///
/// All text and attribute values are escaped. A node whose tag has no
/// output element contributes only its children.
#[derive(Debug, Clone, Copy)]
pub struct MarkupRenderer<'d> {
    dict: &'d TagDictionary,
}

impl<'d> MarkupRenderer<'d> {
    pub fn new(dict: &'d TagDictionary) -> Self {
        Self { dict }
    }

    pub fn render_tree(&self, tree: &[MarkupNode]) -> String {
        let mut out = String::new();
        for node in tree {
            self.write_node(&mut out, node);
        }
        out
    }

    pub fn render_content(&self, content: &[Content]) -> String {
        let mut out = String::new();
        self.write_children(&mut out, content);
        out
    }

    fn write_children(&self, out: &mut String, children: &[Content]) {
        for child in children {
            match child {
                Content::Text(text) => escape_into(out, text),
                Content::Node(node) => self.write_node(out, node),
            }
        }
    }

    fn write_node(&self, out: &mut String, node: &MarkupNode) {
        let Some(elem) = self.dict.html_tag(&node.tag, node.block) else {
            self.write_children(out, &node.children);
            return;
        };

        out.push('<');
        out.push_str(elem);
        for (name, value) in &node.attributes {
            if !is_attribute_name(name) {
                continue;
            }
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(out, value);
            out.push('"');
        }
        out.push('>');
        self.write_children(out, &node.children);
        out.push_str("</");
        out.push_str(elem);
        out.push('>');
    }
}

/// Escapes `& < > " '` for use in text and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

// quoted keys can hold anything when sanitization is skipped
fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '<' | '/' | '='))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_dictionary;

    #[test]
    fn escapes_everything() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn unresolvable_tags_render_children_only() {
        let tree = [MarkupNode::inline("blink").with_children([Content::from("x")])];
        assert_eq!(MarkupRenderer::new(default_dictionary()).render_tree(&tree), "x");
    }

    #[test]
    fn no_content_tags_still_close() {
        let tree = [MarkupNode::block("img").with_attribute("src", "/a.png")];
        assert_eq!(
            MarkupRenderer::new(default_dictionary()).render_tree(&tree),
            r#"<img src="/a.png"></img>"#
        );
    }

    #[test]
    fn invalid_attribute_names_are_skipped() {
        let tree = [MarkupNode::block("p").with_attribute("x\"onload", "1").with_attribute("id", "a")];
        assert_eq!(
            MarkupRenderer::new(default_dictionary()).render_tree(&tree),
            r#"<p id="a"></p>"#
        );
    }
}
