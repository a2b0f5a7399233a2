// SPDX-License-Identifier: Apache-2.0 OR MIT
//! HTML tree used by the template engine.
//!
//! Parsing follows the HTML standard tree construction rules (via
//! `scraper`/html5ever), so implied end tags, `<head>` placement and entity
//! decoding behave the way a browser would. Unknown tags such as `for!` are
//! ordinary elements; a trailing `/>` on them does not close them. Tag and
//! attribute names come back lowercased.

use scraper::{ElementRef, Html};
use smallvec::SmallVec;

/// Attribute list of an element, in source order.
pub type Attributes = SmallVec<[Attribute; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr.name == name)
    }

    /// Sets `name`, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(attr) = self.attributes.iter_mut().find(|attr| attr.name == name) {
            attr.value = value;
        } else {
            self.attributes.push(Attribute { name, value });
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|attr| attr.name != name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
    Comment(String),
}

/// Parsed document; `root` is always an `html` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Serializes as `<!DOCTYPE html>` followed by the root element.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        write_element(&mut out, &self.root);
        out
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Parses a full document. Missing `<html>`, `<head>` and `<body>` elements
/// are created, so `root` is always an `html` element.
pub fn parse_document(source: &str) -> Document {
    let parsed = Html::parse_document(source);
    Document {
        root: convert_element(parsed.root_element()),
    }
}

/// Parses an HTML fragment, in a `<body>` context, into a node list.
pub fn parse_fragment(source: &str) -> Vec<Node> {
    let parsed = Html::parse_fragment(source);
    convert_element(parsed.root_element()).children
}

fn convert_element(source: ElementRef<'_>) -> Element {
    let mut element = Element::new(source.value().name());
    for (name, value) in source.value().attrs() {
        element.attributes.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    for child in source.children() {
        match child.value() {
            scraper::Node::Text(text) => element.children.push(Node::Text(str::to_owned(text))),
            scraper::Node::Comment(comment) => {
                element.children.push(Node::Comment(str::to_owned(comment)));
            }
            scraper::Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    element.children.push(Node::Element(convert_element(child)));
                }
            }
            _ => {}
        }
    }
    element
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

/// Serializes a node list.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, None);
    }
    out
}

fn write_node(out: &mut String, node: &Node, parent: Option<&str>) {
    match node {
        Node::Text(text) => {
            if parent.is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name)) {
                out.push_str(text);
            } else {
                escape_text(out, text);
            }
        }
        Node::Element(el) => write_element(out, el),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_attribute(out, &attr.value);
        out.push('"');
    }
    out.push('>');
    if is_void(&el.name) {
        return;
    }
    for child in &el.children {
        write_node(out, child, Some(&el.name));
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(el) => el,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let nodes = parse_fragment(r#"<div class="a" hidden data-x=1><p>hi</p></div>"#);
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.attribute("class"), Some("a"));
        assert_eq!(div.attribute("hidden"), Some(""));
        assert_eq!(div.attribute("data-x"), Some("1"));
        let p = element(&div.children[0]);
        assert_eq!(p.children, vec![Node::Text("hi".into())]);
    }

    #[test]
    fn control_tag_names_are_lowercased() {
        let nodes = parse_fragment(r#"<FOR! var="x" of="3">{{x}}</For!>"#);
        let el = element(&nodes[0]);
        assert_eq!(el.name, "for!");
        assert_eq!(el.children, vec![Node::Text("{{x}}".into())]);
    }

    #[test]
    fn attribute_names_are_lowercased_in_source_order() {
        let nodes = parse_fragment(r#"<a {{attrName}}="1" HREF="/x" href="/y" id=z></a>"#);
        let el = element(&nodes[0]);
        let names: Vec<_> = el.attributes.iter().map(|attr| attr.name.as_str()).collect();
        assert_eq!(names, ["{{attrname}}", "href", "id"]);
        assert_eq!(el.attribute("href"), Some("/x"));
    }

    #[test]
    fn void_elements_take_no_children_but_custom_tags_stay_open() {
        let nodes = parse_fragment(r#"<img src="a.png"><ref! import="nav"/>after"#);
        assert_eq!(nodes.len(), 2);
        let reference = element(&nodes[1]);
        assert_eq!(reference.name, "ref!");
        assert_eq!(reference.children, vec![Node::Text("after".into())]);
    }

    #[test]
    fn multibyte_text_near_markup_parses() {
        let nodes = parse_fragment("<br>\u{e9}\u{e9}\u{e9}");
        assert_eq!(to_html(&nodes), "<br>\u{e9}\u{e9}\u{e9}");

        let doc = parse_document("</p>\u{d55c}\u{ad6d}\u{c5b4}<!doctype html>");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html><head></head><body><p></p>\u{d55c}\u{ad6d}\u{c5b4}</body></html>"
        );
    }

    #[test]
    fn implied_end_tags_follow_tree_construction() {
        let doc = parse_document("<title>T</title><p>a<p>b");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html><head><title>T</title></head><body><p>a</p><p>b</p></body></html>"
        );

        let nodes = parse_fragment("<ul><li>a<li>b</ul>");
        assert_eq!(to_html(&nodes), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn stray_end_tags_are_ignored_and_open_tags_closed() {
        let nodes = parse_fragment("</span><b>bold");
        assert_eq!(to_html(&nodes), "<b>bold</b>");
    }

    #[test]
    fn script_content_is_raw() {
        let nodes = parse_fragment("<script>if (a < b) {}</script>");
        assert_eq!(to_html(&nodes), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn text_round_trips_with_escaping() {
        let nodes = parse_fragment("<p title=\"a &quot;b&quot;\">1 &lt; 2 &amp;&amp; x &unknown;</p>");
        assert_eq!(
            to_html(&nodes),
            "<p title=\"a &quot;b&quot;\">1 &lt; 2 &amp;&amp; x &amp;unknown;</p>"
        );
    }

    #[test]
    fn document_without_html_root_is_wrapped() {
        let doc = parse_document("<!DOCTYPE html>Hello");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html><head></head><body>Hello</body></html>"
        );
    }

    #[test]
    fn document_with_html_root_is_kept() {
        let doc = parse_document("<!doctype html>\n<html lang=\"ko\"><body>x</body></html>\n");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html lang=\"ko\"><head></head><body>x\n</body></html>"
        );
    }
}
