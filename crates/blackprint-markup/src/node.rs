// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute map of a markup node. `class` holds a space separated list.
pub type Attributes = BTreeMap<String, String>;

/// A parsed markup tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarkupNode {
    /// Normalized tag name, possibly parent qualified (`figure>caption`).
    pub tag: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Bare positional tokens, in source order.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub children: Vec<Content>,
    pub block: bool,
}

impl MarkupNode {
    pub fn block(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            block: true,
            ..Self::default()
        }
    }

    pub fn inline(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            block: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Content>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Appends a class to the space separated `class` attribute.
    pub fn add_class(&mut self, class: &str) {
        match self.attributes.get_mut("class") {
            Some(classes) if !classes.is_empty() => {
                classes.push(' ');
                classes.push_str(class);
            }
            _ => {
                self.attributes.insert("class".to_string(), class.to_string());
            }
        }
    }

    /// Appends a child, merging adjacent text. Empty text is ignored.
    pub(crate) fn push_child(&mut self, child: Content) {
        push_content(&mut self.children, child);
    }
}

/// Child of a markup node: either a nested node or a run of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Node(MarkupNode),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&MarkupNode> {
        match self {
            Content::Node(node) => Some(node),
            Content::Text(_) => None,
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<MarkupNode> for Content {
    fn from(node: MarkupNode) -> Self {
        Content::Node(node)
    }
}

pub(crate) fn push_content(children: &mut Vec<Content>, child: Content) {
    match child {
        Content::Text(text) if text.is_empty() => {}
        Content::Text(text) => {
            if let Some(Content::Text(last)) = children.last_mut() {
                last.push_str(&text);
            } else {
                children.push(Content::Text(text));
            }
        }
        node @ Content::Node(_) => children.push(node),
    }
}

/// Removes one trailing `\n` from the last child when it is text, dropping
/// the child if nothing remains.
pub(crate) fn trim_final_newline(children: &mut Vec<Content>) {
    if let Some(Content::Text(last)) = children.last_mut() {
        if last.ends_with('\n') {
            last.pop();
        }
        if last.is_empty() {
            children.pop();
        }
    }
}
