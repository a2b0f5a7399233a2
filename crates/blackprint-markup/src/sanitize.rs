// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Whitelist filtering of parsed markup.
//!
//! Nothing is escaped here; the renderer escapes all text and attribute
//! values. Sanitizing only removes what the dictionary does not allow and
//! fills in defaults, so it never fails.

use std::collections::BTreeSet;

use tracing::trace;

use crate::dictionary::{TagDictionary, TagTranslation};
use crate::node::{Content, MarkupNode};

impl TagDictionary {
    /// Sanitizes `node` and its descendants in place.
    ///
    /// Tags without a translation are turned into the paragraph tag, or
    /// stripped down to their children when that tag is unknown too. In
    /// wildcard mode they keep their name and only the global rules apply.
    pub fn sanitize_node(&self, node: &mut MarkupNode) {
        if self.skips_sanitization() {
            return;
        }

        let translation = match self.translation(&node.tag, node.block) {
            Some(translation) => translation,
            None if self.allows_any_tags() => {
                self.sanitize_attributes(node, &[], &[]);
                self.sanitize_classes(node, &[], false);
                node.params.clear();
                self.sanitize_children(node);
                return;
            }
            None => {
                trace!(tag = %node.tag, block = node.block, "coercing unknown tag");
                node.tag = self.regularize_target().to_string();
                node.block = true;
                match self.block_translation(&node.tag, None) {
                    Some(translation) => translation,
                    None => {
                        node.attributes.clear();
                        node.params.clear();
                        self.sanitize_children(node);
                        return;
                    }
                }
            }
        };

        self.apply_translation(node, translation);
        self.sanitize_children(node);
    }

    /// Sanitizes every node of a tree.
    pub fn sanitize_tree(&self, tree: &mut [MarkupNode]) {
        for node in tree {
            self.sanitize_node(node);
        }
    }

    fn sanitize_children(&self, node: &mut MarkupNode) {
        for child in &mut node.children {
            if let Content::Node(child) = child {
                self.sanitize_node(child);
            }
        }
    }

    fn apply_translation(&self, node: &mut MarkupNode, translation: &TagTranslation) {
        self.sanitize_attributes(
            node,
            &translation.allowed_attributes,
            &translation.params_to_attribute,
        );
        self.sanitize_classes(
            node,
            &translation.allowed_classes,
            translation.allow_any_classes,
        );

        for (name, value) in &translation.default_attributes {
            let current = node.attributes.entry(name.clone()).or_default();
            if current.is_empty() {
                current.clone_from(value);
            }
        }

        if !translation.default_classes.is_empty() {
            let existing = node.attributes.get("class").map(String::as_str).unwrap_or("");
            let classes = dedup(
                translation
                    .default_classes
                    .iter()
                    .map(String::as_str)
                    .chain(existing.split(' ')),
            );
            node.attributes.insert("class".to_string(), classes);
        }

        // params bypass the attribute allow-list
        for (index, value) in node.params.iter().enumerate() {
            if let Some(name) = translation
                .params_to_attribute
                .get(index)
                .filter(|name| !name.is_empty())
            {
                node.attributes.insert(name.clone(), value.clone());
            }
        }
        node.params.clear();

        if translation.no_content {
            node.children.clear();
        }
        if translation.plain_text {
            node.children.retain(|child| matches!(child, Content::Text(_)));
        }
    }

    /// Keeps `class`, allowed and global attributes, plus the ones params
    /// map to, so an already sanitized node passes through unchanged.
    fn sanitize_attributes(&self, node: &mut MarkupNode, allowed: &[String], mapped: &[String]) {
        let global = &self.config().global_allowed_attributes;
        node.attributes.retain(|name, _| {
            let keep = name == "class"
                || allowed.contains(name)
                || mapped.contains(name)
                || global.contains(name);
            if !keep {
                trace!(tag = %node.tag, attribute = %name, "dropping attribute");
            }
            keep
        });
    }

    fn sanitize_classes(&self, node: &mut MarkupNode, allowed: &[String], allow_any: bool) {
        let allow_any = allow_any || self.allows_any_classes();
        let global = &self.config().global_allowed_classes;
        let Some(classes) = node.attributes.get("class") else {
            return;
        };

        let filtered = dedup(classes.split(' ').filter(|class| {
            allow_any || allowed.iter().any(|c| c == class) || global.iter().any(|c| c == class)
        }));
        if filtered.is_empty() {
            node.attributes.remove("class");
        } else {
            node.attributes.insert("class".to_string(), filtered);
        }
    }
}

fn dedup<'a>(classes: impl Iterator<Item = &'a str>) -> String {
    let mut seen = BTreeSet::new();
    classes
        .filter(|class| !class.is_empty() && seen.insert(*class))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use crate::dictionary::{block_tag, inline_tag, DictionaryConfig, TagDictionary, TagTranslation};
    use crate::node::{Content, MarkupNode};

    fn dict() -> TagDictionary {
        TagDictionary::new(
            [
                block_tag("p", TagTranslation::default()),
                block_tag(
                    "img",
                    TagTranslation::default()
                        .no_content()
                        .allowed_attributes(&["alt"])
                        .params_to_attribute(&["src"]),
                ),
                inline_tag(
                    "img",
                    TagTranslation::default()
                        .no_content()
                        .params_to_attribute(&["src"])
                        .default_classes(&["img-inline"]),
                ),
                block_tag(
                    "note",
                    TagTranslation::new("aside")
                        .default_attribute("role", "note")
                        .allowed_classes(&["warn"]),
                ),
                block_tag("code", TagTranslation::new("pre").plain_text()),
            ],
            DictionaryConfig::default().global_allowed_classes(&["wide"]),
        )
    }

    #[test]
    fn filters_attributes_and_maps_params() {
        let mut node = MarkupNode::block("img")
            .with_params(["/a.png", "extra"])
            .with_attribute("alt", "A")
            .with_attribute("onerror", "x()")
            .with_children([Content::from("caption")]);
        dict().sanitize_node(&mut node);
        assert_eq!(
            node,
            MarkupNode::block("img")
                .with_attribute("alt", "A")
                .with_attribute("src", "/a.png")
        );
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        let dict = dict();
        for original in [
            MarkupNode::block("img")
                .with_params(["/a.png"])
                .with_attribute("alt", "A")
                .with_attribute("onerror", "x()"),
            MarkupNode::inline("img").with_params(["/i.png"]).with_attribute("class", "wide"),
            MarkupNode::block("note").with_attribute("class", "warn evil"),
            MarkupNode::inline("script").with_children([Content::from("x")]),
        ] {
            let mut once = original;
            dict.sanitize_node(&mut once);
            let mut twice = once.clone();
            dict.sanitize_node(&mut twice);
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn filters_and_dedupes_classes() {
        let mut node = MarkupNode::block("note")
            .with_attribute("class", "warn evil wide warn")
            .with_attribute("role", "");
        dict().sanitize_node(&mut node);
        assert_eq!(node.attributes["class"], "warn wide");
        assert_eq!(node.attributes["role"], "note");

        let mut node = MarkupNode::block("p").with_attribute("class", "evil");
        dict().sanitize_node(&mut node);
        assert!(!node.attributes.contains_key("class"));
    }

    #[test]
    fn default_classes_come_first() {
        let mut node = MarkupNode::inline("img")
            .with_params(["/i.png"])
            .with_attribute("class", "wide");
        dict().sanitize_node(&mut node);
        assert_eq!(node.attributes["class"], "img-inline wide");
        assert_eq!(node.attributes["src"], "/i.png");
    }

    #[test]
    fn unknown_tags_become_paragraphs() {
        let mut node = MarkupNode::inline("script")
            .with_attribute("src", "evil.js")
            .with_children([Content::from("x")]);
        dict().sanitize_node(&mut node);
        assert_eq!(
            node,
            MarkupNode::block("p").with_children([Content::from("x")])
        );
    }

    #[test]
    fn unknown_tags_without_paragraph_are_stripped() {
        let dict = TagDictionary::new([], DictionaryConfig::default());
        let mut node = MarkupNode::block("x")
            .with_params(["a"])
            .with_attribute("id", "1")
            .with_children([Content::Node(MarkupNode::block("y").with_attribute("id", "2"))]);
        dict.sanitize_node(&mut node);
        assert!(node.attributes.is_empty());
        assert!(node.params.is_empty());
        let child = node.children[0].as_node().unwrap();
        assert!(child.attributes.is_empty());
    }

    #[test]
    fn plain_text_keeps_only_text() {
        let mut node = MarkupNode::block("code").with_children([
            Content::from("a"),
            Content::Node(MarkupNode::inline("b")),
        ]);
        dict().sanitize_node(&mut node);
        assert_eq!(node.children, vec![Content::from("a")]);
    }

    #[test]
    fn skip_sanitization_leaves_nodes_alone() {
        let dict = TagDictionary::new(
            [],
            DictionaryConfig::default()
                .unsafely_allow_any_tags(true)
                .unsafely_skip_sanitization(true),
        );
        let original = MarkupNode::block("x").with_params(["a"]).with_attribute("on", "1");
        let mut node = original.clone();
        dict.sanitize_node(&mut node);
        assert_eq!(node, original);
    }
}
