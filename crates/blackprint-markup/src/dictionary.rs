// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a markup tag maps onto HTML in one position (block or inline).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagTranslation {
    /// Output element. Empty means "same as the tag name".
    pub elem: String,
    /// Body is literal text; nested tags are not recognized.
    pub plain_text: bool,
    /// Consecutive text lines in the body are grouped into paragraphs.
    pub regularize: bool,
    /// Children are discarded.
    pub no_content: bool,
    pub default_attributes: BTreeMap<String, String>,
    pub allowed_attributes: Vec<String>,
    /// Attribute name for each positional param, by index.
    pub params_to_attribute: Vec<String>,
    pub default_classes: Vec<String>,
    pub allowed_classes: Vec<String>,
    pub allow_any_classes: bool,
}

impl TagTranslation {
    pub fn new(elem: impl Into<String>) -> Self {
        Self {
            elem: elem.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn plain_text(mut self) -> Self {
        self.plain_text = true;
        self
    }

    #[must_use]
    pub fn regularize(mut self) -> Self {
        self.regularize = true;
        self
    }

    #[must_use]
    pub fn no_content(mut self) -> Self {
        self.no_content = true;
        self
    }

    #[must_use]
    pub fn allowed_attributes(mut self, names: &[&str]) -> Self {
        self.allowed_attributes = to_strings(names);
        self
    }

    #[must_use]
    pub fn params_to_attribute(mut self, names: &[&str]) -> Self {
        self.params_to_attribute = to_strings(names);
        self
    }

    #[must_use]
    pub fn default_attribute(mut self, name: &str, value: &str) -> Self {
        self.default_attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn default_classes(mut self, classes: &[&str]) -> Self {
        self.default_classes = to_strings(classes);
        self
    }

    #[must_use]
    pub fn allowed_classes(mut self, classes: &[&str]) -> Self {
        self.allowed_classes = to_strings(classes);
        self
    }

    #[must_use]
    pub fn allow_any_classes(mut self) -> Self {
        self.allow_any_classes = true;
        self
    }
}

/// A named tag with its block and/or inline translation. The name may be
/// parent qualified, e.g. `figure>caption`, to override a tag inside a
/// specific parent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<TagTranslation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<TagTranslation>,
}

/// Block tag rendered as `elem`. Spaces in `name` are ignored, so
/// `"figure > caption"` defines `figure>caption`.
pub fn block_tag(name: &str, translation: TagTranslation) -> TagDefinition {
    TagDefinition {
        name: name.replace(' ', ""),
        block: Some(translation),
        inline: None,
    }
}

/// Inline counterpart of [`block_tag`].
pub fn inline_tag(name: &str, translation: TagTranslation) -> TagDefinition {
    TagDefinition {
        name: name.replace(' ', ""),
        block: None,
        inline: Some(translation),
    }
}

/// Dictionary wide settings. Unset options fall back to their defaults and
/// are left untouched by [`TagDictionary::extend`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DictionaryConfig {
    pub global_allowed_attributes: Vec<String>,
    pub global_allowed_classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_allow_any_classes: Option<bool>,
    /// Paragraph tag used to wrap loose text. Defaults to `p`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regularize_target: Option<String>,
    /// Wildcard mode: every tag name is accepted as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsafely_allow_any_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsafely_skip_sanitization: Option<bool>,
}

impl DictionaryConfig {
    #[must_use]
    pub fn global_allowed_attributes(mut self, names: &[&str]) -> Self {
        self.global_allowed_attributes = to_strings(names);
        self
    }

    #[must_use]
    pub fn global_allowed_classes(mut self, classes: &[&str]) -> Self {
        self.global_allowed_classes = to_strings(classes);
        self
    }

    #[must_use]
    pub fn global_allow_any_classes(mut self, allow: bool) -> Self {
        self.global_allow_any_classes = Some(allow);
        self
    }

    #[must_use]
    pub fn regularize_target(mut self, tag: &str) -> Self {
        self.regularize_target = Some(tag.to_string());
        self
    }

    #[must_use]
    pub fn unsafely_allow_any_tags(mut self, allow: bool) -> Self {
        self.unsafely_allow_any_tags = Some(allow);
        self
    }

    #[must_use]
    pub fn unsafely_skip_sanitization(mut self, skip: bool) -> Self {
        self.unsafely_skip_sanitization = Some(skip);
        self
    }
}

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("invalid tag dictionary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tag definition has an empty name")]
    EmptyName,
}

/// Serialized form accepted by [`TagDictionary::from_json`].
#[derive(Debug, Deserialize)]
struct DictionarySource {
    #[serde(default)]
    tags: Vec<TagDefinition>,
    #[serde(default)]
    config: DictionaryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TagSlots {
    block: Option<TagTranslation>,
    inline: Option<TagTranslation>,
}

/// Immutable table of known markup tags and the rules applied to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDictionary {
    tags: BTreeMap<String, TagSlots>,
    config: DictionaryConfig,
}

impl TagDictionary {
    /// Builds a dictionary. Repeated names merge: a later definition replaces
    /// only the slots (block, inline) it sets.
    pub fn new(definitions: impl IntoIterator<Item = TagDefinition>, config: DictionaryConfig) -> Self {
        let mut dict = Self {
            tags: BTreeMap::new(),
            config,
        };
        dict.merge(definitions);
        dict
    }

    /// Loads `{"tags": [...], "config": {...}}` with camelCase keys.
    pub fn from_json(source: &str) -> Result<Self, DictionaryError> {
        let source: DictionarySource = serde_json::from_str(source)?;
        if source.tags.iter().any(|tag| tag.name.trim().is_empty()) {
            return Err(DictionaryError::EmptyName);
        }
        Ok(Self::new(source.tags, source.config))
    }

    /// Returns a new dictionary with `definitions` layered over this one.
    /// Global allow-lists are unioned; other options set in `config` win.
    #[must_use]
    pub fn extend(
        &self,
        definitions: impl IntoIterator<Item = TagDefinition>,
        config: DictionaryConfig,
    ) -> Self {
        let merged = DictionaryConfig {
            global_allowed_attributes: union(
                &config.global_allowed_attributes,
                &self.config.global_allowed_attributes,
            ),
            global_allowed_classes: union(
                &config.global_allowed_classes,
                &self.config.global_allowed_classes,
            ),
            global_allow_any_classes: config
                .global_allow_any_classes
                .or(self.config.global_allow_any_classes),
            regularize_target: config
                .regularize_target
                .or_else(|| self.config.regularize_target.clone()),
            unsafely_allow_any_tags: config
                .unsafely_allow_any_tags
                .or(self.config.unsafely_allow_any_tags),
            unsafely_skip_sanitization: config
                .unsafely_skip_sanitization
                .or(self.config.unsafely_skip_sanitization),
        };
        let mut dict = Self {
            tags: self.tags.clone(),
            config: merged,
        };
        dict.merge(definitions);
        dict
    }

    fn merge(&mut self, definitions: impl IntoIterator<Item = TagDefinition>) {
        for definition in definitions {
            let name: String = definition.name.chars().filter(|c| !c.is_whitespace()).collect();
            let default_elem = last_segment(&name).to_string();
            let with_elem = |mut translation: TagTranslation| {
                if translation.elem.is_empty() {
                    translation.elem.clone_from(&default_elem);
                }
                translation
            };
            let slots = self.tags.entry(name.clone()).or_default();
            if let Some(block) = definition.block {
                slots.block = Some(with_elem(block));
            }
            if let Some(inline) = definition.inline {
                slots.inline = Some(with_elem(inline));
            }
        }
    }

    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    /// Tag used for synthesized paragraphs.
    pub fn regularize_target(&self) -> &str {
        self.config.regularize_target.as_deref().unwrap_or("p")
    }

    pub fn allows_any_tags(&self) -> bool {
        self.config.unsafely_allow_any_tags.unwrap_or(false)
    }

    pub fn skips_sanitization(&self) -> bool {
        self.config.unsafely_skip_sanitization.unwrap_or(false)
    }

    pub(crate) fn allows_any_classes(&self) -> bool {
        self.config.global_allow_any_classes.unwrap_or(false)
    }

    /// Resolves `tag` written inside `parent` to the name of its block
    /// definition: `parent>tag` first, then `tag`. In wildcard mode an
    /// unknown tag resolves to itself.
    pub fn normalized_block_name(&self, tag: &str, parent: Option<&str>) -> Option<String> {
        self.normalize(tag, parent, |slots| slots.block.is_some())
    }

    /// Inline counterpart of [`TagDictionary::normalized_block_name`].
    pub fn normalized_inline_name(&self, tag: &str, parent: Option<&str>) -> Option<String> {
        self.normalize(tag, parent, |slots| slots.inline.is_some())
    }

    fn normalize(
        &self,
        tag: &str,
        parent: Option<&str>,
        has_slot: impl Fn(&TagSlots) -> bool,
    ) -> Option<String> {
        let defined = |name: &str| self.tags.get(name).is_some_and(&has_slot);

        // already normalized names keep their qualification
        if tag.contains('>') && defined(tag) {
            return Some(tag.to_string());
        }

        let tag = last_segment(tag);
        if let Some(parent) = parent.map(last_segment).filter(|p| !p.is_empty()) {
            let qualified = format!("{parent}>{tag}");
            if defined(&qualified) {
                return Some(qualified);
            }
        }
        if defined(tag) {
            Some(tag.to_string())
        } else if self.allows_any_tags() {
            Some(tag.to_string())
        } else {
            None
        }
    }

    pub fn block_exists(&self, tag: &str, parent: Option<&str>) -> bool {
        self.allows_any_tags() || self.block_translation(tag, parent).is_some()
    }

    pub fn inline_exists(&self, tag: &str, parent: Option<&str>) -> bool {
        self.allows_any_tags() || self.inline_translation(tag, parent).is_some()
    }

    pub fn block_translation(&self, tag: &str, parent: Option<&str>) -> Option<&TagTranslation> {
        let name = self.normalized_block_name(tag, parent)?;
        self.tags.get(&name)?.block.as_ref()
    }

    pub fn inline_translation(&self, tag: &str, parent: Option<&str>) -> Option<&TagTranslation> {
        let name = self.normalized_inline_name(tag, parent)?;
        self.tags.get(&name)?.inline.as_ref()
    }

    pub(crate) fn translation(&self, tag: &str, block: bool) -> Option<&TagTranslation> {
        if block {
            self.block_translation(tag, None)
        } else {
            self.inline_translation(tag, None)
        }
    }

    pub fn should_plain_text(&self, tag: &str) -> bool {
        self.block_translation(tag, None)
            .is_some_and(|t| t.plain_text)
    }

    pub fn should_regularize_children(&self, tag: &str) -> bool {
        self.block_translation(tag, None)
            .is_some_and(|t| t.regularize)
    }

    pub fn should_have_no_children(&self, tag: &str) -> bool {
        self.block_translation(tag, None)
            .is_some_and(|t| t.no_content)
    }

    pub(crate) fn inline_plain_text(&self, tag: &str) -> bool {
        self.inline_translation(tag, None)
            .is_some_and(|t| t.plain_text)
    }

    /// Output element for a node. Unknown tags resolve to themselves only in
    /// wildcard mode.
    pub fn html_tag<'a>(&'a self, tag: &'a str, block: bool) -> Option<&'a str> {
        match self.translation(tag, block) {
            Some(translation) => Some(translation.elem.as_str()),
            None if self.allows_any_tags() => Some(last_segment(tag)),
            None => None,
        }
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('>').next().unwrap_or(name)
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn union(first: &[String], second: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    first
        .iter()
        .chain(second)
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}
