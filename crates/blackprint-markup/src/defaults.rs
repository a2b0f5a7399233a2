// SPDX-License-Identifier: Apache-2.0 OR MIT
use once_cell::sync::Lazy;

use crate::dictionary::{
    block_tag, inline_tag, DictionaryConfig, TagDefinition, TagDictionary, TagTranslation as T,
};

static DEFAULT_DICTIONARY: Lazy<TagDictionary> = Lazy::new(|| {
    TagDictionary::new(
        default_tags(),
        DictionaryConfig::default().regularize_target("p"),
    )
});

/// The dictionary used for posts and comments.
pub fn default_dictionary() -> &'static TagDictionary {
    &DEFAULT_DICTIONARY
}

fn default_tags() -> Vec<TagDefinition> {
    let mut tags: Vec<TagDefinition> = ["p", "h1", "h2", "h3", "h4", "h5", "h6"]
        .into_iter()
        .map(|name| block_tag(name, T::default()))
        .collect();

    tags.extend([
        inline_tag("strong", T::default()),
        inline_tag("b", T::new("strong")),
        inline_tag("em", T::default()),
        inline_tag("i", T::new("em")),
        inline_tag("del", T::default()),
        inline_tag("small", T::default()),
        inline_tag(
            "a",
            T::default()
                .allowed_attributes(&["title"])
                .params_to_attribute(&["href"]),
        ),
        inline_tag(
            "img",
            T::default()
                .no_content()
                .allowed_attributes(&["alt", "width", "height"])
                .params_to_attribute(&["src"])
                .default_classes(&["img-inline"]),
        ),
        block_tag(
            "img",
            T::default()
                .no_content()
                .allowed_attributes(&["alt", "width", "height"])
                .params_to_attribute(&["src"]),
        ),
        inline_tag("br", T::default().no_content()),
        block_tag("section", T::default().regularize()),
        block_tag("aside", T::default().regularize()),
        block_tag("figure", T::default()),
        block_tag("figure > caption", T::new("figcaption")),
        block_tag("figcaption", T::default()),
        block_tag("blockquote", T::default()),
        block_tag("code", T::new("pre").plain_text().params_to_attribute(&["lang"])),
        inline_tag("code", T::default().plain_text().params_to_attribute(&["lang"])),
        block_tag("math", T::default().plain_text()),
        inline_tag("math", T::default().plain_text()),
        inline_tag("cite", T::default()),
    ]);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dictionary_translations() {
        let dict = default_dictionary();
        assert_eq!(dict.html_tag("b", false), Some("strong"));
        assert_eq!(dict.html_tag("code", true), Some("pre"));
        assert_eq!(dict.html_tag("code", false), Some("code"));
        assert_eq!(
            dict.normalized_block_name("caption", Some("figure")).as_deref(),
            Some("figure>caption")
        );
        assert_eq!(dict.html_tag("figure>caption", true), Some("figcaption"));
        assert!(dict.should_regularize_children("section"));
        assert!(dict.should_have_no_children("img"));
        assert!(!dict.block_exists("script", None));
        assert!(!dict.inline_exists("iframe", None));
    }
}
