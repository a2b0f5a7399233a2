// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Inline markup: `[tag attrs: body]` and the symmetric formatters
//! `**strong**`, `~~del~~`, `*em*` and `` `code` ``.

use tracing::trace;

use crate::dictionary::TagDictionary;
use crate::node::{push_content, Attributes, Content, MarkupNode};

/// Symmetric formatter pairs. At equal positions the earlier entry wins, so
/// `**` is preferred over `*`.
const SPECIAL_FORMATTERS: &[(&str, &str)] = &[
    ("strong", "**"),
    ("del", "~~"),
    ("em", "*"),
    ("code", "`"),
];

const INLINE_CLOSER: &str = "]";

/// Where attribute parsing stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeEnd {
    /// `\s*:\s?` between an inline tag's attributes and its body.
    Separator,
    /// `\s*]\s?` closing a block tag line.
    BlockEnd,
}

impl AttributeEnd {
    fn delimiter(self) -> char {
        match self {
            AttributeEnd::Separator => ':',
            AttributeEnd::BlockEnd => ']',
        }
    }
}

/// Result of scanning a tag's attribute list.
#[derive(Debug, Default)]
pub(crate) struct TagAttributes<'a> {
    pub attributes: Attributes,
    pub params: Vec<String>,
    pub errored: bool,
    /// Raw text consumed while scanning, for literal fallback.
    pub original: &'a str,
}

/// A block tag line split into its parts.
#[derive(Debug)]
pub(crate) struct BlockTag<'a> {
    pub tag: String,
    pub attributes: Attributes,
    pub params: Vec<String>,
    pub trailing: &'a str,
}

/// Prefix scanner shared by block and inline tag parsing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    pub(crate) fn rest(&self) -> &'a str {
        self.rest
    }

    fn advance(&mut self, len: usize) -> &'a str {
        let (taken, rest) = self.rest.split_at(len);
        self.rest = rest;
        taken
    }

    fn leading_whitespace(&self) -> usize {
        self.rest.len() - self.rest.trim_start().len()
    }

    /// `\[([a-zA-Z][a-zA-Z0-9]*)` anchored at the cursor.
    pub(crate) fn consume_tag_start(&mut self) -> Option<&'a str> {
        let len = tag_start_len(self.rest)?;
        Some(&self.advance(len)[1..])
    }

    /// `\s*<delim>\s?`
    fn consume_end(&mut self, end: AttributeEnd) -> bool {
        let ws = self.leading_whitespace();
        if !self.rest[ws..].starts_with(end.delimiter()) {
            return false;
        }
        let mut len = ws + 1;
        if let Some(ch) = self.rest[len..].chars().next().filter(|c| c.is_whitespace()) {
            len += ch.len_utf8();
        }
        self.advance(len);
        true
    }

    /// `\s*<ch>`
    fn consume_symbol(&mut self, symbol: char) -> bool {
        let ws = self.leading_whitespace();
        if self.rest[ws..].starts_with(symbol) {
            self.advance(ws + 1);
            true
        } else {
            false
        }
    }

    /// `\s*(["'])...\1`. Consumes nothing when the quote is unterminated.
    fn try_string(&mut self) -> Option<&'a str> {
        let ws = self.leading_whitespace();
        let quote = self.rest[ws..].chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let body_start = ws + 1;
        let close = self.rest[body_start..].find(quote)?;
        let taken = self.advance(body_start + close + 1);
        Some(&taken[body_start..body_start + close])
    }

    /// `\s*([a-zA-Z0-9\-_.]*)`, which always matches.
    fn word(&mut self) -> &'a str {
        let ws = self.leading_whitespace();
        let len = self.rest[ws..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(self.rest.len() - ws);
        &self.advance(ws + len)[ws..]
    }

    fn value(&mut self) -> &'a str {
        match self.try_string() {
            Some(value) if !value.is_empty() => value,
            _ => self.word(),
        }
    }

    /// Scans quoted or bare keys, `.class` shorthands, `key=value` pairs and
    /// bare params up to `end`. An empty key marks the list as errored.
    pub(crate) fn tag_attributes(&mut self, end: AttributeEnd) -> TagAttributes<'a> {
        let start = self.rest;
        let mut result = TagAttributes::default();

        while !self.consume_end(end) {
            let (key, class_sign) = match self.try_string() {
                Some(key) => (key, false),
                None => {
                    let class_sign = self.consume_symbol('.');
                    (self.word(), class_sign)
                }
            };
            if key.is_empty() {
                result.errored = true;
                break;
            }

            if class_sign {
                match result.attributes.get_mut("class") {
                    Some(classes) => {
                        classes.push(' ');
                        classes.push_str(key);
                    }
                    None => {
                        result.attributes.insert("class".to_string(), key.to_string());
                    }
                }
            } else if self.consume_symbol('=') {
                let value = self.value();
                result.attributes.insert(key.to_string(), value.to_string());
            } else {
                result.params.push(key.to_string());
            }
        }

        result.original = &start[..start.len() - self.rest.len()];
        result
    }
}

/// Byte length of a `[tag` opener at the start of `text`.
fn tag_start_len(text: &str) -> Option<usize> {
    let name = text.strip_prefix('[')?;
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let len = name
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(name.len());
    Some(1 + len)
}

/// Position and length of the first `[tag` opener in `text`.
fn find_tag_start(text: &str) -> Option<(usize, usize)> {
    text.match_indices('[')
        .find_map(|(index, _)| tag_start_len(&text[index..]).map(|len| (index, len)))
}

/// Splits a block tag line (`[tag attrs] trailing`). Returns `None` when the
/// line is not a valid block tag for `parent`.
pub(crate) fn parse_block_tag<'a>(
    dict: &TagDictionary,
    line: &'a str,
    parent: Option<&str>,
) -> Option<BlockTag<'a>> {
    let mut cursor = Cursor::new(line);
    let raw_tag = cursor.consume_tag_start()?;
    let attrs = cursor.tag_attributes(AttributeEnd::BlockEnd);
    if attrs.errored {
        return None;
    }
    let Some(tag) = dict.normalized_block_name(raw_tag, parent) else {
        trace!(tag = raw_tag, "unknown block tag kept as text");
        return None;
    };
    Some(BlockTag {
        tag,
        attributes: attrs.attributes,
        params: attrs.params,
        trailing: cursor.rest(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landmark {
    Closing { index: usize, len: usize },
    Special { index: usize, len: usize, tag: &'static str, closer: &'static str },
    Opening { index: usize, len: usize },
}

impl Landmark {
    fn index(self) -> usize {
        match self {
            Landmark::Closing { index, .. }
            | Landmark::Special { index, .. }
            | Landmark::Opening { index, .. } => index,
        }
    }
}

struct OpenTag {
    node: MarkupNode,
    closer: String,
}

/// Parser for a single line of inline markup.
#[derive(Debug, Clone, Copy)]
pub struct InlineParser<'d> {
    dict: &'d TagDictionary,
}

impl<'d> InlineParser<'d> {
    pub fn new(dict: &'d TagDictionary) -> Self {
        Self { dict }
    }

    /// Parses `text` written inside the block tag `parent`.
    pub fn parse(&self, text: &str, parent: Option<&str>) -> Vec<Content> {
        InlineState::new(self.dict, text, parent).run()
    }

    /// Like [`InlineParser::parse`], but marks the end of the source line by
    /// appending `\n` to the trailing text (adding a text child if the line
    /// ends in a tag).
    pub fn parse_line(&self, text: &str, parent: Option<&str>) -> Vec<Content> {
        let mut nodes = self.parse(text, parent);
        match nodes.last_mut() {
            Some(Content::Text(last)) => last.push('\n'),
            _ => nodes.push(Content::Text("\n".to_string())),
        }
        nodes
    }
}

struct InlineState<'d, 'a> {
    dict: &'d TagDictionary,
    cursor: Cursor<'a>,
    parent: Option<&'a str>,
    nodes: Vec<Content>,
    stack: Vec<OpenTag>,
    skip_until_closer: bool,
}

impl<'d, 'a> InlineState<'d, 'a> {
    fn new(dict: &'d TagDictionary, text: &'a str, parent: Option<&'a str>) -> Self {
        Self {
            dict,
            cursor: Cursor::new(text),
            parent,
            nodes: Vec::new(),
            stack: Vec::new(),
            skip_until_closer: false,
        }
    }

    fn run(mut self) -> Vec<Content> {
        while !self.cursor.rest().is_empty() {
            self.process_landmark();
        }
        // tags left open at end of line close implicitly
        while !self.stack.is_empty() {
            self.end_tag();
        }
        self.nodes
    }

    fn process_landmark(&mut self) {
        let Some(landmark) = self.nearest_landmark() else {
            let text = self.cursor.advance(self.cursor.rest().len());
            self.add_text(text);
            return;
        };

        let before = self.cursor.advance(landmark.index());
        self.add_text(before);

        match landmark {
            Landmark::Closing { len, .. } => {
                self.cursor.advance(len);
                self.end_tag();
            }
            Landmark::Special { len, tag, closer, .. } => {
                let opener = self.cursor.advance(len);
                if !self.start_tag(MarkupNode::inline(tag), closer) {
                    self.add_text(opener);
                }
            }
            Landmark::Opening { len, .. } => {
                let opener = self.cursor.advance(len);
                let attrs = self.cursor.tag_attributes(AttributeEnd::Separator);
                let mut node = MarkupNode::inline(&opener[1..]);
                node.attributes = attrs.attributes;
                node.params = attrs.params;
                if attrs.errored || !self.start_tag(node, INLINE_CLOSER) {
                    let mut literal = String::with_capacity(opener.len() + attrs.original.len());
                    literal.push_str(opener);
                    literal.push_str(attrs.original);
                    self.add_text(&literal);
                }
            }
        }
    }

    fn nearest_landmark(&self) -> Option<Landmark> {
        let text = self.cursor.rest();
        let closing = self.stack.last().and_then(|open| {
            text.find(open.closer.as_str()).map(|index| Landmark::Closing {
                index,
                len: open.closer.len(),
            })
        });
        if self.skip_until_closer {
            return closing;
        }

        let special = SPECIAL_FORMATTERS
            .iter()
            .filter_map(|&(tag, opener)| {
                text.find(opener).map(|index| Landmark::Special {
                    index,
                    len: opener.len(),
                    tag,
                    closer: opener,
                })
            })
            .min_by_key(|landmark| landmark.index());
        let opening = find_tag_start(text).map(|(index, len)| Landmark::Opening { index, len });

        // min_by_key keeps the first of equal keys: closing, special, opening
        [closing, special, opening]
            .into_iter()
            .flatten()
            .min_by_key(|landmark| landmark.index())
    }

    fn current_parent(&self) -> Option<&str> {
        self.stack
            .last()
            .map(|open| open.node.tag.as_str())
            .or(self.parent)
    }

    fn start_tag(&mut self, mut node: MarkupNode, closer: &str) -> bool {
        let Some(tag) = self.dict.normalized_inline_name(&node.tag, self.current_parent()) else {
            trace!(tag = %node.tag, "unknown inline tag kept as text");
            return false;
        };
        if self.dict.inline_plain_text(&tag) {
            self.skip_until_closer = true;
        }
        node.tag = tag;
        self.stack.push(OpenTag {
            node,
            closer: closer.to_string(),
        });
        true
    }

    fn end_tag(&mut self) {
        if let Some(open) = self.stack.pop() {
            self.skip_until_closer = false;
            self.children().push(Content::Node(open.node));
        }
    }

    fn children(&mut self) -> &mut Vec<Content> {
        match self.stack.last_mut() {
            Some(open) => &mut open.node.children,
            None => &mut self.nodes,
        }
    }

    fn add_text(&mut self, text: &str) {
        push_content(self.children(), Content::Text(text.to_string()));
    }
}
