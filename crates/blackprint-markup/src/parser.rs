// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Block structure of markup documents.
//!
//! A line starting with `[tag ...]` opens a block; the lines below it that
//! are indented one more level (4 spaces) form its body. Whitespace-only
//! lines belong to the innermost open block. Loose text at the top level,
//! and inside blocks that regularize, is grouped into paragraphs.

use tracing::debug;

use crate::dictionary::TagDictionary;
use crate::inline::{parse_block_tag, InlineParser};
use crate::node::{trim_final_newline, Content, MarkupNode};

const INDENT_WIDTH: usize = 4;

/// Parses markup text into a sanitized tree of block nodes.
#[derive(Debug, Clone, Copy)]
pub struct MarkupParser<'d> {
    dict: &'d TagDictionary,
}

impl<'d> MarkupParser<'d> {
    pub fn new(dict: &'d TagDictionary) -> Self {
        Self { dict }
    }

    pub fn parse(&self, text: &str) -> Vec<MarkupNode> {
        let mut state = BlockState {
            dict: self.dict,
            inline: InlineParser::new(self.dict),
            lines: text.split('\n').collect(),
            index: 0,
            indent: 0,
        };
        let items = state.collect(None, Vec::new());
        let mut tree = state.regularize(state.lines_to_pieces(items, None));
        self.dict.sanitize_tree(&mut tree);
        debug!(lines = state.lines.len(), blocks = tree.len(), "parsed markup");
        tree
    }
}

/// Raw content of a block before inline parsing.
enum Item<'a> {
    Blank,
    Line(&'a str),
    Block(MarkupNode),
}

/// Content of a block after inline parsing, one entry per source line.
enum Piece {
    Blank,
    Inline(Vec<Content>),
    Block(MarkupNode),
}

struct BlockState<'d, 'a> {
    dict: &'d TagDictionary,
    inline: InlineParser<'d>,
    lines: Vec<&'a str>,
    index: usize,
    indent: usize,
}

impl<'d, 'a> BlockState<'d, 'a> {
    /// Collects the lines of the block `parent` until a line is indented
    /// less than the current level.
    fn collect(&mut self, parent: Option<&str>, mut items: Vec<Item<'a>>) -> Vec<Item<'a>> {
        let no_content = parent.is_some_and(|tag| self.dict.should_have_no_children(tag));
        let plain_text = parent.is_some_and(|tag| self.dict.should_plain_text(tag));

        while let Some(&raw) = self.lines.get(self.index) {
            if raw.trim().is_empty() {
                items.push(Item::Blank);
                self.index += 1;
                continue;
            }
            let Some(line) = trim_indent(raw, self.indent) else {
                break;
            };
            let line = line.trim_end();
            self.index += 1;

            if no_content {
                continue;
            }

            let block = if plain_text {
                None
            } else {
                parse_block_tag(self.dict, line, parent)
            };
            match block {
                Some(block) => {
                    let first = block.trailing.trim_end();
                    let initial = if first.is_empty() {
                        Vec::new()
                    } else {
                        vec![Item::Line(first)]
                    };

                    self.indent += 1;
                    let child_items = self.collect(Some(&block.tag), initial);
                    self.indent -= 1;

                    let mut node = MarkupNode::block(block.tag);
                    node.attributes = block.attributes;
                    node.params = block.params;
                    node.children = self.finish(child_items, &node.tag);
                    items.push(Item::Block(node));
                }
                None => items.push(Item::Line(line)),
            }
        }
        items
    }

    fn lines_to_pieces(&self, items: Vec<Item<'a>>, parent: Option<&str>) -> Vec<Piece> {
        let plain_text = parent.is_some_and(|tag| self.dict.should_plain_text(tag));
        items
            .into_iter()
            .map(|item| match item {
                Item::Blank => Piece::Blank,
                Item::Block(node) => Piece::Block(node),
                Item::Line(line) if plain_text => Piece::Inline(vec![Content::Text(format!("{line}\n"))]),
                Item::Line(line) => Piece::Inline(self.inline.parse_line(line, parent)),
            })
            .collect()
    }

    /// Turns the collected lines of block `tag` into its children.
    fn finish(&self, items: Vec<Item<'a>>, tag: &str) -> Vec<Content> {
        let mut pieces = self.lines_to_pieces(items, Some(tag));
        if self.dict.should_regularize_children(tag) {
            return self.regularize(pieces).into_iter().map(Content::Node).collect();
        }

        while matches!(pieces.last(), Some(Piece::Blank)) {
            pieces.pop();
        }
        let mut children = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Blank => children.push(Content::Text("\n".to_string())),
                Piece::Inline(nodes) => children.extend(nodes),
                Piece::Block(node) => children.push(Content::Node(node)),
            }
        }
        trim_final_newline(&mut children);
        children
    }

    /// Groups consecutive text lines into paragraphs. Blank lines and block
    /// nodes end the current paragraph.
    fn regularize(&self, pieces: Vec<Piece>) -> Vec<MarkupNode> {
        fn flush(tree: &mut Vec<MarkupNode>, current: &mut Option<MarkupNode>) {
            if let Some(mut paragraph) = current.take() {
                trim_final_newline(&mut paragraph.children);
                tree.push(paragraph);
            }
        }

        let mut tree = Vec::new();
        let mut current: Option<MarkupNode> = None;
        for piece in pieces {
            match piece {
                Piece::Blank => flush(&mut tree, &mut current),
                Piece::Block(node) => {
                    flush(&mut tree, &mut current);
                    tree.push(node);
                }
                Piece::Inline(nodes) => current
                    .get_or_insert_with(|| MarkupNode::block(self.dict.regularize_target()))
                    .children
                    .extend(nodes),
            }
        }
        flush(&mut tree, &mut current);
        tree
    }
}

/// Strips `level` indentation steps, or returns `None` when the line is
/// indented less.
fn trim_indent(line: &str, level: usize) -> Option<&str> {
    let spaces = line.len() - line.trim_start_matches(' ').len();
    if spaces / INDENT_WIDTH < level {
        None
    } else {
        Some(&line[level * INDENT_WIDTH..])
    }
}
