// SPDX-License-Identifier: Apache-2.0 OR MIT
use blackprint_markup::{
    default_dictionary, Content, DictionaryConfig, InlineParser, MarkupNode, MarkupParser,
    MarkupRenderer, TagDictionary,
};

fn blk(tag: &str, children: Vec<Content>) -> MarkupNode {
    MarkupNode::block(tag).with_children(children)
}

fn inline(tag: &str, children: Vec<Content>) -> MarkupNode {
    MarkupNode::inline(tag).with_children(children)
}

fn t(text: &str) -> Content {
    Content::from(text)
}

fn n(node: MarkupNode) -> Content {
    Content::Node(node)
}

fn wildcard() -> TagDictionary {
    TagDictionary::new(
        [],
        DictionaryConfig::default()
            .unsafely_allow_any_tags(true)
            .unsafely_skip_sanitization(true)
            .regularize_target("p"),
    )
}

fn dict() -> TagDictionary {
    default_dictionary().extend(
        [],
        DictionaryConfig::default()
            .global_allowed_classes(&["class1", "class2", "class3"])
            .global_allowed_attributes(&["w", "h", "focus"]),
    )
}

#[test]
fn block_split_basic() {
    let text = "
[a] aaaa
    aaaa
    [b] bbbb
        bbbb
[c]
    cccc
pppp
[d]
pppp
        ";
    let dict = wildcard();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            blk(
                "a",
                vec![t("aaaa\n"), t("aaaa\n"), n(blk("b", vec![t("bbbb\n"), t("bbbb")]))]
            ),
            blk("c", vec![t("cccc")]),
            blk("p", vec![t("pppp")]),
            blk("d", vec![]),
            blk("p", vec![t("pppp")]),
        ]
    );
}

#[test]
fn block_split_nested_and_blank_lines() {
    let text = "
[a]
    [b]
        bb
        [c] cc
        [d] dd
        bb
    [e]
        ee

        ee

        [f]

            ff

    aaaa
        aaaa
        aaaa
    aaaa
p1
p2
p3

pp1 asdf
pp2
[g] text
ppp1
        ";
    let dict = wildcard();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            blk(
                "a",
                vec![
                    n(blk(
                        "b",
                        vec![
                            t("bb\n"),
                            n(blk("c", vec![t("cc")])),
                            n(blk("d", vec![t("dd")])),
                            t("bb"),
                        ]
                    )),
                    n(blk(
                        "e",
                        vec![
                            t("ee\n"),
                            t("\n"),
                            t("ee\n"),
                            t("\n"),
                            n(blk("f", vec![t("\n"), t("ff")])),
                        ]
                    )),
                    t("aaaa\n"),
                    t("    aaaa\n"),
                    t("    aaaa\n"),
                    t("aaaa"),
                ]
            ),
            blk("p", vec![t("p1\n"), t("p2\n"), t("p3")]),
            blk("p", vec![t("pp1 asdf\n"), t("pp2")]),
            blk("g", vec![t("text")]),
            blk("p", vec![t("ppp1")]),
        ]
    );
}

#[test]
fn params_and_attributes_inline_first() {
    let text = r#"
[a "/link.html" .class1 .class2: hyperlink]
[h1] Title
[img "/image.jpg" w=100 h="200px" alt="image" .x focus]
[p aa x=1 bb x=2] hi
"#;
    let dict = wildcard();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            blk(
                "p",
                vec![n(inline("a", vec![t("hyperlink")])
                    .with_params(["/link.html"])
                    .with_attribute("class", "class1 class2"))]
            ),
            blk("h1", vec![t("Title")]),
            blk("img", vec![])
                .with_params(["/image.jpg", "focus"])
                .with_attribute("w", "100")
                .with_attribute("h", "200px")
                .with_attribute("alt", "image")
                .with_attribute("class", "x"),
            blk("p", vec![t("hi")])
                .with_params(["aa", "bb"])
                .with_attribute("x", "2"),
        ]
    );
}

#[test]
fn params_and_attributes_nested_inline() {
    let text = r#"
[a "/link.html" .class1 .class2] hyperlink
[h1] Title
[img "/image.jpg" w=100 h="200px" alt="image" .x focus]
[a aa x=1 bb x=2] hi
    [b bb] bbb
    [c:cc][d:dd][e:[f:ff]]
    [g:gg]
"#;
    let dict = wildcard();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            blk("a", vec![t("hyperlink")])
                .with_params(["/link.html"])
                .with_attribute("class", "class1 class2"),
            blk("h1", vec![t("Title")]),
            blk("img", vec![])
                .with_params(["/image.jpg", "focus"])
                .with_attribute("w", "100")
                .with_attribute("h", "200px")
                .with_attribute("alt", "image")
                .with_attribute("class", "x"),
            blk(
                "a",
                vec![
                    t("hi\n"),
                    n(blk("b", vec![t("bbb")]).with_params(["bb"])),
                    n(inline("c", vec![t("cc")])),
                    n(inline("d", vec![t("dd")])),
                    n(inline("e", vec![n(inline("f", vec![t("ff")]))])),
                    t("\n"),
                    n(inline("g", vec![t("gg")])),
                ]
            )
            .with_params(["aa", "bb"])
            .with_attribute("x", "2"),
        ]
    );
}

#[test]
fn inline_tags() {
    let dict = dict();
    let text = r#"hello [code:world]! [a "link.html": click [code:here]]"#;
    assert_eq!(
        InlineParser::new(&dict).parse(text, None),
        vec![
            t("hello "),
            n(inline("code", vec![t("world")])),
            t("! "),
            n(inline("a", vec![t("click "), n(inline("code", vec![t("here")]))])
                .with_params(["link.html"])),
        ]
    );
}

#[test]
fn special_inline_tags() {
    let dict = dict();
    let text = "**bold** text, *em* text, ***bold and em*** text, `code`, ~~del **bold**~~";
    assert_eq!(
        InlineParser::new(&dict).parse(text, None),
        vec![
            n(inline("strong", vec![t("bold")])),
            t(" text, "),
            n(inline("em", vec![t("em")])),
            t(" text, "),
            n(inline("strong", vec![n(inline("em", vec![t("bold and em")]))])),
            t(" text, "),
            n(inline("code", vec![t("code")])),
            t(", "),
            n(inline("del", vec![t("del "), n(inline("strong", vec![t("bold")]))])),
        ]
    );
}

#[test]
fn unknown_tags_stay_literal() {
    let text = "
[unknown] text
[h1] [unknown: foo] bar
[blockquote]
    [unknown2] foo
        [unknown3] bar
        [h2] ignore me for wrong indentation
    [h2] parse me
";
    let dict = dict();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            blk("p", vec![t("[unknown] text")]),
            blk("h1", vec![t("[unknown: foo] bar")]),
            blk(
                "blockquote",
                vec![
                    t("[unknown2] foo\n"),
                    t("    [unknown3] bar\n"),
                    t("    [h2] ignore me for wrong indentation\n"),
                    n(blk("h2", vec![t("parse me")])),
                ]
            ),
        ]
    );
}

#[test]
fn sanitizes_nodes() {
    let text = r#"
[p .class1 .unknownclass] text
[p onload="ignore me"]
    [a "link.html" invalid params title="hello" foobar: link]
    [img "/img.jpg" "ignore me" .ignoreme ignore=me alt="image"]
    [script] doEvil()
    [iframe] evil.tld
"#;
    let dict = dict();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            blk("p", vec![t("text")]).with_attribute("class", "class1"),
            blk(
                "p",
                vec![
                    n(inline("a", vec![t("link")])
                        .with_attribute("href", "link.html")
                        .with_attribute("title", "hello")),
                    t("\n"),
                    n(blk("img", vec![])
                        .with_attribute("src", "/img.jpg")
                        .with_attribute("alt", "image")),
                    t("[script] doEvil()\n"),
                    t("[iframe] evil.tld"),
                ]
            ),
        ]
    );
}

#[test]
fn plain_text_blocks() {
    let text = "
[h1] ~~asdf~~ `code` `[b:hello]`

[code lua]
    for k, v in pairs(t) do
        tbl[k][v] = true
    end
    
    --[[
    [h1] title
    ]]
    
    return tbl

[h1] ~~asdf~~ `code` `[b:hello]`
";
    let heading = blk(
        "h1",
        vec![
            n(inline("del", vec![t("asdf")])),
            t(" "),
            n(inline("code", vec![t("code")])),
            t(" "),
            n(inline("code", vec![t("[b:hello]")])),
        ],
    );
    let dict = dict();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            heading.clone(),
            blk(
                "code",
                vec![
                    t("for k, v in pairs(t) do\n"),
                    t("    tbl[k][v] = true\n"),
                    t("end\n"),
                    t("\n"),
                    t("--[[\n"),
                    t("[h1] title\n"),
                    t("]]\n"),
                    t("\n"),
                    t("return tbl"),
                ]
            )
            .with_attribute("lang", "lua"),
            heading,
        ]
    );
}

#[test]
fn figure_caption_uses_qualified_translation() {
    let text = "[figure]\n    [img \"/a.png\"]\n    [caption] A *nice* picture";
    let dict = dict();
    let tree = MarkupParser::new(&dict).parse(text);
    assert_eq!(
        MarkupRenderer::new(&dict).render_tree(&tree),
        "<figure><img src=\"/a.png\"></img><figcaption>A <em>nice</em> picture</figcaption></figure>"
    );
}

#[test]
fn regularizing_blocks_wrap_paragraphs() {
    let text = "[section]\n    one\n    two\n\n    three\n    [h2] sub";
    let dict = dict();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![blk(
            "section",
            vec![
                n(blk("p", vec![t("one\n"), t("two")])),
                n(blk("p", vec![t("three")])),
                n(blk("h2", vec![t("sub")])),
            ]
        )]
    );
}

#[test]
fn no_content_blocks_drop_their_body() {
    let text = "[img \"/a.png\"] ignored\n    also ignored\nafter";
    let dict = dict();
    assert_eq!(
        MarkupParser::new(&dict).parse(text),
        vec![
            blk("img", vec![]).with_attribute("src", "/a.png"),
            blk("p", vec![t("after")]),
        ]
    );
}

#[test]
fn parsed_trees_are_already_sanitized() {
    let dict = dict();
    let text = "[img \"/a.png\" alt=x]\n[code lua]\n    print(1)\nsee [a \"/post\": here] and [img \"/i.png\"]";
    let tree = MarkupParser::new(&dict).parse(text);
    let mut again = tree.clone();
    dict.sanitize_tree(&mut again);
    assert_eq!(again, tree);

    let renderer = MarkupRenderer::new(&dict);
    assert_eq!(renderer.render_tree(&again), renderer.render_tree(&tree));
}

#[test]
fn renders_simple_tree() {
    let dict = dict();
    let tree = [
        blk("p", vec![t("hello")]),
        blk("h1", vec![t("world")]),
        blk("p", vec![t("foo")]),
    ];
    assert_eq!(
        MarkupRenderer::new(&dict).render_tree(&tree),
        "<p>hello</p><h1>world</h1><p>foo</p>"
    );
}

#[test]
fn renders_newlines_verbatim() {
    let dict = dict();
    let tree = [blk(
        "p",
        vec![
            t("hello\n"),
            n(inline("strong", vec![t("hello")])),
            t("world\n"),
            t("\n"),
            t("foo"),
        ],
    )];
    assert_eq!(
        MarkupRenderer::new(&dict).render_tree(&tree),
        "<p>hello\n<strong>hello</strong>world\n\nfoo</p>"
    );
}

#[test]
fn renders_nested_tree() {
    let dict = dict();
    let tree = [blk(
        "blockquote",
        vec![
            n(blk(
                "blockquote",
                vec![n(blk("p", vec![t("nest1")])), t("nest2")],
            )),
            t("nest3"),
        ],
    )];
    assert_eq!(
        MarkupRenderer::new(&dict).render_tree(&tree),
        "<blockquote><blockquote><p>nest1</p>nest2</blockquote>nest3</blockquote>"
    );
}

#[test]
fn script_never_becomes_an_element() {
    let dict = dict();
    let tree = MarkupParser::new(&dict).parse("[script] doEvil(\"<x>\") & 'y'");
    assert_eq!(
        MarkupRenderer::new(&dict).render_tree(&tree),
        "<p>[script] doEvil(&quot;&lt;x&gt;&quot;) &amp; &#39;y&#39;</p>"
    );
}
