//! Whole-pipeline properties: emphasis pairing, list tightness, reference
//! resolution, nesting limits, extension isolation, chunked input and a
//! CommonMark write-back that must reparse to the same tree.

use insta::assert_snapshot;
use markdown_gfm_engine::{
    Arena, EventType, Extension, ListDelim, ListType, NodeId, NodeKind, NodeValue, Options,
    Parser, core_extensions, parse_document, parse_document_with, parsing::snapshot,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn dump(input: &str) -> String {
    let doc = parse_document(input.as_bytes(), Options::empty());
    snapshot::invariants(&doc.arena, doc.root);
    doc.dump()
}

#[test]
fn double_star_is_strong() {
    assert_snapshot!(dump("**a**"), @r#"
    document
      paragraph
        strong
          text "a"
    "#);
}

#[test]
fn triple_star_is_strong_inside_emph() {
    assert_snapshot!(dump("***a***"), @r#"
    document
      paragraph
        emph
          strong
            text "a"
    "#);
}

#[test]
fn intraword_triple_runs_pair_as_multiples_of_three() {
    assert_snapshot!(dump("a***b***c"), @r#"
    document
      paragraph
        text "a"
        emph
          strong
            text "b"
        text "c"
    "#);
}

#[test]
fn both_flanking_run_splits_across_openers() {
    assert_snapshot!(dump("a**b***c*"), @r#"
    document
      paragraph
        text "a"
        strong
          text "b"
        emph
          text "c"
    "#);
}

#[test]
fn rule_of_three_blocks_a_closer() {
    assert_snapshot!(dump("*foo**bar*"), @r#"
    document
      paragraph
        emph
          text "foo**bar"
    "#);
}

#[rstest]
#[case("- a\n- b\n", true)]
#[case("- a\n\n- b\n", false)]
#[case("- a\n\n  b\n", false)]
#[case("- a\n  - b\n\n  c\n", false)]
#[case("1. a\n2. b\n\n", true)]
#[case("- a\n  > q\n- b\n", true)]
fn outer_list_tightness(#[case] input: &str, #[case] tight: bool) {
    let doc = parse_document(input.as_bytes(), Options::empty());
    let list = doc.arena.first_child(doc.root).unwrap();
    assert_eq!(doc.arena.list_tight(list), Some(tight), "{}", doc.dump());
}

#[test]
fn defined_reference_becomes_a_link() {
    assert_snapshot!(dump("[x]: /url \"t\"\n\n[x]\n"), @r#"
    document
      paragraph
        link url="/url" title="t"
          text "x"
    "#);
}

#[test]
fn undefined_reference_stays_literal() {
    assert_snapshot!(dump("[x]: /url\n\n[y] and [x][y]\n"), @r#"
    document
      paragraph
        text "[y] and [x][y]"
    "#);
}

#[test]
fn labels_fold_case_and_whitespace() {
    assert_snapshot!(dump("[Foo  Bar]: /fb\n\n[foo bar][] and [FOO\nBAR]\n"), @r#"
    document
      paragraph
        link url="/fb"
          text "foo bar"
        text " and "
        link url="/fb"
          text "FOO"
          softbreak
          text "BAR"
    "#);
}

#[test]
fn ten_thousand_list_markers_stay_shallow() {
    let input = "- ".repeat(10_000) + "x\n";
    let doc = parse_document(input.as_bytes(), Options::empty());
    snapshot::invariants(&doc.arena, doc.root);

    let mut depth = 0usize;
    let mut deepest = 0usize;
    for (event, node) in doc.iter() {
        if doc.arena.kind(node) != NodeKind::List {
            continue;
        }
        match event {
            EventType::Enter => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            EventType::Exit => depth -= 1,
        }
    }
    assert!(deepest < 100, "{deepest} nested lists");

    let text = doc
        .iter()
        .filter(|(event, _)| *event == EventType::Enter)
        .find_map(|(_, node)| match &doc.arena[node].value {
            NodeValue::Text(s) => Some(s.as_bytes().to_vec()),
            _ => None,
        })
        .unwrap();
    assert!(text.starts_with(b"- "));
    assert!(text.ends_with(b"x"));
}

#[rstest]
#[case("plain paragraph\n")]
#[case("# heading\n\n- a\n- b\n")]
#[case("a\n---\n")]
#[case("> quote\n>\n> more\n")]
#[case("```\ncode\n```\n")]
#[case("*a* **b** `c` [d](/e)\n")]
#[case("1. one\n\n   two\n")]
fn table_extension_is_inert_without_pipes(#[case] input: &str) {
    let with = parse_document_with(input.as_bytes(), Options::empty(), vec![Extension::Table]);
    let without = parse_document(input.as_bytes(), Options::empty());
    assert_eq!(with.dump(), without.dump());
}

#[test]
fn footnotes_follow_first_citation_order() {
    let input = "[^c] then [^a]\n\n[^a]: A\n[^b]: B\n[^c]: C\n\nagain [^a]\n";
    let doc = parse_document(input.as_bytes(), Options::FOOTNOTES);
    let labels: Vec<(String, usize, usize)> = doc
        .arena
        .children(doc.root)
        .filter_map(|node| match &doc.arena[node].value {
            NodeValue::FootnoteDefinition(data) => Some((
                String::from_utf8_lossy(data.label.as_bytes()).into_owned(),
                data.ix,
                data.def_count,
            )),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        vec![("c".to_string(), 1, 1), ("a".to_string(), 2, 2)]
    );
}

#[rstest]
fn chunked_input_parses_identically(#[values(1, 2, 3, 7, 64)] chunk: usize) {
    let input = "# T\r\n\r\n| a | b |\r\n|---|---|\r\n| 1 | 2 |\r\n\r\n- [ ] task ~~x~~\r\n  > q\tr\r\n\r\n[r]: /u\r\n[r] www.a.com\r\n";
    let whole = parse_document_with(input.as_bytes(), Options::empty(), core_extensions());

    let mut parser = Parser::with_extensions(Options::empty(), core_extensions());
    for piece in input.as_bytes().chunks(chunk) {
        parser.feed(piece);
    }
    let streamed = parser.finish();
    snapshot::invariants(&streamed.arena, streamed.root);
    assert_eq!(streamed.dump(), whole.dump());
}

#[test]
fn arbitrary_input_keeps_the_tree_consistent() {
    const ALPHABET: &[u8] = b"ab *_~`[]()<>!|-#>:\\&;\"'.1 \t\n\n\r\0\xc3\xa9@w";
    let options = Options::SMART | Options::FOOTNOTES | Options::VALIDATE_UTF8;
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..500 {
        let mut input = Vec::new();
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let len = (seed % 160) as usize;
        for _ in 0..len {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            input.push(ALPHABET[(seed % ALPHABET.len() as u64) as usize]);
        }
        let doc = parse_document_with(&input, options, core_extensions());
        snapshot::invariants(&doc.arena, doc.root);
    }
}

/// CommonMark for the node shapes the round-trip document uses.
struct Writer<'a> {
    arena: &'a Arena,
}

impl Writer<'_> {
    fn blocks(&self, parent: NodeId, separator: &str) -> String {
        self.arena
            .children(parent)
            .map(|node| self.block(node))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn block(&self, node: NodeId) -> String {
        match &self.arena[node].value {
            NodeValue::Paragraph => self.inlines(node),
            NodeValue::Heading(data) => {
                format!("{} {}", "#".repeat(data.level as usize), self.inlines(node))
            }
            NodeValue::ThematicBreak => "***".to_string(),
            NodeValue::CodeBlock(data) => format!(
                "```{}\n{}```",
                String::from_utf8_lossy(data.info.as_bytes()),
                String::from_utf8_lossy(data.literal.as_bytes())
            ),
            NodeValue::BlockQuote => self
                .blocks(node, "\n\n")
                .lines()
                .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
                .collect::<Vec<_>>()
                .join("\n"),
            NodeValue::List(data) => {
                let separator = if data.tight { "\n" } else { "\n\n" };
                self.arena
                    .children(node)
                    .enumerate()
                    .map(|(i, item)| {
                        let marker = match (data.list_type, data.delimiter) {
                            (ListType::Bullet, _) => format!("{} ", char::from(data.bullet_char)),
                            (ListType::Ordered, ListDelim::Paren) => format!("{}) ", data.start + i),
                            (ListType::Ordered, _) => format!("{}. ", data.start + i),
                        };
                        let pad = " ".repeat(marker.len());
                        self.blocks(item, "\n\n")
                            .lines()
                            .enumerate()
                            .map(|(n, line)| match (n, line.is_empty()) {
                                (0, _) => format!("{marker}{line}"),
                                (_, true) => String::new(),
                                (_, false) => format!("{pad}{line}"),
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .collect::<Vec<_>>()
                    .join(separator)
            }
            other => panic!("no writer for {other:?}"),
        }
    }

    fn inlines(&self, parent: NodeId) -> String {
        self.arena.children(parent).map(|node| self.inline(node)).collect()
    }

    fn inline(&self, node: NodeId) -> String {
        match &self.arena[node].value {
            NodeValue::Text(s) => String::from_utf8_lossy(s.as_bytes())
                .chars()
                .map(|c| {
                    if c.is_ascii_punctuation() {
                        format!("\\{c}")
                    } else {
                        c.to_string()
                    }
                })
                .collect(),
            NodeValue::SoftBreak => "\n".to_string(),
            NodeValue::LineBreak => "\\\n".to_string(),
            NodeValue::Code(s) => format!("`{}`", String::from_utf8_lossy(s.as_bytes())),
            NodeValue::Emph => format!("*{}*", self.inlines(node)),
            NodeValue::Strong => format!("**{}**", self.inlines(node)),
            NodeValue::Link(data) | NodeValue::Image(data) => {
                let bang = if matches!(self.arena[node].value, NodeValue::Image(_)) { "!" } else { "" };
                let title = if data.title.is_empty() {
                    String::new()
                } else {
                    format!(" \"{}\"", String::from_utf8_lossy(data.title.as_bytes()))
                };
                format!(
                    "{bang}[{}](<{}>{title})",
                    self.inlines(node),
                    String::from_utf8_lossy(data.url.as_bytes())
                )
            }
            other => panic!("no writer for {other:?}"),
        }
    }
}

#[test]
fn written_commonmark_reparses_to_the_same_tree() {
    let input = "# Title *here*\n\nSome *emph*, **strong** and `code` text.\nNext line, café — naïve ✓.\n\n> quoted\n> lines\n\n- one\n- two\n\n3. three\n4. four\n\n```rust\nfn x() {}\n```\n\n***\n\n[a link](/u \"t\") and ![img](/i.png)\n";
    let first = parse_document(input.as_bytes(), Options::empty());
    let written = Writer { arena: &first.arena }.blocks(first.root, "\n\n") + "\n";
    let second = parse_document(written.as_bytes(), Options::empty());
    assert_eq!(second.dump(), first.dump(), "{written}");
}
