use crate::{
    buffer::Chunk,
    node::{ExtensionValue, Node, NodeId, NodeKind, NodeValue},
    options::Options,
    parsing::inline::{DelimId, Subject},
};

use super::{Extension, RenderFormat, SyntaxExtension, html_sourcepos};

/// `~text~` and `~~text~~`.
pub struct Strikethrough;

impl Strikethrough {
    pub const TILDE: u8 = b'~';

    /// Longest tilde run scanned at once.
    const MAX_RUN: usize = 100;
}

impl SyntaxExtension for Strikethrough {
    fn name(&self) -> &str {
        "strikethrough"
    }

    fn special_chars(&self) -> &[u8] {
        b"~"
    }

    fn emphasis(&self) -> bool {
        true
    }

    fn match_inline(&self, subject: &mut Subject<'_>, _parent: NodeId, c: u8) -> Option<NodeId> {
        if c != Self::TILDE {
            return None;
        }
        let start = subject.pos();
        let run = subject.scan_delimiters(Self::MAX_RUN, Self::TILDE);
        let text = subject.make_text(start, subject.pos() - 1, Chunk::from(vec![Self::TILDE; run.count]));

        let double_only = subject.options().contains(Options::STRIKETHROUGH_DOUBLE_TILDE);
        let usable = run.count == 2 || (run.count == 1 && !double_only);
        if (run.left_flanking || run.right_flanking) && usable {
            subject.push_delimiter(Self::TILDE, run.left_flanking, run.right_flanking, text);
        }
        Some(text)
    }

    /// Turns the opener's text node into the strikethrough and moves
    /// everything up to the closer inside it. Runs of different lengths
    /// stay literal.
    fn insert_inline_from_delim(
        &self,
        subject: &mut Subject<'_>,
        opener: DelimId,
        closer: DelimId,
    ) -> Option<DelimId> {
        let open = *subject.delimiter(opener);
        let close = *subject.delimiter(closer);
        let next = close.next();
        let opener_inl = open.inl_text();
        let closer_inl = close.inl_text();

        let arena = subject.arena_mut();
        let opener_len = arena.literal(opener_inl).map_or(0, <[u8]>::len);
        let closer_len = arena.literal(closer_inl).map_or(0, <[u8]>::len);
        if opener_len == closer_len && opener_len > 0 {
            let strike = &mut arena[opener_inl];
            strike.value = NodeValue::Extension(ExtensionValue::Strikethrough);
            strike.extension = Some(Extension::Strikethrough);

            let mut tmp = arena.next(opener_inl);
            while let Some(node) = tmp.filter(|&n| n != closer_inl) {
                tmp = arena.next(node);
                arena.unlink(node);
                arena.append_child_unchecked(opener_inl, node);
            }
            let (end_line, end_column) = (arena[closer_inl].end_line, arena[closer_inl].end_column);
            arena[opener_inl].end_line = end_line;
            arena[opener_inl].end_column = end_column;
            arena.free(closer_inl);
        }

        let mut delim = Some(closer);
        while let Some(d) = delim.filter(|&d| d != opener) {
            delim = subject.delimiter(d).previous();
            subject.remove_delimiter(d);
        }
        subject.remove_delimiter(opener);
        next
    }

    fn can_contain(&self, node: &Node, child: NodeKind) -> Option<bool> {
        matches!(node.kind(), NodeKind::Extension(_)).then(|| child.is_inline())
    }

    fn render(
        &self,
        format: RenderFormat,
        arena: &crate::node::Arena,
        node: NodeId,
        entering: bool,
        options: Options,
        out: &mut String,
    ) -> bool {
        match format {
            RenderFormat::Html => {
                if entering {
                    out.push_str("<del");
                    html_sourcepos(arena, node, options, out);
                    out.push('>');
                } else {
                    out.push_str("</del>");
                }
                true
            }
            RenderFormat::CommonMark => {
                out.push_str("~~");
                true
            }
            RenderFormat::Latex => {
                out.push_str(if entering { "\\sout{" } else { "}" });
                true
            }
            RenderFormat::Man => {
                if entering {
                    out.push_str("\n.ST \"");
                } else {
                    out.push_str("\"\n");
                }
                true
            }
            RenderFormat::Plaintext | RenderFormat::Xml => false,
        }
    }

    fn commonmark_escape(&self, node: &Node, c: u8) -> bool {
        c == Self::TILDE && node.kind().is_inline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extensions::render_for_test,
        parsing::{ParsedDoc, parse_document_with},
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(input: &str, options: Options) -> ParsedDoc {
        parse_document_with(input.as_bytes(), options, vec![Extension::Strikethrough])
    }

    fn para(body: &str) -> String {
        format!("document\n  paragraph\n{body}")
    }

    #[rstest]
    #[case("~a~", "    strikethrough\n      text \"a\"\n")]
    #[case("~~a~~", "    strikethrough\n      text \"a\"\n")]
    #[case("~~a~", "    text \"~~a~\"\n")]
    #[case("x ~~~a~~~", "    text \"x ~~~a~~~\"\n")]
    #[case("a ~ b ~ c", "    text \"a ~ b ~ c\"\n")]
    #[case("~*a*~", "    strikethrough\n      emph\n        text \"a\"\n")]
    fn tilde_runs(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse(input, Options::empty()).dump(), para(expected));
    }

    #[test]
    fn double_tilde_option_rejects_single_runs() {
        assert_eq!(
            parse("~a~ ~~b~~", Options::STRIKETHROUGH_DOUBLE_TILDE).dump(),
            para("    text \"~a~ \"\n    strikethrough\n      text \"b\"\n")
        );
    }

    #[test]
    fn tilde_is_looked_through_for_emphasis() {
        assert_eq!(
            parse("*~~a~~*", Options::empty()).dump(),
            para("    emph\n      strikethrough\n        text \"a\"\n")
        );
    }

    #[test]
    fn node_spans_both_runs() {
        let doc = parse("x ~~ab~~\n", Options::empty());
        let para = doc.arena.first_child(doc.root).unwrap();
        let strike = doc.arena.last_child(para).unwrap();
        assert_eq!(doc.arena.type_string(strike), "strikethrough");
        assert_eq!((doc.arena[strike].start_column, doc.arena[strike].end_column), (3, 8));
    }

    #[test]
    fn renders_as_del() {
        let doc = parse("~~a~~", Options::empty());
        assert_eq!(
            render_for_test(&doc, RenderFormat::Html, Options::empty(), &[]),
            "<p><del>a</del></p>\n"
        );
    }

    #[test]
    fn escapes_tildes_in_commonmark() {
        let node = Node::new(NodeValue::Text(Chunk::from("~")));
        assert!(Strikethrough.commonmark_escape(&node, b'~'));
        assert!(!Strikethrough.commonmark_escape(&node, b'|'));
    }
}
