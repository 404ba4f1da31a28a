use std::rc::Rc;

use crate::{
    buffer::Chunk,
    node::{FootnoteReferenceData, LinkData, Node, NodeId, NodeKind, NodeValue},
    options::Options,
    parsing::scanners::{at, link_title, spacechars},
};

use super::{
    Cursor, Subject,
    links::{clean_title, clean_url, link_label, scan_link_url},
};

/// An unclosed `[` or `![` waiting for its `]`.
#[derive(Debug, Clone, Copy)]
pub(super) struct Bracket {
    /// The `[` / `![` text node standing in for the opener.
    pub(super) inl_text: NodeId,
    /// Input offset just past the opener.
    pub(super) position: usize,
    pub(super) image: bool,
    /// Another bracket was opened after this one.
    pub(super) bracket_after: bool,
    pub(super) in_bracket_image0: bool,
    pub(super) in_bracket_image1: bool,
}

impl Subject<'_> {
    pub(super) fn push_bracket(&mut self, image: bool, inl_text: NodeId) {
        let mut bracket = Bracket {
            inl_text,
            position: self.pos,
            image,
            bracket_after: false,
            in_bracket_image0: false,
            in_bracket_image1: false,
        };
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
            bracket.in_bracket_image0 = last.in_bracket_image0;
            bracket.in_bracket_image1 = last.in_bracket_image1;
        }
        if image {
            bracket.in_bracket_image1 = true;
        } else {
            bracket.in_bracket_image0 = true;
            self.no_link_openers = false;
        }
        self.brackets.push(bracket);
    }

    /// Handles `]`: closes the innermost bracket as a link, image or
    /// footnote reference, or yields a literal `]`. Returns `None` when the
    /// bracket's nodes were rewritten in place.
    pub(super) fn handle_close_bracket(&mut self) -> Option<NodeId> {
        self.advance();
        let initial_pos = self.pos;

        let Some(opener) = self.brackets.last().copied() else {
            return Some(self.make_text(self.pos - 1, self.pos - 1, Chunk::from("]")));
        };
        if !opener.image && self.no_link_openers {
            self.brackets.pop();
            return Some(self.make_text(self.pos - 1, self.pos - 1, Chunk::from("]")));
        }

        let target = self.inline_link_target().or_else(|| {
            self.pos = initial_pos;
            self.reference_target(&opener, initial_pos)
        });
        if let Some(link) = target {
            self.close_link(&opener, link);
            return None;
        }

        self.pos = initial_pos;
        if self.options.contains(Options::FOOTNOTES) && self.is_footnote_opener(&opener) {
            self.close_footnote_reference(&opener, initial_pos);
            return None;
        }

        self.brackets.pop();
        Some(self.make_text(self.pos - 1, self.pos - 1, Chunk::from("]")))
    }

    /// `(destination "title")` right after the `]`. Moves the cursor past
    /// the `)` on success.
    fn inline_link_target(&mut self) -> Option<LinkData> {
        let input = Rc::clone(&self.input);
        if at(&input, self.pos) != b'(' {
            return None;
        }
        let sps = spacechars(&input, self.pos + 1);
        let (url_len, url) = scan_link_url(&input, self.pos + 1 + sps)?;
        let end_url = self.pos + 1 + sps + url_len;
        let start_title = end_url + spacechars(&input, end_url);
        let end_title = if start_title == end_url {
            start_title
        } else {
            start_title + link_title(&input, start_title)
        };
        let end_all = end_title + spacechars(&input, end_title);
        if at(&input, end_all) != b')' {
            return None;
        }
        self.pos = end_all + 1;
        Some(LinkData {
            url: clean_url(&input[url]),
            title: clean_title(&input[start_title..end_title]),
        })
    }

    /// Full, collapsed or shortcut reference.
    fn reference_target(&mut self, opener: &Bracket, initial_pos: usize) -> Option<LinkData> {
        let input = Rc::clone(&self.input);
        let mut cur = Cursor::at_pos(&input, self.pos);
        let mut label = link_label(&mut cur);
        if label.is_some() {
            self.pos = cur.pos();
        } else {
            self.pos = initial_pos;
        }
        if label.is_none_or(<[u8]>::is_empty) && !opener.bracket_after {
            label = Some(&input[opener.position..initial_pos - 1]);
        }
        let reference = self.refmap.lookup(label?)?;
        Some(LinkData {
            url: reference.url.clone(),
            title: reference.title.clone(),
        })
    }

    fn close_link(&mut self, opener: &Bracket, data: LinkData) {
        let value = if opener.image {
            NodeValue::Image(data)
        } else {
            NodeValue::Link(data)
        };
        let link = self.alloc_spanning(value, opener.inl_text);
        self.arena.insert_before_unchecked(opener.inl_text, link);

        let mut child = self.arena.next(opener.inl_text);
        while let Some(id) = child {
            child = self.arena.next(id);
            self.arena.unlink(id);
            self.arena.append_child_unchecked(link, id);
        }

        self.arena.free(opener.inl_text);
        self.process_emphasis(opener.position);
        self.brackets.pop();
        if !opener.image {
            self.no_link_openers = true;
        }
    }

    /// `[^label]` with something after the caret.
    fn is_footnote_opener(&self, opener: &Bracket) -> bool {
        let Some(next) = self.arena.next(opener.inl_text) else {
            return false;
        };
        if self.arena.kind(next) != NodeKind::Text {
            return false;
        }
        let text = self.arena.literal(next).unwrap_or_default();
        text.first() == Some(&b'^') && (text.len() > 1 || self.arena.next(next).is_some())
    }

    fn close_footnote_reference(&mut self, opener: &Bracket, initial_pos: usize) {
        let label = self.slice(opener.position + 1, initial_pos - 1);
        let fnref = self.alloc_spanning(
            NodeValue::FootnoteReference(FootnoteReferenceData {
                label,
                ix: 0,
                ref_ix: 0,
            }),
            opener.inl_text,
        );
        self.arena.insert_before_unchecked(opener.inl_text, fnref);
        self.process_emphasis(opener.position);

        // The label text may have been split by extensions; it is all
        // carried by the reference now.
        let mut child = self.arena.next(opener.inl_text);
        while let Some(id) = child {
            child = self.arena.next(id);
            self.arena.free(id);
        }
        self.arena.free(opener.inl_text);
        self.brackets.pop();
    }

    /// A node running from the opener's first column to the byte before
    /// the cursor.
    fn alloc_spanning(&mut self, value: NodeValue, opener_text: NodeId) -> NodeId {
        let mut node = Node::new(value);
        node.start_line = self.line;
        node.end_line = self.line;
        node.start_column = self.arena[opener_text].start_column;
        node.end_column = self.column(self.pos - 1);
        self.arena.alloc(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        options::Options,
        parsing::{parse_document, parse_document_with},
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn dump(input: &str) -> String {
        parse_document(input.as_bytes(), Options::empty()).dump()
    }

    fn para(body: &str) -> String {
        format!("document\n  paragraph\n{body}")
    }

    #[rstest]
    #[case("[a](/u)", "    link url=\"/u\"\n      text \"a\"\n")]
    #[case("[a](/u \"t\")", "    link url=\"/u\" title=\"t\"\n      text \"a\"\n")]
    #[case("[a](<b c>)", "    link url=\"b c\"\n      text \"a\"\n")]
    #[case("[a]( /u\n'tt' )", "    link url=\"/u\" title=\"tt\"\n      text \"a\"\n")]
    #[case("![i](/p.png)", "    image url=\"/p.png\"\n      text \"i\"\n")]
    #[case("[a]()", "    link url=\"\"\n      text \"a\"\n")]
    #[case("[a](/u\"t\")", "    link url=\"/u\\\"t\\\"\"\n      text \"a\"\n")]
    fn inline_links(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(dump(input), para(expected));
    }

    #[rstest]
    #[case("[x][Ref]")]
    #[case("[ref][]")]
    #[case("[ref]")]
    fn reference_links(#[case] link: &str) {
        let input = format!("{link}\n\n[ref]: /r \"T\"\n");
        let text = if link.starts_with("[x]") { "x" } else { "ref" };
        assert_eq!(
            dump(&input),
            para(&format!("    link url=\"/r\" title=\"T\"\n      text \"{text}\"\n"))
        );
    }

    #[test]
    fn undefined_reference_stays_text() {
        assert_eq!(dump("[a][b]"), para("    text \"[a][b]\"\n"));
    }

    #[test]
    fn links_do_not_nest() {
        assert_eq!(
            dump("[a [b](/i)](/o)"),
            para(
                "    text \"[a \"\n    link url=\"/i\"\n      text \"b\"\n    text \"](/o)\"\n"
            )
        );
    }

    #[test]
    fn images_may_hold_links() {
        assert_eq!(
            dump("![a [b](/i)](/o)"),
            para(
                "    image url=\"/o\"\n      text \"a \"\n      link url=\"/i\"\n        text \"b\"\n"
            )
        );
    }

    #[test]
    fn emphasis_inside_link_text() {
        assert_eq!(
            dump("[*a*](/u)*"),
            para("    link url=\"/u\"\n      emph\n        text \"a\"\n    text \"*\"\n")
        );
    }

    #[test]
    fn unmatched_close_bracket() {
        assert_eq!(dump("a]"), para("    text \"a]\"\n"));
    }

    #[test]
    fn link_spans_its_source() {
        let doc = parse_document(b"x [a](/u) y\n", Options::empty());
        let para = doc.arena.first_child(doc.root).unwrap();
        let link = doc.arena.next(doc.arena.first_child(para).unwrap()).unwrap();
        assert_eq!((doc.arena[link].start_column, doc.arena[link].end_column), (3, 9));
    }

    #[test]
    fn caret_labels_are_plain_references_without_footnotes() {
        assert_eq!(
            dump("a[^1]\n\n[^1]: b\n"),
            para("    text \"a\"\n    link url=\"b\"\n      text \"^1\"\n")
        );
    }

    #[test]
    fn footnote_reference() {
        let doc = parse_document_with(b"a[^n]\n\n[^n]: b\n", Options::FOOTNOTES, Vec::new());
        assert_eq!(
            doc.dump(),
            "document\n  paragraph\n    text \"a\"\n    footnote_reference label=\"n\" ix=1 ref_ix=1\n  footnote_definition label=\"n\" ix=1 refs=1\n    paragraph\n      text \"b\"\n"
        );
    }
}
