use crate::{
    buffer::is_space,
    node::{HeadingData, NodeId, NodeValue},
    parsing::Parser,
};

use super::{Paragraph, is_space_or_tab};

/// ATX (`#`) and setext (underlined) headings.
pub struct Heading;

impl Heading {
    pub const ATX_MARKER: u8 = b'#';

    /// Opens an ATX heading whose `#` run plus following spaces span
    /// `matched` bytes from the first non-space position.
    pub fn open_atx(parser: &mut Parser, input: &[u8], container: NodeId, matched: usize) -> NodeId {
        let start = parser.first_nonspace;
        parser.advance_offset(input, start + matched - parser.offset, false);
        let level = input[start..]
            .iter()
            .take_while(|&&b| b == Self::ATX_MARKER)
            .count() as u8;
        let heading = parser.add_child(
            container,
            NodeValue::Heading(HeadingData {
                level,
                setext: false,
            }),
            start + 1,
        );
        parser.arena[heading].internal_offset = matched;
        heading
    }

    /// Turns the open paragraph into a setext heading of `level`, after
    /// pulling any leading reference definitions out of it. Returns `false`
    /// when nothing but definitions was left.
    pub fn convert_setext(parser: &mut Parser, input: &[u8], paragraph: NodeId, level: u8) -> bool {
        if !Paragraph::resolve_reference_definitions(parser, paragraph) {
            return false;
        }
        parser.arena[paragraph].value = NodeValue::Heading(HeadingData { level, setext: true });
        parser.advance_offset(input, input.len() - 1 - parser.offset, false);
        true
    }

    /// Length of `line` once an optional closing `#` sequence (preceded by
    /// a space or tab) and surrounding whitespace are cut off.
    pub fn chop_trailing_hashes(line: &[u8]) -> usize {
        let mut len = rtrimmed_len(line);
        if len == 0 {
            return 0;
        }
        let last = len - 1;
        let mut n = last as isize;
        while n >= 0 && line[n as usize] == Self::ATX_MARKER {
            n -= 1;
        }
        if n as usize != last && n >= 0 && is_space_or_tab(line[n as usize]) {
            len = rtrimmed_len(&line[..n as usize]);
        }
        len
    }
}

fn rtrimmed_len(line: &[u8]) -> usize {
    line.iter().rposition(|&b| !is_space(b)).map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn dump(input: &str) -> String {
        parse_document(input.as_bytes(), Options::empty()).dump()
    }

    #[rstest]
    #[case("# foo #\n", 5)]
    #[case("foo ###  \n", 3)]
    #[case("foo#\n", 4)]
    #[case("###\n", 3)]
    #[case("  \n", 0)]
    fn closing_sequence(#[case] line: &str, #[case] len: usize) {
        assert_eq!(Heading::chop_trailing_hashes(line.as_bytes()), len);
    }

    #[test]
    fn atx_levels_and_closing_hashes() {
        assert_eq!(
            dump("## foo ##\n"),
            "document\n  heading level=2\n    text \"foo\"\n"
        );
        assert_eq!(dump("### ###\n"), "document\n  heading level=3\n");
        assert_eq!(
            dump("#5 bolt\n"),
            "document\n  paragraph\n    text \"#5 bolt\"\n"
        );
        assert_eq!(
            dump("####### x\n"),
            "document\n  paragraph\n    text \"####### x\"\n"
        );
    }

    #[test]
    fn setext_converts_the_paragraph() {
        assert_eq!(
            dump("Foo\nbar\n---\n"),
            "document\n  heading level=2 setext\n    text \"Foo\"\n    softbreak\n    text \"bar\"\n"
        );
    }

    #[test]
    fn setext_after_only_definitions_stays_text() {
        assert_eq!(
            dump("[a]: /u\n===\n"),
            "document\n  paragraph\n    text \"===\"\n"
        );
    }

    #[test]
    fn atx_heading_positions() {
        let doc = parse_document(b"# foo #\nbar\n", Options::empty());
        let h = doc.arena.first_child(doc.root).unwrap();
        let n = &doc.arena[h];
        assert_eq!((n.start_line, n.start_column, n.end_line, n.end_column), (1, 1, 1, 5));
    }
}
