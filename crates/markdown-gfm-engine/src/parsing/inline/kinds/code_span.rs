use crate::{
    buffer::{Buffer, Chunk},
    node::{NodeId, NodeValue},
    parsing::inline::Subject,
};

/// Code span inline type with owned delimiter constant.
///
/// Code spans are raw zones: no other inline parsing happens inside them.
pub struct CodeSpan;

impl CodeSpan {
    /// The backtick character that delimits code spans.
    pub const TICK: u8 = b'`';

    /// Longest opening run for which closers are memoised. Longer runs never
    /// open a span.
    pub const MAX_BACKTICKS: usize = 80;

    /// Parses a backtick run at the cursor as a code span, or as literal
    /// backticks when no closing run of the same length follows.
    pub fn handle(subj: &mut Subject<'_>) -> NodeId {
        let open_start = subj.pos;
        while subj.peek() == Self::TICK {
            subj.advance();
        }
        let open_len = subj.pos - open_start;
        let start = subj.pos;

        let Some(end) = Self::scan_to_closer(subj, open_len) else {
            subj.pos = start;
            let ticks = subj.slice(open_start, start);
            return subj.make_text(open_start, start - 1, ticks);
        };

        let content = Self::normalize(&subj.input[start..end - open_len]);
        let node = subj.make_literal(NodeValue::Code(content), open_start, end - 1);
        subj.adjust_newlines(node, end - start, open_len);
        node
    }

    /// Scans forward for a run of exactly `open_len` backticks and returns
    /// the offset just past it. Every run seen on the way is remembered, so
    /// a failed search is never repeated.
    fn scan_to_closer(subj: &mut Subject<'_>, open_len: usize) -> Option<usize> {
        if open_len > Self::MAX_BACKTICKS {
            return None;
        }
        if subj.scanned_for_backticks && subj.backticks[open_len] <= subj.pos {
            return None;
        }
        loop {
            while !subj.is_eof() && subj.peek() != Self::TICK {
                subj.advance();
            }
            if subj.is_eof() {
                break;
            }
            let run_start = subj.pos;
            while subj.peek() == Self::TICK {
                subj.advance();
            }
            let run = subj.pos - run_start;
            if run <= Self::MAX_BACKTICKS {
                subj.backticks[run] = run_start;
            }
            if run == open_len {
                return Some(subj.pos);
            }
        }
        subj.scanned_for_backticks = true;
        None
    }

    /// Line ends become spaces; one space is stripped from each end when
    /// both ends have one and the content is not all spaces.
    fn normalize(raw: &[u8]) -> Chunk {
        let mut buf = Buffer::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            match raw[i] {
                b'\r' if raw.get(i + 1) == Some(&b'\n') => {}
                b'\r' | b'\n' => buf.putc(b' '),
                b => buf.putc(b),
            }
            i += 1;
        }
        let bytes = buf.as_bytes();
        let strip = bytes.len() >= 2
            && bytes[0] == b' '
            && bytes[bytes.len() - 1] == b' '
            && bytes.iter().any(|&b| b != b' ');
        if strip {
            buf.truncate(buf.len() - 1);
            buf.drop_prefix(1);
        }
        buf.detach()
    }
}

#[cfg(test)]
mod tests {
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn dump(input: &str) -> String {
        parse_document(input.as_bytes(), Options::empty()).dump()
    }

    #[rstest]
    #[case("`a`", "    code \"a\"\n")]
    #[case("`` a`b ``", "    code \"a`b\"\n")]
    #[case("` `` `", "    code \"``\"\n")]
    #[case("`  `", "    code \"  \"\n")]
    #[case("`a\nb`", "    code \"a b\"\n")]
    #[case("`*a*`", "    code \"*a*\"\n")]
    #[case("``a`", "    text \"``a`\"\n")]
    #[case("`a``b", "    text \"`a``b\"\n")]
    fn code_spans(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(dump(input), format!("document\n  paragraph\n{expected}"));
    }

    #[test]
    fn backslashes_are_literal_inside() {
        assert_eq!(
            dump("`a\\`b"),
            "document\n  paragraph\n    code \"a\\\\\"\n    text \"b\"\n"
        );
    }

    #[test]
    fn span_positions_cover_the_ticks() {
        let doc = parse_document(b"x `ab` y\n", Options::empty());
        let para = doc.arena.first_child(doc.root).unwrap();
        let code = doc.arena.next(doc.arena.first_child(para).unwrap()).unwrap();
        assert_eq!((doc.arena[code].start_column, doc.arena[code].end_column), (3, 6));
    }

    #[test]
    fn multi_line_span_moves_the_line() {
        let doc = parse_document(b"`a\nbc` *d*\n", Options::empty());
        let para = doc.arena.first_child(doc.root).unwrap();
        let code = doc.arena.first_child(para).unwrap();
        assert_eq!((doc.arena[code].end_line, doc.arena[code].end_column), (2, 2));
        let emph = doc.arena.last_child(para).unwrap();
        assert_eq!(
            (doc.arena[emph].start_line, doc.arena[emph].start_column, doc.arena[emph].end_column),
            (2, 5, 7)
        );
    }

    #[test]
    fn unclosed_run_leaves_later_spans_intact() {
        assert_eq!(
            dump("```a `b`"),
            "document\n  paragraph\n    text \"```a \"\n    code \"b\"\n"
        );
    }
}
