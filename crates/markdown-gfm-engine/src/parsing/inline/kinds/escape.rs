use crate::{
    node::{NodeId, NodeValue},
    parsing::{inline::Subject, scanners::is_line_end},
};

/// Backslash escapes.
pub struct Escape;

impl Escape {
    pub const BACKSLASH: u8 = b'\\';

    /// `\` before ASCII punctuation yields the punctuation as text; before
    /// a line end it is a hard break; anywhere else it is a literal `\`.
    pub fn handle(subj: &mut Subject<'_>) -> NodeId {
        subj.advance();
        let next = subj.peek();
        if next.is_ascii_punctuation() {
            subj.advance();
            let text = subj.slice(subj.pos - 1, subj.pos);
            return subj.make_text(subj.pos - 2, subj.pos - 1, text);
        }
        if is_line_end(next) && !subj.is_eof() {
            if next == b'\r' {
                subj.advance();
            }
            if subj.peek() == b'\n' {
                subj.advance();
            }
            subj.line += 1;
            subj.column_offset = -(subj.pos as isize);
            return subj.arena.alloc_value(NodeValue::LineBreak);
        }
        subj.make_text(subj.pos - 1, subj.pos - 1, "\\".into())
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
    #[case(r"\*a\*", "    text \"*a*\"\n")]
    #[case(r"\a", "    text \"\\\\a\"\n")]
    #[case(r"\\*a*", "    text \"\\\\\"\n    emph\n      text \"a\"\n")]
    #[case("a\\", "    text \"a\\\\\"\n")]
    #[case("a\\\nb", "    text \"a\"\n    linebreak\n    text \"b\"\n")]
    #[case(r"\[a](b)", "    text \"[a](b)\"\n")]
    fn escapes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(dump(input), format!("document\n  paragraph\n{expected}"));
    }
}
