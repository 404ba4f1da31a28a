use crate::parsing::{Parser, scanners::at};

/// `***`, `---` and `___` rules.
pub struct ThematicBreak;

impl ThematicBreak {
    pub const MARKERS: &'static [u8] = b"*-_";

    /// Length of a rule starting at `offset`, through the line end. On
    /// failure records where scanning stopped, so that later attempts on
    /// the same line can be skipped.
    pub fn scan(parser: &mut Parser, input: &[u8], offset: usize) -> usize {
        let c = at(input, offset);
        if !Self::MARKERS.contains(&c) {
            parser.thematic_break_kill_pos = offset;
            return 0;
        }
        let mut count = 1;
        let mut i = offset + 1;
        let mut next = at(input, i);
        while next != 0 {
            if next == c {
                count += 1;
            } else if next != b' ' && next != b'\t' {
                break;
            }
            i += 1;
            next = at(input, i);
        }
        if count >= 3 && (next == b'\r' || next == b'\n') {
            i - offset + 1
        } else {
            parser.thematic_break_kill_pos = i;
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("***\n", 4)]
    #[case("- - -\n", 6)]
    #[case("_ _ _ _\n", 8)]
    #[case("--\n", 0)]
    #[case("**-\n", 0)]
    #[case("---a\n", 0)]
    fn rule_shapes(#[case] line: &str, #[case] len: usize) {
        let mut parser = Parser::new(Options::empty());
        assert_eq!(ThematicBreak::scan(&mut parser, line.as_bytes(), 0), len);
    }

    #[test]
    fn failure_records_kill_position() {
        let mut parser = Parser::new(Options::empty());
        ThematicBreak::scan(&mut parser, b"* * x\n", 0);
        assert_eq!(parser.thematic_break_kill_pos, 4);
    }

    #[test]
    fn rule_inside_list_item_wins_over_new_item() {
        assert_eq!(
            parse_document(b"* a\n* * *\n", Options::empty()).dump(),
            "document\n  list bullet '*' tight\n    item\n      paragraph\n        text \"a\"\n  thematic_break\n"
        );
    }
}
