use crate::parsing::{Parser, scanners::at};

use super::is_space_or_tab;

/// `>` block quotes.
pub struct BlockQuote;

impl BlockQuote {
    pub const MARKER: u8 = b'>';

    /// Whether a marker starts at the first non-space position.
    pub fn starts(parser: &Parser, input: &[u8]) -> bool {
        at(input, parser.first_nonspace) == Self::MARKER
    }

    /// Consumes `>` plus one optional following space or tab.
    pub fn match_prefix(parser: &mut Parser, input: &[u8]) -> bool {
        if parser.indent > 3 || !Self::starts(parser, input) {
            return false;
        }
        parser.advance_offset(input, parser.indent + 1, true);
        if is_space_or_tab(at(input, parser.offset)) {
            parser.advance_offset(input, 1, true);
        }
        true
    }

    /// Consumes the marker of a new quote; the caller opens the node.
    pub fn consume_marker(parser: &mut Parser, input: &[u8]) {
        parser.advance_offset(input, parser.first_nonspace + 1 - parser.offset, false);
        if is_space_or_tab(at(input, parser.offset)) {
            parser.advance_offset(input, 1, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;

    fn dump(input: &str) -> String {
        parse_document(input.as_bytes(), Options::empty()).dump()
    }

    #[test]
    fn nested_quotes() {
        assert_eq!(
            dump("> > a\n"),
            "document\n  block_quote\n    block_quote\n      paragraph\n        text \"a\"\n"
        );
    }

    #[test]
    fn lazy_continuation_stays_in_quote() {
        assert_eq!(
            dump("> a\nb\n"),
            "document\n  block_quote\n    paragraph\n      text \"a\"\n      softbreak\n      text \"b\"\n"
        );
    }

    #[test]
    fn four_spaces_is_not_a_quote() {
        assert_eq!(dump("    > a\n"), "document\n  code_block \"> a\\n\"\n");
    }

    #[test]
    fn tab_after_marker_is_partially_consumed() {
        assert_eq!(
            dump(">\t\tfoo\n"),
            "document\n  block_quote\n    code_block \"  foo\\n\"\n"
        );
    }
}
