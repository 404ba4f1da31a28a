use crate::{
    node::{NodeId, NodeValue},
    parsing::{Parser, scanners},
};

/// Raw HTML blocks under the seven start conditions.
pub struct HtmlBlock;

impl HtmlBlock {
    /// Start condition at `pos`. Condition 7 cannot interrupt a paragraph.
    pub fn start(input: &[u8], pos: usize, interrupts_paragraph: bool) -> Option<u8> {
        scanners::html_block_start(input, pos)
            .or_else(|| (!interrupts_paragraph && scanners::html_block_start_7(input, pos)).then_some(7))
    }

    /// Conditions 1-5 run until their end marker, blank lines included;
    /// 6 and 7 end at a blank line.
    pub fn match_prefix(parser: &Parser, container: NodeId) -> bool {
        match &parser.arena[container].value {
            NodeValue::HtmlBlock(data) if data.block_type <= 5 => true,
            _ => !parser.blank,
        }
    }

    /// Whether `line` carries the end marker of a block of `block_type`.
    pub fn ends(block_type: u8, line: &[u8], pos: usize) -> bool {
        (1..=5).contains(&block_type) && scanners::html_block_end(block_type, line, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;

    fn dump(input: &str) -> String {
        parse_document(input.as_bytes(), Options::empty()).dump()
    }

    #[test]
    fn start_conditions() {
        assert_eq!(HtmlBlock::start(b"<script>\n", 0, false), Some(1));
        assert_eq!(HtmlBlock::start(b"<!-- x\n", 0, false), Some(2));
        assert_eq!(HtmlBlock::start(b"<div class=x>\n", 0, true), Some(6));
        assert_eq!(HtmlBlock::start(b"<custom-tag>\n", 0, false), Some(7));
        assert_eq!(HtmlBlock::start(b"<custom-tag>\n", 0, true), None);
    }

    #[test]
    fn comment_block_spans_blank_lines() {
        assert_eq!(
            dump("<!-- a\n\nb -->\nc\n"),
            "document\n  html_block \"<!-- a\\n\\nb -->\\n\"\n  paragraph\n    text \"c\"\n"
        );
    }

    #[test]
    fn div_block_ends_at_blank_line() {
        assert_eq!(
            dump("<div>\n*a*\n\n*b*\n"),
            "document\n  html_block \"<div>\\n*a*\\n\"\n  paragraph\n    emph\n      text \"b\"\n"
        );
    }

    #[test]
    fn condition_seven_does_not_interrupt_paragraph() {
        assert_eq!(
            dump("a\n<x-y>\n"),
            "document\n  paragraph\n    text \"a\"\n    softbreak\n    html_inline \"<x-y>\"\n"
        );
    }
}
