use crate::{
    node::{Arena, NodeId, NodeKind},
    options::Options,
    parsing::{Parser, scanners::at},
};

use super::{Extension, RenderFormat, SyntaxExtension, html_cr, html_sourcepos};

/// `- [ ]` and `- [x]` list items.
pub struct TaskList;

impl TaskList {
    /// Length of `[ ]`.
    const MARKER_LEN: usize = 3;

    /// The task state of a `[ ]`, `[x]` or `[X]` marker at `pos` that is
    /// followed by whitespace.
    fn scan_marker(line: &[u8], pos: usize) -> Option<bool> {
        if at(line, pos) != b'[' || at(line, pos + 2) != b']' {
            return None;
        }
        let checked = match at(line, pos + 1) {
            b' ' => false,
            b'x' | b'X' => true,
            _ => return None,
        };
        matches!(at(line, pos + 3), b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c).then_some(checked)
    }
}

impl SyntaxExtension for TaskList {
    fn name(&self) -> &str {
        "tasklist"
    }

    /// Claims the marker at the start of an item opened on this line. The
    /// item stays the container, so this never opens a block.
    fn try_open_block(
        &self,
        parser: &mut Parser,
        indented: bool,
        container: NodeId,
        line: &[u8],
    ) -> Option<NodeId> {
        let item = &parser.arena()[container];
        if indented
            || item.kind() != NodeKind::Item
            || item.first_child().is_some()
            || item.start_line != parser.line_number()
        {
            return None;
        }
        let checked = Self::scan_marker(line, parser.first_nonspace())?;
        let arena = parser.arena_mut();
        if arena.set_checked(container, checked).is_err() {
            return None;
        }
        arena[container].extension = Some(Extension::TaskList);
        log::trace!("task item at line {}, checked={checked}", parser.line_number());
        let count = parser.first_nonspace() + Self::MARKER_LEN - parser.offset();
        parser.advance_offset(line, count, false);
        None
    }

    fn render(
        &self,
        format: RenderFormat,
        arena: &Arena,
        node: NodeId,
        entering: bool,
        options: Options,
        out: &mut String,
    ) -> bool {
        if format != RenderFormat::Html || arena.kind(node) != NodeKind::Item {
            return false;
        }
        if entering {
            html_cr(out);
            out.push_str("<li");
            html_sourcepos(arena, node, options, out);
            out.push('>');
            if arena.checked(node) == Some(true) {
                out.push_str("<input type=\"checkbox\" checked=\"\" disabled=\"\" /> ");
            } else {
                out.push_str("<input type=\"checkbox\" disabled=\"\" /> ");
            }
        } else {
            out.push_str("</li>\n");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{ParsedDoc, parse_document_with};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(input: &str) -> ParsedDoc {
        parse_document_with(input.as_bytes(), Options::empty(), vec![Extension::TaskList])
    }

    #[test]
    fn items_record_their_state() {
        assert_eq!(
            parse("- [ ] todo\n- [x] done\n- [X] also\n- plain\n").dump(),
            "document\n  list bullet '-' tight\n    item unchecked\n      paragraph\n        text \"todo\"\n    item checked\n      paragraph\n        text \"done\"\n    item checked\n      paragraph\n        text \"also\"\n    item\n      paragraph\n        text \"plain\"\n"
        );
    }

    #[rstest]
    #[case("- [ ]x\n")]
    #[case("- [y] no\n")]
    #[case("- a [ ] b\n")]
    #[case("[ ] no list\n")]
    #[case("-     [ ] indented code\n")]
    fn not_task_items(#[case] input: &str) {
        let doc = parse(input);
        assert!(!doc.dump().contains("checked"), "{}", doc.dump());
    }

    #[test]
    fn ordered_and_nested_items() {
        let out = parse("1. [x] one\n   - [ ] inner\n").dump();
        assert!(out.contains("    item checked\n"));
        assert!(out.contains("        item unchecked\n"));
    }

    #[test]
    fn continuation_lines_keep_the_item() {
        assert_eq!(
            parse("- [ ] a\n  b\n").dump(),
            "document\n  list bullet '-' tight\n    item unchecked\n      paragraph\n        text \"a\"\n        softbreak\n        text \"b\"\n"
        );
    }

    #[test]
    fn renders_a_disabled_checkbox() {
        let doc = parse("- [x] done\n");
        let html = crate::extensions::render_for_test(&doc, RenderFormat::Html, Options::empty(), &[]);
        assert!(
            html.contains("<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> "),
            "{html}"
        );
        assert!(html.contains("done"));
    }

    #[test]
    fn marker_scanner() {
        assert_eq!(TaskList::scan_marker(b"[ ] a", 0), Some(false));
        assert_eq!(TaskList::scan_marker(b"[x]\n", 0), Some(true));
        assert_eq!(TaskList::scan_marker(b"[x]", 0), None);
        assert_eq!(TaskList::scan_marker(b"[-] a", 0), None);
    }
}
