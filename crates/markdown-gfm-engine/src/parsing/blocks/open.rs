use std::rc::Rc;

use crate::{
    extensions::SyntaxExtension,
    node::{NodeId, NodeKind, NodeValue},
    options::Options,
    parsing::{Parser, scanners},
};

use super::{
    CODE_INDENT, MAX_LIST_DEPTH,
    kinds::{BlockQuote, CodeFence, FootnoteDefinition, Heading, HtmlBlock, ListItem, ListMarker, ThematicBreak},
};

impl Parser {
    /// Opens as many new blocks as the rest of the line starts, beginning
    /// under `container`, and returns the innermost one.
    ///
    /// Block starts are tried in a fixed order; attached extensions get the
    /// line only when no built-in start matched.
    pub(crate) fn open_new_blocks(&mut self, mut container: NodeId, input: &[u8], all_matched: bool) -> NodeId {
        let mut maybe_lazy = self.arena.kind(self.current) == NodeKind::Paragraph;
        let mut cont_kind = self.arena.kind(container);
        let mut depth = 0;

        while !matches!(cont_kind, NodeKind::CodeBlock | NodeKind::HtmlBlock) {
            depth += 1;
            if depth == MAX_LIST_DEPTH {
                log::warn!("line {}: nesting reached {MAX_LIST_DEPTH}, no deeper list items", self.line_number);
            }
            self.find_first_nonspace(input);
            let indented = self.indent >= CODE_INDENT;
            let fns = self.first_nonspace;
            let is_paragraph = cont_kind == NodeKind::Paragraph;

            if !indented && BlockQuote::starts(self, input) {
                BlockQuote::consume_marker(self, input);
                container = self.add_child(container, NodeValue::BlockQuote, fns + 1);
            } else if let Some(matched) = (!indented)
                .then(|| scanners::atx_heading_start(input, fns))
                .filter(|&m| m > 0)
            {
                container = Heading::open_atx(self, input, container, matched);
            } else if let Some(matched) = (!indented)
                .then(|| scanners::open_code_fence(input, fns))
                .filter(|&m| m > 0)
            {
                container = CodeFence::open_fenced(self, input, container, matched);
            } else if let Some(block_type) = (!indented)
                .then(|| HtmlBlock::start(input, fns, is_paragraph))
                .flatten()
            {
                container = self.add_child(container, NodeValue::HtmlBlock(Default::default()), fns + 1);
                if let NodeValue::HtmlBlock(data) = &mut self.arena[container].value {
                    data.block_type = block_type;
                }
            } else if let Some(level) = (!indented && is_paragraph)
                .then(|| scanners::setext_heading_line(input, fns))
                .flatten()
            {
                Heading::convert_setext(self, input, container, level);
            } else if !indented
                && !(is_paragraph && !all_matched)
                && self.thematic_break_kill_pos <= fns
                && ThematicBreak::scan(self, input, fns) > 0
            {
                container = self.add_child(container, NodeValue::ThematicBreak, fns + 1);
                self.advance_offset(input, input.len() - 1 - self.offset, false);
            } else if let Some(matched) = (!indented
                && self.options.contains(Options::FOOTNOTES)
                && depth < MAX_LIST_DEPTH)
                .then(|| scanners::footnote_definition(input, fns))
                .filter(|&m| m > 0)
            {
                container = FootnoteDefinition::open(self, input, container, matched);
            } else if let Some((matched, data)) = ((!indented || cont_kind == NodeKind::List)
                && self.indent < CODE_INDENT
                && depth < MAX_LIST_DEPTH)
                .then(|| ListMarker::parse(input, fns, is_paragraph))
                .flatten()
            {
                container = ListItem::open(self, input, container, matched, data);
            } else if indented && !maybe_lazy && !self.blank {
                container = CodeFence::open_indented(self, input, container);
            } else {
                let extensions = Rc::clone(&self.extensions);
                match extensions
                    .iter()
                    .find_map(|ext| ext.try_open_block(self, indented, container, input))
                {
                    Some(opened) => container = opened,
                    None => break,
                }
            }

            cont_kind = self.arena.kind(container);
            if cont_kind.accepts_lines() {
                break;
            }
            maybe_lazy = false;
        }
        container
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
    fn containers_nest_on_one_line() {
        assert_eq!(
            dump("> - # a\n"),
            "document\n  block_quote\n    list bullet '-' tight\n      item\n        heading level=1\n          text \"a\"\n"
        );
    }

    #[test]
    fn setext_underline_beats_thematic_break() {
        assert_eq!(
            dump("a\n---\n"),
            "document\n  heading level=2 setext\n    text \"a\"\n"
        );
        assert_eq!(
            dump("a\n\n---\n"),
            "document\n  paragraph\n    text \"a\"\n  thematic_break\n"
        );
    }

    #[test]
    fn indented_line_continues_a_paragraph() {
        assert_eq!(
            dump("a\n    b\n"),
            "document\n  paragraph\n    text \"a\"\n    softbreak\n    text \"b\"\n"
        );
    }

    #[test]
    fn lazy_line_cannot_be_a_rule_inside_a_quote() {
        assert_eq!(
            dump("> a\n***\n"),
            "document\n  block_quote\n    paragraph\n      text \"a\"\n  thematic_break\n"
        );
    }

    #[test]
    fn list_depth_is_capped() {
        let input = "- ".repeat(150) + "x\n";
        let doc = parse_document(input.as_bytes(), Options::empty());
        let lists = doc
            .iter()
            .filter(|(event, id)| {
                *event == crate::node::EventType::Enter && doc.arena.type_string(*id) == "list"
            })
            .count();
        assert!(lists < 100, "{lists} lists");
    }
}
