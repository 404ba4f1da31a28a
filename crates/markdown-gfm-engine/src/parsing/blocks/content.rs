use crate::{
    node::{NodeFlags, NodeId, NodeKind, NodeValue},
    parsing::Parser,
};

use super::kinds::{Heading, HtmlBlock};

impl Parser {
    fn set_last_line_blank(&mut self, node: NodeId, blank: bool) {
        self.arena[node].flags.set(NodeFlags::LAST_LINE_BLANK, blank);
    }

    /// Places what remains of the line. Returns how much of `input` counts
    /// as the line for end positions, which is shorter than the input when
    /// an ATX heading's closing sequence was cut off.
    pub(crate) fn add_text_to_container(
        &mut self,
        mut container: NodeId,
        last_matched: NodeId,
        input: &[u8],
    ) -> usize {
        self.find_first_nonspace(input);

        if self.blank {
            if let Some(last) = self.arena.last_child(container) {
                self.set_last_line_blank(last, true);
            }
        }

        // Quote lines start with `>` and extension blocks consume their own
        // lines. Blank lines in fenced code or in a still-empty item opened
        // on this line say nothing about looseness.
        let node = &self.arena[container];
        let last_line_blank = self.blank
            && match &node.value {
                NodeValue::BlockQuote
                | NodeValue::Heading(_)
                | NodeValue::ThematicBreak
                | NodeValue::Extension(_) => false,
                NodeValue::CodeBlock(data) => !data.fenced,
                NodeValue::Item(_) => {
                    !(node.first_child.is_none() && node.start_line == self.line_number)
                }
                _ => true,
            };
        self.set_last_line_blank(container, last_line_blank);
        let mut ancestor = self.arena.parent(container);
        while let Some(id) = ancestor {
            self.set_last_line_blank(id, false);
            ancestor = self.arena.parent(id);
        }

        let mut used = input.len();
        if self.current != last_matched
            && container == last_matched
            && !self.blank
            && self.arena.kind(self.current) == NodeKind::Paragraph
        {
            self.add_line(self.current, input);
            return used;
        }

        while self.current != last_matched {
            self.current = self.finalize(self.current);
        }

        match self.arena.kind(container) {
            NodeKind::CodeBlock => self.add_line(container, input),
            NodeKind::HtmlBlock => {
                let block_type = match &self.arena[container].value {
                    NodeValue::HtmlBlock(data) => data.block_type,
                    _ => 0,
                };
                self.add_line(container, input);
                if HtmlBlock::ends(block_type, input, self.first_nonspace) {
                    container = self.finalize(container);
                }
            }
            _ if self.blank => {}
            kind if kind.accepts_lines() => {
                let atx = matches!(&self.arena[container].value, NodeValue::Heading(data) if !data.setext);
                if atx {
                    used = Heading::chop_trailing_hashes(input);
                }
                let line = &input[..used];
                self.advance_offset(line, self.first_nonspace - self.offset, false);
                self.add_line(container, line);
            }
            _ => {
                container = self.add_child(container, NodeValue::Paragraph, self.first_nonspace + 1);
                self.advance_offset(input, self.first_nonspace - self.offset, false);
                self.add_line(container, input);
            }
        }
        self.current = container;
        used
    }
}
