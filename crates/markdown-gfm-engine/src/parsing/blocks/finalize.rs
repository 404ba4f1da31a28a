use crate::{
    node::{Node, NodeFlags, NodeId, NodeKind, NodeValue},
    parsing::Parser,
};

use super::{
    kinds::{CodeFence, ListItem, Paragraph},
    make_block,
};

impl Parser {
    /// Closes `node` and returns its parent.
    ///
    /// Records the end position, then does the work that needs the whole
    /// block: reference definitions leave paragraphs (an emptied paragraph
    /// is freed), code and HTML content becomes the literal, and lists
    /// decide tightness.
    pub(crate) fn finalize(&mut self, node: NodeId) -> NodeId {
        let parent = self.arena.parent(node);
        if !self.arena[node].is_open() {
            return parent.unwrap_or(node);
        }
        let (line_number, line_len, last_line_length) =
            (self.line_number, self.line_len, self.last_line_length);
        {
            let n = &mut self.arena[node];
            n.flags.remove(NodeFlags::OPEN);
            let ends_on_this_line = match &n.value {
                NodeValue::Document => true,
                NodeValue::CodeBlock(data) => data.fenced,
                NodeValue::Heading(data) => data.setext,
                _ => false,
            };
            match line_len {
                None => {
                    n.end_line = line_number;
                    n.end_column = last_line_length;
                }
                Some(len) if ends_on_this_line => {
                    n.end_line = line_number;
                    n.end_column = len;
                }
                Some(_) => {
                    n.end_line = line_number.saturating_sub(1);
                    n.end_column = last_line_length;
                }
            }
        }
        log::trace!(
            "close {} {}:{}-{}:{}",
            self.arena.type_string(node),
            self.arena[node].start_line,
            self.arena[node].start_column,
            self.arena[node].end_line,
            self.arena[node].end_column
        );

        match self.arena.kind(node) {
            NodeKind::Paragraph => {
                if !Paragraph::resolve_reference_definitions(self, node) {
                    self.arena.free(node);
                }
            }
            NodeKind::CodeBlock => {
                let Node { value, content, .. } = &mut self.arena[node];
                if let NodeValue::CodeBlock(data) = value {
                    if data.fenced {
                        data.info = CodeFence::split_info(content);
                    } else {
                        CodeFence::remove_trailing_blank_lines(content);
                        content.putc(b'\n');
                    }
                    data.literal = content.detach();
                }
            }
            NodeKind::HtmlBlock => {
                let Node { value, content, .. } = &mut self.arena[node];
                if let NodeValue::HtmlBlock(data) = value {
                    data.literal = content.detach();
                }
            }
            NodeKind::List => {
                let tight = ListItem::is_tight(&mut self.arena, node);
                if let NodeValue::List(data) = &mut self.arena[node].value {
                    data.tight = tight;
                }
            }
            _ => {}
        }
        parent.unwrap_or(node)
    }

    /// Appends a new open block of `value`'s kind to `parent`, first closing
    /// blocks up the spine until one can contain it.
    pub fn add_child(&mut self, mut parent: NodeId, value: NodeValue, start_column: usize) -> NodeId {
        let kind = value.kind();
        while !self.arena.can_contain(parent, kind) {
            if self.arena.parent(parent).is_none() {
                log::warn!(
                    "{} cannot hold {}; appending anyway",
                    self.arena.type_string(parent),
                    kind.type_string()
                );
                break;
            }
            parent = self.finalize(parent);
        }
        let child = make_block(&mut self.arena, value, self.line_number, start_column);
        self.arena.append_child_unchecked(parent, child);
        log::trace!("open {} {}:{}", kind.type_string(), self.line_number, start_column);
        child
    }
}

#[cfg(test)]
mod tests {
    use crate::{node::NodeId, options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;

    fn span(doc: &crate::parsing::ParsedDoc, id: NodeId) -> (usize, usize, usize, usize) {
        let n = &doc.arena[id];
        (n.start_line, n.start_column, n.end_line, n.end_column)
    }

    #[test]
    fn block_positions() {
        let doc = parse_document(b"> a\n> b\n\nc", Options::empty());
        let quote = doc.arena.first_child(doc.root).unwrap();
        let para = doc.arena.last_child(doc.root).unwrap();
        assert_eq!(span(&doc, quote), (1, 1, 2, 3));
        assert_eq!(span(&doc, para), (4, 1, 4, 1));
        assert_eq!(span(&doc, doc.root), (1, 1, 4, 1));
    }

    #[test]
    fn fenced_code_ends_on_closing_fence() {
        let doc = parse_document(b"```\nx\n```\n", Options::empty());
        let code = doc.arena.first_child(doc.root).unwrap();
        assert_eq!(span(&doc, code), (1, 1, 3, 3));
    }

    #[test]
    fn unclosed_fence_runs_to_end_of_input() {
        let doc = parse_document(b"~~~\nx\ny", Options::empty());
        let code = doc.arena.first_child(doc.root).unwrap();
        assert_eq!(doc.arena.literal(code), Some(&b"x\ny\n"[..]));
        assert_eq!(span(&doc, code), (1, 1, 3, 1));
    }
}
