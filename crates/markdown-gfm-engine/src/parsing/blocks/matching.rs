use crate::{
    extensions::SyntaxExtension,
    node::{NodeId, NodeKind},
    parsing::Parser,
};

use super::kinds::{BlockQuote, CodeFence, FootnoteDefinition, HtmlBlock, ListItem, Prefix};

impl Parser {
    fn open_last_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena
            .last_child(node)
            .filter(|&child| self.arena[child].is_open())
    }

    /// Walks the open spine from the root, letting each open block consume
    /// its continuation prefix. Returns the deepest block that matched and
    /// whether every open block did, or `None` when a closing code fence
    /// used up the line.
    pub(crate) fn check_open_blocks(&mut self, input: &[u8]) -> Option<(NodeId, bool)> {
        let mut container = self.root;
        let mut all_matched = true;

        while let Some(child) = self.open_last_child(container) {
            container = child;
            self.find_first_nonspace(input);

            let prefix: Prefix = match self.arena.kind(container) {
                NodeKind::BlockQuote => BlockQuote::match_prefix(self, input).into(),
                NodeKind::Item => ListItem::match_prefix(self, input, container).into(),
                NodeKind::CodeBlock => CodeFence::match_prefix(self, input, container),
                NodeKind::Heading => Prefix::Unmatched,
                NodeKind::HtmlBlock => HtmlBlock::match_prefix(self, container).into(),
                NodeKind::Paragraph => Prefix::from(!self.blank),
                NodeKind::FootnoteDefinition => FootnoteDefinition::match_prefix(self, input).into(),
                NodeKind::Extension(_) => {
                    let ext = self.arena[container].extension.clone();
                    ext.map_or(Prefix::Matched, |ext| {
                        ext.last_block_matches(self, input, container).into()
                    })
                }
                _ => Prefix::Matched,
            };
            match prefix {
                Prefix::Matched => {}
                Prefix::Unmatched => {
                    all_matched = false;
                    break;
                }
                Prefix::Finished => return None,
            }
        }

        if !all_matched {
            container = self.arena.parent(container).unwrap_or(self.root);
        }
        Some((container, all_matched))
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
    fn closing_fence_ends_the_line() {
        assert_eq!(
            dump("```\na\n```   \nb\n"),
            "document\n  code_block fenced \"a\\n\"\n  paragraph\n    text \"b\"\n"
        );
    }

    #[test]
    fn unmatched_item_closes_the_list() {
        assert_eq!(
            dump("- a\n\nb\n"),
            "document\n  list bullet '-' tight\n    item\n      paragraph\n        text \"a\"\n  paragraph\n    text \"b\"\n"
        );
    }

    #[test]
    fn heading_never_continues() {
        assert_eq!(
            dump("# a\nb\n"),
            "document\n  heading level=1\n    text \"a\"\n  paragraph\n    text \"b\"\n"
        );
    }
}
