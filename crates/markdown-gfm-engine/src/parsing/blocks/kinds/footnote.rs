use crate::{
    buffer::Chunk,
    node::{FootnoteDefinitionData, NodeId, NodeValue},
    parsing::{Parser, blocks::CODE_INDENT},
};

/// `[^label]:` footnote definitions.
pub struct FootnoteDefinition;

impl FootnoteDefinition {
    /// Continuation: four columns of indentation, or an empty line.
    pub fn match_prefix(parser: &mut Parser, input: &[u8]) -> bool {
        if parser.indent >= CODE_INDENT {
            parser.advance_offset(input, CODE_INDENT, true);
            true
        } else {
            input.starts_with(b"\n") || input.starts_with(b"\r\n")
        }
    }

    /// Opens a definition whose `[^label]:` prefix spans `matched` bytes.
    pub fn open(parser: &mut Parser, input: &[u8], container: NodeId, matched: usize) -> NodeId {
        let fns = parser.first_nonspace;
        let raw = &input[fns + 2..fns + matched];
        let close = raw.iter().rposition(|&b| b == b']').unwrap_or(0);
        let label = Chunk::from(&raw[..close]);
        parser.advance_offset(input, fns + matched - parser.offset, false);
        let definition = parser.add_child(
            container,
            NodeValue::FootnoteDefinition(FootnoteDefinitionData {
                label,
                ..Default::default()
            }),
            fns + matched + 1,
        );
        parser.arena[definition].internal_offset = matched;
        definition
    }
}

#[cfg(test)]
mod tests {
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;

    #[test]
    fn definition_continues_with_indented_lines() {
        let doc = parse_document(b"a[^n]\n\n[^n]: note\n\n    more\nafter\n", Options::FOOTNOTES);
        assert_eq!(
            doc.dump(),
            "document\n  paragraph\n    text \"a\"\n    footnote_reference label=\"n\" ix=1 ref_ix=1\n  footnote_definition label=\"n\" ix=1 refs=1\n    paragraph\n      text \"note\"\n    paragraph\n      text \"more\"\n      softbreak\n      text \"after\"\n"
        );
    }

    #[test]
    fn without_the_option_it_is_a_link_reference() {
        let doc = parse_document(b"[^n]: note\n\n[x][^n]\n", Options::empty());
        assert_eq!(
            doc.dump(),
            "document\n  paragraph\n    link url=\"note\"\n      text \"x\"\n"
        );
    }
}
