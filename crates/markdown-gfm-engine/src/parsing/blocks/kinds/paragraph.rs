use crate::{
    node::NodeId,
    parsing::{Parser, inline::reference::parse_reference_inline},
};

/// The default leaf block: whatever no other block start claims.
pub struct Paragraph;

impl Paragraph {
    /// Pulls link reference definitions off the front of the paragraph's
    /// content into the reference map. Returns whether anything but
    /// whitespace remains.
    pub fn resolve_reference_definitions(parser: &mut Parser, paragraph: NodeId) -> bool {
        let content = parser.arena[paragraph].content.as_bytes();
        let mut pos = 0;
        while content.get(pos) == Some(&b'[') {
            let used = parse_reference_inline(&content[pos..], &mut parser.refmap);
            if used == 0 {
                break;
            }
            pos += used;
        }
        let node = &mut parser.arena[paragraph];
        node.content.drop_prefix(pos);
        !is_blank(node.content.as_bytes())
    }
}

/// Only spaces and tabs before the first line end.
pub(crate) fn is_blank(s: &[u8]) -> bool {
    for &b in s {
        match b {
            b'\r' | b'\n' => return true,
            b' ' | b'\t' => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;

    #[test]
    fn blankness_stops_at_the_first_line_end() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \t\nfoo"));
        assert!(!is_blank(b"  x"));
    }

    #[test]
    fn leading_definitions_are_removed() {
        let doc = parse_document(b"[a]: /a\n[b]: /b\ntext [a] [b]\n", Options::empty());
        assert_eq!(
            doc.dump(),
            "document\n  paragraph\n    text \"text \"\n    link url=\"/a\"\n      text \"a\"\n    text \" \"\n    link url=\"/b\"\n      text \"b\"\n"
        );
    }

    #[test]
    fn paragraph_of_only_definitions_disappears() {
        let doc = parse_document(b"[a]: /a\n\n- x\n", Options::empty());
        assert_eq!(doc.arena.children(doc.root).count(), 1);
    }
}
