//! Footnote resolution, run after the inline phase when footnotes are on.
//!
//! Definitions are numbered in the order they are first cited and moved to
//! the end of the document in that order. References to a label with no
//! definition fall back to their source text. Definitions nobody cites, and
//! later duplicates of a label, are dropped.

use crate::{
    buffer::Buffer,
    node::{Arena, EventType, Node, NodeId, NodeKind, NodeValue},
    references::FootnoteMap,
};

pub fn process_footnotes(arena: &mut Arena, root: NodeId) {
    let mut definitions = Vec::new();
    let mut references = Vec::new();
    for (event, node) in arena.iter(root) {
        if event != EventType::Enter {
            continue;
        }
        match arena.kind(node) {
            NodeKind::FootnoteDefinition => definitions.push(node),
            NodeKind::FootnoteReference => references.push(node),
            _ => {}
        }
    }

    let mut map = FootnoteMap::new();
    for &def in &definitions {
        let label = arena.literal(def).unwrap_or_default().to_vec();
        map.insert(&label, def, 0);
    }

    let mut cited = Vec::new();
    for reference in references {
        let label = arena.literal(reference).unwrap_or_default().to_vec();
        match map.lookup(&label).copied() {
            Some(def) => cite(arena, &mut cited, def, reference),
            None => unresolved(arena, reference, &label),
        }
    }

    for &def in &cited {
        arena.unlink(def);
        arena.append_child_unchecked(root, def);
    }
    let dropped: Vec<NodeId> = definitions
        .into_iter()
        .filter(|def| !cited.contains(def))
        .collect();
    if !dropped.is_empty() {
        log::trace!("dropping {} uncited footnote definitions", dropped.len());
    }
    for &def in &dropped {
        arena.unlink(def);
    }
    for def in dropped {
        arena.free(def);
    }
}

fn cite(arena: &mut Arena, cited: &mut Vec<NodeId>, def: NodeId, reference: NodeId) {
    let (ix, ref_ix) = match &mut arena[def].value {
        NodeValue::FootnoteDefinition(data) => {
            if data.ix == 0 {
                cited.push(def);
                data.ix = cited.len();
            }
            data.def_count += 1;
            (data.ix, data.def_count)
        }
        _ => return,
    };
    if let NodeValue::FootnoteReference(data) = &mut arena[reference].value {
        data.ix = ix;
        data.ref_ix = ref_ix;
    }
}

fn unresolved(arena: &mut Arena, reference: NodeId, label: &[u8]) {
    let mut text = Buffer::with_capacity(label.len() + 3);
    text.puts("[^");
    text.put(label);
    text.putc(b']');
    let source = &arena[reference];
    let mut node = Node::new(NodeValue::Text(text.detach()));
    node.start_line = source.start_line;
    node.end_line = source.end_line;
    node.start_column = source.start_column;
    node.end_column = source.end_column;
    let replacement = arena.alloc(node);
    arena.insert_after_unchecked(reference, replacement);
    arena.free(reference);
}

#[cfg(test)]
mod tests {
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;

    fn dump(input: &str) -> String {
        parse_document(input.as_bytes(), Options::FOOTNOTES).dump()
    }

    #[test]
    fn numbered_by_first_citation() {
        let input = "[^b] [^a] [^b]\n\n[^a]: A\n\n[^b]: B\n";
        assert_eq!(
            dump(input),
            "document\n  paragraph\n    footnote_reference label=\"b\" ix=1 ref_ix=1\n    text \" \"\n    footnote_reference label=\"a\" ix=2 ref_ix=1\n    text \" \"\n    footnote_reference label=\"b\" ix=1 ref_ix=2\n  footnote_definition label=\"b\" ix=1 refs=2\n    paragraph\n      text \"B\"\n  footnote_definition label=\"a\" ix=2 refs=1\n    paragraph\n      text \"A\"\n"
        );
    }

    #[test]
    fn unknown_label_falls_back_to_text() {
        assert_eq!(
            dump("x[^nope] y\n"),
            "document\n  paragraph\n    text \"x[^nope] y\"\n"
        );
    }

    #[test]
    fn uncited_and_duplicate_definitions_are_dropped() {
        let input = "[^a]\n\n[^a]: first\n\n[^a]: second\n\n[^z]: unused\n";
        assert_eq!(
            dump(input),
            "document\n  paragraph\n    footnote_reference label=\"a\" ix=1 ref_ix=1\n  footnote_definition label=\"a\" ix=1 refs=1\n    paragraph\n      text \"first\"\n"
        );
    }

    #[test]
    fn labels_match_case_insensitively() {
        let out = dump("[^Note]\n\n[^note]: n\n");
        assert!(out.contains("footnote_reference label=\"Note\" ix=1 ref_ix=1"));
        assert!(out.contains("footnote_definition label=\"note\" ix=1 refs=1"));
    }

    #[test]
    fn definitions_inside_quotes_are_hoisted() {
        assert_eq!(
            dump("> [^q]: quoted\n\n[^q]\n"),
            "document\n  block_quote\n  paragraph\n    footnote_reference label=\"q\" ix=1 ref_ix=1\n  footnote_definition label=\"q\" ix=1 refs=1\n    paragraph\n      text \"quoted\"\n"
        );
    }
}
