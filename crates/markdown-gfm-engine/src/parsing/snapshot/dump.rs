use crate::node::{
    Arena, EventType, ExtensionValue, ListDelim, ListType, NodeId, NodeValue,
};

/// Indented text form of the tree under `root`.
///
/// Two spaces per depth; literals are printed with `{:?}` so whitespace and
/// quotes are visible.
pub fn dump(arena: &Arena, root: NodeId) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for (event, node) in arena.iter(root) {
        if event == EventType::Exit {
            depth = depth.saturating_sub(1);
            continue;
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        describe(&mut out, arena, node);
        out.push('\n');
        if !arena.kind(node).is_leaf() {
            depth += 1;
        }
    }
    out
}

fn quoted(bytes: &[u8]) -> String {
    format!("{:?}", String::from_utf8_lossy(bytes))
}

fn describe(out: &mut String, arena: &Arena, node: NodeId) {
    out.push_str(arena.type_string(node));
    match &arena[node].value {
        NodeValue::Text(s) | NodeValue::Code(s) | NodeValue::HtmlInline(s) => {
            out.push(' ');
            out.push_str(&quoted(s.as_bytes()));
        }
        NodeValue::HtmlBlock(data) => {
            out.push(' ');
            out.push_str(&quoted(data.literal.as_bytes()));
        }
        NodeValue::CodeBlock(data) => {
            if data.fenced {
                out.push_str(" fenced");
            }
            if !data.info.is_empty() {
                out.push_str(&format!(" info={}", quoted(data.info.as_bytes())));
            }
            out.push(' ');
            out.push_str(&quoted(data.literal.as_bytes()));
        }
        NodeValue::Heading(data) => {
            out.push_str(&format!(" level={}", data.level));
            if data.setext {
                out.push_str(" setext");
            }
        }
        NodeValue::List(data) => {
            match data.list_type {
                ListType::Bullet => {
                    out.push_str(&format!(" bullet '{}'", char::from(data.bullet_char)));
                }
                ListType::Ordered => {
                    let delim = match data.delimiter {
                        ListDelim::Paren => "paren",
                        ListDelim::Period | ListDelim::None => "period",
                    };
                    out.push_str(&format!(" ordered start={} delim={delim}", data.start));
                }
            }
            out.push_str(if data.tight { " tight" } else { " loose" });
        }
        NodeValue::Item(data) => match data.checked {
            Some(true) => out.push_str(" checked"),
            Some(false) => out.push_str(" unchecked"),
            None => {}
        },
        NodeValue::Link(data) | NodeValue::Image(data) => {
            out.push_str(&format!(" url={}", quoted(data.url.as_bytes())));
            if !data.title.is_empty() {
                out.push_str(&format!(" title={}", quoted(data.title.as_bytes())));
            }
        }
        NodeValue::FootnoteReference(data) => out.push_str(&format!(
            " label={} ix={} ref_ix={}",
            quoted(data.label.as_bytes()),
            data.ix,
            data.ref_ix
        )),
        NodeValue::FootnoteDefinition(data) => out.push_str(&format!(
            " label={} ix={} refs={}",
            quoted(data.label.as_bytes()),
            data.ix,
            data.def_count
        )),
        NodeValue::Extension(ExtensionValue::Table(data)) => {
            out.push_str(&format!(" alignments={:?}", data.alignments));
        }
        _ => {}
    }
}
