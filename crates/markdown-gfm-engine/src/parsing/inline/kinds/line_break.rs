use crate::{
    node::{NodeId, NodeValue},
    parsing::inline::Subject,
};

/// Line ends inside inline content.
pub struct LineBreak;

impl LineBreak {
    /// Consumes a line end and the next line's leading spaces. Two or more
    /// spaces before the line end make it a hard break.
    pub fn handle_newline(subj: &mut Subject<'_>) -> NodeId {
        let nl_pos = subj.pos;
        if subj.peek() == b'\r' {
            subj.advance();
        }
        if subj.peek() == b'\n' {
            subj.advance();
        }
        subj.line += 1;
        subj.column_offset = -(subj.pos as isize);
        while subj.peek() == b' ' || subj.peek() == b'\t' {
            subj.advance();
        }

        let hard = nl_pos > 1 && subj.input[nl_pos - 1] == b' ' && subj.input[nl_pos - 2] == b' ';
        subj.arena.alloc_value(if hard {
            NodeValue::LineBreak
        } else {
            NodeValue::SoftBreak
        })
    }
}
