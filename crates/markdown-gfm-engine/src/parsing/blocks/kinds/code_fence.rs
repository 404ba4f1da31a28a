use crate::{
    buffer::{Buffer, Chunk},
    node::{CodeBlockData, NodeId, NodeValue},
    parsing::{
        Parser,
        blocks::CODE_INDENT,
        inline::kinds::entity,
        scanners::{self, at, is_line_end},
    },
};

use super::{Prefix, is_space_or_tab};

/// Fenced and indented code blocks.
pub struct CodeFence;

impl CodeFence {
    pub const BACKTICK: u8 = b'`';
    pub const TILDE: u8 = b'~';
    /// Fence lengths are recorded up to this many characters.
    pub const MAX_FENCE_LENGTH: usize = 255;

    /// Continuation of an open code block. A closing fence finishes the line.
    pub fn match_prefix(parser: &mut Parser, input: &[u8], container: NodeId) -> Prefix {
        let Some((fence_length, fence_offset, fence_char)) = parser.arena.fenced(container) else {
            if parser.indent >= CODE_INDENT {
                parser.advance_offset(input, CODE_INDENT, true);
                return Prefix::Matched;
            }
            if parser.blank {
                parser.advance_offset(input, parser.first_nonspace - parser.offset, false);
                return Prefix::Matched;
            }
            return Prefix::Unmatched;
        };

        let mut matched = 0;
        if parser.indent <= 3 && at(input, parser.first_nonspace) == fence_char {
            matched = scanners::close_code_fence(input, parser.first_nonspace);
        }
        if matched >= fence_length {
            parser.advance_offset(input, matched, false);
            parser.current = parser.finalize(container);
            return Prefix::Finished;
        }
        let mut skip = fence_offset;
        while skip > 0 && is_space_or_tab(at(input, parser.offset)) {
            parser.advance_offset(input, 1, true);
            skip -= 1;
        }
        Prefix::Matched
    }

    /// Opens a fenced block whose opening fence is `matched` bytes long.
    pub fn open_fenced(parser: &mut Parser, input: &[u8], container: NodeId, matched: usize) -> NodeId {
        let fns = parser.first_nonspace;
        let data = CodeBlockData {
            fenced: true,
            fence_char: at(input, fns),
            fence_length: matched.min(Self::MAX_FENCE_LENGTH),
            fence_offset: fns - parser.offset,
            ..Default::default()
        };
        let block = parser.add_child(container, NodeValue::CodeBlock(data), fns + 1);
        parser.advance_offset(input, fns + matched - parser.offset, false);
        block
    }

    pub fn open_indented(parser: &mut Parser, input: &[u8], container: NodeId) -> NodeId {
        parser.advance_offset(input, CODE_INDENT, true);
        let start_column = parser.offset + 1;
        parser.add_child(container, NodeValue::CodeBlock(CodeBlockData::default()), start_column)
    }

    /// Splits accumulated fenced content into the info string (its first
    /// line, entity- and backslash-unescaped, trimmed) and the body.
    pub fn split_info(content: &mut Buffer) -> Chunk {
        let bytes = content.as_bytes();
        let eol = bytes.iter().position(|&b| is_line_end(b)).unwrap_or(bytes.len());
        let mut info = Buffer::new();
        entity::unescape_into(&mut info, &bytes[..eol]);
        info.trim();
        info.unescape();
        let mut drop = eol;
        if content.at(drop) == b'\r' {
            drop += 1;
        }
        if content.at(drop) == b'\n' {
            drop += 1;
        }
        content.drop_prefix(drop);
        info.detach()
    }

    /// Drops trailing blank lines of indented code, keeping one line end.
    pub fn remove_trailing_blank_lines(content: &mut Buffer) {
        let bytes = content.as_bytes();
        let Some(last) = bytes
            .iter()
            .rposition(|&b| !is_space_or_tab(b) && !is_line_end(b))
        else {
            content.clear();
            return;
        };
        if let Some(eol) = bytes[last..].iter().position(|&b| is_line_end(b)) {
            content.truncate(last + eol);
        }
    }
}
