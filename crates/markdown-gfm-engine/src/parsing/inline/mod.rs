//! # Inline Parsing
//!
//! Re-scans the text of every block that carries inlines and replaces it
//! with a list of inline nodes.
//!
//! ## Architecture
//!
//! A [`Subject`] walks the block's detached content one construct at a time,
//! dispatching on the byte under the cursor. Anything that cannot be decided
//! locally is deferred through two stacks:
//!
//! - **delimiters** (`delimiters`): runs of `*`, `_`, quotes and extension
//!   characters, paired up by `process_emphasis` once a stretch of input is
//!   complete
//! - **brackets** (`brackets`): `[` and `![` placeholders waiting for a `]`
//!   that turns them into a link, image or footnote reference
//!
//! Unclaimed bytes accumulate into plain text up to the next byte in
//! [`SpecialChars`].
//!
//! ## Modules
//!
//! - **`cursor`**: byte cursor shared by the subject and the reference parser
//! - **`kinds`**: per-construct handlers that own their syntax constants
//! - **`links`**: link labels, destinations and titles
//! - **`reference`**: `[label]: url "title"` definitions
//!
//! ## Bounded work
//!
//! Code span closers are memoised per run length, raw HTML constructs that
//! ran off the end of the input are not rescanned, and every emphasis
//! search stops at a per-(length mod 3, character) watermark.

mod brackets;
pub mod cursor;
mod delimiters;
pub mod kinds;
pub mod links;
pub mod reference;

pub use cursor::Cursor;
pub use delimiters::{DelimId, Delimiter, DelimiterRun};

use std::rc::Rc;

use bitflags::bitflags;

use crate::{
    buffer::{Buffer, Chunk},
    extensions::{Extension, SyntaxExtension},
    node::{Arena, Node, NodeId, NodeKind, NodeValue},
    options::Options,
    parsing::scanners::is_line_end,
    references::ReferenceMap,
};

use brackets::Bracket;
use kinds::{CodeSpan, Entity, Escape, LineBreak, PointyBrace, SmartPunct};

bitflags! {
    /// Raw HTML constructs known to be unterminated in this subject.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct SkipFlags: u8 {
        const HTML_CDATA = 1 << 0;
        const HTML_DECLARATION = 1 << 1;
        const HTML_PI = 1 << 2;
        const HTML_COMMENT = 1 << 3;
    }
}

/// Bytes that end a plain-text run, plus the extension characters that are
/// looked through when classifying emphasis runs.
///
/// Built once per parse from the attached extensions.
#[derive(Debug, Clone)]
pub struct SpecialChars {
    special: [bool; 256],
    smart: [bool; 256],
    skip: [bool; 256],
}

impl SpecialChars {
    const BASE: &'static [u8] = b"\n\r\\`&_*[]<!";
    const SMART: &'static [u8] = b"\"'.-";

    pub fn new(extensions: &[Extension]) -> Self {
        let mut chars = Self {
            special: [false; 256],
            smart: [false; 256],
            skip: [false; 256],
        };
        for &b in Self::BASE {
            chars.special[usize::from(b)] = true;
        }
        for &b in Self::SMART {
            chars.smart[usize::from(b)] = true;
        }
        for ext in extensions {
            for &b in ext.special_chars() {
                chars.special[usize::from(b)] = true;
                if ext.emphasis() {
                    chars.skip[usize::from(b)] = true;
                }
            }
        }
        chars
    }

    pub fn is_special(&self, b: u8, smart: bool) -> bool {
        self.special[usize::from(b)] || (smart && self.smart[usize::from(b)])
    }

    pub fn is_skip(&self, b: u8) -> bool {
        self.skip[usize::from(b)]
    }
}

/// Inline parsing state for one block.
///
/// Extensions see the subject through the public methods: the cursor, the
/// node factory and the delimiter stack.
pub struct Subject<'a> {
    arena: &'a mut Arena,
    refmap: &'a mut ReferenceMap,
    extensions: &'a [Extension],
    specials: &'a SpecialChars,
    options: Options,
    input: Rc<[u8]>,
    pos: usize,
    line: usize,
    /// Column of the block's first content byte, 0-based.
    block_offset: usize,
    /// Shift applied to `pos` once the cursor has crossed a line end.
    column_offset: isize,
    flags: SkipFlags,
    delimiters: Vec<Delimiter>,
    last_delim: Option<DelimId>,
    brackets: Vec<Bracket>,
    backticks: [usize; CodeSpan::MAX_BACKTICKS + 1],
    scanned_for_backticks: bool,
    no_link_openers: bool,
}

/// Parses the content of `parent` into inline children.
pub fn parse_inlines(
    arena: &mut Arena,
    parent: NodeId,
    refmap: &mut ReferenceMap,
    extensions: &[Extension],
    specials: &SpecialChars,
    options: Options,
) {
    let (line, block_offset, mut content) = {
        let node = &mut arena[parent];
        let block_offset = node.start_column.saturating_sub(1) + node.internal_offset;
        (node.start_line, block_offset, std::mem::take(&mut node.content))
    };
    content.rtrim();
    let input: Rc<[u8]> = content.into_vec().into();

    let mut subject = Subject {
        arena,
        refmap,
        extensions,
        specials,
        options,
        input,
        pos: 0,
        line,
        block_offset,
        column_offset: 0,
        flags: SkipFlags::empty(),
        delimiters: Vec::new(),
        last_delim: None,
        brackets: Vec::new(),
        backticks: [0; CodeSpan::MAX_BACKTICKS + 1],
        scanned_for_backticks: false,
        no_link_openers: true,
    };
    while !subject.is_eof() && subject.parse_inline(parent) {}
    subject.process_emphasis(0);
}

impl<'a> Subject<'a> {
    pub fn arena(&self) -> &Arena {
        self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        self.arena
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// The whole (right-trimmed) text of the block.
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> u8 {
        self.peek_at(self.pos)
    }

    pub fn peek_at(&self, pos: usize) -> u8 {
        self.input.get(pos).copied().unwrap_or(0)
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// Source line the cursor is on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based source column of the byte at `pos` on the current line.
    pub fn column(&self, pos: usize) -> usize {
        let col = pos as isize + 1 + self.column_offset + self.block_offset as isize;
        usize::try_from(col).unwrap_or(0)
    }

    /// Whether the cursor sits inside the text of an unclosed `![` (`image`)
    /// or `[` bracket.
    pub fn in_bracket(&self, image: bool) -> bool {
        self.brackets.last().is_some_and(|b| {
            if image {
                b.in_bracket_image1
            } else {
                b.in_bracket_image0
            }
        })
    }

    /// Zero-copy slice of the input.
    pub fn slice(&self, start: usize, end: usize) -> Chunk {
        Chunk::view(&self.input, start..end)
    }

    /// Allocates a detached literal node spanning `input[start..=end]`.
    pub fn make_literal(&mut self, value: NodeValue, start: usize, end: usize) -> NodeId {
        let mut node = Node::new(value);
        node.start_line = self.line;
        node.end_line = self.line;
        node.start_column = self.column(start);
        node.end_column = self.column(end);
        self.arena.alloc(node)
    }

    pub fn make_text(&mut self, start: usize, end: usize, text: Chunk) -> NodeId {
        self.make_literal(NodeValue::Text(text), start, end)
    }

    /// Removes `n` bytes from the end of `parent`'s trailing text children.
    /// Text nodes left empty are freed.
    pub fn unput(&mut self, parent: NodeId, mut n: usize) {
        let mut child = self.arena.last_child(parent);
        while let Some(id) = child.filter(|&id| n > 0 && self.arena.kind(id) == NodeKind::Text) {
            child = self.arena.previous(id);
            let mut emptied = false;
            if let Some(lit) = self.arena[id].value.literal_mut() {
                let keep = lit.len().saturating_sub(n);
                n -= lit.len() - keep;
                *lit = lit.slice(0..keep);
                emptied = keep == 0;
            }
            if emptied {
                self.arena.free(id);
            }
        }
    }

    fn parse_inline(&mut self, parent: NodeId) -> bool {
        let c = self.peek();
        if c == 0 {
            return false;
        }
        let smart = self.options.contains(Options::SMART);
        let node = match c {
            b'\r' | b'\n' => Some(LineBreak::handle_newline(self)),
            CodeSpan::TICK => Some(CodeSpan::handle(self)),
            Escape::BACKSLASH => Some(Escape::handle(self)),
            Entity::AMPERSAND => Some(Entity::handle(self)),
            PointyBrace::OPEN => Some(PointyBrace::handle(self)),
            b'*' | b'_' | b'\'' | b'"' => Some(self.handle_delim(c, smart)),
            b'-' => Some(SmartPunct::hyphen(self, smart)),
            b'.' => Some(SmartPunct::period(self, smart)),
            b'[' => {
                self.advance();
                let text = self.make_text(self.pos - 1, self.pos - 1, Chunk::from("["));
                self.push_bracket(false, text);
                Some(text)
            }
            b']' => self.handle_close_bracket(),
            b'!' => {
                self.advance();
                if self.peek() == b'[' && self.peek_at(self.pos + 1) != b'^' {
                    self.advance();
                    let text = self.make_text(self.pos - 2, self.pos - 1, Chunk::from("!["));
                    self.push_bracket(true, text);
                    Some(text)
                } else {
                    Some(self.make_text(self.pos - 1, self.pos - 1, Chunk::from("!")))
                }
            }
            _ => Some(match self.try_extensions(parent, c) {
                Some(node) => node,
                None => self.plain_text(),
            }),
        };
        if let Some(node) = node {
            self.arena.append_child_unchecked(parent, node);
        }
        true
    }

    fn try_extensions(&mut self, parent: NodeId, c: u8) -> Option<NodeId> {
        let extensions = self.extensions;
        extensions
            .iter()
            .filter(|ext| ext.special_chars().contains(&c))
            .find_map(|ext| ext.match_inline(self, parent, c))
    }

    /// Text up to the next special byte; trailing spaces before a line end
    /// are dropped.
    fn plain_text(&mut self) -> NodeId {
        let smart = self.options.contains(Options::SMART);
        let start = self.pos;
        let end = self.input[start + 1..]
            .iter()
            .position(|&b| self.specials.is_special(b, smart))
            .map_or(self.input.len(), |i| start + 1 + i);
        self.pos = end;
        let mut text_end = end;
        if is_line_end(self.peek()) {
            while text_end > start && crate::buffer::is_space(self.input[text_end - 1]) {
                text_end -= 1;
            }
        }
        let text = self.slice(start, text_end);
        self.make_text(start, end - 1, text)
    }

    /// Accounts for line ends inside a multi-line construct that just ended
    /// at the cursor, moving `node`'s end and the subject's line forward.
    pub(crate) fn adjust_newlines(&mut self, node: NodeId, matchlen: usize, extra: usize) {
        let from = self.pos - matchlen - extra;
        let span = &self.input[from..from + matchlen];
        let newlines = span.iter().filter(|&&b| b == b'\n').count();
        if newlines == 0 {
            return;
        }
        let since_newline = span.iter().rev().take_while(|&&b| b != b'\n').count();
        self.line += newlines;
        let n = &mut self.arena[node];
        n.end_line += newlines;
        n.end_column = since_newline;
        self.column_offset = since_newline as isize + extra as isize - self.pos as isize;
    }

    /// Decodes entities in `raw` into a fresh text node.
    pub(crate) fn make_text_with_entities(&mut self, start: usize, end: usize, raw: &[u8]) -> NodeId {
        let text = if raw.contains(&Entity::AMPERSAND) {
            let mut buf = Buffer::with_capacity(raw.len());
            kinds::entity::unescape_into(&mut buf, raw);
            buf.detach()
        } else {
            Chunk::from(raw)
        };
        self.make_text(start, end, text)
    }
}
