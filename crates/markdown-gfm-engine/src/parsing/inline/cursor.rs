use crate::parsing::scanners::{at, is_line_end};

/// A byte cursor over one block's inline text.
///
/// Past the end every read yields `0`, which no scanner accepts, so callers
/// never bounds-check before peeking.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub fn at_pos(input: &'a [u8], pos: usize) -> Self {
        Self { input, pos }
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Current byte, `0` at the end.
    pub fn peek(&self) -> u8 {
        at(self.input, self.pos)
    }

    pub fn peek_at(&self, pos: usize) -> u8 {
        at(self.input, pos)
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.input.get(self.pos..).is_some_and(|rest| rest.starts_with(pat))
    }

    pub fn bump(&mut self) {
        self.pos += 1;
    }

    pub fn bump_n(&mut self, n: usize) {
        self.pos += n;
    }

    /// Consumes bytes while `pred` holds and returns how many.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while !self.eof() && pred(self.input[self.pos]) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Skips spaces and tabs; returns whether any were skipped.
    pub fn skip_spaces(&mut self) -> bool {
        self.take_while(|b| b == b' ' || b == b'\t') > 0
    }

    /// Skips one line ending (`\r`, `\n` or `\r\n`). At the end of input
    /// this reports success without moving.
    pub fn skip_line_end(&mut self) -> bool {
        let mut seen = false;
        if self.peek() == b'\r' {
            self.pos += 1;
            seen = true;
        }
        if self.peek() == b'\n' {
            self.pos += 1;
            seen = true;
        }
        seen || self.eof()
    }

    /// Spaces, then at most one line ending, then spaces.
    pub fn skip_spaces_and_newline(&mut self) {
        self.skip_spaces();
        if is_line_end(self.peek()) {
            self.skip_line_end();
            self.skip_spaces();
        }
    }
}
