//! # Byte Buffers
//!
//! Owned, growable byte storage used for line accumulation, block content
//! and literal construction, plus the [`Chunk`] slice type that node payloads
//! carry.
//!
//! ## Modules
//!
//! - **`chunk`**: `Chunk`, a shared view into a detached buffer or an owned copy
//!
//! Text is kept as bytes throughout the engine. Input that was not UTF-8
//! validated flows through untouched; consumers decide how to decode.

pub mod chunk;

pub use chunk::Chunk;

use std::fmt;

/// Hard ceiling on a single buffer. Growing past it is fatal.
pub const MAX_BUFFER_SIZE: usize = 1 << 30;

/// Growable byte sequence with amortised 1.5x growth.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Self::new();
        buf.grow(capacity);
        buf
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte at `pos`, or `0` past the end.
    pub fn at(&self, pos: usize) -> u8 {
        self.bytes.get(pos).copied().unwrap_or(0)
    }

    /// Ensures room for `target` bytes in total.
    ///
    /// Capacity becomes 1.5x the request rounded up to 8 bytes. Requests
    /// beyond [`MAX_BUFFER_SIZE`] abort the process.
    pub fn grow(&mut self, target: usize) {
        if target <= self.bytes.capacity() {
            return;
        }
        if target > MAX_BUFFER_SIZE {
            oversize(target);
        }
        let new_capacity = (target + target / 2 + 7) & !7;
        let new_capacity = new_capacity.min(MAX_BUFFER_SIZE);
        self.bytes.reserve_exact(new_capacity - self.bytes.len());
    }

    pub fn put(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.grow(self.bytes.len() + data.len());
        self.bytes.extend_from_slice(data);
    }

    pub fn putc(&mut self, c: u8) {
        self.grow(self.bytes.len() + 1);
        self.bytes.push(c);
    }

    pub fn puts(&mut self, s: &str) {
        self.put(s.as_bytes());
    }

    /// Appends the UTF-8 encoding of `c`.
    pub fn put_char(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        self.put(c.encode_utf8(&mut tmp).as_bytes());
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// Removes the first `n` bytes.
    pub fn drop_prefix(&mut self, n: usize) {
        let n = n.min(self.bytes.len());
        self.bytes.drain(..n);
    }

    pub fn rtrim(&mut self) {
        while self.bytes.last().is_some_and(|&b| is_space(b)) {
            self.bytes.pop();
        }
    }

    pub fn ltrim(&mut self) {
        let n = self.bytes.iter().take_while(|&&b| is_space(b)).count();
        self.drop_prefix(n);
    }

    pub fn trim(&mut self) {
        self.rtrim();
        self.ltrim();
    }

    /// Collapses every run of whitespace into a single space.
    pub fn normalize_whitespace(&mut self) {
        let mut last_was_space = false;
        let mut w = 0;
        for r in 0..self.bytes.len() {
            let b = self.bytes[r];
            if is_space(b) {
                if !last_was_space {
                    self.bytes[w] = b' ';
                    w += 1;
                    last_was_space = true;
                }
            } else {
                self.bytes[w] = b;
                w += 1;
                last_was_space = false;
            }
        }
        self.bytes.truncate(w);
    }

    /// Drops backslashes that escape ASCII punctuation.
    pub fn unescape(&mut self) {
        let mut r = 0;
        let mut w = 0;
        let len = self.bytes.len();
        while r < len {
            if self.bytes[r] == b'\\' && r + 1 < len && self.bytes[r + 1].is_ascii_punctuation() {
                r += 1;
            }
            self.bytes[w] = self.bytes[r];
            w += 1;
            r += 1;
        }
        self.bytes.truncate(w);
    }

    pub fn find(&self, c: u8, from: usize) -> Option<usize> {
        self.bytes
            .get(from..)?
            .iter()
            .position(|&b| b == c)
            .map(|i| i + from)
    }

    /// Moves the contents out as an owned [`Chunk`], leaving the buffer empty.
    pub fn detach(&mut self) -> Chunk {
        Chunk::from(std::mem::take(&mut self.bytes))
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl From<&[u8]> for Buffer {
    fn from(data: &[u8]) -> Self {
        let mut buf = Self::new();
        buf.put(data);
        buf
    }
}

impl From<&str> for Buffer {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        if bytes.len() > MAX_BUFFER_SIZE {
            oversize(bytes.len());
        }
        Self { bytes }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({:?})", String::from_utf8_lossy(&self.bytes))
    }
}

/// ASCII whitespace as the grammar sees it: space, tab, LF, VT, FF, CR.
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn oversize(requested: usize) -> ! {
    log::error!("buffer of {requested} bytes exceeds the {MAX_BUFFER_SIZE} byte ceiling");
    std::process::abort()
}
