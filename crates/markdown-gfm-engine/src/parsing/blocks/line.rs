use crate::{
    node::NodeId,
    options::Options,
    parsing::{
        Parser,
        scanners::{at, is_line_end},
    },
    utf8,
};

pub(crate) const TAB_STOP: usize = 4;

const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();
const BOM: &[u8] = b"\xef\xbb\xbf";

/// Length of `line` without its trailing `\n` and `\r`.
fn content_len(line: &[u8]) -> usize {
    let mut len = line.len();
    if len > 0 && line[len - 1] == b'\n' {
        len -= 1;
    }
    if len > 0 && line[len - 1] == b'\r' {
        len -= 1;
    }
    len
}

impl Parser {
    /// Splits `data` into lines. With `eof` the trailing partial line is
    /// processed too; otherwise it waits in the line buffer.
    pub(crate) fn feed_bytes(&mut self, data: &[u8], eof: bool) {
        self.total_size = self.total_size.saturating_add(data.len());
        let mut rest = data;
        if self.last_buffer_ended_with_cr && rest.first() == Some(&b'\n') {
            rest = &rest[1..];
        }
        self.last_buffer_ended_with_cr = false;

        while !rest.is_empty() {
            let stop = rest.iter().position(|&b| is_line_end(b) || b == 0);
            let (chunk_len, process) = match stop {
                Some(i) => (i, rest[i] != 0),
                None => (rest.len(), eof),
            };
            let chunk = &rest[..chunk_len];
            if process {
                if self.linebuf.is_empty() {
                    self.process_line(chunk);
                } else {
                    let mut pending = std::mem::take(&mut self.linebuf);
                    pending.put(chunk);
                    self.process_line(pending.as_bytes());
                    pending.clear();
                    self.linebuf = pending;
                }
            } else {
                self.linebuf.put(chunk);
                if stop.is_some() {
                    self.linebuf.put(REPLACEMENT);
                }
            }

            rest = &rest[chunk_len..];
            match rest.first() {
                Some(0) => rest = &rest[1..],
                Some(b'\r') => {
                    rest = &rest[1..];
                    if rest.is_empty() {
                        self.last_buffer_ended_with_cr = true;
                    } else if rest[0] == b'\n' {
                        rest = &rest[1..];
                    }
                }
                Some(b'\n') => rest = &rest[1..],
                _ => {}
            }
        }
    }

    pub(crate) fn process_line(&mut self, bytes: &[u8]) {
        let mut line = std::mem::take(&mut self.curline);
        line.clear();
        if self.options.contains(Options::VALIDATE_UTF8) {
            utf8::push_validated(&mut line, bytes);
        } else {
            line.put(bytes);
        }
        if !line.as_bytes().last().is_some_and(|&b| is_line_end(b)) {
            line.putc(b'\n');
        }

        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.thematic_break_kill_pos = 0;
        self.indent = 0;
        self.blank = false;
        self.partially_consumed_tab = false;

        let input = line.as_bytes();
        if self.line_number == 0 && input.starts_with(BOM) {
            self.offset += BOM.len();
        }
        self.line_number += 1;
        self.line_len = Some(content_len(input));

        let mut used = input.len();
        if let Some((last_matched, all_matched)) = self.check_open_blocks(input) {
            let container = self.open_new_blocks(last_matched, input, all_matched);
            used = self.add_text_to_container(container, last_matched, input);
        }

        self.last_line_length = content_len(&input[..used]);
        self.line_len = None;
        line.clear();
        self.curline = line;
    }

    /// Locates the first non-space character at or after `offset` and
    /// derives `indent` and `blank` from it. Does not move `offset`.
    pub(crate) fn find_first_nonspace(&mut self, input: &[u8]) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;
            loop {
                match at(input, self.first_nonspace) {
                    b' ' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    b'\t' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }
        self.indent = self.first_nonspace_column - self.column;
        self.blank = is_line_end(at(input, self.first_nonspace));
    }

    /// Moves `offset` forward by `count` bytes, or by `count` columns when
    /// `columns` is set. A column advance that ends inside a tab leaves the
    /// tab unconsumed and records it as partially consumed.
    pub fn advance_offset(&mut self, input: &[u8], mut count: usize, columns: bool) {
        while count > 0 {
            match at(input, self.offset) {
                0 => break,
                b'\t' => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let advance = count.min(chars_to_tab);
                        self.column += advance;
                        if !self.partially_consumed_tab {
                            self.offset += 1;
                        }
                        count -= advance;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                _ => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
            }
        }
    }

    /// Appends the rest of the line to `node`'s content, expanding a
    /// partially consumed tab into the spaces it still stands for.
    pub(crate) fn add_line(&mut self, node: NodeId, input: &[u8]) {
        if self.partially_consumed_tab {
            self.offset += 1;
            let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
            for _ in 0..chars_to_tab {
                self.arena[node].content.putc(b' ');
            }
        }
        let rest = input.get(self.offset..).unwrap_or_default();
        self.arena[node].content.put(rest);
    }
}
