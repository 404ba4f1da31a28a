//! Link labels, destinations and titles, shared by inline links and
//! reference definitions.

use std::ops::Range;

use crate::{
    buffer::{Buffer, Chunk, is_space},
    references::MAX_LINK_LABEL_LENGTH,
};

use super::{Cursor, kinds::entity};

/// Parentheses a bare destination may nest.
pub const MAX_LINK_PAREN_DEPTH: usize = 32;

/// Strips ASCII whitespace from both ends.
pub fn trim(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| !is_space(b)).unwrap_or(s.len());
    let end = s.iter().rposition(|&b| !is_space(b)).map_or(start, |i| i + 1);
    &s[start..end]
}

/// Parses `[label]` at the cursor and returns the trimmed label. Labels may
/// not contain unescaped brackets or run past [`MAX_LINK_LABEL_LENGTH`]
/// bytes; on failure the cursor does not move.
pub fn link_label<'a>(cur: &mut Cursor<'a>) -> Option<&'a [u8]> {
    let start = cur.pos();
    if cur.peek() != b'[' {
        return None;
    }
    cur.bump();
    let mut length = 0;
    loop {
        match cur.peek() {
            0 | b'[' => break,
            b']' => {
                let label = trim(&cur.input()[start + 1..cur.pos()]);
                cur.bump();
                return Some(label);
            }
            b'\\' => {
                cur.bump();
                length += 1;
                if cur.peek().is_ascii_punctuation() {
                    cur.bump();
                    length += 1;
                }
            }
            _ => {
                cur.bump();
                length += 1;
            }
        }
        if length > MAX_LINK_LABEL_LENGTH {
            break;
        }
    }
    cur.set_pos(start);
    None
}

/// Scans a link destination at `offset`: `<...>` or a run without spaces
/// and with balanced parentheses. Returns the bytes consumed and the range
/// of the destination proper.
pub fn scan_link_url(input: &[u8], offset: usize) -> Option<(usize, Range<usize>)> {
    let len = input.len();
    let mut i = offset;
    if input.get(i) != Some(&b'<') {
        return scan_bare_url(input, offset);
    }
    i += 1;
    while i < len {
        match input[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'\\' => i += 2,
            b'\n' | b'<' => return None,
            _ => i += 1,
        }
    }
    if i >= len {
        return None;
    }
    Some((i - offset, offset + 1..i - 1))
}

fn scan_bare_url(input: &[u8], offset: usize) -> Option<(usize, Range<usize>)> {
    let len = input.len();
    let mut i = offset;
    let mut depth = 0;
    while i < len {
        match input[i] {
            b'\\' if i + 1 < len && input[i + 1].is_ascii_punctuation() => i += 2,
            b'(' => {
                depth += 1;
                i += 1;
                if depth > MAX_LINK_PAREN_DEPTH {
                    return None;
                }
            }
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                i += 1;
            }
            b if is_space(b) => {
                if i == offset {
                    return None;
                }
                break;
            }
            _ => i += 1,
        }
    }
    if i >= len {
        return None;
    }
    Some((i - offset, offset..i))
}

/// Destination as stored on the node: trimmed, entities decoded, backslash
/// escapes removed.
pub fn clean_url(raw: &[u8]) -> Chunk {
    let url = trim(raw);
    if url.is_empty() {
        return Chunk::empty();
    }
    let mut buf = Buffer::with_capacity(url.len());
    entity::unescape_into(&mut buf, url);
    buf.unescape();
    buf.detach()
}

/// Title without its surrounding quotes or parentheses, entities decoded,
/// backslash escapes removed.
pub fn clean_title(raw: &[u8]) -> Chunk {
    let (Some(&first), Some(&last)) = (raw.first(), raw.last()) else {
        return Chunk::empty();
    };
    let quoted = matches!((first, last), (b'\'', b'\'') | (b'(', b')') | (b'"', b'"'));
    let body = if quoted && raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };
    let mut buf = Buffer::with_capacity(body.len());
    entity::unescape_into(&mut buf, body);
    buf.unescape();
    buf.detach()
}

/// Destination of a `<...>` autolink; e-mail addresses gain `mailto:`.
pub fn clean_autolink(raw: &[u8], email: bool) -> Chunk {
    let url = trim(raw);
    if url.is_empty() {
        return Chunk::empty();
    }
    let mut buf = Buffer::with_capacity(url.len() + 7);
    if email {
        buf.puts("mailto:");
    }
    entity::unescape_into(&mut buf, url);
    buf.detach()
}
