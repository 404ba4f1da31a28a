use crate::{
    buffer::Buffer,
    node::NodeId,
    parsing::inline::Subject,
};

/// HTML entity and numeric character references.
pub struct Entity;

impl Entity {
    pub const AMPERSAND: u8 = b'&';

    /// Shortest named reference body, counted from after the `&`.
    const MIN_NAME: usize = 2;
    /// Longest named reference scanned, counted from after the `&`.
    const MAX_NAME: usize = 32;

    /// `&` at the cursor: the decoded reference, or a literal `&`.
    pub fn handle(subj: &mut Subject<'_>) -> NodeId {
        subj.advance();
        let mut out = Buffer::new();
        let len = unescape_entity(&mut out, subj.input.get(subj.pos..).unwrap_or_default());
        if len == 0 {
            return subj.make_text(subj.pos - 1, subj.pos - 1, "&".into());
        }
        subj.pos += len;
        subj.make_text(subj.pos - 1 - len, subj.pos - 1, out.detach())
    }
}

/// Decodes one reference whose `&` has already been consumed, appending the
/// text to `out`. Returns the bytes used, `0` when `src` is not a reference.
pub fn unescape_entity(out: &mut Buffer, src: &[u8]) -> usize {
    if src.len() >= 3 && src[0] == b'#' {
        return unescape_numeric(out, src);
    }
    let limit = src.len().min(Entity::MAX_NAME);
    for i in Entity::MIN_NAME..limit {
        match src[i] {
            b' ' => break,
            b';' => {
                return match lookup_named(&src[..i]) {
                    Some(text) => {
                        out.puts(&text);
                        i + 1
                    }
                    None => 0,
                };
            }
            _ => {}
        }
    }
    0
}

fn unescape_numeric(out: &mut Buffer, src: &[u8]) -> usize {
    let (digits_start, radix, max_digits) = match src[1] {
        b'x' | b'X' => (2, 16, 6),
        b if b.is_ascii_digit() => (1, 10, 7),
        _ => return 0,
    };
    let digits = src[digits_start..]
        .iter()
        .take_while(|b| b.is_ascii_hexdigit() && (radix == 16 || b.is_ascii_digit()))
        .count();
    let end = digits_start + digits;
    if digits == 0 || digits > max_digits || src.get(end) != Some(&b';') {
        return 0;
    }
    let codepoint = src[digits_start..end].iter().fold(0u32, |acc, &b| {
        let digit = char::from(b).to_digit(radix).unwrap_or(0);
        acc.saturating_mul(radix).saturating_add(digit)
    });
    let c = match codepoint {
        0 => char::REPLACEMENT_CHARACTER,
        cp => char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER),
    };
    out.put_char(c);
    end + 1
}

/// Looks up an entity name (without `&` and `;`) in the HTML5 table.
fn lookup_named(name: &[u8]) -> Option<String> {
    if !name.iter().all(u8::is_ascii_alphanumeric) {
        return None;
    }
    let reference = format!("&{};", String::from_utf8_lossy(name));
    let decoded = html_escape::decode_html_entities(&reference);
    // Partial matches such as `&ampx;` -> `&x;` keep their semicolon.
    if decoded == reference || (decoded != ";" && decoded.ends_with(';')) {
        return None;
    }
    Some(decoded.into_owned())
}

/// Copies `src` into `out`, decoding every valid reference and leaving any
/// other `&` as is.
pub fn unescape_into(out: &mut Buffer, src: &[u8]) {
    let mut i = 0;
    while i < src.len() {
        let next = src[i..]
            .iter()
            .position(|&b| b == Entity::AMPERSAND)
            .map_or(src.len(), |p| i + p);
        out.put(&src[i..next]);
        if next >= src.len() {
            break;
        }
        i = next + 1;
        let used = unescape_entity(out, &src[i..]);
        if used == 0 {
            out.putc(Entity::AMPERSAND);
        }
        i += used;
    }
}
