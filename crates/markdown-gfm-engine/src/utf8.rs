//! UTF-8 helpers: decoding single code points, validation with U+FFFD
//! replacement, and the whitespace/punctuation classes used for flanking.

use unicode_general_category::{GeneralCategory, get_general_category};

use crate::buffer::Buffer;

pub const REPLACEMENT: char = '\u{FFFD}';

/// Length of the sequence announced by a lead byte, or 0 for a byte that
/// cannot start one.
pub fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 0,
    }
}

/// Decodes the code point at the start of `bytes`.
///
/// Returns `None` for empty input, truncated sequences, overlong forms,
/// surrogates and values past U+10FFFF.
pub fn decode(bytes: &[u8]) -> Option<(char, usize)> {
    let len = sequence_len(*bytes.first()?);
    if len == 0 || bytes.len() < len {
        return None;
    }
    let s = std::str::from_utf8(&bytes[..len]).ok()?;
    s.chars().next().map(|c| (c, len))
}

/// Decodes the code point ending just before `pos`.
pub fn decode_before(bytes: &[u8], pos: usize) -> Option<char> {
    if pos == 0 || pos > bytes.len() {
        return None;
    }
    let mut start = pos - 1;
    // at most three continuation bytes precede the lead byte
    while start > 0 && pos - start < 4 && (bytes[start] >> 6) == 2 {
        start -= 1;
    }
    match decode(&bytes[start..pos]) {
        Some((c, len)) if start + len == pos => Some(c),
        _ => None,
    }
}

/// Appends `line` to `out`, replacing every invalid sequence with U+FFFD.
pub fn push_validated(out: &mut Buffer, line: &[u8]) {
    let mut rest = line;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.puts(valid);
                return;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                out.put(valid);
                out.put_char(REPLACEMENT);
                match err.error_len() {
                    Some(skip) => rest = &after[skip..],
                    None => return,
                }
            }
        }
    }
}

/// Unicode whitespace as used by the flanking rules (Zs plus tab, LF, FF, CR).
pub fn is_space(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\x0c' | '\r' | ' ' | '\u{a0}' | '\u{1680}' | '\u{2000}'..='\u{200a}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
    )
}

/// ASCII punctuation or any Unicode `P*` category code point.
pub fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }
    matches!(
        get_general_category(c),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::OtherPunctuation
            | GeneralCategory::OpenPunctuation
    )
}

/// Case-folds `src` into `out` so that labels differing only in case compare equal.
///
/// Lowercasing then uppercasing each code point maps every case variant of a
/// letter (including `ß`, `ẞ` and `SS`) onto one spelling. Invalid
/// sequences fold to U+FFFD.
pub fn case_fold(out: &mut Buffer, src: &[u8]) {
    let mut i = 0;
    while i < src.len() {
        let (c, len) = decode(&src[i..]).unwrap_or((REPLACEMENT, 1));
        for lower in c.to_lowercase() {
            for folded in lower.to_uppercase() {
                out.put_char(folded);
            }
        }
        i += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn decodes_multibyte() {
        assert_eq!(decode("é!".as_bytes()), Some(('é', 2)));
        assert_eq!(decode(&[0xe2, 0x80]), None);
        assert_eq!(decode(&[0xc0, 0x80]), None);
        assert_eq!(decode(&[0xed, 0xa0, 0x80]), None);
    }

    #[test]
    fn decodes_backwards() {
        let s = "a€b".as_bytes();
        assert_eq!(decode_before(s, 4), Some('€'));
        assert_eq!(decode_before(s, 1), Some('a'));
        assert_eq!(decode_before(s, 0), None);
    }

    #[test]
    fn validation_replaces_bad_bytes() {
        let mut out = Buffer::new();
        push_validated(&mut out, b"a\xffb\xe2\x82");
        assert_eq!(out.as_bytes(), "a\u{FFFD}b\u{FFFD}".as_bytes());
    }

    #[rstest]
    #[case(' ', true)]
    #[case('\u{a0}', true)]
    #[case('\u{3000}', true)]
    #[case('x', false)]
    #[case('\u{200b}', false)]
    fn whitespace_class(#[case] c: char, #[case] expected: bool) {
        assert_eq!(is_space(c), expected);
    }

    #[rstest]
    #[case('!', true)]
    #[case('~', true)]
    #[case('\u{201C}', true)]
    #[case('\u{3001}', true)]
    #[case('a', false)]
    #[case('\u{20AC}', false)]
    fn punctuation_class(#[case] c: char, #[case] expected: bool) {
        assert_eq!(is_punctuation(c), expected);
    }

    #[test]
    fn folding_matches_case_variants() {
        let fold = |s: &str| {
            let mut out = Buffer::new();
            case_fold(&mut out, s.as_bytes());
            out.into_vec()
        };
        assert_eq!(fold("Foo"), fold("fOO"));
        assert_eq!(fold("ẞ"), fold("ss"));
        assert_eq!(fold("Straße"), fold("STRASSE"));
    }
}
