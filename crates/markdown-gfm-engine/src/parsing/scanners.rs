//! Byte-level recognisers for the fixed syntactic shapes of the grammar.
//!
//! Every scanner looks at `input[pos..]` and returns the length it matched,
//! `0`/`None` meaning no match. Small shapes are scanned by hand; the tag and
//! autolink grammars are anchored `regex::bytes` patterns compiled once.

use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::buffer::is_space;

const SPACE: &str = r"[ \t\n\x0b\x0c\r]";

static OPEN_OR_CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    let tag = r"[A-Za-z][A-Za-z0-9-]*";
    let attr_name = r"[A-Za-z_:][A-Za-z0-9:._-]*";
    let value = r#"(?:[^ \t\n\x0b\x0c\r"'=<>`\x00]+|'[^'\x00]*'|"[^"\x00]*")"#;
    let attr = format!("(?:{SPACE}+{attr_name}(?:{SPACE}*={SPACE}*{value})?)");
    let pattern = format!(r"(?-u)^(?:{tag}{attr}*{SPACE}*/?>|/{tag}{SPACE}*>)");
    Regex::new(&pattern).expect("tag pattern is valid")
});

static AUTOLINK_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^[A-Za-z][A-Za-z0-9.+-]{1,31}:[^\x00-\x20<>]*>").expect("uri pattern is valid")
});

static AUTOLINK_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    let label = r"[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?";
    let pattern = format!(r"(?-u)^[A-Za-z0-9.!#$%&'*+/=?^_`{{|}}~-]+@{label}(?:\.{label})*>");
    Regex::new(&pattern).expect("email pattern is valid")
});

static HTML_BLOCK_1: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)^<(?:script|pre|textarea|style)(?:[ \t\n\x0b\x0c\r>]|$)")
        .expect("html block pattern is valid")
});

static HTML_BLOCK_6: LazyLock<Regex> = LazyLock::new(|| {
    let names = [
        "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption",
        "center", "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt",
        "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2",
        "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link",
        "main", "menu", "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param",
        "section", "source", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title",
        "tr", "track", "ul",
    ]
    .join("|");
    let pattern = format!(r"(?i-u)^</?(?:{names})(?:[ \t\n\x0b\x0c\r]|/?>|$)");
    Regex::new(&pattern).expect("html block pattern is valid")
});

static HTML_BLOCK_END_1: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)</(?:script|pre|textarea|style)>").expect("html end pattern is valid")
});

/// Byte at `pos`, or `0` past the end.
pub(crate) fn at(input: &[u8], pos: usize) -> u8 {
    input.get(pos).copied().unwrap_or(0)
}

pub(crate) fn is_line_end(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// `[ \t\v\f\r\n]*`
pub fn spacechars(input: &[u8], pos: usize) -> usize {
    input
        .get(pos..)
        .map_or(0, |rest| rest.iter().take_while(|&&b| is_space(b)).count())
}

/// Three or more `*`, `-` or `_` (one kind), optionally spaced, then end of line.
pub fn thematic_break(line: &[u8], pos: usize) -> usize {
    let c = at(line, pos);
    if !matches!(c, b'*' | b'-' | b'_') {
        return 0;
    }
    let mut count = 0;
    let mut i = pos;
    while i < line.len() {
        match line[i] {
            b if b == c => count += 1,
            b' ' | b'\t' => {}
            b'\r' | b'\n' => break,
            _ => return 0,
        }
        i += 1;
    }
    if count >= 3 { i - pos } else { 0 }
}

/// `#{1,6}` followed by spaces/tabs or the line end. The match covers the
/// hashes plus the spaces after them.
pub fn atx_heading_start(line: &[u8], pos: usize) -> usize {
    let hashes = line[pos.min(line.len())..]
        .iter()
        .take_while(|&&b| b == b'#')
        .count();
    if !(1..=6).contains(&hashes) {
        return 0;
    }
    let after = pos + hashes;
    match at(line, after) {
        b' ' | b'\t' => {
            let spaces = line[after..]
                .iter()
                .take_while(|&&b| b == b' ' || b == b'\t')
                .count();
            hashes + spaces
        }
        b'\r' | b'\n' => hashes + 1,
        _ => 0,
    }
}

/// Opening fence: three or more backticks whose info string has no
/// backtick, or three or more tildes. Returns the fence length.
pub fn open_code_fence(line: &[u8], pos: usize) -> usize {
    let c = at(line, pos);
    if c != b'`' && c != b'~' {
        return 0;
    }
    let n = line[pos..].iter().take_while(|&&b| b == c).count();
    if n < 3 {
        return 0;
    }
    let rest = &line[pos + n..];
    let Some(eol) = rest.iter().position(|&b| is_line_end(b)) else {
        return 0;
    };
    if c == b'`' && rest[..eol].contains(&b'`') {
        return 0;
    }
    n
}

/// Closing fence: three or more of `c`, then only spaces/tabs. Returns the
/// fence length.
pub fn close_code_fence(line: &[u8], pos: usize) -> usize {
    let c = at(line, pos);
    if c != b'`' && c != b'~' {
        return 0;
    }
    let n = line[pos..].iter().take_while(|&&b| b == c).count();
    if n < 3 {
        return 0;
    }
    let mut i = pos + n;
    while at(line, i) == b' ' || at(line, i) == b'\t' {
        i += 1;
    }
    if is_line_end(at(line, i)) { n } else { 0 }
}

/// HTML block start conditions 1 through 6.
pub fn html_block_start(line: &[u8], pos: usize) -> Option<u8> {
    let rest = line.get(pos..)?;
    if !rest.starts_with(b"<") {
        return None;
    }
    if HTML_BLOCK_1.is_match(rest) {
        Some(1)
    } else if rest.starts_with(b"<!--") {
        Some(2)
    } else if rest.starts_with(b"<?") {
        Some(3)
    } else if rest.len() > 2 && rest.starts_with(b"<!") && rest[2].is_ascii_alphabetic() {
        Some(4)
    } else if rest.starts_with(b"<![CDATA[") {
        Some(5)
    } else if HTML_BLOCK_6.is_match(rest) {
        Some(6)
    } else {
        None
    }
}

/// Start condition 7: one complete open or close tag alone on the line.
pub fn html_block_start_7(line: &[u8], pos: usize) -> bool {
    if at(line, pos) != b'<' {
        return false;
    }
    let Some(m) = OPEN_OR_CLOSE_TAG.find(&line[pos + 1..]) else {
        return false;
    };
    let mut i = pos + 1 + m.end();
    while matches!(at(line, i), b' ' | b'\t' | 0x0c) {
        i += 1;
    }
    is_line_end(at(line, i))
}

/// Whether the end condition of an HTML block of `block_type` (1-5)
/// appears in `line[pos..]`.
pub fn html_block_end(block_type: u8, line: &[u8], pos: usize) -> bool {
    let rest = line.get(pos..).unwrap_or_default();
    let rest = match rest.iter().position(|&b| b == b'\n') {
        Some(eol) => &rest[..eol],
        None => rest,
    };
    match block_type {
        1 => HTML_BLOCK_END_1.is_match(rest),
        2 => contains(rest, b"-->"),
        3 => contains(rest, b"?>"),
        4 => rest.contains(&b'>'),
        5 => contains(rest, b"]]>"),
        _ => false,
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// `=+` gives level 1, `-+` level 2; trailing spaces allowed.
pub fn setext_heading_line(line: &[u8], pos: usize) -> Option<u8> {
    let c = at(line, pos);
    let level = match c {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let mut i = pos;
    while at(line, i) == c {
        i += 1;
    }
    while at(line, i) == b' ' || at(line, i) == b'\t' {
        i += 1;
    }
    is_line_end(at(line, i)).then_some(level)
}

/// `"..."`, `'...'` or `(...)` with backslash escapes.
pub fn link_title(input: &[u8], pos: usize) -> usize {
    let close = match at(input, pos) {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return 0,
    };
    let mut i = pos + 1;
    while i < input.len() {
        let c = input[i];
        if c == b'\\' && i + 1 < input.len() && input[i + 1].is_ascii_punctuation() {
            i += 2;
            continue;
        }
        if c == close {
            return i + 1 - pos;
        }
        if c == 0 || (close == b')' && c == b'(') {
            return 0;
        }
        i += 1;
    }
    0
}

/// `scheme:...>` after the opening `<`.
pub fn autolink_uri(input: &[u8], pos: usize) -> usize {
    input
        .get(pos..)
        .and_then(|rest| AUTOLINK_URI.find(rest))
        .map_or(0, |m| m.end())
}

/// `local@domain>` after the opening `<`.
pub fn autolink_email(input: &[u8], pos: usize) -> usize {
    input
        .get(pos..)
        .and_then(|rest| AUTOLINK_EMAIL.find(rest))
        .map_or(0, |m| m.end())
}

/// Open or close tag after the opening `<`.
pub fn html_tag(input: &[u8], pos: usize) -> usize {
    input
        .get(pos..)
        .and_then(|rest| OPEN_OR_CLOSE_TAG.find(rest))
        .map_or(0, |m| m.end())
}

/// `--` ... `-->` starting at the dashes after `<!`.
pub fn html_comment(input: &[u8], pos: usize) -> usize {
    let Some(rest) = input.get(pos..) else {
        return 0;
    };
    if !rest.starts_with(b"--") {
        return 0;
    }
    find(&rest[2..], b"-->").map_or(0, |end| end + 5)
}

/// Body of `<![CDATA[` ... `]]>` starting after `<![`. The length counts
/// `CDATA[` and the body, not the closing `]]>`; it runs to the end of the
/// input when there is no close.
pub fn html_cdata(input: &[u8], pos: usize) -> usize {
    let Some(rest) = input.get(pos..) else {
        return 0;
    };
    if !rest.starts_with(b"CDATA[") {
        return 0;
    }
    match find(&rest[6..], b"]]>") {
        Some(end) => 6 + end,
        None => rest.len() + 3,
    }
}

/// Declaration body after `<!`: a letter, then anything up to `>`. The
/// length excludes the `>`; it overruns the input when there is none.
pub fn html_declaration(input: &[u8], pos: usize) -> usize {
    let Some(rest) = input.get(pos..) else {
        return 0;
    };
    if !rest.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    match rest.iter().position(|&b| b == b'>') {
        Some(end) => end,
        None => rest.len() + 1,
    }
}

/// Processing-instruction body after `<?`, excluding the closing `?>`;
/// overruns the input when unterminated.
pub fn html_pi(input: &[u8], pos: usize) -> usize {
    let rest = input.get(pos..).unwrap_or_default();
    match find(rest, b"?>") {
        Some(end) => end,
        None => rest.len() + 2,
    }
}

/// Anything up to the last `>` on the line, after the opening `<`.
pub fn liberal_html_tag(input: &[u8], pos: usize) -> usize {
    let Some(rest) = input.get(pos..) else {
        return 0;
    };
    let line = match rest.iter().position(|&b| b == b'\n') {
        Some(eol) => &rest[..eol],
        None => rest,
    };
    match line.iter().rposition(|&b| b == b'>') {
        Some(0) | None => 0,
        Some(gt) => gt + 1,
    }
}

/// `[^label]:` followed by optional spaces.
pub fn footnote_definition(line: &[u8], pos: usize) -> usize {
    let Some(rest) = line.get(pos..) else {
        return 0;
    };
    if !rest.starts_with(b"[^") {
        return 0;
    }
    let label = rest[2..]
        .iter()
        .take_while(|&&b| !matches!(b, b']' | b' ' | b'\r' | b'\n' | b'\t' | 0))
        .count();
    if label == 0 || !rest[2 + label..].starts_with(b"]:") {
        return 0;
    }
    let mut i = 2 + label + 2;
    while at(rest, i) == b' ' || at(rest, i) == b'\t' {
        i += 1;
    }
    i
}

fn is_table_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | 0x0b | 0x0c)
}

fn table_delimiter_cell(input: &[u8], mut i: usize) -> Option<usize> {
    while is_table_space(at(input, i)) {
        i += 1;
    }
    if at(input, i) == b':' {
        i += 1;
    }
    let dashes = input[i.min(input.len())..]
        .iter()
        .take_while(|&&b| b == b'-')
        .count();
    if dashes == 0 {
        return None;
    }
    i += dashes;
    if at(input, i) == b':' {
        i += 1;
    }
    while is_table_space(at(input, i)) {
        i += 1;
    }
    Some(i)
}

/// Delimiter row: `|? :?-+:? (| :?-+:?)* |?` then end of line.
pub fn table_start(input: &[u8], pos: usize) -> usize {
    let mut i = pos;
    if at(input, i) == b'|' {
        i += 1;
    }
    let Some(mut end) = table_delimiter_cell(input, i) else {
        return 0;
    };
    loop {
        if at(input, end) != b'|' {
            break;
        }
        match table_delimiter_cell(input, end + 1) {
            Some(next) => end = next,
            None => {
                // trailing pipe
                end += 1;
                break;
            }
        }
    }
    while is_table_space(at(input, end)) {
        end += 1;
    }
    if at(input, end) == b'\r' {
        end += 1;
    }
    if at(input, end) == b'\n' {
        end - pos + 1
    } else {
        0
    }
}

/// Cell content: anything but an unescaped `|` or a line end.
pub fn table_cell(input: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < input.len() {
        match input[i] {
            b'\\' if at(input, i + 1) == b'|' => i += 2,
            b'|' | b'\r' | b'\n' | 0 => break,
            _ => i += 1,
        }
    }
    i - pos
}

/// `|` followed by table spaces.
pub fn table_cell_end(input: &[u8], pos: usize) -> usize {
    if at(input, pos) != b'|' {
        return 0;
    }
    let mut i = pos + 1;
    while is_table_space(at(input, i)) {
        i += 1;
    }
    i - pos
}

/// Table spaces then a line end.
pub fn table_row_end(input: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while is_table_space(at(input, i)) {
        i += 1;
    }
    if at(input, i) == b'\r' {
        i += 1;
    }
    if at(input, i) == b'\n' {
        i + 1 - pos
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"***\n", 3)]
    #[case(b"- - -\n", 5)]
    #[case(b"__ _ \n", 5)]
    #[case(b"--\n", 0)]
    #[case(b"*-*\n", 0)]
    fn thematic_breaks(#[case] line: &[u8], #[case] expected: usize) {
        assert_eq!(thematic_break(line, 0), expected);
    }

    #[rstest]
    #[case(b"# a\n", 2)]
    #[case(b"###   x\n", 6)]
    #[case(b"#\n", 2)]
    #[case(b"####### x\n", 0)]
    #[case(b"#x\n", 0)]
    fn atx_starts(#[case] line: &[u8], #[case] expected: usize) {
        assert_eq!(atx_heading_start(line, 0), expected);
    }

    #[test]
    fn fences() {
        assert_eq!(open_code_fence(b"````rust\n", 0), 4);
        assert_eq!(open_code_fence(b"``` a`b\n", 0), 0);
        assert_eq!(open_code_fence(b"~~~ a`b\n", 0), 3);
        assert_eq!(close_code_fence(b"`````  \n", 0), 5);
        assert_eq!(close_code_fence(b"``` x\n", 0), 0);
    }

    #[rstest]
    #[case(b"<script type=x>\n", Some(1))]
    #[case(b"<!-- c\n", Some(2))]
    #[case(b"<?php\n", Some(3))]
    #[case(b"<!DOCTYPE html>\n", Some(4))]
    #[case(b"<![CDATA[\n", Some(5))]
    #[case(b"</DIV>\n", Some(6))]
    #[case(b"<divx>\n", None)]
    #[case(b"<span>\n", None)]
    fn html_block_starts(#[case] line: &[u8], #[case] expected: Option<u8>) {
        assert_eq!(html_block_start(line, 0), expected);
    }

    #[test]
    fn html_block_seven_needs_a_lone_tag() {
        assert!(html_block_start_7(b"<span class=\"a\">  \n", 0));
        assert!(html_block_start_7(b"</span>\n", 0));
        assert!(!html_block_start_7(b"<span> text\n", 0));
    }

    #[test]
    fn html_block_ends() {
        assert!(html_block_end(1, b"x </Script> y\n", 0));
        assert!(html_block_end(2, b"a --> b\n", 0));
        assert!(!html_block_end(5, b"]]\n", 0));
    }

    #[test]
    fn link_titles() {
        assert_eq!(link_title(br#""a \" b" rest"#, 0), 8);
        assert_eq!(link_title(b"(a(b))", 0), 0);
        assert_eq!(link_title(b"'open", 0), 0);
    }

    #[test]
    fn autolinks() {
        assert_eq!(autolink_uri(b"http://x.y/z> tail", 0), 13);
        assert_eq!(autolink_uri(b"a:b>", 0), 0);
        assert_eq!(autolink_email(b"me@example.com>", 0), 15);
        assert_eq!(autolink_email(b"me@-bad>", 0), 0);
    }

    #[test]
    fn tags() {
        assert_eq!(html_tag(br#"a href="x" data-y='z' checked>"#, 0), 30);
        assert_eq!(html_tag(b"/em  >", 0), 6);
        assert_eq!(html_tag(b"a href=>", 0), 0);
        assert_eq!(html_comment(b"-- x -->", 0), 8);
        assert_eq!(html_comment(b"-- x ->", 0), 0);
    }

    #[test]
    fn footnote_labels() {
        assert_eq!(footnote_definition(b"[^note]:  x\n", 0), 10);
        assert_eq!(footnote_definition(b"[^]: x\n", 0), 0);
        assert_eq!(footnote_definition(b"[^a b]: x\n", 0), 0);
    }

    #[test]
    fn table_rows() {
        assert_eq!(table_start(b"|---|:-:|\n", 0), 10);
        assert_eq!(table_start(b"--- | ---\n", 0), 10);
        assert_eq!(table_start(b"| a |\n", 0), 0);
        assert_eq!(table_cell(br"a \| b | c", 0), 7);
        assert_eq!(table_cell_end(b"|  x", 0), 3);
        assert_eq!(table_row_end(b"  \r\n", 0), 4);
    }
}
