use crate::{
    parsing::scanners::link_title,
    references::ReferenceMap,
};

use super::{
    Cursor,
    links::{clean_title, clean_url, link_label, scan_link_url},
};

/// Parses one `[label]: destination "title"` definition at the start of
/// `input` and records it in `refmap`.
///
/// Returns the bytes consumed through the definition's line end, or `0`
/// when `input` does not start with a definition. A title that is followed
/// by anything but a line end is dropped and the definition ends before it.
pub fn parse_reference_inline(input: &[u8], refmap: &mut ReferenceMap) -> usize {
    let mut cur = Cursor::new(input);

    let Some(label) = link_label(&mut cur).filter(|l| !l.is_empty()) else {
        return 0;
    };
    if cur.peek() != b':' {
        return 0;
    }
    cur.bump();

    cur.skip_spaces_and_newline();
    let Some((url_len, url)) = scan_link_url(input, cur.pos()) else {
        return 0;
    };
    cur.bump_n(url_len);

    let before_title = cur.pos();
    cur.skip_spaces_and_newline();
    let title_len = if cur.pos() == before_title {
        0
    } else {
        link_title(input, cur.pos())
    };
    let mut title = &input[..0];
    if title_len > 0 {
        title = &input[cur.pos()..cur.pos() + title_len];
        cur.bump_n(title_len);
    } else {
        cur.set_pos(before_title);
    }

    cur.skip_spaces();
    if !cur.skip_line_end() {
        if title_len == 0 {
            return 0;
        }
        cur.set_pos(before_title);
        cur.skip_spaces();
        if !cur.skip_line_end() {
            return 0;
        }
        title = &input[..0];
    }

    if !refmap.add_reference(label, clean_url(&input[url]), clean_title(title)) {
        log::trace!("ignoring reference with a blank label");
    }
    cur.pos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(input: &[u8]) -> (usize, ReferenceMap) {
        let mut map = ReferenceMap::new();
        let used = parse_reference_inline(input, &mut map);
        (used, map)
    }

    #[test]
    fn full_definition() {
        let (used, mut map) = parse(b"[Foo Bar]:\n  <my url> 'the title'\nrest");
        assert_eq!(used, 34);
        let r = map.lookup(b"foo   bar").unwrap();
        assert_eq!(r.url.as_bytes(), b"my url");
        assert_eq!(r.title.as_bytes(), b"the title");
    }

    #[test]
    fn title_on_the_next_line() {
        let (used, mut map) = parse(b"[a]: /u\n\"t\"\n");
        assert_eq!(used, 12);
        assert_eq!(map.lookup(b"a").unwrap().title.as_bytes(), b"t");
    }

    #[test]
    fn trailing_text_after_title_drops_it() {
        let (used, mut map) = parse(b"[a]: /u\n\"t\" ok\n");
        assert_eq!(used, 8);
        let r = map.lookup(b"a").unwrap();
        assert_eq!(r.url.as_bytes(), b"/u");
        assert_eq!(r.title.as_bytes(), b"");
    }

    #[rstest]
    #[case(b"[]: /u\n")]
    #[case(b"[a] /u\n")]
    #[case(b"[a]:\n\n/u\n")]
    #[case(b"[a]: /u \"t\" x\n")]
    #[case(b"[a]: <u\n")]
    fn not_definitions(#[case] input: &[u8]) {
        assert_eq!(parse(input).0, 0);
    }

    #[test]
    fn first_definition_wins() {
        let mut map = ReferenceMap::new();
        parse_reference_inline(b"[a]: /first\n", &mut map);
        parse_reference_inline(b"[A]: /second\n", &mut map);
        assert_eq!(map.lookup(b"a").unwrap().url.as_bytes(), b"/first");
    }

    #[test]
    fn bare_destination_needs_a_terminator() {
        assert_eq!(parse(b"[a]: /u").0, 0);
        assert_eq!(parse(b"[a]: /u\n").0, 8);
    }
}
