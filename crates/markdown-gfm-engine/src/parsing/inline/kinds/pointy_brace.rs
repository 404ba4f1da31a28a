use std::rc::Rc;

use crate::{
    buffer::Chunk,
    node::{LinkData, NodeId, NodeValue},
    options::Options,
    parsing::{
        inline::{SkipFlags, Subject, links::clean_autolink},
        scanners,
    },
};

/// `<`: URI and e-mail autolinks, then raw HTML.
pub struct PointyBrace;

impl PointyBrace {
    pub const OPEN: u8 = b'<';

    pub fn handle(subj: &mut Subject<'_>) -> NodeId {
        subj.advance();
        let input = Rc::clone(&subj.input);

        let uri = scanners::autolink_uri(&input, subj.pos);
        if uri > 0 {
            return Self::autolink(subj, uri, false);
        }
        let email = scanners::autolink_email(&input, subj.pos);
        if email > 0 {
            return Self::autolink(subj, email, true);
        }

        let len = Self::raw_html_len(subj, &input);
        if len > 0 {
            return Self::raw_html(subj, len);
        }
        if subj.options.contains(Options::LIBERAL_HTML_TAG) {
            let len = scanners::liberal_html_tag(&input, subj.pos);
            if len > 0 {
                return Self::raw_html(subj, len);
            }
        }
        subj.make_text(subj.pos - 1, subj.pos - 1, "<".into())
    }

    /// `len` counts the closing `>`.
    fn autolink(subj: &mut Subject<'_>, len: usize, email: bool) -> NodeId {
        let start = subj.pos;
        let contents = Rc::clone(&subj.input);
        let contents = &contents[start..start + len - 1];
        subj.pos += len;

        let link = subj.make_literal(
            NodeValue::Link(LinkData {
                url: clean_autolink(contents, email),
                title: Chunk::empty(),
            }),
            start - 1,
            subj.pos - 1,
        );
        let text = subj.make_text_with_entities(start, subj.pos - 2, contents);
        subj.arena.append_child_unchecked(link, text);
        link
    }

    /// Length of the raw HTML construct after the `<`, or `0`. Comments,
    /// CDATA, declarations and processing instructions found to run off the
    /// end are never scanned again in this subject.
    fn raw_html_len(subj: &mut Subject<'_>, input: &[u8]) -> usize {
        let pos = subj.pos;
        if pos + 2 > input.len() {
            return 0;
        }
        let at = |i: usize| scanners::at(input, i);
        let remaining = input.len() - pos;
        match at(pos) {
            b'!' => {
                if subj.flags.contains(SkipFlags::HTML_COMMENT) {
                    return 0;
                }
                match at(pos + 1) {
                    b'-' if at(pos + 2) == b'-' => {
                        if at(pos + 3) == b'>' {
                            4
                        } else if at(pos + 3) == b'-' && at(pos + 4) == b'>' {
                            5
                        } else {
                            let len = scanners::html_comment(input, pos + 1);
                            if len == 0 {
                                subj.flags |= SkipFlags::HTML_COMMENT;
                                0
                            } else {
                                len + 1
                            }
                        }
                    }
                    b'[' => {
                        if subj.flags.contains(SkipFlags::HTML_CDATA) {
                            return 0;
                        }
                        let len = scanners::html_cdata(input, pos + 2);
                        Self::bounded(subj, len, 5, remaining, SkipFlags::HTML_CDATA)
                    }
                    _ => {
                        if subj.flags.contains(SkipFlags::HTML_DECLARATION) {
                            return 0;
                        }
                        let len = scanners::html_declaration(input, pos + 1);
                        Self::bounded(subj, len, 2, remaining, SkipFlags::HTML_DECLARATION)
                    }
                }
            }
            b'?' => {
                if subj.flags.contains(SkipFlags::HTML_PI) {
                    return 0;
                }
                let len = scanners::html_pi(input, pos + 1) + 3;
                if len > remaining {
                    subj.flags |= SkipFlags::HTML_PI;
                    return 0;
                }
                len
            }
            _ => scanners::html_tag(input, pos),
        }
    }

    /// Adds the fixed prefix and suffix to a body length and checks the
    /// whole construct fits in what is left of the input.
    fn bounded(subj: &mut Subject<'_>, body: usize, affixes: usize, remaining: usize, flag: SkipFlags) -> usize {
        if body == 0 {
            return 0;
        }
        let len = body + affixes;
        if len > remaining {
            subj.flags |= flag;
            return 0;
        }
        len
    }

    fn raw_html(subj: &mut Subject<'_>, len: usize) -> NodeId {
        let raw = subj.slice(subj.pos - 1, subj.pos + len);
        subj.pos += len;
        let node = subj.make_literal(NodeValue::HtmlInline(raw), subj.pos - len - 1, subj.pos - 1);
        subj.adjust_newlines(node, len, 1);
        node
    }
}
