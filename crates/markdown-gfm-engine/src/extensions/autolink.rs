//! Bare URLs and e-mail addresses.
//!
//! `www.` and `scheme://` links are found while inline parsing, triggered by
//! `w` and `:`. E-mail addresses can only be recognised once the `@` has
//! been seen, so they are linked in a pass over the finished tree.

use crate::{
    buffer::{Buffer, Chunk},
    node::{Arena, EventType, LinkData, Node, NodeId, NodeKind, NodeValue},
    options::Options,
    parsing::inline::Subject,
    utf8,
};

use super::SyntaxExtension;

pub struct Autolink;

impl Autolink {
    const SCHEMES: [&'static [u8]; 3] = [b"http://", b"https://", b"ftp://"];

    /// Characters allowed right before a `www.` link.
    const WWW_PRECEDERS: &'static [u8] = b"*_~(";

    /// `www.example.com/path`, linked as `http://`.
    fn www_match(subject: &mut Subject<'_>) -> Option<NodeId> {
        let pos = subject.pos();
        let input = subject.input();
        if pos > 0 {
            let before = input[pos - 1];
            if !Self::WWW_PRECEDERS.contains(&before) && !before.is_ascii_whitespace() {
                return None;
            }
        }
        let data = &input[pos..];
        if !data.starts_with(b"www.") {
            return None;
        }
        let domain = check_domain(data, false);
        if domain == 0 {
            return None;
        }
        let link_end = autolink_delim(data, extend_link(data, domain));
        if link_end == 0 {
            return None;
        }

        let mut url = Buffer::with_capacity(link_end + 7);
        url.puts("http://");
        url.put(&data[..link_end]);
        let url = url.detach();
        let text = subject.slice(pos, pos + link_end);
        subject.set_pos(pos + link_end);
        Some(Self::make_link(subject, url, text, pos, pos + link_end - 1))
    }

    /// `http://`, `https://` or `ftp://` with the scheme already consumed
    /// as text; the cursor is on the `:`.
    fn url_match(subject: &mut Subject<'_>, parent: NodeId) -> Option<NodeId> {
        let pos = subject.pos();
        let input = subject.input();
        let data = &input[pos..];
        if data.len() < 4 || data[1] != b'/' || data[2] != b'/' {
            return None;
        }
        let rewind = input[..pos]
            .iter()
            .rev()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        if !is_safe_scheme(&input[pos - rewind..]) {
            return None;
        }
        let domain = check_domain(&data[3..], true);
        if domain == 0 {
            return None;
        }
        let link_end = autolink_delim(data, extend_link(data, 3 + domain));
        if link_end == 0 {
            return None;
        }

        let start = pos - rewind;
        let end = pos + link_end;
        let url = subject.slice(start, end);
        subject.set_pos(end);
        subject.unput(parent, rewind);
        Some(Self::make_link(subject, url.clone(), url, start, end - 1))
    }

    fn make_link(subject: &mut Subject<'_>, url: Chunk, text: Chunk, start: usize, end: usize) -> NodeId {
        let link = subject.make_literal(
            NodeValue::Link(LinkData {
                url,
                title: Chunk::empty(),
            }),
            start,
            end,
        );
        let text = subject.make_text(start, end, text);
        subject.arena_mut().append_child_unchecked(link, text);
        link
    }
}

impl SyntaxExtension for Autolink {
    fn name(&self) -> &str {
        "autolink"
    }

    fn special_chars(&self) -> &[u8] {
        b":w"
    }

    fn match_inline(&self, subject: &mut Subject<'_>, parent: NodeId, c: u8) -> Option<NodeId> {
        if subject.in_bracket(false) || subject.in_bracket(true) {
            return None;
        }
        match c {
            b':' => Self::url_match(subject, parent),
            b'w' => Self::www_match(subject),
            _ => None,
        }
    }

    fn postprocess(&self, arena: &mut Arena, root: NodeId, _options: Options) {
        let mut texts = Vec::new();
        let mut link_depth = 0usize;
        for (event, node) in arena.iter(root) {
            match (arena.kind(node), event) {
                (NodeKind::Link, EventType::Enter) => link_depth += 1,
                (NodeKind::Link, EventType::Exit) => link_depth = link_depth.saturating_sub(1),
                (NodeKind::Text, EventType::Enter) if link_depth == 0 => texts.push(node),
                _ => {}
            }
        }
        for text in texts {
            link_emails(arena, text);
        }
    }
}

/// A valid host character: neither whitespace nor punctuation.
fn host_char_len(data: &[u8]) -> Option<usize> {
    let (c, len) = utf8::decode(data)?;
    (!utf8::is_space(c) && !utf8::is_punctuation(c)).then_some(len)
}

fn is_safe_scheme(link: &[u8]) -> bool {
    Autolink::SCHEMES.iter().any(|scheme| {
        link.len() > scheme.len()
            && link[..scheme.len()].eq_ignore_ascii_case(scheme)
            && host_char_len(&link[scheme.len()..]).is_some()
    })
}

/// Length of the domain at the start of `data`. Underscores are rejected in
/// the last two labels; unless `allow_short`, at least one `.` is needed.
fn check_domain(data: &[u8], allow_short: bool) -> usize {
    let (mut dots, mut uscore1, mut uscore2) = (0, 0, 0);
    let limit = data.len().saturating_sub(1);
    let mut i = 1;
    while i < limit {
        match data[i] {
            b'_' => uscore2 += 1,
            b'.' => {
                uscore1 = uscore2;
                uscore2 = 0;
                dots += 1;
            }
            b'-' => {}
            _ => match host_char_len(&data[i..]) {
                Some(len) => {
                    i += len;
                    continue;
                }
                None => break,
            },
        }
        i += 1;
    }
    if uscore1 > 0 || uscore2 > 0 {
        return 0;
    }
    if allow_short || dots > 0 { i.min(data.len()) } else { 0 }
}

/// Runs from `from` to the next whitespace or `<`.
fn extend_link(data: &[u8], from: usize) -> usize {
    from + data[from.min(data.len())..]
        .iter()
        .take_while(|&&b| !b.is_ascii_whitespace() && b != b'<')
        .count()
}

/// Trims what should not end a link: trailing punctuation, an entity-like
/// `&name;`, and `)` that have no matching `(` inside the link.
fn autolink_delim(data: &[u8], mut link_end: usize) -> usize {
    if let Some(lt) = data[..link_end].iter().position(|&b| b == b'<') {
        link_end = lt;
    }
    while link_end > 0 {
        match data[link_end - 1] {
            b'?' | b'!' | b'.' | b',' | b':' | b'*' | b'_' | b'~' | b'\'' | b'"' => link_end -= 1,
            b';' => {
                let name = data[..link_end - 1]
                    .iter()
                    .rev()
                    .take_while(|b| b.is_ascii_alphanumeric())
                    .count();
                let amp = (link_end - 1).checked_sub(name + 1);
                match amp {
                    Some(amp) if name > 0 && data[amp] == b'&' => link_end = amp,
                    _ => link_end -= 1,
                }
            }
            b')' => {
                let opening = data[..link_end].iter().filter(|&&b| b == b'(').count();
                let closing = data[..link_end].iter().filter(|&&b| b == b')').count();
                if closing <= opening {
                    break;
                }
                link_end -= 1;
            }
            _ => break,
        }
    }
    link_end
}

/// Whether `proto` ends just before `colon + 1` and is not glued to a word
/// before it. `lo` is where the searchable text starts.
fn protocol_before(seg: &[u8], lo: usize, colon: usize, proto: &[u8]) -> bool {
    let Some(start) = (colon + 1).checked_sub(proto.len()) else {
        return false;
    };
    if start < lo || &seg[start..=colon] != proto {
        return false;
    }
    start == lo || !seg[start - 1].is_ascii_alphanumeric()
}

/// Address found around one `@`.
struct EmailMatch {
    /// Segment index where the link text starts.
    start: usize,
    /// Segment index just past the link text.
    end: usize,
    auto_mailto: bool,
}

/// Looks for the next address in `seg` at or after `offset`. Returns the
/// match, or the offset to resume from.
fn find_email(seg: &[u8], mut offset: usize) -> Result<EmailMatch, Option<usize>> {
    let Some(found) = seg[offset..].iter().position(|&b| b == b'@') else {
        return Err(None);
    };
    let mut max_rewind = found;
    'at: loop {
        let at = offset + max_rewind;
        let mut auto_mailto = true;
        let mut is_xmpp = false;
        let mut rewind = 0;
        while rewind < max_rewind {
            let c = seg[at - rewind - 1];
            if c.is_ascii_alphanumeric() || b".+-_".contains(&c) {
                rewind += 1;
                continue;
            }
            if c == b':' {
                let colon = at - rewind - 1;
                if protocol_before(seg, offset, colon, b"mailto:") {
                    auto_mailto = false;
                    rewind += 1;
                    continue;
                }
                if protocol_before(seg, offset, colon, b"xmpp:") {
                    auto_mailto = false;
                    is_xmpp = true;
                    rewind += 1;
                    continue;
                }
            }
            break;
        }
        if rewind == 0 {
            return Err(Some(at + 1));
        }

        let available = seg.len() - at;
        let mut dots = 0;
        let mut link_end = 1;
        while link_end < available {
            let c = seg[at + link_end];
            if c.is_ascii_alphanumeric() {
                link_end += 1;
                continue;
            }
            if c == b'@' {
                offset = at + 1;
                max_rewind = link_end - 1;
                continue 'at;
            }
            if c == b'.' && link_end + 1 < available && seg[at + link_end + 1].is_ascii_alphanumeric() {
                dots += 1;
            } else if !(c == b'/' && is_xmpp) && c != b'-' && c != b'_' {
                break;
            }
            link_end += 1;
        }

        let last = seg[at + link_end - 1];
        if link_end < 2 || dots == 0 || (!last.is_ascii_alphabetic() && last != b'.') {
            return Err(Some(at + link_end));
        }
        let link_end = autolink_delim(&seg[at..], link_end);
        if link_end == 0 {
            return Err(Some(at + 1));
        }
        return Ok(EmailMatch {
            start: at - rewind,
            end: at + link_end,
            auto_mailto,
        });
    }
}

/// Splits `text` around every e-mail address it contains.
fn link_emails(arena: &mut Arena, mut text: NodeId) {
    let Some(data) = arena.literal(text).map(<[u8]>::to_vec) else {
        return;
    };
    if !data.contains(&b'@') {
        return;
    }
    let line = arena[text].start_line;
    let base_column = arena[text].start_column;
    let last_column = arena[text].end_column;
    let column = |i: usize| base_column + i;

    let mut start = 0;
    let mut offset = 0;
    while offset < data.len() - start {
        let seg = &data[start..];
        let found = match find_email(seg, offset) {
            Ok(found) => found,
            Err(Some(resume)) => {
                offset = resume;
                continue;
            }
            Err(None) => break,
        };

        let mut url = Buffer::with_capacity(found.end - found.start + 7);
        if found.auto_mailto {
            url.puts("mailto:");
        }
        url.put(&seg[found.start..found.end]);
        let link_text = Chunk::from(&seg[found.start..found.end]);

        let mut link = Node::new(NodeValue::Link(LinkData {
            url: url.detach(),
            title: Chunk::empty(),
        }));
        let mut inner = Node::new(NodeValue::Text(link_text));
        let mut post = Node::new(NodeValue::Text(Chunk::from(&seg[found.end..])));
        for (node, from, to) in [
            (&mut link, found.start, found.end - 1),
            (&mut inner, found.start, found.end - 1),
        ] {
            node.start_line = line;
            node.end_line = line;
            node.start_column = column(start + from);
            node.end_column = column(start + to);
        }
        post.start_line = line;
        post.end_line = line;
        post.start_column = column(start + found.end);
        post.end_column = last_column;

        let link = arena.alloc(link);
        let inner = arena.alloc(inner);
        arena.append_child_unchecked(link, inner);
        arena.insert_after_unchecked(text, link);
        let post = arena.alloc(post);
        arena.insert_after_unchecked(link, post);

        if found.start == 0 {
            arena.free(text);
        } else {
            arena[text].value = NodeValue::Text(Chunk::from(&seg[..found.start]));
            arena[text].end_column = column(start + found.start).saturating_sub(1);
        }

        text = post;
        start += found.end;
        offset = 0;
    }
    if arena.literal(text).is_some_and(<[u8]>::is_empty) {
        arena.free(text);
    }
}
