use crate::{
    buffer::Chunk,
    extensions::{Extension, SyntaxExtension},
    node::{NodeId, NodeValue},
    utf8,
};

use super::{Subject, kinds::SmartPunct};

/// Handle to an entry of a subject's delimiter stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelimId(usize);

/// A run of delimiter characters waiting to be paired.
#[derive(Debug, Clone, Copy)]
pub struct Delimiter {
    pub(crate) delim_char: u8,
    pub(crate) can_open: bool,
    pub(crate) can_close: bool,
    /// Text node holding the run's characters.
    pub(crate) inl_text: NodeId,
    /// Subject position just past the run.
    pub(crate) position: usize,
    /// Length of the run when it was pushed.
    pub(crate) length: usize,
    pub(crate) previous: Option<DelimId>,
    pub(crate) next: Option<DelimId>,
    removed: bool,
}

impl Delimiter {
    pub fn delim_char(&self) -> u8 {
        self.delim_char
    }

    pub fn can_open(&self) -> bool {
        self.can_open
    }

    pub fn can_close(&self) -> bool {
        self.can_close
    }

    pub fn inl_text(&self) -> NodeId {
        self.inl_text
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn previous(&self) -> Option<DelimId> {
        self.previous
    }

    pub fn next(&self) -> Option<DelimId> {
        self.next
    }
}

/// Result of scanning a run of one delimiter character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterRun {
    pub count: usize,
    pub left_flanking: bool,
    pub right_flanking: bool,
    pub punct_before: bool,
    pub punct_after: bool,
}

/// Classifies the characters around a run as the flanking rules see them.
fn flanking(count: usize, before: char, after: char) -> DelimiterRun {
    let space_before = utf8::is_space(before);
    let space_after = utf8::is_space(after);
    let punct_before = utf8::is_punctuation(before);
    let punct_after = utf8::is_punctuation(after);
    DelimiterRun {
        count,
        left_flanking: count > 0 && !space_after && (!punct_after || space_before || punct_before),
        right_flanking: count > 0 && !space_before && (!punct_before || space_after || punct_after),
        punct_before,
        punct_after,
    }
}

impl<'a> Subject<'a> {
    pub fn delimiter(&self, id: DelimId) -> &Delimiter {
        &self.delimiters[id.0]
    }

    /// Top of the delimiter stack.
    pub fn last_delimiter(&self) -> Option<DelimId> {
        self.last_delim
    }

    /// Scans up to `max` copies of `c` at the cursor and classifies the run.
    /// The cursor ends up past the run.
    pub fn scan_delimiters(&mut self, max: usize, c: u8) -> DelimiterRun {
        let before = self.char_before(false);
        let mut count = 0;
        while self.peek() == c && count < max {
            count += 1;
            self.advance();
        }
        let after = self.char_after(false);
        flanking(count, before, after)
    }

    pub fn push_delimiter(&mut self, c: u8, can_open: bool, can_close: bool, inl_text: NodeId) {
        let length = self.arena.literal(inl_text).map_or(0, <[u8]>::len);
        let id = DelimId(self.delimiters.len());
        self.delimiters.push(Delimiter {
            delim_char: c,
            can_open,
            can_close,
            inl_text,
            position: self.pos,
            length,
            previous: self.last_delim,
            next: None,
            removed: false,
        });
        if let Some(prev) = self.last_delim {
            self.delimiters[prev.0].next = Some(id);
        }
        self.last_delim = Some(id);
    }

    /// Unlinks a delimiter from the stack. Its text node is left alone.
    pub fn remove_delimiter(&mut self, id: DelimId) {
        let Delimiter {
            previous,
            next,
            removed,
            ..
        } = self.delimiters[id.0];
        if removed {
            return;
        }
        match next {
            Some(n) => self.delimiters[n.0].previous = previous,
            None => self.last_delim = previous,
        }
        if let Some(p) = previous {
            self.delimiters[p.0].next = next;
        }
        self.delimiters[id.0].removed = true;
    }

    /// Code point before the cursor; with `skip`, emphasis-like extension
    /// characters are looked through. Start of input reads as a newline.
    fn char_before(&self, skip: bool) -> char {
        if self.pos == 0 {
            return '\n';
        }
        let mut start = self.pos - 1;
        while start > 0
            && ((self.input[start] >> 6) == 2 || (skip && self.specials.is_skip(self.input[start])))
        {
            start -= 1;
        }
        match utf8::decode(&self.input[start..self.pos]) {
            Some((c, _)) if !(skip && self.is_skip_char(c)) => c,
            _ => '\n',
        }
    }

    fn char_after(&self, skip: bool) -> char {
        let mut pos = self.pos;
        if skip {
            while pos < self.input.len() && self.specials.is_skip(self.input[pos]) {
                pos += 1;
            }
        }
        match utf8::decode(self.input.get(pos..).unwrap_or_default()) {
            Some((c, _)) if !(skip && self.is_skip_char(c)) => c,
            _ => '\n',
        }
    }

    fn is_skip_char(&self, c: char) -> bool {
        u8::try_from(u32::from(c)).is_ok_and(|b| self.specials.is_skip(b))
    }

    /// Scans a `*`/`_` run or a single quote and decides whether it may
    /// open and close emphasis.
    fn scan_delims(&mut self, c: u8) -> (usize, bool, bool) {
        let before = self.char_before(true);
        let mut count = 0;
        if c == b'\'' || c == b'"' {
            count = 1;
            self.advance();
        } else {
            while self.peek() == c {
                count += 1;
                self.advance();
            }
        }
        let after = if self.is_eof() { '\n' } else { self.char_after(true) };
        let run = flanking(count, before, after);
        let (can_open, can_close) = match c {
            b'_' => (
                run.left_flanking && (!run.right_flanking || run.punct_before),
                run.right_flanking && (!run.left_flanking || run.punct_after),
            ),
            b'\'' | b'"' => (
                run.left_flanking && !run.right_flanking && before != ']' && before != ')',
                run.right_flanking,
            ),
            _ => (run.left_flanking, run.right_flanking),
        };
        (count, can_open, can_close)
    }

    pub(super) fn handle_delim(&mut self, c: u8, smart: bool) -> NodeId {
        let (count, can_open, can_close) = self.scan_delims(c);
        let is_quote = c == b'\'' || c == b'"';
        let contents = match c {
            b'\'' if smart => Chunk::from(SmartPunct::RIGHT_SINGLE_QUOTE),
            b'"' if smart => Chunk::from(if can_close {
                SmartPunct::RIGHT_DOUBLE_QUOTE
            } else {
                SmartPunct::LEFT_DOUBLE_QUOTE
            }),
            _ => self.slice(self.pos - count, self.pos),
        };
        let text = self.make_text(self.pos - count, self.pos - 1, contents);
        if (can_open || can_close) && (!is_quote || smart) {
            self.push_delimiter(c, can_open, can_close, text);
        }
        text
    }

    fn extension_for(&self, c: u8) -> Option<&'a Extension> {
        let extensions = self.extensions;
        extensions.iter().find(|ext| ext.special_chars().contains(&c))
    }

    /// Pairs every closer above `stack_bottom` with the nearest compatible
    /// opener, then drops whatever is left above `stack_bottom`.
    pub(super) fn process_emphasis(&mut self, stack_bottom: usize) {
        let mut openers_bottom = [[stack_bottom; 256]; 3];

        let mut closer = None;
        let mut candidate = self.last_delim;
        while let Some(c) = candidate.filter(|&c| self.delimiter(c).position >= stack_bottom) {
            closer = Some(c);
            candidate = self.delimiter(c).previous;
        }

        while let Some(cl) = closer {
            let current = *self.delimiter(cl);
            if !current.can_close {
                closer = current.next;
                continue;
            }
            let char_ix = usize::from(current.delim_char);
            let bottom = openers_bottom[current.length % 3][char_ix];

            let mut matched = None;
            let mut opener = current.previous;
            while let Some(op) = opener {
                let o = self.delimiter(op);
                if o.position < stack_bottom || o.position < bottom {
                    break;
                }
                // runs whose lengths straddle a multiple of three only pair
                // when neither side could go the other way
                if o.can_open
                    && o.delim_char == current.delim_char
                    && (!(current.can_open || o.can_close)
                        || current.length % 3 == 0
                        || (o.length + current.length) % 3 != 0)
                {
                    matched = Some(op);
                    break;
                }
                opener = o.previous;
            }

            if let Some(ext) = self.extension_for(current.delim_char) {
                closer = match matched {
                    Some(op) => ext.insert_inline_from_delim(self, op, cl),
                    None => current.next,
                };
            } else if matches!(current.delim_char, b'*' | b'_') {
                closer = match matched {
                    Some(op) => self.insert_emph(op, cl),
                    None => current.next,
                };
            } else {
                let (left, right) = if current.delim_char == b'\'' {
                    (SmartPunct::LEFT_SINGLE_QUOTE, SmartPunct::RIGHT_SINGLE_QUOTE)
                } else {
                    (SmartPunct::LEFT_DOUBLE_QUOTE, SmartPunct::RIGHT_DOUBLE_QUOTE)
                };
                self.set_text(current.inl_text, Chunk::from(right));
                closer = current.next;
                if let Some(op) = matched {
                    let opener_text = self.delimiter(op).inl_text;
                    self.set_text(opener_text, Chunk::from(left));
                    self.remove_delimiter(op);
                    self.remove_delimiter(cl);
                }
            }

            if matched.is_none() {
                openers_bottom[current.length % 3][char_ix] = current.position;
                if !current.can_open {
                    self.remove_delimiter(cl);
                }
            }
        }

        while let Some(top) = self.last_delim.filter(|&d| self.delimiter(d).position >= stack_bottom) {
            self.remove_delimiter(top);
        }
    }

    fn set_text(&mut self, node: NodeId, text: Chunk) {
        self.arena[node].value = NodeValue::Text(text);
    }

    /// Shortens a text node's literal to its first `len` bytes.
    pub(crate) fn truncate_text(&mut self, node: NodeId, len: usize) {
        if let Some(lit) = self.arena[node].value.literal_mut() {
            *lit = lit.slice(0..len);
        }
    }

    /// Wraps everything between a matched opener and closer in EMPH (one
    /// character used from each side) or STRONG (two). Returns the closer
    /// to examine next.
    fn insert_emph(&mut self, opener: DelimId, closer: DelimId) -> Option<DelimId> {
        let opener_inl = self.delimiter(opener).inl_text;
        let closer_inl = self.delimiter(closer).inl_text;
        let opener_chars = self.arena.literal(opener_inl).map_or(0, <[u8]>::len);
        let closer_chars = self.arena.literal(closer_inl).map_or(0, <[u8]>::len);

        let used = if opener_chars >= 2 && closer_chars >= 2 { 2 } else { 1 };
        let opener_left = opener_chars.saturating_sub(used);
        let closer_left = closer_chars.saturating_sub(used);
        self.truncate_text(opener_inl, opener_left);
        self.truncate_text(closer_inl, closer_left);

        let mut between = self.delimiter(closer).previous;
        while let Some(d) = between.filter(|&d| d != opener) {
            between = self.delimiter(d).previous;
            self.remove_delimiter(d);
        }

        let value = if used == 1 { NodeValue::Emph } else { NodeValue::Strong };
        let emph = self.arena.alloc_value(value);
        let mut tmp = self.arena.next(opener_inl);
        while let Some(node) = tmp.filter(|&n| n != closer_inl) {
            tmp = self.arena.next(node);
            self.arena.unlink(node);
            self.arena.append_child_unchecked(emph, node);
        }
        self.arena.insert_after_unchecked(opener_inl, emph);
        let (start_line, start_column) = {
            let o = &self.arena[opener_inl];
            (o.start_line, o.start_column)
        };
        let (end_line, end_column) = {
            let c = &self.arena[closer_inl];
            (c.end_line, c.end_column)
        };
        let e = &mut self.arena[emph];
        e.start_line = start_line;
        e.start_column = start_column;
        e.end_line = end_line;
        e.end_column = end_column;

        if opener_left == 0 {
            self.arena.free(opener_inl);
            self.remove_delimiter(opener);
        }
        if closer_left == 0 {
            self.arena.free(closer_inl);
            let next = self.delimiter(closer).next;
            self.remove_delimiter(closer);
            return next;
        }
        Some(closer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::Options, parsing::parse_document};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn dump(input: &str) -> String {
        parse_document(input.as_bytes(), Options::empty()).dump()
    }

    #[rstest]
    #[case('a', 'b', true, true)]
    #[case(' ', 'b', true, false)]
    #[case('a', ' ', false, true)]
    #[case('\n', '\n', false, false)]
    #[case('(', 'a', true, false)]
    #[case('a', '.', false, true)]
    fn flanking_classes(
        #[case] before: char,
        #[case] after: char,
        #[case] left: bool,
        #[case] right: bool,
    ) {
        let run = flanking(1, before, after);
        assert_eq!((run.left_flanking, run.right_flanking), (left, right));
    }

    #[test]
    fn empty_run_never_flanks() {
        let run = flanking(0, 'a', 'b');
        assert!(!run.left_flanking && !run.right_flanking);
    }

    #[test]
    fn intraword_underscore_is_literal() {
        assert_eq!(
            dump("snake_case_name"),
            "document\n  paragraph\n    text \"snake_case_name\"\n"
        );
    }

    #[test]
    fn intraword_star_is_emphasis() {
        assert_eq!(
            dump("a*b*c"),
            "document\n  paragraph\n    text \"a\"\n    emph\n      text \"b\"\n    text \"c\"\n"
        );
    }

    #[test]
    fn unicode_punctuation_counts_for_flanking() {
        assert_eq!(
            dump("\u{201c}*a*\u{201d}"),
            "document\n  paragraph\n    text \"\u{201c}\"\n    emph\n      text \"a\"\n    text \"\u{201d}\"\n"
        );
    }

    #[test]
    fn leftover_closer_stays_literal() {
        assert_eq!(
            dump("**a*"),
            "document\n  paragraph\n    text \"*\"\n    emph\n      text \"a\"\n"
        );
    }

    #[test]
    fn quotes_are_literal_without_smart() {
        assert_eq!(
            dump("'a' \"b\""),
            "document\n  paragraph\n    text \"'a' \\\"b\\\"\"\n"
        );
    }

    #[test]
    fn smart_apostrophe_inside_a_word() {
        let doc = parse_document(b"don't", Options::SMART);
        assert_eq!(
            doc.dump(),
            "document\n  paragraph\n    text \"don\u{2019}t\"\n"
        );
    }

    #[test]
    fn long_unmatched_runs_stay_linear() {
        let input = "*a ".repeat(20_000);
        let doc = parse_document(input.as_bytes(), Options::empty());
        let para = doc.arena.first_child(doc.root).unwrap();
        assert_eq!(doc.arena.children(para).count(), 1);
    }
}
