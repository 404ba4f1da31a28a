use crate::{
    buffer::is_space,
    node::{Arena, ListData, ListDelim, ListType, NodeFlags, NodeId, NodeKind, NodeValue},
    parsing::{
        Parser,
        scanners::{at, is_line_end},
    },
};

use super::is_space_or_tab;

/// Bullet (`-`, `+`, `*`) and ordered (`1.`, `1)`) list markers.
pub struct ListMarker;

impl ListMarker {
    pub const BULLETS: &'static [u8] = b"*-+";
    /// Ordered start numbers keep at most this many digits.
    pub const MAX_DIGITS: usize = 9;

    /// Parses a marker at `pos`, returning its length and the list data it
    /// implies. A marker that would interrupt a paragraph must be followed
    /// by content, and an ordered one must start at 1.
    pub fn parse(input: &[u8], pos: usize, interrupts_paragraph: bool) -> Option<(usize, ListData)> {
        let c = at(input, pos);
        let mut i = pos;
        let data = if Self::BULLETS.contains(&c) {
            i += 1;
            if !is_space(at(input, i)) {
                return None;
            }
            if interrupts_paragraph && Self::only_spaces_follow(input, i) {
                return None;
            }
            ListData {
                list_type: ListType::Bullet,
                bullet_char: c,
                delimiter: ListDelim::None,
                ..Default::default()
            }
        } else if c.is_ascii_digit() {
            let digits = input[i..]
                .iter()
                .take(Self::MAX_DIGITS)
                .take_while(|b| b.is_ascii_digit())
                .count();
            let start = input[i..i + digits]
                .iter()
                .fold(0usize, |n, &d| n * 10 + usize::from(d - b'0'));
            i += digits;
            if interrupts_paragraph && start != 1 {
                return None;
            }
            let delimiter = match at(input, i) {
                b'.' => ListDelim::Period,
                b')' => ListDelim::Paren,
                _ => return None,
            };
            i += 1;
            if !is_space(at(input, i)) {
                return None;
            }
            if interrupts_paragraph && Self::only_spaces_follow(input, i) {
                return None;
            }
            ListData {
                list_type: ListType::Ordered,
                bullet_char: 0,
                start,
                delimiter,
                ..Default::default()
            }
        } else {
            return None;
        };
        Some((i - pos, data))
    }

    fn only_spaces_follow(input: &[u8], mut i: usize) -> bool {
        while is_space_or_tab(at(input, i)) {
            i += 1;
        }
        is_line_end(at(input, i))
    }
}

/// List items and the lists that hold them.
pub struct ListItem;

impl ListItem {
    /// Content columns at or past which a line after a marker counts as
    /// indented code rather than padding.
    pub const MAX_PADDING: usize = 5;

    /// Continuation of an open item: enough indentation, or a blank line
    /// inside an item that already has content.
    pub fn match_prefix(parser: &mut Parser, input: &[u8], item: NodeId) -> bool {
        let width = match &parser.arena[item].value {
            NodeValue::Item(data) => data.marker_offset + data.padding,
            _ => return false,
        };
        if parser.indent >= width {
            parser.advance_offset(input, width, true);
            true
        } else if parser.blank && parser.arena.first_child(item).is_some() {
            parser.advance_offset(input, parser.first_nonspace - parser.offset, false);
            true
        } else {
            false
        }
    }

    /// Consumes a `matched`-byte marker and its padding, then opens the
    /// item, first opening a list unless `container` is a compatible one.
    pub fn open(
        parser: &mut Parser,
        input: &[u8],
        container: NodeId,
        matched: usize,
        mut data: ListData,
    ) -> NodeId {
        parser.advance_offset(input, parser.first_nonspace + matched - parser.offset, false);

        let saved_tab = parser.partially_consumed_tab;
        let saved_offset = parser.offset;
        let saved_column = parser.column;
        while parser.column - saved_column <= Self::MAX_PADDING && is_space_or_tab(at(input, parser.offset)) {
            parser.advance_offset(input, 1, true);
        }
        let spaces = parser.column - saved_column;
        if spaces >= Self::MAX_PADDING || spaces < 1 || is_line_end(at(input, parser.offset)) {
            data.padding = matched + 1;
            parser.offset = saved_offset;
            parser.column = saved_column;
            parser.partially_consumed_tab = saved_tab;
            if spaces > 0 {
                parser.advance_offset(input, 1, true);
            }
        } else {
            data.padding = matched + spaces;
        }
        data.marker_offset = parser.indent;

        let start_column = parser.first_nonspace + 1;
        let continues_list = matches!(
            &parser.arena[container].value,
            NodeValue::List(list) if Self::lists_match(list, &data)
        );
        let list = if continues_list {
            container
        } else {
            parser.add_child(container, NodeValue::List(data.clone()), start_column)
        };
        parser.add_child(list, NodeValue::Item(data), start_column)
    }

    /// Items join a list only with the same type, delimiter and bullet.
    pub fn lists_match(list: &ListData, item: &ListData) -> bool {
        list.list_type == item.list_type
            && list.delimiter == item.delimiter
            && list.bullet_char == item.bullet_char
    }

    /// Whether `node` ends with a blank line, descending through the last
    /// children of lists and items. Answers are cached on the nodes.
    pub fn ends_with_blank_line(arena: &mut Arena, mut node: NodeId) -> bool {
        loop {
            let n = &mut arena[node];
            if n.flags.contains(NodeFlags::LAST_LINE_CHECKED) {
                return n.flags.contains(NodeFlags::LAST_LINE_BLANK);
            }
            n.flags.insert(NodeFlags::LAST_LINE_CHECKED);
            match (n.kind(), n.last_child) {
                (NodeKind::List | NodeKind::Item, Some(last)) => node = last,
                _ => return n.flags.contains(NodeFlags::LAST_LINE_BLANK),
            }
        }
    }

    /// A list is loose when any item but the last ends with a blank line,
    /// or any block inside an item is followed by a blank line before a
    /// later sibling.
    pub fn is_tight(arena: &mut Arena, list: NodeId) -> bool {
        let mut item = arena.first_child(list);
        while let Some(it) = item {
            let item_next = arena.next(it);
            if arena[it].flags.contains(NodeFlags::LAST_LINE_BLANK) && item_next.is_some() {
                return false;
            }
            let mut sub = arena.first_child(it);
            while let Some(s) = sub {
                let sub_next = arena.next(s);
                if (item_next.is_some() || sub_next.is_some()) && Self::ends_with_blank_line(arena, s) {
                    return false;
                }
                sub = sub_next;
            }
            item = item_next;
        }
        true
    }
}
