use std::ops::{Index, IndexMut};

use bitflags::bitflags;

use super::{
    NodeError,
    value::{Alignment, ExtensionValue, ListDelim, ListType, NodeKind, NodeValue},
};
use crate::{
    buffer::{Buffer, Chunk},
    extensions::{Extension, SyntaxExtension},
};

/// Handle to a node stored in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct NodeFlags: u8 {
        const OPEN = 1 << 0;
        const LAST_LINE_BLANK = 1 << 1;
        const LAST_LINE_CHECKED = 1 << 2;
        /// Set on a paragraph the table extension already rejected.
        const TABLE_VISITED = 1 << 3;
    }
}

/// One tree node: payload, links and source position.
#[derive(Debug)]
pub struct Node {
    pub value: NodeValue,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// Offset of a table cell's content from its recorded start column.
    pub internal_offset: usize,
    /// Raw text accumulated while the block is open.
    pub(crate) content: Buffer,
    pub(crate) flags: NodeFlags,
    /// Extension that owns this node's syntax, if any.
    pub extension: Option<Extension>,
}

impl Node {
    pub fn new(value: NodeValue) -> Self {
        Self {
            value,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
            start_line: 0,
            start_column: 0,
            end_line: 0,
            end_column: 0,
            internal_offset: 0,
            content: Buffer::new(),
            flags: NodeFlags::empty(),
            extension: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn previous(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Text accumulated for the block while it was open.
    pub fn string_content(&self) -> &[u8] {
        self.content.as_bytes()
    }

    pub fn set_string_content(&mut self, content: &[u8]) {
        self.content.clear();
        self.content.put(content);
    }

    pub fn is_open(&self) -> bool {
        self.flags.contains(NodeFlags::OPEN)
    }
}

enum Slot {
    Occupied(Node),
    Vacant,
}

/// Owner of every node of one document.
///
/// Links are indices, so the tree can be arbitrarily deep without recursive
/// ownership; [`Arena::free`] walks subtrees with an explicit work list.
#[derive(Default)]
pub struct Arena {
    slots: Vec<Slot>,
    vacant: Vec<NodeId>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.vacant.pop() {
            self.slots[id.index()] = Slot::Occupied(node);
            return id;
        }
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot::Occupied(node));
        id
    }

    pub fn alloc_value(&mut self, value: NodeValue) -> NodeId {
        self.alloc(Node::new(value))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        match self.slots.get(id.index()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self[id].kind()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self[id].first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self[id].last_child
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self[id].next
    }

    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        self[id].prev
    }

    /// Children of `id` in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            arena: self,
            next: self[id].first_child,
        }
    }

    /// Whether `parent` may hold a child of `child` kind, consulting the
    /// parent's owning extension first.
    pub fn can_contain(&self, parent: NodeId, child: NodeKind) -> bool {
        if child == NodeKind::Document {
            return false;
        }
        let node = &self[parent];
        if let Some(ext) = &node.extension {
            if let Some(answer) = ext.can_contain(node, child) {
                return answer;
            }
        }
        node.kind().can_contain(child)
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let mut cur = Some(parent);
        while let Some(id) = cur {
            if id == child {
                return Err(NodeError::Cycle);
            }
            cur = self[id].parent;
        }
        if !self.can_contain(parent, self.kind(child)) {
            return Err(NodeError::CannotContain {
                parent: self.type_string(parent),
                child: self.type_string(child),
            });
        }
        Ok(())
    }

    /// Detaches `id` from its parent and siblings. Its subtree stays intact.
    pub fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self[id];
            (node.parent, node.prev, node.next)
        };
        if let Some(p) = prev {
            self[p].next = next;
        }
        if let Some(n) = next {
            self[n].prev = prev;
        }
        if let Some(parent) = parent {
            if self[parent].first_child == Some(id) {
                self[parent].first_child = next;
            }
            if self[parent].last_child == Some(id) {
                self[parent].last_child = prev;
            }
        }
        let node = &mut self[id];
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Appends without containment or cycle checks. `child` must be detached.
    pub(crate) fn append_child_unchecked(&mut self, parent: NodeId, child: NodeId) {
        let old_last = self[parent].last_child;
        {
            let node = &mut self[child];
            node.next = None;
            node.prev = old_last;
            node.parent = Some(parent);
        }
        self[parent].last_child = Some(child);
        match old_last {
            Some(last) => self[last].next = Some(child),
            None => self[parent].first_child = Some(child),
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.check_insert(parent, child)?;
        self.unlink(child);
        self.append_child_unchecked(parent, child);
        Ok(())
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.check_insert(parent, child)?;
        self.unlink(child);
        let old_first = self[parent].first_child;
        {
            let node = &mut self[child];
            node.prev = None;
            node.next = old_first;
            node.parent = Some(parent);
        }
        self[parent].first_child = Some(child);
        match old_first {
            Some(first) => self[first].prev = Some(child),
            None => self[parent].last_child = Some(child),
        }
        Ok(())
    }

    /// Inserts `sibling` immediately before `node`.
    pub fn insert_before(&mut self, node: NodeId, sibling: NodeId) -> Result<(), NodeError> {
        let parent = self[node].parent.ok_or(NodeError::Detached)?;
        self.check_insert(parent, sibling)?;
        self.unlink(sibling);
        self.insert_before_unchecked(node, sibling);
        Ok(())
    }

    /// Inserts without containment or cycle checks. `node` must have a
    /// parent and `sibling` must be detached.
    pub(crate) fn insert_before_unchecked(&mut self, node: NodeId, sibling: NodeId) {
        let Some(parent) = self[node].parent else {
            return;
        };
        let old_prev = self[node].prev;
        {
            let s = &mut self[sibling];
            s.prev = old_prev;
            s.next = Some(node);
            s.parent = Some(parent);
        }
        self[node].prev = Some(sibling);
        match old_prev {
            Some(p) => self[p].next = Some(sibling),
            None => self[parent].first_child = Some(sibling),
        }
    }

    /// Inserts `sibling` immediately after `node`.
    pub fn insert_after(&mut self, node: NodeId, sibling: NodeId) -> Result<(), NodeError> {
        let parent = self[node].parent.ok_or(NodeError::Detached)?;
        self.check_insert(parent, sibling)?;
        self.unlink(sibling);
        self.insert_after_unchecked(node, sibling);
        Ok(())
    }

    pub(crate) fn insert_after_unchecked(&mut self, node: NodeId, sibling: NodeId) {
        let Some(parent) = self[node].parent else {
            return;
        };
        let old_next = self[node].next;
        {
            let s = &mut self[sibling];
            s.next = old_next;
            s.prev = Some(node);
            s.parent = Some(parent);
        }
        self[node].next = Some(sibling);
        match old_next {
            Some(n) => self[n].prev = Some(sibling),
            None => self[parent].last_child = Some(sibling),
        }
    }

    /// Puts `new` where `old` was and detaches `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), NodeError> {
        self.insert_before(old, new)?;
        self.unlink(old);
        Ok(())
    }

    /// Unlinks `id` and releases it together with its whole subtree.
    pub fn free(&mut self, id: NodeId) {
        self.unlink(id);
        let mut work = vec![id];
        while let Some(cur) = work.pop() {
            let mut child = self[cur].first_child;
            while let Some(c) = child {
                child = self[c].next;
                work.push(c);
            }
            self.slots[cur.index()] = Slot::Vacant;
            self.vacant.push(cur);
        }
    }

    /// Changes a node's kind in place, dropping the old payload.
    ///
    /// Fails when the node's parent could not hold the new kind.
    pub fn set_value(&mut self, id: NodeId, value: NodeValue) -> Result<(), NodeError> {
        if let Some(parent) = self[id].parent {
            let kind = value.kind();
            if !self.can_contain(parent, kind) {
                return Err(NodeError::CannotContain {
                    parent: self.type_string(parent),
                    child: kind.type_string(),
                });
            }
        }
        self[id].value = value;
        Ok(())
    }

    /// Type name, letting the owning extension refine it.
    pub fn type_string(&self, id: NodeId) -> &'static str {
        let node = &self[id];
        if let Some(name) = node.extension.as_ref().and_then(|ext| ext.type_string(node)) {
            return name;
        }
        node.kind().type_string()
    }

    pub fn literal(&self, id: NodeId) -> Option<&[u8]> {
        self[id].value.literal().map(Chunk::as_bytes)
    }

    pub fn set_literal(&mut self, id: NodeId, literal: &[u8]) -> Result<(), NodeError> {
        let found = self.type_string(id);
        let slot = self[id]
            .value
            .literal_mut()
            .ok_or(NodeError::WrongKind {
                expected: "literal",
                found,
            })?;
        *slot = Chunk::from(literal);
        Ok(())
    }

    pub fn heading_level(&self, id: NodeId) -> Option<u8> {
        match &self[id].value {
            NodeValue::Heading(h) => Some(h.level),
            _ => None,
        }
    }

    pub fn set_heading_level(&mut self, id: NodeId, level: u8) -> Result<(), NodeError> {
        if !(1..=6).contains(&level) {
            return Err(NodeError::InvalidValue("heading level must be 1-6"));
        }
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::Heading(h) => {
                h.level = level;
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "heading",
                found,
            }),
        }
    }

    fn list_data(&self, id: NodeId) -> Option<&super::value::ListData> {
        match &self[id].value {
            NodeValue::List(data) => Some(data),
            _ => None,
        }
    }

    fn list_data_mut(&mut self, id: NodeId) -> Result<&mut super::value::ListData, NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::List(data) => Ok(data),
            _ => Err(NodeError::WrongKind {
                expected: "list",
                found,
            }),
        }
    }

    pub fn list_type(&self, id: NodeId) -> Option<ListType> {
        self.list_data(id).map(|d| d.list_type)
    }

    pub fn set_list_type(&mut self, id: NodeId, list_type: ListType) -> Result<(), NodeError> {
        self.list_data_mut(id)?.list_type = list_type;
        Ok(())
    }

    pub fn list_delim(&self, id: NodeId) -> Option<ListDelim> {
        self.list_data(id).map(|d| d.delimiter)
    }

    pub fn set_list_delim(&mut self, id: NodeId, delim: ListDelim) -> Result<(), NodeError> {
        self.list_data_mut(id)?.delimiter = delim;
        Ok(())
    }

    pub fn list_start(&self, id: NodeId) -> Option<usize> {
        self.list_data(id).map(|d| d.start)
    }

    pub fn set_list_start(&mut self, id: NodeId, start: usize) -> Result<(), NodeError> {
        self.list_data_mut(id)?.start = start;
        Ok(())
    }

    pub fn list_tight(&self, id: NodeId) -> Option<bool> {
        self.list_data(id).map(|d| d.tight)
    }

    pub fn set_list_tight(&mut self, id: NodeId, tight: bool) -> Result<(), NodeError> {
        self.list_data_mut(id)?.tight = tight;
        Ok(())
    }

    /// The number on an ordered item's own marker.
    pub fn item_index(&self, id: NodeId) -> Option<usize> {
        match &self[id].value {
            NodeValue::Item(data) => Some(data.start),
            _ => None,
        }
    }

    pub fn set_item_index(&mut self, id: NodeId, index: usize) -> Result<(), NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::Item(data) => {
                data.start = index;
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "item",
                found,
            }),
        }
    }

    /// Task state of a list item; `None` for ordinary items and other kinds.
    pub fn checked(&self, id: NodeId) -> Option<bool> {
        match &self[id].value {
            NodeValue::Item(data) => data.checked,
            _ => None,
        }
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::Item(data) => {
                data.checked = Some(checked);
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "item",
                found,
            }),
        }
    }

    pub fn fence_info(&self, id: NodeId) -> Option<&[u8]> {
        match &self[id].value {
            NodeValue::CodeBlock(data) => Some(data.info.as_bytes()),
            _ => None,
        }
    }

    pub fn set_fence_info(&mut self, id: NodeId, info: &[u8]) -> Result<(), NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::CodeBlock(data) => {
                data.info = Chunk::from(info);
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "code_block",
                found,
            }),
        }
    }

    /// `(fence_length, fence_offset, fence_char)` of a fenced code block.
    pub fn fenced(&self, id: NodeId) -> Option<(usize, usize, u8)> {
        match &self[id].value {
            NodeValue::CodeBlock(data) if data.fenced => {
                Some((data.fence_length, data.fence_offset, data.fence_char))
            }
            _ => None,
        }
    }

    pub fn url(&self, id: NodeId) -> Option<&[u8]> {
        match &self[id].value {
            NodeValue::Link(data) | NodeValue::Image(data) => Some(data.url.as_bytes()),
            _ => None,
        }
    }

    pub fn set_url(&mut self, id: NodeId, url: &[u8]) -> Result<(), NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::Link(data) | NodeValue::Image(data) => {
                data.url = Chunk::from(url);
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "link",
                found,
            }),
        }
    }

    pub fn title(&self, id: NodeId) -> Option<&[u8]> {
        match &self[id].value {
            NodeValue::Link(data) | NodeValue::Image(data) => Some(data.title.as_bytes()),
            _ => None,
        }
    }

    pub fn set_title(&mut self, id: NodeId, title: &[u8]) -> Result<(), NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::Link(data) | NodeValue::Image(data) => {
                data.title = Chunk::from(title);
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "link",
                found,
            }),
        }
    }

    pub fn on_enter(&self, id: NodeId) -> Option<&[u8]> {
        match &self[id].value {
            NodeValue::CustomBlock(data) | NodeValue::CustomInline(data) => {
                Some(data.on_enter.as_bytes())
            }
            _ => None,
        }
    }

    pub fn on_exit(&self, id: NodeId) -> Option<&[u8]> {
        match &self[id].value {
            NodeValue::CustomBlock(data) | NodeValue::CustomInline(data) => {
                Some(data.on_exit.as_bytes())
            }
            _ => None,
        }
    }

    pub fn set_on_enter(&mut self, id: NodeId, text: &[u8]) -> Result<(), NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::CustomBlock(data) | NodeValue::CustomInline(data) => {
                data.on_enter = Chunk::from(text);
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "custom",
                found,
            }),
        }
    }

    pub fn set_on_exit(&mut self, id: NodeId, text: &[u8]) -> Result<(), NodeError> {
        let found = self.type_string(id);
        match &mut self[id].value {
            NodeValue::CustomBlock(data) | NodeValue::CustomInline(data) => {
                data.on_exit = Chunk::from(text);
                Ok(())
            }
            _ => Err(NodeError::WrongKind {
                expected: "custom",
                found,
            }),
        }
    }

    pub fn table_alignments(&self, id: NodeId) -> Option<&[Alignment]> {
        match &self[id].value {
            NodeValue::Extension(ExtensionValue::Table(data)) => Some(&data.alignments),
            _ => None,
        }
    }

    pub fn table_columns(&self, id: NodeId) -> Option<usize> {
        self.table_alignments(id).map(<[Alignment]>::len)
    }

    pub fn table_row_is_header(&self, id: NodeId) -> Option<bool> {
        match &self[id].value {
            NodeValue::Extension(ExtensionValue::TableRow { header }) => Some(*header),
            _ => None,
        }
    }

    pub fn table_cell_index(&self, id: NodeId) -> Option<usize> {
        match &self[id].value {
            NodeValue::Extension(ExtensionValue::TableCell { index }) => Some(*index),
            _ => None,
        }
    }

    /// Alignment of a table cell, looked up on its table.
    pub fn table_cell_alignment(&self, id: NodeId) -> Option<Alignment> {
        let NodeValue::Extension(ExtensionValue::TableCell { index }) = &self[id].value else {
            return None;
        };
        let table = self.parent(id).and_then(|row| self.parent(row))?;
        self.table_alignments(table)
            .and_then(|aligns| aligns.get(*index).copied())
    }

    pub fn extension(&self, id: NodeId) -> Option<&Extension> {
        self[id].extension.as_ref()
    }

    /// Merges runs of adjacent TEXT siblings anywhere below `root`.
    pub fn consolidate_text_nodes(&mut self, root: NodeId) {
        let mut work = vec![root];
        while let Some(parent) = work.pop() {
            let mut child = self[parent].first_child;
            while let Some(cur) = child {
                if self[cur].first_child.is_some() {
                    work.push(cur);
                }
                if self.kind(cur) == NodeKind::Text {
                    self.merge_following_text(cur);
                }
                child = self[cur].next;
            }
        }
    }

    fn merge_following_text(&mut self, first: NodeId) {
        let mut next = self[first].next;
        if !next.is_some_and(|n| self.kind(n) == NodeKind::Text) {
            return;
        }
        let mut merged = Buffer::from(self.literal(first).unwrap_or_default());
        while let Some(n) = next.filter(|&n| self.kind(n) == NodeKind::Text) {
            merged.put(self.literal(n).unwrap_or_default());
            self[first].end_column = self[n].end_column;
            next = self[n].next;
            self.free(n);
        }
        self[first].value = NodeValue::Text(merged.detach());
    }
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match &self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant => panic!("node {id:?} used after free"),
        }
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant => panic!("node {id:?} used after free"),
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("live", &self.len())
            .field("vacant", &self.vacant.len())
            .finish()
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'a> {
    arena: &'a Arena,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.arena[cur].next;
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(arena: &mut Arena, s: &str) -> NodeId {
        arena.alloc_value(NodeValue::Text(Chunk::from(s)))
    }

    fn kinds(arena: &Arena, parent: NodeId) -> Vec<&'static str> {
        arena.children(parent).map(|c| arena.type_string(c)).collect()
    }

    #[test]
    fn append_and_prepend_keep_links_consistent() {
        let mut arena = Arena::new();
        let para = arena.alloc_value(NodeValue::Paragraph);
        let a = text(&mut arena, "a");
        let b = arena.alloc_value(NodeValue::SoftBreak);
        arena.append_child(para, a).unwrap();
        arena.prepend_child(para, b).unwrap();
        assert_eq!(kinds(&arena, para), vec!["softbreak", "text"]);
        assert_eq!(arena.first_child(para), Some(b));
        assert_eq!(arena.last_child(para), Some(a));
        assert_eq!(arena.previous(a), Some(b));
    }

    #[test]
    fn containment_is_enforced() {
        let mut arena = Arena::new();
        let list = arena.alloc_value(NodeValue::List(Default::default()));
        let para = arena.alloc_value(NodeValue::Paragraph);
        let err = arena.append_child(list, para).unwrap_err();
        assert_eq!(
            err,
            NodeError::CannotContain {
                parent: "list",
                child: "paragraph"
            }
        );
    }

    #[test]
    fn cannot_insert_ancestor_below_itself() {
        let mut arena = Arena::new();
        let quote = arena.alloc_value(NodeValue::BlockQuote);
        let inner = arena.alloc_value(NodeValue::BlockQuote);
        arena.append_child(quote, inner).unwrap();
        assert_eq!(arena.append_child(inner, quote), Err(NodeError::Cycle));
    }

    #[test]
    fn insert_before_and_after() {
        let mut arena = Arena::new();
        let para = arena.alloc_value(NodeValue::Paragraph);
        let b = text(&mut arena, "b");
        arena.append_child(para, b).unwrap();
        let a = text(&mut arena, "a");
        let c = text(&mut arena, "c");
        arena.insert_before(b, a).unwrap();
        arena.insert_after(b, c).unwrap();
        let lits: Vec<_> = arena
            .children(para)
            .map(|id| arena.literal(id).unwrap().to_vec())
            .collect();
        assert_eq!(lits, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(arena.insert_before(para, a), Err(NodeError::Detached));
    }

    #[test]
    fn replace_swaps_node() {
        let mut arena = Arena::new();
        let para = arena.alloc_value(NodeValue::Paragraph);
        let old = text(&mut arena, "old");
        arena.append_child(para, old).unwrap();
        let new = arena.alloc_value(NodeValue::LineBreak);
        arena.replace(old, new).unwrap();
        assert_eq!(kinds(&arena, para), vec!["linebreak"]);
        assert_eq!(arena.parent(old), None);
    }

    #[test]
    fn free_releases_deep_trees_without_recursion() {
        let mut arena = Arena::new();
        let root = arena.alloc_value(NodeValue::Document);
        let mut parent = root;
        for _ in 0..100_000 {
            let q = arena.alloc_value(NodeValue::BlockQuote);
            arena.append_child_unchecked(parent, q);
            parent = q;
        }
        arena.free(root);
        assert!(arena.is_empty());
        assert!(arena.get(root).is_none());
    }

    #[test]
    fn vacant_slots_are_reused() {
        let mut arena = Arena::new();
        let a = arena.alloc_value(NodeValue::Emph);
        arena.free(a);
        let b = arena.alloc_value(NodeValue::Strong);
        assert_eq!(a, b);
        assert_eq!(arena.kind(b), NodeKind::Strong);
    }

    #[test]
    fn set_value_checks_parent() {
        let mut arena = Arena::new();
        let list = arena.alloc_value(NodeValue::List(Default::default()));
        let item = arena.alloc_value(NodeValue::Item(Default::default()));
        arena.append_child(list, item).unwrap();
        assert!(arena.set_value(item, NodeValue::Paragraph).is_err());
        assert_eq!(arena.kind(item), NodeKind::Item);
    }

    #[test]
    fn accessors_reject_wrong_kind() {
        let mut arena = Arena::new();
        let para = arena.alloc_value(NodeValue::Paragraph);
        assert_eq!(arena.url(para), None);
        assert!(arena.set_url(para, b"/x").is_err());
        assert!(arena.set_heading_level(para, 2).is_err());
        let h = arena.alloc_value(NodeValue::empty_of(NodeKind::Heading));
        assert!(arena.set_heading_level(h, 7).is_err());
        arena.set_heading_level(h, 3).unwrap();
        assert_eq!(arena.heading_level(h), Some(3));
    }

    #[test]
    fn item_and_cell_indices() {
        use crate::{extensions::Extension, options::Options, parsing::parse_document_with};

        let doc = parse_document_with(b"3. a\n7. b\n", Options::empty(), Vec::new());
        let list = doc.arena.first_child(doc.root).unwrap();
        let items: Vec<_> = doc.arena.children(list).map(|i| doc.arena.item_index(i)).collect();
        assert_eq!(items, vec![Some(3), Some(7)]);
        assert_eq!(doc.arena.item_index(list), None);

        let doc = parse_document_with(b"a|b\n-|-\n", Options::empty(), vec![Extension::Table]);
        let table = doc.arena.first_child(doc.root).unwrap();
        let header = doc.arena.first_child(table).unwrap();
        let cells: Vec<_> = doc
            .arena
            .children(header)
            .map(|c| doc.arena.table_cell_index(c))
            .collect();
        assert_eq!(cells, vec![Some(0), Some(1)]);
        assert_eq!(doc.arena.table_columns(table), Some(2));
    }

    #[test]
    fn consolidates_adjacent_text() {
        let mut arena = Arena::new();
        let para = arena.alloc_value(NodeValue::Paragraph);
        for s in ["a", "b", "c"] {
            let t = text(&mut arena, s);
            arena.append_child(para, t).unwrap();
        }
        let br = arena.alloc_value(NodeValue::SoftBreak);
        arena.append_child(para, br).unwrap();
        let d = text(&mut arena, "d");
        arena.append_child(para, d).unwrap();
        arena.consolidate_text_nodes(para);
        assert_eq!(kinds(&arena, para), vec!["text", "softbreak", "text"]);
        let first = arena.first_child(para).unwrap();
        assert_eq!(arena.literal(first), Some(&b"abc"[..]));
    }
}
