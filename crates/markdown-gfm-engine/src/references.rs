//! # Reference and Footnote Maps
//!
//! Label-keyed lookup tables filled while blocks are finalized and queried
//! during inline parsing.
//!
//! Entries are appended in document order. The first lookup sorts them once
//! by normalized label (ties keep insertion order, so the first definition
//! of a label wins) and later lookups binary-search. Every successful lookup
//! charges the entry's size against a budget; once the budget is spent,
//! lookups report "not found" so that a small document cannot expand into a
//! huge one through repeated references.

use crate::{
    buffer::{Buffer, Chunk},
    node::NodeId,
    utf8,
};

/// Longest label, in bytes, that can name a reference.
pub const MAX_LINK_LABEL_LENGTH: usize = 1000;

/// Case-folds, trims and collapses whitespace. `None` if nothing remains.
pub fn normalize_label(label: &[u8]) -> Option<Vec<u8>> {
    if label.is_empty() {
        return None;
    }
    let mut normalized = Buffer::new();
    utf8::case_fold(&mut normalized, label);
    normalized.trim();
    normalized.normalize_whitespace();
    if normalized.is_empty() {
        return None;
    }
    Some(normalized.into_vec())
}

#[derive(Debug)]
struct Entry<T> {
    label: Vec<u8>,
    size: usize,
    value: T,
}

/// Append-then-sort label map with an expansion budget.
#[derive(Debug)]
pub struct Map<T> {
    entries: Vec<Entry<T>>,
    sorted: bool,
    ref_size: usize,
    max_ref_size: usize,
}

impl<T> Default for Map<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            sorted: false,
            ref_size: 0,
            max_ref_size: usize::MAX,
        }
    }
}

impl<T> Map<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Caps the total size successful lookups may charge.
    pub fn set_max_ref_size(&mut self, max: usize) {
        self.max_ref_size = max;
    }

    /// Size charged so far.
    pub fn ref_size(&self) -> usize {
        self.ref_size
    }

    /// Adds an entry under `label`; returns `false` if the label normalizes
    /// to nothing.
    pub fn insert(&mut self, label: &[u8], value: T, size: usize) -> bool {
        let Some(label) = normalize_label(label) else {
            return false;
        };
        self.entries.push(Entry { label, size, value });
        self.sorted = false;
        true
    }

    fn sort(&mut self) {
        // stable: equal labels keep document order, so dedup keeps the first
        self.entries.sort_by(|a, b| a.label.cmp(&b.label));
        self.entries.dedup_by(|later, earlier| later.label == earlier.label);
        self.sorted = true;
    }

    /// Finds the entry for `label`, charging its size against the budget.
    pub fn lookup(&mut self, label: &[u8]) -> Option<&T> {
        if label.is_empty() || label.len() > MAX_LINK_LABEL_LENGTH || self.entries.is_empty() {
            return None;
        }
        let norm = normalize_label(label)?;
        if !self.sorted {
            self.sort();
        }
        let ix = self
            .entries
            .binary_search_by(|e| e.label.as_slice().cmp(&norm))
            .ok()?;
        let size = self.entries[ix].size;
        if size > self.max_ref_size.saturating_sub(self.ref_size) {
            log::warn!("reference expansion budget of {} bytes exhausted", self.max_ref_size);
            return None;
        }
        self.ref_size += size;
        Some(&self.entries[ix].value)
    }

    /// Entries in their current order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.value)
    }
}

/// Target of a `[label]: url "title"` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub url: Chunk,
    pub title: Chunk,
}

pub type ReferenceMap = Map<Reference>;

impl ReferenceMap {
    /// Registers a link reference definition.
    pub fn add_reference(&mut self, label: &[u8], url: Chunk, title: Chunk) -> bool {
        let size = url.len() + title.len();
        self.insert(label, Reference { url, title }, size)
    }
}

/// Footnote label to definition node.
pub type FootnoteMap = Map<NodeId>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference(url: &str) -> (Chunk, Chunk) {
        (Chunk::from(url), Chunk::empty())
    }

    #[test]
    fn normalization_folds_and_collapses() {
        assert_eq!(normalize_label(b"  Foo \n  BAR "), normalize_label(b"foo bar"));
        assert_eq!(normalize_label(b" \t\n"), None);
        assert_eq!(normalize_label(b""), None);
    }

    #[test]
    fn first_definition_wins() {
        let mut map = ReferenceMap::new();
        let (u1, t1) = reference("/first");
        let (u2, t2) = reference("/second");
        assert!(map.add_reference(b"Foo", u1, t1));
        assert!(map.add_reference(b"foo", u2, t2));
        assert_eq!(map.lookup(b"FOO").unwrap().url.as_bytes(), b"/first");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn blank_labels_are_rejected() {
        let mut map = ReferenceMap::new();
        let (u, t) = reference("/x");
        assert!(!map.add_reference(b"   ", u, t));
        assert!(map.is_empty());
    }

    #[test]
    fn missing_label_is_none() {
        let mut map = ReferenceMap::new();
        let (u, t) = reference("/x");
        map.add_reference(b"a", u, t);
        assert!(map.lookup(b"b").is_none());
        assert!(map.lookup(&[b'a'; MAX_LINK_LABEL_LENGTH + 1]).is_none());
    }

    #[test]
    fn budget_stops_expansion() {
        let mut map = ReferenceMap::new();
        let (u, t) = reference("0123456789");
        map.add_reference(b"x", u, t);
        map.set_max_ref_size(25);
        assert!(map.lookup(b"x").is_some());
        assert!(map.lookup(b"x").is_some());
        assert!(map.lookup(b"x").is_none());
        assert_eq!(map.ref_size(), 20);
    }

    #[test]
    fn inserting_after_lookup_resorts() {
        let mut map = ReferenceMap::new();
        let (u, t) = reference("/b");
        map.add_reference(b"b", u, t);
        assert!(map.lookup(b"a").is_none());
        let (u, t) = reference("/a");
        map.add_reference(b"a", u, t);
        assert_eq!(map.lookup(b"a").unwrap().url.as_bytes(), b"/a");
    }
}
