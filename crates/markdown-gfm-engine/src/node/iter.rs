use super::arena::{Arena, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Enter,
    Exit,
}

/// Pre-order walk position that holds no borrow of the tree.
///
/// Consumers that mutate the tree between steps drive a `Walker` with
/// explicit arena access; read-only consumers use [`Iter`].
#[derive(Debug, Clone)]
pub struct Walker {
    root: NodeId,
    cur: Option<(EventType, NodeId)>,
    next: Option<(EventType, NodeId)>,
}

impl Walker {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            cur: None,
            next: Some((EventType::Enter, root)),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The event most recently returned by [`Walker::next`].
    pub fn current(&self) -> Option<(EventType, NodeId)> {
        self.cur
    }

    /// Advances the walk; leaves yield only `Enter`.
    pub fn next(&mut self, arena: &Arena) -> Option<(EventType, NodeId)> {
        let (event, node) = self.next?;
        self.cur = Some((event, node));
        let n = &arena[node];
        self.next = if event == EventType::Enter && !n.kind().is_leaf() {
            match n.first_child() {
                Some(child) => Some((EventType::Enter, child)),
                None => Some((EventType::Exit, node)),
            }
        } else if node == self.root {
            None
        } else if let Some(sibling) = n.next() {
            Some((EventType::Enter, sibling))
        } else {
            n.parent().map(|parent| (EventType::Exit, parent))
        };
        self.cur
    }

    /// Repositions so that `(event, node)` becomes the current event.
    ///
    /// Resetting to `(Exit, node)` skips the rest of `node`'s subtree.
    pub fn reset(&mut self, arena: &Arena, node: NodeId, event: EventType) {
        self.next = Some((event, node));
        self.next(arena);
    }
}

/// Borrowing pre-order iterator yielding `(EventType, NodeId)` pairs.
pub struct Iter<'a> {
    arena: &'a Arena,
    walker: Walker,
}

impl<'a> Iter<'a> {
    pub fn new(arena: &'a Arena, root: NodeId) -> Self {
        Self {
            arena,
            walker: Walker::new(root),
        }
    }

    pub fn reset(&mut self, node: NodeId, event: EventType) {
        self.walker.reset(self.arena, node, event);
    }
}

impl Iterator for Iter<'_> {
    type Item = (EventType, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next(self.arena)
    }
}

impl Arena {
    pub fn iter(&self, root: NodeId) -> Iter<'_> {
        Iter::new(self, root)
    }
}
