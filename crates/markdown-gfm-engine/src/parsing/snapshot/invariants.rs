use crate::node::{Arena, EventType, NodeId, NodeKind};

/// Panics on the first structural inconsistency in the tree under `root`.
pub fn check(arena: &Arena, root: NodeId) {
    assert!(
        arena.parent(root).is_none(),
        "root {root:?} has a parent"
    );
    for (event, node) in arena.iter(root) {
        if event == EventType::Exit {
            continue;
        }
        let mut prev: Option<NodeId> = None;
        for child in arena.children(node) {
            assert_eq!(
                arena.parent(child),
                Some(node),
                "{} child of {} does not point back at it",
                arena.type_string(child),
                arena.type_string(node)
            );
            assert_eq!(
                arena.previous(child),
                prev,
                "broken sibling link before {} under {}",
                arena.type_string(child),
                arena.type_string(node)
            );
            assert!(
                arena.can_contain(node, arena.kind(child)),
                "{} cannot contain {}",
                arena.type_string(node),
                arena.type_string(child)
            );
            if let Some(p) = prev {
                assert!(
                    !(arena.kind(p) == NodeKind::Text && arena.kind(child) == NodeKind::Text),
                    "adjacent text nodes under {}",
                    arena.type_string(node)
                );
            }
            prev = Some(child);
        }
        assert_eq!(
            arena.last_child(node),
            prev,
            "last child of {} is stale",
            arena.type_string(node)
        );
    }
}
