//! # Block Parsing
//!
//! Line-at-a-time construction of the block tree. Every line runs through
//! the same phases:
//!
//! 1. **Intake** (`line`): split the byte stream into lines, normalise NUL and
//!    line endings, optionally validate UTF-8
//! 2. **Matching** (`matching`): walk the open right-hand spine and let each
//!    open container consume its continuation prefix
//! 3. **Opening** (`open`): from the deepest matched container, try the block
//!    starts in fixed precedence, then each attached extension
//! 4. **Placement** (`content`): add the remainder of the line to a
//!    line-accepting block, continue a paragraph lazily, or start a paragraph
//!
//! Blocks leave the spine through `finalize`, which also does the per-kind
//! work that needs the whole block (reference definitions, code info
//! strings, list tightness).
//!
//! ## Modules
//!
//! - **`kinds`**: per-block syntax helpers (markers, prefixes, fences)
//!
//! ## Key Invariants
//!
//! - Only nodes on the right-hand spine carry the open flag
//! - List and footnote nesting stops at [`MAX_LIST_DEPTH`]
//! - Code and HTML blocks are raw: nothing opens inside them

mod content;
mod finalize;
pub mod kinds;
mod line;
mod matching;
mod open;

use crate::node::{Arena, Node, NodeFlags, NodeId, NodeKind, NodeValue};

/// Columns of indentation that make a line indented code.
pub const CODE_INDENT: usize = 4;

/// Depth past which list items and footnote definitions stop opening.
pub const MAX_LIST_DEPTH: usize = 100;

/// Allocates an open block starting at `start_line`/`start_column`.
pub(crate) fn make_block(
    arena: &mut Arena,
    value: NodeValue,
    start_line: usize,
    start_column: usize,
) -> NodeId {
    let mut node = Node::new(value);
    node.flags = NodeFlags::OPEN;
    node.start_line = start_line;
    node.start_column = start_column;
    node.end_line = start_line;
    arena.alloc(node)
}

/// Whether the inline phase parses this node's content.
pub(crate) fn contains_inlines(node: &Node) -> bool {
    use crate::extensions::SyntaxExtension;

    if let Some(answer) = node.extension.as_ref().and_then(|ext| ext.contains_inlines(node)) {
        return answer;
    }
    matches!(node.kind(), NodeKind::Paragraph | NodeKind::Heading)
}
