//! # Document Tree
//!
//! Arena-backed tree of block and inline nodes.
//!
//! ## Modules
//!
//! - **`value`**: `NodeValue` (kind plus payload), `NodeKind`, payload structs
//! - **`arena`**: `Arena` storage, `Node`, structural mutation and accessors
//! - **`iter`**: `Walker`/`Iter` pre-order enter/exit traversal
//!
//! ## Invariants
//!
//! - Every parse produces exactly one `Document` root
//! - A node has at most one parent; siblings form a doubly-linked list
//! - Leaf kinds are entered but never exited by the iterator

pub mod arena;
pub mod iter;
pub mod value;

pub use arena::{Arena, Children, Node, NodeId};
pub(crate) use arena::NodeFlags;
pub use iter::{EventType, Iter, Walker};
pub use value::{
    Alignment, CodeBlockData, CustomData, ExtensionKind, ExtensionValue,
    FootnoteDefinitionData, FootnoteReferenceData, HeadingData, HtmlBlockData, LinkData,
    ListData, ListDelim, ListType, NodeKind, NodeValue, TableData,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("{parent} cannot contain {child}")]
    CannotContain {
        parent: &'static str,
        child: &'static str,
    },

    #[error("expected a {expected} node, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("node has no parent")]
    Detached,

    #[error("a node cannot be placed inside its own subtree")]
    Cycle,

    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}
