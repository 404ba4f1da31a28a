//! # markdown-gfm-engine
//!
//! CommonMark parsing with the GitHub-flavored extensions, producing an
//! arena-backed syntax tree for renderers to walk.
//!
//! ## Modules
//!
//! - **`buffer`**: growable byte buffers and the `Chunk` slices nodes carry
//! - **`utf8`**: code point decoding and the character classes used by flanking
//! - **`node`**: the tree, its payloads, accessors and the enter/exit iterator
//! - **`references`**: reference and footnote maps with their expansion budget
//! - **`options`**: parse and render option bits
//! - **`extensions`**: the hook trait, the registry and the five built-ins
//! - **`parsing`**: the block and inline phases and their entry points
//!
//! ## Example
//!
//! ```
//! use markdown_gfm_engine::{Extension, NodeKind, Options, parse_document_with};
//!
//! let doc = parse_document_with(b"~~done~~", Options::empty(), vec![Extension::Strikethrough]);
//! let para = doc.arena.first_child(doc.root).unwrap();
//! assert_eq!(doc.arena.kind(para), NodeKind::Paragraph);
//! ```

pub mod buffer;
pub mod extensions;
pub mod node;
pub mod options;
pub mod parsing;
pub mod references;
pub mod utf8;

pub use buffer::{Buffer, Chunk};
pub use extensions::{
    Extension, ExtensionError, RenderFormat, SyntaxExtension, core_extensions, find_extension,
    html_tag_allowed, list_extensions, register_extension,
};
pub use node::{
    Alignment, Arena, EventType, ExtensionKind, ExtensionValue, Iter, ListDelim, ListType, Node,
    NodeError, NodeId, NodeKind, NodeValue,
};
pub use options::Options;
pub use parsing::{ParsedDoc, Parser, parse_document, parse_document_with, parse_reference_line};
pub use references::ReferenceMap;
