//! Per-block syntax: continuation prefixes, start markers and the payload
//! each block kind derives from its marker.

pub mod block_quote;
pub mod code_fence;
pub mod footnote;
pub mod heading;
pub mod html_block;
pub mod list;
pub mod paragraph;
pub mod thematic_break;

pub use block_quote::BlockQuote;
pub use code_fence::CodeFence;
pub use footnote::FootnoteDefinition;
pub use heading::Heading;
pub use html_block::HtmlBlock;
pub use list::{ListItem, ListMarker};
pub use paragraph::Paragraph;
pub use thematic_break::ThematicBreak;

/// Outcome of matching an open block's continuation prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Matched,
    Unmatched,
    /// The line closed the block and nothing else on it needs processing.
    Finished,
}

impl From<bool> for Prefix {
    fn from(matched: bool) -> Self {
        if matched { Self::Matched } else { Self::Unmatched }
    }
}

pub(crate) fn is_space_or_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
