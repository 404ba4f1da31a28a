//! # Parsing
//!
//! Two-phase Markdown parsing. The block phase consumes input a line at a
//! time and grows the tree along its open right-hand spine; the inline phase
//! then re-scans the text of every block that carries inlines.
//!
//! ## Modules
//!
//! - **`blocks`**: line intake, open-block matching, block starts, text placement, finalization
//! - **`inline`**: subject cursor, delimiter and bracket stacks, inline constructs
//! - **`scanners`**: byte-level recognisers shared by both phases
//! - **`footnotes`**: citation ordering and relocation of footnote definitions
//! - **`snapshot`**: stable text dump of a tree and structural checks
//!
//! ## Entry Points
//!
//! - [`Parser`]: streaming; `feed` any split of the input, then `finish`
//! - [`parse_document`]: one-shot convenience over a complete buffer
//! - [`parse_reference_line`]: one `[label]: url "title"` definition into a map

pub mod blocks;
pub mod footnotes;
pub mod inline;
pub mod scanners;
pub mod snapshot;

use std::rc::Rc;

use crate::{
    buffer::Buffer,
    extensions::{Extension, ExtensionError, SyntaxExtension},
    node::{Arena, Iter, NodeId, NodeValue},
    options::Options,
    references::ReferenceMap,
};

/// Documents larger than this set their own reference expansion budget.
const MIN_MAX_REF_SIZE: usize = 100_000;

/// A finished parse: the arena owning every node and the document root.
#[derive(Debug)]
pub struct ParsedDoc {
    pub arena: Arena,
    pub root: NodeId,
}

impl ParsedDoc {
    pub fn iter(&self) -> Iter<'_> {
        self.arena.iter(self.root)
    }

    /// Indented text form of the tree, one node per line.
    pub fn dump(&self) -> String {
        snapshot::dump(&self.arena, self.root)
    }
}

/// Streaming block parser.
///
/// Line state (`offset`, `column`, `first_nonspace`, ...) describes the
/// line currently being processed and is what extension block hooks read
/// through the accessors below.
#[derive(Debug)]
pub struct Parser {
    arena: Arena,
    root: NodeId,
    current: NodeId,
    refmap: ReferenceMap,
    options: Options,
    extensions: Rc<Vec<Extension>>,
    line_number: usize,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    thematic_break_kill_pos: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
    /// Length of the line being processed without its line ending; `None`
    /// between lines.
    line_len: Option<usize>,
    last_line_length: usize,
    curline: Buffer,
    linebuf: Buffer,
    last_buffer_ended_with_cr: bool,
    total_size: usize,
}

impl Parser {
    pub fn new(options: Options) -> Self {
        Self::with_extensions(options, Vec::new())
    }

    pub fn with_extensions(options: Options, extensions: Vec<Extension>) -> Self {
        let mut arena = Arena::new();
        let root = blocks::make_block(&mut arena, NodeValue::Document, 1, 1);
        Self {
            arena,
            root,
            current: root,
            refmap: ReferenceMap::new(),
            options,
            extensions: Rc::new(extensions),
            line_number: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            thematic_break_kill_pos: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            line_len: None,
            last_line_length: 0,
            curline: Buffer::new(),
            linebuf: Buffer::new(),
            last_buffer_ended_with_cr: false,
            total_size: 0,
        }
    }

    /// Attaches `extension` after those already attached. Attaching the
    /// same extension twice is a no-op.
    pub fn attach_extension(&mut self, extension: Extension) {
        if self.extensions.iter().any(|e| e.same(&extension)) {
            return;
        }
        Rc::make_mut(&mut self.extensions).push(extension);
    }

    /// Attaches a registered extension by name.
    pub fn attach_extension_by_name(&mut self, name: &str) -> Result<(), ExtensionError> {
        self.attach_extension(Extension::from_name(name)?);
        Ok(())
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Deepest open block.
    pub fn current(&self) -> NodeId {
        self.current
    }

    /// 1-based number of the line being processed.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Byte offset into the current line.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Virtual column at `offset`, with tabs expanded to stops of four.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn first_nonspace(&self) -> usize {
        self.first_nonspace
    }

    pub fn first_nonspace_column(&self) -> usize {
        self.first_nonspace_column
    }

    /// Columns between `column` and the first non-space character.
    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// Whether the last column advance stopped inside a tab.
    pub fn partially_consumed_tab(&self) -> bool {
        self.partially_consumed_tab
    }

    /// Pushes more input. Lines are processed as soon as their end is seen;
    /// a trailing partial line waits for the next call or for `finish`.
    pub fn feed(&mut self, data: &[u8]) {
        self.feed_bytes(data, false);
    }

    /// Processes buffered input, finalizes the tree and runs the inline
    /// phase. The parser is reset and can be reused afterwards.
    pub fn finish(&mut self) -> ParsedDoc {
        log::debug!(
            "finishing parse: {} bytes, {} lines, extensions [{}]",
            self.total_size,
            self.line_number,
            self.extensions
                .iter()
                .map(|e| e.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if !self.linebuf.is_empty() {
            let pending = std::mem::take(&mut self.linebuf);
            self.process_line(pending.as_bytes());
        }
        self.finalize_document();
        self.arena.consolidate_text_nodes(self.root);
        let extensions = Rc::clone(&self.extensions);
        for ext in extensions.iter() {
            ext.postprocess(&mut self.arena, self.root, self.options);
        }
        let fresh = Self::with_extensions(self.options, Vec::new());
        let finished = std::mem::replace(self, fresh);
        self.extensions = extensions;
        log::debug!("parse produced {} nodes", finished.arena.len());
        ParsedDoc {
            arena: finished.arena,
            root: finished.root,
        }
    }

    fn finalize_document(&mut self) {
        while self.current != self.root {
            self.current = self.finalize(self.current);
        }
        self.finalize(self.root);
        self.refmap
            .set_max_ref_size(self.total_size.max(MIN_MAX_REF_SIZE));
        self.process_inlines();
        if self.options.contains(Options::FOOTNOTES) {
            footnotes::process_footnotes(&mut self.arena, self.root);
        }
    }

    fn process_inlines(&mut self) {
        let specials = inline::SpecialChars::new(&self.extensions);
        let mut walker = crate::node::Walker::new(self.root);
        while let Some((event, node)) = walker.next(&self.arena) {
            if event == crate::node::EventType::Enter && blocks::contains_inlines(&self.arena[node]) {
                inline::parse_inlines(
                    &mut self.arena,
                    node,
                    &mut self.refmap,
                    &self.extensions,
                    &specials,
                    self.options,
                );
            }
        }
    }
}

/// Parses a complete document in one call.
pub fn parse_document(input: &[u8], options: Options) -> ParsedDoc {
    let mut parser = Parser::new(options);
    parser.feed_bytes(input, true);
    parser.finish()
}

/// Parses a complete document with `extensions` attached.
pub fn parse_document_with(input: &[u8], options: Options, extensions: Vec<Extension>) -> ParsedDoc {
    let mut parser = Parser::with_extensions(options, extensions);
    parser.feed_bytes(input, true);
    parser.finish()
}

/// Parses one link reference definition at the start of `input` into
/// `refmap`. Returns the bytes consumed, `0` if there is no definition.
pub fn parse_reference_line(input: &[u8], refmap: &mut ReferenceMap) -> usize {
    inline::reference::parse_reference_inline(input, refmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use pretty_assertions::assert_eq;

    fn kinds(doc: &ParsedDoc) -> Vec<&'static str> {
        doc.arena
            .children(doc.root)
            .map(|id| doc.arena.type_string(id))
            .collect()
    }

    #[test]
    fn empty_input_is_a_bare_document() {
        let doc = parse_document(b"", Options::empty());
        assert_eq!(doc.arena.kind(doc.root), NodeKind::Document);
        assert!(doc.arena.first_child(doc.root).is_none());
    }

    #[test]
    fn chunked_feed_matches_one_shot() {
        let input = b"# Title\r\n\r\n- a\r\n- b\r\n\r\n> quote\r\n";
        let whole = parse_document(input, Options::empty()).dump();
        for split in 1..input.len() {
            let mut parser = Parser::new(Options::empty());
            parser.feed(&input[..split]);
            parser.feed(&input[split..]);
            assert_eq!(parser.finish().dump(), whole, "split at {split}");
        }
    }

    #[test]
    fn parser_is_reusable_after_finish() {
        let mut parser = Parser::with_extensions(Options::empty(), vec![Extension::Table]);
        parser.feed(b"first\n");
        let first = parser.finish();
        parser.feed(b"> second\n");
        let second = parser.finish();
        assert_eq!(kinds(&first), vec!["paragraph"]);
        assert_eq!(kinds(&second), vec!["block_quote"]);
        assert_eq!(parser.extensions().len(), 1);
        assert_eq!(parser.line_number(), 0);
    }

    #[test]
    fn attaching_twice_is_a_no_op() {
        let mut parser = Parser::new(Options::empty());
        parser.attach_extension(Extension::Strikethrough);
        parser.attach_extension(Extension::Strikethrough);
        parser.attach_extension_by_name("table").unwrap();
        assert_eq!(parser.extensions().len(), 2);
        assert!(parser.attach_extension_by_name("missing").is_err());
    }

    #[test]
    fn reference_line_entry_point() {
        let mut map = ReferenceMap::new();
        let used = parse_reference_line(b"[Foo]: /url \"title\"\nrest", &mut map);
        assert_eq!(used, 20);
        let r = map.lookup(b"foo").unwrap();
        assert_eq!(r.url.as_bytes(), b"/url");
        assert_eq!(r.title.as_bytes(), b"title");
        assert_eq!(parse_reference_line(b"not a definition", &mut map), 0);
    }

    #[test]
    fn bom_is_skipped_on_first_line_only() {
        let doc = parse_document("\u{feff}# h\n".as_bytes(), Options::empty());
        assert_eq!(kinds(&doc), vec!["heading"]);
    }
}
