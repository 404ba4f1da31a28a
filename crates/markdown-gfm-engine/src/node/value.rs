use std::{any::Any, fmt};

use crate::buffer::Chunk;

/// Payload-free node discriminant, used for containment checks and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    HtmlBlock,
    CustomBlock,
    Paragraph,
    Heading,
    ThematicBreak,
    FootnoteDefinition,
    Text,
    SoftBreak,
    LineBreak,
    Code,
    HtmlInline,
    CustomInline,
    Emph,
    Strong,
    Link,
    Image,
    FootnoteReference,
    Extension(ExtensionKind),
}

/// Node kinds contributed by extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    Table,
    TableRow,
    TableCell,
    Strikethrough,
    /// A kind owned by an externally registered extension.
    Custom { tag: u16, block: bool },
}

impl NodeKind {
    pub fn is_block(self) -> bool {
        match self {
            Self::Document
            | Self::BlockQuote
            | Self::List
            | Self::Item
            | Self::CodeBlock
            | Self::HtmlBlock
            | Self::CustomBlock
            | Self::Paragraph
            | Self::Heading
            | Self::ThematicBreak
            | Self::FootnoteDefinition => true,
            Self::Extension(ext) => match ext {
                ExtensionKind::Table | ExtensionKind::TableRow | ExtensionKind::TableCell => true,
                ExtensionKind::Strikethrough => false,
                ExtensionKind::Custom { block, .. } => block,
            },
            _ => false,
        }
    }

    pub fn is_inline(self) -> bool {
        !self.is_block()
    }

    /// Leaves are entered but never exited by the iterator.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::ThematicBreak
                | Self::CodeBlock
                | Self::HtmlBlock
                | Self::Text
                | Self::SoftBreak
                | Self::LineBreak
                | Self::Code
                | Self::HtmlInline
        )
    }

    /// Blocks that take the remainder of a line as content.
    pub fn accepts_lines(self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading | Self::CodeBlock)
    }

    /// Default containment rules; extensions may override them per node.
    pub fn can_contain(self, child: NodeKind) -> bool {
        if child == Self::Document {
            return false;
        }
        match self {
            Self::Document | Self::BlockQuote | Self::FootnoteDefinition | Self::Item => {
                child.is_block() && child != Self::Item
            }
            Self::List => child == Self::Item,
            Self::CustomBlock => true,
            Self::Paragraph
            | Self::Heading
            | Self::Emph
            | Self::Strong
            | Self::Link
            | Self::Image
            | Self::CustomInline
            | Self::Extension(ExtensionKind::Strikethrough) => child.is_inline(),
            Self::Extension(ExtensionKind::Table) => {
                child == Self::Extension(ExtensionKind::TableRow)
            }
            Self::Extension(ExtensionKind::TableRow) => {
                child == Self::Extension(ExtensionKind::TableCell)
            }
            Self::Extension(ExtensionKind::TableCell) => matches!(
                child,
                Self::Text
                    | Self::Code
                    | Self::Emph
                    | Self::Strong
                    | Self::Link
                    | Self::Image
                    | Self::HtmlInline
                    | Self::FootnoteReference
                    | Self::Extension(ExtensionKind::Strikethrough)
            ),
            _ => false,
        }
    }

    pub fn type_string(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::BlockQuote => "block_quote",
            Self::List => "list",
            Self::Item => "item",
            Self::CodeBlock => "code_block",
            Self::HtmlBlock => "html_block",
            Self::CustomBlock => "custom_block",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::ThematicBreak => "thematic_break",
            Self::FootnoteDefinition => "footnote_definition",
            Self::Text => "text",
            Self::SoftBreak => "softbreak",
            Self::LineBreak => "linebreak",
            Self::Code => "code",
            Self::HtmlInline => "html_inline",
            Self::CustomInline => "custom_inline",
            Self::Emph => "emph",
            Self::Strong => "strong",
            Self::Link => "link",
            Self::Image => "image",
            Self::FootnoteReference => "footnote_reference",
            Self::Extension(ExtensionKind::Table) => "table",
            Self::Extension(ExtensionKind::TableRow) => "table_row",
            Self::Extension(ExtensionKind::TableCell) => "table_cell",
            Self::Extension(ExtensionKind::Strikethrough) => "strikethrough",
            Self::Extension(ExtensionKind::Custom { .. }) => "<unknown>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Bullet,
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDelim {
    None,
    Period,
    Paren,
}

/// Shared by `List` and `Item` nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListData {
    pub list_type: ListType,
    pub marker_offset: usize,
    pub padding: usize,
    pub start: usize,
    pub delimiter: ListDelim,
    pub bullet_char: u8,
    pub tight: bool,
    /// `Some` on task-list items.
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlockData {
    pub fenced: bool,
    pub fence_char: u8,
    pub fence_length: usize,
    pub fence_offset: usize,
    pub info: Chunk,
    pub literal: Chunk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlBlockData {
    /// Start condition 1-7.
    pub block_type: u8,
    pub literal: Chunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingData {
    pub level: u8,
    pub setext: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkData {
    pub url: Chunk,
    pub title: Chunk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomData {
    pub on_enter: Chunk,
    pub on_exit: Chunk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteDefinitionData {
    pub label: Chunk,
    /// Citation order, 1-based; 0 until referenced.
    pub ix: usize,
    /// Number of references pointing here.
    pub def_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteReferenceData {
    pub label: Chunk,
    /// Citation index of the definition.
    pub ix: usize,
    /// Ordinal of this reference among those to the same definition.
    pub ref_ix: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub alignments: Vec<Alignment>,
    pub rows: usize,
    /// Cells that came from the source, as opposed to padding.
    pub nonempty_cells: usize,
}

impl TableData {
    pub fn columns(&self) -> usize {
        self.alignments.len()
    }

    pub fn autocompleted_cells(&self) -> usize {
        (self.columns() * self.rows).saturating_sub(self.nonempty_cells)
    }
}

/// Payloads of extension-owned nodes.
pub enum ExtensionValue {
    Table(TableData),
    TableRow { header: bool },
    TableCell { index: usize },
    Strikethrough,
    Custom {
        tag: u16,
        block: bool,
        payload: Option<Box<dyn Any>>,
    },
}

impl ExtensionValue {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            Self::Table(_) => ExtensionKind::Table,
            Self::TableRow { .. } => ExtensionKind::TableRow,
            Self::TableCell { .. } => ExtensionKind::TableCell,
            Self::Strikethrough => ExtensionKind::Strikethrough,
            Self::Custom { tag, block, .. } => ExtensionKind::Custom {
                tag: *tag,
                block: *block,
            },
        }
    }
}

impl fmt::Debug for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(data) => f.debug_tuple("Table").field(data).finish(),
            Self::TableRow { header } => f.debug_struct("TableRow").field("header", header).finish(),
            Self::TableCell { index } => f.debug_struct("TableCell").field("index", index).finish(),
            Self::Strikethrough => f.write_str("Strikethrough"),
            Self::Custom {
                tag,
                block,
                payload,
            } => f
                .debug_struct("Custom")
                .field("tag", tag)
                .field("block", block)
                .field("payload", &payload.is_some())
                .finish(),
        }
    }
}

/// A node's kind together with its kind-specific payload.
#[derive(Debug)]
pub enum NodeValue {
    Document,
    BlockQuote,
    List(ListData),
    Item(ListData),
    CodeBlock(CodeBlockData),
    HtmlBlock(HtmlBlockData),
    CustomBlock(CustomData),
    Paragraph,
    Heading(HeadingData),
    ThematicBreak,
    FootnoteDefinition(FootnoteDefinitionData),
    Text(Chunk),
    SoftBreak,
    LineBreak,
    Code(Chunk),
    HtmlInline(Chunk),
    CustomInline(CustomData),
    Emph,
    Strong,
    Link(LinkData),
    Image(LinkData),
    FootnoteReference(FootnoteReferenceData),
    Extension(ExtensionValue),
}

impl NodeValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Document => NodeKind::Document,
            Self::BlockQuote => NodeKind::BlockQuote,
            Self::List(_) => NodeKind::List,
            Self::Item(_) => NodeKind::Item,
            Self::CodeBlock(_) => NodeKind::CodeBlock,
            Self::HtmlBlock(_) => NodeKind::HtmlBlock,
            Self::CustomBlock(_) => NodeKind::CustomBlock,
            Self::Paragraph => NodeKind::Paragraph,
            Self::Heading(_) => NodeKind::Heading,
            Self::ThematicBreak => NodeKind::ThematicBreak,
            Self::FootnoteDefinition(_) => NodeKind::FootnoteDefinition,
            Self::Text(_) => NodeKind::Text,
            Self::SoftBreak => NodeKind::SoftBreak,
            Self::LineBreak => NodeKind::LineBreak,
            Self::Code(_) => NodeKind::Code,
            Self::HtmlInline(_) => NodeKind::HtmlInline,
            Self::CustomInline(_) => NodeKind::CustomInline,
            Self::Emph => NodeKind::Emph,
            Self::Strong => NodeKind::Strong,
            Self::Link(_) => NodeKind::Link,
            Self::Image(_) => NodeKind::Image,
            Self::FootnoteReference(_) => NodeKind::FootnoteReference,
            Self::Extension(ext) => NodeKind::Extension(ext.kind()),
        }
    }

    /// Literal text of text-like nodes and leaf blocks.
    pub fn literal(&self) -> Option<&Chunk> {
        match self {
            Self::Text(c) | Self::Code(c) | Self::HtmlInline(c) => Some(c),
            Self::CodeBlock(data) => Some(&data.literal),
            Self::HtmlBlock(data) => Some(&data.literal),
            Self::FootnoteReference(data) => Some(&data.label),
            Self::FootnoteDefinition(data) => Some(&data.label),
            _ => None,
        }
    }

    pub fn literal_mut(&mut self) -> Option<&mut Chunk> {
        match self {
            Self::Text(c) | Self::Code(c) | Self::HtmlInline(c) => Some(c),
            Self::CodeBlock(data) => Some(&mut data.literal),
            Self::HtmlBlock(data) => Some(&mut data.literal),
            Self::FootnoteReference(data) => Some(&mut data.label),
            Self::FootnoteDefinition(data) => Some(&mut data.label),
            _ => None,
        }
    }

    /// Fresh payload for `kind`, used when retyping a node in place.
    pub fn empty_of(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Document => Self::Document,
            NodeKind::BlockQuote => Self::BlockQuote,
            NodeKind::List => Self::List(ListData::default()),
            NodeKind::Item => Self::Item(ListData::default()),
            NodeKind::CodeBlock => Self::CodeBlock(CodeBlockData::default()),
            NodeKind::HtmlBlock => Self::HtmlBlock(HtmlBlockData::default()),
            NodeKind::CustomBlock => Self::CustomBlock(CustomData::default()),
            NodeKind::Paragraph => Self::Paragraph,
            NodeKind::Heading => Self::Heading(HeadingData {
                level: 1,
                setext: false,
            }),
            NodeKind::ThematicBreak => Self::ThematicBreak,
            NodeKind::FootnoteDefinition => {
                Self::FootnoteDefinition(FootnoteDefinitionData::default())
            }
            NodeKind::Text => Self::Text(Chunk::empty()),
            NodeKind::SoftBreak => Self::SoftBreak,
            NodeKind::LineBreak => Self::LineBreak,
            NodeKind::Code => Self::Code(Chunk::empty()),
            NodeKind::HtmlInline => Self::HtmlInline(Chunk::empty()),
            NodeKind::CustomInline => Self::CustomInline(CustomData::default()),
            NodeKind::Emph => Self::Emph,
            NodeKind::Strong => Self::Strong,
            NodeKind::Link => Self::Link(LinkData::default()),
            NodeKind::Image => Self::Image(LinkData::default()),
            NodeKind::FootnoteReference => {
                Self::FootnoteReference(FootnoteReferenceData::default())
            }
            NodeKind::Extension(ext) => Self::Extension(match ext {
                ExtensionKind::Table => ExtensionValue::Table(TableData::default()),
                ExtensionKind::TableRow => ExtensionValue::TableRow { header: false },
                ExtensionKind::TableCell => ExtensionValue::TableCell { index: 0 },
                ExtensionKind::Strikethrough => ExtensionValue::Strikethrough,
                ExtensionKind::Custom { tag, block } => ExtensionValue::Custom {
                    tag,
                    block,
                    payload: None,
                },
            }),
        }
    }
}

impl Default for ListData {
    fn default() -> Self {
        Self {
            list_type: ListType::Bullet,
            marker_offset: 0,
            padding: 0,
            start: 0,
            delimiter: ListDelim::None,
            bullet_char: b'-',
            tight: false,
            checked: None,
        }
    }
}
