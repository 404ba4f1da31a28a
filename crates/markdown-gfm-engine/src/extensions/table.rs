//! Pipe tables.
//!
//! A table starts when a paragraph's last line parses as a row and the
//! next line is a delimiter row with the same number of cells. The
//! paragraph is retyped in place; any lines above the header row split off
//! into a paragraph of their own. Every following line that parses as a
//! row adds one, truncated or padded to the header's width.
//!
//! Cells are finished when they are created and never sit on the open
//! spine. Their text is inline-parsed like a paragraph's.

use crate::{
    buffer::Buffer,
    node::{
        Alignment, Arena, ExtensionKind, ExtensionValue, Node, NodeFlags, NodeId, NodeKind, NodeValue,
        TableData,
    },
    options::Options,
    parsing::{
        Parser,
        blocks::kinds::Paragraph,
        scanners::{table_cell, table_cell_end, table_row_end, table_start},
    },
};

use super::{Extension, RenderFormat, SyntaxExtension, html_cr, html_sourcepos};

pub struct Table;

/// Padding cells a table may accumulate before new rows are refused.
const MAX_AUTOCOMPLETED_CELLS: usize = 0x80000;

#[derive(Debug)]
struct Cell {
    text: Vec<u8>,
    /// Byte just after the preceding pipe.
    start_offset: usize,
    end_offset: usize,
    /// Whitespace between `start_offset` and the text.
    internal_offset: usize,
}

#[derive(Debug, Default)]
struct Row {
    cells: Vec<Cell>,
    /// Where the row starts when `input` holds earlier lines too.
    paragraph_offset: usize,
}

/// `\|` becomes `|`; every other backslash stays for the inline phase.
fn unescape_pipes(raw: &[u8]) -> Buffer {
    let mut out = Buffer::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && raw.get(i + 1) == Some(&b'|') {
            i += 1;
        }
        out.putc(raw[i]);
        i += 1;
    }
    out
}

/// Parses the last row of `input`: `|? cell (| cell)* |?` then a line end.
/// Complete lines before it are skipped and recorded as the paragraph
/// offset. Cells may be empty; a row needs at least one.
fn row_from_string(input: &[u8]) -> Option<Row> {
    let len = input.len();
    let mut row = Row::default();
    let mut offset = table_cell_end(input, 0);
    let mut expect_more_cells = true;

    while offset < len && expect_more_cells {
        let cell_len = table_cell(input, offset);
        let pipe_len = table_cell_end(input, offset + cell_len);

        if cell_len > 0 || pipe_len > 0 {
            let mut text = unescape_pipes(&input[offset..offset + cell_len]);
            text.trim();
            let mut start_offset = offset;
            let mut internal_offset = 0;
            while start_offset > row.paragraph_offset && input[start_offset - 1] != b'|' {
                start_offset -= 1;
                internal_offset += 1;
            }
            row.cells.push(Cell {
                text: text.into_vec(),
                start_offset,
                end_offset: (offset + cell_len).saturating_sub(1),
                internal_offset,
            });
        }

        offset += cell_len + pipe_len;
        if pipe_len == 0 {
            let row_end = table_row_end(input, offset);
            offset += row_end;
            if row_end > 0 && offset != len {
                row.paragraph_offset = offset;
                row.cells.clear();
                offset += table_cell_end(input, offset);
            } else {
                expect_more_cells = false;
            }
        }
    }

    (offset == len && !row.cells.is_empty()).then_some(row)
}

fn alignment_of(delimiter: &[u8]) -> Alignment {
    match (delimiter.first() == Some(&b':'), delimiter.last() == Some(&b':')) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
    }
}

fn table_data_mut(arena: &mut Arena, table: NodeId) -> Option<&mut TableData> {
    match &mut arena[table].value {
        NodeValue::Extension(ExtensionValue::Table(data)) => Some(data),
        _ => None,
    }
}

impl Table {
    /// Turns `paragraph` into a table when its last line is a header row
    /// matching the delimiter row on the current line.
    fn try_opening_header(parser: &mut Parser, paragraph: NodeId, line: &[u8]) -> Option<NodeId> {
        if parser.arena()[paragraph].flags.contains(NodeFlags::TABLE_VISITED) {
            return None;
        }
        let fns = parser.first_nonspace();
        if table_start(line, fns) == 0 {
            return None;
        }
        let delimiter = row_from_string(&line[fns..])?;

        let has_text = Paragraph::resolve_reference_definitions(parser, paragraph);
        let content = parser.arena()[paragraph].string_content().to_vec();
        let header = has_text
            .then(|| row_from_string(&content))
            .flatten()
            .filter(|header| header.cells.len() == delimiter.cells.len());
        let Some(header) = header else {
            log::trace!("line {}: delimiter row without a matching header", parser.line_number());
            parser.arena_mut()[paragraph].flags.insert(NodeFlags::TABLE_VISITED);
            return None;
        };

        let header_line = parser.line_number() - 1;
        let arena = parser.arena_mut();
        let start_column = arena[paragraph].start_column;
        if header.paragraph_offset > 0 {
            Self::split_off_paragraph(arena, paragraph, &content[..header.paragraph_offset], header_line);
        }

        let table = &mut arena[paragraph];
        table.value = NodeValue::Extension(ExtensionValue::Table(TableData {
            alignments: delimiter
                .cells
                .iter()
                .map(|cell| alignment_of(&cell.text))
                .collect(),
            rows: 1,
            nonempty_cells: header.cells.len(),
        }));
        table.extension = Some(Extension::Table);
        table.start_line = header_line;
        table.content.clear();
        log::trace!(
            "table at line {header_line} with {} columns",
            delimiter.cells.len()
        );

        let row = parser.add_child(
            paragraph,
            NodeValue::Extension(ExtensionValue::TableRow { header: true }),
            start_column,
        );
        let header_len = content.len() - header.paragraph_offset;
        {
            let row = &mut parser.arena_mut()[row];
            row.extension = Some(Extension::Table);
            row.start_line = header_line;
            row.end_line = header_line;
            row.end_column = (start_column + header_len).saturating_sub(2);
        }
        for (index, cell) in header.cells.iter().enumerate() {
            let column = start_column + cell.start_offset - header.paragraph_offset;
            let id = Self::add_cell(parser, row, index, Some(cell), column);
            let node = &mut parser.arena_mut()[id];
            node.start_line = header_line;
            node.end_line = header_line;
        }
        parser.arena_mut()[row].flags.remove(NodeFlags::OPEN);

        let rest = line.len() - 1 - parser.offset();
        parser.advance_offset(line, rest, false);
        Some(paragraph)
    }

    /// Moves the lines above the header row into a new paragraph placed
    /// before the table.
    fn split_off_paragraph(arena: &mut Arena, table: NodeId, text: &[u8], header_line: usize) {
        let mut content = Buffer::from(text);
        content.trim();
        let last_line = content.as_bytes().rsplit(|&b| b == b'\n').next().unwrap_or_default().len();
        let (start_line, start_column) = (arena[table].start_line, arena[table].start_column);

        let mut node = Node::new(NodeValue::Paragraph);
        node.content = content;
        node.start_line = start_line;
        node.start_column = start_column;
        node.end_line = header_line.saturating_sub(1).max(start_line);
        node.end_column = start_column + last_line.saturating_sub(1);
        let paragraph = arena.alloc(node);
        arena.insert_before_unchecked(table, paragraph);
    }

    /// Appends one cell to `row`. `None` pads a short row.
    fn add_cell(parser: &mut Parser, row: NodeId, index: usize, cell: Option<&Cell>, column: usize) -> NodeId {
        let id = parser.add_child(
            row,
            NodeValue::Extension(ExtensionValue::TableCell { index }),
            column,
        );
        let node = &mut parser.arena_mut()[id];
        node.extension = Some(Extension::Table);
        node.flags.remove(NodeFlags::OPEN);
        match cell {
            Some(cell) => {
                node.set_string_content(&cell.text);
                node.internal_offset = cell.internal_offset;
                node.end_column = column + cell.end_offset - cell.start_offset;
            }
            None => {
                node.start_line = 0;
                node.start_column = 0;
                node.end_line = 0;
                node.end_column = 0;
            }
        }
        id
    }

    /// Adds the current line to `table` as a body row.
    fn try_opening_row(parser: &mut Parser, table: NodeId, line: &[u8]) -> Option<NodeId> {
        if parser.is_blank() {
            return None;
        }
        let (columns, autocompleted) = match &parser.arena()[table].value {
            NodeValue::Extension(ExtensionValue::Table(data)) => (data.columns(), data.autocompleted_cells()),
            _ => return None,
        };
        if autocompleted > MAX_AUTOCOMPLETED_CELLS {
            log::warn!(
                "line {}: table has {autocompleted} padding cells, no more rows",
                parser.line_number()
            );
            return None;
        }
        let fns = parser.first_nonspace();
        let parsed = row_from_string(&line[fns..])?;

        let start_column = parser.arena()[table].start_column;
        let row = parser.add_child(
            table,
            NodeValue::Extension(ExtensionValue::TableRow { header: false }),
            start_column,
        );
        parser.arena_mut()[row].extension = Some(Extension::Table);

        let base = parser.first_nonspace_column() + 1;
        let filled = parsed.cells.len().min(columns);
        for (index, cell) in parsed.cells.iter().take(filled).enumerate() {
            Self::add_cell(parser, row, index, Some(cell), base + cell.start_offset);
        }
        for index in filled..columns {
            Self::add_cell(parser, row, index, None, 0);
        }
        if let Some(data) = table_data_mut(parser.arena_mut(), table) {
            data.rows += 1;
            data.nonempty_cells += filled;
        }

        let rest = line.len() - 1 - parser.offset();
        parser.advance_offset(line, rest, false);
        Some(row)
    }

    fn render_html(arena: &Arena, node: NodeId, entering: bool, options: Options, out: &mut String) -> bool {
        match &arena[node].value {
            NodeValue::Extension(ExtensionValue::Table(_)) => {
                if entering {
                    html_cr(out);
                    out.push_str("<table");
                    html_sourcepos(arena, node, options, out);
                    out.push('>');
                } else {
                    let has_body = arena
                        .last_child(node)
                        .is_some_and(|row| arena.table_row_is_header(row) == Some(false));
                    if has_body {
                        html_cr(out);
                        out.push_str("</tbody>");
                    }
                    html_cr(out);
                    out.push_str("</table>\n");
                }
            }
            NodeValue::Extension(ExtensionValue::TableRow { header }) => {
                if entering {
                    html_cr(out);
                    let first_body = !header
                        && arena
                            .previous(node)
                            .is_none_or(|prev| arena.table_row_is_header(prev) == Some(true));
                    if *header {
                        out.push_str("<thead>");
                        html_cr(out);
                    } else if first_body {
                        out.push_str("<tbody>");
                        html_cr(out);
                    }
                    out.push_str("<tr");
                    html_sourcepos(arena, node, options, out);
                    out.push('>');
                } else {
                    html_cr(out);
                    out.push_str("</tr>");
                    if *header {
                        html_cr(out);
                        out.push_str("</thead>");
                    }
                }
            }
            NodeValue::Extension(ExtensionValue::TableCell { .. }) => {
                let in_header = arena
                    .parent(node)
                    .and_then(|row| arena.table_row_is_header(row))
                    .unwrap_or(false);
                let tag = if in_header { "th" } else { "td" };
                if entering {
                    html_cr(out);
                    out.push('<');
                    out.push_str(tag);
                    let align = match arena.table_cell_alignment(node) {
                        Some(Alignment::Left) => Some("left"),
                        Some(Alignment::Center) => Some("center"),
                        Some(Alignment::Right) => Some("right"),
                        _ => None,
                    };
                    if let Some(align) = align {
                        if options.contains(Options::TABLE_PREFER_STYLE_ATTRIBUTES) {
                            out.push_str(&format!(" style=\"text-align: {align}\""));
                        } else {
                            out.push_str(&format!(" align=\"{align}\""));
                        }
                    }
                    html_sourcepos(arena, node, options, out);
                    out.push('>');
                } else {
                    out.push_str(&format!("</{tag}>"));
                }
            }
            _ => return false,
        }
        true
    }

    fn render_commonmark(arena: &Arena, node: NodeId, entering: bool, out: &mut String) -> bool {
        let cr = |out: &mut String| {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        };
        match &arena[node].value {
            NodeValue::Extension(ExtensionValue::Table(_)) => {
                cr(out);
                if !out.is_empty() && !out.ends_with("\n\n") {
                    out.push('\n');
                }
            }
            NodeValue::Extension(ExtensionValue::TableRow { .. }) => {
                if entering {
                    cr(out);
                    out.push('|');
                }
            }
            NodeValue::Extension(ExtensionValue::TableCell { .. }) => {
                if entering {
                    out.push(' ');
                    return true;
                }
                out.push_str(" |");
                let row = arena.parent(node);
                let last_header_cell = arena.next(node).is_none()
                    && row.and_then(|row| arena.table_row_is_header(row)) == Some(true);
                let alignments = row
                    .and_then(|row| arena.parent(row))
                    .and_then(|table| arena.table_alignments(table));
                if let (true, Some(alignments)) = (last_header_cell, alignments) {
                    cr(out);
                    out.push('|');
                    for alignment in alignments {
                        out.push_str(match alignment {
                            Alignment::None => " --- |",
                            Alignment::Left => " :-- |",
                            Alignment::Center => " :-: |",
                            Alignment::Right => " --: |",
                        });
                    }
                    cr(out);
                }
            }
            _ => return false,
        }
        true
    }
}

impl SyntaxExtension for Table {
    fn name(&self) -> &str {
        "table"
    }

    fn try_open_block(
        &self,
        parser: &mut Parser,
        indented: bool,
        container: NodeId,
        line: &[u8],
    ) -> Option<NodeId> {
        if indented {
            return None;
        }
        match parser.arena().kind(container) {
            NodeKind::Paragraph => Self::try_opening_header(parser, container, line),
            NodeKind::Extension(ExtensionKind::Table) => Self::try_opening_row(parser, container, line),
            _ => None,
        }
    }

    /// A table continues on any line that parses as a row. Rows never
    /// continue; each line opens its own.
    fn last_block_matches(&self, parser: &mut Parser, line: &[u8], container: NodeId) -> bool {
        match parser.arena().kind(container) {
            NodeKind::Extension(ExtensionKind::Table) => {
                let fns = parser.first_nonspace().min(line.len());
                row_from_string(&line[fns..]).is_some()
            }
            _ => false,
        }
    }

    fn contains_inlines(&self, node: &Node) -> Option<bool> {
        Some(matches!(node.value, NodeValue::Extension(ExtensionValue::TableCell { .. })))
    }

    fn type_string(&self, node: &Node) -> Option<&'static str> {
        matches!(node.value, NodeValue::Extension(ExtensionValue::TableRow { header: true }))
            .then_some("table_header")
    }

    fn render(
        &self,
        format: RenderFormat,
        arena: &Arena,
        node: NodeId,
        entering: bool,
        options: Options,
        out: &mut String,
    ) -> bool {
        match format {
            RenderFormat::Html => Self::render_html(arena, node, entering, options, out),
            RenderFormat::CommonMark => Self::render_commonmark(arena, node, entering, out),
            _ => false,
        }
    }

    fn commonmark_escape(&self, node: &Node, c: u8) -> bool {
        c == b'|' && node.kind().is_inline()
    }
}
