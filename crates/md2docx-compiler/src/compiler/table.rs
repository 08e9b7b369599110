//! Table layout.
//!
//! Landscape tables with two or more rows are transposed, so the original
//! header row becomes the label column. Every source cell maps to exactly
//! one output cell.

use md2docx_config::ResolvedTableStyle;
use md2docx_config::units::emu_to_twips;
use md2docx_docx::{Block, Paragraph, RunOptions, Table, TableCell, TableRow, TableWidth};
use md2docx_markdown::{Data, NodeId, NodeKind, Tree};

use super::{Compiler, Output, settle};
use crate::error::CompileError;

const TABLE_STYLE: &str = "normalTable";
const CONTENTS: &str = "normalTableContents";
const HEADER_CONTENTS: &str = "normalTableHeaderContents";

/// A source cell and its spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridCell {
    node: NodeId,
    col_span: u32,
    row_span: u32,
}

impl GridCell {
    fn read(tree: &Tree, node: NodeId) -> Self {
        let data = tree.data(node);
        Self {
            node,
            col_span: span(data, "colspan"),
            row_span: span(data, "rowspan"),
        }
    }

    /// Spans follow the cell through a transpose.
    fn rotated(self) -> Self {
        Self {
            col_span: self.row_span,
            row_span: self.col_span,
            ..self
        }
    }
}

/// Span attribute; missing, malformed or non-positive values are 1.
fn span(data: &Data, key: &str) -> u32 {
    data.get(key)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .map_or(1, |span| span.max(1))
}

/// New row `i` holds cell `i` of every row that has one.
fn transpose<T: Clone>(grid: &[Vec<T>]) -> Vec<Vec<T>> {
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|i| grid.iter().filter_map(|row| row.get(i).cloned()).collect())
        .collect()
}

/// Percent width of each of `count` cells in a row.
///
/// Portrait rows split evenly. Landscape rows give the label column one part
/// and every other column three, out of `3 * count - 2`.
#[allow(clippy::cast_precision_loss)]
fn column_widths(count: usize, landscape: bool) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if !landscape {
        return vec![100.0 / count as f64; count];
    }
    let total = (3 * count - 2) as f64;
    (0..count)
        .map(|i| if i == 0 { 100.0 / total } else { 300.0 / total })
        .collect()
}

impl Compiler<'_> {
    pub(super) fn table(&mut self, id: NodeId) -> Result<Vec<Output>, CompileError> {
        let tree = self.tree;
        let landscape = tree.data(id).get("orientation") == Some("landscape");

        let mut grid: Vec<Vec<GridCell>> = tree
            .children(id)
            .iter()
            .filter(|&&row| *tree.kind(row) == NodeKind::TableRow)
            .map(|&row| {
                tree.children(row)
                    .iter()
                    .filter(|&&cell| *tree.kind(cell) == NodeKind::TableCell)
                    .map(|&cell| GridCell::read(tree, cell))
                    .collect()
            })
            .collect();
        if landscape && grid.len() >= 2 {
            grid = transpose(&grid)
                .into_iter()
                .map(|row| row.into_iter().map(GridCell::rotated).collect())
                .collect();
        }

        let resolved = self.config.table_style(TABLE_STYLE)?;
        let mut rows = Vec::with_capacity(grid.len());
        for (r, row) in grid.iter().enumerate() {
            let widths = column_widths(row.len(), landscape);
            let mut cells = Vec::with_capacity(row.len());
            for (c, (cell, width)) in row.iter().zip(widths).enumerate() {
                let header = (r == 0 && !landscape) || (landscape && c == 0);
                cells.push(self.table_cell(cell, header, width, resolved.as_ref())?);
            }
            rows.push(TableRow {
                header: r == 0 && !landscape,
                cells,
            });
        }

        let table = Table {
            style: Some(TABLE_STYLE.to_owned()),
            width: Some(TableWidth::Dxa(emu_to_twips(self.contracts.width))),
            layout: resolved.as_ref().and_then(|style| style.table.layout),
            borders: resolved.and_then(|style| style.table.borders),
            rows,
        };
        Ok(vec![Output::Block(table.into())])
    }

    fn table_cell(
        &mut self,
        cell: &GridCell,
        header: bool,
        width: f64,
        resolved: Option<&ResolvedTableStyle>,
    ) -> Result<TableCell, CompileError> {
        let contents = if header { HEADER_CONTENTS } else { CONTENTS };
        let mut children = settle(self.children(cell.node, &RunOptions::default())?, contents);
        for block in &mut children {
            if let Block::Paragraph(paragraph) = block {
                paragraph.style = Some(contents.to_owned());
            }
        }
        if children.is_empty() {
            children.push(Paragraph::default().with_style(contents).into());
        }

        let style = resolved
            .map(|style| {
                if header {
                    style.header_cell.clone()
                } else {
                    style.cell.clone()
                }
            })
            .unwrap_or_default();

        Ok(TableCell {
            width: Some(TableWidth::Pct(width)),
            col_span: cell.col_span,
            row_span: cell.row_span,
            header,
            style,
            children,
        })
    }
}
