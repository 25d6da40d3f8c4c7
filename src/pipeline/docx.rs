//! DOCX loader: every Word table becomes one raw grid.
//!
//! A `.docx` file is a ZIP archive of XML parts; `docx-rs` parses it into a
//! typed tree:
//!
//! ```text
//! Document.children ─▶ Table.rows ─▶ TableRow.cells ─▶ TableCell.children
//!                                                        ├─ Paragraph ─▶ Run ─▶ Text
//!                                                        └─ Table (nested)
//! ```
//!
//! Nested tables are emitted as grids of their own after their parent. A cell
//! merged across `n` grid columns (`gridSpan`) is padded with `n - 1` empty
//! cells, so every row lines up with the table grid.

use super::input::{check_magic, DocumentFormat};
use crate::error::AuditError;
use crate::model::RawGrid;
use docx_rs::{
    read_docx, DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCell,
    TableCellContent, TableChild, TableRowChild,
};
use tracing::{debug, info};

/// Extract all tables of a Word document. Zero tables is not an error.
pub fn load_docx(bytes: &[u8]) -> Result<Vec<RawGrid>, AuditError> {
    check_magic(bytes, DocumentFormat::Docx)?;

    let docx = read_docx(bytes).map_err(|e| AuditError::DocumentFormat {
        format: DocumentFormat::Docx,
        detail: format!("{:?}", e),
    })?;

    let mut grids = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Table(table) = child {
            collect_table(table, &mut grids);
        }
    }

    info!("Extracted {} tables from DOCX", grids.len());
    Ok(grids)
}

fn collect_table(table: &Table, grids: &mut Vec<RawGrid>) {
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut nested: Vec<&Table> = Vec::new();

    for child in &table.rows {
        let TableChild::TableRow(row) = child;
        let mut cells = Vec::with_capacity(row.cells.len());
        for rc in &row.cells {
            let TableRowChild::TableCell(cell) = rc;
            let mut parts: Vec<String> = Vec::new();
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => parts.push(paragraph_text(p)),
                    TableCellContent::Table(t) => {
                        let t: &Table = t;
                        nested.push(t);
                    }
                    _ => {}
                }
            }
            parts.retain(|p| !p.trim().is_empty());
            cells.push(parts.join(" "));
            cells.extend(std::iter::repeat_n(String::new(), grid_span(cell) - 1));
        }
        rows.push(cells);
    }

    let index = grids.len() + 1;
    debug!("Table {} → {} rows", index, rows.len());
    grids.push(RawGrid::new(format!("table {index}"), rows));

    for t in nested {
        collect_table(t, grids);
    }
}

/// Number of grid columns a cell covers, at least 1.
///
/// `docx-rs` keeps the span private; its JSON form exposes it as `gridSpan`.
fn grid_span(cell: &TableCell) -> usize {
    serde_json::to_value(&cell.property)
        .ok()
        .and_then(|property| property.get("gridSpan").cloned())
        .and_then(|span| {
            span.as_u64()
                .or_else(|| span.get("val").and_then(serde_json::Value::as_u64))
        })
        .map_or(1, |span| span.max(1) as usize)
}

/// Concatenate the text runs of a paragraph; tabs and breaks become spaces.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) | RunChild::Break(_) => text.push(' '),
                    _ => {}
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Run, TableCell, TableRow};
    use std::io::Cursor;

    fn cell(text: &str) -> TableCell {
        TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
    }

    fn row(cells: &[&str]) -> TableRow {
        TableRow::new(cells.iter().map(|c| cell(c)).collect())
    }

    fn pack(docx: Docx) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).expect("pack docx");
        buf.into_inner()
    }

    #[test]
    fn extracts_each_table_as_a_grid() {
        let docx = Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("歷年成績單")))
            .add_table(Table::new(vec![
                row(&["課程名稱", "學分", "成績"]),
                row(&["微積分", "3", "85"]),
            ]))
            .add_table(Table::new(vec![row(&["英文", "2", "77"])]));
        let grids = load_docx(&pack(docx)).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].source, "table 1");
        assert_eq!(grids[0].rows[1], vec!["微積分", "3", "85"]);
        assert_eq!(grids[1].rows, vec![vec!["英文", "2", "77"]]);
    }

    #[test]
    fn document_without_tables_yields_no_grids() {
        let docx = Docx::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("hi")));
        assert!(load_docx(&pack(docx)).unwrap().is_empty());
    }

    #[test]
    fn multi_paragraph_cell_is_joined() {
        let multi = TableCell::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Linear")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Algebra")));
        let docx = Docx::new().add_table(Table::new(vec![TableRow::new(vec![
            multi,
            cell("3"),
            cell("A"),
        ])]));
        let grids = load_docx(&pack(docx)).unwrap();
        assert_eq!(grids[0].rows[0][0], "Linear Algebra");
    }

    #[test]
    fn merged_header_cell_is_padded_to_the_grid() {
        let docx = Docx::new().add_table(Table::new(vec![
            TableRow::new(vec![cell("課程名稱").grid_span(2), cell("學分"), cell("成績")]),
            row(&["CS101", "微積分", "3", "85"]),
        ]));
        let grids = load_docx(&pack(docx)).unwrap();
        assert_eq!(grids[0].rows[0], vec!["課程名稱", "", "學分", "成績"]);
        assert_eq!(grids[0].rows[1].len(), 4);
    }

    #[test]
    fn zip_that_is_not_a_word_document_is_a_format_error() {
        let err = load_docx(b"PK\x03\x04garbage").unwrap_err();
        assert!(matches!(
            err,
            AuditError::DocumentFormat {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }

    #[test]
    fn pdf_bytes_are_not_retried_as_docx() {
        let err = load_docx(b"%PDF-1.7 ...").unwrap_err();
        assert!(matches!(err, AuditError::DocumentFormat { .. }));
    }
}
