//! Row normaliser: raw grid cells → typed course records.
//!
//! For each grid:
//!
//! 1. Scan the first `header_scan_rows` rows for a header ([`LabelResolver`]).
//!    Without one, reuse the columns of the preceding table when the caller
//!    passes them (a table continued after a page break), else fall back to
//!    the configured [`DefaultOrder`]. Either way every row is data.
//! 2. Skip blank, sparse, repeated-header and subtotal rows silently.
//! 3. Coerce the remaining rows; a row that fails coercion is dropped with a
//!    [`RowWarning`] and never aborts the grid.

use super::columns::{ColumnMap, ColumnResolver, DefaultOrder, Field, LabelResolver};
use crate::config::AuditConfig;
use crate::credit::Credits;
use crate::error::{RowIssue, RowWarning};
use crate::grade::Grade;
use crate::locale::{clean_cell, is_separator_cell};
use crate::model::{CourseRecord, RawGrid, Term};
use tracing::{debug, warn};

/// Records and diagnostics from one grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedGrid {
    pub records: Vec<CourseRecord>,
    pub warnings: Vec<RowWarning>,
    /// Data rows inspected (rows after the header).
    pub rows: usize,
    /// Data rows skipped silently.
    pub skipped: usize,
    /// Columns resolved from this grid's own header, if it had one.
    pub header_columns: Option<ColumnMap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnSource {
    Header,
    PreviousTable,
    DefaultOrder,
}

/// Where the data starts and how to read it.
struct Layout {
    columns: ColumnMap,
    /// Index of the first data row.
    first_data_row: usize,
    /// Minimum non-blank cells for a row to be a course candidate.
    min_cells: usize,
    source: ColumnSource,
}

/// Normalise one grid.
///
/// `inherited` is the header layout of the preceding table. It is used only
/// when this grid has no header of its own.
pub fn normalize_grid(
    grid: &RawGrid,
    config: &AuditConfig,
    inherited: Option<ColumnMap>,
) -> NormalizedGrid {
    let mut out = NormalizedGrid::default();
    if grid.is_empty() {
        return out;
    }

    let layout = detect_layout(grid, config, inherited);
    debug!("{}: columns {:?} from {:?}", grid.source, layout.columns, layout.source);
    if layout.source == ColumnSource::Header {
        out.header_columns = Some(layout.columns);
    }

    for (idx, raw) in grid.rows.iter().enumerate().skip(layout.first_data_row) {
        out.rows += 1;
        let cells: Vec<String> = raw.iter().map(|c| clean_cell(c)).collect();

        if is_filler_row(&cells, &layout) {
            out.skipped += 1;
            continue;
        }

        match coerce_row(&cells, &layout.columns) {
            Ok(record) => out.records.push(record),
            Err(issue) => {
                let warning = RowWarning {
                    source_label: grid.source.clone(),
                    row: idx + 1,
                    issue,
                };
                warn!("Skipping row: {}", warning);
                out.warnings.push(warning);
            }
        }
    }

    out
}

fn detect_layout(grid: &RawGrid, config: &AuditConfig, inherited: Option<ColumnMap>) -> Layout {
    let width = grid.width();
    let scan = config.header_scan_rows.min(grid.rows.len());

    for (idx, row) in grid.rows.iter().take(scan).enumerate() {
        if let Some(columns) = LabelResolver.resolve(row, width) {
            let labelled = row.iter().filter(|c| !clean_cell(c).is_empty()).count();
            return Layout {
                columns,
                first_data_row: idx + 1,
                min_cells: labelled.clamp(1, 3),
                source: ColumnSource::Header,
            };
        }
    }

    if let Some(columns) = inherited {
        return Layout {
            columns,
            first_data_row: 0,
            min_cells: 3,
            source: ColumnSource::PreviousTable,
        };
    }

    let fallback = DefaultOrder {
        columns: config.default_columns,
    };
    Layout {
        columns: fallback.resolve(&[], width).unwrap_or(config.default_columns),
        first_data_row: 0,
        min_cells: 3,
        source: ColumnSource::DefaultOrder,
    }
}

/// Rows that carry no course: blank, too sparse, subtotals, repeated headers.
fn is_filler_row(cells: &[String], layout: &Layout) -> bool {
    let filled = cells.iter().filter(|c| !c.is_empty()).count();
    if filled == 0 || filled < layout.min_cells {
        return true;
    }
    if cells.iter().any(|c| is_separator_cell(c)) {
        return true;
    }
    layout.source != ColumnSource::DefaultOrder && LabelResolver.resolve(cells, cells.len()).is_some()
}

fn coerce_row(cells: &[String], columns: &ColumnMap) -> Result<CourseRecord, RowIssue> {
    let cell = |field: Field| field_cell(cells, columns, field);

    let name = cell(Field::CourseName);
    if name.is_empty() {
        return Err(RowIssue::MissingCourseName);
    }

    let credit_cell = cell(Field::Credit);
    let credit = Credits::parse_cell(credit_cell).map_err(|_| RowIssue::MalformedCredit {
        value: credit_cell.to_string(),
    })?;

    let grade_cell = cell(Field::Grade);
    let grade = Grade::parse(grade_cell).ok_or_else(|| RowIssue::UnrecognizedGrade {
        value: grade_cell.to_string(),
    })?;

    let record = CourseRecord::new(name, credit, grade);
    Ok(match Term::parse(cell(Field::Term)) {
        Some(term) => record.with_term(term),
        None => record,
    })
}

fn field_cell<'a>(cells: &'a [String], columns: &ColumnMap, field: Field) -> &'a str {
    columns
        .get(field)
        .and_then(|i| cells.get(i))
        .map(String::as_str)
        .unwrap_or("")
}
