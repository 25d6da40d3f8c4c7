//! Column resolution: which cell of a row holds which field.
//!
//! Two strategies implement [`ColumnResolver`]:
//!
//! - [`LabelResolver`] recognises a header row by its labels
//!   (`課程名稱 | 學分 | 成績`, `Course | Credits | Grade`).
//! - [`DefaultOrder`] assumes a fixed layout for tables printed without a
//!   header.

use crate::locale::{fold_key, LOCALE};
use serde::{Deserialize, Serialize};

/// A field the normaliser reads from each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CourseName,
    Credit,
    Grade,
    Term,
}

impl Field {
    const REQUIRED: [Field; 3] = [Field::CourseName, Field::Credit, Field::Grade];
    const ALL: [Field; 4] = [Field::CourseName, Field::Credit, Field::Grade, Field::Term];

    fn labels(self) -> &'static [&'static str] {
        match self {
            Field::CourseName => &LOCALE.course_name_labels,
            Field::Credit => &LOCALE.credit_labels,
            Field::Grade => &LOCALE.grade_labels,
            Field::Term => &LOCALE.term_labels,
        }
    }
}

/// Zero-based column index of each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub course_name: usize,
    pub credit: usize,
    pub grade: usize,
    pub term: Option<usize>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::new(0, 1, 2)
    }
}

impl ColumnMap {
    pub fn new(course_name: usize, credit: usize, grade: usize) -> Self {
        Self {
            course_name,
            credit,
            grade,
            term: None,
        }
    }

    pub fn with_term(mut self, term: usize) -> Self {
        self.term = Some(term);
        self
    }

    /// True when no two fields share a column.
    pub fn is_distinct(&self) -> bool {
        let mut cols = vec![self.course_name, self.credit, self.grade];
        cols.extend(self.term);
        let n = cols.len();
        cols.sort_unstable();
        cols.dedup();
        cols.len() == n
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::CourseName => Some(self.course_name),
            Field::Credit => Some(self.credit),
            Field::Grade => Some(self.grade),
            Field::Term => self.term,
        }
    }
}

/// Strategy deciding where the fields of a grid live.
pub trait ColumnResolver {
    /// Inspect a candidate header row of a grid `width` columns wide.
    /// `None` means "this row is not a header".
    fn resolve(&self, header: &[String], width: usize) -> Option<ColumnMap>;
}

/// Recognises header rows by their labels.
///
/// Exact label matches are assigned before substring matches, and each cell
/// is claimed by at most one field. Cells labelled as a course *code* are
/// reserved first so `課程代碼` never becomes the course-name column. A row
/// is a header when at least two of the three required fields are labelled;
/// the remaining one (typically under a merged cell) is inferred from
/// position.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelResolver;

impl ColumnResolver for LabelResolver {
    fn resolve(&self, header: &[String], width: usize) -> Option<ColumnMap> {
        let width = width.max(header.len());
        let folded: Vec<String> = header.iter().map(|c| fold_key(c)).collect();
        let mut claimed = vec![false; width];

        for (i, cell) in folded.iter().enumerate() {
            if !cell.is_empty()
                && LOCALE
                    .course_code_labels
                    .iter()
                    .any(|code| cell.contains(code))
            {
                claimed[i] = true;
            }
        }

        let mut found: [Option<usize>; 4] = [None; 4];
        for exact in [true, false] {
            for (slot, field) in Field::ALL.iter().enumerate() {
                if found[slot].is_some() {
                    continue;
                }
                let hit = folded.iter().enumerate().position(|(i, cell)| {
                    !claimed[i]
                        && !cell.is_empty()
                        && field.labels().iter().any(|label| {
                            if exact {
                                cell == label
                            } else {
                                cell.contains(label)
                            }
                        })
                });
                if let Some(i) = hit {
                    claimed[i] = true;
                    found[slot] = Some(i);
                }
            }
        }

        let labelled = Field::REQUIRED
            .iter()
            .enumerate()
            .filter(|(slot, _)| found[*slot].is_some())
            .count();
        if labelled < 2 {
            return None;
        }

        // Infer the unlabelled required field from its neighbours.
        for slot in 0..Field::REQUIRED.len() {
            if found[slot].is_some() {
                continue;
            }
            let after = slot
                .checked_sub(1)
                .and_then(|prev| found[prev])
                .map_or(0, |p| p + 1);
            let guess = (after..width)
                .find(|&i| !claimed[i])
                .or_else(|| (0..width).find(|&i| !claimed[i]))?;
            claimed[guess] = true;
            found[slot] = Some(guess);
        }

        Some(ColumnMap {
            course_name: found[0]?,
            credit: found[1]?,
            grade: found[2]?,
            term: found[3],
        })
    }
}

/// Fixed layout for header-less tables.
#[derive(Debug, Clone, Copy)]
pub struct DefaultOrder {
    pub columns: ColumnMap,
}

impl ColumnResolver for DefaultOrder {
    fn resolve(&self, _header: &[String], _width: usize) -> Option<ColumnMap> {
        Some(self.columns)
    }
}
