//! Data model: raw grids in, course records through, an audit report out.

use crate::credit::Credits;
use crate::error::{AuditError, RowWarning};
use crate::grade::Grade;
use crate::locale::{clean_cell, fold_key};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One extracted table, verbatim: rows of cell text, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrid {
    /// Where the grid came from (`"page 1"`, `"pages 1-2"`, `"table 3"`).
    pub source: String,
    pub rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(source: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }

    /// Number of columns of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Academic term identifier (`111-1`, `2023 Fall`, `112學年度第2學期`).
///
/// Ordering is by the numbers it contains, then by a season word if
/// present. Two terms without comparable numbers are incomparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(String);

impl Term {
    /// Build a term from a cell; blank cells give `None`.
    pub fn parse(cell: &str) -> Option<Term> {
        let cleaned = clean_cell(cell);
        (!cleaned.is_empty()).then_some(Term(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> Option<Vec<u32>> {
        let mut key: Vec<u32> = self
            .0
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        if key.is_empty() {
            return None;
        }
        let folded = fold_key(&self.0);
        let season = [
            ("spring", 1),
            ("summer", 2),
            ("fall", 3),
            ("autumn", 3),
            ("winter", 4),
            ("上", 1),
            ("下", 2),
            ("暑", 3),
        ]
        .iter()
        .find(|(word, _)| folded.contains(word))
        .map(|(_, rank)| *rank);
        key.extend(season);
        Some(key)
    }

    /// Compare chronologically; `None` when either term carries no numbers.
    pub fn chronological_cmp(&self, other: &Term) -> Option<Ordering> {
        Some(self.sort_key()?.cmp(&other.sort_key()?))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One course attempt, normalised and typed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course_name: String,
    pub credit: Credits,
    pub grade: Grade,
    #[serde(default)]
    pub term: Option<Term>,
}

impl CourseRecord {
    pub fn new(course_name: impl Into<String>, credit: Credits, grade: Grade) -> Self {
        Self {
            course_name: clean_cell(&course_name.into()),
            credit,
            grade,
            term: None,
        }
    }

    pub fn with_term(mut self, term: Term) -> Self {
        self.term = Some(term);
        self
    }

    /// Deduplication key: case-, width- and whitespace-insensitive name.
    pub fn course_key(&self) -> String {
        fold_key(&self.course_name)
    }
}

/// Derived outcome of a record against the grade scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pass,
    Fail,
}

/// Total plus the passed/failed partition of the deduplicated records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub total_credits: Credits,
    pub passed: Vec<CourseRecord>,
    pub failed: Vec<CourseRecord>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.passed.is_empty() && self.failed.is_empty()
    }

    /// Number of distinct courses after deduplication.
    pub fn course_count(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    /// Records in the order the aggregator saw them, passed first.
    pub fn records(&self) -> impl Iterator<Item = &CourseRecord> {
        self.passed.iter().chain(self.failed.iter())
    }
}

/// Counters describing how the document was read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Grids produced by the loader.
    pub grids: usize,
    /// Data rows inspected by the normaliser (header rows excluded).
    pub rows: usize,
    /// Records that survived normalisation, retakes included.
    pub records: usize,
    /// Blank, subtotal and repeated-header rows skipped silently.
    pub skipped_rows: usize,
    /// Rows rejected with a [`RowWarning`].
    pub malformed_rows: usize,
    /// Superseded retake attempts dropped by the aggregator.
    pub retakes_dropped: usize,
    pub total_duration_ms: u64,
}

/// How far the passed total is from the graduation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditGap {
    /// Credits still needed.
    Remaining(Credits),
    /// Credits beyond the target (zero when exactly met).
    Exceeded(Credits),
}

/// Everything one audit run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub result: AggregationResult,
    pub target_credits: Credits,
    pub stats: ExtractionStats,
    pub warnings: Vec<RowWarning>,
}

impl AuditReport {
    /// False when the document yielded zero usable course records.
    pub fn has_records(&self) -> bool {
        !self.result.is_empty()
    }

    pub fn credit_gap(&self) -> CreditGap {
        let total = self.result.total_credits;
        if total < self.target_credits {
            CreditGap::Remaining(self.target_credits.abs_diff(total))
        } else {
            CreditGap::Exceeded(total.abs_diff(self.target_credits))
        }
    }

    /// Treat "no records found" as an error.
    pub fn into_result(self) -> Result<AuditReport, AuditError> {
        if self.has_records() {
            Ok(self)
        } else {
            Err(AuditError::NoRecordsFound {
                grids: self.stats.grids,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    #[test]
    fn term_order_follows_numbers() {
        assert_eq!(
            term("111-1").chronological_cmp(&term("111-2")),
            Some(Ordering::Less)
        );
        assert_eq!(
            term("112學年度第1學期").chronological_cmp(&term("111學年度第2學期")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            term("Fall 2023").chronological_cmp(&term("Spring 2023")),
            Some(Ordering::Greater)
        );
        assert_eq!(term("上學期").chronological_cmp(&term("111-1")), None);
        assert!(Term::parse("   ").is_none());
    }

    #[test]
    fn course_key_folds_width_and_case() {
        let a = CourseRecord::new("Ｃａｌｃｕｌｕｓ  I", Credits::whole(3), Grade::score(80));
        let b = CourseRecord::new("calculus i", Credits::whole(3), Grade::score(50));
        assert_eq!(a.course_key(), b.course_key());
        assert_eq!(a.course_name, "Calculus I");
    }

    #[test]
    fn credit_gap_remaining_and_exceeded() {
        let mut report = AuditReport {
            result: AggregationResult {
                total_credits: Credits::whole(120),
                ..Default::default()
            },
            target_credits: Credits::whole(128),
            stats: ExtractionStats::default(),
            warnings: vec![],
        };
        assert_eq!(report.credit_gap(), CreditGap::Remaining(Credits::whole(8)));
        report.result.total_credits = Credits::whole(130);
        assert_eq!(report.credit_gap(), CreditGap::Exceeded(Credits::whole(2)));
        report.result.total_credits = Credits::whole(128);
        assert_eq!(report.credit_gap(), CreditGap::Exceeded(Credits::ZERO));
    }

    #[test]
    fn empty_report_converts_to_no_records_error() {
        let report = AuditReport {
            result: AggregationResult::default(),
            target_credits: Credits::whole(128),
            stats: ExtractionStats {
                grids: 2,
                ..Default::default()
            },
            warnings: vec![],
        };
        assert!(!report.has_records());
        match report.into_result() {
            Err(AuditError::NoRecordsFound { grids }) => assert_eq!(grids, 2),
            other => panic!("expected NoRecordsFound, got {other:?}"),
        }
    }
}
