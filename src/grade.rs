//! Grade interpretation and the pass criterion.
//!
//! A transcript grade cell can hold a numeric score (`85`, `72.5`), a letter
//! (`B+`), or a mark (`通過`, `抵免`, `W`), optionally decorated with a
//! make-up marker (`補考58`). [`Grade::parse`] recognises the cell once, at
//! normalisation time; [`GradeScale`] decides pass/fail and ranks attempts.

use crate::credit::parse_hundredths;
use crate::locale::{clean_cell, fold_key, LOCALE};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Non-numeric, non-letter outcome notations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    Pass,
    Fail,
    Withdrawn,
    Exempt,
}

/// What a grade cell means, independent of any pass threshold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GradeValue {
    /// Numeric score in hundredths of a point (0–10000).
    Score(u32),
    /// Canonical letter from the letter table (`"B+"`).
    Letter(&'static str),
    Mark(Mark),
}

/// A recognised grade, keeping the cell text as printed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Grade {
    raw: String,
    value: GradeValue,
    makeup: bool,
}

/// The grade cell could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised grade: {0:?}")]
pub struct ParseGradeError(pub String);

impl Grade {
    /// Recognise a grade cell. Returns `None` for blank or unknown tokens.
    pub fn parse(cell: &str) -> Option<Grade> {
        let raw = clean_cell(cell);
        if raw.is_empty() {
            return None;
        }
        let (core, makeup) = strip_makeup(&raw);
        let value = interpret(core)?;
        Some(Grade {
            raw,
            value,
            makeup,
        })
    }

    /// A numeric score, for tests and for callers building records directly.
    pub fn score(points: u32) -> Grade {
        Grade {
            raw: points.to_string(),
            value: GradeValue::Score(points * 100),
            makeup: false,
        }
    }

    /// The grade as printed (after whitespace/width normalisation).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &GradeValue {
        &self.value
    }

    /// True when the cell carried a make-up/re-exam marker.
    pub fn is_makeup(&self) -> bool {
        self.makeup
    }
}

fn strip_makeup(raw: &str) -> (&str, bool) {
    for marker in &LOCALE.makeup_markers {
        if let Some(rest) = raw.strip_prefix(marker) {
            return (rest.trim(), true);
        }
        if let Some(rest) = raw.strip_suffix(marker) {
            return (rest.trim(), true);
        }
    }
    (raw, false)
}

fn interpret(core: &str) -> Option<GradeValue> {
    if core.is_empty() {
        return None;
    }
    if let Some(hundredths) = parse_hundredths(core) {
        return (hundredths <= 10_000).then_some(GradeValue::Score(hundredths as u32));
    }
    let upper = core.to_uppercase();
    if let Some((letter, _)) = LOCALE.letter_floors.iter().find(|(l, _)| *l == upper) {
        return Some(GradeValue::Letter(letter));
    }
    let key = fold_key(core);
    let tables = [
        (&LOCALE.pass_marks, Mark::Pass),
        (&LOCALE.fail_marks, Mark::Fail),
        (&LOCALE.withdrawn_marks, Mark::Withdrawn),
        (&LOCALE.exempt_marks, Mark::Exempt),
    ];
    tables
        .iter()
        .find(|(marks, _)| marks.iter().any(|m| *m == key))
        .map(|(_, mark)| GradeValue::Mark(*mark))
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for Grade {
    type Error = ParseGradeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Grade::parse(&value).ok_or(ParseGradeError(value))
    }
}

impl From<Grade> for String {
    fn from(value: Grade) -> Self {
        value.raw
    }
}

/// Pass criterion: numeric threshold plus the static letter/mark tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeScale {
    /// Minimum passing score in hundredths (6000 = 60 points).
    pass_score: u32,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self { pass_score: 6000 }
    }
}

impl GradeScale {
    /// Build a scale from a whole-point threshold (clamped to 0–100).
    pub fn new(pass_points: u32) -> Self {
        Self {
            pass_score: pass_points.min(100) * 100,
        }
    }

    pub fn pass_score(&self) -> u32 {
        self.pass_score / 100
    }

    /// Letters pass when their band floor reaches the threshold; marks pass
    /// when they are `Pass` or `Exempt`.
    pub fn passes(&self, grade: &Grade) -> bool {
        match grade.value {
            GradeValue::Score(s) => s >= self.pass_score,
            GradeValue::Letter(_) => self.points(grade) >= self.pass_score,
            GradeValue::Mark(m) => matches!(m, Mark::Pass | Mark::Exempt),
        }
    }

    /// Position on the 100-point scale (hundredths), used to rank attempts.
    pub fn points(&self, grade: &Grade) -> u32 {
        match grade.value {
            GradeValue::Score(s) => s,
            GradeValue::Letter(letter) => LOCALE
                .letter_floors
                .iter()
                .find(|(l, _)| *l == letter)
                .map(|(_, floor)| *floor)
                .unwrap_or(0),
            GradeValue::Mark(Mark::Pass | Mark::Exempt) => self.pass_score,
            GradeValue::Mark(Mark::Fail | Mark::Withdrawn) => 0,
        }
    }

    /// Order two attempts: a pass beats a fail, then more points win.
    pub fn compare(&self, a: &Grade, b: &Grade) -> Ordering {
        (self.passes(a), self.points(a)).cmp(&(self.passes(b), self.points(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(s: &str) -> Grade {
        Grade::parse(s).unwrap_or_else(|| panic!("{s:?} should parse"))
    }

    #[test]
    fn recognises_scores_letters_and_marks() {
        assert_eq!(g("85").value(), &GradeValue::Score(8500));
        assert_eq!(g("72.5").value(), &GradeValue::Score(7250));
        assert_eq!(g("８５").value(), &GradeValue::Score(8500));
        assert_eq!(g("b+").value(), &GradeValue::Letter("B+"));
        assert_eq!(g("通過").value(), &GradeValue::Mark(Mark::Pass));
        assert_eq!(g("抵免").value(), &GradeValue::Mark(Mark::Exempt));
        assert_eq!(g("停修").value(), &GradeValue::Mark(Mark::Withdrawn));
        assert_eq!(g("W").value(), &GradeValue::Mark(Mark::Withdrawn));
    }

    #[test]
    fn makeup_marker_is_stripped_but_kept_in_text() {
        let grade = g("補考58");
        assert_eq!(grade.value(), &GradeValue::Score(5800));
        assert!(grade.is_makeup());
        assert_eq!(grade.as_str(), "補考58");
        assert!(g("60(補)").is_makeup());
    }

    #[test]
    fn rejects_unknown_tokens() {
        for bad in ["", "  ", "N/A", "101", "優", "補考"] {
            assert!(Grade::parse(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn default_scale_passes_at_sixty() {
        let scale = GradeScale::default();
        assert!(scale.passes(&g("60")));
        assert!(!scale.passes(&g("59.9")));
        assert!(scale.passes(&g("C-")));
        assert!(!scale.passes(&g("D")));
        assert!(scale.passes(&g("Pass")));
        assert!(!scale.passes(&g("不通過")));
        assert!(!scale.passes(&g("W")));
    }

    #[test]
    fn graduate_scale_raises_the_bar() {
        let scale = GradeScale::new(70);
        assert!(!scale.passes(&g("65")));
        assert!(scale.passes(&g("B-")));
        assert!(!scale.passes(&g("C+")));
    }

    #[test]
    fn compare_prefers_passing_then_points() {
        let scale = GradeScale::default();
        assert_eq!(scale.compare(&g("85"), &g("補考58")), Ordering::Greater);
        assert_eq!(scale.compare(&g("通過"), &g("59")), Ordering::Greater);
        assert_eq!(scale.compare(&g("A"), &g("86")), Ordering::Less);
        assert_eq!(scale.compare(&g("70"), &g("70.0")), Ordering::Equal);
    }

    #[test]
    fn serde_round_trips_through_text() {
        let grade = g("補考58");
        let json = serde_json::to_string(&grade).unwrap();
        assert_eq!(json, "\"補考58\"");
        let back: Grade = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grade);
    }
}
