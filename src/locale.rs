//! Process-wide locale tables and text normalisation.
//!
//! Transcripts mix Chinese and English labels, full-width and half-width
//! digits, and a zoo of pass/fail notations. Everything the pipeline needs to
//! recognise lives in [`LOCALE`], built once on first use and never mutated.
//!
//! All label and token lists are stored in *folded* form (see [`fold_key`])
//! so lookups compare like with like.

use once_cell::sync::Lazy;

/// Immutable recognition tables shared by every request.
#[derive(Debug)]
pub struct LocaleTables {
    pub course_name_labels: Vec<&'static str>,
    pub credit_labels: Vec<&'static str>,
    pub grade_labels: Vec<&'static str>,
    pub term_labels: Vec<&'static str>,
    /// Header cells that look like a course label but hold a course code.
    pub course_code_labels: Vec<&'static str>,
    /// Cells marking a subtotal/summary line rather than a course.
    pub separator_tokens: Vec<&'static str>,
    /// Prefixes/suffixes marking a make-up or re-exam grade.
    pub makeup_markers: Vec<&'static str>,
    /// Unit suffixes tolerated after a numeric credit value.
    pub credit_units: Vec<&'static str>,
    pub pass_marks: Vec<&'static str>,
    pub fail_marks: Vec<&'static str>,
    pub withdrawn_marks: Vec<&'static str>,
    pub exempt_marks: Vec<&'static str>,
    /// Letter grade → lower bound of its band on the 100-point scale.
    pub letter_floors: Vec<(&'static str, u32)>,
}

pub static LOCALE: Lazy<LocaleTables> = Lazy::new(|| LocaleTables {
    course_name_labels: vec![
        "課程名稱",
        "科目名稱",
        "課程",
        "科目",
        "課名",
        "中文課名",
        "coursename",
        "coursetitle",
        "course",
        "subject",
        "title",
    ],
    credit_labels: vec!["學分", "學分數", "credit", "credits", "units", "cr"],
    grade_labels: vec![
        "成績",
        "分數",
        "等第",
        "學期成績",
        "grade",
        "score",
        "mark",
        "result",
    ],
    term_labels: vec![
        "學期",
        "學年期",
        "學年學期",
        "修課學期",
        "學年度",
        "term",
        "semester",
        "session",
    ],
    course_code_labels: vec![
        "課號",
        "課程代碼",
        "科目代碼",
        "選課代號",
        "課程編號",
        "coursecode",
        "courseno",
        "courseid",
        "code",
    ],
    separator_tokens: vec![
        "小計",
        "合計",
        "總計",
        "總學分",
        "實得學分",
        "修習學分",
        "平均",
        "學期平均",
        "班排名",
        "total",
        "subtotal",
        "totalcredits",
        "gpa",
        "semestergpa",
        "cumulativegpa",
        "average",
    ],
    makeup_markers: vec!["補考", "重修", "(補)", "(重)", "補"],
    credit_units: vec!["學分", "credits", "credit", "cr"],
    pass_marks: vec!["通過", "及格", "pass", "passed", "p"],
    fail_marks: vec!["不通過", "不及格", "fail", "failed", "nopass", "np"],
    withdrawn_marks: vec!["停修", "棄修", "退選", "w", "withdrawn", "wd"],
    exempt_marks: vec!["抵免", "免修", "學分抵免", "exempt", "transfer", "tr"],
    letter_floors: vec![
        ("A+", 9000),
        ("A", 8500),
        ("A-", 8000),
        ("B+", 7700),
        ("B", 7300),
        ("B-", 7000),
        ("C+", 6700),
        ("C", 6300),
        ("C-", 6000),
        ("D", 5000),
        ("E", 4000),
        ("F", 0),
        ("X", 0),
    ],
});

/// Map full-width ASCII variants (U+FF01–U+FF5E) and the ideographic space to
/// their half-width forms. Everything else passes through.
pub fn to_half_width(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            other => other,
        })
        .collect()
}

/// Normalise one table cell: half-width, no invisible characters, internal
/// whitespace runs collapsed to one space, trimmed.
pub fn clean_cell(input: &str) -> String {
    let half = to_half_width(input);
    let visible = half.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    );
    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold text into a comparison key: cleaned, all whitespace removed,
/// lower-cased. `"Ｃａｌｃｕｌｕｓ Ｉ"` and `"calculus i"` fold identically.
pub fn fold_key(input: &str) -> String {
    clean_cell(input)
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True for CJK ideographs, kana, hangul and full-width forms.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{2E80}'..='\u{9FFF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FFEF}'
        | '\u{20000}'..='\u{2FA1F}')
}

/// True if a cleaned cell is a subtotal/summary marker rather than course data.
///
/// A token matches the whole folded cell, or its start when followed by a
/// colon or a digit (`總學分：128`, `GPA 3.8`). Course names that merely
/// begin with a token (`平均場論`, "Total Quality Management") are kept.
pub fn is_separator_cell(cell: &str) -> bool {
    let key = fold_key(cell);
    if key.is_empty() {
        return false;
    }
    if key.chars().all(|c| c == '-' || c == '=' || c == '_' || c == '*') {
        return true;
    }
    LOCALE.separator_tokens.iter().any(|token| {
        key.strip_prefix(token).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with(':') || rest.starts_with(|c: char| c.is_ascii_digit())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_width_maps_digits_and_letters() {
        assert_eq!(to_half_width("３．５"), "3.5");
        assert_eq!(to_half_width("ＡＢｃ"), "ABc");
        assert_eq!(to_half_width("微積分\u{3000}（一）"), "微積分 (一)");
    }

    #[test]
    fn clean_cell_collapses_whitespace() {
        assert_eq!(clean_cell("  Linear \n Algebra\t "), "Linear Algebra");
        assert_eq!(clean_cell("\u{FEFF}微積分\u{200B}"), "微積分");
        assert_eq!(clean_cell(""), "");
    }

    #[test]
    fn fold_key_ignores_case_width_and_spacing() {
        assert_eq!(fold_key("Ｃａｌｃｕｌｕｓ Ｉ"), fold_key("calculus  i"));
        assert_eq!(fold_key("Course Name"), "coursename");
    }

    #[test]
    fn separator_detection() {
        assert!(is_separator_cell("小計"));
        assert!(is_separator_cell("總學分：128"));
        assert!(is_separator_cell("Total"));
        assert!(is_separator_cell("GPA: 3.8"));
        assert!(is_separator_cell("-----"));
        assert!(is_separator_cell("總學分 128"));
        assert!(is_separator_cell("GPA 3.8"));
        assert!(!is_separator_cell("Total Quality Management"));
        assert!(!is_separator_cell("平均場論"));
        assert!(!is_separator_cell("合計學導論"));
        assert!(!is_separator_cell("微積分"));
        assert!(!is_separator_cell(""));
    }

    #[test]
    fn cjk_detection() {
        assert!(is_cjk('微'));
        assert!(is_cjk('３'));
        assert!(!is_cjk('A'));
        assert!(!is_cjk('3'));
    }
}
