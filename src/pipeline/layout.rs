//! Table reconstruction from positioned glyphs.
//!
//! PDF transcripts carry no table structure, only characters at coordinates.
//! This module rebuilds rows and columns geometrically, with no pdfium types
//! involved, so every step is testable with synthetic glyphs.
//!
//! ```text
//! Glyph[] ──▶ TextLine[] ──▶ blocks ──▶ PageTable[] ──▶ stitch ──▶ RawGrid[]
//!            (same baseline)  (≥2 fragments)  (column bands)  (page breaks)
//! ```
//!
//! Coordinates follow PDF convention: `y` grows upwards, so the first line
//! on a page has the largest `top`.

use crate::locale::{fold_key, is_cjk};
use crate::model::RawGrid;

/// A fragment gap wider than this many line heights starts a new cell.
const CELL_GAP_FACTOR: f32 = 0.8;
/// A gap wider than this (but narrower than a cell gap) is a word space.
const WORD_GAP_FACTOR: f32 = 0.15;
/// Consecutive sparse lines that end a table block.
const BLOCK_BREAK_LINES: usize = 2;

/// One printed character and its bounding box in page points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Glyph {
    fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }
}

/// A run of glyphs on one line with no cell-sized gap inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub left: f32,
    pub right: f32,
}

/// Fragments sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub fragments: Vec<Fragment>,
}

/// One table-like block of a page, already split into cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTable {
    pub page: usize,
    pub rows: Vec<Vec<String>>,
}

impl PageTable {
    fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Group glyphs into lines and lines into fragments.
///
/// Whitespace glyphs are ignored; word spaces are re-inserted from the
/// geometry so that CJK runs stay unspaced.
pub fn group_lines(glyphs: &[Glyph]) -> Vec<TextLine> {
    let mut ink: Vec<&Glyph> = glyphs
        .iter()
        .filter(|g| !g.ch.is_whitespace() && !g.ch.is_control() && g.height() > 0.0)
        .collect();
    ink.sort_by(|a, b| b.center_y().total_cmp(&a.center_y()));

    let mut lines: Vec<Vec<&Glyph>> = Vec::new();
    for glyph in ink {
        let joins = lines.last().is_some_and(|line| {
            let first = line[0];
            let tolerance = first.height().max(glyph.height()) / 2.0;
            (first.center_y() - glyph.center_y()).abs() <= tolerance
        });
        if joins {
            if let Some(line) = lines.last_mut() {
                line.push(glyph);
            }
        } else {
            lines.push(vec![glyph]);
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.left.total_cmp(&b.left));
            TextLine {
                fragments: split_fragments(&line),
            }
        })
        .collect()
}

fn split_fragments(line: &[&Glyph]) -> Vec<Fragment> {
    let mut heights: Vec<f32> = line.iter().map(|g| g.height()).collect();
    heights.sort_by(f32::total_cmp);
    let height = heights.get(heights.len() / 2).copied().unwrap_or(1.0);

    let mut fragments: Vec<Fragment> = Vec::new();
    let mut prev: Option<&Glyph> = None;
    for glyph in line {
        let gap = prev.map(|p| glyph.left - p.right);
        match gap {
            Some(gap) if gap <= CELL_GAP_FACTOR * height => {
                let spaced = prev.is_some_and(|p| !(is_cjk(p.ch) && is_cjk(glyph.ch)));
                if let Some(frag) = fragments.last_mut() {
                    if gap > WORD_GAP_FACTOR * height && spaced {
                        frag.text.push(' ');
                    }
                    frag.text.push(glyph.ch);
                    frag.right = frag.right.max(glyph.right);
                }
            }
            _ => fragments.push(Fragment {
                text: glyph.ch.to_string(),
                left: glyph.left,
                right: glyph.right,
            }),
        }
        prev = Some(*glyph);
    }
    fragments
}

/// Split a page's lines into table blocks and lay each out in columns.
///
/// A block is a run of lines with at least two fragments; up to one sparse
/// line (a wrapped name, a semester caption) may sit inside a block.
pub fn page_tables(page: usize, lines: &[TextLine]) -> Vec<PageTable> {
    let mut blocks: Vec<&[TextLine]> = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_dense = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.fragments.len() >= 2 {
            if start.is_none() {
                start = Some(i);
            }
            last_dense = i;
        } else if let Some(s) = start {
            if i - last_dense >= BLOCK_BREAK_LINES {
                blocks.push(&lines[s..=last_dense]);
                start = None;
            }
        }
    }
    if let Some(s) = start {
        blocks.push(&lines[s..=last_dense]);
    }

    blocks
        .into_iter()
        .map(|block| PageTable {
            page,
            rows: layout_block(block),
        })
        .collect()
}

/// Assign each fragment of a block to a column band.
///
/// Bands come from the lines with the modal fragment count, so a merged
/// header cell spanning two data columns lands in one band and the other
/// band is kept as an empty cell.
pub fn layout_block(lines: &[TextLine]) -> Vec<Vec<String>> {
    let bands = column_bands(lines);
    if bands.is_empty() {
        return Vec::new();
    }
    lines
        .iter()
        .map(|line| {
            let mut cells = vec![String::new(); bands.len()];
            for frag in &line.fragments {
                let col = nearest_band(&bands, frag);
                let cell = &mut cells[col];
                if !cell.is_empty() {
                    let joins_cjk = cell.chars().last().is_some_and(is_cjk)
                        && frag.text.chars().next().is_some_and(is_cjk);
                    if !joins_cjk {
                        cell.push(' ');
                    }
                }
                cell.push_str(&frag.text);
            }
            cells
        })
        .collect()
}

fn column_bands(lines: &[TextLine]) -> Vec<(f32, f32)> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for n in lines.iter().map(|l| l.fragments.len()).filter(|&n| n >= 2) {
        match counts.iter_mut().find(|(k, _)| *k == n) {
            Some((_, c)) => *c += 1,
            None => counts.push((n, 1)),
        }
    }
    let Some(&(modal, _)) = counts.iter().max_by_key(|(n, c)| (*c, *n)) else {
        return lines
            .first()
            .map(|l| l.fragments.iter().map(|f| (f.left, f.right)).collect())
            .unwrap_or_default();
    };

    let mut bands: Vec<(f32, f32)> = vec![(f32::MAX, f32::MIN); modal];
    for line in lines.iter().filter(|l| l.fragments.len() == modal) {
        for (band, frag) in bands.iter_mut().zip(&line.fragments) {
            band.0 = band.0.min(frag.left);
            band.1 = band.1.max(frag.right);
        }
    }

    // Misaligned reference rows can make neighbouring bands overlap.
    bands.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f32, f32)> = Vec::with_capacity(bands.len());
    for band in bands {
        let overlaps = merged.last().is_some_and(|last| band.0 <= last.1);
        if overlaps {
            if let Some(last) = merged.last_mut() {
                last.1 = last.1.max(band.1);
            }
        } else {
            merged.push(band);
        }
    }
    merged
}

fn nearest_band(bands: &[(f32, f32)], frag: &Fragment) -> usize {
    let overlap = |(l, r): (f32, f32)| (r.min(frag.right) - l.max(frag.left)).max(0.0);
    let best = bands
        .iter()
        .enumerate()
        .map(|(i, b)| (i, overlap(*b)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((i, o)) = best {
        if o > 0.0 {
            return i;
        }
    }
    let center = (frag.left + frag.right) / 2.0;
    bands
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let da = ((a.0 + a.1) / 2.0 - center).abs();
            let db = ((b.0 + b.1) / 2.0 - center).abs();
            da.total_cmp(&db)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Join page tables into grids, treating page breaks as continuations.
///
/// The last table of a page continues into the first table of the next page
/// when both have the same number of columns. A header line repeated at the
/// top of the continuation is dropped.
pub fn stitch_pages(tables: Vec<PageTable>) -> Vec<RawGrid> {
    let mut grids: Vec<(usize, usize, PageTable)> = Vec::new();
    for table in tables {
        if table.rows.is_empty() {
            continue;
        }
        if let Some((_, last_page, current)) = grids.last_mut() {
            let continues = table.page == *last_page + 1 && table.width() == current.width();
            if continues {
                let mut rows = table.rows.into_iter().peekable();
                let repeated = match (rows.peek(), current.rows.first()) {
                    (Some(a), Some(b)) => row_key(a) == row_key(b),
                    _ => false,
                };
                if repeated {
                    rows.next();
                }
                current.rows.extend(rows);
                *last_page = table.page;
                continue;
            }
        }
        grids.push((table.page, table.page, table));
    }

    grids
        .into_iter()
        .map(|(first, last, table)| {
            let source = if first == last {
                format!("page {first}")
            } else {
                format!("pages {first}-{last}")
            };
            RawGrid::new(source, table.rows)
        })
        .collect()
}

fn row_key(row: &[String]) -> Vec<String> {
    row.iter().map(|c| fold_key(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 10.0;

    /// Lay out `cells` on one line at height `y`; each char is 10pt wide.
    fn line(y: f32, cells: &[(f32, &str)]) -> Vec<Glyph> {
        let mut out = Vec::new();
        for (x, text) in cells {
            let mut left = *x;
            for ch in text.chars() {
                out.push(Glyph {
                    ch,
                    left,
                    right: left + 10.0,
                    bottom: y,
                    top: y + H,
                });
                left += 10.0;
            }
        }
        out
    }

    fn rows_of(glyphs: &[Glyph]) -> Vec<Vec<String>> {
        let lines = group_lines(glyphs);
        let tables = page_tables(1, &lines);
        assert_eq!(tables.len(), 1, "expected one table block");
        tables[0].rows.clone()
    }

    #[test]
    fn groups_cells_by_gap() {
        let mut glyphs = line(700.0, &[(50.0, "課程名稱"), (200.0, "學分"), (300.0, "成績")]);
        glyphs.extend(line(680.0, &[(50.0, "微積分"), (205.0, "3"), (300.0, "85")]));
        assert_eq!(
            rows_of(&glyphs),
            vec![
                vec!["課程名稱", "學分", "成績"],
                vec!["微積分", "3", "85"],
            ]
        );
    }

    #[test]
    fn latin_words_keep_single_spaces() {
        let mut glyphs = line(700.0, &[(50.0, "Course"), (200.0, "Credit"), (300.0, "Grade")]);
        // "Calculus I" with a 3pt word gap, well under the cell gap.
        glyphs.extend(line(680.0, &[(50.0, "Calculus"), (133.0, "I")]));
        glyphs.extend(line(680.0, &[(200.0, "3"), (300.0, "A-")]));
        let rows = rows_of(&glyphs);
        assert_eq!(rows[1], vec!["Calculus I", "3", "A-"]);
    }

    #[test]
    fn merged_header_keeps_inferred_columns() {
        // "成績" is centred over two data columns (midterm/final style).
        let mut glyphs = line(700.0, &[(50.0, "科目"), (200.0, "學分"), (330.0, "成績")]);
        glyphs.extend(line(680.0, &[(50.0, "物理"), (200.0, "3"), (300.0, "70"), (400.0, "88")]));
        glyphs.extend(line(660.0, &[(50.0, "化學"), (200.0, "2"), (300.0, "65"), (400.0, "91")]));
        let rows = rows_of(&glyphs);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][0], "科目");
        assert_eq!(rows[0][1], "學分");
        assert_eq!(rows[1], vec!["物理", "3", "70", "88"]);
        assert_eq!(rows[0].iter().filter(|c| c.is_empty()).count(), 1);
    }

    #[test]
    fn title_lines_are_not_part_of_the_table() {
        let mut glyphs = line(760.0, &[(150.0, "歷年成績單")]);
        glyphs.extend(line(740.0, &[(150.0, "國立大學教務處")]));
        glyphs.extend(line(700.0, &[(50.0, "課程名稱"), (200.0, "學分"), (300.0, "成績")]));
        glyphs.extend(line(680.0, &[(50.0, "英文"), (200.0, "2"), (300.0, "77")]));
        let rows = rows_of(&glyphs);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "課程名稱");
    }

    #[test]
    fn ignores_whitespace_and_zero_height_glyphs() {
        let mut glyphs = line(700.0, &[(50.0, "AB"), (200.0, "1")]);
        glyphs.push(Glyph {
            ch: '\n',
            left: 0.0,
            right: 0.0,
            bottom: 0.0,
            top: 0.0,
        });
        let lines = group_lines(&glyphs);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].fragments[0].text, "AB");
    }

    #[test]
    fn stitches_continuation_pages_and_drops_repeated_header() {
        let header = vec!["課程名稱".to_string(), "學分".into(), "成績".into()];
        let p1 = PageTable {
            page: 1,
            rows: vec![header.clone(), vec!["微積分".into(), "3".into(), "85".into()]],
        };
        let p2 = PageTable {
            page: 2,
            rows: vec![header.clone(), vec!["物理".into(), "3".into(), "70".into()]],
        };
        let grids = stitch_pages(vec![p1, p2]);
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].source, "pages 1-2");
        assert_eq!(grids[0].rows.len(), 3);
    }

    #[test]
    fn different_column_structure_starts_new_grid() {
        let p1 = PageTable {
            page: 1,
            rows: vec![vec!["a".into(), "1".into(), "60".into()]],
        };
        let p2 = PageTable {
            page: 2,
            rows: vec![vec!["x".into(), "y".into()]],
        };
        let p4 = PageTable {
            page: 4,
            rows: vec![vec!["x".into(), "y".into()]],
        };
        let grids = stitch_pages(vec![p1, p2, p4]);
        assert_eq!(grids.len(), 3);
        assert_eq!(grids[0].source, "page 1");
        assert_eq!(grids[2].source, "page 4");
    }
}
