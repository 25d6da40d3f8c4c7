//! Pipeline stages for transcript credit auditing.
//!
//! Each submodule implements one transformation step and is testable on its
//! own. Only the two loaders touch document formats; everything after them
//! works on plain [`RawGrid`](crate::model::RawGrid)s.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pdf / docx ──▶ normalize ──▶ aggregate
//! (bytes)   (raw grids)    (records)     (dedup + sum)
//!              │              │              │
//!           layout         columns        retake
//! ```
//!
//! 1. [`input`]     declared format from the extension, magic-byte check
//! 2. [`pdf`]       pdfium glyphs, rebuilt into tables by [`layout`]
//! 3. [`docx`]      Word tables via `docx-rs`
//! 4. [`normalize`] header detection ([`columns`]), row filtering, coercion
//! 5. [`aggregate`] retake resolution ([`retake`]), pass/fail, exact sum

pub mod aggregate;
pub mod columns;
pub mod docx;
pub mod input;
pub mod layout;
pub mod normalize;
pub mod pdf;
pub mod retake;
