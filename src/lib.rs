//! # transcript-credits
//!
//! Read a student's transcript (PDF or DOCX), pull every course row out of
//! its tables, and total the credits of the courses that were passed.
//!
//! ## Why this crate?
//!
//! Transcripts are laid out for people, not parsers: headers in Chinese or
//! English, full-width digits, subtotal rows mixed into the course list,
//! tables broken across pages, and the same course listed twice when it was
//! retaken. This crate turns all of that into a deterministic credit total,
//! with each rejected row reported instead of silently miscounted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! transcript.pdf / transcript.docx
//!  │
//!  ├─ 1. Input      extension declares the format, magic bytes confirm it
//!  ├─ 2. Extract    pdfium glyph layout or docx-rs tables → raw grids
//!  ├─ 3. Normalize  header detection, row filtering, credit/grade coercion
//!  ├─ 4. Aggregate  retake resolution, pass/fail, exact credit sum
//!  └─ 5. Report     totals, lists, warnings, CSV export
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use transcript_credits::{audit_file, AuditConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuditConfig::default();
//!     let report = audit_file("transcript.pdf", &config).await?.into_result()?;
//!     println!("passed: {} credits", report.result.total_credits);
//!     for w in &report.warnings {
//!         eprintln!("skipped {w}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `credit-audit` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! transcript-credits = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDF support
//!
//! PDF text is read through a pdfium shared library, located via
//! [`AuditConfig::pdfium_lib_path`], then `PDFIUM_LIB_PATH`, then the system
//! library path. DOCX needs nothing external.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod audit;
pub mod config;
pub mod credit;
pub mod error;
pub mod export;
pub mod grade;
pub mod locale;
pub mod model;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use audit::{audit_bytes, audit_file, audit_file_sync, audit_grids, extract_grids};
pub use config::{AuditConfig, AuditConfigBuilder, RetakePolicyKind};
pub use credit::Credits;
pub use error::{AuditError, RowIssue, RowWarning};
pub use export::{export_csv, read_records_csv, write_records_csv};
pub use grade::{Grade, GradeScale, GradeValue, Mark};
pub use model::{
    AggregationResult, AuditReport, CourseRecord, CreditGap, ExtractionStats, RawGrid, Status,
    Term,
};
pub use pipeline::columns::{ColumnMap, ColumnResolver};
pub use pipeline::input::DocumentFormat;
pub use pipeline::retake::RetakePolicy;
