//! Error types for the transcript-credits library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AuditError`]: **Fatal**, the document cannot be processed at all
//!   (unreadable bytes, wrong container format, pdfium missing). Returned as
//!   `Err(AuditError)` from the top-level `audit*` functions.
//!
//! * [`RowWarning`]: **Non-fatal**, a single table row could not be turned
//!   into a course record (stray annotation in the credit cell, unknown grade
//!   token). The row is skipped, the warning is stored in
//!   [`crate::model::AuditReport`], and every other row still counts.
//!
//! "No records found" is neither: it is a result state reported by
//! [`crate::model::AuditReport::has_records`]. Callers that prefer a hard
//! error can call [`crate::model::AuditReport::into_result`].

use crate::pipeline::input::DocumentFormat;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the transcript-credits library.
#[derive(Debug, Error)]
pub enum AuditError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Transcript file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is neither `.pdf` nor `.docx`.
    #[error("Unsupported file type '{extension}': only .pdf and .docx transcripts are accepted")]
    UnsupportedExtension { extension: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The bytes do not form a valid document of the declared format.
    #[error("Cannot read file as {format}: {detail}")]
    DocumentFormat {
        format: DocumentFormat,
        detail: String,
    },

    /// The document was read but not a single course record survived
    /// normalisation.
    #[error("No course records found in the document ({grids} tables scanned)")]
    NoRecordsFound { grids: usize },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Reading PDF transcripts requires the PDFium shared library.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or containing directory).\n\
  • Or install libpdfium somewhere on the system library search path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuditError {
    /// Plain-language message suitable for showing to the student.
    ///
    /// The `Display` output carries diagnostic detail; this never does.
    pub fn user_message(&self) -> String {
        match self {
            AuditError::FileNotFound { .. } => "The transcript file could not be found.".into(),
            AuditError::PermissionDenied { .. } => {
                "The transcript file could not be opened (permission denied).".into()
            }
            AuditError::UnsupportedExtension { .. } => {
                "Please upload the transcript as a PDF (.pdf) or Word (.docx) file.".into()
            }
            AuditError::DocumentFormat { format, .. } => format!(
                "Cannot read file: it does not look like a valid {format} document."
            ),
            AuditError::NoRecordsFound { .. } => "No course records were found. \
Export the transcript as a table-based PDF, or convert it to a Word (.docx) file with \
the course table intact, and try again."
                .into(),
            AuditError::PdfiumBindingFailed(_) => {
                "PDF support is not available on this machine. Try a .docx transcript instead."
                    .into()
            }
            AuditError::OutputWriteFailed { .. } => "The results could not be saved.".into(),
            AuditError::InvalidConfig(_) | AuditError::Internal(_) => {
                "Something went wrong while processing the transcript.".into()
            }
        }
    }
}

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum RowIssue {
    /// The credit cell is not a plain number (e.g. `三學分`, `3*`).
    #[error("credit value {value:?} is not numeric")]
    MalformedCredit { value: String },

    /// The grade cell is empty or not a known score, letter or mark.
    #[error("grade {value:?} is not recognised")]
    UnrecognizedGrade { value: String },

    /// The course-name cell is blank.
    #[error("course name is blank")]
    MissingCourseName,
}

/// A non-fatal, per-row coercion failure.
///
/// The row is excluded from the record set and counted.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("{source_label}, row {row}: {issue}")]
pub struct RowWarning {
    /// Which grid the row came from (`"page 2"`, `"table 1"`).
    pub source_label: String,
    /// 1-based row number inside that grid.
    pub row: usize,
    pub issue: RowIssue,
}
