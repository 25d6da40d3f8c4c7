//! Audit entry points.
//!
//! [`audit_bytes`] is the synchronous core: bytes in, [`AuditReport`] out.
//! [`audit_file`] adds async file reading and moves the core onto a blocking
//! thread, since pdfium must not run on an executor thread.
//! [`audit_file_sync`] is the same for callers without a runtime.
//!
//! A document with zero usable rows is *not* an error here; check
//! [`AuditReport::has_records`] or call [`AuditReport::into_result`].

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::model::{AuditReport, ExtractionStats, RawGrid};
use crate::pipeline::aggregate::Aggregator;
use crate::pipeline::columns::ColumnMap;
use crate::pipeline::input::{read_document, DocumentFormat};
use crate::pipeline::normalize::normalize_grid;
use crate::pipeline::{docx, pdf};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Run the format-specific loader.
pub fn extract_grids(
    bytes: &[u8],
    format: DocumentFormat,
    config: &AuditConfig,
) -> Result<Vec<RawGrid>, AuditError> {
    match format {
        DocumentFormat::Pdf => pdf::load_pdf(bytes, config),
        DocumentFormat::Docx => docx::load_docx(bytes),
    }
}

/// Normalise and aggregate already-extracted grids.
///
/// Records of all grids are merged before deduplication, so a table split
/// across pages (or repeated in two tables) still counts each course once.
/// A grid without a header reads its columns like the last headed grid of
/// the same width.
pub fn audit_grids(grids: &[RawGrid], config: &AuditConfig) -> AuditReport {
    let mut stats = ExtractionStats {
        grids: grids.len(),
        ..Default::default()
    };
    let mut records = Vec::new();
    let mut warnings = Vec::new();
    // Header layout of the last table that had one, with that table's width.
    let mut carried: Option<(ColumnMap, usize)> = None;

    for grid in grids {
        let inherited = carried
            .filter(|(_, width)| *width == grid.width())
            .map(|(columns, _)| columns);
        let normalized = normalize_grid(grid, config, inherited);
        if let Some(columns) = normalized.header_columns {
            carried = Some((columns, grid.width()));
        }
        debug!(
            "{}: {} records, {} skipped, {} rejected",
            grid.source,
            normalized.records.len(),
            normalized.skipped,
            normalized.warnings.len()
        );
        stats.rows += normalized.rows;
        stats.skipped_rows += normalized.skipped;
        stats.malformed_rows += normalized.warnings.len();
        records.extend(normalized.records);
        warnings.extend(normalized.warnings);
    }
    stats.records = records.len();

    let aggregator = Aggregator::new(config.grade_scale(), config.retake_policy.policy());
    let (result, dropped) = aggregator.aggregate(records);
    stats.retakes_dropped = dropped;

    AuditReport {
        result,
        target_credits: config.target_credits,
        stats,
        warnings,
    }
}

/// Audit an in-memory document of a declared format.
pub fn audit_bytes(
    bytes: &[u8],
    format: DocumentFormat,
    config: &AuditConfig,
) -> Result<AuditReport, AuditError> {
    let start = Instant::now();
    info!("Auditing {} document ({} bytes)", format, bytes.len());

    let grids = extract_grids(bytes, format, config)?;
    let mut report = audit_grids(&grids, config);
    report.stats.total_duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Audit complete: {} passed, {} failed, {} credits in {}ms",
        report.result.passed.len(),
        report.result.failed.len(),
        report.result.total_credits,
        report.stats.total_duration_ms
    );
    Ok(report)
}

/// Audit a transcript file. The extension declares the format.
///
/// # Example
/// ```rust,no_run
/// use transcript_credits::{audit_file, AuditConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = audit_file("transcript.pdf", &AuditConfig::default()).await?;
/// println!("passed credits: {}", report.result.total_credits);
/// # Ok(())
/// # }
/// ```
pub async fn audit_file(
    path: impl AsRef<Path>,
    config: &AuditConfig,
) -> Result<AuditReport, AuditError> {
    let path = path.as_ref();
    info!("Starting audit: {}", path.display());

    let (format, bytes) = read_document(path).await?;
    let config = config.clone();

    tokio::task::spawn_blocking(move || audit_bytes(&bytes, format, &config))
        .await
        .map_err(|e| AuditError::Internal(format!("Audit task panicked: {}", e)))?
}

/// Synchronous wrapper around [`audit_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn audit_file_sync(
    path: impl AsRef<Path>,
    config: &AuditConfig,
) -> Result<AuditReport, AuditError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AuditError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(audit_file(path, config))
}
