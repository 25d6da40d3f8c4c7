//! PDF loader: read positioned characters via pdfium, rebuild tables.
//!
//! pdfium only supplies glyphs and their boxes; all table logic lives in
//! [`super::layout`]. This module is the thin, untestable-without-a-library
//! shim around it.
//!
//! pdfium is synchronous and keeps thread-local state, so this code must
//! run on a blocking thread when called from async contexts
//! (see [`crate::audit::audit_file`]).

use super::input::{check_magic, DocumentFormat};
use super::layout::{self, Glyph};
use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::model::RawGrid;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[cfg(target_os = "macos")]
const PLATFORM_LIB_NAME: &str = "libpdfium.dylib";
#[cfg(target_os = "windows")]
const PLATFORM_LIB_NAME: &str = "pdfium.dll";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_LIB_NAME: &str = "libpdfium.so";

/// Extract every table-like block of a PDF as raw grids.
///
/// Tables that continue across a page break come back as one grid.
pub fn load_pdf(bytes: &[u8], config: &AuditConfig) -> Result<Vec<RawGrid>, AuditError> {
    check_magic(bytes, DocumentFormat::Pdf)?;

    let pdfium = bind_pdfium(config.pdfium_lib_path.as_deref())?;
    let password = config.password.as_deref();

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    "wrong password for encrypted PDF".to_string()
                } else {
                    "PDF is encrypted and requires a password".to_string()
                }
            } else {
                err_str
            };
            AuditError::DocumentFormat {
                format: DocumentFormat::Pdf,
                detail,
            }
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut tables = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let glyphs = match page_glyphs(&page) {
            Ok(g) => g,
            Err(e) => {
                warn!("Skipping page {}: no text layer ({:?})", page_num, e);
                continue;
            }
        };
        let lines = layout::group_lines(&glyphs);
        let page_tables = layout::page_tables(page_num, &lines);
        debug!(
            "Page {} → {} glyphs, {} lines, {} table blocks",
            page_num,
            glyphs.len(),
            lines.len(),
            page_tables.len()
        );
        tables.extend(page_tables);
    }

    let grids = layout::stitch_pages(tables);
    info!("Extracted {} grids from PDF", grids.len());
    Ok(grids)
}

/// Collect the page's characters with their tight bounding boxes.
fn page_glyphs(page: &PdfPage) -> Result<Vec<Glyph>, PdfiumError> {
    let text = page.text()?;
    let mut glyphs = Vec::new();
    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        let Ok(bounds) = ch.tight_bounds() else {
            continue;
        };
        glyphs.push(Glyph {
            ch: c,
            left: bounds.left.value,
            right: bounds.right.value,
            bottom: bounds.bottom.value,
            top: bounds.top.value,
        });
    }
    Ok(glyphs)
}

/// Bind to a pdfium library: explicit path, then `PDFIUM_LIB_PATH`, then the
/// system search path.
fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, AuditError> {
    let configured: Option<PathBuf> = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match configured {
        Some(path) => {
            let lib = if path.is_dir() {
                path.join(PLATFORM_LIB_NAME)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AuditError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_before_binding() {
        // Must fail on the magic check even on machines without pdfium.
        let config = AuditConfig::default();
        let err = load_pdf(b"PK\x03\x04not a pdf", &config).unwrap_err();
        assert!(matches!(
            err,
            AuditError::DocumentFormat {
                format: DocumentFormat::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn missing_library_is_a_binding_error() {
        match bind_pdfium(Some(Path::new("/nonexistent/libpdfium.so"))) {
            Err(AuditError::PdfiumBindingFailed(_)) => {}
            Err(other) => panic!("expected a binding error, got {other}"),
            Ok(_) => panic!("bound to a library that does not exist"),
        }
    }
}
