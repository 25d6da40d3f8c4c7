//! Input resolution: declared format, magic-byte check, file reading.
//!
//! The format is *declared* by the file extension and then verified against
//! the container's magic bytes. A mismatch is a format error; the loader
//! never retries with the other format, because a renamed file is far more
//! often a corrupt upload than a mislabelled one.

use crate::error::AuditError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// The two accepted transcript containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Map a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Result<Self, AuditError> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(AuditError::UnsupportedExtension {
                extension: ext.to_string(),
            }),
        }
    }

    /// Declared format of a path, from its extension.
    pub fn from_path(path: &Path) -> Result<Self, AuditError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }

    fn magic(self) -> &'static [u8] {
        match self {
            DocumentFormat::Pdf => PDF_MAGIC,
            DocumentFormat::Docx => ZIP_MAGIC,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => f.write_str("PDF"),
            DocumentFormat::Docx => f.write_str("DOCX"),
        }
    }
}

/// Verify the bytes start with the declared container's signature.
pub fn check_magic(bytes: &[u8], format: DocumentFormat) -> Result<(), AuditError> {
    let magic = format.magic();
    if bytes.starts_with(magic) {
        return Ok(());
    }
    let head: Vec<u8> = bytes.iter().take(4).copied().collect();
    Err(AuditError::DocumentFormat {
        format,
        detail: format!("unexpected leading bytes {head:?}"),
    })
}

/// Read a transcript from disk, returning its declared format and bytes.
///
/// The extension is checked before the file is opened, so an unsupported
/// type fails fast without I/O.
pub async fn read_document(path: &Path) -> Result<(DocumentFormat, Vec<u8>), AuditError> {
    let format = DocumentFormat::from_path(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| map_read_error(path.to_path_buf(), e))?;
    debug!("Read {} bytes of {} from {}", bytes.len(), format, path.display());
    Ok((format, bytes))
}

fn map_read_error(path: PathBuf, e: std::io::Error) -> AuditError {
    match e.kind() {
        std::io::ErrorKind::NotFound => AuditError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => AuditError::PermissionDenied { path },
        _ => AuditError::Internal(format!("reading {}: {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(DocumentFormat::from_extension("pdf").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_extension("PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_extension("Docx").unwrap(), DocumentFormat::Docx);
        assert!(matches!(
            DocumentFormat::from_extension("doc"),
            Err(AuditError::UnsupportedExtension { .. })
        ));
        assert!(DocumentFormat::from_path(Path::new("transcript")).is_err());
    }

    #[test]
    fn test_check_magic() {
        assert!(check_magic(b"%PDF-1.7\n...", DocumentFormat::Pdf).is_ok());
        assert!(check_magic(b"PK\x03\x04rest", DocumentFormat::Docx).is_ok());
        assert!(check_magic(b"PK\x03\x04rest", DocumentFormat::Pdf).is_err());
        assert!(check_magic(b"%PDF-1.7", DocumentFormat::Docx).is_err());
        assert!(check_magic(b"", DocumentFormat::Pdf).is_err());
    }

    #[tokio::test]
    async fn test_read_document_missing_file() {
        let err = read_document(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_document_rejects_extension_first() {
        let err = read_document(Path::new("/definitely/not/here.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::UnsupportedExtension { .. }));
    }
}
