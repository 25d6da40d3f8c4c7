//! CSV export of the passed and failed lists.
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools open CJK
//! course names correctly. Header: `course_name,credit,grade,term`.

use crate::error::AuditError;
use crate::model::{AuditReport, CourseRecord};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const PASSED_FILE: &str = "passed.csv";
pub const FAILED_FILE: &str = "failed.csv";

/// Write records as CSV, BOM first.
pub fn write_records_csv<W: Write>(mut writer: W, records: &[CourseRecord]) -> csv::Result<()> {
    writer.write_all(UTF8_BOM)?;
    let mut csv = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);
    if records.is_empty() {
        csv.write_record(["course_name", "credit", "grade", "term"])?;
    }
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn records_to_csv_bytes(records: &[CourseRecord]) -> csv::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_records_csv(&mut buf, records)?;
    Ok(buf)
}

/// Parse a file produced by [`write_records_csv`]. A leading BOM is optional.
pub fn read_records_csv<R: Read>(mut reader: R) -> csv::Result<Vec<CourseRecord>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    csv::Reader::from_reader(body)
        .deserialize()
        .collect::<csv::Result<Vec<CourseRecord>>>()
}

/// Write `passed.csv` and `failed.csv` into `dir`.
///
/// Each file is written to a temp path and renamed, so a crash never leaves
/// a half-written CSV behind.
pub async fn export_csv(
    report: &AuditReport,
    dir: impl AsRef<Path>,
) -> Result<(PathBuf, PathBuf), AuditError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AuditError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let passed = dir.join(PASSED_FILE);
    let failed = dir.join(FAILED_FILE);
    write_atomic(&passed, &report.result.passed).await?;
    write_atomic(&failed, &report.result.failed).await?;

    info!("Wrote {} and {}", passed.display(), failed.display());
    Ok((passed, failed))
}

async fn write_atomic(path: &Path, records: &[CourseRecord]) -> Result<(), AuditError> {
    let write_err = |source: std::io::Error| AuditError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let bytes = records_to_csv_bytes(records).map_err(|e| write_err(e.into()))?;
    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, &bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::Credits;
    use crate::grade::Grade;
    use crate::model::Term;

    fn rec(name: &str, hundredths: u64, grade: &str) -> CourseRecord {
        CourseRecord::new(
            name,
            Credits::from_hundredths(hundredths),
            Grade::parse(grade).unwrap(),
        )
    }

    #[test]
    fn bom_and_header_come_first() {
        let bytes = records_to_csv_bytes(&[rec("微積分", 300, "85")]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("course_name,credit,grade,term"));
        assert_eq!(lines.next(), Some("微積分,3.00,85,"));
    }

    #[test]
    fn empty_list_still_has_a_header() {
        let bytes = records_to_csv_bytes(&[]).unwrap();
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        assert_eq!(text.trim_end(), "course_name,credit,grade,term");
        assert!(read_records_csv(&bytes[..]).unwrap().is_empty());
    }

    #[test]
    fn parses_back_what_it_wrote() {
        let records = vec![
            rec("Linear Algebra, Part I", 250, "B+"),
            rec("體育", 0, "通過"),
            rec("英文", 200, "補考58").with_term(Term::parse("112-2").unwrap()),
        ];
        let bytes = records_to_csv_bytes(&records).unwrap();
        assert_eq!(read_records_csv(&bytes[..]).unwrap(), records);
    }

    #[test]
    fn reads_without_bom() {
        let input = "course_name,credit,grade,term\nArt,1.5,P,\n";
        let parsed = read_records_csv(input.as_bytes()).unwrap();
        assert_eq!(parsed[0].credit, Credits::from_hundredths(150));
        assert!(parsed[0].term.is_none());
    }

    #[tokio::test]
    async fn export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = AuditReport {
            result: crate::model::AggregationResult {
                total_credits: Credits::whole(3),
                passed: vec![rec("微積分", 300, "85")],
                failed: vec![],
            },
            target_credits: Credits::whole(128),
            stats: Default::default(),
            warnings: vec![],
        };
        let (passed, failed) = export_csv(&report, dir.path().join("out")).await.unwrap();
        let passed_back = read_records_csv(std::fs::File::open(&passed).unwrap()).unwrap();
        assert_eq!(passed_back, report.result.passed);
        assert!(read_records_csv(std::fs::File::open(&failed).unwrap())
            .unwrap()
            .is_empty());
        assert!(!passed.with_extension("csv.tmp").exists());
    }
}
