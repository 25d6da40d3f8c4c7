//! Configuration types for a transcript audit.
//!
//! All behaviour is controlled through [`AuditConfig`], built via its
//! [`AuditConfigBuilder`]. Per-request knobs (target, threshold, retake
//! policy) live here; the recognition tables that never change between
//! requests live in [`crate::locale::LOCALE`].

use crate::credit::Credits;
use crate::error::AuditError;
use crate::grade::GradeScale;
use crate::pipeline::columns::ColumnMap;
use crate::pipeline::retake::{BestGrade, LastListed, LatestTermThenBestGrade, RetakePolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for one transcript audit.
///
/// Built via [`AuditConfig::builder()`] or using [`AuditConfig::default()`].
///
/// # Example
/// ```rust
/// use transcript_credits::{AuditConfig, RetakePolicyKind};
///
/// let config = AuditConfig::builder()
///     .target_credits_whole(132)
///     .pass_score(70)
///     .retake_policy(RetakePolicyKind::BestGrade)
///     .build()
///     .unwrap();
/// assert_eq!(config.pass_score, 70);
/// ```
#[derive(Clone)]
pub struct AuditConfig {
    /// Graduation threshold the passed total is compared against. Default: 128.
    pub target_credits: Credits,

    /// Minimum passing numeric score, 0–100. Default: 60.
    ///
    /// Letter grades pass when the floor of their band reaches this score
    /// (C- = 60, B- = 70), so raising it to 70 for graduate transcripts
    /// moves letters and numbers together.
    pub pass_score: u32,

    /// Which attempt of a retaken course counts. Default:
    /// [`RetakePolicyKind::LatestTermThenBestGrade`].
    pub retake_policy: RetakePolicyKind,

    /// Column positions assumed when a table has no recognisable header.
    /// Default: name 0, credit 1, grade 2, no term.
    pub default_columns: ColumnMap,

    /// How many leading rows of each table to scan for a header, 1–3.
    /// Default: 3.
    pub header_scan_rows: usize,

    /// Explicit pdfium library (file or containing directory). Falls back to
    /// `PDFIUM_LIB_PATH`, then the system library search path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// PDF user password for encrypted transcripts.
    pub password: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            target_credits: Credits::whole(128),
            pass_score: 60,
            retake_policy: RetakePolicyKind::default(),
            default_columns: ColumnMap::default(),
            header_scan_rows: 3,
            pdfium_lib_path: None,
            password: None,
        }
    }
}

impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field("target_credits", &self.target_credits)
            .field("pass_score", &self.pass_score)
            .field("retake_policy", &self.retake_policy)
            .field("default_columns", &self.default_columns)
            .field("header_scan_rows", &self.header_scan_rows)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AuditConfig {
    /// Create a new builder for `AuditConfig`.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder {
            config: Self::default(),
        }
    }

    /// The pass criterion derived from `pass_score`.
    pub fn grade_scale(&self) -> GradeScale {
        GradeScale::new(self.pass_score)
    }
}

/// Builder for [`AuditConfig`].
#[derive(Debug)]
pub struct AuditConfigBuilder {
    config: AuditConfig,
}

impl AuditConfigBuilder {
    pub fn target_credits(mut self, credits: Credits) -> Self {
        self.config.target_credits = credits;
        self
    }

    pub fn target_credits_whole(mut self, credits: u64) -> Self {
        self.config.target_credits = Credits::whole(credits);
        self
    }

    pub fn pass_score(mut self, score: u32) -> Self {
        self.config.pass_score = score;
        self
    }

    pub fn retake_policy(mut self, policy: RetakePolicyKind) -> Self {
        self.config.retake_policy = policy;
        self
    }

    pub fn default_columns(mut self, columns: ColumnMap) -> Self {
        self.config.default_columns = columns;
        self
    }

    pub fn header_scan_rows(mut self, rows: usize) -> Self {
        self.config.header_scan_rows = rows.clamp(1, 3);
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AuditConfig, AuditError> {
        let c = &self.config;
        if c.pass_score > 100 {
            return Err(AuditError::InvalidConfig(format!(
                "Pass score must be 0–100, got {}",
                c.pass_score
            )));
        }
        if !c.default_columns.is_distinct() {
            return Err(AuditError::InvalidConfig(format!(
                "Default columns must be distinct, got {:?}",
                c.default_columns
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which attempt of a retaken course is authoritative.
///
/// Real transcripts differ in whether they print a term column at all, so
/// the choice is explicit rather than inferred.
///
/// | Policy | Rule |
/// |--------|------|
/// | `LatestTermThenBestGrade` | later term wins; without comparable terms the better grade wins (default) |
/// | `BestGrade` | better grade wins, terms ignored |
/// | `LastListed` | the attempt printed last wins |
///
/// Every policy breaks a full tie in favour of the attempt listed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetakePolicyKind {
    #[default]
    LatestTermThenBestGrade,
    BestGrade,
    LastListed,
}

impl RetakePolicyKind {
    /// The policy object implementing this choice.
    pub fn policy(self) -> &'static dyn RetakePolicy {
        match self {
            RetakePolicyKind::LatestTermThenBestGrade => &LatestTermThenBestGrade,
            RetakePolicyKind::BestGrade => &BestGrade,
            RetakePolicyKind::LastListed => &LastListed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_undergraduate_rules() {
        let c = AuditConfig::default();
        assert_eq!(c.target_credits.to_string(), "128.00");
        assert_eq!(c.pass_score, 60);
        assert_eq!(c.header_scan_rows, 3);
        assert_eq!(c.retake_policy, RetakePolicyKind::LatestTermThenBestGrade);
    }

    #[test]
    fn builder_clamps_scan_rows() {
        let c = AuditConfig::builder().header_scan_rows(9).build().unwrap();
        assert_eq!(c.header_scan_rows, 3);
        let c = AuditConfig::builder().header_scan_rows(0).build().unwrap();
        assert_eq!(c.header_scan_rows, 1);
    }

    #[test]
    fn builder_rejects_out_of_range_pass_score() {
        let err = AuditConfig::builder().pass_score(101).build().unwrap_err();
        assert!(matches!(err, AuditError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_overlapping_default_columns() {
        let err = AuditConfig::builder()
            .default_columns(ColumnMap::new(0, 0, 1))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = AuditConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn policy_names() {
        assert_eq!(RetakePolicyKind::BestGrade.policy().name(), "best-grade");
        assert_eq!(RetakePolicyKind::LastListed.policy().name(), "last-listed");
    }
}
