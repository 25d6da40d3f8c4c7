//! Retake policies: which attempt of a repeated course counts.

use crate::grade::GradeScale;
use crate::model::CourseRecord;
use std::cmp::Ordering;

/// Decides between two attempts of the same course.
///
/// `earlier` was listed before `later` in the document. Returning `true`
/// makes `later` the authoritative attempt.
pub trait RetakePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn prefer_later(&self, earlier: &CourseRecord, later: &CourseRecord, scale: &GradeScale)
        -> bool;
}

/// Later term wins; otherwise the better grade; otherwise the later listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestTermThenBestGrade;

impl RetakePolicy for LatestTermThenBestGrade {
    fn name(&self) -> &'static str {
        "latest-term"
    }

    fn prefer_later(
        &self,
        earlier: &CourseRecord,
        later: &CourseRecord,
        scale: &GradeScale,
    ) -> bool {
        let by_term = match (&earlier.term, &later.term) {
            (Some(a), Some(b)) => a.chronological_cmp(b),
            _ => None,
        };
        match by_term {
            Some(Ordering::Less) => true,
            Some(Ordering::Greater) => false,
            Some(Ordering::Equal) | None => BestGrade.prefer_later(earlier, later, scale),
        }
    }
}

/// Better grade wins regardless of term; ties go to the later listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestGrade;

impl RetakePolicy for BestGrade {
    fn name(&self) -> &'static str {
        "best-grade"
    }

    fn prefer_later(
        &self,
        earlier: &CourseRecord,
        later: &CourseRecord,
        scale: &GradeScale,
    ) -> bool {
        scale.compare(&later.grade, &earlier.grade) != Ordering::Less
    }
}

/// The attempt printed last wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastListed;

impl RetakePolicy for LastListed {
    fn name(&self) -> &'static str {
        "last-listed"
    }

    fn prefer_later(&self, _: &CourseRecord, _: &CourseRecord, _: &GradeScale) -> bool {
        true
    }
}
