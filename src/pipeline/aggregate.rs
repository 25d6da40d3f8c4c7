//! Credit aggregator: deduplicate retakes, classify, sum.

use super::retake::RetakePolicy;
use crate::credit::Credits;
use crate::grade::GradeScale;
use crate::model::{AggregationResult, CourseRecord, Status};
use std::collections::HashMap;
use tracing::debug;

/// Turns the records of one document into a credit total.
pub struct Aggregator<'p> {
    scale: GradeScale,
    policy: &'p dyn RetakePolicy,
}

impl<'p> Aggregator<'p> {
    pub fn new(scale: GradeScale, policy: &'p dyn RetakePolicy) -> Self {
        Self { scale, policy }
    }

    pub fn classify(&self, record: &CourseRecord) -> Status {
        if self.scale.passes(&record.grade) {
            Status::Pass
        } else {
            Status::Fail
        }
    }

    /// Keep one attempt per course, in order of first appearance.
    ///
    /// Returns the survivors and how many superseded attempts were dropped.
    pub fn deduplicate(&self, records: Vec<CourseRecord>) -> (Vec<CourseRecord>, usize) {
        let mut slots: Vec<CourseRecord> = Vec::with_capacity(records.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut dropped = 0;

        for record in records {
            let key = record.course_key();
            match index.get(&key) {
                Some(&slot) => {
                    dropped += 1;
                    if self
                        .policy
                        .prefer_later(&slots[slot], &record, &self.scale)
                    {
                        debug!(
                            "Retake of {:?}: {} replaces {} ({})",
                            record.course_name,
                            record.grade,
                            slots[slot].grade,
                            self.policy.name()
                        );
                        slots[slot] = record;
                    }
                }
                None => {
                    index.insert(key, slots.len());
                    slots.push(record);
                }
            }
        }

        (slots, dropped)
    }

    /// Deduplicate, classify and sum. Also returns the number of dropped
    /// retake attempts.
    pub fn aggregate(&self, records: Vec<CourseRecord>) -> (AggregationResult, usize) {
        let (survivors, dropped) = self.deduplicate(records);
        let mut result = AggregationResult::default();

        for record in survivors {
            match self.classify(&record) {
                Status::Pass => result.passed.push(record),
                Status::Fail => result.failed.push(record),
            }
        }
        result.total_credits = result.passed.iter().map(|r| r.credit).sum::<Credits>();

        (result, dropped)
    }
}
