use std::time::Duration;

use crate::audio::SilenceInterval;
use crate::error::{ChapterizeError, Result};

/// Ordered, queryable index over the external detector's silence intervals.
///
/// Queries are binary searches; the gate runs one per candidate edge.
#[derive(Debug, Clone)]
pub struct SilenceMap {
    intervals: Vec<SilenceInterval>,
}

impl SilenceMap {
    /// Build the map, validating the upstream ordering contract.
    pub fn new(intervals: Vec<SilenceInterval>) -> Result<Self> {
        for (i, iv) in intervals.iter().enumerate() {
            if iv.end < iv.start {
                return Err(ChapterizeError::ContractViolation(format!(
                    "silence interval {} ends before it starts ({:?} > {:?})",
                    i, iv.start, iv.end
                )));
            }
            if i > 0 && iv.start < intervals[i - 1].end {
                return Err(ChapterizeError::ContractViolation(format!(
                    "silence intervals {} and {} overlap or are unsorted",
                    i - 1,
                    i
                )));
            }
        }
        Ok(Self { intervals })
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Index of the interval containing `t` (inclusive on both edges).
    fn locate(&self, t: Duration) -> Option<usize> {
        let idx = self.intervals.partition_point(|iv| iv.start <= t);
        if idx == 0 {
            return None;
        }
        let candidate = idx - 1;
        (t <= self.intervals[candidate].end).then_some(candidate)
    }

    pub fn is_silent_at(&self, t: Duration) -> bool {
        self.locate(t).is_some()
    }

    /// Length of the contiguous silent span ending at `t`.
    ///
    /// Zero when `t` is not inside (or at the trailing edge of) an interval.
    pub fn silent_run_ending_at(&self, t: Duration) -> Duration {
        match self.locate(t) {
            Some(i) => t - self.intervals[i].start,
            None => Duration::ZERO,
        }
    }

    /// Length of the contiguous silent span starting at `t`.
    pub fn silent_run_starting_at(&self, t: Duration) -> Duration {
        match self.locate(t) {
            Some(i) => self.intervals[i].end - t,
            None => Duration::ZERO,
        }
    }
}
