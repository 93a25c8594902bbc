//! Batch outcome classification.
//!
//! Drivers disagree on how a partially failed batch is reported: some return
//! one code per attempted row, others stop reporting at the first failure.
//! Classification is abstracted behind [`classify`] so the batch writer never
//! sees the difference.

/// Per-row code for a row the driver rejected.
pub const EXECUTE_FAILED: i64 = -3;

/// Per-row code for a row that succeeded without a reported count.
pub const SUCCESS_NO_INFO: i64 = -2;

/// How the driver reports per-row outcome codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingConvention {
    /// One code per attempted row; failures marked with [`EXECUTE_FAILED`].
    PerAttemptedRow,

    /// Codes only for the rows processed before the first failure; the row
    /// at `codes.len()` is the offender and everything after it was never
    /// attempted.
    UntilFirstFailure,
}

/// Result of one batch execution.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub convention: ReportingConvention,
    pub codes: Vec<i64>,
    /// Driver message accompanying the failure, if any.
    pub error: Option<String>,
}

impl BatchOutcome {
    /// An outcome where every attempted row succeeded.
    pub fn success(attempted: usize) -> Self {
        Self {
            convention: ReportingConvention::PerAttemptedRow,
            codes: vec![1; attempted],
            error: None,
        }
    }

    /// Whether all `attempted` rows were applied.
    pub fn fully_succeeded(&self, attempted: usize) -> bool {
        match self.convention {
            ReportingConvention::PerAttemptedRow => {
                self.codes.len() == attempted && self.codes.iter().all(|&c| c != EXECUTE_FAILED)
            }
            ReportingConvention::UntilFirstFailure => self.codes.len() == attempted,
        }
    }
}

/// Row indices classified from a batch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeClasses {
    /// Rows the driver applied. The batch is rolled back as a whole, so
    /// these are retried together with the unattempted rows.
    pub applied: Vec<usize>,
    /// Rows the database rejected; excluded from retry and reported as
    /// failures.
    pub rejected: Vec<usize>,
    /// Rows the driver never got to; retried without being reported.
    pub unattempted: Vec<usize>,
}

impl OutcomeClasses {
    /// Indices worth retrying after the rejected rows are excluded,
    /// in original order.
    pub fn retryable(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .applied
            .iter()
            .chain(self.unattempted.iter())
            .copied()
            .collect();
        indices.sort_unstable();
        indices
    }
}

/// Classify every row of a batch as applied, rejected, or unattempted.
pub fn classify(outcome: &BatchOutcome, attempted: usize) -> OutcomeClasses {
    let mut applied = Vec::new();
    let mut rejected = Vec::new();
    let mut unattempted = Vec::new();

    match outcome.convention {
        ReportingConvention::PerAttemptedRow => {
            for index in 0..attempted {
                match outcome.codes.get(index) {
                    Some(&EXECUTE_FAILED) => rejected.push(index),
                    Some(_) => applied.push(index),
                    // Driver reported fewer codes than rows: those rows were
                    // not attempted.
                    None => unattempted.push(index),
                }
            }
        }
        ReportingConvention::UntilFirstFailure => {
            let reported = outcome.codes.len().min(attempted);
            applied.extend(0..reported);
            if reported < attempted {
                rejected.push(reported);
                unattempted.extend(reported + 1..attempted);
            }
        }
    }

    OutcomeClasses {
        applied,
        rejected,
        unattempted,
    }
}
