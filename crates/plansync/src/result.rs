//! Transfer outcome accumulation.

use serde::Serialize;

use crate::record::Row;

/// Running counters and per-row failures for one full transfer.
///
/// Accumulates for the lifetime of a transfer and is returned to the caller;
/// the CLI renders it as log lines or JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferResult {
    /// Rows committed to the database (export direction).
    pub rows_transferred: u64,

    /// Batches committed (export direction).
    pub batches_committed: u64,

    /// Items added to the remote list (sync direction).
    pub added: u64,

    /// Items updated on the remote list.
    pub updated: u64,

    /// Items deleted from the remote list.
    pub deleted: u64,

    /// Rows ignored or rejected in either direction.
    pub ignored: u64,

    /// Pages read from the database (sync direction).
    pub pages_read: u64,

    /// Per-row failure descriptors.
    pub failures: Vec<RowFailure>,
}

/// One rejected row, with the original payload attached for diagnostics
/// (e.g. re-attempting a duplicate-key failure as an update).
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// Zero-based position of the row within the transfer.
    pub row_index: u64,

    /// Failure classification (e.g. "DUPLICATE") or database message.
    pub reason: String,

    /// The row as it was submitted.
    pub row: Row,
}

impl TransferResult {
    /// Record one rejected row.
    pub fn record_failure(&mut self, row_index: u64, reason: impl Into<String>, row: Row) {
        self.ignored += 1;
        self.failures.push(RowFailure {
            row_index,
            reason: reason.into(),
            row,
        });
    }

    /// Total rows that failed permanently.
    pub fn failed_rows(&self) -> usize {
        self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_failure_bumps_ignored() {
        let mut result = TransferResult::default();
        result.record_failure(3, "DUPLICATE", vec!["3".into(), "x".into()]);
        assert_eq!(result.ignored, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].row_index, 3);
        assert_eq!(result.failures[0].row, vec!["3", "x"]);
    }
}
