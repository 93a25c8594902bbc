//! Buffered batch writing with partial-failure recovery.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::db::outcome::classify;
use crate::db::{is_transient, ConnectionManager, SqlBackend};
use crate::error::{Result, SyncError};
use crate::mapping::ColumnMapping;
use crate::record::Row;
use crate::result::TransferResult;
use crate::retry::RetryPolicy;

/// Accumulates rows and writes them to the database in batches.
///
/// Each batch is one transaction. When the database rejects some rows of a
/// batch, the transaction is rolled back and the remainder is retried without
/// the offenders, so one bad row never sinks its batch-mates. Retries share
/// the transfer-wide backoff policy.
pub struct BatchWriter<'a, B: SqlBackend> {
    manager: &'a mut ConnectionManager<B>,
    batch_size: usize,
    policy: RetryPolicy,
    mapping: Option<ColumnMapping>,
    buffer: Vec<(u64, Row)>,
    rows_seen: u64,
    batch_number: u64,
}

impl<'a, B: SqlBackend> BatchWriter<'a, B> {
    pub fn new(
        manager: &'a mut ConnectionManager<B>,
        batch_size: usize,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            manager,
            batch_size,
            policy,
            mapping: None,
            buffer: Vec::with_capacity(batch_size),
            rows_seen: 0,
            batch_number: 0,
        }
    }

    /// Install the column mapping applied to every subsequent row.
    pub fn set_mapping(&mut self, mapping: ColumnMapping) {
        self.mapping = Some(mapping);
    }

    /// Buffer one row, flushing when the batch is full.
    pub async fn push(
        &mut self,
        row: Row,
        result: &mut TransferResult,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let bound = match &self.mapping {
            Some(mapping) => mapping.bind(&row),
            None => row,
        };
        self.buffer.push((self.rows_seen, bound));
        self.rows_seen += 1;
        if self.buffer.len() >= self.batch_size {
            self.flush(result, cancel).await?;
        }
        Ok(())
    }

    /// Write out whatever is buffered.
    pub async fn flush(
        &mut self,
        result: &mut TransferResult,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.batch_number += 1;
        let batch = std::mem::take(&mut self.buffer);
        self.write_batch(batch, result, cancel).await
    }

    async fn write_batch(
        &mut self,
        mut batch: Vec<(u64, Row)>,
        result: &mut TransferResult,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let batch_number = self.batch_number;
        let mut retry = self.policy.begin();

        loop {
            if cancel.is_cancelled() {
                let _ = self.manager.backend().rollback().await;
                return Err(SyncError::Cancelled);
            }
            self.manager.ensure_connected(cancel).await?;

            let rows: Vec<Row> = batch.iter().map(|(_, row)| row.clone()).collect();
            let outcome = match self.manager.backend().execute_batch(&rows).await {
                Ok(outcome) => outcome,
                Err(e) if is_transient(&e) => {
                    if !retry.can_retry() {
                        return Err(SyncError::RetriesExhausted {
                            attempts: retry.attempts(),
                            message: format!("batch {} failed: {}", batch_number, e),
                        });
                    }
                    warn!(
                        "batch {} hit a transient failure (attempt {}): {}",
                        batch_number,
                        retry.attempts() + 1,
                        e
                    );
                    retry.wait(cancel).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if outcome.fully_succeeded(batch.len()) {
                self.manager.backend().commit().await?;
                result.rows_transferred += batch.len() as u64;
                result.batches_committed += 1;
                debug!("batch {}, {} records committed", batch_number, batch.len());
                return Ok(());
            }

            // Partial failure: the whole transaction goes back, the rejected
            // rows are reported, and everything else is retried.
            let reason = outcome
                .error
                .clone()
                .unwrap_or_else(|| "rejected by database".to_string());
            let classes = classify(&outcome, batch.len());
            self.manager.backend().rollback().await?;

            for &index in &classes.rejected {
                let (row_index, row) = &batch[index];
                warn!(
                    "batch {}: row {} rejected: {}",
                    batch_number, row_index, reason
                );
                result.record_failure(*row_index, reason.clone(), row.clone());
            }

            let retryable = classes.retryable();
            if retryable.is_empty() {
                return Ok(());
            }
            if !retry.can_retry() {
                return Err(SyncError::RetriesExhausted {
                    attempts: retry.attempts(),
                    message: format!(
                        "batch {} still failing after excluding {} rejected rows",
                        batch_number,
                        classes.rejected.len()
                    ),
                });
            }
            batch = retryable.into_iter().map(|i| batch[i].clone()).collect();
            retry.wait(cancel).await;
        }
    }

    /// Rows pushed so far, flushed or not.
    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }
}
