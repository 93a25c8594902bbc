//! Export-to-database transfer pipeline.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::batch::BatchWriter;
use crate::config::TransferOptions;
use crate::db::{ConnectionManager, SqlBackend};
use crate::error::{Result, SyncError};
use crate::mapping::ColumnMapping;
use crate::record::{Chunk, Reconciler};
use crate::remote::ChunkSource;
use crate::result::TransferResult;

/// Stream an export's chunks into the database.
///
/// Chunks are fetched strictly in order, reconciled across boundaries, and
/// written in batches of `options.batch_size`. `columns` selects and orders
/// header columns for statement binding; leave it empty to bind every column
/// in header order.
pub async fn export_to_database<S, B>(
    source: &S,
    manager: &mut ConnectionManager<B>,
    options: &TransferOptions,
    columns: &[String],
    cancel: &CancellationToken,
) -> Result<TransferResult>
where
    S: ChunkSource + ?Sized,
    B: SqlBackend,
{
    let started = Instant::now();
    let mut result = TransferResult::default();

    manager.ensure_connected(cancel).await?;
    let total = source.chunk_count().await?;
    info!("export has {} chunks", total);

    let mut reconciler = Reconciler::new(options.separator);
    let mut writer = BatchWriter::new(manager, options.batch_size, options.retry_policy());
    let mut mapped = false;

    for ordinal in 0..total {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let text = source.fetch_chunk(ordinal).await?;
        debug!("chunk {}/{}: {} bytes", ordinal + 1, total, text.len());
        let chunk = Chunk::new(ordinal, total, text);
        let rows = reconciler.push_chunk(&chunk)?;

        if !mapped {
            if let Some(header) = reconciler.header() {
                // Without an explicit column list, bind every header column
                // positionally; either way rows are normalized to the
                // mapping's arity, padding short ones with empty strings.
                let mapping = if columns.is_empty() {
                    ColumnMapping::identity(header.len())
                } else {
                    ColumnMapping::from_header(header, columns)?
                };
                writer.set_mapping(mapping);
                mapped = true;
            }
        }

        for row in rows {
            writer.push(row, &mut result, cancel).await?;
        }
    }

    // Finish phase: the last chunk's held-back candidate comes out here.
    for row in reconciler.finish()? {
        writer.push(row, &mut result, cancel).await?;
    }
    writer.flush(&mut result, cancel).await?;
    drop(writer);

    manager.close().await;

    let elapsed = started.elapsed();
    let rate = result.rows_transferred as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!(
        "export complete: {} rows in {} batches ({} ignored) in {:.1}s ({:.0} rows/s)",
        result.rows_transferred,
        result.batches_committed,
        result.ignored,
        elapsed.as_secs_f64(),
        rate
    );
    Ok(result)
}
