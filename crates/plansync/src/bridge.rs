//! Database-to-list bridge: paged reads fed to the remote list API.

use std::collections::BTreeMap;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{DatabaseConfig, TransferOptions};
use crate::db::{ConnectionManager, SqlBackend};
use crate::error::{Result, SyncError};
use crate::remote::{ItemAction, ItemRecord, ListApi};
use crate::result::TransferResult;

/// SQL for one page of the configured read query.
fn page_sql(config: &DatabaseConfig, limit: usize, offset: usize) -> String {
    let query = config.query.trim().trim_end_matches(';');
    format!(
        "SELECT * FROM ({}) AS page_src LIMIT {} OFFSET {}",
        query, limit, offset
    )
}

/// Read the database page by page and apply each page to the remote list.
///
/// The query's column names are the list field names; they are checked
/// against the list's declared schema before any data is sent. Reading stops
/// at the first short page, so a row count that is an exact multiple of the
/// page size costs one extra empty probe.
pub async fn database_to_list<A, B>(
    api: &A,
    manager: &mut ConnectionManager<B>,
    db: &DatabaseConfig,
    options: &TransferOptions,
    action: ItemAction,
    cancel: &CancellationToken,
) -> Result<TransferResult>
where
    A: ListApi + ?Sized,
    B: SqlBackend,
{
    let started = Instant::now();
    let mut result = TransferResult::default();
    // The database fetch-size hint, when set, takes precedence over the
    // generic page size for reads.
    let page_size = db
        .fetch_size
        .map(|f| f as usize)
        .filter(|&f| f > 0)
        .unwrap_or(options.page_size);

    // A procedure name cannot be wrapped in a paged subquery.
    if db.stored_procedure {
        return Err(SyncError::config(
            "paged reads require a plain query; a stored procedure cannot be paged",
        ));
    }

    manager.ensure_connected(cancel).await?;

    let mut offset = 0usize;
    let mut validated = false;
    loop {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let sql = page_sql(db, page_size, offset);
        let page = manager.backend().query_rows(&sql).await?;
        let fetched = page.rows.len();
        debug!("page at offset {}: {} rows", offset, fetched);
        if fetched == 0 {
            break;
        }

        if !validated {
            let schema = api.schema().await?;
            schema.validate_fields(&page.columns)?;
            validated = true;
        }

        let items: Vec<ItemRecord> = page
            .rows
            .iter()
            .map(|row| {
                let fields: BTreeMap<String, String> = page
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                ItemRecord::new(fields)
            })
            .collect();

        let applied = api.apply_items(action, &items).await?;
        result.added += applied.added;
        result.updated += applied.updated;
        result.deleted += applied.deleted;
        // Failures bump the ignored counter themselves; only fold in the
        // ignores the platform reported without a failure descriptor.
        result.ignored += applied
            .ignored
            .saturating_sub(applied.failures.len() as u64);
        for failure in &applied.failures {
            let row = page.rows.get(failure.request_index).cloned().unwrap_or_default();
            result.record_failure(
                (offset + failure.request_index) as u64,
                failure.failure_type.clone(),
                row,
            );
        }
        result.pages_read += 1;

        if fetched < page_size {
            break;
        }
        offset += page_size;
    }

    manager.close().await;

    let elapsed = started.elapsed();
    info!(
        "{} sync complete: {} pages, +{} ~{} -{} ({} ignored) in {:.1}s",
        action.as_str(),
        result.pages_read,
        result.added,
        result.updated,
        result.deleted,
        result.ignored,
        elapsed.as_secs_f64()
    );
    Ok(result)
}
