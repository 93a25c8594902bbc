//! Database access: the backend seam, connection management, and batch
//! outcome classification.

mod manager;
pub mod outcome;
mod postgres;

pub use manager::ConnectionManager;
pub use outcome::{classify, BatchOutcome, OutcomeClasses, ReportingConvention};
pub use postgres::PostgresBackend;

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::record::Row;

/// One page of query results with its column names.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Backend seam for the relational database.
///
/// One backend instance is exclusively owned by one transfer: it carries a
/// single connection, a single open transaction (autocommit disabled), and
/// one prepared statement for the configured query.
#[async_trait]
pub trait SqlBackend: Send {
    /// Open the connection and begin a transaction.
    async fn connect(&mut self) -> Result<()>;

    /// Whether the connection is currently usable.
    fn is_connected(&self) -> bool;

    /// Execute the configured query once per row as a single batch
    /// round-trip, returning per-row outcome codes.
    ///
    /// A connection-level problem is an `Err`; rows rejected by the database
    /// are reported through the returned [`BatchOutcome`].
    async fn execute_batch(&mut self, rows: &[Row]) -> Result<BatchOutcome>;

    /// Commit the open transaction and begin a new one.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction and begin a new one.
    async fn rollback(&mut self) -> Result<()>;

    /// Run an arbitrary read query, returning rows as strings.
    async fn query_rows(&mut self, sql: &str) -> Result<QueryPage>;

    /// Close the connection. Best-effort; never fails loudly.
    async fn close(&mut self);
}

/// Whether an error is worth retrying with backoff.
///
/// Transport-level failures carry no SQLSTATE; anything the server rejected
/// deliberately (bad credentials, malformed statement) does, and retrying it
/// would only repeat the rejection.
pub fn is_transient(err: &SyncError) -> bool {
    match err {
        SyncError::Connection { .. } => true,
        SyncError::Io(_) => true,
        SyncError::Database(e) => e.code().is_none(),
        _ => false,
    }
}
