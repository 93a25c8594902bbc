//! plansync - transfer engine between a remote planning platform and a
//! relational database.
//!
//! The library moves data in both directions:
//!
//! - **Export to database**: a server-side export is downloaded as ordered
//!   text chunks, stitched back into logical records across chunk
//!   boundaries, and written to the database in transactional batches with
//!   per-row failure recovery.
//! - **Database to list**: a read query is paged with LIMIT/OFFSET and each
//!   page is applied to a remote list as a bulk add, update, or delete.
//!
//! Both directions share one [`retry::RetryPolicy`] for connection and batch
//! backoff and report through a [`result::TransferResult`].
//!
//! # Quick start
//!
//! ```no_run
//! use plansync::config::Config;
//! use plansync::db::{ConnectionManager, PostgresBackend};
//! use plansync::remote::http::{ApiClient, HttpChunkSource};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> plansync::error::Result<()> {
//! let config = Config::load("config.yaml")?;
//! let policy = config.transfer.retry_policy();
//! let backend = PostgresBackend::new(config.database.clone());
//! let mut manager = ConnectionManager::new(backend, &config.database, policy)?;
//! let client = ApiClient::new(&config.remote)?;
//! let source = HttpChunkSource::new(client, "file-1");
//! let cancel = CancellationToken::new();
//! let result = plansync::export::export_to_database(
//!     &source,
//!     &mut manager,
//!     &config.transfer,
//!     &[],
//!     &cancel,
//! )
//! .await?;
//! println!("{} rows", result.rows_transferred);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod bridge;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod mapping;
pub mod record;
pub mod remote;
pub mod result;
pub mod retry;

pub use batch::BatchWriter;
pub use bridge::database_to_list;
pub use config::Config;
pub use db::{ConnectionManager, PostgresBackend, SqlBackend};
pub use error::{Result, SyncError};
pub use export::export_to_database;
pub use mapping::ColumnMapping;
pub use record::{Chunk, Reconciler, Row};
pub use remote::{ChunkSource, ItemAction, ListApi};
pub use result::TransferResult;
pub use retry::RetryPolicy;
