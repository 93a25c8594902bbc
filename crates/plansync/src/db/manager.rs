//! Connection lifecycle management with retry and backoff.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{is_transient, SqlBackend};
use crate::config::{validation, DatabaseConfig};
use crate::error::{Result, SyncError};
use crate::retry::RetryPolicy;

/// Owns one backend connection for the duration of one transfer.
///
/// Transient connection failures are retried with the shared backoff policy;
/// fatal ones (bad credentials, malformed connection string) surface
/// immediately. The pending-batch flush on shutdown belongs to the batch
/// writer; [`ConnectionManager::close`] handles the commit-and-close tail,
/// each step best-effort.
pub struct ConnectionManager<B: SqlBackend> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: SqlBackend> ConnectionManager<B> {
    /// Wrap a backend, re-checking the database configuration first so a
    /// hand-built config cannot reach `connect` unvalidated.
    pub fn new(backend: B, config: &DatabaseConfig, policy: RetryPolicy) -> Result<Self> {
        validation::validate_database(config)?;
        Ok(Self { backend, policy })
    }

    /// Mutable access to the backend for statement execution.
    pub fn backend(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Make sure a live connection exists, retrying transient failures.
    pub async fn ensure_connected(&mut self, cancel: &CancellationToken) -> Result<()> {
        if self.backend.is_connected() {
            return Ok(());
        }

        let mut retry = self.policy.begin();
        loop {
            match self.backend.connect().await {
                Ok(()) => {
                    debug!("database connection established");
                    return Ok(());
                }
                Err(e) if is_transient(&e) => {
                    if !retry.can_retry() {
                        return Err(SyncError::RetriesExhausted {
                            attempts: retry.attempts(),
                            message: format!("could not connect to database: {}", e),
                        });
                    }
                    warn!(
                        "transient connection failure (attempt {}): {}",
                        retry.attempts() + 1,
                        e
                    );
                    retry.wait(cancel).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Commit whatever is open and close the connection.
    ///
    /// Both steps are best-effort and independently logged; cleanup never
    /// propagates an error.
    pub async fn close(&mut self) {
        if self.backend.is_connected() {
            if let Err(e) = self.backend.commit().await {
                warn!("commit during close failed: {}", e);
            }
        }
        self.backend.close().await;
        debug!("database connection closed");
    }
}
