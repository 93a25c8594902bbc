//! Configuration type definitions.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote planning platform configuration.
    pub remote: RemoteConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// Transfer behavior configuration.
    #[serde(default)]
    pub transfer: TransferOptions,
}

/// Remote planning platform API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API base URL (e.g. "https://api.example.com/2/0").
    pub endpoint: String,

    /// Workspace identifier.
    pub workspace_id: String,

    /// Model identifier.
    pub model_id: String,

    /// Bearer token for authentication.
    pub auth_token: String,
}

// Manual Debug keeps the auth token out of logs.
impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("workspace_id", &self.workspace_id)
            .field("model_id", &self.model_id)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// Database connection and query configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string (e.g. "host=localhost port=5432 dbname=plans").
    pub connection_string: String,

    /// Username.
    pub user: String,

    /// Password. Must be non-empty before connecting.
    pub password: String,

    /// Query or stored-procedure text executed per row/page.
    pub query: String,

    /// Whether `query` names a stored procedure rather than a statement.
    #[serde(default)]
    pub stored_procedure: bool,

    /// Ordered call-parameter list for stored-procedure invocation.
    #[serde(default)]
    pub call_parameters: Vec<String>,

    /// Fetch-size hint for paged reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_size: Option<u32>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("connection_string", &self.connection_string)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("query", &self.query)
            .field("stored_procedure", &self.stored_procedure)
            .field("call_parameters", &self.call_parameters)
            .field("fetch_size", &self.fetch_size)
            .finish()
    }
}

/// Transfer behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Rows per database batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Rows per page when reading the database for list sync.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Field separator for export chunk text.
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Maximum retries per connection attempt or batch attempt.
    #[serde(default = "default_max_retries")]
    pub max_retry_count: u32,

    /// Base backoff delay in milliseconds.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Backoff ceiling in milliseconds.
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,

    /// Backoff multiplier.
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            page_size: default_page_size(),
            separator: default_separator(),
            max_retry_count: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
            retry_multiplier: default_retry_multiplier(),
        }
    }
}

impl TransferOptions {
    /// Build the shared retry policy from the configured knobs.
    pub fn retry_policy(&self) -> crate::retry::RetryPolicy {
        crate::retry::RetryPolicy {
            base_period: Duration::from_millis(self.retry_base_ms),
            max_period: Duration::from_millis(self.retry_max_ms),
            multiplier: self.retry_multiplier,
            max_retries: self.max_retry_count,
        }
    }
}

// Default value functions for serde

fn default_batch_size() -> usize {
    1000
}

fn default_page_size() -> usize {
    500
}

fn default_separator() -> char {
    ','
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_ms() -> u64 {
    500
}

fn default_retry_max_ms() -> u64 {
    60_000
}

fn default_retry_multiplier() -> f64 {
    2.0
}
