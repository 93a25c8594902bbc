//! Error types for the transfer library.

use thiserror::Error;

/// Main error type for transfer operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error (invalid YAML, oversized connection string,
    /// disallowed driver option, etc.). Never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or statement error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Remote API transport error.
    #[error("Remote API error: {0}")]
    Remote(#[from] reqwest::Error),

    /// Remote API rejected a request with a platform-level error body.
    #[error("Remote API rejected request: {status}: {message}")]
    RemoteRejected { status: u16, message: String },

    /// Connection attempt failed with context about where it occurred.
    #[error("Connection failed: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Data transfer failed for a specific batch.
    #[error("Transfer failed at batch {batch}: {message}")]
    Transfer { batch: u64, message: String },

    /// Retry ceiling reached for a connection or batch.
    #[error("Giving up after {attempts} retries: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Header-to-field mapping does not match the remote list schema.
    #[error("Header mapping error: {0}")]
    Mapping(String),

    /// Export chunk arrived out of order or with inconsistent totals.
    #[error("Chunk sequence error: {0}")]
    ChunkSequence(String),

    /// IO error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transfer was cancelled (SIGINT, etc.)
    #[error("Transfer cancelled")]
    Cancelled,
}

impl SyncError {
    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        SyncError::Config(message.into())
    }

    /// Create a Connection error with context about where it occurred.
    pub fn connection(message: impl Into<String>, context: impl Into<String>) -> Self {
        SyncError::Connection {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Transfer error for a specific batch.
    pub fn transfer(batch: u64, message: impl Into<String>) -> Self {
        SyncError::Transfer {
            batch,
            message: message.into(),
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) | SyncError::Mapping(_) => 2,
            SyncError::Cancelled => 130,
            _ => 1,
        }
    }
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, SyncError>;
