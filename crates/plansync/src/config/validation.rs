//! Configuration validation.
//!
//! Everything here fails fast: a configuration problem is never retried.

use super::Config;
use crate::error::{Result, SyncError};

/// Hard limit on the connection string length.
pub const MAX_CONNECTION_STRING_LEN: usize = 1500;

/// Hard limit on the query / stored-procedure text length.
pub const MAX_QUERY_LEN: usize = 65_535;

/// Driver options that enable remote code execution or query interception.
/// Checked as case-insensitive substrings of the connection string.
const DISALLOWED_DRIVER_OPTIONS: &[&str] = &[
    "autodeserialize=",
    "queryinterceptors=",
    "statementinterceptors=",
    "allowloadlocalinfile=true",
    "allowurlinlocalinfile=true",
    "autodeserialize=true",
    "detectcustomcollations=true",
    "serverstatusdiffinterceptor=",
];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Remote validation
    if config.remote.endpoint.is_empty() {
        return Err(SyncError::config("remote.endpoint is required"));
    }
    if config.remote.workspace_id.is_empty() {
        return Err(SyncError::config("remote.workspace_id is required"));
    }
    if config.remote.model_id.is_empty() {
        return Err(SyncError::config("remote.model_id is required"));
    }

    validate_database(&config.database)?;

    // Transfer validation
    if config.transfer.batch_size == 0 {
        return Err(SyncError::config("transfer.batch_size must be at least 1"));
    }
    if config.transfer.page_size == 0 {
        return Err(SyncError::config("transfer.page_size must be at least 1"));
    }
    if config.transfer.separator == '"' || config.transfer.separator == '\n' {
        return Err(SyncError::config(
            "transfer.separator must not be a quote or newline",
        ));
    }
    if config.transfer.retry_multiplier < 1.0 {
        return Err(SyncError::config(
            "transfer.retry_multiplier must be at least 1.0",
        ));
    }

    Ok(())
}

/// Validate the database section alone.
///
/// Also run by the connection manager before any connection attempt, so a
/// hand-built config cannot bypass the checks.
pub fn validate_database(db: &super::DatabaseConfig) -> Result<()> {
    if db.connection_string.is_empty() {
        return Err(SyncError::config("database.connection_string is required"));
    }
    if db.connection_string.len() > MAX_CONNECTION_STRING_LEN {
        return Err(SyncError::Config(format!(
            "database.connection_string exceeds {} characters",
            MAX_CONNECTION_STRING_LEN
        )));
    }
    if db.password.is_empty() {
        return Err(SyncError::config("database.password must not be empty"));
    }
    let lowered = db.connection_string.to_lowercase();
    for option in DISALLOWED_DRIVER_OPTIONS {
        if lowered.contains(option) {
            return Err(SyncError::Config(format!(
                "database.connection_string contains disallowed driver option '{}'",
                option.trim_end_matches('=')
            )));
        }
    }
    if db.query.is_empty() {
        return Err(SyncError::config("database.query is required"));
    }
    if db.query.len() > MAX_QUERY_LEN {
        return Err(SyncError::Config(format!(
            "database.query exceeds {} characters",
            MAX_QUERY_LEN
        )));
    }

    Ok(())
}
