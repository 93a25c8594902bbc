//! PostgreSQL backend.
//!
//! Runs the whole transfer inside explicit transactions (autocommit stays
//! off) and executes batches row by row under a savepoint, which yields a
//! true per-attempted-row outcome code for every row.

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{debug, warn};

use super::outcome::{BatchOutcome, ReportingConvention, EXECUTE_FAILED};
use super::{QueryPage, SqlBackend};
use crate::config::DatabaseConfig;
use crate::error::{Result, SyncError};
use crate::record::Row;

const ROW_SAVEPOINT: &str = "plansync_row";

pub struct PostgresBackend {
    config: DatabaseConfig,
    client: Option<Client>,
    statement: Option<Statement>,
}

impl PostgresBackend {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            client: None,
            statement: None,
        }
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .filter(|c| !c.is_closed())
            .ok_or_else(|| SyncError::connection("no live connection", "postgres backend"))
    }

    /// SQL text for the configured query, expanded to a CALL statement when
    /// it names a stored procedure.
    fn statement_sql(&self, arity: usize) -> String {
        if self.config.stored_procedure {
            let placeholders: Vec<String> = (1..=arity).map(|i| format!("${}", i)).collect();
            format!("CALL {}({})", self.config.query, placeholders.join(", "))
        } else {
            self.config.query.clone()
        }
    }

    /// Prepare (once per connection) the statement for rows of this arity.
    async fn ensure_statement(&mut self, arity: usize) -> Result<Statement> {
        if let Some(statement) = &self.statement {
            return Ok(statement.clone());
        }
        let sql = self.statement_sql(arity);
        let statement = self.client()?.prepare(&sql).await?;
        self.statement = Some(statement.clone());
        Ok(statement)
    }
}

#[async_trait]
impl SqlBackend for PostgresBackend {
    async fn connect(&mut self) -> Result<()> {
        let conn_string = self.config.full_connection_string();
        let (client, connection) = tokio_postgres::connect(&conn_string, NoTls).await?;

        // The connection object drives the socket until the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!("postgres connection task ended: {}", e);
            }
        });

        client.batch_execute("BEGIN").await?;
        self.client = Some(client);
        self.statement = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.as_ref().map_or(false, |c| !c.is_closed())
    }

    async fn execute_batch(&mut self, rows: &[Row]) -> Result<BatchOutcome> {
        let arity = self.config.call_parameters.len()
            + rows.first().map(|r| r.len()).unwrap_or_default();
        let statement = self.ensure_statement(arity).await?;
        let client = self.client()?;

        let mut codes = Vec::with_capacity(rows.len());
        let mut error: Option<String> = None;

        for row in rows {
            let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> =
                Vec::with_capacity(arity);
            for value in &self.config.call_parameters {
                params.push(value);
            }
            for cell in row {
                params.push(cell);
            }

            client
                .batch_execute(&format!("SAVEPOINT {}", ROW_SAVEPOINT))
                .await?;
            match client.execute(&statement, &params).await {
                Ok(count) => {
                    codes.push(count as i64);
                    client
                        .batch_execute(&format!("RELEASE SAVEPOINT {}", ROW_SAVEPOINT))
                        .await?;
                }
                Err(e) => {
                    // A transport failure aborts the batch; a statement
                    // rejection only fails this row.
                    if e.code().is_none() {
                        return Err(e.into());
                    }
                    codes.push(EXECUTE_FAILED);
                    if error.is_none() {
                        error = Some(e.to_string());
                    }
                    client
                        .batch_execute(&format!("ROLLBACK TO SAVEPOINT {}", ROW_SAVEPOINT))
                        .await?;
                }
            }
        }

        Ok(BatchOutcome {
            convention: ReportingConvention::PerAttemptedRow,
            codes,
            error,
        })
    }

    async fn commit(&mut self) -> Result<()> {
        self.client()?.batch_execute("COMMIT; BEGIN").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.client()?.batch_execute("ROLLBACK; BEGIN").await?;
        Ok(())
    }

    async fn query_rows(&mut self, sql: &str) -> Result<QueryPage> {
        let messages = self.client()?.simple_query(sql).await?;

        let mut page = QueryPage::default();
        for message in messages {
            if let tokio_postgres::SimpleQueryMessage::Row(row) = message {
                if page.columns.is_empty() {
                    page.columns = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect();
                }
                let cells = (0..row.len())
                    .map(|i| row.get(i).unwrap_or_default().to_string())
                    .collect();
                page.rows.push(cells);
            }
        }
        Ok(page)
    }

    async fn close(&mut self) {
        self.statement = None;
        if let Some(client) = self.client.take() {
            // Dropping the client shuts the connection task down; nothing to
            // flush here since commit/rollback are explicit.
            drop(client);
            debug!("postgres client dropped");
        } else {
            warn!("close called without a live connection");
        }
    }
}
