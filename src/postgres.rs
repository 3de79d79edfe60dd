//! PostgreSQL engine backed by `sqlx`.
//!
//! Each engine wraps a single `PgConnection`. Transactions are driven with
//! plain `BEGIN` / `COMMIT` / `ROLLBACK` statements so the connection is never
//! borrowed by a transaction guard between pipeline steps. Statements without
//! bind arguments go through the simple query protocol, so one batch may hold
//! many statements.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use crate::engine::{ConnectOptions, Connector, Engine};
use crate::error::{Result, ScriptError};

/// Reads the comment attached to the current database, where deployment
/// scripts record the schema version.
pub const VERSION_QUERY: &str = r#"SELECT pg_catalog.shobj_description(d.oid, 'pg_database') AS "Description"
FROM   pg_catalog.pg_database d
WHERE  datname = current_database()"#;

/// Opens `PgEngine` connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Engine>> {
        let pg_options = PgConnectOptions::new()
            .host(&options.host)
            .port(options.port)
            .username(&options.user)
            .password(&options.password)
            .database(&options.database);

        let conn = PgConnection::connect_with(&pg_options).await.map_err(|e| {
            ScriptError::connection(format!(
                "could not open connection to {} on {}:{}: {e}",
                options.database, options.host, options.port
            ))
        })?;

        Ok(Box::new(PgEngine { conn }))
    }
}

pub struct PgEngine {
    conn: PgConnection,
}

impl PgEngine {
    async fn simple(&mut self, statement: &str) -> std::result::Result<(), sqlx::Error> {
        sqlx::Executor::execute(&mut self.conn, statement).await?;
        Ok(())
    }
}

#[async_trait]
impl Engine for PgEngine {
    async fn begin(&mut self) -> Result<()> {
        self.simple("BEGIN")
            .await
            .map_err(|e| ScriptError::engine(e.to_string()))
    }

    async fn execute(&mut self, sql: &str) -> std::result::Result<(), String> {
        self.simple(sql).await.map_err(|e| e.to_string())
    }

    async fn commit(&mut self) -> Result<()> {
        self.simple("COMMIT")
            .await
            .map_err(|e| ScriptError::engine(e.to_string()))
    }

    async fn rollback(&mut self) -> Result<()> {
        self.simple("ROLLBACK")
            .await
            .map_err(|e| ScriptError::engine(e.to_string()))
    }

    async fn reported_version(&mut self) -> Result<Option<String>> {
        sqlx::query_scalar::<_, Option<String>>(VERSION_QUERY)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| ScriptError::engine(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| ScriptError::connection(e.to_string()))
    }
}
