//! Connection management.
//!
//! A `Session` owns the one live engine connection of a run. The executor
//! borrows it to run batches; the producer borrows it, through
//! `DirectiveHost`, to serve `\needver` and `\db`. Only `switch_database`
//! ever replaces the connection.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::engine::{ConnectOptions, Connector, Engine};
use crate::error::{Result, ScriptError};
use crate::producer::DirectiveHost;
use crate::version;

pub struct Session {
    connector: Box<dyn Connector>,
    options: ConnectOptions,
    engine: Option<Box<dyn Engine>>,
}

impl Session {
    /// Open the initial connection.
    pub async fn connect(connector: Box<dyn Connector>, options: ConnectOptions) -> Result<Self> {
        info!(
            "Connecting to database {} on {}:{} as {}",
            options.database, options.host, options.port, options.user
        );
        let engine = connector.connect(&options).await?;
        Ok(Self {
            connector,
            options,
            engine: Some(engine),
        })
    }

    /// Name of the database the current connection targets.
    pub fn database(&self) -> &str {
        &self.options.database
    }

    /// The current connection.
    pub fn engine(&mut self) -> Result<&mut (dyn Engine + 'static)> {
        self.engine
            .as_deref_mut()
            .ok_or_else(|| ScriptError::connection("no open database connection"))
    }

    /// Close the current connection and open one against `database`.
    ///
    /// Closing is best-effort. Failing to open the new connection is fatal and
    /// leaves the session without a connection.
    pub async fn switch_database(&mut self, database: &str) -> Result<()> {
        info!("Reconnect to database ({})", database);
        self.close_current().await;

        let options = self.options.with_database(database);
        let engine = self.connector.connect(&options).await?;
        self.options = options;
        self.engine = Some(engine);
        Ok(())
    }

    /// Close the session's connection, logging any failure.
    pub async fn close(mut self) {
        self.close_current().await;
    }

    async fn close_current(&mut self) {
        if let Some(engine) = self.engine.take() {
            debug!("Closing db connection ({})", self.options.database);
            if let Err(e) = engine.close().await {
                warn!("Failed to close connection to {}: {}", self.options.database, e);
            }
        }
    }
}

#[async_trait]
impl DirectiveHost for Session {
    async fn require_version(&mut self, declared: &str) -> Result<()> {
        version::check(self.engine()?, declared).await
    }

    async fn switch_database(&mut self, database: &str) -> Result<()> {
        Session::switch_database(self, database).await
    }
}
