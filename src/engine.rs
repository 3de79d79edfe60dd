//! Database engine capability interface.
//!
//! The pipeline only needs a handful of operations from the database:
//! transaction control, running a batch of SQL text, and reading the version
//! string the Version Gate compares against. `Connector` opens connections,
//! `Engine` is one open connection.

use async_trait::async_trait;

use crate::error::Result;

/// Connection parameters shared by every connection a run opens.
///
/// A `\db` directive reuses these with only `database` replaced.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectOptions {
    /// Same credentials, different target database.
    pub fn with_database(&self, database: &str) -> Self {
        Self {
            database: database.to_string(),
            ..self.clone()
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// One open connection to one database.
#[async_trait]
pub trait Engine: Send {
    /// Start a transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Run a batch of one or more SQL statements inside the open transaction.
    ///
    /// Errors are returned as the engine's message.
    async fn execute(&mut self, sql: &str) -> std::result::Result<(), String>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// The version string recorded for the current database.
    ///
    /// `None` when nothing is recorded.
    async fn reported_version(&mut self) -> Result<Option<String>>;

    /// Close the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens engine connections.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Engine>>;
}
