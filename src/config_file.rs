//! Credentials file handling.
//!
//! The config file is a small JSON document:
//!
//! ```json
//! { "user": "deploy", "password": "secret", "database": "app" }
//! ```
//!
//! `host` and `port` are optional and default to a local server.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::engine::ConnectOptions;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

/// Database credentials loaded from the config file
#[derive(Clone, Deserialize)]
pub struct DbConfig {
    pub user: String,
    /// Empty when the server trusts the client
    #[serde(default)]
    pub password: String,
    pub database: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl DbConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read CONFIG file from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.user.trim().is_empty() {
            anyhow::bail!("Database user must be specified");
        }
        if self.database.trim().is_empty() {
            anyhow::bail!("Database name must be specified");
        }
        if self.host.trim().is_empty() {
            anyhow::bail!("Database host cannot be empty");
        }
        if self.port == 0 {
            anyhow::bail!("Database port must be between 1 and 65535");
        }
        Ok(())
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
