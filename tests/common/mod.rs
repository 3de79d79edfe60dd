//! In-memory engine used by the integration tests.
//!
//! `MockDb` records every call the pipeline makes and keeps per-database
//! state (recorded version, committed batches) behind one shared lock so a
//! test can inspect it after the run.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pgscript::{ConnectOptions, Connector, Engine, Result, ScriptError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(String),
    Begin(String),
    Execute(String, String),
    Commit(String),
    Rollback(String),
    VersionQuery(String),
    Close(String),
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    committed: Vec<(String, String)>,
    versions: HashMap<String, String>,
    failing_sql: Vec<String>,
    refused_databases: Vec<String>,
    fail_begin: bool,
    fail_version_query: bool,
    fail_commit: bool,
    fail_rollback: bool,
    fail_close: bool,
}

#[derive(Clone, Default)]
pub struct MockDb {
    state: Arc<Mutex<State>>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `version` as the version string of `database`.
    pub fn with_version(self, database: &str, version: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .versions
            .insert(database.to_string(), version.to_string());
        self
    }

    /// Fail any batch whose text contains `needle`.
    pub fn failing_on(self, needle: &str) -> Self {
        self.state.lock().unwrap().failing_sql.push(needle.to_string());
        self
    }

    /// Refuse connections to `database`.
    pub fn refusing(self, database: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .refused_databases
            .push(database.to_string());
        self
    }

    pub fn failing_begin(self) -> Self {
        self.state.lock().unwrap().fail_begin = true;
        self
    }

    pub fn failing_version_query(self) -> Self {
        self.state.lock().unwrap().fail_version_query = true;
        self
    }

    /// Fail every commit. The transaction's batch is discarded.
    pub fn failing_commit(self) -> Self {
        self.state.lock().unwrap().fail_commit = true;
        self
    }

    pub fn failing_rollback(self) -> Self {
        self.state.lock().unwrap().fail_rollback = true;
        self
    }

    pub fn failing_close(self) -> Self {
        self.state.lock().unwrap().fail_close = true;
        self
    }

    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(MockConnector { db: self.clone() })
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    /// Committed batch texts, in commit order.
    pub fn committed(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .committed
            .iter()
            .map(|(_, sql)| sql.clone())
            .collect()
    }

    /// Committed batches with the database they were committed to.
    pub fn committed_with_database(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().committed.clone()
    }

    /// Every batch text handed to `execute`, committed or not.
    pub fn executed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Execute(_, sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.state.lock().unwrap().events.push(event);
    }
}

pub fn options(database: &str) -> ConnectOptions {
    ConnectOptions {
        host: "localhost".into(),
        port: 5432,
        user: "deploy".into(),
        password: "secret".into(),
        database: database.into(),
    }
}

struct MockConnector {
    db: MockDb,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Engine>> {
        let refused = self
            .db
            .state
            .lock()
            .unwrap()
            .refused_databases
            .contains(&options.database);
        if refused {
            return Err(ScriptError::connection(format!(
                "database \"{}\" does not exist",
                options.database
            )));
        }

        self.db.record(Event::Connect(options.database.clone()));
        Ok(Box::new(MockEngine {
            db: self.db.clone(),
            database: options.database.clone(),
            in_transaction: None,
        }))
    }
}

struct MockEngine {
    db: MockDb,
    database: String,
    in_transaction: Option<Vec<String>>,
}

#[async_trait]
impl Engine for MockEngine {
    async fn begin(&mut self) -> Result<()> {
        if self.db.state.lock().unwrap().fail_begin {
            return Err(ScriptError::engine("cannot begin"));
        }
        self.db.record(Event::Begin(self.database.clone()));
        self.in_transaction = Some(Vec::new());
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> std::result::Result<(), String> {
        self.db
            .record(Event::Execute(self.database.clone(), sql.to_string()));
        let fails = self
            .db
            .state
            .lock()
            .unwrap()
            .failing_sql
            .iter()
            .any(|needle| sql.contains(needle.as_str()));
        if fails {
            return Err(format!("syntax error at or near \"{sql}\""));
        }
        if let Some(pending) = self.in_transaction.as_mut() {
            pending.push(sql.to_string());
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.db.record(Event::Commit(self.database.clone()));
        let pending = self.in_transaction.take().unwrap_or_default();
        let mut state = self.db.state.lock().unwrap();
        if state.fail_commit {
            return Err(ScriptError::engine("could not serialize access"));
        }
        for sql in pending {
            state.committed.push((self.database.clone(), sql));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.db.record(Event::Rollback(self.database.clone()));
        self.in_transaction = None;
        if self.db.state.lock().unwrap().fail_rollback {
            return Err(ScriptError::engine("server closed the connection"));
        }
        Ok(())
    }

    async fn reported_version(&mut self) -> Result<Option<String>> {
        self.db.record(Event::VersionQuery(self.database.clone()));
        let state = self.db.state.lock().unwrap();
        if state.fail_version_query {
            return Err(ScriptError::engine("permission denied for pg_database"));
        }
        Ok(state.versions.get(&self.database).cloned())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.db.record(Event::Close(self.database.clone()));
        if self.db.state.lock().unwrap().fail_close {
            return Err(ScriptError::connection("broken pipe"));
        }
        Ok(())
    }
}
