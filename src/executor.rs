//! Batch executor: drives the producer and applies each batch in its own
//! transaction.
//!
//! Producer and executor strictly alternate. The producer parses until a batch
//! is complete and hands it over; nothing more of the script is read until
//! that batch is committed or rolled back. The first failure ends the run and
//! batches committed before it stay committed.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{Result, ScriptError};
use crate::producer::{Batch, BatchProducer, DirectiveHost};
use crate::script::Script;
use crate::session::Session;
use crate::values::ValueStore;
use crate::version::Version;

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    Success,
    /// The first fatal error raised
    Failed(ScriptError),
}

/// What a run did before it stopped.
#[derive(Debug)]
pub struct RunReport {
    /// Batches that executed without error, in script order. A batch whose
    /// commit failed is still listed; the commit failure is only logged.
    pub applied: Vec<Batch>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Success)
    }

    pub fn error(&self) -> Option<&ScriptError> {
        match &self.outcome {
            RunOutcome::Success => None,
            RunOutcome::Failed(e) => Some(e),
        }
    }

    /// Collapse into the applied batches or the run's error.
    pub fn into_result(self) -> Result<Vec<Batch>> {
        match self.outcome {
            RunOutcome::Success => Ok(self.applied),
            RunOutcome::Failed(e) => Err(e),
        }
    }
}

/// Run a whole script against the session's database.
pub async fn run(script: &Script, values: ValueStore, session: &mut Session) -> RunReport {
    let mut producer = BatchProducer::new(script, values);
    run_with(&mut producer, session).await
}

/// Drive an already configured producer to completion or first failure.
pub async fn run_with(producer: &mut BatchProducer<'_>, session: &mut Session) -> RunReport {
    let mut applied = Vec::new();

    let outcome = loop {
        let batch = match producer.next_batch(session).await {
            Ok(Some(batch)) => batch,
            Ok(None) => break RunOutcome::Success,
            Err(e) => break RunOutcome::Failed(e),
        };

        match execute_batch(session, &batch).await {
            Ok(()) => applied.push(batch),
            Err(e) => break RunOutcome::Failed(e),
        }
    };

    match &outcome {
        RunOutcome::Success => info!("Done without errors! ({} batches)", applied.len()),
        RunOutcome::Failed(e) => warn!(
            "Run stopped after {} batches ({} produced): {}",
            applied.len(),
            producer.produced(),
            e
        ),
    }
    RunReport { applied, outcome }
}

/// Apply one batch inside its own transaction.
///
/// Rollback and commit failures are logged only; the execute failure, if
/// any, is what the run reports.
async fn execute_batch(session: &mut Session, batch: &Batch) -> Result<()> {
    info!(
        "running batch {} on {} (line {}): {}",
        batch.number,
        session.database(),
        batch.line,
        batch.sql
    );
    let engine = session.engine()?;

    engine
        .begin()
        .await
        .map_err(|e| ScriptError::engine(format!("cannot begin transaction: {e}")))?;

    if let Err(message) = engine.execute(&batch.sql).await {
        if let Err(e) = engine.rollback().await {
            warn!("Rollback of batch {} failed: {}", batch.number, e);
        }
        return Err(ScriptError::Execution {
            batch: batch.number,
            line: batch.line,
            message,
        });
    }

    if let Err(e) = engine.commit().await {
        warn!("Commit of batch {} failed: {}", batch.number, e);
    }
    Ok(())
}

/// Serves directives without a database for dry runs.
///
/// Declared versions are still parsed so malformed ones surface early.
#[derive(Debug, Default)]
pub struct PlanHost {
    pub required_versions: Vec<String>,
    pub databases: Vec<String>,
}

#[async_trait]
impl DirectiveHost for PlanHost {
    async fn require_version(&mut self, declared: &str) -> Result<()> {
        declared.parse::<Version>()?;
        info!("[DRY RUN] Would check database version {}", declared);
        self.required_versions.push(declared.to_string());
        Ok(())
    }

    async fn switch_database(&mut self, database: &str) -> Result<()> {
        info!("[DRY RUN] Would reconnect to database ({})", database);
        self.databases.push(database.to_string());
        Ok(())
    }
}

/// List the batches a script would run, without connecting anywhere.
pub async fn plan(script: &Script, values: ValueStore, host: &mut PlanHost) -> Result<Vec<Batch>> {
    let mut producer = BatchProducer::new(script, values);
    let mut batches = Vec::new();
    while let Some(batch) = producer.next_batch(host).await? {
        info!("[DRY RUN] batch {} (line {}):\n{}", batch.number, batch.line, batch.sql);
        batches.push(batch);
    }
    Ok(batches)
}
