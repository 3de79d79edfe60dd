//! Batch producer: the script interpreter state machine.
//!
//! The producer walks the script once, top to bottom. SQL lines accumulate
//! into the pending batch; `\go` (or the end of the script) hands the batch to
//! the caller. `next_batch` returns as soon as a batch is complete, and the
//! producer does not look at another line until it is called again, so the
//! caller decides when parsing resumes. A caller that stops calling simply
//! drops the producer.
//!
//! # Directives
//!
//! | directive | effect |
//! |---|---|
//! | `\os name` | skip SQL lines unless the host OS is `name` |
//! | `\os` | stop skipping |
//! | `\go` | emit the pending batch, if any |
//! | `\val name value` | declare a substitution value for later lines |
//! | `\needver version` | require an exact database version |
//! | `\db name` | reconnect to another database |
//!
//! While skipping, every directive except `\os` is ignored.

use std::borrow::Cow;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::directive::{self, Command, Directive, Line};
use crate::error::Result;
use crate::script::Script;
use crate::values::{Replacer, ValueStore};

/// Side effects of `\needver` and `\db`, served by whoever owns the
/// connection.
#[async_trait]
pub trait DirectiveHost: Send {
    async fn require_version(&mut self, declared: &str) -> Result<()>;

    async fn switch_database(&mut self, database: &str) -> Result<()>;
}

/// A completed batch of SQL lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based position among the batches of the run
    pub number: usize,
    /// Script line that terminated the batch (`\go` or the last line)
    pub line: usize,
    pub sql: String,
}

pub struct BatchProducer<'s> {
    lines: std::iter::Enumerate<std::slice::Iter<'s, String>>,
    values: ValueStore,
    replacer: Replacer,
    host_os: String,
    skip: bool,
    pending: String,
    produced: usize,
    last_line: usize,
    finished: bool,
}

impl<'s> BatchProducer<'s> {
    pub fn new(script: &'s Script, values: ValueStore) -> Self {
        let replacer = values.replacer();
        Self {
            lines: script.lines().iter().enumerate(),
            values,
            replacer,
            host_os: directive::host_os().to_string(),
            skip: false,
            pending: String::new(),
            produced: 0,
            last_line: 0,
            finished: false,
        }
    }

    /// Evaluate `\os` guards against `os` instead of the running host.
    pub fn with_host_os(mut self, os: impl Into<String>) -> Self {
        self.host_os = os.into();
        self
    }

    /// Number of batches emitted so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Parse until the next batch is complete.
    ///
    /// Returns `Ok(None)` once the script is exhausted. An error from a
    /// directive ends production; later calls return `Ok(None)`.
    pub async fn next_batch<H>(&mut self, host: &mut H) -> Result<Option<Batch>>
    where
        H: DirectiveHost + ?Sized,
    {
        if self.finished {
            return Ok(None);
        }
        match self.advance(host).await {
            Ok(Some(batch)) => Ok(Some(batch)),
            Ok(None) => {
                self.finished = true;
                Ok(self.take_batch(self.last_line))
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Consume lines until a `\go` completes a batch or the script ends.
    async fn advance<H>(&mut self, host: &mut H) -> Result<Option<Batch>>
    where
        H: DirectiveHost + ?Sized,
    {
        while let Some((idx, raw)) = self.lines.next() {
            let line_no = idx + 1;
            self.last_line = line_no;

            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let text = if self.replacer.is_empty() {
                Cow::Borrowed(trimmed)
            } else {
                Cow::Owned(self.replacer.replace(trimmed))
            };

            match directive::classify(&text) {
                Line::Blank | Line::Comment => {}
                Line::Unrecognized => debug!("Ignoring malformed directive at line {}", line_no),
                Line::Directive(d) => {
                    if let Some(batch) = self.dispatch(d, line_no, host).await? {
                        return Ok(Some(batch));
                    }
                }
                Line::Sql(sql) => {
                    if !self.skip {
                        if !self.pending.is_empty() {
                            self.pending.push('\n');
                        }
                        self.pending.push_str(sql);
                    }
                }
            }
        }
        Ok(None)
    }

    async fn dispatch<H>(&mut self, d: Directive, line_no: usize, host: &mut H) -> Result<Option<Batch>>
    where
        H: DirectiveHost + ?Sized,
    {
        info!("Running command {} ({}) ({})", d.name, d.arg1, d.arg2);
        let command = d.command();

        if command == Some(Command::Os) {
            self.skip = !d.arg1.is_empty() && !directive::os_matches(&d.arg1, &self.host_os);
            debug!("OS guard {:?} on {}: skipping = {}", d.arg1, self.host_os, self.skip);
            return Ok(None);
        }

        if self.skip {
            debug!("Skipping command {} at line {}", d.name, line_no);
            return Ok(None);
        }

        match command {
            Some(Command::Go) => return Ok(self.take_batch(line_no)),
            Some(Command::Val) if !d.arg1.is_empty() && !d.arg2.is_empty() => {
                self.values.add(&d.arg1, &d.arg2)?;
                self.replacer = self.values.replacer();
            }
            Some(Command::Needver) if !d.arg1.is_empty() => host.require_version(&d.arg1).await?,
            Some(Command::Db) if !d.arg1.is_empty() => host.switch_database(&d.arg1).await?,
            _ => info!("Unknown command {}", d.name),
        }
        Ok(None)
    }

    /// Move the pending lines out as a batch, if there are any.
    fn take_batch(&mut self, line_no: usize) -> Option<Batch> {
        if self.pending.is_empty() {
            return None;
        }
        self.produced += 1;
        Some(Batch {
            number: self.produced,
            line: line_no,
            sql: std::mem::take(&mut self.pending),
        })
    }
}
