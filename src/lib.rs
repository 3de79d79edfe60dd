//! pgscript Library
//!
//! Runs SQL scripts against PostgreSQL one `\go`-terminated batch at a time,
//! each in its own transaction, with `\val` templating, `\os` guards,
//! `\needver` version gating and `\db` database switching.

pub mod cli;
pub mod config_file;
pub mod directive;
pub mod engine;
pub mod error;
pub mod executor;
pub mod postgres;
pub mod producer;
pub mod script;
pub mod session;
pub mod values;
pub mod version;

// Re-export main types for convenience
pub use config_file::DbConfig;
pub use directive::{Command, Directive, Line};
pub use engine::{ConnectOptions, Connector, Engine};
pub use error::{Result, ScriptError};
pub use executor::{PlanHost, RunOutcome, RunReport};
pub use postgres::PgConnector;
pub use producer::{Batch, BatchProducer, DirectiveHost};
pub use script::Script;
pub use session::Session;
pub use values::{Replacer, ValueStore};
pub use version::Version;
