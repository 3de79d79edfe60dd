//! Error handling module for pgscript
//!
//! Every failure the script pipeline can hit is one variant of `ScriptError`.
//! All of them are fatal to a run: the first one raised stops the pipeline and
//! is the one reported to the caller.

use thiserror::Error;

/// Main error type for script runs
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Malformed version string or seed value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Empty name or value handed to the value store
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Engine unreachable or credentials rejected
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction begin or introspection query failed
    #[error("Engine error: {0}")]
    Engine(String),

    /// The engine reports a different version than the script requires
    #[error("Version mismatch: engine reports {reported}, script requires {declared}")]
    VersionMismatch { declared: String, reported: String },

    /// A batch failed and its transaction was rolled back
    #[error("Batch {batch} (ending at line {line}) failed and was rolled back: {message}")]
    Execution {
        batch: usize,
        line: usize,
        message: String,
    },
}

/// Result type alias for pgscript operations
pub type Result<T> = std::result::Result<T, ScriptError>;

// Convenient error constructors
impl ScriptError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// True when the failure comes from bad script or seed input rather than
    /// the environment the script runs against.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::InvalidArgument(_))
    }
}
