//! Centralized error handling for tidyframe.
//!
//! Every fallible engine, history and store call returns [`Result<T>`] with a
//! [`TidyError`] describing which family of failure occurred:
//!
//! ```
//! use tidyframe::error::TidyError;
//!
//! fn describe(err: &TidyError) -> &'static str {
//!     match err {
//!         TidyError::Parse(_) => "the input could not be parsed",
//!         TidyError::Schema(_) => "a column reference or type did not fit the frame",
//!         TidyError::Validation(_) => "the request itself was malformed",
//!         TidyError::History(_) => "there was nothing to undo or redo",
//!         _ => "something else went wrong",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`TidyError`]. The original error family is kept; only the message grows:
//!
//! ```no_run
//! use tidyframe::error::ResultExt as _;
//!
//! fn load() -> tidyframe::error::Result<String> {
//!     std::fs::read_to_string("data.csv").context("Failed to load dataset")
//! }
//! ```
//!
//! ## Command Integration
//!
//! Async commands hand plain strings to the UI layer, so
//! `From<TidyError> for String` is provided.

use polars::error::PolarsError;
use std::fmt;

/// Main error type for tidyframe operations.
#[derive(Debug)]
pub enum TidyError {
    /// Malformed source file or unparseable filter expression
    Parse(String),

    /// Unknown column, duplicate resulting column name, or type-incompatible operation
    Schema(String),

    /// Empty or contradictory operation parameters
    Validation(String),

    /// Undo/redo/jump with no valid target
    History(String),

    /// A command needs a dataset but nothing has been imported
    NoDataset,

    /// File read/write failure
    Io(std::io::Error),

    /// Anything that fits none of the families above
    Other(String),
}

impl TidyError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn column_not_found(name: &str) -> Self {
        Self::Schema(format!("column not found: {name}"))
    }

    /// Short name of the error family, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Schema(_) => "schema",
            Self::Validation(_) => "validation",
            Self::History(_) => "history",
            Self::NoDataset => "no_dataset",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }

    /// Rebuilds the same error family with `prefix` prepended to the message.
    fn with_prefix(self, prefix: &str) -> Self {
        match self {
            Self::Parse(msg) => Self::Parse(format!("{prefix}: {msg}")),
            Self::Schema(msg) => Self::Schema(format!("{prefix}: {msg}")),
            Self::Validation(msg) => Self::Validation(format!("{prefix}: {msg}")),
            Self::History(msg) => Self::History(format!("{prefix}: {msg}")),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{prefix}: {e}"))),
            Self::NoDataset => Self::NoDataset,
            Self::Other(msg) => Self::Other(format!("{prefix}: {msg}")),
        }
    }
}

impl fmt::Display for TidyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::Schema(msg) => write!(f, "Schema error: {msg}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::History(msg) => write!(f, "History error: {msg}"),
            Self::NoDataset => write!(f, "No dataset loaded"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for TidyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TidyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for TidyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for TidyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("JSON error: {err}"))
    }
}

impl From<calamine::Error> for TidyError {
    fn from(err: calamine::Error) -> Self {
        Self::Parse(format!("Excel error: {err}"))
    }
}

impl From<PolarsError> for TidyError {
    fn from(err: PolarsError) -> Self {
        match err {
            PolarsError::ColumnNotFound(_)
            | PolarsError::SchemaFieldNotFound(_)
            | PolarsError::SchemaMismatch(_)
            | PolarsError::Duplicate(_)
            | PolarsError::ShapeMismatch(_) => Self::Schema(err.to_string()),
            PolarsError::SQLSyntax(_) | PolarsError::SQLInterface(_) => {
                Self::Parse(err.to_string())
            }
            PolarsError::InvalidOperation(_) => Self::Validation(err.to_string()),
            PolarsError::IO { .. } => Self::Io(std::io::Error::other(err.to_string())),
            PolarsError::Context { error, msg } => Self::from(*error).with_prefix(&msg),
            other => Self::Other(other.to_string()),
        }
    }
}

// Async commands hand errors to the UI as strings
impl From<TidyError> for String {
    fn from(err: TidyError) -> Self {
        err.to_string()
    }
}

/// Result type alias for tidyframe operations.
pub type Result<T> = std::result::Result<T, TidyError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error, keeping its family.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<TidyError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_prefix(&msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_prefix(&f()))
    }
}
