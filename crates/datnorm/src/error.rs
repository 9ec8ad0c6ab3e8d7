//! Error types for the normalizer
//!
//! Errors are layered the way they are contained at runtime:
//! [`FormatError`] is raised per line inside the accumulator, [`EmitError`]
//! per record inside the emitter, [`SinkError`] per statement by the output.
//! [`NormalizeError`] is what escapes a run.

use thiserror::Error;

/// Result type alias for normalizer operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Marker used wherever a record has no usable identifier
pub const NO_IDENTIFIER: &str = "none found";

/// A line that does not fit the grammar of its format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Payload of a known tag could not be parsed; the line is dropped
    #[error("Malformed {tag} line: {reason}")]
    Malformed { tag: &'static str, reason: String },

    /// A field that must hold one value received a second, different one
    #[error(
        "Record {record}: field '{field}' must be single-valued but has both '{existing}' and '{conflicting}'"
    )]
    SingletonConflict {
        record: String,
        field: String,
        existing: String,
        conflicting: String,
    },
}

impl FormatError {
    pub fn malformed(tag: &'static str, reason: impl Into<String>) -> Self {
        FormatError::Malformed {
            tag,
            reason: reason.into(),
        }
    }

    /// Whether this error must terminate the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, FormatError::SingletonConflict { .. })
    }
}

/// A frozen record that cannot be turned into rows
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("record has no primary identifier")]
    MissingIdentifier,

    #[error("primary identifier {0} was already emitted in this run")]
    DuplicateIdentifier(String),

    #[error("column {column} expects an integer, got '{value}'")]
    InvalidColumn { column: &'static str, value: String },
}

/// Failure while handing statements to the output
#[derive(Error, Debug)]
pub enum SinkError {
    /// The output itself is broken; never recoverable
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused a statement (constraint violation and the like)
    #[error("statement rejected by store: {reason}")]
    Rejected { reason: String },
}

/// Errors that end a run
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error(transparent)]
    Input(#[from] datnorm_common::CommonError),

    #[error("Fatal format violation: {0}")]
    Format(FormatError),

    #[error("Failed to emit record {record}: {source}")]
    Emit {
        record: String,
        #[source]
        source: EmitError,
    },

    #[error("Output error: {0}")]
    Sink(#[from] SinkError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory line sources cannot fail
impl From<std::convert::Infallible> for NormalizeError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
