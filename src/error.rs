//! Error types for the comparer.
//!
//! All errors that can occur while comparing two databases are represented by
//! [`CompareError`]. Errors are propagated via `Result<T, CompareError>` throughout
//! the codebase; the binary entry point is the only place they are rendered and
//! turned into a process exit code.
//!
//! # Error Classification
//!
//! Errors are classified into three categories via [`CompareErrorKind`]:
//! - **Config** — bad CLI arguments, malformed connection strings. Fails before
//!   any worker is spawned.
//! - **Schema** — the two sides of a comparison disagree on shape (different
//!   columns, missing table) in a way that makes the diff itself meaningless.
//! - **Io** — a database connection was lost, a query failed, or the report
//!   sink could not be written to. These surface mid-run, from a worker thread.

use std::fmt;

/// Primary error type for the comparer.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    // ── Config errors — caught at startup, before any worker runs ─────────
    /// A CLI/connection argument had the wrong shape entirely.
    #[error("invalid parameter type: {message} (received: {received})")]
    InvalidParameterType { message: String, received: String },

    /// A CLI/connection argument had the right shape but an unusable value.
    #[error("invalid parameter value: {message} (received: {received})")]
    InvalidParameterValue { message: String, received: String },

    /// A `host=.../port=.../dbname=...` connection string could not be parsed.
    #[error("malformed connection string for {label}: {reason}")]
    ConnectionStringError { label: String, reason: String },

    // ── Schema errors — the two sides can't be compared as given ───────────
    /// The source and target projections of a query disagree on columns.
    #[error("cannot compare {schema}.{table} with different columns between source and target")]
    ColumnMismatch { schema: String, table: String },

    /// A table named by a task no longer exists on the side that should have it.
    #[error("table not found: {schema}.{table} on {side}")]
    TableNotFound {
        schema: String,
        table: String,
        side: &'static str,
    },

    // ── Io errors — surfaced from a worker thread mid-run ───────────────────
    /// Connecting to a database failed.
    #[error("connection failed ({label}): {source}")]
    Connection {
        label: String,
        #[source]
        source: postgres::Error,
    },

    /// A query against a database failed.
    #[error("query failed: {0}")]
    Query(#[source] postgres::Error),

    /// A cursor could not be advanced or closed cleanly.
    #[error("cursor failure: {0}")]
    CursorFailure(String),

    /// Writing diff rows to the report database failed.
    #[error("report sink failure: {0}")]
    ReportSinkFailure(String),

    /// A worker thread panicked or otherwise terminated unexpectedly.
    #[error("worker '{0}' failed: {1}")]
    WorkerFailed(String, String),
}

impl CompareError {
    /// Classify the error for logging and for choosing a process exit code.
    pub fn kind(&self) -> CompareErrorKind {
        match self {
            CompareError::InvalidParameterType { .. }
            | CompareError::InvalidParameterValue { .. }
            | CompareError::ConnectionStringError { .. } => CompareErrorKind::Config,

            CompareError::ColumnMismatch { .. } | CompareError::TableNotFound { .. } => {
                CompareErrorKind::Schema
            }

            CompareError::Connection { .. }
            | CompareError::Query(_)
            | CompareError::CursorFailure(_)
            | CompareError::ReportSinkFailure(_)
            | CompareError::WorkerFailed(_, _) => CompareErrorKind::Io,
        }
    }

    /// Whether this error should abort the whole run rather than just the
    /// one worker that raised it.
    ///
    /// Config errors are always fatal (they're checked before any worker
    /// starts). Schema/Io errors are scoped to a single producer or consumer
    /// and are reported without bringing down workers that are otherwise
    /// making progress.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), CompareErrorKind::Config)
    }
}

impl From<postgres::Error> for CompareError {
    fn from(source: postgres::Error) -> Self {
        CompareError::Query(source)
    }
}

/// Classification of error severity/kind for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareErrorKind {
    Config,
    Schema,
    Io,
}

impl fmt::Display for CompareErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareErrorKind::Config => write!(f, "CONFIG"),
            CompareErrorKind::Schema => write!(f, "SCHEMA"),
            CompareErrorKind::Io => write!(f, "IO"),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert_eq!(
            CompareError::InvalidParameterType {
                message: "x".into(),
                received: "y".into()
            }
            .kind(),
            CompareErrorKind::Config
        );
        assert_eq!(
            CompareError::ColumnMismatch {
                schema: "public".into(),
                table: "t".into()
            }
            .kind(),
            CompareErrorKind::Schema
        );
        assert_eq!(
            CompareError::CursorFailure("x".into()).kind(),
            CompareErrorKind::Io
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(
            CompareError::InvalidParameterValue {
                message: "x".into(),
                received: "y".into()
            }
            .is_fatal()
        );
        assert!(!CompareError::CursorFailure("x".into()).is_fatal());
        assert!(
            !CompareError::TableNotFound {
                schema: "public".into(),
                table: "t".into(),
                side: "source",
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(CompareErrorKind::Config.to_string(), "CONFIG");
        assert_eq!(CompareErrorKind::Schema.to_string(), "SCHEMA");
        assert_eq!(CompareErrorKind::Io.to_string(), "IO");
    }
}
