//! Errors raised by the `SQLite` store and their mapping onto
//! [`StoreError`].

use camino::Utf8PathBuf;
use homerank_core::{StoreError, UserId};
use rusqlite::{Error as SqliteError, ErrorCode};
use thiserror::Error;

/// Failures specific to the `SQLite` backend.
///
/// Opening a store returns this type directly. Trait operations wrap it in
/// [`StoreError::Backend`], except uniqueness violations and undecodable
/// preference payloads, which become [`StoreError::Integrity`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The database's directory could not be created.
    #[error("failed to create directory for database at {path}")]
    CreateDirectory {
        /// Database location.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the database failed.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Database location.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A schema step failed.
    #[error("failed to {step}")]
    Migration {
        /// Schema step being applied.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was written by an incompatible schema version.
    #[error("database schema version {found} is not supported (expected {expected})")]
    UnsupportedVersion {
        /// Version recorded in the database.
        found: i64,
        /// Version this build writes.
        expected: i64,
    },
    /// An identifier does not fit SQLite's signed 64-bit integers.
    #[error("identifier {id} exceeds SQLite i64 range")]
    IdOutOfRange {
        /// Rejected identifier.
        id: u64,
    },
    /// A stored integer column held a value outside its Rust type.
    #[error("stored {column} value {value} is out of range")]
    ColumnOutOfRange {
        /// Column name.
        column: &'static str,
        /// Stored value.
        value: i64,
    },
    /// A stored timestamp is not representable.
    #[error("stored timestamp {millis} ms is out of range")]
    InvalidTimestamp {
        /// Milliseconds since the Unix epoch.
        millis: i64,
    },
    /// A stored preference payload was malformed or failed validation.
    #[error("failed to decode preferences for user {user}")]
    InvalidPreferences {
        /// Owner of the payload.
        user: UserId,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Preferences could not be encoded.
    #[error("failed to encode preferences for user {user}")]
    EncodePreferences {
        /// Owner of the payload.
        user: UserId,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A statement failed.
    #[error("failed to {operation}")]
    Sqlite {
        /// Operation being performed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(err: SqliteStoreError) -> Self {
        match err {
            SqliteStoreError::Sqlite { operation, source } if is_constraint_violation(&source) => {
                Self::Integrity {
                    operation,
                    detail: source.to_string(),
                }
            }
            err @ SqliteStoreError::InvalidPreferences { .. } => Self::Integrity {
                operation: err.operation(),
                detail: error_chain(&err),
            },
            other => Self::backend(other.operation(), other),
        }
    }
}

impl SqliteStoreError {
    /// Short description of what was being attempted.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::CreateDirectory { .. } => "create the database directory",
            Self::Open { .. } => "open the database",
            Self::Migration { step, .. } => *step,
            Self::UnsupportedVersion { .. } => "check the schema version",
            Self::IdOutOfRange { .. } => "convert an identifier",
            Self::ColumnOutOfRange { .. } | Self::InvalidTimestamp { .. } => "decode a stored row",
            Self::InvalidPreferences { .. } => "decode preferences",
            Self::EncodePreferences { .. } => "encode preferences",
            Self::Sqlite { operation, .. } => *operation,
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

fn is_constraint_violation(err: &SqliteError) -> bool {
    matches!(
        err,
        SqliteError::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

/// Build a closure that tags a `rusqlite` error with `operation` and maps it
/// onto [`StoreError`].
pub(crate) fn sqlite(operation: &'static str) -> impl Fn(SqliteError) -> StoreError {
    move |source| SqliteStoreError::Sqlite { operation, source }.into()
}
