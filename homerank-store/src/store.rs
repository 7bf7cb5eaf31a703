//! Connection handling and value conversions shared by the store impls.

use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::Connection;

use crate::SqliteStoreError;
use crate::schema::initialise_schema;

/// SQLite's default limit on bound parameters per statement.
pub(crate) const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// A single-file store implementing every persistence trait the engine
/// needs.
///
/// One connection is shared behind a mutex, so calls are serialised. Writes
/// that touch several rows run inside a transaction.
///
/// # Examples
/// ```
/// use homerank_core::{ScoreCacheStore, UserId};
/// use homerank_store::SqliteStore;
///
/// let store = SqliteStore::open_in_memory().expect("open store");
/// assert_eq!(store.invalidate_user(UserId(1)).expect("invalidate"), 0);
/// ```
#[derive(Debug)]
pub struct SqliteStore {
    connection: Mutex<Connection>,
    path: Option<Utf8PathBuf>,
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent directories
    /// and the schema as needed.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the directory cannot be created, the
    /// file cannot be opened, or the schema cannot be applied.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteStoreError> {
        homerank_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteStoreError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        initialise_schema(&mut connection)?;
        debug!("opened score store at {path}");
        Ok(Self {
            connection: Mutex::new(connection),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let mut connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            path: None,
        })
    }

    /// Location of the database file, or `None` when held in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Lock the connection.
    ///
    /// A panic while the lock was held leaves `SQLite` itself consistent, as
    /// any open transaction is rolled back on drop.
    pub(crate) fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn sql_id(id: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(id).map_err(|_| SqliteStoreError::IdOutOfRange { id })
}

pub(crate) fn sql_ids<I>(ids: I) -> Result<Vec<i64>, SqliteStoreError>
where
    I: IntoIterator<Item = u64>,
{
    ids.into_iter().map(sql_id).collect()
}

pub(crate) fn stored_id(column: &'static str, value: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(value).map_err(|_| SqliteStoreError::ColumnOutOfRange { column, value })
}

pub(crate) const fn sql_timestamp(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn stored_timestamp(millis: i64) -> Result<DateTime<Utc>, SqliteStoreError> {
    DateTime::from_timestamp_millis(millis).ok_or(SqliteStoreError::InvalidTimestamp { millis })
}

/// `?, ?, ?` with `count` placeholders.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
