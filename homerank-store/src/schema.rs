//! Table layout for the `SQLite` store.

use rusqlite::{Connection, OptionalExtension, Transaction};

use crate::SqliteStoreError;

/// Version recorded in `homerank_schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Create the cache and preference tables inside `connection`.
///
/// Re-running against an initialised database is a no-op. A database written
/// by another schema version is rejected.
///
/// # Errors
/// Returns [`SqliteStoreError::Migration`] when a step fails and
/// [`SqliteStoreError::UnsupportedVersion`] on a version mismatch.
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let transaction = connection
        .transaction()
        .map_err(|source| SqliteStoreError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SqliteStoreError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), SqliteStoreError> {
    run_migration_step(
        transaction,
        "create distance_cache",
        "CREATE TABLE IF NOT EXISTS distance_cache (
            item_id INTEGER NOT NULL,
            place_id INTEGER NOT NULL,
            distance_miles REAL,
            duration_minutes INTEGER CHECK (duration_minutes >= 0),
            fare REAL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (item_id, place_id)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "index distance_cache by place",
        "CREATE INDEX IF NOT EXISTS idx_distance_cache_place ON distance_cache(place_id)",
    )?;
    run_migration_step(
        transaction,
        "create score_cache",
        "CREATE TABLE IF NOT EXISTS score_cache (
            item_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            score REAL NOT NULL CHECK (score >= 0.0 AND score <= 10.0),
            computed_at INTEGER NOT NULL,
            PRIMARY KEY (item_id, user_id)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "index score_cache by user",
        "CREATE INDEX IF NOT EXISTS idx_score_cache_user ON score_cache(user_id, item_id)",
    )?;
    run_migration_step(
        transaction,
        "create preferences",
        "CREATE TABLE IF NOT EXISTS preferences (
            user_id INTEGER NOT NULL,
            product TEXT NOT NULL CHECK (length(product) > 0),
            payload TEXT NOT NULL,
            PRIMARY KEY (user_id, product)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create item_snapshots",
        "CREATE TABLE IF NOT EXISTS item_snapshots (
            product TEXT NOT NULL CHECK (length(product) > 0),
            item_id INTEGER NOT NULL,
            payload TEXT NOT NULL,
            PRIMARY KEY (product, item_id)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create place_snapshots",
        "CREATE TABLE IF NOT EXISTS place_snapshots (
            place_id INTEGER PRIMARY KEY,
            payload TEXT NOT NULL
        )",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SqliteStoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS homerank_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0)
        ) WITHOUT ROWID",
    )?;

    let existing: Option<i64> = transaction
        .query_row(
            "SELECT version FROM homerank_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SqliteStoreError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SqliteStoreError::UnsupportedVersion {
            found,
            expected: SCHEMA_VERSION,
        }),
        None => transaction
            .execute(
                "INSERT INTO homerank_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SqliteStoreError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SqliteStoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SqliteStoreError::Migration { step, source })
}
