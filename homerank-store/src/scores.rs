//! [`ScoreCacheStore`] over the `score_cache` table.

use std::collections::BTreeMap;

use homerank_core::{ItemId, ScoreCacheEntry, ScoreCacheStore, StoreError, UserId};
use log::debug;
use rusqlite::{Transaction, params, params_from_iter};

use crate::error::sqlite;
use crate::store::{
    SQLITE_MAX_VARIABLE_NUMBER, SqliteStore, placeholders, sql_id, sql_ids, sql_timestamp,
    stored_id,
};

/// Item ids per statement once the user id has taken one parameter slot.
const ITEMS_PER_CHUNK: usize = SQLITE_MAX_VARIABLE_NUMBER - 1;

impl ScoreCacheStore for SqliteStore {
    fn cached_scores(
        &self,
        user: UserId,
        items: &[ItemId],
    ) -> Result<BTreeMap<ItemId, f64>, StoreError> {
        let user_id = sql_id(user.get())?;
        let ids = sql_ids(items.iter().map(|item| item.get()))?;
        let connection = self.connection();
        let mut scores = BTreeMap::new();
        for chunk in ids.chunks(ITEMS_PER_CHUNK) {
            let query = format!(
                "SELECT item_id, score FROM score_cache WHERE user_id = ? AND item_id IN ({})",
                placeholders(chunk.len())
            );
            let mut statement = connection
                .prepare(&query)
                .map_err(sqlite("prepare cached score batch"))?;
            let rows = statement
                .query_map(
                    params_from_iter(std::iter::once(&user_id).chain(chunk)),
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)),
                )
                .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(sqlite("read cached scores"))?;
            for (item_id, score) in rows {
                scores.insert(ItemId(stored_id("item_id", item_id)?), score);
            }
        }
        Ok(scores)
    }

    fn replace_scores(
        &self,
        user: UserId,
        items: &[ItemId],
        entries: &[ScoreCacheEntry],
    ) -> Result<(), StoreError> {
        let user_id = sql_id(user.get())?;
        let ids = sql_ids(items.iter().map(|item| item.get()))?;
        let mut connection = self.connection();
        let transaction = connection
            .transaction()
            .map_err(sqlite("begin score replacement"))?;

        let removed = delete_scores(&transaction, user_id, &ids)?;
        insert_scores(&transaction, user_id, entries)?;

        transaction
            .commit()
            .map_err(sqlite("commit score replacement"))?;
        debug!(
            "replaced {removed} cached scores with {} for user {user}",
            entries.len()
        );
        Ok(())
    }

    fn invalidate_user(&self, user: UserId) -> Result<usize, StoreError> {
        let user_id = sql_id(user.get())?;
        self.connection()
            .execute("DELETE FROM score_cache WHERE user_id = ?1", [user_id])
            .map_err(sqlite("invalidate cached scores"))
    }
}

fn delete_scores(
    transaction: &Transaction<'_>,
    user_id: i64,
    ids: &[i64],
) -> Result<usize, StoreError> {
    let mut removed = 0;
    for chunk in ids.chunks(ITEMS_PER_CHUNK) {
        let query = format!(
            "DELETE FROM score_cache WHERE user_id = ? AND item_id IN ({})",
            placeholders(chunk.len())
        );
        removed += transaction
            .execute(&query, params_from_iter(std::iter::once(&user_id).chain(chunk)))
            .map_err(sqlite("delete cached scores"))?;
    }
    Ok(removed)
}

/// Plain inserts, so a repeated item surfaces as a constraint violation and
/// rolls the whole replacement back.
fn insert_scores(
    transaction: &Transaction<'_>,
    user_id: i64,
    entries: &[ScoreCacheEntry],
) -> Result<(), StoreError> {
    let mut statement = transaction
        .prepare_cached(
            "INSERT INTO score_cache (item_id, user_id, score, computed_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(sqlite("prepare cached score insert"))?;
    for entry in entries {
        let item_id = sql_id(entry.item.get())?;
        statement
            .execute(params![
                item_id,
                user_id,
                entry.score,
                sql_timestamp(entry.computed_at)
            ])
            .map_err(sqlite("insert cached score"))?;
    }
    Ok(())
}
