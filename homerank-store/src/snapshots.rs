//! Last-seen copies of listings and places over the `item_snapshots` and
//! `place_snapshots` tables.
//!
//! Payloads are opaque JSON documents. Callers compare them with the current
//! record to decide whether an edit happened between runs.

use std::collections::BTreeMap;

use homerank_core::{ItemId, PlaceId, StoreError};
use log::debug;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::SqliteStoreError;
use crate::error::sqlite;
use crate::store::{
    SQLITE_MAX_VARIABLE_NUMBER, SqliteStore, placeholders, sql_id, sql_ids, stored_id,
};

/// Ids per lookup, leaving room for the product parameter.
const IDS_PER_CHUNK: usize = SQLITE_MAX_VARIABLE_NUMBER - 1;

impl SqliteStore {
    /// Stored payloads for `items` of `product`. Items never recorded are
    /// absent from the map.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the table cannot be read.
    pub fn item_snapshots(
        &self,
        product: &str,
        items: &[ItemId],
    ) -> Result<BTreeMap<ItemId, String>, StoreError> {
        let rows = self.read_snapshots(
            "SELECT item_id, payload FROM item_snapshots WHERE product = ? AND item_id IN",
            Some(product),
            items.iter().map(|item| item.get()),
        )?;
        rows.into_iter()
            .map(|(id, payload)| {
                stored_id("item_id", id)
                    .map(|item| (ItemId(item), payload))
                    .map_err(StoreError::from)
            })
            .collect()
    }

    /// Stored payloads for `places`. Places never recorded are absent from
    /// the map.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the table cannot be read.
    pub fn place_snapshots(
        &self,
        places: &[PlaceId],
    ) -> Result<BTreeMap<PlaceId, String>, StoreError> {
        let rows = self.read_snapshots(
            "SELECT place_id, payload FROM place_snapshots WHERE place_id IN",
            None,
            places.iter().map(|place| place.get()),
        )?;
        rows.into_iter()
            .map(|(id, payload)| {
                stored_id("place_id", id)
                    .map(|place| (PlaceId(place), payload))
                    .map_err(StoreError::from)
            })
            .collect()
    }

    /// Record the latest payload for each listing, replacing older ones.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the table cannot be written.
    pub fn record_item_snapshots(
        &self,
        product: &str,
        snapshots: &[(ItemId, String)],
    ) -> Result<(), StoreError> {
        let rows = snapshots
            .iter()
            .map(|(item, payload)| {
                Ok(vec![
                    Value::Text(product.to_owned()),
                    Value::Integer(sql_id(item.get())?),
                    Value::Text(payload.clone()),
                ])
            })
            .collect::<Result<Vec<_>, SqliteStoreError>>()?;
        self.write_snapshots(
            "INSERT INTO item_snapshots (product, item_id, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT (product, item_id) DO UPDATE SET payload = excluded.payload",
            rows,
        )?;
        debug!("recorded {} {product} snapshots", snapshots.len());
        Ok(())
    }

    /// Record the latest payload for each place, replacing older ones.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the table cannot be written.
    pub fn record_place_snapshots(
        &self,
        snapshots: &[(PlaceId, String)],
    ) -> Result<(), StoreError> {
        let rows = snapshots
            .iter()
            .map(|(place, payload)| {
                Ok(vec![
                    Value::Integer(sql_id(place.get())?),
                    Value::Text(payload.clone()),
                ])
            })
            .collect::<Result<Vec<_>, SqliteStoreError>>()?;
        self.write_snapshots(
            "INSERT INTO place_snapshots (place_id, payload) VALUES (?1, ?2)
             ON CONFLICT (place_id) DO UPDATE SET payload = excluded.payload",
            rows,
        )?;
        debug!("recorded {} place snapshots", snapshots.len());
        Ok(())
    }

    fn read_snapshots<I>(
        &self,
        select: &str,
        product: Option<&str>,
        ids: I,
    ) -> Result<Vec<(i64, String)>, StoreError>
    where
        I: IntoIterator<Item = u64>,
    {
        let ids = sql_ids(ids)?;
        let connection = self.connection();
        let mut rows = Vec::new();
        for chunk in ids.chunks(IDS_PER_CHUNK) {
            let query = format!("{select} ({})", placeholders(chunk.len()));
            let values = product
                .map(|slug| Value::Text(slug.to_owned()))
                .into_iter()
                .chain(chunk.iter().copied().map(Value::Integer));
            let mut statement = connection
                .prepare(&query)
                .map_err(sqlite("prepare snapshot lookup"))?;
            let chunk_rows = statement
                .query_map(params_from_iter(values), |row| Ok((row.get(0)?, row.get(1)?)))
                .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(sqlite("read snapshots"))?;
            rows.extend(chunk_rows);
        }
        Ok(rows)
    }

    fn write_snapshots(&self, upsert: &str, rows: Vec<Vec<Value>>) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection();
        let transaction = connection
            .transaction()
            .map_err(sqlite("begin snapshot write"))?;
        {
            let mut statement = transaction
                .prepare_cached(upsert)
                .map_err(sqlite("prepare snapshot write"))?;
            for row in rows {
                statement
                    .execute(params_from_iter(row))
                    .map_err(sqlite("record snapshot"))?;
            }
        }
        transaction
            .commit()
            .map_err(sqlite("commit snapshot write"))
    }
}
