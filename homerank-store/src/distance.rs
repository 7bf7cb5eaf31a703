//! [`DistanceCacheStore`] over the `distance_cache` table.

use homerank_core::{DistanceCacheEntry, DistanceCacheStore, ItemId, PlaceId, StoreError};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::error::sqlite;
use crate::store::{
    SQLITE_MAX_VARIABLE_NUMBER, SqliteStore, placeholders, sql_id, sql_ids, sql_timestamp,
    stored_id, stored_timestamp,
};
use crate::SqliteStoreError;

const SELECT_COLUMNS: &str =
    "SELECT item_id, place_id, distance_miles, duration_minutes, fare, updated_at FROM distance_cache";

/// Raw column values, converted once the statement has finished.
struct DistanceRow {
    item: i64,
    place: i64,
    distance_miles: Option<f64>,
    duration_minutes: Option<i64>,
    fare: Option<f64>,
    updated_at: i64,
}

impl DistanceRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            item: row.get(0)?,
            place: row.get(1)?,
            distance_miles: row.get(2)?,
            duration_minutes: row.get(3)?,
            fare: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_entry(self) -> Result<DistanceCacheEntry, SqliteStoreError> {
        let duration_minutes = self
            .duration_minutes
            .map(|minutes| {
                u32::try_from(minutes).map_err(|_| SqliteStoreError::ColumnOutOfRange {
                    column: "duration_minutes",
                    value: minutes,
                })
            })
            .transpose()?;
        Ok(DistanceCacheEntry {
            item: ItemId(stored_id("item_id", self.item)?),
            place: PlaceId(stored_id("place_id", self.place)?),
            distance_miles: self.distance_miles,
            duration_minutes,
            fare: self.fare,
            updated_at: stored_timestamp(self.updated_at)?,
        })
    }
}

impl DistanceCacheStore for SqliteStore {
    fn get(&self, item: ItemId, place: PlaceId) -> Result<Option<DistanceCacheEntry>, StoreError> {
        let item_id = sql_id(item.get())?;
        let place_id = sql_id(place.get())?;
        let connection = self.connection();
        let row = connection
            .prepare_cached(&format!(
                "{SELECT_COLUMNS} WHERE item_id = ?1 AND place_id = ?2"
            ))
            .and_then(|mut statement| {
                statement
                    .query_row(params![item_id, place_id], DistanceRow::read)
                    .optional()
            })
            .map_err(sqlite("read cached distance"))?;
        Ok(row.map(DistanceRow::into_entry).transpose()?)
    }

    fn upsert(&self, entry: &DistanceCacheEntry) -> Result<(), StoreError> {
        let item_id = sql_id(entry.item.get())?;
        let place_id = sql_id(entry.place.get())?;
        let connection = self.connection();
        let mut statement = connection
            .prepare_cached(
                "INSERT INTO distance_cache
                    (item_id, place_id, distance_miles, duration_minutes, fare, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (item_id, place_id) DO UPDATE SET
                    distance_miles = excluded.distance_miles,
                    duration_minutes = excluded.duration_minutes,
                    fare = excluded.fare,
                    updated_at = excluded.updated_at",
            )
            .map_err(sqlite("prepare distance upsert"))?;
        statement
            .execute(params![
                item_id,
                place_id,
                entry.distance_miles,
                entry.duration_minutes,
                entry.fare,
                sql_timestamp(entry.updated_at),
            ])
            .map_err(sqlite("upsert cached distance"))?;
        Ok(())
    }

    fn entries_for(&self, items: &[ItemId]) -> Result<Vec<DistanceCacheEntry>, StoreError> {
        let ids = sql_ids(items.iter().map(|item| item.get()))?;
        let connection = self.connection();
        let mut rows = Vec::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = format!(
                "{SELECT_COLUMNS} WHERE item_id IN ({}) ORDER BY item_id, place_id",
                placeholders(chunk.len())
            );
            let mut statement = connection
                .prepare(&query)
                .map_err(sqlite("prepare cached distance batch"))?;
            let chunk_rows = statement
                .query_map(params_from_iter(chunk.iter()), DistanceRow::read)
                .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(sqlite("read cached distance batch"))?;
            rows.extend(chunk_rows);
        }
        rows.into_iter()
            .map(|row| row.into_entry().map_err(StoreError::from))
            .collect()
    }

    fn purge_item(&self, item: ItemId) -> Result<usize, StoreError> {
        let item_id = sql_id(item.get())?;
        self.connection()
            .execute("DELETE FROM distance_cache WHERE item_id = ?1", [item_id])
            .map_err(sqlite("purge cached distances for item"))
    }

    fn purge_place(&self, place: PlaceId) -> Result<usize, StoreError> {
        let place_id = sql_id(place.get())?;
        self.connection()
            .execute("DELETE FROM distance_cache WHERE place_id = ?1", [place_id])
            .map_err(sqlite("purge cached distances for place"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("open store")
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn entry(item: u64, place: u64, miles: Option<f64>) -> DistanceCacheEntry {
        DistanceCacheEntry {
            item: ItemId(item),
            place: PlaceId(place),
            distance_miles: miles,
            duration_minutes: miles.map(|_| 12),
            fare: None,
            updated_at: at(9),
        }
    }

    #[rstest]
    fn missing_pairs_read_as_none(store: SqliteStore) {
        assert_eq!(store.get(ItemId(1), PlaceId(1)).expect("read"), None);
    }

    #[rstest]
    fn upsert_overwrites_every_column(store: SqliteStore) {
        store.upsert(&entry(1, 2, Some(3.5))).expect("first upsert");
        let replacement = DistanceCacheEntry {
            distance_miles: Some(4.25),
            duration_minutes: Some(18),
            fare: Some(2.9),
            updated_at: at(10),
            ..entry(1, 2, None)
        };
        store.upsert(&replacement).expect("second upsert");

        assert_eq!(
            store.get(ItemId(1), PlaceId(2)).expect("read"),
            Some(replacement)
        );
        assert_eq!(store.entries_for(&[ItemId(1)]).expect("batch").len(), 1);
    }

    #[rstest]
    fn unknown_values_round_trip_as_none(store: SqliteStore) {
        let unknown = entry(5, 6, None);
        store.upsert(&unknown).expect("upsert");

        let stored = store.get(ItemId(5), PlaceId(6)).expect("read");
        assert_eq!(stored, Some(unknown));
    }

    #[rstest]
    fn batch_reads_span_parameter_chunks(store: SqliteStore) {
        store.upsert(&entry(1, 1, Some(1.0))).expect("upsert first");
        store.upsert(&entry(1_500, 1, Some(2.0))).expect("upsert last");
        let items: Vec<ItemId> = (1..=1_500).map(ItemId).collect();

        let entries = store.entries_for(&items).expect("batch");

        let found: Vec<ItemId> = entries.iter().map(|found| found.item).collect();
        assert_eq!(found, vec![ItemId(1), ItemId(1_500)]);
    }

    #[rstest]
    fn purges_report_removed_rows(store: SqliteStore) {
        store.upsert(&entry(1, 1, Some(1.0))).expect("upsert");
        store.upsert(&entry(1, 2, Some(2.0))).expect("upsert");
        store.upsert(&entry(2, 2, Some(3.0))).expect("upsert");

        assert_eq!(store.purge_place(PlaceId(2)).expect("purge place"), 2);
        assert_eq!(store.purge_item(ItemId(1)).expect("purge item"), 1);
        assert_eq!(store.purge_item(ItemId(1)).expect("purge again"), 0);
        assert!(
            store
                .entries_for(&[ItemId(1), ItemId(2)])
                .expect("batch")
                .is_empty()
        );
    }

    #[rstest]
    fn identifiers_beyond_sqlite_range_are_backend_errors(store: SqliteStore) {
        let err = store
            .get(ItemId(u64::MAX), PlaceId(1))
            .expect_err("id out of range");
        assert!(!err.is_integrity());
    }
}
