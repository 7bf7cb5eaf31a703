//! [`PreferenceStore`] over the `preferences` table.
//!
//! Each set is stored as one JSON document per user and product.

use homerank_core::{Catalogue, PreferenceSet, PreferenceStore, StoreError, UserId};
use log::info;
use rusqlite::{OptionalExtension, params};

use crate::SqliteStoreError;
use crate::error::sqlite;
use crate::store::{SqliteStore, sql_id};

impl PreferenceStore for SqliteStore {
    fn get_or_create_default(
        &self,
        user: UserId,
        catalogue: &Catalogue,
    ) -> Result<PreferenceSet, StoreError> {
        let user_id = sql_id(user.get())?;
        let connection = self.connection();
        let payload: Option<String> = connection
            .prepare_cached("SELECT payload FROM preferences WHERE user_id = ?1 AND product = ?2")
            .and_then(|mut statement| {
                statement
                    .query_row(params![user_id, catalogue.product], |row| row.get(0))
                    .optional()
            })
            .map_err(sqlite("read preferences"))?;

        if let Some(json) = payload {
            return serde_json::from_str(&json)
                .map_err(|source| SqliteStoreError::InvalidPreferences { user, source }.into());
        }

        let defaults = PreferenceSet::documented_default(catalogue);
        let encoded = encode(user, &defaults)?;
        // A concurrent writer may have created the row first; keep theirs.
        connection
            .execute(
                "INSERT INTO preferences (user_id, product, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, product) DO NOTHING",
                params![user_id, catalogue.product, encoded],
            )
            .map_err(sqlite("create default preferences"))?;
        info!(
            "created default {} preferences for user {user}",
            catalogue.product
        );
        Ok(defaults)
    }

    fn save(
        &self,
        user: UserId,
        catalogue: &Catalogue,
        preferences: &PreferenceSet,
    ) -> Result<(), StoreError> {
        let user_id = sql_id(user.get())?;
        let encoded = encode(user, preferences)?;
        self.connection()
            .execute(
                "INSERT INTO preferences (user_id, product, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, product) DO UPDATE SET payload = excluded.payload",
                params![user_id, catalogue.product, encoded],
            )
            .map_err(sqlite("save preferences"))?;
        Ok(())
    }
}

fn encode(user: UserId, preferences: &PreferenceSet) -> Result<String, SqliteStoreError> {
    serde_json::to_string(preferences)
        .map_err(|source| SqliteStoreError::EncodePreferences { user, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use homerank_core::Factor;
    use homerank_core::catalogue::{APARTMENTS, HOMES};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("open store")
    }

    fn stored_sets(store: &SqliteStore) -> i64 {
        store
            .connection()
            .query_row("SELECT COUNT(*) FROM preferences", [], |row| row.get(0))
            .expect("count preferences")
    }

    #[rstest]
    fn first_read_persists_the_documented_default(store: SqliteStore) {
        let created = store
            .get_or_create_default(UserId(1), &APARTMENTS)
            .expect("create defaults");

        assert_eq!(created, PreferenceSet::documented_default(&APARTMENTS));
        assert_eq!(stored_sets(&store), 1);
        let again = store
            .get_or_create_default(UserId(1), &APARTMENTS)
            .expect("read defaults");
        assert_eq!(again, created);
        assert_eq!(stored_sets(&store), 1);
    }

    #[rstest]
    fn saved_sets_replace_the_default(store: SqliteStore) {
        let custom = PreferenceSet::documented_default(&HOMES)
            .with_weight(Factor::View, 80)
            .expect("valid weight");

        store.save(UserId(4), &HOMES, &custom).expect("save");

        let loaded = store
            .get_or_create_default(UserId(4), &HOMES)
            .expect("read");
        assert_eq!(loaded.weight(Factor::View), 80);
        assert_eq!(loaded, custom);
    }

    #[rstest]
    fn products_are_kept_apart(store: SqliteStore) {
        let custom = PreferenceSet::documented_default(&HOMES)
            .with_weight(Factor::Price, 10)
            .expect("valid weight");
        store.save(UserId(4), &HOMES, &custom).expect("save");

        let apartments = store
            .get_or_create_default(UserId(4), &APARTMENTS)
            .expect("read");

        assert_eq!(apartments.weight(Factor::Price), 50);
        assert_eq!(stored_sets(&store), 2);
    }

    fn seed_payload(store: &SqliteStore, user: i64, payload: &str) {
        store
            .connection()
            .execute(
                "INSERT INTO preferences (user_id, product, payload) VALUES (?1, ?2, ?3)",
                rusqlite::params![user, APARTMENTS.product, payload],
            )
            .expect("seed stored row");
    }

    #[rstest]
    fn corrupt_payloads_are_integrity_errors(store: SqliteStore) {
        seed_payload(&store, 9, "not json");

        let err = store
            .get_or_create_default(UserId(9), &APARTMENTS)
            .expect_err("corrupt payload");

        assert!(err.is_integrity(), "got {err:?}");
        assert!(err.to_string().contains("decode preferences"));
    }

    #[rstest]
    fn stored_weights_above_one_hundred_are_rejected(store: SqliteStore) {
        seed_payload(&store, 9, r#"{"weights":{"price":250}}"#);

        let err = store
            .get_or_create_default(UserId(9), &APARTMENTS)
            .expect_err("out-of-range weight");

        assert!(err.is_integrity(), "got {err:?}");
        assert!(
            err.to_string().contains("weight 250 for price exceeds 100"),
            "got {err}"
        );
        assert_eq!(stored_sets(&store), 1);
    }
}
