//! `SQLite` persistence for the ranking engine.
//!
//! [`SqliteStore`] implements
//! [`DistanceCacheStore`](homerank_core::DistanceCacheStore),
//! [`ScoreCacheStore`](homerank_core::ScoreCacheStore) and
//! [`PreferenceStore`](homerank_core::PreferenceStore) over one database
//! file:
//! - `distance_cache` holds one row per listing and place.
//! - `score_cache` holds one row per listing and viewer.
//! - `preferences` holds one JSON document per viewer and product.
//! - `item_snapshots` and `place_snapshots` hold the last-seen JSON of each
//!   listing and place, so callers can detect edits between runs.
//!
//! Timestamps are stored as UTC milliseconds since the Unix epoch.
#![forbid(unsafe_code)]

mod distance;
mod error;
mod preferences;
mod schema;
mod scores;
mod snapshots;
mod store;

pub use error::SqliteStoreError;
pub use schema::{SCHEMA_VERSION, initialise_schema};
pub use store::SqliteStore;
