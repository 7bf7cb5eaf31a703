//! Facade crate for the homerank listing ranking engine.
//!
//! This crate re-exports the core domain types and exposes the HTTP routing
//! client and the SQLite store behind feature flags.

#![forbid(unsafe_code)]

pub use homerank_core::{
    Apartment, Catalogue, ChangeHooks, DistanceCacheEntry, DistanceCacheStore, DistanceRefresher,
    Evaluation, Factor, GeoDistanceResolver, Home, ItemId, PlaceId, PointOfInterest,
    PreferenceSet, PreferenceStore, RoutingClient, RoutingError, Scorable, ScoreCacheStore,
    ScoreLookup, ScoringEngine, StoreError, Tier, TravelMode, UserId, UserLocks, Viewer,
};

#[cfg(feature = "http-routing")]
pub use homerank_routing::{DistanceMatrixClient, DistanceMatrixConfig};

#[cfg(feature = "sqlite")]
pub use homerank_store::{SqliteStore, SqliteStoreError};
