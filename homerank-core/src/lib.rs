//! Core ranking engine for rental apartments and homes for sale.
//!
//! The crate scores a batch of listings for one viewer on a `0.0..=10.0`
//! scale:
//! - **Weights** come from the viewer's [`PreferenceSet`], gated by the
//!   listing kind's [`Catalogue`] and the viewer's [`Tier`], and are
//!   renormalised per item over the factors that item has data for.
//! - **Factor values** come from each listing through [`Scorable`], except
//!   distance, which is the average of the cached distances from the listing
//!   to the viewer's [`PointOfInterest`] set.
//! - **Distances** are resolved by a [`RoutingClient`] when one is configured,
//!   falling back to great-circle distance, and cached per pair by a
//!   [`DistanceCacheStore`].
//! - **Scores** for signed-in viewers are cached per `(item, user)` by a
//!   [`ScoreCacheStore`] and dropped wholesale by [`ChangeHooks`] when any
//!   input changes.
//!
//! Storage and routing are traits so backends can be swapped; the
//! `homerank-store` and `homerank-routing` crates supply `SQLite` and HTTP
//! implementations.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use homerank_core::{
//!     Apartment, DerivationChoices, Factor, ItemId, UserId, score_items,
//! };
//!
//! let items = [
//!     Apartment::new(ItemId(1), UserId(1), "Loft", 1_500.0, 600),
//!     Apartment::new(ItemId(2), UserId(1), "Walk-up", 2_250.0, 650),
//!     Apartment::new(ItemId(3), UserId(1), "Tower", 3_000.0, 900),
//! ];
//! let active = BTreeMap::from([(Factor::Price, 100_u8)]);
//! let evaluation = score_items(&items, &active, DerivationChoices::default(), &BTreeMap::new());
//! assert_eq!(evaluation.score(ItemId(2)), Some(5.0));
//! assert_eq!(evaluation.ranked(), vec![ItemId(1), ItemId(2), ItemId(3)]);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod distance;
mod engine;
mod error;
mod factor;
mod hooks;
mod ids;
mod listing;
mod locks;
mod normalize;
mod place;
mod preferences;
mod score_cache;
mod tier;
pub mod weights;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cache::{
    DistanceCacheEntry, DistanceCacheStore, DistanceRefresher, DistanceSummary, PlaceDistance,
    RefreshStats,
};
pub use distance::{
    EARTH_RADIUS_MILES, GeoDistanceResolver, METERS_PER_MILE, ResolvedDistance, RouteRequest,
    RoutedLeg, RoutingClient, RoutingError, haversine_miles,
};
pub use engine::{
    Evaluation, FactorContribution, ScoreLookup, ScoringEngine, Viewer, score_items,
};
pub use error::{BackendError, StoreError};
pub use factor::{Catalogue, Factor, ParseFactorError, catalogue};
pub use hooks::ChangeHooks;
pub use ids::{ItemId, PlaceId, UserId};
pub use listing::{Apartment, FactorContext, Home, Scorable};
pub use locks::UserLocks;
pub use normalize::{Extent, normalize, round_to};
pub use place::{PointOfInterest, TimeKind, TravelMode, TravelSchedule};
pub use preferences::{
    DEFAULT_WEIGHT, DerivationChoices, DiscountCalculation, MAX_WEIGHT, PreferenceError,
    PreferenceSet, PreferenceStore, PriceBasis,
};
pub use score_cache::{ScoreCacheEntry, ScoreCacheStore};
pub use tier::Tier;
pub use weights::{active_weights, applicable_weights, normalize_weights};
