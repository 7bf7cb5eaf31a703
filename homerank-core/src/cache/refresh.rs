//! Recompute cached distances when listings or places change.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;

use super::{DistanceCacheEntry, DistanceCacheStore};
use crate::{
    GeoDistanceResolver, ItemId, PointOfInterest, ResolvedDistance, RouteRequest, Scorable,
    StoreError, UserId, UserLocks,
};

/// Counters describing one refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshStats {
    /// Pairs written to the cache.
    pub resolved: usize,
    /// Pairs among `resolved` that came from the routing service.
    pub routed: usize,
    /// Items or places skipped because they lack coordinates.
    pub skipped: usize,
}

impl std::ops::AddAssign for RefreshStats {
    fn add_assign(&mut self, other: Self) {
        self.resolved += other.resolved;
        self.routed += other.routed;
        self.skipped += other.skipped;
    }
}

/// Resolves and caches listing-to-place distances.
///
/// Every item is paired with each geocoded place that shares its owner.
/// Writes for one owner are serialised through [`UserLocks`].
#[derive(Clone)]
pub struct DistanceRefresher {
    cache: Arc<dyn DistanceCacheStore>,
    resolver: GeoDistanceResolver,
    locks: Arc<UserLocks>,
}

impl std::fmt::Debug for DistanceRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceRefresher")
            .field("cache", &"<dyn DistanceCacheStore>")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

struct Pair<'a> {
    item: ItemId,
    item_name: &'a str,
    owner: UserId,
    place: &'a PointOfInterest,
    request: RouteRequest,
}

impl DistanceRefresher {
    /// Create a refresher writing to `cache`.
    #[must_use]
    pub fn new(
        cache: Arc<dyn DistanceCacheStore>,
        resolver: GeoDistanceResolver,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            cache,
            resolver,
            locks,
        }
    }

    /// Resolve every pair between `items` and their owners' `places`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when a cache write fails. Routing failures are
    /// absorbed by the resolver.
    pub fn refresh_items<T: Scorable>(
        &self,
        items: &[T],
        places: &[PointOfInterest],
    ) -> Result<RefreshStats, StoreError> {
        self.refresh_at(items, places, Utc::now())
    }

    /// Resolve one item against all of its owner's places.
    ///
    /// # Errors
    /// See [`Self::refresh_items`].
    pub fn refresh_item<T: Scorable>(
        &self,
        item: &T,
        places: &[PointOfInterest],
    ) -> Result<RefreshStats, StoreError> {
        self.refresh_items(std::slice::from_ref(item), places)
    }

    /// Resolve one place against every item its owner has.
    ///
    /// # Errors
    /// See [`Self::refresh_items`].
    pub fn refresh_place<T: Scorable>(
        &self,
        place: &PointOfInterest,
        items: &[T],
    ) -> Result<RefreshStats, StoreError> {
        self.refresh_items(items, std::slice::from_ref(place))
    }

    /// Resolve only the items whose cache coverage is incomplete.
    ///
    /// Coverage is measured per owner against that owner's places.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the coverage read or a write fails.
    pub fn refresh_stale<T: Scorable>(
        &self,
        items: &[T],
        places: &[PointOfInterest],
    ) -> Result<RefreshStats, StoreError> {
        let owners: BTreeSet<UserId> = items.iter().map(T::owner).collect();
        let mut stale = BTreeSet::new();
        for owner in owners {
            let owned_places: Vec<PointOfInterest> = places
                .iter()
                .filter(|place| place.owner == owner)
                .cloned()
                .collect();
            let geocoded: Vec<ItemId> = items
                .iter()
                .filter(|item| item.owner() == owner && item.location().is_some())
                .map(T::id)
                .collect();
            stale.extend(self.cache.items_needing_refresh(&geocoded, &owned_places)?);
        }
        if stale.is_empty() {
            return Ok(RefreshStats::default());
        }
        let pending: Vec<&T> = items
            .iter()
            .filter(|item| stale.contains(&item.id()))
            .collect();
        info!("refreshing distances for {} stale items", pending.len());
        self.refresh_refs(&pending, places, Utc::now())
    }

    fn refresh_at<T: Scorable>(
        &self,
        items: &[T],
        places: &[PointOfInterest],
        now: DateTime<Utc>,
    ) -> Result<RefreshStats, StoreError> {
        let refs: Vec<&T> = items.iter().collect();
        self.refresh_refs(&refs, places, now)
    }

    fn refresh_refs<T: Scorable>(
        &self,
        items: &[&T],
        places: &[PointOfInterest],
        now: DateTime<Utc>,
    ) -> Result<RefreshStats, StoreError> {
        let mut stats = RefreshStats::default();
        for place in places.iter().filter(|place| !place.is_geocoded()) {
            info!("skipping place {} ({}): not geocoded", place.label, place.id);
            stats.skipped += 1;
        }
        let mut pairs = Vec::new();
        for &item in items {
            let Some(origin) = item.location() else {
                info!("skipping item {} ({}): not geocoded", item.name(), item.id());
                stats.skipped += 1;
                continue;
            };
            pairs.extend(
                places
                    .iter()
                    .filter(|place| place.owner == item.owner())
                    .filter_map(|place| {
                        RouteRequest::to_place(origin, place, now).map(|request| Pair {
                            item: item.id(),
                            item_name: item.name(),
                            owner: item.owner(),
                            place,
                            request,
                        })
                    }),
            );
        }
        if pairs.is_empty() {
            return Ok(stats);
        }

        let requests: Vec<RouteRequest> = pairs.iter().map(|pair| pair.request).collect();
        let resolved = self.resolver.resolve_batch(&requests);

        let owners: BTreeSet<UserId> = pairs.iter().map(|pair| pair.owner).collect();
        for owner in owners {
            self.locks.with_lock(owner, || {
                for (pair, distance) in pairs.iter().zip(&resolved) {
                    if pair.owner != owner {
                        continue;
                    }
                    self.cache.upsert(&DistanceCacheEntry {
                        item: pair.item,
                        place: pair.place.id,
                        distance_miles: Some(distance.distance_miles),
                        duration_minutes: distance.duration_minutes,
                        fare: distance.fare,
                        updated_at: now,
                    })?;
                    info!("{}", describe(pair, distance));
                    stats.resolved += 1;
                    if distance.used_primary {
                        stats.routed += 1;
                    }
                }
                Ok::<(), StoreError>(())
            })?;
        }
        Ok(stats)
    }
}

fn describe(pair: &Pair<'_>, distance: &ResolvedDistance) -> String {
    let mode = if distance.used_primary {
        pair.request.mode.as_str()
    } else {
        "straight-line"
    };
    let mut line = format!(
        "Cached {mode} distance: {} -> {} = {:.2} mi",
        pair.item_name, pair.place.label, distance.distance_miles
    );
    if let Some(minutes) = distance.duration_minutes {
        line.push_str(&format!(" ({minutes} min)"));
    }
    if let Some(fare) = distance.fare {
        line.push_str(&format!(" (${fare:.2} fare)"));
    }
    line
}
