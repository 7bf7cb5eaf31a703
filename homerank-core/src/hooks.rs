//! Invalidation triggered by edits to listings, places and preferences.
//!
//! Every hook drops the owner's cached scores. Hooks that move an endpoint,
//! or change how the user travels to a place, also re-resolve the affected
//! distance pairs.

use std::sync::Arc;

use geo::Coord;
use log::info;

use crate::{
    DistanceCacheStore, DistanceRefresher, ItemId, PointOfInterest, RefreshStats, Scorable,
    ScoreCacheStore, StoreError, UserId, UserLocks,
};

/// Wiring between change events and the two caches.
#[derive(Clone)]
pub struct ChangeHooks {
    distances: Arc<dyn DistanceCacheStore>,
    scores: Arc<dyn ScoreCacheStore>,
    refresher: DistanceRefresher,
    locks: Arc<UserLocks>,
}

impl std::fmt::Debug for ChangeHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHooks")
            .field("refresher", &self.refresher)
            .finish_non_exhaustive()
    }
}

impl ChangeHooks {
    /// Create hooks over the given caches.
    ///
    /// `locks` should be the table shared with the scoring engine.
    #[must_use]
    pub fn new(
        distances: Arc<dyn DistanceCacheStore>,
        scores: Arc<dyn ScoreCacheStore>,
        refresher: DistanceRefresher,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            distances,
            scores,
            refresher,
            locks,
        }
    }

    /// A listing was created or edited.
    ///
    /// `previous_location` is the position before the edit, or `None` for a
    /// new listing. `places` are the owner's points of interest.
    ///
    /// # Errors
    /// Returns [`StoreError`] when a cache write fails.
    pub fn item_saved<T: Scorable>(
        &self,
        item: &T,
        previous_location: Option<Coord<f64>>,
        places: &[PointOfInterest],
    ) -> Result<RefreshStats, StoreError> {
        let mut stats = RefreshStats::default();
        if item.location() != previous_location {
            self.distances.purge_item(item.id())?;
            stats = self.refresher.refresh_item(item, places)?;
        }
        self.invalidate_scores(item.owner())?;
        Ok(stats)
    }

    /// A listing was deleted.
    ///
    /// # Errors
    /// Returns [`StoreError`] when a cache write fails.
    pub fn item_deleted(&self, item: ItemId, owner: UserId) -> Result<(), StoreError> {
        self.distances.purge_item(item)?;
        self.invalidate_scores(owner)
    }

    /// A place was created or edited.
    ///
    /// `previous` is the place before the edit, or `None` for a new place.
    /// `items` are the owner's listings.
    ///
    /// # Errors
    /// Returns [`StoreError`] when a cache write fails.
    pub fn place_saved<T: Scorable>(
        &self,
        place: &PointOfInterest,
        previous: Option<&PointOfInterest>,
        items: &[T],
    ) -> Result<RefreshStats, StoreError> {
        let mut stats = RefreshStats::default();
        if previous.is_none_or(|previous| place.routing_changed(previous)) {
            self.distances.purge_place(place.id)?;
            stats = self.refresher.refresh_place(place, items)?;
        }
        self.invalidate_scores(place.owner)?;
        Ok(stats)
    }

    /// A place was deleted.
    ///
    /// # Errors
    /// Returns [`StoreError`] when a cache write fails.
    pub fn place_deleted(&self, place: &PointOfInterest) -> Result<(), StoreError> {
        self.distances.purge_place(place.id)?;
        self.invalidate_scores(place.owner)
    }

    /// The user's preferences were saved.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the score cache cannot be written.
    pub fn preferences_saved(&self, user: UserId) -> Result<(), StoreError> {
        self.invalidate_scores(user)
    }

    /// Drop every cached score for `user`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the score cache cannot be written.
    pub fn invalidate_scores(&self, user: UserId) -> Result<(), StoreError> {
        let removed = self
            .locks
            .with_lock(user, || self.scores.invalidate_user(user))?;
        if removed > 0 {
            info!("invalidated {removed} cached scores for user {user}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryDistanceCache, MemoryScoreCache};
    use crate::{Apartment, GeoDistanceResolver, PlaceId, ScoreCacheEntry, TravelMode};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    struct Fixture {
        distances: Arc<MemoryDistanceCache>,
        scores: Arc<MemoryScoreCache>,
        hooks: ChangeHooks,
    }

    #[fixture]
    fn fixture() -> Fixture {
        let distances = Arc::new(MemoryDistanceCache::default());
        let scores = Arc::new(MemoryScoreCache::default());
        let locks = Arc::new(UserLocks::new());
        let refresher = DistanceRefresher::new(
            distances.clone(),
            GeoDistanceResolver::fallback_only(),
            locks.clone(),
        );
        let hooks = ChangeHooks::new(distances.clone(), scores.clone(), refresher, locks);
        seed_score(&scores);
        Fixture {
            distances,
            scores,
            hooks,
        }
    }

    fn seed_score(scores: &MemoryScoreCache) {
        scores
            .replace_scores(
                UserId(1),
                &[ItemId(1)],
                &[ScoreCacheEntry {
                    item: ItemId(1),
                    user: UserId(1),
                    score: 5.0,
                    computed_at: Utc::now(),
                }],
            )
            .expect("seed score");
    }

    fn loft() -> Apartment {
        Apartment::new(ItemId(1), UserId(1), "Loft", 2_000.0, 700).at(Coord { x: 0.0, y: 0.0 })
    }

    fn work() -> PointOfInterest {
        PointOfInterest::new(PlaceId(1), UserId(1), "Work", Coord { x: 0.0, y: 0.5 })
    }

    #[rstest]
    fn moving_an_item_refreshes_its_pairs(fixture: Fixture) {
        let stats = fixture
            .hooks
            .item_saved(&loft(), Some(Coord { x: 1.0, y: 1.0 }), &[work()])
            .expect("hook");
        assert_eq!(stats.resolved, 1);
        assert_eq!(fixture.scores.len(), 0);
    }

    #[rstest]
    fn renaming_an_item_only_invalidates_scores(fixture: Fixture) {
        let item = loft();
        let stats = fixture
            .hooks
            .item_saved(&item, item.location, &[work()])
            .expect("hook");
        assert_eq!(stats, RefreshStats::default());
        assert_eq!(fixture.scores.len(), 0);
    }

    #[rstest]
    fn travel_changes_refresh_the_place(fixture: Fixture) {
        let before = work();
        let after = before.clone().with_travel_mode(TravelMode::Walking);
        let stats = fixture
            .hooks
            .place_saved(&after, Some(&before), &[loft()])
            .expect("hook");
        assert_eq!(stats.resolved, 1);

        let relabelled = PointOfInterest {
            label: "Office".to_owned(),
            ..after.clone()
        };
        let stats = fixture
            .hooks
            .place_saved(&relabelled, Some(&after), &[loft()])
            .expect("hook");
        assert_eq!(stats.resolved, 0);
    }

    #[rstest]
    fn deleting_a_place_purges_its_pairs(fixture: Fixture) {
        fixture
            .hooks
            .place_saved(&work(), None, &[loft()])
            .expect("hook");
        seed_score(&fixture.scores);

        fixture.hooks.place_deleted(&work()).expect("hook");

        assert!(
            fixture
                .distances
                .entries_for(&[ItemId(1)])
                .expect("read")
                .is_empty()
        );
        assert_eq!(fixture.scores.len(), 0);
    }

    #[rstest]
    fn preference_changes_invalidate_scores(fixture: Fixture) {
        fixture.hooks.preferences_saved(UserId(1)).expect("hook");
        assert_eq!(fixture.scores.len(), 0);
    }

    #[rstest]
    fn deleting_an_item_purges_its_pairs(fixture: Fixture) {
        fixture
            .hooks
            .item_saved(&loft(), None, &[work()])
            .expect("hook");
        fixture
            .hooks
            .item_deleted(ItemId(1), UserId(1))
            .expect("hook");
        assert!(
            fixture
                .distances
                .get(ItemId(1), PlaceId(1))
                .expect("read")
                .is_none()
        );
    }
}
