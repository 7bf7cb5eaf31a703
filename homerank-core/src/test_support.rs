//! In-memory stores and a scripted routing client for unit and behaviour
//! tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    Catalogue, DistanceCacheEntry, DistanceCacheStore, ItemId, PlaceId, PreferenceSet,
    PreferenceStore, RouteRequest, RoutedLeg, RoutingClient, RoutingError, ScoreCacheEntry,
    ScoreCacheStore, StoreError, UserId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `DistanceCacheStore` backed by a map, counting bulk reads.
#[derive(Debug, Default)]
pub struct MemoryDistanceCache {
    entries: Mutex<BTreeMap<(ItemId, PlaceId), DistanceCacheEntry>>,
    reads: AtomicUsize,
}

impl MemoryDistanceCache {
    /// Number of [`DistanceCacheStore::entries_for`] calls so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DistanceCacheStore for MemoryDistanceCache {
    fn get(&self, item: ItemId, place: PlaceId) -> Result<Option<DistanceCacheEntry>, StoreError> {
        Ok(lock(&self.entries).get(&(item, place)).cloned())
    }

    fn upsert(&self, entry: &DistanceCacheEntry) -> Result<(), StoreError> {
        lock(&self.entries).insert((entry.item, entry.place), entry.clone());
        Ok(())
    }

    fn entries_for(&self, items: &[ItemId]) -> Result<Vec<DistanceCacheEntry>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let wanted: BTreeSet<ItemId> = items.iter().copied().collect();
        Ok(lock(&self.entries)
            .values()
            .filter(|entry| wanted.contains(&entry.item))
            .cloned()
            .collect())
    }

    fn purge_item(&self, item: ItemId) -> Result<usize, StoreError> {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|(owner, _), _| *owner != item);
        Ok(before - entries.len())
    }

    fn purge_place(&self, place: PlaceId) -> Result<usize, StoreError> {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|(_, target), _| *target != place);
        Ok(before - entries.len())
    }
}

/// `ScoreCacheStore` backed by a map.
#[derive(Debug, Default)]
pub struct MemoryScoreCache {
    rows: Mutex<BTreeMap<(UserId, ItemId), ScoreCacheEntry>>,
}

impl MemoryScoreCache {
    /// Number of stored rows across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    /// Whether no rows are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScoreCacheStore for MemoryScoreCache {
    fn cached_scores(
        &self,
        user: UserId,
        items: &[ItemId],
    ) -> Result<BTreeMap<ItemId, f64>, StoreError> {
        let rows = lock(&self.rows);
        Ok(items
            .iter()
            .filter_map(|item| rows.get(&(user, *item)).map(|row| (*item, row.score)))
            .collect())
    }

    fn replace_scores(
        &self,
        user: UserId,
        items: &[ItemId],
        entries: &[ScoreCacheEntry],
    ) -> Result<(), StoreError> {
        let mut seen = BTreeSet::new();
        for entry in entries {
            if !seen.insert(entry.item) {
                return Err(StoreError::Integrity {
                    operation: "replace cached scores",
                    detail: format!("duplicate score for item {} and user {user}", entry.item),
                });
            }
        }
        let mut rows = lock(&self.rows);
        for item in items {
            rows.remove(&(user, *item));
        }
        for entry in entries {
            rows.insert((user, entry.item), *entry);
        }
        Ok(())
    }

    fn invalidate_user(&self, user: UserId) -> Result<usize, StoreError> {
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|(owner, _), _| *owner != user);
        Ok(before - rows.len())
    }
}

/// `PreferenceStore` backed by a map.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    sets: Mutex<HashMap<(UserId, &'static str), PreferenceSet>>,
}

impl MemoryPreferenceStore {
    /// Number of stored preference sets.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.sets).len()
    }

    /// Whether no preference sets are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_or_create_default(
        &self,
        user: UserId,
        catalogue: &Catalogue,
    ) -> Result<PreferenceSet, StoreError> {
        Ok(lock(&self.sets)
            .entry((user, catalogue.product))
            .or_insert_with(|| PreferenceSet::documented_default(catalogue))
            .clone())
    }

    fn save(
        &self,
        user: UserId,
        catalogue: &Catalogue,
        preferences: &PreferenceSet,
    ) -> Result<(), StoreError> {
        lock(&self.sets).insert((user, catalogue.product), preferences.clone());
        Ok(())
    }
}

/// Routing client replaying scripted responses.
///
/// Once the script runs out every call returns the fallback response, which
/// defaults to [`RoutingError::NoRoute`].
#[derive(Debug)]
pub struct StubRoutingClient {
    available: bool,
    script: Mutex<VecDeque<Result<RoutedLeg, RoutingError>>>,
    fallback: Result<RoutedLeg, RoutingError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<RouteRequest>>,
}

impl StubRoutingClient {
    fn scripted(
        available: bool,
        script: VecDeque<Result<RoutedLeg, RoutingError>>,
        fallback: Result<RoutedLeg, RoutingError>,
    ) -> Self {
        Self {
            available,
            script: Mutex::new(script),
            fallback,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn no_route() -> Result<RoutedLeg, RoutingError> {
        Err(RoutingError::NoRoute {
            status: "NOT_FOUND".to_owned(),
        })
    }

    /// A client answering with `responses` in order.
    #[must_use]
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<RoutedLeg, RoutingError>>,
    {
        Self::scripted(true, responses.into_iter().collect(), Self::no_route())
    }

    /// A client answering every request with `leg`.
    #[must_use]
    pub fn always(leg: RoutedLeg) -> Self {
        Self::scripted(true, VecDeque::new(), Ok(leg))
    }

    /// A client answering every request with `err`.
    #[must_use]
    pub fn failing(err: RoutingError) -> Self {
        Self::scripted(true, VecDeque::new(), Err(err))
    }

    /// A client reporting itself as unconfigured.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::scripted(false, VecDeque::new(), Self::no_route())
    }

    /// Number of `route` calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RouteRequest> {
        lock(&self.requests).clone()
    }
}

impl RoutingClient for StubRoutingClient {
    fn is_available(&self) -> bool {
        self.available
    }

    fn route(&self, request: &RouteRequest) -> Result<RoutedLeg, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(*request);
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
