//! Cached listing-to-place distances.
//!
//! Entries are keyed by `(ItemId, PlaceId)` with at most one entry per key.
//! A missing entry means the pair has not been resolved yet; an entry whose
//! values are `None` means the pair was resolved but nothing is known.

mod refresh;

pub use refresh::{DistanceRefresher, RefreshStats};

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::normalize::round_to;
use crate::{ItemId, PlaceId, PointOfInterest, StoreError};

/// A cached distance between one listing and one place.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceCacheEntry {
    /// Listing end of the pair.
    pub item: ItemId,
    /// Place end of the pair.
    pub place: PlaceId,
    /// Distance in miles, rounded to two decimals.
    pub distance_miles: Option<f64>,
    /// Travel time in whole minutes.
    pub duration_minutes: Option<u32>,
    /// Transit fare.
    pub fare: Option<f64>,
    /// When the pair was last resolved.
    pub updated_at: DateTime<Utc>,
}

/// Distance to one place as shown in the per-item distance view.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceDistance {
    /// Display label of the place. Labels need not be unique.
    pub label: String,
    /// Distance in miles.
    pub distance: Option<f64>,
    /// Travel time in minutes.
    pub duration: Option<u32>,
    /// Transit fare.
    pub fare: Option<f64>,
}

impl PlaceDistance {
    /// A place with no resolved values yet.
    #[must_use]
    pub fn unresolved(place: &PointOfInterest) -> Self {
        Self {
            label: place.label.clone(),
            ..Self::default()
        }
    }

    /// The cached values for `place`.
    #[must_use]
    pub fn resolved(place: &PointOfInterest, entry: &DistanceCacheEntry) -> Self {
        Self {
            label: place.label.clone(),
            distance: entry.distance_miles,
            duration: entry.duration_minutes,
            fare: entry.fare,
        }
    }
}

/// All distances for one listing plus their averages.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceSummary {
    /// Per-place values keyed by place id. Every requested place appears,
    /// with `None` values when no entry exists.
    pub per_place: BTreeMap<PlaceId, PlaceDistance>,
    /// Mean of the known distances, rounded to two decimals.
    pub average_distance: Option<f64>,
    /// Mean of the known durations, rounded to whole minutes.
    pub average_duration: Option<u32>,
}

impl DistanceSummary {
    /// Summarise `entries` for one item against `places`.
    #[must_use]
    pub fn from_entries(places: &[PointOfInterest], entries: &[&DistanceCacheEntry]) -> Self {
        let mut per_place: BTreeMap<PlaceId, PlaceDistance> = places
            .iter()
            .map(|place| (place.id, PlaceDistance::unresolved(place)))
            .collect();
        let mut distances = Vec::new();
        let mut durations = Vec::new();
        for place in places {
            let Some(entry) = entries.iter().find(|entry| entry.place == place.id) else {
                continue;
            };
            per_place.insert(place.id, PlaceDistance::resolved(place, entry));
            if let Some(distance) = entry.distance_miles {
                distances.push(distance);
                if let Some(duration) = entry.duration_minutes {
                    durations.push(f64::from(duration));
                }
            }
        }
        Self {
            per_place,
            average_distance: mean(&distances).map(|avg| round_to(avg, 2)),
            average_duration: mean(&durations).and_then(whole_minutes),
        }
    }
}

#[expect(clippy::float_arithmetic, reason = "arithmetic mean")]
#[expect(clippy::cast_precision_loss, reason = "entry counts are small")]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn whole_minutes(minutes: f64) -> Option<u32> {
    let rounded = minutes.round();
    if !(0.0..=f64::from(u32::MAX)).contains(&rounded) {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is rounded and range-checked above"
    )]
    let whole = rounded as u32;
    Some(whole)
}

/// Persistent storage for [`DistanceCacheEntry`] values.
///
/// Implementations provide keyed access and one bulk read; batch averages
/// and staleness checks are derived from that bulk read so each costs a
/// single backend round trip.
pub trait DistanceCacheStore: Send + Sync {
    /// Fetch the entry for one pair.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be read.
    fn get(&self, item: ItemId, place: PlaceId) -> Result<Option<DistanceCacheEntry>, StoreError>;

    /// Insert or overwrite the entry for `(entry.item, entry.place)`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be written.
    fn upsert(&self, entry: &DistanceCacheEntry) -> Result<(), StoreError>;

    /// Fetch every entry whose item is in `items` in one read.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be read.
    fn entries_for(&self, items: &[ItemId]) -> Result<Vec<DistanceCacheEntry>, StoreError>;

    /// Remove every entry for `item`, returning how many were removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be written.
    fn purge_item(&self, item: ItemId) -> Result<usize, StoreError>;

    /// Remove every entry for `place`, returning how many were removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be written.
    fn purge_place(&self, place: PlaceId) -> Result<usize, StoreError>;

    /// Summaries for every item, keyed by item id.
    ///
    /// Every item in `items` is present in the result.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the bulk read fails.
    fn batch_averages(
        &self,
        items: &[ItemId],
        places: &[PointOfInterest],
    ) -> Result<BTreeMap<ItemId, DistanceSummary>, StoreError> {
        let entries = self.entries_for(items)?;
        Ok(items
            .iter()
            .map(|item| {
                let own: Vec<&DistanceCacheEntry> =
                    entries.iter().filter(|entry| entry.item == *item).collect();
                (*item, DistanceSummary::from_entries(places, &own))
            })
            .collect())
    }

    /// Items with fewer cached entries than there are geocoded places.
    ///
    /// Callers pass only geocoded items. Entries for ungeocoded or foreign
    /// places do not count towards coverage.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the bulk read fails.
    fn items_needing_refresh(
        &self,
        items: &[ItemId],
        places: &[PointOfInterest],
    ) -> Result<BTreeSet<ItemId>, StoreError> {
        let geocoded: BTreeSet<PlaceId> = places
            .iter()
            .filter(|place| place.is_geocoded())
            .map(|place| place.id)
            .collect();
        if geocoded.is_empty() {
            return Ok(BTreeSet::new());
        }
        let mut counts: BTreeMap<ItemId, usize> = BTreeMap::new();
        for entry in self.entries_for(items)? {
            if geocoded.contains(&entry.place) {
                *counts.entry(entry.item).or_default() += 1;
            }
        }
        Ok(items
            .iter()
            .filter(|item| counts.get(item).copied().unwrap_or(0) < geocoded.len())
            .copied()
            .collect())
    }
}
