//! Detect listing and place edits between runs and feed them to the change
//! hooks.
//!
//! The store keeps the JSON of every listing and place last seen. A record
//! whose JSON differs, or that was never seen, counts as saved.

use std::collections::BTreeSet;

use homerank_core::{ItemId, PlaceId, PointOfInterest, RefreshStats, Scorable, UserId};
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CliError;
use crate::batch::Batch;
use crate::services::Services;

/// Run the change hooks for every listing and place in `batch` that differs
/// from its stored snapshot, then record the new snapshots.
///
/// Edited listings are re-resolved against places that did not change.
/// Edited places are re-resolved against every listing, so no pair is routed
/// twice.
pub(crate) fn sync_batch<T>(
    services: &Services,
    batch: &Batch<T>,
) -> Result<RefreshStats, CliError>
where
    T: Scorable + Serialize + DeserializeOwned,
{
    let product = T::CATALOGUE.product;
    let item_ids: Vec<ItemId> = batch.items.iter().map(T::id).collect();
    let place_ids: Vec<PlaceId> = batch.places.iter().map(|place| place.id).collect();
    let stored_items = services.store.item_snapshots(product, &item_ids)?;
    let stored_places = services.store.place_snapshots(&place_ids)?;

    let mut unchanged_places = Vec::new();
    let mut edited_places = Vec::new();
    let mut place_snapshots = Vec::new();
    for place in &batch.places {
        let payload = encode(place)?;
        match stored_places.get(&place.id) {
            Some(stored) if *stored == payload => unchanged_places.push(place.clone()),
            stored => {
                let previous = stored.and_then(|json| {
                    decode_previous::<PointOfInterest>(json, "place", place.id.get())
                });
                edited_places.push((place, previous));
                place_snapshots.push((place.id, payload));
            }
        }
    }

    let mut stats = RefreshStats::default();
    let mut owners = BTreeSet::new();
    let mut item_snapshots = Vec::new();
    for item in &batch.items {
        let payload = encode(item)?;
        let stored = stored_items.get(&item.id());
        if stored == Some(&payload) {
            continue;
        }
        let previous_location = stored
            .and_then(|json| decode_previous::<T>(json, product, item.id().get()))
            .and_then(|previous| previous.location());
        stats += services
            .hooks
            .item_saved(item, previous_location, &unchanged_places)?;
        owners.insert(item.owner());
        item_snapshots.push((item.id(), payload));
    }

    for (place, previous) in &edited_places {
        stats += services
            .hooks
            .place_saved(place, previous.as_ref(), &batch.items)?;
        owners.insert(place.owner);
    }

    invalidate_viewer(services, batch.viewer.user(), &owners)?;
    services
        .store
        .record_item_snapshots(product, &item_snapshots)?;
    services.store.record_place_snapshots(&place_snapshots)?;
    if !owners.is_empty() {
        info!(
            "applied edits to {} {product} and {} places ({} pairs re-resolved)",
            item_snapshots.len(),
            place_snapshots.len(),
            stats.resolved
        );
    }
    Ok(stats)
}

/// Hooks drop the owners' scores. A viewer ranking someone else's listings
/// caches under their own id, so drop theirs too.
fn invalidate_viewer(
    services: &Services,
    viewer: Option<UserId>,
    owners: &BTreeSet<UserId>,
) -> Result<(), CliError> {
    let Some(user) = viewer.filter(|user| !owners.is_empty() && !owners.contains(user)) else {
        return Ok(());
    };
    services.hooks.invalidate_scores(user)?;
    debug!("dropped cached scores for viewer {user} after edits to listings they do not own");
    Ok(())
}

fn encode<S: Serialize>(record: &S) -> Result<String, CliError> {
    serde_json::to_string(record).map_err(CliError::EncodeSnapshot)
}

/// Decode a stored snapshot, treating an unreadable one as absent.
fn decode_previous<S: DeserializeOwned>(json: &str, kind: &str, id: u64) -> Option<S> {
    serde_json::from_str(json)
        .inspect_err(|err| warn!("ignoring unreadable snapshot of {kind} {id}: {err}"))
        .ok()
}
