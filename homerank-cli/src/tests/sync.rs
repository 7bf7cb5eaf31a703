//! Edit detection between runs and the hooks it triggers.

use super::helpers::{StubRoutingBuilder, Workspace};
use super::*;
use crate::batch::Batch;
use crate::config::RunConfig;
use crate::services::Services;
use crate::sync::sync_batch;
use geo::Coord;
use homerank_core::{
    Apartment, DistanceCacheStore, ItemId, PlaceId, PointOfInterest, RefreshStats,
    ScoreCacheEntry, ScoreCacheStore, Tier, UserId, Viewer,
};
use rstest::{fixture, rstest};

struct Harness {
    _workspace: Workspace,
    services: Services,
}

#[fixture]
fn harness() -> Harness {
    let workspace = Workspace::new();
    let args = RunArgs {
        input: Some(workspace.input()),
        database: Some(workspace.database()),
        ..RunArgs::default()
    };
    let config = RunConfig::try_from(args).expect("config should build");
    let services =
        Services::open(&config, &StubRoutingBuilder::unavailable()).expect("open services");
    Harness {
        _workspace: workspace,
        services,
    }
}

fn loft(price: f64, location: Coord<f64>) -> Apartment {
    Apartment::new(ItemId(1), UserId(1), "Loft", price, 700).at(location)
}

fn work(location: Coord<f64>) -> PointOfInterest {
    PointOfInterest::new(PlaceId(1), UserId(1), "Work", location)
}

fn batch(items: Vec<Apartment>, places: Vec<PointOfInterest>) -> Batch<Apartment> {
    Batch {
        viewer: Viewer::Registered {
            user: UserId(1),
            tier: Tier::Pro,
        },
        items,
        places,
        preferences: None,
    }
}

fn seed_score(services: &Services, user: UserId) {
    services
        .store
        .replace_scores(
            user,
            &[ItemId(1)],
            &[ScoreCacheEntry {
                item: ItemId(1),
                user,
                score: 5.0,
                computed_at: chrono::Utc::now(),
            }],
        )
        .expect("seed score");
}

fn cached(services: &Services, user: UserId) -> usize {
    services
        .store
        .cached_scores(user, &[ItemId(1)])
        .expect("read scores")
        .len()
}

const ORIGIN: Coord<f64> = Coord { x: 0.0, y: 0.0 };
const NORTH: Coord<f64> = Coord { x: 0.0, y: 0.5 };

#[rstest]
fn first_sight_resolves_each_pair_once(harness: Harness) {
    let first = batch(vec![loft(2_000.0, ORIGIN)], vec![work(NORTH)]);

    let stats = sync_batch(&harness.services, &first).expect("sync");

    assert_eq!(stats.resolved, 1);
    let again = sync_batch(&harness.services, &first).expect("second sync");
    assert_eq!(again, RefreshStats::default());
}

#[rstest]
fn unchanged_batches_keep_cached_scores(harness: Harness) {
    let first = batch(vec![loft(2_000.0, ORIGIN)], vec![work(NORTH)]);
    sync_batch(&harness.services, &first).expect("sync");
    seed_score(&harness.services, UserId(1));

    sync_batch(&harness.services, &first).expect("second sync");

    assert_eq!(cached(&harness.services, UserId(1)), 1);
}

#[rstest]
fn price_edits_drop_scores_without_routing(harness: Harness) {
    sync_batch(
        &harness.services,
        &batch(vec![loft(2_000.0, ORIGIN)], vec![work(NORTH)]),
    )
    .expect("sync");
    seed_score(&harness.services, UserId(1));

    let stats = sync_batch(
        &harness.services,
        &batch(vec![loft(1_800.0, ORIGIN)], vec![work(NORTH)]),
    )
    .expect("sync edit");

    assert_eq!(stats, RefreshStats::default());
    assert_eq!(cached(&harness.services, UserId(1)), 0);
}

#[rstest]
fn moved_listings_are_re_resolved(harness: Harness) {
    sync_batch(
        &harness.services,
        &batch(vec![loft(2_000.0, ORIGIN)], vec![work(NORTH)]),
    )
    .expect("sync");

    let moved = Coord { x: 0.0, y: -0.5 };
    let stats = sync_batch(
        &harness.services,
        &batch(vec![loft(2_000.0, moved)], vec![work(NORTH)]),
    )
    .expect("sync move");

    assert_eq!(stats.resolved, 1);
    let entry = harness
        .services
        .store
        .get(ItemId(1), PlaceId(1))
        .expect("read distance")
        .expect("distance cached");
    assert_eq!(entry.distance_miles, Some(69.1));
}

#[rstest]
fn moved_places_are_re_resolved(harness: Harness) {
    sync_batch(
        &harness.services,
        &batch(vec![loft(2_000.0, ORIGIN)], vec![work(NORTH)]),
    )
    .expect("sync");
    seed_score(&harness.services, UserId(1));

    let stats = sync_batch(
        &harness.services,
        &batch(vec![loft(2_000.0, ORIGIN)], vec![work(Coord { x: 0.0, y: 1.0 })]),
    )
    .expect("sync move");

    assert_eq!(stats.resolved, 1);
    assert_eq!(cached(&harness.services, UserId(1)), 0);
}

#[rstest]
fn edits_to_foreign_listings_drop_the_viewers_scores(harness: Harness) {
    let foreign = |price| {
        Apartment::new(ItemId(1), UserId(9), "Studio", price, 500).at(ORIGIN)
    };
    sync_batch(&harness.services, &batch(vec![foreign(1_000.0)], Vec::new())).expect("sync");
    seed_score(&harness.services, UserId(1));

    sync_batch(&harness.services, &batch(vec![foreign(900.0)], Vec::new())).expect("sync edit");

    assert_eq!(cached(&harness.services, UserId(1)), 0);
}

#[rstest]
fn unreadable_snapshots_count_as_moves(harness: Harness) {
    let current = batch(vec![loft(2_000.0, ORIGIN)], vec![work(NORTH)]);
    sync_batch(&harness.services, &current).expect("sync");
    harness
        .services
        .store
        .record_item_snapshots("apartments", &[(ItemId(1), "{".to_owned())])
        .expect("corrupt snapshot");

    let stats = sync_batch(&harness.services, &current).expect("sync again");

    assert_eq!(stats.resolved, 1);
}
