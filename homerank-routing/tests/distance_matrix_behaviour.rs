//! Behavioural tests for [`DistanceMatrixClient`].
//!
//! A local canned responder stands in for the routing service so requests go
//! through the real HTTP stack.

mod support;

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use geo::Coord;
use homerank_core::{
    GeoDistanceResolver, ResolvedDistance, RouteRequest, RoutedLeg, RoutingClient, RoutingError,
    TimeKind, TravelMode,
};
use homerank_routing::{DistanceMatrixClient, DistanceMatrixConfig};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::CannedServer;

const API_KEY: &str = "test-key";

const LEG_BODY: &str = r#"{"status": "OK", "rows": [{"elements": [{
    "status": "OK",
    "distance": {"text": "5.2 mi", "value": 8369},
    "duration": {"text": "24 mins", "value": 1436}
}]}]}"#;

/// Shared state for one scenario.
#[derive(Default)]
struct RoutingWorld {
    server: RefCell<Option<CannedServer>>,
    client: RefCell<Option<DistanceMatrixClient>>,
    results: RefCell<Vec<Result<RoutedLeg, RoutingError>>>,
    served: RefCell<Vec<String>>,
    resolved: RefCell<Option<ResolvedDistance>>,
}

#[fixture]
fn world() -> RoutingWorld {
    RoutingWorld::default()
}

fn client_for(base_url: &str, api_key: &str) -> DistanceMatrixClient {
    DistanceMatrixClient::with_config(
        DistanceMatrixConfig::new(api_key)
            .with_base_url(base_url)
            .with_timeout(Duration::from_secs(5))
            .with_max_concurrency(2),
    )
    .expect("client should build")
}

fn serve(world: &RoutingWorld, status: u16, body: &str, expected: usize) {
    let server = CannedServer::start(status, body, expected);
    *world.client.borrow_mut() = Some(client_for(server.base_url(), API_KEY));
    *world.server.borrow_mut() = Some(server);
}

fn request(mode: TravelMode) -> RouteRequest {
    RouteRequest {
        origin: Coord {
            x: -73.9857,
            y: 40.7484,
        },
        destination: Coord {
            x: -73.9680,
            y: 40.7851,
        },
        mode,
        schedule: None,
    }
}

/// Request lines the server answered, waiting for it to finish first.
fn served_requests(world: &RoutingWorld) -> Vec<String> {
    if let Some(server) = world.server.borrow_mut().take() {
        *world.served.borrow_mut() = server.join();
    }
    world.served.borrow().clone()
}

fn single_result(world: &RoutingWorld) -> Result<RoutedLeg, RoutingError> {
    let results = world.results.borrow();
    assert_eq!(results.len(), 1, "expected one result");
    results.first().cloned().expect("one result")
}

// --- Given steps ---

#[given("a routing service returning 8369 metres and 1436 seconds")]
fn service_ok(world: &RoutingWorld) {
    serve(world, 200, LEG_BODY, 1);
}

#[given("a routing service returning 8369 metres and 1436 seconds for 3 requests")]
fn service_ok_batch(world: &RoutingWorld) {
    serve(world, 200, LEG_BODY, 3);
}

#[given("a routing service returning a 2.9 transit fare")]
fn service_with_fare(world: &RoutingWorld) {
    let body = r#"{"status": "OK", "rows": [{"elements": [{
        "status": "OK",
        "distance": {"value": 9120},
        "duration": {"value": 1980},
        "fare": {"currency": "USD", "text": "$2.90", "value": 2.9}
    }]}]}"#;
    serve(world, 200, body, 1);
}

#[given("a routing service with no route for the pair")]
fn service_no_route(world: &RoutingWorld) {
    serve(
        world,
        200,
        r#"{"status": "OK", "rows": [{"elements": [{"status": "ZERO_RESULTS"}]}]}"#,
        1,
    );
}

#[given("a routing service rejecting the API key")]
fn service_denied(world: &RoutingWorld) {
    serve(
        world,
        200,
        r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid.", "rows": []}"#,
        1,
    );
}

#[given("a routing service failing with HTTP 503")]
fn service_unavailable(world: &RoutingWorld) {
    serve(world, 503, "{}", 1);
}

#[given("a routing service that refuses connections")]
fn service_refusing(world: &RoutingWorld) {
    *world.client.borrow_mut() = Some(client_for("http://127.0.0.1:1/json", API_KEY));
}

#[given("a routing client without an API key")]
fn client_without_key(world: &RoutingWorld) {
    *world.client.borrow_mut() = Some(client_for("http://127.0.0.1:1/json", ""));
}

// --- When steps ---

fn route(world: &RoutingWorld, routed: &RouteRequest) {
    let guard = world.client.borrow();
    let client = guard.as_ref().expect("client must be initialised");
    *world.results.borrow_mut() = vec![client.route(routed)];
}

#[when("I route one driving request")]
fn route_driving(world: &RoutingWorld) {
    route(world, &request(TravelMode::Driving));
}

#[when("I route one transit request arriving on schedule")]
fn route_transit(world: &RoutingWorld) {
    let mut transit = request(TravelMode::Transit);
    let arrive_by = Utc
        .with_ymd_and_hms(2030, 1, 7, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    transit.schedule = Some((TimeKind::Arrival, arrive_by));
    route(world, &transit);
}

#[when("I route a batch of 3 driving requests")]
fn route_batch(world: &RoutingWorld) {
    let guard = world.client.borrow();
    let client = guard.as_ref().expect("client must be initialised");
    let requests = vec![request(TravelMode::Driving); 3];
    *world.results.borrow_mut() = client.route_batch(&requests);
}

#[when("the resolver resolves a pair one degree of latitude apart")]
fn resolve_fallback(world: &RoutingWorld) {
    let client = world
        .client
        .borrow_mut()
        .take()
        .expect("client must be initialised");
    let resolver = GeoDistanceResolver::new(Arc::new(client));
    let resolved = resolver.resolve(&RouteRequest {
        origin: Coord { x: 0.0, y: 0.0 },
        destination: Coord { x: 0.0, y: 1.0 },
        mode: TravelMode::Driving,
        schedule: None,
    });
    *world.resolved.borrow_mut() = Some(resolved);
}

// --- Then steps ---

#[then("the leg is 8369 metres and 1436 seconds")]
fn then_leg(world: &RoutingWorld) {
    let leg = single_result(world).expect("expected a leg");
    assert_eq!(leg.distance_meters, 8_369.0);
    assert_eq!(leg.duration_seconds, 1_436.0);
    assert_eq!(leg.fare, None);
}

#[then("the request asked for mode driving")]
fn then_mode_driving(world: &RoutingWorld) {
    let requests = served_requests(world);
    let line = requests.first().expect("one request");
    assert!(line.contains("mode=driving"), "request was {line}");
    assert!(line.contains("origins=40.7484%2C-73.9857"), "request was {line}");
}

#[then("the API key was sent with the request")]
fn then_key_sent(world: &RoutingWorld) {
    let requests = served_requests(world);
    assert!(!requests.is_empty());
    assert!(
        requests.iter().all(|line| line.contains("key=test-key")),
        "requests were {requests:?}"
    );
}

#[then("the leg carries a fare of 2.9")]
fn then_fare(world: &RoutingWorld) {
    let leg = single_result(world).expect("expected a leg");
    assert_eq!(leg.fare, Some(2.9));
}

#[then("the request asked for an arrival time")]
fn then_arrival(world: &RoutingWorld) {
    let requests = served_requests(world);
    let line = requests.first().expect("one request");
    assert!(line.contains("mode=transit"), "request was {line}");
    assert!(line.contains("arrival_time=1894006800"), "request was {line}");
}

#[then("a no-route error is returned")]
fn then_no_route(world: &RoutingWorld) {
    let result = single_result(world);
    assert!(
        matches!(&result, Err(RoutingError::NoRoute { status }) if status == "ZERO_RESULTS"),
        "expected NoRoute, got {result:?}"
    );
}

#[then("a service error with code REQUEST_DENIED is returned")]
fn then_service_error(world: &RoutingWorld) {
    let result = single_result(world);
    assert!(
        matches!(&result, Err(RoutingError::Service { code, .. }) if code == "REQUEST_DENIED"),
        "expected Service error, got {result:?}"
    );
}

#[then("an HTTP error with status 503 is returned")]
fn then_http_error(world: &RoutingWorld) {
    let result = single_result(world);
    match result {
        Err(RoutingError::Http { status, url, .. }) => {
            assert_eq!(status, 503);
            assert!(!url.contains(API_KEY), "url leaked the key: {url}");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[then("a transient error is returned")]
fn then_transient(world: &RoutingWorld) {
    let result = single_result(world);
    let err = result.expect_err("expected an error");
    assert!(err.is_transient(), "expected a transient error, got {err:?}");
}

#[then("3 legs are returned")]
fn then_batch(world: &RoutingWorld) {
    let results = world.results.borrow();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(Result::is_ok), "results were {results:?}");
    drop(results);
    assert_eq!(served_requests(world).len(), 3);
}

#[then("the resolver reports 69.1 straight-line miles")]
fn then_fallback(world: &RoutingWorld) {
    let resolved = world.resolved.borrow().expect("resolution recorded");
    assert_eq!(resolved.distance_miles, 69.1);
    assert!(!resolved.used_primary);
    assert_eq!(resolved.duration_minutes, None);
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/distance_matrix.feature", name = $title)]
        fn $fn_name(world: RoutingWorld) {
            let _ = world;
        }
    };
}

register_scenario!(routing_a_driving_request, "routing a driving request");
register_scenario!(reporting_transit_fares, "reporting transit fares");
register_scenario!(handling_an_unroutable_pair, "handling an unroutable pair");
register_scenario!(handling_a_denied_request, "handling a denied request");
register_scenario!(handling_a_server_error, "handling a server error");
register_scenario!(handling_an_unreachable_service, "handling an unreachable service");
register_scenario!(
    routing_a_batch,
    "routing a batch keeps one result per request"
);
register_scenario!(falling_back_without_a_key, "falling back without an API key");
