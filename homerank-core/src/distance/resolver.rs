//! Resolve travel distances with a routing service, falling back to
//! great-circle distance.

use std::sync::Arc;

use log::{debug, warn};

use super::{RouteRequest, RoutedLeg, RoutingClient, RoutingError, haversine_miles};
use crate::normalize::round_to;

/// Metres in one statute mile.
pub const METERS_PER_MILE: f64 = 1_609.34;

/// Distance for one origin-destination pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDistance {
    /// Distance in miles, rounded to two decimals.
    pub distance_miles: f64,
    /// Travel time in whole minutes; `None` for straight-line results.
    pub duration_minutes: Option<u32>,
    /// Transit fare, rounded to cents, when the service reported one.
    pub fare: Option<f64>,
    /// Whether the routing service produced the value.
    pub used_primary: bool,
}

impl ResolvedDistance {
    /// Straight-line distance between the request endpoints.
    #[must_use]
    pub fn straight_line(request: &RouteRequest) -> Self {
        Self {
            distance_miles: round_to(haversine_miles(request.origin, request.destination), 2),
            duration_minutes: None,
            fare: None,
            used_primary: false,
        }
    }

    /// Convert a raw routed leg into miles, minutes, and cents.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "unit conversion")]
    pub fn from_leg(leg: &RoutedLeg) -> Self {
        Self {
            distance_miles: round_to(leg.distance_meters / METERS_PER_MILE, 2),
            duration_minutes: seconds_to_minutes(leg.duration_seconds),
            fare: leg.fare.map(|fare| round_to(fare, 2)),
            used_primary: true,
        }
    }
}

#[expect(clippy::float_arithmetic, reason = "unit conversion")]
fn seconds_to_minutes(seconds: f64) -> Option<u32> {
    let minutes = (seconds / 60.0).round();
    if !minutes.is_finite() || minutes < 0.0 || minutes > f64::from(u32::MAX) {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is rounded and range-checked above"
    )]
    let whole = minutes as u32;
    Some(whole)
}

/// Distance resolver with an optional primary routing client.
///
/// Availability is checked once per batch. A transient failure is retried
/// once before the pair falls back to [`haversine_miles`]; any other
/// failure falls back immediately.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use homerank_core::{GeoDistanceResolver, RouteRequest, TravelMode};
///
/// let resolver = GeoDistanceResolver::fallback_only();
/// let request = RouteRequest {
///     origin: Coord { x: 0.0, y: 0.0 },
///     destination: Coord { x: 0.0, y: 1.0 },
///     mode: TravelMode::Driving,
///     schedule: None,
/// };
/// let resolved = resolver.resolve(&request);
/// assert!(!resolved.used_primary);
/// assert_eq!(resolved.distance_miles, 69.1);
/// ```
#[derive(Clone, Default)]
pub struct GeoDistanceResolver {
    client: Option<Arc<dyn RoutingClient>>,
}

impl std::fmt::Debug for GeoDistanceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoDistanceResolver")
            .field("client", &self.client.as_ref().map(|_| "<dyn RoutingClient>"))
            .finish()
    }
}

impl GeoDistanceResolver {
    /// Resolve with `client` first.
    #[must_use]
    pub fn new(client: Arc<dyn RoutingClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Resolve every pair by great-circle distance.
    #[must_use]
    pub const fn fallback_only() -> Self {
        Self { client: None }
    }

    fn available_client(&self) -> Option<&dyn RoutingClient> {
        self.client
            .as_deref()
            .filter(|client| client.is_available())
    }

    /// Resolve a single pair.
    #[must_use]
    pub fn resolve(&self, request: &RouteRequest) -> ResolvedDistance {
        let Some(client) = self.available_client() else {
            return ResolvedDistance::straight_line(request);
        };
        let outcome = client.route(request);
        Self::settle(client, request, outcome)
    }

    /// Resolve many pairs, checking availability once.
    ///
    /// The result has one entry per request, in order. Requests a client
    /// leaves unanswered fall back to straight-line distance.
    #[must_use]
    pub fn resolve_batch(&self, requests: &[RouteRequest]) -> Vec<ResolvedDistance> {
        let Some(client) = self.available_client() else {
            debug!(
                "routing unavailable; using straight-line distance for {} pairs",
                requests.len()
            );
            return requests.iter().map(ResolvedDistance::straight_line).collect();
        };
        let outcomes = client.route_batch(requests);
        if outcomes.len() != requests.len() {
            warn!(
                "routing client answered {} of {} requests; the rest use straight-line distance",
                outcomes.len(),
                requests.len()
            );
        }
        let mut outcomes = outcomes.into_iter();
        requests
            .iter()
            .map(|request| {
                outcomes.next().map_or_else(
                    || ResolvedDistance::straight_line(request),
                    |outcome| Self::settle(client, request, outcome),
                )
            })
            .collect()
    }

    fn settle(
        client: &dyn RoutingClient,
        request: &RouteRequest,
        first: Result<RoutedLeg, RoutingError>,
    ) -> ResolvedDistance {
        let outcome = match first {
            Err(err) if err.is_transient() => {
                debug!("retrying transient routing failure: {err}");
                client.route(request)
            }
            other => other,
        };
        match outcome {
            Ok(leg) => ResolvedDistance::from_leg(&leg),
            Err(err) => {
                warn!("routing failed, falling back to straight-line distance: {err}");
                ResolvedDistance::straight_line(request)
            }
        }
    }
}
