//! Routing client abstraction.

use chrono::{DateTime, Utc};
use geo::Coord;

use super::RoutingError;
use crate::{PointOfInterest, TimeKind, TravelMode};

/// One origin-destination query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    /// Listing position.
    pub origin: Coord<f64>,
    /// Place position.
    pub destination: Coord<f64>,
    /// Travel mode.
    pub mode: TravelMode,
    /// Departure or arrival instant; `None` lets the service pick "now".
    pub schedule: Option<(TimeKind, DateTime<Utc>)>,
}

impl RouteRequest {
    /// Build a request from a listing position to `place`, scheduling it at
    /// the place's next weekly occurrence after `now`.
    ///
    /// Returns `None` when the place is not geocoded.
    #[must_use]
    pub fn to_place(
        origin: Coord<f64>,
        place: &PointOfInterest,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let destination = place.location?;
        let schedule = &place.schedule;
        Some(Self {
            origin,
            destination,
            mode: place.travel_mode,
            schedule: Some((schedule.kind, schedule.next_occurrence(now))),
        })
    }
}

/// Raw leg returned by a routing service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutedLeg {
    /// Route length in metres.
    pub distance_meters: f64,
    /// Travel time in seconds.
    pub duration_seconds: f64,
    /// Transit fare in the service's currency, when reported.
    pub fare: Option<f64>,
}

/// Synchronous access to a routing service.
///
/// Implementations may be backed by HTTP; the engine only ever calls them
/// from blocking code.
pub trait RoutingClient: Send + Sync {
    /// Whether the client is configured well enough to attempt requests.
    fn is_available(&self) -> bool;

    /// Route a single request.
    ///
    /// # Errors
    /// Returns [`RoutingError`] when the service is unreachable, rejects the
    /// request, or finds no route.
    fn route(&self, request: &RouteRequest) -> Result<RoutedLeg, RoutingError>;

    /// Route several independent requests.
    ///
    /// The result has one entry per request, in order. The default issues
    /// the requests one after another.
    fn route_batch(&self, requests: &[RouteRequest]) -> Vec<Result<RoutedLeg, RoutingError>> {
        requests.iter().map(|request| self.route(request)).collect()
    }
}
