//! Distance resolution between listings and points of interest.
//!
//! A [`RoutingClient`] supplies road or transit distances; when it is
//! unavailable or fails, [`GeoDistanceResolver`] substitutes the great-circle
//! distance from [`haversine_miles`].

mod client;
mod error;
mod haversine;
mod resolver;

pub use client::{RouteRequest, RoutedLeg, RoutingClient};
pub use error::RoutingError;
pub use haversine::{EARTH_RADIUS_MILES, haversine_miles};
pub use resolver::{GeoDistanceResolver, METERS_PER_MILE, ResolvedDistance};
