//! HTTP routing client for the homerank distance cache.
//!
//! [`DistanceMatrixClient`] implements [`homerank_core::RoutingClient`]
//! against a Distance Matrix style API: one origin and one destination per
//! request, with the travel mode and the place's weekly schedule passed as
//! query parameters. Batches fan out with a bounded number of requests in
//! flight.
//!
//! Retries and the great-circle fallback live in
//! [`homerank_core::GeoDistanceResolver`]; this client reports every failure
//! as a [`homerank_core::RoutingError`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use geo::Coord;
//! use homerank_core::{GeoDistanceResolver, RouteRequest, TravelMode};
//! use homerank_routing::{DistanceMatrixClient, DistanceMatrixConfig};
//!
//! let config = DistanceMatrixConfig::new("api-key")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_max_concurrency(8);
//! let client = DistanceMatrixClient::with_config(config)?;
//! let resolver = GeoDistanceResolver::new(Arc::new(client));
//!
//! let resolved = resolver.resolve(&RouteRequest {
//!     origin: Coord { x: -73.9857, y: 40.7484 },
//!     destination: Coord { x: -73.9680, y: 40.7851 },
//!     mode: TravelMode::Transit,
//!     schedule: None,
//! });
//! println!("{} miles", resolved.distance_miles);
//! # Ok::<(), homerank_routing::ProviderBuildError>(())
//! ```

#![forbid(unsafe_code)]

mod client;
mod matrix;

pub use client::{
    DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    DistanceMatrixClient, DistanceMatrixConfig, ProviderBuildError,
};
