//! Blocking `RoutingClient` over a Distance Matrix HTTP API.
//!
//! The [`RoutingClient`] trait is synchronous so the scoring engine can stay
//! free of async. This client bridges to async `reqwest` calls by blocking on
//! a Tokio runtime it owns, or on the caller's multi-threaded runtime when
//! there is one.

use std::future::Future;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use homerank_core::{RouteRequest, RoutedLeg, RoutingClient, RoutingError, TimeKind, TravelMode};
use log::debug;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use crate::matrix::{MatrixResponse, Measure};

/// Errors raised while constructing a [`DistanceMatrixClient`].
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The configured base URL does not parse.
    #[error("invalid routing base URL {url}: {source}")]
    BaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default endpoint for Distance Matrix requests.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Default user agent for routing requests.
pub const DEFAULT_USER_AGENT: &str = "homerank-routing/0.1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of requests in flight during a batch.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Configuration for [`DistanceMatrixClient`].
#[derive(Clone)]
pub struct DistanceMatrixConfig {
    /// API key sent with every request. An empty key marks the client as
    /// unavailable.
    pub api_key: String,
    /// Distance Matrix endpoint.
    pub base_url: String,
    /// Connect and request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Upper bound on concurrent requests in [`RoutingClient::route_batch`].
    pub max_concurrency: usize,
}

impl std::fmt::Debug for DistanceMatrixConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceMatrixConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

impl Default for DistanceMatrixConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl DistanceMatrixConfig {
    /// Create a configuration for the default endpoint with `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Point the client at another endpoint, such as a local stand-in.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Bound the number of concurrent batch requests. Zero is treated as one.
    #[must_use]
    pub const fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}

/// HTTP routing client for a Distance Matrix API.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime, or inside a `current_thread` runtime, requests
/// run on the client's own runtime. Inside a multi-threaded runtime they run
/// on the caller's runtime via [`tokio::task::block_in_place`].
pub struct DistanceMatrixClient {
    client: Client,
    config: DistanceMatrixConfig,
    endpoint: Url,
    runtime: Runtime,
}

impl std::fmt::Debug for DistanceMatrixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceMatrixClient")
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl DistanceMatrixClient {
    /// Create a client for the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(DistanceMatrixConfig::new(api_key))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: DistanceMatrixConfig) -> Result<Self, ProviderBuildError> {
        let endpoint = Url::parse(&config.base_url).map_err(|source| {
            ProviderBuildError::BaseUrl {
                url: config.base_url.clone(),
                source,
            }
        })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            endpoint,
            runtime,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &DistanceMatrixConfig {
        &self.config
    }

    /// Build the request URL without credentials.
    ///
    /// Coordinates are sent as `lat,lng`. Arrival times are only honoured
    /// for transit, so other modes with an arrival schedule let the service
    /// pick the departure.
    fn public_url(&self, request: &RouteRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("origins", &lat_lng(request.origin))
                .append_pair("destinations", &lat_lng(request.destination))
                .append_pair("mode", request.mode.as_str())
                .append_pair("units", "imperial");
            match request.schedule {
                Some((TimeKind::Departure, at)) => {
                    query.append_pair("departure_time", &at.timestamp().to_string());
                }
                Some((TimeKind::Arrival, at)) if request.mode == TravelMode::Transit => {
                    query.append_pair("arrival_time", &at.timestamp().to_string());
                }
                _ => {}
            }
        }
        url
    }

    async fn fetch(&self, request: &RouteRequest) -> Result<RoutedLeg, RoutingError> {
        let display = self.public_url(request);
        let mut url = display.clone();
        url.query_pairs_mut().append_pair("key", &self.config.api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, display.as_str()))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err, display.as_str()))?;

        let matrix: MatrixResponse =
            response
                .json()
                .await
                .map_err(|err| RoutingError::Parse {
                    message: err.to_string(),
                })?;

        let leg = convert_response(matrix);
        if let Ok(routed) = &leg {
            debug!(
                "routed {} leg: {:.0} m, {:.0} s",
                request.mode, routed.distance_meters, routed.duration_seconds
            );
        }
        leg
    }

    /// Convert a reqwest error to a `RoutingError`.
    ///
    /// `url` must already have credentials removed; reqwest's own message
    /// is stripped of its URL for the same reason.
    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> RoutingError {
        if error.is_timeout() {
            return RoutingError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        let status = error.status();
        let message = error.without_url().to_string();
        if let Some(code) = status {
            return RoutingError::Http {
                url: url.to_owned(),
                status: code.as_u16(),
                message,
            };
        }

        RoutingError::Network {
            url: url.to_owned(),
            message,
        }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        // block_in_place needs a multi-threaded runtime; anything else runs
        // on the client's own runtime.
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

fn lat_lng(coord: geo::Coord<f64>) -> String {
    format!("{},{}", coord.y, coord.x)
}

/// Convert a matrix response for one pair into a leg.
fn convert_response(response: MatrixResponse) -> Result<RoutedLeg, RoutingError> {
    if !response.is_ok() {
        return Err(RoutingError::Service {
            message: response.error_message.clone().unwrap_or_default(),
            code: response.status,
        });
    }
    let element = response
        .first_element()
        .ok_or_else(|| RoutingError::Parse {
            message: "response has no elements".to_owned(),
        })?;
    if !element.is_ok() {
        return Err(RoutingError::NoRoute {
            status: element.status.clone(),
        });
    }
    let measure = |field: Option<&Measure>, name: &str| {
        field
            .map(|measure| measure.value)
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| RoutingError::Parse {
                message: format!("element is missing a valid {name}"),
            })
    };
    Ok(RoutedLeg {
        distance_meters: measure(element.distance.as_ref(), "distance")?,
        duration_seconds: measure(element.duration.as_ref(), "duration")?,
        fare: element.fare.as_ref().map(|fare| fare.value),
    })
}

impl RoutingClient for DistanceMatrixClient {
    fn is_available(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    fn route(&self, request: &RouteRequest) -> Result<RoutedLeg, RoutingError> {
        if !self.is_available() {
            return Err(RoutingError::Unavailable);
        }
        self.block_on(self.fetch(request))
    }

    /// Route `requests` with at most `max_concurrency` in flight, keeping
    /// the input order.
    fn route_batch(&self, requests: &[RouteRequest]) -> Vec<Result<RoutedLeg, RoutingError>> {
        if !self.is_available() {
            return requests.iter().map(|_| Err(RoutingError::Unavailable)).collect();
        }
        let limit = self.config.max_concurrency.max(1);
        debug!(
            "routing {} pairs with up to {limit} requests in flight",
            requests.len()
        );
        self.block_on(
            stream::iter(requests)
                .map(|request| self.fetch(request))
                .buffered(limit)
                .collect::<Vec<_>>(),
        )
    }
}
