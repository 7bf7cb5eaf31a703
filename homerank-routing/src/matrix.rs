//! Response types for a Distance Matrix style routing API.
//!
//! The service answers a grid of origin and destination pairs. Requests from
//! this crate always carry one origin and one destination, so only the first
//! element of the first row is read.

use serde::Deserialize;

/// Top-level Distance Matrix response.
#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    /// Request status.
    ///
    /// Common values:
    /// - `"OK"` - the request was valid; inspect each element's status
    /// - `"INVALID_REQUEST"` - malformed parameters
    /// - `"OVER_QUERY_LIMIT"` - quota exhausted
    /// - `"REQUEST_DENIED"` - missing or rejected API key
    pub status: String,

    /// Human readable detail when `status` is not `"OK"`.
    #[serde(default)]
    pub error_message: Option<String>,

    /// One row per origin.
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

impl MatrixResponse {
    /// Whether the request as a whole succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }

    /// The element for the first origin and destination.
    #[must_use]
    pub fn first_element(&self) -> Option<&MatrixElement> {
        self.rows.first().and_then(|row| row.elements.first())
    }
}

/// Results for one origin.
#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    /// One element per destination.
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

/// Result for one origin and destination pair.
#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    /// `"OK"`, `"NOT_FOUND"` or `"ZERO_RESULTS"`.
    pub status: String,
    /// Route length in metres.
    pub distance: Option<Measure>,
    /// Travel time in seconds.
    pub duration: Option<Measure>,
    /// Transit fare, reported for transit requests only.
    pub fare: Option<Fare>,
}

impl MatrixElement {
    /// Whether a route was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// A numeric measurement with its display text.
#[derive(Debug, Deserialize)]
pub struct Measure {
    /// Value in base units.
    pub value: f64,
    /// Localised text; unused.
    #[serde(default)]
    pub text: Option<String>,
}

/// A transit fare.
#[derive(Debug, Deserialize)]
pub struct Fare {
    /// Amount in `currency`.
    pub value: f64,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency: Option<String>,
}
