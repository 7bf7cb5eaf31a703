use thiserror::Error;

/// Errors from a [`RoutingClient`](super::RoutingClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The client is not configured, for example because no API key is set.
    #[error("routing service is not configured")]
    Unavailable,

    /// The request exceeded its deadline.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL with credentials removed.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// The service answered with an unsuccessful HTTP status.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Requested URL with credentials removed.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Transport error detail.
        message: String,
    },

    /// The connection failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Requested URL with credentials removed.
        url: String,
        /// Transport error detail.
        message: String,
    },

    /// The service rejected the request as a whole.
    #[error("routing service returned {code}: {message}")]
    Service {
        /// Top-level status code reported by the service.
        code: String,
        /// Error message, if provided.
        message: String,
    },

    /// The service found no route for this origin and destination.
    #[error("no route found ({status})")]
    NoRoute {
        /// Element-level status reported by the service.
        status: String,
    },

    /// The response body could not be interpreted.
    #[error("failed to parse routing response: {message}")]
    Parse {
        /// Parser detail.
        message: String,
    },
}

impl RoutingError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network { .. })
    }
}
