//! Error types emitted by the homerank CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use homerank_core::{StoreError, Tier, UserId};
use homerank_routing::ProviderBuildError;
use homerank_store::SqliteStoreError;
use thiserror::Error;

/// Errors emitted by the homerank CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was set to a value it cannot take.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
    /// The logger could not be started.
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),
    /// Reading the input batch failed.
    #[error("failed to read input batch at {path:?}: {source}")]
    ReadInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Input batch JSON could not be decoded.
    #[error("failed to parse input batch JSON at {path:?}: {source}")]
    ParseInput {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The user keeps more points of interest than their tier allows.
    #[error("user {user} has {count} places but the {tier} tier allows {limit}")]
    TooManyPlaces {
        user: UserId,
        tier: Tier,
        count: usize,
        limit: usize,
    },
    /// The user keeps more listings than their tier allows.
    #[error("user {user} has {count} listings but the {tier} tier allows {limit}")]
    TooManyListings {
        user: UserId,
        tier: Tier,
        count: usize,
        limit: usize,
    },
    /// Opening the score database failed.
    #[error("failed to open score database at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: SqliteStoreError,
    },
    /// Constructing the routing client failed.
    #[error("failed to build routing client for {base_url:?}: {source}")]
    BuildRoutingClient {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// A cache or preference read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A listing or place could not be encoded for edit detection.
    #[error("failed to encode snapshot: {0}")]
    EncodeSnapshot(#[source] serde_json::Error),
    /// Serialising a report failed.
    #[error("failed to serialise report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing a report failed.
    #[error("failed to write report: {0}")]
    WriteReport(#[source] std::io::Error),
}
